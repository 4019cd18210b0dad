//! Deterministic, engine-agnostic primitives shared by the arbor AI runtime.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod arraymap;
pub mod blackboard;
pub mod ctx;
pub mod field;
pub mod heapmap;
pub mod indexmap;
pub mod rng;
pub mod tag;

pub use arraymap::ArrayMap;
pub use blackboard::Blackboard;
pub use ctx::{AgentCtx, Ctx, HostFn};
pub use field::{Field, Kind};
pub use heapmap::HeapIndexMap;
pub use indexmap::IndexMap;
pub use rng::{derive_seed, mix64, DeterministicRng, SplitMix64};
pub use tag::{TagDb, TagId, TagQuery, TagSet};
