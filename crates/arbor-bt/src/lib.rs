//! Behavior-tree runtime built on `arbor-core`.
//!
//! Trees are declared once as immutable [`Node`]s and executed by a [`Root`],
//! which drives a virtual stack of task frames cooperatively: a tick runs
//! until the top frame suspends (returning a positive running hint) or the
//! tree terminates. Events enter through [`Root::on_event`] and may collapse
//! the stack; [`Root::cancel`] unwinds it top-down.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod node;
pub mod root;
pub mod status;
mod task;

pub use node::{
    always_guard, always_guard_on_event, bool_guard, fail, field_guard, guard, inverter, parallel,
    post_guard, repeat_until_n_success, selector, selector_n, sequence, success, task, BtEvent,
    EventPredicate, Guard, LeafTask, Node, NodeError, NodeKind, NodeRef, TaskFactory,
};
pub use root::Root;
pub use status::{CountMode, TaskStatus};
