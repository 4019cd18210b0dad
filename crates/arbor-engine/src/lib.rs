//! Cooperative agent scheduler.
//!
//! Most agents are suspended most of the time: a running tree returns a
//! positive hint saying how long it would like to sleep. The scheduler keys
//! every agent in a [`HeapIndexMap`] on its next due time and each step
//! drives only the agents that are actually due: O(active), not O(agents).
//! Events reach individual agents directly or fan out through per-kind
//! listener tables.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

use std::collections::HashMap;

use arbor_bt::{BtEvent, Root, TaskStatus};
use arbor_core::{AgentCtx, ArrayMap, Ctx, HeapIndexMap};

pub type AgentId = u64;

/// Host-settable clock; the scheduler moves an agent's context to the
/// simulation time before driving its tree.
pub trait SimClock {
    fn advance_to(&mut self, now: i64);
}

impl SimClock for AgentCtx {
    fn advance_to(&mut self, now: i64) {
        self.set_clock(now);
    }
}

struct AgentSlot<C: Ctx, E: BtEvent> {
    root: Root<C, E>,
    ctx: C,
}

/// Drives many agents' trees cooperatively, waking each at its requested
/// time. Single-threaded by design: each agent owns its context and its
/// tree is never entered reentrantly.
pub struct Scheduler<C: Ctx + SimClock, E: BtEvent> {
    agents: HeapIndexMap<AgentId, i64, AgentSlot<C, E>>,
    listeners: HashMap<i32, ArrayMap<AgentId, ()>>,
    finished: Vec<(AgentId, TaskStatus)>,
}

impl<C: Ctx + SimClock, E: BtEvent> Default for Scheduler<C, E> {
    fn default() -> Self {
        Self {
            agents: HeapIndexMap::new(),
            listeners: HashMap::new(),
            finished: Vec::new(),
        }
    }
}

impl<C: Ctx + SimClock, E: BtEvent> Scheduler<C, E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// The earliest due time among live agents.
    pub fn next_due(&self) -> Option<i64> {
        self.agents.top().map(|(_, _, _, due)| due)
    }

    /// Borrow an agent's context, e.g. to inspect its blackboard.
    pub fn ctx(&self, id: AgentId) -> Option<&C> {
        self.agents.get(&id).map(|(_, slot)| &slot.ctx)
    }

    /// Terminal results of agents that have left the scheduler, in
    /// completion order.
    pub fn finished(&self) -> &[(AgentId, TaskStatus)] {
        &self.finished
    }

    /// Registers an agent; its tree first runs at the context's current
    /// time.
    pub fn spawn(&mut self, id: AgentId, root: Root<C, E>, ctx: C) {
        let due = ctx.now();
        tracing::debug!(agent = id, due, "agent scheduled");
        self.agents.push(id, AgentSlot { root, ctx }, due);
    }

    /// Executes every agent due at or before `now`, rescheduling running
    /// agents at `now + hint` and retiring terminal ones.
    pub fn run_until(&mut self, now: i64) {
        loop {
            let Some((handle, due)) = self.agents.top().map(|(h, _, _, due)| (h, due)) else {
                break;
            };
            if due > now {
                break;
            }
            let slot = self.agents.val_mut(handle);
            slot.ctx.advance_to(now);
            let status = slot.root.execute(&mut slot.ctx);
            match status.hint() {
                Some(hint) => self.agents.update(handle, now + i64::from(hint)),
                None => self.retire(handle, status),
            }
        }
    }

    /// Routes an event to one agent. An unhandled event (`NEW`) leaves the
    /// agent's schedule untouched; a terminal retires it.
    pub fn dispatch(&mut self, id: AgentId, event: &E) -> TaskStatus {
        let Some((handle, _)) = self.agents.get(&id) else {
            return TaskStatus::NEW;
        };
        let slot = self.agents.val_mut(handle);
        let status = slot.root.on_event(&mut slot.ctx, event);
        match status.hint() {
            Some(hint) => {
                let due = slot.ctx.now() + i64::from(hint);
                self.agents.update(handle, due);
            }
            None if status.is_terminal() => self.retire(handle, status),
            None => {}
        }
        status
    }

    /// Delivers an event to every agent subscribed to its kind.
    pub fn broadcast(&mut self, event: &E) {
        let ids: Vec<AgentId> = match self.listeners.get(&event.kind()) {
            Some(table) => table.iter().map(|(id, _)| *id).collect(),
            None => Vec::new(),
        };
        for id in ids {
            self.dispatch(id, event);
        }
    }

    pub fn subscribe(&mut self, kind: i32, id: AgentId) {
        self.listeners.entry(kind).or_default().put(id, ());
    }

    pub fn unsubscribe(&mut self, kind: i32, id: AgentId) {
        if let Some(table) = self.listeners.get_mut(&kind) {
            if let Some((i, _)) = table.get(&id) {
                table.remove(i);
            }
        }
    }

    /// Cancels an agent's tree and removes it. Returns false for an unknown
    /// id.
    pub fn cancel(&mut self, id: AgentId) -> bool {
        let Some((handle, _)) = self.agents.get(&id) else {
            return false;
        };
        let slot = self.agents.val_mut(handle);
        slot.root.cancel(&mut slot.ctx);
        let (id, _) = self.agents.remove(handle);
        tracing::debug!(agent = id, "agent cancelled");
        self.drop_listeners(id);
        true
    }

    fn retire(&mut self, handle: usize, status: TaskStatus) {
        let (id, _) = self.agents.remove(handle);
        tracing::debug!(agent = id, %status, "agent finished");
        self.drop_listeners(id);
        self.finished.push((id, status));
    }

    fn drop_listeners(&mut self, id: AgentId) {
        for table in self.listeners.values_mut() {
            if let Some((i, _)) = table.get(&id) {
                table.remove(i);
            }
        }
    }
}
