//! The tree entry point and its virtual stack.

use arbor_core::{Ctx, SplitMix64};

use crate::node::{BtEvent, NodeRef};
use crate::status::TaskStatus;
use crate::task::{generate, Step, Task};

/// Entry point of a (sub)tree: owns the frozen stack of task frames between
/// ticks.
///
/// The stack is a vec arena whose order IS the parent chain: pushing a child
/// frame makes the previous top its parent, popping restores it. A `Root`
/// belongs to exactly one agent and must not be shared across threads;
/// composites that need nested execution (joins, always-guards) own their own
/// sub-roots, which appear as leaves to the outer stack.
pub struct Root<C: Ctx, E: BtEvent> {
    node: NodeRef<C, E>,
    stack: Vec<Task<C, E>>,
    rng: SplitMix64,
}

impl<C: Ctx, E: BtEvent> Root<C, E> {
    pub fn new(node: NodeRef<C, E>) -> Self {
        Self::with_seed(node, 0)
    }

    /// Seeds the root's RNG stream; stochastic branch permutations are
    /// reproducible per seed. Sub-roots derive their own streams.
    pub fn with_seed(node: NodeRef<C, E>, seed: u64) -> Self {
        Self {
            node,
            stack: Vec::new(),
            rng: SplitMix64::new(seed),
        }
    }

    pub fn node(&self) -> &NodeRef<C, E> {
        &self.node
    }

    /// True while the tree is suspended mid-run.
    pub fn is_running(&self) -> bool {
        !self.stack.is_empty()
    }

    /// Drives the tree until the top frame suspends or the tree terminates.
    ///
    /// On first entry with an empty stack the root node's frame is pushed.
    /// A frame returning a running status freezes the stack and the value is
    /// returned as the scheduling hint; a terminal pops the frame, fires its
    /// `on_complete(cancel = false)` exactly once, and feeds the status to
    /// the parent frame.
    pub fn execute(&mut self, ctx: &mut C) -> TaskStatus {
        let mut from = TaskStatus::RUNNING;
        if self.stack.is_empty() {
            from = TaskStatus::NEW;
            let frame = generate(&self.node, &mut self.rng);
            self.stack.push(frame);
        }
        self.run(ctx, from)
    }

    /// Dispatches an event to the top frame, the only frame that can be in
    /// a running state. Returns `NEW` when the event is unhandled (including
    /// an idle stack). A terminal from the top frame pops it and resumes the
    /// normal unwinding, feeding the event's terminal status to the parent.
    pub fn on_event(&mut self, ctx: &mut C, event: &E) -> TaskStatus {
        let Some(top) = self.stack.last_mut() else {
            return TaskStatus::NEW;
        };
        let status = top.on_event(ctx, event);
        if status >= TaskStatus::NEW {
            return status;
        }
        let mut done = self.stack.pop().expect("top frame vanished");
        done.on_complete(ctx, false);
        self.run(ctx, status)
    }

    /// Unwinds the stack top-down, firing `on_complete(cancel = true)` on
    /// every frame, so a leaf's resource release runs before its ancestors'.
    /// The tree can be re-entered on the next execute.
    pub fn cancel(&mut self, ctx: &mut C) {
        while let Some(mut frame) = self.stack.pop() {
            frame.on_complete(ctx, true);
        }
    }

    fn run(&mut self, ctx: &mut C, mut from: TaskStatus) -> TaskStatus {
        loop {
            let Some(top) = self.stack.last_mut() else {
                return from;
            };
            match top.execute(ctx, &mut self.rng, from) {
                Step::Spawn(frame) => {
                    self.stack.push(frame);
                    from = TaskStatus::NEW;
                }
                Step::Status(status) if status.is_running() => return status,
                Step::Status(status) => {
                    debug_assert!(status.is_terminal(), "frame returned {status}");
                    let mut done = self.stack.pop().expect("top frame vanished");
                    done.on_complete(ctx, false);
                    from = status;
                }
            }
        }
    }
}
