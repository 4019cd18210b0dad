//! Runtime task frames.
//!
//! A task is the mutable per-execution state of one node. The whole family
//! is a sum type dispatched by a single `match`; the tree's node kinds are
//! finite and fixed, so dynamic dispatch buys nothing here.

use arbor_core::{Ctx, DeterministicRng, SplitMix64};

use crate::node::{BtEvent, LeafTask, Node, NodeKind, NodeRef};
use crate::root::Root;
use crate::status::TaskStatus;

/// One step of a task frame: either a status for the runtime to interpret,
/// or a child frame to push (the runtime re-enters it with `from = NEW`).
pub(crate) enum Step<C: Ctx, E: BtEvent> {
    Status(TaskStatus),
    Spawn(Task<C, E>),
}

pub(crate) enum Task<C: Ctx, E: BtEvent> {
    Revise {
        node: NodeRef<C, E>,
    },
    Repeat {
        node: NodeRef<C, E>,
        cur_loop: i32,
        count: i32,
    },
    PostGuard {
        node: NodeRef<C, E>,
    },
    AlwaysGuard {
        node: NodeRef<C, E>,
        inner: Root<C, E>,
    },
    Guard {
        node: NodeRef<C, E>,
    },
    Leaf {
        node: NodeRef<C, E>,
        body: Option<Box<dyn LeafTask<C, E>>>,
    },
    Sequence {
        node: NodeRef<C, E>,
        idx: usize,
        count: i32,
    },
    Stochastic {
        node: NodeRef<C, E>,
        idx: usize,
        count: i32,
        order: Vec<usize>,
    },
    Join {
        node: NodeRef<C, E>,
        roots: Vec<Root<C, E>>,
        states: Vec<TaskStatus>,
        complete: i32,
        success: i32,
    },
}

/// Instantiates the task frame for `node`.
pub(crate) fn generate<C: Ctx, E: BtEvent>(
    node: &NodeRef<C, E>,
    rng: &mut SplitMix64,
) -> Task<C, E> {
    let node = node.clone();
    match node.kind {
        NodeKind::Revise => Task::Revise { node },
        NodeKind::Repeat => Task::Repeat {
            node,
            cur_loop: 0,
            count: 0,
        },
        NodeKind::PostGuard => Task::PostGuard { node },
        NodeKind::AlwaysGuard => {
            let inner = Root::with_seed(node.children[0].clone(), rng.next_u64());
            Task::AlwaysGuard { node, inner }
        }
        NodeKind::Guard => Task::Guard { node },
        NodeKind::Leaf => Task::Leaf { node, body: None },
        NodeKind::Sequence => Task::Sequence {
            node,
            idx: 0,
            count: 0,
        },
        NodeKind::Stochastic => Task::Stochastic {
            node,
            idx: 0,
            count: 0,
            order: Vec::new(),
        },
        NodeKind::Join => Task::Join {
            node,
            roots: Vec::new(),
            states: Vec::new(),
            complete: 0,
            success: 0,
        },
    }
}

/// Evaluates a node's entry guard. No guard passes; an erroring guard is
/// logged and fails, so a misconfigured predicate cannot crash a tree tick.
fn check_guard<C: Ctx, E: BtEvent>(node: &Node<C, E>, ctx: &mut C) -> TaskStatus {
    let Some(g) = &node.guard else {
        return TaskStatus::SUCCESS;
    };
    match g(ctx) {
        Ok(v) if v.as_bool().unwrap_or(false) => TaskStatus::SUCCESS,
        Ok(_) => TaskStatus::FAIL,
        Err(err) => {
            tracing::warn!(error = %err, "guard evaluation failed");
            TaskStatus::FAIL
        }
    }
}

impl<C: Ctx, E: BtEvent> Task<C, E> {
    /// Drives the frame one step. `from` is the status that caused this
    /// re-entry: `NEW` for a just-pushed frame, a terminal for a child that
    /// just resolved, `RUNNING` for repeated visits to a suspended frame.
    pub(crate) fn execute(
        &mut self,
        ctx: &mut C,
        rng: &mut SplitMix64,
        from: TaskStatus,
    ) -> Step<C, E> {
        match self {
            Task::Revise { node } => {
                if from == TaskStatus::NEW {
                    let s = check_guard(node, ctx);
                    if s != TaskStatus::SUCCESS {
                        return Step::Status(s);
                    }
                    return Step::Spawn(generate(&node.children[0], rng));
                }
                Step::Status(node.revise(from))
            }

            Task::Repeat {
                node,
                cur_loop,
                count,
            } => {
                if from == TaskStatus::NEW {
                    let s = check_guard(node, ctx);
                    if s != TaskStatus::SUCCESS {
                        return Step::Status(s);
                    }
                    return Step::Spawn(generate(&node.children[0], rng));
                }
                *cur_loop += 1;
                if node.count_mode.count(from == TaskStatus::SUCCESS) {
                    *count += 1;
                }
                if node.require > 0 && *count >= node.require {
                    return Step::Status(TaskStatus::SUCCESS);
                }
                if node.max_loop > 0 && *cur_loop >= node.max_loop {
                    return Step::Status(TaskStatus::FAIL);
                }
                Step::Spawn(generate(&node.children[0], rng))
            }

            Task::PostGuard { node } => {
                if from == TaskStatus::NEW {
                    return Step::Spawn(generate(&node.children[0], rng));
                }
                // The child's own result is discarded.
                Step::Status(check_guard(node, ctx))
            }

            Task::AlwaysGuard { node, inner } => {
                let s = check_guard(node, ctx);
                if s != TaskStatus::SUCCESS {
                    return Step::Status(s);
                }
                Step::Status(inner.execute(ctx))
            }

            Task::Guard { node } => Step::Status(check_guard(node, ctx)),

            Task::Leaf { node, body } => {
                if from == TaskStatus::NEW {
                    let s = check_guard(node, ctx);
                    if s != TaskStatus::SUCCESS {
                        return Step::Status(s);
                    }
                    let factory = node.factory.as_ref().expect("leaf node without factory");
                    match factory(ctx) {
                        Some(t) => *body = Some(t),
                        None => return Step::Status(TaskStatus::FAIL),
                    }
                }
                let body = body.as_mut().expect("leaf body missing");
                Step::Status(body.execute(ctx))
            }

            Task::Sequence { node, idx, count } => {
                if from == TaskStatus::NEW {
                    let s = check_guard(node, ctx);
                    if s != TaskStatus::SUCCESS {
                        return Step::Status(s);
                    }
                    return Step::Spawn(generate(&node.children[0], rng));
                }
                *idx += 1;
                if node.count_mode.count(from == TaskStatus::SUCCESS) {
                    *count += 1;
                }
                if node.require > 0 && *count >= node.require {
                    return Step::Status(node.revise(TaskStatus::SUCCESS));
                }
                if *idx >= node.children.len() {
                    return Step::Status(node.revise(TaskStatus::FAIL));
                }
                Step::Spawn(generate(&node.children[*idx], rng))
            }

            Task::Stochastic {
                node,
                idx,
                count,
                order,
            } => {
                if from == TaskStatus::NEW {
                    let s = check_guard(node, ctx);
                    if s != TaskStatus::SUCCESS {
                        return Step::Status(s);
                    }
                    *order = rng.shuffled_indices(node.children.len());
                    return Step::Spawn(generate(&node.children[order[0]], rng));
                }
                *idx += 1;
                if node.count_mode.count(from == TaskStatus::SUCCESS) {
                    *count += 1;
                }
                if node.require > 0 && *count >= node.require {
                    return Step::Status(node.revise(TaskStatus::SUCCESS));
                }
                if *idx >= node.children.len() {
                    return Step::Status(node.revise(TaskStatus::FAIL));
                }
                Step::Spawn(generate(&node.children[order[*idx]], rng))
            }

            Task::Join {
                node,
                roots,
                states,
                complete,
                success,
            } => {
                if from == TaskStatus::NEW {
                    let s = check_guard(node, ctx);
                    if s != TaskStatus::SUCCESS {
                        return Step::Status(s);
                    }
                    for child in &node.children {
                        roots.push(Root::with_seed(child.clone(), rng.next_u64()));
                    }
                    states.resize(node.children.len(), TaskStatus::NEW);
                }
                let mut next: Option<TaskStatus> = None;
                for (root, state) in roots.iter_mut().zip(states.iter_mut()) {
                    if state.is_terminal() {
                        continue;
                    }
                    *state = root.execute(ctx);
                    if state.is_terminal() {
                        *complete += 1;
                        if *state == TaskStatus::SUCCESS {
                            *success += 1;
                        }
                    } else {
                        next = Some(match next {
                            None => *state,
                            Some(prev) => prev.min(*state),
                        });
                    }
                }
                Step::Status(join_verdict(node, *complete, *success, next, roots.len()))
            }
        }
    }

    /// Routes an event to the frame. Only frames that own their own
    /// sub-stacks (leaf bodies, joins, always-guards) implement the event
    /// capability; everything else reports `NEW` (unhandled).
    pub(crate) fn on_event(&mut self, ctx: &mut C, event: &E) -> TaskStatus {
        match self {
            Task::Leaf { body, .. } => match body {
                Some(body) => body.on_event(ctx, event),
                None => TaskStatus::NEW,
            },

            Task::AlwaysGuard { node, inner } => {
                if let Some(pred) = &node.on_event {
                    let s = pred(ctx, event);
                    if s.is_terminal() {
                        inner.cancel(ctx);
                        return s;
                    }
                    if s.is_running() {
                        return s;
                    }
                }
                inner.on_event(ctx, event)
            }

            Task::Join {
                node,
                roots,
                states,
                complete,
                success,
            } => {
                let mut next = TaskStatus::NEW;
                for (root, state) in roots.iter_mut().zip(states.iter_mut()) {
                    if !state.is_running() {
                        continue;
                    }
                    let s = root.on_event(ctx, event);
                    if s.is_running() {
                        *state = s;
                        next = if next == TaskStatus::NEW { s } else { next.min(s) };
                    } else if s != TaskStatus::NEW {
                        *state = s;
                        *complete += 1;
                        if s == TaskStatus::SUCCESS {
                            *success += 1;
                        }
                    }
                }
                join_verdict(node, *complete, *success, Some(next), roots.len())
            }

            _ => TaskStatus::NEW,
        }
    }

    /// Called exactly once after the frame leaves the stack. `cancel` marks
    /// external cancellation; frames owning sub-stacks propagate it.
    pub(crate) fn on_complete(&mut self, ctx: &mut C, cancel: bool) {
        match self {
            Task::Leaf { body, .. } => {
                if let Some(body) = body {
                    body.on_complete(ctx, cancel);
                }
            }
            // An always-guard that stopped with its subtree still running
            // (guard failure or external cancel) must release it; a subtree
            // that terminated naturally has an empty stack and this is a
            // no-op.
            Task::AlwaysGuard { inner, .. } => inner.cancel(ctx),
            // Early-terminating joins cancel every still-running sibling.
            Task::Join { roots, states, .. } => {
                for (root, state) in roots.iter_mut().zip(states.iter()) {
                    if state.is_running() || *state == TaskStatus::NEW {
                        root.cancel(ctx);
                    }
                }
            }
            _ => {}
        }
    }
}

fn join_verdict<C: Ctx, E: BtEvent>(
    node: &Node<C, E>,
    complete: i32,
    success: i32,
    next: Option<TaskStatus>,
    total: usize,
) -> TaskStatus {
    if node.require > 0 && node.count_mode.require(complete, success) >= node.require {
        return TaskStatus::SUCCESS;
    }
    if complete >= total as i32 {
        return TaskStatus::FAIL;
    }
    next.unwrap_or(TaskStatus::RUNNING)
}
