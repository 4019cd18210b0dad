//! Declarative node tree.
//!
//! Nodes are immutable descriptions shared through [`Rc`]; the runtime
//! instantiates per-execution task frames from them. Builder helpers cover
//! the canonical variants and assert structural preconditions up front;
//! violating one is a programmer bug, not a recoverable error.

use std::rc::Rc;

use arbor_core::{Ctx, Field};
use thiserror::Error;

use crate::status::{CountMode, TaskStatus};

/// Event abstraction delivered through [`crate::Root::on_event`].
pub trait BtEvent {
    fn kind(&self) -> i32;
}

/// The user-authored action at the bottom of a tree.
///
/// `execute` is called once per tick while running and returns a terminal
/// status or a positive running hint. `on_complete` is invoked exactly once
/// after the leaf leaves the stack; `cancel` distinguishes external
/// cancellation from natural termination. `on_event` returns `NEW` when the
/// event cannot be handled, a positive hint to stay running, or a terminal
/// to finish the leaf.
pub trait LeafTask<C: Ctx, E: BtEvent> {
    fn execute(&mut self, ctx: &mut C) -> TaskStatus;

    fn on_complete(&mut self, _ctx: &mut C, _cancel: bool) {}

    fn on_event(&mut self, _ctx: &mut C, _event: &E) -> TaskStatus {
        TaskStatus::NEW
    }
}

/// Predicate gating node entry (or, for post-guards, rewriting the result).
/// A guard evaluates to a [`Field`] whose bool projection decides pass/fail;
/// an error is logged and treated as fail.
pub type Guard<C> = Rc<dyn Fn(&mut C) -> anyhow::Result<Field>>;

/// Produces the leaf body when a leaf node starts. `None` fails the leaf
/// without creating an instance.
pub type TaskFactory<C, E> = Rc<dyn Fn(&mut C) -> Option<Box<dyn LeafTask<C, E>>>>;

/// Optional event hook on an always-guard node: `NEW` delegates to the inner
/// sub-root, a terminal short-circuits it (cancelling the sub-root).
pub type EventPredicate<C, E> = Rc<dyn Fn(&mut C, &E) -> TaskStatus>;

/// Wraps a plain boolean predicate as a [`Guard`].
pub fn bool_guard<C: Ctx>(f: impl Fn(&mut C) -> bool + 'static) -> Guard<C> {
    Rc::new(move |c| Ok(Field::Bool(f(c))))
}

/// Wraps a fallible [`Field`] predicate (such as a compiled expression) as a
/// [`Guard`].
pub fn field_guard<C, F, Er>(f: F) -> Guard<C>
where
    C: Ctx,
    F: Fn(&mut C) -> Result<Field, Er> + 'static,
    Er: std::error::Error + Send + Sync + 'static,
{
    Rc::new(move |c| f(c).map_err(anyhow::Error::new))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeKind {
    /// One-child decorator rewriting the child's result through `revise`.
    Revise,
    /// One-child decorator re-running the child up to `max_loop` times.
    Repeat,
    /// One-child decorator whose guard replaces the child's result.
    PostGuard,
    /// One-child decorator re-checking its guard on every visit.
    AlwaysGuard,
    /// Leaf whose body is the guard evaluation itself.
    Guard,
    /// Leaf wrapping a user task factory.
    Leaf,
    /// Branch visiting children in declaration order.
    Sequence,
    /// Branch visiting children in a per-instance random order.
    Stochastic,
    /// Branch running all children concurrently under sub-roots.
    Join,
}

impl NodeKind {
    fn is_decorator(self) -> bool {
        matches!(
            self,
            NodeKind::Revise | NodeKind::Repeat | NodeKind::PostGuard | NodeKind::AlwaysGuard
        )
    }

    fn is_leaf(self) -> bool {
        matches!(self, NodeKind::Guard | NodeKind::Leaf)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NodeError {
    #[error("branch node requires at least one child")]
    EmptyBranch,
    #[error("decorator must have exactly one child, got {0}")]
    DecoratorArity(usize),
    #[error("leaf node cannot have children")]
    LeafChildren,
    #[error("revise node missing its revise function")]
    MissingRevise,
    #[error("leaf node missing its task factory")]
    MissingFactory,
    #[error("require {require} out of range for {children} children")]
    RequireRange { require: i32, children: usize },
}

pub type NodeRef<C, E> = Rc<Node<C, E>>;

/// Immutable description of a tree position.
pub struct Node<C: Ctx, E: BtEvent> {
    pub(crate) kind: NodeKind,
    pub(crate) children: Vec<NodeRef<C, E>>,
    pub(crate) guard: Option<Guard<C>>,
    pub(crate) factory: Option<TaskFactory<C, E>>,
    pub(crate) revise: Option<fn(TaskStatus) -> TaskStatus>,
    pub(crate) on_event: Option<EventPredicate<C, E>>,
    pub(crate) max_loop: i32,
    pub(crate) require: i32,
    pub(crate) count_mode: CountMode,
}

impl<C: Ctx, E: BtEvent> Node<C, E> {
    fn bare(kind: NodeKind) -> Node<C, E> {
        Node {
            kind,
            children: Vec::new(),
            guard: None,
            factory: None,
            revise: None,
            on_event: None,
            max_loop: 0,
            require: 0,
            count_mode: CountMode::None,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub(crate) fn revise(&self, status: TaskStatus) -> TaskStatus {
        match self.revise {
            Some(f) => f(status),
            None => status,
        }
    }

    /// Validates the whole subtree. Builder helpers uphold these rules by
    /// construction; hand-assembled trees should be checked before use.
    pub fn check(&self) -> Result<(), NodeError> {
        match self.kind {
            NodeKind::Sequence | NodeKind::Stochastic | NodeKind::Join => {
                if self.children.is_empty() {
                    return Err(NodeError::EmptyBranch);
                }
                if self.require < 0 || self.require as usize > self.children.len() {
                    return Err(NodeError::RequireRange {
                        require: self.require,
                        children: self.children.len(),
                    });
                }
            }
            k if k.is_decorator() => {
                if self.children.len() != 1 {
                    return Err(NodeError::DecoratorArity(self.children.len()));
                }
                if k == NodeKind::Revise && self.revise.is_none() {
                    return Err(NodeError::MissingRevise);
                }
            }
            k => {
                debug_assert!(k.is_leaf());
                if !self.children.is_empty() {
                    return Err(NodeError::LeafChildren);
                }
                if k == NodeKind::Leaf && self.factory.is_none() {
                    return Err(NodeError::MissingFactory);
                }
            }
        }
        for child in &self.children {
            child.check()?;
        }
        Ok(())
    }
}

/// Decorator succeeding regardless of the child's result.
pub fn success<C: Ctx, E: BtEvent>(g: Option<Guard<C>>, child: NodeRef<C, E>) -> NodeRef<C, E> {
    revise_node(g, child, |_| TaskStatus::SUCCESS)
}

/// Decorator failing regardless of the child's result.
pub fn fail<C: Ctx, E: BtEvent>(g: Option<Guard<C>>, child: NodeRef<C, E>) -> NodeRef<C, E> {
    revise_node(g, child, |_| TaskStatus::FAIL)
}

/// Decorator swapping the child's terminal result.
pub fn inverter<C: Ctx, E: BtEvent>(g: Option<Guard<C>>, child: NodeRef<C, E>) -> NodeRef<C, E> {
    revise_node(g, child, |s| s.invert())
}

fn revise_node<C: Ctx, E: BtEvent>(
    g: Option<Guard<C>>,
    child: NodeRef<C, E>,
    revise: fn(TaskStatus) -> TaskStatus,
) -> NodeRef<C, E> {
    let mut n = Node::bare(NodeKind::Revise);
    n.guard = g;
    n.children = vec![child];
    n.revise = Some(revise);
    Rc::new(n)
}

/// Re-runs `child` until it succeeds `require` times, failing after
/// `max_loop` attempts (`0` means unbounded).
pub fn repeat_until_n_success<C: Ctx, E: BtEvent>(
    g: Option<Guard<C>>,
    require: i32,
    max_loop: i32,
    child: NodeRef<C, E>,
) -> NodeRef<C, E> {
    assert!(require >= 1, "repeat requires at least one success");
    let mut n = Node::bare(NodeKind::Repeat);
    n.guard = g;
    n.children = vec![child];
    n.require = require;
    n.max_loop = max_loop;
    n.count_mode = CountMode::Success;
    Rc::new(n)
}

/// Runs `child` unconditionally, then replaces its result with the guard's.
pub fn post_guard<C: Ctx, E: BtEvent>(g: Guard<C>, child: NodeRef<C, E>) -> NodeRef<C, E> {
    let mut n = Node::bare(NodeKind::PostGuard);
    n.guard = Some(g);
    n.children = vec![child];
    Rc::new(n)
}

/// Re-checks the guard on every tick; a failing guard cancels the running
/// child subtree.
pub fn always_guard<C: Ctx, E: BtEvent>(g: Guard<C>, child: NodeRef<C, E>) -> NodeRef<C, E> {
    let mut n = Node::bare(NodeKind::AlwaysGuard);
    n.guard = Some(g);
    n.children = vec![child];
    Rc::new(n)
}

/// [`always_guard`] with an event hook consulted before the inner subtree.
pub fn always_guard_on_event<C: Ctx, E: BtEvent>(
    g: Guard<C>,
    on_event: EventPredicate<C, E>,
    child: NodeRef<C, E>,
) -> NodeRef<C, E> {
    let mut n = Node::bare(NodeKind::AlwaysGuard);
    n.guard = Some(g);
    n.children = vec![child];
    n.on_event = Some(on_event);
    Rc::new(n)
}

/// Leaf that just evaluates the guard once.
pub fn guard<C: Ctx, E: BtEvent>(g: Guard<C>) -> NodeRef<C, E> {
    let mut n = Node::bare(NodeKind::Guard);
    n.guard = Some(g);
    Rc::new(n)
}

/// Leaf wrapping a user task factory.
pub fn task<C: Ctx, E: BtEvent>(g: Option<Guard<C>>, factory: TaskFactory<C, E>) -> NodeRef<C, E> {
    let mut n = Node::bare(NodeKind::Leaf);
    n.guard = g;
    n.factory = Some(factory);
    Rc::new(n)
}

/// Stops on the first success.
pub fn selector<C: Ctx, E: BtEvent>(
    g: Option<Guard<C>>,
    shuffle: bool,
    children: Vec<NodeRef<C, E>>,
) -> NodeRef<C, E> {
    selector_n(g, 1, shuffle, children)
}

/// Stops on the first `n` successes.
pub fn selector_n<C: Ctx, E: BtEvent>(
    g: Option<Guard<C>>,
    n: i32,
    shuffle: bool,
    children: Vec<NodeRef<C, E>>,
) -> NodeRef<C, E> {
    assert!(!children.is_empty(), "branch requires children");
    assert!(
        n >= 1 && n as usize <= children.len(),
        "require out of range"
    );
    let mut node = Node::bare(branch_kind(shuffle));
    node.guard = g;
    node.children = children;
    node.require = n;
    node.count_mode = CountMode::Success;
    Rc::new(node)
}

/// Stops on the first failure.
///
/// Encoded as "count one failure, then invert": reaching the threshold means
/// the sequence failed, exhausting the children means it succeeded.
pub fn sequence<C: Ctx, E: BtEvent>(
    g: Option<Guard<C>>,
    shuffle: bool,
    children: Vec<NodeRef<C, E>>,
) -> NodeRef<C, E> {
    assert!(!children.is_empty(), "branch requires children");
    let mut node = Node::bare(branch_kind(shuffle));
    node.guard = g;
    node.children = children;
    node.require = 1;
    node.count_mode = CountMode::Fail;
    node.revise = Some(|s| s.invert());
    Rc::new(node)
}

fn branch_kind(shuffle: bool) -> NodeKind {
    if shuffle {
        NodeKind::Stochastic
    } else {
        NodeKind::Sequence
    }
}

/// Runs all children concurrently until `count_mode.require(..)` reaches
/// `require`; the remaining running children are cancelled.
pub fn parallel<C: Ctx, E: BtEvent>(
    g: Option<Guard<C>>,
    count_mode: CountMode,
    require: i32,
    children: Vec<NodeRef<C, E>>,
) -> NodeRef<C, E> {
    assert!(!children.is_empty(), "branch requires children");
    assert!(
        require >= 1 && require as usize <= children.len(),
        "require out of range"
    );
    let mut node = Node::bare(NodeKind::Join);
    node.guard = g;
    node.children = children;
    node.require = require;
    node.count_mode = count_mode;
    Rc::new(node)
}
