#![allow(dead_code)]

//! Shared fixtures: a probe-carrying static leaf, and a wait leaf whose
//! enter/tick/exit bodies are compiled expressions.

use std::cell::RefCell;
use std::rc::Rc;

use arbor_bt::{field_guard, BtEvent, Guard, LeafTask, TaskFactory, TaskStatus};
use arbor_core::{AgentCtx, Ctx, Field};
use arbor_expr::Program;

pub struct TestEvent {
    pub kind: i32,
}

impl BtEvent for TestEvent {
    fn kind(&self) -> i32 {
        self.kind
    }
}

pub fn ev(kind: i32) -> TestEvent {
    TestEvent { kind }
}

/// Observable leaf lifecycle, shared with the test body through `Rc`.
#[derive(Default)]
pub struct Probe {
    pub executed: u32,
    pub completed: u32,
    pub canceled: Option<bool>,
}

pub type ProbeRef = Rc<RefCell<Probe>>;

pub fn probe() -> ProbeRef {
    Rc::new(RefCell::new(Probe::default()))
}

struct StaticTask {
    result: TaskStatus,
    probe: ProbeRef,
}

impl LeafTask<AgentCtx, TestEvent> for StaticTask {
    fn execute(&mut self, _ctx: &mut AgentCtx) -> TaskStatus {
        self.probe.borrow_mut().executed += 1;
        self.result
    }

    fn on_complete(&mut self, _ctx: &mut AgentCtx, cancel: bool) {
        let mut p = self.probe.borrow_mut();
        p.completed += 1;
        p.canceled = Some(cancel);
    }
}

/// Leaf that immediately returns `result` and records its lifecycle.
pub fn static_task(result: TaskStatus, probe: ProbeRef) -> TaskFactory<AgentCtx, TestEvent> {
    Rc::new(move |_ctx| {
        let task: Box<dyn LeafTask<AgentCtx, TestEvent>> = Box::new(StaticTask {
            result,
            probe: probe.clone(),
        });
        Some(task)
    })
}

const WAIT_ENTER: &str = "int d, wait, now; d = now() + wait";
const WAIT_TICK: &str = "int d, now; now() >= d ? -1 : d - now()";
const WAIT_EXIT: &str = "int d; d = -1";

struct WaitTask {
    tick: Program<AgentCtx>,
    exit: Program<AgentCtx>,
    probe: ProbeRef,
    interrupt_kind: i32,
}

impl LeafTask<AgentCtx, TestEvent> for WaitTask {
    fn execute(&mut self, ctx: &mut AgentCtx) -> TaskStatus {
        self.probe.borrow_mut().executed += 1;
        match self.tick.eval(ctx).ok().and_then(|v| v.as_i64()) {
            Some(v) => TaskStatus(v as i32),
            None => TaskStatus::FAIL,
        }
    }

    fn on_complete(&mut self, ctx: &mut AgentCtx, cancel: bool) {
        let _ = self.exit.eval(ctx);
        let mut p = self.probe.borrow_mut();
        p.completed += 1;
        p.canceled = Some(cancel);
    }

    fn on_event(&mut self, ctx: &mut AgentCtx, event: &TestEvent) -> TaskStatus {
        if self.interrupt_kind > 0 && event.kind() == self.interrupt_kind {
            ctx.set("interrupted", Field::Bool(true));
            return TaskStatus::SUCCESS;
        }
        TaskStatus::NEW
    }
}

/// Leaf suspending for `wait` time units; the deadline lives on the
/// blackboard so the bodies stay pure expression programs.
pub fn wait_task(wait: i64, probe: ProbeRef) -> TaskFactory<AgentCtx, TestEvent> {
    interruptible_wait_task(wait, 0, probe)
}

/// [`wait_task`] that finishes early with success when an event of
/// `interrupt_kind` arrives, leaving an `interrupted` marker behind.
pub fn interruptible_wait_task(
    wait: i64,
    interrupt_kind: i32,
    probe: ProbeRef,
) -> TaskFactory<AgentCtx, TestEvent> {
    let enter = arbor_expr::compile::<AgentCtx>(WAIT_ENTER).unwrap();
    let tick = arbor_expr::compile::<AgentCtx>(WAIT_TICK).unwrap();
    let exit = arbor_expr::compile::<AgentCtx>(WAIT_EXIT).unwrap();
    Rc::new(move |ctx| {
        ctx.set("wait", Field::I64(wait));
        enter.eval(ctx).ok()?;
        let task: Box<dyn LeafTask<AgentCtx, TestEvent>> = Box::new(WaitTask {
            tick: tick.clone(),
            exit: exit.clone(),
            probe: probe.clone(),
            interrupt_kind,
        });
        Some(task)
    })
}

/// Guard passing while `now() < p` (or unconditionally when `p <= 0`).
pub fn before_time_guard() -> Guard<AgentCtx> {
    let p = arbor_expr::compile::<AgentCtx>("int now, p; p <= 0 ? true : (now() < p)").unwrap();
    field_guard(move |ctx: &mut AgentCtx| p.eval(ctx))
}

/// Guard compiled from an arbitrary boolean expression source.
pub fn expr_guard(source: &str) -> Guard<AgentCtx> {
    let p = arbor_expr::compile::<AgentCtx>(source).unwrap();
    field_guard(move |ctx: &mut AgentCtx| p.eval(ctx))
}
