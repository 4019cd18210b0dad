mod common;

use std::rc::Rc;

use arbor_bt::{
    always_guard_on_event, bool_guard, parallel, sequence, task, CountMode, Root, TaskStatus,
};
use arbor_core::{AgentCtx, Ctx, Field};

use common::{ev, interruptible_wait_task, probe, static_task, wait_task};

#[test]
fn event_interrupts_a_running_leaf() {
    let mut c = AgentCtx::new();
    let p = probe();
    let mut root = Root::new(task(None, interruptible_wait_task(10, 1, p.clone())));

    assert_eq!(root.execute(&mut c), TaskStatus::running(10));

    assert_eq!(root.on_event(&mut c, &ev(1)), TaskStatus::SUCCESS);
    assert!(!root.is_running());
    assert_eq!(c.get("interrupted").and_then(|f| f.as_bool()), Some(true));
    // Natural termination, not cancellation.
    assert_eq!(p.borrow().completed, 1);
    assert_eq!(p.borrow().canceled, Some(false));
}

#[test]
fn unrecognized_event_leaves_the_stack_frozen() {
    let mut c = AgentCtx::new();
    let mut root = Root::new(task(None, interruptible_wait_task(10, 1, probe())));

    assert_eq!(root.execute(&mut c), TaskStatus::running(10));
    assert_eq!(root.on_event(&mut c, &ev(2)), TaskStatus::NEW);
    assert!(root.is_running());

    c.set_clock(4);
    assert_eq!(root.execute(&mut c), TaskStatus::running(6));
}

#[test]
fn event_on_idle_root_is_unhandled() {
    let mut c = AgentCtx::new();
    let mut root = Root::new(task(None, static_task(TaskStatus::SUCCESS, probe())));
    assert_eq!(root.on_event(&mut c, &ev(1)), TaskStatus::NEW);
}

#[test]
fn event_terminal_unwinds_into_the_parent_branch() {
    let mut c = AgentCtx::new();
    let p3 = probe();
    let tree = sequence(
        None,
        false,
        vec![
            task(None, static_task(TaskStatus::SUCCESS, probe())),
            task(None, interruptible_wait_task(10, 1, probe())),
            task(None, static_task(TaskStatus::SUCCESS, p3.clone())),
        ],
    );
    let mut root = Root::new(tree);

    assert_eq!(root.execute(&mut c), TaskStatus::running(10));

    // The wait finishes with the event's terminal status, which feeds the
    // sequence as a normal child completion: the third child runs and the
    // whole tree succeeds within the same dispatch.
    assert_eq!(root.on_event(&mut c, &ev(1)), TaskStatus::SUCCESS);
    assert_eq!(p3.borrow().executed, 1);
    assert_eq!(c.get("interrupted").and_then(|f| f.as_bool()), Some(true));
}

#[test]
fn join_routes_events_to_running_subroots() {
    let mut c = AgentCtx::new();
    let (p1, p2) = (probe(), probe());
    let tree = parallel(
        None,
        CountMode::Success,
        1,
        vec![
            task(None, interruptible_wait_task(10, 1, p1.clone())),
            task(None, wait_task(15, p2.clone())),
        ],
    );
    let mut root = Root::new(tree);

    assert_eq!(root.execute(&mut c), TaskStatus::running(10));

    // The event resolves the first sub-root; the join reaches its threshold
    // and the still-running sibling is cancelled during the unwinding.
    assert_eq!(root.on_event(&mut c, &ev(1)), TaskStatus::SUCCESS);
    assert_eq!(p1.borrow().canceled, Some(false));
    assert_eq!(p2.borrow().canceled, Some(true));
}

#[test]
fn always_guard_event_hook_short_circuits() {
    let mut c = AgentCtx::new();
    let p = probe();
    let hook = Rc::new(|ctx: &mut AgentCtx, e: &common::TestEvent| {
        if e.kind == 2 {
            ctx.set("aborted", Field::Bool(true));
            TaskStatus::FAIL
        } else {
            TaskStatus::NEW
        }
    });
    let tree = always_guard_on_event(
        bool_guard(|_| true),
        hook,
        task(None, wait_task(10, p.clone())),
    );
    let mut root = Root::new(tree);

    assert_eq!(root.execute(&mut c), TaskStatus::running(10));

    // Unrecognized kind falls through to the inner sub-root (which has no
    // handler either).
    assert_eq!(root.on_event(&mut c, &ev(1)), TaskStatus::NEW);
    assert!(root.is_running());

    // Recognized kind short-circuits: the inner wait is cancelled.
    assert_eq!(root.on_event(&mut c, &ev(2)), TaskStatus::FAIL);
    assert_eq!(c.get("aborted").and_then(|f| f.as_bool()), Some(true));
    assert_eq!(p.borrow().canceled, Some(true));
    assert!(!root.is_running());
}
