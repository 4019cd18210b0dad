use std::collections::HashMap;

use crate::blackboard::Blackboard;
use crate::field::Field;

/// The narrow interface both the behavior tree and compiled expressions
/// consume: a monotonic clock, keyed field access, and host callouts.
pub trait Ctx {
    fn now(&self) -> i64;
    fn get(&self, key: &str) -> Option<Field>;
    fn set(&mut self, key: &str, value: Field);
    fn del(&mut self, key: &str);
    /// Invokes a registered host function. `None` means the function is
    /// unknown; callers surface that as an error.
    fn exec(&mut self, name: &str, args: &[Field]) -> Option<Field>;
}

/// Host callout signature: callouts see the blackboard and evaluated
/// arguments, never the whole context.
pub type HostFn = Box<dyn FnMut(&mut Blackboard, &[Field]) -> Option<Field>>;

/// Batteries-included [`Ctx`]: a blackboard, a host-driven clock, and a
/// callable registry. `now` is always available as a callout returning the
/// current clock unless the host registers its own.
#[derive(Default)]
pub struct AgentCtx {
    board: Blackboard,
    clock: i64,
    funcs: HashMap<String, HostFn>,
}

impl AgentCtx {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn board(&self) -> &Blackboard {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut Blackboard {
        &mut self.board
    }

    pub fn set_clock(&mut self, now: i64) {
        self.clock = now;
    }

    pub fn advance(&mut self, dt: i64) {
        self.clock += dt;
    }

    pub fn register(&mut self, name: &str, f: HostFn) {
        self.funcs.insert(name.to_owned(), f);
    }
}

impl Ctx for AgentCtx {
    fn now(&self) -> i64 {
        self.clock
    }

    fn get(&self, key: &str) -> Option<Field> {
        self.board.get(key)
    }

    fn set(&mut self, key: &str, value: Field) {
        self.board.set(key, value);
    }

    fn del(&mut self, key: &str) {
        self.board.del(key);
    }

    fn exec(&mut self, name: &str, args: &[Field]) -> Option<Field> {
        if let Some(f) = self.funcs.get_mut(name) {
            return f(&mut self.board, args);
        }
        if name == "now" {
            return Some(Field::I64(self.clock));
        }
        None
    }
}
