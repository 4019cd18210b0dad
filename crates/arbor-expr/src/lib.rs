//! Statically-typed expression compiler.
//!
//! `compile` runs the full pipeline (lex, precedence-climbing parse,
//! two-phase bidirectional inference, closure codegen) and returns a
//! [`Program`]: a callable indistinguishable at the use-site from
//! hand-written code. Programs are pure with respect to themselves (they
//! only mutate the passed context), so one compiled program may be shared
//! read-only across any number of contexts.
//!
//! ```
//! use arbor_core::{AgentCtx, Ctx, Field};
//!
//! let p = arbor_expr::compile::<AgentCtx>("int x, y; x + y").unwrap();
//! let mut ctx = AgentCtx::new();
//! ctx.set("x", Field::I64(10));
//! ctx.set("y", Field::I64(5));
//! assert_eq!(p.eval(&mut ctx).unwrap().as_i64(), Some(15));
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

mod ast;
mod codegen;
mod error;
mod infer;
mod lexer;
mod parser;

use std::rc::Rc;

use arbor_core::{Ctx, Field};

pub use ast::ExprType;
pub use error::ExprError;

/// A compiled expression program.
pub struct Program<C> {
    f: Rc<dyn Fn(&mut C) -> Result<Field, ExprError>>,
}

impl<C> Clone for Program<C> {
    fn clone(&self) -> Self {
        Self { f: self.f.clone() }
    }
}

impl<C> std::fmt::Debug for Program<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Program").finish_non_exhaustive()
    }
}

impl<C: Ctx> Program<C> {
    /// Evaluates each statement in order against `ctx`, returning the last
    /// statement's value or the first error.
    pub fn eval(&self, ctx: &mut C) -> Result<Field, ExprError> {
        (self.f)(ctx)
    }
}

/// Compiles `source` into a [`Program`]. Parse and type errors are reported
/// here; a compiled program never fails except on missing context inputs.
pub fn compile<C: Ctx + 'static>(source: &str) -> Result<Program<C>, ExprError> {
    let mut ast = parser::parse(source)?;
    let vars = infer::build_var_table(&ast)?;
    infer::infer_up(&mut ast, &vars)?;
    infer::infer_down(&mut ast, &vars, ExprType::Unknown)?;
    let f = codegen::emit::<C>(&ast, &vars)?;
    Ok(Program { f: Rc::from(f) })
}
