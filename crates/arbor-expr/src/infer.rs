//! Two-phase bidirectional type inference.
//!
//! Phase 1 collects declared variables. Phase 2 assigns types bottom-up from
//! literals and declarations. Phase 3 pushes refinements top-down: a parent's
//! type "infects" its children, which is what turns `int / int` into a float
//! division when the result is assigned to a float.

use std::collections::HashMap;

use crate::ast::{Ast, AstKind, ExprType, UnaryOp};
use crate::error::ExprError;

pub(crate) type VarTable = HashMap<String, ExprType>;

/// Phase 1: walk declarations into `name -> type`. Re-declaring a name with
/// a different type is an error; the same type is idempotent.
pub(crate) fn build_var_table(program: &Ast) -> Result<VarTable, ExprError> {
    let mut vars = VarTable::new();
    for stmt in &program.children {
        let AstKind::VarDecl { decl, names } = &stmt.kind else {
            continue;
        };
        for name in names {
            if let Some(prev) = vars.insert(name.clone(), *decl) {
                if prev != *decl {
                    return Err(ExprError::WrongType(name.clone()));
                }
            }
        }
    }
    Ok(vars)
}

/// Phase 2: bottom-up type assignment.
pub(crate) fn infer_up(ast: &mut Ast, vars: &VarTable) -> Result<ExprType, ExprError> {
    let ty = match &ast.kind {
        AstKind::Program => {
            for child in &mut ast.children {
                infer_up(child, vars)?;
            }
            return Ok(ExprType::Unknown);
        }
        AstKind::VarDecl { .. } => return Ok(ExprType::Unknown),

        AstKind::Assign { name } => {
            let ty = *vars
                .get(name)
                .ok_or_else(|| ExprError::WrongType(name.clone()))?;
            infer_up(&mut ast.children[0], vars)?;
            ty
        }

        AstKind::Unary { op } => {
            let op = *op;
            let up = infer_up(&mut ast.children[0], vars)?;
            match op {
                UnaryOp::Plus | UnaryOp::Neg => {
                    if up == ExprType::Bool {
                        return Err(ExprError::WrongType(op.symbol().to_owned()));
                    }
                    up
                }
                UnaryOp::Not => {
                    if up == ExprType::Float {
                        return Err(ExprError::WrongType(op.symbol().to_owned()));
                    }
                    ExprType::Bool
                }
            }
        }

        AstKind::Binary { op } => {
            let op = *op;
            let (lhs, rhs) = {
                let (a, b) = ast.children.split_at_mut(1);
                (infer_up(&mut a[0], vars)?, infer_up(&mut b[0], vars)?)
            };
            let wrong = || ExprError::WrongType(op.symbol().to_owned());
            if op.is_arith() {
                if lhs == ExprType::Bool || rhs == ExprType::Bool {
                    return Err(wrong());
                }
                if lhs == ExprType::Float || rhs == ExprType::Float {
                    ExprType::Float
                } else {
                    ExprType::Int
                }
            } else if op.is_equality() {
                let mixes_bool_float = (lhs == ExprType::Bool && rhs == ExprType::Float)
                    || (lhs == ExprType::Float && rhs == ExprType::Bool);
                if mixes_bool_float {
                    return Err(wrong());
                }
                ExprType::Bool
            } else if op.is_ordering() {
                if lhs == ExprType::Bool || rhs == ExprType::Bool {
                    return Err(wrong());
                }
                ExprType::Bool
            } else if op.is_logic() {
                if lhs == ExprType::Float || rhs == ExprType::Float {
                    return Err(wrong());
                }
                ExprType::Bool
            } else {
                // `%` stays in the integers.
                if !(lhs == ExprType::Int && rhs == ExprType::Int) {
                    return Err(wrong());
                }
                ExprType::Int
            }
        }

        AstKind::Ternary => {
            let cond = infer_up(&mut ast.children[0], vars)?;
            let then = infer_up(&mut ast.children[1], vars)?;
            let other = infer_up(&mut ast.children[2], vars)?;
            if cond != ExprType::Bool {
                return Err(ExprError::WrongType("?".to_owned()));
            }
            // Int is the identity of the branch join.
            if then == ExprType::Int {
                other
            } else if other == ExprType::Int || then == other {
                then
            } else {
                return Err(ExprError::WrongType("?".to_owned()));
            }
        }

        AstKind::Call { name } => {
            let ty = *vars
                .get(name)
                .ok_or_else(|| ExprError::Undefined(name.clone()))?;
            for child in &mut ast.children {
                infer_up(child, vars)?;
            }
            ty
        }

        AstKind::Ident { name } | AstKind::TryIdent { name } => *vars
            .get(name)
            .ok_or_else(|| ExprError::Undefined(name.clone()))?,

        AstKind::Number { lexeme } => {
            if lexeme.contains('.') {
                ExprType::Float
            } else {
                ExprType::Int
            }
        }

        AstKind::Bool { .. } => ExprType::Bool,
    };
    ast.ty = ty;
    Ok(ty)
}

/// Phase 3: top-down refinement. `hint` is the parent's requirement.
pub(crate) fn infer_down(ast: &mut Ast, vars: &VarTable, hint: ExprType) -> Result<(), ExprError> {
    match &ast.kind {
        AstKind::Program => {
            for child in &mut ast.children {
                infer_down(child, vars, ExprType::Unknown)?;
            }
            Ok(())
        }
        AstKind::VarDecl { .. } => Ok(()),

        AstKind::Assign { .. } => {
            let ty = ast.ty;
            infer_down(&mut ast.children[0], vars, ty)
        }

        AstKind::Unary { op } => {
            let sym = op.symbol();
            ast.ty = infect(ast.ty, hint).ok_or_else(|| ExprError::WrongType(sym.to_owned()))?;
            let ty = ast.ty;
            infer_down(&mut ast.children[0], vars, ty)
        }

        AstKind::Binary { op } => {
            let op = *op;
            let sym = op.symbol();
            if op.is_logic() {
                infer_down(&mut ast.children[0], vars, ExprType::Bool)?;
                return infer_down(&mut ast.children[1], vars, ExprType::Bool);
            }
            if op == crate::ast::BinOp::Rem {
                infer_down(&mut ast.children[0], vars, ExprType::Int)?;
                return infer_down(&mut ast.children[1], vars, ExprType::Int);
            }
            ast.ty = infect(ast.ty, hint).ok_or_else(|| ExprError::WrongType(sym.to_owned()))?;
            if op.is_comparison() {
                // Push the operands' common sub-type down both sides.
                let lhs = ast.children[0].ty;
                let rhs = ast.children[1].ty;
                let mixes_bool_float = (lhs == ExprType::Bool && rhs == ExprType::Float)
                    || (lhs == ExprType::Float && rhs == ExprType::Bool);
                if mixes_bool_float {
                    return Err(ExprError::WrongType(sym.to_owned()));
                }
                let mut target = ExprType::Int;
                if lhs == ExprType::Float || rhs == ExprType::Float {
                    target = ExprType::Float;
                }
                if lhs == ExprType::Bool || rhs == ExprType::Bool {
                    target = ExprType::Bool;
                }
                infer_down(&mut ast.children[0], vars, target)?;
                return infer_down(&mut ast.children[1], vars, target);
            }
            let ty = ast.ty;
            infer_down(&mut ast.children[0], vars, ty)?;
            infer_down(&mut ast.children[1], vars, ty)
        }

        AstKind::Ternary => {
            ast.ty = infect(ast.ty, hint).ok_or_else(|| ExprError::WrongType("?".to_owned()))?;
            let ty = ast.ty;
            // The condition stays boolean; the branches take the result type.
            infer_down(&mut ast.children[0], vars, ExprType::Bool)?;
            infer_down(&mut ast.children[1], vars, ty)?;
            infer_down(&mut ast.children[2], vars, ty)
        }

        AstKind::Call { name } => {
            let name = name.clone();
            for child in &mut ast.children {
                infer_down(child, vars, ExprType::Unknown)?;
            }
            ast.ty = infect(ast.ty, hint).ok_or(ExprError::WrongType(name))?;
            Ok(())
        }

        AstKind::Ident { name } | AstKind::TryIdent { name } => {
            let name = name.clone();
            ast.ty = infect(ast.ty, hint).ok_or(ExprError::WrongType(name))?;
            Ok(())
        }

        AstKind::Number { lexeme } => {
            let lexeme = lexeme.clone();
            ast.ty = infect(ast.ty, hint).ok_or(ExprError::WrongType(lexeme))?;
            Ok(())
        }

        AstKind::Bool { .. } => {
            ast.ty =
                infect(ast.ty, hint).ok_or_else(|| ExprError::WrongType("bool".to_owned()))?;
            Ok(())
        }
    }
}

/// Merges a parent's requirement into a node's inferred type. Float and Bool
/// refuse each other; an Int requirement accepts only Int.
fn infect(now: ExprType, hint: ExprType) -> Option<ExprType> {
    match hint {
        ExprType::Unknown => Some(now),
        ExprType::Float => (now != ExprType::Bool).then_some(ExprType::Float),
        ExprType::Bool => (now != ExprType::Float).then_some(ExprType::Bool),
        ExprType::Int => (now == ExprType::Int).then_some(ExprType::Int),
    }
}
