//! Closure generation.
//!
//! Every AST node lowers to a boxed `Fn(&mut C) -> Result<Field, ExprError>`.
//! Operators dispatch once, at compile time, to a family-specific table
//! (int / float / bool), so the hot path never re-branches on the operator.
//! Logical operators short-circuit; a ternary evaluates exactly one branch.

use arbor_core::{Ctx, Field};

use crate::ast::{Ast, AstKind, BinOp, ExprType, UnaryOp};
use crate::error::ExprError;
use crate::infer::VarTable;

pub(crate) type BoxFn<C> = Box<dyn Fn(&mut C) -> Result<Field, ExprError>>;

pub(crate) fn emit<C: Ctx + 'static>(ast: &Ast, vars: &VarTable) -> Result<BoxFn<C>, ExprError> {
    match &ast.kind {
        AstKind::Program => {
            let mut fs = Vec::with_capacity(ast.children.len());
            for child in &ast.children {
                if !matches!(child.kind, AstKind::VarDecl { .. }) {
                    fs.push(emit(child, vars)?);
                }
            }
            Ok(inline_program(fs))
        }

        AstKind::VarDecl { .. } => unreachable!("declarations are filtered by the program node"),

        AstKind::Assign { name } => {
            let f = emit(&ast.children[0], vars)?;
            let name = name.clone();
            Ok(match ast.ty {
                ExprType::Int => Box::new(move |c: &mut C| {
                    let v = f(c)?;
                    c.set(&name, Field::I64(v.as_i64().unwrap_or(0)));
                    Ok(v)
                }),
                ExprType::Float => Box::new(move |c: &mut C| {
                    let v = f(c)?;
                    c.set(&name, Field::F64(v.as_f64().unwrap_or(0.0)));
                    Ok(v)
                }),
                ExprType::Bool => Box::new(move |c: &mut C| {
                    let v = f(c)?;
                    c.set(&name, Field::Bool(v.as_bool().unwrap_or(false)));
                    Ok(v)
                }),
                ExprType::Unknown => unreachable!("assign target not inferred"),
            })
        }

        AstKind::Unary { op } => {
            let f = emit(&ast.children[0], vars)?;
            Ok(match op {
                UnaryOp::Plus => f,
                UnaryOp::Neg => {
                    if ast.ty == ExprType::Float {
                        Box::new(move |c: &mut C| {
                            let v = f(c)?;
                            Ok(Field::F64(-v.as_f64().unwrap_or(0.0)))
                        })
                    } else {
                        Box::new(move |c: &mut C| {
                            let v = f(c)?;
                            Ok(Field::I64(-v.as_i64().unwrap_or(0)))
                        })
                    }
                }
                UnaryOp::Not => Box::new(move |c: &mut C| {
                    let v = f(c)?;
                    Ok(Field::Bool(!v.as_bool().unwrap_or(false)))
                }),
            })
        }

        AstKind::Binary { op } => emit_binary(ast, vars, *op),

        AstKind::Ternary => {
            let cond = emit(&ast.children[0], vars)?;
            let then = emit(&ast.children[1], vars)?;
            let other = emit(&ast.children[2], vars)?;
            Ok(Box::new(move |c: &mut C| {
                if cond(c)?.as_bool().unwrap_or(false) {
                    then(c)
                } else {
                    other(c)
                }
            }))
        }

        AstKind::Call { name } => {
            let mut args = Vec::with_capacity(ast.children.len());
            for child in &ast.children {
                args.push(emit(child, vars)?);
            }
            let name = name.clone();
            Ok(Box::new(move |c: &mut C| {
                let mut vals = Vec::with_capacity(args.len());
                for arg in &args {
                    vals.push(arg(c)?);
                }
                c.exec(&name, &vals)
                    .ok_or_else(|| ExprError::IllFunc(name.clone()))
            }))
        }

        AstKind::Ident { name } => {
            let name = name.clone();
            Ok(Box::new(move |c: &mut C| {
                c.get(&name).ok_or_else(|| ExprError::KeyMiss(name.clone()))
            }))
        }

        AstKind::TryIdent { name } => {
            let zero = match vars.get(name) {
                Some(ExprType::Int) => Field::I64(0),
                Some(ExprType::Float) => Field::F64(0.0),
                Some(ExprType::Bool) => Field::Bool(false),
                _ => unreachable!("try-ident not declared"),
            };
            let name = name.clone();
            Ok(Box::new(move |c: &mut C| {
                Ok(c.get(&name).unwrap_or_else(|| zero.clone()))
            }))
        }

        AstKind::Number { lexeme } => {
            let raw: f64 = lexeme
                .parse()
                .map_err(|_| ExprError::NumberFormat(lexeme.clone()))?;
            let v = match ast.ty {
                ExprType::Int => Field::I64(raw as i64),
                ExprType::Float => Field::F64(raw),
                ExprType::Bool => Field::Bool(raw as i64 != 0),
                ExprType::Unknown => unreachable!("number not inferred"),
            };
            Ok(Box::new(move |_: &mut C| Ok(v.clone())))
        }

        AstKind::Bool { value } => {
            let v = Field::Bool(*value);
            Ok(Box::new(move |_: &mut C| Ok(v.clone())))
        }
    }
}

fn emit_binary<C: Ctx + 'static>(
    ast: &Ast,
    vars: &VarTable,
    op: BinOp,
) -> Result<BoxFn<C>, ExprError> {
    let f0 = emit(&ast.children[0], vars)?;
    let f1 = emit(&ast.children[1], vars)?;

    // Short-circuit: the deciding operand's value is the result.
    if op == BinOp::Or {
        return Ok(Box::new(move |c: &mut C| {
            let v0 = f0(c)?;
            if v0.as_bool().unwrap_or(false) {
                return Ok(v0);
            }
            f1(c)
        }));
    }
    if op == BinOp::And {
        return Ok(Box::new(move |c: &mut C| {
            let v0 = f0(c)?;
            if !v0.as_bool().unwrap_or(false) {
                return Ok(v0);
            }
            f1(c)
        }));
    }

    // Both operands share a family after down-inference.
    Ok(match ast.children[0].ty {
        ExprType::Bool => {
            let g = bool_op(op);
            Box::new(move |c: &mut C| {
                let a = f0(c)?.as_bool().unwrap_or(false);
                let b = f1(c)?.as_bool().unwrap_or(false);
                Ok(g(a, b))
            })
        }
        ExprType::Float => {
            let g = float_op(op);
            Box::new(move |c: &mut C| {
                let a = f0(c)?.as_f64().unwrap_or(0.0);
                let b = f1(c)?.as_f64().unwrap_or(0.0);
                Ok(g(a, b))
            })
        }
        _ => {
            let g = int_op(op);
            Box::new(move |c: &mut C| {
                let a = f0(c)?.as_i64().unwrap_or(0);
                let b = f1(c)?.as_i64().unwrap_or(0);
                Ok(g(a, b))
            })
        }
    })
}

fn int_op(op: BinOp) -> fn(i64, i64) -> Field {
    match op {
        BinOp::Pow => |a, b| Field::I64(ipow(a, b)),
        BinOp::Mul => |a, b| Field::I64(a.wrapping_mul(b)),
        BinOp::Div => |a, b| Field::I64(a / b),
        BinOp::Rem => |a, b| Field::I64(a % b),
        BinOp::Add => |a, b| Field::I64(a.wrapping_add(b)),
        BinOp::Sub => |a, b| Field::I64(a.wrapping_sub(b)),
        BinOp::Eq => |a, b| Field::Bool(a == b),
        BinOp::Ne => |a, b| Field::Bool(a != b),
        BinOp::Lt => |a, b| Field::Bool(a < b),
        BinOp::Le => |a, b| Field::Bool(a <= b),
        BinOp::Gt => |a, b| Field::Bool(a > b),
        BinOp::Ge => |a, b| Field::Bool(a >= b),
        BinOp::And | BinOp::Or => unreachable!("logic ops short-circuit"),
    }
}

fn float_op(op: BinOp) -> fn(f64, f64) -> Field {
    match op {
        BinOp::Pow => |a, b| Field::F64(a.powf(b)),
        BinOp::Mul => |a, b| Field::F64(a * b),
        BinOp::Div => |a, b| Field::F64(a / b),
        BinOp::Add => |a, b| Field::F64(a + b),
        BinOp::Sub => |a, b| Field::F64(a - b),
        BinOp::Eq => |a, b| Field::Bool(a == b),
        BinOp::Ne => |a, b| Field::Bool(a != b),
        BinOp::Lt => |a, b| Field::Bool(a < b),
        BinOp::Le => |a, b| Field::Bool(a <= b),
        BinOp::Gt => |a, b| Field::Bool(a > b),
        BinOp::Ge => |a, b| Field::Bool(a >= b),
        BinOp::Rem | BinOp::And | BinOp::Or => unreachable!("rejected by inference"),
    }
}

fn bool_op(op: BinOp) -> fn(bool, bool) -> Field {
    match op {
        BinOp::Eq => |a, b| Field::Bool(a == b),
        BinOp::Ne => |a, b| Field::Bool(a != b),
        _ => unreachable!("rejected by inference"),
    }
}

/// Integer power by squaring. A non-positive exponent yields 1, matching the
/// float path's `x^0`.
fn ipow(mut a: i64, mut b: i64) -> i64 {
    let mut acc = 1i64;
    while b > 0 {
        if b & 1 != 0 {
            acc = acc.wrapping_mul(a);
        }
        a = a.wrapping_mul(a);
        b >>= 1;
    }
    acc
}

/// Specializes the statement sequence for the common small arities before
/// falling back to a loop: evaluate each statement in order, propagate the
/// first error, return the last value.
fn inline_program<C: Ctx + 'static>(mut fs: Vec<BoxFn<C>>) -> BoxFn<C> {
    match fs.len() {
        0 => Box::new(|_| Ok(Field::unit())),
        1 => fs.pop().expect("len checked"),
        2 => {
            let f1 = fs.pop().expect("len checked");
            let f0 = fs.pop().expect("len checked");
            Box::new(move |c| {
                f0(c)?;
                f1(c)
            })
        }
        3 => {
            let f2 = fs.pop().expect("len checked");
            let f1 = fs.pop().expect("len checked");
            let f0 = fs.pop().expect("len checked");
            Box::new(move |c| {
                f0(c)?;
                f1(c)?;
                f2(c)
            })
        }
        4 => {
            let f3 = fs.pop().expect("len checked");
            let f2 = fs.pop().expect("len checked");
            let f1 = fs.pop().expect("len checked");
            let f0 = fs.pop().expect("len checked");
            Box::new(move |c| {
                f0(c)?;
                f1(c)?;
                f2(c)?;
                f3(c)
            })
        }
        5 => {
            let f4 = fs.pop().expect("len checked");
            let f3 = fs.pop().expect("len checked");
            let f2 = fs.pop().expect("len checked");
            let f1 = fs.pop().expect("len checked");
            let f0 = fs.pop().expect("len checked");
            Box::new(move |c| {
                f0(c)?;
                f1(c)?;
                f2(c)?;
                f3(c)?;
                f4(c)
            })
        }
        _ => Box::new(move |c| {
            let mut last = Field::unit();
            for f in &fs {
                last = f(c)?;
            }
            Ok(last)
        }),
    }
}
