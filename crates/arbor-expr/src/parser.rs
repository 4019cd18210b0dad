//! Precedence-climbing parser.
//!
//! ```text
//! program := stmt (';' stmt)* ';'?
//! stmt    := var_decl | expr
//! expr    := ident '=' ternary | ternary
//! ternary := or ('?' ternary ':' ternary)?
//! or      := and ('||' and)*
//! and     := rel ('&&' rel)*
//! rel     := add (('=='|'!='|'<'|'<='|'>'|'>=') add)*
//! add     := mul (('+'|'-') mul)*
//! mul     := unary (('*'|'/'|'%') unary)*
//! unary   := ('+'|'-'|'!')? pow
//! pow     := primary ('^' pow)?            right-associative
//! primary := number | bool | ident ('(' args? ')')? | '(' expr ')'
//! ```

use crate::ast::{Ast, AstKind, BinOp, ExprType, UnaryOp};
use crate::error::ExprError;
use crate::lexer::{lex, Tok};

pub(crate) fn parse(source: &str) -> Result<Ast, ExprError> {
    let mut parser = Parser {
        toks: lex(source)?,
        pos: 0,
    };
    parser.program()
}

struct Parser {
    toks: Vec<Tok>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Tok> {
        self.toks.get(self.pos + offset)
    }

    fn bump(&mut self) -> Option<Tok> {
        let tok = self.toks.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, want: &Tok) -> bool {
        if self.peek() == Some(want) {
            self.pos += 1;
            return true;
        }
        false
    }

    fn expect(&mut self, want: &Tok) -> Result<(), ExprError> {
        match self.bump() {
            Some(tok) if tok == *want => Ok(()),
            Some(tok) => Err(ExprError::UnexpectedToken(tok.to_string())),
            None => Err(ExprError::UnexpectedEof),
        }
    }

    fn program(&mut self) -> Result<Ast, ExprError> {
        let mut stmts = Vec::new();
        loop {
            // Tolerate stray separators between statements.
            while self.eat(&Tok::Semi) {}
            if self.peek().is_none() {
                break;
            }
            stmts.push(self.stmt()?);
            match self.peek() {
                None => break,
                Some(Tok::Semi) => continue,
                Some(tok) => return Err(ExprError::UnexpectedToken(tok.to_string())),
            }
        }
        if stmts.is_empty() {
            return Err(ExprError::UnexpectedEof);
        }
        Ok(Ast::with_children(AstKind::Program, stmts))
    }

    fn stmt(&mut self) -> Result<Ast, ExprError> {
        let decl = match self.peek() {
            Some(Tok::KwInt) => Some(ExprType::Int),
            Some(Tok::KwFloat) => Some(ExprType::Float),
            Some(Tok::KwBool) => Some(ExprType::Bool),
            _ => None,
        };
        match decl {
            Some(decl) => self.var_decl(decl),
            None => self.expr(),
        }
    }

    fn var_decl(&mut self, decl: ExprType) -> Result<Ast, ExprError> {
        self.bump();
        let mut names = vec![self.ident()?];
        while self.eat(&Tok::Comma) {
            names.push(self.ident()?);
        }
        Ok(Ast::new(AstKind::VarDecl { decl, names }))
    }

    fn ident(&mut self) -> Result<String, ExprError> {
        match self.bump() {
            Some(Tok::Ident(name)) => Ok(name),
            Some(tok) => Err(ExprError::UnexpectedToken(tok.to_string())),
            None => Err(ExprError::UnexpectedEof),
        }
    }

    fn expr(&mut self) -> Result<Ast, ExprError> {
        if let (Some(Tok::Ident(_)), Some(Tok::Assign)) = (self.peek(), self.peek_at(1)) {
            let name = self.ident()?;
            self.bump();
            let value = self.ternary()?;
            return Ok(Ast::with_children(AstKind::Assign { name }, vec![value]));
        }
        self.ternary()
    }

    fn ternary(&mut self) -> Result<Ast, ExprError> {
        let cond = self.or()?;
        if !self.eat(&Tok::Question) {
            return Ok(cond);
        }
        let then = self.ternary()?;
        self.expect(&Tok::Colon)?;
        let other = self.ternary()?;
        Ok(Ast::with_children(AstKind::Ternary, vec![cond, then, other]))
    }

    fn or(&mut self) -> Result<Ast, ExprError> {
        let mut lhs = self.and()?;
        while self.eat(&Tok::OrOr) {
            let rhs = self.and()?;
            lhs = binary(BinOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Ast, ExprError> {
        let mut lhs = self.rel()?;
        while self.eat(&Tok::AndAnd) {
            let rhs = self.rel()?;
            lhs = binary(BinOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn rel(&mut self) -> Result<Ast, ExprError> {
        let mut lhs = self.add()?;
        loop {
            let op = match self.peek() {
                Some(Tok::EqEq) => BinOp::Eq,
                Some(Tok::NotEq) => BinOp::Ne,
                Some(Tok::Less) => BinOp::Lt,
                Some(Tok::LessEq) => BinOp::Le,
                Some(Tok::Greater) => BinOp::Gt,
                Some(Tok::GreaterEq) => BinOp::Ge,
                _ => return Ok(lhs),
            };
            self.bump();
            let rhs = self.add()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn add(&mut self) -> Result<Ast, ExprError> {
        let mut lhs = self.mul()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Plus) => BinOp::Add,
                Some(Tok::Minus) => BinOp::Sub,
                _ => return Ok(lhs),
            };
            self.bump();
            let rhs = self.mul()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn mul(&mut self) -> Result<Ast, ExprError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Star) => BinOp::Mul,
                Some(Tok::Slash) => BinOp::Div,
                Some(Tok::Percent) => BinOp::Rem,
                _ => return Ok(lhs),
            };
            self.bump();
            let rhs = self.unary()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn unary(&mut self) -> Result<Ast, ExprError> {
        let op = match self.peek() {
            Some(Tok::Plus) => Some(UnaryOp::Plus),
            Some(Tok::Minus) => Some(UnaryOp::Neg),
            Some(Tok::Bang) => Some(UnaryOp::Not),
            _ => None,
        };
        let Some(op) = op else {
            return self.pow();
        };
        self.bump();
        let operand = self.pow()?;
        Ok(Ast::with_children(AstKind::Unary { op }, vec![operand]))
    }

    fn pow(&mut self) -> Result<Ast, ExprError> {
        let base = self.primary()?;
        if !self.eat(&Tok::Caret) {
            return Ok(base);
        }
        let exp = self.pow()?;
        Ok(binary(BinOp::Pow, base, exp))
    }

    fn primary(&mut self) -> Result<Ast, ExprError> {
        match self.bump() {
            Some(Tok::Number(lexeme)) => Ok(Ast::new(AstKind::Number { lexeme })),
            Some(Tok::True) => Ok(Ast::new(AstKind::Bool { value: true })),
            Some(Tok::False) => Ok(Ast::new(AstKind::Bool { value: false })),
            Some(Tok::Ident(name)) => {
                if self.eat(&Tok::LParen) {
                    let mut args = Vec::new();
                    if !self.eat(&Tok::RParen) {
                        loop {
                            args.push(self.expr()?);
                            if self.eat(&Tok::Comma) {
                                continue;
                            }
                            self.expect(&Tok::RParen)?;
                            break;
                        }
                    }
                    return Ok(Ast::with_children(AstKind::Call { name }, args));
                }
                if name.starts_with('_') {
                    Ok(Ast::new(AstKind::TryIdent { name }))
                } else {
                    Ok(Ast::new(AstKind::Ident { name }))
                }
            }
            Some(Tok::LParen) => {
                let inner = self.expr()?;
                self.expect(&Tok::RParen)?;
                Ok(inner)
            }
            Some(tok) => Err(ExprError::UnexpectedToken(tok.to_string())),
            None => Err(ExprError::UnexpectedEof),
        }
    }
}

fn binary(op: BinOp, lhs: Ast, rhs: Ast) -> Ast {
    Ast::with_children(AstKind::Binary { op }, vec![lhs, rhs])
}
