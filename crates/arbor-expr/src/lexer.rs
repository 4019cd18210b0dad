use std::fmt;

use logos::Logos;

use crate::error::ExprError;

/// Expression token. Numbers keep their lexeme: ill-formed forms like
/// `3.14.159` lex as a single token and are rejected when the constant is
/// folded.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub(crate) enum Tok {
    #[token("int")]
    KwInt,
    #[token("float")]
    KwFloat,
    #[token("bool")]
    KwBool,
    #[token("true")]
    True,
    #[token("false")]
    False,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_owned())]
    Ident(String),
    #[regex(r"[0-9][0-9.]*", |lex| lex.slice().to_owned())]
    Number(String),

    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<=")]
    LessEq,
    #[token(">=")]
    GreaterEq,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("<")]
    Less,
    #[token(">")]
    Greater,
    #[token("=")]
    Assign,
    #[token("!")]
    Bang,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("^")]
    Caret,
    #[token("?")]
    Question,
    #[token(":")]
    Colon,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,
    #[token(";")]
    Semi,
}

impl fmt::Display for Tok {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Tok::KwInt => "int",
            Tok::KwFloat => "float",
            Tok::KwBool => "bool",
            Tok::True => "true",
            Tok::False => "false",
            Tok::Ident(s) | Tok::Number(s) => s,
            Tok::EqEq => "==",
            Tok::NotEq => "!=",
            Tok::LessEq => "<=",
            Tok::GreaterEq => ">=",
            Tok::AndAnd => "&&",
            Tok::OrOr => "||",
            Tok::Less => "<",
            Tok::Greater => ">",
            Tok::Assign => "=",
            Tok::Bang => "!",
            Tok::Plus => "+",
            Tok::Minus => "-",
            Tok::Star => "*",
            Tok::Slash => "/",
            Tok::Percent => "%",
            Tok::Caret => "^",
            Tok::Question => "?",
            Tok::Colon => ":",
            Tok::LParen => "(",
            Tok::RParen => ")",
            Tok::Comma => ",",
            Tok::Semi => ";",
        };
        f.write_str(s)
    }
}

/// Tokenizes `source`; an unrecognized character is a parse error naming the
/// offending slice.
pub(crate) fn lex(source: &str) -> Result<Vec<Tok>, ExprError> {
    let mut toks = Vec::new();
    for (res, span) in Tok::lexer(source).spanned() {
        match res {
            Ok(tok) => toks.push(tok),
            Err(()) => return Err(ExprError::UnexpectedToken(source[span].to_owned())),
        }
    }
    Ok(toks)
}
