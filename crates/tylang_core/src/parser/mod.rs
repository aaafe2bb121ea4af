//! Turns a significant (trivia-filtered) token stream into an untyped AST
//! (`TopLevelStatement<()>`), via hand-written recursive-descent parsing
//! functions implementing [`FromTokens`] for each AST node kind.
//!
//! The grammar is driven by [`direct_parsing::DirectParser`]'s small
//! combinator-free helpers (`parse_terminal`, `parse_optional`,
//! `parse_separated`, `parse_repetition`) rather than the generic
//! [`combinators::Comb`] engine also present in this module: `Comb`'s
//! point-free `>> | ! ^ %` operators compose poorly with the lookahead
//! tylang's grammar needs (lambda-vs-parenthesised-expression disambiguation,
//! trailing-lambda sugar, operator precedence climbing), so it is kept
//! around as general-purpose parsing infrastructure without being the
//! primary driver.

pub mod ast;
pub mod combinators;
pub mod direct_parsing;
pub mod parse_state;

#[cfg(test)]
pub mod test_helpers;

use std::{error::Error, fmt::Display};

use crate::lexer::{lex_significant, LexError, Span, Token};

pub use self::parse_state::ParseState;
use self::ast::TopLevelStatement;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ParseError {
    pub message: String,
    pub position: Option<Span>,
}

impl ParseError {
    pub fn eof(item: &str) -> ParseError {
        ParseError {
            message: format!("hit end of input while parsing {item}"),
            position: None,
        }
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(pos) = &self.position {
            f.write_str(pos.to_string(&self.message).as_str())
        } else {
            f.write_str(&self.message)
        }
    }
}

impl Error for ParseError {}

/// Converts a token stream slice into an AST node of type `Self`, consuming
/// exactly the tokens that belong to it and leaving the rest for the
/// caller. Every AST node at every compilation stage parses from `()`-typed
/// tokens; type information is attached later by the type checker.
pub trait FromTokens<T>: Sized {
    fn parse(tokens: &mut ParseState<T>) -> Result<Self, ParseError>;
}

#[derive(Debug)]
pub enum ProgramError {
    Lex(LexError),
    Parse(ParseError),
}

impl Display for ProgramError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProgramError::Lex(e) => write!(f, "{e}"),
            ProgramError::Parse(e) => write!(f, "{e}"),
        }
    }
}

impl Error for ProgramError {}

impl From<LexError> for ProgramError {
    fn from(value: LexError) -> Self {
        ProgramError::Lex(value)
    }
}

impl From<ParseError> for ProgramError {
    fn from(value: ParseError) -> Self {
        ProgramError::Parse(value)
    }
}

/// Lexes and parses a complete source file into its top-level declarations.
pub fn parse_program(
    source: &str,
    file: impl Into<String>,
) -> Result<Vec<TopLevelStatement<()>>, ProgramError> {
    let tokens = lex_significant(source, file)?;
    let mut state = ParseState::from(tokens);

    let mut statements = vec![];
    while state.peek().is_some() {
        statements.push(TopLevelStatement::parse(&mut state)?);
    }

    Ok(statements)
}

pub(crate) fn expect_id(tokens: &mut ParseState<Token>, what: &str) -> Result<String, ParseError> {
    let position = tokens.current_span();
    match tokens.next() {
        Some(Token::Id { text, .. }) => Ok(text),
        _ => Err(ParseError {
            message: format!("expected {what}"),
            position: Some(position),
        }),
    }
}
