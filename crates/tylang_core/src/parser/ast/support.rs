//! Small AST fragments shared across declarations: parameters, type
//! parameters with declaration-site variance, and primary constructors.

use crate::lexer::{GetPosition, Span, Token};
use crate::parser::{direct_parsing::DirectParser, parse_state::ParseState, FromTokens, ParseError};

use super::TypeAnnotation;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Variance {
    /// `+T` - the enclosing type is a subtype when `T` is narrowed
    Covariant,
    /// `-T` - the enclosing type is a subtype when `T` is widened
    Contravariant,
    /// `T` - no variance annotation; `T` must match exactly
    Invariant,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TypeParameter {
    pub name: String,
    pub variance: Variance,
    pub position: Span,
}

impl FromTokens<Token> for TypeParameter {
    fn parse(tokens: &mut ParseState<Token>) -> Result<Self, ParseError> {
        let start = tokens.current_span();

        let variance = if DirectParser::parse_terminal(tokens, Token::is_plus, "+").is_ok() {
            Variance::Covariant
        } else if DirectParser::parse_terminal(tokens, Token::is_minus, "-").is_ok() {
            Variance::Contravariant
        } else {
            Variance::Invariant
        };

        let Some(Token::Id { text: name, .. }) = tokens.next() else {
            return Err(ParseError {
                message: "expected a type parameter name".into(),
                position: Some(start),
            });
        };

        Ok(TypeParameter {
            name,
            variance,
            position: start,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Parameter {
    pub name: String,
    pub type_annotation: TypeAnnotation,
    pub position: Span,
}

impl FromTokens<Token> for Parameter {
    fn parse(tokens: &mut ParseState<Token>) -> Result<Self, ParseError> {
        let start = tokens.current_span();

        let Some(Token::Id { text: name, .. }) = tokens.next() else {
            return Err(ParseError {
                message: "expected a parameter name".into(),
                position: Some(start),
            });
        };

        DirectParser::parse_terminal(tokens, Token::is_colon, ":")?;

        let type_annotation = TypeAnnotation::parse(tokens)?;

        Ok(Parameter {
            name,
            type_annotation,
            position: start,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// A class's primary constructor: a parenthesised, comma separated
/// parameter list directly after the class name, e.g. `class Point(x: Int,
/// y: Int)`. Every parameter becomes a field of the class.
pub struct Constructor {
    pub params: Vec<Parameter>,
    pub position: Span,
}

impl FromTokens<Token> for Constructor {
    fn parse(tokens: &mut ParseState<Token>) -> Result<Self, ParseError> {
        let start = tokens.current_span();

        DirectParser::parse_terminal(tokens, Token::is_lparen, "(")?;

        let params = DirectParser::parse_separated(tokens, Parameter::parse, |t| {
            DirectParser::parse_terminal(t, Token::is_comma, ",")
        })?;

        DirectParser::parse_terminal(tokens, Token::is_rparen, ")")?;

        Ok(Constructor {
            params,
            position: start,
        })
    }
}
