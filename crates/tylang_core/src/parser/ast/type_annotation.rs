//! Parsed type annotations, as written by the programmer. Resolved into a
//! semantic [`crate::typechecker::Type`] once a [`crate::typechecker::Context`]
//! with the global type registry is available.

use crate::lexer::{GetPosition, Span, Token};
use crate::parser::{direct_parsing::DirectParser, expect_id, FromTokens, ParseError, ParseState};

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TypeAnnotation {
    /// A bare name: `Int`, `Point`, a type parameter reference, ...
    Simple(String, Span),
    /// A name applied to type arguments: `List[Int]`, `Map[String, Point]`
    Generic(String, Vec<TypeAnnotation>, Span),
    /// `(A, B) => C`, or the single-parameter shorthand `A => C`
    Function {
        params: Vec<TypeAnnotation>,
        return_type: Box<TypeAnnotation>,
        position: Span,
    },
    /// An anonymous structural record shape: `{ x: Int, y: Int }`
    Structural(Vec<(String, TypeAnnotation)>, Span),
}

impl TypeAnnotation {
    pub fn position(&self) -> Span {
        match self {
            TypeAnnotation::Simple(_, p) => p.clone(),
            TypeAnnotation::Generic(_, _, p) => p.clone(),
            TypeAnnotation::Function { position, .. } => position.clone(),
            TypeAnnotation::Structural(_, p) => p.clone(),
        }
    }

    fn parse_primary(tokens: &mut ParseState<Token>) -> Result<Self, ParseError> {
        let start = tokens.current_span();

        if DirectParser::parse_terminal(tokens, Token::is_lbrace, "{").is_ok() {
            let members = DirectParser::parse_separated(
                tokens,
                |t| {
                    let name = expect_id(t, "a structural member name")?;
                    DirectParser::parse_terminal(t, Token::is_colon, ":")?;
                    let ty = TypeAnnotation::parse(t)?;
                    Ok((name, ty))
                },
                |t| DirectParser::parse_terminal(t, Token::is_comma, ","),
            )?;
            DirectParser::parse_terminal(tokens, Token::is_rbrace, "}")?;
            return Ok(TypeAnnotation::Structural(members, start));
        }

        let name = expect_id(tokens, "a type name")?;

        if DirectParser::parse_terminal(tokens, Token::is_lbracket, "[").is_ok() {
            let args = DirectParser::parse_separated(
                tokens,
                TypeAnnotation::parse,
                |t| DirectParser::parse_terminal(t, Token::is_comma, ","),
            )?;
            DirectParser::parse_terminal(tokens, Token::is_rbracket, "]")?;
            return Ok(TypeAnnotation::Generic(name, args, start));
        }

        Ok(TypeAnnotation::Simple(name, start))
    }

    fn try_parse_paren_param_list(
        tokens: &mut ParseState<Token>,
    ) -> Result<Vec<TypeAnnotation>, ParseError> {
        let rewind = tokens.get_index();

        let attempt = (|| {
            DirectParser::parse_terminal(tokens, Token::is_lparen, "(")?;
            let params = DirectParser::parse_separated(
                tokens,
                TypeAnnotation::parse,
                |t| DirectParser::parse_terminal(t, Token::is_comma, ","),
            )?;
            DirectParser::parse_terminal(tokens, Token::is_rparen, ")")?;
            Ok(params)
        })();

        if attempt.is_err() {
            tokens.set_index(rewind);
        }

        attempt
    }
}

impl FromTokens<Token> for TypeAnnotation {
    fn parse(tokens: &mut ParseState<Token>) -> Result<Self, ParseError> {
        let start = tokens.current_span();

        if let Ok(params) = Self::try_parse_paren_param_list(tokens) {
            if DirectParser::parse_terminal(tokens, Token::is_fat_arrow, "=>").is_ok() {
                let return_type = TypeAnnotation::parse(tokens)?;
                return Ok(TypeAnnotation::Function {
                    params,
                    position: start.merge(&return_type.position()),
                    return_type: Box::new(return_type),
                });
            }

            // a parenthesised single type is just that type, grouped
            if params.len() == 1 {
                return Ok(params.into_iter().next().unwrap());
            }

            return Err(ParseError {
                message: "expected '=>' after a parenthesised type list".into(),
                position: Some(start),
            });
        }

        let primary = Self::parse_primary(tokens)?;

        if DirectParser::parse_terminal(tokens, Token::is_fat_arrow, "=>").is_ok() {
            let return_type = TypeAnnotation::parse(tokens)?;
            return Ok(TypeAnnotation::Function {
                position: start.merge(&return_type.position()),
                params: vec![primary],
                return_type: Box::new(return_type),
            });
        }

        Ok(primary)
    }
}

impl std::fmt::Display for TypeAnnotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeAnnotation::Simple(name, _) => write!(f, "{name}"),
            TypeAnnotation::Generic(name, args, _) => write!(
                f,
                "{name}[{}]",
                args.iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            TypeAnnotation::Function {
                params,
                return_type,
                ..
            } => write!(
                f,
                "({}) => {return_type}",
                params
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            TypeAnnotation::Structural(members, _) => write!(
                f,
                "{{ {} }}",
                members
                    .iter()
                    .map(|(n, t)| format!("{n}: {t}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex_significant;

    fn parse(input: &str) -> TypeAnnotation {
        let tokens = lex_significant(input, "test").expect("lex failed");
        let mut state = ParseState::from(tokens);
        TypeAnnotation::parse(&mut state).expect("parse failed")
    }

    #[test]
    fn parses_simple() {
        assert!(matches!(parse("Int"), TypeAnnotation::Simple(n, _) if n == "Int"));
    }

    #[test]
    fn parses_generic() {
        assert!(matches!(parse("List[Int]"), TypeAnnotation::Generic(n, args, _) if n == "List" && args.len() == 1));
    }

    #[test]
    fn parses_function_type() {
        assert!(matches!(
            parse("(Int, Int) => Int"),
            TypeAnnotation::Function { params, .. } if params.len() == 2
        ));
    }

    #[test]
    fn parses_single_param_shorthand() {
        assert!(matches!(
            parse("Int => Int"),
            TypeAnnotation::Function { params, .. } if params.len() == 1
        ));
    }

    #[test]
    fn parses_structural() {
        assert!(matches!(
            parse("{ x: Int, y: Int }"),
            TypeAnnotation::Structural(members, _) if members.len() == 2
        ));
    }
}
