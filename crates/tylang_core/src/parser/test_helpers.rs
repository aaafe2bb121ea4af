//! Small helpers shared by unit tests elsewhere in this crate.

use crate::lexer::lex_significant;
use crate::parser::ast::{Expression, TopLevelStatement};
use crate::parser::{FromTokens, ParseState};

pub fn parse_expression(code: &str) -> Result<Expression<()>, String> {
    let tokens = lex_significant(code, "test").map_err(|e| e.to_string())?;
    let mut state = ParseState::from(tokens);
    Expression::parse(&mut state).map_err(|e| e.to_string())
}

pub fn parse_top_level(code: &str) -> Result<TopLevelStatement<()>, String> {
    let tokens = lex_significant(code, "test").map_err(|e| e.to_string())?;
    let mut state = ParseState::from(tokens);
    TopLevelStatement::parse(&mut state).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_expression() {
        let result = parse_expression("42").unwrap();
        assert!(matches!(result, Expression::Int(42, ..)));
    }

    #[test]
    fn test_parse_top_level() {
        let result = parse_top_level("fun id(x: Int): Int = x").unwrap();
        assert!(matches!(result, TopLevelStatement::Function(_)));
    }
}
