//! Statement AST nodes: expression statements, `val`/`var` declarations and
//! `return`.

use crate::lexer::{GetPosition, Span, Token};
use crate::parser::{direct_parsing::DirectParser, expect_id, FromTokens, ParseError, ParseState};

use super::{Expression, TypeAnnotation};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VarDeclaration<T> {
    pub name: String,
    pub type_annotation: Option<TypeAnnotation>,
    pub value: Expression<T>,
    pub mutable: bool,
    pub info: T,
    pub position: Span,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ReturnStatement<T> {
    pub value: Option<Expression<T>>,
    pub info: T,
    pub position: Span,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Statement<T> {
    Expression(Expression<T>),
    VarDeclaration(VarDeclaration<T>),
    Return(ReturnStatement<T>),
}

impl<T: Clone> Statement<T> {
    pub fn get_info(&self) -> T {
        match self {
            Statement::Expression(e) => e.get_info(),
            Statement::VarDeclaration(VarDeclaration { info, .. }) => info.clone(),
            Statement::Return(ReturnStatement { info, .. }) => info.clone(),
        }
    }

    pub fn position(&self) -> Span {
        match self {
            Statement::Expression(e) => e.position(),
            Statement::VarDeclaration(VarDeclaration { position, .. }) => position.clone(),
            Statement::Return(ReturnStatement { position, .. }) => position.clone(),
        }
    }
}

impl FromTokens<Token> for Statement<()> {
    fn parse(tokens: &mut ParseState<Token>) -> Result<Self, ParseError> {
        let start = tokens.current_span();

        if matches!(tokens.peek(), Some(Token::Val { .. }) | Some(Token::Var { .. })) {
            let mutable = matches!(tokens.peek(), Some(Token::Var { .. }));
            tokens.next();

            let name = expect_id(tokens, "a variable name")?;

            let type_annotation = if DirectParser::parse_terminal(tokens, Token::is_colon, ":").is_ok()
            {
                Some(TypeAnnotation::parse(tokens)?)
            } else {
                None
            };

            DirectParser::parse_terminal(tokens, Token::is_assign, "=")?;
            let value = Expression::parse(tokens)?;
            let end = value.position();

            consume_optional_semicolon(tokens);

            return Ok(Statement::VarDeclaration(VarDeclaration {
                name,
                type_annotation,
                position: start.merge(&end),
                value,
                mutable,
                info: (),
            }));
        }

        if matches!(tokens.peek(), Some(Token::Return { .. })) {
            tokens.next();

            let value = if matches!(
                tokens.peek(),
                None | Some(Token::RBrace { .. }) | Some(Token::Semicolon { .. })
            ) {
                None
            } else {
                Some(Expression::parse(tokens)?)
            };

            let end = value
                .as_ref()
                .map(|v| v.position())
                .unwrap_or_else(|| start.clone());

            consume_optional_semicolon(tokens);

            return Ok(Statement::Return(ReturnStatement {
                value,
                info: (),
                position: start.merge(&end),
            }));
        }

        let expr = Expression::parse(tokens)?;
        consume_optional_semicolon(tokens);
        Ok(Statement::Expression(expr))
    }
}

/// Semicolons are optional statement terminators; a block or the end of
/// input terminates a statement just as well.
fn consume_optional_semicolon(tokens: &mut ParseState<Token>) {
    let _ = DirectParser::parse_terminal(tokens, Token::is_semicolon, ";");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex_significant;

    fn parse(input: &str) -> Statement<()> {
        let tokens = lex_significant(input, "test").expect("lex failed");
        let mut state = ParseState::from(tokens);
        Statement::parse(&mut state).expect("parse failed")
    }

    #[test]
    fn parses_val_declaration() {
        let stmt = parse("val x = 1");
        let Statement::VarDeclaration(decl) = stmt else {
            panic!("expected var declaration")
        };
        assert_eq!(decl.name, "x");
        assert!(!decl.mutable);
    }

    #[test]
    fn parses_var_declaration_with_type() {
        let stmt = parse("var x: Int = 1");
        let Statement::VarDeclaration(decl) = stmt else {
            panic!("expected var declaration")
        };
        assert!(decl.mutable);
        assert!(decl.type_annotation.is_some());
    }

    #[test]
    fn parses_return_with_value() {
        let stmt = parse("return 1 + 2");
        assert!(matches!(stmt, Statement::Return(ReturnStatement { value: Some(_), .. })));
    }

    #[test]
    fn parses_bare_return() {
        let stmt = parse("return");
        assert!(matches!(stmt, Statement::Return(ReturnStatement { value: None, .. })));
    }

    #[test]
    fn parses_expression_statement() {
        assert!(matches!(parse("foo()"), Statement::Expression(_)));
    }
}
