//! Top-level declarations: functions, classes, traits, objects and
//! extensions.

use crate::lexer::{GetPosition, Span, Token};
use crate::parser::{direct_parsing::DirectParser, expect_id, FromTokens, ParseError, ParseState};

use super::{Constructor, Expression, Parameter, Statement, TypeAnnotation, TypeParameter};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Function<T> {
    pub name: String,
    pub type_params: Vec<TypeParameter>,
    pub params: Vec<Parameter>,
    pub return_type: Option<TypeAnnotation>,
    /// `None` for an abstract trait method with no implementation.
    pub body: Option<Expression<T>>,
    pub info: T,
    pub position: Span,
}

impl FromTokens<Token> for Function<()> {
    fn parse(tokens: &mut ParseState<Token>) -> Result<Self, ParseError> {
        let start = tokens.current_span();
        DirectParser::parse_terminal(tokens, |t| matches!(t, Token::Fun { .. }), "fun")?;
        let name = expect_id(tokens, "a function name")?;

        let type_params = parse_bracketed_type_params(tokens)?;

        DirectParser::parse_terminal(tokens, Token::is_lparen, "(")?;
        let params = DirectParser::parse_separated(tokens, Parameter::parse, |t| {
            DirectParser::parse_terminal(t, Token::is_comma, ",")
        })?;
        let mut end = tokens.current_span();
        DirectParser::parse_terminal(tokens, Token::is_rparen, ")")?;

        let return_type = if DirectParser::parse_terminal(tokens, Token::is_colon, ":").is_ok() {
            let ty = TypeAnnotation::parse(tokens)?;
            end = ty.position();
            Some(ty)
        } else {
            None
        };

        let body = if DirectParser::parse_terminal(tokens, Token::is_assign, "=").is_ok() {
            let expr = Expression::parse(tokens)?;
            end = expr.position();
            Some(expr)
        } else if matches!(tokens.peek(), Some(Token::LBrace { .. })) {
            let block = super::Block::parse(tokens)?;
            end = block.position.clone();
            Some(Expression::Block(block))
        } else {
            None
        };

        Ok(Function {
            name,
            type_params,
            params,
            return_type,
            body,
            info: (),
            position: start.merge(&end),
        })
    }
}

fn parse_bracketed_type_params(
    tokens: &mut ParseState<Token>,
) -> Result<Vec<TypeParameter>, ParseError> {
    if DirectParser::parse_terminal(tokens, Token::is_lbracket, "[").is_ok() {
        let params = DirectParser::parse_separated(tokens, TypeParameter::parse, |t| {
            DirectParser::parse_terminal(t, Token::is_comma, ",")
        })?;
        DirectParser::parse_terminal(tokens, Token::is_rbracket, "]")?;
        Ok(params)
    } else {
        Ok(vec![])
    }
}

fn parse_type_annotation_list(
    tokens: &mut ParseState<Token>,
    keyword: impl Fn(&Token) -> bool,
    description: &str,
) -> Result<Vec<TypeAnnotation>, ParseError> {
    let mut items = vec![];
    while DirectParser::parse_terminal(tokens, &keyword, description).is_ok() {
        items.push(TypeAnnotation::parse(tokens)?);
    }
    Ok(items)
}

fn is_with(token: &Token) -> bool {
    matches!(token, Token::With { .. })
}

fn is_extends(token: &Token) -> bool {
    matches!(token, Token::Extends { .. })
}

/// Either a method or a field, as they appear interleaved inside a class,
/// trait or object body.
enum Member {
    Method(Function<()>),
    Field(super::VarDeclaration<()>),
}

fn parse_members(tokens: &mut ParseState<Token>) -> Result<Vec<Member>, ParseError> {
    DirectParser::parse_terminal(tokens, Token::is_lbrace, "{")?;

    let mut members = vec![];
    while tokens
        .peek()
        .is_some_and(|t| !matches!(t, Token::RBrace { .. }))
    {
        if matches!(tokens.peek(), Some(Token::Fun { .. })) {
            members.push(Member::Method(Function::parse(tokens)?));
        } else {
            let Statement::VarDeclaration(decl) = Statement::parse(tokens)? else {
                return Err(ParseError {
                    message: "expected a method or field declaration".into(),
                    position: Some(tokens.current_span()),
                });
            };
            members.push(Member::Field(decl));
        }
    }

    DirectParser::parse_terminal(tokens, Token::is_rbrace, "}")?;
    Ok(members)
}

fn split_members(members: Vec<Member>) -> (Vec<super::VarDeclaration<()>>, Vec<Function<()>>) {
    let mut fields = vec![];
    let mut methods = vec![];
    for member in members {
        match member {
            Member::Field(f) => fields.push(f),
            Member::Method(m) => methods.push(m),
        }
    }
    (fields, methods)
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ClassDeclaration<T> {
    pub name: String,
    pub type_params: Vec<TypeParameter>,
    pub constructor: Constructor,
    pub super_type: Option<TypeAnnotation>,
    pub super_args: Vec<Expression<T>>,
    pub implemented_traits: Vec<TypeAnnotation>,
    pub fields: Vec<super::VarDeclaration<T>>,
    pub methods: Vec<Function<T>>,
    pub info: T,
    pub position: Span,
}

impl FromTokens<Token> for ClassDeclaration<()> {
    fn parse(tokens: &mut ParseState<Token>) -> Result<Self, ParseError> {
        let start = tokens.current_span();
        DirectParser::parse_terminal(tokens, |t| matches!(t, Token::Class { .. }), "class")?;
        let name = expect_id(tokens, "a class name")?;
        let type_params = parse_bracketed_type_params(tokens)?;
        let constructor = Constructor::parse(tokens)?;

        let (super_type, super_args) =
            if DirectParser::parse_terminal(tokens, is_extends, "extends").is_ok() {
                let super_type = TypeAnnotation::parse(tokens)?;
                let super_args = if DirectParser::parse_terminal(tokens, Token::is_lparen, "(").is_ok()
                {
                    let args = DirectParser::parse_separated(tokens, Expression::parse, |t| {
                        DirectParser::parse_terminal(t, Token::is_comma, ",")
                    })?;
                    DirectParser::parse_terminal(tokens, Token::is_rparen, ")")?;
                    args
                } else {
                    vec![]
                };
                (Some(super_type), super_args)
            } else {
                (None, vec![])
            };

        let implemented_traits = parse_type_annotation_list(tokens, is_with, "with")?;

        let members = parse_members(tokens)?;
        let end = tokens.current_span();
        let (fields, methods) = split_members(members);

        Ok(ClassDeclaration {
            name,
            type_params,
            constructor,
            super_type,
            super_args,
            implemented_traits,
            fields,
            methods,
            info: (),
            position: start.merge(&end),
        })
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TraitDeclaration<T> {
    pub name: String,
    pub type_params: Vec<TypeParameter>,
    pub super_traits: Vec<TypeAnnotation>,
    pub fields: Vec<super::VarDeclaration<T>>,
    pub methods: Vec<Function<T>>,
    pub info: T,
    pub position: Span,
}

impl FromTokens<Token> for TraitDeclaration<()> {
    fn parse(tokens: &mut ParseState<Token>) -> Result<Self, ParseError> {
        let start = tokens.current_span();
        DirectParser::parse_terminal(tokens, |t| matches!(t, Token::Trait { .. }), "trait")?;
        let name = expect_id(tokens, "a trait name")?;
        let type_params = parse_bracketed_type_params(tokens)?;
        let super_traits = parse_type_annotation_list(tokens, is_extends, "extends")?;

        let members = parse_members(tokens)?;
        let end = tokens.current_span();
        let (fields, methods) = split_members(members);

        Ok(TraitDeclaration {
            name,
            type_params,
            super_traits,
            fields,
            methods,
            info: (),
            position: start.merge(&end),
        })
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
/// A singleton: exactly one instance, eagerly constructed, reachable by
/// name rather than via `new`.
pub struct ObjectDeclaration<T> {
    pub name: String,
    pub super_type: Option<TypeAnnotation>,
    pub implemented_traits: Vec<TypeAnnotation>,
    pub fields: Vec<super::VarDeclaration<T>>,
    pub methods: Vec<Function<T>>,
    pub info: T,
    pub position: Span,
}

impl FromTokens<Token> for ObjectDeclaration<()> {
    fn parse(tokens: &mut ParseState<Token>) -> Result<Self, ParseError> {
        let start = tokens.current_span();
        DirectParser::parse_terminal(tokens, |t| matches!(t, Token::Object { .. }), "object")?;
        let name = expect_id(tokens, "an object name")?;

        let super_type = if DirectParser::parse_terminal(tokens, is_extends, "extends").is_ok() {
            Some(TypeAnnotation::parse(tokens)?)
        } else {
            None
        };

        let implemented_traits = parse_type_annotation_list(tokens, is_with, "with")?;

        let members = parse_members(tokens)?;
        let end = tokens.current_span();
        let (fields, methods) = split_members(members);

        Ok(ObjectDeclaration {
            name,
            super_type,
            implemented_traits,
            fields,
            methods,
            info: (),
            position: start.merge(&end),
        })
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
/// Methods bolted onto an existing type from outside its declaration,
/// e.g. `extension Int { fun squared(): Int = this * this }`.
pub struct ExtensionDeclaration<T> {
    pub target_type: TypeAnnotation,
    pub methods: Vec<Function<T>>,
    pub info: T,
    pub position: Span,
}

impl FromTokens<Token> for ExtensionDeclaration<()> {
    fn parse(tokens: &mut ParseState<Token>) -> Result<Self, ParseError> {
        let start = tokens.current_span();
        DirectParser::parse_terminal(tokens, |t| matches!(t, Token::Extension { .. }), "extension")?;
        let target_type = TypeAnnotation::parse(tokens)?;

        let members = parse_members(tokens)?;
        let end = tokens.current_span();
        let (_, methods) = split_members(members);

        Ok(ExtensionDeclaration {
            target_type,
            methods,
            info: (),
            position: start.merge(&end),
        })
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum TopLevelStatement<T> {
    Function(Function<T>),
    Class(ClassDeclaration<T>),
    Trait(TraitDeclaration<T>),
    Object(ObjectDeclaration<T>),
    Extension(ExtensionDeclaration<T>),
}

impl<T: Clone> TopLevelStatement<T> {
    pub fn position(&self) -> Span {
        match self {
            TopLevelStatement::Function(f) => f.position.clone(),
            TopLevelStatement::Class(c) => c.position.clone(),
            TopLevelStatement::Trait(t) => t.position.clone(),
            TopLevelStatement::Object(o) => o.position.clone(),
            TopLevelStatement::Extension(e) => e.position.clone(),
        }
    }
}

impl FromTokens<Token> for TopLevelStatement<()> {
    fn parse(tokens: &mut ParseState<Token>) -> Result<Self, ParseError> {
        match tokens.peek() {
            Some(Token::Fun { .. }) => Ok(TopLevelStatement::Function(Function::parse(tokens)?)),
            Some(Token::Class { .. }) => {
                Ok(TopLevelStatement::Class(ClassDeclaration::parse(tokens)?))
            }
            Some(Token::Trait { .. }) => {
                Ok(TopLevelStatement::Trait(TraitDeclaration::parse(tokens)?))
            }
            Some(Token::Object { .. }) => {
                Ok(TopLevelStatement::Object(ObjectDeclaration::parse(tokens)?))
            }
            Some(Token::Extension { .. }) => Ok(TopLevelStatement::Extension(
                ExtensionDeclaration::parse(tokens)?,
            )),
            Some(other) => Err(ParseError {
                message: format!(
                    "expected a top level declaration (fun, class, trait, object, extension), found {other:?}"
                ),
                position: Some(other.position()),
            }),
            None => Err(ParseError::eof("a top level declaration")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex_significant;

    fn parse(input: &str) -> TopLevelStatement<()> {
        let tokens = lex_significant(input, "test").expect("lex failed");
        let mut state = ParseState::from(tokens);
        TopLevelStatement::parse(&mut state).expect("parse failed")
    }

    #[test]
    fn parses_function_with_expression_body() {
        let decl = parse("fun add(a: Int, b: Int): Int = a + b");
        let TopLevelStatement::Function(f) = decl else {
            panic!("expected function")
        };
        assert_eq!(f.params.len(), 2);
        assert!(f.body.is_some());
    }

    #[test]
    fn parses_function_with_block_body() {
        let decl = parse("fun main(): Unit { val x = 1 }");
        assert!(matches!(decl, TopLevelStatement::Function(_)));
    }

    #[test]
    fn parses_abstract_trait_method() {
        let decl = parse("trait Shape { fun area(): Double }");
        let TopLevelStatement::Trait(t) = decl else {
            panic!("expected trait")
        };
        assert_eq!(t.methods.len(), 1);
        assert!(t.methods[0].body.is_none());
    }

    #[test]
    fn parses_class_with_constructor_and_supertype() {
        let decl = parse("class Point(x: Int, y: Int) extends Shape { fun area(): Double = 0.0 }");
        let TopLevelStatement::Class(c) = decl else {
            panic!("expected class")
        };
        assert_eq!(c.constructor.params.len(), 2);
        assert!(c.super_type.is_some());
    }

    #[test]
    fn parses_object_singleton() {
        let decl = parse("object Math { val pi = 3.14 }");
        let TopLevelStatement::Object(o) = decl else {
            panic!("expected object")
        };
        assert_eq!(o.fields.len(), 1);
    }

    #[test]
    fn parses_extension() {
        let decl = parse("extension Int { fun squared(): Int = this * this }");
        let TopLevelStatement::Extension(e) = decl else {
            panic!("expected extension")
        };
        assert_eq!(e.methods.len(), 1);
    }

    #[test]
    fn parses_generic_class_with_variance() {
        let decl = parse("class Box[+T](value: T) { }");
        let TopLevelStatement::Class(c) = decl else {
            panic!("expected class")
        };
        assert_eq!(c.type_params.len(), 1);
    }
}
