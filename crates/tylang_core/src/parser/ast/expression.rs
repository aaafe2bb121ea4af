//! Expression AST nodes and their recursive-descent grammar.
//!
//! Precedence, loosest to tightest: assignment, `||`, `&&`, equality
//! (`== !=`), relational (`< > <= >=`), additive (`+ -`), multiplicative
//! (`* / %`), power (`**`, right associative), unary (`! -`), postfix
//! (`.member`, `.method(args)`, `(args)`, trailing-lambda `{ ... }`),
//! primary.
//!
//! A bare call `f(args)` is sugar for the method call `f.apply(args)` (the
//! "everything is a method call" convention): `Expression::MethodCall`
//! covers both written forms.

use unescape::unescape;

use crate::lexer::{GetPosition, Span, Token};
use crate::parser::{
    direct_parsing::DirectParser, expect_id, FromTokens, ParseError, ParseState,
};

use super::{Statement, TypeAnnotation};

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Eq,
    Neq,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum UnaryOperator {
    Neg,
    Pos,
    Not,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Id<T> {
    pub name: String,
    pub info: T,
    pub position: Span,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Binary<T> {
    pub left: Box<Expression<T>>,
    pub operator: BinaryOperator,
    pub right: Box<Expression<T>>,
    pub info: T,
    pub position: Span,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Unary<T> {
    pub operator: UnaryOperator,
    pub expr: Box<Expression<T>>,
    pub info: T,
    pub position: Span,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
/// `receiver.method(args)`, or `receiver(args)` desugared with
/// `method = "apply"`.
pub struct MethodCall<T> {
    pub receiver: Box<Expression<T>>,
    pub method: String,
    pub args: Vec<Expression<T>>,
    pub info: T,
    pub position: Span,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FieldAccess<T> {
    pub receiver: Box<Expression<T>>,
    pub field: String,
    pub info: T,
    pub position: Span,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Assignment<T> {
    pub target: Box<Expression<T>>,
    pub value: Box<Expression<T>>,
    pub info: T,
    pub position: Span,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
/// A brace-delimited sequence of statements; the value of a trailing
/// expression statement (one with no semicolon-equivalent effect) is the
/// block's value, `Unit` otherwise.
pub struct Block<T> {
    pub statements: Vec<Statement<T>>,
    pub info: T,
    pub position: Span,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct If<T> {
    pub condition: Box<Expression<T>>,
    pub then_branch: Block<T>,
    pub else_branch: Option<Block<T>>,
    pub info: T,
    pub position: Span,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct While<T> {
    pub condition: Box<Expression<T>>,
    pub body: Block<T>,
    pub info: T,
    pub position: Span,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ListLiteral<T> {
    pub elements: Vec<Expression<T>>,
    pub info: T,
    pub position: Span,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MapLiteral<T> {
    pub entries: Vec<(Expression<T>, Expression<T>)>,
    pub info: T,
    pub position: Span,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LambdaParameter<T> {
    pub name: String,
    pub type_annotation: Option<TypeAnnotation>,
    pub info: T,
    pub position: Span,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Lambda<T> {
    pub params: Vec<LambdaParameter<T>>,
    pub body: Box<Expression<T>>,
    pub info: T,
    pub position: Span,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
/// `new ClassName(args)`, or `new ClassName[TypeArgs](args)`.
pub struct New<T> {
    pub class_name: String,
    pub type_args: Vec<TypeAnnotation>,
    pub args: Vec<Expression<T>>,
    pub info: T,
    pub position: Span,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Expression<T> {
    Int(i64, T, Span),
    Double(f64, T, Span),
    Str(String, T, Span),
    Boolean(bool, T, Span),
    Null(T, Span),
    This(T, Span),
    Id(Id<T>),
    Binary(Binary<T>),
    Unary(Unary<T>),
    MethodCall(MethodCall<T>),
    FieldAccess(FieldAccess<T>),
    Assignment(Assignment<T>),
    Block(Block<T>),
    If(If<T>),
    While(While<T>),
    ListLiteral(ListLiteral<T>),
    MapLiteral(MapLiteral<T>),
    Lambda(Lambda<T>),
    New(New<T>),
}

impl<T: Clone> Expression<T> {
    pub fn get_info(&self) -> T {
        match self {
            Expression::Int(_, info, _)
            | Expression::Double(_, info, _)
            | Expression::Str(_, info, _)
            | Expression::Boolean(_, info, _)
            | Expression::Null(info, _)
            | Expression::This(info, _) => info.clone(),
            Expression::Id(Id { info, .. }) => info.clone(),
            Expression::Binary(Binary { info, .. }) => info.clone(),
            Expression::Unary(Unary { info, .. }) => info.clone(),
            Expression::MethodCall(MethodCall { info, .. }) => info.clone(),
            Expression::FieldAccess(FieldAccess { info, .. }) => info.clone(),
            Expression::Assignment(Assignment { info, .. }) => info.clone(),
            Expression::Block(Block { info, .. }) => info.clone(),
            Expression::If(If { info, .. }) => info.clone(),
            Expression::While(While { info, .. }) => info.clone(),
            Expression::ListLiteral(ListLiteral { info, .. }) => info.clone(),
            Expression::MapLiteral(MapLiteral { info, .. }) => info.clone(),
            Expression::Lambda(Lambda { info, .. }) => info.clone(),
            Expression::New(New { info, .. }) => info.clone(),
        }
    }

    pub fn position(&self) -> Span {
        match self {
            Expression::Int(_, _, p)
            | Expression::Double(_, _, p)
            | Expression::Str(_, _, p)
            | Expression::Boolean(_, _, p)
            | Expression::Null(_, p)
            | Expression::This(_, p) => p.clone(),
            Expression::Id(Id { position, .. }) => position.clone(),
            Expression::Binary(Binary { position, .. }) => position.clone(),
            Expression::Unary(Unary { position, .. }) => position.clone(),
            Expression::MethodCall(MethodCall { position, .. }) => position.clone(),
            Expression::FieldAccess(FieldAccess { position, .. }) => position.clone(),
            Expression::Assignment(Assignment { position, .. }) => position.clone(),
            Expression::Block(Block { position, .. }) => position.clone(),
            Expression::If(If { position, .. }) => position.clone(),
            Expression::While(While { position, .. }) => position.clone(),
            Expression::ListLiteral(ListLiteral { position, .. }) => position.clone(),
            Expression::MapLiteral(MapLiteral { position, .. }) => position.clone(),
            Expression::Lambda(Lambda { position, .. }) => position.clone(),
            Expression::New(New { position, .. }) => position.clone(),
        }
    }
}

/// Strips the surrounding quotes a `StringLiteral` token's matched text
/// always carries and decodes backslash escapes (`\n \t \r \\ \"`). An
/// unrecognised escape sequence is kept literally, matching `unescape`'s own
/// permissive behaviour.
fn decode_string_literal(raw: &str) -> String {
    let inner = raw.strip_prefix('"').and_then(|s| s.strip_suffix('"')).unwrap_or(raw);
    unescape(inner).unwrap_or_else(|| inner.to_string())
}

impl FromTokens<Token> for Block<()> {
    fn parse(tokens: &mut ParseState<Token>) -> Result<Self, ParseError> {
        let start = tokens.current_span();

        DirectParser::parse_terminal(tokens, Token::is_lbrace, "{")?;

        let mut statements = vec![];
        while tokens
            .peek()
            .is_some_and(|t| !matches!(t, Token::RBrace { .. }))
        {
            statements.push(Statement::parse(tokens)?);
        }

        DirectParser::parse_terminal(tokens, Token::is_rbrace, "}")?;

        Ok(Block {
            statements,
            info: (),
            position: start,
        })
    }
}

impl Expression<()> {
    fn parse_assignment(tokens: &mut ParseState<Token>) -> Result<Self, ParseError> {
        let start = tokens.current_span();
        let target = Self::parse_or(tokens)?;

        if DirectParser::parse_terminal(tokens, Token::is_assign, "=").is_ok() {
            let value = Self::parse_assignment(tokens)?;
            return Ok(Expression::Assignment(Assignment {
                position: start.merge(&value.position()),
                target: Box::new(target),
                value: Box::new(value),
                info: (),
            }));
        }

        Ok(target)
    }

    fn parse_or(tokens: &mut ParseState<Token>) -> Result<Self, ParseError> {
        let mut left = Self::parse_and(tokens)?;
        while DirectParser::parse_terminal(tokens, |t| matches!(t, Token::OrOr { .. }), "||")
            .is_ok()
        {
            let right = Self::parse_and(tokens)?;
            left = Self::binary(left, BinaryOperator::Or, right);
        }
        Ok(left)
    }

    fn parse_and(tokens: &mut ParseState<Token>) -> Result<Self, ParseError> {
        let mut left = Self::parse_equality(tokens)?;
        while DirectParser::parse_terminal(tokens, |t| matches!(t, Token::AndAnd { .. }), "&&")
            .is_ok()
        {
            let right = Self::parse_equality(tokens)?;
            left = Self::binary(left, BinaryOperator::And, right);
        }
        Ok(left)
    }

    fn parse_equality(tokens: &mut ParseState<Token>) -> Result<Self, ParseError> {
        let mut left = Self::parse_relational(tokens)?;
        loop {
            let op = if DirectParser::parse_terminal(
                tokens,
                |t| matches!(t, Token::EqualEqual { .. }),
                "==",
            )
            .is_ok()
            {
                BinaryOperator::Eq
            } else if DirectParser::parse_terminal(
                tokens,
                |t| matches!(t, Token::NotEqual { .. }),
                "!=",
            )
            .is_ok()
            {
                BinaryOperator::Neq
            } else {
                break;
            };
            let right = Self::parse_relational(tokens)?;
            left = Self::binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_relational(tokens: &mut ParseState<Token>) -> Result<Self, ParseError> {
        let mut left = Self::parse_additive(tokens)?;
        loop {
            let op = if DirectParser::parse_terminal(
                tokens,
                |t| matches!(t, Token::LessEqual { .. }),
                "<=",
            )
            .is_ok()
            {
                BinaryOperator::Le
            } else if DirectParser::parse_terminal(
                tokens,
                |t| matches!(t, Token::GreaterEqual { .. }),
                ">=",
            )
            .is_ok()
            {
                BinaryOperator::Ge
            } else if DirectParser::parse_terminal(
                tokens,
                |t| matches!(t, Token::LessThan { .. }),
                "<",
            )
            .is_ok()
            {
                BinaryOperator::Lt
            } else if DirectParser::parse_terminal(
                tokens,
                |t| matches!(t, Token::GreaterThan { .. }),
                ">",
            )
            .is_ok()
            {
                BinaryOperator::Gt
            } else {
                break;
            };
            let right = Self::parse_additive(tokens)?;
            left = Self::binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_additive(tokens: &mut ParseState<Token>) -> Result<Self, ParseError> {
        let mut left = Self::parse_multiplicative(tokens)?;
        loop {
            let op = if DirectParser::parse_terminal(tokens, Token::is_plus, "+").is_ok() {
                BinaryOperator::Add
            } else if DirectParser::parse_terminal(tokens, Token::is_minus, "-").is_ok() {
                BinaryOperator::Sub
            } else {
                break;
            };
            let right = Self::parse_multiplicative(tokens)?;
            left = Self::binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(tokens: &mut ParseState<Token>) -> Result<Self, ParseError> {
        let mut left = Self::parse_power(tokens)?;
        loop {
            let op = if DirectParser::parse_terminal(tokens, |t| matches!(t, Token::Star { .. }), "*")
                .is_ok()
            {
                BinaryOperator::Mul
            } else if DirectParser::parse_terminal(tokens, |t| matches!(t, Token::Slash { .. }), "/")
                .is_ok()
            {
                BinaryOperator::Div
            } else if DirectParser::parse_terminal(
                tokens,
                |t| matches!(t, Token::Percent { .. }),
                "%",
            )
            .is_ok()
            {
                BinaryOperator::Mod
            } else {
                break;
            };
            let right = Self::parse_power(tokens)?;
            left = Self::binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_power(tokens: &mut ParseState<Token>) -> Result<Self, ParseError> {
        let base = Self::parse_unary(tokens)?;
        if DirectParser::parse_terminal(tokens, |t| matches!(t, Token::StarStar { .. }), "**")
            .is_ok()
        {
            // right associative
            let exponent = Self::parse_power(tokens)?;
            return Ok(Self::binary(base, BinaryOperator::Pow, exponent));
        }
        Ok(base)
    }

    fn binary(left: Self, operator: BinaryOperator, right: Self) -> Self {
        let position = left.position().merge(&right.position());
        Expression::Binary(Binary {
            left: Box::new(left),
            operator,
            right: Box::new(right),
            info: (),
            position,
        })
    }

    fn parse_unary(tokens: &mut ParseState<Token>) -> Result<Self, ParseError> {
        let start = tokens.current_span();

        if DirectParser::parse_terminal(tokens, Token::is_minus, "-").is_ok() {
            let expr = Self::parse_unary(tokens)?;
            return Ok(Expression::Unary(Unary {
                position: start.merge(&expr.position()),
                operator: UnaryOperator::Neg,
                expr: Box::new(expr),
                info: (),
            }));
        }

        if DirectParser::parse_terminal(tokens, Token::is_plus, "+").is_ok() {
            let expr = Self::parse_unary(tokens)?;
            return Ok(Expression::Unary(Unary {
                position: start.merge(&expr.position()),
                operator: UnaryOperator::Pos,
                expr: Box::new(expr),
                info: (),
            }));
        }

        if DirectParser::parse_terminal(tokens, |t| matches!(t, Token::Bang { .. }), "!").is_ok() {
            let expr = Self::parse_unary(tokens)?;
            return Ok(Expression::Unary(Unary {
                position: start.merge(&expr.position()),
                operator: UnaryOperator::Not,
                expr: Box::new(expr),
                info: (),
            }));
        }

        Self::parse_postfix(tokens)
    }

    fn parse_postfix(tokens: &mut ParseState<Token>) -> Result<Self, ParseError> {
        let mut expr = Self::parse_primary(tokens)?;

        loop {
            if DirectParser::parse_terminal(tokens, Token::is_dot, ".").is_ok() {
                let name = expect_id(tokens, "a member name")?;

                if DirectParser::parse_terminal(tokens, Token::is_lparen, "(").is_ok() {
                    let mut args = DirectParser::parse_separated(
                        tokens,
                        Expression::parse,
                        |t| DirectParser::parse_terminal(t, Token::is_comma, ","),
                    )?;
                    let end = tokens.current_span();
                    DirectParser::parse_terminal(tokens, Token::is_rparen, ")")?;
                    Self::consume_trailing_lambda(tokens, &mut args)?;
                    expr = Expression::MethodCall(MethodCall {
                        position: expr.position().merge(&end),
                        receiver: Box::new(expr),
                        method: name,
                        args,
                        info: (),
                    });
                } else {
                    expr = Expression::FieldAccess(FieldAccess {
                        position: expr.position(),
                        receiver: Box::new(expr),
                        field: name,
                        info: (),
                    });
                    Self::consume_trailing_lambda_as_call(tokens, &mut expr)?;
                }
            } else if DirectParser::parse_terminal(tokens, Token::is_lparen, "(").is_ok() {
                let mut args = DirectParser::parse_separated(
                    tokens,
                    Expression::parse,
                    |t| DirectParser::parse_terminal(t, Token::is_comma, ","),
                )?;
                let end = tokens.current_span();
                DirectParser::parse_terminal(tokens, Token::is_rparen, ")")?;
                Self::consume_trailing_lambda(tokens, &mut args)?;
                expr = Expression::MethodCall(MethodCall {
                    position: expr.position().merge(&end),
                    receiver: Box::new(expr),
                    method: "apply".into(),
                    args,
                    info: (),
                });
            } else if matches!(tokens.peek(), Some(Token::LBrace { .. }))
                && Self::looks_like_trailing_lambda(tokens)
            {
                let lambda = Self::parse_trailing_lambda(tokens)?;
                let position = expr.position().merge(&lambda.position());
                expr = Expression::MethodCall(MethodCall {
                    receiver: Box::new(expr),
                    method: "apply".into(),
                    args: vec![lambda],
                    info: (),
                    position,
                });
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// After an explicit call's closing paren, a brace block directly
    /// following is sugar appending one more (lambda) argument, as in
    /// `list.fold(0) { (acc, x) => acc + x }`.
    fn consume_trailing_lambda(
        tokens: &mut ParseState<Token>,
        args: &mut Vec<Expression<()>>,
    ) -> Result<(), ParseError> {
        if matches!(tokens.peek(), Some(Token::LBrace { .. })) {
            args.push(Self::parse_trailing_lambda(tokens)?);
        }
        Ok(())
    }

    fn consume_trailing_lambda_as_call(
        tokens: &mut ParseState<Token>,
        expr: &mut Expression<()>,
    ) -> Result<(), ParseError> {
        if matches!(tokens.peek(), Some(Token::LBrace { .. })) && Self::looks_like_trailing_lambda(tokens) {
            let lambda = Self::parse_trailing_lambda(tokens)?;
            if let Expression::FieldAccess(FieldAccess {
                receiver,
                field,
                position,
                ..
            }) = expr.clone()
            {
                *expr = Expression::MethodCall(MethodCall {
                    position: position.merge(&lambda.position()),
                    receiver,
                    method: field,
                    args: vec![lambda],
                    info: (),
                });
            }
        }
        Ok(())
    }

    /// A `{` only introduces a trailing lambda, not a nested block
    /// expression, when it is immediately preceded (in this call chain) by
    /// a receiver/method; plain standalone blocks are parsed as primary
    /// expressions instead. Callers only reach this check after already
    /// having parsed a receiver, so any `{` here is trailing-lambda sugar.
    fn looks_like_trailing_lambda(_tokens: &ParseState<Token>) -> bool {
        true
    }

    /// Parses `{ params => body }` (or `{ stmt* }` with an implicit,
    /// parameterless lambda when no `=>` is present).
    fn parse_trailing_lambda(tokens: &mut ParseState<Token>) -> Result<Expression<()>, ParseError> {
        let start = tokens.current_span();
        DirectParser::parse_terminal(tokens, Token::is_lbrace, "{")?;

        let rewind = tokens.get_index();
        let params = Self::try_parse_lambda_param_list(tokens);

        let params = match params {
            Some(params) if DirectParser::parse_terminal(tokens, Token::is_fat_arrow, "=>").is_ok() => {
                params
            }
            _ => {
                tokens.set_index(rewind);
                vec![]
            }
        };

        let mut statements = vec![];
        while tokens
            .peek()
            .is_some_and(|t| !matches!(t, Token::RBrace { .. }))
        {
            statements.push(Statement::parse(tokens)?);
        }

        let end = tokens.current_span();
        DirectParser::parse_terminal(tokens, Token::is_rbrace, "}")?;

        let body = Expression::Block(Block {
            statements,
            info: (),
            position: start.merge(&end),
        });

        Ok(Expression::Lambda(Lambda {
            params,
            body: Box::new(body),
            info: (),
            position: start.merge(&end),
        }))
    }

    fn try_parse_lambda_param_list(tokens: &mut ParseState<Token>) -> Option<Vec<LambdaParameter<()>>> {
        if let Some(Token::Id { text, position, .. }) = tokens.peek() {
            tokens.next();
            let type_annotation = if DirectParser::parse_terminal(tokens, Token::is_colon, ":").is_ok()
            {
                TypeAnnotation::parse(tokens).ok()
            } else {
                None
            };

            let mut params = vec![LambdaParameter {
                name: text,
                type_annotation,
                info: (),
                position: position.clone(),
            }];

            while DirectParser::parse_terminal(tokens, Token::is_comma, ",").is_ok() {
                let Some(Token::Id { text, position, .. }) = tokens.next() else {
                    return None;
                };
                let type_annotation =
                    if DirectParser::parse_terminal(tokens, Token::is_colon, ":").is_ok() {
                        TypeAnnotation::parse(tokens).ok()
                    } else {
                        None
                    };
                params.push(LambdaParameter {
                    name: text,
                    type_annotation,
                    info: (),
                    position,
                });
            }

            return Some(params);
        }

        None
    }

    fn parse_primary(tokens: &mut ParseState<Token>) -> Result<Self, ParseError> {
        let start = tokens.current_span();

        match tokens.peek() {
            Some(Token::Integer { value, .. }) => {
                tokens.next();
                Ok(Expression::Int(value as i64, (), start))
            }
            Some(Token::FloatingPoint { value, .. }) => {
                tokens.next();
                Ok(Expression::Double(value, (), start))
            }
            Some(Token::StringLiteral { value, .. }) => {
                tokens.next();
                Ok(Expression::Str(decode_string_literal(&value), (), start))
            }
            Some(Token::Boolean { value, .. }) => {
                tokens.next();
                Ok(Expression::Boolean(value, (), start))
            }
            Some(Token::Null { .. }) => {
                tokens.next();
                Ok(Expression::Null((), start))
            }
            Some(Token::This { .. }) => {
                tokens.next();
                Ok(Expression::This((), start))
            }
            Some(Token::If { .. }) => Self::parse_if(tokens),
            Some(Token::While { .. }) => Self::parse_while(tokens),
            Some(Token::New { .. }) => Self::parse_new(tokens),
            Some(Token::LBracket { .. }) => Self::parse_list_or_map_literal(tokens),
            Some(Token::LBrace { .. }) => {
                let block = Block::parse(tokens)?;
                Ok(Expression::Block(block))
            }
            Some(Token::LParen { .. }) => Self::parse_parenthesised_or_lambda(tokens),
            Some(Token::Id { .. }) => {
                if let Some(lambda) = Self::try_parse_single_id_lambda(tokens) {
                    return Ok(lambda);
                }
                let name = expect_id(tokens, "an identifier")?;
                Ok(Expression::Id(Id {
                    name,
                    info: (),
                    position: start,
                }))
            }
            Some(Token::Match { .. }) | Some(Token::Case { .. }) => Err(ParseError {
                message: "pattern matching (match/case) is not supported".into(),
                position: Some(start),
            }),
            _ => Err(ParseError {
                message: "expected an expression".into(),
                position: Some(start),
            }),
        }
    }

    /// `x => x + 1`: a bare identifier directly followed by `=>` is a
    /// single, untyped-parameter lambda.
    fn try_parse_single_id_lambda(tokens: &mut ParseState<Token>) -> Option<Self> {
        let rewind = tokens.get_index();
        let start = tokens.current_span();

        let Some(Token::Id { text, .. }) = tokens.next() else {
            tokens.set_index(rewind);
            return None;
        };

        if DirectParser::parse_terminal(tokens, Token::is_fat_arrow, "=>").is_err() {
            tokens.set_index(rewind);
            return None;
        }

        let Ok(body) = Self::parse_assignment(tokens) else {
            tokens.set_index(rewind);
            return None;
        };

        Some(Expression::Lambda(Lambda {
            position: start.merge(&body.position()),
            params: vec![LambdaParameter {
                name: text,
                type_annotation: None,
                info: (),
                position: start,
            }],
            body: Box::new(body),
            info: (),
        }))
    }

    fn parse_parenthesised_or_lambda(tokens: &mut ParseState<Token>) -> Result<Self, ParseError> {
        let start = tokens.current_span();
        let rewind = tokens.get_index();

        if let Some(lambda) = Self::try_parse_paren_lambda(tokens, &start) {
            return Ok(lambda);
        }
        tokens.set_index(rewind);

        DirectParser::parse_terminal(tokens, Token::is_lparen, "(")?;
        let inner = Expression::parse(tokens)?;
        DirectParser::parse_terminal(tokens, Token::is_rparen, ")")?;
        Ok(inner)
    }

    fn try_parse_paren_lambda(tokens: &mut ParseState<Token>, start: &Span) -> Option<Self> {
        DirectParser::parse_terminal(tokens, Token::is_lparen, "(").ok()?;

        let params = DirectParser::parse_separated(
            tokens,
            |t| -> Result<LambdaParameter<()>, ParseError> {
                let position = t.current_span();
                let Some(Token::Id { text, .. }) = t.next() else {
                    return Err(ParseError {
                        message: "expected a lambda parameter".into(),
                        position: Some(position),
                    });
                };
                let type_annotation = if DirectParser::parse_terminal(t, Token::is_colon, ":").is_ok()
                {
                    Some(TypeAnnotation::parse(t)?)
                } else {
                    None
                };
                Ok(LambdaParameter {
                    name: text,
                    type_annotation,
                    info: (),
                    position,
                })
            },
            |t| DirectParser::parse_terminal(t, Token::is_comma, ","),
        )
        .ok()?;

        DirectParser::parse_terminal(tokens, Token::is_rparen, ")").ok()?;
        DirectParser::parse_terminal(tokens, Token::is_fat_arrow, "=>").ok()?;

        let body = Self::parse_assignment(tokens).ok()?;

        Some(Expression::Lambda(Lambda {
            position: start.clone().merge(&body.position()),
            params,
            body: Box::new(body),
            info: (),
        }))
    }

    fn parse_if(tokens: &mut ParseState<Token>) -> Result<Self, ParseError> {
        let start = tokens.current_span();
        DirectParser::parse_terminal(tokens, |t| matches!(t, Token::If { .. }), "if")?;
        DirectParser::parse_terminal(tokens, Token::is_lparen, "(")?;
        let condition = Expression::parse(tokens)?;
        DirectParser::parse_terminal(tokens, Token::is_rparen, ")")?;
        let then_branch = Block::parse(tokens)?;

        let else_branch = if DirectParser::parse_terminal(
            tokens,
            |t| matches!(t, Token::Else { .. }),
            "else",
        )
        .is_ok()
        {
            Some(Block::parse(tokens)?)
        } else {
            None
        };

        let end = else_branch
            .as_ref()
            .map(|b| b.position.clone())
            .unwrap_or_else(|| then_branch.position.clone());

        Ok(Expression::If(If {
            condition: Box::new(condition),
            then_branch,
            else_branch,
            info: (),
            position: start.merge(&end),
        }))
    }

    fn parse_while(tokens: &mut ParseState<Token>) -> Result<Self, ParseError> {
        let start = tokens.current_span();
        DirectParser::parse_terminal(tokens, |t| matches!(t, Token::While { .. }), "while")?;
        DirectParser::parse_terminal(tokens, Token::is_lparen, "(")?;
        let condition = Expression::parse(tokens)?;
        DirectParser::parse_terminal(tokens, Token::is_rparen, ")")?;
        let body = Block::parse(tokens)?;

        Ok(Expression::While(While {
            position: start.merge(&body.position),
            condition: Box::new(condition),
            body,
            info: (),
        }))
    }

    fn parse_new(tokens: &mut ParseState<Token>) -> Result<Self, ParseError> {
        let start = tokens.current_span();
        DirectParser::parse_terminal(tokens, |t| matches!(t, Token::New { .. }), "new")?;
        let class_name = expect_id(tokens, "a class name")?;

        let type_args = if DirectParser::parse_terminal(tokens, Token::is_lbracket, "[").is_ok() {
            let args = DirectParser::parse_separated(
                tokens,
                TypeAnnotation::parse,
                |t| DirectParser::parse_terminal(t, Token::is_comma, ","),
            )?;
            DirectParser::parse_terminal(tokens, Token::is_rbracket, "]")?;
            args
        } else {
            vec![]
        };

        DirectParser::parse_terminal(tokens, Token::is_lparen, "(")?;
        let args = DirectParser::parse_separated(
            tokens,
            Expression::parse,
            |t| DirectParser::parse_terminal(t, Token::is_comma, ","),
        )?;
        let end = tokens.current_span();
        DirectParser::parse_terminal(tokens, Token::is_rparen, ")")?;

        Ok(Expression::New(New {
            class_name,
            type_args,
            args,
            info: (),
            position: start.merge(&end),
        }))
    }

    fn parse_list_or_map_literal(tokens: &mut ParseState<Token>) -> Result<Self, ParseError> {
        let start = tokens.current_span();
        DirectParser::parse_terminal(tokens, Token::is_lbracket, "[")?;

        // an empty `[]` is an empty list; `[:]` is an empty map
        if DirectParser::parse_terminal(tokens, Token::is_colon, ":").is_ok() {
            let end = tokens.current_span();
            DirectParser::parse_terminal(tokens, Token::is_rbracket, "]")?;
            return Ok(Expression::MapLiteral(MapLiteral {
                entries: vec![],
                info: (),
                position: start.merge(&end),
            }));
        }

        let rewind = tokens.get_index();
        if let Ok(first_key) = Expression::parse(tokens) {
            if DirectParser::parse_terminal(tokens, Token::is_colon, ":").is_ok() {
                let first_value = Expression::parse(tokens)?;
                let mut entries = vec![(first_key, first_value)];

                while DirectParser::parse_terminal(tokens, Token::is_comma, ",").is_ok() {
                    let key = Expression::parse(tokens)?;
                    DirectParser::parse_terminal(tokens, Token::is_colon, ":")?;
                    let value = Expression::parse(tokens)?;
                    entries.push((key, value));
                }

                let end = tokens.current_span();
                DirectParser::parse_terminal(tokens, Token::is_rbracket, "]")?;
                return Ok(Expression::MapLiteral(MapLiteral {
                    entries,
                    info: (),
                    position: start.merge(&end),
                }));
            }
        }
        tokens.set_index(rewind);

        let elements = DirectParser::parse_separated(
            tokens,
            Expression::parse,
            |t| DirectParser::parse_terminal(t, Token::is_comma, ","),
        )?;
        let end = tokens.current_span();
        DirectParser::parse_terminal(tokens, Token::is_rbracket, "]")?;

        Ok(Expression::ListLiteral(ListLiteral {
            elements,
            info: (),
            position: start.merge(&end),
        }))
    }
}

impl FromTokens<Token> for Expression<()> {
    fn parse(tokens: &mut ParseState<Token>) -> Result<Self, ParseError> {
        Expression::parse_assignment(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex_significant;

    fn parse(input: &str) -> Expression<()> {
        let tokens = lex_significant(input, "test").expect("lex failed");
        let mut state = ParseState::from(tokens);
        Expression::parse(&mut state).expect("parse failed")
    }

    #[test]
    fn parses_arithmetic_precedence() {
        let expr = parse("1 + 2 * 3");
        let Expression::Binary(Binary { operator, right, .. }) = expr else {
            panic!("expected top level binary")
        };
        assert_eq!(operator, BinaryOperator::Add);
        assert!(matches!(*right, Expression::Binary(Binary { operator: BinaryOperator::Mul, .. })));
    }

    #[test]
    fn parses_call_as_method_call_named_apply() {
        let expr = parse("add(1, 2)");
        let Expression::MethodCall(MethodCall { method, args, .. }) = expr else {
            panic!("expected method call")
        };
        assert_eq!(method, "apply");
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn parses_explicit_method_call() {
        let expr = parse("point.distanceTo(other)");
        let Expression::MethodCall(MethodCall { method, .. }) = expr else {
            panic!("expected method call")
        };
        assert_eq!(method, "distanceTo");
    }

    #[test]
    fn parses_field_access() {
        let expr = parse("point.x");
        assert!(matches!(expr, Expression::FieldAccess(_)));
    }

    #[test]
    fn disambiguates_lambda_from_parenthesised_expression() {
        assert!(matches!(parse("(x) => x"), Expression::Lambda(_)));
        assert!(matches!(parse("(1 + 2)"), Expression::Int(3, ..)) || matches!(parse("(1 + 2)"), Expression::Binary(_)));
    }

    #[test]
    fn parses_single_param_lambda_shorthand() {
        assert!(matches!(parse("x => x + 1"), Expression::Lambda(_)));
    }

    #[test]
    fn parses_trailing_lambda_call() {
        let expr = parse("twice(x) { y => y * 2 }");
        let Expression::MethodCall(MethodCall { args, .. }) = expr else {
            panic!("expected method call")
        };
        assert_eq!(args.len(), 2);
        assert!(matches!(args[1], Expression::Lambda(_)));
    }

    #[test]
    fn parses_if_expression() {
        assert!(matches!(parse("if (true) { 1 } else { 2 }"), Expression::If(_)));
    }

    #[test]
    fn parses_list_literal() {
        assert!(matches!(parse("[1, 2, 3]"), Expression::ListLiteral(_)));
    }

    #[test]
    fn parses_map_literal() {
        assert!(matches!(parse("[\"a\": 1, \"b\": 2]"), Expression::MapLiteral(_)));
    }

    #[test]
    fn parses_new_expression() {
        assert!(matches!(parse("new Point(1, 2)"), Expression::New(_)));
    }

    #[test]
    fn parses_unary_plus() {
        let expr = parse("+1");
        let Expression::Unary(Unary { operator, .. }) = expr else {
            panic!("expected unary expression")
        };
        assert_eq!(operator, UnaryOperator::Pos);
    }

    #[test]
    fn rejects_match_as_not_supported() {
        let tokens = lex_significant("match", "test").expect("lex failed");
        let mut state = ParseState::from(tokens);
        let err = Expression::parse(&mut state).unwrap_err();
        assert!(err.message.contains("not supported"));
    }

    #[test]
    fn decodes_string_literal_escapes() {
        let expr = parse(r#""line\n\ttab""#);
        let Expression::Str(value, ..) = expr else {
            panic!("expected string literal")
        };
        assert_eq!(value, "line\n\ttab");
    }
}
