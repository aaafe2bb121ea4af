//! Type checking for statements: expression statements, `val`/`var`
//! declarations and `return`.

use crate::parser::ast::{Expression, ReturnStatement, Statement, VarDeclaration};

use super::error::{InvalidConstantType, RedefinedConstant, TypeCheckError, TypeMismatch};
use super::types::Type;
use super::{
    resolved, Context, TypeCheckable, TypeInformation, TypeResult, TypeValidationError,
    ValidatedTypeInformation,
};

/// Checks a `val`/`var` binding independently of [`Statement`], so a class's
/// field declarations (which are not wrapped in a `Statement`) can reuse it.
pub(crate) fn check_var_declaration(
    decl: VarDeclaration<()>,
    ctx: &mut Context,
) -> TypeResult<VarDeclaration<TypeInformation>> {
    let VarDeclaration {
        name,
        type_annotation,
        value,
        mutable,
        position,
        ..
    } = decl;

    let checked_value = value.check(ctx)?;
    let value_type = checked_value
        .get_info()
        .type_id
        .borrow()
        .clone()
        .unwrap_or(Type::Unknown);

    let final_type = match &type_annotation {
        Some(annotation) => {
            let declared = Type::try_from((annotation.clone(), &*ctx))?;
            if !value_type.is_subtype_of(&declared, ctx) {
                return Err(TypeCheckError::TypeMismatch(
                    TypeMismatch {
                        expected: declared,
                        actual: value_type,
                    },
                    position.clone(),
                ));
            }
            declared
        }
        None => value_type,
    };

    if final_type == Type::Unknown {
        return Err(TypeCheckError::InvalidConstantType(
            InvalidConstantType {
                constant_name: name.clone(),
            },
            position.clone(),
        ));
    }

    let redefined = || {
        TypeCheckError::RedefinedConstant(
            RedefinedConstant {
                constant_name: name.clone(),
            },
            position.clone(),
        )
    };

    if mutable {
        ctx.scope
            .add_variable(&name, checked_value.clone(), true)
            .map_err(|_| redefined())?;
    } else {
        ctx.scope
            .add_constant(&name, final_type.clone())
            .map_err(|_| redefined())?;
    }

    Ok(VarDeclaration {
        name,
        type_annotation,
        value: checked_value,
        mutable,
        info: resolved(ctx, final_type),
        position,
    })
}

pub(crate) fn revert_var_declaration(decl: &VarDeclaration<TypeInformation>) -> VarDeclaration<()> {
    VarDeclaration {
        name: decl.name.clone(),
        type_annotation: decl.type_annotation.clone(),
        value: Expression::revert(&decl.value),
        mutable: decl.mutable,
        info: (),
        position: decl.position.clone(),
    }
}

pub(crate) fn validate_var_declaration(
    decl: VarDeclaration<TypeInformation>,
) -> Result<VarDeclaration<ValidatedTypeInformation>, TypeValidationError> {
    Ok(VarDeclaration {
        name: decl.name,
        type_annotation: decl.type_annotation,
        info: decl.info.validate(&decl.position)?,
        value: decl.value.validate()?,
        mutable: decl.mutable,
        position: decl.position,
    })
}

fn check_return_statement(
    stmt: ReturnStatement<()>,
    ctx: &mut Context,
) -> TypeResult<ReturnStatement<TypeInformation>> {
    let ReturnStatement { value, position, .. } = stmt;

    let (checked_value, result_type) = match value {
        Some(v) => {
            let checked = v.check(ctx)?;
            let ty = checked
                .get_info()
                .type_id
                .borrow()
                .clone()
                .unwrap_or(Type::Unknown);
            (Some(checked), ty)
        }
        None => (None, Type::Unit),
    };

    Ok(ReturnStatement {
        value: checked_value,
        info: resolved(ctx, result_type),
        position,
    })
}

fn revert_return_statement(stmt: &ReturnStatement<TypeInformation>) -> ReturnStatement<()> {
    ReturnStatement {
        value: stmt.value.as_ref().map(Expression::revert),
        info: (),
        position: stmt.position.clone(),
    }
}

pub(crate) fn validate_return_statement(
    stmt: ReturnStatement<TypeInformation>,
) -> Result<ReturnStatement<ValidatedTypeInformation>, TypeValidationError> {
    Ok(ReturnStatement {
        value: stmt.value.map(Expression::validate).transpose()?,
        info: stmt.info.validate(&stmt.position)?,
        position: stmt.position,
    })
}

impl TypeCheckable for Statement<()> {
    type Typed = Statement<TypeInformation>;

    fn check(self, ctx: &mut Context) -> TypeResult<Self::Typed> {
        Ok(match self {
            Statement::Expression(e) => Statement::Expression(e.check(ctx)?),
            Statement::VarDeclaration(decl) => {
                Statement::VarDeclaration(check_var_declaration(decl, ctx)?)
            }
            Statement::Return(stmt) => Statement::Return(check_return_statement(stmt, ctx)?),
        })
    }

    fn revert(this: &Self::Typed) -> Self {
        match this {
            Statement::Expression(e) => Statement::Expression(Expression::revert(e)),
            Statement::VarDeclaration(decl) => {
                Statement::VarDeclaration(revert_var_declaration(decl))
            }
            Statement::Return(stmt) => Statement::Return(revert_return_statement(stmt)),
        }
    }
}

pub(crate) fn validate_statement(
    stmt: Statement<TypeInformation>,
) -> Result<Statement<ValidatedTypeInformation>, TypeValidationError> {
    Ok(match stmt {
        Statement::Expression(e) => Statement::Expression(e.validate()?),
        Statement::VarDeclaration(decl) => Statement::VarDeclaration(validate_var_declaration(decl)?),
        Statement::Return(stmt) => Statement::Return(validate_return_statement(stmt)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex_significant;
    use crate::parser::{FromTokens, ParseState};

    fn parse_statement(code: &str) -> Statement<()> {
        let tokens = lex_significant(code, "test").expect("lex failed");
        let mut state = ParseState::from(tokens);
        Statement::parse(&mut state).expect("parse failed")
    }

    #[test]
    fn checks_val_declaration_type() {
        let mut ctx = Context::default();
        let stmt = parse_statement("val x = 1");
        let checked = stmt.check(&mut ctx).expect("type check failed");
        let Statement::VarDeclaration(decl) = checked else {
            panic!("expected var declaration")
        };
        assert_eq!(decl.info.type_id.borrow().clone(), Some(Type::Int));
    }

    #[test]
    fn rejects_mismatched_annotation() {
        let mut ctx = Context::default();
        let stmt = parse_statement("val x: String = 1");
        assert!(stmt.check(&mut ctx).is_err());
    }

    #[test]
    fn rejects_redeclared_constant() {
        let mut ctx = Context::default();
        parse_statement("val x = 1").check(&mut ctx).unwrap();
        assert!(parse_statement("val x = 2").check(&mut ctx).is_err());
    }
}
