//! Type checking for expressions: literals, identifiers, operators, calls,
//! control flow expressions, collection literals, lambdas and `new`.

use crate::parser::ast::{
    Assignment, Binary, BinaryOperator, Block, Expression, FieldAccess, Id, If, Lambda,
    LambdaParameter, ListLiteral, MapLiteral, MethodCall, New, Statement, TypeAnnotation, Unary,
    UnaryOperator, While,
};

use super::error::{
    ArityMismatch, ImmutableReassign, NotCallable, NotSupported, RedefinedConstant,
    TypeCheckError, TypeMismatch, UndefinedMember, UndefinedType, UndefinedVariable,
};
use super::statement::validate_statement;
use super::types::{NamedKind, Type};
use super::{
    resolved, Context, TypeCheckable, TypeInformation, TypeResult, TypeValidationError,
    TypedConstruct, ValidatedTypeInformation,
};

pub(crate) fn info_type(info: &TypeInformation) -> Type {
    info.type_id.borrow().clone().unwrap_or(Type::Unknown)
}

fn resolve_name(
    ctx: &mut Context,
    name: &str,
    position: &crate::lexer::Span,
) -> TypeResult<TypeInformation> {
    match ctx.scope.resolve_name(name) {
        Some(type_id) => Ok(TypeInformation {
            type_id,
            context: ctx.clone(),
        }),
        None => Err(TypeCheckError::UndefinedVariable(
            UndefinedVariable {
                variable_name: name.to_string(),
            },
            position.clone(),
        )),
    }
}

fn is_numeric(ty: &Type) -> bool {
    matches!(ty, Type::Int | Type::Double)
}

fn check_binary_types(
    operator: &BinaryOperator,
    left: Type,
    right: Type,
    position: &crate::lexer::Span,
) -> TypeResult<Type> {
    use BinaryOperator::*;

    let numeric_mismatch = |actual: Type| {
        TypeCheckError::TypeMismatch(
            TypeMismatch {
                expected: Type::Double,
                actual,
            },
            position.clone(),
        )
    };

    match operator {
        Add if left == Type::String || right == Type::String => Ok(Type::String),
        Add | Sub | Mul | Div | Mod | Pow => {
            if !is_numeric(&left) {
                return Err(numeric_mismatch(left));
            }
            if !is_numeric(&right) {
                return Err(numeric_mismatch(right));
            }
            if left == Type::Double || right == Type::Double {
                Ok(Type::Double)
            } else {
                Ok(Type::Int)
            }
        }
        Lt | Gt | Le | Ge => {
            if !is_numeric(&left) {
                return Err(numeric_mismatch(left));
            }
            if !is_numeric(&right) {
                return Err(numeric_mismatch(right));
            }
            Ok(Type::Boolean)
        }
        Eq | Neq => Ok(Type::Boolean),
        And | Or => {
            let boolean_mismatch = |actual: Type| {
                TypeCheckError::TypeMismatch(
                    TypeMismatch {
                        expected: Type::Boolean,
                        actual,
                    },
                    position.clone(),
                )
            };
            if left != Type::Boolean {
                return Err(boolean_mismatch(left));
            }
            if right != Type::Boolean {
                return Err(boolean_mismatch(right));
            }
            Ok(Type::Boolean)
        }
    }
}

fn check_block(block: Block<()>, ctx: &mut Context) -> TypeResult<Block<TypeInformation>> {
    let Block {
        statements,
        position,
        ..
    } = block;

    ctx.scope.enter_scope();

    let mut result = Ok(Type::Unit);
    let mut checked = Vec::with_capacity(statements.len());
    for stmt in statements {
        match stmt.check(ctx) {
            Ok(typed) => {
                result = Ok(match &typed {
                    Statement::Expression(e) => info_type(&e.get_info()),
                    _ => Type::Unit,
                });
                checked.push(typed);
            }
            Err(e) => {
                result = Err(e);
                break;
            }
        }
    }

    ctx.scope.exit_scope();

    let result_type = result?;

    Ok(Block {
        statements: checked,
        info: resolved(ctx, result_type),
        position,
    })
}

fn revert_block(block: &Block<TypeInformation>) -> Block<()> {
    Block {
        statements: block
            .statements
            .iter()
            .map(Statement::revert)
            .collect(),
        info: (),
        position: block.position.clone(),
    }
}

fn validate_block(
    block: Block<TypeInformation>,
) -> Result<Block<ValidatedTypeInformation>, TypeValidationError> {
    Ok(Block {
        info: block.info.validate(&block.position)?,
        statements: block
            .statements
            .into_iter()
            .map(validate_statement)
            .collect::<Result<_, _>>()?,
        position: block.position,
    })
}

fn check_if(iff: If<()>, ctx: &mut Context) -> TypeResult<If<TypeInformation>> {
    let If {
        condition,
        then_branch,
        else_branch,
        position,
        ..
    } = iff;

    let condition = condition.check(ctx)?;
    let condition_type = info_type(&condition.get_info());
    if condition_type != Type::Boolean {
        return Err(TypeCheckError::TypeMismatch(
            TypeMismatch {
                expected: Type::Boolean,
                actual: condition_type,
            },
            position.clone(),
        ));
    }

    let then_branch = check_block(then_branch, ctx)?;
    let else_branch = else_branch.map(|b| check_block(b, ctx)).transpose()?;

    let result_type = match &else_branch {
        Some(else_branch) => unify_types(
            &info_type(&then_branch.info),
            &info_type(&else_branch.info),
            ctx,
            &position,
        )?,
        None => Type::Unit,
    };

    Ok(If {
        condition: Box::new(condition),
        then_branch,
        else_branch,
        info: resolved(ctx, result_type),
        position,
    })
}

fn revert_if(iff: &If<TypeInformation>) -> If<()> {
    If {
        condition: Box::new(Expression::revert(&iff.condition)),
        then_branch: revert_block(&iff.then_branch),
        else_branch: iff.else_branch.as_ref().map(revert_block),
        info: (),
        position: iff.position.clone(),
    }
}

fn validate_if(
    iff: If<TypeInformation>,
) -> Result<If<ValidatedTypeInformation>, TypeValidationError> {
    Ok(If {
        info: iff.info.validate(&iff.position)?,
        condition: Box::new(Expression::validate(*iff.condition)?),
        then_branch: validate_block(iff.then_branch)?,
        else_branch: iff.else_branch.map(validate_block).transpose()?,
        position: iff.position,
    })
}

fn check_while(w: While<()>, ctx: &mut Context) -> TypeResult<While<TypeInformation>> {
    let While {
        condition,
        body,
        position,
        ..
    } = w;

    let condition = condition.check(ctx)?;
    let condition_type = info_type(&condition.get_info());
    if condition_type != Type::Boolean {
        return Err(TypeCheckError::TypeMismatch(
            TypeMismatch {
                expected: Type::Boolean,
                actual: condition_type,
            },
            position.clone(),
        ));
    }

    let body = check_block(body, ctx)?;

    Ok(While {
        condition: Box::new(condition),
        body,
        info: resolved(ctx, Type::Unit),
        position,
    })
}

fn revert_while(w: &While<TypeInformation>) -> While<()> {
    While {
        condition: Box::new(Expression::revert(&w.condition)),
        body: revert_block(&w.body),
        info: (),
        position: w.position.clone(),
    }
}

fn validate_while(
    w: While<TypeInformation>,
) -> Result<While<ValidatedTypeInformation>, TypeValidationError> {
    Ok(While {
        info: w.info.validate(&w.position)?,
        condition: Box::new(Expression::validate(*w.condition)?),
        body: validate_block(w.body)?,
        position: w.position,
    })
}

fn check_method_call(
    call: MethodCall<()>,
    ctx: &mut Context,
) -> TypeResult<MethodCall<TypeInformation>> {
    let MethodCall {
        receiver,
        method,
        args,
        position,
        ..
    } = call;

    let receiver = receiver.check(ctx)?;
    let receiver_type = info_type(&receiver.get_info());

    let signature = if let Type::Function { .. } = &receiver_type {
        if method == "apply" {
            Some(receiver_type.clone())
        } else {
            ctx.scope.resolve_property_for_type(receiver_type.clone(), &method)
        }
    } else {
        ctx.scope.resolve_property_for_type(receiver_type.clone(), &method)
    };

    let Some(signature) = signature else {
        return Err(TypeCheckError::UndefinedMember(
            UndefinedMember {
                type_name: receiver_type.to_string(),
                member_name: method,
            },
            position,
        ));
    };

    let Type::Function {
        params,
        return_value,
    } = signature
    else {
        return Err(TypeCheckError::NotCallable(
            NotCallable {
                actual: receiver_type,
            },
            position,
        ));
    };

    if params.len() != args.len() {
        return Err(TypeCheckError::ArityMismatch(
            ArityMismatch {
                expected: params.len(),
                actual: args.len(),
            },
            position,
        ));
    }

    let mut checked_args = Vec::with_capacity(args.len());
    for (arg, expected) in args.into_iter().zip(params.into_iter()) {
        let arg_position = arg.position();
        let checked = arg.check(ctx)?;
        let actual = info_type(&checked.get_info());
        if !actual.is_subtype_of(&expected, ctx) {
            return Err(TypeCheckError::TypeMismatch(
                TypeMismatch {
                    expected,
                    actual,
                },
                arg_position,
            ));
        }
        checked_args.push(checked);
    }

    Ok(MethodCall {
        receiver: Box::new(receiver),
        method,
        args: checked_args,
        info: resolved(ctx, *return_value),
        position,
    })
}

fn revert_method_call(call: &MethodCall<TypeInformation>) -> MethodCall<()> {
    MethodCall {
        receiver: Box::new(Expression::revert(&call.receiver)),
        method: call.method.clone(),
        args: call.args.iter().map(Expression::revert).collect(),
        info: (),
        position: call.position.clone(),
    }
}

fn validate_method_call(
    call: MethodCall<TypeInformation>,
) -> Result<MethodCall<ValidatedTypeInformation>, TypeValidationError> {
    Ok(MethodCall {
        info: call.info.validate(&call.position)?,
        receiver: Box::new(Expression::validate(*call.receiver)?),
        method: call.method,
        args: call
            .args
            .into_iter()
            .map(Expression::validate)
            .collect::<Result<_, _>>()?,
        position: call.position,
    })
}

fn check_field_access(
    access: FieldAccess<()>,
    ctx: &mut Context,
) -> TypeResult<FieldAccess<TypeInformation>> {
    let FieldAccess {
        receiver,
        field,
        position,
        ..
    } = access;

    let receiver = receiver.check(ctx)?;
    let receiver_type = info_type(&receiver.get_info());

    let Some(field_type) = ctx
        .scope
        .resolve_property_for_type(receiver_type.clone(), &field)
    else {
        return Err(TypeCheckError::UndefinedMember(
            UndefinedMember {
                type_name: receiver_type.to_string(),
                member_name: field,
            },
            position,
        ));
    };

    Ok(FieldAccess {
        receiver: Box::new(receiver),
        field,
        info: resolved(ctx, field_type),
        position,
    })
}

fn revert_field_access(access: &FieldAccess<TypeInformation>) -> FieldAccess<()> {
    FieldAccess {
        receiver: Box::new(Expression::revert(&access.receiver)),
        field: access.field.clone(),
        info: (),
        position: access.position.clone(),
    }
}

fn validate_field_access(
    access: FieldAccess<TypeInformation>,
) -> Result<FieldAccess<ValidatedTypeInformation>, TypeValidationError> {
    Ok(FieldAccess {
        info: access.info.validate(&access.position)?,
        receiver: Box::new(Expression::validate(*access.receiver)?),
        field: access.field,
        position: access.position,
    })
}

fn check_assignment(
    assign: Assignment<()>,
    ctx: &mut Context,
) -> TypeResult<Assignment<TypeInformation>> {
    let Assignment {
        target,
        value,
        position,
        ..
    } = assign;

    let value = value.check(ctx)?;
    let value_type = info_type(&value.get_info());

    let target = match *target {
        Expression::Id(Id {
            name,
            position: id_position,
            ..
        }) => {
            match ctx.scope.is_variable_mutable(&name) {
                Some(true) => {}
                Some(false) => {
                    return Err(TypeCheckError::ImmutableReassign(
                        ImmutableReassign {
                            variable_name: name,
                        },
                        position,
                    ))
                }
                None if ctx.scope.resolve_name(&name).is_some() => {
                    return Err(TypeCheckError::ImmutableReassign(
                        ImmutableReassign {
                            variable_name: name,
                        },
                        position,
                    ))
                }
                None => {
                    return Err(TypeCheckError::UndefinedVariable(
                        UndefinedVariable {
                            variable_name: name,
                        },
                        position,
                    ))
                }
            }

            let current = ctx
                .scope
                .resolve_name(&name)
                .and_then(|slot| slot.borrow().clone())
                .unwrap_or(Type::Unknown);

            if current != Type::Unknown && !value_type.is_subtype_of(&current, ctx) {
                return Err(TypeCheckError::TypeMismatch(
                    TypeMismatch {
                        expected: current,
                        actual: value_type.clone(),
                    },
                    position.clone(),
                ));
            }

            ctx.scope.update_variable(&name, value_type.clone())?;

            Expression::Id(Id {
                info: resolved(ctx, value_type.clone()),
                name,
                position: id_position,
            })
        }
        other => {
            let checked = other.check(ctx)?;
            let target_type = info_type(&checked.get_info());
            if !value_type.is_subtype_of(&target_type, ctx) {
                return Err(TypeCheckError::TypeMismatch(
                    TypeMismatch {
                        expected: target_type,
                        actual: value_type.clone(),
                    },
                    position.clone(),
                ));
            }
            checked
        }
    };

    Ok(Assignment {
        target: Box::new(target),
        value: Box::new(value),
        info: resolved(ctx, Type::Unit),
        position,
    })
}

fn revert_assignment(assign: &Assignment<TypeInformation>) -> Assignment<()> {
    Assignment {
        target: Box::new(Expression::revert(&assign.target)),
        value: Box::new(Expression::revert(&assign.value)),
        info: (),
        position: assign.position.clone(),
    }
}

fn validate_assignment(
    assign: Assignment<TypeInformation>,
) -> Result<Assignment<ValidatedTypeInformation>, TypeValidationError> {
    Ok(Assignment {
        info: assign.info.validate(&assign.position)?,
        target: Box::new(Expression::validate(*assign.target)?),
        value: Box::new(Expression::validate(*assign.value)?),
        position: assign.position,
    })
}

fn check_new(new: New<()>, ctx: &mut Context) -> TypeResult<New<TypeInformation>> {
    let New {
        class_name,
        type_args,
        args,
        position,
        ..
    } = new;

    let Some(class_type) = ctx.scope.get_type(&class_name) else {
        return Err(TypeCheckError::UndefinedType(
            UndefinedType {
                type_name: TypeAnnotation::Simple(class_name, position.clone()),
            },
            position,
        ));
    };

    let Type::Named {
        kind: NamedKind::Class,
        name,
        type_params,
        type_args: existing_args,
        super_type,
        implemented_traits,
        members,
    } = class_type.clone()
    else {
        return Err(TypeCheckError::NotSupported(
            NotSupported {
                what: format!("instantiating '{class_name}'"),
            },
            position,
        ));
    };

    let resolved_type_args = if type_args.is_empty() {
        existing_args
    } else {
        let mut resolved_args = Vec::with_capacity(type_args.len());
        for arg in type_args {
            resolved_args.push(Type::try_from((arg, &*ctx))?);
        }
        resolved_args
    };

    let resolved_class_name = name.clone();
    let instantiated = Type::Named {
        kind: NamedKind::Class,
        name,
        type_params,
        type_args: resolved_type_args,
        super_type,
        implemented_traits,
        members,
    };

    let constructor = ctx
        .scope
        .resolve_property_for_type(class_type.clone(), "<init>");

    let mut checked_args = Vec::with_capacity(args.len());
    match constructor {
        Some(Type::Function { params, .. }) => {
            if params.len() != args.len() {
                return Err(TypeCheckError::ArityMismatch(
                    ArityMismatch {
                        expected: params.len(),
                        actual: args.len(),
                    },
                    position,
                ));
            }
            for (arg, expected) in args.into_iter().zip(params.into_iter()) {
                let arg_position = arg.position();
                let checked = arg.check(ctx)?;
                let actual = info_type(&checked.get_info());
                if !actual.is_subtype_of(&expected, ctx) {
                    return Err(TypeCheckError::TypeMismatch(
                        TypeMismatch { expected, actual },
                        arg_position,
                    ));
                }
                checked_args.push(checked);
            }
        }
        _ => {
            for arg in args {
                checked_args.push(arg.check(ctx)?);
            }
        }
    }

    Ok(New {
        class_name: resolved_class_name,
        type_args: vec![],
        args: checked_args,
        info: resolved(ctx, instantiated),
        position,
    })
}

fn revert_new(new: &New<TypeInformation>) -> New<()> {
    New {
        class_name: new.class_name.clone(),
        type_args: new.type_args.clone(),
        args: new.args.iter().map(Expression::revert).collect(),
        info: (),
        position: new.position.clone(),
    }
}

fn validate_new(
    new: New<TypeInformation>,
) -> Result<New<ValidatedTypeInformation>, TypeValidationError> {
    Ok(New {
        info: new.info.validate(&new.position)?,
        class_name: new.class_name,
        type_args: new.type_args,
        args: new
            .args
            .into_iter()
            .map(Expression::validate)
            .collect::<Result<_, _>>()?,
        position: new.position,
    })
}

fn check_lambda(lambda: Lambda<()>, ctx: &mut Context) -> TypeResult<Lambda<TypeInformation>> {
    let Lambda {
        params,
        body,
        position,
        ..
    } = lambda;

    ctx.scope.enter_scope();

    let mut param_types = Vec::with_capacity(params.len());
    let mut checked_params = Vec::with_capacity(params.len());
    for param in params {
        let LambdaParameter {
            name,
            type_annotation,
            position: param_position,
            ..
        } = param;

        let param_type = match &type_annotation {
            Some(annotation) => Type::try_from((annotation.clone(), &*ctx))?,
            None => Type::Unknown,
        };
        param_types.push(param_type.clone());

        if ctx.scope.add_constant(&name, param_type.clone()).is_err() {
            ctx.scope.exit_scope();
            return Err(TypeCheckError::RedefinedConstant(
                RedefinedConstant {
                    constant_name: name,
                },
                param_position,
            ));
        }

        checked_params.push(LambdaParameter {
            name,
            type_annotation,
            info: resolved(ctx, param_type),
            position: param_position,
        });
    }

    let body = match body.check(ctx) {
        Ok(body) => body,
        Err(e) => {
            ctx.scope.exit_scope();
            return Err(e);
        }
    };
    let body_type = info_type(&body.get_info());

    ctx.scope.exit_scope();

    Ok(Lambda {
        params: checked_params,
        body: Box::new(body),
        info: resolved(
            ctx,
            Type::Function {
                params: param_types,
                return_value: Box::new(body_type),
            },
        ),
        position,
    })
}

fn revert_lambda(lambda: &Lambda<TypeInformation>) -> Lambda<()> {
    Lambda {
        params: lambda
            .params
            .iter()
            .map(|p| LambdaParameter {
                name: p.name.clone(),
                type_annotation: p.type_annotation.clone(),
                info: (),
                position: p.position.clone(),
            })
            .collect(),
        body: Box::new(Expression::revert(&lambda.body)),
        info: (),
        position: lambda.position.clone(),
    }
}

fn validate_lambda(
    lambda: Lambda<TypeInformation>,
) -> Result<Lambda<ValidatedTypeInformation>, TypeValidationError> {
    Ok(Lambda {
        info: lambda.info.validate(&lambda.position)?,
        params: lambda
            .params
            .into_iter()
            .map(|p| {
                Ok(LambdaParameter {
                    info: p.info.validate(&p.position)?,
                    name: p.name,
                    type_annotation: p.type_annotation,
                    position: p.position,
                })
            })
            .collect::<Result<_, TypeValidationError>>()?,
        body: Box::new(Expression::validate(*lambda.body)?),
        position: lambda.position,
    })
}

impl TypeCheckable for Expression<()> {
    type Typed = Expression<TypeInformation>;

    fn check(self, ctx: &mut Context) -> TypeResult<Self::Typed> {
        Ok(match self {
            Expression::Int(v, _, pos) => Expression::Int(v, resolved(ctx, Type::Int), pos),
            Expression::Double(v, _, pos) => {
                Expression::Double(v, resolved(ctx, Type::Double), pos)
            }
            Expression::Str(v, _, pos) => Expression::Str(v, resolved(ctx, Type::String), pos),
            Expression::Boolean(v, _, pos) => {
                Expression::Boolean(v, resolved(ctx, Type::Boolean), pos)
            }
            Expression::Null(_, pos) => Expression::Null(resolved(ctx, Type::Null), pos),
            Expression::This(_, pos) => {
                let info = resolve_name(ctx, "this", &pos)?;
                Expression::This(info, pos)
            }
            Expression::Id(Id {
                name, position, ..
            }) => {
                let info = resolve_name(ctx, &name, &position)?;
                Expression::Id(Id {
                    name,
                    info,
                    position,
                })
            }
            Expression::Binary(Binary {
                left,
                operator,
                right,
                position,
                ..
            }) => {
                let left = left.check(ctx)?;
                let right = right.check(ctx)?;
                let result_type = check_binary_types(
                    &operator,
                    info_type(&left.get_info()),
                    info_type(&right.get_info()),
                    &position,
                )?;
                Expression::Binary(Binary {
                    left: Box::new(left),
                    operator,
                    right: Box::new(right),
                    info: resolved(ctx, result_type),
                    position,
                })
            }
            Expression::Unary(Unary {
                operator,
                expr,
                position,
                ..
            }) => {
                let expr = expr.check(ctx)?;
                let expr_type = info_type(&expr.get_info());
                let result_type = match operator {
                    UnaryOperator::Neg if is_numeric(&expr_type) => expr_type,
                    UnaryOperator::Neg => {
                        return Err(TypeCheckError::TypeMismatch(
                            TypeMismatch {
                                expected: Type::Double,
                                actual: expr_type,
                            },
                            position,
                        ))
                    }
                    UnaryOperator::Pos if is_numeric(&expr_type) => expr_type,
                    UnaryOperator::Pos => {
                        return Err(TypeCheckError::TypeMismatch(
                            TypeMismatch {
                                expected: Type::Double,
                                actual: expr_type,
                            },
                            position,
                        ))
                    }
                    UnaryOperator::Not if expr_type == Type::Boolean => Type::Boolean,
                    UnaryOperator::Not => {
                        return Err(TypeCheckError::TypeMismatch(
                            TypeMismatch {
                                expected: Type::Boolean,
                                actual: expr_type,
                            },
                            position,
                        ))
                    }
                };
                Expression::Unary(Unary {
                    operator,
                    expr: Box::new(expr),
                    info: resolved(ctx, result_type),
                    position,
                })
            }
            Expression::MethodCall(call) => Expression::MethodCall(check_method_call(call, ctx)?),
            Expression::FieldAccess(access) => {
                Expression::FieldAccess(check_field_access(access, ctx)?)
            }
            Expression::Assignment(assign) => {
                Expression::Assignment(check_assignment(assign, ctx)?)
            }
            Expression::Block(block) => Expression::Block(check_block(block, ctx)?),
            Expression::If(iff) => Expression::If(check_if(iff, ctx)?),
            Expression::While(w) => Expression::While(check_while(w, ctx)?),
            Expression::ListLiteral(ListLiteral {
                elements, position, ..
            }) => {
                let mut checked = Vec::with_capacity(elements.len());
                for e in elements {
                    checked.push(e.check(ctx)?);
                }
                let element_type = match checked.split_first() {
                    Some((first, rest)) => {
                        let mut acc = info_type(&first.get_info());
                        for e in rest {
                            acc = unify_types(&acc, &info_type(&e.get_info()), ctx, &position)?;
                        }
                        acc
                    }
                    None => fresh_type_var(&position),
                };
                Expression::ListLiteral(ListLiteral {
                    elements: checked,
                    info: resolved(ctx, Type::List(Box::new(element_type))),
                    position,
                })
            }
            Expression::MapLiteral(MapLiteral {
                entries, position, ..
            }) => {
                let mut checked = Vec::with_capacity(entries.len());
                for (k, v) in entries {
                    checked.push((k.check(ctx)?, v.check(ctx)?));
                }
                let (key_type, value_type) = checked
                    .first()
                    .map(|(k, v)| (info_type(&k.get_info()), info_type(&v.get_info())))
                    .unwrap_or((Type::Nothing, Type::Nothing));
                Expression::MapLiteral(MapLiteral {
                    entries: checked,
                    info: resolved(ctx, Type::Map(Box::new(key_type), Box::new(value_type))),
                    position,
                })
            }
            Expression::Lambda(lambda) => Expression::Lambda(check_lambda(lambda, ctx)?),
            Expression::New(new) => Expression::New(check_new(new, ctx)?),
        })
    }

    fn revert(this: &Self::Typed) -> Self {
        match this {
            Expression::Int(v, _, pos) => Expression::Int(*v, (), pos.clone()),
            Expression::Double(v, _, pos) => Expression::Double(*v, (), pos.clone()),
            Expression::Str(v, _, pos) => Expression::Str(v.clone(), (), pos.clone()),
            Expression::Boolean(v, _, pos) => Expression::Boolean(*v, (), pos.clone()),
            Expression::Null(_, pos) => Expression::Null((), pos.clone()),
            Expression::This(_, pos) => Expression::This((), pos.clone()),
            Expression::Id(id) => Expression::Id(Id {
                name: id.name.clone(),
                info: (),
                position: id.position.clone(),
            }),
            Expression::Binary(b) => Expression::Binary(Binary {
                left: Box::new(Expression::revert(&b.left)),
                operator: b.operator.clone(),
                right: Box::new(Expression::revert(&b.right)),
                info: (),
                position: b.position.clone(),
            }),
            Expression::Unary(u) => Expression::Unary(Unary {
                operator: u.operator.clone(),
                expr: Box::new(Expression::revert(&u.expr)),
                info: (),
                position: u.position.clone(),
            }),
            Expression::MethodCall(call) => Expression::MethodCall(revert_method_call(call)),
            Expression::FieldAccess(access) => {
                Expression::FieldAccess(revert_field_access(access))
            }
            Expression::Assignment(assign) => Expression::Assignment(revert_assignment(assign)),
            Expression::Block(block) => Expression::Block(revert_block(block)),
            Expression::If(iff) => Expression::If(revert_if(iff)),
            Expression::While(w) => Expression::While(revert_while(w)),
            Expression::ListLiteral(l) => Expression::ListLiteral(ListLiteral {
                elements: l.elements.iter().map(Expression::revert).collect(),
                info: (),
                position: l.position.clone(),
            }),
            Expression::MapLiteral(m) => Expression::MapLiteral(MapLiteral {
                entries: m
                    .entries
                    .iter()
                    .map(|(k, v)| (Expression::revert(k), Expression::revert(v)))
                    .collect(),
                info: (),
                position: m.position.clone(),
            }),
            Expression::Lambda(lambda) => Expression::Lambda(revert_lambda(lambda)),
            Expression::New(new) => Expression::New(revert_new(new)),
        }
    }
}

impl TypedConstruct for Expression<TypeInformation> {
    type Validated = Expression<ValidatedTypeInformation>;

    fn update_type(&mut self, type_id: Type) -> TypeResult<()> {
        *self.get_info().type_id.borrow_mut() = Some(type_id);
        Ok(())
    }

    fn validate(self) -> Result<Self::Validated, TypeValidationError> {
        Ok(match self {
            Expression::Int(v, info, pos) => Expression::Int(v, info.validate(&pos)?, pos),
            Expression::Double(v, info, pos) => Expression::Double(v, info.validate(&pos)?, pos),
            Expression::Str(v, info, pos) => Expression::Str(v, info.validate(&pos)?, pos),
            Expression::Boolean(v, info, pos) => {
                Expression::Boolean(v, info.validate(&pos)?, pos)
            }
            Expression::Null(info, pos) => Expression::Null(info.validate(&pos)?, pos),
            Expression::This(info, pos) => Expression::This(info.validate(&pos)?, pos),
            Expression::Id(id) => Expression::Id(Id {
                info: id.info.validate(&id.position)?,
                name: id.name,
                position: id.position,
            }),
            Expression::Binary(b) => Expression::Binary(Binary {
                info: b.info.validate(&b.position)?,
                left: Box::new(Expression::validate(*b.left)?),
                operator: b.operator,
                right: Box::new(Expression::validate(*b.right)?),
                position: b.position,
            }),
            Expression::Unary(u) => Expression::Unary(Unary {
                info: u.info.validate(&u.position)?,
                operator: u.operator,
                expr: Box::new(Expression::validate(*u.expr)?),
                position: u.position,
            }),
            Expression::MethodCall(call) => Expression::MethodCall(validate_method_call(call)?),
            Expression::FieldAccess(access) => {
                Expression::FieldAccess(validate_field_access(access)?)
            }
            Expression::Assignment(assign) => Expression::Assignment(validate_assignment(assign)?),
            Expression::Block(block) => Expression::Block(validate_block(block)?),
            Expression::If(iff) => Expression::If(validate_if(iff)?),
            Expression::While(w) => Expression::While(validate_while(w)?),
            Expression::ListLiteral(l) => Expression::ListLiteral(ListLiteral {
                info: l.info.validate(&l.position)?,
                elements: l
                    .elements
                    .into_iter()
                    .map(Expression::validate)
                    .collect::<Result<_, _>>()?,
                position: l.position,
            }),
            Expression::MapLiteral(m) => Expression::MapLiteral(MapLiteral {
                info: m.info.validate(&m.position)?,
                entries: m
                    .entries
                    .into_iter()
                    .map(|(k, v)| Ok((Expression::validate(k)?, Expression::validate(v)?)))
                    .collect::<Result<_, TypeValidationError>>()?,
                position: m.position,
            }),
            Expression::Lambda(lambda) => Expression::Lambda(validate_lambda(lambda)?),
            Expression::New(new) => Expression::New(validate_new(new)?),
        })
    }
}

/// Widens two types (if/else branches, list-literal elements) to their
/// narrowest common supertype: exact match keeps the type, `Nothing` defers
/// to the other side, and otherwise whichever side the other is a subtype
/// of wins. Neither being a subtype of the other is a type error.
fn unify_types(
    a: &Type,
    b: &Type,
    ctx: &Context,
    position: &crate::lexer::Span,
) -> TypeResult<Type> {
    if a == b {
        return Ok(a.clone());
    }
    if *a == Type::Nothing {
        return Ok(b.clone());
    }
    if *b == Type::Nothing {
        return Ok(a.clone());
    }
    if b.is_subtype_of(a, ctx) {
        return Ok(a.clone());
    }
    if a.is_subtype_of(b, ctx) {
        return Ok(b.clone());
    }
    Err(TypeCheckError::TypeMismatch(
        TypeMismatch {
            expected: a.clone(),
            actual: b.clone(),
        },
        position.clone(),
    ))
}

/// A type variable unique to one empty list-literal occurrence, standing in
/// for "no element has constrained this yet". Keyed on source position
/// rather than a global counter since nothing in this checker threads
/// mutable id-generation state through `Context`.
fn fresh_type_var(position: &crate::lexer::Span) -> Type {
    Type::TypeVar(format!(
        "?elem@{}:{}",
        position.start.0, position.start.1
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex_significant;
    use crate::parser::{FromTokens, ParseState};

    fn parse_expr(code: &str) -> Expression<()> {
        let tokens = lex_significant(code, "test").expect("lex failed");
        let mut state = ParseState::from(tokens);
        Expression::parse(&mut state).expect("parse failed")
    }

    #[test]
    fn checks_int_literal() {
        let mut ctx = Context::default();
        let checked = parse_expr("1").check(&mut ctx).unwrap();
        assert_eq!(info_type(&checked.get_info()), Type::Int);
    }

    #[test]
    fn checks_arithmetic_widening() {
        let mut ctx = Context::default();
        let checked = parse_expr("1 + 2.0").check(&mut ctx).unwrap();
        assert_eq!(info_type(&checked.get_info()), Type::Double);
    }

    #[test]
    fn rejects_boolean_arithmetic() {
        let mut ctx = Context::default();
        assert!(parse_expr("true + 1").check(&mut ctx).is_err());
    }

    #[test]
    fn checks_if_expression_type() {
        let mut ctx = Context::default();
        let checked = parse_expr("if (true) { 1 } else { 2 }").check(&mut ctx).unwrap();
        assert_eq!(info_type(&checked.get_info()), Type::Int);
    }

    #[test]
    fn rejects_undefined_identifier() {
        let mut ctx = Context::default();
        assert!(parse_expr("foo").check(&mut ctx).is_err());
    }

    #[test]
    fn infers_lambda_signature() {
        let mut ctx = Context::default();
        let checked = parse_expr("{ x: Int => x + 1 }").check(&mut ctx).unwrap();
        assert_eq!(
            info_type(&checked.get_info()),
            Type::Function {
                params: vec![Type::Int],
                return_value: Box::new(Type::Int),
            }
        );
    }

    #[test]
    fn string_concatenation_with_plus() {
        let mut ctx = Context::default();
        let checked = parse_expr(r#""a" + "b""#).check(&mut ctx).unwrap();
        assert_eq!(info_type(&checked.get_info()), Type::String);
    }

    #[test]
    fn string_literal_escapes_are_decoded() {
        let mut ctx = Context::default();
        let checked = parse_expr(r#""hi\n""#).check(&mut ctx).unwrap();
        let Expression::Str(value, ..) = checked else {
            panic!("expected a string literal");
        };
        assert_eq!(value, "hi\n");
    }

    #[test]
    fn if_else_unifies_to_common_supertype() {
        let mut ctx = Context::default();
        let checked = parse_expr("if (true) { true } else { 1 }").check(&mut ctx);
        assert!(checked.is_err(), "Boolean and Int share no common supertype here");
    }

    #[test]
    fn empty_list_gets_a_fresh_type_variable() {
        let mut ctx = Context::default();
        let checked = parse_expr("[]").check(&mut ctx).unwrap();
        assert!(matches!(
            info_type(&checked.get_info()),
            Type::List(elem) if matches!(*elem, Type::TypeVar(_))
        ));
    }

    #[test]
    fn list_literal_unifies_across_all_elements() {
        let mut ctx = Context::default();
        let checked = parse_expr("[1, 2, 3]").check(&mut ctx).unwrap();
        assert_eq!(info_type(&checked.get_info()), Type::List(Box::new(Type::Int)));
    }
}
