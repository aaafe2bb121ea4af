//! Identifier resolution, method calls, field access, assignment and `new`.
//!
//! Identifier lowering resolution order: a name bound in the current
//! method's own local-slot table is a true local; otherwise, if its static
//! type is an `object` singleton, it's that singleton's `INSTANCE`; else if
//! it names a top-level function, it materialises as a function value;
//! anything else remaining must be a field reached through the implicit
//! `this`, since the type checker resolves exactly those four cases in
//! that same preference order.

use crate::parser::ast::{Assignment, Expression, FieldAccess, Id, MethodCall, New};
use crate::typechecker::{NamedKind, Type, ValidatedTypeInformation};

use super::super::bytecode::op;
use super::super::descriptors;
use super::super::error::{CodegenError, InvalidAssignmentTarget, MethodReferenceNotSupported, UndefinedIdentifier};
use super::super::lambda_shapes::choose_shape;
use super::{emit_expression, MethodEmitter};

fn extension_class_name(ty: &Type) -> Option<String> {
    let base = match ty {
        Type::Int => "Int",
        Type::Double => "Double",
        Type::Boolean => "Boolean",
        Type::String => "String",
        Type::List(_) => "List",
        Type::Set(_) => "Set",
        Type::Map(_, _) => "Map",
        Type::Named { name, .. } => return Some(name.clone()),
        _ => return None,
    };
    Some(base.to_string())
}

fn function_signature_parts(ty: &Type) -> Option<(Vec<Type>, Type)> {
    match ty {
        Type::Function { params, return_value } => Some((params.clone(), (**return_value).clone())),
        _ => None,
    }
}

pub fn emit_id(id: &Id<ValidatedTypeInformation>, emitter: &mut MethodEmitter) -> Result<(), CodegenError> {
    if let Some(local) = emitter.ctx.resolve_local(&id.name) {
        let opcode = descriptors::load_opcode(&local.ty);
        emitter.body.emit_u8(opcode, local.slot as u8, 1);
        return Ok(());
    }

    if let Type::Named { kind: NamedKind::Object, name, .. } = &id.info.type_id {
        let field_idx = emitter.pool.fieldref(name, "INSTANCE", &format!("L{name};"));
        emitter.body.emit_u16(op::GETSTATIC, field_idx, 1);
        return Ok(());
    }

    if let Some(signature) = emitter.ctx.function_signature(&id.name).cloned() {
        return emit_function_value(&id.name, &signature, &id.position, emitter);
    }

    let descriptor = descriptors::field_descriptor(&id.info.type_id);
    let owner = emitter.owner_internal_name.clone();
    let field_idx = emitter.pool.fieldref(&owner, &id.name, &descriptor);
    emitter.body.emit(op::ALOAD_0, 1);
    emitter.body.emit_u16(op::GETFIELD, field_idx, 0);
    Ok(())
}

/// Materialises a bare reference to a top-level function (not immediately
/// called) as a functional-interface instance, via the same invokedynamic
/// machinery lambdas use — the function's own wrapper-class static method
/// is used directly as the implementation handle, no synthetic method
/// needed.
fn emit_function_value(
    name: &str,
    signature: &Type,
    position: &crate::lexer::Span,
    emitter: &mut MethodEmitter,
) -> Result<(), CodegenError> {
    let (params, return_type) = function_signature_parts(signature).ok_or_else(|| {
        CodegenError::UndefinedIdentifier(UndefinedIdentifier { name: name.to_string() }, position.clone())
    })?;
    let shape = choose_shape(&params, &return_type, position)?;
    let wrapper_class = format!("{name}$");
    let impl_descriptor = descriptors::method_descriptor(&params, &return_type);

    let bootstrap_idx = super::lambda::register_function_reference_bootstrap(
        emitter,
        &wrapper_class,
        name,
        &impl_descriptor,
        &shape,
    );
    let indy_idx = emitter.pool.invoke_dynamic(
        bootstrap_idx,
        shape.method_name,
        &format!("(){}", format!("L{};", shape.interface_internal_name)),
    );
    emitter.body.emit_invoke_dynamic(indy_idx, 1);
    Ok(())
}

pub fn emit_method_call(
    call: &MethodCall<ValidatedTypeInformation>,
    emitter: &mut MethodEmitter,
) -> Result<(), CodegenError> {
    // A direct top-level function call: `f(args)` parses as `f.apply(args)`
    // with `f` a bare `Id` naming a registered top-level function.
    if call.method == "apply" {
        if let Expression::Id(id) = call.receiver.as_ref() {
            if emitter.ctx.resolve_local(&id.name).is_none() {
                if let Some(signature) = emitter.ctx.function_signature(&id.name).cloned() {
                    let (params, return_type) = function_signature_parts(&signature).ok_or_else(|| {
                        CodegenError::UndefinedIdentifier(
                            UndefinedIdentifier { name: id.name.clone() },
                            call.position.clone(),
                        )
                    })?;
                    for arg in &call.args {
                        emit_expression(arg, emitter)?;
                    }
                    let wrapper_class = format!("{}$", id.name);
                    let descriptor = descriptors::method_descriptor(&params, &return_type);
                    let idx = emitter.pool.methodref(&wrapper_class, &id.name, &descriptor);
                    let stack_delta = if return_type == Type::Unit { 0 } else { 1 } - params.len() as i32;
                    emitter.body.emit_u16(op::INVOKESTATIC, idx, stack_delta);
                    return Ok(());
                }
            }
        }
    }

    let receiver_ty = call.receiver.get_info().type_id;

    // A call on a function-typed value: invoke through the functional
    // interface shape its signature picks.
    if let Some((params, return_type)) = function_signature_parts(&receiver_ty) {
        emit_expression(&call.receiver, emitter)?;
        for arg in &call.args {
            emit_expression(arg, emitter)?;
        }
        let shape = choose_shape(&params, &return_type, &call.position)?;
        let idx = emitter.pool.interface_methodref(
            shape.interface_internal_name,
            shape.method_name,
            &shape.method_descriptor(),
        );
        let stack_delta = (if return_type == Type::Unit { 0 } else { 1 }) - params.len() as i32 - 1;
        let arg_count: u8 = 1 + params
            .iter()
            .map(|t| if descriptors::is_wide(t) { 2 } else { 1 })
            .sum::<u8>();
        emitter.body.emit_invoke_interface(idx, arg_count, stack_delta);
        return Ok(());
    }

    let is_own_member = receiver_ty
        .members()
        .iter()
        .any(|(name, _)| name == &call.method);

    let owner = extension_class_name(&receiver_ty).ok_or_else(|| {
        CodegenError::MethodReferenceNotSupported(
            MethodReferenceNotSupported { member_name: call.method.clone() },
            call.position.clone(),
        )
    })?;

    let mut scope_snapshot = call.receiver.get_info().context.scope.clone();
    let signature = scope_snapshot
        .resolve_property_for_type(receiver_ty.clone(), &call.method)
        .and_then(|ty| function_signature_parts(&ty));

    let (params, return_type) = signature.ok_or_else(|| {
        CodegenError::MethodReferenceNotSupported(
            MethodReferenceNotSupported { member_name: call.method.clone() },
            call.position.clone(),
        )
    })?;

    emit_expression(&call.receiver, emitter)?;
    for arg in &call.args {
        emit_expression(arg, emitter)?;
    }

    if is_own_member {
        let descriptor = descriptors::method_descriptor(&params, &return_type);
        let kind = match &receiver_ty {
            Type::Named { kind, .. } => *kind,
            _ => NamedKind::Class,
        };
        let stack_delta = (if return_type == Type::Unit { 0 } else { 1 }) - params.len() as i32 - 1;
        if matches!(kind, NamedKind::Trait) {
            let idx = emitter.pool.interface_methodref(&owner, &call.method, &descriptor);
            let arg_count: u8 = 1 + params
                .iter()
                .map(|t| if descriptors::is_wide(t) { 2 } else { 1 })
                .sum::<u8>();
            emitter.body.emit_invoke_interface(idx, arg_count, stack_delta);
        } else {
            let idx = emitter.pool.methodref(&owner, &call.method, &descriptor);
            emitter.body.emit_u16(op::INVOKEVIRTUAL, idx, stack_delta);
        }
    } else {
        let mut ext_params = Vec::with_capacity(params.len() + 1);
        ext_params.push(receiver_ty.clone());
        ext_params.extend(params.iter().cloned());
        let descriptor = descriptors::method_descriptor(&ext_params, &return_type);
        let ext_owner = format!("{owner}$Extension");
        let idx = emitter.pool.methodref(&ext_owner, &call.method, &descriptor);
        let stack_delta = (if return_type == Type::Unit { 0 } else { 1 }) - ext_params.len() as i32;
        emitter.body.emit_u16(op::INVOKESTATIC, idx, stack_delta);
    }

    Ok(())
}

pub fn emit_field_access(
    access: &FieldAccess<ValidatedTypeInformation>,
    emitter: &mut MethodEmitter,
) -> Result<(), CodegenError> {
    emit_expression(&access.receiver, emitter)?;
    let owner = extension_class_name(&access.receiver.get_info().type_id).ok_or_else(|| {
        CodegenError::UndefinedIdentifier(
            UndefinedIdentifier { name: access.field.clone() },
            access.position.clone(),
        )
    })?;
    let descriptor = descriptors::field_descriptor(&access.info.type_id);
    let idx = emitter.pool.fieldref(&owner, &access.field, &descriptor);
    emitter.body.emit_u16(op::GETFIELD, idx, 0);
    Ok(())
}

pub fn emit_assignment(
    assignment: &Assignment<ValidatedTypeInformation>,
    emitter: &mut MethodEmitter,
) -> Result<(), CodegenError> {
    match assignment.target.as_ref() {
        Expression::Id(id) => {
            if let Some(local) = emitter.ctx.resolve_local(&id.name) {
                emit_expression(&assignment.value, emitter)?;
                let store_op = descriptors::store_opcode(&local.ty);
                emitter.body.emit_u8(store_op, local.slot as u8, -1);
                Ok(())
            } else {
                // putfield needs objectref below the value, so `this`
                // loads first.
                emitter.body.emit(op::ALOAD_0, 1);
                emit_expression(&assignment.value, emitter)?;
                let descriptor = descriptors::field_descriptor(&id.info.type_id);
                let owner = emitter.owner_internal_name.clone();
                let idx = emitter.pool.fieldref(&owner, &id.name, &descriptor);
                emitter.body.emit_u16(op::PUTFIELD, idx, -2);
                Ok(())
            }
        }
        Expression::FieldAccess(access) => {
            emit_expression(&access.receiver, emitter)?;
            emit_expression(&assignment.value, emitter)?;
            let owner = extension_class_name(&access.receiver.get_info().type_id).ok_or_else(|| {
                CodegenError::InvalidAssignmentTarget(
                    InvalidAssignmentTarget { description: access.field.clone() },
                    assignment.position.clone(),
                )
            })?;
            let descriptor = descriptors::field_descriptor(&access.info.type_id);
            let idx = emitter.pool.fieldref(&owner, &access.field, &descriptor);
            emitter.body.emit_u16(op::PUTFIELD, idx, -2);
            Ok(())
        }
        other => Err(CodegenError::InvalidAssignmentTarget(
            InvalidAssignmentTarget { description: format!("{other:?}") },
            assignment.position.clone(),
        )),
    }
}

pub fn emit_new(new_expr: &New<ValidatedTypeInformation>, emitter: &mut MethodEmitter) -> Result<(), CodegenError> {
    let class_name = new_expr.class_name.clone();
    let class_idx = emitter.pool.class(&class_name);
    emitter.body.emit_u16(op::NEW, class_idx, 1);
    emitter.body.emit(op::DUP, 1);

    let mut param_types = Vec::with_capacity(new_expr.args.len());
    for arg in &new_expr.args {
        param_types.push(arg.get_info().type_id);
        emit_expression(arg, emitter)?;
    }
    let descriptor = descriptors::method_descriptor(&param_types, &Type::Unit);
    let idx = emitter.pool.methodref(&class_name, "<init>", &descriptor);
    let stack_delta = -1 - param_types.len() as i32;
    emitter.body.emit_u16(op::INVOKESPECIAL, idx, stack_delta);
    Ok(())
}
