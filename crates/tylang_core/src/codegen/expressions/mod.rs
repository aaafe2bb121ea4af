//! Expression lowering: walks a validated [`Expression`] and appends the
//! conventional stack-machine instructions that leave its value on top of
//! the operand stack.
//!
//! Every lowering function takes a [`MethodEmitter`], the bundle of
//! mutable state threaded through one method body's emission (its
//! in-progress [`MethodBody`], the owning class's [`ConstantPool`], the
//! [`CodegenContext`] for local-slot/function-signature lookups, and the
//! list of synthetic lambda methods still to be appended to the class).

mod call;
mod collections;
mod control_flow;
mod lambda;

use crate::parser::ast::{BinaryOperator, Expression, UnaryOperator};
use crate::typechecker::{Type, ValidatedTypeInformation};

use super::bytecode::{op, MethodBody};
use super::classfile::BootstrapMethod;
use super::constant_pool::ConstantPool;
use super::context::CodegenContext;
use super::descriptors;
use super::error::CodegenError;

pub use lambda::PendingMethod;

/// Mutable state threaded through one method body's emission.
pub struct MethodEmitter<'a> {
    pub body: &'a mut MethodBody,
    pub pool: &'a mut ConstantPool,
    pub ctx: &'a mut CodegenContext,
    /// Internal name of the class the method being emitted belongs to
    /// (`this`'s field/method lookups resolve against it).
    pub owner_internal_name: String,
    /// Whether the method currently being emitted is static, i.e. has no
    /// `this` — decides whether a nested lambda needs to capture it.
    pub is_static_context: bool,
    /// Synthetic `private static` methods (lambda bodies) discovered while
    /// emitting this class, appended to its method table once the class's
    /// declared methods are all emitted.
    pub pending_methods: &'a mut Vec<PendingMethod>,
    /// `BootstrapMethods` entries discovered while emitting this class.
    pub pending_bootstraps: &'a mut Vec<BootstrapMethod>,
}

fn expr_type(expr: &Expression<ValidatedTypeInformation>) -> Type {
    expr.get_info().type_id
}

pub fn emit_expression(
    expr: &Expression<ValidatedTypeInformation>,
    emitter: &mut MethodEmitter,
) -> Result<(), CodegenError> {
    match expr {
        Expression::Int(value, ..) => emit_int_literal(*value, emitter),
        Expression::Double(value, ..) => emit_double_literal(*value, emitter),
        Expression::Boolean(value, ..) => emit_boolean_literal(*value, emitter),
        Expression::Str(value, ..) => {
            let idx = emitter.pool.string(value);
            emitter.body.emit_u16(op::LDC_W, idx, 1);
            Ok(())
        }
        Expression::Null(..) => {
            emitter.body.emit(0x01, 1); // aconst_null
            Ok(())
        }
        Expression::This(..) => {
            emitter.body.emit(op::ALOAD_0, 1);
            Ok(())
        }
        Expression::Id(id) => call::emit_id(id, emitter),
        Expression::Binary(binary) => emit_binary(binary, emitter),
        Expression::Unary(unary) => emit_unary(unary, emitter),
        Expression::MethodCall(call) => call::emit_method_call(call, emitter),
        Expression::FieldAccess(access) => call::emit_field_access(access, emitter),
        Expression::Assignment(assignment) => call::emit_assignment(assignment, emitter),
        Expression::Block(block) => control_flow::emit_block(block, emitter),
        Expression::If(if_expr) => control_flow::emit_if(if_expr, emitter),
        Expression::While(while_expr) => control_flow::emit_while(while_expr, emitter),
        Expression::ListLiteral(list) => collections::emit_list_literal(list, emitter),
        Expression::MapLiteral(map) => collections::emit_map_literal(map, emitter),
        Expression::Lambda(lambda) => lambda::emit_lambda(lambda, emitter),
        Expression::New(new_expr) => call::emit_new(new_expr, emitter),
    }
}

fn emit_int_literal(value: i64, emitter: &mut MethodEmitter) -> Result<(), CodegenError> {
    match value {
        -1 => emitter.body.emit(op::ICONST_M1, 1),
        0 => emitter.body.emit(op::ICONST_0, 1),
        1 => emitter.body.emit(op::ICONST_1, 1),
        2 => emitter.body.emit(op::ICONST_2, 1),
        3 => emitter.body.emit(op::ICONST_3, 1),
        4 => emitter.body.emit(op::ICONST_4, 1),
        5 => emitter.body.emit(op::ICONST_5, 1),
        _ => {
            let idx = emitter.pool.integer(value as i32);
            emitter.body.emit_u16(op::LDC_W, idx, 1);
        }
    }
    Ok(())
}

fn emit_double_literal(value: f64, emitter: &mut MethodEmitter) -> Result<(), CodegenError> {
    let idx = emitter.pool.float(value);
    emitter.body.emit_u16(op::LDC_W, idx, 1);
    Ok(())
}

fn emit_boolean_literal(value: bool, emitter: &mut MethodEmitter) -> Result<(), CodegenError> {
    emitter
        .body
        .emit(if value { op::ICONST_1 } else { op::ICONST_0 }, 1);
    Ok(())
}

fn emit_binary(
    binary: &crate::parser::ast::Binary<ValidatedTypeInformation>,
    emitter: &mut MethodEmitter,
) -> Result<(), CodegenError> {
    // Short-circuit operators need to skip the right operand entirely, so
    // they branch around the shared arithmetic/comparison tail below.
    if matches!(binary.operator, BinaryOperator::And) {
        emit_expression(&binary.left, emitter)?;
        let short_circuit = emitter.body.emit_jump(op::IFEQ, -1);
        emit_expression(&binary.right, emitter)?;
        let done = emitter.body.emit_jump(op::GOTO, 0);
        emitter.body.patch_jump(short_circuit);
        emitter.body.emit(op::ICONST_0, 1);
        emitter.body.patch_jump(done);
        return Ok(());
    }
    if matches!(binary.operator, BinaryOperator::Or) {
        emit_expression(&binary.left, emitter)?;
        let short_circuit = emitter.body.emit_jump(op::IFNE, -1);
        emit_expression(&binary.right, emitter)?;
        let done = emitter.body.emit_jump(op::GOTO, 0);
        emitter.body.patch_jump(short_circuit);
        emitter.body.emit(op::ICONST_1, 1);
        emitter.body.patch_jump(done);
        return Ok(());
    }

    // `**` converts each operand to double as it's pushed (Math.pow only
    // has a (D,D)D overload), so it cannot share the push-both-then-match
    // tail below.
    if matches!(binary.operator, BinaryOperator::Pow) {
        let left_ty = expr_type(&binary.left);
        let right_ty = expr_type(&binary.right);
        emit_expression(&binary.left, emitter)?;
        if left_ty != Type::Double {
            emitter.body.emit(op::I2D, 1);
        }
        emit_expression(&binary.right, emitter)?;
        if right_ty != Type::Double {
            emitter.body.emit(op::I2D, 1);
        }
        let pow_idx = emitter
            .pool
            .methodref("java/lang/Math", "pow", "(DD)D");
        emitter.body.emit_u16(op::INVOKESTATIC, pow_idx, -2);
        if left_ty != Type::Double {
            emitter.body.emit(op::D2I, -1);
        }
        return Ok(());
    }

    let left_ty = expr_type(&binary.left);
    let right_ty = expr_type(&binary.right);
    if matches!(binary.operator, BinaryOperator::Add) && (left_ty == Type::String || right_ty == Type::String) {
        return emit_string_concat(binary, emitter);
    }

    emit_expression(&binary.left, emitter)?;
    emit_expression(&binary.right, emitter)?;

    let is_double = left_ty == Type::Double;

    match binary.operator {
        BinaryOperator::Add => emitter.body.emit(if is_double { op::DADD } else { op::IADD }, -1),
        BinaryOperator::Sub => emitter.body.emit(if is_double { op::DSUB } else { op::ISUB }, -1),
        BinaryOperator::Mul => emitter.body.emit(if is_double { op::DMUL } else { op::IMUL }, -1),
        BinaryOperator::Div => emitter.body.emit(if is_double { op::DDIV } else { op::IDIV }, -1),
        BinaryOperator::Mod => emitter.body.emit(if is_double { op::DREM } else { op::IREM }, -1),
        BinaryOperator::Pow => unreachable!("handled above"),
        BinaryOperator::Eq | BinaryOperator::Neq => {
            emit_int_comparison(
                if matches!(binary.operator, BinaryOperator::Eq) {
                    op::IF_ICMPEQ
                } else {
                    op::IF_ICMPNE
                },
                emitter,
            );
        }
        BinaryOperator::Lt => emit_int_comparison(op::IF_ICMPLT, emitter),
        BinaryOperator::Gt => emit_int_comparison(op::IF_ICMPGT, emitter),
        BinaryOperator::Le => emit_int_comparison(op::IF_ICMPLE, emitter),
        BinaryOperator::Ge => emit_int_comparison(op::IF_ICMPGE, emitter),
        BinaryOperator::And | BinaryOperator::Or => unreachable!("handled above"),
    }

    Ok(())
}

/// `+` where either operand is `String` lowers to the classic
/// `new StringBuilder().append(left).append(right).toString()` chain rather
/// than `IADD`/`DADD`, since the class-file format has no string-concat
/// instruction of its own.
fn emit_string_concat(
    binary: &crate::parser::ast::Binary<ValidatedTypeInformation>,
    emitter: &mut MethodEmitter,
) -> Result<(), CodegenError> {
    const BUILDER: &str = "java/lang/StringBuilder";

    let class_idx = emitter.pool.class(BUILDER);
    emitter.body.emit_u16(op::NEW, class_idx, 1);
    emitter.body.emit(op::DUP, 1);
    let ctor_idx = emitter.pool.methodref(BUILDER, "<init>", "()V");
    emitter.body.emit_u16(op::INVOKESPECIAL, ctor_idx, -1);

    for operand in [&binary.left, &binary.right] {
        emit_expression(operand, emitter)?;
        let descriptor = append_descriptor(&expr_type(operand));
        let append_idx = emitter.pool.methodref(BUILDER, "append", descriptor);
        emitter.body.emit_u16(op::INVOKEVIRTUAL, append_idx, -1);
    }

    let to_string_idx = emitter
        .pool
        .methodref(BUILDER, "toString", "()Ljava/lang/String;");
    emitter.body.emit_u16(op::INVOKEVIRTUAL, to_string_idx, 0);
    Ok(())
}

fn append_descriptor(ty: &Type) -> &'static str {
    match ty {
        Type::Int => "(I)Ljava/lang/StringBuilder;",
        Type::Double => "(D)Ljava/lang/StringBuilder;",
        Type::Boolean => "(Z)Ljava/lang/StringBuilder;",
        Type::String => "(Ljava/lang/String;)Ljava/lang/StringBuilder;",
        _ => "(Ljava/lang/Object;)Ljava/lang/StringBuilder;",
    }
}

/// Relational/equality operators push 0/1 via a conditional jump, per
/// spec's "comparisons use conditional jumps to push 0/1".
fn emit_int_comparison(jump_if_true: u8, emitter: &mut MethodEmitter) {
    let take_true = emitter.body.emit_jump(jump_if_true, -2);
    emitter.body.emit(op::ICONST_0, 1);
    let done = emitter.body.emit_jump(op::GOTO, 0);
    emitter.body.patch_jump(take_true);
    emitter.body.emit(op::ICONST_1, 1);
    emitter.body.patch_jump(done);
}

fn emit_unary(
    unary: &crate::parser::ast::Unary<ValidatedTypeInformation>,
    emitter: &mut MethodEmitter,
) -> Result<(), CodegenError> {
    let operand_ty = expr_type(&unary.expr);
    emit_expression(&unary.expr, emitter)?;
    match unary.operator {
        UnaryOperator::Neg => {
            let opcode = if operand_ty == Type::Double { op::DNEG } else { op::INEG };
            emitter.body.emit(opcode, 0);
        }
        // unary `+` is a no-op at the bytecode level: the operand is already
        // on the stack with its own numeric type.
        UnaryOperator::Pos => {}
        UnaryOperator::Not => {
            // `!b` lowers to `b == 0`: push 1, flip with ixor-free compare.
            let take_true = emitter.body.emit_jump(op::IFEQ, -1);
            emitter.body.emit(op::ICONST_0, 1);
            let done = emitter.body.emit_jump(op::GOTO, 0);
            emitter.body.patch_jump(take_true);
            emitter.body.emit(op::ICONST_1, 1);
            emitter.body.patch_jump(done);
        }
    }
    Ok(())
}

pub(super) fn descriptor_for(ty: &Type) -> String {
    descriptors::field_descriptor(ty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::context::CodegenContext;

    #[allow(clippy::too_many_arguments)]
    fn new_emitter<'a>(
        body: &'a mut MethodBody,
        pool: &'a mut ConstantPool,
        ctx: &'a mut CodegenContext,
        pending_methods: &'a mut Vec<PendingMethod>,
        pending_bootstraps: &'a mut Vec<super::super::classfile::BootstrapMethod>,
    ) -> MethodEmitter<'a> {
        MethodEmitter {
            body,
            pool,
            ctx,
            owner_internal_name: "Test".to_string(),
            is_static_context: true,
            pending_methods,
            pending_bootstraps,
        }
    }

    #[test]
    fn small_int_literal_uses_iconst() {
        let mut body = MethodBody::new(0);
        let mut pool = ConstantPool::default();
        let mut ctx = CodegenContext::new();
        let mut pending = vec![];
        let mut bootstraps = vec![];
        let mut emitter = new_emitter(&mut body, &mut pool, &mut ctx, &mut pending, &mut bootstraps);
        emit_int_literal(3, &mut emitter).unwrap();
        assert_eq!(body.into_bytes(), vec![op::ICONST_3]);
    }

    #[test]
    fn large_int_literal_uses_ldc_w() {
        let mut body = MethodBody::new(0);
        let mut pool = ConstantPool::default();
        let mut ctx = CodegenContext::new();
        let mut pending = vec![];
        let mut bootstraps = vec![];
        let mut emitter = new_emitter(&mut body, &mut pool, &mut ctx, &mut pending, &mut bootstraps);
        emit_int_literal(1000, &mut emitter).unwrap();
        let bytes = body.into_bytes();
        assert_eq!(bytes[0], op::LDC_W);
    }
}
