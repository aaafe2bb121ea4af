//! Statement-level emission: expression statements, local `val`/`var`
//! bindings and `return`.

use crate::parser::ast::Statement;
use crate::typechecker::{Type, ValidatedTypeInformation};

use super::bytecode::op;
use super::descriptors;
use super::error::CodegenError;
use super::expressions::{emit_expression, MethodEmitter};

/// `keep_value`: the caller (a block) keeps the produced value on the
/// stack only for its own trailing expression statement; every other
/// expression statement's value is computed for effect and discarded.
pub fn emit_statement(
    statement: &Statement<ValidatedTypeInformation>,
    emitter: &mut MethodEmitter,
    keep_value: bool,
) -> Result<(), CodegenError> {
    match statement {
        Statement::Expression(expr) => {
            emit_expression(expr, emitter)?;
            let ty = expr.get_info().type_id;
            if ty != Type::Unit && !keep_value {
                if descriptors::is_wide(&ty) {
                    emitter.body.emit(op::POP2, -2);
                } else {
                    emitter.body.emit(op::POP, -1);
                }
            }
            Ok(())
        }
        Statement::VarDeclaration(decl) => {
            emit_expression(&decl.value, emitter)?;
            let ty = decl.value.get_info().type_id;
            let wide = descriptors::is_wide(&ty);
            let slot = emitter.body.allocate_local(wide);
            emitter.ctx.bind_local(decl.name.clone(), slot, ty.clone());
            let store_op = descriptors::store_opcode(&ty);
            emitter.body.emit_u8(store_op, slot as u8, -1);
            Ok(())
        }
        Statement::Return(ret) => {
            match &ret.value {
                Some(expr) => {
                    emit_expression(expr, emitter)?;
                    let opcode = descriptors::return_opcode(&expr.get_info().type_id);
                    emitter.body.emit(opcode, 0);
                }
                None => {
                    emitter.body.emit(op::RETURN, 0);
                }
            }
            Ok(())
        }
    }
}
