//! Block, `if` and `while` lowering: all three are pure stack-machine
//! control flow, no AST-level basic-block graph is ever built.

use crate::parser::ast::{Block, If, Statement, While};
use crate::typechecker::{Type, ValidatedTypeInformation};

use super::super::bytecode::op;
use super::super::descriptors;
use super::super::error::CodegenError;
use super::{emit_expression, MethodEmitter};
use crate::codegen::statements::emit_statement;

/// A block's value is its trailing expression statement's value, if the
/// last statement is one; otherwise the block produces `Unit` and nothing
/// is left on the stack (every `Unit`-typed expression's emission is its
/// own no-op by convention, so the two cases need no separate handling).
pub fn emit_block(
    block: &Block<ValidatedTypeInformation>,
    emitter: &mut MethodEmitter,
) -> Result<(), CodegenError> {
    for (index, statement) in block.statements.iter().enumerate() {
        let is_last = index + 1 == block.statements.len();
        emit_statement(statement, emitter, is_last)?;
    }
    Ok(())
}

fn trailing_value_type(block: &Block<ValidatedTypeInformation>) -> Option<Type> {
    match block.statements.last() {
        Some(Statement::Expression(e)) => Some(e.get_info().type_id),
        _ => None,
    }
}

pub fn emit_if(
    if_expr: &If<ValidatedTypeInformation>,
    emitter: &mut MethodEmitter,
) -> Result<(), CodegenError> {
    emit_expression(&if_expr.condition, emitter)?;
    let to_else = emitter.body.emit_jump(op::IFEQ, -1);
    emit_block(&if_expr.then_branch, emitter)?;
    let to_end = emitter.body.emit_jump(op::GOTO, 0);
    emitter.body.patch_jump(to_else);
    if let Some(else_branch) = &if_expr.else_branch {
        emit_block(else_branch, emitter)?;
    }
    // A value-producing `if` always has an else branch, enforced at type
    // check time; a Unit-typed `if` with no else leaves nothing on either
    // path, so the two arms stay balanced either way.
    emitter.body.patch_jump(to_end);
    Ok(())
}

pub fn emit_while(
    while_expr: &While<ValidatedTypeInformation>,
    emitter: &mut MethodEmitter,
) -> Result<(), CodegenError> {
    let loop_start = emitter.body.here();
    emit_expression(&while_expr.condition, emitter)?;
    let exit = emitter.body.emit_jump(op::IFEQ, -1);
    emit_block(&while_expr.body, emitter)?;
    if let Some(trailing_ty) = trailing_value_type(&while_expr.body) {
        if trailing_ty != Type::Unit {
            if descriptors::is_wide(&trailing_ty) {
                emitter.body.emit(op::POP2, -2);
            } else {
                emitter.body.emit(op::POP, -1);
            }
        }
    }
    let back = emitter.body.emit_jump(op::GOTO, 0);
    emitter.body.patch_jump_to(back, loop_start);
    emitter.body.patch_jump(exit);
    Ok(())
}
