//! List and map literals lower to the construction of a mutable
//! `java.util` container followed by one `add`/`put` call per element,
//! since the class file format has no literal-aggregate constant for
//! either. Primitive elements are boxed first, since `List`/`Map` are
//! generic over `Object`.

use crate::parser::ast::{ListLiteral, MapLiteral};
use crate::typechecker::{Type, ValidatedTypeInformation};

use super::super::bytecode::op;
use super::super::error::CodegenError;
use super::{emit_expression, MethodEmitter};

const ARRAY_LIST: &str = "java/util/ArrayList";
const HASH_MAP: &str = "java/util/HashMap";

/// After a primitive value is on the stack, replaces it with its boxed
/// wrapper via the wrapper's static `valueOf`. A no-op for reference types.
fn box_value(ty: &Type, emitter: &mut MethodEmitter) {
    let (owner, descriptor) = match ty {
        Type::Int => ("java/lang/Integer", "(I)Ljava/lang/Integer;"),
        Type::Double => ("java/lang/Double", "(D)Ljava/lang/Double;"),
        Type::Boolean => ("java/lang/Boolean", "(Z)Ljava/lang/Boolean;"),
        _ => return,
    };
    let idx = emitter.pool.methodref(owner, "valueOf", descriptor);
    emitter.body.emit_u16(op::INVOKESTATIC, idx, 0);
}

pub fn emit_list_literal(
    list: &ListLiteral<ValidatedTypeInformation>,
    emitter: &mut MethodEmitter,
) -> Result<(), CodegenError> {
    let class_idx = emitter.pool.class(ARRAY_LIST);
    emitter.body.emit_u16(op::NEW, class_idx, 1);
    emitter.body.emit(op::DUP, 1);
    let ctor_idx = emitter.pool.methodref(ARRAY_LIST, "<init>", "()V");
    emitter.body.emit_u16(op::INVOKESPECIAL, ctor_idx, -1);

    let add_idx = emitter
        .pool
        .methodref(ARRAY_LIST, "add", "(Ljava/lang/Object;)Z");
    for element in &list.elements {
        emitter.body.emit(op::DUP, 1);
        emit_expression(element, emitter)?;
        box_value(&element.get_info().type_id, emitter);
        emitter.body.emit_u16(op::INVOKEVIRTUAL, add_idx, -1);
        emitter.body.emit(op::POP, -1);
    }
    Ok(())
}

pub fn emit_map_literal(
    map: &MapLiteral<ValidatedTypeInformation>,
    emitter: &mut MethodEmitter,
) -> Result<(), CodegenError> {
    let class_idx = emitter.pool.class(HASH_MAP);
    emitter.body.emit_u16(op::NEW, class_idx, 1);
    emitter.body.emit(op::DUP, 1);
    let ctor_idx = emitter.pool.methodref(HASH_MAP, "<init>", "()V");
    emitter.body.emit_u16(op::INVOKESPECIAL, ctor_idx, -1);

    let put_idx = emitter.pool.methodref(
        HASH_MAP,
        "put",
        "(Ljava/lang/Object;Ljava/lang/Object;)Ljava/lang/Object;",
    );
    for (key, value) in &map.entries {
        emitter.body.emit(op::DUP, 1);
        emit_expression(key, emitter)?;
        box_value(&key.get_info().type_id, emitter);
        emit_expression(value, emitter)?;
        box_value(&value.get_info().type_id, emitter);
        emitter.body.emit_u16(op::INVOKEVIRTUAL, put_idx, -2);
        emitter.body.emit(op::POP, -1);
    }
    Ok(())
}
