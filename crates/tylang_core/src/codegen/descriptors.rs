//! Maps semantic [`Type`]s to class-file field/method descriptors and to
//! the opcode family (`i*`/`d*`/`a*`) a value of that type is loaded,
//! stored and returned with. Centralised here so every emitter (top-level
//! function wrapper, class, trait, object, extension, expression lowering)
//! agrees on the same mapping.

use crate::typechecker::Type;

use super::bytecode::op;

pub fn field_descriptor(ty: &Type) -> String {
    match ty {
        Type::Int => "I".to_string(),
        Type::Double => "D".to_string(),
        Type::Boolean => "Z".to_string(),
        Type::Unit => "V".to_string(),
        Type::String => "Ljava/lang/String;".to_string(),
        Type::List(_) => "Ljava/util/List;".to_string(),
        Type::Set(_) => "Ljava/util/Set;".to_string(),
        Type::Map(_, _) => "Ljava/util/Map;".to_string(),
        Type::Named { name, .. } => format!("L{name};"),
        // Function values, structural types, Any/Nothing/Null/Unknown and
        // bare type variables all erase to Object at the class-file level;
        // the functional-interface shape (if any) is recovered from the
        // static type the checker recorded, not the descriptor.
        Type::Any
        | Type::Nothing
        | Type::Null
        | Type::Unknown
        | Type::TypeVar(_)
        | Type::Function { .. }
        | Type::Structural(_) => "Ljava/lang/Object;".to_string(),
    }
}

pub fn method_descriptor(params: &[Type], return_type: &Type) -> String {
    let params: String = params.iter().map(field_descriptor).collect();
    format!("({params}){}", field_descriptor(return_type))
}

/// `Some(internal_name)` for class/trait/object types, i.e. the ones that
/// can appear as `this_class`/`super_class`/an interface entry.
pub fn internal_name(ty: &Type) -> Option<String> {
    match ty {
        Type::Named { name, .. } => Some(name.clone()),
        _ => None,
    }
}

/// `double` is the only JVM-category-2 type tylang's type system surfaces
/// (no `long`), so this is the full predicate for "occupies two local slots
/// / two stack words".
pub fn is_wide(ty: &Type) -> bool {
    matches!(ty, Type::Double)
}

pub fn load_opcode(ty: &Type) -> u8 {
    match ty {
        Type::Int | Type::Boolean => op::ILOAD,
        Type::Double => op::DLOAD,
        _ => op::ALOAD,
    }
}

pub fn store_opcode(ty: &Type) -> u8 {
    match ty {
        Type::Int | Type::Boolean => op::ISTORE,
        Type::Double => op::DSTORE,
        _ => op::ASTORE,
    }
}

pub fn return_opcode(ty: &Type) -> u8 {
    match ty {
        Type::Unit => op::RETURN,
        Type::Int | Type::Boolean => op::IRETURN,
        Type::Double => op::DRETURN,
        _ => op::ARETURN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_descriptors() {
        assert_eq!(field_descriptor(&Type::Int), "I");
        assert_eq!(field_descriptor(&Type::Double), "D");
        assert_eq!(field_descriptor(&Type::Boolean), "Z");
        assert_eq!(field_descriptor(&Type::Unit), "V");
    }

    #[test]
    fn named_type_descriptor_is_object_reference() {
        let point = Type::Named {
            kind: crate::typechecker::NamedKind::Class,
            name: "Point".into(),
            type_params: vec![],
            type_args: vec![],
            super_type: None,
            implemented_traits: vec![],
            members: vec![],
        };
        assert_eq!(field_descriptor(&point), "LPoint;");
    }

    #[test]
    fn method_descriptor_combines_params_and_return() {
        assert_eq!(
            method_descriptor(&[Type::Int, Type::Int], &Type::Int),
            "(II)I"
        );
    }
}
