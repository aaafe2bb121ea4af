//! The functional-interface dispatch table: picks which `java.util.function`
//! single-abstract-method shape a tylang function value materialises as,
//! preferring a primitive-specialised interface over an object-boxing one
//! when the parameter/return types allow it.

use crate::typechecker::Type;

use super::error::{CodegenError, UnsupportedLambdaArity};

/// The JVM descriptor slot kind a parameter or return position needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    Int,
    Double,
    Object,
}

fn slot_for(ty: &Type) -> Slot {
    match ty {
        Type::Int => Slot::Int,
        Type::Double => Slot::Double,
        _ => Slot::Object,
    }
}

/// A single-abstract-method interface this emitter can target, with enough
/// information to build its descriptor and the functional method's own
/// descriptor for the invokedynamic bootstrap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionalShape {
    pub interface_internal_name: &'static str,
    pub method_name: &'static str,
    pub param_slots: Vec<Slot>,
    pub return_slot: Slot,
}

impl FunctionalShape {
    pub fn method_descriptor(&self) -> String {
        let params: String = self
            .param_slots
            .iter()
            .map(|s| slot_descriptor(*s))
            .collect();
        format!("({params}){}", slot_descriptor(self.return_slot))
    }
}

fn slot_descriptor(slot: Slot) -> &'static str {
    match slot {
        Slot::Int => "I",
        Slot::Double => "D",
        Slot::Object => "Ljava/lang/Object;",
    }
}

/// Chooses a shape per spec's arity/parameter/return dispatch table. The
/// `position` span is only used to build the error when the arity has no
/// defined shape at all (0, 1, and 2-ary lambdas are covered; anything
/// wider is a compile error, same as an unsupported method reference).
pub fn choose_shape(
    param_types: &[Type],
    return_type: &Type,
    position: &crate::lexer::Span,
) -> Result<FunctionalShape, CodegenError> {
    let param_slots: Vec<Slot> = param_types.iter().map(slot_for).collect();
    let return_slot = slot_for(return_type);

    let shape = match (param_slots.as_slice(), return_slot) {
        ([], _) => FunctionalShape {
            interface_internal_name: "java/util/function/Supplier",
            method_name: "get",
            param_slots: vec![],
            return_slot: Slot::Object,
        },
        ([Slot::Int], Slot::Int) => FunctionalShape {
            interface_internal_name: "java/util/function/IntUnaryOperator",
            method_name: "applyAsInt",
            param_slots: vec![Slot::Int],
            return_slot: Slot::Int,
        },
        ([Slot::Int], Slot::Double) => FunctionalShape {
            interface_internal_name: "java/util/function/IntToDoubleFunction",
            method_name: "applyAsDouble",
            param_slots: vec![Slot::Int],
            return_slot: Slot::Double,
        },
        ([Slot::Int], _) => FunctionalShape {
            interface_internal_name: "java/util/function/IntFunction",
            method_name: "apply",
            param_slots: vec![Slot::Int],
            return_slot: Slot::Object,
        },
        ([_], Slot::Int) => FunctionalShape {
            interface_internal_name: "java/util/function/ToIntFunction",
            method_name: "applyAsInt",
            param_slots: vec![Slot::Object],
            return_slot: Slot::Int,
        },
        ([_], _) => FunctionalShape {
            interface_internal_name: "java/util/function/Function",
            method_name: "apply",
            param_slots: vec![Slot::Object],
            return_slot: Slot::Object,
        },
        ([Slot::Int, Slot::Int], Slot::Int) => FunctionalShape {
            interface_internal_name: "java/util/function/IntBinaryOperator",
            method_name: "applyAsInt",
            param_slots: vec![Slot::Int, Slot::Int],
            return_slot: Slot::Int,
        },
        ([_, _], _) => FunctionalShape {
            interface_internal_name: "java/util/function/BiFunction",
            method_name: "apply",
            param_slots: vec![Slot::Object, Slot::Object],
            return_slot: Slot::Object,
        },
        (other, _) => {
            return Err(CodegenError::UnsupportedLambdaArity(
                UnsupportedLambdaArity { arity: other.len() },
                position.clone(),
            ))
        }
    };

    Ok(shape)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Span;

    #[test]
    fn zero_arity_picks_supplier() {
        let shape = choose_shape(&[], &Type::Int, &Span::default()).unwrap();
        assert_eq!(shape.interface_internal_name, "java/util/function/Supplier");
    }

    #[test]
    fn int_to_int_picks_specialised_shape() {
        let shape = choose_shape(&[Type::Int], &Type::Int, &Span::default()).unwrap();
        assert_eq!(shape.interface_internal_name, "java/util/function/IntUnaryOperator");
        assert_eq!(shape.method_descriptor(), "(I)I");
    }

    #[test]
    fn object_param_with_int_return_picks_to_int_function() {
        let shape = choose_shape(&[Type::String], &Type::Int, &Span::default()).unwrap();
        assert_eq!(shape.interface_internal_name, "java/util/function/ToIntFunction");
    }

    #[test]
    fn arity_three_is_unsupported() {
        let result = choose_shape(
            &[Type::Int, Type::Int, Type::Int],
            &Type::Int,
            &Span::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn two_ints_to_int_picks_int_binary_operator() {
        let shape = choose_shape(&[Type::Int, Type::Int], &Type::Int, &Span::default()).unwrap();
        assert_eq!(shape.interface_internal_name, "java/util/function/IntBinaryOperator");
    }
}
