use std::{borrow::Borrow, error::Error, fmt::Display};

use crate::parser::ast::{TypeAnnotation, Variance};

use super::{
    context::Context,
    error::{TypeCheckError, UndefinedType},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
/// Tag distinguishing the three flavours of named declaration that share the
/// `Named` representation: a `class` can be instantiated and subclassed, a
/// `trait` is abstract and only appears as a supertype, an `object` is a
/// singleton and never appears as the type of a `new` expression.
pub enum NamedKind {
    Class,
    Trait,
    Object,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
/// Declaration-site variance annotation carried on a named type's type
/// parameter, controlling how subtyping of the parameter propagates to the
/// enclosing named type.
pub enum TypeVariance {
    Covariant,
    Contravariant,
    Invariant,
}

impl From<Variance> for TypeVariance {
    fn from(value: Variance) -> Self {
        match value {
            Variance::Covariant => TypeVariance::Covariant,
            Variance::Contravariant => TypeVariance::Contravariant,
            Variance::Invariant => TypeVariance::Invariant,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
/// Canonical semantic type representation used throughout inference,
/// validation and code generation.
pub enum Type {
    Int,
    Double,
    String,
    Boolean,
    /// No-value type used for statements or functions that return nothing
    Unit,
    /// Top of the subtyping lattice; every type is a subtype of `Any`
    Any,
    /// Bottom of the subtyping lattice; a subtype of every type
    Nothing,
    /// The type of the `null` literal; a subtype of every reference type
    Null,
    /// Placeholder used during inference when a concrete type has not yet
    /// been determined
    Unknown,
    /// Covariant homogeneous sequence
    List(Box<Type>),
    /// Covariant homogeneous unordered collection without duplicates
    Set(Box<Type>),
    /// Covariant (in both key and value) associative collection
    Map(Box<Type>, Box<Type>),
    /// Function signature: contravariant parameters, covariant return
    Function {
        params: Vec<Type>,
        return_value: Box<Type>,
    },
    /// Anonymous structural record type: a value is a subtype of this shape
    /// if it carries at least these members with compatible types
    Structural(Vec<(String, Type)>),
    /// A class, trait or object declaration. `type_args` are the concrete
    /// (or still-generic) instantiations of `type_params`; `members`
    /// collects both fields and method signatures for property resolution.
    Named {
        kind: NamedKind,
        name: String,
        type_params: Vec<(String, TypeVariance)>,
        type_args: Vec<Type>,
        super_type: Option<Box<Type>>,
        implemented_traits: Vec<Type>,
        members: Vec<(String, Type)>,
    },
    /// An unresolved reference to a declaration-site type parameter, kept
    /// around inside a generic definition's own member signatures until the
    /// definition is instantiated with concrete `type_args`.
    TypeVar(String),
}

impl Type {
    pub fn members(&self) -> &[(String, Type)] {
        match self {
            Type::Structural(members) => members,
            Type::Named { members, .. } => members,
            _ => &[],
        }
    }

    pub fn is_reference_type(&self) -> bool {
        !matches!(
            self,
            Type::Int | Type::Double | Type::Boolean | Type::Unit | Type::Unknown
        )
    }

    /// The subtyping relation `self <: other`, per the structural
    /// (width + depth) subtyping, covariant-collection, contravariant
    /// function parameter and declaration-site variance rules.
    pub fn is_subtype_of(&self, other: &Type, ctx: &Context) -> bool {
        if self == other {
            return true;
        }

        match (self, other) {
            (_, Type::Any) => true,
            (Type::Nothing, _) => true,
            (Type::Null, other) => other.is_reference_type(),
            (Type::List(a), Type::List(b)) => a.is_subtype_of(b, ctx),
            (Type::Set(a), Type::Set(b)) => a.is_subtype_of(b, ctx),
            (Type::Map(ak, av), Type::Map(bk, bv)) => {
                ak.is_subtype_of(bk, ctx) && av.is_subtype_of(bv, ctx)
            }
            (
                Type::Function {
                    params: sp,
                    return_value: sr,
                },
                Type::Function {
                    params: op,
                    return_value: or,
                },
            ) => {
                sp.len() == op.len()
                    && sp.iter().zip(op.iter()).all(|(s, o)| o.is_subtype_of(s, ctx))
                    && sr.is_subtype_of(or, ctx)
            }
            (_, Type::Structural(target_members)) => target_members.iter().all(|(name, ty)| {
                self.members()
                    .iter()
                    .find(|(n, _)| n == name)
                    .is_some_and(|(_, self_ty)| self_ty.is_subtype_of(ty, ctx))
            }),
            (
                Type::Named {
                    name: sn,
                    type_args: sa,
                    super_type,
                    implemented_traits,
                    ..
                },
                Type::Named {
                    name: on,
                    type_args: oa,
                    type_params,
                    ..
                },
            ) => {
                if sn == on {
                    return sa.len() == oa.len()
                        && sa.iter().zip(oa.iter()).zip(type_params.iter()).all(
                            |((s, o), (_, variance))| match variance {
                                TypeVariance::Covariant => s.is_subtype_of(o, ctx),
                                TypeVariance::Contravariant => o.is_subtype_of(s, ctx),
                                TypeVariance::Invariant => s == o,
                            },
                        );
                }

                super_type
                    .as_ref()
                    .is_some_and(|sup| sup.is_subtype_of(other, ctx))
                    || implemented_traits
                        .iter()
                        .any(|implemented| implemented.is_subtype_of(other, ctx))
            }
            _ => false,
        }
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Int => write!(f, "Int"),
            Type::Double => write!(f, "Double"),
            Type::String => write!(f, "String"),
            Type::Boolean => write!(f, "Boolean"),
            Type::Unit => write!(f, "Unit"),
            Type::Any => write!(f, "Any"),
            Type::Nothing => write!(f, "Nothing"),
            Type::Null => write!(f, "Null"),
            Type::Unknown => write!(f, "<unknown>"),
            Type::List(inner) => write!(f, "List[{inner}]"),
            Type::Set(inner) => write!(f, "Set[{inner}]"),
            Type::Map(k, v) => write!(f, "Map[{k}, {v}]"),
            Type::Function {
                params,
                return_value,
            } => write!(
                f,
                "({}) => {return_value}",
                params
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Type::Structural(members) => write!(
                f,
                "{{ {} }}",
                members
                    .iter()
                    .map(|(n, t)| format!("{n}: {t}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Type::Named {
                name, type_args, ..
            } if type_args.is_empty() => write!(f, "{name}"),
            Type::Named {
                name, type_args, ..
            } => write!(
                f,
                "{name}[{}]",
                type_args
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Type::TypeVar(name) => write!(f, "{name}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// Error converting a parsed `TypeAnnotation` AST node into a concrete
/// `Type`. Usually indicates an undefined user type.
pub struct TypeFromAnnotationError {
    source: TypeAnnotation,
}

impl Display for TypeFromAnnotationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!(
            "Failed to convert '{:?}' to a qualified type",
            self.source
        ))
    }
}

impl Error for TypeFromAnnotationError {}

/// Convert a parsed `TypeAnnotation` (or convertible) plus current `Context`
/// into a fully resolved `Type`, resolving named types against the context's
/// global type registry.
impl<T> TryFrom<(T, &Context)> for Type
where
    T: Into<TypeAnnotation>,
{
    type Error = TypeCheckError;

    fn try_from((value, ctx): (T, &Context)) -> Result<Self, Self::Error> {
        let value = value.into();
        match &value {
            TypeAnnotation::Simple(name, span) => match name.as_str() {
                "Int" => Ok(Type::Int),
                "Double" => Ok(Type::Double),
                "String" => Ok(Type::String),
                "Boolean" => Ok(Type::Boolean),
                "Unit" => Ok(Type::Unit),
                "Any" => Ok(Type::Any),
                "Nothing" => Ok(Type::Nothing),
                name => match ctx.scope.get_type(name) {
                    Some(type_id) => Ok(type_id),
                    None => Err(TypeCheckError::UndefinedType(
                        UndefinedType {
                            type_name: value.clone(),
                        },
                        span.clone(),
                    )),
                },
            },
            TypeAnnotation::Generic(name, args, span) => {
                let mut type_args = vec![];
                for arg in args {
                    type_args.push((arg, ctx).try_into()?);
                }

                match name.as_str() {
                    "List" if type_args.len() == 1 => {
                        Ok(Type::List(Box::new(type_args.remove(0))))
                    }
                    "Set" if type_args.len() == 1 => Ok(Type::Set(Box::new(type_args.remove(0)))),
                    "Map" if type_args.len() == 2 => {
                        let value = type_args.remove(1);
                        let key = type_args.remove(0);
                        Ok(Type::Map(Box::new(key), Box::new(value)))
                    }
                    _ => match ctx.scope.get_type(name) {
                        Some(Type::Named {
                            kind,
                            name,
                            type_params,
                            super_type,
                            implemented_traits,
                            members,
                            ..
                        }) => Ok(Type::Named {
                            kind,
                            name,
                            type_params,
                            type_args,
                            super_type,
                            implemented_traits,
                            members,
                        }),
                        _ => Err(TypeCheckError::UndefinedType(
                            UndefinedType {
                                type_name: value.clone(),
                            },
                            span.clone(),
                        )),
                    },
                }
            }
            TypeAnnotation::Function {
                params,
                return_type,
                ..
            } => {
                let mut new_params = vec![];

                for p in params.iter() {
                    new_params.push((p, ctx).try_into()?)
                }

                Ok(Type::Function {
                    params: new_params,
                    return_value: Box::new((return_type.borrow(), ctx).try_into()?),
                })
            }
            TypeAnnotation::Structural(members, _) => {
                let mut resolved = vec![];
                for (name, ty) in members {
                    resolved.push((name.clone(), (ty, ctx).try_into()?));
                }
                Ok(Type::Structural(resolved))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        lexer::Span,
        parser::ast::TypeAnnotation,
        typechecker::{context::Context, types::Type},
    };

    #[test]
    fn test_primitive_literals() {
        let ctx = Context::default();

        assert_eq!(
            Type::try_from((TypeAnnotation::Simple("Int".into(), Span::default()), &ctx)),
            Ok(Type::Int)
        );

        assert_eq!(
            Type::try_from((
                TypeAnnotation::Simple("Double".into(), Span::default()),
                &ctx
            )),
            Ok(Type::Double)
        );
    }

    #[test]
    fn test_invalid_literal() {
        let ctx = Context::default();
        assert!(Type::try_from((
            TypeAnnotation::Simple("Foo".into(), Span::default()),
            &ctx
        ))
        .is_err());
    }

    #[test]
    fn test_list_generic() {
        let ctx = Context::default();
        assert_eq!(
            Type::try_from((
                TypeAnnotation::Generic(
                    "List".into(),
                    vec![TypeAnnotation::Simple("Int".into(), Span::default())],
                    Span::default()
                ),
                &ctx
            )),
            Ok(Type::List(Box::new(Type::Int)))
        );
    }

    #[test]
    fn primitives_are_subtypes_of_any() {
        let ctx = Context::default();
        assert!(Type::Int.is_subtype_of(&Type::Any, &ctx));
        assert!(Type::Nothing.is_subtype_of(&Type::Int, &ctx));
        assert!(!Type::Int.is_subtype_of(&Type::String, &ctx));
    }

    #[test]
    fn list_is_covariant() {
        let ctx = Context::default();
        assert!(Type::List(Box::new(Type::Int)).is_subtype_of(
            &Type::List(Box::new(Type::Any)),
            &ctx
        ));
        assert!(!Type::List(Box::new(Type::Any))
            .is_subtype_of(&Type::List(Box::new(Type::Int)), &ctx));
    }

    #[test]
    fn function_parameters_are_contravariant() {
        let ctx = Context::default();
        let narrow_to_wide = Type::Function {
            params: vec![Type::Any],
            return_value: Box::new(Type::Int),
        };
        let wide_to_narrow = Type::Function {
            params: vec![Type::Int],
            return_value: Box::new(Type::Int),
        };
        assert!(narrow_to_wide.is_subtype_of(&wide_to_narrow, &ctx));
        assert!(!wide_to_narrow.is_subtype_of(&narrow_to_wide, &ctx));
    }

    #[test]
    fn structural_subtyping_is_width_and_depth() {
        let ctx = Context::default();
        let wide = Type::Structural(vec![
            ("x".into(), Type::Int),
            ("y".into(), Type::Int),
        ]);
        let narrow = Type::Structural(vec![("x".into(), Type::Any)]);
        assert!(wide.is_subtype_of(&narrow, &ctx));
        assert!(!narrow.is_subtype_of(&wide, &ctx));
    }
}
