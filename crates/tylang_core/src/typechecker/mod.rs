//! # Type checker
//!
//! Turns the parser's untyped AST (`T = ()`) into a fully typed one, in two
//! stages that both reuse the exact same generic AST structs at a different
//! `T` instead of a parallel typed tree:
//!
//! ```text
//! Untyped AST  ->  Inference  ->  Validation  ->  Code generation
//!   (T = ())     (TypeInformation)  (ValidatedTypeInformation)
//! ```
//!
//! [`TypeInformation`] carries a shared, mutable type slot (`Rc<RefCell<Option<Type>>>`)
//! that inference fills in, possibly more than once (e.g. a `var` binding's
//! slot is overwritten on reassignment via [`Scope::update_variable`]).
//! [`TypeChecker::validate`] then collapses every slot into a concrete,
//! immutable [`Type`], failing if any slot was never filled.
//!
//! Checking itself happens in two passes. [`TypeChecker::shallow_check`]
//! walks every top level declaration once, registering class/trait/object
//! skeletons and function/method signatures so forward references between
//! declarations resolve; [`TypeChecker::check`] then walks bodies with that
//! full signature table in scope.

mod context;
mod declaration;
mod error;
mod expression;
mod scope;
mod statement;
mod types;

use std::cell::RefCell;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::rc::Rc;

use crate::lexer::Span;
use crate::parser::ast::TopLevelStatement;

use self::context::Context;
pub use self::error::TypeCheckError;
pub use self::scope::Scope;
pub use self::types::{NamedKind, Type, TypeVariance};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeInformation {
    pub type_id: Rc<RefCell<Option<Type>>>,
    pub context: Context,
}

impl TypeInformation {
    pub fn has_type(&self) -> bool {
        self.type_id.borrow().is_some()
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ValidatedTypeInformation {
    pub type_id: Type,
    #[serde(skip)]
    pub context: Context,
}

impl TypeInformation {
    fn validate(self, position: &Span) -> Result<ValidatedTypeInformation, TypeValidationError> {
        let TypeInformation { type_id, context } = self;
        match type_id.borrow().clone() {
            Some(type_id) => Ok(ValidatedTypeInformation { type_id, context }),
            None => Err(TypeValidationError(position.clone())),
        }
    }
}

/// Build a fresh, unshared resolved type slot. Used whenever a checked node
/// gets a type that isn't shared with any variable binding (everything but
/// an `Id` reference to an existing binding).
fn resolved(ctx: &Context, type_id: Type) -> TypeInformation {
    TypeInformation {
        type_id: Rc::new(RefCell::new(Some(type_id))),
        context: ctx.clone(),
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TypeValidationError(Span);

impl TypeValidationError {
    const MESSAGE: &'static str = "Type must be known at compile time!";

    pub fn span(&self) -> Span {
        self.0.clone()
    }

    pub fn err(&self) -> String {
        Self::MESSAGE.to_string()
    }
}

impl Display for TypeValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.to_string(Self::MESSAGE).as_str())
    }
}

impl Error for TypeValidationError {}

pub type TypeResult<T> = Result<T, TypeCheckError>;

trait TypeCheckable {
    type Typed;

    fn check(self, ctx: &mut Context) -> TypeResult<Self::Typed>;

    fn revert(this: &Self::Typed) -> Self;
}

trait ShallowCheck {
    fn shallow_check(&self, ctx: &mut Context) -> TypeResult<()>;
}

trait TypedConstruct
where
    Self: Debug,
{
    type Validated;

    fn update_type(&mut self, type_id: Type) -> TypeResult<()> {
        unimplemented!(
            "TypedConstruct::update_type({type_id:?}) is not implemented for {:?}",
            self
        )
    }

    fn validate(self) -> Result<Self::Validated, TypeValidationError>;
}

/// Drives signature collection then full body checking over a compilation
/// unit's top level declarations.
#[derive(Debug, Clone, Default)]
pub struct TypeChecker {
    context: Context,
    statements: Vec<TopLevelStatement<()>>,
}

impl TypeChecker {
    pub fn new(statements: Vec<TopLevelStatement<()>>) -> TypeChecker {
        TypeChecker {
            statements,
            ..Default::default()
        }
    }

    /// Registers every class/trait/object's type skeleton before anything
    /// else, so a function or another declaration can reference a type
    /// declared later in the same compilation unit.
    fn shallow_check(&mut self) -> TypeResult<()> {
        let type_declarations = self
            .statements
            .iter()
            .filter(|stm| {
                matches!(
                    stm,
                    TopLevelStatement::Class(_)
                        | TopLevelStatement::Trait(_)
                        | TopLevelStatement::Object(_)
                )
            })
            .collect::<Vec<_>>();

        let other_statements = self
            .statements
            .iter()
            .filter(|stm| {
                !matches!(
                    stm,
                    TopLevelStatement::Class(_)
                        | TopLevelStatement::Trait(_)
                        | TopLevelStatement::Object(_)
                )
            })
            .collect::<Vec<_>>();

        for s in type_declarations.iter() {
            s.shallow_check(&mut self.context)?;
        }

        for s in other_statements.iter() {
            s.shallow_check(&mut self.context)?;
        }

        Ok(())
    }

    pub fn check(mut self) -> TypeResult<Vec<TopLevelStatement<TypeInformation>>> {
        self.shallow_check()?;

        let mut checked = vec![];
        for stm in self.statements.iter() {
            checked.push(stm.clone().check(&mut self.context)?);
        }

        Ok(checked)
    }

    pub fn validate(
        statements: Vec<TopLevelStatement<TypeInformation>>,
    ) -> Result<Vec<TopLevelStatement<ValidatedTypeInformation>>, TypeValidationError> {
        let mut validated = vec![];
        for stm in statements {
            validated.push(stm.validate()?);
        }
        Ok(validated)
    }
}
