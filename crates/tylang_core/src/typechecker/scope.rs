use std::{cell::RefCell, collections::HashMap, fmt::Display, rc::Rc};

use crate::parser::ast::Expression;

use super::{error::TypeCheckError, types::Type, TypeInformation, TypedConstruct};

#[derive(Clone)]
/// Internal stored variable metadata held in a frame: the original (typed)
/// expression, a shared mutable type slot used during inference/updates,
/// and a mutability flag.
struct StoredVariable {
    value: Expression<TypeInformation>,
    type_id: Rc<RefCell<Option<Type>>>,
    mutable: bool,
}

#[derive(Clone, Default)]
/// A single lexical frame in the scope stack. Stores separately:
/// - variables: mutable bindings with evolving type slots
/// - constants: immutable bindings storing final types
/// - types: user defined types visible in this frame
pub struct Frame {
    variables: HashMap<String, StoredVariable>,
    types: HashMap<String, Type>,
    constants: HashMap<String, Type>,
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field(
                "variables",
                &self
                    .variables
                    .iter()
                    .map(|(name, StoredVariable { type_id, .. })| {
                        (name, type_id.borrow().as_ref().cloned())
                    })
                    .collect::<HashMap<_, _>>(),
            )
            .field(
                "constants",
                &self.constants.iter().collect::<HashMap<_, _>>(),
            )
            .field("types", &self.types)
            .finish()
    }
}

/// Reference counted mutable pointer to a Frame. Cheaply clonable handle
/// passed around during scope operations.
type StackFrame = Rc<RefCell<Frame>>;

#[derive(Clone, Debug)]
/// Hierarchical lexical scope stack plus associated type -> member map. The
/// `stacks` vector forms an inner-most-at-the-end model; lookups walk from
/// the end backwards. `methods` stores resolved member signatures
/// (fields and associated functions alike) per concrete type, used for
/// member/method resolution that falls outside a type's own declared
/// `members` (e.g. extension-lowered methods).
pub struct Scope {
    stacks: Vec<StackFrame>,
    methods: Rc<RefCell<HashMap<Type, HashMap<String, Type>>>>,
}

impl Default for Scope {
    fn default() -> Self {
        Scope {
            stacks: vec![StackFrame::default()],
            methods: Rc::default(),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TypeAddError {
    pub name: String,
    pub type_id: Type,
}

impl Display for TypeAddError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!(
            "tried to add already existing type '{}'",
            self.name
        ))
    }
}

impl std::error::Error for TypeAddError {}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct VariableAddError {
    pub name: String,
}

impl Display for VariableAddError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!(
            "tried to add already existing value '{}'",
            self.name
        ))
    }
}

impl std::error::Error for VariableAddError {}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MethodAddError {
    pub name: String,
}

impl Display for MethodAddError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!(
            "tried to add already existing method or property '{}'",
            self.name
        ))
    }
}

impl std::error::Error for MethodAddError {}

impl Scope {
    /// Allocate a fresh root scope containing a single empty frame.
    pub fn new() -> Scope {
        Self::default()
    }

    /// Push a new empty frame representing entry into a nested lexical
    /// region (block, function body, method body).
    pub fn enter_scope(&mut self) {
        self.stacks.push(StackFrame::default())
    }

    /// Pop the most recent frame.
    pub fn exit_scope(&mut self) {
        self.stacks.pop();
    }

    /// Add or override a variable binding in the current frame. Fails if
    /// attempting to shadow an existing constant of the same name.
    pub fn add_variable(
        &mut self,
        name: impl ToString,
        value: Expression<TypeInformation>,
        mutable: bool,
    ) -> Result<(), VariableAddError> {
        let name = name.to_string();

        if self.get_constant(&name).is_some() {
            return Err(VariableAddError { name });
        }

        self.stacks.last().and_then(|scope| {
            let type_id = value.get_info().type_id;
            scope.borrow_mut().variables.insert(
                name,
                StoredVariable {
                    value,
                    type_id,
                    mutable,
                },
            )
        });

        Ok(())
    }

    /// Locate a variable binding walking outward and return its shared type
    /// slot.
    fn get_variable(&mut self, name: impl ToString) -> Option<Rc<RefCell<Option<Type>>>> {
        let name = name.to_string();
        self.stacks
            .iter()
            .rev()
            .find(|scope| scope.borrow().variables.contains_key(&name))
            .and_then(|scope| {
                scope
                    .borrow_mut()
                    .variables
                    .get(&name)
                    .cloned()
                    .map(|StoredVariable { type_id, .. }| type_id)
            })
    }

    /// Whether a variable exists and was declared mutable (`var`).
    pub fn is_variable_mutable(&mut self, name: impl ToString) -> Option<bool> {
        let name = name.to_string();
        self.stacks
            .iter()
            .rev()
            .find(|scope| scope.borrow().variables.contains_key(&name))
            .and_then(|scope| {
                scope
                    .borrow_mut()
                    .variables
                    .get(&name)
                    .cloned()
                    .map(|StoredVariable { mutable, .. }| mutable)
            })
    }

    /// Update the concrete type associated with a variable binding
    /// (unification result), propagating into the underlying expression via
    /// `update_type`.
    pub fn update_variable(
        &mut self,
        name: impl ToString,
        type_id: Type,
    ) -> Result<(), TypeCheckError> {
        let name = name.to_string();
        let Some(scope) = self
            .stacks
            .iter_mut()
            .rev()
            .find(|scope| scope.borrow().variables.contains_key(&name))
        else {
            return Ok(());
        };

        let scope = scope.borrow_mut();

        let Some(StoredVariable {
            value: mut exp,
            type_id: variable_type,
            ..
        }) = scope.variables.get(&name).cloned()
        else {
            unreachable!()
        };

        drop(scope);

        exp.update_type(type_id.clone())?;

        *variable_type.borrow_mut() = Some(type_id);
        Ok(())
    }

    /// Register a user defined type in the current innermost frame; errors
    /// on duplicate.
    pub fn add_type(&mut self, name: impl ToString, type_id: Type) -> Result<(), TypeAddError> {
        let name = name.to_string();
        let Some(last) = self.stacks.last_mut() else {
            unreachable!("trying to add type {name} in empty scope");
        };

        if last.borrow().types.contains_key(&name) {
            return Err(TypeAddError { name, type_id });
        }

        last.borrow_mut().types.insert(name, type_id);

        Ok(())
    }

    /// Overwrite an existing type's registration without erroring. Used by
    /// the collection pass to replace a type's forward-declared skeleton
    /// (no members known yet) with its fully resolved member set.
    pub fn update_type(&mut self, name: impl ToString, type_id: Type) {
        let name = name.to_string();
        if let Some(frame) = self
            .stacks
            .iter()
            .rev()
            .find(|scope| scope.borrow().types.contains_key(&name))
        {
            frame.borrow_mut().types.insert(name, type_id);
        }
    }

    /// Resolve a type name to its registered definition searching outward
    /// frames.
    pub fn get_type(&self, name: impl ToString) -> Option<Type> {
        let name = name.to_string();
        self.stacks
            .iter()
            .rev()
            .find(|scope| scope.borrow().types.contains_key(&name))
            .and_then(|scope| scope.borrow().types.get(&name).cloned())
    }

    fn get_constant(&self, name: impl ToString) -> Option<Type> {
        let name = name.to_string();
        self.stacks
            .iter()
            .rev()
            .find(|scope| scope.borrow().constants.contains_key(&name))
            .and_then(|scope| scope.borrow_mut().constants.get(&name).cloned())
    }

    /// Insert a new immutable constant; fails if any value (constant or
    /// variable) with the same name exists.
    pub fn add_constant(
        &mut self,
        name: impl ToString,
        type_id: Type,
    ) -> Result<(), VariableAddError> {
        let name = name.to_string();

        if self.resolve_name(&name).is_some() {
            return Err(VariableAddError { name });
        }

        let Some(last) = self.stacks.last_mut() else {
            unreachable!("trying to add type {name} in empty scope");
        };

        last.borrow_mut().constants.insert(name, type_id);

        Ok(())
    }

    /// Resolve either a constant (preferred) or variable to a shared type
    /// slot.
    pub fn resolve_name(&mut self, name: impl ToString) -> Option<Rc<RefCell<Option<Type>>>> {
        let name = name.to_string();
        self.get_constant(&name)
            .map(|t| Rc::new(RefCell::new(Some(t))))
            .or_else(|| self.get_variable(&name))
    }

    /// Attach a resolved member (field or method) to a type. Panics for
    /// duplicate registration attempts coming from the same declaration,
    /// which indicates a checker bug rather than user error (user-facing
    /// duplicate-member errors are raised earlier, during collection).
    pub fn add_method_to_type(
        &mut self,
        type_id: Type,
        method_name: impl ToString,
        method_type: Type,
    ) -> Result<(), MethodAddError> {
        let method_name = method_name.to_string();

        let mut current_methods = {
            self.methods
                .borrow()
                .get(&type_id)
                .cloned()
                .unwrap_or_default()
        };

        if current_methods.contains_key(&method_name) {
            return Err(MethodAddError { name: method_name });
        }

        current_methods.insert(method_name, method_type);

        self.methods.borrow_mut().insert(type_id, current_methods);

        Ok(())
    }

    /// Resolve a member access on a type: declared fields/methods first
    /// (from `Type::members`), then methods registered separately (e.g. via
    /// extension lowering).
    pub fn resolve_property_for_type(
        &mut self,
        type_id: Type,
        property: impl ToString,
    ) -> Option<Type> {
        let property_name = property.to_string();

        if let Some((_, ty)) = type_id
            .members()
            .iter()
            .find(|(name, _)| *name == property_name)
        {
            return Some(ty.clone());
        }

        self.methods
            .borrow()
            .get(&type_id)
            .and_then(|methods| methods.get(&property_name))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use crate::{
        lexer::Span,
        parser::ast::{Expression, Id},
        typechecker::{context::Context, types::Type, TypeInformation},
    };

    use super::Scope;

    #[test]
    fn test_new() {
        let scope = Scope::new();
        assert_eq!(scope.stacks.len(), 1);
    }

    fn id_expr(type_id: Type) -> Expression<TypeInformation> {
        Expression::Id(Id {
            name: "foo".into(),
            info: TypeInformation {
                type_id: Rc::new(RefCell::new(Some(type_id))),
                context: Context::default(),
            },
            position: Span::default(),
        })
    }

    #[test]
    fn test_add_variable() {
        let mut scope = Scope::new();

        scope
            .add_variable("foo", id_expr(Type::Int), false)
            .expect("something went wrong");

        assert_eq!(
            scope.get_variable("foo"),
            Some(Rc::new(RefCell::new(Some(Type::Int))))
        );
    }

    #[test]
    fn test_enter_scope() {
        let mut scope = Scope::new();

        scope.enter_scope();
        assert_eq!(scope.stacks.len(), 2);

        scope
            .add_variable("foo", id_expr(Type::Int), false)
            .expect("something went wrong");

        assert_eq!(
            scope.get_variable("foo"),
            Some(Rc::new(RefCell::new(Some(Type::Int))))
        );

        scope.exit_scope();
        assert!(scope.get_variable("foo").is_none())
    }

    #[test]
    fn test_shared_variable_values() {
        let mut scope = Scope::new();

        scope
            .add_variable("foo", id_expr(Type::Int), false)
            .expect("something went wrong");

        let foo = scope.get_variable("foo").unwrap();
        let bar = scope.get_variable("foo").unwrap();

        assert_eq!(foo, bar);

        *foo.borrow_mut() = None;

        assert_eq!(foo, Rc::new(RefCell::new(None)));
        assert_eq!(bar, Rc::new(RefCell::new(None)));
    }
}
