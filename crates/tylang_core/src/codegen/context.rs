//! Per-compile emitter state: the state machine spec's emitter section
//! describes (*open* -> *emitting top-level* -> *emitting class body* ->
//! *emitting method body* -> *closed*), the global top-level function
//! signature table used to lower call sites, and a local-variable slot
//! scope mirroring the type checker's own [`crate::typechecker::Scope`]
//! but mapping names to JVM local slots instead of types.

use std::collections::HashMap;

use crate::typechecker::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitterState {
    Open,
    EmittingTopLevel,
    EmittingClassBody,
    EmittingMethodBody,
    Closed,
}

#[derive(Debug, Clone)]
pub struct LocalBinding {
    pub slot: u16,
    pub ty: Type,
}

#[derive(Debug, Default)]
struct LocalFrame {
    bindings: HashMap<String, LocalBinding>,
}

/// Drives one compilation unit's emission. A fresh context is built per
/// program (per spec's "global mutable state" design note), so the
/// function-signature table and lambda counter never leak between compiles.
#[derive(Debug)]
pub struct CodegenContext {
    state: EmitterState,
    function_signatures: HashMap<String, Type>,
    locals: Vec<LocalFrame>,
    lambda_counter: usize,
}

impl Default for CodegenContext {
    fn default() -> Self {
        CodegenContext {
            state: EmitterState::Open,
            function_signatures: HashMap::new(),
            locals: vec![],
            lambda_counter: 0,
        }
    }
}

impl CodegenContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> EmitterState {
        self.state
    }

    pub fn begin_top_level(&mut self) {
        self.state = EmitterState::EmittingTopLevel;
    }

    pub fn enter_class_body(&mut self) {
        self.state = EmitterState::EmittingClassBody;
    }

    pub fn exit_class_body(&mut self) {
        self.state = EmitterState::EmittingTopLevel;
    }

    pub fn enter_method_body(&mut self) {
        self.state = EmitterState::EmittingMethodBody;
        self.locals.push(LocalFrame::default());
    }

    /// `returning_to` is `EmittingClassBody` for a method of a class/trait/
    /// object/extension and `EmittingTopLevel` for a bare function.
    pub fn exit_method_body(&mut self, returning_to: EmitterState) {
        self.locals.pop();
        self.state = returning_to;
    }

    pub fn close(&mut self) {
        self.state = EmitterState::Closed;
    }

    pub fn register_function_signature(&mut self, name: impl Into<String>, signature: Type) {
        self.function_signatures.insert(name.into(), signature);
    }

    pub fn function_signature(&self, name: &str) -> Option<&Type> {
        self.function_signatures.get(name)
    }

    pub fn bind_local(&mut self, name: impl Into<String>, slot: u16, ty: Type) {
        if let Some(frame) = self.locals.last_mut() {
            frame.bindings.insert(name.into(), LocalBinding { slot, ty });
        }
    }

    pub fn resolve_local(&self, name: &str) -> Option<LocalBinding> {
        self.locals
            .last()
            .and_then(|frame| frame.bindings.get(name))
            .cloned()
    }

    pub fn next_lambda_id(&mut self) -> usize {
        let id = self.lambda_counter;
        self.lambda_counter += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_local_bound_in_current_method_frame() {
        let mut ctx = CodegenContext::new();
        ctx.enter_method_body();
        ctx.bind_local("x", 0, Type::Int);
        let binding = ctx.resolve_local("x").unwrap();
        assert_eq!(binding.slot, 0);
        assert_eq!(binding.ty, Type::Int);
    }

    #[test]
    fn locals_are_discarded_when_method_body_exits() {
        let mut ctx = CodegenContext::new();
        ctx.enter_method_body();
        ctx.bind_local("x", 0, Type::Int);
        ctx.exit_method_body(EmitterState::EmittingTopLevel);
        ctx.enter_method_body();
        assert!(ctx.resolve_local("x").is_none());
    }

    #[test]
    fn lambda_ids_are_sequential() {
        let mut ctx = CodegenContext::new();
        assert_eq!(ctx.next_lambda_id(), 0);
        assert_eq!(ctx.next_lambda_id(), 1);
    }
}
