//! Lambda materialisation: every lambda body becomes a synthetic `private
//! static` method on its enclosing class, and the lambda expression itself
//! lowers to an `invokedynamic` callsite bootstrapped through
//! `LambdaMetafactory`, targeting whichever `java.util.function` shape
//! [`lambda_shapes::choose_shape`] picked.
//!
//! Per this language's restriction that a lambda body may only read its own
//! parameters and the enclosing class's static/instance members (no local
//! variable capture), the only value a callsite ever needs to capture is
//! `this` — and only when the lambda appears inside an instance method. To
//! avoid the access-widening javac normally needs for a capturing instance
//! method reference, the synthetic method is always `static`, with the
//! captured `this` (if any) as an explicit leading parameter in slot 0 —
//! bitwise identical to the slot `this` itself already occupies, so the
//! lambda body's own `this`/field-access lowering needs no special casing.

use crate::parser::ast::{Expression, Lambda};
use crate::typechecker::{Type, ValidatedTypeInformation};

use super::super::bytecode::op;
use super::super::classfile::BootstrapMethod;
use super::super::constant_pool::REF_INVOKE_STATIC;
use super::super::descriptors;
use super::super::error::{CodegenError, UnresolvedType};
use super::super::lambda_shapes::{choose_shape, FunctionalShape};
use super::MethodEmitter;

/// A lambda body pulled out into its own method, appended to the owning
/// class once its declared methods are emitted.
#[derive(Clone)]
pub struct PendingMethod {
    pub name: String,
    pub captures_this: bool,
    pub params: Vec<(String, Type)>,
    pub return_type: Type,
    pub body: Expression<ValidatedTypeInformation>,
}

fn iface_descriptor(shape: &FunctionalShape) -> String {
    format!("L{};", shape.interface_internal_name)
}

pub fn emit_lambda(
    lambda: &Lambda<ValidatedTypeInformation>,
    emitter: &mut MethodEmitter,
) -> Result<(), CodegenError> {
    let (param_types, return_type) = match &lambda.info.type_id {
        Type::Function { params, return_value } => (params.clone(), (**return_value).clone()),
        other => {
            return Err(CodegenError::UnresolvedType(
                UnresolvedType {
                    description: format!("lambda with non-function type {other:?}"),
                },
                lambda.position.clone(),
            ))
        }
    };
    let shape = choose_shape(&param_types, &return_type, &lambda.position)?;

    let id = emitter.ctx.next_lambda_id();
    let method_name = format!("lambda$impl${id}");
    let captures_this = !emitter.is_static_context;

    let params: Vec<(String, Type)> = lambda
        .params
        .iter()
        .map(|p| (p.name.clone(), p.info.type_id.clone()))
        .collect();

    emitter.pending_methods.push(PendingMethod {
        name: method_name.clone(),
        captures_this,
        params,
        return_type: return_type.clone(),
        body: (*lambda.body).clone(),
    });

    let mut impl_param_types = Vec::with_capacity(param_types.len() + 1);
    if captures_this {
        impl_param_types.push(Type::Named {
            kind: crate::typechecker::NamedKind::Class,
            name: emitter.owner_internal_name.clone(),
            type_params: vec![],
            type_args: vec![],
            super_type: None,
            implemented_traits: vec![],
            members: vec![],
        });
    }
    impl_param_types.extend(param_types.iter().cloned());
    let impl_descriptor = descriptors::method_descriptor(&impl_param_types, &return_type);

    let owner = emitter.owner_internal_name.clone();
    let bootstrap_idx = register_metafactory_bootstrap(emitter, &owner, &method_name, &impl_descriptor, &shape);

    let indy_descriptor = if captures_this {
        format!("(L{};){}", emitter.owner_internal_name, iface_descriptor(&shape))
    } else {
        format!("(){}", iface_descriptor(&shape))
    };

    if captures_this {
        emitter.body.emit(op::ALOAD_0, 1);
    }
    let indy_idx = emitter
        .pool
        .invoke_dynamic(bootstrap_idx, shape.method_name, &indy_descriptor);
    emitter
        .body
        .emit_invoke_dynamic(indy_idx, if captures_this { 0 } else { 1 });

    Ok(())
}

/// Interns the `LambdaMetafactory.metafactory` bootstrap method handle plus
/// this callsite's static arguments (erased SAM type, implementation method
/// handle, instantiated SAM type) and appends a `BootstrapMethods` entry,
/// returning its index.
fn register_metafactory_bootstrap(
    emitter: &mut MethodEmitter,
    impl_owner: &str,
    impl_method_name: &str,
    impl_descriptor: &str,
    shape: &FunctionalShape,
) -> u16 {
    let metafactory_ref = emitter.pool.methodref(
        "java/lang/invoke/LambdaMetafactory",
        "metafactory",
        "(Ljava/lang/invoke/MethodHandles$Lookup;Ljava/lang/String;Ljava/lang/invoke/MethodType;Ljava/lang/invoke/MethodType;Ljava/lang/invoke/MethodHandle;Ljava/lang/invoke/MethodType;)Ljava/lang/invoke/CallSite;",
    );
    let bootstrap_handle = emitter.pool.method_handle(REF_INVOKE_STATIC, metafactory_ref);

    let sam_method_type = emitter.pool.method_type(&shape.method_descriptor());

    let impl_methodref = emitter.pool.methodref(impl_owner, impl_method_name, impl_descriptor);
    let impl_handle = emitter.pool.method_handle(REF_INVOKE_STATIC, impl_methodref);

    let bootstrap = BootstrapMethod {
        method_ref_index: bootstrap_handle,
        arguments: vec![sam_method_type, impl_handle, sam_method_type],
    };
    emitter.pending_bootstraps.push(bootstrap);
    (emitter.pending_bootstraps.len() - 1) as u16
}

/// Same bootstrap machinery as a capturing lambda, but for a bare reference
/// to an existing top-level function: the implementation handle points at
/// that function's own wrapper-class static method rather than a freshly
/// synthesised one, and there is never a `this` to capture.
pub(super) fn register_function_reference_bootstrap(
    emitter: &mut MethodEmitter,
    impl_owner: &str,
    impl_method_name: &str,
    impl_descriptor: &str,
    shape: &FunctionalShape,
) -> u16 {
    register_metafactory_bootstrap(emitter, impl_owner, impl_method_name, impl_descriptor, shape)
}
