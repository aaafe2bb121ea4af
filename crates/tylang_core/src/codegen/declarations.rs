//! Per-top-level-declaration-kind emission: builds one [`ClassFile`] per
//! function, class, trait, object and extension, per the filename/shape
//! table this emitter targets (`<name>.class`, `<name>$.class` for a bare
//! function's wrapper, `<target>$Extension.class`).

use crate::parser::ast::{
    ClassDeclaration, ExtensionDeclaration, Function, ObjectDeclaration, TopLevelStatement,
    TraitDeclaration,
};
use crate::typechecker::{NamedKind, Type, ValidatedTypeInformation};

use super::bytecode::{op, MethodBody};
use super::classfile::{access, BootstrapMethod, ClassFile, CodeAttribute, FieldInfo, MethodInfo};
use super::constant_pool::ConstantPool;
use super::context::{CodegenContext, EmitterState};
use super::descriptors;
use super::error::CodegenError;
use super::expressions::{emit_expression, MethodEmitter, PendingMethod};

/// A finished class-file ready to be written to `<name>.class`.
pub struct ClassArtifact {
    pub name: String,
    pub bytes: Vec<u8>,
}

fn super_internal_name(super_type: &Option<Box<Type>>) -> String {
    match super_type.as_deref() {
        Some(Type::Named { name, .. }) => name.clone(),
        _ => "java/lang/Object".to_string(),
    }
}

fn interface_names(implemented_traits: &[Type]) -> Vec<String> {
    implemented_traits
        .iter()
        .filter_map(descriptors::internal_name)
        .collect()
}

/// Drains a class's accumulated lambda bodies into its method table. A
/// lambda body may itself contain a lambda, so this drains to a fixed
/// point rather than a single pass.
fn drain_pending_methods(
    owner_internal_name: &str,
    pool: &mut ConstantPool,
    ctx: &mut CodegenContext,
    pending_methods: &mut Vec<PendingMethod>,
    pending_bootstraps: &mut Vec<BootstrapMethod>,
    methods: &mut Vec<MethodInfo>,
) -> Result<(), CodegenError> {
    let mut index = 0;
    while index < pending_methods.len() {
        let pending = pending_methods[index].clone();
        index += 1;

        let mut body = MethodBody::new(0);
        ctx.enter_method_body();
        if pending.captures_this {
            body.allocate_local(false);
        }
        for (name, ty) in &pending.params {
            let slot = body.allocate_local(descriptors::is_wide(ty));
            ctx.bind_local(name.clone(), slot, ty.clone());
        }

        {
            let mut emitter = MethodEmitter {
                body: &mut body,
                pool,
                ctx,
                owner_internal_name: owner_internal_name.to_string(),
                is_static_context: true,
                pending_methods,
                pending_bootstraps,
            };
            emit_expression(&pending.body, &mut emitter)?;
            let ret_op = descriptors::return_opcode(&pending.return_type);
            emitter.body.emit(ret_op, 0);
        }
        ctx.exit_method_body(EmitterState::EmittingClassBody);

        let mut impl_param_types = Vec::with_capacity(pending.params.len() + 1);
        if pending.captures_this {
            impl_param_types.push(Type::Named {
                kind: NamedKind::Class,
                name: owner_internal_name.to_string(),
                type_params: vec![],
                type_args: vec![],
                super_type: None,
                implemented_traits: vec![],
                members: vec![],
            });
        }
        impl_param_types.extend(pending.params.iter().map(|(_, t)| t.clone()));
        let descriptor = descriptors::method_descriptor(&impl_param_types, &pending.return_type);

        let name_index = pool.utf8(&pending.name);
        let descriptor_index = pool.utf8(&descriptor);
        methods.push(MethodInfo {
            access_flags: access::PRIVATE | access::STATIC,
            name_index,
            descriptor_index,
            code: Some(CodeAttribute {
                max_stack: body.max_stack(),
                max_locals: body.max_locals(),
                code: body.into_bytes(),
                exception_table: vec![],
            }),
        });
    }
    Ok(())
}

/// Emits one method/constructor body, driving the full
/// enter/bind-params/emit/return/exit sequence shared by every method-like
/// declaration this emitter lowers.
#[allow(clippy::too_many_arguments)]
fn emit_method_like(
    owner_internal_name: &str,
    params: &[(String, Type)],
    return_type: &Type,
    body_expr: &Expr,
    is_static: bool,
    pool: &mut ConstantPool,
    ctx: &mut CodegenContext,
    pending_methods: &mut Vec<PendingMethod>,
    pending_bootstraps: &mut Vec<BootstrapMethod>,
) -> Result<CodeAttribute, CodegenError> {
    let mut body = MethodBody::new(0);
    ctx.enter_method_body();
    if !is_static {
        body.allocate_local(false);
    }
    for (name, ty) in params {
        let slot = body.allocate_local(descriptors::is_wide(ty));
        ctx.bind_local(name.clone(), slot, ty.clone());
    }

    {
        let mut emitter = MethodEmitter {
            body: &mut body,
            pool,
            ctx,
            owner_internal_name: owner_internal_name.to_string(),
            is_static_context: is_static,
            pending_methods,
            pending_bootstraps,
        };
        emit_expression(body_expr, &mut emitter)?;
        let ret_op = descriptors::return_opcode(return_type);
        emitter.body.emit(ret_op, 0);
    }
    ctx.exit_method_body(EmitterState::EmittingClassBody);

    Ok(CodeAttribute {
        max_stack: body.max_stack(),
        max_locals: body.max_locals(),
        code: body.into_bytes(),
        exception_table: vec![],
    })
}

type Expr = crate::parser::ast::Expression<ValidatedTypeInformation>;

fn function_params(f: &Function<ValidatedTypeInformation>) -> Vec<(String, Type)> {
    let Type::Function { params, .. } = &f.info.type_id else {
        unreachable!("a checked Function's info.type_id is always Type::Function")
    };
    f.params
        .iter()
        .zip(params.iter())
        .map(|(p, ty)| (p.name.clone(), ty.clone()))
        .collect()
}

fn function_return(f: &Function<ValidatedTypeInformation>) -> Type {
    match &f.info.type_id {
        Type::Function { return_value, .. } => (**return_value).clone(),
        _ => Type::Unit,
    }
}

/// Emits a top-level `fun name(...)` as `<name>$.class` containing a single
/// public static method named after the function.
fn emit_function(
    f: &Function<ValidatedTypeInformation>,
    ctx: &mut CodegenContext,
) -> Result<ClassArtifact, CodegenError> {
    let class_name = format!("{}$", f.name);
    let mut pool = ConstantPool::default();
    let this_class = pool.class(&class_name);
    let super_class = pool.class("java/lang/Object");

    let params = function_params(f);
    let return_type = function_return(f);
    let descriptor = descriptors::method_descriptor(
        &params.iter().map(|(_, t)| t.clone()).collect::<Vec<_>>(),
        &return_type,
    );

    let mut pending_methods = vec![];
    let mut pending_bootstraps = vec![];
    let mut methods = vec![];

    let body_expr = f
        .body
        .as_ref()
        .expect("a non-abstract top-level function always has a body");
    let code = emit_method_like(
        &class_name,
        &params,
        &return_type,
        body_expr,
        true,
        &mut pool,
        ctx,
        &mut pending_methods,
        &mut pending_bootstraps,
    )?;

    let name_index = pool.utf8(&f.name);
    let descriptor_index = pool.utf8(&descriptor);
    methods.push(MethodInfo {
        access_flags: access::PUBLIC | access::STATIC,
        name_index,
        descriptor_index,
        code: Some(code),
    });

    drain_pending_methods(
        &class_name,
        &mut pool,
        ctx,
        &mut pending_methods,
        &mut pending_bootstraps,
        &mut methods,
    )?;

    let class = ClassFile {
        constant_pool: pool,
        access_flags: access::PUBLIC | access::SUPER | access::FINAL,
        this_class,
        super_class,
        interfaces: vec![],
        fields: vec![],
        methods,
        bootstrap_methods: pending_bootstraps,
    };

    Ok(ClassArtifact {
        name: class_name,
        bytes: class.into_bytes(),
    })
}

fn emit_class(
    c: &ClassDeclaration<ValidatedTypeInformation>,
    ctx: &mut CodegenContext,
) -> Result<ClassArtifact, CodegenError> {
    let (super_type, implemented_traits) = match &c.info.type_id {
        Type::Named { super_type, implemented_traits, .. } => {
            (super_type.clone(), implemented_traits.clone())
        }
        _ => (None, vec![]),
    };

    let mut pool = ConstantPool::default();
    let this_class = pool.class(&c.name);
    let super_name = super_internal_name(&super_type);
    let super_class = pool.class(&super_name);
    let interfaces = interface_names(&implemented_traits)
        .iter()
        .map(|n| pool.class(n))
        .collect();

    let mut fields = vec![];
    let mut pending_methods = vec![];
    let mut pending_bootstraps = vec![];
    let mut methods = vec![];

    let ctor_params: Vec<(String, Type)> = c
        .constructor
        .params
        .iter()
        .map(|p| {
            let ty = c
                .info
                .type_id
                .members()
                .iter()
                .find(|(n, _)| n == &p.name)
                .map(|(_, t)| t.clone())
                .unwrap_or(Type::Unknown);
            (p.name.clone(), ty)
        })
        .collect();

    for (name, ty) in &ctor_params {
        let name_index = pool.utf8(name);
        let descriptor_index = pool.utf8(&descriptors::field_descriptor(ty));
        fields.push(FieldInfo {
            access_flags: access::PRIVATE | access::FINAL,
            name_index,
            descriptor_index,
        });
    }
    for field in &c.fields {
        let ty = field.info.type_id.clone();
        let access_flags = if field.mutable {
            access::PRIVATE
        } else {
            access::PRIVATE | access::FINAL
        };
        let name_index = pool.utf8(&field.name);
        let descriptor_index = pool.utf8(&descriptors::field_descriptor(&ty));
        fields.push(FieldInfo {
            access_flags,
            name_index,
            descriptor_index,
        });
    }

    // `<init>`: call the superclass constructor, then populate every
    // constructor-parameter field and every explicit field's initialiser,
    // in declaration order.
    {
        let mut body = MethodBody::new(1);
        ctx.enter_method_body();
        let mut param_slots = vec![];
        for (name, ty) in &ctor_params {
            let slot = body.allocate_local(descriptors::is_wide(ty));
            ctx.bind_local(name.clone(), slot, ty.clone());
            param_slots.push((name.clone(), ty.clone(), slot));
        }

        body.emit(op::ALOAD_0, 1);
        let mut super_arg_types = Vec::with_capacity(c.super_args.len());
        {
            let mut emitter = MethodEmitter {
                body: &mut body,
                pool: &mut pool,
                ctx,
                owner_internal_name: c.name.clone(),
                is_static_context: false,
                pending_methods: &mut pending_methods,
                pending_bootstraps: &mut pending_bootstraps,
            };
            for arg in &c.super_args {
                super_arg_types.push(arg.get_info().type_id);
                emit_expression(arg, &mut emitter)?;
            }
        }
        let super_ctor_descriptor = descriptors::method_descriptor(&super_arg_types, &Type::Unit);
        let super_ctor_idx = pool.methodref(&super_name, "<init>", &super_ctor_descriptor);
        body.emit_u16(op::INVOKESPECIAL, super_ctor_idx, -1 - super_arg_types.len() as i32);

        for (name, ty, slot) in &param_slots {
            body.emit(op::ALOAD_0, 1);
            let load_op = descriptors::load_opcode(ty);
            body.emit_u8(load_op, *slot as u8, if descriptors::is_wide(ty) { 2 } else { 1 });
            let descriptor = descriptors::field_descriptor(ty);
            let field_idx = pool.fieldref(&c.name, name, &descriptor);
            body.emit_u16(op::PUTFIELD, field_idx, -2);
        }

        for field in &c.fields {
            body.emit(op::ALOAD_0, 1);
            {
                let mut emitter = MethodEmitter {
                    body: &mut body,
                    pool: &mut pool,
                    ctx,
                    owner_internal_name: c.name.clone(),
                    is_static_context: false,
                    pending_methods: &mut pending_methods,
                    pending_bootstraps: &mut pending_bootstraps,
                };
                emit_expression(&field.value, &mut emitter)?;
            }
            let descriptor = descriptors::field_descriptor(&field.info.type_id);
            let field_idx = pool.fieldref(&c.name, &field.name, &descriptor);
            body.emit_u16(op::PUTFIELD, field_idx, -2);
        }

        body.emit(op::RETURN, 0);
        ctx.exit_method_body(EmitterState::EmittingTopLevel);

        let ctor_descriptor = descriptors::method_descriptor(
            &ctor_params.iter().map(|(_, t)| t.clone()).collect::<Vec<_>>(),
            &Type::Unit,
        );
        let name_index = pool.utf8("<init>");
        let descriptor_index = pool.utf8(&ctor_descriptor);
        methods.push(MethodInfo {
            access_flags: access::PUBLIC,
            name_index,
            descriptor_index,
            code: Some(CodeAttribute {
                max_stack: body.max_stack(),
                max_locals: body.max_locals(),
                code: body.into_bytes(),
                exception_table: vec![],
            }),
        });
    }

    for method in &c.methods {
        let params = function_params(method);
        let return_type = function_return(method);
        let body_expr = method
            .body
            .as_ref()
            .expect("a class method always carries a body");
        let code = emit_method_like(
            &c.name,
            &params,
            &return_type,
            body_expr,
            false,
            &mut pool,
            ctx,
            &mut pending_methods,
            &mut pending_bootstraps,
        )?;
        let descriptor = descriptors::method_descriptor(
            &params.iter().map(|(_, t)| t.clone()).collect::<Vec<_>>(),
            &return_type,
        );
        let name_index = pool.utf8(&method.name);
        let descriptor_index = pool.utf8(&descriptor);
        methods.push(MethodInfo {
            access_flags: access::PUBLIC,
            name_index,
            descriptor_index,
            code: Some(code),
        });
    }

    drain_pending_methods(
        &c.name,
        &mut pool,
        ctx,
        &mut pending_methods,
        &mut pending_bootstraps,
        &mut methods,
    )?;

    let class = ClassFile {
        constant_pool: pool,
        access_flags: access::PUBLIC | access::SUPER,
        this_class,
        super_class,
        interfaces,
        fields,
        methods,
        bootstrap_methods: pending_bootstraps,
    };

    Ok(ClassArtifact {
        name: c.name.clone(),
        bytes: class.into_bytes(),
    })
}

fn emit_trait(
    t: &TraitDeclaration<ValidatedTypeInformation>,
    ctx: &mut CodegenContext,
) -> Result<ClassArtifact, CodegenError> {
    let implemented_traits = match &t.info.type_id {
        Type::Named { implemented_traits, .. } => implemented_traits.clone(),
        _ => vec![],
    };

    let mut pool = ConstantPool::default();
    let this_class = pool.class(&t.name);
    let super_class = pool.class("java/lang/Object");
    let interfaces = interface_names(&implemented_traits)
        .iter()
        .map(|n| pool.class(n))
        .collect();

    let mut pending_methods = vec![];
    let mut pending_bootstraps = vec![];
    let mut methods = vec![];

    // Instance fields have no valid class-file representation on a JVM
    // interface; a trait's `fields` are structural-typing bookkeeping for
    // the type checker only and carry no storage here.
    for method in &t.methods {
        let params = function_params(method);
        let return_type = function_return(method);
        let descriptor = descriptors::method_descriptor(
            &params.iter().map(|(_, t)| t.clone()).collect::<Vec<_>>(),
            &return_type,
        );
        let name_index = pool.utf8(&method.name);
        let descriptor_index = pool.utf8(&descriptor);

        match &method.body {
            Some(body_expr) => {
                let code = emit_method_like(
                    &t.name,
                    &params,
                    &return_type,
                    body_expr,
                    false,
                    &mut pool,
                    ctx,
                    &mut pending_methods,
                    &mut pending_bootstraps,
                )?;
                methods.push(MethodInfo {
                    access_flags: access::PUBLIC,
                    name_index,
                    descriptor_index,
                    code: Some(code),
                });
            }
            None => {
                methods.push(MethodInfo {
                    access_flags: access::PUBLIC | access::ABSTRACT,
                    name_index,
                    descriptor_index,
                    code: None,
                });
            }
        }
    }

    drain_pending_methods(
        &t.name,
        &mut pool,
        ctx,
        &mut pending_methods,
        &mut pending_bootstraps,
        &mut methods,
    )?;

    let class = ClassFile {
        constant_pool: pool,
        access_flags: access::PUBLIC | access::INTERFACE | access::ABSTRACT,
        this_class,
        super_class,
        interfaces,
        fields: vec![],
        methods,
        bootstrap_methods: pending_bootstraps,
    };

    Ok(ClassArtifact {
        name: t.name.clone(),
        bytes: class.into_bytes(),
    })
}

fn emit_object(
    o: &ObjectDeclaration<ValidatedTypeInformation>,
    ctx: &mut CodegenContext,
) -> Result<ClassArtifact, CodegenError> {
    let (super_type, implemented_traits) = match &o.info.type_id {
        Type::Named { super_type, implemented_traits, .. } => {
            (super_type.clone(), implemented_traits.clone())
        }
        _ => (None, vec![]),
    };

    let mut pool = ConstantPool::default();
    let this_class = pool.class(&o.name);
    let super_name = super_internal_name(&super_type);
    let super_class = pool.class(&super_name);
    let interfaces = interface_names(&implemented_traits)
        .iter()
        .map(|n| pool.class(n))
        .collect();

    let mut fields = vec![];
    let instance_descriptor = format!("L{};", o.name);
    let instance_name_index = pool.utf8("INSTANCE");
    let instance_descriptor_index = pool.utf8(&instance_descriptor);
    fields.push(FieldInfo {
        access_flags: access::PUBLIC | access::STATIC | access::FINAL,
        name_index: instance_name_index,
        descriptor_index: instance_descriptor_index,
    });

    for field in &o.fields {
        let access_flags = if field.mutable {
            access::PRIVATE
        } else {
            access::PRIVATE | access::FINAL
        };
        let name_index = pool.utf8(&field.name);
        let descriptor_index = pool.utf8(&descriptors::field_descriptor(&field.info.type_id));
        fields.push(FieldInfo {
            access_flags,
            name_index,
            descriptor_index,
        });
    }

    let mut pending_methods = vec![];
    let mut pending_bootstraps = vec![];
    let mut methods = vec![];

    // Private no-arg `<init>`: call the superclass constructor, then run
    // every field's initialiser.
    {
        let mut body = MethodBody::new(1);
        ctx.enter_method_body();
        body.emit(op::ALOAD_0, 1);
        let super_ctor_idx = pool.methodref(&super_name, "<init>", "()V");
        body.emit_u16(op::INVOKESPECIAL, super_ctor_idx, -1);

        for field in &o.fields {
            body.emit(op::ALOAD_0, 1);
            {
                let mut emitter = MethodEmitter {
                    body: &mut body,
                    pool: &mut pool,
                    ctx,
                    owner_internal_name: o.name.clone(),
                    is_static_context: false,
                    pending_methods: &mut pending_methods,
                    pending_bootstraps: &mut pending_bootstraps,
                };
                emit_expression(&field.value, &mut emitter)?;
            }
            let descriptor = descriptors::field_descriptor(&field.info.type_id);
            let field_idx = pool.fieldref(&o.name, &field.name, &descriptor);
            body.emit_u16(op::PUTFIELD, field_idx, -2);
        }
        body.emit(op::RETURN, 0);
        ctx.exit_method_body(EmitterState::EmittingTopLevel);

        let name_index = pool.utf8("<init>");
        let descriptor_index = pool.utf8("()V");
        methods.push(MethodInfo {
            access_flags: access::PRIVATE,
            name_index,
            descriptor_index,
            code: Some(CodeAttribute {
                max_stack: body.max_stack(),
                max_locals: body.max_locals(),
                code: body.into_bytes(),
                exception_table: vec![],
            }),
        });
    }

    for method in &o.methods {
        let params = function_params(method);
        let return_type = function_return(method);
        let body_expr = method
            .body
            .as_ref()
            .expect("an object method always carries a body");
        let code = emit_method_like(
            &o.name,
            &params,
            &return_type,
            body_expr,
            false,
            &mut pool,
            ctx,
            &mut pending_methods,
            &mut pending_bootstraps,
        )?;
        let descriptor = descriptors::method_descriptor(
            &params.iter().map(|(_, t)| t.clone()).collect::<Vec<_>>(),
            &return_type,
        );
        let name_index = pool.utf8(&method.name);
        let descriptor_index = pool.utf8(&descriptor);
        methods.push(MethodInfo {
            access_flags: access::PUBLIC,
            name_index,
            descriptor_index,
            code: Some(code),
        });
    }

    // `<clinit>`: allocate, invoke the private constructor, store into
    // `INSTANCE` — the only static initialisation this emitter ever needs.
    {
        let mut body = MethodBody::new(0);
        let class_idx = pool.class(&o.name);
        body.emit_u16(op::NEW, class_idx, 1);
        body.emit(op::DUP, 1);
        let ctor_idx = pool.methodref(&o.name, "<init>", "()V");
        body.emit_u16(op::INVOKESPECIAL, ctor_idx, -1);
        let field_idx = pool.fieldref(&o.name, "INSTANCE", &instance_descriptor);
        body.emit_u16(op::PUTSTATIC, field_idx, -1);
        body.emit(op::RETURN, 0);

        let name_index = pool.utf8("<clinit>");
        let descriptor_index = pool.utf8("()V");
        methods.push(MethodInfo {
            access_flags: access::STATIC,
            name_index,
            descriptor_index,
            code: Some(CodeAttribute {
                max_stack: body.max_stack(),
                max_locals: body.max_locals(),
                code: body.into_bytes(),
                exception_table: vec![],
            }),
        });
    }

    drain_pending_methods(
        &o.name,
        &mut pool,
        ctx,
        &mut pending_methods,
        &mut pending_bootstraps,
        &mut methods,
    )?;

    let class = ClassFile {
        constant_pool: pool,
        access_flags: access::PUBLIC | access::SUPER | access::FINAL,
        this_class,
        super_class,
        interfaces,
        fields,
        methods,
        bootstrap_methods: pending_bootstraps,
    };

    Ok(ClassArtifact {
        name: o.name.clone(),
        bytes: class.into_bytes(),
    })
}

fn extension_target_name(target: &Type) -> String {
    match target {
        Type::Int => "Int".to_string(),
        Type::Double => "Double".to_string(),
        Type::Boolean => "Boolean".to_string(),
        Type::String => "String".to_string(),
        Type::List(_) => "List".to_string(),
        Type::Set(_) => "Set".to_string(),
        Type::Map(_, _) => "Map".to_string(),
        Type::Named { name, .. } => name.clone(),
        other => format!("{other:?}"),
    }
}

fn emit_extension(
    e: &ExtensionDeclaration<ValidatedTypeInformation>,
    ctx: &mut CodegenContext,
) -> Result<ClassArtifact, CodegenError> {
    let target = e.info.type_id.clone();
    let class_name = format!("{}$Extension", extension_target_name(&target));

    let mut pool = ConstantPool::default();
    let this_class = pool.class(&class_name);
    let super_class = pool.class("java/lang/Object");

    let mut pending_methods = vec![];
    let mut pending_bootstraps = vec![];
    let mut methods = vec![];

    for method in &e.methods {
        let mut params = vec![("$receiver".to_string(), target.clone())];
        params.extend(function_params(method));
        let return_type = function_return(method);
        let body_expr = method
            .body
            .as_ref()
            .expect("an extension method always carries a body");
        let code = emit_method_like(
            &class_name,
            &params,
            &return_type,
            body_expr,
            true,
            &mut pool,
            ctx,
            &mut pending_methods,
            &mut pending_bootstraps,
        )?;
        let descriptor = descriptors::method_descriptor(
            &params.iter().map(|(_, t)| t.clone()).collect::<Vec<_>>(),
            &return_type,
        );
        let name_index = pool.utf8(&method.name);
        let descriptor_index = pool.utf8(&descriptor);
        methods.push(MethodInfo {
            access_flags: access::PUBLIC | access::STATIC,
            name_index,
            descriptor_index,
            code: Some(code),
        });
    }

    drain_pending_methods(
        &class_name,
        &mut pool,
        ctx,
        &mut pending_methods,
        &mut pending_bootstraps,
        &mut methods,
    )?;

    let class = ClassFile {
        constant_pool: pool,
        access_flags: access::PUBLIC | access::SUPER | access::FINAL,
        this_class,
        super_class,
        interfaces: vec![],
        fields: vec![],
        methods,
        bootstrap_methods: pending_bootstraps,
    };

    Ok(ClassArtifact {
        name: class_name,
        bytes: class.into_bytes(),
    })
}

/// Registers every top-level function's signature before any body is
/// lowered, mirroring the type checker's own forward-reference pass: a
/// call site earlier in source order than the function it calls must
/// still resolve.
fn register_function_signatures(
    statements: &[TopLevelStatement<ValidatedTypeInformation>],
    ctx: &mut CodegenContext,
) {
    for statement in statements {
        if let TopLevelStatement::Function(f) = statement {
            ctx.register_function_signature(f.name.clone(), f.info.type_id.clone());
        }
    }
}

pub fn emit_program(
    statements: &[TopLevelStatement<ValidatedTypeInformation>],
) -> Result<Vec<ClassArtifact>, CodegenError> {
    let mut ctx = CodegenContext::new();
    ctx.begin_top_level();
    register_function_signatures(statements, &mut ctx);

    let mut artifacts = Vec::with_capacity(statements.len());
    for statement in statements {
        let artifact = match statement {
            TopLevelStatement::Function(f) => emit_function(f, &mut ctx)?,
            TopLevelStatement::Class(c) => emit_class(c, &mut ctx)?,
            TopLevelStatement::Trait(t) => emit_trait(t, &mut ctx)?,
            TopLevelStatement::Object(o) => emit_object(o, &mut ctx)?,
            TopLevelStatement::Extension(e) => emit_extension(e, &mut ctx)?,
        };
        artifacts.push(artifact);
    }

    ctx.close();
    Ok(artifacts)
}
