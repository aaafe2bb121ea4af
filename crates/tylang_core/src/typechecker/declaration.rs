//! Type checking for top level declarations: functions, classes, traits,
//! objects and extensions.
//!
//! Every declaration kind goes through the same two passes as the checker
//! as a whole: [`ShallowCheck`] registers a signature or type skeleton
//! (so forward references between declarations resolve), then
//! [`TypeCheckable::check`] walks bodies with that skeleton already in
//! scope.

use crate::parser::ast::{
    ClassDeclaration, Constructor, ExtensionDeclaration, Function, ObjectDeclaration, Parameter,
    TopLevelStatement, TraitDeclaration, TypeParameter, VarDeclaration,
};

use super::error::{RedefinedConstant, RedefinedType, TypeCheckError, TypeMismatch};
use super::expression::info_type;
use super::statement::{check_var_declaration, revert_var_declaration, validate_var_declaration};
use super::types::{NamedKind, Type, TypeVariance};
use super::{
    resolved, Context, ShallowCheck, TypeCheckable, TypeInformation, TypeResult,
    TypeValidationError, TypedConstruct, ValidatedTypeInformation,
};

fn resolve_type_params(params: &[TypeParameter]) -> Vec<(String, TypeVariance)> {
    params
        .iter()
        .map(|p| (p.name.clone(), p.variance.clone().into()))
        .collect()
}

fn function_signature(
    params: &[Parameter],
    return_type: &Option<crate::parser::ast::TypeAnnotation>,
    ctx: &Context,
) -> TypeResult<Type> {
    let mut param_types = Vec::with_capacity(params.len());
    for p in params {
        param_types.push(Type::try_from((p.type_annotation.clone(), ctx))?);
    }
    let return_value = match return_type {
        Some(rt) => Type::try_from((rt.clone(), ctx))?,
        None => Type::Unit,
    };
    Ok(Type::Function {
        params: param_types,
        return_value: Box::new(return_value),
    })
}

fn ctor_field_members(ctor: &Constructor, ctx: &Context) -> TypeResult<Vec<(String, Type)>> {
    let mut members = vec![];
    for p in &ctor.params {
        members.push((p.name.clone(), Type::try_from((p.type_annotation.clone(), ctx))?));
    }
    Ok(members)
}

fn field_members(
    fields: &[VarDeclaration<()>],
    ctx: &Context,
) -> TypeResult<Vec<(String, Type)>> {
    let mut members = vec![];
    for f in fields {
        let ty = match &f.type_annotation {
            Some(a) => Type::try_from((a.clone(), ctx))?,
            None => Type::Unknown,
        };
        members.push((f.name.clone(), ty));
    }
    Ok(members)
}

fn method_members(methods: &[Function<()>], ctx: &Context) -> TypeResult<Vec<(String, Type)>> {
    let mut members = vec![];
    for m in methods {
        members.push((m.name.clone(), function_signature(&m.params, &m.return_type, ctx)?));
    }
    Ok(members)
}

impl ShallowCheck for Function<()> {
    fn shallow_check(&self, ctx: &mut Context) -> TypeResult<()> {
        let signature = function_signature(&self.params, &self.return_type, &*ctx)?;
        ctx.scope
            .add_constant(&self.name, signature)
            .map_err(|_| {
                TypeCheckError::RedefinedConstant(
                    RedefinedConstant {
                        constant_name: self.name.clone(),
                    },
                    self.position.clone(),
                )
            })
    }
}

impl TypeCheckable for Function<()> {
    type Typed = Function<TypeInformation>;

    fn check(self, ctx: &mut Context) -> TypeResult<Self::Typed> {
        let signature = function_signature(&self.params, &self.return_type, &*ctx)?;
        let Type::Function {
            return_value: declared_return,
            ..
        } = signature.clone()
        else {
            unreachable!("function_signature always returns Type::Function")
        };

        let Function {
            name,
            type_params,
            params,
            return_type,
            body,
            position,
            ..
        } = self;

        ctx.scope.enter_scope();

        for param in &params {
            let ty = match Type::try_from((param.type_annotation.clone(), &*ctx)) {
                Ok(ty) => ty,
                Err(e) => {
                    ctx.scope.exit_scope();
                    return Err(e);
                }
            };
            if ctx.scope.add_constant(&param.name, ty).is_err() {
                ctx.scope.exit_scope();
                return Err(TypeCheckError::RedefinedConstant(
                    RedefinedConstant {
                        constant_name: param.name.clone(),
                    },
                    param.position.clone(),
                ));
            }
        }

        let body = match body {
            Some(b) => match b.check(ctx) {
                Ok(checked) => {
                    let body_type = info_type(&checked.get_info());
                    if !body_type.is_subtype_of(&declared_return, ctx) {
                        ctx.scope.exit_scope();
                        return Err(TypeCheckError::TypeMismatch(
                            TypeMismatch {
                                expected: *declared_return,
                                actual: body_type,
                            },
                            position,
                        ));
                    }
                    Some(checked)
                }
                Err(e) => {
                    ctx.scope.exit_scope();
                    return Err(e);
                }
            },
            None => None,
        };

        ctx.scope.exit_scope();

        Ok(Function {
            name,
            type_params,
            params,
            return_type,
            body,
            info: resolved(ctx, signature),
            position,
        })
    }

    fn revert(this: &Self::Typed) -> Self {
        Function {
            name: this.name.clone(),
            type_params: this.type_params.clone(),
            params: this.params.clone(),
            return_type: this.return_type.clone(),
            body: this.body.as_ref().map(crate::parser::ast::Expression::revert),
            info: (),
            position: this.position.clone(),
        }
    }
}

fn validate_function(
    f: Function<TypeInformation>,
) -> Result<Function<ValidatedTypeInformation>, TypeValidationError> {
    Ok(Function {
        info: f.info.validate(&f.position)?,
        name: f.name,
        type_params: f.type_params,
        params: f.params,
        return_type: f.return_type,
        body: f
            .body
            .map(crate::parser::ast::Expression::validate)
            .transpose()?,
        position: f.position,
    })
}

impl ShallowCheck for ClassDeclaration<()> {
    fn shallow_check(&self, ctx: &mut Context) -> TypeResult<()> {
        let type_params = resolve_type_params(&self.type_params);

        let mut members = ctor_field_members(&self.constructor, &*ctx)?;
        members.extend(field_members(&self.fields, &*ctx)?);
        members.extend(method_members(&self.methods, &*ctx)?);

        let super_type = self
            .super_type
            .as_ref()
            .map(|t| Type::try_from((t.clone(), &*ctx)))
            .transpose()?
            .map(Box::new);

        let mut implemented_traits = vec![];
        for t in &self.implemented_traits {
            implemented_traits.push(Type::try_from((t.clone(), &*ctx))?);
        }

        let class_type = Type::Named {
            kind: NamedKind::Class,
            name: self.name.clone(),
            type_params,
            type_args: vec![],
            super_type,
            implemented_traits,
            members,
        };

        ctx.scope
            .add_type(&self.name, class_type.clone())
            .map_err(|_| {
                TypeCheckError::RedefinedType(
                    RedefinedType {
                        type_name: self.name.clone(),
                    },
                    self.position.clone(),
                )
            })?;

        let mut ctor_param_types = Vec::with_capacity(self.constructor.params.len());
        for p in &self.constructor.params {
            ctor_param_types.push(Type::try_from((p.type_annotation.clone(), &*ctx))?);
        }

        let _ = ctx.scope.add_method_to_type(
            class_type,
            "<init>",
            Type::Function {
                params: ctor_param_types,
                return_value: Box::new(Type::Unit),
            },
        );

        Ok(())
    }
}

impl TypeCheckable for ClassDeclaration<()> {
    type Typed = ClassDeclaration<TypeInformation>;

    fn check(self, ctx: &mut Context) -> TypeResult<Self::Typed> {
        let ClassDeclaration {
            name,
            type_params,
            constructor,
            super_type,
            super_args,
            implemented_traits,
            fields,
            methods,
            position,
            ..
        } = self;

        let class_type = ctx.scope.get_type(&name).unwrap_or(Type::Unknown);

        ctx.scope.enter_scope();
        let _ = ctx.scope.add_constant("this", class_type.clone());

        for param in &constructor.params {
            let ty = match Type::try_from((param.type_annotation.clone(), &*ctx)) {
                Ok(ty) => ty,
                Err(e) => {
                    ctx.scope.exit_scope();
                    return Err(e);
                }
            };
            if ctx.scope.add_constant(&param.name, ty).is_err() {
                ctx.scope.exit_scope();
                return Err(TypeCheckError::RedefinedConstant(
                    RedefinedConstant {
                        constant_name: param.name.clone(),
                    },
                    param.position.clone(),
                ));
            }
        }

        let mut checked_super_args = Vec::with_capacity(super_args.len());
        for arg in super_args {
            match arg.check(ctx) {
                Ok(c) => checked_super_args.push(c),
                Err(e) => {
                    ctx.scope.exit_scope();
                    return Err(e);
                }
            }
        }

        let mut checked_fields = Vec::with_capacity(fields.len());
        for field in fields {
            match check_var_declaration(field, ctx) {
                Ok(f) => checked_fields.push(f),
                Err(e) => {
                    ctx.scope.exit_scope();
                    return Err(e);
                }
            }
        }

        let mut checked_methods = Vec::with_capacity(methods.len());
        for method in methods {
            match method.check(ctx) {
                Ok(m) => checked_methods.push(m),
                Err(e) => {
                    ctx.scope.exit_scope();
                    return Err(e);
                }
            }
        }

        ctx.scope.exit_scope();

        Ok(ClassDeclaration {
            name,
            type_params,
            constructor,
            super_type,
            super_args: checked_super_args,
            implemented_traits,
            fields: checked_fields,
            methods: checked_methods,
            info: resolved(ctx, class_type),
            position,
        })
    }

    fn revert(this: &Self::Typed) -> Self {
        ClassDeclaration {
            name: this.name.clone(),
            type_params: this.type_params.clone(),
            constructor: this.constructor.clone(),
            super_type: this.super_type.clone(),
            super_args: this
                .super_args
                .iter()
                .map(crate::parser::ast::Expression::revert)
                .collect(),
            implemented_traits: this.implemented_traits.clone(),
            fields: this.fields.iter().map(revert_var_declaration).collect(),
            methods: this.methods.iter().map(Function::revert).collect(),
            info: (),
            position: this.position.clone(),
        }
    }
}

fn validate_class(
    c: ClassDeclaration<TypeInformation>,
) -> Result<ClassDeclaration<ValidatedTypeInformation>, TypeValidationError> {
    Ok(ClassDeclaration {
        info: c.info.validate(&c.position)?,
        name: c.name,
        type_params: c.type_params,
        constructor: c.constructor,
        super_type: c.super_type,
        super_args: c
            .super_args
            .into_iter()
            .map(crate::parser::ast::Expression::validate)
            .collect::<Result<_, _>>()?,
        implemented_traits: c.implemented_traits,
        fields: c
            .fields
            .into_iter()
            .map(validate_var_declaration)
            .collect::<Result<_, _>>()?,
        methods: c
            .methods
            .into_iter()
            .map(validate_function)
            .collect::<Result<_, _>>()?,
        position: c.position,
    })
}

impl ShallowCheck for TraitDeclaration<()> {
    fn shallow_check(&self, ctx: &mut Context) -> TypeResult<()> {
        let type_params = resolve_type_params(&self.type_params);

        let mut members = field_members(&self.fields, &*ctx)?;
        members.extend(method_members(&self.methods, &*ctx)?);

        let mut implemented_traits = vec![];
        for t in &self.super_traits {
            implemented_traits.push(Type::try_from((t.clone(), &*ctx))?);
        }

        let trait_type = Type::Named {
            kind: NamedKind::Trait,
            name: self.name.clone(),
            type_params,
            type_args: vec![],
            super_type: None,
            implemented_traits,
            members,
        };

        ctx.scope
            .add_type(&self.name, trait_type)
            .map_err(|_| {
                TypeCheckError::RedefinedType(
                    RedefinedType {
                        type_name: self.name.clone(),
                    },
                    self.position.clone(),
                )
            })
    }
}

impl TypeCheckable for TraitDeclaration<()> {
    type Typed = TraitDeclaration<TypeInformation>;

    fn check(self, ctx: &mut Context) -> TypeResult<Self::Typed> {
        let TraitDeclaration {
            name,
            type_params,
            super_traits,
            fields,
            methods,
            position,
            ..
        } = self;

        let trait_type = ctx.scope.get_type(&name).unwrap_or(Type::Unknown);

        ctx.scope.enter_scope();
        let _ = ctx.scope.add_constant("this", trait_type.clone());

        let mut checked_fields = Vec::with_capacity(fields.len());
        for field in fields {
            match check_var_declaration(field, ctx) {
                Ok(f) => checked_fields.push(f),
                Err(e) => {
                    ctx.scope.exit_scope();
                    return Err(e);
                }
            }
        }

        let mut checked_methods = Vec::with_capacity(methods.len());
        for method in methods {
            match method.check(ctx) {
                Ok(m) => checked_methods.push(m),
                Err(e) => {
                    ctx.scope.exit_scope();
                    return Err(e);
                }
            }
        }

        ctx.scope.exit_scope();

        Ok(TraitDeclaration {
            name,
            type_params,
            super_traits,
            fields: checked_fields,
            methods: checked_methods,
            info: resolved(ctx, trait_type),
            position,
        })
    }

    fn revert(this: &Self::Typed) -> Self {
        TraitDeclaration {
            name: this.name.clone(),
            type_params: this.type_params.clone(),
            super_traits: this.super_traits.clone(),
            fields: this.fields.iter().map(revert_var_declaration).collect(),
            methods: this.methods.iter().map(Function::revert).collect(),
            info: (),
            position: this.position.clone(),
        }
    }
}

fn validate_trait(
    t: TraitDeclaration<TypeInformation>,
) -> Result<TraitDeclaration<ValidatedTypeInformation>, TypeValidationError> {
    Ok(TraitDeclaration {
        info: t.info.validate(&t.position)?,
        name: t.name,
        type_params: t.type_params,
        super_traits: t.super_traits,
        fields: t
            .fields
            .into_iter()
            .map(validate_var_declaration)
            .collect::<Result<_, _>>()?,
        methods: t
            .methods
            .into_iter()
            .map(validate_function)
            .collect::<Result<_, _>>()?,
        position: t.position,
    })
}

impl ShallowCheck for ObjectDeclaration<()> {
    fn shallow_check(&self, ctx: &mut Context) -> TypeResult<()> {
        let mut members = field_members(&self.fields, &*ctx)?;
        members.extend(method_members(&self.methods, &*ctx)?);

        let super_type = self
            .super_type
            .as_ref()
            .map(|t| Type::try_from((t.clone(), &*ctx)))
            .transpose()?
            .map(Box::new);

        let mut implemented_traits = vec![];
        for t in &self.implemented_traits {
            implemented_traits.push(Type::try_from((t.clone(), &*ctx))?);
        }

        let object_type = Type::Named {
            kind: NamedKind::Object,
            name: self.name.clone(),
            type_params: vec![],
            type_args: vec![],
            super_type,
            implemented_traits,
            members,
        };

        ctx.scope
            .add_type(&self.name, object_type.clone())
            .map_err(|_| {
                TypeCheckError::RedefinedType(
                    RedefinedType {
                        type_name: self.name.clone(),
                    },
                    self.position.clone(),
                )
            })?;

        ctx.scope
            .add_constant(&self.name, object_type)
            .map_err(|_| {
                TypeCheckError::RedefinedConstant(
                    RedefinedConstant {
                        constant_name: self.name.clone(),
                    },
                    self.position.clone(),
                )
            })
    }
}

impl TypeCheckable for ObjectDeclaration<()> {
    type Typed = ObjectDeclaration<TypeInformation>;

    fn check(self, ctx: &mut Context) -> TypeResult<Self::Typed> {
        let ObjectDeclaration {
            name,
            super_type,
            implemented_traits,
            fields,
            methods,
            position,
            ..
        } = self;

        let object_type = ctx.scope.get_type(&name).unwrap_or(Type::Unknown);

        ctx.scope.enter_scope();
        let _ = ctx.scope.add_constant("this", object_type.clone());

        let mut checked_fields = Vec::with_capacity(fields.len());
        for field in fields {
            match check_var_declaration(field, ctx) {
                Ok(f) => checked_fields.push(f),
                Err(e) => {
                    ctx.scope.exit_scope();
                    return Err(e);
                }
            }
        }

        let mut checked_methods = Vec::with_capacity(methods.len());
        for method in methods {
            match method.check(ctx) {
                Ok(m) => checked_methods.push(m),
                Err(e) => {
                    ctx.scope.exit_scope();
                    return Err(e);
                }
            }
        }

        ctx.scope.exit_scope();

        Ok(ObjectDeclaration {
            name,
            super_type,
            implemented_traits,
            fields: checked_fields,
            methods: checked_methods,
            info: resolved(ctx, object_type),
            position,
        })
    }

    fn revert(this: &Self::Typed) -> Self {
        ObjectDeclaration {
            name: this.name.clone(),
            super_type: this.super_type.clone(),
            implemented_traits: this.implemented_traits.clone(),
            fields: this.fields.iter().map(revert_var_declaration).collect(),
            methods: this.methods.iter().map(Function::revert).collect(),
            info: (),
            position: this.position.clone(),
        }
    }
}

fn validate_object(
    o: ObjectDeclaration<TypeInformation>,
) -> Result<ObjectDeclaration<ValidatedTypeInformation>, TypeValidationError> {
    Ok(ObjectDeclaration {
        info: o.info.validate(&o.position)?,
        name: o.name,
        super_type: o.super_type,
        implemented_traits: o.implemented_traits,
        fields: o
            .fields
            .into_iter()
            .map(validate_var_declaration)
            .collect::<Result<_, _>>()?,
        methods: o
            .methods
            .into_iter()
            .map(validate_function)
            .collect::<Result<_, _>>()?,
        position: o.position,
    })
}

impl ShallowCheck for ExtensionDeclaration<()> {
    fn shallow_check(&self, ctx: &mut Context) -> TypeResult<()> {
        let target_type = Type::try_from((self.target_type.clone(), &*ctx))?;

        for method in &self.methods {
            let signature = function_signature(&method.params, &method.return_type, &*ctx)?;
            ctx.scope
                .add_method_to_type(target_type.clone(), &method.name, signature)
                .map_err(|_| {
                    TypeCheckError::RedefinedConstant(
                        RedefinedConstant {
                            constant_name: method.name.clone(),
                        },
                        method.position.clone(),
                    )
                })?;
        }

        Ok(())
    }
}

impl TypeCheckable for ExtensionDeclaration<()> {
    type Typed = ExtensionDeclaration<TypeInformation>;

    fn check(self, ctx: &mut Context) -> TypeResult<Self::Typed> {
        let ExtensionDeclaration {
            target_type,
            methods,
            position,
            ..
        } = self;

        let target = Type::try_from((target_type.clone(), &*ctx))?;

        ctx.scope.enter_scope();
        let _ = ctx.scope.add_constant("this", target.clone());

        let mut checked_methods = Vec::with_capacity(methods.len());
        for method in methods {
            match method.check(ctx) {
                Ok(m) => checked_methods.push(m),
                Err(e) => {
                    ctx.scope.exit_scope();
                    return Err(e);
                }
            }
        }

        ctx.scope.exit_scope();

        Ok(ExtensionDeclaration {
            target_type,
            methods: checked_methods,
            info: resolved(ctx, target),
            position,
        })
    }

    fn revert(this: &Self::Typed) -> Self {
        ExtensionDeclaration {
            target_type: this.target_type.clone(),
            methods: this.methods.iter().map(Function::revert).collect(),
            info: (),
            position: this.position.clone(),
        }
    }
}

fn validate_extension(
    e: ExtensionDeclaration<TypeInformation>,
) -> Result<ExtensionDeclaration<ValidatedTypeInformation>, TypeValidationError> {
    Ok(ExtensionDeclaration {
        info: e.info.validate(&e.position)?,
        target_type: e.target_type,
        methods: e
            .methods
            .into_iter()
            .map(validate_function)
            .collect::<Result<_, _>>()?,
        position: e.position,
    })
}

impl ShallowCheck for TopLevelStatement<()> {
    fn shallow_check(&self, ctx: &mut Context) -> TypeResult<()> {
        match self {
            TopLevelStatement::Function(f) => f.shallow_check(ctx),
            TopLevelStatement::Class(c) => c.shallow_check(ctx),
            TopLevelStatement::Trait(t) => t.shallow_check(ctx),
            TopLevelStatement::Object(o) => o.shallow_check(ctx),
            TopLevelStatement::Extension(e) => e.shallow_check(ctx),
        }
    }
}

impl TypeCheckable for TopLevelStatement<()> {
    type Typed = TopLevelStatement<TypeInformation>;

    fn check(self, ctx: &mut Context) -> TypeResult<Self::Typed> {
        Ok(match self {
            TopLevelStatement::Function(f) => TopLevelStatement::Function(f.check(ctx)?),
            TopLevelStatement::Class(c) => TopLevelStatement::Class(c.check(ctx)?),
            TopLevelStatement::Trait(t) => TopLevelStatement::Trait(t.check(ctx)?),
            TopLevelStatement::Object(o) => TopLevelStatement::Object(o.check(ctx)?),
            TopLevelStatement::Extension(e) => TopLevelStatement::Extension(e.check(ctx)?),
        })
    }

    fn revert(this: &Self::Typed) -> Self {
        match this {
            TopLevelStatement::Function(f) => TopLevelStatement::Function(Function::revert(f)),
            TopLevelStatement::Class(c) => {
                TopLevelStatement::Class(ClassDeclaration::revert(c))
            }
            TopLevelStatement::Trait(t) => {
                TopLevelStatement::Trait(TraitDeclaration::revert(t))
            }
            TopLevelStatement::Object(o) => {
                TopLevelStatement::Object(ObjectDeclaration::revert(o))
            }
            TopLevelStatement::Extension(e) => {
                TopLevelStatement::Extension(ExtensionDeclaration::revert(e))
            }
        }
    }
}

impl TypedConstruct for TopLevelStatement<TypeInformation> {
    type Validated = TopLevelStatement<ValidatedTypeInformation>;

    fn validate(self) -> Result<Self::Validated, TypeValidationError> {
        Ok(match self {
            TopLevelStatement::Function(f) => TopLevelStatement::Function(validate_function(f)?),
            TopLevelStatement::Class(c) => TopLevelStatement::Class(validate_class(c)?),
            TopLevelStatement::Trait(t) => TopLevelStatement::Trait(validate_trait(t)?),
            TopLevelStatement::Object(o) => TopLevelStatement::Object(validate_object(o)?),
            TopLevelStatement::Extension(e) => {
                TopLevelStatement::Extension(validate_extension(e)?)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex_significant;
    use crate::parser::{FromTokens, ParseState};

    fn parse_top_level(code: &str) -> TopLevelStatement<()> {
        let tokens = lex_significant(code, "test").expect("lex failed");
        let mut state = ParseState::from(tokens);
        TopLevelStatement::parse(&mut state).expect("parse failed")
    }

    #[test]
    fn checks_function_signature_and_body() {
        let mut ctx = Context::default();
        let decl = parse_top_level("fun add(a: Int, b: Int): Int = a + b");
        decl.shallow_check(&mut ctx).unwrap();
        let checked = parse_top_level("fun add(a: Int, b: Int): Int = a + b")
            .check(&mut ctx)
            .unwrap();
        let TopLevelStatement::Function(f) = checked else {
            panic!("expected function")
        };
        assert_eq!(
            info_type(&f.info),
            Type::Function {
                params: vec![Type::Int, Type::Int],
                return_value: Box::new(Type::Int),
            }
        );
    }

    #[test]
    fn rejects_function_body_type_mismatch() {
        let mut ctx = Context::default();
        let decl = parse_top_level("fun broken(): Int = true");
        decl.shallow_check(&mut ctx).unwrap();
        assert!(decl.check(&mut ctx).is_err());
    }

    #[test]
    fn checks_class_with_constructor_fields() {
        let mut ctx = Context::default();
        let decl = parse_top_level(
            "class Point(x: Int, y: Int) { fun sum(): Int = x + y }",
        );
        decl.shallow_check(&mut ctx).unwrap();
        assert!(decl.check(&mut ctx).is_ok());
    }

    #[test]
    fn registers_object_as_singleton_constant() {
        let mut ctx = Context::default();
        let decl = parse_top_level("object Math { val pi = 3.14 }");
        decl.shallow_check(&mut ctx).unwrap();
        assert!(ctx.scope.resolve_name("Math").is_some());
        assert!(decl.check(&mut ctx).is_ok());
    }

    #[test]
    fn extension_method_is_resolvable_on_target_type() {
        let mut ctx = Context::default();
        let decl = parse_top_level("extension Int { fun squared(): Int = this * this }");
        decl.shallow_check(&mut ctx).unwrap();
        assert!(decl.check(&mut ctx).is_ok());
        assert_eq!(
            ctx.scope.resolve_property_for_type(Type::Int, "squared"),
            Some(Type::Function {
                params: vec![],
                return_value: Box::new(Type::Int),
            })
        );
    }
}
