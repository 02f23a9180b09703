//! The compiled per-field executor.
//!
//! Built once per schema field by the compile pass, an executor couples the
//! field's argument coercers, its resolver and the completion of its return
//! type. Field errors (from the resolver or from completion) are rescued
//! here: they are appended to the request's sink and the field completes to
//! `null`. Structural errors pass through and fail the request.

use std::sync::Arc;

use crate::{
    async_value::AsyncValue,
    context::{ExecutionContext, ResolveFieldContext},
    error::ExecutionError,
    plan::ExecutionInfo,
    registry::{MetaField, Resolver, TypeRef},
    response::ResponseValue,
    value::{ConstValue, Name},
};

use super::{
    completion,
    input::{self, CompiledArgument},
};

pub struct FieldExecutor {
    parent_type: Name,
    field_name: Name,
    return_type: TypeRef,
    resolver: Resolver,
    arguments: Vec<CompiledArgument>,
}

impl FieldExecutor {
    pub(crate) fn new(
        parent_type: Name,
        field: &MetaField,
        arguments: Vec<CompiledArgument>,
    ) -> Self {
        Self {
            parent_type,
            field_name: field.name.clone(),
            return_type: field.ty.clone(),
            resolver: field.resolver.clone(),
            arguments,
        }
    }

    pub(crate) fn execute(
        &self,
        env: ExecutionContext,
        info: Arc<ExecutionInfo>,
        parent_value: &ConstValue,
    ) -> AsyncValue<ResponseValue> {
        let args =
            match input::get_argument_values(&self.arguments, &info.node.arguments, &env.variables)
            {
                Ok(args) => args,
                Err(error) => {
                    env.add_error(error);
                    return AsyncValue::empty();
                }
            };
        let errors = env.errors.clone();
        let ctx = ResolveFieldContext {
            env,
            info,
            parent_type: self.parent_type.clone(),
            return_type: self.return_type.clone(),
            args,
        };

        let completed = match &self.resolver {
            Resolver::Undefined => AsyncValue::error(ExecutionError::UndefinedResolver {
                ty: self.parent_type.clone(),
                field: self.field_name.clone(),
            }),
            Resolver::Sync(resolve) => match resolve(&ctx, parent_value) {
                Ok(ConstValue::Null) => AsyncValue::empty(),
                Ok(value) => completion::complete_value(&ctx, &ctx.return_type, &ctx.info, value),
                Err(error) => AsyncValue::error(ExecutionError::Field(error)),
            },
            Resolver::Async(resolve) => {
                let future = resolve(ctx.clone(), parent_value.clone());
                AsyncValue::from_future(async move {
                    let value = future.await.map_err(ExecutionError::Field)?;
                    completion::complete_value(&ctx, &ctx.return_type, &ctx.info, value)
                        .get()
                        .await
                })
            }
        };

        completed.rescue(move |error| match error {
            ExecutionError::Field(error) => {
                errors.report(error);
                Ok(ResponseValue::Null)
            }
            fatal => Err(fatal),
        })
    }
}
