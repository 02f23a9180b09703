//! Plan execution: the public entry point and the per-level field
//! collection it drives.
//!
//! `Parallel` plans schedule every included top-level field concurrently;
//! `Sequential` plans (mutations) invoke one field executor at a time, each
//! only after the previous field's whole subtree has been assembled, so a
//! mutation's observable effects precede its successor's resolver.

use std::sync::Arc;

use crate::{
    async_value::{AsyncValue, Thunk},
    context::{ErrorSink, ExecutionContext},
    error::{ExecutionError, ExecutionResult},
    plan::{ExecutionInfo, ExecutionPlan, OperationType, Strategy},
    registry::CompiledSchema,
    response::{ResponseMap, ResponseValue},
    value::{ConstValue, Name, Variables},
};

mod completion;
pub(crate) mod field;
pub(crate) mod input;

pub use input::InputCoercer;

/// Execute a plan against a compiled schema.
///
/// Variables are coerced first; a variable coercion failure fails the
/// request before any field executes. Field errors land in `errors` with
/// the offending key set to `null` in the returned map; structural errors
/// surface as the `Err` of this function.
pub async fn evaluate(
    schema: Arc<CompiledSchema>,
    plan: &ExecutionPlan,
    variables: Variables,
    root_value: ConstValue,
    errors: &ErrorSink,
) -> ExecutionResult<ResponseMap> {
    let coerced = input::coerce_variables(&schema, &plan.operation, &variables)?;
    let root_type = match plan.operation.ty {
        OperationType::Query => schema.query_type().clone(),
        OperationType::Mutation => schema
            .mutation_type()
            .cloned()
            .ok_or(ExecutionError::UndefinedOperationRoot {
                operation: "mutation",
            })?,
        OperationType::Subscription => schema
            .subscription_type()
            .cloned()
            .ok_or(ExecutionError::UndefinedOperationRoot {
                operation: "subscription",
            })?,
    };
    tracing::trace!(
        strategy = ?plan.strategy,
        fields = plan.fields.len(),
        root_type = %root_type,
        "executing plan"
    );
    let env = ExecutionContext::new(schema, coerced, root_value, errors.clone());
    execute_plan(&env, plan, root_type).get().await
}

/// Execute the top level of a plan under its strategy.
pub(crate) fn execute_plan(
    env: &ExecutionContext,
    plan: &ExecutionPlan,
    root_type: Name,
) -> AsyncValue<ResponseMap> {
    match plan.strategy {
        Strategy::Parallel => execute_fields(
            env.clone(),
            root_type,
            env.root_value.clone(),
            &plan.fields,
        ),
        Strategy::Sequential => {
            let mut identifiers = Vec::with_capacity(plan.fields.len());
            let mut thunks: Vec<Thunk<ResponseValue>> = Vec::with_capacity(plan.fields.len());
            for info in &plan.fields {
                match info.include(&env.variables) {
                    Ok(true) => {}
                    Ok(false) => continue,
                    Err(error) => return AsyncValue::error(error),
                }
                let Some(executor) = env.schema.executor(&root_type, &info.field_name).cloned()
                else {
                    return AsyncValue::error(ExecutionError::UncompiledField {
                        ty: root_type.clone(),
                        field: info.field_name.clone(),
                    });
                };
                identifiers.push(info.identifier.clone());
                let env = env.clone();
                let info = info.clone();
                thunks.push(Box::new(move || {
                    let parent = env.root_value.clone();
                    executor.execute(env, info, &parent)
                }));
            }
            AsyncValue::collect_sequential(thunks).map(move |values| {
                ResponseMap::from_pairs(identifiers.into_iter().zip(values))
            })
        }
    }
}

/// Execute a set of sibling selections against a parent value, in parallel,
/// and assemble the results into a map keyed by response identifier in plan
/// order. A field that fails with a field error contributes a `null` entry;
/// its siblings still complete.
pub(crate) fn execute_fields(
    env: ExecutionContext,
    object_type: Name,
    parent_value: ConstValue,
    infos: &[Arc<ExecutionInfo>],
) -> AsyncValue<ResponseMap> {
    let mut identifiers = Vec::with_capacity(infos.len());
    let mut values = Vec::with_capacity(infos.len());
    for info in infos {
        match info.include(&env.variables) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(error) => return AsyncValue::error(error),
        }
        let Some(executor) = env.schema.executor(&object_type, &info.field_name) else {
            return AsyncValue::error(ExecutionError::UncompiledField {
                ty: object_type.clone(),
                field: info.field_name.clone(),
            });
        };
        identifiers.push(info.identifier.clone());
        values.push(executor.execute(env.clone(), info.clone(), &parent_value));
    }
    AsyncValue::collect_parallel(values)
        .map(move |values| ResponseMap::from_pairs(identifiers.into_iter().zip(values)))
}
