//! Type-directed completion of resolver output, and concrete-type
//! resolution for abstract positions.
//!
//! Completion recurses over the field's return type and the matching plan
//! node. A plan node whose kind does not fit the return type is a
//! planner/executor mismatch and fails structurally.

use std::sync::Arc;

use crate::{
    async_value::AsyncValue,
    context::ResolveFieldContext,
    error::{Error, ExecutionError, ExecutionResult},
    plan::{ExecutionInfo, PlanKind},
    registry::{MetaType, ResolveTypeFn, TypeRef, UnionType},
    response::ResponseValue,
    value::{ConstValue, Name},
};

use super::execute_fields;

pub(crate) fn complete_value(
    ctx: &ResolveFieldContext,
    ty: &TypeRef,
    info: &Arc<ExecutionInfo>,
    value: ConstValue,
) -> AsyncValue<ResponseValue> {
    match ty {
        TypeRef::Nullable(inner) => {
            if value.is_null() {
                return AsyncValue::ready(ResponseValue::Null);
            }
            complete_value(ctx, inner, info, value)
        }
        TypeRef::List(inner) => complete_list(ctx, inner, info, value),
        TypeRef::Named(name) => {
            let Some(meta) = ctx.schema().lookup_type(name) else {
                return AsyncValue::error(ExecutionError::UnknownType { name: name.clone() });
            };
            if value.is_null() {
                return AsyncValue::ready(ResponseValue::Null);
            }
            match meta {
                MetaType::Scalar(scalar) => {
                    if !matches!(info.kind, PlanKind::ResolveValue) {
                        return kind_error(info, "ResolveValue");
                    }
                    AsyncValue::ready(
                        scalar
                            .coerce_output(&value)
                            .map(ResponseValue::from)
                            .unwrap_or(ResponseValue::Null),
                    )
                }
                MetaType::Enum(enum_type) => {
                    if !matches!(info.kind, PlanKind::ResolveValue) {
                        return kind_error(info, "ResolveValue");
                    }
                    let completed = coerce_string_value(&value)
                        .and_then(|name| enum_type.value(name))
                        .map(|value| ResponseValue::Enum(value.name.clone()))
                        .unwrap_or(ResponseValue::Null);
                    AsyncValue::ready(completed)
                }
                MetaType::Object(object) => {
                    let PlanKind::SelectFields(subfields) = &info.kind else {
                        return kind_error(info, "SelectFields");
                    };
                    execute_fields(ctx.env.clone(), object.name.clone(), value, subfields)
                        .map(ResponseValue::Object)
                }
                MetaType::Interface(interface) => {
                    let PlanKind::ResolveAbstraction(type_map) = &info.kind else {
                        return kind_error(info, "ResolveAbstraction");
                    };
                    let concrete = match resolve_concrete_type(
                        ctx,
                        &interface.name,
                        interface.resolve_type.as_ref(),
                        &value,
                    ) {
                        Ok(concrete) => concrete,
                        Err(error) => return AsyncValue::error(error),
                    };
                    let Some(subfields) = type_map.get(&concrete) else {
                        return AsyncValue::error(ExecutionError::UnimplementedInterface {
                            interface: interface.name.clone(),
                            ty: concrete,
                        });
                    };
                    execute_fields(ctx.env.clone(), concrete, value, subfields)
                        .map(ResponseValue::Object)
                }
                MetaType::Union(union) => {
                    let PlanKind::ResolveAbstraction(type_map) = &info.kind else {
                        return kind_error(info, "ResolveAbstraction");
                    };
                    // An explicit resolver inspects the raw tagged value.
                    // The default resolver matches against the unwrapped
                    // payload, which is also what the case's fields resolve
                    // against.
                    let (concrete, value) = if union.resolve_type.is_some() {
                        let concrete = resolve_concrete_type(
                            ctx,
                            &union.name,
                            union.resolve_type.as_ref(),
                            &value,
                        );
                        (concrete, unwrap_union_value(union, value))
                    } else {
                        let value = unwrap_union_value(union, value);
                        let concrete = resolve_concrete_type(ctx, &union.name, None, &value);
                        (concrete, value)
                    };
                    let concrete = match concrete {
                        Ok(concrete) => concrete,
                        Err(error) => return AsyncValue::error(error),
                    };
                    let Some(subfields) = type_map.get(&concrete) else {
                        return AsyncValue::error(ExecutionError::UnknownUnionCase {
                            union: union.name.clone(),
                            ty: concrete,
                        });
                    };
                    execute_fields(ctx.env.clone(), concrete, value, subfields)
                        .map(ResponseValue::Object)
                }
                MetaType::InputObject(_) => {
                    AsyncValue::error(ExecutionError::UnexpectedOutputType { name: name.clone() })
                }
            }
        }
    }
}

/// Complete a list position: each element recurses under the plan's element
/// node, concurrently, and the results keep input order. A string is one
/// value, not a sequence of characters.
fn complete_list(
    ctx: &ResolveFieldContext,
    inner: &TypeRef,
    info: &Arc<ExecutionInfo>,
    value: ConstValue,
) -> AsyncValue<ResponseValue> {
    let PlanKind::ResolveCollection(element) = &info.kind else {
        return kind_error(info, "ResolveCollection");
    };
    let items = match value {
        ConstValue::List(items) => items,
        ConstValue::String(string) => vec![ConstValue::String(string)],
        other => {
            return AsyncValue::error(ExecutionError::Field(Error::new(format!(
                "encountered a {} where a list was expected",
                other.kind_str()
            ))))
        }
    };
    let completed = items
        .into_iter()
        .map(|item| complete_value(ctx, inner, element, item))
        .collect();
    AsyncValue::collect_parallel(completed).map(ResponseValue::List)
}

/// Unwrap a tagged union value into the case's payload.
fn unwrap_union_value(union: &UnionType, value: ConstValue) -> ConstValue {
    match &union.resolve_value {
        Some(resolve_value) => resolve_value(value),
        None => value,
    }
}

/// Resolve the concrete object type of a value in an abstract position.
/// An explicit `resolve_type` wins; the default scans the possible types
/// and takes the first whose `is_type_of` accepts the value.
pub(crate) fn resolve_concrete_type(
    ctx: &ResolveFieldContext,
    abstract_type: &Name,
    resolve_type: Option<&ResolveTypeFn>,
    value: &ConstValue,
) -> ExecutionResult<Name> {
    let unresolved = || ExecutionError::UnresolvedAbstractType {
        abstract_type: abstract_type.clone(),
    };
    if let Some(resolve) = resolve_type {
        return resolve(value).ok_or_else(unresolved);
    }
    for possible in ctx.schema().possible_types(abstract_type) {
        if let Some(MetaType::Object(object)) = ctx.schema().lookup_type(possible) {
            if object
                .is_type_of
                .as_ref()
                .is_some_and(|is_type_of| is_type_of(value))
            {
                return Ok(object.name.clone());
            }
        }
    }
    Err(unresolved())
}

fn coerce_string_value(value: &ConstValue) -> Option<&str> {
    match value {
        ConstValue::String(string) => Some(string),
        ConstValue::Enum(name) => Some(name),
        _ => None,
    }
}

fn kind_error(info: &ExecutionInfo, expected: &'static str) -> AsyncValue<ResponseValue> {
    AsyncValue::error(ExecutionError::UnexpectedPlanKind {
        found: info.kind.kind_str(),
        expected,
    })
}
