//! Coercion of variables and argument literals against input types.
//!
//! [`compile_by_type`] is the compile-pass half: it validates an input type
//! position and returns the coercer closure attached to it. The closure
//! walks nullable/list wrappers and dispatches on the named type, resolving
//! variable references against the request's coerced variables as it goes.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::{
    error::{Error, ExecutionError, ExecutionResult, Result, SchemaError},
    plan::{Operation, VariableDefinition},
    registry::{CompiledSchema, EnumType, MetaInputValue, MetaType, Registry, TypeRef},
    value::{ConstValue, Name, Value, Variables},
};

/// A compiled input coercer: `(variables, ast value) -> coerced value`.
/// `Ok(None)` means the value coerced to null (absent variable or explicit
/// null); the caller decides whether a default fills the gap.
pub type InputCoercer =
    Arc<dyn Fn(&Variables, &Value) -> Result<Option<ConstValue>> + Send + Sync>;

/// An argument definition paired with its compiled coercer.
#[derive(Clone)]
pub(crate) struct CompiledArgument {
    pub(crate) definition: MetaInputValue,
    pub(crate) coerce: InputCoercer,
}

/// Validate an input type position and build its coercer. `prefix` is baked
/// into every error message the coercer produces.
pub(crate) fn compile_by_type(
    prefix: String,
    ty: TypeRef,
    registry: Arc<Registry>,
) -> std::result::Result<InputCoercer, SchemaError> {
    let name = ty.named_type();
    match registry.lookup_type(name) {
        None => {
            return Err(SchemaError::UnknownType {
                prefix,
                name: name.clone(),
            })
        }
        Some(meta) if !meta.is_input_kind() => {
            return Err(SchemaError::NotAnInputType {
                prefix,
                name: name.clone(),
            })
        }
        Some(_) => {}
    }
    Ok(Arc::new(move |variables, value| {
        coerce_input(&registry, &prefix, &ty, variables, value)
    }))
}

/// Coerce one AST value against an input type.
pub(crate) fn coerce_input(
    registry: &Registry,
    prefix: &str,
    ty: &TypeRef,
    variables: &Variables,
    value: &Value,
) -> Result<Option<ConstValue>> {
    let lowered = match value {
        Value::Variable(name) => variables.get(name).cloned(),
        other => Some(lower_value(other, variables)),
    };
    match lowered {
        None | Some(ConstValue::Null) => Ok(None),
        Some(value) => coerce_present(registry, prefix, "", ty, value, true).map(Some),
    }
}

/// Resolve variable references recursively; an unbound variable lowers to
/// null.
fn lower_value(value: &Value, variables: &Variables) -> ConstValue {
    match value {
        Value::Variable(name) => variables.get(name).cloned().unwrap_or(ConstValue::Null),
        Value::Null => ConstValue::Null,
        Value::Number(number) => ConstValue::Number(number.clone()),
        Value::String(string) => ConstValue::String(string.clone()),
        Value::Boolean(boolean) => ConstValue::Boolean(*boolean),
        Value::Enum(name) => ConstValue::Enum(name.clone()),
        Value::List(items) => ConstValue::List(
            items
                .iter()
                .map(|item| lower_value(item, variables))
                .collect(),
        ),
        Value::Object(fields) => ConstValue::Object(
            fields
                .iter()
                .map(|(key, value)| (key.clone(), lower_value(value, variables)))
                .collect(),
        ),
    }
}

fn coerce_present(
    registry: &Registry,
    prefix: &str,
    path: &str,
    ty: &TypeRef,
    value: ConstValue,
    allow_list_coercion: bool,
) -> Result<ConstValue> {
    match ty {
        TypeRef::Nullable(inner) => {
            if value.is_null() {
                return Ok(ConstValue::Null);
            }
            coerce_present(registry, prefix, path, inner, value, allow_list_coercion)
        }
        _ if value.is_null() => Err(input_error(prefix, path, "unexpected null value")),
        TypeRef::List(inner) => match value {
            ConstValue::List(items) => {
                // Nested list coercion only wraps single values, per the
                // spec's list input coercion rule.
                let allow = items.len() <= 1;
                let items = items
                    .into_iter()
                    .enumerate()
                    .map(|(index, item)| {
                        coerce_present(
                            registry,
                            prefix,
                            &join_path(path, &index.to_string()),
                            inner,
                            item,
                            allow,
                        )
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(ConstValue::List(items))
            }
            value if allow_list_coercion => Ok(ConstValue::List(vec![coerce_present(
                registry, prefix, path, inner, value, true,
            )?])),
            _ => Err(input_error(prefix, path, "expected a list")),
        },
        TypeRef::Named(name) => {
            let meta = registry.lookup_type(name).ok_or_else(|| {
                input_error(prefix, path, &format!("unknown type '{name}'"))
            })?;
            match meta {
                MetaType::Scalar(scalar) => scalar
                    .parse_input(value)
                    .map_err(|error| input_error(prefix, path, &error.message)),
                MetaType::Enum(enum_type) => coerce_enum(enum_type, value)
                    .map_err(|message| input_error(prefix, path, &message)),
                MetaType::InputObject(input_object) => match value {
                    ConstValue::Object(mut provided) => {
                        let mut coerced = IndexMap::with_capacity(input_object.input_fields.len());
                        for field in input_object.input_fields.values() {
                            let field_path = join_path(path, &field.name);
                            match provided.shift_remove(field.name.as_str()) {
                                Some(ConstValue::Null) => {
                                    if !field.ty.is_nullable() {
                                        return Err(input_error(
                                            prefix,
                                            &field_path,
                                            "unexpected null value",
                                        ));
                                    }
                                    coerced.insert(field.name.clone(), ConstValue::Null);
                                }
                                Some(value) => {
                                    let value = coerce_present(
                                        registry,
                                        prefix,
                                        &field_path,
                                        &field.ty,
                                        value,
                                        true,
                                    )?;
                                    coerced.insert(field.name.clone(), value);
                                }
                                None => match &field.default_value {
                                    Some(default) => {
                                        coerced.insert(field.name.clone(), default.clone());
                                    }
                                    None if !field.ty.is_nullable() => {
                                        return Err(input_error(
                                            prefix,
                                            &field_path,
                                            "a value is required but none was provided",
                                        ));
                                    }
                                    None => {}
                                },
                            }
                        }
                        Ok(ConstValue::Object(coerced))
                    }
                    _ => Err(input_error(prefix, path, "expected an object")),
                },
                _ => Err(input_error(
                    prefix,
                    path,
                    &format!("'{name}' is not an input type"),
                )),
            }
        }
    }
}

fn coerce_enum(enum_type: &EnumType, value: ConstValue) -> std::result::Result<ConstValue, String> {
    let name = match &value {
        ConstValue::Enum(name) => name.as_str(),
        ConstValue::String(string) => string.as_str(),
        other => return Err(format!("expected an enum, not a {}", other.kind_str())),
    };
    match enum_type.value(name) {
        Some(value) => Ok(ConstValue::Enum(value.name.clone())),
        None => Err(format!("unknown enum value '{name}'")),
    }
}

fn join_path(path: &str, segment: &str) -> String {
    if path.is_empty() {
        segment.to_string()
    } else {
        format!("{path}.{segment}")
    }
}

fn input_error(prefix: &str, path: &str, message: &str) -> Error {
    if path.is_empty() {
        Error::new(format!("{prefix}{message}"))
    } else {
        Error::new(format!("{prefix}{message} for '{path}'"))
    }
}

/// Coerce the request's variables against the operation's declarations.
///
/// With no supplied variables only the defaulted declarations are coerced
/// (against an empty variable map); otherwise every declaration is.
pub(crate) fn coerce_variables(
    schema: &CompiledSchema,
    operation: &Operation,
    variables: &Variables,
) -> ExecutionResult<Variables> {
    let mut coerced = Variables::new();
    let definitions: Vec<&VariableDefinition> = if variables.is_empty() {
        operation
            .variable_definitions
            .iter()
            .filter(|definition| definition.default_value.is_some())
            .collect()
    } else {
        operation.variable_definitions.iter().collect()
    };
    for definition in definitions {
        if let Some(value) = coerce_variable(schema, definition, variables)? {
            coerced.insert(definition.name.clone(), value);
        }
    }
    Ok(coerced)
}

/// Coerce one variable; variable coercion failures are structural and fail
/// the request before any field executes.
pub(crate) fn coerce_variable(
    schema: &CompiledSchema,
    definition: &VariableDefinition,
    variables: &Variables,
) -> ExecutionResult<Option<ConstValue>> {
    let structural = |error: Error| ExecutionError::Variable {
        name: definition.name.clone(),
        error,
    };
    let supplied = match variables.get(&definition.name) {
        Some(ConstValue::Null) | None => None,
        Some(value) => Some(value.clone()),
    };
    match supplied.or_else(|| definition.default_value.clone()) {
        Some(value) => coerce_present(schema.registry(), "", "", &definition.ty, value, true)
            .map(Some)
            .map_err(structural),
        None if !definition.ty.is_nullable() => Err(structural(Error::new(
            "a value is required but none was provided",
        ))),
        None => Ok(None),
    }
}

/// Coerce a field's arguments per its definitions: a provided argument that
/// coerces to null falls back to the definition's default, a missing one
/// takes the default if any, and absent-with-no-default omits the key.
pub(crate) fn get_argument_values(
    arguments: &[CompiledArgument],
    ast_arguments: &[(Name, Value)],
    variables: &Variables,
) -> Result<Variables> {
    let mut values = Variables::new();
    for argument in arguments {
        let provided = ast_arguments
            .iter()
            .find(|(name, _)| *name == argument.definition.name)
            .map(|(_, value)| value);
        let coerced = match provided {
            Some(value) => (argument.coerce)(variables, value)?,
            None => None,
        };
        if let Some(value) = coerced.or_else(|| argument.definition.default_value.clone()) {
            values.insert(argument.definition.name.clone(), value);
        }
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::registry::InputObjectType;

    fn registry() -> Arc<Registry> {
        Arc::new(
            Registry::new("Query").with_type(InputObjectType::new(
                "Filter",
                [
                    MetaInputValue::new("name", "String!"),
                    MetaInputValue::new("limit", "Int").with_default(ConstValue::from(10)),
                    MetaInputValue::new("tags", "[String!]"),
                ],
            )),
        )
    }

    fn coercer(ty: &str) -> InputCoercer {
        compile_by_type(
            "Object 'Query': field 'q': argument 'a': ".into(),
            TypeRef::from(ty),
            registry(),
        )
        .unwrap()
    }

    fn argument(ty: &str, default: Option<ConstValue>) -> CompiledArgument {
        let mut definition = MetaInputValue::new("a", ty);
        definition.default_value = default;
        CompiledArgument {
            definition,
            coerce: coercer(ty),
        }
    }

    #[test]
    fn missing_argument_takes_the_default() {
        let arguments = [argument("Int", Some(ConstValue::from(3)))];
        let values = get_argument_values(&arguments, &[], &Variables::new()).unwrap();
        assert_eq!(values.get("a"), Some(&ConstValue::from(3)));
    }

    #[test]
    fn null_coerced_argument_takes_the_default() {
        let arguments = [argument("Int", Some(ConstValue::from(3)))];
        let ast = [(Name::new("a"), Value::Variable(Name::new("unbound")))];
        let values = get_argument_values(&arguments, &ast, &Variables::new()).unwrap();
        assert_eq!(values.get("a"), Some(&ConstValue::from(3)));

        let ast = [(Name::new("a"), Value::Null)];
        let values = get_argument_values(&arguments, &ast, &Variables::new()).unwrap();
        assert_eq!(values.get("a"), Some(&ConstValue::from(3)));
    }

    #[test]
    fn provided_argument_wins_over_the_default() {
        let arguments = [argument("Int", Some(ConstValue::from(3)))];
        let ast = [(Name::new("a"), Value::Number(7.into()))];
        let values = get_argument_values(&arguments, &ast, &Variables::new()).unwrap();
        assert_eq!(values.get("a"), Some(&ConstValue::from(7)));
    }

    #[test]
    fn absent_with_no_default_omits_the_key() {
        let arguments = [argument("Int", None)];
        let values = get_argument_values(&arguments, &[], &Variables::new()).unwrap();
        assert!(values.get("a").is_none());
    }

    #[test]
    fn input_objects_apply_field_defaults() {
        let arguments = [argument("Filter!", None)];
        let ast = [(
            Name::new("a"),
            Value::Object(
                [(Name::new("name"), Value::String("ada".into()))]
                    .into_iter()
                    .collect(),
            ),
        )];
        let values = get_argument_values(&arguments, &ast, &Variables::new()).unwrap();
        assert_eq!(
            values.get("a"),
            Some(&ConstValue::from_json(json!({"name": "ada", "limit": 10})))
        );
    }

    #[test]
    fn missing_required_input_field_is_an_error() {
        let arguments = [argument("Filter!", None)];
        let ast = [(Name::new("a"), Value::Object(IndexMap::new()))];
        let error = get_argument_values(&arguments, &ast, &Variables::new()).unwrap_err();
        assert_eq!(
            error.message,
            "Object 'Query': field 'q': argument 'a': a value is required but none was provided for 'name'"
        );
    }

    #[test]
    fn single_values_coerce_to_single_element_lists() {
        let arguments = [argument("[String!]", None)];
        let ast = [(Name::new("a"), Value::String("x".into()))];
        let values = get_argument_values(&arguments, &ast, &Variables::new()).unwrap();
        assert_eq!(
            values.get("a"),
            Some(&ConstValue::from(vec![ConstValue::from("x")]))
        );
    }

    #[test]
    fn unknown_argument_type_fails_compilation_with_the_prefix() {
        let error = match compile_by_type(
            "Object 'Query': field 'q': argument 'a': ".into(),
            TypeRef::from("Missing!"),
            registry(),
        ) {
            Err(error) => error,
            Ok(_) => panic!("expected compile_by_type to fail"),
        };
        assert_eq!(
            error.to_string(),
            "Object 'Query': field 'q': argument 'a': unknown type 'Missing'"
        );
    }

    #[test]
    fn variables_resolve_inside_nested_literals() {
        let arguments = [argument("Filter!", None)];
        let ast = [(
            Name::new("a"),
            Value::Object(
                [
                    (Name::new("name"), Value::Variable(Name::new("who"))),
                    (Name::new("tags"), Value::Variable(Name::new("tags"))),
                ]
                .into_iter()
                .collect(),
            ),
        )];
        let variables: Variables = [
            (Name::new("who"), ConstValue::from("ada")),
            (Name::new("tags"), ConstValue::from(vec!["x", "y"])),
        ]
        .into_iter()
        .collect();
        let values = get_argument_values(&arguments, &ast, &variables).unwrap();
        assert_eq!(
            values.get("a"),
            Some(&ConstValue::from_json(
                json!({"name": "ada", "limit": 10, "tags": ["x", "y"]})
            ))
        );
    }
}
