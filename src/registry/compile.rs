//! The one-shot schema compile pass.
//!
//! Consumes a [`Registry`] and produces an immutable [`CompiledSchema`]:
//! every object field gets its executor, every argument and input-object
//! field gets a validated coercer, and the possible types of each abstract
//! type are cached. After this pass the schema is frozen and shared by all
//! requests.

use std::{collections::HashMap, sync::Arc};

use indexmap::IndexMap;

use crate::{
    error::SchemaError,
    resolver_utils::{
        field::FieldExecutor,
        input::{self, CompiledArgument},
    },
    value::Name,
};

use super::{MetaType, Registry};

/// A registry with compiled executors, input coercers and the
/// possible-types cache. Immutable; shared by every request.
pub struct CompiledSchema {
    registry: Arc<Registry>,
    executors: HashMap<Name, IndexMap<Name, Arc<FieldExecutor>>>,
    possible_types: HashMap<Name, Vec<Name>>,
}

impl Registry {
    /// Compile the registry. Intended to run exactly once, before the first
    /// request.
    pub fn compile(self) -> Result<CompiledSchema, SchemaError> {
        let registry = Arc::new(self);

        expect_object(&registry, &registry.query_type)?;
        if let Some(name) = &registry.mutation_type {
            expect_object(&registry, name)?;
        }
        if let Some(name) = &registry.subscription_type {
            expect_object(&registry, name)?;
        }

        let mut executors = HashMap::new();
        let mut possible_types = HashMap::new();
        for (type_name, ty) in &registry.types {
            match ty {
                MetaType::Object(object) => {
                    let mut fields = IndexMap::with_capacity(object.fields.len());
                    for field in object.fields.values() {
                        let output_type = field.ty.named_type();
                        if registry.lookup_type(output_type).is_none() {
                            return Err(SchemaError::UnknownType {
                                prefix: format!(
                                    "Object '{type_name}': field '{}': ",
                                    field.name
                                ),
                                name: output_type.clone(),
                            });
                        }
                        let mut arguments = Vec::with_capacity(field.args.len());
                        for argument in field.args.values() {
                            let prefix = format!(
                                "Object '{type_name}': field '{}': argument '{}': ",
                                field.name, argument.name
                            );
                            let coerce = input::compile_by_type(
                                prefix,
                                argument.ty.clone(),
                                registry.clone(),
                            )?;
                            arguments.push(CompiledArgument {
                                definition: argument.clone(),
                                coerce,
                            });
                        }
                        fields.insert(
                            field.name.clone(),
                            Arc::new(FieldExecutor::new(object.name.clone(), field, arguments)),
                        );
                    }
                    executors.insert(type_name.clone(), fields);
                }
                MetaType::InputObject(input_object) => {
                    // Coercion of nested input fields re-walks the registry at
                    // run time; this pass only validates the slots.
                    for field in input_object.input_fields.values() {
                        let prefix = format!(
                            "Input object '{type_name}': in field '{}': ",
                            field.name
                        );
                        input::compile_by_type(prefix, field.ty.clone(), registry.clone())?;
                    }
                }
                MetaType::Interface(interface) => {
                    possible_types.insert(
                        type_name.clone(),
                        validate_possible_types(&registry, type_name, &interface.possible_types)?,
                    );
                }
                MetaType::Union(union) => {
                    possible_types.insert(
                        type_name.clone(),
                        validate_possible_types(&registry, type_name, &union.possible_types)?,
                    );
                }
                MetaType::Scalar(_) | MetaType::Enum(_) => {}
            }
        }

        Ok(CompiledSchema {
            registry,
            executors,
            possible_types,
        })
    }
}

fn expect_object(registry: &Registry, name: &Name) -> Result<(), SchemaError> {
    match registry.lookup_type(name) {
        None => Err(SchemaError::UnknownType {
            prefix: String::new(),
            name: name.clone(),
        }),
        Some(ty) if !ty.is_object() => Err(SchemaError::NotAnObjectType {
            prefix: String::new(),
            name: name.clone(),
        }),
        Some(_) => Ok(()),
    }
}

fn validate_possible_types(
    registry: &Registry,
    abstract_type: &Name,
    possible_types: &indexmap::IndexSet<Name>,
) -> Result<Vec<Name>, SchemaError> {
    let prefix = format!("Abstract type '{abstract_type}': ");
    possible_types
        .iter()
        .map(|name| match registry.lookup_type(name) {
            None => Err(SchemaError::UnknownType {
                prefix: prefix.clone(),
                name: name.clone(),
            }),
            Some(ty) if !ty.is_object() => Err(SchemaError::NotAnObjectType {
                prefix: prefix.clone(),
                name: name.clone(),
            }),
            Some(_) => Ok(name.clone()),
        })
        .collect()
}

impl CompiledSchema {
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn query_type(&self) -> &Name {
        &self.registry.query_type
    }

    pub fn mutation_type(&self) -> Option<&Name> {
        self.registry.mutation_type.as_ref()
    }

    pub fn subscription_type(&self) -> Option<&Name> {
        self.registry.subscription_type.as_ref()
    }

    pub fn lookup_type(&self, name: &str) -> Option<&MetaType> {
        self.registry.lookup_type(name)
    }

    pub(crate) fn executor(&self, ty: &str, field: &str) -> Option<&Arc<FieldExecutor>> {
        self.executors.get(ty)?.get(field)
    }

    /// The cached possible object types of an abstract type, in declaration
    /// order.
    pub fn possible_types(&self, name: &str) -> &[Name] {
        self.possible_types
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use crate::registry::{InterfaceType, MetaField, ObjectType};

    use super::*;

    #[test]
    fn unknown_output_type_fails_with_the_field_prefix() {
        let registry = Registry::new("Query").with_type(ObjectType::new(
            "Query",
            [MetaField::new("broken", "Missing!")],
        ));
        let error = match registry.compile() {
            Err(error) => error,
            Ok(_) => panic!("expected compile to fail"),
        };
        assert_eq!(
            error.to_string(),
            "Object 'Query': field 'broken': unknown type 'Missing'"
        );
    }

    #[test]
    fn missing_query_type_is_rejected() {
        let error = match Registry::new("Query").compile() {
            Err(error) => error,
            Ok(_) => panic!("expected compile to fail"),
        };
        assert_eq!(error.to_string(), "unknown type 'Query'");
    }

    #[test]
    fn possible_types_are_cached_in_declaration_order() {
        let schema = Registry::new("Query")
            .with_type(ObjectType::new("Query", [MetaField::new("node", "Node")]))
            .with_type(ObjectType::new("User", [MetaField::new("name", "String!")]))
            .with_type(ObjectType::new("Post", [MetaField::new("title", "String!")]))
            .with_type(InterfaceType::new("Node", ["User", "Post"]))
            .compile()
            .unwrap();
        let possible = schema.possible_types("Node");
        assert_eq!(possible.len(), 2);
        assert_eq!(possible[0].as_str(), "User");
        assert_eq!(possible[1].as_str(), "Post");
        assert!(schema.possible_types("User").is_empty());
    }
}
