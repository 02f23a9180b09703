//! Query execution core of the GraphQL engine.
//!
//! This crate takes a pre-built, validated execution plan against a
//! compiled schema, together with client-supplied variables and a root
//! value, and produces an ordered, serialisable result tree. Parsing,
//! validation, planning and transport live in their own crates; this one
//! owns input coercion, resolver dispatch, type-directed completion,
//! abstract-type resolution and per-field error isolation.
//!
//! ```
//! use std::sync::Arc;
//!
//! use engine_core::{
//!     evaluate, ConstValue, ErrorSink, ExecutionInfo, ExecutionPlan, FieldNode, MetaField,
//!     ObjectType, Operation, PlanKind, Registry, Resolver, Variables,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = Arc::new(
//!     Registry::new("Query")
//!         .with_type(ObjectType::new(
//!             "Query",
//!             [MetaField::new("hello", "String!").with_resolver(Resolver::property("hello"))],
//!         ))
//!         .compile()?,
//! );
//! let plan = ExecutionPlan::new(
//!     Operation::query(),
//!     vec![Arc::new(ExecutionInfo::new(
//!         FieldNode::new("hello"),
//!         PlanKind::ResolveValue,
//!     ))],
//! );
//! let errors = ErrorSink::new();
//! let root = ConstValue::from_json(serde_json::json!({"hello": "world"}));
//! let result = evaluate(schema, &plan, Variables::new(), root, &errors).await?;
//! assert_eq!(result.to_string(), r#"{ hello: "world" }"#);
//! # Ok(())
//! # }
//! ```

pub mod async_value;
pub mod context;
pub mod directives;
pub mod error;
pub mod plan;
pub mod registry;
pub mod resolver_utils;
pub mod response;
pub mod value;

pub use async_value::AsyncValue;
pub use context::{ErrorSink, ExecutionContext, ResolveFieldContext};
pub use error::{Error, ExecutionError, ExecutionResult, Result, SchemaError, ServerError};
pub use plan::{
    DirectiveNode, ExecutionInfo, ExecutionPlan, FieldNode, Operation, OperationType, PlanKind,
    Strategy, VariableDefinition,
};
pub use registry::{
    CompiledSchema, EnumType, InputObjectType, InterfaceType, MetaEnumValue, MetaField,
    MetaInputValue, MetaType, ObjectType, Registry, Resolver, ScalarType, TypeRef, UnionType,
};
pub use resolver_utils::evaluate;
pub use response::{ResponseMap, ResponseValue};
pub use value::{ConstValue, Name, Number, Value, Variables};
