//! Interface and union dispatch: concrete-type resolution, per-case
//! sub-selections, tagged value unwrapping and the failure modes.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::json;

use engine_core::{
    evaluate, ConstValue, ErrorSink, ExecutionError, ExecutionInfo, ExecutionPlan, FieldNode,
    InterfaceType, MetaField, Name, ObjectType, Operation, PlanKind, Registry, Resolver, UnionType,
    Variables,
};

fn info(node: FieldNode, kind: PlanKind) -> Arc<ExecutionInfo> {
    Arc::new(ExecutionInfo::new(node, kind))
}

fn leaf(name: &str) -> Arc<ExecutionInfo> {
    info(FieldNode::new(name), PlanKind::ResolveValue)
}

fn node_schema() -> Registry {
    Registry::new("Query")
        .with_type(ObjectType::new(
            "Query",
            [MetaField::new("node", "Node!").with_resolver(Resolver::property("node"))],
        ))
        .with_type(
            ObjectType::new(
                "User",
                [MetaField::new("name", "String!").with_resolver(Resolver::property("name"))],
            )
            .with_is_type_of(|value| value.get("name").is_some()),
        )
        .with_type(
            ObjectType::new(
                "Post",
                [MetaField::new("title", "String!").with_resolver(Resolver::property("title"))],
            )
            .with_is_type_of(|value| value.get("title").is_some()),
        )
        .with_type(InterfaceType::new("Node", ["User", "Post"]))
}

fn node_type_map() -> IndexMap<Name, Vec<Arc<ExecutionInfo>>> {
    [
        (Name::new("User"), vec![leaf("name")]),
        (Name::new("Post"), vec![leaf("title")]),
    ]
    .into_iter()
    .collect()
}

#[tokio::test]
async fn interface_dispatch_selects_the_matching_case() {
    let schema = Arc::new(node_schema().compile().unwrap());
    let plan = ExecutionPlan::new(
        Operation::query(),
        vec![info(
            FieldNode::new("node"),
            PlanKind::ResolveAbstraction(node_type_map()),
        )],
    );
    let errors = ErrorSink::new();
    let root = ConstValue::from_json(json!({"node": {"name": "Ada"}}));

    let result = evaluate(schema.clone(), &plan, Variables::new(), root, &errors)
        .await
        .unwrap();
    assert_eq!(result.into_json(), json!({"node": {"name": "Ada"}}));

    let root = ConstValue::from_json(json!({"node": {"title": "On Computable Numbers"}}));
    let result = evaluate(schema, &plan, Variables::new(), root, &errors)
        .await
        .unwrap();
    assert_eq!(
        result.into_json(),
        json!({"node": {"title": "On Computable Numbers"}})
    );
    assert!(errors.is_empty());
}

#[tokio::test]
async fn an_explicit_resolve_type_wins_over_is_type_of() {
    let schema = Arc::new(
        node_schema()
            .with_type(
                InterfaceType::new("Node", ["User", "Post"]).with_resolve_type(|value| {
                    value.get("kind").and_then(|kind| match kind {
                        ConstValue::String(kind) => Some(Name::new(kind)),
                        _ => None,
                    })
                }),
            )
            .compile()
            .unwrap(),
    );
    let plan = ExecutionPlan::new(
        Operation::query(),
        vec![info(
            FieldNode::new("node"),
            PlanKind::ResolveAbstraction(node_type_map()),
        )],
    );
    let errors = ErrorSink::new();
    // `name` would match User's is_type_of, but the explicit resolver says
    // Post.
    let root = ConstValue::from_json(
        json!({"node": {"kind": "Post", "name": "x", "title": "A Title"}}),
    );

    let result = evaluate(schema, &plan, Variables::new(), root, &errors)
        .await
        .unwrap();
    assert_eq!(result.into_json(), json!({"node": {"title": "A Title"}}));
}

#[tokio::test]
async fn an_unmatched_value_fails_naming_the_interface() {
    let schema = Arc::new(node_schema().compile().unwrap());
    let plan = ExecutionPlan::new(
        Operation::query(),
        vec![info(
            FieldNode::new("node"),
            PlanKind::ResolveAbstraction(node_type_map()),
        )],
    );
    let errors = ErrorSink::new();
    let root = ConstValue::from_json(json!({"node": {"neither": true}}));

    let error = evaluate(schema, &plan, Variables::new(), root, &errors)
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        ExecutionError::UnresolvedAbstractType { ref abstract_type }
            if abstract_type.as_str() == "Node"
    ));
}

#[tokio::test]
async fn a_case_missing_from_the_plan_is_fatal() {
    let schema = Arc::new(node_schema().compile().unwrap());
    let type_map: IndexMap<Name, Vec<Arc<ExecutionInfo>>> =
        [(Name::new("User"), vec![leaf("name")])].into_iter().collect();
    let plan = ExecutionPlan::new(
        Operation::query(),
        vec![info(
            FieldNode::new("node"),
            PlanKind::ResolveAbstraction(type_map),
        )],
    );
    let errors = ErrorSink::new();
    let root = ConstValue::from_json(json!({"node": {"title": "orphan"}}));

    let error = evaluate(schema, &plan, Variables::new(), root, &errors)
        .await
        .unwrap_err();

    assert_eq!(
        error.to_string(),
        "interface 'Node' is not implemented by type 'Post'"
    );
}

#[tokio::test]
async fn an_explicit_union_resolver_sees_the_raw_tagged_value() {
    let schema = Arc::new(
        Registry::new("Query")
            .with_type(ObjectType::new(
                "Query",
                [MetaField::new("shape", "Shape!").with_resolver(Resolver::property("shape"))],
            ))
            .with_type(ObjectType::new(
                "Circle",
                [MetaField::new("radius", "Int!").with_resolver(Resolver::property("radius"))],
            ))
            .with_type(ObjectType::new(
                "Square",
                [MetaField::new("side", "Int!").with_resolver(Resolver::property("side"))],
            ))
            .with_type(
                UnionType::new("Shape", ["Circle", "Square"])
                    // The tag only exists on the wrapped value; the payload
                    // carries no case marker, so this resolver can only
                    // succeed if it runs before the unwrap.
                    .with_resolve_type(|value| {
                        value.get("tag").and_then(|tag| match tag {
                            ConstValue::String(tag) => Some(Name::new(tag)),
                            _ => None,
                        })
                    })
                    .with_resolve_value(|value| value.get("payload").cloned().unwrap_or(value)),
            )
            .compile()
            .unwrap(),
    );
    let type_map: IndexMap<Name, Vec<Arc<ExecutionInfo>>> = [
        (Name::new("Circle"), vec![leaf("radius")]),
        (Name::new("Square"), vec![leaf("side")]),
    ]
    .into_iter()
    .collect();
    let plan = ExecutionPlan::new(
        Operation::query(),
        vec![info(
            FieldNode::new("shape"),
            PlanKind::ResolveAbstraction(type_map),
        )],
    );
    let errors = ErrorSink::new();
    let root =
        ConstValue::from_json(json!({"shape": {"tag": "Circle", "payload": {"radius": 3}}}));

    let result = evaluate(schema, &plan, Variables::new(), root, &errors)
        .await
        .unwrap();

    // The tag chose the case, and the fields resolved against the payload.
    assert_eq!(result.into_json(), json!({"shape": {"radius": 3}}));
    assert!(errors.is_empty());
}

#[tokio::test]
async fn union_values_unwrap_through_resolve_value() {
    let schema = Arc::new(
        Registry::new("Query")
            .with_type(ObjectType::new(
                "Query",
                [MetaField::new("pet", "Pet!").with_resolver(Resolver::property("pet"))],
            ))
            .with_type(
                ObjectType::new(
                    "Dog",
                    [MetaField::new("barks", "Boolean!").with_resolver(Resolver::property("barks"))],
                )
                .with_is_type_of(|value| value.get("barks").is_some()),
            )
            .with_type(
                ObjectType::new(
                    "Cat",
                    [MetaField::new("meows", "Boolean!").with_resolver(Resolver::property("meows"))],
                )
                .with_is_type_of(|value| value.get("meows").is_some()),
            )
            .with_type(
                UnionType::new("Pet", ["Dog", "Cat"]).with_resolve_value(|value| {
                    value
                        .get("payload")
                        .cloned()
                        .unwrap_or(value)
                }),
            )
            .compile()
            .unwrap(),
    );
    let type_map: IndexMap<Name, Vec<Arc<ExecutionInfo>>> = [
        (Name::new("Dog"), vec![leaf("barks")]),
        (Name::new("Cat"), vec![leaf("meows")]),
    ]
    .into_iter()
    .collect();
    let plan = ExecutionPlan::new(
        Operation::query(),
        vec![info(
            FieldNode::new("pet"),
            PlanKind::ResolveAbstraction(type_map),
        )],
    );
    let errors = ErrorSink::new();
    let root = ConstValue::from_json(json!({"pet": {"tag": "Dog", "payload": {"barks": true}}}));

    let result = evaluate(schema, &plan, Variables::new(), root, &errors)
        .await
        .unwrap();

    assert_eq!(result.into_json(), json!({"pet": {"barks": true}}));
    assert!(errors.is_empty());
}
