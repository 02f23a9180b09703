//! The pre-computed execution plan this core consumes.
//!
//! Plans are produced by the planner (an external collaborator): fragments
//! are already flattened, every selection is typed, and `@skip`/`@include`
//! are pre-bound into each node's inclusion predicate.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::{
    directives::{self, IncludeFn},
    error::ExecutionResult,
    value::{ConstValue, Name, Value, Variables},
};

use crate::registry::TypeRef;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationType {
    Query,
    Mutation,
    Subscription,
}

/// A variable declared by the operation.
#[derive(Clone, Debug)]
pub struct VariableDefinition {
    pub name: Name,
    pub ty: TypeRef,
    pub default_value: Option<ConstValue>,
}

impl VariableDefinition {
    pub fn new(name: impl Into<Name>, ty: impl Into<TypeRef>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            default_value: None,
        }
    }

    pub fn with_default(self, default: ConstValue) -> Self {
        Self {
            default_value: Some(default),
            ..self
        }
    }
}

/// The operation the plan was built from.
#[derive(Clone, Debug)]
pub struct Operation {
    pub ty: OperationType,
    pub name: Option<Name>,
    pub variable_definitions: Vec<VariableDefinition>,
}

impl Operation {
    pub fn query() -> Self {
        Self::new(OperationType::Query)
    }

    pub fn mutation() -> Self {
        Self::new(OperationType::Mutation)
    }

    pub fn new(ty: OperationType) -> Self {
        Self {
            ty,
            name: None,
            variable_definitions: Vec::new(),
        }
    }

    pub fn with_name(self, name: impl Into<Name>) -> Self {
        Self {
            name: Some(name.into()),
            ..self
        }
    }

    pub fn with_variable(mut self, definition: VariableDefinition) -> Self {
        self.variable_definitions.push(definition);
        self
    }
}

/// A directive as it appears on a field in the document.
#[derive(Clone, Debug)]
pub struct DirectiveNode {
    pub name: Name,
    pub arguments: Vec<(Name, Value)>,
}

impl DirectiveNode {
    pub fn new(name: impl Into<Name>) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
        }
    }

    pub fn with_argument(mut self, name: impl Into<Name>, value: Value) -> Self {
        self.arguments.push((name.into(), value));
        self
    }

    pub fn argument(&self, name: &str) -> Option<&Value> {
        self.arguments
            .iter()
            .find(|(argument, _)| argument.as_str() == name)
            .map(|(_, value)| value)
    }
}

/// The field AST node a plan node was built from: name, alias, argument
/// literals and directives.
#[derive(Clone, Debug)]
pub struct FieldNode {
    pub name: Name,
    pub alias: Option<Name>,
    pub arguments: Vec<(Name, Value)>,
    pub directives: Vec<DirectiveNode>,
}

impl FieldNode {
    pub fn new(name: impl Into<Name>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            arguments: Vec::new(),
            directives: Vec::new(),
        }
    }

    pub fn with_alias(self, alias: impl Into<Name>) -> Self {
        Self {
            alias: Some(alias.into()),
            ..self
        }
    }

    pub fn with_argument(mut self, name: impl Into<Name>, value: Value) -> Self {
        self.arguments.push((name.into(), value));
        self
    }

    pub fn with_directive(mut self, directive: DirectiveNode) -> Self {
        self.directives.push(directive);
        self
    }

    /// The key this field resolves under in the response.
    pub fn response_key(&self) -> &Name {
        self.alias.as_ref().unwrap_or(&self.name)
    }
}

/// How a plan node's resolved value is shaped into the response.
#[derive(Clone)]
pub enum PlanKind {
    /// An object sub-selection.
    SelectFields(Vec<Arc<ExecutionInfo>>),
    /// A list; the inner plan completes each element.
    ResolveCollection(Arc<ExecutionInfo>),
    /// An interface or union position: per-concrete-type sub-selections.
    ResolveAbstraction(IndexMap<Name, Vec<Arc<ExecutionInfo>>>),
    /// A leaf (scalar or enum).
    ResolveValue,
}

impl PlanKind {
    pub(crate) fn kind_str(&self) -> &'static str {
        match self {
            PlanKind::SelectFields(_) => "SelectFields",
            PlanKind::ResolveCollection(_) => "ResolveCollection",
            PlanKind::ResolveAbstraction(_) => "ResolveAbstraction",
            PlanKind::ResolveValue => "ResolveValue",
        }
    }
}

/// One node of the execution plan, corresponding to one response key.
pub struct ExecutionInfo {
    /// The response key (the field's alias, or its name).
    pub identifier: Name,
    /// The schema field this selection resolves.
    pub field_name: Name,
    pub node: FieldNode,
    pub kind: PlanKind,
    include: IncludeFn,
}

impl ExecutionInfo {
    pub fn new(node: FieldNode, kind: PlanKind) -> Self {
        let include = directives::build_include(&node.directives);
        Self {
            identifier: node.response_key().clone(),
            field_name: node.name.clone(),
            node,
            kind,
            include,
        }
    }

    /// Whether this selection is included under the given variables.
    pub fn include(&self, variables: &Variables) -> ExecutionResult<bool> {
        (self.include)(variables)
    }
}

/// The top-level collection discipline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// All top-level fields are scheduled concurrently (queries,
    /// subscriptions).
    Parallel,
    /// Each top-level field runs only after the previous one has fully
    /// completed (mutations).
    Sequential,
}

/// A complete, validated plan for one operation.
pub struct ExecutionPlan {
    pub operation: Operation,
    pub fields: Vec<Arc<ExecutionInfo>>,
    pub strategy: Strategy,
}

impl ExecutionPlan {
    /// Build a plan; the strategy follows the operation type (mutations are
    /// sequential, everything else parallel).
    pub fn new(operation: Operation, fields: Vec<Arc<ExecutionInfo>>) -> Self {
        let strategy = match operation.ty {
            OperationType::Mutation => Strategy::Sequential,
            OperationType::Query | OperationType::Subscription => Strategy::Parallel,
        };
        Self {
            operation,
            fields,
            strategy,
        }
    }

    pub fn with_strategy(self, strategy: Strategy) -> Self {
        Self { strategy, ..self }
    }
}
