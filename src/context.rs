//! Per-request and per-field execution state.

use std::{
    fmt::{self, Debug, Formatter},
    ops::Deref,
    sync::{Arc, Mutex},
};

use crate::{
    error::{Error, ServerError},
    plan::ExecutionInfo,
    registry::{CompiledSchema, TypeRef},
    value::{ConstValue, Name, Variables},
};

/// The append-only error collector of a request.
///
/// The sink is the only per-request mutable resource shared between field
/// tasks; it is cheap to clone and safe to append to from any of them.
#[derive(Clone, Default)]
pub struct ErrorSink(Arc<Mutex<Vec<ServerError>>>);

impl ErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, error: ServerError) {
        self.0.lock().expect("error sink poisoned").push(error);
    }

    /// Append a field error. An aggregated error contributes one entry per
    /// cause.
    pub(crate) fn report(&self, error: Error) {
        tracing::debug!(error = %error.message, "field error");
        match error.causes() {
            Some(causes) => {
                let mut entries = self.0.lock().expect("error sink poisoned");
                entries.extend(causes.iter().cloned().map(ServerError::from));
            }
            None => self.push(error.into()),
        }
    }

    pub fn len(&self) -> usize {
        self.0.lock().expect("error sink poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A snapshot of the collected errors.
    pub fn errors(&self) -> Vec<ServerError> {
        self.0.lock().expect("error sink poisoned").clone()
    }
}

impl Debug for ErrorSink {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ErrorSink").field(&self.errors()).finish()
    }
}

pub struct ExecutionContextInner {
    pub schema: Arc<CompiledSchema>,
    pub variables: Variables,
    pub root_value: ConstValue,
    pub errors: ErrorSink,
}

/// The shared environment of one request: the compiled schema, the coerced
/// variables, the root value and the error sink. Lives for the duration of
/// the request's async graph.
#[derive(Clone)]
pub struct ExecutionContext(Arc<ExecutionContextInner>);

impl ExecutionContext {
    pub fn new(
        schema: Arc<CompiledSchema>,
        variables: Variables,
        root_value: ConstValue,
        errors: ErrorSink,
    ) -> Self {
        Self(Arc::new(ExecutionContextInner {
            schema,
            variables,
            root_value,
            errors,
        }))
    }

    pub fn add_error(&self, error: Error) {
        self.errors.report(error);
    }
}

impl Deref for ExecutionContext {
    type Target = ExecutionContextInner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// The context handed to a single field's resolver. Created fresh per field
/// and cheap to clone; nothing in it is shared with sibling fields except
/// the request environment.
#[derive(Clone)]
pub struct ResolveFieldContext {
    pub env: ExecutionContext,
    pub info: Arc<ExecutionInfo>,
    pub parent_type: Name,
    pub return_type: TypeRef,
    /// The coerced arguments of this field, keyed by argument name.
    pub args: Variables,
}

impl ResolveFieldContext {
    pub fn schema(&self) -> &CompiledSchema {
        &self.env.schema
    }

    pub fn variables(&self) -> &Variables {
        &self.env.variables
    }

    /// The response key this field resolves under.
    pub fn response_key(&self) -> &Name {
        &self.info.identifier
    }

    pub fn add_error(&self, error: Error) {
        self.env.add_error(error);
    }

    /// Look up a coerced argument, `Null` if absent.
    pub fn arg(&self, name: &str) -> &ConstValue {
        const NULL: &ConstValue = &ConstValue::Null;
        self.args.get(name).unwrap_or(NULL)
    }
}
