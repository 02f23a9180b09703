use std::{
    any::Any,
    fmt::{self, Debug, Display, Formatter},
    sync::Arc,
};

use crate::value::Name;

/// An error raised by a resolver or while completing a single field.
///
/// Field errors are rescued during execution: they are appended to the
/// request's error sink and the offending field completes to `null`,
/// leaving sibling fields untouched.
#[derive(Clone, serde::Serialize)]
pub struct Error {
    /// The error message.
    pub message: String,
    /// The source of the error.
    #[serde(skip)]
    pub source: Option<Arc<dyn Any + Send + Sync>>,
}

impl Error {
    /// Create an error from the given error message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create an error with a type that implements `Display`, and it will also set the
    /// `source` of the error to this value.
    pub fn new_with_source(source: impl Display + Send + Sync + 'static) -> Self {
        Self {
            message: source.to_string(),
            source: Some(Arc::new(source)),
        }
    }

    /// Bundle several independent failures into one error.
    ///
    /// When such an error reaches the sink it is unpacked again: every
    /// inner cause becomes its own entry.
    pub fn aggregate(causes: Vec<Error>) -> Self {
        Self {
            message: format!("{} errors occurred", causes.len()),
            source: Some(Arc::new(AggregateError(causes))),
        }
    }

    /// The individual causes of an aggregated error, if this is one.
    pub fn causes(&self) -> Option<&[Error]> {
        self.source
            .as_deref()
            .and_then(|source| source.downcast_ref::<AggregateError>())
            .map(|aggregate| aggregate.0.as_slice())
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.message.eq(&other.message)
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::new(value.to_string())
    }
}

/// A collection of failures carried as the `source` of a single [`Error`].
#[derive(Clone, Debug)]
pub struct AggregateError(pub Vec<Error>);

/// An alias for `Result<T, Error>`.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// An error entry of the per-request error sink.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ServerError {
    /// An explanatory message of the error.
    pub message: String,
}

impl ServerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for ServerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<Error> for ServerError {
    fn from(error: Error) -> Self {
        Self {
            message: error.message,
        }
    }
}

/// A failure of the execution machinery itself: a planner/executor mismatch,
/// schema misuse or an invalid variable set.
///
/// Unlike field errors these are programmer errors. They are never rescued;
/// they fail the whole evaluation.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    /// A field error escalated through the executor pipeline. Rescued at the
    /// field boundary, so it only surfaces from `evaluate` if raised outside
    /// any field (which the executor never does).
    #[error("{0}")]
    Field(Error),

    #[error("the plan provides a {found} node where a {expected} node was expected")]
    UnexpectedPlanKind {
        found: &'static str,
        expected: &'static str,
    },

    #[error("no resolver is defined for field '{field}' of type '{ty}'")]
    UndefinedResolver { ty: Name, field: Name },

    #[error("field '{field}' of type '{ty}' has no compiled executor")]
    UncompiledField { ty: Name, field: Name },

    #[error("interface '{interface}' is not implemented by type '{ty}'")]
    UnimplementedInterface { interface: Name, ty: Name },

    #[error("union '{union}' has no case for type '{ty}'")]
    UnknownUnionCase { union: Name, ty: Name },

    #[error("no possible type of '{abstract_type}' matched the resolved value")]
    UnresolvedAbstractType { abstract_type: Name },

    #[error("directive '{directive}' expects a Boolean 'if' argument")]
    DirectiveArgument { directive: Name },

    #[error("unknown type '{name}'")]
    UnknownType { name: Name },

    #[error("type '{name}' cannot appear in output position")]
    UnexpectedOutputType { name: Name },

    #[error("the schema does not define a {operation} type")]
    UndefinedOperationRoot { operation: &'static str },

    #[error("variable '{name}': {error}")]
    Variable { name: Name, error: Error },
}

/// An alias for `Result<T, ExecutionError>`.
pub type ExecutionResult<T> = std::result::Result<T, ExecutionError>;

/// An error raised by the schema compile pass.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("{prefix}unknown type '{name}'")]
    UnknownType { prefix: String, name: Name },

    #[error("{prefix}'{name}' is not an object type")]
    NotAnObjectType { prefix: String, name: Name },

    #[error("{prefix}'{name}' is not an input type")]
    NotAnInputType { prefix: String, name: Name },
}
