//! Evaluation of the `@skip` and `@include` directives.
//!
//! A selection is included iff none of its directives excludes it. The
//! result is a pure function of the coerced variables, so planning
//! pre-binds it into each plan node.

use std::sync::Arc;

use crate::{
    error::{ExecutionError, ExecutionResult},
    plan::DirectiveNode,
    value::{ConstValue, Value, Variables},
};

/// The pre-bound inclusion predicate of a plan node.
pub type IncludeFn = Arc<dyn Fn(&Variables) -> ExecutionResult<bool> + Send + Sync>;

/// Pre-bind the directives of a selection into an inclusion predicate.
/// Directives other than `@skip`/`@include` have no effect here.
pub fn build_include(directives: &[DirectiveNode]) -> IncludeFn {
    let conditions: Vec<DirectiveNode> = directives
        .iter()
        .filter(|directive| matches!(directive.name.as_str(), "skip" | "include"))
        .cloned()
        .collect();
    if conditions.is_empty() {
        return Arc::new(|_| Ok(true));
    }
    Arc::new(move |variables| {
        for directive in &conditions {
            let condition = eval_if(directive, variables)?;
            let excluded = match directive.name.as_str() {
                "skip" => condition,
                _ => !condition,
            };
            if excluded {
                return Ok(false);
            }
        }
        Ok(true)
    })
}

fn eval_if(directive: &DirectiveNode, variables: &Variables) -> ExecutionResult<bool> {
    let error = || ExecutionError::DirectiveArgument {
        directive: directive.name.clone(),
    };
    match directive.argument("if") {
        Some(Value::Variable(name)) => match variables.get(name) {
            Some(ConstValue::Boolean(condition)) => Ok(*condition),
            _ => Err(error()),
        },
        Some(value) => coerce_bool_input(value).ok_or_else(error),
        None => Err(error()),
    }
}

/// Coerce a literal AST value as a boolean.
pub(crate) fn coerce_bool_input(value: &Value) -> Option<bool> {
    match value {
        Value::Boolean(condition) => Some(*condition),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Name;

    fn vars(pairs: &[(&str, bool)]) -> Variables {
        pairs
            .iter()
            .map(|(name, value)| (Name::new(name), ConstValue::Boolean(*value)))
            .collect()
    }

    #[test]
    fn no_directives_always_includes() {
        let include = build_include(&[]);
        assert!(include(&Variables::new()).unwrap());
    }

    #[test]
    fn skip_and_include_literals() {
        let skip_true = build_include(&[DirectiveNode::new("skip")
            .with_argument("if", Value::Boolean(true))]);
        assert!(!skip_true(&Variables::new()).unwrap());

        let include_false = build_include(&[DirectiveNode::new("include")
            .with_argument("if", Value::Boolean(false))]);
        assert!(!include_false(&Variables::new()).unwrap());

        let both = build_include(&[
            DirectiveNode::new("skip").with_argument("if", Value::Boolean(false)),
            DirectiveNode::new("include").with_argument("if", Value::Boolean(true)),
        ]);
        assert!(both(&Variables::new()).unwrap());
    }

    #[test]
    fn variable_bound_condition_reads_coerced_variables() {
        let include = build_include(&[
            DirectiveNode::new("skip").with_argument("if", Value::Variable(Name::new("s")))
        ]);
        assert!(!include(&vars(&[("s", true)])).unwrap());
        assert!(include(&vars(&[("s", false)])).unwrap());
    }

    #[test]
    fn non_boolean_condition_names_the_directive() {
        let include = build_include(&[
            DirectiveNode::new("include").with_argument("if", Value::String("yes".into()))
        ]);
        match include(&Variables::new()) {
            Err(ExecutionError::DirectiveArgument { directive }) => {
                assert_eq!(directive.as_str(), "include");
            }
            other => panic!("expected a directive argument error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_directives_are_ignored() {
        let include = build_include(&[DirectiveNode::new("deprecated")]);
        assert!(include(&Variables::new()).unwrap());
    }
}
