//! Error types for element configuration.

use mc_graph::GraphError;
use thiserror::Error;

/// Errors raised while an element declares its equations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComponentError {
    #[error("Element {element}: solver needs at least the initial volume or pressure")]
    MissingInitialCondition { element: String },

    #[error("Non-physical parameter for {element}: {what}")]
    NonPhysical { element: String, what: &'static str },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error(transparent)]
    Graph(#[from] GraphError),
}

pub type ComponentResult<T> = Result<T, ComponentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ComponentError::MissingInitialCondition {
            element: "aorta".into(),
        };
        assert!(err.to_string().contains("aorta"));
    }

    #[test]
    fn graph_error_converts() {
        let err: ComponentError = GraphError::DuplicateName { name: "x".into() }.into();
        assert!(matches!(err, ComponentError::Graph(_)));
    }
}
