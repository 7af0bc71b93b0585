//! Graph-specific error types.

use mc_core::{ElementId, McError, QuantityId};

pub type GraphResult<T> = Result<T, GraphError>;

/// Which boundary pair a connection is unifying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    Pressure,
    Flow,
}

impl std::fmt::Display for LinkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkKind::Pressure => write!(f, "pressure"),
            LinkKind::Flow => write!(f, "flow"),
        }
    }
}

/// Network assembly errors. All of them are configuration errors: they are
/// raised before integration starts and are not recoverable.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphError {
    /// Neither side of a connection defines the shared quantity.
    AmbiguousConnection {
        upstream: String,
        downstream: String,
        kind: LinkKind,
    },

    /// A quantity was given both a differential and an algebraic rule.
    ConflictingRule { quantity: String },

    /// Two distinct quantities would carry the same canonical name.
    DuplicateName { name: String },

    /// Name not present in the registry.
    UnknownQuantity { name: String },

    /// Quantity handle refers to an empty or merged arena slot.
    StaleQuantity { id: QuantityId },

    /// Element handle out of range.
    UnknownElement { id: ElementId },

    /// Time grid or other foundation-level validation failure.
    Core(McError),
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphError::AmbiguousConnection {
                upstream,
                downstream,
                kind,
            } => {
                write!(
                    f,
                    "Definition of {} between elements {} and {} is ambiguous",
                    kind, upstream, downstream
                )
            }
            GraphError::ConflictingRule { quantity } => {
                write!(
                    f,
                    "Quantity {} cannot be both differential and algebraic",
                    quantity
                )
            }
            GraphError::DuplicateName { name } => {
                write!(f, "Quantity name {} is already registered", name)
            }
            GraphError::UnknownQuantity { name } => {
                write!(f, "Quantity {} not found in registry", name)
            }
            GraphError::StaleQuantity { id } => {
                write!(f, "Quantity handle {} no longer refers to a live quantity", id)
            }
            GraphError::UnknownElement { id } => {
                write!(f, "Element {} does not exist", id)
            }
            GraphError::Core(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for GraphError {}

impl From<McError> for GraphError {
    fn from(err: McError) -> Self {
        GraphError::Core(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambiguous_message_names_both_sides() {
        let err = GraphError::AmbiguousConnection {
            upstream: "Aorta".into(),
            downstream: "Arteries".into(),
            kind: LinkKind::Flow,
        };
        let msg = err.to_string();
        assert!(msg.contains("flow"));
        assert!(msg.contains("Aorta"));
        assert!(msg.contains("ambiguous"));
    }
}
