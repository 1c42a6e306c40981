use thiserror::Error;

use crate::plan::Action;

/// Error type returned by collaborators (lister, mutation sink).
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum ReconcileError {
    /// Listing failed. Nothing has been mutated.
    #[error("listing role bindings in namespace {namespace:?} failed: {source}")]
    Backend {
        namespace: String,
        #[source]
        source: CollaboratorError,
    },

    /// An update or delete failed. Mutations dispatched earlier in the same
    /// run stay committed.
    #[error("{action} of role binding {namespace}/{name} failed: {source}")]
    Mutation {
        namespace: String,
        name: String,
        action: Action,
        #[source]
        source: CollaboratorError,
    },
}

impl ReconcileError {
    pub fn is_backend(&self) -> bool {
        matches!(self, Self::Backend { .. })
    }

    /// Name of the binding whose mutation failed, if any.
    pub fn binding_name(&self) -> Option<&str> {
        match self {
            Self::Mutation { name, .. } => Some(name),
            Self::Backend { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReconcileError>;
