//! Error types for the model graph and the action dispatcher
//!
//! Domain errors use thiserror; action bodies return `anyhow::Result` and are
//! wrapped into [`ModelError::Action`] where the dispatcher runs them.

use thiserror::Error;

use super::entity::EntityId;

/// Top-level model error
#[derive(Debug, Error)]
pub enum ModelError {
    /// Dispatcher contract errors
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// A registered action failed while running on an entity
    #[error("Action {registration} failed on entity {entity}: {source}")]
    Action {
        /// Entity the action was running on
        entity: EntityId,
        /// Registration entity that owns the action
        registration: EntityId,
        /// Error raised by the action body
        #[source]
        source: anyhow::Error,
    },

    /// Entity not present in the graph
    #[error("Entity {0} not found")]
    EntityNotFound(EntityId),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A reconciliation was started for an entity that is already reconciling
    #[error("Entity {0} is already being reconciled")]
    ReentrantReconciliation(EntityId),

    /// Too many actions executed inside one reconciliation scope
    #[error("Drain limit of {limit} actions exceeded while reconciling entity {entity}")]
    DrainLimitExceeded {
        /// Entity being reconciled
        entity: EntityId,
        /// Configured limit
        limit: usize,
    },
}

/// Convenience result alias for dispatcher internals
pub type DispatchResult<T> = std::result::Result<T, DispatchError>;

/// Result type using ModelError
pub type Result<T> = std::result::Result<T, ModelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_error_keeps_source() {
        let err = ModelError::Action {
            entity: EntityId::new(3),
            registration: EntityId::new(7),
            source: anyhow::anyhow!("boom"),
        };

        assert_eq!(err.to_string(), "Action #7 failed on entity #3: boom");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_dispatch_error_converts() {
        let err: ModelError = DispatchError::ReentrantReconciliation(EntityId::new(1)).into();
        assert!(matches!(
            err,
            ModelError::Dispatch(DispatchError::ReentrantReconciliation(_))
        ));
    }
}
