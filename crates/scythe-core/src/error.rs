//! Core error types.

use thiserror::Error;

/// Errors raised while resolving relationships, building deletion trees,
/// or executing them against a store.
#[derive(Debug, Error)]
pub enum Error {
    /// No relationship with the given name or target table exists.
    #[error("association `{name}` is not defined on entity `{entity}`")]
    AssociationNotDefined {
        /// Entity the lookup started from.
        entity: String,
        /// Requested relationship or table name.
        name: String,
    },

    /// The relationship runs through an intermediate entity and cannot be
    /// traversed by the deletion engine.
    #[error("association `{name}` on entity `{entity}` runs through an intermediate entity and cannot be cascaded; add the intermediate step to the plan instead")]
    ThroughNotSupported {
        /// Entity the relationship is declared on.
        entity: String,
        /// The through relationship's name.
        name: String,
    },

    /// Two inferred reverse relationships collided on the same name.
    #[error("entity `{source_entity}` references `{entity}` through more than one foreign key; declare the relationship explicitly")]
    AmbiguousReverse {
        /// Entity whose relationship set was being resolved.
        entity: String,
        /// Entity holding the colliding references.
        source_entity: String,
    },

    /// No entity with the given name or table exists in the catalog.
    #[error("entity `{name}` is not defined in the catalog")]
    EntityNotFound {
        /// Requested entity or table name.
        name: String,
    },

    /// A before hook, after hook, or custom handler failed.
    #[error("hook error: {0}")]
    Hook(String),

    /// Storage layer error.
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Invalid data format.
    #[error("invalid data: {0}")]
    InvalidData(String),
}
