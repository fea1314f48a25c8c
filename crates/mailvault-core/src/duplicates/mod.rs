//! Duplicate clusters: literal sequence references and canonical
//! promotion.

mod repository;

pub use repository::DuplicateTracker;

use thiserror::Error;

/// Reasons duplicate linkage can be refused.
#[derive(Debug, Error)]
pub enum DuplicateError {
    /// An email may not duplicate its own sequence id.
    #[error("email {seq} cannot duplicate itself")]
    SelfReference {
        /// Sequence id of the email.
        seq: String,
    },

    /// A canonical email may not also be recorded as a duplicate; the
    /// duplicate graph is a forest rooted at canonical emails.
    #[error("email {seq} is canonical and cannot be linked as a duplicate")]
    AlreadyCanonical {
        /// Sequence id of the email.
        seq: String,
    },

    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
