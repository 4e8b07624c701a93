use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeskError {
    /// Malformed rate structure: bad tier ordering, misplaced unbounded
    /// tier, negative price or fixed charge. Raised before computation.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Rejected input: negative consumption, negative bill amount, or an
    /// unrecognized enumeration value at the boundary.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Principal role insufficient for the requested operation.
    #[error("Authorization error: role '{role}' lacks '{required}' access")]
    Authorization { role: String, required: String },

    /// The audit store failed to commit. Retriable by the caller; an
    /// unrecorded privileged action must not be reported as success.
    #[error("Persistence error: {0}")]
    Persistence(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type DeskResult<T> = Result<T, DeskError>;
