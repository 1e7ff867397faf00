//! Error types for AASX editing operations.

/// Result type alias for AASX operations.
pub type Result<T> = std::result::Result<T, AasxError>;

/// Main error type for the AASX editing core.
#[derive(Debug, thiserror::Error)]
pub enum AasxError {
    /// Identifier or reference lookup failed
    #[error("Not found: {kind} with id {id}")]
    NotFound { kind: String, id: String },

    /// Identifier collision on add, rename or clone
    #[error("Duplicate id: {kind} with id {id} already exists")]
    DuplicateId { kind: String, id: String },

    /// Invalid input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Best-effort remote mirror call failed
    #[error("Remote mirror failure: {0}")]
    RemoteMirror(String),

    /// Some recursive sub-clones or file copies failed
    #[error("Partial clone failure: {failed} of {attempted} steps failed")]
    PartialClone { attempted: usize, failed: usize },

    /// Supplementary file store errors
    #[error("Package error: {0}")]
    Package(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation aborted through a cancellation token
    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    /// Timeout errors
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// Wrapped anyhow errors for compatibility
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AasxError {
    /// Create a new not found error
    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Create a new duplicate id error
    pub fn duplicate_id(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self::DuplicateId {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Create a new invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new remote mirror error
    pub fn remote_mirror(msg: impl Into<String>) -> Self {
        Self::RemoteMirror(msg.into())
    }

    /// Create a new package error
    pub fn package(msg: impl Into<String>) -> Self {
        Self::Package(msg.into())
    }

    /// Create a new config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new cancellation error
    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    /// Create a new timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a duplicate id error
    pub fn is_duplicate_id(&self) -> bool {
        matches!(self, Self::DuplicateId { .. })
    }

    /// Check if this is a remote mirror error
    pub fn is_remote_mirror(&self) -> bool {
        matches!(self, Self::RemoteMirror(_))
    }

    /// Check if this error came from a cancelled operation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}
