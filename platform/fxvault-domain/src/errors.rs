use thiserror::Error;

/// Failure taxonomy shared by every store and resampling operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A point lookup matched no chunk. Range queries return an empty series instead.
    #[error("not found: {what}")]
    NotFound { what: String },

    /// The backing store could not be reached or failed mid-operation.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Input rejected before any write took place.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
}

impl StoreError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedInput(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::StorageUnavailable(msg.into())
    }

    /// Fatal errors abort a batch; `NotFound` is informational.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::NotFound { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::StoreError;

    #[test]
    fn display_includes_category() {
        let err = StoreError::unavailable("connection refused");
        assert_eq!(err.to_string(), "storage unavailable: connection refused");
        assert!(err.is_fatal());
        assert!(!StoreError::not_found("EURUSD close 2005-01").is_fatal());
    }
}
