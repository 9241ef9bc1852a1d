use thiserror::Error;

/// Result type for enclavekms operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the enclavekms library
///
/// The set is deliberately small and coarse: callers distinguish outcomes by
/// variant only, while the detail strings are logged for diagnosis.
#[derive(Error, Debug)]
pub enum Error {
    /// A caller-supplied parameter violated the operation contract.
    ///
    /// Returned before any network I/O takes place.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The context has not been initialized yet
    #[error("Context is not initialized")]
    NotInitialized,

    /// The context is already initialized
    #[error("Context is already initialized")]
    AlreadyInitialized,

    /// The remote client could not be created or reconnected
    #[error("KMS client creation failed: {0}")]
    ClientCreateFailed(String),

    /// A remote KMS or attestation call failed
    #[error("Remote call failed: {0}")]
    RemoteCallFailed(String),

    /// An allocation failed while preparing the output buffer
    #[error("Out of memory: {0}")]
    OutOfMemory(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidParameter("plaintext is empty".to_string());
        assert_eq!(err.to_string(), "Invalid parameter: plaintext is empty");

        assert_eq!(
            Error::NotInitialized.to_string(),
            "Context is not initialized"
        );
    }
}
