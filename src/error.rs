use thiserror::Error;

/// Failures of the key-value persistence layer.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage quota exceeded while writing '{key}' ({needed} bytes, quota {quota})")]
    QuotaExceeded {
        key: String,
        needed: usize,
        quota: usize,
    },

    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored data is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Failures talking to the login endpoint. Only two classes are surfaced to the user.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Cannot connect to the server. Please ensure the backend is running.")]
    Connection(#[source] reqwest::Error),

    #[error("{message}")]
    Rejected { status: u16, message: String },
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("duplicate course id '{0}' in catalog")]
    DuplicateCourse(String),
}

/// Failures of the library's own setup. Runtime failures of storage, login and
/// the catalog keep their own types.
#[derive(Debug, Error)]
pub enum PortalError {
    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T, E = PortalError> = std::result::Result<T, E>;
