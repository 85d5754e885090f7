//! Error types for the reporting backend client
//!
//! Provides error handling for:
//! - Transport failures (connection, HTTP status)
//! - Payload validation (shape mismatch against the expected contract)
//! - Missing resources (request not found)
//! - Per-item failures in lenient bulk listings

/// Errors raised by a [`Transport`](crate::transport::Transport)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Backend reported the resource missing
    #[error("resource not found: {0}")]
    NotFound(String),

    /// Backend answered with a non-success status
    #[error("unexpected status {code} from {path}")]
    Status { code: u16, path: String },

    /// Request could not be sent or the connection failed
    #[error("connection failed: {0}")]
    Connection(String),

    /// Response body was not JSON
    #[error("response body is not JSON: {0}")]
    Decode(String),

    /// Base URL cannot carry path segments
    #[error("invalid backend url: {0}")]
    InvalidUrl(String),
}

/// Location of an invalid field inside a payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Path to the field, e.g. `commonProblems[2].problemIds[0].docId`
    pub path: String,
    /// What is wrong with it
    pub message: String,
}

impl FieldError {
    /// Create field error
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Prefix the path with a field name
    #[must_use]
    pub fn within(mut self, field: &str) -> Self {
        self.path = join_path(field, &self.path);
        self
    }

    /// Prefix the path with an array index
    #[must_use]
    pub fn at_index(mut self, index: usize) -> Self {
        self.path = join_path(&format!("[{index}]"), &self.path);
        self
    }
}

fn join_path(prefix: &str, rest: &str) -> String {
    if rest.is_empty() {
        prefix.to_string()
    } else if rest.starts_with('[') {
        format!("{prefix}{rest}")
    } else {
        format!("{prefix}.{rest}")
    }
}

/// Payload does not conform to the endpoint contract
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid payload from {endpoint} at '{path}': {message}")]
pub struct ValidationError {
    /// Endpoint that produced the payload
    pub endpoint: &'static str,
    /// Path to the offending field; `.` for the payload root
    pub path: String,
    /// What is wrong
    pub message: String,
}

impl ValidationError {
    /// Create validation error
    pub fn new(endpoint: &'static str, path: impl Into<String>, message: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            endpoint,
            path: if path.is_empty() { ".".to_string() } else { path },
            message: message.into(),
        }
    }

    /// Attach an endpoint to a field error
    pub fn from_field(endpoint: &'static str, field: FieldError) -> Self {
        Self::new(endpoint, field.path, field.message)
    }
}

/// One element of a bulk listing failed validation
///
/// Never returned as `Err`: bulk listings drop the element and report it
/// alongside the valid subset.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("item {index} skipped: {source}")]
pub struct PartialItemError {
    /// Position of the element in the payload array
    pub index: usize,
    /// Why it was rejected
    #[source]
    pub source: ValidationError,
}

/// Combined client error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReportError {
    /// Payload shape mismatch
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Referenced request or document does not exist
    #[error("not found: {resource}")]
    NotFound { resource: String },

    /// Transport failure
    #[error("network error: {0}")]
    Network(String),
}

impl ReportError {
    /// Create not-found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Whether the error should be shown to the user as a failure notice
    #[inline]
    #[must_use]
    pub fn is_user_visible(&self) -> bool {
        true
    }

    /// No operation is retried automatically
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        false
    }
}

impl From<TransportError> for ReportError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::NotFound(resource) => Self::NotFound { resource },
            TransportError::Decode(message) => {
                Self::Validation(ValidationError::new("transport", ".", message))
            }
            other => Self::Network(other.to_string()),
        }
    }
}

/// Result type alias for client operations
pub type ReportResult<T> = Result<T, ReportError>;
