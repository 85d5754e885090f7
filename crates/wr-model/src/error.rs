//! Error types for the report model

/// Errors raised while building model values from raw input
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Request status code outside the known lifecycle
    #[error("unknown request status code: {0}")]
    UnknownStatus(u8),

    /// Description language not supported
    #[error("unknown description language: '{0}'")]
    UnknownLanguage(String),
}
