//! Error types for report sessions
//!
//! Provides error handling for:
//! - Backend failures surfaced from the client
//! - Selections that do not match loaded data
//! - Operations on surfaces or views in the wrong state
//! - Configuration loading

use crate::state::ViewPhase;
use crate::surface::SurfaceKind;
use std::path::PathBuf;
use wr_client::ReportError;
use wr_model::{IssueTag, Ward};

/// Main session error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Backend operation failed
    #[error(transparent)]
    Report(#[from] ReportError),

    /// Ward has no analytics entry
    #[error("unknown ward: {0}")]
    UnknownWard(Ward),

    /// Issue is not reported in the selected ward
    #[error("issue '{issue}' not reported in ward {ward}")]
    UnknownIssue { ward: Ward, issue: IssueTag },

    /// Group key not present in the loaded report
    #[error("unknown group: {0}")]
    UnknownGroup(String),

    /// Issue slice selected with no ward selected
    #[error("no ward selected")]
    NoWardSelected,

    /// View needed by the operation has not been loaded
    #[error("{0} not loaded")]
    NotLoaded(&'static str),

    /// Page or page size of zero
    #[error("invalid page {page} (page size {page_size})")]
    InvalidPage { page: usize, page_size: usize },

    /// Operation needs an open surface
    #[error("{0} surface is closed")]
    SurfaceClosed(SurfaceKind),

    /// View state machine rejected a transition
    #[error("illegal view transition: {from:?} -> {to:?}")]
    IllegalTransition { from: ViewPhase, to: ViewPhase },
}

impl SessionError {
    /// Whether a failure notice should be raised
    ///
    /// Only backend failures are; the rest are caller mistakes.
    #[inline]
    #[must_use]
    pub fn is_user_visible(&self) -> bool {
        matches!(self, Self::Report(e) if e.is_user_visible())
    }

    /// Nothing is retried automatically
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        false
    }
}

/// Result type alias for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML did not parse into a config
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file could not be read
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Field value out of range
    #[error("invalid value for {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

impl ConfigError {
    /// Create invalid-field error
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}
