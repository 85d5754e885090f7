//! Session configuration
//!
//! Loaded from TOML, then overridden from the environment:
//!
//! | Variable | Field |
//! |---|---|
//! | `WR_BACKEND_URL` | `backend_url` |
//! | `WR_PAGE_SIZE` | `default_page_size` |
//! | `WR_LANGUAGE` | `description_language` |

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use wr_model::Language;

/// Which result a surface keeps when several queries race
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FencingPolicy {
    /// Whichever query settles last is shown
    #[default]
    LastSettled,
    /// A query settling after a newer one was applied is discarded
    LatestIssued,
}

/// Report session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Reporting backend base URL
    pub backend_url: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Page size a surface resets to after each query
    pub default_page_size: usize,
    /// Language of drill-down row descriptions
    pub description_language: Language,
    /// Maximum cached result sets per surface
    pub cache_capacity: u64,
    /// Optional expiry of cached result sets
    pub cache_ttl_secs: Option<u64>,
    /// Race policy for surfaces
    pub fencing: FencingPolicy,
}

impl ReportConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from TOML; missing fields take their defaults
    ///
    /// # Errors
    /// `ConfigError::Parse` or `ConfigError::Invalid`
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read from a TOML file
    ///
    /// # Errors
    /// `ConfigError::Io`, `ConfigError::Parse` or `ConfigError::Invalid`
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Apply `WR_*` overrides from the process environment
    ///
    /// # Errors
    /// `ConfigError::Invalid` if an override does not parse
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply `WR_*` overrides from a lookup function
    ///
    /// # Errors
    /// `ConfigError::Invalid` if an override does not parse
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(url) = lookup("WR_BACKEND_URL") {
            self.backend_url = url;
        }
        if let Some(size) = lookup("WR_PAGE_SIZE") {
            self.default_page_size = size
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid("default_page_size", size))?;
        }
        if let Some(language) = lookup("WR_LANGUAGE") {
            self.description_language = language
                .parse()
                .map_err(|e: wr_model::ModelError| ConfigError::invalid("description_language", e.to_string()))?;
        }
        self.validate()?;
        Ok(self)
    }

    /// With backend URL
    #[inline]
    #[must_use]
    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = url.into();
        self
    }

    /// With default page size
    #[inline]
    #[must_use]
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.default_page_size = size;
        self
    }

    /// With description language
    #[inline]
    #[must_use]
    pub fn with_language(mut self, language: Language) -> Self {
        self.description_language = language;
        self
    }

    /// With race policy
    #[inline]
    #[must_use]
    pub fn with_fencing(mut self, fencing: FencingPolicy) -> Self {
        self.fencing = fencing;
        self
    }

    /// With per-surface cache capacity
    #[inline]
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: u64) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Request timeout
    #[inline]
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Cache expiry, if any
    #[inline]
    #[must_use]
    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_secs.map(Duration::from_secs)
    }

    /// Check field ranges
    ///
    /// # Errors
    /// `ConfigError::Invalid` naming the first bad field
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend_url.trim().is_empty() {
            return Err(ConfigError::invalid("backend_url", "must not be empty"));
        }
        if self.default_page_size == 0 {
            return Err(ConfigError::invalid("default_page_size", "must be at least 1"));
        }
        if self.cache_capacity == 0 {
            return Err(ConfigError::invalid("cache_capacity", "must be at least 1"));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::invalid("request_timeout_secs", "must be at least 1"));
        }
        Ok(())
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:3000".to_string(),
            request_timeout_secs: 30,
            default_page_size: 5,
            description_language: Language::English,
            cache_capacity: 1_000,
            cache_ttl_secs: None,
            fencing: FencingPolicy::LastSettled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = ReportConfig::from_toml_str(
            r#"
            backend_url = "http://reports.internal:8080"
            fencing = "latest_issued"
            "#,
        )
        .unwrap();
        assert_eq!(config.backend_url, "http://reports.internal:8080");
        assert_eq!(config.fencing, FencingPolicy::LatestIssued);
        assert_eq!(config.default_page_size, 5);
        assert_eq!(config.description_language, Language::English);
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let err = ReportConfig::from_toml_str("default_page_size = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "default_page_size", .. }));
    }

    #[test]
    fn unknown_fencing_fails_to_parse() {
        let err = ReportConfig::from_toml_str(r#"fencing = "first""#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn overrides_apply_over_file_values() {
        let vars: HashMap<&str, &str> = [("WR_PAGE_SIZE", "20"), ("WR_LANGUAGE", "hi")].into();
        let config = ReportConfig::new()
            .with_overrides(|k| vars.get(k).map(|v| (*v).to_string()))
            .unwrap();
        assert_eq!(config.default_page_size, 20);
        assert_eq!(config.description_language, Language::Hindi);
        assert_eq!(config.backend_url, "http://localhost:3000");
    }

    #[test]
    fn bad_override_names_the_field() {
        let err = ReportConfig::new()
            .with_overrides(|k| (k == "WR_PAGE_SIZE").then(|| "lots".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "default_page_size", .. }));
    }

    #[test]
    fn reads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "request_timeout_secs = 5\ncache_ttl_secs = 60").unwrap();

        let config = ReportConfig::from_path(file.path()).unwrap();
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.cache_ttl(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ReportConfig::from_path("/nonexistent/wr.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
