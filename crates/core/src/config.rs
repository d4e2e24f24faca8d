//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. The core never reads process-wide environment variables itself;
//! the hosting binary collects raw values and hands them to the helpers below.

use crate::constants::DEFAULT_EXPORT_BASE_URL;
use crate::{FicheError, FicheResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    export_base_url: String,
    pathology_config_path: Option<PathBuf>,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// The export base URL is validated with [`validate_export_base_url`] and stored without a
    /// trailing slash.
    ///
    /// # Arguments
    ///
    /// * `export_base_url` - Origin of the media proxy route used by exported documents.
    /// * `pathology_config_path` - Optional generated config file replacing the built-in registry.
    ///
    /// # Errors
    ///
    /// Returns `FicheError::InvalidExportBaseUrl` if the URL is not an absolute http(s) URL.
    pub fn new(
        export_base_url: impl AsRef<str>,
        pathology_config_path: Option<PathBuf>,
    ) -> FicheResult<Self> {
        let export_base_url = validate_export_base_url(export_base_url.as_ref())?;

        Ok(Self {
            export_base_url,
            pathology_config_path,
        })
    }

    pub fn export_base_url(&self) -> &str {
        &self.export_base_url
    }

    pub fn pathology_config_path(&self) -> Option<&Path> {
        self.pathology_config_path.as_deref()
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            export_base_url: DEFAULT_EXPORT_BASE_URL.to_string(),
            pathology_config_path: None,
        }
    }
}

/// Validate an export base URL and return its normalised form.
///
/// The URL must parse as an absolute `http` or `https` URL with a host. Query strings and
/// fragments are rejected because the proxy route is appended to the value verbatim.
/// Trailing slashes are removed.
///
/// # Errors
///
/// Returns `FicheError::InvalidExportBaseUrl` describing the first failed check.
pub fn validate_export_base_url(value: &str) -> FicheResult<String> {
    let trimmed = value.trim();
    let invalid = |reason: &str| FicheError::InvalidExportBaseUrl {
        url: trimmed.to_string(),
        reason: reason.to_string(),
    };

    if trimmed.is_empty() {
        return Err(invalid("cannot be empty"));
    }

    let parsed = url::Url::parse(trimmed).map_err(|e| invalid(&e.to_string()))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if parsed.host_str().is_none() {
        return Err(invalid("missing host"));
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(invalid("must not contain a query or fragment"));
    }

    Ok(trimmed.trim_end_matches('/').to_string())
}

/// Parse the export base URL from an optional environment value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_EXPORT_BASE_URL`].
///
/// # Errors
///
/// Returns `FicheError::InvalidExportBaseUrl` if a non-empty value fails validation.
pub fn export_base_url_from_env_value(value: Option<String>) -> FicheResult<String> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        Some(v) => validate_export_base_url(&v),
        None => Ok(DEFAULT_EXPORT_BASE_URL.to_string()),
    }
}

/// Parse the pathology config override from an optional environment value.
///
/// Empty values mean "use the built-in registry".
pub fn pathology_config_path_from_env_value(value: Option<String>) -> Option<PathBuf> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}
