//! Error types for hh-core

use thiserror::Error;

/// Core error type for the schema applier
#[derive(Error, Debug)]
pub enum CoreError {
    /// C001: Required environment variables are missing
    #[error("[C001] Missing required environment variables: {}", .missing.join(", "))]
    MissingCredentials { missing: Vec<&'static str> },

    /// C002: Schema file does not exist
    #[error("[C002] Schema file not found: {path}")]
    SchemaNotFound { path: String },

    /// C003: Schema file exists but could not be read as UTF-8 text
    #[error("[C003] Failed to read schema file '{path}': {source}")]
    SchemaUnreadable {
        path: String,
        source: std::io::Error,
    },

    /// C004: Settings file not found
    #[error("[C004] Settings file not found: {path}")]
    SettingsNotFound { path: String },

    /// C005: Invalid settings value
    #[error("[C005] Invalid settings: {message}")]
    SettingsInvalid { message: String },

    /// C006: IO error with file path context
    #[error("[C006] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// C007: YAML parse error
    #[error("[C007] Settings parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
