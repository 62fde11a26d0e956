//! Error types for hh-db

use thiserror::Error;

/// SQLSTATE codes raised when a created object is already present
const ALREADY_EXISTS_CODES: &[&str] = &[
    "42P04", // duplicate_database
    "42P06", // duplicate_schema
    "42P07", // duplicate_table
    "42701", // duplicate_column
    "42710", // duplicate_object
    "42723", // duplicate_function
];

/// SQLSTATE and PostgREST codes for a missing relation or function
const NOT_FOUND_CODES: &[&str] = &[
    "42P01",    // undefined_table
    "42883",    // undefined_function
    "PGRST202", // rpc function not in schema cache
    "PGRST205", // table not in schema cache
];

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// The backend answered with an error payload (D002)
    #[error("[D002] SQL execution failed (HTTP {status}{}): {message}", code_suffix(.code))]
    Remote {
        status: u16,
        code: Option<String>,
        message: String,
        details: Option<String>,
        hint: Option<String>,
    },

    /// Response could not be interpreted (D003)
    #[error("[D003] Invalid response from database: {0}")]
    InvalidResponse(String),

    /// Endpoint URL is unusable (D004)
    #[error("[D004] Invalid database endpoint '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },

    /// Request exceeded the configured timeout (D005)
    #[error("[D005] Database request timed out: {0}")]
    Timeout(String),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

/// Coarse classification of a database error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The object being created already exists
    AlreadyExists,
    /// A referenced relation or function does not exist
    NotFound,
    /// Anything else
    Other,
}

impl DbError {
    /// Classify this error.
    ///
    /// Uses the SQLSTATE / PostgREST code when the backend returned one.
    /// Without a code, falls back to matching the message text.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DbError::Remote { code, message, .. } => match code.as_deref() {
                Some(c) if ALREADY_EXISTS_CODES.contains(&c) => ErrorKind::AlreadyExists,
                Some(c) if NOT_FOUND_CODES.contains(&c) => ErrorKind::NotFound,
                Some(_) => ErrorKind::Other,
                None => classify_message(message),
            },
            _ => ErrorKind::Other,
        }
    }

    /// Whether the message says a relation or function does not exist
    pub fn mentions_missing(&self) -> bool {
        self.to_string().to_lowercase().contains("does not exist")
    }
}

fn code_suffix(code: &Option<String>) -> String {
    code.as_deref()
        .map(|c| format!(", code {c}"))
        .unwrap_or_default()
}

fn classify_message(message: &str) -> ErrorKind {
    let msg = message.to_lowercase();
    if msg.contains("already exists") {
        ErrorKind::AlreadyExists
    } else if msg.contains("does not exist") {
        ErrorKind::NotFound
    } else {
        ErrorKind::Other
    }
}
