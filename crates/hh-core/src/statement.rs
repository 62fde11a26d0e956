//! Schema document model and statement splitting
//!
//! The splitter is deliberately naive: it cuts on every `;` character and
//! does not understand string literals, dollar-quoted bodies, or comments.
//! A statement containing a literal `;` is split into several fragments.

use crate::error::{CoreError, CoreResult};
use std::path::{Path, PathBuf};

/// Prefix marking a comment-only fragment
const COMMENT_PREFIX: &str = "--";

/// Full text of a SQL schema file
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    /// Where the document was loaded from, if it came from disk
    pub path: Option<PathBuf>,

    /// Raw document text
    pub text: String,
}

impl SchemaDocument {
    /// Wrap in-memory schema text
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            path: None,
            text: text.into(),
        }
    }

    /// Read a schema file as UTF-8 text
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::SchemaNotFound {
                path: path.display().to_string(),
            });
        }

        let text = std::fs::read_to_string(path).map_err(|e| CoreError::SchemaUnreadable {
            path: path.display().to_string(),
            source: e,
        })?;
        log::debug!("Loaded schema {} ({} bytes)", path.display(), text.len());

        Ok(Self {
            path: Some(path.to_path_buf()),
            text,
        })
    }

    /// Statements that would be executed, in document order
    pub fn statements(&self) -> Vec<Statement> {
        split_statements(&self.text)
    }
}

/// One `;`-delimited SQL command extracted from a schema document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// 1-based position among the executable statements
    pub index: usize,

    body: String,
}

impl Statement {
    /// Trimmed fragment text without the terminating semicolon
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Statement text re-terminated with `;`, as sent to the database
    pub fn sql(&self) -> String {
        format!("{};", self.body)
    }

    /// First line of the statement, shortened for progress output
    pub fn summary(&self, max_chars: usize) -> String {
        let first_line = self.body.lines().next().unwrap_or_default().trim();
        if first_line.chars().count() <= max_chars {
            first_line.to_string()
        } else {
            let cut: String = first_line.chars().take(max_chars).collect();
            format!("{}...", cut)
        }
    }
}

/// Split schema text into executable statements.
///
/// Fragments that are empty after trimming, or that start with `--`, are
/// dropped. The comment check looks at the whole fragment, so a fragment
/// made of a leading comment line followed by SQL is dropped as well.
pub fn split_statements(text: &str) -> Vec<Statement> {
    text.split(';')
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty() && !fragment.starts_with(COMMENT_PREFIX))
        .enumerate()
        .map(|(i, fragment)| Statement {
            index: i + 1,
            body: fragment.to_string(),
        })
        .collect()
}

#[cfg(test)]
#[path = "statement_test.rs"]
mod tests;
