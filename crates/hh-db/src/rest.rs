//! PostgREST backend: SQL through the `exec_sql` remote procedure

use crate::error::{DbError, DbResult};
use crate::traits::Database;
use async_trait::async_trait;
use hh_core::Credentials;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Request options for [`RestBackend`]
#[derive(Debug, Clone)]
pub struct RestOptions {
    /// Remote procedure that executes raw SQL
    pub rpc_function: String,

    /// Per-request timeout; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl Default for RestOptions {
    fn default() -> Self {
        Self {
            rpc_function: "exec_sql".to_string(),
            timeout: None,
        }
    }
}

/// Body sent to the SQL remote procedure
#[derive(Serialize)]
struct ExecSqlRequest<'a> {
    sql: &'a str,
}

/// Error payload returned by PostgREST
#[derive(Deserialize, Debug, Default)]
struct PostgrestError {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}

/// Hosted backend reached through its REST endpoint
pub struct RestBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    rpc_function: String,
}

impl RestBackend {
    /// Create a backend for the given credentials
    pub fn new(credentials: &Credentials, options: RestOptions) -> DbResult<Self> {
        let base_url = normalize_endpoint(&credentials.endpoint_url)?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| DbError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            api_key: credentials.privileged_key.clone(),
            rpc_function: options.rpc_function,
        })
    }

    /// Endpoint URL with any trailing slash removed
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn rpc_url(&self) -> String {
        format!("{}/rest/v1/rpc/{}", self.base_url, self.rpc_function)
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}?select=*&limit=1", self.base_url, table)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> DbResult<()> {
        let response = self.authorize(request).send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.map_err(transport_error)?;
        Err(remote_error(status, &body))
    }
}

#[async_trait]
impl Database for RestBackend {
    async fn execute_sql(&self, sql: &str) -> DbResult<()> {
        log::debug!("POST {} ({} bytes of SQL)", self.rpc_url(), sql.len());
        let request = self
            .client
            .post(self.rpc_url())
            .json(&ExecSqlRequest { sql });
        self.send(request).await
    }

    async fn probe_table(&self, table: &str) -> DbResult<()> {
        log::debug!("Probing sentinel table {}", table);
        let request = self.client.get(self.table_url(table));
        self.send(request).await
    }

    fn db_type(&self) -> &'static str {
        "postgrest"
    }
}

/// Validate an endpoint URL and strip trailing slashes
fn normalize_endpoint(url: &str) -> DbResult<String> {
    let parsed = reqwest::Url::parse(url).map_err(|e| DbError::InvalidEndpoint {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(DbError::InvalidEndpoint {
            url: url.to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }
    Ok(url.trim_end_matches('/').to_string())
}

fn transport_error(err: reqwest::Error) -> DbError {
    if err.is_timeout() {
        DbError::Timeout(err.to_string())
    } else {
        DbError::ConnectionError(err.to_string())
    }
}

/// Build a [`DbError::Remote`] from a non-2xx response body.
///
/// Bodies that are not PostgREST JSON keep their raw text as the message.
fn remote_error(status: reqwest::StatusCode, body: &str) -> DbError {
    let parsed: PostgrestError = serde_json::from_str(body).unwrap_or_default();
    let message = parsed.message.unwrap_or_else(|| {
        let text = body.trim();
        if text.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        } else {
            text.to_string()
        }
    });

    DbError::Remote {
        status: status.as_u16(),
        code: parsed.code,
        message,
        details: parsed.details,
        hint: parsed.hint,
    }
}

#[cfg(test)]
#[path = "rest_test.rs"]
mod tests;
