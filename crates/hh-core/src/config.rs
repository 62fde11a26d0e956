//! Settings file parsing and credential resolution
//!
//! Credentials always come from the environment. Everything else has a
//! default and may be overridden by `househelp.yml` and then by CLI flags.

use crate::error::{CoreError, CoreResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Endpoint URL variable used by the web application
pub const URL_VAR: &str = "NEXT_PUBLIC_SUPABASE_URL";

/// Server-side alias for the endpoint URL
pub const URL_FALLBACK_VAR: &str = "SUPABASE_URL";

/// Privileged (service role) key variable
pub const SERVICE_KEY_VAR: &str = "SUPABASE_SERVICE_ROLE_KEY";

/// Lower-privilege key used when no service role key is present
pub const ANON_KEY_VAR: &str = "NEXT_PUBLIC_SUPABASE_ANON_KEY";

/// How per-statement failures affect the rest of the run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplyMode {
    /// Log the failure and continue with the next statement
    #[default]
    Lenient,
    /// Stop at the first failure that is not an "already exists" condition
    Strict,
}

impl std::fmt::Display for ApplyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApplyMode::Lenient => write!(f, "lenient"),
            ApplyMode::Strict => write!(f, "strict"),
        }
    }
}

/// Applier settings from househelp.yml
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Schema file, relative to the project directory
    #[serde(default = "default_schema_path")]
    pub schema_path: String,

    /// Remote procedure that executes raw SQL
    #[serde(default = "default_rpc_function")]
    pub rpc_function: String,

    /// Failure policy
    #[serde(default)]
    pub mode: ApplyMode,

    /// Sentinel table queried to guess the cause of an unclassified error
    #[serde(default)]
    pub probe_table: Option<String>,

    /// Per-request timeout in seconds (none: wait indefinitely)
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_schema_path() -> String {
    "supabase-schema.sql".to_string()
}

fn default_rpc_function() -> String {
    "exec_sql".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_path: default_schema_path(),
            rpc_function: default_rpc_function(),
            mode: ApplyMode::default(),
            probe_table: None,
            timeout_secs: None,
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::SettingsNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let settings: Settings = serde_yaml::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a project directory.
    /// Looks for househelp.yml or househelp.yaml and falls back to defaults.
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("househelp.yml");
        let yaml_path = dir.join("househelp.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            log::debug!("No settings file in {}, using defaults", dir.display());
            Ok(Self::default())
        }
    }

    fn validate(&self) -> CoreResult<()> {
        if self.rpc_function.trim().is_empty() {
            return Err(CoreError::SettingsInvalid {
                message: "rpc_function cannot be empty".to_string(),
            });
        }
        if self.schema_path.trim().is_empty() {
            return Err(CoreError::SettingsInvalid {
                message: "schema_path cannot be empty".to_string(),
            });
        }
        if self.timeout_secs == Some(0) {
            return Err(CoreError::SettingsInvalid {
                message: "timeout_secs must be greater than zero".to_string(),
            });
        }
        if matches!(&self.probe_table, Some(t) if t.trim().is_empty()) {
            return Err(CoreError::SettingsInvalid {
                message: "probe_table cannot be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Absolute schema path for a project directory
    pub fn schema_path_absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.schema_path)
    }
}

/// Which variable supplied the API key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    ServiceRole,
    Anon,
}

/// Endpoint and key for the hosted backend
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub endpoint_url: String,
    pub privileged_key: String,
    pub key_source: KeySource,
}

// Keys must never reach logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("endpoint_url", &self.endpoint_url)
            .field("privileged_key", &"<redacted>")
            .field("key_source", &self.key_source)
            .finish()
    }
}

impl Credentials {
    /// Resolve credentials from the process environment
    pub fn from_env() -> CoreResult<Self> {
        resolve_credentials(|name| std::env::var(name).ok())
    }

    /// True when only the anon key was available
    pub fn is_fallback_key(&self) -> bool {
        self.key_source == KeySource::Anon
    }
}

/// Resolve credentials through `lookup`.
///
/// Priority: `NEXT_PUBLIC_SUPABASE_URL` > `SUPABASE_URL` for the endpoint,
/// `SUPABASE_SERVICE_ROLE_KEY` > `NEXT_PUBLIC_SUPABASE_ANON_KEY` for the key.
/// Blank values are treated as unset.
pub fn resolve_credentials<F>(lookup: F) -> CoreResult<Credentials>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| {
        lookup(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let endpoint_url = get(URL_VAR).or_else(|| get(URL_FALLBACK_VAR));
    let key = get(SERVICE_KEY_VAR)
        .map(|k| (k, KeySource::ServiceRole))
        .or_else(|| get(ANON_KEY_VAR).map(|k| (k, KeySource::Anon)));

    match (endpoint_url, key) {
        (Some(endpoint_url), Some((privileged_key, key_source))) => Ok(Credentials {
            endpoint_url,
            privileged_key,
            key_source,
        }),
        (url, key) => {
            let mut missing = Vec::new();
            if url.is_none() {
                missing.push(URL_VAR);
            }
            if key.is_none() {
                missing.push(SERVICE_KEY_VAR);
            }
            Err(CoreError::MissingCredentials { missing })
        }
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
