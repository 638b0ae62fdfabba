//! Process configuration, built once from the environment.
//!
//! # API pattern
//!
//! - [`Config::from_lookup`] — explicit variable lookup; used in tests
//! - [`Config::from_env`] — reads `std::env`, delegates to `from_lookup`
//!
//! Validation happens entirely inside construction: a `Config` value that
//! exists has a usable server address and a non-empty credential.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::error::ConfigError;
use crate::types::{BucketId, PasswordRules};

pub const SERVER_VAR: &str = "FX_REMOTE_SETTINGS_WRITER_SERVER";
pub const USER_VAR: &str = "FX_REMOTE_SETTINGS_WRITER_USER";
pub const PASS_VAR: &str = "FX_REMOTE_SETTINGS_WRITER_PASS";
pub const BUCKET_VAR: &str = "CREDSYNC_BUCKET";
pub const LEGACY_RULES_VAR: &str = "CREDSYNC_LEGACY_RULES_PATH";
pub const TIMEOUT_VAR: &str = "CREDSYNC_HTTP_TIMEOUT_SECS";
pub const BATCH_LIMIT_VAR: &str = "CREDSYNC_BATCH_LIMIT";
pub const REALMS_URL_VAR: &str = "CREDSYNC_REALMS_SOURCE_URL";
pub const RULES_URL_VAR: &str = "CREDSYNC_RULES_SOURCE_URL";
pub const GITHUB_TOKEN_VAR: &str = "GITHUB_TOKEN";

pub const DEFAULT_BUCKET: &str = "main-workspace";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Kinto's default `batch_max_requests`.
pub const DEFAULT_BATCH_LIMIT: usize = 25;
pub const DEFAULT_REALMS_URL: &str = "https://api.github.com/repos/apple/password-manager-resources/contents/quirks/websites-with-shared-credential-backends.json";
pub const DEFAULT_RULES_URL: &str = "https://api.github.com/repos/apple/password-manager-resources/contents/quirks/password-rules.json";

/// HTTP Basic credential for the Remote Settings writer.
#[derive(Clone)]
pub struct Credentials {
    pub user: String,
    pub password: SecretString,
}

impl Credentials {
    /// `user:password`, ready to be base64-encoded into a Basic header.
    pub fn basic_pair(&self) -> String {
        format!("{}:{}", self.user, self.password.expose_secret())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Everything a sync run needs to know before it touches the network.
#[derive(Debug, Clone)]
pub struct Config {
    /// Writer server root, e.g. `https://remote-settings.example/v1`. Never
    /// ends with `/`.
    pub server: String,
    pub credentials: Credentials,
    pub bucket: BucketId,
    pub legacy_rules_path: Option<PathBuf>,
    pub http_timeout: Duration,
    pub batch_limit: usize,
    pub realms_source_url: String,
    pub rules_source_url: String,
    pub github_token: Option<SecretString>,
}

impl Config {
    /// Build from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server = required(&lookup, SERVER_VAR)?;
        if !(server.starts_with("https://") || server.starts_with("http://")) {
            return Err(ConfigError::InvalidServer { value: server });
        }
        let server = server.trim_end_matches('/').to_string();

        let user = required(&lookup, USER_VAR)?;
        let password = required(&lookup, PASS_VAR)?;

        let bucket = optional(&lookup, BUCKET_VAR)
            .map(BucketId)
            .unwrap_or_else(|| BucketId::from(DEFAULT_BUCKET));
        let legacy_rules_path = optional(&lookup, LEGACY_RULES_VAR).map(PathBuf::from);
        let http_timeout = match optional(&lookup, TIMEOUT_VAR) {
            Some(raw) => Duration::from_secs(positive(TIMEOUT_VAR, raw)? as u64),
            None => DEFAULT_TIMEOUT,
        };
        let batch_limit = match optional(&lookup, BATCH_LIMIT_VAR) {
            Some(raw) => positive(BATCH_LIMIT_VAR, raw)?,
            None => DEFAULT_BATCH_LIMIT,
        };

        Ok(Self {
            server,
            credentials: Credentials {
                user,
                password: SecretString::from(password),
            },
            bucket,
            legacy_rules_path,
            http_timeout,
            batch_limit,
            realms_source_url: optional(&lookup, REALMS_URL_VAR)
                .unwrap_or_else(|| DEFAULT_REALMS_URL.to_string()),
            rules_source_url: optional(&lookup, RULES_URL_VAR)
                .unwrap_or_else(|| DEFAULT_RULES_URL.to_string()),
            github_token: optional(&lookup, GITHUB_TOKEN_VAR).map(SecretString::from),
        })
    }
}

/// Load a local legacy rules file in the same shape as the Apple source.
pub fn load_legacy_rules(path: &Path) -> Result<PasswordRules, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn required<F>(lookup: &F, var: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Err(ConfigError::Missing { var }),
        Some(value) if value.is_empty() => Err(ConfigError::Empty { var }),
        Some(value) => Ok(value),
    }
}

// Empty optional values count as unset.
fn optional<F>(lookup: &F, var: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var).filter(|v| !v.is_empty())
}

fn positive(var: &'static str, raw: String) -> Result<usize, ConfigError> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidNumber { var, value: raw }),
    }
}
