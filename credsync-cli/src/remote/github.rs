//! Source feed over the GitHub contents API.

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

use credsync_core::{Config, PasswordRules, RealmGroup};
use credsync_sync::{SourceFeed, SyncError};

/// Asks the contents API for the raw file instead of a base64 envelope.
const RAW_MEDIA_TYPE: &str = "application/vnd.github.v3.raw";

pub struct GithubFeed {
    agent: ureq::Agent,
    realms_url: String,
    rules_url: String,
    token: Option<SecretString>,
}

impl GithubFeed {
    pub fn new(agent: ureq::Agent, config: &Config) -> Self {
        Self {
            agent,
            realms_url: config.realms_source_url.clone(),
            rules_url: config.rules_source_url.clone(),
            token: config.github_token.clone(),
        }
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, SyncError> {
        let mut request = self.agent.get(url).set("Accept", RAW_MEDIA_TYPE);
        if let Some(token) = &self.token {
            request = request.set(
                "Authorization",
                &format!("Bearer {}", token.expose_secret()),
            );
        }
        tracing::debug!(url, "fetching source dataset");
        let response = request.call().map_err(|err| SyncError::Source {
            url: url.to_string(),
            message: super::describe(err),
        })?;
        response.into_json().map_err(|err| SyncError::Source {
            url: url.to_string(),
            message: format!("invalid JSON body: {err}"),
        })
    }
}

impl SourceFeed for GithubFeed {
    fn related_realms(&self) -> Result<Vec<RealmGroup>, SyncError> {
        self.get_json(&self.realms_url)
    }

    fn password_rules(&self) -> Result<PasswordRules, SyncError> {
        self.get_json(&self.rules_url)
    }
}
