pub mod diff;
pub mod status;
pub mod sync;

use anyhow::{Context, Result};
use credsync_core::Config;

use crate::remote::{self, GithubFeed, RemoteSettingsClient};

/// Validated configuration plus the two HTTP collaborators built from it.
pub struct Session {
    pub config: Config,
    pub feed: GithubFeed,
    pub store: RemoteSettingsClient,
}

/// Load configuration and build clients. Fails before any network I/O when
/// configuration is incomplete.
pub fn connect() -> Result<Session> {
    let config = Config::from_env().context("invalid configuration")?;
    let agent = remote::agent(config.http_timeout);
    Ok(Session {
        feed: GithubFeed::new(agent.clone(), &config),
        store: RemoteSettingsClient::new(agent, &config),
        config,
    })
}
