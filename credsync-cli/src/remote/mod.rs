//! HTTP collaborators: the GitHub source feed and the Remote Settings client.

pub mod github;
pub mod kinto;

use std::time::Duration;

pub use github::GithubFeed;
pub use kinto::RemoteSettingsClient;

/// Shared blocking agent. Every request is bounded by `timeout`.
pub fn agent(timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout(timeout)
        .user_agent(concat!("credsync/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Human-readable message for a failed request, including the response body
/// for HTTP status errors.
pub(crate) fn describe(err: ureq::Error) -> String {
    match err {
        ureq::Error::Status(code, response) => {
            let body = response.into_string().unwrap_or_default();
            if body.is_empty() {
                format!("HTTP {code}")
            } else {
                format!("HTTP {code}: {}", body.trim())
            }
        }
        ureq::Error::Transport(transport) => transport.to_string(),
    }
}
