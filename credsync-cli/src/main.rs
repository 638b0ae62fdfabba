//! credsync — keep Remote Settings credential-backend collections in sync
//! with Apple's password-manager-resources.
//!
//! # Usage
//!
//! ```text
//! credsync sync [--only realms|rules] [--dry-run]
//! credsync status [--json]
//! credsync diff
//! ```
//!
//! Configuration comes from the environment (`FX_REMOTE_SETTINGS_WRITER_*`,
//! `CREDSYNC_*`). Exit code is 0 on success and 1 on any error.

mod commands;
mod remote;

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{diff::DiffArgs, status::StatusArgs, sync::SyncArgs};
use credsync_sync::PassScope;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "credsync",
    version,
    about = "Sync shared-credential realms and password rules into Remote Settings",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reconcile the collections with the source datasets.
    Sync(SyncArgs),

    /// Show review status of the managed collections.
    Status(StatusArgs),

    /// Show what sync would change.
    Diff(DiffArgs),
}

// ---------------------------------------------------------------------------
// Pass selection argument
// ---------------------------------------------------------------------------

/// Thin wrapper so clap can parse a single pass from CLI args.
#[derive(Debug, Clone, Copy)]
pub struct PassArg(pub PassScope);

impl FromStr for PassArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "realms" | "related-realms" => Ok(Self(PassScope::RelatedRealms)),
            "rules" | "password-rules" => Ok(Self(PassScope::PasswordRules)),
            other => Err(format!("unknown pass '{other}'; expected: realms, rules")),
        }
    }
}

impl fmt::Display for PassArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            PassScope::All => write!(f, "all"),
            PassScope::RelatedRealms => write!(f, "realms"),
            PassScope::PasswordRules => write!(f, "rules"),
        }
    }
}

impl From<PassArg> for PassScope {
    fn from(p: PassArg) -> Self {
        p.0
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Sync(args) => args.run(),
        Commands::Status(args) => args.run(),
        Commands::Diff(args) => args.run(),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
