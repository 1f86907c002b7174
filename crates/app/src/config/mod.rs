//! Configuration

use std::path::PathBuf;

use clap::Args;

pub mod observability;

pub use observability::{LogFormat, LoggingConfig};

/// Where seed data is read from.
#[derive(Debug, Clone, Args)]
pub struct FixtureConfig {
    /// Directory holding the `channels/`, `products/`, `promotions/` and `vouchers/` fixture files
    #[arg(long, env = "FIXTURES_PATH", default_value = "./fixtures", global = true)]
    pub fixtures_path: PathBuf,

    /// Fixture set name, the file stem shared by every kind
    #[arg(long, env = "FIXTURE_SET", default_value = "apparel", global = true)]
    pub fixture_set: String,
}
