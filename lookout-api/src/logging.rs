//! Tracing subscriber setup
//!
//! Two output formats are supported: `human` for terminals and `machine`
//! for one JSON object per line. Filtering follows `RUST_LOG` when set.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directives when `RUST_LOG` is unset
pub const DEFAULT_DIRECTIVES: &str = "lookout_api=info,lookout_shared=info,tower_http=info";

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Human,

    /// JSON lines
    Machine,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "human" => Ok(LogFormat::Human),
            "machine" | "json" => Ok(LogFormat::Machine),
            other => anyhow::bail!("LOG_FORMAT must be human or machine, got {}", other),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Human => f.write_str("human"),
            LogFormat::Machine => f.write_str("machine"),
        }
    }
}

/// Installs the global tracing subscriber
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed
pub fn init_tracing(format: LogFormat) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Human => registry.with(tracing_subscriber::fmt::layer()).try_init()?,
        LogFormat::Machine => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()?,
    }

    Ok(())
}
