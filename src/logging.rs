use anyhow::Context as _;
use tracing_subscriber::EnvFilter;

// Request spans from the HTTP stack are noisy at info.
const DEFAULT_FILTER: &str = "info,tower_http=warn";

/// Installs the stderr subscriber. `RUST_LOG` overrides the default filter.
pub fn init() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(filter_from_env()?)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("initialize tracing subscriber: {err}"))?;

    Ok(())
}

fn filter_from_env() -> anyhow::Result<EnvFilter> {
    match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.trim().is_empty() => {
            EnvFilter::try_new(directives.trim()).context("parse RUST_LOG")
        }
        _ => EnvFilter::try_new(DEFAULT_FILTER).context("build default log filter"),
    }
}
