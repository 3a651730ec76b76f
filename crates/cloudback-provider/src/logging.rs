use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

fn build_env_filter(default_level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let directives = format!("{default_level},reqwest=warn,hyper=warn,hyper_util=warn,rustls=warn");
    EnvFilter::try_new(&directives)
        .map_err(|e| Error::msg(format!("invalid tracing filter '{directives}': {e}")))
}

/// Installs the global subscriber. `RUST_LOG` overrides `default_level`.
/// Logs go to stderr so command output on stdout stays parseable.
pub fn init(format: LogFormat, default_level: &str) -> Result<()> {
    let filter = build_env_filter(default_level)?;
    let registry = tracing_subscriber::registry().with(filter);
    let res = match format {
        LogFormat::Compact => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };
    res.map_err(|e| Error::msg(format!("failed to initialize logging: {e}")))
}
