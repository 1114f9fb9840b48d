use crate::cli::commands::logging::LogFormat;
use anyhow::Result;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

fn filter(verbosity_level: Level) -> EnvFilter {
    // RUST_LOG overrides the verbosity flag
    EnvFilter::builder()
        .with_default_directive(verbosity_level.into())
        .from_env_lossy()
}

/// Install the global subscriber. Logs go to stderr so stdout stays clean for
/// records, tokens and claims.
///
/// # Errors
///
/// Returns an error if a global subscriber was already set
pub fn init(verbosity_level: Option<Level>, format: LogFormat) -> Result<()> {
    let verbosity_level = verbosity_level.unwrap_or(Level::ERROR);

    match format {
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(true)
                .with_target(false);
            let subscriber = Registry::default()
                .with(fmt_layer)
                .with(filter(verbosity_level));
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogFormat::Text => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_file(false)
                .with_line_number(false)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_target(false);
            let subscriber = Registry::default()
                .with(fmt_layer)
                .with(filter(verbosity_level));
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    Ok(())
}
