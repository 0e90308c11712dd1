use anyhow::{Context, Result};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Installs a stderr logger; stdout carries only the status line.
///
/// `verbosity` is the number of `-v` flags: none logs warnings only, then
/// `info`, `debug` and `trace`.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_new(format!(
        "terastation_storage={level},check_terastation_storage={level}",
        level = level
    ))
    .with_context(|| format!("building log filter for level {}", level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init()
        .with_context(|| "installing log subscriber")
}
