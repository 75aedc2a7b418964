use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing with a file appender.
///
/// The TUI owns the terminal's alternate screen, so log output goes to
/// `<state dir>/pricechat/pricechat.log` instead of stdout. Default level is
/// INFO, override via RUST_LOG. Returns the appender guard; dropping it
/// flushes buffered log lines.
pub fn init() -> Option<WorkerGuard> {
    let dir = dirs::state_dir().or_else(dirs::cache_dir)?.join("pricechat");
    std::fs::create_dir_all(&dir).ok()?;

    let appender = tracing_appender::rolling::never(dir, "pricechat.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false).with_target(true).compact())
        .init();

    tracing::debug!("tracing initialized");
    Some(guard)
}
