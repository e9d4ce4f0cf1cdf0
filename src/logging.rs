// Logging initialisation.
//
// Writes structured logs to both stdout and `<LOG_DIR>/journal.log`.
//
// In debug mode stdout is colourised text at `debug`; in release mode stdout
// is JSON at `info`. The file layer is always plain text.
//
// `RUST_LOG` overrides the default filter, e.g. `RUST_LOG=info,sqlx=debug`.

use tracing_appender::non_blocking;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

use crate::config::AppEnv;

const QUIET_DEPENDENCIES: &str = "sqlx=warn,hyper=warn,tower=warn,h2=warn";

// Initialise the global tracing subscriber.
//
// Returns a [`WorkerGuard`] that must be kept alive for the whole program.
// Dropping it early loses buffered log lines.
pub fn init(env: AppEnv, log_dir: &str) -> non_blocking::WorkerGuard {
    let file_appender = tracing_appender::rolling::never(log_dir, "journal.log");
    let (file_writer, guard) = non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(env)));

    let stdout_layer: Box<dyn Layer<Registry> + Send + Sync> = match env {
        AppEnv::Debug => fmt::layer().with_target(true).with_ansi(true).boxed(),
        AppEnv::Release => fmt::layer().json().with_target(true).boxed(),
    };

    let file_layer = fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .with_writer(file_writer);

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .with(env_filter)
        .init();

    guard
}

fn default_filter(env: AppEnv) -> String {
    let level = if env.is_debug() { "debug" } else { "info" };
    format!("{level},{QUIET_DEPENDENCIES}")
}
