use curve_swap::config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Install console (and optional file) logging.
///
/// `RUST_LOG` wins over the configured level. File logging is enabled when
/// `SWAPFLOW_LOG_DIR` points at a writable directory; keep the returned guard
/// alive for the lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},curve_swap=debug", config.level)));

    // `tracing_appender::rolling::daily` panics if it can't create the initial
    // log file, so preflight writability.
    let (file_layer, guard) = match std::env::var("SWAPFLOW_LOG_DIR") {
        Ok(log_dir) => {
            let writable = std::fs::create_dir_all(&log_dir).is_ok() && {
                let test_path = std::path::Path::new(&log_dir).join(".curve_swap_write_test");
                let ok = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&test_path)
                    .is_ok();
                let _ = std::fs::remove_file(&test_path);
                ok
            };

            if writable {
                let file_appender = tracing_appender::rolling::daily(&log_dir, "curve-swap.log");
                let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
                eprintln!("Logging to: {}/curve-swap.log", log_dir);
                (
                    Some(
                        tracing_subscriber::fmt::layer()
                            .with_writer(non_blocking)
                            .with_ansi(false)
                            .with_target(true),
                    ),
                    Some(guard),
                )
            } else {
                eprintln!(
                    "Warning: Could not write to log directory {}, file logging disabled",
                    log_dir
                );
                (None, None)
            }
        }
        Err(_) => (None, None),
    };

    let json_layer = config.json.then(|| tracing_subscriber::fmt::layer().json());
    let console_layer = (!config.json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .with(file_layer)
        .try_init();

    guard
}
