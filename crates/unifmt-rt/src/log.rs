use std::sync::OnceLock;

use log::{LevelFilter, Log, Metadata, Record};

pub const LOG_ENV: &str = "UNIFMT_LOG";

struct StderrLogger {
    level: LevelFilter,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let level = record.level().as_str().to_ascii_lowercase();
        eprintln!("[{level}] {}", record.args());
    }

    fn flush(&self) {}
}

/// Maps the `UNIFMT_LOG` value to a level filter. `1` is kept as the historical
/// spelling of `info`.
pub fn level_from_env(raw: Option<&str>) -> LevelFilter {
    match raw.map(|value| value.trim().to_ascii_lowercase()).as_deref() {
        Some("1") | Some("info") => LevelFilter::Info,
        Some("debug") => LevelFilter::Debug,
        Some("trace") => LevelFilter::Trace,
        Some("warn") => LevelFilter::Warn,
        Some("error") => LevelFilter::Error,
        _ => LevelFilter::Off,
    }
}

/// Installs the stderr sink once per process. Later calls are no-ops.
pub fn init() {
    static LOGGER: OnceLock<StderrLogger> = OnceLock::new();
    let level = level_from_env(std::env::var(LOG_ENV).ok().as_deref());
    let logger = LOGGER.get_or_init(|| StderrLogger { level });
    if log::set_logger(logger).is_ok() {
        log::set_max_level(logger.level);
    }
}

pub fn info(message: &str) {
    log::info!("{message}");
}

pub fn warn(message: &str) {
    log::warn!("{message}");
}
