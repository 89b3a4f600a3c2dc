use std::path::{Path, PathBuf};
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_CONSOLE_FILTER: &str = "info,users_backend=debug";
const LOG_FILE_PREFIX: &str = "users-backend";

/// Holds the background writer guards; dropping it flushes and stops file logging.
pub struct Logger {
    pub guards: Vec<WorkerGuard>,
}

/// Where and how much to log. Read from `LOG_DIR`, `FILE_LOG_LEVEL` and
/// `ERROR_FILE_LOG_LEVEL`; the console honours `RUST_LOG`.
#[derive(Debug, Clone)]
pub struct LogSettings {
    pub dir: PathBuf,
    pub file_level: String,
    pub error_file_level: String,
}

impl LogSettings {
    pub fn from_env() -> Self {
        LogSettings {
            dir: std::env::var("LOG_DIR").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("logs")),
            file_level: std::env::var("FILE_LOG_LEVEL").unwrap_or_else(|_| "debug".to_string()),
            error_file_level: std::env::var("ERROR_FILE_LOG_LEVEL").unwrap_or_else(|_| "error".to_string()),
        }
    }
}

impl Logger {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        Self::with_settings(&LogSettings::from_env())
    }

    pub fn with_settings(settings: &LogSettings) -> Result<Self, Box<dyn std::error::Error>> {
        let guards = Self::setup_logging(settings)?;
        Ok(Logger { guards })
    }

    /// Console-only logging, used when the log directory is unusable.
    pub fn console_only() {
        let console_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_CONSOLE_FILTER));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(console_filter)
            .with_target(true)
            .with_thread_ids(true)
            .try_init();
    }

    fn file_layer_writer(dir: &Path, file_name: &str) -> (non_blocking::NonBlocking, WorkerGuard) {
        non_blocking(rolling::daily(dir, file_name))
    }

    fn setup_logging(settings: &LogSettings) -> Result<Vec<WorkerGuard>, Box<dyn std::error::Error>> {
        let error_dir = settings.dir.join("error");
        std::fs::create_dir_all(settings.dir.join("json"))?;
        std::fs::create_dir_all(error_dir.join("json"))?;

        let console_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_CONSOLE_FILTER));
        let file_filter = EnvFilter::try_new(&settings.file_level)?;
        let error_filter = EnvFilter::try_new(&settings.error_file_level)?;
        let json_filter = EnvFilter::try_new(&settings.file_level)?;
        let error_json_filter = EnvFilter::try_new(&settings.error_file_level)?;

        let (general, general_guard) =
            Self::file_layer_writer(&settings.dir, &format!("{LOG_FILE_PREFIX}.log"));
        let (errors, error_guard) =
            Self::file_layer_writer(&error_dir, &format!("{LOG_FILE_PREFIX}-error.log"));
        let (general_json, json_guard) =
            Self::file_layer_writer(&settings.dir.join("json"), &format!("{LOG_FILE_PREFIX}.json"));
        let (errors_json, error_json_guard) =
            Self::file_layer_writer(&error_dir.join("json"), &format!("{LOG_FILE_PREFIX}-error.json"));

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_ansi(true)
                    .with_filter(console_filter),
            )
            .with(
                fmt::layer()
                    .with_writer(general)
                    .with_ansi(false)
                    .with_file(true)
                    .with_line_number(true)
                    .with_filter(file_filter),
            )
            .with(
                fmt::layer()
                    .with_writer(errors)
                    .with_ansi(false)
                    .with_file(true)
                    .with_line_number(true)
                    .with_filter(error_filter),
            )
            .with(
                fmt::layer()
                    .json()
                    .with_writer(general_json)
                    .with_file(true)
                    .with_line_number(true)
                    .with_filter(json_filter),
            )
            .with(
                fmt::layer()
                    .json()
                    .with_writer(errors_json)
                    .with_file(true)
                    .with_line_number(true)
                    .with_filter(error_json_filter),
            )
            .try_init()?;

        Ok(vec![general_guard, error_guard, json_guard, error_json_guard])
    }
}
