//! Logging infrastructure.
//!
//! Structured file logging with daily rotation to platform-standard
//! directories. Stdout is left to the change report.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, reload};

/// Prefix of every log file name.
const LOG_FILE_PREFIX: &str = "shared-prompts";

/// Level used until the configured one is known.
pub const DEFAULT_LEVEL: &str = "info";

type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Result of initializing the logging system.
pub struct LoggingContext {
    /// Guard that must be held for the application lifetime to ensure logs are flushed.
    pub _guard: WorkerGuard,
    /// The session ID for this invocation.
    pub session_id: String,
    /// The directory where logs are written.
    pub log_directory: PathBuf,
    level: LevelControl,
}

impl LoggingContext {
    /// Switch to the configured level. `RUST_LOG` still wins when set.
    pub fn set_level(&self, level: &str) -> Result<(), LoggingError> {
        self.level.set(level)
    }
}

/// Swaps the active filter once configuration has been read.
struct LevelControl {
    handle: FilterHandle,
    from_env: bool,
}

impl LevelControl {
    fn set(&self, level: &str) -> Result<(), LoggingError> {
        if self.from_env {
            return Ok(());
        }
        let filter = EnvFilter::try_new(level).map_err(|e| LoggingError {
            message: format!("Invalid log level {:?}: {}", level, e),
        })?;
        self.handle.reload(filter).map_err(|e| LoggingError {
            message: format!("Failed to apply log level: {}", e),
        })
    }
}

/// Build the reloadable filter layer. `env` is the `RUST_LOG` value, if any.
fn reloadable_filter(
    default_level: &str,
    env: Option<&str>,
) -> (reload::Layer<EnvFilter, Registry>, LevelControl) {
    let env_filter = env.and_then(|directives| EnvFilter::try_new(directives).ok());
    let from_env = env_filter.is_some();
    let filter = env_filter.unwrap_or_else(|| {
        EnvFilter::try_new(default_level).unwrap_or_else(|_| EnvFilter::new("info"))
    });
    let (layer, handle) = reload::Layer::new(filter);
    (layer, LevelControl { handle, from_env })
}

/// Error that occurred during logging initialization.
#[derive(Debug)]
pub struct LoggingError {
    pub message: String,
}

impl std::fmt::Display for LoggingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Generates a 6-character random hex session ID.
fn generate_session_id() -> String {
    use rand::Rng;
    let mut rng = rand::rng();
    let bytes: [u8; 3] = rng.random();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Initializes the logging system.
///
/// `default_level` applies when `RUST_LOG` is unset or invalid, until
/// [`LoggingContext::set_level`] replaces it. Call this before loading
/// configuration so config warnings are recorded.
/// The returned `WorkerGuard` must be held for the application lifetime.
pub fn init(default_level: &str) -> Result<LoggingContext, LoggingError> {
    let session_id = generate_session_id();

    // macOS: ~/Library/Logs/shared-prompts/
    // Linux: ~/.local/state/shared-prompts/
    // Windows: %LocalAppData%\shared-prompts\
    let log_dir = log_directory().ok_or_else(|| LoggingError {
        message: "Failed to determine log directory".to_string(),
    })?;

    fs::create_dir_all(&log_dir).map_err(|e| LoggingError {
        message: format!("Failed to create log directory: {}", e),
    })?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let (env_filter, level) = reloadable_filter(default_level, rust_log.as_deref());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_span_events(FmtSpan::NONE)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| LoggingError {
            message: format!("Failed to install log subscriber: {}", e),
        })?;

    info!(session_id = %session_id, "session_start");

    Ok(LoggingContext {
        _guard: guard,
        session_id,
        log_directory: log_dir,
        level,
    })
}

fn log_directory() -> Option<PathBuf> {
    if cfg!(target_os = "macos") {
        return dirs::home_dir().map(|home| home.join("Library").join("Logs").join(LOG_FILE_PREFIX));
    }

    let project_dirs = ProjectDirs::from("dev", "shared-prompts", "shared-prompts")?;
    project_dirs
        .state_dir()
        .map(Path::to_path_buf)
        .or_else(|| Some(project_dirs.data_local_dir().to_path_buf()))
}

/// Cleans up log files older than the retention period.
///
/// Errors are logged at WARN level but never stop the run.
pub fn cleanup_old_logs(log_dir: &Path) {
    use std::time::{Duration, SystemTime};
    use tracing::{debug, warn};

    const RETENTION_DAYS: u64 = 7;
    let retention = Duration::from_secs(RETENTION_DAYS * 24 * 60 * 60);

    let entries = match fs::read_dir(log_dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, "Failed to read log directory for cleanup");
            return;
        }
    };

    let now = SystemTime::now();
    let mut deleted_count = 0u32;

    for entry in entries.filter_map(Result::ok) {
        let path = entry.path();

        let file_name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) if is_rotated_log(name) => name.to_string(),
            _ => continue,
        };

        let modified = match fs::metadata(&path).and_then(|m| m.modified()) {
            Ok(t) => t,
            Err(e) => {
                warn!(file = %file_name, error = %e, "Failed to read modification time for log file");
                continue;
            }
        };

        // Files dated in the future are left alone.
        let Ok(age) = now.duration_since(modified) else {
            continue;
        };

        if age > retention {
            match fs::remove_file(&path) {
                Ok(()) => {
                    debug!(file = %file_name, age_days = age.as_secs() / 86400, "Deleted old log file");
                    deleted_count += 1;
                }
                Err(e) => {
                    warn!(file = %file_name, error = %e, "Failed to delete old log file");
                }
            }
        }
    }

    if deleted_count > 0 {
        debug!(count = deleted_count, "Log cleanup completed");
    }
}

/// Daily-rotated files are named `<prefix>.<date>`.
fn is_rotated_log(name: &str) -> bool {
    name.strip_prefix(LOG_FILE_PREFIX)
        .and_then(|rest| rest.strip_prefix('.'))
        .is_some_and(|date| !date.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;
    use tracing::{debug, warn};

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Capture {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn capturing(
        default_level: &'static str,
        env: Option<&'static str>,
    ) -> (impl tracing::Subscriber + Send + Sync, LevelControl, Capture) {
        let capture = Capture::default();
        let writer = capture.clone();
        let (filter, level) = reloadable_filter(default_level, env);
        let subscriber = tracing_subscriber::registry().with(filter).with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(move || writer.clone()),
        );
        (subscriber, level, capture)
    }

    #[test]
    fn test_config_warnings_reach_log_when_initialized_first() {
        let dir = TempDir::new().unwrap();
        let project = dir.path().join(crate::config::PROJECT_CONFIG_FILE);
        fs::write(&project, "[remote\nrepo = ").unwrap();

        let (subscriber, level, capture) = capturing(DEFAULT_LEVEL, None);
        tracing::subscriber::with_default(subscriber, || {
            let loaded = crate::config::load_config_from(
                &dir.path().join("config.toml"),
                Some(project.as_path()),
            );
            assert!(loaded.project_error.is_some());
            level.set(&loaded.config.logging.level).unwrap();
        });

        let text = capture.text();
        assert!(text.contains("project_config_parse_failed"), "{text}");
        assert!(text.contains("Created default config"), "{text}");
    }

    #[test]
    fn test_set_level_takes_effect() {
        let (subscriber, level, capture) = capturing(DEFAULT_LEVEL, None);
        tracing::subscriber::with_default(subscriber, || {
            debug!("hidden_at_info");
            level.set("debug").unwrap();
            debug!("shown_at_debug");
            level.set("error").unwrap();
            warn!("hidden_at_error");
        });

        let text = capture.text();
        assert!(!text.contains("hidden_at_info"));
        assert!(text.contains("shown_at_debug"));
        assert!(!text.contains("hidden_at_error"));
    }

    #[test]
    fn test_rust_log_wins_over_configured_level() {
        let (subscriber, level, capture) = capturing(DEFAULT_LEVEL, Some("warn"));
        tracing::subscriber::with_default(subscriber, || {
            level.set("debug").unwrap();
            debug!("suppressed_by_rust_log");
            warn!("kept_by_rust_log");
        });

        let text = capture.text();
        assert!(!text.contains("suppressed_by_rust_log"));
        assert!(text.contains("kept_by_rust_log"));
    }

    #[test]
    fn test_invalid_level_is_rejected() {
        let (_subscriber, level, _capture) = capturing(DEFAULT_LEVEL, None);
        assert!(level.set("shared_prompts=loud").is_err());
    }

    #[test]
    fn test_session_id_format() {
        let id = generate_session_id();
        assert_eq!(id.len(), 6);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_is_rotated_log() {
        assert!(is_rotated_log("shared-prompts.2026-01-01"));
        assert!(!is_rotated_log("shared-prompts"));
        assert!(!is_rotated_log("shared-prompts."));
        assert!(!is_rotated_log("other.2026-01-01"));
    }

    #[test]
    fn test_cleanup_removes_only_old_logs() {
        let dir = TempDir::new().unwrap();
        let old = dir.path().join("shared-prompts.2020-01-01");
        let fresh = dir.path().join("shared-prompts.2099-01-01");
        let unrelated = dir.path().join("notes.txt");
        for path in [&old, &fresh, &unrelated] {
            fs::write(path, "log").unwrap();
        }

        let ten_days_ago = SystemTime::now() - Duration::from_secs(10 * 24 * 60 * 60);
        fs::File::options()
            .write(true)
            .open(&old)
            .unwrap()
            .set_modified(ten_days_ago)
            .unwrap();
        fs::File::options()
            .write(true)
            .open(&unrelated)
            .unwrap()
            .set_modified(ten_days_ago)
            .unwrap();

        cleanup_old_logs(dir.path());

        assert!(!old.exists());
        assert!(fresh.exists());
        assert!(unrelated.exists());
    }
}
