use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Name of the per-user state directory under `$HOME`.
pub const APP_DIR: &str = ".unit-economics";
pub const LOG_FILE: &str = "unit-economics.log";

// ── Directory bootstrap ────────────────────────────────────────────────────────

fn home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// `<home>/.unit-economics`
pub fn app_dir_in(home: &Path) -> PathBuf {
    home.join(APP_DIR)
}

/// Ensure `~/.unit-economics/` and `~/.unit-economics/logs/` exist.
pub fn ensure_directories() -> anyhow::Result<()> {
    ensure_directories_in(&home())
}

pub fn ensure_directories_in(home: &Path) -> anyhow::Result<()> {
    let app_dir = app_dir_in(home);
    std::fs::create_dir_all(&app_dir)?;
    std::fs::create_dir_all(app_dir.join("logs"))?;
    Ok(())
}

/// Log file used by the interactive dashboard when `--log-file` is absent.
pub fn default_log_file() -> PathBuf {
    app_dir_in(&home()).join("logs").join(LOG_FILE)
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a level name (`DEBUG`, `WARNING`, ...) to an [`EnvFilter`] directive.
///
/// Unrecognised names are passed through lower-cased so that full directives
/// such as `econ_data=debug` keep working.
pub fn log_directive(log_level: &str) -> String {
    match log_level.trim().to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" | "WARN" => "warn".to_string(),
        "ERROR" | "CRITICAL" => "error".to_string(),
        _ => log_level.trim().to_lowercase(),
    }
}

/// Initialise the global `tracing` subscriber.
///
/// Events go to `log_file` (appending, no ANSI colours) when given, and to
/// stderr when `to_stderr` is set. The interactive dashboard passes
/// `to_stderr = false` so log lines never land on the alternate screen.
pub fn setup_logging(log_level: &str, log_file: Option<&Path>, to_stderr: bool) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_new(log_directive(log_level)).unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(false),
            )
        }
        None => None,
    };

    let stderr_layer = to_stderr.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()?;

    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_directories_in() {
        let tmp = TempDir::new().expect("tempdir");
        ensure_directories_in(tmp.path()).expect("ensure_directories should succeed");

        let app_dir = tmp.path().join(".unit-economics");
        assert!(app_dir.is_dir(), ".unit-economics dir must exist");
        assert!(app_dir.join("logs").is_dir(), "logs subdir must exist");

        // Idempotent.
        ensure_directories_in(tmp.path()).expect("second call");
    }

    #[test]
    fn test_default_log_file_location() {
        let path = default_log_file();
        assert!(path.ends_with(".unit-economics/logs/unit-economics.log"));
    }

    #[test]
    fn test_log_directive_maps_level_names() {
        assert_eq!(log_directive("DEBUG"), "debug");
        assert_eq!(log_directive("info"), "info");
        assert_eq!(log_directive("WARNING"), "warn");
        assert_eq!(log_directive("ERROR"), "error");
        assert_eq!(log_directive("CRITICAL"), "error");
    }

    #[test]
    fn test_log_directive_passes_through_directives() {
        assert_eq!(log_directive("econ_data=DEBUG"), "econ_data=debug");
        assert!(EnvFilter::try_new(log_directive("econ_data=DEBUG")).is_ok());
    }
}
