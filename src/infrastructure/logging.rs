//! File logging. The terminal belongs to the UI, so nothing is written to stderr.

use std::fs::OpenOptions;
use std::path::Path;

use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use super::config::{AppConfig, LogLevel};

/// `RUST_LOG` wins over the configured level.
#[must_use]
pub fn build_filter(env: Option<&str>, level: LogLevel) -> EnvFilter {
    env.and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(level.to_string()))
}

/// Installs the global subscriber. Without a log path only the filter is
/// installed and events are discarded.
///
/// # Errors
/// Returns error if the log file or its directory cannot be created.
pub fn init(config: &AppConfig) -> std::io::Result<()> {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(env.as_deref(), config.log_level);

    let Some(log_path) = config.effective_log_path() else {
        tracing_subscriber::registry().with(filter).init();
        return Ok(());
    };

    let file = open_log_file(&log_path)?;
    let file_layer = fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .init();

    info!(path = %log_path.display(), "Logging initialized");
    Ok(())
}

fn open_log_file(path: &Path) -> std::io::Result<std::fs::File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_directives_override_level() {
        let filter = build_filter(Some("sidecord=trace"), LogLevel::Warn);
        assert_eq!(filter.to_string(), "sidecord=trace");
    }

    #[test]
    fn test_invalid_env_falls_back_to_level() {
        let filter = build_filter(Some("sidecord=loud"), LogLevel::Debug);
        assert_eq!(filter.to_string(), "debug");
        assert_eq!(build_filter(None, LogLevel::Error).to_string(), "error");
    }

    #[test]
    fn test_log_file_parent_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("sidecord.log");
        assert!(open_log_file(&path).is_ok());
        assert!(path.exists());
    }
}
