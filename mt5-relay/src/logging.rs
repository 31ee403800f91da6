use crate::config::LoggingConfig;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber: console output plus optional rolling files.
///
/// The returned guard flushes the file writer on drop and must live as long as
/// the process.
pub fn init(config: &LoggingConfig) -> Option<WorkerGuard> {
    // RUST_LOG overrides the default level
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer());

    if !config.enabled {
        subscriber.init();
        return None;
    }

    use tracing_appender::rolling;

    if let Err(e) = std::fs::create_dir_all(&config.directory) {
        eprintln!("Failed to create log directory {}: {}", config.directory, e);
    }

    cleanup_old_logs(config);

    let file_appender = match config.rotation.as_str() {
        "hourly" => rolling::hourly(&config.directory, &config.file_prefix),
        "never" => rolling::never(&config.directory, &config.file_prefix),
        _ => rolling::daily(&config.directory, &config.file_prefix),
    };
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    subscriber
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .init();

    Some(guard)
}

/// Delete log files beyond `max_files` (newest kept) or older than `max_age_days`.
/// Returns how many files were removed.
pub fn cleanup_old_logs(config: &LoggingConfig) -> usize {
    if config.max_files == 0 && config.max_age_days == 0 {
        return 0;
    }

    let log_dir = Path::new(&config.directory);
    let entries = match std::fs::read_dir(log_dir) {
        Ok(entries) => entries,
        Err(_) => return 0,
    };

    let mut log_files: Vec<_> = entries
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let metadata = entry.metadata().ok()?;
            if !metadata.is_file() {
                return None;
            }
            let name = entry.file_name();
            if !name.to_str()?.starts_with(&config.file_prefix) {
                return None;
            }
            Some((entry.path(), metadata.modified().ok()?))
        })
        .collect();

    // Newest first
    log_files.sort_by(|a, b| b.1.cmp(&a.1));

    let now = SystemTime::now();
    let max_age = Duration::from_secs(u64::from(config.max_age_days) * 24 * 60 * 60);
    let mut deleted = 0;

    for (idx, (path, modified)) in log_files.iter().enumerate() {
        let over_count = config.max_files > 0 && idx >= config.max_files as usize;
        let over_age = config.max_age_days > 0
            && now
                .duration_since(*modified)
                .map(|age| age > max_age)
                .unwrap_or(false);

        if !(over_count || over_age) {
            continue;
        }
        match std::fs::remove_file(path) {
            Ok(()) => deleted += 1,
            Err(e) => eprintln!("Failed to delete log file {:?}: {}", path, e),
        }
    }

    if deleted > 0 {
        eprintln!("Cleaned up {} old log file(s)", deleted);
    }
    deleted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(dir: &Path, max_files: u32) -> LoggingConfig {
        LoggingConfig {
            directory: dir.to_string_lossy().into_owned(),
            file_prefix: "mt5-relay".to_string(),
            max_files,
            max_age_days: 0,
            ..Default::default()
        }
    }

    #[test]
    fn test_cleanup_keeps_newest_files() {
        let dir = tempfile::tempdir().unwrap();
        let base = SystemTime::now() - Duration::from_secs(3600);
        for day in 1..=4u64 {
            let path = dir.path().join(format!("mt5-relay.2025-01-0{}", day));
            let file = std::fs::File::create(&path).unwrap();
            file.set_modified(base + Duration::from_secs(day * 60)).unwrap();
        }
        std::fs::write(dir.path().join("unrelated.log"), "x").unwrap();

        let deleted = cleanup_old_logs(&config_for(dir.path(), 2));

        assert_eq!(deleted, 2);
        assert!(dir.path().join("mt5-relay.2025-01-04").exists());
        assert!(dir.path().join("mt5-relay.2025-01-03").exists());
        assert!(!dir.path().join("mt5-relay.2025-01-01").exists());
        assert!(dir.path().join("unrelated.log").exists());
    }

    #[test]
    fn test_cleanup_unlimited_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("mt5-relay.2025-01-01"), "x").unwrap();

        assert_eq!(cleanup_old_logs(&config_for(dir.path(), 0)), 0);
    }

    #[test]
    fn test_cleanup_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert_eq!(cleanup_old_logs(&config_for(&missing, 3)), 0);
    }
}
