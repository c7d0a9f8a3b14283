use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tokio_cron_scheduler::{Job, JobScheduler};

use crate::config::Config;
use crate::models::Result;

/// Deletes regular files in `dir` last modified more than `max_age` before `now`.
///
/// Returns how many files were removed. Files that cannot be inspected or
/// removed are logged and skipped.
pub fn sweep_directory(dir: &Path, max_age: Duration, now: SystemTime) -> Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "Failed to read directory entry");
                continue;
            }
        };
        let path = entry.path();
        let modified = match entry.metadata().and_then(|m| if m.is_file() { m.modified().map(Some) } else { Ok(None) }) {
            Ok(Some(t)) => t,
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to stat file");
                continue;
            }
        };
        // Files stamped in the future count as fresh
        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        if age <= max_age {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove expired file"),
        }
    }
    Ok(removed)
}

/// Runs one sweep over every storage directory
pub fn sweep_expired(dirs: &[PathBuf], max_age: Duration) -> usize {
    let now = SystemTime::now();
    let mut total = 0;
    for dir in dirs {
        match sweep_directory(dir, max_age, now) {
            Ok(n) => total += n,
            Err(e) => tracing::warn!(dir = %dir.display(), error = %e, "Retention sweep failed"),
        }
    }
    total
}

/// Registers the cron job that sweeps expired uploads and processed copies
pub async fn schedule_retention(scheduler: &JobScheduler, cfg: &Config) -> anyhow::Result<()> {
    let dirs = vec![cfg.upload_folder.clone(), cfg.processed_folder.clone()];
    let max_age = Duration::from_secs(cfg.retention_max_age_secs);

    let job = Job::new_async(cfg.retention_cron.as_str(), move |_uuid, _l| {
        let dirs = dirs.clone();
        Box::pin(async move {
            let started = chrono::Utc::now();
            match tokio::task::spawn_blocking(move || sweep_expired(&dirs, max_age)).await {
                Ok(removed) => tracing::info!(
                    removed,
                    started_at = %started.to_rfc3339(),
                    "Retention sweep finished"
                ),
                Err(e) => tracing::error!(error = %e, "Retention sweep panicked"),
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(
        cron = %cfg.retention_cron,
        max_age_secs = cfg.retention_max_age_secs,
        "Retention sweeper scheduled"
    );
    Ok(())
}
