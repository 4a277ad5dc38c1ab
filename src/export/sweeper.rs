use crate::error::GatewayResult;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::time::{interval, Duration};
use tracing::{debug, error, info, warn};

const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Periodically deletes exported CSV files older than their lifetime.
#[derive(Debug, Clone)]
pub struct ExportSweeper {
    dir: PathBuf,
    sweep_interval: Duration,
    lifetime: Duration,
}

impl ExportSweeper {
    pub fn new(dir: impl Into<PathBuf>, sweep_interval: Duration, lifetime: Duration) -> Self {
        Self {
            dir: dir.into(),
            sweep_interval,
            lifetime,
        }
    }

    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval_timer = interval(self.sweep_interval.max(MIN_SWEEP_INTERVAL));

            loop {
                interval_timer.tick().await;

                match self.sweep_once().await {
                    Ok(0) => {}
                    Ok(removed) => info!("Removed {} expired export file(s)", removed),
                    Err(e) => error!("Export sweep of {} failed: {}", self.dir.display(), e),
                }
            }
        })
    }

    pub async fn sweep_once(&self) -> GatewayResult<usize> {
        self.sweep_at(SystemTime::now()).await
    }

    /// Removes every `*.csv` whose modification time is more than `lifetime` before `now`.
    pub async fn sweep_at(&self, now: SystemTime) -> GatewayResult<usize> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("csv") {
                continue;
            }

            match self.remove_if_expired(&path, now).await {
                Ok(true) => {
                    debug!("Deleted expired export {}", path.display());
                    removed += 1;
                }
                Ok(false) => {}
                Err(e) => warn!("Could not sweep {}: {}", path.display(), e),
            }
        }

        Ok(removed)
    }

    async fn remove_if_expired(&self, path: &Path, now: SystemTime) -> GatewayResult<bool> {
        let modified = tokio::fs::metadata(path).await?.modified()?;
        // Files stamped in the future are treated as fresh
        let expired = now
            .duration_since(modified)
            .map(|age| age > self.lifetime)
            .unwrap_or(false);

        if expired {
            tokio::fs::remove_file(path).await?;
        }
        Ok(expired)
    }
}
