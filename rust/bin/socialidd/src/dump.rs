//! Periodic point-in-time snapshots of the store.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use socialid_kv::{KVError, RedbStore, SnapshotStats};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Snapshot file name for `at`: `YYYYmmdd-HHMMSS.jsonl.zst`.
pub fn snapshot_file_name(at: DateTime<Utc>) -> String {
    format!("{}.jsonl.zst", at.format("%Y%m%d-%H%M%S"))
}

/// First free snapshot path in `dir` for `at`. Names only have one-second
/// resolution, so later dumps within the same second get `-2`, `-3`, ...
pub fn snapshot_path(dir: &Path, at: DateTime<Utc>) -> PathBuf {
    let stem = at.format("%Y%m%d-%H%M%S").to_string();
    let path = dir.join(snapshot_file_name(at));
    if !path.exists() {
        return path;
    }
    let mut n = 2u32;
    loop {
        let path = dir.join(format!("{}-{}.jsonl.zst", stem, n));
        if !path.exists() {
            return path;
        }
        n += 1;
    }
}

/// Write one snapshot into `dir`, named after the current time.
pub fn dump_once(kv: &RedbStore, dir: &Path) -> Result<(PathBuf, SnapshotStats), KVError> {
    let path = snapshot_path(dir, Utc::now());
    let stats = kv.write_snapshot(&path)?;
    Ok((path, stats))
}

/// Background task writing a snapshot every `interval`.
pub struct DumpWorker {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl DumpWorker {
    pub fn start(kv: Arc<RedbStore>, dir: PathBuf, interval: Duration) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            info!("dump worker started (dir={}, interval={interval:?})", dir.display());
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        info!("dump worker stopped");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        let kv = Arc::clone(&kv);
                        let dir = dir.clone();
                        match tokio::task::spawn_blocking(move || dump_once(&kv, &dir)).await {
                            Ok(Ok((path, stats))) => {
                                info!("dump written to {} ({} entries)", path.display(), stats.entries)
                            }
                            Ok(Err(e)) => error!("dump failed: {e}"),
                            Err(e) => error!("dump task panicked: {e}"),
                        }
                    }
                }
            }
        });

        Self { cancel, handle }
    }

    /// Stop the loop and wait for an in-flight snapshot to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            error!("dump worker join failed: {e}");
        }
    }
}
