//! Guaranteed release of a run's local and remote resources.
//!
//! [`ResourceReaper::release`] is called once the run body has finished,
//! whatever its outcome. It removes the local asset synchronously and
//! schedules the remote delete on a detached task, retried under the run's
//! retry policy. If a reaper is dropped
//! without being released (for example when the owning future is dropped),
//! the local asset is still removed from `Drop`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use vscore_intel::VideoIntelligence;
use vscore_models::{IndexId, VideoIdentifier};

use crate::metrics::record_cleanup_failure;
use crate::retry::{with_retry, RetryConfig};

/// Owns the resources created for one run.
pub struct ResourceReaper {
    intel: Arc<dyn VideoIntelligence>,
    local: Option<PathBuf>,
    remote: Option<(IndexId, VideoIdentifier)>,
    remote_cleanup: bool,
    retry: RetryConfig,
}

impl ResourceReaper {
    pub fn new(
        intel: Arc<dyn VideoIntelligence>,
        local_asset: impl Into<PathBuf>,
        remote_cleanup: bool,
        retry: RetryConfig,
    ) -> Self {
        Self {
            intel,
            local: Some(local_asset.into()),
            remote: None,
            remote_cleanup,
            retry,
        }
    }

    /// Record the indexed video so it can be deleted on release.
    pub fn track_remote(&mut self, index_id: IndexId, video_id: VideoIdentifier) {
        self.remote = Some((index_id, video_id));
    }

    pub fn local_asset(&self) -> Option<&Path> {
        self.local.as_deref()
    }

    /// Release everything. Never fails; problems are logged.
    ///
    /// Returns the handle of the detached remote delete, if one was started.
    pub fn release(mut self) -> Option<JoinHandle<()>> {
        if let Some(path) = self.local.take() {
            remove_local(&path);
        }

        let (index_id, video_id) = self.remote.take()?;
        if !self.remote_cleanup {
            debug!(video_id = %video_id, "Remote cleanup disabled, keeping indexed video");
            return None;
        }

        let intel = Arc::clone(&self.intel);
        let retry = self.retry.clone();
        Some(tokio::spawn(async move {
            let deleted = with_retry(&retry, "delete_video", || {
                intel.delete_video(&index_id, &video_id)
            })
            .await;
            match deleted {
                Ok(()) => info!(video_id = %video_id, "Deleted indexed video"),
                Err(e) => {
                    record_cleanup_failure("remote");
                    warn!(video_id = %video_id, "Failed to delete indexed video: {}", e);
                }
            }
        }))
    }
}

impl Drop for ResourceReaper {
    fn drop(&mut self) {
        if let Some(path) = self.local.take() {
            warn!(path = %path.display(), "Reaper dropped without release, removing local asset");
            remove_local(&path);
        }
    }
}

fn remove_local(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "Removed local asset"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            record_cleanup_failure("local");
            warn!(path = %path.display(), "Failed to remove local asset: {}", e);
        }
    }
}
