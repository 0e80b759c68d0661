//! Staging of caller-supplied uploads into the pipeline work directory.
//!
//! A run deletes its asset when it finishes, so the caller's file is
//! copied into the work directory first and the copy is handed to the run.

use std::path::Path;

use tracing::debug;

use vscore_models::{RunId, VideoAsset};

use crate::error::{PipelineError, PipelineResult};

/// Copy `source` into `work_dir` under a run-unique name.
pub async fn stage_upload(
    source: &Path,
    work_dir: &Path,
    run_id: &RunId,
) -> PipelineResult<VideoAsset> {
    let original = VideoAsset::from_path(source);
    if !tokio::fs::try_exists(source).await? {
        return Err(PipelineError::invalid_input(format!(
            "file not found: {}",
            source.display()
        )));
    }

    tokio::fs::create_dir_all(work_dir).await?;
    let staged = work_dir.join(format!("{}-{}", run_id, original.original_filename));
    let bytes = tokio::fs::copy(source, &staged).await?;
    debug!(path = %staged.display(), bytes, "Staged upload");

    Ok(VideoAsset::new(
        staged,
        original.content_type,
        original.original_filename,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stage_upload_copies_and_keeps_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("clip.mp4");
        std::fs::write(&source, b"frames").unwrap();

        let work_dir = dir.path().join("work");
        let run_id = RunId::new();
        let asset = stage_upload(&source, &work_dir, &run_id).await.unwrap();

        assert!(asset.path.starts_with(&work_dir));
        assert_eq!(asset.original_filename, "clip.mp4");
        assert_eq!(asset.content_type, "video/mp4");
        assert_eq!(std::fs::read(&asset.path).unwrap(), b"frames");
        assert!(source.exists());
    }

    #[tokio::test]
    async fn test_stage_missing_source_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let result = stage_upload(&dir.path().join("nope.mp4"), dir.path(), &RunId::new()).await;
        assert!(matches!(result, Err(PipelineError::InvalidInput(_))));
    }
}
