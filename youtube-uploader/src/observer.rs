//! Hooks for watching what the uploader does.
//!
//! [`crate::VideoUploader`] reports every request it starts, finishes or fails through an
//! [`UploadObserver`] rather than logging directly, so hosts can route these events
//! wherever they like (or nowhere, in tests).

use crate::progress::UploadProgress;
use crate::youtube_api::Error;

/// The facade operations, as reported to an [`UploadObserver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    UploadVideo,
    SetThumbnail,
    ListVideoCategories,
    ListPlaylists,
    AddToPlaylist,
    GetUploadQuota,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UploadVideo => "upload_video",
            Self::SetThumbnail => "set_thumbnail",
            Self::ListVideoCategories => "list_video_categories",
            Self::ListPlaylists => "list_playlists",
            Self::AddToPlaylist => "add_to_playlist",
            Self::GetUploadQuota => "get_upload_quota",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives events from [`crate::VideoUploader`].
///
/// All methods default to doing nothing.
pub trait UploadObserver: Send + Sync {
    /// An operation is about to talk to YouTube. `detail` names its main argument.
    fn request_started(&self, operation: Operation, detail: &str) {
        let _ = (operation, detail);
    }

    fn upload_progress(&self, progress: &UploadProgress) {
        let _ = progress;
    }

    /// `detail` names the resulting resource, e.g. the new video's ID.
    fn request_succeeded(&self, operation: Operation, detail: &str) {
        let _ = (operation, detail);
    }

    /// Called just before `error` is returned to the caller.
    fn request_failed(&self, operation: Operation, error: &Error) {
        let _ = (operation, error);
    }
}

impl<T: UploadObserver + ?Sized> UploadObserver for std::sync::Arc<T> {
    fn request_started(&self, operation: Operation, detail: &str) {
        (**self).request_started(operation, detail);
    }

    fn upload_progress(&self, progress: &UploadProgress) {
        (**self).upload_progress(progress);
    }

    fn request_succeeded(&self, operation: Operation, detail: &str) {
        (**self).request_succeeded(operation, detail);
    }

    fn request_failed(&self, operation: Operation, error: &Error) {
        (**self).request_failed(operation, error);
    }
}

/// Logs uploader events through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl UploadObserver for TracingObserver {
    fn request_started(&self, operation: Operation, detail: &str) {
        tracing::info!(%operation, detail, "starting YouTube request");
    }

    fn upload_progress(&self, progress: &UploadProgress) {
        tracing::debug!(
            percentage = progress.percentage,
            bytes_uploaded = progress.bytes_uploaded,
            total_bytes = progress.total_bytes,
            speed_mbps = progress.speed_mbps,
            eta = %progress.eta,
            "upload progress"
        );
    }

    fn request_succeeded(&self, operation: Operation, detail: &str) {
        tracing::info!(%operation, detail, "YouTube request succeeded");
    }

    fn request_failed(&self, operation: Operation, error: &Error) {
        tracing::error!(%operation, error = %error, "YouTube request failed");
    }
}

/// Ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl UploadObserver for NoopObserver {}
