//! The uploader facade: one method per publishing operation.

use crate::observer::{Operation, TracingObserver, UploadObserver};
use crate::progress::{ProgressTracker, UploadProgress};
use crate::youtube_api::categories::DEFAULT_REGION_CODE;
use crate::youtube_api::playlists::PLAYLISTS_PAGE_SIZE;
use crate::youtube_api::thumbnails::image_content_type;
use crate::youtube_api::videos::build_video_insert;
use crate::youtube_api::{
    Error, Playlist, PlaylistItem, PlaylistItemInsertRequest, Result, ThumbnailSetResponse,
    UploadMetadata, UploadQuota, Video, VideoCategory, YouTubeClient,
};
use bytes::Bytes;
use std::fmt;
use std::io;
use std::path::Path;
use std::sync::Arc;
use tokio::fs::File;
use tokio::sync::mpsc;
use tokio_stream::{Stream, StreamExt};
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;

/// Size of the chunks a file is streamed in. Cancellation is checked between chunks.
pub const UPLOAD_CHUNK_SIZE: usize = 256 * 1024;

const VIDEO_CONTENT_TYPE: &str = "video/*";

/// Publishes videos to the channel behind an authenticated [`YouTubeClient`].
///
/// Each method is a single, independent exchange with YouTube. Nothing is retried: errors
/// are reported to the observer and then returned as-is. The uploader is cheap to clone
/// and can be used from several tasks at once.
#[derive(Clone)]
pub struct VideoUploader {
    client: YouTubeClient,
    observer: Arc<dyn UploadObserver>,
}

impl fmt::Debug for VideoUploader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoUploader")
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

impl VideoUploader {
    /// Creates an uploader that logs its activity through `tracing`.
    pub fn new(client: YouTubeClient) -> Self {
        Self {
            client,
            observer: Arc::new(TracingObserver),
        }
    }

    /// Replaces the observer that is told about requests, progress and failures.
    pub fn with_observer(mut self, observer: impl UploadObserver + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    pub fn client(&self) -> &YouTubeClient {
        &self.client
    }

    /// Uploads the video at `path` and returns the video resource YouTube created.
    ///
    /// `metadata` is merged over the defaults described on [`UploadMetadata`]. The file is
    /// streamed, never read into memory as a whole. If `on_progress` is given it is called
    /// each time the rounded percentage of bytes sent goes up.
    ///
    /// Cancelling `cancel` aborts the upload at the next chunk boundary with
    /// [`Error::Cancelled`].
    ///
    /// # Errors
    ///
    /// [`Error::FileNotFound`] if `path` does not exist; nothing is sent to YouTube in that case.
    pub async fn upload_video(
        &self,
        path: impl AsRef<Path>,
        metadata: &UploadMetadata,
        on_progress: Option<&mut (dyn FnMut(UploadProgress) + Send)>,
        cancel: &CancellationToken,
    ) -> Result<Video> {
        let path = path.as_ref();
        self.observer
            .request_started(Operation::UploadVideo, &path.display().to_string());
        let result = self
            .upload_video_inner(path, metadata, on_progress, cancel)
            .await;
        self.report(Operation::UploadVideo, result, |video| video.id.clone())
    }

    async fn upload_video_inner(
        &self,
        path: &Path,
        metadata: &UploadMetadata,
        on_progress: Option<&mut (dyn FnMut(UploadProgress) + Send)>,
        cancel: &CancellationToken,
    ) -> Result<Video> {
        let (file, total_bytes) = open_existing(path).await?;
        let request = build_video_insert(metadata)?;
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let session_url = self
            .client
            .start_video_upload(&request, total_bytes, VIDEO_CONTENT_TYPE)
            .await?;

        let (sent_tx, mut sent_rx) = mpsc::unbounded_channel();
        let body = reqwest::Body::wrap_stream(chunked(file, cancel.clone(), sent_tx));
        let upload = self.client.upload_video_content(
            &session_url,
            total_bytes,
            VIDEO_CONTENT_TYPE,
            body,
        );
        let mut upload = std::pin::pin!(upload);

        let mut reporter = on_progress.map(|callback| (ProgressTracker::new(total_bytes), callback));
        let observer = &self.observer;
        let mut emit = |bytes_sent: u64| {
            if let Some((tracker, callback)) = reporter.as_mut() {
                if let Some(progress) = tracker.observe(bytes_sent) {
                    observer.upload_progress(&progress);
                    callback(progress);
                }
            }
        };

        let result = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break Err(Error::Cancelled),
                Some(bytes_sent) = sent_rx.recv() => emit(bytes_sent),
                result = &mut upload => break result,
            }
        };

        match result {
            Ok(video) => {
                while let Ok(bytes_sent) = sent_rx.try_recv() {
                    emit(bytes_sent);
                }
                // Empty files never produce a chunk.
                emit(total_bytes);
                Ok(video)
            }
            // The body stream bails out with an I/O error once cancelled, which reaches us
            // as a transport failure.
            Err(Error::Transport(_)) if cancel.is_cancelled() => Err(Error::Cancelled),
            Err(e) => Err(e),
        }
    }

    /// Uploads the image at `image_path` as the custom thumbnail of `video_id`.
    ///
    /// # Errors
    ///
    /// [`Error::FileNotFound`] if the image does not exist; nothing is sent to YouTube in that case.
    pub async fn set_thumbnail(
        &self,
        video_id: &str,
        image_path: impl AsRef<Path>,
    ) -> Result<ThumbnailSetResponse> {
        let image_path = image_path.as_ref();
        self.observer
            .request_started(Operation::SetThumbnail, video_id);
        let result = async {
            let (file, len) = open_existing(image_path).await?;
            let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
            self.client
                .set_thumbnail(video_id, image_content_type(image_path), len, body)
                .await
        }
        .await;
        self.report(Operation::SetThumbnail, result, |_| video_id.to_string())
    }

    /// Lists the video categories available in `region_code` (default `"US"`).
    ///
    /// Categories are returned exactly as YouTube listed them.
    pub async fn get_video_categories(
        &self,
        region_code: Option<&str>,
    ) -> Result<Vec<VideoCategory>> {
        let region_code = region_code.unwrap_or(DEFAULT_REGION_CODE);
        self.observer
            .request_started(Operation::ListVideoCategories, region_code);
        let result = self
            .client
            .list_video_categories(region_code)
            .await
            .map(|response| response.items);
        self.report(Operation::ListVideoCategories, result, |items| {
            format!("{} categories", items.len())
        })
    }

    /// Lists up to 50 playlists owned by the authenticated account, in YouTube's order.
    pub async fn get_my_playlists(&self) -> Result<Vec<Playlist>> {
        self.observer.request_started(Operation::ListPlaylists, "mine");
        let result = self
            .client
            .list_my_playlists(PLAYLISTS_PAGE_SIZE)
            .await
            .map(|response| response.items);
        self.report(Operation::ListPlaylists, result, |items| {
            format!("{} playlists", items.len())
        })
    }

    /// Appends `video_id` to the playlist `playlist_id`.
    pub async fn add_video_to_playlist(
        &self,
        video_id: &str,
        playlist_id: &str,
    ) -> Result<PlaylistItem> {
        self.observer
            .request_started(Operation::AddToPlaylist, playlist_id);
        let request = PlaylistItemInsertRequest::new(video_id, playlist_id);
        let result = self.client.insert_playlist_item(&request).await;
        self.report(Operation::AddToPlaylist, result, |item| item.id.clone())
    }

    /// Summarizes the authenticated account's channel.
    ///
    /// # Errors
    ///
    /// [`Error::NoChannelFound`] if the account has no channel.
    pub async fn get_upload_quota(&self) -> Result<UploadQuota> {
        self.observer
            .request_started(Operation::GetUploadQuota, "mine");
        let result = self.client.list_my_channels().await.and_then(|channels| {
            channels
                .items
                .into_iter()
                .next()
                .map(UploadQuota::from)
                .ok_or(Error::NoChannelFound)
        });
        self.report(Operation::GetUploadQuota, result, |quota| {
            quota.channel_id.clone()
        })
    }

    fn report<T>(
        &self,
        operation: Operation,
        result: Result<T>,
        describe: impl FnOnce(&T) -> String,
    ) -> Result<T> {
        match &result {
            Ok(value) => self.observer.request_succeeded(operation, &describe(value)),
            Err(e) => self.observer.request_failed(operation, e),
        }
        result
    }
}

/// Opens a local file the operation is about to stream, returning it with its size.
async fn open_existing(path: &Path) -> Result<(File, u64)> {
    let not_found = || Error::FileNotFound {
        path: path.to_path_buf(),
    };
    let file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(not_found()),
        Err(e) => return Err(e.into()),
    };
    let metadata = file.metadata().await?;
    if !metadata.is_file() {
        return Err(not_found());
    }
    Ok((file, metadata.len()))
}

/// Streams `file` in [`UPLOAD_CHUNK_SIZE`] chunks, reporting the running byte count on
/// `sent` and failing the stream once `cancel` fires.
fn chunked(
    file: File,
    cancel: CancellationToken,
    sent: mpsc::UnboundedSender<u64>,
) -> impl Stream<Item = io::Result<Bytes>> + Send + Sync + 'static {
    let mut bytes_sent = 0u64;
    ReaderStream::with_capacity(file, UPLOAD_CHUNK_SIZE).map(move |chunk| {
        if cancel.is_cancelled() {
            return Err(io::Error::new(io::ErrorKind::Interrupted, "upload cancelled"));
        }
        let chunk = chunk?;
        bytes_sent += chunk.len() as u64;
        // The receiver is gone once the request has completed.
        let _ = sent.send(bytes_sent);
        Ok(chunk)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let path = Path::new("/definitely/not/here.mp4");
        assert!(matches!(
            open_existing(path).await,
            Err(Error::FileNotFound { path: p }) if p.as_path() == path
        ));
    }

    #[tokio::test]
    async fn directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            open_existing(dir.path()).await,
            Err(Error::FileNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn chunks_report_running_total() {
        let mut fixture = tempfile::NamedTempFile::new().unwrap();
        fixture
            .write_all(&vec![7u8; UPLOAD_CHUNK_SIZE + 10])
            .unwrap();
        let (file, len) = open_existing(fixture.path()).await.unwrap();
        assert_eq!(len, (UPLOAD_CHUNK_SIZE + 10) as u64);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let stream = chunked(file, CancellationToken::new(), tx);
        let chunks: Vec<Bytes> = stream.map(|c| c.unwrap()).collect().await;
        assert_eq!(chunks.iter().map(Bytes::len).sum::<usize>(), UPLOAD_CHUNK_SIZE + 10);

        let mut last = 0;
        while let Ok(sent) = rx.try_recv() {
            assert!(sent > last);
            last = sent;
        }
        assert_eq!(last, len);
    }

    #[tokio::test]
    async fn cancelled_stream_fails() {
        let mut fixture = tempfile::NamedTempFile::new().unwrap();
        fixture.write_all(b"some video bytes").unwrap();
        let (file, _) = open_existing(fixture.path()).await.unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut stream = std::pin::pin!(chunked(file, cancel, tx));
        let first = stream.next().await.unwrap();
        assert_eq!(first.unwrap_err().kind(), io::ErrorKind::Interrupted);
    }
}
