//! Publish videos to YouTube: upload with progress reporting, set thumbnails, pick
//! categories and playlists, and inspect the authenticated channel.
//!
//! The entry point is [`VideoUploader`], a thin facade over the typed
//! [`youtube_api::YouTubeClient`].
//!
//! ```rust,no_run
//! use tokio_util::sync::CancellationToken;
//! use youtube_uploader::{UploadMetadata, VideoUploader, YouTubeClient};
//!
//! # async fn example() -> Result<(), youtube_uploader::Error> {
//! let client = YouTubeClient::with_access_token("ya29...", reqwest::Client::new());
//! let uploader = VideoUploader::new(client);
//!
//! let metadata = UploadMetadata {
//!     title: Some("Launch day".into()),
//!     ..Default::default()
//! };
//! let mut on_progress = |p: youtube_uploader::UploadProgress| {
//!     println!("{}% {} ({})", p.percentage, p.status, p.eta);
//! };
//! let video = uploader
//!     .upload_video("launch.mp4", &metadata, Some(&mut on_progress), &CancellationToken::new())
//!     .await?;
//! uploader.set_thumbnail(&video.id, "launch.png").await?;
//! # Ok(())
//! # }
//! ```

use crate::oauth::OAuthManager;
use crate::youtube_api::client::TimeBoundAccessToken;
use eyre::Context;
use oauth2::basic::BasicTokenResponse;
use std::sync::Arc;

pub mod oauth;
pub mod observer;
pub mod progress;
pub mod uploader;
pub mod youtube_api;

pub use observer::{NoopObserver, Operation, TracingObserver, UploadObserver};
pub use progress::{UploadProgress, UploadStatus};
pub use uploader::VideoUploader;
pub use youtube_api::{
    ApiEndpoints, Error, PrivacyStatus, Result, UploadMetadata, UploadQuota, YouTubeClient,
};

/// Builds an authenticated client from a previously stored token, if any.
///
/// A stored token is refreshed straight away so it has its full lifetime ahead of it; if
/// that fails, or there is no stored token, the user is sent through the browser flow.
/// `notify` is called right before the browser opens.
///
/// Returns the client together with the token the caller should persist.
pub async fn setup_youtube_client(
    oauth_manager: Arc<OAuthManager>,
    http: reqwest::Client,
    stored_token: Option<&str>,
    mut notify: impl FnMut(&str),
) -> eyre::Result<(YouTubeClient, BasicTokenResponse)> {
    let stored: Option<BasicTokenResponse> = match stored_token.map(str::trim) {
        None | Some("") => None,
        Some(json) => Some(serde_json::from_str(json).context("parse stored YouTube token")?),
    };

    let token = match stored {
        Some(raw) => {
            tracing::info!("refreshing stored token");
            let mut token = TimeBoundAccessToken::expired(raw);
            if token
                .refresh(&oauth_manager)
                .await
                .context("refresh stored token")?
            {
                token
            } else {
                tracing::warn!("stored token could not be refreshed, re-authenticating");
                notify("YouTube token refresh failed. You need to re-authenticate in your browser.");
                TimeBoundAccessToken::new(
                    oauth_manager
                        .authenticate()
                        .await
                        .context("authorize user to YouTube")?,
                )
            }
        }
        None => {
            notify("You need to authorize access to your YouTube channel in your browser.");
            TimeBoundAccessToken::new(
                oauth_manager
                    .authenticate()
                    .await
                    .context("authorize user to YouTube")?,
            )
        }
    };

    let raw = token.raw_token().clone();
    Ok((YouTubeClient::new(token, oauth_manager, http), raw))
}
