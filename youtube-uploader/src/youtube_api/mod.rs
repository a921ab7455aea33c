//! YouTube Data API v3 client library.
//!
//! Covers the endpoints needed to publish a video: resumable video uploads, thumbnails,
//! video categories, playlists and the authenticated user's channel.
//!
//! Records returned by YouTube are deserialized into typed structs that model the fields
//! this crate reads. Everything else in a record is kept in a flattened `extra` map, so
//! a caller that needs, say, a video's `contentDetails` still gets it verbatim.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use youtube_uploader::youtube_api::YouTubeClient;
//!
//! # async fn example() -> Result<(), youtube_uploader::youtube_api::Error> {
//! let client = YouTubeClient::with_access_token("ya29...", reqwest::Client::new());
//! let categories = client.list_video_categories("US").await?;
//! for category in categories.items {
//!     println!("{}", category.id);
//! }
//! # Ok(())
//! # }
//! ```

pub mod categories;
pub mod channels;
pub mod client;
pub mod error;
pub mod playlists;
pub mod thumbnails;
pub mod types;
pub mod videos;

pub use client::{ApiEndpoints, TimeBoundAccessToken, YouTubeClient};
pub use error::{ApiError, ApiErrorBody, ApiErrorDetail, Error, Result};
pub use types::{ListResponse, PageInfo};

pub use categories::{VideoCategory, VideoCategorySnippet};
pub use channels::{Channel, ChannelStatistics, ChannelStatus, QuotaInfo, UploadQuota};
pub use playlists::{Playlist, PlaylistItem, PlaylistItemInsertRequest, PlaylistSnippet};
pub use thumbnails::{Thumbnail, ThumbnailSetResponse};
pub use videos::{PrivacyStatus, UploadMetadata, Video, VideoInsertRequest, VideoSnippet};
