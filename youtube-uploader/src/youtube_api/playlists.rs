//! YouTube Playlists and PlaylistItems API types.

use crate::youtube_api::types::ExtraFields;
use serde::{Deserialize, Serialize};

/// Number of playlists requested from `playlists.list`.
pub const PLAYLISTS_PAGE_SIZE: u32 = 50;

/// A `playlist` resource represents a YouTube playlist.
///
/// See: <https://developers.google.com/youtube/v3/docs/playlists#resource>
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<PlaylistSnippet>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// See: <https://developers.google.com/youtube/v3/docs/playlists#snippet>
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSnippet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Request body for `playlistItems.insert`.
///
/// See: <https://developers.google.com/youtube/v3/docs/playlistItems/insert>
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaylistItemInsertRequest {
    pub snippet: PlaylistItemInsertSnippet,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemInsertSnippet {
    pub playlist_id: String,
    pub resource_id: ResourceId,
}

/// Identifies the resource a playlist item points at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceId {
    /// Always `youtube#video` for playlist items created by this crate.
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
}

impl PlaylistItemInsertRequest {
    pub fn new(video_id: &str, playlist_id: &str) -> Self {
        Self {
            snippet: PlaylistItemInsertSnippet {
                playlist_id: playlist_id.to_string(),
                resource_id: ResourceId {
                    kind: "youtube#video".to_string(),
                    video_id: Some(video_id.to_string()),
                },
            },
        }
    }
}

/// A `playlistItem` resource identifies another resource, such as a video, that is included in a playlist.
///
/// See: <https://developers.google.com/youtube/v3/docs/playlistItems#resource>
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistItem {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<PlaylistItemSnippet>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemSnippet {
    pub playlist_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<ResourceId>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}
