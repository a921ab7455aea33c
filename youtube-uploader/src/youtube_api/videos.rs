//! YouTube Videos API types and request building for `videos.insert`.

use crate::youtube_api::error::{Error, Result};
use crate::youtube_api::types::ExtraFields;
use jiff::Timestamp;
use jiff::civil;
use jiff::tz::TimeZone;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Title used when the caller does not supply one.
pub const DEFAULT_TITLE: &str = "Untitled Video";
/// "People & Blogs", YouTube's general-purpose category.
pub const DEFAULT_CATEGORY_ID: &str = "22";
/// Language used for both the metadata and the audio track unless overridden.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Caller-supplied metadata for a video upload.
///
/// Every field is optional; [`build_video_insert`] fills in the documented defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub category_id: Option<String>,
    /// Used for both `defaultLanguage` and `defaultAudioLanguage`.
    pub language: Option<String>,
    pub privacy_status: Option<PrivacyStatus>,
    pub embeddable: Option<bool>,
    pub public_stats_viewable: Option<bool>,
    pub made_for_kids: Option<bool>,
    /// When the video should go public, in any format [`normalize_publish_at`] accepts.
    pub publish_at: Option<String>,
    /// `Some(false)` disables comments on the uploaded video.
    pub allow_comments: Option<bool>,
}

/// The video's privacy status.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos#status.privacyStatus>
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PrivacyStatus {
    /// Only the owner and explicitly shared users can watch the video.
    #[default]
    Private,
    /// Anyone with the link can watch the video.
    Unlisted,
    /// Anyone can find and watch the video.
    Public,
}

impl fmt::Display for PrivacyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Private => write!(f, "private"),
            Self::Unlisted => write!(f, "unlisted"),
            Self::Public => write!(f, "public"),
        }
    }
}

/// Request body for `videos.insert` with `part=snippet,status`.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos/insert>
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoInsertRequest {
    pub snippet: VideoInsertSnippet,
    pub status: VideoInsertStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInsertSnippet {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub category_id: String,
    pub default_language: String,
    pub default_audio_language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInsertStatus {
    pub privacy_status: PrivacyStatus,
    pub embeddable: bool,
    pub public_stats_viewable: bool,
    pub self_declared_made_for_kids: bool,
    /// Scheduled publication time, always serialized as a UTC ISO 8601 timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_moderation_status: Option<CommentModerationStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommentModerationStatus {
    Disabled,
}

/// Merges `metadata` over the upload defaults.
///
/// This is pure: it performs no I/O and can be checked without a client.
pub fn build_video_insert(metadata: &UploadMetadata) -> Result<VideoInsertRequest> {
    let language = metadata
        .language
        .clone()
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

    let publish_at = metadata
        .publish_at
        .as_deref()
        .map(normalize_publish_at)
        .transpose()?;

    let comment_moderation_status =
        (metadata.allow_comments == Some(false)).then_some(CommentModerationStatus::Disabled);

    Ok(VideoInsertRequest {
        snippet: VideoInsertSnippet {
            title: metadata
                .title
                .clone()
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            description: metadata.description.clone().unwrap_or_default(),
            tags: metadata.tags.clone().unwrap_or_default(),
            category_id: metadata
                .category_id
                .clone()
                .unwrap_or_else(|| DEFAULT_CATEGORY_ID.to_string()),
            default_audio_language: language.clone(),
            default_language: language,
        },
        status: VideoInsertStatus {
            privacy_status: metadata.privacy_status.unwrap_or_default(),
            embeddable: metadata.embeddable.unwrap_or(true),
            public_stats_viewable: metadata.public_stats_viewable.unwrap_or(true),
            self_declared_made_for_kids: metadata.made_for_kids.unwrap_or(false),
            publish_at,
            comment_moderation_status,
        },
    })
}

/// Parses a scheduled publication time into an absolute UTC instant.
///
/// Accepts an RFC 3339 timestamp with an offset, a civil date-time (taken as UTC),
/// or a bare date (midnight UTC).
pub fn normalize_publish_at(input: &str) -> Result<Timestamp> {
    let input = input.trim();
    if let Ok(ts) = input.parse::<Timestamp>() {
        return Ok(ts);
    }
    let zoned = if let Ok(dt) = input.parse::<civil::DateTime>() {
        dt.to_zoned(TimeZone::UTC)
    } else if let Ok(date) = input.parse::<civil::Date>() {
        date.to_zoned(TimeZone::UTC)
    } else {
        return Err(Error::InvalidMetadata(format!(
            "publish time {input:?} is not a valid date"
        )));
    };
    zoned
        .map(|z| z.timestamp())
        .map_err(|e| Error::InvalidMetadata(format!("publish time {input:?}: {e}")))
}

/// A `video` resource represents a YouTube video.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos#resource>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    /// The ID that YouTube uses to uniquely identify the video.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<VideoSnippet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<VideoStatus>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Basic details about the video as YouTube stored them.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos#snippet>
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSnippet {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// See: <https://developers.google.com/youtube/v3/docs/videos#status>
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatus {
    /// `uploaded`, `processed`, `failed`, `rejected` or `deleted`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privacy_status: Option<PrivacyStatus>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}
