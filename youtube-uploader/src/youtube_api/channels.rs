//! YouTube Channels API types and the channel summary surfaced as "upload quota".

use crate::youtube_api::types::ExtraFields;
use serde::{Deserialize, Serialize};

/// A `channel` resource contains information about a YouTube channel.
///
/// Only the parts requested by [`crate::YouTubeClient::list_my_channels`] are modelled;
/// everything else is kept in `extra`.
///
/// See: <https://developers.google.com/youtube/v3/docs/channels#resource>
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    /// The ID that YouTube uses to uniquely identify the channel.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<ChannelStatistics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ChannelStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_details: Option<ExtraFields>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Statistics for the channel.
///
/// YouTube encodes the counters as decimal strings.
///
/// See: <https://developers.google.com/youtube/v3/docs/channels#statistics>
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStatistics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_count: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscriber_count: Option<String>,
    #[serde(default)]
    pub hidden_subscriber_count: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_count: Option<String>,
}

/// See: <https://developers.google.com/youtube/v3/docs/channels#status>
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStatus {
    /// `allowed`, `eligible` or `disallowed`: whether videos longer than 15 minutes can be uploaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_uploads_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub made_for_kids: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privacy_status: Option<String>,
}

/// A summary of the authenticated channel.
///
/// YouTube does not expose real quota limits through the Data API, so this reports the
/// channel statistics and upload-related status flags instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadQuota {
    pub channel_id: String,
    pub total_videos: u64,
    pub quota_info: QuotaInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaInfo {
    pub view_count: Option<u64>,
    pub subscriber_count: Option<u64>,
    pub hidden_subscriber_count: bool,
    pub long_uploads_status: Option<String>,
    pub made_for_kids: Option<bool>,
}

impl From<Channel> for UploadQuota {
    fn from(channel: Channel) -> Self {
        let statistics = channel.statistics.unwrap_or_default();
        let status = channel.status.unwrap_or_default();
        let count = |v: &Option<String>| v.as_deref().and_then(|v| v.parse::<u64>().ok());
        Self {
            channel_id: channel.id,
            total_videos: count(&statistics.video_count).unwrap_or(0),
            quota_info: QuotaInfo {
                view_count: count(&statistics.view_count),
                subscriber_count: count(&statistics.subscriber_count),
                hidden_subscriber_count: statistics.hidden_subscriber_count,
                long_uploads_status: status.long_uploads_status,
                made_for_kids: status.made_for_kids,
            },
        }
    }
}
