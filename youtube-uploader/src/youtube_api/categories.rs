//! YouTube Video Categories API types.

use crate::youtube_api::types::ExtraFields;
use serde::{Deserialize, Serialize};

/// Region used when the caller does not name one.
pub const DEFAULT_REGION_CODE: &str = "US";

/// A `videoCategory` resource identifies a category that can be associated with uploaded videos.
///
/// See: <https://developers.google.com/youtube/v3/docs/videoCategories#resource>
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoCategory {
    /// The ID that YouTube uses to uniquely identify the category, e.g. `"22"`.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<VideoCategorySnippet>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// See: <https://developers.google.com/youtube/v3/docs/videoCategories#snippet>
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoCategorySnippet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Whether videos can be associated with the category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}
