//! YouTube Thumbnails API types.

use crate::youtube_api::types::ExtraFields;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Response from `thumbnails.set`.
///
/// Lists the thumbnail renditions YouTube generated from the uploaded image, keyed by
/// size name (`default`, `medium`, `high`, ...).
///
/// See: <https://developers.google.com/youtube/v3/docs/thumbnails/set>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailSetResponse {
    /// The value will be `youtube#thumbnailSetResponse`.
    pub kind: String,
    #[serde(default)]
    pub items: Vec<BTreeMap<String, Thumbnail>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// See: <https://developers.google.com/youtube/v3/docs/thumbnails#resource>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thumbnail {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Picks the MIME type YouTube expects for an image based on its extension.
pub fn image_content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}
