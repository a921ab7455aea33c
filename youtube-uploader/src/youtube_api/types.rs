//! Shared types for the YouTube API client.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fields of a resource that this crate does not model explicitly.
///
/// Records are handed back to callers as YouTube returned them, so anything not
/// captured by a typed field lands here rather than being dropped.
pub type ExtraFields = Map<String, Value>;

/// Generic response structure for the `*.list` API calls.
///
/// See: <https://developers.google.com/youtube/v3/docs/videoCategories/list>
#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse<T> {
    /// Identifies the API resource's type, e.g. `youtube#playlistListResponse`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    /// The items that match the request criteria, in the order YouTube returned them.
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(rename = "pageInfo", default, skip_serializing_if = "Option::is_none")]
    pub page_info: Option<PageInfo>,
    /// Token that can be used as the value of the pageToken parameter to retrieve the next page in the result set.
    #[serde(rename = "nextPageToken", default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// Paging details for lists of resources.
///
/// Includes the total number of items available and the number of resources
/// returned in a single page response.
///
/// See: <https://developers.google.com/youtube/v3/docs/pageInfo>
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct PageInfo {
    /// The total number of results in the result set.
    #[serde(rename = "totalResults")]
    pub total_results: u32,
    /// The number of results included in the API response.
    #[serde(rename = "resultsPerPage")]
    pub results_per_page: u32,
}
