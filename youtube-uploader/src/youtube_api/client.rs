//! Core YouTube API client functionality and authentication management.

use crate::oauth::OAuthManager;
use crate::youtube_api::{
    categories::VideoCategory,
    channels::Channel,
    error::{Error, Result},
    playlists::{Playlist, PlaylistItem, PlaylistItemInsertRequest},
    thumbnails::ThumbnailSetResponse,
    types::ListResponse,
    videos::{Video, VideoInsertRequest},
};
use eyre::Context;
use http::Method;
use http::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use oauth2::basic::{BasicTokenResponse, BasicTokenType};
use oauth2::{AccessToken, EmptyExtraTokenFields, TokenResponse};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::Mutex;
use tracing::instrument;

/// Base URL of the YouTube Data API v3.
pub const API_BASE: &str = "https://www.googleapis.com/youtube/v3";
/// Base URL for media uploads to the YouTube Data API v3.
pub const UPLOAD_BASE: &str = "https://www.googleapis.com/upload/youtube/v3";

/// Where the client sends its requests.
///
/// Defaults to Google's production hosts. Overriding it is mostly useful for pointing
/// the client at a local test server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoints {
    /// Base for JSON resource endpoints, e.g. `{api_base}/playlists`.
    pub api_base: String,
    /// Base for media endpoints, e.g. `{upload_base}/videos`.
    pub upload_base: String,
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self {
            api_base: API_BASE.to_string(),
            upload_base: UPLOAD_BASE.to_string(),
        }
    }
}

impl ApiEndpoints {
    /// Uses `base` for both resource and media endpoints, mirroring Google's path layout.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            api_base: format!("{base}/youtube/v3"),
            upload_base: format!("{base}/upload/youtube/v3"),
        }
    }

    fn api(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path)
    }

    fn upload(&self, path: &str) -> String {
        format!("{}/{}", self.upload_base, path)
    }
}

#[derive(Debug, Clone)]
pub struct TimeBoundAccessToken {
    token: BasicTokenResponse,
    /// When the current access token expires (with safety buffer).
    ///
    /// `None` for tokens whose lifetime is managed by the caller.
    expires_at: Option<SystemTime>,
}

impl TimeBoundAccessToken {
    /// Creates a token that is already expired, forcing a refresh before first use.
    ///
    /// This is useful when loading tokens from storage where you want to ensure
    /// they are validated before use.
    pub fn expired(token: BasicTokenResponse) -> Self {
        Self {
            expires_at: Some(SystemTime::UNIX_EPOCH),
            token,
        }
    }

    /// Creates a token whose expiry is derived from its `expires_in` field minus
    /// a 5-minute safety buffer.
    pub fn new(token: BasicTokenResponse) -> Self {
        Self {
            expires_at: Some(Self::calculate_token_expiry(&token)),
            token,
        }
    }

    /// Wraps a bare bearer token obtained elsewhere.
    ///
    /// The client never tries to refresh such a token; keeping it valid is up to the host.
    pub fn from_access_token(access_token: impl Into<String>) -> Self {
        Self {
            token: BasicTokenResponse::new(
                AccessToken::new(access_token.into()),
                BasicTokenType::Bearer,
                EmptyExtraTokenFields {},
            ),
            expires_at: None,
        }
    }

    pub fn raw_token(&self) -> &BasicTokenResponse {
        &self.token
    }

    fn is_expired(&self, now: SystemTime) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }

    /// Refreshes this token using the provided OAuth manager, preserving the refresh token.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - Token was successfully refreshed
    /// * `Ok(false)` - Refresh failed (invalid grant, no refresh token, etc.)
    /// * `Err(_)` - Network or other error occurred
    pub async fn refresh(&mut self, oauth_manager: &OAuthManager) -> eyre::Result<bool> {
        tracing::trace!("refreshing token");
        let Some(new_token) = oauth_manager
            .refresh_token(self.token.clone())
            .await
            .context("refresh OAuth token")?
        else {
            return Ok(false);
        };

        let old_token = std::mem::replace(&mut self.token, new_token);
        // Google usually omits the refresh token from refresh responses.
        if self.token.refresh_token().is_none() {
            tracing::trace!("new token lacks refresh token, preserving original");
            self.token
                .set_refresh_token(old_token.refresh_token().cloned());
        }
        self.expires_at = Some(Self::calculate_token_expiry(&self.token));
        Ok(true)
    }

    /// Uses the current time + expires_in - 5 minutes, or 55 minutes if the
    /// token does not say when it expires.
    fn calculate_token_expiry(token: &BasicTokenResponse) -> SystemTime {
        let now = SystemTime::now();
        match token.expires_in() {
            Some(expires_in) => now + expires_in.saturating_sub(Duration::from_secs(300)),
            None => now + Duration::from_secs(3300),
        }
    }
}

/// Client for the parts of the YouTube Data API v3 used for publishing videos.
///
/// The client wraps an OAuth2 token and refreshes it before a request whenever it is
/// about to expire. Cloning is cheap and clones share the same token.
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    token: Arc<Mutex<TimeBoundAccessToken>>,
    /// Used to refresh expired tokens; absent for caller-managed tokens.
    oauth_manager: Option<Arc<OAuthManager>>,
    client: reqwest::Client,
    endpoints: ApiEndpoints,
}

impl YouTubeClient {
    /// Creates a client that refreshes `token` through `oauth_manager` as needed.
    pub fn new(
        token: TimeBoundAccessToken,
        oauth_manager: Arc<OAuthManager>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            token: Arc::new(Mutex::new(token)),
            oauth_manager: Some(oauth_manager),
            client,
            endpoints: ApiEndpoints::default(),
        }
    }

    /// Creates a client around a bearer token whose refresh is handled by the caller.
    pub fn with_access_token(access_token: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            token: Arc::new(Mutex::new(TimeBoundAccessToken::from_access_token(
                access_token,
            ))),
            oauth_manager: None,
            client,
            endpoints: ApiEndpoints::default(),
        }
    }

    /// Sends requests to `endpoints` instead of Google's production hosts.
    pub fn with_endpoints(mut self, endpoints: ApiEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn endpoints(&self) -> &ApiEndpoints {
        &self.endpoints
    }

    /// Returns a clone of the underlying OAuth2 token, e.g. for persisting it.
    pub async fn token(&self) -> BasicTokenResponse {
        self.token.lock().await.token.clone()
    }

    /// Gets a guaranteed-fresh access token, refreshing if necessary.
    #[instrument(skip(self), level = tracing::Level::TRACE)]
    async fn fresh_access_token(&self) -> Result<String> {
        let mut token = self.token.lock().await;

        if token.is_expired(SystemTime::now()) {
            tracing::debug!("access token expired, attempting refresh");
            let Some(oauth_manager) = &self.oauth_manager else {
                return Err(Error::Auth(eyre::eyre!(
                    "access token expired and no OAuth manager is available to refresh it"
                )));
            };
            match token.refresh(oauth_manager).await {
                Ok(true) => tracing::debug!("access token successfully refreshed"),
                Ok(false) => {
                    tracing::error!("access token refresh failed, client is unusable");
                    return Err(Error::Auth(eyre::eyre!(
                        "unable to refresh expired access token"
                    )));
                }
                Err(e) => return Err(Error::Auth(e)),
            }
        }

        Ok(token.token.access_token().secret().to_string())
    }

    /// Makes an authenticated JSON request to the YouTube API.
    ///
    /// Adds the bearer token, the query parameters and (optionally) a JSON body, and
    /// turns non-success responses into [`Error::Api`].
    #[instrument(skip(self, json_body), level = tracing::Level::TRACE)]
    async fn make_authenticated_request(
        &self,
        method: Method,
        url: &str,
        query_params: &[(&str, &str)],
        json_body: Option<&(impl Serialize + Sync)>,
    ) -> Result<reqwest::Response> {
        let access_token = self.fresh_access_token().await?;

        let mut request = self
            .client
            .request(method, url)
            .header(AUTHORIZATION, format!("Bearer {access_token}"))
            .query(query_params);
        if let Some(body) = json_body {
            request = request.json(body);
        }

        check_status(request.send().await?).await
    }

    /// Like [`Self::make_authenticated_request`], but streams `body` as raw media.
    #[instrument(skip(self, body), level = tracing::Level::TRACE)]
    async fn send_media(
        &self,
        method: Method,
        url: &str,
        query_params: &[(&str, &str)],
        content_type: &str,
        content_length: u64,
        body: reqwest::Body,
    ) -> Result<reqwest::Response> {
        let access_token = self.fresh_access_token().await?;

        let response = self
            .client
            .request(method, url)
            .header(AUTHORIZATION, format!("Bearer {access_token}"))
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, content_length)
            .query(query_params)
            .body(body)
            .send()
            .await?;

        check_status(response).await
    }

    /// Opens a resumable upload session for a new video and returns the session URL.
    ///
    /// The session URL is where the video bytes must be sent next, see
    /// [`Self::upload_video_content`].
    ///
    /// # Required Scopes
    ///
    /// * `https://www.googleapis.com/auth/youtube.upload`
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/guides/using_resumable_upload_protocol>
    #[instrument(skip(self, request))]
    pub async fn start_video_upload(
        &self,
        request: &VideoInsertRequest,
        content_length: u64,
        content_type: &str,
    ) -> Result<String> {
        let url = self.endpoints.upload("videos");
        let content_length = content_length.to_string();
        let access_token = self.fresh_access_token().await?;

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {access_token}"))
            .header("X-Upload-Content-Length", &content_length)
            .header("X-Upload-Content-Type", content_type)
            .query(&[("uploadType", "resumable"), ("part", "snippet,status")])
            .json(request)
            .send()
            .await?;
        let response = check_status(response).await?;

        let session_url = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(Error::MissingUploadLocation)?
            .to_string();

        tracing::debug!(
            privacy = %request.status.privacy_status,
            "opened resumable upload session"
        );
        Ok(session_url)
    }

    /// Sends the video bytes to a resumable upload session in a single request.
    ///
    /// Returns the created [`Video`] once YouTube has received every byte.
    #[instrument(skip(self, session_url, body))]
    pub async fn upload_video_content(
        &self,
        session_url: &str,
        content_length: u64,
        content_type: &str,
        body: reqwest::Body,
    ) -> Result<Video> {
        let response = self
            .send_media(
                Method::PUT,
                session_url,
                &[],
                content_type,
                content_length,
                body,
            )
            .await?;

        let video: Video = parse_json(response).await?;
        tracing::debug!(video_id = %video.id, "video upload accepted");
        Ok(video)
    }

    /// Uploads a custom thumbnail and sets it for the given video.
    ///
    /// # Required Scopes
    ///
    /// * `https://www.googleapis.com/auth/youtube.upload`
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/thumbnails/set>
    #[instrument(skip(self, body))]
    pub async fn set_thumbnail(
        &self,
        video_id: &str,
        content_type: &str,
        content_length: u64,
        body: reqwest::Body,
    ) -> Result<ThumbnailSetResponse> {
        let url = self.endpoints.upload("thumbnails/set");
        let query_params = [("videoId", video_id), ("uploadType", "media")];

        let response = self
            .send_media(
                Method::POST,
                &url,
                &query_params,
                content_type,
                content_length,
                body,
            )
            .await?;

        let thumbnails: ThumbnailSetResponse = parse_json(response).await?;
        tracing::debug!(
            video_id,
            returned_items = thumbnails.items.len(),
            "set video thumbnail"
        );
        Ok(thumbnails)
    }

    /// Lists the categories that can be assigned to videos in `region_code`.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/videoCategories/list>
    #[instrument(skip(self))]
    pub async fn list_video_categories(
        &self,
        region_code: &str,
    ) -> Result<ListResponse<VideoCategory>> {
        let url = self.endpoints.api("videoCategories");
        let query_params = [("part", "snippet"), ("regionCode", region_code)];

        let response = self
            .make_authenticated_request(Method::GET, &url, &query_params, None::<&()>)
            .await?;

        let categories: ListResponse<VideoCategory> = parse_json(response).await?;
        tracing::debug!(
            returned_items = categories.items.len(),
            "fetched video categories"
        );
        Ok(categories)
    }

    /// Lists playlists owned by the authenticated user.
    ///
    /// Only the first page is fetched.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/playlists/list>
    #[instrument(skip(self))]
    pub async fn list_my_playlists(&self, max_results: u32) -> Result<ListResponse<Playlist>> {
        let url = self.endpoints.api("playlists");
        let max_results = max_results.to_string();
        let query_params = [
            ("part", "snippet,contentDetails"),
            ("mine", "true"),
            ("maxResults", max_results.as_str()),
        ];

        let response = self
            .make_authenticated_request(Method::GET, &url, &query_params, None::<&()>)
            .await?;

        let playlists: ListResponse<Playlist> = parse_json(response).await?;
        tracing::debug!(
            total_results = playlists.page_info.map(|p| p.total_results),
            returned_items = playlists.items.len(),
            "fetched playlists"
        );
        Ok(playlists)
    }

    /// Adds a resource to a playlist.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/playlistItems/insert>
    #[instrument(skip(self), ret)]
    pub async fn insert_playlist_item(
        &self,
        request: &PlaylistItemInsertRequest,
    ) -> Result<PlaylistItem> {
        let url = self.endpoints.api("playlistItems");
        let query_params = [("part", "snippet")];

        let response = self
            .make_authenticated_request(Method::POST, &url, &query_params, Some(request))
            .await?;

        let item: PlaylistItem = parse_json(response).await?;
        tracing::debug!(playlist_item_id = %item.id, "inserted playlist item");
        Ok(item)
    }

    /// Lists the channels owned by the authenticated user, with statistics and status.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/channels/list>
    #[instrument(skip(self))]
    pub async fn list_my_channels(&self) -> Result<ListResponse<Channel>> {
        let url = self.endpoints.api("channels");
        let query_params = [
            ("part", "statistics,status,contentDetails"),
            ("mine", "true"),
        ];

        let response = self
            .make_authenticated_request(Method::GET, &url, &query_params, None::<&()>)
            .await?;

        let channels: ListResponse<Channel> = parse_json(response).await?;
        tracing::debug!(returned_items = channels.items.len(), "fetched channels");
        Ok(channels)
    }
}

/// Turns a non-success response into [`Error::Api`], keeping YouTube's error body.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    Err(Error::from_response_text(status, text))
}

async fn parse_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}
