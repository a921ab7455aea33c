mod common;

use common::{ACCESS_TOKEN, MockResponse, MockYouTube, unreachable_api};
use http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::io::Write;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use youtube_uploader::uploader::UPLOAD_CHUNK_SIZE;
use youtube_uploader::{
    Error, Operation, PrivacyStatus, UploadMetadata, UploadObserver, UploadProgress, UploadStatus,
};

fn fixture(len: usize) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".mp4").tempfile().unwrap();
    let bytes: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
    file.write_all(&bytes).unwrap();
    file.flush().unwrap();
    file
}

/// Answers the resumable-upload handshake and the media PUT like YouTube does.
fn upload_api(req: &common::RecordedRequest, base: &str) -> MockResponse {
    match (req.method.as_str(), req.path.as_str()) {
        ("POST", "/upload/youtube/v3/videos") => MockResponse::status(StatusCode::OK, "")
            .with_header("location", format!("{base}/upload-session/abc")),
        ("PUT", "/upload-session/abc") => MockResponse::json(json!({
            "kind": "youtube#video",
            "etag": "etag-1",
            "id": "vid123",
            "snippet": {
                "title": "Launch day",
                "description": "Behind the scenes",
                "publishedAt": "2024-01-02T03:04:05Z",
                "channelId": "UC1"
            },
            "status": { "uploadStatus": "uploaded", "privacyStatus": "unlisted" }
        })),
        _ => MockResponse::status(StatusCode::NOT_FOUND, "no such endpoint"),
    }
}

#[tokio::test]
async fn upload_of_missing_file_sends_nothing() {
    let api = unreachable_api().await;
    let result = api
        .uploader()
        .upload_video(
            "/no/such/video.mp4",
            &UploadMetadata::default(),
            None,
            &CancellationToken::new(),
        )
        .await;

    assert!(matches!(result, Err(Error::FileNotFound { .. })), "{result:?}");
    assert!(api.requests().is_empty());
}

#[tokio::test]
async fn thumbnail_of_missing_file_sends_nothing() {
    let api = unreachable_api().await;
    let result = api
        .uploader()
        .set_thumbnail("vid123", "/no/such/thumbnail.png")
        .await;

    assert!(matches!(result, Err(Error::FileNotFound { .. })), "{result:?}");
    assert!(api.requests().is_empty());
}

#[tokio::test]
async fn upload_streams_file_with_metadata() {
    let api = MockYouTube::start(upload_api).await;
    let len = 4 * UPLOAD_CHUNK_SIZE + 17;
    let file = fixture(len);

    let metadata = UploadMetadata {
        title: Some("Launch day".into()),
        description: Some("Behind the scenes".into()),
        privacy_status: Some(PrivacyStatus::Unlisted),
        allow_comments: Some(false),
        ..Default::default()
    };
    let mut snapshots = Vec::new();
    let mut on_progress = |p: UploadProgress| snapshots.push(p);
    let video = api
        .uploader()
        .upload_video(
            file.path(),
            &metadata,
            Some(&mut on_progress),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(video.id, "vid123");
    assert_eq!(video.extra["etag"], "etag-1");

    let requests = api.requests();
    assert_eq!(requests.len(), 2);

    let start = &requests[0];
    assert_eq!(start.method, Method::POST);
    assert_eq!(start.query["uploadType"], "resumable");
    assert_eq!(start.query["part"], "snippet,status");
    assert_eq!(
        start.header("authorization"),
        Some(format!("Bearer {ACCESS_TOKEN}").as_str())
    );
    assert_eq!(
        start.header("x-upload-content-length"),
        Some(len.to_string().as_str())
    );
    assert_eq!(
        start.json(),
        json!({
            "snippet": {
                "title": "Launch day",
                "description": "Behind the scenes",
                "tags": [],
                "categoryId": "22",
                "defaultLanguage": "en",
                "defaultAudioLanguage": "en"
            },
            "status": {
                "privacyStatus": "unlisted",
                "embeddable": true,
                "publicStatsViewable": true,
                "selfDeclaredMadeForKids": false,
                "commentModerationStatus": "disabled"
            }
        })
    );

    let media = &requests[1];
    assert_eq!(media.method, Method::PUT);
    assert_eq!(media.body.len(), len);
    assert_eq!(media.body.as_ref(), std::fs::read(file.path()).unwrap().as_slice());

    let percentages: Vec<u8> = snapshots.iter().map(|p| p.percentage).collect();
    assert!(
        percentages.windows(2).all(|w| w[0] < w[1]),
        "not strictly increasing: {percentages:?}"
    );
    let last = snapshots.last().expect("at least one progress report");
    assert_eq!(last.percentage, 100);
    assert_eq!(last.status, UploadStatus::Processing);
    assert!(last.bytes_uploaded <= len as u64);
    assert_eq!(last.total_bytes, len as u64);
}

#[tokio::test]
async fn empty_file_still_reports_completion() {
    let api = MockYouTube::start(upload_api).await;
    let file = fixture(0);

    let mut snapshots = Vec::new();
    let mut on_progress = |p: UploadProgress| snapshots.push(p.percentage);
    api.uploader()
        .upload_video(
            file.path(),
            &UploadMetadata::default(),
            Some(&mut on_progress),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(snapshots, vec![100]);
}

#[tokio::test]
async fn cancelled_upload_never_starts() {
    let api = unreachable_api().await;
    let file = fixture(1024);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = api
        .uploader()
        .upload_video(file.path(), &UploadMetadata::default(), None, &cancel)
        .await;

    assert!(matches!(result, Err(Error::Cancelled)), "{result:?}");
    assert!(api.requests().is_empty());
}

#[tokio::test]
async fn cancelling_mid_upload_stops_the_upload() {
    let api = MockYouTube::start(upload_api).await;
    let file = fixture(64 * 1024 * 1024);
    let cancel = CancellationToken::new();

    let on_first_progress = cancel.clone();
    let mut percentages = Vec::new();
    let mut on_progress = |p: UploadProgress| {
        percentages.push(p.percentage);
        on_first_progress.cancel();
    };
    let result = api
        .uploader()
        .upload_video(
            file.path(),
            &UploadMetadata::default(),
            Some(&mut on_progress),
            &cancel,
        )
        .await;

    assert!(matches!(result, Err(Error::Cancelled)), "{result:?}");
    assert_eq!(percentages.len(), 1, "{percentages:?}");
}

#[tokio::test]
async fn invalid_publish_time_sends_nothing() {
    let api = unreachable_api().await;
    let file = fixture(1024);
    let metadata = UploadMetadata {
        publish_at: Some("soon".into()),
        ..Default::default()
    };

    let result = api
        .uploader()
        .upload_video(file.path(), &metadata, None, &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(Error::InvalidMetadata(_))), "{result:?}");
    assert!(api.requests().is_empty());
}

#[tokio::test]
async fn rejected_upload_surfaces_error_body() {
    let api = MockYouTube::start(|_, _| {
        MockResponse::status(
            StatusCode::FORBIDDEN,
            json!({
                "error": {
                    "code": 403,
                    "message": "The user has exceeded the number of videos they may upload.",
                    "errors": [{
                        "domain": "youtube.video",
                        "reason": "uploadLimitExceeded",
                        "message": "The user has exceeded the number of videos they may upload."
                    }]
                }
            })
            .to_string(),
        )
    })
    .await;
    let file = fixture(1024);

    let err = api
        .uploader()
        .upload_video(
            file.path(),
            &UploadMetadata::default(),
            None,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    match &err {
        Error::Api { status, .. } => assert_eq!(*status, StatusCode::FORBIDDEN),
        other => panic!("unexpected error: {other:?}"),
    }
    let api_error = err.api_error().expect("structured error body");
    assert_eq!(
        api_error.errors[0].reason.as_deref(),
        Some("uploadLimitExceeded")
    );
    // The media was never sent.
    assert_eq!(api.requests().len(), 1);
}

#[tokio::test]
async fn missing_upload_location_is_an_error() {
    let api = MockYouTube::start(|_, _| MockResponse::status(StatusCode::OK, "")).await;
    let file = fixture(16);

    let result = api
        .uploader()
        .upload_video(
            file.path(),
            &UploadMetadata::default(),
            None,
            &CancellationToken::new(),
        )
        .await;

    assert!(matches!(result, Err(Error::MissingUploadLocation)), "{result:?}");
}

#[tokio::test]
async fn thumbnail_is_streamed_with_image_type() {
    let api = MockYouTube::start(|req, _| {
        assert_eq!(req.path, "/upload/youtube/v3/thumbnails/set");
        MockResponse::json(json!({
            "kind": "youtube#thumbnailSetResponse",
            "items": [{ "default": { "url": "https://i.ytimg.com/vi/vid123/default.jpg", "width": 120, "height": 90 } }]
        }))
    })
    .await;
    let mut image = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
    image.write_all(b"\x89PNG fake image").unwrap();

    let response = api
        .uploader()
        .set_thumbnail("vid123", image.path())
        .await
        .unwrap();

    assert_eq!(response.items[0]["default"].width, Some(120));
    let requests = api.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::POST);
    assert_eq!(requests[0].query["videoId"], "vid123");
    assert_eq!(requests[0].header("content-type"), Some("image/png"));
    assert_eq!(requests[0].body.as_ref(), b"\x89PNG fake image");
}

fn category_items() -> serde_json::Value {
    json!([
        { "kind": "youtube#videoCategory", "etag": "a", "id": "1", "snippet": { "title": "Film & Animation", "assignable": true, "channelId": "UCBR" } },
        { "kind": "youtube#videoCategory", "etag": "b", "id": "22", "snippet": { "title": "People & Blogs", "channelId": "UCBR" } },
        { "id": "2", "snippet": { "assignable": false } }
    ])
}

#[tokio::test]
async fn categories_are_returned_unmodified_and_in_order() {
    // No top-level `kind`: only `items` matters.
    let api = MockYouTube::start(|req, _| {
        assert_eq!(req.path, "/youtube/v3/videoCategories");
        MockResponse::json(json!({ "etag": "x", "items": category_items() }))
    })
    .await;
    let uploader = api.uploader();

    let categories = uploader.get_video_categories(None).await.unwrap();
    let ids: Vec<&str> = categories.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "22", "2"]);
    assert_eq!(serde_json::to_value(&categories).unwrap(), category_items());

    uploader.get_video_categories(Some("DE")).await.unwrap();
    let requests = api.requests();
    assert_eq!(requests[0].query["regionCode"], "US");
    assert_eq!(requests[0].query["part"], "snippet");
    assert_eq!(requests[1].query["regionCode"], "DE");
}

fn playlist_items() -> serde_json::Value {
    json!([
        { "id": "PLb", "snippet": { "title": "Second", "description": "" }, "contentDetails": { "itemCount": 3 } },
        { "id": "PLa", "snippet": { "title": "First" }, "contentDetails": { "itemCount": 0 } },
        { "kind": "youtube#playlist", "id": "PLc" }
    ])
}

#[tokio::test]
async fn playlists_are_returned_unmodified_and_in_order() {
    let api = MockYouTube::start(|_, _| {
        MockResponse::json(json!({
            "kind": "youtube#playlistListResponse",
            "pageInfo": { "totalResults": 3, "resultsPerPage": 50 },
            "items": playlist_items()
        }))
    })
    .await;

    let playlists = api.uploader().get_my_playlists().await.unwrap();

    let ids: Vec<&str> = playlists.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["PLb", "PLa", "PLc"]);
    assert_eq!(serde_json::to_value(&playlists).unwrap(), playlist_items());
    let request = &api.requests()[0];
    assert_eq!(request.path, "/youtube/v3/playlists");
    assert_eq!(request.query["mine"], "true");
    assert_eq!(request.query["maxResults"], "50");
}

#[tokio::test]
async fn video_is_added_to_playlist() {
    let api = MockYouTube::start(|_, _| {
        MockResponse::json(json!({
            "kind": "youtube#playlistItem",
            "id": "PLI1",
            "snippet": {
                "playlistId": "PLa",
                "position": 4,
                "resourceId": { "kind": "youtube#video", "videoId": "vid123" }
            }
        }))
    })
    .await;

    let item = api
        .uploader()
        .add_video_to_playlist("vid123", "PLa")
        .await
        .unwrap();

    assert_eq!(item.id, "PLI1");
    assert_eq!(item.snippet.unwrap().position, Some(4));
    let request = &api.requests()[0];
    assert_eq!(request.method, Method::POST);
    assert_eq!(request.path, "/youtube/v3/playlistItems");
    assert_eq!(request.query["part"], "snippet");
    assert_eq!(
        request.json(),
        json!({
            "snippet": {
                "playlistId": "PLa",
                "resourceId": { "kind": "youtube#video", "videoId": "vid123" }
            }
        })
    );
}

#[tokio::test]
async fn quota_without_channel_fails() {
    let api = MockYouTube::start(|_, _| {
        MockResponse::json(json!({
            "kind": "youtube#channelListResponse",
            "pageInfo": { "totalResults": 0, "resultsPerPage": 5 }
        }))
    })
    .await;

    let result = api.uploader().get_upload_quota().await;

    assert!(matches!(result, Err(Error::NoChannelFound)), "{result:?}");
}

#[tokio::test]
async fn quota_summarizes_first_channel() {
    let api = MockYouTube::start(|_, _| {
        MockResponse::json(json!({
            "kind": "youtube#channelListResponse",
            "items": [{
                "id": "UC123",
                "statistics": { "viewCount": "99", "subscriberCount": "5", "hiddenSubscriberCount": false, "videoCount": "3" },
                "status": { "longUploadsStatus": "eligible", "madeForKids": false }
            }]
        }))
    })
    .await;

    let quota = api.uploader().get_upload_quota().await.unwrap();

    assert_eq!(quota.channel_id, "UC123");
    assert_eq!(quota.total_videos, 3);
    assert_eq!(quota.quota_info.view_count, Some(99));
    assert_eq!(
        quota.quota_info.long_uploads_status.as_deref(),
        Some("eligible")
    );
    assert_eq!(api.requests()[0].query["mine"], "true");
}

#[derive(Default)]
struct Recorder(Mutex<Vec<String>>);

impl UploadObserver for Recorder {
    fn request_started(&self, operation: Operation, detail: &str) {
        self.0.lock().unwrap().push(format!("start {operation} {detail}"));
    }

    fn request_succeeded(&self, operation: Operation, detail: &str) {
        self.0.lock().unwrap().push(format!("ok {operation} {detail}"));
    }

    fn request_failed(&self, operation: Operation, error: &Error) {
        let kind = match error {
            Error::Api { status, .. } => status.as_u16().to_string(),
            other => other.to_string(),
        };
        self.0.lock().unwrap().push(format!("failed {operation} {kind}"));
    }
}

#[tokio::test]
async fn observer_sees_successes_and_failures() {
    let api = MockYouTube::start(|req, _| match req.path.as_str() {
        "/youtube/v3/playlistItems" => MockResponse::status(StatusCode::NOT_FOUND, ""),
        _ => MockResponse::json(json!({ "kind": "youtube#playlistListResponse", "items": [] })),
    })
    .await;
    let recorder = Arc::new(Recorder::default());
    let uploader = api.uploader().with_observer(Arc::clone(&recorder));

    uploader.get_my_playlists().await.unwrap();
    uploader
        .add_video_to_playlist("vid123", "PLmissing")
        .await
        .unwrap_err();

    assert_eq!(
        *recorder.0.lock().unwrap(),
        vec![
            "start list_playlists mine".to_string(),
            "ok list_playlists 0 playlists".to_string(),
            "start add_to_playlist PLmissing".to_string(),
            "failed add_to_playlist 404".to_string(),
        ]
    );
}
