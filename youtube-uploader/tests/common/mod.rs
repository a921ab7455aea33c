//! An in-process stand-in for the YouTube API.
//!
//! Every request is recorded, and a test-supplied closure decides what to answer.

#![allow(dead_code)]

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper::{Request, Response};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use youtube_uploader::{ApiEndpoints, NoopObserver, VideoUploader, YouTubeClient};

pub const ACCESS_TOKEN: &str = "ya29.test-token";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RecordedRequest {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body is JSON")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

pub struct MockResponse {
    pub status: StatusCode,
    pub headers: Vec<(&'static str, String)>,
    pub body: String,
}

impl MockResponse {
    pub fn json(value: serde_json::Value) -> Self {
        Self {
            status: StatusCode::OK,
            headers: vec![("content-type", "application/json".to_string())],
            body: value.to_string(),
        }
    }

    pub fn status(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: vec![],
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }
}

type Responder = dyn Fn(&RecordedRequest, &str) -> MockResponse + Send + Sync;

pub struct MockYouTube {
    base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockYouTube {
    /// Starts serving on a random loopback port.
    ///
    /// `respond` gets each request and the server's base URL (for building `Location`s).
    pub async fn start(
        respond: impl Fn(&RecordedRequest, &str) -> MockResponse + Send + Sync + 'static,
    ) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let respond: Arc<Responder> = Arc::new(respond);

        let recorded = Arc::clone(&requests);
        let base = base_url.clone();
        tokio::spawn(async move {
            loop {
                let Ok((conn, _)) = listener.accept().await else {
                    break;
                };
                let recorded = Arc::clone(&recorded);
                let respond = Arc::clone(&respond);
                let base = base.clone();
                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<Incoming>| {
                        let recorded = Arc::clone(&recorded);
                        let respond = Arc::clone(&respond);
                        let base = base.clone();
                        async move {
                            let request = record(req).await;
                            let reply = respond(&request, &base);
                            recorded.lock().unwrap().push(request);

                            let mut response = Response::new(Full::new(Bytes::from(reply.body)));
                            *response.status_mut() = reply.status;
                            for (name, value) in reply.headers {
                                response
                                    .headers_mut()
                                    .insert(name, value.parse().unwrap());
                            }
                            Ok::<_, Infallible>(response)
                        }
                    });
                    let _ = hyper::server::conn::http1::Builder::new()
                        .serve_connection(hyper_util::rt::TokioIo::new(conn), service)
                        .await;
                });
            }
        });

        Self { base_url, requests }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// An uploader whose client talks to this server with a fixed bearer token.
    pub fn uploader(&self) -> VideoUploader {
        let client = YouTubeClient::with_access_token(ACCESS_TOKEN, reqwest::Client::new())
            .with_endpoints(ApiEndpoints::with_base(&self.base_url));
        VideoUploader::new(client).with_observer(NoopObserver)
    }
}

async fn record(req: Request<Incoming>) -> RecordedRequest {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = form_urlencoded::parse(req.uri().query().unwrap_or("").as_bytes())
        .into_owned()
        .collect();
    let headers = req.headers().clone();
    let body = req
        .into_body()
        .collect()
        .await
        .map(|collected| collected.to_bytes())
        .unwrap_or_default();
    RecordedRequest {
        method,
        path,
        query,
        headers,
        body,
    }
}

/// A server that answers every request with 500, for tests that expect no traffic at all.
pub async fn unreachable_api() -> MockYouTube {
    MockYouTube::start(|_, _| {
        MockResponse::status(StatusCode::INTERNAL_SERVER_ERROR, "unexpected request")
    })
    .await
}
