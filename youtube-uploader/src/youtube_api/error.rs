//! Error type shared by the YouTube API client and the uploader facade.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can go wrong while talking to YouTube.
///
/// Local precondition failures ([`Error::FileNotFound`], [`Error::InvalidMetadata`]) are
/// always raised before any request leaves the process.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A file the operation needs to read does not exist.
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// The caller-supplied metadata could not be turned into a request.
    #[error("invalid upload metadata: {0}")]
    InvalidMetadata(String),

    /// YouTube answered with a non-success status code.
    ///
    /// `body` holds the structured error payload when the response carried one.
    #[error("YouTube API request failed with status {status}: {message}")]
    Api {
        status: http::StatusCode,
        message: String,
        body: Option<ApiErrorBody>,
    },

    /// The request never produced an HTTP response.
    #[error("send request to YouTube API")]
    Transport(#[from] reqwest::Error),

    /// The access token expired and could not be refreshed.
    #[error("unable to obtain a fresh access token: {0}")]
    Auth(eyre::Report),

    #[error("read local file")]
    Io(#[from] std::io::Error),

    #[error("parse YouTube API response")]
    Decode(#[from] serde_json::Error),

    /// The resumable upload session was opened without a `Location` header.
    #[error("YouTube did not return an upload session location")]
    MissingUploadLocation,

    /// The authenticated account has no YouTube channel.
    #[error("no channel found for the authenticated account")]
    NoChannelFound,

    /// The upload was cancelled through its cancellation token.
    #[error("upload cancelled")]
    Cancelled,
}

impl Error {
    /// Returns the structured API error payload, if YouTube sent one.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api {
                body: Some(body), ..
            } => Some(&body.error),
            _ => None,
        }
    }

    /// Builds an [`Error::Api`] from a failed response's status and body text.
    pub(crate) fn from_response_text(status: http::StatusCode, text: String) -> Self {
        match serde_json::from_str::<ApiErrorBody>(&text) {
            Ok(body) => Self::Api {
                status,
                message: body.error.message.clone(),
                body: Some(body),
            },
            Err(_) => Self::Api {
                status,
                message: if text.is_empty() {
                    "unknown error".to_string()
                } else {
                    text
                },
                body: None,
            },
        }
    }
}

/// The envelope Google APIs wrap errors in.
///
/// See: <https://developers.google.com/youtube/v3/docs/errors>
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiError,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    /// The HTTP status code, repeated in the body.
    pub code: u16,
    /// A human-readable description of the failure.
    pub message: String,
    /// Individual failure reasons, e.g. `quotaExceeded` or `uploadLimitExceeded`.
    #[serde(default)]
    pub errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
