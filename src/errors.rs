//!
//! src/errors.rs  Andrew Belles  Oct 19th, 2026
//!
//! Defines the error enum shared by every step of a sync run and
//! conversions from the library errors we propagate
//!
//!

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("config error: {0}")]
    Config(String),
    #[error(
        "playlist not found: '{0}' (check the playlist id is correct and \
         that the playlist is public)"
    )]
    PlaylistNotFound(String),
    #[error("http error: {0}")]
    Http(String),
    #[error("{service} answered {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },
    #[error("parse error: {0}")]
    Parse(String),
    #[error("auth error: {0}")]
    Auth(String),
    #[error("sheet error: {0}")]
    Sheet(String),
}

impl From<reqwest::Error> for SyncError {
    fn from(e: reqwest::Error) -> Self { SyncError::Http(e.to_string()) }
}

impl From<serde_json::Error> for SyncError {
    fn from(e: serde_json::Error) -> Self { SyncError::Parse(e.to_string()) }
}

/// Reads a non-success response into a `Status` error
pub async fn status_error(service: &'static str, resp: reqwest::Response) -> SyncError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    SyncError::Status { service, status, body }
}
