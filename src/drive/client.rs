//! Paginated Drive listing client.
//!
//! `DriveClient` pages through the `files.list` API with a continuation
//! token until exhausted, concatenating pages in server order. Any page
//! failure aborts the whole listing; partial pages are never returned.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use super::node::{DriveFile, Node};

const FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const PAGE_SIZE: u32 = 1000;

const LIGHT_FIELDS: &str =
    "nextPageToken,files(id,name,mimeType,webViewLink,shortcutDetails(targetId,targetMimeType))";
const FULL_FIELDS: &str = "nextPageToken,files(id,name,mimeType,webViewLink,modifiedTime,shortcutDetails(targetId,targetMimeType))";

/// Errors from the Drive API. Every variant means the remote is
/// unavailable for this call; retries happen only on the next scheduled
/// cycle or the next user-triggered request.
#[derive(Debug, Error)]
pub enum DriveError {
    /// Transport-level failure (timeout, DNS, connection, body decode).
    #[error("drive request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("drive api returned HTTP {0}")]
    Status(reqwest::StatusCode),
}

/// Which optional fields a listing requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListMode {
    /// Browsing: no modification timestamps.
    Light,
    /// Change detection: includes `modifiedTime`.
    Full,
}

impl ListMode {
    fn fields(self) -> &'static str {
        match self {
            ListMode::Light => LIGHT_FIELDS,
            ListMode::Full => FULL_FIELDS,
        }
    }
}

/// Anything that can list the direct children of a folder.
///
/// Implemented by [`DriveClient`] (raw fetch) and by the SWR cache that
/// wraps it, so traversal code can run against either or against an
/// in-memory fake in tests.
#[async_trait]
pub trait Lister: Send + Sync {
    /// List the direct children of `folder_id`.
    async fn list(&self, folder_id: &str, mode: ListMode) -> Result<Vec<Node>, DriveError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// HTTP client for the Drive `files.list` API.
pub struct DriveClient {
    http: reqwest::Client,
    api_key: String,
}

impl DriveClient {
    /// Create a client with the standard request timeout.
    pub fn new(api_key: impl Into<String>) -> Result<Self, DriveError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
        })
    }

    /// List all children of `folder_id`, following continuation tokens.
    pub async fn list_children(
        &self,
        folder_id: &str,
        mode: ListMode,
    ) -> Result<Vec<Node>, DriveError> {
        let query = format!("'{folder_id}' in parents and trashed=false");
        let page_size = PAGE_SIZE.to_string();
        let mut nodes = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.http.get(FILES_URL).query(&[
                ("key", self.api_key.as_str()),
                ("q", query.as_str()),
                ("fields", mode.fields()),
                ("orderBy", "name"),
                ("pageSize", page_size.as_str()),
            ]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = request.send().await?;
            if !response.status().is_success() {
                return Err(DriveError::Status(response.status()));
            }

            let page: FileList = response.json().await?;
            nodes.extend(page.files.into_iter().map(Node::from_raw));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(nodes)
    }
}

#[async_trait]
impl Lister for DriveClient {
    async fn list(&self, folder_id: &str, mode: ListMode) -> Result<Vec<Node>, DriveError> {
        self.list_children(folder_id, mode).await
    }
}
