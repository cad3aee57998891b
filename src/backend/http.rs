//! HTTP client for the document service

use super::{Answer, BackendError, BackendErrorKind, QaBackend, SubjectMeta, SubjectStore};
use crate::transcript::HistoryEntry;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Talks to the upload/ask/history service over HTTP
#[derive(Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct AskRequest<'a> {
    question: &'a str,
    file_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    history: Vec<HistoryEntry>,
}

#[derive(Debug, Deserialize)]
struct FilesResponse {
    #[serde(default)]
    files: Vec<SubjectMeta>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file_id: String,
    filename: String,
    #[serde(default)]
    uploaded_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `/files/{subject_id}[/{action}]` with the id percent-encoded as a
    /// single path segment.
    fn subject_url(&self, subject_id: &str, action: Option<&str>) -> Result<Url, BackendError> {
        // Url drops "." and ".." segments instead of encoding them
        if matches!(subject_id, "" | "." | "..") {
            return Err(BackendError::validation(format!(
                "Invalid subject id: {subject_id:?}"
            )));
        }
        let mut url = Url::parse(&self.url("/files"))
            .map_err(|e| BackendError::validation(format!("Invalid service URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| BackendError::validation(format!("Invalid service URL: {}", self.base_url)))?
            .push(subject_id)
            .extend(action);
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, BackendError> {
        let response = request.send().await.map_err(classify_send_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(classify_status(status, &body))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, BackendError> {
        let response = self.send(request).await?;
        let body = response
            .text()
            .await
            .map_err(|e| BackendError::network(format!("Failed to read response: {e}")))?;
        serde_json::from_str(&body).map_err(|e| {
            BackendError::unknown(format!("Failed to parse response: {e} - body: {body}"))
        })
    }
}

fn classify_send_error(e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::network(format!("Request timeout: {e}"))
    } else if e.is_connect() {
        BackendError::network(format!("Connection failed: {e}"))
    } else {
        BackendError::unknown(format!("Request failed: {e}"))
    }
}

/// Build an error from a non-success response, preferring the service's
/// `detail` field when present.
fn classify_status(status: reqwest::StatusCode, body: &str) -> BackendError {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .map(|b| match b.detail {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        })
        .unwrap_or_else(|| body.to_string());

    let kind = BackendErrorKind::from_status(status.as_u16());
    let message = match kind {
        BackendErrorKind::NotFound => format!("Not found: {detail}"),
        BackendErrorKind::Validation => format!("Invalid request: {detail}"),
        BackendErrorKind::Server => format!("Server error: {detail}"),
        _ => format!("HTTP {status}: {detail}"),
    };
    BackendError::new(kind, message)
}

#[async_trait]
impl QaBackend for HttpBackend {
    async fn fetch_history(&self, subject_id: &str) -> Result<Vec<HistoryEntry>, BackendError> {
        let request = self
            .client
            .get(self.subject_url(subject_id, Some("history"))?);
        let response: HistoryResponse = self.send_json(request).await?;
        Ok(response.history)
    }

    async fn ask(&self, question: &str, subject_id: &str) -> Result<Answer, BackendError> {
        let request = self.client.post(self.url("/ask")).json(&AskRequest {
            question,
            file_id: subject_id,
        });
        self.send_json(request).await
    }
}

#[async_trait]
impl SubjectStore for HttpBackend {
    async fn list_subjects(&self) -> Result<Vec<SubjectMeta>, BackendError> {
        let response: FilesResponse = self.send_json(self.client.get(self.url("/files"))).await?;
        Ok(response.files)
    }

    async fn upload(&self, filename: &str, bytes: Vec<u8>) -> Result<SubjectMeta, BackendError> {
        if filename.trim().is_empty() {
            return Err(BackendError::validation("Upload needs a file name"));
        }
        let part = Part::bytes(bytes).file_name(filename.to_string());
        let form = Form::new().part("file", part);
        let request = self.client.post(self.url("/upload")).multipart(form);
        let response: UploadResponse = self.send_json(request).await?;
        Ok(SubjectMeta {
            id: response.file_id,
            filename: response.filename,
            uploaded_at: response.uploaded_at,
            chunk_count: None,
        })
    }

    async fn delete_subject(&self, subject_id: &str) -> Result<(), BackendError> {
        let request = self.client.delete(self.subject_url(subject_id, None)?);
        self.send(request).await?;
        Ok(())
    }

    async fn download(&self, subject_id: &str) -> Result<Vec<u8>, BackendError> {
        let request = self
            .client
            .get(self.subject_url(subject_id, Some("download"))?);
        let response = self.send(request).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| BackendError::network(format!("Failed to read response: {e}")))?;
        Ok(bytes.to_vec())
    }
}
