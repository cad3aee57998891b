//! Document service abstraction
//!
//! The transcript only needs two calls from the question-answering service;
//! the workspace additionally lists, uploads, deletes and downloads subjects.
//! Both seams are traits so tests can drive them with mocks.

mod error;
pub mod http;

#[cfg(test)]
pub mod testing;

pub use error::{BackendError, BackendErrorKind};
pub use http::HttpBackend;

use crate::transcript::HistoryEntry;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Answer to a question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    /// Metadata of the chunks the answer was drawn from
    #[serde(default)]
    pub sources: Vec<serde_json::Value>,
}

#[allow(dead_code)] // Used by mocks and tests
impl Answer {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            sources: Vec::new(),
        }
    }
}

/// A stored document as listed by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectMeta {
    pub id: String,
    pub filename: String,
    #[serde(default)]
    pub uploaded_at: Option<String>,
    #[serde(default)]
    pub chunk_count: Option<u64>,
}

/// Question answering over one subject
#[async_trait]
pub trait QaBackend: Send + Sync {
    /// Persisted Q/A pairs for a subject, oldest first
    async fn fetch_history(&self, subject_id: &str) -> Result<Vec<HistoryEntry>, BackendError>;

    /// Ask a question about a subject
    async fn ask(&self, question: &str, subject_id: &str) -> Result<Answer, BackendError>;
}

/// Storage of the documents themselves
#[async_trait]
pub trait SubjectStore: Send + Sync {
    async fn list_subjects(&self) -> Result<Vec<SubjectMeta>, BackendError>;

    async fn upload(&self, filename: &str, bytes: Vec<u8>) -> Result<SubjectMeta, BackendError>;

    /// Delete a subject together with its chat history
    async fn delete_subject(&self, subject_id: &str) -> Result<(), BackendError>;

    async fn download(&self, subject_id: &str) -> Result<Vec<u8>, BackendError>;
}

/// Combined service trait for convenience
pub trait Backend: QaBackend + SubjectStore {}
impl<T: QaBackend + SubjectStore + ?Sized> Backend for T {}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: QaBackend + ?Sized> QaBackend for Arc<T> {
    async fn fetch_history(&self, subject_id: &str) -> Result<Vec<HistoryEntry>, BackendError> {
        (**self).fetch_history(subject_id).await
    }

    async fn ask(&self, question: &str, subject_id: &str) -> Result<Answer, BackendError> {
        (**self).ask(question, subject_id).await
    }
}

#[async_trait]
impl<T: SubjectStore + ?Sized> SubjectStore for Arc<T> {
    async fn list_subjects(&self) -> Result<Vec<SubjectMeta>, BackendError> {
        (**self).list_subjects().await
    }

    async fn upload(&self, filename: &str, bytes: Vec<u8>) -> Result<SubjectMeta, BackendError> {
        (**self).upload(filename, bytes).await
    }

    async fn delete_subject(&self, subject_id: &str) -> Result<(), BackendError> {
        (**self).delete_subject(subject_id).await
    }

    async fn download(&self, subject_id: &str) -> Result<Vec<u8>, BackendError> {
        (**self).download(subject_id).await
    }
}

// ============================================================================
// Logging wrapper
// ============================================================================

/// Logs duration and outcome of every call to the wrapped backend
pub struct LoggingBackend<B> {
    inner: B,
}

impl<B> LoggingBackend<B> {
    pub fn new(inner: B) -> Self {
        Self { inner }
    }
}

fn log_outcome<T>(operation: &str, subject_id: &str, started: Instant, result: &Result<T, BackendError>) {
    let duration_ms = started.elapsed().as_millis();
    match result {
        Ok(_) => {
            tracing::info!(operation, subject_id, duration_ms = %duration_ms, "Backend call completed");
        }
        Err(e) => {
            tracing::error!(
                operation,
                subject_id,
                duration_ms = %duration_ms,
                error = %e.message,
                kind = ?e.kind,
                "Backend call failed"
            );
        }
    }
}

#[async_trait]
impl<B: QaBackend> QaBackend for LoggingBackend<B> {
    async fn fetch_history(&self, subject_id: &str) -> Result<Vec<HistoryEntry>, BackendError> {
        let started = Instant::now();
        let result = self.inner.fetch_history(subject_id).await;
        log_outcome("fetch_history", subject_id, started, &result);
        result
    }

    async fn ask(&self, question: &str, subject_id: &str) -> Result<Answer, BackendError> {
        let started = Instant::now();
        let result = self.inner.ask(question, subject_id).await;
        log_outcome("ask", subject_id, started, &result);
        result
    }
}

#[async_trait]
impl<B: SubjectStore> SubjectStore for LoggingBackend<B> {
    async fn list_subjects(&self) -> Result<Vec<SubjectMeta>, BackendError> {
        let started = Instant::now();
        let result = self.inner.list_subjects().await;
        log_outcome("list_subjects", "", started, &result);
        result
    }

    async fn upload(&self, filename: &str, bytes: Vec<u8>) -> Result<SubjectMeta, BackendError> {
        let started = Instant::now();
        let result = self.inner.upload(filename, bytes).await;
        let subject_id = result.as_ref().map(|m| m.id.as_str()).unwrap_or_default();
        log_outcome("upload", subject_id, started, &result);
        result
    }

    async fn delete_subject(&self, subject_id: &str) -> Result<(), BackendError> {
        let started = Instant::now();
        let result = self.inner.delete_subject(subject_id).await;
        log_outcome("delete_subject", subject_id, started, &result);
        result
    }

    async fn download(&self, subject_id: &str) -> Result<Vec<u8>, BackendError> {
        let started = Instant::now();
        let result = self.inner.download(subject_id).await;
        log_outcome("download", subject_id, started, &result);
        result
    }
}
