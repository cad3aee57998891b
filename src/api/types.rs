//! API request and response types

use crate::backend::SubjectMeta;
use crate::transcript::Transcript;
use serde::{Deserialize, Serialize};

/// Response for session creation
#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
}

/// Full session view: transcript plus the subject list
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    #[serde(flatten)]
    pub transcript: Transcript,
    pub busy: bool,
    pub subjects: Vec<SubjectMeta>,
}

/// Response with the subject list
#[derive(Debug, Serialize)]
pub struct FilesResponse {
    pub files: Vec<SubjectMeta>,
}

/// Query for a raw-body upload
#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub filename: String,
}

/// Request to select a subject
#[derive(Debug, Deserialize)]
pub struct SelectSubjectRequest {
    pub subject_id: String,
}

/// Request to ask a question about the active subject
#[derive(Debug, Deserialize)]
pub struct QuestionRequest {
    pub question: String,
}

/// Request to append a system notice
#[derive(Debug, Deserialize)]
pub struct NoticeRequest {
    pub text: String,
}

/// Response for question submission
#[derive(Debug, Serialize)]
pub struct QueuedResponse {
    pub queued: bool,
}

/// Response for actions with nothing else to report
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
