//! Per-user workspace: the subject list plus the transcript for the
//! selected subject.

use crate::backend::{Backend, BackendError, SubjectMeta};
use crate::controller::{ControllerError, ControllerOptions, TranscriptController};
use crate::transcript::Subject;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Subject not found: {0}")]
    UnknownSubject(String),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Controller(#[from] ControllerError),
}

/// Notice appended after a successful upload
pub fn upload_notice(filename: &str) -> String {
    format!("✅ {filename} uploaded successfully! You can now ask questions.")
}

/// One user's view of the document service
pub struct Workspace {
    backend: Arc<dyn Backend>,
    controller: TranscriptController,
    subjects: RwLock<Vec<SubjectMeta>>,
}

impl Workspace {
    /// Create a workspace with its own transcript runtime
    pub fn new(backend: Arc<dyn Backend>, options: ControllerOptions) -> Self {
        let controller = TranscriptController::spawn(Arc::clone(&backend), options);
        Self {
            backend,
            controller,
            subjects: RwLock::new(Vec::new()),
        }
    }

    pub fn controller(&self) -> &TranscriptController {
        &self.controller
    }

    /// Cached subject list, newest uploads first
    pub async fn subjects(&self) -> Vec<SubjectMeta> {
        self.subjects.read().await.clone()
    }

    /// Reload the subject list from the service
    pub async fn refresh_subjects(&self) -> Result<Vec<SubjectMeta>, WorkspaceError> {
        let subjects = self.backend.list_subjects().await.map_err(|e| {
            tracing::error!(error = %e, "Error loading files");
            e
        })?;
        *self.subjects.write().await = subjects.clone();
        Ok(subjects)
    }

    /// Upload a document, select it and announce it in the transcript
    pub async fn upload(&self, filename: &str, bytes: Vec<u8>) -> Result<SubjectMeta, WorkspaceError> {
        let meta = self.backend.upload(filename, bytes).await?;
        tracing::info!(subject_id = %meta.id, filename = %meta.filename, "Document uploaded");

        {
            let mut subjects = self.subjects.write().await;
            subjects.retain(|s| s.id != meta.id);
            subjects.insert(0, meta.clone());
        }

        self.controller
            .select_subject_with_notice(
                Subject::new(&meta.id, &meta.filename),
                upload_notice(&meta.filename),
            )
            .await?;
        Ok(meta)
    }

    /// Make a listed subject the active one
    pub async fn select(&self, subject_id: &str) -> Result<Subject, WorkspaceError> {
        let subject = self
            .subjects
            .read()
            .await
            .iter()
            .find(|s| s.id == subject_id)
            .map(|s| Subject::new(&s.id, &s.filename))
            .ok_or_else(|| WorkspaceError::UnknownSubject(subject_id.to_string()))?;
        self.controller.select_subject(subject.clone()).await?;
        Ok(subject)
    }

    /// Delete a subject and, if it is active, its transcript
    pub async fn delete(&self, subject_id: &str) -> Result<(), WorkspaceError> {
        self.backend.delete_subject(subject_id).await?;
        self.subjects.write().await.retain(|s| s.id != subject_id);
        self.controller
            .remove_subject_turns_if_active(subject_id)
            .await?;
        tracing::info!(subject_id, "Document deleted");
        Ok(())
    }

    pub async fn download(&self, subject_id: &str) -> Result<Vec<u8>, WorkspaceError> {
        Ok(self.backend.download(subject_id).await?)
    }
}

struct SessionEntry {
    workspace: Arc<Workspace>,
    last_seen: Instant,
}

/// Owns every live workspace, keyed by session id
pub struct SessionManager {
    backend: Arc<dyn Backend>,
    options: ControllerOptions,
    sessions: RwLock<HashMap<String, SessionEntry>>,
}

impl SessionManager {
    pub fn new(backend: Arc<dyn Backend>, options: ControllerOptions) -> Self {
        Self {
            backend,
            options,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Start a new workspace and load its subject list.
    ///
    /// A failed listing still yields a usable, empty workspace.
    pub async fn create(&self) -> (String, Arc<Workspace>) {
        let id = uuid::Uuid::new_v4().to_string();
        let workspace = Arc::new(Workspace::new(Arc::clone(&self.backend), self.options));
        let _ = workspace.refresh_subjects().await;

        self.sessions.write().await.insert(
            id.clone(),
            SessionEntry {
                workspace: Arc::clone(&workspace),
                last_seen: Instant::now(),
            },
        );
        tracing::info!(session_id = %id, "Session created");
        (id, workspace)
    }

    /// Look up a session and mark it as used
    pub async fn get(&self, id: &str) -> Option<Arc<Workspace>> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(id)?;
        entry.last_seen = Instant::now();
        Some(Arc::clone(&entry.workspace))
    }

    /// Drop a session; its transcript runtime stops once the last handle goes
    pub async fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            tracing::info!(session_id = %id, "Session closed");
        }
        removed
    }

    /// Drop sessions unused for longer than `max_idle`.
    ///
    /// A session with a question in flight is kept. Returns the expired ids.
    pub async fn expire_idle(&self, max_idle: Duration) -> Vec<String> {
        let mut expired = Vec::new();
        self.sessions.write().await.retain(|id, entry| {
            let keep =
                entry.last_seen.elapsed() <= max_idle || entry.workspace.controller().is_busy();
            if !keep {
                expired.push(id.clone());
            }
            keep
        });
        for id in &expired {
            tracing::info!(session_id = %id, idle_secs = max_idle.as_secs(), "Session expired");
        }
        expired
    }

    /// Periodically expire idle sessions until the manager is dropped
    pub fn start_idle_sweeper(self: &Arc<Self>, max_idle: Duration) {
        let manager: Weak<Self> = Arc::downgrade(self);
        let period = (max_idle / 4).max(Duration::from_secs(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let Some(manager) = manager.upgrade() else {
                    break;
                };
                manager.expire_idle(max_idle).await;
            }
            tracing::debug!("Session sweeper stopped");
        });
    }
}
