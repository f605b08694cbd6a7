use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::types::Unit;

/// Identifies one conversation: application, then user, then session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionScope {
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
}

impl SessionScope {
    pub fn new(
        app_name: impl Into<String>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }

    /// Scope with a freshly generated session id.
    pub fn generate(app_name: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self::new(app_name, user_id, Uuid::new_v4().to_string())
    }
}

impl fmt::Display for SessionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.app_name, self.user_id, self.session_id)
    }
}

/// Mutable per-conversation state. The session service owns its lifecycle;
/// the lookup pipeline only reads and writes named fields, so every field is
/// optional or defaulted and a fresh state is always valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub unit_preference: Option<Unit>,
    pub last_location_checked: Option<String>,
    #[serde(default)]
    pub keyword_block_triggered: bool,
    #[serde(default)]
    pub location_block_triggered: bool,
    /// Keys owned by other collaborators, e.g. the runner's last report.
    #[serde(default)]
    pub extras: HashMap<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub scope: SessionScope,
    pub state: SessionState,
    pub created_at: DateTime<Utc>,
    pub last_update_time: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session '{0}' does not exist")]
    NotFound(SessionScope),
    #[error("session '{0}' already exists")]
    AlreadyExists(SessionScope),
}

/// Owns session storage and persistence. Per-session access is expected to be
/// serialized by the embedding application; `save_state` is last-write-wins.
#[async_trait]
pub trait SessionService: Send + Sync {
    async fn create_session(
        &self,
        scope: SessionScope,
        initial: SessionState,
    ) -> Result<Session, SessionError>;

    async fn get_session(&self, scope: &SessionScope) -> Result<Session, SessionError>;

    async fn save_state(
        &self,
        scope: &SessionScope,
        state: SessionState,
    ) -> Result<(), SessionError>;
}

/// Non-persistent session storage, sufficient for demos and tests.
#[derive(Default)]
pub struct InMemorySessionService {
    sessions: Mutex<HashMap<SessionScope, Session>>,
}

impl InMemorySessionService {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionService for InMemorySessionService {
    async fn create_session(
        &self,
        scope: SessionScope,
        initial: SessionState,
    ) -> Result<Session, SessionError> {
        let mut sessions = self.sessions.lock().await;
        if sessions.contains_key(&scope) {
            return Err(SessionError::AlreadyExists(scope));
        }
        let now = Utc::now();
        let session = Session {
            scope: scope.clone(),
            state: initial,
            created_at: now,
            last_update_time: now,
        };
        sessions.insert(scope.clone(), session.clone());
        info!(session = %scope, "Session created");
        Ok(session)
    }

    async fn get_session(&self, scope: &SessionScope) -> Result<Session, SessionError> {
        let sessions = self.sessions.lock().await;
        sessions
            .get(scope)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(scope.clone()))
    }

    async fn save_state(
        &self,
        scope: &SessionScope,
        state: SessionState,
    ) -> Result<(), SessionError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .get_mut(scope)
            .ok_or_else(|| SessionError::NotFound(scope.clone()))?;
        session.state = state;
        session.last_update_time = Utc::now();
        debug!(session = %scope, "Session state saved");
        Ok(())
    }
}
