//! Signed-in users, injected wherever a workflow needs one.
//!
//! Every sign-in gets its own random session id, which the client presents
//! as a bearer token. Sessions are loaded once at startup and written back
//! on every sign-in or sign-out. An ephemeral store keeps them in memory only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::aggregates::{LoginResponse, User};
use crate::{Result, StorefrontError};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// Bearer token identifying this sign-in to the storefront.
    pub session_id: String,
    pub user: User,
    /// Token issued by the marketplace backend.
    pub token: String,
    pub signed_in_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct Session {
    path: Option<PathBuf>,
    states: RwLock<HashMap<String, SessionState>>,
}

impl Session {
    pub fn ephemeral() -> Self { Self::default() }

    /// Restores the sessions saved at `path`. A missing file means nobody is
    /// signed in; an unreadable one is discarded.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let states = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<Vec<SessionState>>(&bytes) {
                Ok(states) => {
                    tracing::info!(sessions = states.len(), "restored sessions");
                    states.into_iter().map(|s| (s.session_id.clone(), s)).collect()
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "discarding corrupt session file");
                    if let Err(e) = tokio::fs::remove_file(&path).await {
                        tracing::warn!(path = %path.display(), error = %e, "failed to remove session file");
                    }
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read session file");
                HashMap::new()
            }
        };
        Self { path: Some(path), states: RwLock::new(states) }
    }

    pub async fn current(&self, session_id: Option<&str>) -> Option<SessionState> {
        let id = session_id?;
        self.states.read().await.get(id).cloned()
    }

    /// The user signed in under `session_id`.
    pub async fn user(&self, session_id: Option<&str>) -> Result<User> {
        self.current(session_id).await.map(|s| s.user).ok_or(StorefrontError::Unauthenticated)
    }

    pub async fn sign_in(&self, login: LoginResponse) -> Result<SessionState> {
        let state = SessionState {
            session_id: Uuid::new_v4().simple().to_string(),
            user: login.user,
            token: login.token,
            signed_in_at: Utc::now(),
        };
        let mut states = self.states.write().await;
        states.insert(state.session_id.clone(), state.clone());
        if let Err(e) = self.persist(&states).await {
            states.remove(&state.session_id);
            return Err(e);
        }
        Ok(state)
    }

    /// Ends one sign-in; other sessions of the same user stay valid.
    pub async fn sign_out(&self, session_id: &str) -> Result<Option<SessionState>> {
        let mut states = self.states.write().await;
        let Some(removed) = states.remove(session_id) else { return Ok(None) };
        if let Err(e) = self.persist(&states).await {
            states.insert(removed.session_id.clone(), removed);
            return Err(e);
        }
        Ok(Some(removed))
    }

    async fn persist(&self, states: &HashMap<String, SessionState>) -> Result<()> {
        let Some(path) = self.path.as_deref() else { return Ok(()) };
        if states.is_empty() {
            return match tokio::fs::remove_file(path).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(StorefrontError::Session(e.to_string())),
            };
        }
        write_states(path, states.values().collect()).await
    }
}

async fn write_states(path: &Path, states: Vec<&SessionState>) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(&states).map_err(|e| StorefrontError::Session(e.to_string()))?;
    tokio::fs::write(path, bytes).await.map_err(|e| StorefrontError::Session(e.to_string()))
}
