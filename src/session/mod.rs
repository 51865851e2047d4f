use std::{
    fmt::Display,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Identifier of the user owning a document partition. Doubles as the
/// directory name of the user's documents, hence the character restriction
/// enforced by [UserId::new].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(name: &str) -> Result<UserId> {
        let name = name.trim();
        if name.is_empty() {
            return Err(anyhow!("user name can't be empty"));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(anyhow!(
                "user name {name:?} may only contain letters, digits, '-' and '_'"
            ));
        }
        Ok(UserId(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no active user, run `daybook login <name>` first")]
    Unauthenticated,
}

/// Stored per user, created on first login and refreshed on every return.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionState {
    user: Option<UserId>,
}

/// Identity provider: yields the current user id or none. Backed by a small
/// document next to the user data, written by `login` and `logout`.
pub struct Session {
    state_file: PathBuf,
}

impl Session {
    pub fn new(app_dir: &Path) -> Session {
        Session {
            state_file: app_dir.join("session.json"),
        }
    }

    pub fn current_user(&self) -> Result<Option<UserId>> {
        if !self.state_file.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&self.state_file)?;
        let state: SessionState = serde_json::from_str(&data)?;
        Ok(state.user)
    }

    /// Fails fast when nobody is logged in. Every persistence path resolves
    /// the user through this before touching the store.
    pub fn require_user(&self) -> Result<UserId> {
        self.current_user()?
            .ok_or_else(|| SessionError::Unauthenticated.into())
    }

    pub fn login(&self, user: &UserId) -> Result<()> {
        let state = SessionState {
            user: Some(user.clone()),
        };
        std::fs::write(&self.state_file, serde_json::to_string_pretty(&state)?)?;
        info!("Session switched to {user}");
        Ok(())
    }

    pub fn logout(&self) -> Result<()> {
        if self.state_file.exists() {
            std::fs::remove_file(&self.state_file)?;
        }
        Ok(())
    }
}
