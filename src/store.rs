use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::model::{VocabEntry, VocabRow};

#[derive(Debug, Error)]
pub enum StoreError {
    /// Error message returned by the backend.
    #[error("{0}")]
    Backend(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Authenticated identity issued by the auth collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub access_token: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            access_token: access_token.into(),
        }
    }
}

/// Record store holding `vocab_entry` rows.
///
/// Every call is scoped to the session's user; row-level permissions are the
/// collaborator's business.
#[async_trait]
pub trait VocabStore: Send + Sync {
    /// Id of the row saved for `simplified`, if any.
    async fn find_id(&self, session: &Session, simplified: &str)
    -> Result<Option<String>, StoreError>;

    /// Subset of `simplified` that is already saved.
    async fn existing(
        &self,
        session: &Session,
        simplified: &[String],
    ) -> Result<HashSet<String>, StoreError>;

    /// Rows of the session's user, newest first.
    async fn list(&self, session: &Session) -> Result<Vec<VocabEntry>, StoreError>;

    /// Inserts all rows in one request and returns the new ids.
    async fn insert(&self, session: &Session, rows: Vec<VocabRow>)
    -> Result<Vec<String>, StoreError>;

    /// Deletes the rows matching `simplified`; returns how many went away.
    async fn delete(&self, session: &Session, simplified: &str) -> Result<u64, StoreError>;

    async fn count(&self, session: &Session) -> Result<u64, StoreError>;
}

/// Resolves access tokens into sessions.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn session_for_token(&self, token: &str) -> Result<Option<Session>, StoreError>;
}

/// Source of the current session for one caller.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn current_session(&self) -> Result<Option<Session>, StoreError>;
}

#[async_trait]
impl SessionProvider for Option<Session> {
    async fn current_session(&self) -> Result<Option<Session>, StoreError> {
        Ok(self.clone())
    }
}

/// Session carried by a request token.
pub struct BearerSession {
    auth: Arc<dyn AuthProvider>,
    token: Option<String>,
}

impl BearerSession {
    pub fn new(auth: Arc<dyn AuthProvider>, token: Option<String>) -> Self {
        Self { auth, token }
    }
}

#[async_trait]
impl SessionProvider for BearerSession {
    async fn current_session(&self) -> Result<Option<Session>, StoreError> {
        match self.token.as_deref().filter(|token| !token.is_empty()) {
            Some(token) => self.auth.session_for_token(token).await,
            None => Ok(None),
        }
    }
}

/// Fixed token to user mapping, used for local development and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticTokens {
    users: HashMap<String, String>,
}

impl StaticTokens {
    pub fn new<I, T, U>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (T, U)>,
        T: Into<String>,
        U: Into<String>,
    {
        Self {
            users: pairs
                .into_iter()
                .map(|(token, user)| (token.into(), user.into()))
                .collect(),
        }
    }
}

#[async_trait]
impl AuthProvider for StaticTokens {
    async fn session_for_token(&self, token: &str) -> Result<Option<Session>, StoreError> {
        Ok(self
            .users
            .get(token)
            .map(|user_id| Session::new(user_id.clone(), token)))
    }
}

/// Process-local store. Rows keep insertion order; `list` reverses them
/// before its stable sort on `created_at`, and that order is what puts the
/// later of two same-timestamp rows first.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: RwLock<Vec<VocabEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VocabStore for MemoryStore {
    async fn find_id(
        &self,
        session: &Session,
        simplified: &str,
    ) -> Result<Option<String>, StoreError> {
        let guard = self.rows.read();
        Ok(guard
            .iter()
            .find(|row| row.user_id == session.user_id && row.simplified == simplified)
            .map(|row| row.id.clone()))
    }

    async fn existing(
        &self,
        session: &Session,
        simplified: &[String],
    ) -> Result<HashSet<String>, StoreError> {
        let wanted: HashSet<&str> = simplified.iter().map(String::as_str).collect();
        let guard = self.rows.read();
        Ok(guard
            .iter()
            .filter(|row| row.user_id == session.user_id && wanted.contains(row.simplified.as_str()))
            .map(|row| row.simplified.clone())
            .collect())
    }

    async fn list(&self, session: &Session) -> Result<Vec<VocabEntry>, StoreError> {
        let guard = self.rows.read();
        let mut rows: Vec<_> = guard
            .iter()
            .rev()
            .filter(|row| row.user_id == session.user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn insert(
        &self,
        session: &Session,
        rows: Vec<VocabRow>,
    ) -> Result<Vec<String>, StoreError> {
        if let Some(row) = rows.iter().find(|row| row.user_id != session.user_id) {
            return Err(StoreError::Backend(format!(
                "new row violates row-level security policy for user {}",
                row.user_id
            )));
        }
        let now = Utc::now();
        let mut guard = self.rows.write();
        let ids = rows
            .into_iter()
            .map(|row| {
                let id = Uuid::new_v4().to_string();
                guard.push(VocabEntry {
                    id: id.clone(),
                    user_id: row.user_id,
                    simplified: row.simplified,
                    traditional: row.traditional,
                    pinyin: row.pinyin,
                    definition: row.definition,
                    notes: row.notes,
                    entry_id: row.entry_id,
                    created_at: now,
                    audio_url: None,
                    image_url: None,
                });
                id
            })
            .collect();
        Ok(ids)
    }

    async fn delete(&self, session: &Session, simplified: &str) -> Result<u64, StoreError> {
        let mut guard = self.rows.write();
        let before = guard.len();
        guard.retain(|row| !(row.user_id == session.user_id && row.simplified == simplified));
        Ok((before - guard.len()) as u64)
    }

    async fn count(&self, session: &Session) -> Result<u64, StoreError> {
        let guard = self.rows.read();
        Ok(guard
            .iter()
            .filter(|row| row.user_id == session.user_id)
            .count() as u64)
    }
}
