use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{DictionaryError, DictionaryResult};
use crate::model::{EntryDraft, VocabEntry, VocabRow};
use crate::store::{Session, SessionProvider, VocabStore};

const SIMPLIFIED_REQUIRED: &str = "Simplified character is required";

/// Result of saving one word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedEntry {
    pub id: String,
    /// False when the word was already in the list and nothing was inserted.
    pub created: bool,
}

/// Result of flipping a word's saved state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub is_saved: bool,
    /// True when exactly one row was added or at least one was removed.
    pub changed: bool,
}

/// Save, remove and status checks for the signed-in user's word list.
#[derive(Clone)]
pub struct VocabGateway {
    store: Arc<dyn VocabStore>,
    sessions: Arc<dyn SessionProvider>,
}

impl VocabGateway {
    pub fn new(store: Arc<dyn VocabStore>, sessions: Arc<dyn SessionProvider>) -> Self {
        Self { store, sessions }
    }

    async fn session(&self) -> DictionaryResult<Option<Session>> {
        Ok(self.sessions.current_session().await?)
    }

    async fn require_session(&self) -> DictionaryResult<Session> {
        self.session().await?.ok_or(DictionaryError::Unauthorized)
    }

    pub async fn check_saved(&self, simplified: &str) -> DictionaryResult<bool> {
        let session = self.require_session().await?;
        let simplified = required_simplified(simplified)?;
        Ok(self.store.find_id(&session, simplified).await?.is_some())
    }

    /// Saves one word unless the user already has it.
    ///
    /// The existence check and the insert are separate requests, so two
    /// concurrent saves of the same word can both insert.
    pub async fn save(&self, draft: &EntryDraft) -> DictionaryResult<SavedEntry> {
        let session = self.require_session().await?;
        let simplified = draft
            .simplified()
            .ok_or_else(|| DictionaryError::validation(SIMPLIFIED_REQUIRED))?;
        if let Some(id) = self.store.find_id(&session, simplified).await? {
            debug!(%simplified, %id, "Word already saved");
            return Ok(SavedEntry { id, created: false });
        }
        let row = VocabRow::from_draft(&session.user_id, simplified, draft);
        let id = self
            .store
            .insert(&session, vec![row])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DictionaryError::Persistence("insert returned no row".to_string()))?;
        info!(%simplified, %id, user = %session.user_id, "Saved word");
        Ok(SavedEntry { id, created: true })
    }

    /// Removes every row for `simplified`. Zero matches is not an error.
    pub async fn remove(&self, simplified: &str) -> DictionaryResult<u64> {
        let session = self.require_session().await?;
        let simplified = required_simplified(simplified)?;
        let removed = self.store.delete(&session, simplified).await?;
        info!(%simplified, removed, user = %session.user_id, "Removed word");
        Ok(removed)
    }

    /// Inserts many words in one request and returns how many rows were added.
    ///
    /// Words already saved and repeats within the batch are skipped, so the
    /// count can be lower than `drafts.len()`. A backend failure fails the
    /// whole batch.
    pub async fn save_batch(&self, drafts: &[EntryDraft]) -> DictionaryResult<usize> {
        if drafts.is_empty() {
            return Ok(0);
        }
        let session = self.require_session().await?;
        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let simplified = draft
                .simplified()
                .ok_or_else(|| DictionaryError::validation(SIMPLIFIED_REQUIRED))?;
            if seen.insert(simplified.to_string()) {
                unique.push((simplified.to_string(), draft));
            }
        }
        let candidates: Vec<String> = unique.iter().map(|(word, _)| word.clone()).collect();
        let existing = self.store.existing(&session, &candidates).await?;
        let rows: Vec<VocabRow> = unique
            .iter()
            .filter(|(word, _)| !existing.contains(word))
            .map(|(word, draft)| VocabRow::from_draft(&session.user_id, word, draft))
            .collect();
        if rows.is_empty() {
            return Ok(0);
        }
        let inserted = self.store.insert(&session, rows).await?.len();
        info!(
            requested = drafts.len(),
            inserted,
            user = %session.user_id,
            "Saved word batch"
        );
        Ok(inserted)
    }

    /// Saves or removes based on the caller's last known state.
    pub async fn toggle(
        &self,
        draft: &EntryDraft,
        currently_saved: bool,
    ) -> DictionaryResult<ToggleOutcome> {
        if currently_saved {
            let removed = self.remove(&draft.simplified).await?;
            Ok(ToggleOutcome {
                is_saved: false,
                changed: removed > 0,
            })
        } else {
            let saved = self.save(draft).await?;
            Ok(ToggleOutcome {
                is_saved: true,
                changed: saved.created,
            })
        }
    }

    pub async fn list(&self) -> DictionaryResult<Vec<VocabEntry>> {
        let session = self.require_session().await?;
        Ok(self.store.list(&session).await?)
    }

    /// Saved word count, or `None` when nobody is signed in.
    pub async fn count(&self) -> DictionaryResult<Option<u64>> {
        match self.session().await? {
            Some(session) => Ok(Some(self.store.count(&session).await?)),
            None => Ok(None),
        }
    }
}

fn required_simplified(simplified: &str) -> DictionaryResult<&str> {
    let trimmed = simplified.trim();
    if trimmed.is_empty() {
        return Err(DictionaryError::validation(SIMPLIFIED_REQUIRED));
    }
    Ok(trimmed)
}
