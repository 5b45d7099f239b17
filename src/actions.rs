use tracing::warn;

use crate::count::DictionaryCountStore;
use crate::error::DictionaryResult;
use crate::gateway::{ToggleOutcome, VocabGateway};
use crate::model::{EntryDraft, LookupResult};
use crate::selection::SelectionManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveState {
    #[default]
    Unknown,
    Checking,
    Saved,
    Unsaved,
    Toggling {
        was_saved: bool,
    },
}

/// Save/remove toggle shown on one result card.
#[derive(Debug, Clone)]
pub struct SaveButton {
    draft: EntryDraft,
    state: SaveState,
}

impl SaveButton {
    pub fn new(draft: EntryDraft) -> Self {
        Self {
            draft,
            state: SaveState::Unknown,
        }
    }

    pub fn for_result(result: &LookupResult) -> Self {
        Self::new(EntryDraft::from(result))
    }

    pub fn state(&self) -> SaveState {
        self.state
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self.state, SaveState::Checking | SaveState::Toggling { .. })
    }

    pub fn label(&self) -> &'static str {
        match self.state {
            SaveState::Saved => "Saved",
            SaveState::Unsaved => "Save",
            SaveState::Unknown | SaveState::Checking | SaveState::Toggling { .. } => "Loading...",
        }
    }

    pub fn begin_check(&mut self) -> bool {
        if self.is_disabled() {
            return false;
        }
        self.state = SaveState::Checking;
        true
    }

    /// A failed check is shown as not saved.
    pub fn finish_check(&mut self, outcome: &DictionaryResult<bool>) {
        if self.state != SaveState::Checking {
            return;
        }
        self.state = match outcome {
            Ok(true) => SaveState::Saved,
            Ok(false) => SaveState::Unsaved,
            Err(err) => {
                warn!(simplified = %self.draft.simplified, error = %err, "Saved check failed");
                SaveState::Unsaved
            }
        };
    }

    /// Starts a toggle and returns the state it starts from; `None` while the
    /// state is unknown or another call is pending.
    pub fn begin_toggle(&mut self) -> Option<bool> {
        let was_saved = match self.state {
            SaveState::Saved => true,
            SaveState::Unsaved => false,
            _ => return None,
        };
        self.state = SaveState::Toggling { was_saved };
        Some(was_saved)
    }

    /// Adopts the saved state the gateway reported. On failure the button
    /// returns to where it started.
    pub fn finish_toggle(&mut self, outcome: &DictionaryResult<ToggleOutcome>) {
        let SaveState::Toggling { was_saved } = self.state else {
            return;
        };
        self.state = match outcome {
            Ok(toggled) if toggled.is_saved => SaveState::Saved,
            Ok(_) => SaveState::Unsaved,
            Err(_) if was_saved => SaveState::Saved,
            Err(_) => SaveState::Unsaved,
        };
    }

    pub async fn check(&mut self, gateway: &VocabGateway) {
        if !self.begin_check() {
            return;
        }
        let outcome = gateway.check_saved(&self.draft.simplified).await;
        self.finish_check(&outcome);
    }

    /// Flips the saved state and updates the shared count.
    ///
    /// Returns `Ok(None)` when the click was ignored.
    pub async fn toggle(
        &mut self,
        gateway: &VocabGateway,
        counts: &DictionaryCountStore,
    ) -> DictionaryResult<Option<ToggleOutcome>> {
        let Some(was_saved) = self.begin_toggle() else {
            return Ok(None);
        };
        let outcome = gateway.toggle(&self.draft, was_saved).await;
        self.finish_toggle(&outcome);
        let toggled = outcome?;
        match (toggled.changed, toggled.is_saved) {
            (true, true) => counts.increment(),
            (true, false) => counts.decrement(),
            (false, _) => counts.refresh(gateway).await,
        }
        Ok(Some(toggled))
    }
}

/// Saves the selected results in one batch, then re-reads the count since
/// some of them may already have been saved.
pub async fn save_selected(
    gateway: &VocabGateway,
    counts: &DictionaryCountStore,
    results: &[LookupResult],
    selection: &SelectionManager,
) -> DictionaryResult<usize> {
    let drafts: Vec<EntryDraft> = selection
        .selected_from(results)
        .into_iter()
        .map(EntryDraft::from)
        .collect();
    let saved = gateway.save_batch(&drafts).await?;
    counts.refresh(gateway).await;
    Ok(saved)
}
