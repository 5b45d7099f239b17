use std::collections::HashSet;

use crate::model::{EntryId, LookupResult};

/// Results the user has checked on the current page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionManager {
    selected: HashSet<EntryId>,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `id` when absent, removes it when present. Returns whether it is
    /// selected afterwards.
    pub fn toggle(&mut self, id: &EntryId) -> bool {
        if self.selected.remove(id) {
            false
        } else {
            self.selected.insert(id.clone());
            true
        }
    }

    pub fn clear_all(&mut self) {
        self.selected.clear();
    }

    pub fn contains(&self, id: &EntryId) -> bool {
        self.selected.contains(id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &EntryId> {
        self.selected.iter()
    }

    /// Selected results, in the order they appear in `results`.
    pub fn selected_from<'a>(&self, results: &'a [LookupResult]) -> Vec<&'a LookupResult> {
        results
            .iter()
            .filter(|result| self.selected.contains(&result.id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::LookupQuery;
    use crate::search::tests::response_for;

    #[test]
    fn toggle_twice_restores_the_set() {
        let mut selection = SelectionManager::new();
        selection.toggle(&EntryId::Number(7));
        let before = selection.clone();
        assert!(selection.toggle(&EntryId::Number(3)));
        assert!(!selection.toggle(&EntryId::Number(3)));
        assert_eq!(selection, before);
    }

    #[test]
    fn clear_all_behaves_like_a_fresh_manager() {
        let mut used = SelectionManager::new();
        used.toggle(&EntryId::Number(1));
        used.toggle(&EntryId::from("abc"));
        used.clear_all();
        let mut fresh = SelectionManager::new();
        for id in [EntryId::Number(5), EntryId::Number(6), EntryId::Number(5)] {
            used.toggle(&id);
            fresh.toggle(&id);
        }
        assert_eq!(used, fresh);
        assert_eq!(used.len(), 1);
        assert!(used.contains(&EntryId::Number(6)));
    }

    #[test]
    fn numeric_and_text_ids_do_not_collide() {
        let mut selection = SelectionManager::new();
        selection.toggle(&EntryId::Number(42));
        assert!(!selection.contains(&EntryId::from("42")));
    }

    #[test]
    fn selected_from_picks_matching_results() {
        let mut results = Vec::new();
        for page in 1..=3 {
            results.extend(response_for(&LookupQuery::new("字").page(page)).results);
        }
        let mut selection = SelectionManager::new();
        selection.toggle(&EntryId::Number(3));
        selection.toggle(&EntryId::Number(1));
        selection.toggle(&EntryId::Number(99));
        let picked: Vec<_> = selection
            .selected_from(&results)
            .into_iter()
            .map(|result| result.id.clone())
            .collect();
        assert_eq!(picked, vec![EntryId::Number(1), EntryId::Number(3)]);
    }
}
