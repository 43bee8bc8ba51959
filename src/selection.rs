use std::collections::HashSet;

use crate::domain::{RecordId, Tab};

/// Cross-page selection of record ids, scoped to one tab. Survives pagination
/// and filter changes; cleared only when the tab changes.
#[derive(Debug, Clone)]
pub struct Selection {
    tab: Tab,
    ids: HashSet<RecordId>,
}

impl Selection {
    pub fn new(tab: Tab) -> Self {
        Self {
            tab,
            ids: HashSet::new(),
        }
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    /// Add if absent, remove if present. Returns whether the id is selected
    /// afterwards.
    pub fn toggle(&mut self, id: RecordId) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Replaces the selection with the given ids. Callers pass the currently
    /// filtered set, never the whole record universe.
    pub fn select_all<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = RecordId>,
    {
        self.ids = ids.into_iter().collect();
    }

    pub fn clear_all(&mut self) {
        self.ids.clear();
    }

    /// Selections do not carry across tabs. Re-selecting the current tab is a
    /// no-op.
    pub fn switch_tab(&mut self, tab: Tab) {
        if self.tab != tab {
            self.tab = tab;
            self.ids.clear();
        }
    }

    /// Drops ids no longer present in the record set; used after a
    /// reconciliation reload so stale ids cannot target the next batch.
    pub fn retain_present(&mut self, present: &HashSet<RecordId>) {
        self.ids.retain(|id| present.contains(id));
    }

    pub fn ids(&self) -> impl Iterator<Item = &RecordId> {
        self.ids.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(value: &str) -> RecordId {
        value.parse().unwrap()
    }

    #[test]
    fn toggle_is_parity_idempotent() {
        let mut selection = Selection::new(Tab::Workers);
        assert!(selection.toggle(id("M-0001")));
        assert!(selection.contains(&id("M-0001")));
        assert!(!selection.toggle(id("M-0001")));
        assert!(selection.is_empty());
    }

    #[test]
    fn select_all_replaces_not_merges() {
        let mut selection = Selection::new(Tab::Workers);
        selection.select_all(vec![id("M-0001"), id("M-0002"), id("M-0003")]);
        assert_eq!(selection.len(), 3);

        // narrowed filtered set: a second select-all must yield exactly it
        selection.select_all(vec![id("M-0002")]);
        assert_eq!(selection.len(), 1);
        assert!(selection.contains(&id("M-0002")));
        assert!(!selection.contains(&id("M-0001")));
    }

    #[test]
    fn switch_tab_clears_same_tab_keeps() {
        let mut selection = Selection::new(Tab::Workers);
        selection.toggle(id("M-0001"));

        selection.switch_tab(Tab::Workers);
        assert_eq!(selection.len(), 1);

        selection.switch_tab(Tab::Visitors);
        assert!(selection.is_empty());
        assert_eq!(selection.tab(), Tab::Visitors);
    }

    #[test]
    fn retain_present_prunes_stale_ids() {
        let mut selection = Selection::new(Tab::Workers);
        selection.select_all(vec![id("M-0001"), id("M-0002")]);
        let present: HashSet<RecordId> = [id("M-0002")].into_iter().collect();
        selection.retain_present(&present);
        assert_eq!(selection.len(), 1);
        assert!(selection.contains(&id("M-0002")));
    }
}
