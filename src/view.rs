use std::collections::HashSet;

use crate::domain::{BranchFilter, FilterCriteria, LevelFilter, Record, RecordId, Tab};
use crate::filter::filter_records;
use crate::page::{Page, paginate, total_pages};
use crate::selection::Selection;

/// Explicit view state over one loaded record set: filter criteria, page
/// cursor, and selection. Owned by the caller and injectable, never ambient.
///
/// Invariant: any criteria change resets the cursor to page 1; the cursor is
/// stable across re-renders with unchanged criteria.
#[derive(Debug, Clone)]
pub struct DirectoryView {
    records: Vec<Record>,
    criteria: FilterCriteria,
    branch_scope: BranchFilter,
    page_size: usize,
    page_number: usize,
    selection: Selection,
}

impl DirectoryView {
    pub fn new(records: Vec<Record>, tab: Tab, page_size: usize) -> Self {
        Self {
            records,
            criteria: FilterCriteria::new(tab),
            branch_scope: BranchFilter::All,
            page_size: page_size.max(1),
            page_number: 1,
            selection: Selection::new(tab),
        }
    }

    /// Records the branch scope the record set was queried with, so a
    /// reconciliation reload re-queries the same slice of the store.
    pub fn with_branch_scope(mut self, scope: BranchFilter) -> Self {
        self.branch_scope = scope;
        self
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn branch_scope(&self) -> &BranchFilter {
        &self.branch_scope
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn page_number(&self) -> usize {
        self.page_number
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn set_tab(&mut self, tab: Tab) {
        if self.criteria.tab == tab {
            return;
        }
        self.criteria.tab = tab;
        self.page_number = 1;
        self.selection.switch_tab(tab);
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        let term = term.into();
        if self.criteria.search_term == term {
            return;
        }
        self.criteria.search_term = term;
        self.page_number = 1;
    }

    pub fn set_branch_filter(&mut self, branch: BranchFilter) {
        if self.criteria.branch == branch {
            return;
        }
        self.criteria.branch = branch;
        self.page_number = 1;
    }

    pub fn set_level_filter(&mut self, level: LevelFilter) {
        if self.criteria.level == level {
            return;
        }
        self.criteria.level = level;
        self.page_number = 1;
    }

    pub fn filtered(&self) -> Vec<&Record> {
        filter_records(&self.records, &self.criteria)
    }

    /// Recomputed on demand from the current criteria and cursor.
    pub fn current_page(&self) -> Page<Record> {
        let filtered = self.filtered();
        let page = paginate(&filtered, self.page_size, self.page_number);
        Page {
            items: page.items.into_iter().cloned().collect(),
            page_number: page.page_number,
            total_pages: page.total_pages,
        }
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.filtered().len(), self.page_size)
    }

    /// Clamps into `[1, total_pages]` and returns the page landed on.
    pub fn goto_page(&mut self, page_number: usize) -> usize {
        let total = self.total_pages();
        self.page_number = page_number.clamp(1, total);
        self.page_number
    }

    pub fn next_page(&mut self) -> usize {
        self.goto_page(self.page_number.saturating_add(1))
    }

    pub fn prev_page(&mut self) -> usize {
        self.goto_page(self.page_number.saturating_sub(1).max(1))
    }

    pub fn toggle(&mut self, id: RecordId) -> bool {
        self.selection.toggle(id)
    }

    /// Selects exactly the currently filtered set, consistent with what the
    /// user can see. Never the whole record universe.
    pub fn select_all(&mut self) {
        let ids: Vec<RecordId> = self.filtered().iter().map(|r| r.id.clone()).collect();
        self.selection.select_all(ids);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear_all();
    }

    /// Selected records in directory order; this defines batch input order.
    pub fn selected_records(&self) -> Vec<Record> {
        self.records
            .iter()
            .filter(|record| self.selection.contains(&record.id))
            .cloned()
            .collect()
    }

    /// Reconciliation reload entry point: swap in the re-queried record set,
    /// keep criteria, clamp the cursor, and prune selected ids that no longer
    /// exist.
    pub fn replace_records(&mut self, records: Vec<Record>) {
        self.records = records;
        let present: HashSet<RecordId> = self.records.iter().map(|r| r.id.clone()).collect();
        self.selection.retain_present(&present);
        let total = self.total_pages();
        self.page_number = self.page_number.clamp(1, total);
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::{Category, MembershipLevel, RecordStatus};

    fn member(id: &str, branch: &str, name: &str, level: MembershipLevel) -> Record {
        Record {
            id: id.parse().unwrap(),
            category: Category::Member,
            branch_id: branch.parse().unwrap(),
            display_name: name.to_string(),
            status: RecordStatus::Active,
            level: Some(level),
            email: None,
            phone: None,
            joined_on: NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
        }
    }

    fn workers(count: usize) -> Vec<Record> {
        (1..=count)
            .map(|n| {
                member(
                    &format!("M-{n:04}"),
                    if n % 2 == 0 { "south" } else { "north" },
                    &format!("Worker {n}"),
                    MembershipLevel::Worker,
                )
            })
            .collect()
    }

    #[test]
    fn criteria_change_resets_to_page_one() {
        let mut view = DirectoryView::new(workers(45), Tab::Workers, 20);
        view.goto_page(3);
        assert_eq!(view.page_number(), 3);

        view.set_search_term("worker 1");
        assert_eq!(view.page_number(), 1);

        view.set_search_term("");
        view.goto_page(2);
        // unchanged criteria: cursor stays put
        view.set_branch_filter(BranchFilter::All);
        view.set_search_term("");
        assert_eq!(view.page_number(), 2);
    }

    #[test]
    fn navigation_clamps() {
        let mut view = DirectoryView::new(workers(45), Tab::Workers, 20);
        assert_eq!(view.goto_page(99), 3);
        assert_eq!(view.next_page(), 3);
        assert_eq!(view.goto_page(1), 1);
        assert_eq!(view.prev_page(), 1);
    }

    #[test]
    fn selection_survives_pagination() {
        let mut view = DirectoryView::new(workers(45), Tab::Workers, 20);
        let id: RecordId = "M-0003".parse().unwrap();
        view.toggle(id.clone());
        view.next_page();
        view.prev_page();
        assert!(view.selection().contains(&id));
    }

    #[test]
    fn select_all_tracks_narrowed_filter() {
        let mut view = DirectoryView::new(workers(45), Tab::Workers, 20);
        view.select_all();
        assert_eq!(view.selection().len(), 45);

        view.set_branch_filter("north".parse().unwrap());
        view.select_all();
        // exactly the narrowed set, not the original superset
        assert_eq!(view.selection().len(), 23);
        assert!(
            view.selected_records()
                .iter()
                .all(|r| r.branch_id.as_str() == "north")
        );
    }

    #[test]
    fn branch_change_keeps_selection_tab_change_clears() {
        let mut view = DirectoryView::new(workers(10), Tab::Workers, 20);
        view.toggle("M-0001".parse().unwrap());

        view.set_branch_filter("south".parse().unwrap());
        assert_eq!(view.selection().len(), 1);

        view.set_tab(Tab::Visitors);
        assert!(view.selection().is_empty());
    }

    #[test]
    fn selected_records_follow_directory_order() {
        let mut view = DirectoryView::new(workers(10), Tab::Workers, 20);
        view.toggle("M-0007".parse().unwrap());
        view.toggle("M-0002".parse().unwrap());
        view.toggle("M-0005".parse().unwrap());
        let selected = view.selected_records();
        let ids: Vec<&str> = selected.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["M-0002", "M-0005", "M-0007"]);
    }

    #[test]
    fn replace_records_prunes_selection_and_clamps_cursor() {
        let mut view = DirectoryView::new(workers(45), Tab::Workers, 20);
        view.goto_page(3);
        view.toggle("M-0001".parse().unwrap());
        view.toggle("M-0040".parse().unwrap());

        view.replace_records(workers(10));
        assert_eq!(view.page_number(), 1);
        assert_eq!(view.selection().len(), 1);
        assert!(view.selection().contains(&"M-0001".parse().unwrap()));
    }
}
