use crate::domain::{BranchFilter, FilterCriteria, LevelFilter, Record};

/// Pure filter pass: returns the matching records as a stable subsequence of
/// the input order. No re-sorting.
pub fn filter_records<'a>(records: &'a [Record], criteria: &FilterCriteria) -> Vec<&'a Record> {
    let needle = criteria.search_term.trim().to_lowercase();
    records
        .iter()
        .filter(|record| matches(record, criteria, &needle))
        .collect()
}

pub fn record_matches(record: &Record, criteria: &FilterCriteria) -> bool {
    let needle = criteria.search_term.trim().to_lowercase();
    matches(record, criteria, &needle)
}

// Cheapest-first, short-circuit: tab, branch, level, then text search.
fn matches(record: &Record, criteria: &FilterCriteria, needle: &str) -> bool {
    if !criteria.tab.matches(record) {
        return false;
    }
    if let BranchFilter::Branch(branch) = &criteria.branch {
        if record.branch_id != *branch {
            return false;
        }
    }
    if let LevelFilter::Only(level) = criteria.level {
        if record.level != Some(level) {
            return false;
        }
    }
    matches_search(record, needle)
}

// Case-insensitive substring over the fixed field set: name, email, phone.
// An empty term matches everything.
fn matches_search(record: &Record, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    contains_ci(&record.display_name, needle)
        || record
            .email
            .as_deref()
            .is_some_and(|value| contains_ci(value, needle))
        || record
            .phone
            .as_deref()
            .is_some_and(|value| contains_ci(value, needle))
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}
