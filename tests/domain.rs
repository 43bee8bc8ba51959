use assert_matches::assert_matches;

use flock_roster_manager::domain::{
    BranchFilter, Category, LevelFilter, MembershipLevel, RecordId, RecordStatus, Tab,
};
use flock_roster_manager::error::RosterError;

#[test]
fn parse_record_id_valid() {
    let id: RecordId = " V-0007 ".parse().unwrap();
    assert_eq!(id.as_str(), "V-0007");
}

#[test]
fn parse_record_id_invalid() {
    let err = "two words".parse::<RecordId>().unwrap_err();
    assert_matches!(err, RosterError::InvalidRecordId(_));
}

#[test]
fn parse_filters() {
    assert_eq!("all".parse::<BranchFilter>().unwrap(), BranchFilter::All);
    assert_matches!(
        "north".parse::<BranchFilter>().unwrap(),
        BranchFilter::Branch(_)
    );
    assert_eq!(
        "leader".parse::<LevelFilter>().unwrap(),
        LevelFilter::Only(MembershipLevel::Leader)
    );
}

#[test]
fn tab_category_routing() {
    assert_eq!(Tab::Workers.category(), Category::Member);
    assert_eq!(Tab::Converts.category(), Category::Member);
    assert_eq!(Tab::Visitors.category(), Category::Visitor);
}

#[test]
fn status_parsing_is_case_insensitive() {
    assert_eq!(
        "Contacted".parse::<RecordStatus>().unwrap(),
        RecordStatus::Contacted
    );
    let err = "pending".parse::<RecordStatus>().unwrap_err();
    assert_matches!(err, RosterError::InvalidStatus(_));
}
