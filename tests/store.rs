use camino::Utf8PathBuf;
use chrono::NaiveDate;

use flock_roster_manager::domain::{
    BranchFilter, Category, MembershipLevel, Record, RecordDraft, RecordStatus,
};
use flock_roster_manager::error::RosterError;
use flock_roster_manager::local::LocalStore;
use flock_roster_manager::store::{DirectoryStore, TransferRequest};

fn store_in(temp: &tempfile::TempDir) -> LocalStore {
    let root = Utf8PathBuf::from_path_buf(temp.path().join("roster")).unwrap();
    LocalStore::new(root)
}

fn draft(name: &str, branch: &str) -> RecordDraft {
    RecordDraft {
        category: Category::Member,
        branch_id: branch.parse().unwrap(),
        display_name: name.to_string(),
        status: RecordStatus::Active,
        level: Some(MembershipLevel::Worker),
        email: Some(format!(
            "{}@example.org",
            name.to_lowercase().replace(' ', ".")
        )),
        phone: None,
        joined_on: NaiveDate::from_ymd_opt(2024, 5, 12).unwrap(),
    }
}

#[test]
fn write_batch_assigns_sequential_ids() {
    let temp = tempfile::tempdir().unwrap();
    let store = store_in(&temp);

    store
        .write_batch(
            Category::Member,
            &[draft("Ann Stone", "north"), draft("Ben Okafor", "south")],
        )
        .unwrap();
    store
        .write_batch(Category::Member, &[draft("Chika Eze", "north")])
        .unwrap();

    let records = store
        .query_records(Category::Member, &BranchFilter::All)
        .unwrap();
    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["M-0001", "M-0002", "M-0003"]);
}

#[test]
fn query_is_branch_scoped() {
    let temp = tempfile::tempdir().unwrap();
    let store = store_in(&temp);
    store
        .write_batch(
            Category::Member,
            &[draft("Ann Stone", "north"), draft("Ben Okafor", "south")],
        )
        .unwrap();

    let north = store
        .query_records(Category::Member, &"north".parse().unwrap())
        .unwrap();
    assert_eq!(north.len(), 1);
    assert_eq!(north[0].display_name, "Ann Stone");
}

#[test]
fn categories_are_disjoint() {
    let temp = tempfile::tempdir().unwrap();
    let store = store_in(&temp);
    store
        .write_batch(Category::Member, &[draft("Ann Stone", "north")])
        .unwrap();

    let visitors = store
        .query_records(Category::Visitor, &BranchFilter::All)
        .unwrap();
    assert!(visitors.is_empty());
}

#[test]
fn write_record_updates_existing() {
    let temp = tempfile::tempdir().unwrap();
    let store = store_in(&temp);
    store
        .write_batch(Category::Member, &[draft("Ann Stone", "north")])
        .unwrap();

    let mut record = store
        .query_records(Category::Member, &BranchFilter::All)
        .unwrap()
        .remove(0);
    record.status = RecordStatus::Archived;
    store.write_record(Category::Member, &record).unwrap();

    let reloaded = store
        .query_records(Category::Member, &BranchFilter::All)
        .unwrap();
    assert_eq!(reloaded[0].status, RecordStatus::Archived);
}

#[test]
fn write_record_requires_existing_id() {
    let temp = tempfile::tempdir().unwrap();
    let store = store_in(&temp);
    let record = Record {
        id: "M-9999".parse().unwrap(),
        category: Category::Member,
        branch_id: "north".parse().unwrap(),
        display_name: "Nobody".to_string(),
        status: RecordStatus::Active,
        level: None,
        email: Some("nobody@example.org".to_string()),
        phone: None,
        joined_on: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
    };
    let err = store.write_record(Category::Member, &record).unwrap_err();
    assert!(matches!(err, RosterError::RecordNotFound(_)));
}

#[test]
fn transfer_requests_are_persisted() {
    let temp = tempfile::tempdir().unwrap();
    let store = store_in(&temp);
    let request = TransferRequest {
        record_id: "M-0001".parse().unwrap(),
        from_branch: "north".parse().unwrap(),
        to_branch: "south".parse().unwrap(),
        reason: "relocation".to_string(),
    };
    store.create_transfer_request(&request).unwrap();
    store.create_transfer_request(&request).unwrap();

    let first = store.transfers_dir().join("TR-0001.json");
    let second = store.transfers_dir().join("TR-0002.json");
    assert!(first.as_std_path().exists());
    assert!(second.as_std_path().exists());
}
