use assert_matches::assert_matches;

use flock_roster_manager::config::{Config, ConfigLoader};
use flock_roster_manager::error::RosterError;
use flock_roster_manager::import::DEFAULT_CHUNK_SIZE;
use flock_roster_manager::page::DEFAULT_PAGE_SIZE;

#[test]
fn empty_config_resolves_to_defaults() {
    let resolved = ConfigLoader::resolve_config(Config::default()).unwrap();
    assert_eq!(resolved.schema_version, 1);
    assert_eq!(resolved.page_size, DEFAULT_PAGE_SIZE);
    assert_eq!(resolved.chunk_size, DEFAULT_CHUNK_SIZE);
    assert!(resolved.api_base_url.is_none());
    assert!(resolved.default_branch.is_none());
}

#[test]
fn full_config_round_trips() {
    let config: Config = serde_json::from_str(
        r#"{
            "schema_version": 1,
            "api_base_url": "https://roster.example.org/api",
            "branch": "north",
            "page_size": 25,
            "chunk_size": 100
        }"#,
    )
    .unwrap();
    let resolved = ConfigLoader::resolve_config(config).unwrap();
    assert_eq!(
        resolved.api_base_url.as_deref(),
        Some("https://roster.example.org/api")
    );
    assert_eq!(resolved.default_branch.unwrap().as_str(), "north");
    assert_eq!(resolved.page_size, 25);
    assert_eq!(resolved.chunk_size, 100);
}

#[test]
fn invalid_sizes_are_rejected() {
    let config = Config {
        page_size: Some(0),
        ..Config::default()
    };
    assert_matches!(
        ConfigLoader::resolve_config(config).unwrap_err(),
        RosterError::InvalidPageSize(0)
    );
}

#[test]
fn missing_default_config_is_optional() {
    // resolve_optional falls back to defaults when flock-rm.json is absent
    let temp = tempfile::tempdir().unwrap();
    let old = std::env::current_dir().unwrap();
    std::env::set_current_dir(temp.path()).unwrap();
    let resolved = ConfigLoader::resolve_optional(None);
    std::env::set_current_dir(old).unwrap();
    assert_eq!(resolved.unwrap().page_size, DEFAULT_PAGE_SIZE);
}
