//! Tests for the key-value stores and the profile service.

use std::sync::Arc;

use rabt::{
    DEFAULT_USERNAME, FileStore, KeyValueStore, MUTED_KEY, MemoryStore, ProfileService, USER_KEY,
};
use rabt_core::{CompletionReport, LevelId, Tier};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tempfile::TempDir;

fn level(tier: Tier, index: u8) -> LevelId {
    LevelId::new(tier, index).expect("valid level")
}

fn rng() -> StdRng {
    StdRng::seed_from_u64(11)
}

#[test]
fn test_file_store_persists_across_instances() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("nested").join("store.json");

    let store = FileStore::new(&path);
    assert_eq!(store.get("missing").expect("get"), None);
    store.set("a", "1").expect("set");
    store.set("b", "2").expect("set");
    store.remove("a").expect("remove");

    let reopened = FileStore::new(&path);
    assert_eq!(reopened.get("a").expect("get"), None);
    assert_eq!(reopened.get("b").expect("get"), Some("2".to_string()));
}

#[test]
fn test_file_store_rejects_corrupt_file() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("store.json");
    std::fs::write(&path, "not json").expect("write");

    let store = FileStore::new(&path);
    assert!(store.get("anything").is_err());
}

#[test]
fn test_no_record_means_logged_out() {
    let profiles = ProfileService::new(Arc::new(MemoryStore::new()));
    assert_eq!(profiles.load_user().expect("load"), None);
    assert!(!profiles.is_muted().expect("muted"));
}

#[test]
fn test_login_creates_and_saves_user() {
    let store = Arc::new(MemoryStore::new());
    let profiles = ProfileService::new(store.clone());

    let user = profiles.login("  أحمد  ", &mut rng()).expect("login");
    assert_eq!(user.username(), "أحمد");
    assert_eq!(user.user_id().len(), 9);
    assert!(
        user.user_id()
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
    );
    assert_eq!(*user.current_tier(), Tier::Beginner);
    for tier in [Tier::Beginner, Tier::Intermediate, Tier::Expert] {
        assert_eq!(user.best_time(tier), None);
    }

    let raw = store.get(USER_KEY).expect("get").expect("saved");
    let json: serde_json::Value = serde_json::from_str(&raw).expect("json");
    assert_eq!(json["username"], "أحمد");
    assert_eq!(json["currentLevel"], "BEGINNER");
    assert_eq!(json["bestTimes"]["EXPERT"], 0);

    assert_eq!(profiles.load_user().expect("load"), Some(user));
}

#[test]
fn test_blank_login_uses_default_name() {
    let profiles = ProfileService::new(Arc::new(MemoryStore::new()));
    let user = profiles.login("   ", &mut rng()).expect("login");
    assert_eq!(user.username(), DEFAULT_USERNAME);
}

#[test]
fn test_malformed_record_reads_as_logged_out() {
    let store = Arc::new(MemoryStore::new());
    store.set(USER_KEY, "{\"userId\": 5").expect("set");
    let profiles = ProfileService::new(store);
    assert_eq!(profiles.load_user().expect("load"), None);
}

#[test]
fn test_record_from_original_app_is_readable() {
    let store = Arc::new(MemoryStore::new());
    store
        .set(
            USER_KEY,
            r#"{"userId":"k3j9x0a1b","username":"ليلى","currentLevel":"INTERMEDIATE","bestTimes":{"BEGINNER":95,"INTERMEDIATE":0,"EXPERT":0}}"#,
        )
        .expect("set");
    let user = ProfileService::new(store)
        .load_user()
        .expect("load")
        .expect("user");
    assert_eq!(*user.current_tier(), Tier::Intermediate);
    assert_eq!(user.best_time(Tier::Beginner), Some(95));
    assert_eq!(user.best_time(Tier::Intermediate), None);
}

#[test]
fn test_mute_flag_roundtrip() {
    let store = Arc::new(MemoryStore::new());
    let profiles = ProfileService::new(store.clone());
    profiles.set_muted(true).expect("set");
    assert_eq!(store.get(MUTED_KEY).expect("get"), Some("true".to_string()));
    assert!(profiles.is_muted().expect("muted"));
    profiles.set_muted(false).expect("set");
    assert!(!profiles.is_muted().expect("muted"));
}

#[test]
fn test_record_completion_keeps_best_and_advances_tier() {
    let profiles = ProfileService::new(Arc::new(MemoryStore::new()));
    assert_eq!(
        profiles
            .record_completion(&CompletionReport::new(LevelId::first(), 40, 0, 0, None))
            .expect("record"),
        None
    );

    profiles.login("", &mut rng()).expect("login");
    let last_beginner = level(Tier::Beginner, 3);
    let first_intermediate = Some(level(Tier::Intermediate, 1));

    let user = profiles
        .record_completion(&CompletionReport::new(last_beginner, 90, 2, 1, first_intermediate))
        .expect("record")
        .expect("user");
    assert_eq!(user.best_time(Tier::Beginner), Some(90));
    assert_eq!(*user.current_tier(), Tier::Intermediate);

    let user = profiles
        .record_completion(&CompletionReport::new(last_beginner, 120, 0, 0, first_intermediate))
        .expect("record")
        .expect("user");
    assert_eq!(user.best_time(Tier::Beginner), Some(90));

    let user = profiles
        .record_completion(&CompletionReport::new(LevelId::first(), 30, 0, 0, Some(level(Tier::Beginner, 2))))
        .expect("record")
        .expect("user");
    assert_eq!(user.best_time(Tier::Beginner), Some(30));
    assert_eq!(*user.current_tier(), Tier::Intermediate);
}

#[test]
fn test_profiles_over_file_store() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("rabt.json");
    let user = ProfileService::new(Arc::new(FileStore::new(&path)))
        .login("Nour", &mut rng())
        .expect("login");

    let reloaded = ProfileService::new(Arc::new(FileStore::new(&path)))
        .load_user()
        .expect("load");
    assert_eq!(reloaded, Some(user));
}
