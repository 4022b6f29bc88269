use mirrordna::{CollectionStore, MirrorDnaError, Record};
use serde_json::{json, Value};
use tempfile::TempDir;

fn record(value: Value) -> Record {
    value.as_object().cloned().unwrap()
}

fn open_store(dir: &TempDir) -> CollectionStore {
    CollectionStore::open(dir.path()).unwrap()
}

#[test]
fn test_create_then_read_roundtrip() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    let identity = record(json!({
        "identity_id": "mdna_agt_ab12",
        "identity_type": "agent",
        "metadata": {"priority": "high"}
    }));

    let id = store.create("identities", &identity).unwrap();
    assert_eq!(id, "mdna_agt_ab12");

    let loaded = store.read("identities", "mdna_agt_ab12").unwrap().unwrap();
    assert_eq!(loaded, identity);
}

#[test]
fn test_create_duplicate_id_rejected() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    let identity = record(json!({"identity_id": "mdna_agt_ab12"}));
    store.create("identities", &identity).unwrap();

    let err = store.create("identities", &identity).unwrap_err();
    assert!(matches!(
        err,
        MirrorDnaError::DuplicateEntry { ref collection, ref id }
            if collection == "identities" && id == "mdna_agt_ab12"
    ));
}

#[test]
fn test_create_missing_identity_field_rejected() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    let err = store
        .create("identities", &record(json!({"name": "no id here"})))
        .unwrap_err();
    assert!(matches!(err, MirrorDnaError::InvalidFormat(_)));
}

#[test]
fn test_read_miss_is_none_not_error() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    assert!(store.read("identities", "absent").unwrap().is_none());
}

#[test]
fn test_update_shallow_merges() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    store
        .create(
            "sessions",
            &record(json!({"session_id": "sess_1", "status": "open", "turns": 3})),
        )
        .unwrap();

    let updated = store
        .update("sessions", "sess_1", &record(json!({"status": "closed"})))
        .unwrap()
        .unwrap();

    assert_eq!(updated["status"], "closed");
    assert_eq!(updated["turns"], 3);

    let reloaded = store.read("sessions", "sess_1").unwrap().unwrap();
    assert_eq!(reloaded, updated);
}

#[test]
fn test_update_miss_does_not_create() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    let result = store
        .update("sessions", "ghost", &record(json!({"status": "closed"})))
        .unwrap();
    assert!(result.is_none());
    assert!(store.read("sessions", "ghost").unwrap().is_none());
}

#[test]
fn test_delete_present_and_absent() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    store
        .create("memories", &record(json!({"memory_id": "mem_1"})))
        .unwrap();

    assert!(store.delete("memories", "mem_1").unwrap());
    assert!(store.read("memories", "mem_1").unwrap().is_none());
    assert!(!store.delete("memories", "mem_1").unwrap());
}

#[test]
fn test_query_exact_match_with_dotted_paths() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    for (id, priority, kind) in [
        ("mem_1", "high", "episodic"),
        ("mem_2", "low", "episodic"),
        ("mem_3", "high", "semantic"),
    ] {
        store
            .create(
                "memories",
                &record(json!({
                    "memory_id": id,
                    "kind": kind,
                    "metadata": {"priority": priority}
                })),
            )
            .unwrap();
    }

    let results = store
        .query(
            "memories",
            &record(json!({"metadata.priority": "high"})),
            100,
        )
        .unwrap();
    assert_eq!(results.len(), 2);

    let results = store
        .query(
            "memories",
            &record(json!({"metadata.priority": "high", "kind": "semantic"})),
            100,
        )
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["memory_id"], "mem_3");
}

#[test]
fn test_query_respects_limit_and_empty_filters() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    for i in 0..5 {
        store
            .create("notes", &record(json!({"id": format!("note_{i}")})))
            .unwrap();
    }

    let all = store.query("notes", &Record::new(), 100).unwrap();
    assert_eq!(all.len(), 5);

    let limited = store.query("notes", &Record::new(), 2).unwrap();
    assert_eq!(limited.len(), 2);
}

#[test]
fn test_query_empty_collection() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    let results = store.query("never_written", &Record::new(), 10).unwrap();
    assert!(results.is_empty());
}

#[test]
fn test_persists_across_store_instances() {
    let dir = TempDir::new().unwrap();

    {
        let store = open_store(&dir);
        store
            .create("identities", &record(json!({"identity_id": "mdna_usr_0001"})))
            .unwrap();
    }

    let reopened = open_store(&dir);
    let loaded = reopened.read("identities", "mdna_usr_0001").unwrap();
    assert!(loaded.is_some());
}

#[test]
fn test_collection_file_layout_is_id_to_record_map() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    store
        .create("identities", &record(json!({"identity_id": "mdna_agt_ab12"})))
        .unwrap();

    let raw = std::fs::read_to_string(dir.path().join("identities.json")).unwrap();
    let doc: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(doc["mdna_agt_ab12"]["identity_id"], "mdna_agt_ab12");
}

#[test]
fn test_corrupt_collection_file_is_storage_read_error() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    std::fs::write(dir.path().join("identities.json"), "{ not json").unwrap();

    let err = store.read("identities", "anything").unwrap_err();
    assert!(matches!(
        err,
        MirrorDnaError::StorageRead { ref collection, .. } if collection == "identities"
    ));
}
