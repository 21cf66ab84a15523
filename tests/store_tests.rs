/// Store integration tests — the JSON file collaborator on a temp dir.

use echo_engine::store::{ConversationStore, JsonFileStore, StoreError};
use echo_engine::{Message, Sender, Stage};

fn sample_messages() -> Vec<Message> {
    vec![
        Message::new(Sender::User, "hello", false, 1_000, Stage::Normal),
        Message::new(Sender::Ai, "Boot sequence complete.", false, 1_500, Stage::Normal),
        Message::new(Sender::User, "a dream", false, 2_000, Stage::Normal),
        Message::new(Sender::Ai, "STATIC ▒LEEDS", true, 2_700, Stage::Glitch),
    ]
}

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("none.json"));
    assert!(store.load_messages().unwrap().is_empty());
    assert_eq!(store.load_stage().unwrap(), Stage::Normal);
    assert!(!store.load_false_memory_shared().unwrap());
    assert_eq!(store.load_text_size().unwrap(), 14.0);
    assert!(store.load_vibration_enabled().unwrap());
}

#[test]
fn round_trip_everything() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("echo.json");

    let mut store = JsonFileStore::new(&path);
    store.save_messages(&sample_messages()).unwrap();
    store.save_stage(Stage::Glitch).unwrap();
    store.save_false_memory_shared(true).unwrap();
    store.save_text_size(18.5).unwrap();
    store.save_vibration_enabled(false).unwrap();

    let reopened = JsonFileStore::new(&path);
    assert_eq!(reopened.load_messages().unwrap(), sample_messages());
    assert_eq!(reopened.load_stage().unwrap(), Stage::Glitch);
    assert!(reopened.load_false_memory_shared().unwrap());
    assert_eq!(reopened.load_text_size().unwrap(), 18.5);
    assert!(!reopened.load_vibration_enabled().unwrap());

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("\"stage\": \"GLITCH\""));
}

#[test]
fn clear_session_keeps_settings() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = JsonFileStore::new(dir.path().join("echo.json"));
    store.save_messages(&sample_messages()).unwrap();
    store.save_stage(Stage::Loop).unwrap();
    store.save_false_memory_shared(true).unwrap();
    store.save_text_size(20.0).unwrap();

    store.clear_session().unwrap();
    assert!(store.load_messages().unwrap().is_empty());
    assert_eq!(store.load_stage().unwrap(), Stage::Normal);
    assert!(!store.load_false_memory_shared().unwrap());
    assert_eq!(store.load_text_size().unwrap(), 20.0);
}

#[test]
fn corrupt_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("echo.json");
    std::fs::write(&path, "{ not json at all").unwrap();

    let mut store = JsonFileStore::new(&path);
    assert!(store.load_messages().unwrap().is_empty());
    assert_eq!(store.load_stage().unwrap(), Stage::Normal);

    // The next save replaces the corrupt document
    store.save_stage(Stage::Reveal).unwrap();
    assert_eq!(store.load_stage().unwrap(), Stage::Reveal);
}

#[test]
fn unknown_values_are_normalised() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("echo.json");
    let raw = r#"{
        "version": 1,
        "messages": [
            { "sender": "USER", "text": "hi", "timestamp_millis": 5, "stage_at_send": "NORMAL" },
            { "sender": "ROBOT", "text": "beep" },
            { "sender": "ai", "text": "hello", "is_glitched": true, "stage_at_send": "WOBBLE" }
        ],
        "stage": "SIDEWAYS",
        "false_memory_shared": true
    }"#;
    std::fs::write(&path, raw).unwrap();

    let store = JsonFileStore::new(&path);
    let messages = store.load_messages().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].text(), "hi");
    assert_eq!(messages[0].timestamp_millis(), 5);
    assert_eq!(messages[1].sender(), Sender::Ai);
    assert!(messages[1].is_glitched());
    assert_eq!(messages[1].stage_at_send(), Stage::Normal);

    assert_eq!(store.load_stage().unwrap(), Stage::Normal);
    assert!(store.load_false_memory_shared().unwrap());
    assert_eq!(store.load_text_size().unwrap(), 14.0);
}

#[test]
fn newer_version_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("echo.json");
    std::fs::write(&path, r#"{ "version": 99 }"#).unwrap();

    let store = JsonFileStore::new(&path);
    assert!(matches!(
        store.load_stage(),
        Err(StoreError::VersionMismatch {
            expected: 1,
            found: 99
        })
    ));
}
