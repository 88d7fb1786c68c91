use moodjournal_session::{
    KeyValueStore, MemoryStore, Session, SessionStore, StorageEvent, User, DARK_MODE_KEY,
    TOKEN_KEY, USER_KEY,
};

fn test_user() -> User {
    User {
        id: 7,
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
        created_at: None,
    }
}

#[test]
fn test_set_and_read_session() {
    let store = SessionStore::in_memory();
    assert!(!store.is_authenticated());
    assert_eq!(store.session().unwrap(), None);

    store
        .set_session(&Session::new("test_token", Some(test_user())))
        .unwrap();

    assert!(store.is_authenticated());
    assert_eq!(store.token().unwrap(), Some("test_token".to_string()));
    assert_eq!(store.user().unwrap(), Some(test_user()));
}

#[test]
fn test_clear_keeps_preferences() {
    let store = SessionStore::in_memory();
    store
        .set_session(&Session::new("test_token", Some(test_user())))
        .unwrap();
    store.set_dark_mode(true).unwrap();
    store.set_font_preference("Georgia").unwrap();

    store.clear().unwrap();

    assert!(!store.is_authenticated());
    assert_eq!(store.user().unwrap(), None);
    assert!(store.dark_mode().unwrap());
    assert_eq!(store.font_preference().unwrap(), Some("Georgia".to_string()));
}

#[test]
fn test_empty_token_is_logged_out() {
    let backend = MemoryStore::new();
    backend.set(TOKEN_KEY, "").unwrap();
    let store = SessionStore::new(backend);

    assert!(!store.is_authenticated());
    assert_eq!(store.session().unwrap(), None);
}

#[test]
fn test_unreadable_user_is_ignored() {
    let backend = MemoryStore::new();
    backend.set(TOKEN_KEY, "tok").unwrap();
    backend.set(USER_KEY, "{broken").unwrap();
    let store = SessionStore::new(backend);

    let session = store.session().unwrap().unwrap();
    assert_eq!(session.token, "tok");
    assert_eq!(session.user, None);
}

#[test]
fn test_dark_mode_defaults_off() {
    let store = SessionStore::in_memory();
    assert!(!store.dark_mode().unwrap());

    store.set_dark_mode(true).unwrap();
    assert!(store.dark_mode().unwrap());
    store.set_dark_mode(false).unwrap();
    assert!(!store.dark_mode().unwrap());
}

#[tokio::test]
async fn test_changes_are_broadcast() {
    let store = SessionStore::in_memory();
    let observer = store.clone();
    let mut events = observer.subscribe();

    store.set_dark_mode(true).unwrap();
    store
        .set_session(&Session::new("tok", Some(test_user())))
        .unwrap();
    store.clear().unwrap();

    assert_eq!(
        events.recv().await.unwrap(),
        StorageEvent {
            key: DARK_MODE_KEY.to_string(),
            new_value: Some("true".to_string()),
        }
    );
    assert_eq!(events.recv().await.unwrap().key, TOKEN_KEY);
    assert_eq!(events.recv().await.unwrap().key, USER_KEY);

    let removed = events.recv().await.unwrap();
    assert_eq!(removed.key, TOKEN_KEY);
    assert_eq!(removed.new_value, None);
    assert_eq!(events.recv().await.unwrap().key, USER_KEY);
}

#[test]
fn test_file_backed_session_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    SessionStore::open(&path)
        .unwrap()
        .set_session(&Session::new("persisted", Some(test_user())))
        .unwrap();

    let reopened = SessionStore::open(&path).unwrap();
    assert_eq!(reopened.token().unwrap(), Some("persisted".to_string()));
    assert_eq!(reopened.user().unwrap().map(|u| u.name), Some("Ada".to_string()));
}

#[test]
fn test_font_change_reaches_late_subscriber_only_after_subscribe() {
    tokio_test::block_on(async {
        let store = SessionStore::in_memory();
        store.set_font_preference("Arial").unwrap();

        let mut events = store.subscribe();
        store.set_font_preference("Georgia").unwrap();

        let event = events.recv().await.unwrap();
        assert_eq!(event.key, "userFontPreference");
        assert_eq!(event.new_value.as_deref(), Some("Georgia"));
        assert!(events.try_recv().is_err());
    });
}
