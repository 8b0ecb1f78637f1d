//! SessionStore backends
//!
//! Run with: `cargo test --test store_tests`

use pretty_assertions::assert_eq;
use webterm::{
    AliasTable, Error, FileStore, HistoryEntry, MemoryStore, Session, SessionStore, Theme,
};

fn sample_session(cwd: &str) -> Session {
    let mut aliases = AliasTable::new();
    aliases.add("gs", "git status").unwrap();
    Session {
        cwd: cwd.into(),
        aliases,
        theme: Theme::from("solarized"),
    }
}

async fn exercise_store(store: &dyn SessionStore) {
    assert!(store.load_history("abc").await.unwrap().is_empty());
    assert_eq!(store.load_session("abc").await.unwrap(), None);

    let entries = vec![
        HistoryEntry {
            cmd: "pwd".into(),
            time: 1_700_000_100,
            cwd: "/srv".into(),
        },
        HistoryEntry {
            cmd: "cd /srv".into(),
            time: 1_700_000_000,
            cwd: "/".into(),
        },
    ];
    store.save_history("abc", &entries).await.unwrap();
    assert_eq!(store.load_history("abc").await.unwrap(), entries);

    let session = sample_session("/srv");
    store.save_session("abc", &session).await.unwrap();
    assert_eq!(store.load_session("abc").await.unwrap(), Some(session));

    store.save_history("abc", &[]).await.unwrap();
    assert!(store.load_history("abc").await.unwrap().is_empty());

    // other ids are untouched
    assert_eq!(store.load_session("xyz").await.unwrap(), None);
}

#[tokio::test]
async fn memory_store_round_trips() {
    exercise_store(&MemoryStore::new()).await;
}

#[tokio::test]
async fn file_store_round_trips() {
    let tmp = tempfile::tempdir().unwrap();
    exercise_store(&FileStore::new(tmp.path())).await;
}

#[tokio::test]
async fn file_store_layout() {
    let tmp = tempfile::tempdir().unwrap();
    let store = FileStore::new(tmp.path());
    store
        .save_history(
            "abc",
            &[HistoryEntry {
                cmd: "ls".into(),
                time: 42,
                cwd: "/tmp".into(),
            }],
        )
        .await
        .unwrap();
    store
        .save_session("abc", &sample_session("/tmp"))
        .await
        .unwrap();

    let history: serde_json::Value =
        serde_json::from_slice(&std::fs::read(tmp.path().join("abc.history.json")).unwrap())
            .unwrap();
    assert_eq!(
        history,
        serde_json::json!([{"cmd": "ls", "time": 42, "cwd": "/tmp"}])
    );

    let session: serde_json::Value =
        serde_json::from_slice(&std::fs::read(tmp.path().join("abc.session.json")).unwrap())
            .unwrap();
    assert_eq!(session["cwd"], "/tmp");
    assert_eq!(session["theme"], "solarized");
    assert_eq!(session["aliases"]["gs"], "git status");
    assert_eq!(session["aliases"]["ll"], "ls -la");
}

#[tokio::test]
async fn file_store_reads_session_without_optional_fields() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("old.session.json"), br#"{"cwd": "/var"}"#).unwrap();

    let session = FileStore::new(tmp.path())
        .load_session("old")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.cwd, std::path::PathBuf::from("/var"));
    assert_eq!(session.theme, Theme::Dark);
    assert_eq!(session.aliases, AliasTable::new());
}

#[tokio::test]
async fn file_store_reports_corrupt_documents() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("bad.history.json"), b"not json").unwrap();

    let err = FileStore::new(tmp.path())
        .load_history("bad")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Serialization(_)));
}

#[tokio::test]
async fn invalid_session_ids_are_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let file = FileStore::new(tmp.path());
    let memory = MemoryStore::new();

    let too_long = "x".repeat(129);
    for id in ["", "../escape", "a/b", "with space", too_long.as_str()] {
        assert!(matches!(
            file.load_history(id).await,
            Err(Error::InvalidSessionId(_))
        ));
        assert!(matches!(
            memory.save_session(id, &Session::new("/")).await,
            Err(Error::InvalidSessionId(_))
        ));
    }
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
}
