// Tests for the in-memory session store
//
// Covers the full lifecycle (create/get/update/delete), TTL expiry
// semantics and the lazy sweep. The Redis backend shares the same trait
// contract but needs a live server, so it is not exercised here.

use std::time::Duration;

use anyhow::Result;
use asr_api::{MemoryStore, Phrase, SessionStore};

fn phrase(text: &str, start: f64, end: f64) -> Phrase {
    Phrase {
        text: text.to_string(),
        start_time: start,
        end_time: end,
    }
}

#[tokio::test]
async fn test_create_then_get_returns_empty_record() -> Result<()> {
    let store = MemoryStore::new(Duration::from_secs(60));

    let id = store.create().await?;
    let record = store.get(&id).await?;

    assert!(record.decoder_state.is_none());
    assert!(record.phrases.is_empty());
    assert!(store.exists(&id).await?);

    Ok(())
}

#[tokio::test]
async fn test_created_ids_are_unique() -> Result<()> {
    let store = MemoryStore::new(Duration::from_secs(60));

    let a = store.create().await?;
    let b = store.create().await?;
    assert_ne!(a, b);

    let mut ids = store.list_ids().await?;
    ids.sort();
    let mut expected = vec![a, b];
    expected.sort();
    assert_eq!(ids, expected);

    Ok(())
}

#[tokio::test]
async fn test_update_replaces_payload() -> Result<()> {
    let store = MemoryStore::new(Duration::from_secs(60));
    let id = store.create().await?;

    let state = vec![1u8, 2, 3];
    let phrases = vec![phrase("hello", 0.0, 1.0)];
    store.update(&id, Some(state.clone()), phrases.clone()).await?;

    let record = store.get(&id).await?;
    assert_eq!(record.decoder_state.as_deref(), Some(state.as_slice()));
    assert_eq!(record.phrases, phrases);

    Ok(())
}

#[tokio::test]
async fn test_update_unknown_session_is_not_found() {
    let store = MemoryStore::new(Duration::from_secs(60));

    let err = store
        .update("missing", None, Vec::new())
        .await
        .unwrap_err();
    assert!(matches!(err, asr_api::AsrError::SessionNotFound(_)));
}

#[tokio::test]
async fn test_delete_is_idempotent() -> Result<()> {
    let store = MemoryStore::new(Duration::from_secs(60));
    let id = store.create().await?;

    store.delete(&id).await?;
    assert!(!store.exists(&id).await?);
    assert!(store.get(&id).await.is_err());

    // Deleting again never errors
    store.delete(&id).await?;

    Ok(())
}

#[tokio::test]
async fn test_expired_session_is_not_found_without_sweep() -> Result<()> {
    let store = MemoryStore::new(Duration::from_millis(50));
    let id = store.create().await?;

    tokio::time::sleep(Duration::from_millis(120)).await;

    assert!(!store.exists(&id).await?);
    assert!(matches!(
        store.get(&id).await.unwrap_err(),
        asr_api::AsrError::SessionNotFound(_)
    ));
    assert!(store.update(&id, None, Vec::new()).await.is_err());

    Ok(())
}

#[tokio::test]
async fn test_update_renews_the_expiry_clock() -> Result<()> {
    let store = MemoryStore::new(Duration::from_millis(200));
    let id = store.create().await?;

    // Touch the session just before it would expire; it must survive past
    // the original deadline.
    tokio::time::sleep(Duration::from_millis(120)).await;
    store.update(&id, Some(vec![9]), Vec::new()).await?;

    tokio::time::sleep(Duration::from_millis(120)).await;
    let record = store.get(&id).await?;
    assert_eq!(record.decoder_state, Some(vec![9]));

    // Left alone well past the timeout it finally expires.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(store.get(&id).await.is_err());

    Ok(())
}

#[tokio::test]
async fn test_sweep_expired_reports_removed_count() -> Result<()> {
    let store = MemoryStore::new(Duration::from_millis(50));
    store.create().await?;
    store.create().await?;

    tokio::time::sleep(Duration::from_millis(120)).await;

    assert_eq!(store.sweep_expired().await?, 2);
    assert_eq!(store.sweep_expired().await?, 0);
    assert!(store.list_ids().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_list_ids_excludes_expired_sessions() -> Result<()> {
    let store = MemoryStore::new(Duration::from_millis(150));

    let old = store.create().await?;
    tokio::time::sleep(Duration::from_millis(200)).await;
    let fresh = store.create().await?;

    let ids = store.list_ids().await?;
    assert!(ids.contains(&fresh));
    assert!(!ids.contains(&old));

    Ok(())
}
