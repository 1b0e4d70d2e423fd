/// Store contract against the in-memory backend

mod common;

use taskflow_shared::store::Storage;

#[tokio::test]
async fn test_user_uniqueness() {
    common::user_uniqueness(&Storage::in_memory()).await;
}

#[tokio::test]
async fn test_task_lifecycle() {
    common::task_lifecycle(&Storage::in_memory()).await;
}

#[tokio::test]
async fn test_listing_through_query_engine() {
    common::listing_through_query_engine(&Storage::in_memory()).await;
}

#[tokio::test]
async fn test_session_round_trip() {
    common::session_round_trip(&Storage::in_memory()).await;
}

#[tokio::test]
async fn test_concurrent_first_logins_create_one_user() {
    use taskflow_shared::auth::session::{SessionGate, SessionPolicy};

    let storage = Storage::in_memory();
    let gate = SessionGate::new(&storage, SessionPolicy::default());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let gate = gate.clone();
            tokio::spawn(async move { gate.login("racer", "same-password").await })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        let outcome = handle.await.unwrap().expect("every racer should log in");
        ids.push(outcome.user.id);
    }

    ids.dedup();
    assert_eq!(ids.len(), 1);
}
