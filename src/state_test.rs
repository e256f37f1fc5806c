use super::test_helpers::{MockDirectory, desk_of, seed_desk, test_app_state};
use super::*;

fn state() -> AppState {
    test_app_state("http://127.0.0.1:9", Arc::new(MockDirectory::default()))
}

#[test]
fn desk_entry_default_is_fresh() {
    let entry = DeskEntry::default();
    assert!(entry.desk.doctors.is_empty());
    assert!(!entry.desk.show_details);
}

#[tokio::test]
async fn with_desk_creates_on_first_use() {
    let state = state();
    assert!(desk_of(&state, "tok").await.is_none());
    state.with_desk("tok", |desk| desk.search_term = "UH1".into()).await;
    assert_eq!(desk_of(&state, "tok").await.unwrap().search_term, "UH1");
}

#[tokio::test]
async fn desks_are_isolated_per_token() {
    let state = state();
    seed_desk(&state, "a", |desk| desk.search_term = "A".into()).await;
    seed_desk(&state, "b", |desk| desk.search_term = "B".into()).await;
    assert_eq!(desk_of(&state, "a").await.unwrap().search_term, "A");
    assert_eq!(desk_of(&state, "b").await.unwrap().search_term, "B");
}

#[tokio::test]
async fn update_desk_skips_missing_desk() {
    let state = state();
    let result = state.update_desk("gone", |desk| desk.is_searching).await;
    assert_eq!(result, None);
    assert!(desk_of(&state, "gone").await.is_none());
}

#[tokio::test]
async fn drop_desk_removes_entry() {
    let state = state();
    seed_desk(&state, "tok", |_| {}).await;
    state.drop_desk("tok").await;
    assert!(desk_of(&state, "tok").await.is_none());
    // idempotent
    state.drop_desk("tok").await;
}

#[tokio::test]
async fn with_desk_refreshes_touched() {
    let state = state();
    seed_desk(&state, "tok", |_| {}).await;
    let before = state.desks.read().await["tok"].touched;
    state.with_desk("tok", |_| ()).await;
    let after = state.desks.read().await["tok"].touched;
    assert!(after >= before);
}
