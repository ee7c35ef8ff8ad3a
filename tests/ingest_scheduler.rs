// tests/ingest_scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use democracy_index::ingest::providers::openstates::OpenStatesProvider;
use democracy_index::ingest::scheduler::{spawn_refresh_scheduler, RefreshSchedulerCfg};
use democracy_index::ingest::types::SourceProvider;
use democracy_index::store::MemoryStore;
use democracy_index::weights::HotReloadWeights;
use democracy_index::AppState;

#[tokio::test]
async fn scheduler_first_tick_refreshes_state() {
    let store = Arc::new(MemoryStore::new());
    let providers: Vec<Box<dyn SourceProvider>> = vec![Box::new(
        OpenStatesProvider::from_fixture_default(include_str!("fixtures/openstates_bills.json"))
            .unwrap(),
    )];
    let state = AppState::new(vec![], HotReloadWeights::new(None), store.clone(), providers);

    let handle = spawn_refresh_scheduler(RefreshSchedulerCfg { interval_secs: 3600 }, state.clone());

    let mut waited = 0;
    while state.snapshot().is_empty() && waited < 50 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        waited += 1;
    }
    handle.abort();

    assert_eq!(state.snapshot().len(), 2);
    assert_eq!(store.save_count(), 1);
}
