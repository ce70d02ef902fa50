use crate::api::StateServerClient;
use crate::store::StateStore;
use crate::Result;
use std::sync::Arc;
use tokio::time::{interval, Duration};

/// One ingestion pull: fetch the full snapshot and merge it into the store
pub async fn pull_once(client: &StateServerClient, store: &StateStore) -> Result<()> {
    let response = client.get_state().await?;
    store.apply_snapshot(response);
    Ok(())
}

/// Fixed-interval ingestion, first fire immediate
///
/// A failed pull keeps the previous tables and waits for the next fire;
/// the schedule itself is the retry, there is no backoff or circuit
/// breaker at this layer.
pub async fn run_ingestion_loop(
    client: StateServerClient,
    store: Arc<StateStore>,
    period: Duration,
) {
    let mut ticker = interval(period);

    loop {
        ticker.tick().await;
        if let Err(err) = pull_once(&client, &store).await {
            tracing::warn!(error = %err, "State poll failed, keeping previous tables");
        }
    }
}
