use chrono::Utc;
use fsmtrader::api::{StateServerClient, DEFAULT_BASE_URL};
use fsmtrader::engine::{minute_bucket, PositionEngine, TradeDispatcher};
use fsmtrader::ingest::run_ingestion_loop;
use fsmtrader::models::TradeMode;
use fsmtrader::store::StateStore;
use std::sync::Arc;
use tokio::time::{interval, Duration};

// Engine schedule is fixed at one pass per second; the poll period is
// configurable so metadata-only deployments can poll slower
const TICK_PERIOD: Duration = Duration::from_secs(1);
const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    setup_logging();

    let base_url = std::env::var("STATE_SERVER_URL")
        .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    let trade_mode = trade_mode_from_env();
    let poll_interval = poll_interval_from_env();

    tracing::info!("FSM trader starting");
    tracing::info!("  State server: {}", base_url);
    tracing::info!("  Trade mode: {:?} (only 'live' reaches the broker)", trade_mode);
    tracing::info!("  Poll interval: {:?}", poll_interval);
    tracing::info!("  Engine tick: {:?}", TICK_PERIOD);

    let client = StateServerClient::new(base_url);
    let store = Arc::new(StateStore::new());
    let dispatcher = TradeDispatcher::new(client.clone(), trade_mode);
    let engine = Arc::new(PositionEngine::new(store.clone(), dispatcher));

    // two independent fixed-rate producers over the same store; their
    // schedules are deliberately not synchronized
    let ingestion_task = {
        let client = client.clone();
        let store = store.clone();
        tokio::spawn(async move {
            run_ingestion_loop(client, store, poll_interval).await;
        })
    };

    let engine_task = tokio::spawn(async move {
        engine_tick_loop(engine).await;
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl+C, shutting down");
        }
        result = ingestion_task => {
            tracing::error!("Ingestion loop exited: {:?}", result);
        }
        result = engine_task => {
            tracing::error!("Engine loop exited: {:?}", result);
        }
    }

    tracing::info!("FSM trader stopped");
}

fn setup_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fsmtrader=info".into()),
        )
        .init();
}

fn trade_mode_from_env() -> TradeMode {
    match std::env::var("TRADE_MODE") {
        Ok(raw) => raw.parse().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "Falling back to livesim");
            TradeMode::LiveSim
        }),
        Err(_) => TradeMode::LiveSim,
    }
}

fn poll_interval_from_env() -> Duration {
    let millis = std::env::var("POLL_INTERVAL_MS")
        .ok()
        .and_then(|raw| raw.parse::<u64>().ok())
        .unwrap_or(DEFAULT_POLL_INTERVAL_MS);
    Duration::from_millis(millis)
}

/// Fixed-rate engine schedule: one FSM pass per second, first fire
/// immediate, independent of the ingestion cadence
async fn engine_tick_loop(engine: Arc<PositionEngine>) {
    let mut ticker = interval(TICK_PERIOD);

    loop {
        ticker.tick().await;
        let minute = minute_bucket(Utc::now().timestamp_millis());
        let report = engine.run_tick(minute);

        if !report.commands.is_empty() || report.transitions > 0 {
            tracing::debug!(
                evaluated = report.evaluated,
                transitions = report.transitions,
                commands = report.commands.len(),
                "Engine tick"
            );
        }
    }
}
