use crate::api::StateServerClient;
use crate::models::{TradeAction, TradeCommand, TradeDirection, TradeMode};
use crate::store::MarketTables;
use uuid::Uuid;

/// Fire-and-forget wrapper around `POST /trade`
///
/// Resolves quantity from instrument metadata and hands the request to a
/// spawned task, so an engine tick never waits on the sink. A failed
/// dispatch is an observability event only: no retry, no compensating
/// local transition.
#[derive(Clone)]
pub struct TradeDispatcher {
    client: StateServerClient,
    mode: TradeMode,
}

impl TradeDispatcher {
    pub fn new(client: StateServerClient, mode: TradeMode) -> Self {
        Self { client, mode }
    }

    pub fn mode(&self) -> TradeMode {
        self.mode
    }

    /// Build the command for a symbol and send it without awaiting the sink
    ///
    /// Quantity is the instrument lot size, defaulting to 1 when the
    /// instrument is not (yet) known. Returns the command that was sent
    /// for logging and tests.
    pub fn dispatch(
        &self,
        tables: &MarketTables,
        symbol: &str,
        action: TradeAction,
        direction: TradeDirection,
    ) -> TradeCommand {
        let command = self.build_command(tables, symbol, action, direction);
        let correlation_id = Uuid::new_v4();

        tracing::debug!(
            %correlation_id,
            symbol = %command.symbol,
            action = ?command.action,
            direction = ?command.direction,
            qty = command.qty,
            "Dispatching trade command"
        );

        let client = self.client.clone();
        let sent = command.clone();
        tokio::spawn(async move {
            if let Err(err) = client.send_trade(&sent).await {
                // local transitions are optimistic and stay as they are;
                // divergence from the sink is logged, never fatal
                tracing::warn!(
                    %correlation_id,
                    symbol = %sent.symbol,
                    error = %err,
                    "Trade dispatch failed"
                );
            }
        });

        command
    }

    fn build_command(
        &self,
        tables: &MarketTables,
        symbol: &str,
        action: TradeAction,
        direction: TradeDirection,
    ) -> TradeCommand {
        let qty = tables
            .instruments
            .get(symbol)
            .map(|instr| instr.lot)
            .unwrap_or(1);

        TradeCommand {
            symbol: symbol.to_string(),
            mode: self.mode,
            action,
            direction,
            qty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Exchange, Instrument};
    use std::collections::HashMap;

    fn tables_with_lot(symbol: &str, lot: u32) -> MarketTables {
        let mut instruments = HashMap::new();
        instruments.insert(
            symbol.to_string(),
            Instrument {
                symbol: symbol.to_string(),
                exchange: Exchange::Nfo,
                tradingsymbol: format!("{}FUT", symbol),
                token: 1,
                lot,
            },
        );
        MarketTables {
            symbols: vec![symbol.to_string()],
            market: HashMap::new(),
            instruments,
        }
    }

    #[test]
    fn test_quantity_from_instrument_lot() {
        let dispatcher = TradeDispatcher::new(
            StateServerClient::new("http://localhost:0"),
            TradeMode::Paper,
        );
        let tables = tables_with_lot("NIFTY", 75);

        let command = dispatcher.build_command(
            &tables,
            "NIFTY",
            TradeAction::Open,
            TradeDirection::Buy,
        );

        assert_eq!(command.qty, 75);
        assert_eq!(command.mode, TradeMode::Paper);
    }

    #[test]
    fn test_quantity_defaults_to_one_for_unknown_instrument() {
        let dispatcher = TradeDispatcher::new(
            StateServerClient::new("http://localhost:0"),
            TradeMode::LiveSim,
        );
        let tables = MarketTables::default();

        let command = dispatcher.build_command(
            &tables,
            "UNSEEN",
            TradeAction::Close,
            TradeDirection::Sell,
        );

        assert_eq!(command.qty, 1);
        assert_eq!(command.action, TradeAction::Close);
        assert_eq!(command.direction, TradeDirection::Sell);
    }

    #[test]
    fn test_dispatch_posts_to_sink() {
        tokio_test::block_on(async {
            let mut server = mockito::Server::new_async().await;
            let mock = server
                .mock("POST", "/trade")
                .match_body(mockito::Matcher::Json(serde_json::json!({
                    "symbol": "NIFTY",
                    "mode": "livesim",
                    "action": "OPEN",
                    "direction": "BUY",
                    "qty": 75
                })))
                .with_status(200)
                .create_async()
                .await;

            let dispatcher = TradeDispatcher::new(
                StateServerClient::new(server.url()),
                TradeMode::LiveSim,
            );
            let tables = tables_with_lot("NIFTY", 75);

            dispatcher.dispatch(&tables, "NIFTY", TradeAction::Open, TradeDirection::Buy);

            // dispatch is fire-and-forget; give the spawned task a moment
            for _ in 0..50 {
                if mock.matched_async().await {
                    break;
                }
                tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
            }
            mock.assert_async().await;
        });
    }
}
