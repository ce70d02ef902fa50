use crate::engine::dispatcher::TradeDispatcher;
use crate::engine::fsm;
use crate::models::TradeCommand;
use crate::store::StateStore;
use std::sync::Arc;

/// Summary of one engine pass across all symbols
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub evaluated: usize,
    pub transitions: usize,
    pub commands: Vec<TradeCommand>,
}

/// Runs the FSM over every symbol in the store on each scheduler fire
pub struct PositionEngine {
    store: Arc<StateStore>,
    dispatcher: TradeDispatcher,
}

impl PositionEngine {
    pub fn new(store: Arc<StateStore>, dispatcher: TradeDispatcher) -> Self {
        Self { store, dispatcher }
    }

    /// One full evaluation pass for the given minute bucket
    ///
    /// Reads whichever table versions are currently published, evaluates
    /// every symbol independently, publishes the whole next position table
    /// in one step, then dispatches the accumulated commands in evaluation
    /// order. Dispatch is fire-and-forget, so a slow or failing sink never
    /// stalls the tick.
    pub fn run_tick(&self, current_minute: i64) -> TickReport {
        let tables = self.store.market_tables();
        let positions = self.store.positions();

        let mut report = TickReport::default();
        let mut updates = Vec::new();
        let mut intents = Vec::new();

        for symbol in &tables.symbols {
            let (Some(snapshot), Some(record)) =
                (tables.market.get(symbol), positions.get(symbol))
            else {
                continue;
            };

            let outcome = fsm::evaluate(record, snapshot, current_minute);
            report.evaluated += 1;

            if outcome.record.position_state != record.position_state {
                report.transitions += 1;
                tracing::info!(
                    symbol = %symbol,
                    from = ?record.position_state,
                    to = ?outcome.record.position_state,
                    entry = ?outcome.record.entry_price,
                    realized = outcome.record.realized_pnl,
                    "Position transition"
                );
            }

            for intent in &outcome.commands {
                intents.push((symbol.clone(), *intent));
            }
            if outcome.record != *record {
                updates.push(outcome.record);
            }
        }

        if !updates.is_empty() {
            self.store.update_positions(move |table| {
                for record in updates {
                    table.insert(record.symbol.clone(), record);
                }
            });
        }

        // transitions are already published; a dispatch failure past this
        // point never rolls them back
        for (symbol, intent) in intents {
            let command =
                self.dispatcher
                    .dispatch(&tables, &symbol, intent.action, intent.direction);
            report.commands.push(command);
        }

        report
    }
}
