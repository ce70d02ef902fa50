use crate::models::{
    BuyCondition, MarketSnapshot, PositionRecord, PositionState, TradeAction, TradeDirection,
    TradeSignal,
};

/// What a single evaluation wants sent to the trade sink, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandIntent {
    pub action: TradeAction,
    pub direction: TradeDirection,
}

impl CommandIntent {
    pub const OPEN_BUY: CommandIntent = CommandIntent {
        action: TradeAction::Open,
        direction: TradeDirection::Buy,
    };
    pub const CLOSE_SELL: CommandIntent = CommandIntent {
        action: TradeAction::Close,
        direction: TradeDirection::Sell,
    };
}

/// Result of evaluating one symbol for one tick
#[derive(Debug, Clone)]
pub struct SymbolOutcome {
    pub record: PositionRecord,
    pub commands: Vec<CommandIntent>,
}

/// Minute bucket used by the entry gate
pub fn minute_bucket(now_millis: i64) -> i64 {
    now_millis.div_euclid(60_000)
}

/// One tick of the per-symbol position FSM.
///
/// Evaluation order is load-bearing and must not be rearranged:
///
/// 1. recompute session PnL from the published snapshot;
/// 2. SELL signal short-circuits the rest of the tick, closing any open
///    position and realizing PnL (only if both entry and LTP are known);
/// 3. entry is gated to the first tick of each wall-clock minute, and only
///    fires when flat, on a BUY signal or re-enter flag, with the tri-state
///    buy condition `True` and a known LTP; `Unknown` waits, `False` sits
///    out the minute;
/// 4. while holding, a positive total PnL escalates to `LiveLong` and
///    re-asserts `OPEN/BUY` on every profitable tick (no dedup, see the
///    product note in DESIGN.md); a negative total requests `CLOSE/SELL`
///    from the sink without touching local state. The total used here is
///    the step-1 value, so an entry made in step 3 carries no unrealized
///    PnL until the next tick.
pub fn evaluate(
    record: &PositionRecord,
    snapshot: &MarketSnapshot,
    current_minute: i64,
) -> SymbolOutcome {
    let mut rec = record.clone();
    let mut commands = Vec::new();
    let ltp = snapshot.ltp;

    // step 1: PnL recompute
    let unrealized = match (rec.position_state, rec.entry_price, ltp) {
        (PositionState::Flat, _, _) => 0.0,
        (_, Some(entry), Some(price)) => price - entry,
        _ => 0.0,
    };
    let total_pnl = rec.realized_pnl + unrealized;
    rec.session_pnl = total_pnl;

    // step 2: SELL short-circuit, any second of the minute
    if snapshot.last_signal == Some(TradeSignal::Sell) {
        if !rec.is_flat() {
            if let (Some(entry), Some(price)) = (rec.entry_price, ltp) {
                let pnl = price - entry;
                rec.realized_pnl += pnl;
                rec.cumulative_pnl += pnl;
            }
            rec.entry_price = None;
            rec.position_state = PositionState::Flat;
            commands.push(CommandIntent::CLOSE_SELL);
        }
        return SymbolOutcome {
            record: rec,
            commands,
        };
    }

    // step 3: minute-gated entry, at most once per (symbol, minute)
    if rec.last_minute != Some(current_minute) {
        rec.last_minute = Some(current_minute);

        let wants_entry =
            snapshot.last_signal == Some(TradeSignal::Buy) || snapshot.re_enter_buy_condition;

        if wants_entry && rec.is_flat() {
            match snapshot.buy_condition {
                // not evaluated server-side yet: wait
                BuyCondition::Unknown => {}
                BuyCondition::True => {
                    if let Some(price) = ltp {
                        rec.position_state = PositionState::PaperLong;
                        rec.entry_price = Some(price);
                    }
                }
                // condition failed: idle for the rest of this minute
                BuyCondition::False => {}
            }
        }
    }

    // step 4: PnL-triggered escalation / de-escalation
    if matches!(
        rec.position_state,
        PositionState::PaperLong | PositionState::LiveLong
    ) {
        if total_pnl > 0.0 {
            commands.push(CommandIntent::OPEN_BUY);
            rec.position_state = PositionState::LiveLong;
        } else if total_pnl < 0.0 {
            // deliberate asymmetry: keep asking the sink to close while
            // leaving the local position open; reconciliation is external
            commands.push(CommandIntent::CLOSE_SELL);
        }
    }

    SymbolOutcome {
        record: rec,
        commands,
    }
}
