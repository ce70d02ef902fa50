use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Venue an instrument trades on
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Exchange {
    Nfo,
    Bfo,
}

/// Instrument metadata as delivered by the state server
///
/// Immutable once received; keyed by `symbol`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Instrument {
    pub symbol: String,
    pub exchange: Exchange,
    pub tradingsymbol: String,
    pub token: i64,
    pub lot: u32,
}

/// Tri-state buy condition
///
/// The server sends `true`/`false`/`null`; `null` means the condition has
/// not been evaluated yet, which is NOT the same as `False`: `Unknown`
/// waits, `False` skips for the rest of the minute.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum BuyCondition {
    #[default]
    Unknown,
    True,
    False,
}

impl From<Option<bool>> for BuyCondition {
    fn from(value: Option<bool>) -> Self {
        match value {
            None => BuyCondition::Unknown,
            Some(true) => BuyCondition::True,
            Some(false) => BuyCondition::False,
        }
    }
}

impl From<BuyCondition> for Option<bool> {
    fn from(value: BuyCondition) -> Self {
        match value {
            BuyCondition::Unknown => None,
            BuyCondition::True => Some(true),
            BuyCondition::False => Some(false),
        }
    }
}

/// Signal last emitted by the server-side strategy; absence is `None` on
/// the snapshot field
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSignal {
    Buy,
    Sell,
}

/// Per-symbol market view from `GET /state`
///
/// Authoritative and replaced wholesale on every poll; the engine never
/// mutates these fields locally.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct MarketSnapshot {
    pub ltp: Option<f64>,
    pub buy_threshold: Option<f64>,
    pub last_buy_threshold: Option<f64>,
    #[serde(rename = "buyThresholdCondn")]
    pub buy_condition: BuyCondition,
    pub last_signal: Option<TradeSignal>,
    pub sell_signals_after_buy: u32,
    pub re_enter_buy_condition: bool,
}

/// Position state of the per-symbol FSM
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PositionState {
    Flat,
    PaperLong,
    LiveLong,
}

/// Locally-owned position and PnL record for one symbol
///
/// Created on first sighting of the symbol, never removed. `realized_pnl`
/// and `cumulative_pnl` only move when a position closes on a SELL signal;
/// `session_pnl` is recomputed every engine tick.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PositionRecord {
    pub symbol: String,
    pub position_state: PositionState,
    /// Minute bucket (floor of epoch millis / 60000) last seen by the
    /// entry gate; `None` until the first gated tick
    pub last_minute: Option<i64>,
    pub entry_price: Option<f64>,
    #[serde(rename = "realizedPnL")]
    pub realized_pnl: f64,
    #[serde(rename = "sessionPnL")]
    pub session_pnl: f64,
    #[serde(rename = "cumulativePnL")]
    pub cumulative_pnl: f64,
}

impl PositionRecord {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            position_state: PositionState::Flat,
            last_minute: None,
            entry_price: None,
            realized_pnl: 0.0,
            session_pnl: 0.0,
            cumulative_pnl: 0.0,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.position_state == PositionState::Flat
    }
}

/// Which execution path the server should take for a command
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TradeMode {
    Paper,
    LiveSim,
    Live,
}

/// Rejected value for a trade-mode setting
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown trade mode '{0}' (expected paper, livesim or live)")]
pub struct ParseTradeModeError(String);

impl std::str::FromStr for TradeMode {
    type Err = ParseTradeModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paper" => Ok(TradeMode::Paper),
            "livesim" => Ok(TradeMode::LiveSim),
            "live" => Ok(TradeMode::Live),
            other => Err(ParseTradeModeError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Open,
    Close,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeDirection {
    Buy,
    Sell,
}

/// Outbound trade command for `POST /trade`
///
/// Value object; constructed, dispatched and forgotten, never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeCommand {
    pub symbol: String,
    pub mode: TradeMode,
    pub action: TradeAction,
    pub direction: TradeDirection,
    pub qty: u32,
}
