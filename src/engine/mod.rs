// Position FSM, tick runner and trade dispatch
pub mod dispatcher;
pub mod fsm;
pub mod tick;

pub use dispatcher::TradeDispatcher;
pub use fsm::{evaluate, minute_bucket, CommandIntent, SymbolOutcome};
pub use tick::{PositionEngine, TickReport};
