use crate::api::StateResponse;
use crate::models::{Instrument, MarketSnapshot, PositionRecord};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Market-side tables: replaced wholesale on every ingestion pull
#[derive(Debug, Default, Clone)]
pub struct MarketTables {
    pub symbols: Vec<String>,
    pub market: HashMap<String, MarketSnapshot>,
    pub instruments: HashMap<String, Instrument>,
}

pub type PositionTable = HashMap<String, PositionRecord>;

/// Read-only merged view for presentation consumers
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    pub symbols: Vec<String>,
    pub market_view: HashMap<String, MarketSnapshot>,
    pub position_view: HashMap<String, PositionRecord>,
}

/// Owner of the merged market/position state for the process lifetime
///
/// Both tables follow a copy-and-atomic-replace discipline: writers build
/// the complete next version and publish it with a single pointer swap, so
/// a reader holding an `Arc` never observes a half-updated table. The
/// ingestion loop and the position engine interleave freely on top of this;
/// the only effect is bounded staleness of market fields, never a torn read.
pub struct StateStore {
    market: RwLock<Arc<MarketTables>>,
    positions: RwLock<Arc<PositionTable>>,
}

impl StateStore {
    pub fn new() -> Self {
        Self {
            market: RwLock::new(Arc::new(MarketTables::default())),
            positions: RwLock::new(Arc::new(PositionTable::new())),
        }
    }

    /// Current market tables (shared, immutable version)
    pub fn market_tables(&self) -> Arc<MarketTables> {
        self.market.read().unwrap().clone()
    }

    /// Current position table (shared, immutable version)
    pub fn positions(&self) -> Arc<PositionTable> {
        self.positions.read().unwrap().clone()
    }

    /// Merge one ingestion pull into the store
    ///
    /// Market view is replaced outright; stale fields never survive a
    /// refresh. Position records are seeded for symbols seen for the first
    /// time and left untouched for known ones; symbols missing from the
    /// new snapshot keep their last record indefinitely.
    pub fn apply_snapshot(&self, response: StateResponse) {
        let instruments: HashMap<String, Instrument> = response
            .instruments
            .into_iter()
            .map(|instr| (instr.symbol.clone(), instr))
            .collect();

        let tables = MarketTables {
            symbols: response.symbols,
            market: response.state,
            instruments,
        };

        let seeded = {
            let mut guard = self.positions.write().unwrap();
            let missing: Vec<&String> = tables
                .symbols
                .iter()
                .filter(|sym| !guard.contains_key(*sym))
                .collect();

            if missing.is_empty() {
                0
            } else {
                let mut next = (**guard).clone();
                for sym in &missing {
                    next.insert((*sym).clone(), PositionRecord::new(sym.as_str()));
                }
                let count = missing.len();
                *guard = Arc::new(next);
                count
            }
        };

        if seeded > 0 {
            tracing::info!(seeded, "Seeded position records for new symbols");
        }

        *self.market.write().unwrap() = Arc::new(tables);
    }

    /// Publish the next version of the position table
    ///
    /// The closure mutates a private copy of the current table; the result
    /// is swapped in as one unit. Writers serialize on the lock, so an
    /// ingestion seed and an engine tick can never lose each other's
    /// updates.
    pub fn update_positions<F>(&self, mutate: F)
    where
        F: FnOnce(&mut PositionTable),
    {
        let mut guard = self.positions.write().unwrap();
        let mut next = (**guard).clone();
        mutate(&mut next);
        *guard = Arc::new(next);
    }

    /// Merged `{symbols, marketView, positionView}` snapshot; read-only,
    /// presentation consumers never write back
    pub fn projection(&self) -> Projection {
        let tables = self.market_tables();
        let positions = self.positions();

        Projection {
            symbols: tables.symbols.clone(),
            market_view: tables.market.clone(),
            position_view: (*positions).clone(),
        }
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}
