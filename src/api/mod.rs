pub mod state_server;

pub use state_server::{
    ClientError, SignalInjection, StateResponse, StateServerClient, DEFAULT_BASE_URL,
};
