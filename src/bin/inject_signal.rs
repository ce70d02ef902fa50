//! Drive the state server's synthetic-signal endpoints from the command
//! line. Injected signals and prices land in the server's authoritative
//! store and reach the engine through the normal /state poll, so this
//! exercises the exact ingestion/FSM path live data takes.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use fsmtrader::api::{SignalInjection, StateServerClient, DEFAULT_BASE_URL};
use fsmtrader::models::TradeSignal;

#[derive(Parser)]
#[command(name = "inject_signal", about = "Inject synthetic signals and prices into the state server")]
struct Cli {
    /// Base URL of the state server
    #[arg(long, default_value = DEFAULT_BASE_URL, env = "STATE_SERVER_URL")]
    server: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Send a fake strategy signal for a symbol
    Signal {
        symbol: String,
        #[arg(value_enum)]
        signal: SignalArg,
        /// Optional buy threshold to set alongside the signal
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Send a fake last-traded price for a symbol
    Ltp { symbol: String, price: f64 },
}

#[derive(Clone, Copy, ValueEnum)]
enum SignalArg {
    Buy,
    Sell,
}

impl From<SignalArg> for TradeSignal {
    fn from(arg: SignalArg) -> Self {
        match arg {
            SignalArg::Buy => TradeSignal::Buy,
            SignalArg::Sell => TradeSignal::Sell,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fsmtrader=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let client = StateServerClient::new(cli.server);

    match cli.command {
        Command::Signal {
            symbol,
            signal,
            threshold,
        } => {
            let injection = SignalInjection {
                symbol: symbol.clone(),
                signal: signal.into(),
                buy_threshold: threshold,
            };
            client.send_signal(&injection).await?;
            tracing::info!(symbol = %symbol, signal = ?injection.signal, "Signal injected");
        }
        Command::Ltp { symbol, price } => {
            client.send_ltp(&symbol, price).await?;
            tracing::info!(symbol = %symbol, price, "LTP injected");
        }
    }

    Ok(())
}
