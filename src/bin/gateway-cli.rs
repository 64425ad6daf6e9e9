use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use ledger_gateway::client::{ClientError, ClockSkewTracker, GatewayClient, LedgerRequest, Order};
use ledger_gateway::config::load_or_default;
use ledger_gateway::lifecycle::signals::spawn_signal_listener;
use ledger_gateway::lifecycle::Shutdown;
use ledger_gateway::observability::logging;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Command-line client for the ledger gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8000")]
    url: String,

    /// Configuration file for stream and clock-skew settings.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List ledgers, or follow them as they close with --stream
    Ledgers {
        #[arg(long)]
        cursor: Option<String>,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        limit: Option<u32>,
        #[arg(long)]
        order: Option<Order>,
        #[arg(long)]
        stream: bool,
    },
    /// Show a single ledger
    Ledger {
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        sequence: u32,
    },
    /// Submit a base64 transaction envelope
    Submit { envelope: String },
    /// Print the gateway's estimated current time
    ServerTime,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_or_default(cli.config.as_deref())?;
    logging::init_logging(&config.observability);

    let client = GatewayClient::new(&cli.url)?
        .with_clock(Arc::new(ClockSkewTracker::new(config.clock_skew.staleness_secs)))
        .with_stream_config(config.stream.clone());

    match cli.command {
        Commands::Ledgers {
            cursor,
            limit,
            order,
            stream,
        } => {
            let request = LedgerRequest {
                for_sequence: None,
                cursor,
                limit,
                order,
            };

            if stream {
                let shutdown = Shutdown::new();
                spawn_signal_listener(shutdown.clone());
                client
                    .stream_ledgers(&shutdown.subscribe(), &request, |ledger| {
                        println!("{}", serde_json::to_string(&ledger)?);
                        Ok(())
                    })
                    .await?;
            } else {
                print_json(&client.ledgers(&request).await)?;
            }
        }
        Commands::Ledger { sequence } => {
            print_json(&client.ledger(sequence).await)?;
        }
        Commands::Submit { envelope } => {
            print_json(&client.submit_transaction(&envelope).await)?;
        }
        Commands::ServerTime => {
            let server_time = client.server_time().await?;
            if server_time == 0 {
                eprintln!("Error: gateway did not report a usable Date header");
            } else {
                println!("{server_time}");
            }
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(result: &Result<T, ClientError>) -> Result<(), Box<dyn std::error::Error>> {
    match result {
        Ok(value) => println!("{}", serde_json::to_string_pretty(value)?),
        Err(e) => match e.problem() {
            Some(problem) => {
                eprintln!("Error: gateway returned status {}", problem.status);
                eprintln!("{}", serde_json::to_string_pretty(problem)?);
            }
            None => eprintln!("Error: {}", e),
        },
    }
    Ok(())
}
