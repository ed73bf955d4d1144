use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use wallet_check::address::Address;
use wallet_check::chain::ChainFetcher;
use wallet_check::config::{Config, HistoryMode};
use wallet_check::output::{self, Labels};
use wallet_check::scoring::{calculate_score, ScoringConfig};
use wallet_check::server::{self, AppState};

const EXIT_SUCCESS: i32 = 0;
const EXIT_INPUT: i32 = 1;
const EXIT_NETWORK: i32 = 2;
const EXIT_CONFIG: i32 = 4;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API (default if no subcommand)
    Serve {
        /// Listen address, overrides server.bind
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Score a single address and print the result
    Check {
        /// Wallet address, with or without the 0x prefix
        address: String,

        /// Print the same JSON body the API returns
        #[arg(long)]
        json: bool,
    },
}

#[derive(Parser, Debug)]
#[command(name = "wallet-check")]
#[command(about = "Wallet activity scoring and token allocation service", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/wallet-check/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for rustls 0.23+)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let command = cli.command.unwrap_or(Commands::Serve { bind: None });

    let config_path = cli.config.map(PathBuf::from);
    let mut config = match wallet_check::config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    if let Commands::Serve { bind: Some(ref bind) } = command {
        config.server.bind = bind.clone();
    }

    if let Err(errors) = wallet_check::config::validate_config(&config) {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let lookup_env = |key: &str| std::env::var(key).ok();
    let fetcher = match wallet_check::config::build_fetcher(&config, lookup_env) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    let scoring = config.scoring.clone().unwrap_or_default();
    let labels = labels_for(&config);

    let code = match command {
        Commands::Serve { .. } => serve(&config, fetcher, scoring, labels).await,
        Commands::Check { address, json } => {
            check(&address, json, &fetcher, &scoring, &labels).await
        }
    };
    std::process::exit(code);
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn labels_for(config: &Config) -> Labels {
    Labels {
        native: config.upstream.native_symbol.clone(),
        stablecoin: config
            .upstream
            .stablecoin
            .as_ref()
            .map(|s| s.symbol.clone())
            .unwrap_or_else(|| Labels::default().stablecoin),
    }
}

async fn serve(
    config: &Config,
    fetcher: ChainFetcher,
    scoring: ScoringConfig,
    labels: Labels,
) -> i32 {
    let history = match config.upstream.history {
        HistoryMode::Estimated => "estimated",
        HistoryMode::Explorer => "explorer",
    };
    info!(
        bind = %config.server.bind,
        history,
        rpc_endpoints = config.upstream.rpc_endpoints.len(),
        weights = %scoring.version,
        "starting wallet-check"
    );

    let listener = match tokio::net::TcpListener::bind(&config.server.bind).await {
        Ok(l) => l,
        Err(e) => {
            error!(bind = %config.server.bind, error = %e, "failed to bind");
            return EXIT_CONFIG;
        }
    };

    let app = server::router(AppState::new(Arc::new(fetcher), scoring, labels));
    match axum::serve(listener, app).await {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            error!(error = %e, "server stopped");
            EXIT_NETWORK
        }
    }
}

async fn check(
    raw: &str,
    json: bool,
    fetcher: &ChainFetcher,
    scoring: &ScoringConfig,
    labels: &Labels,
) -> i32 {
    let address = match Address::parse(raw) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("{}", e);
            return EXIT_INPUT;
        }
    };

    let start_time = Instant::now();
    let snapshot = match fetcher.fetch_snapshot(&address).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Unable to fetch blockchain data: {}", e);
            return EXIT_NETWORK;
        }
    };
    tracing::debug!(elapsed = ?start_time.elapsed(), "snapshot fetched");

    let result = calculate_score(&address, &snapshot, scoring);

    if json {
        let body = output::build_response(&address, &result, labels);
        match serde_json::to_string_pretty(&body) {
            Ok(s) => println!("{}", s),
            Err(e) => {
                eprintln!("Failed to encode response: {}", e);
                return EXIT_INPUT;
            }
        }
    } else {
        let report = output::format_report(
            &address,
            &result,
            labels,
            &scoring.version,
            output::should_use_colors(),
        );
        println!("{}", report);
    }

    EXIT_SUCCESS
}
