//! Operator CLI for poking the verification engine against a live chain.

use clap::{Parser, Subcommand};
use gate_verifier::challenge::codec;
use gate_verifier::{
    GateConfig, GateVerifier, GatingRequirements, GatingSettings, NonceStore, Rpc, RpcClient,
    VerificationChallenge,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Inspect and exercise gated-comment verification from the command line.
#[derive(Parser, Debug)]
#[command(name = "gate-check")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, short, env = "GATE_CONFIG")]
    config: Option<PathBuf>,

    /// RPC endpoint URLs, in fallback order (overrides the config file).
    #[arg(long, env = "GATE_RPC_ENDPOINTS", value_delimiter = ',')]
    rpc_endpoint: Vec<String>,

    /// Log level.
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Probe the configured endpoints via eth_blockNumber.
    Probe,

    /// Fetch an identity's native balance in wei.
    Balance {
        /// Account address to query.
        address: String,
    },

    /// Run the full verification pass against a challenge JSON file.
    Verify {
        /// Path to a JSON file holding a signed challenge.
        challenge: PathBuf,

        /// Minimum balance requirement in wei, decimal.
        #[arg(long)]
        min_balance: Option<String>,
    },

    /// Issue a fresh challenge and print it as JSON.
    Issue {
        /// Identity address the challenge is for.
        address: String,

        /// Post id the challenge is scoped to.
        #[arg(long, default_value = "1")]
        post_id: i64,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let mut config = match &cli.config {
        Some(path) => GateConfig::from_file(path)?,
        None => GateConfig::default(),
    };
    if !cli.rpc_endpoint.is_empty() {
        config.rpc.endpoints = cli.rpc_endpoint.clone();
    }
    config.validate()?;

    let rpc = Arc::new(RpcClient::new(&config.rpc)?);

    match cli.command {
        Command::Probe => {
            let block = rpc.probe().await?;
            info!(endpoints = ?rpc.endpoints(), "probe succeeded");
            println!("head block: {block}");
        }
        Command::Balance { address } => {
            let result = rpc
                .call("eth_getBalance", vec![address.clone().into(), "latest".into()])
                .await?;
            println!("{address}: {result} wei");
        }
        Command::Verify {
            challenge,
            min_balance,
        } => {
            let raw = std::fs::read_to_string(&challenge)?;
            let challenge: VerificationChallenge = serde_json::from_str(&raw)?;
            let settings = GatingSettings {
                enabled: true,
                requirements: GatingRequirements {
                    min_balance,
                    required_tokens: None,
                },
            };

            let verifier = GateVerifier::new(rpc, NonceStore::new());
            let identity = challenge.identity_address.clone();
            let post_id = challenge.post_id;
            match verifier
                .verify_comment(&identity, post_id, Some(&challenge), &settings)
                .await
            {
                Ok(()) => println!("verdict: pass"),
                Err(e) => {
                    println!("verdict: fail ({:?}): {e}", e.class());
                    std::process::exit(1);
                }
            }
        }
        Command::Issue { address, post_id } => {
            let nonces = NonceStore::new();
            let challenge =
                codec::issue(&address, post_id, config.challenge.ttl_secs, &nonces)?;
            println!("{}", serde_json::to_string_pretty(&challenge)?);
            println!("\nsigning message:\n{}", codec::signing_message(&challenge));
        }
    }

    Ok(())
}
