//! ArcSwap CLI - client for a fixed-function USDC/EURC exchange pool
//!
//! Connects a local signing key to the pool contracts over JSON-RPC and
//! drives the trade and liquidity workflows end to end (localnet,
//! sepolia, mainnet).

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

mod client;
mod config;
mod console;
mod liquidity;
mod status;
mod trade;

use config::NetworkConfig;

#[derive(Parser)]
#[command(name = "arcswap")]
#[command(about = "ArcSwap CLI - Trade and provide liquidity on the USDC/EURC pool", long_about = None)]
#[command(version)]
struct Cli {
    /// Network to connect to (localnet, sepolia, mainnet)
    #[arg(short, long, default_value = "localnet")]
    network: String,

    /// RPC URL (overrides network default)
    #[arg(short, long)]
    url: Option<String>,

    /// Path to hex-encoded signing key file
    #[arg(short, long)]
    key: Option<PathBuf>,

    /// Path to config file (default: ~/.config/arcswap/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show pool reserves, exchange rate, and account balance
    Status,

    /// Trading operations
    Trade {
        #[command(subcommand)]
        command: TradeCommands,
    },

    /// Liquidity operations
    Liquidity {
        #[command(subcommand)]
        command: LiquidityCommands,
    },

    /// Interactive console with trade and earn panels
    Console,

    /// Run end-to-end test suite
    Test {
        /// Run quick smoke tests only (read paths)
        #[arg(long)]
        quick: bool,

        /// Run workflow tests (submits real transactions)
        #[arg(long)]
        workflows: bool,

        /// Run all tests
        #[arg(long)]
        all: bool,
    },
}

#[derive(Subcommand)]
enum TradeCommands {
    /// Swap native USDC for EURC
    Buy {
        /// USDC amount to spend (decimal)
        amount: String,
    },

    /// Swap EURC for native USDC (approves the pool first)
    Sell {
        /// EURC amount to sell (decimal)
        amount: String,
    },
}

#[derive(Subcommand)]
enum LiquidityCommands {
    /// Deposit both tokens into the pool
    Add {
        /// USDC amount to deposit (decimal)
        #[arg(long)]
        usdc: String,

        /// EURC amount to deposit (decimal)
        #[arg(long)]
        eurc: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    // Initialize network configuration
    let config = NetworkConfig::new(
        &cli.network,
        cli.url.clone(),
        cli.key.clone(),
        cli.config.clone(),
    )?;

    if cli.verbose {
        println!("{} {}", "Network:".bright_cyan(), config.network);
        println!("{} {}", "RPC URL:".bright_cyan(), config.rpc_url);
        println!("{} {}", "Key:".bright_cyan(), config.key_path.display());
        println!(
            "{} {}",
            "Account:".bright_cyan(),
            ethers::utils::to_checksum(&config.address(), None)
        );
    }

    // Execute command
    match cli.command {
        Commands::Status => {
            status::show_status(&config).await?;
        }
        Commands::Trade { command } => {
            match command {
                TradeCommands::Buy { amount } => {
                    trade::buy(&config, amount).await?;
                }
                TradeCommands::Sell { amount } => {
                    trade::sell(&config, amount).await?;
                }
            }
        }
        Commands::Liquidity { command } => {
            match command {
                LiquidityCommands::Add { usdc, eurc } => {
                    liquidity::add(&config, usdc, eurc).await?;
                }
            }
        }
        Commands::Console => {
            console::run(&config).await?;
        }
        Commands::Test { quick, workflows, all } => {
            println!("{}", "Running test suite...".bright_green().bold());

            if all || quick {
                tests::run_smoke_tests(&config).await?;
            }
            if all || workflows {
                tests::run_workflow_tests(&config).await?;
            }
        }
    }

    Ok(())
}
