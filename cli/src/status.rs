//! Pool and account status

use anyhow::Result;
use colored::Colorize;

use swap_core::AppState;

use crate::{client, config::NetworkConfig};

pub async fn show_status(config: &NetworkConfig) -> Result<()> {
    println!("{}", "=== ArcSwap Status ===".bright_green().bold());
    println!("{} {}", "Network:".bright_cyan(), config.network);
    println!("{} {}", "RPC URL:".bright_cyan(), config.rpc_url);
    println!(
        "{} {}",
        "Pool:".bright_cyan(),
        client::format_address(&config.contracts.amm)
    );
    println!(
        "{} {}",
        "EURC Token:".bright_cyan(),
        client::format_address(&config.contracts.eurc)
    );

    let (orchestrator, store) = client::create_orchestrator(config)?;
    let session = orchestrator.connect(&store).await?;
    println!("\n{} {}", "Account:".bright_cyan(), session.display());

    print_market(&store.snapshot());

    Ok(())
}

/// Render reserves, rate, and balance from a state snapshot
pub fn print_market(state: &AppState) {
    if let Some(reserves) = &state.reserves {
        println!("\n{}", "Pool Reserves".bright_yellow().bold());
        println!("{} {}", "USDC Reserve:".bright_cyan(), reserves.usdc_display());
        println!("{} {}", "EURC Reserve:".bright_cyan(), reserves.eurc_display());
        match reserves.rate_display() {
            Some(rate) => {
                println!("{} 1 EURC = {} USDC", "Rate:".bright_cyan(), rate);
            }
            None => {
                println!("{}", "Rate unavailable: the pool holds no EURC".yellow());
            }
        }
    }
    if let Some(balance) = &state.balance {
        println!("{} {}", "EURC Balance:".bright_cyan(), balance.eurc_display());
    }
    if let Some(workflow) = &state.workflow {
        println!(
            "{} {} ({})",
            "In Flight:".bright_cyan(),
            workflow.kind,
            workflow.stage
        );
    }
}
