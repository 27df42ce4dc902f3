//! Liquidity provisioning

use anyhow::Result;
use colored::Colorize;

use crate::{client, config::NetworkConfig, status};

pub async fn add(config: &NetworkConfig, usdc: String, eurc: String) -> Result<()> {
    println!("{}", "=== Add Liquidity ===".bright_green().bold());
    println!("{} {}", "Network:".bright_cyan(), config.network);
    println!(
        "{} {}",
        "Pool:".bright_cyan(),
        client::format_address(&config.contracts.amm)
    );
    println!(
        "{} {} USDC + {} EURC",
        "Deposit:".bright_cyan(),
        usdc,
        eurc
    );

    let (orchestrator, store) = client::create_orchestrator(config)?;
    let session = orchestrator.connect(&store).await?;
    println!("{} {}", "Account:".bright_cyan(), session.display());

    // EURC moves by allowance, USDC rides as value on the deposit itself
    println!("\n{}", "Submitting approval...".bright_green());
    println!("{}", "The deposit follows once the approval is mined".dimmed());
    let tx_hash = orchestrator.add_liquidity(&store, &usdc, &eurc).await?;

    println!("\n{} {}", "Success!".bright_green().bold(), "✓".bright_green());
    println!(
        "{} {}",
        "Deposit Transaction:".bright_cyan(),
        client::format_tx_hash(&tx_hash, &config.network)
    );
    status::print_market(&store.snapshot());

    Ok(())
}
