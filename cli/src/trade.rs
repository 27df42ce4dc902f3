//! Trade workflows: USDC to EURC and back

use anyhow::Result;
use colored::Colorize;

use crate::{client, config::NetworkConfig, status};

pub async fn buy(config: &NetworkConfig, amount: String) -> Result<()> {
    println!("{}", "=== Buy EURC ===".bright_green().bold());
    println!("{} {}", "Network:".bright_cyan(), config.network);
    println!(
        "{} {}",
        "Pool:".bright_cyan(),
        client::format_address(&config.contracts.amm)
    );
    println!("{} {} USDC", "Spend:".bright_cyan(), amount);

    let (orchestrator, store) = client::create_orchestrator(config)?;
    let session = orchestrator.connect(&store).await?;
    println!("{} {}", "Account:".bright_cyan(), session.display());

    println!("\n{}", "Submitting swap...".bright_green());
    let tx_hash = orchestrator.buy(&store, &amount).await?;

    println!("\n{} {}", "Success!".bright_green().bold(), "✓".bright_green());
    println!(
        "{} {}",
        "Transaction:".bright_cyan(),
        client::format_tx_hash(&tx_hash, &config.network)
    );
    status::print_market(&store.snapshot());

    Ok(())
}

pub async fn sell(config: &NetworkConfig, amount: String) -> Result<()> {
    println!("{}", "=== Sell EURC ===".bright_green().bold());
    println!("{} {}", "Network:".bright_cyan(), config.network);
    println!(
        "{} {}",
        "Pool:".bright_cyan(),
        client::format_address(&config.contracts.amm)
    );
    println!("{} {} EURC", "Sell:".bright_cyan(), amount);

    let (orchestrator, store) = client::create_orchestrator(config)?;
    let session = orchestrator.connect(&store).await?;
    println!("{} {}", "Account:".bright_cyan(), session.display());

    // two legs: the swap goes out only after the approval confirms
    println!("\n{}", "Submitting approval...".bright_green());
    println!("{}", "The swap follows once the approval is mined".dimmed());
    let tx_hash = orchestrator.sell(&store, &amount).await?;

    println!("\n{} {}", "Success!".bright_green().bold(), "✓".bright_green());
    println!(
        "{} {}",
        "Swap Transaction:".bright_cyan(),
        client::format_tx_hash(&tx_hash, &config.network)
    );
    status::print_market(&store.snapshot());

    Ok(())
}
