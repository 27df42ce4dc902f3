//! Interactive console, a line-oriented rendition of the two-panel UI
//!
//! The trade panel owns one amount and the buy/sell actions, the earn
//! panel owns the two deposit amounts and the add action. Edits go
//! through the store so the prompt always reflects the live state, and
//! workflow progress is rendered from the event stream.

use std::io::{self, Write};

use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use colored::Colorize;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc::UnboundedReceiver;

use swap_core::{Orchestrator, SagaStage, StateEvent, Store, Tab};

use crate::{client, config::NetworkConfig, status};

pub async fn run(config: &NetworkConfig) -> Result<()> {
    println!("{}", "=== ArcSwap Console ===".bright_green().bold());
    println!("{}", "Type 'help' for commands, 'quit' to exit\n".dimmed());

    let (orchestrator, store) = client::create_orchestrator(config)?;
    let mut events = store.subscribe();

    let session = orchestrator.connect(&store).await?;
    println!("{} {}", "Connected:".bright_cyan(), session.display());
    drain_events(&mut events);
    status::print_market(&store.snapshot());
    println!();

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();

    loop {
        prompt(&store);
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        let mut parts = input.split_whitespace();

        match parts.next() {
            None => continue,
            Some("help") => print_help(),
            Some("tab") => match parts.next() {
                Some("trade") => store.dispatch(StateEvent::TabSwitched(Tab::Trade)),
                Some("earn") => store.dispatch(StateEvent::TabSwitched(Tab::Earn)),
                _ => println!("{}", "Usage: tab <trade|earn>".yellow()),
            },
            Some("amount") => match parts.next() {
                Some(value) => {
                    store.dispatch(StateEvent::TradeAmountEdited(value.to_string()))
                }
                None => println!("{}", "Usage: amount <value>".yellow()),
            },
            Some("usdc") => match parts.next() {
                Some(value) => store.dispatch(StateEvent::EarnUsdcEdited(value.to_string())),
                None => println!("{}", "Usage: usdc <value>".yellow()),
            },
            Some("eurc") => match parts.next() {
                Some(value) => store.dispatch(StateEvent::EarnEurcEdited(value.to_string())),
                None => println!("{}", "Usage: eurc <value>".yellow()),
            },
            Some("buy") => {
                if store.with(|s| s.tab) != Tab::Trade {
                    println!("{}", "Switch to the trade panel first: tab trade".yellow());
                } else {
                    let amount = store.with(|s| s.trade.amount.clone());
                    run_workflow(config, orchestrator.buy(&store, &amount).await);
                }
            }
            Some("sell") => {
                if store.with(|s| s.tab) != Tab::Trade {
                    println!("{}", "Switch to the trade panel first: tab trade".yellow());
                } else {
                    let amount = store.with(|s| s.trade.amount.clone());
                    run_workflow(config, orchestrator.sell(&store, &amount).await);
                }
            }
            Some("add") => {
                if store.with(|s| s.tab) != Tab::Earn {
                    println!("{}", "Switch to the earn panel first: tab earn".yellow());
                } else {
                    let (usdc, eurc) =
                        store.with(|s| (s.earn.usdc.clone(), s.earn.eurc.clone()));
                    run_workflow(config, orchestrator.add_liquidity(&store, &usdc, &eurc).await);
                }
            }
            Some("refresh") => {
                if let Err(e) = orchestrator.refresh(&store).await {
                    println!("{} {}", "✗".bright_red(), e);
                }
            }
            Some("status") => status::print_market(&store.snapshot()),
            Some("journal") => print_journal(&orchestrator),
            Some("quit") | Some("exit") => break,
            Some(other) => println!("{} {}", "Unknown command:".yellow(), other),
        }

        drain_events(&mut events);
    }

    Ok(())
}

fn prompt(store: &Store) {
    let tab = store.with(|s| s.tab);
    print!("{}", format!("{tab}> ").bright_green());
    let _ = io::stdout().flush();
}

fn run_workflow(config: &NetworkConfig, result: swap_core::Result<ethers::types::TxHash>) {
    match result {
        Ok(tx_hash) => println!(
            "{} {}",
            "Transaction:".bright_cyan(),
            client::format_tx_hash(&tx_hash, &config.network)
        ),
        Err(e) => println!("{} {}", "✗".bright_red(), e),
    }
}

fn drain_events(events: &mut UnboundedReceiver<StateEvent>) {
    while let Ok(event) = events.try_recv() {
        render_event(&event);
    }
}

fn render_event(event: &StateEvent) {
    match event {
        StateEvent::WorkflowStarted(kind) => {
            println!("{} {} started", "•".dimmed(), kind);
        }
        StateEvent::WorkflowStage {
            kind,
            stage,
            tx_hash: Some(tx_hash),
        } => {
            println!("{} {} {}: {tx_hash:#x}", "•".dimmed(), kind, stage);
        }
        StateEvent::WorkflowStage { kind, stage, .. } => {
            println!("{} {} {}", "•".dimmed(), kind, stage);
        }
        StateEvent::WorkflowCompleted(kind) => {
            println!("{} {} complete", "✓".bright_green(), kind);
        }
        StateEvent::WorkflowFailed { kind, message } => {
            println!("{} {} failed: {}", "✗".bright_red(), kind, message);
        }
        StateEvent::Refreshed { reserves, .. } => {
            if let Some(rate) = reserves.rate_display() {
                println!("{} rate 1 EURC = {rate} USDC", "•".dimmed());
            }
        }
        _ => {}
    }
}

fn print_journal(orchestrator: &Orchestrator) {
    let records = orchestrator.journal_snapshot();
    if records.is_empty() {
        println!("{}", "No workflows run yet".dimmed());
        return;
    }

    println!("{}", "Workflow Journal".bright_yellow().bold());
    for record in records {
        let stage = match record.stage {
            SagaStage::Done => "done".bright_green().to_string(),
            SagaStage::Failed => "failed".bright_red().to_string(),
            other => other.to_string(),
        };
        println!(
            "  {} {} {}",
            local_clock(record.started_at).dimmed(),
            record.kind,
            stage
        );
        if let Some(tx) = record.approval_tx {
            println!("    {} {tx:#x}", "approval:".bright_cyan());
        }
        if let Some(tx) = record.swap_tx {
            println!("    {} {tx:#x}", "swap:".bright_cyan());
        }
        if let Some(error) = &record.error {
            println!("    {} {error}", "error:".bright_red());
        }
    }
}

/// Journal entries are stored in UTC; show them on the user's clock
fn local_clock(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%H:%M:%S").to_string()
}

fn print_help() {
    println!("{}", "Commands".bright_yellow().bold());
    println!("  {}  switch panel", "tab <trade|earn>".bright_cyan());
    println!("  {}   set the trade amount", "amount <value>".bright_cyan());
    println!("  {}     set the earn USDC deposit", "usdc <value>".bright_cyan());
    println!("  {}     set the earn EURC deposit", "eurc <value>".bright_cyan());
    println!("  {}              swap the trade amount of USDC for EURC", "buy".bright_cyan());
    println!("  {}             swap the trade amount of EURC for USDC", "sell".bright_cyan());
    println!("  {}              deposit the earn amounts into the pool", "add".bright_cyan());
    println!("  {}          re-read reserves and balance", "refresh".bright_cyan());
    println!("  {}           show the current snapshot", "status".bright_cyan());
    println!("  {}          show this session's workflow log", "journal".bright_cyan());
    println!("  {}             exit", "quit".bright_cyan());
}
