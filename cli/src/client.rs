//! JSON-RPC signing provider and display helpers

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use colored::Colorize;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, TransactionRequest, TxHash};
use indicatif::{ProgressBar, ProgressStyle};

use swap_core::{Error, Orchestrator, Store, TxReceipt, TxRequest, WalletProvider};

use crate::config::NetworkConfig;

/// Wallet provider backed by a local signing key over HTTP JSON-RPC.
pub struct RpcProvider {
    inner: SignerMiddleware<Provider<Http>, LocalWallet>,
    poll_interval: Duration,
}

impl RpcProvider {
    pub fn connect(config: &NetworkConfig) -> Result<Arc<Self>> {
        let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
            .with_context(|| format!("Invalid RPC URL: {}", config.rpc_url))?
            .interval(Duration::from_millis(config.poll_interval_ms));
        let wallet = config.key.clone().with_chain_id(config.chain_id);
        Ok(Arc::new(Self {
            inner: SignerMiddleware::new(provider, wallet),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        }))
    }
}

#[async_trait]
impl WalletProvider for RpcProvider {
    async fn accounts(&self) -> swap_core::Result<Vec<Address>> {
        Ok(vec![self.inner.signer().address()])
    }

    async fn call(&self, to: Address, data: Bytes) -> swap_core::Result<Bytes> {
        let tx: TypedTransaction = TransactionRequest::new().to(to).data(data).into();
        self.inner
            .call(&tx, None)
            .await
            .map_err(|e| classify(&e.to_string()))
    }

    async fn send_transaction(&self, tx: TxRequest) -> swap_core::Result<TxHash> {
        let request = TransactionRequest::new()
            .to(tx.to)
            .value(tx.value)
            .data(tx.data);
        let pending = self
            .inner
            .send_transaction(request, None)
            .await
            .map_err(|e| classify(&e.to_string()))?;
        Ok(*pending)
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> swap_core::Result<TxReceipt> {
        let bar = spinner("Waiting for confirmation...");
        loop {
            match self.inner.get_transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => {
                    bar.finish_and_clear();
                    return Ok(TxReceipt {
                        tx_hash,
                        block_number: receipt.block_number.map(|n| n.as_u64()),
                        // only an explicit status 0 counts as a revert
                        success: receipt.status.map(|s| s.as_u64() != 0).unwrap_or(true),
                    });
                }
                Ok(None) => tokio::time::sleep(self.poll_interval).await,
                Err(e) => {
                    bar.finish_and_clear();
                    return Err(Error::Transport(e.to_string()));
                }
            }
        }
    }
}

/// Build the orchestrator and a fresh store, wired to the signing provider
pub fn create_orchestrator(config: &NetworkConfig) -> Result<(Orchestrator, Store)> {
    let provider = RpcProvider::connect(config)?;
    let orchestrator = Orchestrator::new(provider, config.contracts, config.abi.clone());
    Ok((orchestrator, Store::new()))
}

/// Sort a middleware error into the client error taxonomy
fn classify(message: &str) -> Error {
    let lower = message.to_lowercase();
    if lower.contains("user rejected")
        || lower.contains("rejected by user")
        || lower.contains("code: 4001")
    {
        Error::UserRejected(message.to_string())
    } else if lower.contains("revert") {
        Error::CallReverted(message.to_string())
    } else {
        Error::Transport(message.to_string())
    }
}

fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .expect("Invalid spinner template"),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

/// Pretty print a transaction hash as a shortened explorer link
pub fn format_tx_hash(tx_hash: &TxHash, network: &str) -> String {
    let hash = format!("{tx_hash:#x}");
    let short = format!("{}...{}", &hash[0..10], &hash[hash.len() - 8..]);

    let explorer_url = match network {
        "mainnet" => format!("https://etherscan.io/tx/{hash}"),
        "sepolia" => format!("https://sepolia.etherscan.io/tx/{hash}"),
        _ => hash.clone(),
    };

    format!("{} ({})", short.bright_blue(), explorer_url.dimmed())
}

/// Pretty print an address, shortened and checksummed
pub fn format_address(address: &Address) -> String {
    let addr = ethers::utils::to_checksum(address, None);
    format!("{}...{}", &addr[0..8], &addr[addr.len() - 6..])
        .bright_yellow()
        .to_string()
}
