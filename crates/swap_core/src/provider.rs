//! Provider seam between the workflows and the chain.

use async_trait::async_trait;
use ethers::types::{Address, Bytes, TxHash, U256};

use crate::error::Result;

/// A transaction to be signed and submitted by the active wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRequest {
    pub to: Address,
    /// Native value in base units, zero for plain contract calls.
    pub value: U256,
    pub data: Bytes,
}

/// Outcome of a submitted transaction once it is mined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    /// False when the transaction reverted on chain.
    pub success: bool,
}

/// Narrow wallet-and-node surface the workflows run against.
///
/// The production implementation signs with a local key over JSON-RPC;
/// tests substitute a scripted double.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Accounts the wallet exposes, primary first.
    async fn accounts(&self) -> Result<Vec<Address>>;

    /// Read-only `eth_call` against `to`.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes>;

    /// Sign and broadcast. Resolves at submission, not inclusion.
    async fn send_transaction(&self, tx: TxRequest) -> Result<TxHash>;

    /// Block until the transaction is mined and return its receipt.
    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TxReceipt>;
}
