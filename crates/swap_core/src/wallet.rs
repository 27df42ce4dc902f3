//! Wallet session establishment.

use ethers::types::Address;
use ethers::utils::to_checksum;

use crate::error::{Error, Result};
use crate::provider::WalletProvider;

/// An established wallet connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub address: Address,
}

impl Session {
    /// EIP-55 checksummed form of the connected address.
    pub fn display(&self) -> String {
        to_checksum(&self.address, None)
    }

    /// Shortened `0x1234..abcd` form for prompts and log lines.
    pub fn short(&self) -> String {
        let full = self.display();
        format!("{}..{}", &full[..6], &full[full.len() - 4..])
    }
}

/// Request accounts from the provider and open a session on the primary
/// one. A provider with no accounts is treated as unavailable.
pub async fn connect(provider: &dyn WalletProvider) -> Result<Session> {
    let accounts = provider.accounts().await?;
    match accounts.first() {
        Some(address) => Ok(Session { address: *address }),
        None => Err(Error::ProviderUnavailable(
            "wallet returned no accounts".to_string(),
        )),
    }
}
