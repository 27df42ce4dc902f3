//! Read-only chain state: pool reserves and the user's token balance.

use ethers::types::U256;

use crate::abi::{decode_uint, AbiSpec, Contracts};
use crate::error::Result;
use crate::provider::WalletProvider;
use crate::units;
use crate::wallet::Session;

/// Both pool reserves read at (approximately) the same block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReserveSnapshot {
    pub usdc: U256,
    pub eurc: U256,
}

impl ReserveSnapshot {
    /// Mid rate in USDC per EURC. Undefined while the EURC side is empty.
    pub fn rate(&self) -> Option<f64> {
        if self.eurc.is_zero() {
            return None;
        }
        Some(units::to_f64(self.usdc) / units::to_f64(self.eurc))
    }

    /// Rate rendered to four decimal places, `None` while undefined.
    pub fn rate_display(&self) -> Option<String> {
        self.rate().map(|r| format!("{r:.4}"))
    }

    pub fn usdc_display(&self) -> String {
        units::display_amount(self.usdc, 2)
    }

    pub fn eurc_display(&self) -> String {
        units::display_amount(self.eurc, 2)
    }
}

/// The connected account's EURC balance. The native USDC balance is left
/// to the wallet itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserBalance {
    pub eurc: U256,
}

impl UserBalance {
    pub fn eurc_display(&self) -> String {
        units::display_amount(self.eurc, 2)
    }
}

/// Fetch reserves and the session's balance in one concurrent batch.
pub async fn refresh(
    provider: &dyn WalletProvider,
    contracts: &Contracts,
    abi: &AbiSpec,
    session: &Session,
) -> Result<(ReserveSnapshot, UserBalance)> {
    let (usdc_raw, eurc_raw, balance_raw) = futures::try_join!(
        provider.call(contracts.amm, abi.reserve_usdc_call()),
        provider.call(contracts.amm, abi.reserve_eurc_call()),
        provider.call(contracts.eurc, abi.balance_of_call(session.address)),
    )?;
    let reserves = ReserveSnapshot {
        usdc: decode_uint(&usdc_raw)?,
        eurc: decode_uint(&eurc_raw)?,
    };
    let balance = UserBalance {
        eurc: decode_uint(&balance_raw)?,
    };
    Ok((reserves, balance))
}
