//! Contract addresses and call encoding.
//!
//! Calldata is built by hand from the function signature: four selector
//! bytes (`keccak256(sig)[..4]`) followed by the ABI-encoded arguments.
//! The signatures live in [`AbiSpec`] so a config file can override them
//! when a deployment diverges from the defaults.

use ethers::abi::{self, ParamType, Token};
use ethers::types::{Address, Bytes, U256};
use ethers::utils::id;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Deployed contract addresses for one network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contracts {
    /// The fixed-function AMM holding both reserves.
    pub amm: Address,
    /// The ERC-20 EURC token.
    pub eurc: Address,
}

/// Function signatures of the AMM and token contracts.
///
/// Every field can be overridden independently from the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AbiSpec {
    pub swap_usdc_for_eurc: String,
    pub swap_eurc_for_usdc: String,
    pub add_liquidity: String,
    pub approve: String,
    pub balance_of: String,
    pub reserve_usdc: String,
    pub reserve_eurc: String,
}

impl Default for AbiSpec {
    fn default() -> Self {
        Self {
            swap_usdc_for_eurc: "swapUSDCForEURC()".to_string(),
            swap_eurc_for_usdc: "swapEURCForUSDC(uint256)".to_string(),
            add_liquidity: "addLiquidity(uint256)".to_string(),
            approve: "approve(address,uint256)".to_string(),
            balance_of: "balanceOf(address)".to_string(),
            reserve_usdc: "reserveUSDC()".to_string(),
            reserve_eurc: "reserveEURC()".to_string(),
        }
    }
}

fn build_call(signature: &str, args: &[Token]) -> Bytes {
    let mut data = id(signature).to_vec();
    data.extend_from_slice(&abi::encode(args));
    data.into()
}

impl AbiSpec {
    /// `swapUSDCForEURC()`. Payable, the USDC amount rides as call value.
    pub fn swap_usdc_for_eurc_call(&self) -> Bytes {
        build_call(&self.swap_usdc_for_eurc, &[])
    }

    /// `swapEURCForUSDC(uint256 eurcAmount)`.
    pub fn swap_eurc_for_usdc_call(&self, amount: U256) -> Bytes {
        build_call(&self.swap_eurc_for_usdc, &[Token::Uint(amount)])
    }

    /// `addLiquidity(uint256 eurcAmount)`. Payable, the USDC side rides
    /// as call value.
    pub fn add_liquidity_call(&self, eurc_amount: U256) -> Bytes {
        build_call(&self.add_liquidity, &[Token::Uint(eurc_amount)])
    }

    /// ERC-20 `approve(address spender, uint256 amount)`.
    pub fn approve_call(&self, spender: Address, amount: U256) -> Bytes {
        build_call(&self.approve, &[Token::Address(spender), Token::Uint(amount)])
    }

    /// ERC-20 `balanceOf(address owner)`.
    pub fn balance_of_call(&self, owner: Address) -> Bytes {
        build_call(&self.balance_of, &[Token::Address(owner)])
    }

    pub fn reserve_usdc_call(&self) -> Bytes {
        build_call(&self.reserve_usdc, &[])
    }

    pub fn reserve_eurc_call(&self) -> Bytes {
        build_call(&self.reserve_eurc, &[])
    }
}

/// Decode a single `uint256` return value from an `eth_call` result.
pub fn decode_uint(data: &[u8]) -> Result<U256> {
    let tokens = abi::decode(&[ParamType::Uint(256)], data)
        .map_err(|e| Error::Transport(format!("malformed call result: {e}")))?;
    match tokens.into_iter().next() {
        Some(Token::Uint(value)) => Ok(value),
        _ => Err(Error::Transport("malformed call result".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_erc20_selectors_match_known_values() {
        let spec = AbiSpec::default();
        assert_eq!(&spec.approve_call(Address::zero(), U256::zero())[..4], [0x09, 0x5e, 0xa7, 0xb3]);
        assert_eq!(&spec.balance_of_call(Address::zero())[..4], [0x70, 0xa0, 0x82, 0x31]);
    }

    #[test]
    fn test_approve_call_layout() {
        let spec = AbiSpec::default();
        let spender = Address::from_low_u64_be(0xBEEF);
        let amount = U256::from(45u64) * U256::exp10(18);
        let call = spec.approve_call(spender, amount);

        // selector + two 32-byte words
        assert_eq!(call.len(), 68);
        // address is left-padded with 12 zero bytes
        assert!(call[4..16].iter().all(|b| *b == 0));
        assert_eq!(&call[16..36], spender.as_bytes());
        // amount is big-endian in the last word
        let mut expected = [0u8; 32];
        amount.to_big_endian(&mut expected);
        assert_eq!(&call[36..68], expected);
    }

    #[test]
    fn test_swap_eurc_call_carries_amount() {
        let spec = AbiSpec::default();
        let amount = U256::from(7u64);
        let call = spec.swap_eurc_for_usdc_call(amount);
        assert_eq!(call.len(), 36);
        let mut word = [0u8; 32];
        amount.to_big_endian(&mut word);
        assert_eq!(&call[4..36], word);
    }

    #[test]
    fn test_view_calls_are_selector_only() {
        let spec = AbiSpec::default();
        assert_eq!(spec.reserve_usdc_call().len(), 4);
        assert_eq!(spec.reserve_eurc_call().len(), 4);
        assert_eq!(spec.swap_usdc_for_eurc_call().len(), 4);
    }

    #[test]
    fn test_decode_uint_round_trips() {
        let value = U256::from(123_456u64);
        let encoded = abi::encode(&[Token::Uint(value)]);
        assert_eq!(decode_uint(&encoded).unwrap(), value);
    }

    #[test]
    fn test_decode_uint_rejects_short_data() {
        let err = decode_uint(&[0u8; 3]).unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }
}
