//! Network configuration and signing key management

use anyhow::{Context, Result};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::Address;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use swap_core::{AbiSpec, Contracts};

#[derive(Debug)]
pub struct NetworkConfig {
    pub network: String,
    pub rpc_url: String,
    pub chain_id: u64,
    pub key: LocalWallet,
    pub key_path: PathBuf,
    pub contracts: Contracts,
    pub abi: AbiSpec,
    pub poll_interval_ms: u64,
}

/// Optional TOML overlay. Flags beat the file, the file beats presets.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    key_path: Option<PathBuf>,
    poll_interval_ms: Option<u64>,
    contracts: Option<ContractsFile>,
    abi: Option<AbiSpec>,
    networks: HashMap<String, NetworkFile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NetworkFile {
    rpc_url: Option<String>,
    chain_id: Option<u64>,
    contracts: Option<ContractsFile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ContractsFile {
    amm: Option<Address>,
    eurc: Option<Address>,
}

impl NetworkConfig {
    pub fn new(
        network: &str,
        rpc_url: Option<String>,
        key_path: Option<PathBuf>,
        config_path: Option<PathBuf>,
    ) -> Result<Self> {
        let ConfigFile {
            key_path: file_key_path,
            poll_interval_ms,
            contracts: global_contracts,
            abi,
            networks,
        } = load_config_file(config_path)?;

        let (default_rpc, default_chain_id) = match network {
            "localnet" | "local" => ("http://127.0.0.1:8545".to_string(), 31337),
            "sepolia" => ("https://rpc.sepolia.org".to_string(), 11155111),
            "mainnet" => ("https://eth.llamarpc.com".to_string(), 1),
            _ => anyhow::bail!(
                "Unknown network: {}. Use localnet, sepolia, or mainnet",
                network
            ),
        };

        let net_overlay = networks.get(network);

        let rpc_url = rpc_url
            .or_else(|| net_overlay.and_then(|n| n.rpc_url.clone()))
            .unwrap_or(default_rpc);
        let chain_id = net_overlay
            .and_then(|n| n.chain_id)
            .unwrap_or(default_chain_id);

        let mut contracts = default_contracts();
        apply_contracts(&mut contracts, global_contracts.as_ref());
        apply_contracts(&mut contracts, net_overlay.and_then(|n| n.contracts.as_ref()));

        // Resolve key path
        let key_path = match key_path.or(file_key_path) {
            Some(path) => path,
            None => PathBuf::from(shellexpand::tilde("~/.config/arcswap/key").into_owned()),
        };

        let key = load_key(&key_path)?;

        Ok(Self {
            network: network.to_string(),
            rpc_url,
            chain_id,
            key,
            key_path,
            contracts,
            abi: abi.unwrap_or_default(),
            poll_interval_ms: poll_interval_ms.unwrap_or(1000),
        })
    }

    pub fn address(&self) -> Address {
        self.key.address()
    }
}

/// Addresses of the live deployment
fn default_contracts() -> Contracts {
    Contracts {
        amm: Address::from_str("0xf904276Ae5bC2644A679F4a7Bb8f443B81f84F3A")
            .expect("Invalid AMM pool address"),
        eurc: Address::from_str("0x2635e06e2176b9c8BcB3873D9c0B537D69Ef6ABD")
            .expect("Invalid EURC token address"),
    }
}

fn apply_contracts(contracts: &mut Contracts, overlay: Option<&ContractsFile>) {
    if let Some(overlay) = overlay {
        if let Some(amm) = overlay.amm {
            contracts.amm = amm;
        }
        if let Some(eurc) = overlay.eurc {
            contracts.eurc = eurc;
        }
    }
}

fn load_config_file(path: Option<PathBuf>) -> Result<ConfigFile> {
    let path = match path {
        Some(path) => path,
        None => {
            let default =
                PathBuf::from(shellexpand::tilde("~/.config/arcswap/config.toml").into_owned());
            if !default.exists() {
                return Ok(ConfigFile::default());
            }
            default
        }
    };

    let data = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    toml::from_str(&data)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Load a signing key from a hex-encoded file
fn load_key(path: &Path) -> Result<LocalWallet> {
    if !path.exists() {
        anyhow::bail!(
            "Key file not found: {}\n\
             Create one with: openssl rand -hex 32 > {}",
            path.display(),
            path.display()
        );
    }

    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read key file: {}", path.display()))?;

    data.trim()
        .parse::<LocalWallet>()
        .with_context(|| format!("Invalid signing key in: {}", path.display()))
}
