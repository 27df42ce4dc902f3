//! Client core for a fixed-function USDC/EURC exchange pool.
//!
//! Everything here is transport-agnostic: chain access goes through the
//! [`provider::WalletProvider`] trait, so the same workflows drive a real
//! JSON-RPC signer in the CLI and a scripted double in tests.
//!
//! The moving parts:
//! - [`state::Store`] holds the single [`state::AppState`] value and fans
//!   [`state::StateEvent`]s out to subscribed renderers.
//! - [`orchestrator::Orchestrator`] runs the buy / sell / add-liquidity
//!   workflows, enforcing approve-before-swap ordering and one workflow
//!   in flight at a time.
//! - [`saga::SagaJournal`] keeps a per-session record of every workflow
//!   leg for inspection after the fact.
//!
//! Amounts cross the API as decimal strings and live on chain as
//! 18-decimal base units; [`units`] owns that boundary.

pub mod abi;
pub mod error;
pub mod orchestrator;
pub mod provider;
pub mod reader;
pub mod saga;
pub mod state;
pub mod units;
pub mod wallet;

pub use abi::{AbiSpec, Contracts};
pub use error::{Error, Result};
pub use orchestrator::Orchestrator;
pub use provider::{TxReceipt, TxRequest, WalletProvider};
pub use reader::{ReserveSnapshot, UserBalance};
pub use saga::{SagaRecord, SagaStage, WorkflowKind};
pub use state::{AppState, StateEvent, Store, Tab};
pub use wallet::Session;
