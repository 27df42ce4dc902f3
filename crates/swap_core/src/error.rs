//! Error taxonomy for the client core.
//!
//! Every failure a workflow can surface to the user falls into one of these
//! categories. The transport layer is responsible for classifying raw
//! provider errors into `UserRejected` / `CallReverted` / `Transport`;
//! `InvalidAmount` is always raised here, before any chain call is issued.

use crate::saga::WorkflowKind;

#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// No wallet capability: missing key material or a provider that
    /// exposes no account.
    #[error("no wallet provider available: {0}")]
    ProviderUnavailable(String),

    /// The signer declined to sign the transaction.
    #[error("signing rejected: {0}")]
    UserRejected(String),

    /// Contract-level rejection: revert reason or a failed receipt status.
    #[error("contract call reverted: {0}")]
    CallReverted(String),

    /// Network or node failure, including malformed call results.
    #[error("transport failure: {0}")]
    Transport(String),

    /// Empty or non-numeric user input, rejected before any call is issued.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// A workflow was invoked while another one is still pending. Carries
    /// the kind of the workflow currently holding the in-flight token.
    #[error("another workflow is in flight: {0}")]
    WorkflowInFlight(WorkflowKind),
}

pub type Result<T> = std::result::Result<T, Error>;
