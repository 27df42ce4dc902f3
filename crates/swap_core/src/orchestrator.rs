//! Workflow orchestration.
//!
//! Each user action maps to one workflow: buy (single swap transaction),
//! sell and add-liquidity (ERC-20 approval confirmed first, then the pool
//! transaction). The orchestrator owns the sequencing, journals every leg,
//! and reports progress through store events. Amount validation happens
//! before the guard is taken, so bad input never reaches the wallet.

use std::sync::{Arc, Mutex, PoisonError};

use ethers::types::{TxHash, U256};

use crate::abi::{AbiSpec, Contracts};
use crate::error::{Error, Result};
use crate::provider::{TxRequest, WalletProvider};
use crate::reader;
use crate::saga::{InflightGuard, SagaJournal, SagaRecord, SagaStage, WorkflowKind};
use crate::state::{StateEvent, Store};
use crate::units;
use crate::wallet::{self, Session};

pub struct Orchestrator {
    provider: Arc<dyn WalletProvider>,
    contracts: Contracts,
    abi: AbiSpec,
    guard: InflightGuard,
    journal: Mutex<SagaJournal>,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn WalletProvider>, contracts: Contracts, abi: AbiSpec) -> Self {
        Self {
            provider,
            contracts,
            abi,
            guard: InflightGuard::default(),
            journal: Mutex::new(SagaJournal::default()),
        }
    }

    pub fn contracts(&self) -> &Contracts {
        &self.contracts
    }

    /// Kind of the workflow currently in flight, if any.
    pub fn pending_workflow(&self) -> Option<WorkflowKind> {
        self.guard.pending()
    }

    /// Copy of the session's workflow journal, oldest first.
    pub fn journal_snapshot(&self) -> Vec<SagaRecord> {
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .records()
            .to_vec()
    }

    /// Open a wallet session and load the first chain snapshot.
    pub async fn connect(&self, store: &Store) -> Result<Session> {
        let session = wallet::connect(self.provider.as_ref()).await?;
        log::info!("connected as {}", session.short());
        store.dispatch(StateEvent::Connected(session));
        self.refresh(store).await?;
        Ok(session)
    }

    /// Re-read reserves and balance for the active session.
    pub async fn refresh(&self, store: &Store) -> Result<()> {
        let session = store
            .with(|s| s.session)
            .ok_or_else(|| Error::ProviderUnavailable("no active session".to_string()))?;
        let (reserves, balance) =
            reader::refresh(self.provider.as_ref(), &self.contracts, &self.abi, &session).await?;
        store.dispatch(StateEvent::Refreshed { reserves, balance });
        Ok(())
    }

    /// Swap native USDC for EURC. The amount rides as transaction value.
    pub async fn buy(&self, store: &Store, amount: &str) -> Result<TxHash> {
        let value = units::to_base_units(amount)?;
        let _inflight = self.guard.acquire(WorkflowKind::Buy)?;
        let idx = self.begin(WorkflowKind::Buy);
        store.dispatch(StateEvent::WorkflowStarted(WorkflowKind::Buy));

        let swap = TxRequest {
            to: self.contracts.amm,
            value,
            data: self.abi.swap_usdc_for_eurc_call(),
        };
        let tx_hash = self
            .run_leg(store, idx, WorkflowKind::Buy, SagaStage::SwapPending, swap)
            .await?;

        self.finish(store, idx, WorkflowKind::Buy);
        self.refresh_after(store).await;
        Ok(tx_hash)
    }

    /// Swap EURC for native USDC. Approves the pool for the exact amount
    /// and waits for that approval to confirm before the swap goes out.
    pub async fn sell(&self, store: &Store, amount: &str) -> Result<TxHash> {
        let eurc_value = units::to_base_units(amount)?;
        let _inflight = self.guard.acquire(WorkflowKind::Sell)?;
        let idx = self.begin(WorkflowKind::Sell);
        store.dispatch(StateEvent::WorkflowStarted(WorkflowKind::Sell));

        let approve = TxRequest {
            to: self.contracts.eurc,
            value: U256::zero(),
            data: self.abi.approve_call(self.contracts.amm, eurc_value),
        };
        self.run_leg(store, idx, WorkflowKind::Sell, SagaStage::ApprovalPending, approve)
            .await?;

        self.transition(idx, SagaStage::SwapPending);
        let swap = TxRequest {
            to: self.contracts.amm,
            value: U256::zero(),
            data: self.abi.swap_eurc_for_usdc_call(eurc_value),
        };
        let tx_hash = match self
            .run_leg(store, idx, WorkflowKind::Sell, SagaStage::SwapPending, swap)
            .await
        {
            Ok(hash) => hash,
            Err(e) => {
                log::warn!(
                    "sell failed after approval; pool keeps an allowance of {} EURC",
                    units::from_base_units(eurc_value)
                );
                return Err(e);
            }
        };

        self.finish(store, idx, WorkflowKind::Sell);
        self.refresh_after(store).await;
        Ok(tx_hash)
    }

    /// Deposit both tokens into the pool: EURC via a confirmed approval
    /// plus transfer, USDC as value on the same deposit transaction.
    pub async fn add_liquidity(
        &self,
        store: &Store,
        usdc_amount: &str,
        eurc_amount: &str,
    ) -> Result<TxHash> {
        let usdc_value = units::to_base_units(usdc_amount)?;
        let eurc_value = units::to_base_units(eurc_amount)?;
        let _inflight = self.guard.acquire(WorkflowKind::AddLiquidity)?;
        let idx = self.begin(WorkflowKind::AddLiquidity);
        store.dispatch(StateEvent::WorkflowStarted(WorkflowKind::AddLiquidity));

        let approve = TxRequest {
            to: self.contracts.eurc,
            value: U256::zero(),
            data: self.abi.approve_call(self.contracts.amm, eurc_value),
        };
        self.run_leg(
            store,
            idx,
            WorkflowKind::AddLiquidity,
            SagaStage::ApprovalPending,
            approve,
        )
        .await?;

        self.transition(idx, SagaStage::SwapPending);
        let deposit = TxRequest {
            to: self.contracts.amm,
            value: usdc_value,
            data: self.abi.add_liquidity_call(eurc_value),
        };
        let tx_hash = match self
            .run_leg(
                store,
                idx,
                WorkflowKind::AddLiquidity,
                SagaStage::SwapPending,
                deposit,
            )
            .await
        {
            Ok(hash) => hash,
            Err(e) => {
                log::warn!(
                    "deposit failed after approval; pool keeps an allowance of {} EURC",
                    units::from_base_units(eurc_value)
                );
                return Err(e);
            }
        };

        self.finish(store, idx, WorkflowKind::AddLiquidity);
        self.refresh_after(store).await;
        Ok(tx_hash)
    }

    /// Submit one transaction leg and wait for inclusion. On any failure
    /// the journal entry and the store are both marked before returning.
    async fn run_leg(
        &self,
        store: &Store,
        idx: usize,
        kind: WorkflowKind,
        stage: SagaStage,
        tx: TxRequest,
    ) -> Result<TxHash> {
        let tx_hash = match self.provider.send_transaction(tx).await {
            Ok(hash) => hash,
            Err(e) => return Err(self.abort(store, idx, kind, e)),
        };
        {
            let mut journal = self.journal.lock().unwrap_or_else(PoisonError::into_inner);
            match stage {
                SagaStage::ApprovalPending => journal.record_approval(idx, tx_hash),
                _ => journal.record_swap(idx, tx_hash),
            }
        }
        store.dispatch(StateEvent::WorkflowStage {
            kind,
            stage,
            tx_hash: Some(tx_hash),
        });

        let receipt = match self.provider.wait_for_receipt(tx_hash).await {
            Ok(receipt) => receipt,
            Err(e) => return Err(self.abort(store, idx, kind, e)),
        };
        if !receipt.success {
            let err = Error::CallReverted(format!("transaction {tx_hash:#x} reverted"));
            return Err(self.abort(store, idx, kind, err));
        }
        Ok(tx_hash)
    }

    fn begin(&self, kind: WorkflowKind) -> usize {
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .begin(kind)
    }

    fn transition(&self, idx: usize, stage: SagaStage) {
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .transition(idx, stage);
    }

    fn finish(&self, store: &Store, idx: usize, kind: WorkflowKind) {
        self.transition(idx, SagaStage::Done);
        log::info!("{kind} workflow complete");
        store.dispatch(StateEvent::WorkflowCompleted(kind));
    }

    fn abort(&self, store: &Store, idx: usize, kind: WorkflowKind, err: Error) -> Error {
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .fail(idx, &err.to_string());
        store.dispatch(StateEvent::WorkflowFailed {
            kind,
            message: err.to_string(),
        });
        err
    }

    /// Post-workflow snapshot reload. A stale view is not worth failing a
    /// workflow whose transaction already confirmed, so errors only warn.
    async fn refresh_after(&self, store: &Store) {
        if let Err(e) = self.refresh(store).await {
            log::warn!("post-workflow refresh failed: {e}");
        }
    }
}
