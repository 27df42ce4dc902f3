//! Transaction workflow tracking.
//!
//! Multi-leg workflows (approve, then swap) are recorded as sagas so the
//! UI can show which leg is pending and what a failure left behind. A
//! process-wide guard serializes workflows: a second submission while one
//! is in flight is rejected, not queued.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use chrono::{DateTime, Utc};
use ethers::types::TxHash;

use crate::error::{Error, Result};

/// The three transaction workflows the client can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowKind {
    Buy,
    Sell,
    AddLiquidity,
}

impl WorkflowKind {
    /// First stage a workflow of this kind enters. Buying spends native
    /// USDC directly and has no approval leg.
    pub fn initial_stage(&self) -> SagaStage {
        match self {
            WorkflowKind::Buy => SagaStage::SwapPending,
            WorkflowKind::Sell | WorkflowKind::AddLiquidity => SagaStage::ApprovalPending,
        }
    }
}

impl fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowKind::Buy => write!(f, "buy"),
            WorkflowKind::Sell => write!(f, "sell"),
            WorkflowKind::AddLiquidity => write!(f, "add-liquidity"),
        }
    }
}

/// Where a workflow currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SagaStage {
    ApprovalPending,
    SwapPending,
    Done,
    Failed,
}

impl fmt::Display for SagaStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SagaStage::ApprovalPending => write!(f, "approval pending"),
            SagaStage::SwapPending => write!(f, "swap pending"),
            SagaStage::Done => write!(f, "done"),
            SagaStage::Failed => write!(f, "failed"),
        }
    }
}

/// One workflow's journal entry.
#[derive(Debug, Clone)]
pub struct SagaRecord {
    pub kind: WorkflowKind,
    pub stage: SagaStage,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub approval_tx: Option<TxHash>,
    pub swap_tx: Option<TxHash>,
    pub error: Option<String>,
}

/// In-memory, append-only log of every workflow run this session.
#[derive(Debug, Default)]
pub struct SagaJournal {
    records: Vec<SagaRecord>,
}

impl SagaJournal {
    /// Open a record for a new workflow and return its index.
    pub fn begin(&mut self, kind: WorkflowKind) -> usize {
        let now = Utc::now();
        self.records.push(SagaRecord {
            kind,
            stage: kind.initial_stage(),
            started_at: now,
            updated_at: now,
            approval_tx: None,
            swap_tx: None,
            error: None,
        });
        self.records.len() - 1
    }

    pub fn transition(&mut self, idx: usize, stage: SagaStage) {
        if let Some(record) = self.records.get_mut(idx) {
            record.stage = stage;
            record.updated_at = Utc::now();
        }
    }

    pub fn record_approval(&mut self, idx: usize, tx: TxHash) {
        if let Some(record) = self.records.get_mut(idx) {
            record.approval_tx = Some(tx);
            record.updated_at = Utc::now();
        }
    }

    pub fn record_swap(&mut self, idx: usize, tx: TxHash) {
        if let Some(record) = self.records.get_mut(idx) {
            record.swap_tx = Some(tx);
            record.updated_at = Utc::now();
        }
    }

    pub fn fail(&mut self, idx: usize, message: &str) {
        if let Some(record) = self.records.get_mut(idx) {
            record.stage = SagaStage::Failed;
            record.error = Some(message.to_string());
            record.updated_at = Utc::now();
        }
    }

    pub fn records(&self) -> &[SagaRecord] {
        &self.records
    }

    pub fn last(&self) -> Option<&SagaRecord> {
        self.records.last()
    }
}

const IDLE: u8 = 0;

fn code(kind: WorkflowKind) -> u8 {
    match kind {
        WorkflowKind::Buy => 1,
        WorkflowKind::Sell => 2,
        WorkflowKind::AddLiquidity => 3,
    }
}

fn kind_from(code: u8) -> Option<WorkflowKind> {
    match code {
        1 => Some(WorkflowKind::Buy),
        2 => Some(WorkflowKind::Sell),
        3 => Some(WorkflowKind::AddLiquidity),
        _ => None,
    }
}

/// Process-wide slot ensuring at most one workflow runs at a time.
#[derive(Debug, Default)]
pub struct InflightGuard {
    active: AtomicU8,
}

impl InflightGuard {
    /// Claim the slot, or report which workflow is already holding it.
    pub fn acquire(&self, kind: WorkflowKind) -> Result<InflightToken<'_>> {
        match self
            .active
            .compare_exchange(IDLE, code(kind), Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => Ok(InflightToken { guard: self }),
            Err(current) => Err(Error::WorkflowInFlight(
                kind_from(current).unwrap_or(kind),
            )),
        }
    }

    /// Kind of the workflow currently holding the slot, if any.
    pub fn pending(&self) -> Option<WorkflowKind> {
        kind_from(self.active.load(Ordering::Acquire))
    }
}

/// Releases the in-flight slot on drop, including on early error returns.
#[derive(Debug)]
pub struct InflightToken<'a> {
    guard: &'a InflightGuard,
}

impl Drop for InflightToken<'_> {
    fn drop(&mut self) {
        self.guard.active.store(IDLE, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::H256;

    #[test]
    fn test_buy_has_no_approval_leg() {
        assert_eq!(WorkflowKind::Buy.initial_stage(), SagaStage::SwapPending);
        assert_eq!(WorkflowKind::Sell.initial_stage(), SagaStage::ApprovalPending);
        assert_eq!(
            WorkflowKind::AddLiquidity.initial_stage(),
            SagaStage::ApprovalPending
        );
    }

    #[test]
    fn test_journal_tracks_a_full_sell() {
        let mut journal = SagaJournal::default();
        let idx = journal.begin(WorkflowKind::Sell);

        journal.record_approval(idx, H256::from_low_u64_be(1));
        journal.transition(idx, SagaStage::SwapPending);
        journal.record_swap(idx, H256::from_low_u64_be(2));
        journal.transition(idx, SagaStage::Done);

        let record = journal.last().unwrap();
        assert_eq!(record.kind, WorkflowKind::Sell);
        assert_eq!(record.stage, SagaStage::Done);
        assert_eq!(record.approval_tx, Some(H256::from_low_u64_be(1)));
        assert_eq!(record.swap_tx, Some(H256::from_low_u64_be(2)));
        assert!(record.error.is_none());
        assert!(record.updated_at >= record.started_at);
    }

    #[test]
    fn test_journal_failure_keeps_message_and_partial_txs() {
        let mut journal = SagaJournal::default();
        let idx = journal.begin(WorkflowKind::AddLiquidity);
        journal.record_approval(idx, H256::from_low_u64_be(9));
        journal.fail(idx, "swap leg reverted");

        let record = journal.last().unwrap();
        assert_eq!(record.stage, SagaStage::Failed);
        assert_eq!(record.error.as_deref(), Some("swap leg reverted"));
        assert_eq!(record.approval_tx, Some(H256::from_low_u64_be(9)));
        assert!(record.swap_tx.is_none());
    }

    #[test]
    fn test_guard_rejects_overlapping_workflows() {
        let guard = InflightGuard::default();
        let token = guard.acquire(WorkflowKind::Sell).unwrap();
        assert_eq!(guard.pending(), Some(WorkflowKind::Sell));

        let err = guard.acquire(WorkflowKind::Buy).unwrap_err();
        assert!(matches!(err, Error::WorkflowInFlight(WorkflowKind::Sell)));

        drop(token);
        assert_eq!(guard.pending(), None);
        assert!(guard.acquire(WorkflowKind::Buy).is_ok());
    }
}
