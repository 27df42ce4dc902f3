//! Workflow tests against a scripted wallet double.
//!
//! The double records every submission and receipt wait in order, serves
//! reserve and balance reads from adjustable fixtures, and plays back a
//! scripted outcome per transaction. That is enough to pin down the
//! ordering guarantees: approvals confirm before swaps go out, failures
//! stop a workflow cold, and only one workflow runs at a time.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ethers::abi::Token;
use ethers::types::{Address, Bytes, H256, U256};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::Notify;

use swap_core::{
    AbiSpec, Contracts, Error, Orchestrator, Result, SagaStage, StateEvent, Store, TxReceipt,
    TxRequest, WalletProvider, WorkflowKind,
};

fn wad(n: u64) -> U256 {
    U256::from(n) * U256::exp10(18)
}

fn contracts() -> Contracts {
    Contracts {
        amm: Address::from_low_u64_be(0xAAAA),
        eurc: Address::from_low_u64_be(0xEEEE),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MockEvent {
    Sent(usize),
    Waited(usize),
}

#[derive(Clone)]
enum TxOutcome {
    Success,
    Reverted,
    FailSend,
    /// Hold the receipt until the gate is notified, then succeed.
    Block(Arc<Notify>),
}

struct MockProvider {
    abi: AbiSpec,
    account: Address,
    reserves: Mutex<(U256, U256)>,
    balance: Mutex<U256>,
    outcomes: Mutex<Vec<TxOutcome>>,
    requests: Mutex<Vec<TxRequest>>,
    events: Mutex<Vec<MockEvent>>,
}

impl MockProvider {
    fn new(outcomes: Vec<TxOutcome>) -> Arc<Self> {
        Arc::new(Self {
            abi: AbiSpec::default(),
            account: Address::from_low_u64_be(0xFEED),
            reserves: Mutex::new((wad(1000), wad(900))),
            balance: Mutex::new(wad(100)),
            outcomes: Mutex::new(outcomes),
            requests: Mutex::new(Vec::new()),
            events: Mutex::new(Vec::new()),
        })
    }

    fn set_reserves(&self, usdc: U256, eurc: U256) {
        *self.reserves.lock().unwrap() = (usdc, eurc);
    }

    fn set_balance(&self, eurc: U256) {
        *self.balance.lock().unwrap() = eurc;
    }

    fn requests(&self) -> Vec<TxRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn events(&self) -> Vec<MockEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl WalletProvider for MockProvider {
    async fn accounts(&self) -> Result<Vec<Address>> {
        Ok(vec![self.account])
    }

    async fn call(&self, _to: Address, data: Bytes) -> Result<Bytes> {
        let (usdc, eurc) = *self.reserves.lock().unwrap();
        let value = if data[..4] == self.abi.reserve_usdc_call()[..4] {
            usdc
        } else if data[..4] == self.abi.reserve_eurc_call()[..4] {
            eurc
        } else if data[..4] == self.abi.balance_of_call(Address::zero())[..4] {
            *self.balance.lock().unwrap()
        } else {
            return Err(Error::Transport(format!("unexpected call {data:?}")));
        };
        Ok(ethers::abi::encode(&[Token::Uint(value)]).into())
    }

    async fn send_transaction(&self, tx: TxRequest) -> Result<H256> {
        let idx = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(tx);
            requests.len() - 1
        };
        self.events.lock().unwrap().push(MockEvent::Sent(idx));
        match self.outcomes.lock().unwrap().get(idx) {
            Some(TxOutcome::FailSend) => Err(Error::UserRejected(
                "signature request dismissed".to_string(),
            )),
            _ => Ok(H256::from_low_u64_be(idx as u64 + 1)),
        }
    }

    async fn wait_for_receipt(&self, tx_hash: H256) -> Result<TxReceipt> {
        let idx = (tx_hash.to_low_u64_be() - 1) as usize;
        self.events.lock().unwrap().push(MockEvent::Waited(idx));
        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .get(idx)
            .cloned()
            .unwrap_or(TxOutcome::Success);
        let success = match outcome {
            TxOutcome::Block(gate) => {
                gate.notified().await;
                true
            }
            TxOutcome::Reverted => false,
            _ => true,
        };
        Ok(TxReceipt {
            tx_hash,
            block_number: Some(1),
            success,
        })
    }
}

async fn connected(outcomes: Vec<TxOutcome>) -> (Arc<MockProvider>, Orchestrator, Store) {
    let mock = MockProvider::new(outcomes);
    let orch = Orchestrator::new(mock.clone(), contracts(), AbiSpec::default());
    let store = Store::new();
    orch.connect(&store).await.unwrap();
    (mock, orch, store)
}

fn drain(rx: &mut UnboundedReceiver<StateEvent>) -> Vec<StateEvent> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        out.push(event);
    }
    out
}

#[tokio::test]
async fn test_sell_confirms_approval_before_swap() {
    let (mock, orch, store) =
        connected(vec![TxOutcome::Success, TxOutcome::Success]).await;

    orch.sell(&store, "5").await.unwrap();

    // the approval must be mined before the swap is even submitted
    assert_eq!(
        mock.events(),
        vec![
            MockEvent::Sent(0),
            MockEvent::Waited(0),
            MockEvent::Sent(1),
            MockEvent::Waited(1),
        ]
    );

    let requests = mock.requests();
    let abi = AbiSpec::default();
    assert_eq!(requests[0].to, contracts().eurc);
    assert_eq!(requests[0].value, U256::zero());
    assert_eq!(requests[0].data, abi.approve_call(contracts().amm, wad(5)));
    assert_eq!(requests[1].to, contracts().amm);
    assert_eq!(requests[1].value, U256::zero());
    assert_eq!(requests[1].data, abi.swap_eurc_for_usdc_call(wad(5)));

    let journal = orch.journal_snapshot();
    let record = journal.last().unwrap();
    assert_eq!(record.stage, SagaStage::Done);
    assert!(record.approval_tx.is_some());
    assert!(record.swap_tx.is_some());
}

#[tokio::test]
async fn test_reverted_approval_stops_the_sell() {
    let (mock, orch, store) = connected(vec![TxOutcome::Reverted]).await;
    mock.set_reserves(wad(2000), wad(1800));
    let mut rx = store.subscribe();

    let err = orch.sell(&store, "5").await.unwrap_err();
    assert!(matches!(err, Error::CallReverted(_)));

    // only the approval went out
    assert_eq!(mock.requests().len(), 1);

    let journal = orch.journal_snapshot();
    let record = journal.last().unwrap();
    assert_eq!(record.stage, SagaStage::Failed);
    assert!(record.error.is_some());
    assert!(record.swap_tx.is_none());

    // no post-failure refresh: the store still shows the connect-time
    // snapshot, not the fixtures updated afterwards
    let events = drain(&mut rx);
    assert!(events
        .iter()
        .all(|e| !matches!(e, StateEvent::Refreshed { .. })));
    assert_eq!(store.snapshot().reserves.unwrap().usdc, wad(1000));
    assert_eq!(store.snapshot().workflow, None);
}

#[tokio::test]
async fn test_buy_carries_value_and_reloads_the_snapshot() {
    let (mock, orch, store) = connected(vec![TxOutcome::Success]).await;
    assert_eq!(store.snapshot().reserves.unwrap().usdc, wad(1000));

    mock.set_reserves(wad(1010), wad(891));
    mock.set_balance(wad(111));

    let tx_hash = orch.buy(&store, "10").await.unwrap();
    assert_eq!(tx_hash, H256::from_low_u64_be(1));

    let requests = mock.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].to, contracts().amm);
    assert_eq!(requests[0].value, wad(10));
    assert_eq!(requests[0].data, AbiSpec::default().swap_usdc_for_eurc_call());

    let state = store.snapshot();
    assert_eq!(state.reserves.unwrap().usdc, wad(1010));
    assert_eq!(state.reserves.unwrap().eurc, wad(891));
    assert_eq!(state.balance.unwrap().eurc, wad(111));
}

#[tokio::test]
async fn test_add_liquidity_approves_eurc_then_deposits_both_sides() {
    let (mock, orch, store) =
        connected(vec![TxOutcome::Success, TxOutcome::Success]).await;

    orch.add_liquidity(&store, "50", "45").await.unwrap();

    assert_eq!(
        mock.events(),
        vec![
            MockEvent::Sent(0),
            MockEvent::Waited(0),
            MockEvent::Sent(1),
            MockEvent::Waited(1),
        ]
    );

    let requests = mock.requests();
    let abi = AbiSpec::default();
    assert_eq!(requests[0].to, contracts().eurc);
    assert_eq!(requests[0].data, abi.approve_call(contracts().amm, wad(45)));
    assert_eq!(requests[1].to, contracts().amm);
    assert_eq!(requests[1].value, wad(50));
    assert_eq!(requests[1].data, abi.add_liquidity_call(wad(45)));
}

#[tokio::test]
async fn test_empty_amounts_never_reach_the_wallet() {
    let (mock, orch, store) = connected(vec![]).await;
    let mut rx = store.subscribe();

    assert!(matches!(
        orch.buy(&store, "").await.unwrap_err(),
        Error::InvalidAmount(_)
    ));
    assert!(matches!(
        orch.sell(&store, "   ").await.unwrap_err(),
        Error::InvalidAmount(_)
    ));
    assert!(matches!(
        orch.add_liquidity(&store, "", "45").await.unwrap_err(),
        Error::InvalidAmount(_)
    ));

    assert!(mock.requests().is_empty());
    assert!(drain(&mut rx).is_empty());
    assert!(orch.journal_snapshot().is_empty());
}

#[tokio::test]
async fn test_second_workflow_rejected_while_first_in_flight() {
    let gate = Arc::new(Notify::new());
    let (mock, orch, store) = connected(vec![
        TxOutcome::Block(gate.clone()),
        TxOutcome::Success,
        TxOutcome::Success,
    ])
    .await;

    let (sell_res, buy_res) = tokio::join!(orch.sell(&store, "5"), async {
        // the sell is parked waiting for its approval receipt by the
        // time this runs, so the guard must turn the buy away
        let res = orch.buy(&store, "1").await;
        gate.notify_one();
        res
    });

    assert!(sell_res.is_ok());
    assert!(matches!(
        buy_res.unwrap_err(),
        Error::WorkflowInFlight(WorkflowKind::Sell)
    ));
    // approval + swap only, no buy transaction
    assert_eq!(mock.requests().len(), 2);

    // the slot is free again once the sell finished
    assert_eq!(orch.pending_workflow(), None);
    orch.buy(&store, "1").await.unwrap();
    assert_eq!(mock.requests().len(), 3);
}

#[tokio::test]
async fn test_wallet_rejection_releases_the_guard() {
    let (mock, orch, store) =
        connected(vec![TxOutcome::FailSend, TxOutcome::Success]).await;

    let err = orch.sell(&store, "5").await.unwrap_err();
    assert!(matches!(err, Error::UserRejected(_)));
    assert_eq!(orch.pending_workflow(), None);

    let journal = orch.journal_snapshot();
    assert_eq!(journal.last().unwrap().stage, SagaStage::Failed);

    // a fresh workflow goes straight through
    orch.buy(&store, "2").await.unwrap();
    let requests = mock.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].value, wad(2));
}
