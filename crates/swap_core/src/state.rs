//! View state and the event store.
//!
//! All UI-relevant state lives in one [`AppState`] value. Mutation goes
//! through [`Store::dispatch`], which folds a [`StateEvent`] into the
//! state with the pure [`apply`] reducer and fans the event out to
//! subscribers. Renderers hold a receiver and redraw on events instead
//! of polling.

use std::fmt;
use std::sync::{Mutex, PoisonError, RwLock};

use ethers::types::TxHash;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::reader::{ReserveSnapshot, UserBalance};
use crate::saga::{SagaStage, WorkflowKind};
use crate::wallet::Session;

/// Which panel the UI is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Trade,
    Earn,
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tab::Trade => write!(f, "trade"),
            Tab::Earn => write!(f, "earn"),
        }
    }
}

/// Uncommitted input on the trade panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TradeFields {
    pub amount: String,
}

/// Uncommitted input on the earn panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EarnFields {
    pub usdc: String,
    pub eurc: String,
}

/// The workflow currently in flight, mirrored into view state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowStatus {
    pub kind: WorkflowKind,
    pub stage: SagaStage,
}

/// Everything a renderer needs, in one snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub session: Option<Session>,
    pub reserves: Option<ReserveSnapshot>,
    pub balance: Option<UserBalance>,
    pub tab: Tab,
    pub trade: TradeFields,
    pub earn: EarnFields,
    pub workflow: Option<WorkflowStatus>,
}

/// Every way the state can change.
#[derive(Debug, Clone)]
pub enum StateEvent {
    Connected(Session),
    Refreshed {
        reserves: ReserveSnapshot,
        balance: UserBalance,
    },
    TabSwitched(Tab),
    TradeAmountEdited(String),
    EarnUsdcEdited(String),
    EarnEurcEdited(String),
    WorkflowStarted(WorkflowKind),
    WorkflowStage {
        kind: WorkflowKind,
        stage: SagaStage,
        tx_hash: Option<TxHash>,
    },
    WorkflowCompleted(WorkflowKind),
    WorkflowFailed {
        kind: WorkflowKind,
        message: String,
    },
}

/// Fold one event into the state. Pure, no I/O.
///
/// Input fields survive tab switches and workflow completion; only the
/// user edits them.
pub fn apply(state: &mut AppState, event: &StateEvent) {
    match event {
        StateEvent::Connected(session) => state.session = Some(*session),
        StateEvent::Refreshed { reserves, balance } => {
            state.reserves = Some(*reserves);
            state.balance = Some(*balance);
        }
        StateEvent::TabSwitched(tab) => state.tab = *tab,
        StateEvent::TradeAmountEdited(amount) => state.trade.amount = amount.clone(),
        StateEvent::EarnUsdcEdited(amount) => state.earn.usdc = amount.clone(),
        StateEvent::EarnEurcEdited(amount) => state.earn.eurc = amount.clone(),
        StateEvent::WorkflowStarted(kind) => {
            state.workflow = Some(WorkflowStatus {
                kind: *kind,
                stage: kind.initial_stage(),
            });
        }
        StateEvent::WorkflowStage { kind, stage, .. } => {
            state.workflow = Some(WorkflowStatus {
                kind: *kind,
                stage: *stage,
            });
        }
        StateEvent::WorkflowCompleted(_) | StateEvent::WorkflowFailed { .. } => {
            state.workflow = None;
        }
    }
}

/// Owner of the state plus the subscriber list.
///
/// Dispatch takes `&self` so workflows running concurrently on the same
/// store can race the in-flight guard instead of a `&mut` borrow.
#[derive(Debug, Default)]
pub struct Store {
    state: RwLock<AppState>,
    subscribers: Mutex<Vec<UnboundedSender<StateEvent>>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clone of the current state.
    pub fn snapshot(&self) -> AppState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Run a closure against the current state without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        f(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Register a renderer. Dropped receivers are pruned on dispatch.
    pub fn subscribe(&self) -> UnboundedReceiver<StateEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    /// Apply the event to the state, then fan it out.
    pub fn dispatch(&self, event: StateEvent) {
        log::debug!("dispatch {event:?}");
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            apply(&mut state, &event);
        }
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}
