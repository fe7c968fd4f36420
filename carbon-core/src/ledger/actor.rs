//! Single-writer ledger actor.
//!
//! The ledger is realized as one actor task owning a [`LedgerState`],
//! driven by a bounded `tokio::sync::mpsc` command channel. [`LedgerHandle`]
//! is the cloneable sender side any number of producers (inverter feeds,
//! transaction submitters, a single miner) can hold concurrently. The
//! nonce search never runs with the actor's `&mut LedgerState` borrowed:
//! `Mine` hands the CPU-bound search off to `spawn_blocking` and re-enters
//! the actor's own queue as a `CommitMined` command to finish atomically,
//! the same pattern as a mining worker sending a completed block back over
//! an `mpsc::Sender<Block>` for the chain owner to accept.

use super::pool::PendingSnapshot;
use super::state::{LedgerState, MinedBlockReport, MiningWorkspace};
use crate::consensus::search_nonce;
use crate::error::{ChainError, MiningError, RegistryError, TransactionError};
use crate::types::{InverterSample, PanelRecord, Transaction};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Bounded channel depth for the ledger actor's inbound command queue.
const COMMAND_CHANNEL_CAPACITY: usize = 256;

/// Read-only summary used by the `ShowChainInfo` CLI command and `GET /chain`.
#[derive(Debug, Clone)]
pub struct ChainInfo {
    pub height: u64,
    pub pending_sample_count: usize,
    pub pending_transaction_count: usize,
    pub reference_reduction: f64,
    pub cumulative_reduction: f64,
}

enum LedgerCommand {
    RegisterPanel {
        panel: PanelRecord,
        reply: oneshot::Sender<Result<Decimal, RegistryError>>,
    },
    SubmitTransaction {
        tx: Transaction,
        reply: oneshot::Sender<Result<(), TransactionError>>,
    },
    SubmitSample {
        sample: InverterSample,
        reply: oneshot::Sender<Result<(), TransactionError>>,
    },
    Mine {
        miner: String,
        reply: oneshot::Sender<Result<MinedBlockReport, MiningError>>,
    },
    /// Re-entrant: a nonce search launched by `Mine` finished successfully
    /// and is handed back to the actor to commit under its own lock.
    CommitMined {
        workspace: MiningWorkspace,
        reply: oneshot::Sender<Result<MinedBlockReport, MiningError>>,
    },
    AbortMining,
    CancelCurrentMining,
    Validate {
        reply: oneshot::Sender<Result<(), ChainError>>,
    },
    Balance {
        account: String,
        reply: oneshot::Sender<Decimal>,
    },
    Panel {
        panel_id: String,
        reply: oneshot::Sender<Option<PanelRecord>>,
    },
    ChainInfo {
        reply: oneshot::Sender<ChainInfo>,
    },
    Snapshot {
        reply: oneshot::Sender<crate::persistence::SnapshotData>,
    },
}

/// Owns the [`LedgerState`] and drains its command queue one message at a
/// time, the single-writer realization the ledger requires.
pub struct LedgerActor {
    state: LedgerState,
    receiver: mpsc::Receiver<LedgerCommand>,
    self_sender: mpsc::Sender<LedgerCommand>,
    current_mining_cancel: Option<Arc<AtomicBool>>,
}

impl LedgerActor {
    /// Spawns the actor on the current Tokio runtime and returns a handle
    /// to it. Panics if called outside a Tokio context; callers spawn this
    /// from `tokio::spawn` in `main`.
    pub fn spawn(state: LedgerState) -> LedgerHandle {
        let (sender, receiver) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let actor = LedgerActor {
            state,
            receiver,
            self_sender: sender.clone(),
            current_mining_cancel: None,
        };
        tokio::spawn(actor.run());
        LedgerHandle { sender }
    }

    async fn run(mut self) {
        while let Some(command) = self.receiver.recv().await {
            self.handle(command);
        }
        debug!("ledger actor shutting down: all handles dropped");
    }

    fn handle(&mut self, command: LedgerCommand) {
        match command {
            LedgerCommand::RegisterPanel { panel, reply } => {
                let _ = reply.send(self.state.register_panel(panel));
            }
            LedgerCommand::SubmitTransaction { tx, reply } => {
                let _ = reply.send(self.state.submit_transaction(tx));
            }
            LedgerCommand::SubmitSample { sample, reply } => {
                let _ = reply.send(self.state.submit_sample(sample));
            }
            LedgerCommand::Mine { miner, reply } => self.start_mining(miner, reply),
            LedgerCommand::CommitMined { workspace, reply } => {
                self.current_mining_cancel = None;
                let _ = reply.send(self.state.commit_mined_block(workspace));
            }
            LedgerCommand::AbortMining => {
                self.current_mining_cancel = None;
                self.state.abort_mining();
            }
            LedgerCommand::CancelCurrentMining => {
                if let Some(cancel) = &self.current_mining_cancel {
                    cancel.store(true, Ordering::Relaxed);
                }
            }
            LedgerCommand::Validate { reply } => {
                let _ = reply.send(self.state.validate());
            }
            LedgerCommand::Balance { account, reply } => {
                let _ = reply.send(self.state.balance(&account));
            }
            LedgerCommand::Panel { panel_id, reply } => {
                let _ = reply.send(self.state.panel(&panel_id).cloned());
            }
            LedgerCommand::ChainInfo { reply } => {
                let cumulative_reduction = self.state.chain().iter().map(|b| b.total_carbon_reduction).sum();
                let _ = reply.send(ChainInfo {
                    height: self.state.chain().len() as u64 - 1,
                    pending_sample_count: self.state.pending_sample_count(),
                    pending_transaction_count: self.state.pending_transaction_count(),
                    reference_reduction: self.state.reference_reduction(),
                    cumulative_reduction,
                });
            }
            LedgerCommand::Snapshot { reply } => {
                let _ = reply.send(crate::persistence::SnapshotData::capture(&self.state));
            }
        }
    }

    /// Enters mining: snapshots the pending pool, derives the block
    /// skeleton, then hands the nonce search to `spawn_blocking` so this
    /// actor keeps draining other commands while the search runs. The
    /// search reports back over `self_sender` as `CommitMined`, preserving
    /// single-writer ordering for the chain append.
    fn start_mining(&mut self, miner: String, reply: oneshot::Sender<Result<MinedBlockReport, MiningError>>) {
        let snapshot: PendingSnapshot = match self.state.begin_mining() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                let _ = reply.send(Err(err));
                return;
            }
        };

        let workspace = match self.state.prepare_mining(&miner, snapshot) {
            Ok(workspace) => workspace,
            Err(err) => {
                self.state.abort_mining();
                let _ = reply.send(Err(err));
                return;
            }
        };

        let cancel = Arc::new(AtomicBool::new(false));
        self.current_mining_cancel = Some(cancel.clone());

        let self_sender = self.self_sender.clone();
        tokio::task::spawn(async move {
            let searched = tokio::task::spawn_blocking(move || {
                let mut workspace = workspace;
                let found = search_nonce(&mut workspace.block, &cancel);
                (found, workspace)
            })
            .await;

            match searched {
                Ok((true, workspace)) => {
                    if self_sender
                        .send(LedgerCommand::CommitMined { workspace, reply })
                        .await
                        .is_err()
                    {
                        warn!("ledger actor dropped before a mined block could be committed");
                    }
                }
                Ok((false, _)) => {
                    let _ = self_sender.send(LedgerCommand::AbortMining).await;
                    let _ = reply.send(Err(MiningError::Cancelled));
                }
                Err(_join_error) => {
                    let _ = self_sender.send(LedgerCommand::AbortMining).await;
                    let _ = reply.send(Err(MiningError::Cancelled));
                }
            }
        });
    }
}

/// Cloneable front door to a running [`LedgerActor`]. Every producer
/// (REST handler, CLI command, telemetry simulator feed) holds one of
/// these rather than the `LedgerState` itself.
#[derive(Clone)]
pub struct LedgerHandle {
    sender: mpsc::Sender<LedgerCommand>,
}

/// Returned when the actor task has ended (e.g. the process is shutting
/// down) and a command could not be delivered or answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("ledger actor is no longer running")]
pub struct LedgerGone;

impl LedgerHandle {
    /// Spawns a fresh actor wrapping a new, genesis-only ledger.
    pub fn spawn_new() -> Self {
        LedgerActor::spawn(LedgerState::new())
    }

    /// Spawns an actor wrapping an already-built ledger (e.g. one just
    /// restored from a snapshot).
    pub fn spawn_with_state(state: LedgerState) -> Self {
        LedgerActor::spawn(state)
    }

    async fn call<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> LedgerCommand) -> Result<T, LedgerGone> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender.send(build(reply_tx)).await.map_err(|_| LedgerGone)?;
        reply_rx.await.map_err(|_| LedgerGone)
    }

    pub async fn register_panel(&self, panel: PanelRecord) -> Result<Result<Decimal, RegistryError>, LedgerGone> {
        self.call(|reply| LedgerCommand::RegisterPanel { panel, reply }).await
    }

    pub async fn submit_transaction(&self, tx: Transaction) -> Result<Result<(), TransactionError>, LedgerGone> {
        self.call(|reply| LedgerCommand::SubmitTransaction { tx, reply }).await
    }

    pub async fn submit_sample(&self, sample: InverterSample) -> Result<Result<(), TransactionError>, LedgerGone> {
        self.call(|reply| LedgerCommand::SubmitSample { sample, reply }).await
    }

    pub async fn mine(&self, miner: impl Into<String>) -> Result<Result<MinedBlockReport, MiningError>, LedgerGone> {
        let miner = miner.into();
        self.call(|reply| LedgerCommand::Mine { miner, reply }).await
    }

    /// Requests cancellation of whatever mine is currently in flight, at
    /// nonce-loop granularity. A no-op if no mine is in progress.
    pub async fn cancel_mining(&self) -> Result<(), LedgerGone> {
        self.sender
            .send(LedgerCommand::CancelCurrentMining)
            .await
            .map_err(|_| LedgerGone)
    }

    pub async fn validate(&self) -> Result<Result<(), ChainError>, LedgerGone> {
        self.call(|reply| LedgerCommand::Validate { reply }).await
    }

    pub async fn balance(&self, account: impl Into<String>) -> Result<Decimal, LedgerGone> {
        let account = account.into();
        self.call(|reply| LedgerCommand::Balance { account, reply }).await
    }

    pub async fn panel(&self, panel_id: impl Into<String>) -> Result<Option<PanelRecord>, LedgerGone> {
        let panel_id = panel_id.into();
        self.call(|reply| LedgerCommand::Panel { panel_id, reply }).await
    }

    pub async fn chain_info(&self) -> Result<ChainInfo, LedgerGone> {
        self.call(|reply| LedgerCommand::ChainInfo { reply }).await
    }

    pub async fn snapshot(&self) -> Result<crate::persistence::SnapshotData, LedgerGone> {
        self.call(|reply| LedgerCommand::Snapshot { reply }).await
    }
}
