// src/engine/server.rs - Async message passing for the decision engine
//
// One background task owns the engine. The presentation layer sends
// commands through a cloneable handle and watches the single active decision
// on an outbound watch channel. Commands are processed one at a time to
// completion, so state mutations never interleave, and publishing a decision
// never waits on the listener.

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use uuid::Uuid;

use super::DecisionEngine;
use crate::hints::{catalog, HintCategory, ProficiencyLevel, TriggerKind};
use crate::infra::errors::HintError;
use crate::learner::{HintOutcome, LearningState};

const COMMAND_BUFFER: usize = 100;

/// Time source for the engine task.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        if let (Ok(mut now), Ok(by)) = (self.now.lock(), chrono::Duration::from_std(by)) {
            *now += by;
        }
    }

    pub fn set(&self, to: DateTime<Utc>) {
        if let Ok(mut now) = self.now.lock() {
            *now = to;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.lock().map(|n| *n).unwrap_or_else(|_| Utc::now())
    }
}

/// An admitted hint, delivered to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct HintDecision {
    pub id: Uuid,
    pub category: HintCategory,
    pub trigger: TriggerKind,
    pub admitted_at: DateTime<Utc>,
    /// How long to keep it on screen before reporting a deferral.
    pub display_for: Duration,
    /// The still-active decision this one replaces, if any.
    pub supersedes: Option<Uuid>,
}

/// Everything the engine task knows, at one point in its command stream.
#[derive(Debug, Clone)]
pub struct EngineSnapshot {
    pub state: LearningState,
    pub active: Option<HintDecision>,
    pub pending_save: bool,
}

#[derive(Debug)]
pub enum HintCommand {
    Requested {
        trigger: TriggerKind,
    },
    Shown {
        category: HintCategory,
    },
    Outcome {
        category: HintCategory,
        outcome: HintOutcome,
    },
    Reset,
    SetProficiency {
        level: ProficiencyLevel,
    },
    Snapshot {
        resp: oneshot::Sender<EngineSnapshot>,
    },
}

/// A handle to the engine task that uses message passing.
#[derive(Clone)]
pub struct HintHandle {
    tx: mpsc::Sender<HintCommand>,
}

impl HintHandle {
    pub fn new(tx: mpsc::Sender<HintCommand>) -> Self {
        Self { tx }
    }

    async fn send(&self, cmd: HintCommand) -> Result<(), HintError> {
        self.tx.send(cmd).await.map_err(|_| HintError::ChannelClosed)
    }

    /// Report a trigger. An admitted hint replaces the watched decision.
    pub async fn request(&self, trigger: TriggerKind) -> Result<(), HintError> {
        self.send(HintCommand::Requested { trigger }).await
    }

    pub async fn shown(&self, category: HintCategory) -> Result<(), HintError> {
        self.send(HintCommand::Shown { category }).await
    }

    pub async fn outcome(
        &self,
        category: HintCategory,
        outcome: HintOutcome,
    ) -> Result<(), HintError> {
        self.send(HintCommand::Outcome { category, outcome }).await
    }

    pub async fn reset(&self) -> Result<(), HintError> {
        self.send(HintCommand::Reset).await
    }

    pub async fn set_proficiency(&self, level: ProficiencyLevel) -> Result<(), HintError> {
        self.send(HintCommand::SetProficiency { level }).await
    }

    /// State after every previously sent command has been processed.
    pub async fn snapshot(&self) -> Result<EngineSnapshot, HintError> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.send(HintCommand::Snapshot { resp: resp_tx }).await?;
        resp_rx.await.map_err(|_| HintError::ChannelClosed)
    }
}

/// Helper to spawn the engine task. Returns the command handle, a watch on
/// the active decision (`None` while nothing is on screen), and a join handle
/// yielding the engine once every handle is dropped.
pub fn spawn_hint_server(
    engine: DecisionEngine,
    clock: Arc<dyn Clock>,
) -> (
    HintHandle,
    watch::Receiver<Option<HintDecision>>,
    tokio::task::JoinHandle<DecisionEngine>,
) {
    let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
    let (decision_tx, decision_rx) = watch::channel(None);
    let handle = HintHandle::new(tx);
    let join_handle = tokio::spawn(run_hint_server(engine, clock, rx, decision_tx));
    (handle, decision_rx, join_handle)
}

/// The background task that owns the engine.
pub async fn run_hint_server(
    mut engine: DecisionEngine,
    clock: Arc<dyn Clock>,
    mut rx: mpsc::Receiver<HintCommand>,
    decisions: watch::Sender<Option<HintDecision>>,
) -> DecisionEngine {
    let mut active: Option<HintDecision> = None;
    let mut listener_gone = false;

    while let Some(cmd) = rx.recv().await {
        let now = clock.now();
        match cmd {
            HintCommand::Requested { trigger } => {
                let Some(category) = engine.evaluate(&trigger, now) else {
                    continue;
                };
                let decision = HintDecision {
                    id: Uuid::new_v4(),
                    category,
                    trigger,
                    admitted_at: now,
                    display_for: catalog::duration(category),
                    supersedes: active.as_ref().map(|d| d.id),
                };
                active = Some(decision.clone());
                decisions.send_replace(Some(decision));

                if decisions.is_closed() && !listener_gone {
                    tracing::warn!("Decision listener dropped; hints will no longer be delivered");
                    listener_gone = true;
                }
            }
            HintCommand::Shown { category } => {
                if active.as_ref().map(|d| d.category) != Some(category) {
                    tracing::debug!("{category} shown without a matching active decision");
                }
                engine.record_shown(category, now);
            }
            HintCommand::Outcome { category, outcome } => {
                tracing::debug!("{category} {outcome}");
                engine.record_outcome(outcome, now);
                if active.as_ref().map(|d| d.category) == Some(category) {
                    active = None;
                    decisions.send_replace(None);
                }
            }
            HintCommand::Reset => {
                engine.reset();
                if active.take().is_some() {
                    decisions.send_replace(None);
                }
            }
            HintCommand::SetProficiency { level } => {
                engine.set_proficiency(level);
            }
            HintCommand::Snapshot { resp } => {
                let _ = resp.send(EngineSnapshot {
                    state: engine.state().clone(),
                    active: active.clone(),
                    pending_save: engine.has_pending_save(),
                });
            }
        }
    }

    if !engine.flush() {
        tracing::warn!("Engine stopped with unsaved learning state");
    }
    engine
}
