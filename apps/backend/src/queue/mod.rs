//! Per-session ordered trigger delivery.
//!
//! `SessionQueue` keeps one FIFO lane per session; a lane task handles its
//! triggers one at a time, so at most one trigger per session is in flight
//! while different sessions run in parallel. Idle lanes retire themselves.
//! `ManualQueue` is a plain FIFO that the caller drains step by step.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use time::OffsetDateTime;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::{SessionId, TurnTrigger};
use crate::errors::domain::{DomainError, InfraErrorKind};

/// Where runs schedule follow-up work.
#[async_trait]
pub trait TriggerSink: Send + Sync {
    async fn enqueue(&self, trigger: TurnTrigger) -> Result<(), DomainError>;
}

/// What a queue delivers triggers to.
#[async_trait]
pub trait TriggerHandler: Send + Sync {
    async fn handle_trigger(&self, trigger: TurnTrigger) -> Result<(), DomainError>;
}

/// A trigger whose handling failed.
#[derive(Debug, Clone)]
pub struct DeadLetter {
    pub trigger: TurnTrigger,
    pub kind: String,
    pub cause: String,
    pub failed_at: OffsetDateTime,
}

struct Lane {
    tx: mpsc::UnboundedSender<TurnTrigger>,
    pending: Arc<AtomicUsize>,
}

pub struct SessionQueue {
    me: Weak<SessionQueue>,
    lanes: DashMap<SessionId, Lane>,
    handler: OnceCell<Weak<dyn TriggerHandler>>,
    dead_letters: Mutex<VecDeque<DeadLetter>>,
    dead_letter_capacity: usize,
    idle_timeout: Duration,
    shutdown: CancellationToken,
}

impl SessionQueue {
    pub fn new(idle_timeout: Duration, dead_letter_capacity: usize) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            lanes: DashMap::new(),
            handler: OnceCell::new(),
            dead_letters: Mutex::new(VecDeque::new()),
            dead_letter_capacity: dead_letter_capacity.max(1),
            idle_timeout,
            shutdown: CancellationToken::new(),
        })
    }

    /// Attach the consumer. The queue holds it weakly; the owner keeps it alive.
    pub fn bind(&self, handler: &Arc<dyn TriggerHandler>) -> Result<(), DomainError> {
        self.handler.set(Arc::downgrade(handler)).map_err(|_| {
            DomainError::infra(
                InfraErrorKind::Other("Queue".into()),
                "queue handler already bound",
            )
        })
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Triggers accepted but not yet finished, across all sessions.
    pub fn in_flight(&self) -> usize {
        self.lanes
            .iter()
            .map(|lane| lane.pending.load(Ordering::Acquire))
            .sum()
    }

    pub fn active_lanes(&self) -> usize {
        self.lanes.len()
    }

    pub fn dead_letters(&self) -> Vec<DeadLetter> {
        self.dead_letters.lock().iter().cloned().collect()
    }

    fn record_dead_letter(&self, trigger: TurnTrigger, err: &DomainError) {
        let mut letters = self.dead_letters.lock();
        if letters.len() >= self.dead_letter_capacity {
            letters.pop_front();
        }
        letters.push_back(DeadLetter {
            trigger,
            kind: err.code().as_str().to_string(),
            cause: err.cause().to_string(),
            failed_at: OffsetDateTime::now_utc(),
        });
    }

    fn spawn_lane(&self, session_id: SessionId) -> Result<Lane, DomainError> {
        let queue = self.me.upgrade().ok_or_else(|| {
            DomainError::infra(InfraErrorKind::Other("Queue".into()), "queue dropped")
        })?;
        let (tx, rx) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));
        debug!(session_id = %session_id, "opening session lane");
        tokio::spawn(run_lane(queue, session_id, rx, pending.clone()));
        Ok(Lane { tx, pending })
    }

    async fn deliver(&self, trigger: TurnTrigger) {
        let handler = self.handler.get().and_then(Weak::upgrade);
        let result = match handler {
            Some(handler) => handler.handle_trigger(trigger.clone()).await,
            None => Err(DomainError::infra(
                InfraErrorKind::Other("Queue".into()),
                "no trigger handler bound",
            )),
        };
        if let Err(err) = result {
            warn!(
                trigger = trigger.kind(),
                code = %err.code(),
                error = %err,
                "trigger failed, dead-lettered"
            );
            self.record_dead_letter(trigger, &err);
        }
    }
}

async fn run_lane(
    queue: Arc<SessionQueue>,
    session_id: SessionId,
    mut rx: mpsc::UnboundedReceiver<TurnTrigger>,
    pending: Arc<AtomicUsize>,
) {
    let shutdown = queue.shutdown.clone();
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!(session_id = %session_id, "session lane stopped by shutdown");
                break;
            }
            next = tokio::time::timeout(queue.idle_timeout, rx.recv()) => match next {
                Ok(Some(trigger)) => {
                    queue.deliver(trigger).await;
                    pending.fetch_sub(1, Ordering::AcqRel);
                }
                Ok(None) => break,
                Err(_) => {
                    // Retire only if nothing was enqueued meanwhile; enqueue holds
                    // the same map entry while it bumps `pending`.
                    let retired = queue
                        .lanes
                        .remove_if(&session_id, |_, lane| {
                            Arc::ptr_eq(&lane.pending, &pending)
                                && lane.pending.load(Ordering::Acquire) == 0
                        })
                        .is_some();
                    if retired {
                        debug!(session_id = %session_id, "session lane idle, retired");
                        break;
                    }
                }
            }
        }
    }
}

#[async_trait]
impl TriggerSink for SessionQueue {
    async fn enqueue(&self, trigger: TurnTrigger) -> Result<(), DomainError> {
        if self.shutdown.is_cancelled() {
            return Err(DomainError::infra(
                InfraErrorKind::Other("Queue".into()),
                "queue is shut down",
            ));
        }
        let session_id = trigger.session_id()?;
        let mut trigger = trigger;
        loop {
            let lane = match self.lanes.entry(session_id.clone()) {
                dashmap::mapref::entry::Entry::Occupied(e) => e.into_ref(),
                dashmap::mapref::entry::Entry::Vacant(v) => {
                    v.insert(self.spawn_lane(session_id.clone())?)
                }
            };
            lane.pending.fetch_add(1, Ordering::AcqRel);
            match lane.tx.send(trigger) {
                Ok(()) => return Ok(()),
                Err(mpsc::error::SendError(returned)) => {
                    // Lane task ended (shutdown); drop it and open a fresh one.
                    lane.pending.fetch_sub(1, Ordering::AcqRel);
                    drop(lane);
                    self.lanes.remove(&session_id);
                    if self.shutdown.is_cancelled() {
                        return Err(DomainError::infra(
                            InfraErrorKind::Other("Queue".into()),
                            "queue is shut down",
                        ));
                    }
                    trigger = returned;
                }
            }
        }
    }
}

/// Caller-driven FIFO for tests and the simulator.
#[derive(Debug, Default)]
pub struct ManualQueue {
    pending: Mutex<VecDeque<TurnTrigger>>,
}

/// Result of draining a `ManualQueue`.
#[derive(Debug, Default)]
pub struct DrainReport {
    pub processed: usize,
    pub failures: Vec<(TurnTrigger, DomainError)>,
}

impl ManualQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    pub fn pop(&self) -> Option<TurnTrigger> {
        self.pending.lock().pop_front()
    }

    pub fn take_all(&self) -> Vec<TurnTrigger> {
        self.pending.lock().drain(..).collect()
    }

    /// Deliver queued triggers (including ones scheduled while draining)
    /// until the queue is empty or `max_steps` triggers were handled.
    pub async fn drain_with(&self, handler: &dyn TriggerHandler, max_steps: usize) -> DrainReport {
        let mut report = DrainReport::default();
        while report.processed < max_steps {
            let Some(trigger) = self.pop() else { break };
            report.processed += 1;
            if let Err(err) = handler.handle_trigger(trigger.clone()).await {
                report.failures.push((trigger, err));
            }
        }
        report
    }
}

#[async_trait]
impl TriggerSink for ManualQueue {
    async fn enqueue(&self, trigger: TurnTrigger) -> Result<(), DomainError> {
        self.pending.lock().push_back(trigger);
        Ok(())
    }
}
