//! WorkerLoop - step を繰り返し実行し、結果を consumer に流すループ
//!
//! # 学習ポイント
//! - 起動時検証（setup が false なら task を起動しない: Fail-closed）
//! - watch channel による状態共有と協調的キャンセル
//! - JoinHandle 経由で fatal fault / panic を呼び出し側に返す
//!
//! # ライフサイクル
//! Idle -> SettingUp -> Running -> StopRequested -> Terminated
//!
//! 一度 Terminated になったインスタンスは再起動できない（新しく作り直す）。

use std::any::Any;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, warn};

use super::config::LoopConfig;
use super::run_routine::RunRoutine;
use super::stop_handle::{SetupGuard, StopHandle};
use crate::domain::{LoopId, LoopState};
use crate::error::{FatalCause, LoopError};
use crate::observability::{LoopCounters, LoopReport, LoopStats};
use crate::ports::{Consumer, LoopBody};
use crate::queue::HandoffQueue;

/// Body and consumer waiting for `start` to move them onto the run task.
struct Pending<B: LoopBody> {
    body: B,
    consumer: Consumer<B::Item>,
}

/// Runs a [`LoopBody`] repeatedly on its own tokio task.
///
/// # 使用例
/// ```ignore
/// let mut worker = WorkerLoop::with_consumer(Poller::new(sensor), Consumer::infallible(|r| sink.write(r)))
///     .with_config(LoopConfig::paced("poller"));
/// worker.start().await?;
/// // ...
/// let report = worker.stop_and_join().await?;
/// ```
///
/// # Guarantees
/// - Every produced item reaches the consumer exactly once, in FIFO order,
///   including items still queued when a stop is observed.
/// - Faults from the run routine (escalated step faults, consumer faults,
///   panics) are returned from [`join`](Self::join), never discarded.
pub struct WorkerLoop<B: LoopBody> {
    id: LoopId,
    config: LoopConfig,
    pending: Option<Pending<B>>,
    queue: Arc<HandoffQueue<B::Item>>,
    control: StopHandle,
    counters: Arc<LoopCounters>,
    started_at: Option<DateTime<Utc>>,
    join: Option<JoinHandle<Result<LoopStats, LoopError>>>,
}

impl<B: LoopBody> WorkerLoop<B> {
    /// Loop whose items are logged through `tracing` (see [`Consumer::trace`]).
    pub fn new(body: B) -> Self
    where
        B::Item: fmt::Debug,
    {
        Self::with_consumer(body, Consumer::trace())
    }

    pub fn with_consumer(body: B, consumer: Consumer<B::Item>) -> Self {
        let config = LoopConfig::default();
        Self {
            id: LoopId::generate(),
            queue: Arc::new(queue_for(&config)),
            config,
            pending: Some(Pending { body, consumer }),
            control: StopHandle::new(),
            counters: Arc::new(LoopCounters::default()),
            started_at: None,
            join: None,
        }
    }

    /// Replace the configuration. Reallocates the (still empty) queue so the
    /// capacity setting takes effect.
    pub fn with_config(mut self, config: LoopConfig) -> Self {
        self.queue = Arc::new(queue_for(&config));
        self.config = config;
        self
    }

    pub fn id(&self) -> LoopId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    pub fn state(&self) -> LoopState {
        self.control.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<LoopState> {
        self.control.subscribe()
    }

    /// A cloneable handle other threads can use to stop or watch this loop.
    pub fn stop_handle(&self) -> StopHandle {
        self.control.clone()
    }

    pub fn stats(&self) -> LoopStats {
        self.counters.snapshot()
    }

    /// Items produced but not yet handed to the consumer. Read-only.
    pub fn backlog(&self) -> usize {
        self.queue.len()
    }

    /// Run `setup` on the caller's task, then launch the run routine.
    ///
    /// Returns as soon as the routine is spawned. If `setup` reports failure
    /// the loop stays `Idle` and nothing is spawned. Dropping the returned
    /// future while `setup` is pending also leaves the loop `Idle`, and
    /// `start` may be called again.
    ///
    /// Must be called within a tokio runtime.
    pub async fn start(&mut self) -> Result<(), LoopError> {
        let state = self.control.state();
        if !state.can_start() {
            return Err(LoopError::AlreadyStarted(state));
        }
        // setup は pending の中で走らせる（start が drop されても body を失わない）
        let Some(pending) = self.pending.as_mut() else {
            return Err(LoopError::AlreadyStarted(state));
        };
        let guard = SetupGuard::new(self.control.clone());
        if !pending.body.setup().await {
            drop(guard);
            warn!(loop_id = %self.id, name = %self.config.name, "setup failed, loop did not start");
            return Err(LoopError::SetupFailed);
        }
        let Some(Pending { body, consumer }) = self.pending.take() else {
            return Err(LoopError::AlreadyStarted(state));
        };

        let routine = RunRoutine {
            body,
            consumer,
            queue: Arc::clone(&self.queue),
            control: self.control.clone(),
            counters: Arc::clone(&self.counters),
            config: self.config.clone(),
        };
        let span = tracing::info_span!("worker_loop", loop_id = %self.id, name = %self.config.name);

        self.control.set(LoopState::Running);
        guard.launched();
        self.started_at = Some(Utc::now());
        self.join = Some(tokio::spawn(routine.run().instrument(span)));
        info!(loop_id = %self.id, name = %self.config.name, "loop started");
        Ok(())
    }

    /// Ask the run routine to stop after its current iteration. Never blocks.
    ///
    /// Returns `true` if this call moved the loop out of `Running`.
    pub fn request_stop(&self) -> bool {
        self.control.request_stop()
    }

    /// Wait for the run routine to exit and collect its outcome.
    pub async fn join(&mut self) -> Result<LoopReport, LoopError> {
        let handle = self.join.take().ok_or(LoopError::NotStarted)?;

        let stats = match handle.await {
            Ok(outcome) => outcome?,
            Err(e) => {
                let cause = if e.is_panic() {
                    FatalCause::Panicked(panic_message(e.into_panic()))
                } else {
                    FatalCause::Aborted
                };
                let iterations = self.counters.iterations();
                error!(loop_id = %self.id, iterations, error = %cause, "run routine died");
                return Err(LoopError::fatal(iterations, cause));
            }
        };

        Ok(LoopReport {
            loop_id: self.id,
            name: self.config.name.clone(),
            stats,
            started_at: self.started_at.unwrap_or_else(Utc::now),
            finished_at: Utc::now(),
        })
    }

    /// `request_stop` followed by `join`.
    pub async fn stop_and_join(&mut self) -> Result<LoopReport, LoopError> {
        self.request_stop();
        self.join().await
    }
}

impl<B: LoopBody> Drop for WorkerLoop<B> {
    fn drop(&mut self) {
        // join されずに捨てられたら止めておく（結果は観測できない）
        if self.state().is_launched() && self.control.request_stop() {
            debug!(loop_id = %self.id, "worker loop dropped while running, stop requested");
        }
    }
}

impl<B: LoopBody> fmt::Debug for WorkerLoop<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerLoop")
            .field("id", &self.id)
            .field("name", &self.config.name)
            .field("state", &self.state())
            .field("backlog", &self.backlog())
            .finish()
    }
}

fn queue_for<T>(config: &LoopConfig) -> HandoffQueue<T> {
    HandoffQueue::with_capacity(config.queue_capacity.map(NonZeroUsize::get))
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
