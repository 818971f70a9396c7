//! RunRoutine - ループ本体（WorkerLoop の task 上で動く）
//!
//! # フロー（1 iteration）
//! 1. 停止要求 / iteration 上限を確認
//! 2. ペーシング（max_rate があれば tick を待つ、なければ yield）
//! 3. step() -> queue に push
//! 4. step が失敗したら handle_error() に判断を委ねる
//! 5. queue を空になるまで drain して consumer に渡す
//!
//! ループを抜けたら最後にもう一度 drain し、Terminated に遷移する。

use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, error, info, trace, warn};

use super::config::LoopConfig;
use super::stop_handle::{StopHandle, TerminateOnExit};
use crate::domain::LoopState;
use crate::error::{FatalCause, LoopError};
use crate::observability::{LoopCounters, LoopStats};
use crate::ports::{Consumer, LoopBody};
use crate::queue::HandoffQueue;

pub(crate) struct RunRoutine<B: LoopBody> {
    pub(crate) body: B,
    pub(crate) consumer: Consumer<B::Item>,
    pub(crate) queue: Arc<HandoffQueue<B::Item>>,
    pub(crate) control: StopHandle,
    pub(crate) counters: Arc<LoopCounters>,
    pub(crate) config: LoopConfig,
}

impl<B: LoopBody> RunRoutine<B> {
    pub(crate) async fn run(mut self) -> Result<LoopStats, LoopError> {
        let _terminate = TerminateOnExit(self.control.clone());
        let mut stop_rx = self.control.subscribe();
        let mut ticker = self.config.iteration_period().map(|period| {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        info!("starting the loop");

        let fatal = loop {
            if self.iteration_limit_reached() {
                self.control.request_stop();
            }
            if self.control.is_stop_requested() {
                break None;
            }

            if !pace(ticker.as_mut(), &mut stop_rx).await {
                continue;
            }

            let iteration = self.counters.record_iteration();
            trace!(iteration, "step");

            match self.body.step().await {
                Ok(item) => {
                    if let Err(cause) = self.enqueue(item) {
                        break Some(cause);
                    }
                }
                Err(fault) => {
                    let message = fault.to_string();
                    match self.body.handle_error(fault).await {
                        Ok(()) => {
                            self.counters.record_recovery();
                            warn!(iteration, error = %message, "recovered from step fault");
                        }
                        Err(fault) => {
                            error!(iteration, error = %fault, "step fault escalated");
                            break Some(FatalCause::Step(fault));
                        }
                    }
                }
            }

            if let Err(cause) = self.drain() {
                break Some(cause);
            }
        };

        let iterations = self.counters.iterations();
        match fatal {
            None => {
                debug!("stop observed, final drain");
                if let Err(cause) = self.drain() {
                    error!(iterations, error = %cause, "final drain failed");
                    return Err(LoopError::fatal(iterations, cause));
                }
            }
            Some(cause @ FatalCause::Step(_)) => {
                // 既に queue にある item は consumer に届ける
                if let Err(late) = self.drain() {
                    error!(error = %late, "final drain failed after step fault");
                }
                return Err(LoopError::fatal(iterations, cause));
            }
            Some(cause) => {
                error!(iterations, error = %cause, "loop terminated by fatal fault");
                return Err(LoopError::fatal(iterations, cause));
            }
        }

        let stats = self.counters.snapshot();
        info!(
            iterations = stats.iterations,
            delivered = stats.delivered,
            recovered_faults = stats.recovered_faults,
            "loop terminated"
        );
        Ok(stats)
    }

    fn iteration_limit_reached(&self) -> bool {
        self.config
            .max_iterations
            .is_some_and(|limit| self.counters.iterations() >= limit)
    }

    /// Push one produced item. On a full bounded queue, drain first and retry.
    fn enqueue(&mut self, item: B::Item) -> Result<(), FatalCause> {
        let mut item = item;
        loop {
            match self.queue.push(item) {
                Ok(()) => return Ok(()),
                Err(full) => {
                    debug!(capacity = full.capacity, "handoff queue full, draining before push");
                    item = full.into_inner();
                    self.drain()?;
                }
            }
        }
    }

    /// Empty the queue into the consumer, in FIFO order.
    fn drain(&mut self) -> Result<(), FatalCause> {
        let mut drained = 0usize;
        while let Some(item) = self.queue.try_pop() {
            self.body
                .consume(item, &mut self.consumer)
                .map_err(FatalCause::Consume)?;
            self.counters.record_delivery();
            drained += 1;
        }
        if drained > 0 {
            trace!(drained, "drained handoff queue");
        }
        Ok(())
    }
}

/// Wait for the next pacing tick. `false` if a stop arrived first.
async fn pace(ticker: Option<&mut Interval>, stop_rx: &mut watch::Receiver<LoopState>) -> bool {
    let Some(ticker) = ticker else {
        // 常に ready な step が runtime を占有しないように
        tokio::task::yield_now().await;
        return true;
    };
    tokio::select! {
        _ = ticker.tick() => true,
        _ = StopHandle::stop_requested(stop_rx) => false,
    }
}
