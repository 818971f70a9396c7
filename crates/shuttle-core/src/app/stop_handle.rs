//! StopHandle - 別スレッドからの停止要求と状態の観測

use std::sync::Arc;

use tokio::sync::watch;

use crate::domain::LoopState;

/// Cloneable control over one loop's lifecycle state.
///
/// - `request_stop()` は Running -> StopRequested の条件付き遷移だけを行う
/// - ループ側は iteration の先頭でこれを観測する（協調的キャンセル）
/// - 状態の変化は `subscribe()` で待てる
#[derive(Debug, Clone)]
pub struct StopHandle {
    state: Arc<watch::Sender<LoopState>>,
}

impl StopHandle {
    pub(crate) fn new() -> Self {
        let (state, _) = watch::channel(LoopState::Idle);
        Self {
            state: Arc::new(state),
        }
    }

    /// Ask the run routine to stop after its current iteration.
    ///
    /// Never blocks. Returns `true` if this call moved the loop from
    /// `Running` to `StopRequested`; any other state is left untouched.
    pub fn request_stop(&self) -> bool {
        let requested = self.state.send_if_modified(|state| {
            if *state == LoopState::Running {
                *state = LoopState::StopRequested;
                true
            } else {
                false
            }
        });
        if requested {
            tracing::debug!("stop requested");
        }
        requested
    }

    pub fn state(&self) -> LoopState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<LoopState> {
        self.state.subscribe()
    }

    /// Resolve once the run routine has exited.
    ///
    /// Never resolves for a loop that is never started.
    pub async fn wait_terminated(&self) {
        let mut rx = self.subscribe();
        // Sender は self が持っているので closed にはならない
        let _ = rx.wait_for(|state| state.is_terminal()).await;
    }

    pub(crate) fn is_stop_requested(&self) -> bool {
        self.state() == LoopState::StopRequested
    }

    pub(crate) fn set(&self, next: LoopState) {
        self.state.send_replace(next);
    }

    /// Resolve when a stop has been requested.
    pub(crate) async fn stop_requested(rx: &mut watch::Receiver<LoopState>) {
        let _ = rx
            .wait_for(|state| *state == LoopState::StopRequested)
            .await;
    }
}

/// Marks the loop `Terminated` when the run routine exits, including by panic.
pub(crate) struct TerminateOnExit(pub(crate) StopHandle);

impl Drop for TerminateOnExit {
    fn drop(&mut self) {
        self.0.set(LoopState::Terminated);
    }
}

/// Puts the loop back to `Idle` unless `start` gets as far as launching.
///
/// `start` の future が setup 中に drop されても SettingUp に取り残されない
pub(crate) struct SetupGuard(Option<StopHandle>);

impl SetupGuard {
    pub(crate) fn new(control: StopHandle) -> Self {
        control.set(LoopState::SettingUp);
        Self(Some(control))
    }

    pub(crate) fn launched(mut self) {
        self.0 = None;
    }
}

impl Drop for SetupGuard {
    fn drop(&mut self) {
        if let Some(control) = self.0.take() {
            control.set(LoopState::Idle);
        }
    }
}
