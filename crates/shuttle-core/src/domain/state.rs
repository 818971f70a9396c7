//! State - WorkerLoop のライフサイクル状態

use serde::{Deserialize, Serialize};

/// Lifecycle state of a `WorkerLoop`.
///
/// State transitions:
/// - Idle -> SettingUp -> Running          (`start`, setup succeeded)
/// - Idle -> SettingUp -> Idle             (`start`, setup failed)
/// - Running -> StopRequested              (`request_stop`, any thread)
/// - StopRequested -> Terminated           (final drain complete)
/// - Running -> Terminated                 (fatal fault)
///
/// `Terminated` is absorbing: a loop is never restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    /// Constructed, not started yet.
    Idle,

    /// `setup` is running on the caller's task.
    SettingUp,

    /// The run routine is iterating.
    Running,

    /// A stop was requested; the run routine has not observed it yet.
    StopRequested,

    /// The run routine has exited.
    Terminated,
}

impl LoopState {
    /// Is this the absorbing state?
    pub fn is_terminal(self) -> bool {
        matches!(self, LoopState::Terminated)
    }

    /// Has the run routine been launched (and possibly finished)?
    pub fn is_launched(self) -> bool {
        matches!(
            self,
            LoopState::Running | LoopState::StopRequested | LoopState::Terminated
        )
    }

    /// Can `start` be called from this state?
    pub fn can_start(self) -> bool {
        matches!(self, LoopState::Idle)
    }
}

impl std::fmt::Display for LoopState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            LoopState::Idle => "idle",
            LoopState::SettingUp => "setting_up",
            LoopState::Running => "running",
            LoopState::StopRequested => "stop_requested",
            LoopState::Terminated => "terminated",
        };
        f.write_str(label)
    }
}
