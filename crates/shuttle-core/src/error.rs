use thiserror::Error;

use crate::domain::LoopState;

/// A fault raised by user code (`step`, `handle_error`, the consumer).
pub type Fault = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Why the run routine died.
#[derive(Debug, Error)]
pub enum FatalCause {
    /// `step` faulted and `handle_error` escalated it.
    #[error("step fault escalated: {0}")]
    Step(#[source] Fault),

    /// The consumer (or a `consume` override) faulted. Never routed to `handle_error`.
    #[error("consumer fault: {0}")]
    Consume(#[source] Fault),

    #[error("run routine panicked: {0}")]
    Panicked(String),

    #[error("run routine was aborted")]
    Aborted,
}

#[derive(Debug, Error)]
pub enum LoopError {
    #[error("initialization failed, loop did not start")]
    SetupFailed,

    #[error("loop cannot be started from state {0}")]
    AlreadyStarted(LoopState),

    #[error("loop has no run routine to join")]
    NotStarted,

    #[error("loop terminated unexpectedly after {iterations} iterations: {cause}")]
    Fatal {
        iterations: u64,
        #[source]
        cause: FatalCause,
    },
}

impl LoopError {
    pub(crate) fn fatal(iterations: u64, cause: FatalCause) -> Self {
        LoopError::Fatal { iterations, cause }
    }

    /// The cause if this is a fatal run-routine termination.
    pub fn fatal_cause(&self) -> Option<&FatalCause> {
        match self {
            LoopError::Fatal { cause, .. } => Some(cause),
            _ => None,
        }
    }
}
