//! Domain model (loop identity and lifecycle state).

pub mod ids;
pub mod state;

pub use ids::LoopId;
pub use state::LoopState;
