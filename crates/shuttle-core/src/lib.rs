//! shuttle-core
//!
//! A single-process worker loop primitive: run a unit of work repeatedly on
//! its own task, hand each result through a FIFO to a consumer, and let a
//! per-fault policy decide whether the loop keeps going.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（LoopId, LoopState）
//! - **ports**: 注入する capability（LoopBody, Consumer）
//! - **app**: WorkerLoop 本体（config, stop handle, run routine）
//! - **queue**: HandoffQueue（Mutex + Condvar の FIFO）
//! - **impls**: 実装（FnBody）
//! - error / observability: エラー型とレポート

pub mod app;
pub mod domain;
pub mod error;
pub mod impls;
pub mod observability;
pub mod ports;
pub mod queue;

pub use app::{LoopConfig, StopHandle, WorkerLoop};
pub use domain::{LoopId, LoopState};
pub use error::{FatalCause, Fault, LoopError};
pub use impls::FnBody;
pub use observability::{LoopReport, LoopStats};
pub use ports::{Consumer, LoopBody};
pub use queue::{HandoffQueue, QueueFull};
