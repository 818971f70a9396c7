//! App - アプリケーション層
//!
//! ports（LoopBody, Consumer）と queue を組み合わせてループを動かします。
//!
//! # 主要コンポーネント
//! - **WorkerLoop**: ライフサイクル管理と起動・停止・join
//! - **RunRoutine**: step -> push -> drain を繰り返すループ本体
//! - **StopHandle**: 別スレッドからの停止要求と状態の観測
//! - **LoopConfig**: 名前、ペーシング、iteration 上限、queue 容量

pub mod config;
mod run_routine;
pub mod stop_handle;
pub mod worker_loop;

// 主要な型を再エクスポート
pub use self::config::LoopConfig;
pub use self::stop_handle::StopHandle;
pub use self::worker_loop::WorkerLoop;
