//! Ports - 抽象化レイヤー
//!
//! WorkerLoop に外から注入する capability を定義します。
//! - **LoopBody**: setup / step / handle_error（と任意の consume フック）
//! - **Consumer**: drain された item の受け取り先

pub mod body;
pub mod consumer;

pub use self::body::LoopBody;
pub use self::consumer::Consumer;
