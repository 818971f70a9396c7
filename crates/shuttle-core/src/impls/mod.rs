//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **FnBody**: クロージャで組み立てる LoopBody

pub mod fn_body;

pub use self::fn_body::FnBody;
