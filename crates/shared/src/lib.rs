//! # sesmail 共有ユーティリティ
//!
//! ワークスペース全体で使用する共通ユーティリティを提供する。
//!
//! ## 設計方針
//!
//! - 送信ロジックを含まない純粋なユーティリティのみを配置
//! - 外部クレートへの依存は feature で必要な分だけ有効化する

pub mod observability;

pub use observability::{LogFormat, TracingConfig};
