//! # メール送信トランスポート
//!
//! 組み立て済みのメッセージをプロバイダへ渡すトランスポートの抽象。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `MailTransport` で送信手段を抽象化する
//! - **識別文字列**: `Display` でトランスポートを識別する（ログ・デバッグ用）
//! - **リトライしない**: 再送やキューイングは呼び出し側の責務

mod ses;

use std::fmt;

use async_trait::async_trait;
pub use ses::SesTransport;
use sesmail_domain::OutboundMessage;

use crate::error::SendError;

/// メール送信トランスポート
///
/// メッセージの組み立てや宛先検証は行わず、完成済みのメッセージを送信するだけ。
#[async_trait]
pub trait MailTransport: Send + Sync + fmt::Display {
    /// メッセージを送信する
    ///
    /// 成功時は何も返さない。プロバイダの失敗は [`SendError::Transport`]、
    /// メッセージの読み取り失敗は [`SendError::Message`] になる。
    async fn send(&self, message: &dyn OutboundMessage) -> Result<(), SendError>;
}
