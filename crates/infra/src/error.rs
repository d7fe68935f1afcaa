//! # 送信エラー定義
//!
//! トランスポートの `send` が返すエラーを表現する。
//!
//! ## 設計方針
//!
//! - **プロバイダ失敗のみ変換**: SES 呼び出しの失敗は [`TransportSendFailure`] に包む
//! - **メッセージ失敗はそのまま**: シリアライズや送信元解決の失敗は
//!   [`MessageError`] のまま呼び出し元に返す
//! - **原因を保持**: 元のプロバイダエラーは `source()` で辿れる
//! - **SpanTrace 自動捕捉**: 失敗を生成した時点の呼び出し経路を記録する
//!
//! ## 構造
//!
//! `std::io::Error` と同じ struct + enum パターンを採用:
//! - [`SendError`]: 送信結果のエラー種別
//! - [`TransportSendFailure`]: 固定メッセージ、エラーコード、原因、[`SpanTrace`] を保持する

use std::fmt;

use derive_more::Display;
use sesmail_domain::MessageError;
use thiserror::Error;
use tracing_error::SpanTrace;

use crate::ses::ProviderError;

/// SES 呼び出し失敗時の固定メッセージ
pub const SES_REQUEST_FAILED: &str = "AWS SES API へのリクエストに失敗しました";

/// `send` の失敗
#[derive(Debug, Error)]
pub enum SendError {
    /// 送信前のメッセージ読み取りで失敗（変換せずに伝播）
    #[error(transparent)]
    Message(#[from] MessageError),

    /// プロバイダ呼び出しで失敗
    #[error(transparent)]
    Transport(#[from] TransportSendFailure),
}

impl SendError {
    /// Transport バリアントの場合、その失敗を返す
    pub fn as_transport(&self) -> Option<&TransportSendFailure> {
        match self {
            Self::Transport(failure) => Some(failure),
            Self::Message(_) => None,
        }
    }
}

/// プロバイダ呼び出しの失敗を変換したエラー
///
/// メッセージはプロバイダ統合を識別する固定文字列。
/// エラーコードはプロバイダエラーからコピーし、元のエラーは原因として連鎖させる。
#[derive(Display)]
#[display("{message}")]
pub struct TransportSendFailure {
    message:    &'static str,
    code:       Option<String>,
    source:     ProviderError,
    span_trace: SpanTrace,
}

impl TransportSendFailure {
    /// 固定メッセージとプロバイダエラーから生成する
    pub fn new(message: &'static str, source: ProviderError) -> Self {
        Self {
            message,
            code: source.code().map(str::to_owned),
            source,
            span_trace: SpanTrace::capture(),
        }
    }

    /// SES 呼び出しの失敗を生成する
    pub fn ses(source: ProviderError) -> Self {
        Self::new(SES_REQUEST_FAILED, source)
    }

    pub fn message(&self) -> &str {
        self.message
    }

    /// プロバイダが返したエラーコード
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// 原因となったプロバイダエラー
    pub fn provider_error(&self) -> &ProviderError {
        &self.source
    }

    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }
}

impl fmt::Debug for TransportSendFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportSendFailure")
            .field("message", &self.message)
            .field("code", &self.code)
            .field("source", &self.source)
            .field("span_trace", &self.span_trace)
            .finish()
    }
}

impl std::error::Error for TransportSendFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}
