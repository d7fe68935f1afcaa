//! # 送信対象メッセージ
//!
//! トランスポートに渡される、組み立て済みのメールメッセージを抽象化する。
//!
//! ## 設計方針
//!
//! - **読み取り専用**: トランスポートはメッセージを読むだけで変更しない
//! - **2 つの実装**: 事前レンダリング済みの [`RawEmail`] と `lettre::Message`
//! - **失敗は呼び出し元の責務**: 送信元の解決や本文のシリアライズに失敗した場合は
//!   [`MessageError`] を返し、トランスポートはそのまま伝播する

use thiserror::Error;

/// メッセージの読み取りに失敗したことを表すエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessageError {
    /// エンベロープ送信元が存在しない、または空
    #[error("エンベロープ送信元が解決できません")]
    MissingSender,

    /// その他のシリアライズ失敗
    #[error("メッセージのシリアライズに失敗: {0}")]
    Serialization(String),
}

/// 送信対象メッセージ
///
/// 完成済みのメールを表す外部協調者。
/// トランスポートは送信元アドレスと Raw 形式の本文だけを必要とする。
pub trait OutboundMessage: Send + Sync {
    /// エンベロープ送信元アドレスを返す
    ///
    /// 配送に使われるアドレスであり、`From` ヘッダーと一致するとは限らない。
    fn envelope_sender(&self) -> Result<String, MessageError>;

    /// メッセージ全体を MIME 形式のバイト列にシリアライズする
    ///
    /// 8bit の本文を含む場合があり、UTF-8 であるとは限らない。
    fn to_raw(&self) -> Result<Vec<u8>, MessageError>;
}

/// レンダリング済みの Raw メール
///
/// テンプレートエンジンや外部システムが生成した MIME をそのまま送る場合に使う。
/// `.eml` ファイルの読み込み結果も、文字コードを問わずそのまま渡せる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEmail {
    sender: String,
    raw:    Vec<u8>,
}

impl RawEmail {
    /// 送信元と MIME 本文から作成する
    pub fn new(sender: impl Into<String>, raw: impl Into<Vec<u8>>) -> Self {
        Self {
            sender: sender.into(),
            raw:    raw.into(),
        }
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }
}

impl OutboundMessage for RawEmail {
    fn envelope_sender(&self) -> Result<String, MessageError> {
        if self.sender.trim().is_empty() {
            return Err(MessageError::MissingSender);
        }
        Ok(self.sender.clone())
    }

    fn to_raw(&self) -> Result<Vec<u8>, MessageError> {
        Ok(self.raw.clone())
    }
}

impl OutboundMessage for lettre::Message {
    fn envelope_sender(&self) -> Result<String, MessageError> {
        self.envelope()
            .from()
            .map(ToString::to_string)
            .filter(|address| !address.is_empty())
            .ok_or(MessageError::MissingSender)
    }

    fn to_raw(&self) -> Result<Vec<u8>, MessageError> {
        Ok(self.formatted())
    }
}
