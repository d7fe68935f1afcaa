//! # sesmail ドメイン層
//!
//! メール送信トランスポートが扱う値を定義する。
//!
//! ## 設計方針
//!
//! - **メッセージは外部協調者**: 本文の組み立て（ヘッダー、MIME
//!   パート、添付）はこのクレートの外で行われる。ここでは送信に必要な
//!   「エンベロープ送信元」と「シリアライズ済み本文」だけを取り出す
//! - **トランスポートオプション**: プロバイダ呼び出しに渡す追加フィールドを
//!   文字列キーのマップとして表現する
//!
//! ## 依存関係の方向
//!
//! ```text
//! cli → infra → domain
//!   ↘     ↓
//!      shared
//! ```
//!
//! ## モジュール構成
//!
//! - [`message`] - 送信対象メッセージの抽象とエラー
//! - [`options`] - プロバイダ呼び出しオプションと予約キー
//!
//! ## 使用例
//!
//! ```rust
//! use sesmail_domain::message::{OutboundMessage, RawEmail};
//!
//! let email = RawEmail::new("a@example.com", "Subject: hi\r\n\r\nbody");
//! assert_eq!(email.envelope_sender().unwrap(), "a@example.com");
//! ```

pub mod message;
pub mod options;

pub use message::{MessageError, OutboundMessage, RawEmail};
pub use options::TransportOptions;
