//! # sesmail インフラ層
//!
//! Amazon SES との通信を担当するインフラストラクチャ層。
//!
//! ## 設計方針
//!
//! このクレートはメール送信トランスポートの具体的な実装を提供する。
//! プロバイダ SDK の詳細は [`ses::SesClient`] トレイトの裏にカプセル化し、
//! トランスポートはトレイト経由でのみプロバイダを呼び出す。
//!
//! ## 責務
//!
//! - **プロバイダクライアント**: `aws-sdk-sesv2` のラップと Raw 送信ペイロードの変換
//! - **トランスポート**: 組み立て済みメッセージのシリアライズと送信、エラーの変換
//!
//! ## モジュール構成
//!
//! - [`error`] - 送信エラー定義
//! - [`ses`] - SES クライアントのインターフェースと AWS 実装
//! - [`transport`] - メール送信トランスポート
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use sesmail_domain::RawEmail;
//! use sesmail_infra::{
//!     ses::{self, SesSettings},
//!     transport::{MailTransport, SesTransport},
//! };
//!
//! async fn run() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ses::create_client(&SesSettings::new("us-east-1")).await;
//!     let transport = SesTransport::new(Arc::new(client));
//!
//!     let email = RawEmail::new("a@example.com", "Subject: hi\r\n\r\nbody");
//!     transport.send(&email).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod ses;
pub mod transport;

pub use error::{SendError, TransportSendFailure};
pub use ses::{AwsSesClient, ClientConfiguration, ProviderError, SesClient};
pub use transport::{MailTransport, SesTransport};
