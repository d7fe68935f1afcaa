//! # テスト用モック SES クライアント
//!
//! トランスポートのテストで使用するインメモリの [`SesClient`] 実装。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! sesmail-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sesmail_domain::TransportOptions;

use crate::ses::{ClientConfiguration, ProviderError, SendRawEmailOutput, SesClient};

/// 送信ペイロードを記録するモック
///
/// [`fail_with`](MockSesClient::fail_with) で失敗を仕込むと、以降の送信はすべて失敗する。
#[derive(Clone, Default)]
pub struct MockSesClient {
    sent:          Arc<Mutex<Vec<TransportOptions>>>,
    failure:       Arc<Mutex<Option<(Option<String>, String)>>>,
    configuration: ClientConfiguration,
}

impl MockSesClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_configuration(configuration: ClientConfiguration) -> Self {
        Self {
            configuration,
            ..Self::default()
        }
    }

    /// 以降の送信をプロバイダエラーで失敗させる
    pub fn fail_with(&self, code: Option<&str>, message: &str) {
        *self.failure.lock().unwrap() = Some((code.map(str::to_owned), message.to_owned()));
    }

    /// 受け取ったペイロードの一覧
    pub fn sent_payloads(&self) -> Vec<TransportOptions> {
        self.sent.lock().unwrap().clone()
    }

    pub fn send_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl SesClient for MockSesClient {
    async fn send_raw_email(
        &self,
        payload: TransportOptions,
    ) -> Result<SendRawEmailOutput, ProviderError> {
        self.sent.lock().unwrap().push(payload);

        if let Some((code, message)) = self.failure.lock().unwrap().clone() {
            return Err(ProviderError::new(code, message));
        }

        let count = self.send_count();
        Ok(SendRawEmailOutput {
            message_id: Some(format!("mock-message-{count}")),
        })
    }

    fn configuration(&self) -> ClientConfiguration {
        self.configuration.clone()
    }
}
