//! SES トランスポート実装
//!
//! Raw 送信 API にメッセージ全体を渡す。
//! オプションは送信ごとにペイロードへ浅くマージし、`Source` と `RawMessage` は
//! 常にトランスポートが上書きする。

use std::{
    fmt,
    sync::{Arc, PoisonError, RwLock},
};

use async_trait::async_trait;
use serde_json::Value;
use sesmail_domain::{
    MessageError,
    OutboundMessage,
    TransportOptions,
    options::{RAW_MESSAGE_DATA_KEY, RAW_MESSAGE_KEY, SOURCE_KEY, is_reserved, raw_data_value},
};

use super::MailTransport;
use crate::{
    error::{SendError, TransportSendFailure},
    ses::{ClientConfiguration, SesClient},
};

/// SES トランスポート
///
/// 外部で生成された [`SesClient`] を共有参照として保持する。
/// オプションは `RwLock` で保護し、送信時にスナップショットを取る。
pub struct SesTransport {
    client:  Arc<dyn SesClient>,
    options: RwLock<TransportOptions>,
}

impl SesTransport {
    /// オプションなしで作成する
    pub fn new(client: Arc<dyn SesClient>) -> Self {
        Self::with_options(client, TransportOptions::new())
    }

    /// オプション付きで作成する
    ///
    /// クライアントやオプションの妥当性は検証しない（最初の送信で判明する）。
    pub fn with_options(client: Arc<dyn SesClient>, options: TransportOptions) -> Self {
        Self {
            client,
            options: RwLock::new(options),
        }
    }

    /// 保持している SES クライアント
    pub fn client(&self) -> &Arc<dyn SesClient> {
        &self.client
    }

    /// 現在のオプション
    pub fn options(&self) -> TransportOptions {
        self.options
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// オプションを丸ごと置き換え、新しいオプションを返す
    ///
    /// 既存のオプションとはマージしない。次回の送信から有効になる。
    pub fn set_options(&self, options: TransportOptions) -> TransportOptions {
        if let Some(key) = options.keys().find(|key| is_reserved(key)) {
            tracing::debug!(key = %key, "予約キーは送信時にトランスポートの値で上書きされます");
        }

        let mut guard = self.options.write().unwrap_or_else(PoisonError::into_inner);
        *guard = options;
        guard.clone()
    }

    /// 送信ペイロードを組み立てる
    ///
    /// 1. 現在のオプションを複製する
    /// 2. `Source` と `RawMessage.Data` を書き込む（呼び出し元の値より優先）
    pub fn build_payload(
        &self,
        message: &dyn OutboundMessage,
    ) -> Result<TransportOptions, MessageError> {
        let sender = message.envelope_sender()?;
        if sender.is_empty() {
            return Err(MessageError::MissingSender);
        }
        let raw = message.to_raw()?;

        let mut raw_message = TransportOptions::new();
        raw_message.insert(RAW_MESSAGE_DATA_KEY.to_owned(), raw_data_value(raw));

        let mut payload = self.options();
        payload.insert(SOURCE_KEY.to_owned(), Value::String(sender));
        payload.insert(RAW_MESSAGE_KEY.to_owned(), Value::Object(raw_message));

        Ok(payload)
    }

    /// トランスポートの識別文字列を返す
    ///
    /// `ses+api://<アクセスキー ID>@<ホストまたはリージョン>` 形式。
    pub fn describe(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SesTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let configuration = self.client.configuration();
        write!(
            f,
            "ses+api://{}@{}",
            configuration.access_key_id.as_deref().unwrap_or_default(),
            resolve_host(&configuration)
        )
    }
}

impl fmt::Debug for SesTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SesTransport")
            .field("transport", &self.to_string())
            .field("options", &self.options())
            .finish()
    }
}

#[async_trait]
impl MailTransport for SesTransport {
    #[tracing::instrument(skip_all, level = "debug", fields(transport = %self))]
    async fn send(&self, message: &dyn OutboundMessage) -> Result<(), SendError> {
        let payload = self.build_payload(message)?;

        match self.client.send_raw_email(payload).await {
            Ok(output) => {
                tracing::info!(
                    message_id = output.message_id.as_deref().unwrap_or("-"),
                    "SES でメールを送信しました"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(code = e.code(), error = %e, "SES への送信に失敗しました");
                Err(TransportSendFailure::ses(e).into())
            }
        }
    }
}

/// カスタムエンドポイントがあれば `host[:port]`、なければリージョンを返す
fn resolve_host(configuration: &ClientConfiguration) -> String {
    match configuration
        .endpoint
        .as_deref()
        .filter(|endpoint| !endpoint.is_empty())
    {
        Some(endpoint) => endpoint_host(endpoint),
        None => configuration.region.clone().unwrap_or_default(),
    }
}

/// エンドポイント URL からホストと明示的なポートを取り出す
///
/// ポートは書かれた文字列のまま残す（`Uri::port` は `u16` に収まらない値を捨てる）。
/// `http::Uri` として解釈できない場合は `scheme://` の後ろからパスの手前までを使う。
fn endpoint_host(endpoint: &str) -> String {
    if let Some(authority) = endpoint
        .parse::<http::Uri>()
        .ok()
        .and_then(|uri| uri.into_parts().authority)
    {
        return host_port(authority.as_str()).to_owned();
    }

    let rest = endpoint
        .split_once("://")
        .map_or(endpoint, |(_, rest)| rest);
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    host_port(&rest[..end]).to_owned()
}

/// 権限部から `userinfo@` と空のポートを取り除く
fn host_port(authority: &str) -> &str {
    authority
        .rsplit_once('@')
        .map_or(authority, |(_, host)| host)
        .trim_end_matches(':')
}
