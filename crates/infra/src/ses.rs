//! # SES クライアント
//!
//! Amazon SES の Raw 送信 API を呼び出すクライアントの抽象と AWS 実装。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: [`SesClient`] でプロバイダ呼び出しを抽象化し、
//!   テスト時はモックに差し替え可能にする
//! - **SES v1 形式のペイロード**: トランスポートは `Source` / `RawMessage` /
//!   `ConfigurationSetName` などのキーを持つマップを渡す。
//!   [`AwsSesClient`] がそれを SES v2 の `SendEmail`（Raw コンテンツ）に変換する
//! - **設定はクライアント生成時に確定**: リージョン、エンドポイント、アクセスキー ID は
//!   生成時に解決し、[`SesClient::configuration`] は I/O を行わない
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use sesmail_infra::ses::{self, SesSettings};
//!
//! async fn setup() {
//!     // 本番（AWS SES）
//!     let client = ses::create_client(&SesSettings::new("us-east-1")).await;
//!
//!     // ローカル（LocalStack 等）
//!     let settings = SesSettings::new("us-east-1").with_endpoint_url("http://localhost:4566");
//!     let client = ses::create_client(&settings).await;
//! }
//! ```

mod request;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::provider::ProvideCredentials as _;
use aws_sdk_sesv2::{
    Client,
    config::Credentials,
    error::{DisplayErrorContext, ProvideErrorMetadata},
    primitives::Blob,
    types::{Destination, EmailContent, MessageTag, RawMessage},
};
use sesmail_domain::TransportOptions;
use thiserror::Error;

pub use self::request::RawSendRequest;

/// パラメータ不正を表す SES のエラーコード
pub const INVALID_PARAMETER_VALUE: &str = "InvalidParameterValue";

/// プロバイダ呼び出しのエラー
///
/// SES が返したエラーコードとメッセージを保持する。
/// SDK のエラーがある場合は原因として連鎖させる。
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ProviderError {
    code:    Option<String>,
    message: String,
    #[source]
    source:  Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    pub fn new(code: Option<impl Into<String>>, message: impl Into<String>) -> Self {
        Self {
            code:    code.map(Into::into),
            message: message.into(),
            source:  None,
        }
    }

    /// パラメータ不正エラーを生成する
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::new(Some(INVALID_PARAMETER_VALUE), message)
    }

    /// AWS SDK のエラーから生成する
    ///
    /// サービスエラーのコードとメッセージを取り出し、SDK エラー自体を原因として保持する。
    pub fn from_sdk<E>(err: E) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    {
        let code = err.code().map(str::to_owned);
        let message = err
            .message()
            .map(str::to_owned)
            .unwrap_or_else(|| DisplayErrorContext(&err).to_string());
        Self {
            code,
            message,
            source: Some(Box::new(err)),
        }
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// クライアント設定のスナップショット
///
/// トランスポートの識別文字列（`ses+api://...`）の組み立てに使う。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientConfiguration {
    /// カスタムエンドポイント（`None` はデフォルトエンドポイント）
    pub endpoint:      Option<String>,
    /// リージョン名
    pub region:        Option<String>,
    /// アクセスキー ID
    pub access_key_id: Option<String>,
}

/// Raw 送信の結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendRawEmailOutput {
    /// SES が採番したメッセージ ID
    pub message_id: Option<String>,
}

/// SES クライアントのインターフェース
///
/// Raw 送信とクライアント設定の参照を提供する。
/// テスト時はモックに差し替え可能。
#[async_trait]
pub trait SesClient: Send + Sync {
    /// Raw メールを送信する
    ///
    /// # 引数
    ///
    /// * `payload` - `Source`、`RawMessage.Data` と追加オプションを含むマップ
    async fn send_raw_email(
        &self,
        payload: TransportOptions,
    ) -> Result<SendRawEmailOutput, ProviderError>;

    /// クライアント設定を返す（ネットワーク I/O なし）
    fn configuration(&self) -> ClientConfiguration;
}

/// SES クライアントの生成設定
#[derive(Debug, Clone, Default)]
pub struct SesSettings {
    /// リージョン（例: `us-east-1`）
    pub region:            String,
    /// カスタムエンドポイント URL（LocalStack 等）
    pub endpoint_url:      Option<String>,
    /// 明示的なアクセスキー ID（未設定なら SDK のデフォルト認証チェーン）
    pub access_key_id:     Option<String>,
    /// 明示的なシークレットアクセスキー
    pub secret_access_key: Option<String>,
}

impl SesSettings {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            ..Self::default()
        }
    }

    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    pub fn with_credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.secret_access_key = Some(secret_access_key.into());
        self
    }
}

/// AWS SES クライアント
///
/// `aws-sdk-sesv2` を使用した [`SesClient`] の実装。
pub struct AwsSesClient {
    client:        Client,
    configuration: ClientConfiguration,
}

impl AwsSesClient {
    /// SDK クライアントと、その生成に使った設定から作成する
    pub fn new(client: Client, configuration: ClientConfiguration) -> Self {
        Self {
            client,
            configuration,
        }
    }

    /// 内部の SDK クライアント
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl SesClient for AwsSesClient {
    async fn send_raw_email(
        &self,
        payload: TransportOptions,
    ) -> Result<SendRawEmailOutput, ProviderError> {
        let request = RawSendRequest::from_payload(&payload)?;

        let raw = RawMessage::builder()
            .data(Blob::new(request.data))
            .build()
            .map_err(|e| ProviderError::invalid_parameter(format!("RawMessage 構築失敗: {e}")))?;

        let mut builder = self
            .client
            .send_email()
            .content(EmailContent::builder().raw(raw).build());

        if let Some(source) = request.source {
            builder = builder.from_email_address(source);
        }
        if !request.destinations.is_empty() {
            builder = builder.destination(
                Destination::builder()
                    .set_to_addresses(Some(request.destinations))
                    .build(),
            );
        }
        if let Some(name) = request.configuration_set_name {
            builder = builder.configuration_set_name(name);
        }
        for (name, value) in request.tags {
            let tag = MessageTag::builder()
                .name(name)
                .value(value)
                .build()
                .map_err(|e| ProviderError::invalid_parameter(format!("Tags 構築失敗: {e}")))?;
            builder = builder.email_tags(tag);
        }
        if let Some(arn) = request.from_arn {
            builder = builder.from_email_address_identity_arn(arn);
        }
        if let Some(arn) = request.return_path_arn {
            builder = builder.feedback_forwarding_email_address_identity_arn(arn);
        }

        let output = builder
            .send()
            .await
            .map_err(|e| ProviderError::from_sdk(e.into_service_error()))?;

        Ok(SendRawEmailOutput {
            message_id: output.message_id,
        })
    }

    fn configuration(&self) -> ClientConfiguration {
        self.configuration.clone()
    }
}

/// SES クライアントを作成する
///
/// `endpoint_url` が `Some` の場合はカスタムエンドポイントに接続する。
/// 明示的な認証情報がない場合は SDK のデフォルト認証チェーンで解決する:
/// - ローカル: 環境変数 `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY`
/// - 本番: IAM ロール
///
/// アクセスキー ID はここで一度だけ解決し、識別文字列に使う。
pub async fn create_client(settings: &SesSettings) -> AwsSesClient {
    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(settings.region.clone()));

    if let Some(endpoint_url) = &settings.endpoint_url {
        loader = loader.endpoint_url(endpoint_url);
    }

    if let (Some(access_key_id), Some(secret_access_key)) =
        (&settings.access_key_id, &settings.secret_access_key)
    {
        loader = loader.credentials_provider(Credentials::new(
            access_key_id.clone(),
            secret_access_key.clone(),
            None,
            None,
            "sesmail",
        ));
    }

    let sdk_config = loader.load().await;
    let access_key_id = resolve_access_key_id(&sdk_config).await;

    let configuration = ClientConfiguration {
        endpoint: settings.endpoint_url.clone(),
        region: Some(settings.region.clone()),
        access_key_id,
    };

    AwsSesClient::new(Client::new(&sdk_config), configuration)
}

/// 認証情報プロバイダからアクセスキー ID を取り出す
///
/// 解決できない場合は警告を出して `None` を返す（送信時に SDK がエラーを返す）。
async fn resolve_access_key_id(sdk_config: &SdkConfig) -> Option<String> {
    let provider = sdk_config.credentials_provider()?;
    match provider.provide_credentials().await {
        Ok(credentials) => Some(credentials.access_key_id().to_owned()),
        Err(e) => {
            tracing::warn!(error = %DisplayErrorContext(&e), "AWS 認証情報を解決できませんでした");
            None
        }
    }
}
