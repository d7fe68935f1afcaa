//! # Observability 基盤
//!
//! CLI のトレーシング初期化を提供する。
//!
//! 送信失敗（`TransportSendFailure`）は生成時に `SpanTrace` を捕捉する。
//! 捕捉されるのは [`ErrorLayer`](tracing_error::ErrorLayer) を積んだ subscriber の
//! 下だけなので、[`build_subscriber`] は常にこのレイヤーを含める。
//!
//! ## 環境変数
//!
//! - `RUST_LOG`: ログレベル（未設定なら [`DEFAULT_FILTER`]）
//! - `LOG_FORMAT`: `json` または `pretty`

/// `RUST_LOG` 未設定時のフィルタ
///
/// トランスポートの `send` スパンは debug レベルなので、自クレートだけ debug にする。
pub const DEFAULT_FILTER: &str = "info,sesmail=debug";

/// ログ出力形式
///
/// 環境変数 `LOG_FORMAT` で切り替える。
/// 値が未設定または不正な場合は [`Pretty`](LogFormat::Pretty) にフォールバックする。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// JSON 形式（本番環境向け）
    Json,
    /// 人間が読みやすい形式（開発環境向け）
    #[default]
    Pretty,
}

impl LogFormat {
    /// 文字列からログ形式をパースする
    ///
    /// 不正な値の場合は [`Pretty`](LogFormat::Pretty) にフォールバックし、
    /// stderr に警告を出力する。
    pub fn parse(s: &str) -> Self {
        match s {
            "json" => Self::Json,
            "pretty" => Self::Pretty,
            other => {
                eprintln!("WARNING: unknown LOG_FORMAT={other:?}, falling back to pretty");
                Self::Pretty
            }
        }
    }

    /// 環境変数 `LOG_FORMAT` から読み取る
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT") {
            Ok(val) => Self::parse(&val),
            Err(_) => Self::default(),
        }
    }
}

/// トレーシング初期化設定
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// サービス名（ルートスパンの `service` フィールドに出力）
    pub service_name: String,
    /// ログ出力形式
    pub log_format:   LogFormat,
}

impl TracingConfig {
    pub fn new(service_name: impl Into<String>, log_format: LogFormat) -> Self {
        Self {
            service_name: service_name.into(),
            log_format,
        }
    }

    /// 環境変数から設定を読み取る
    pub fn from_env(service_name: impl Into<String>) -> Self {
        Self::new(service_name, LogFormat::from_env())
    }
}

/// `RUST_LOG` から、未設定なら [`DEFAULT_FILTER`] からフィルタを作る
#[cfg(feature = "observability")]
pub fn env_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_FILTER.into())
}

/// 出力形式に応じた subscriber を組み立てる（グローバル登録はしない）
///
/// レイヤー構成: `EnvFilter` → fmt（JSON / Pretty） → `ErrorLayer`
#[cfg(feature = "observability")]
pub fn build_subscriber(
    config: &TracingConfig,
    filter: tracing_subscriber::EnvFilter,
) -> impl tracing::Subscriber + Send + Sync + 'static {
    use tracing_subscriber::{Layer as _, layer::SubscriberExt};

    let fmt_layer = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_target(true)
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer().boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(tracing_error::ErrorLayer::default())
}

/// CLI のルートスパン
///
/// 以降のログと `SpanTrace` に `service` が付く。
#[cfg(feature = "observability")]
pub fn root_span(config: &TracingConfig) -> tracing::Span {
    tracing::info_span!("app", service = %config.service_name)
}

/// トレーシングをグローバルに初期化し、ルートスパンを返す
///
/// プロセスで一度だけ呼ぶ。
#[cfg(feature = "observability")]
pub fn init_tracing(config: &TracingConfig) -> tracing::Span {
    use tracing_subscriber::util::SubscriberInitExt as _;

    build_subscriber(config, env_filter()).init();
    root_span(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ===== LogFormat::parse テスト =====

    #[test]
    fn test_parse_jsonでjsonを返す() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
    }

    #[test]
    fn test_parse_prettyでprettyを返す() {
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Pretty);
    }

    #[test]
    fn test_parse_不正な値でprettyにフォールバックする() {
        assert_eq!(LogFormat::parse("unknown"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse(""), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("JSON"), LogFormat::Pretty);
    }

    #[test]
    fn test_defaultでprettyを返す() {
        assert_eq!(LogFormat::default(), LogFormat::Pretty);
    }

    #[test]
    fn test_newでフィールドが正しく設定される() {
        let config = TracingConfig::new("sesmail-cli", LogFormat::Json);

        assert_eq!(config.service_name, "sesmail-cli");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    // ===== build_subscriber テスト =====

    #[cfg(feature = "observability")]
    #[rstest::rstest]
    #[case::json(LogFormat::Json)]
    #[case::pretty(LogFormat::Pretty)]
    fn test_build_subscriberはspan_traceにルートスパンと呼び出し経路を残す(
        #[case] log_format: LogFormat,
    ) {
        let config = TracingConfig::new("sesmail-cli", log_format);
        let subscriber = build_subscriber(&config, tracing_subscriber::EnvFilter::new("debug"));

        let trace = tracing::subscriber::with_default(subscriber, || {
            let _root = root_span(&config).entered();
            let _send = tracing::debug_span!("send", transport = "ses+api://key@us-east-1").entered();
            tracing_error::SpanTrace::capture().to_string()
        });

        assert!(trace.contains("app"), "trace: {trace}");
        assert!(trace.contains("sesmail-cli"), "trace: {trace}");
        assert!(trace.contains("send"), "trace: {trace}");
        assert!(trace.contains("ses+api://key@us-east-1"), "trace: {trace}");
    }

    #[cfg(feature = "observability")]
    #[test]
    fn test_フィルタで除外されたスパンはspan_traceに残らない() {
        let config = TracingConfig::new("sesmail-cli", LogFormat::Pretty);
        let subscriber = build_subscriber(&config, tracing_subscriber::EnvFilter::new("info"));

        let trace = tracing::subscriber::with_default(subscriber, || {
            let _send = tracing::debug_span!("send").entered();
            tracing_error::SpanTrace::capture().to_string()
        });

        assert!(!trace.contains("send"), "trace: {trace}");
    }
}
