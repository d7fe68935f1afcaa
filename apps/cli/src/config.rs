//! # CLI 設定
//!
//! 環境変数から SES クライアントとトランスポートの設定を読み込む。

use serde_json::Value;
use sesmail_domain::TransportOptions;
use sesmail_infra::ses::SesSettings;
use thiserror::Error;

/// リージョン未設定時のデフォルト
const DEFAULT_REGION: &str = "us-east-1";

/// 設定読み込みエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// アクセスキー ID とシークレットの片方だけが設定されている
    #[error("AWS_ACCESS_KEY_ID と AWS_SECRET_ACCESS_KEY は両方設定するか、両方未設定にしてください")]
    IncompleteCredentials,
}

/// CLI の設定
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// SES クライアントの生成設定
    pub ses:               SesSettings,
    /// 設定セット名（`ConfigurationSetName` としてオプションに入る）
    pub configuration_set: Option<String>,
}

impl CliConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意のキー検索関数から設定を読み込む
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let mut ses = SesSettings::new(
            non_empty("AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
        );
        ses.endpoint_url = non_empty("SES_ENDPOINT_URL");

        match (non_empty("AWS_ACCESS_KEY_ID"), non_empty("AWS_SECRET_ACCESS_KEY")) {
            (Some(access_key_id), Some(secret_access_key)) => {
                ses = ses.with_credentials(access_key_id, secret_access_key);
            }
            (None, None) => {}
            _ => return Err(ConfigError::IncompleteCredentials),
        }

        Ok(Self {
            ses,
            configuration_set: non_empty("SES_CONFIGURATION_SET"),
        })
    }

    /// トランスポートオプションを組み立てる
    ///
    /// 設定セットを先に入れ、コマンドライン引数の値で上書きする。
    pub fn transport_options(&self, overrides: Vec<(String, Value)>) -> TransportOptions {
        let mut options = TransportOptions::new();
        if let Some(name) = &self.configuration_set {
            options.insert(
                "ConfigurationSetName".to_string(),
                Value::String(name.clone()),
            );
        }
        options.extend(overrides);
        options
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn 未設定ならデフォルトリージョンを使う() {
        let config = CliConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.ses.region, "us-east-1");
        assert_eq!(config.ses.endpoint_url, None);
        assert_eq!(config.ses.access_key_id, None);
        assert_eq!(config.configuration_set, None);
    }

    #[test]
    fn 環境変数から各項目を読み込む() {
        let config = CliConfig::from_lookup(lookup(&[
            ("AWS_REGION", "eu-west-1"),
            ("SES_ENDPOINT_URL", "http://localhost:4566"),
            ("AWS_ACCESS_KEY_ID", "test"),
            ("AWS_SECRET_ACCESS_KEY", "secret"),
            ("SES_CONFIGURATION_SET", "tracking"),
        ]))
        .unwrap();

        assert_eq!(config.ses.region, "eu-west-1");
        assert_eq!(
            config.ses.endpoint_url.as_deref(),
            Some("http://localhost:4566")
        );
        assert_eq!(config.ses.access_key_id.as_deref(), Some("test"));
        assert_eq!(config.configuration_set.as_deref(), Some("tracking"));
    }

    #[test]
    fn 認証情報の片方だけはエラー() {
        let result = CliConfig::from_lookup(lookup(&[("AWS_ACCESS_KEY_ID", "test")]));

        assert_eq!(result.unwrap_err(), ConfigError::IncompleteCredentials);
    }

    #[test]
    fn 空文字列は未設定として扱う() {
        let config = CliConfig::from_lookup(lookup(&[
            ("AWS_REGION", ""),
            ("SES_ENDPOINT_URL", ""),
        ]))
        .unwrap();

        assert_eq!(config.ses.region, "us-east-1");
        assert_eq!(config.ses.endpoint_url, None);
    }

    #[test]
    fn transport_optionsは引数で設定セットを上書きできる() {
        let config = CliConfig::from_lookup(lookup(&[("SES_CONFIGURATION_SET", "env")])).unwrap();

        let options = config.transport_options(vec![
            ("ConfigurationSetName".to_string(), json!("cli")),
            ("Destinations".to_string(), json!(["x@example.com"])),
        ]);

        assert_eq!(options.get("ConfigurationSetName"), Some(&json!("cli")));
        assert_eq!(options.get("Destinations"), Some(&json!(["x@example.com"])));
    }
}
