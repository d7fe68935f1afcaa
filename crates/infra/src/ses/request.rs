//! Raw 送信ペイロードの解釈
//!
//! SES v1 `SendRawEmail` 形式のマップを、SES v2 の `SendEmail` に渡すフィールドへ分解する。

use serde_json::Value;
use sesmail_domain::{
    TransportOptions,
    options::{RAW_MESSAGE_DATA_KEY, RAW_MESSAGE_KEY, SOURCE_KEY, raw_data_bytes},
};

use super::ProviderError;

const DESTINATIONS_KEY: &str = "Destinations";
const CONFIGURATION_SET_NAME_KEY: &str = "ConfigurationSetName";
const TAGS_KEY: &str = "Tags";
const FROM_ARN_KEY: &str = "FromArn";
const SOURCE_ARN_KEY: &str = "SourceArn";
const RETURN_PATH_ARN_KEY: &str = "ReturnPathArn";

/// SES v2 に渡す Raw 送信リクエスト
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSendRequest {
    /// 送信元アドレス（`Source`）
    pub source:                 Option<String>,
    /// MIME 本文（`RawMessage.Data`）
    pub data:                   Vec<u8>,
    /// 宛先（`Destinations`）。空なら MIME ヘッダーから SES が決定する
    pub destinations:           Vec<String>,
    pub configuration_set_name: Option<String>,
    /// メッセージタグ（`Tags` の `Name` / `Value`）
    pub tags:                   Vec<(String, String)>,
    /// 送信元 ID の ARN（`FromArn`、なければ `SourceArn`）
    pub from_arn:               Option<String>,
    pub return_path_arn:        Option<String>,
}

impl RawSendRequest {
    /// ペイロードを解釈する
    ///
    /// 型が合わない値や `RawMessage.Data` の欠落は `InvalidParameterValue` として扱う。
    /// SES v2 に対応先のないキーは警告ログを出して読み飛ばす。
    pub fn from_payload(payload: &TransportOptions) -> Result<Self, ProviderError> {
        let mut request = Self::default();
        let mut data = None;
        let mut source_arn = None;

        for (key, value) in payload {
            match key.as_str() {
                SOURCE_KEY => request.source = Some(string_value(key, value)?),
                RAW_MESSAGE_KEY => data = Some(raw_message_data(value)?),
                DESTINATIONS_KEY => request.destinations = string_array(key, value)?,
                CONFIGURATION_SET_NAME_KEY => {
                    request.configuration_set_name = Some(string_value(key, value)?);
                }
                TAGS_KEY => request.tags = tags(value)?,
                FROM_ARN_KEY => request.from_arn = Some(string_value(key, value)?),
                SOURCE_ARN_KEY => source_arn = Some(string_value(key, value)?),
                RETURN_PATH_ARN_KEY => request.return_path_arn = Some(string_value(key, value)?),
                other => {
                    tracing::warn!(key = other, "SES v2 に対応するフィールドがないため無視します");
                }
            }
        }

        request.data = data.ok_or_else(|| {
            ProviderError::invalid_parameter(format!(
                "{RAW_MESSAGE_KEY}.{RAW_MESSAGE_DATA_KEY} が指定されていません"
            ))
        })?;
        request.from_arn = request.from_arn.or(source_arn);

        Ok(request)
    }
}

fn string_value(key: &str, value: &Value) -> Result<String, ProviderError> {
    value
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| ProviderError::invalid_parameter(format!("{key} は文字列である必要があります")))
}

fn string_array(key: &str, value: &Value) -> Result<Vec<String>, ProviderError> {
    let invalid =
        || ProviderError::invalid_parameter(format!("{key} は文字列の配列である必要があります"));

    value
        .as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|item| item.as_str().map(str::to_owned).ok_or_else(invalid))
        .collect()
}

fn raw_message_data(value: &Value) -> Result<Vec<u8>, ProviderError> {
    value
        .get(RAW_MESSAGE_DATA_KEY)
        .and_then(raw_data_bytes)
        .ok_or_else(|| {
            ProviderError::invalid_parameter(format!(
                "{RAW_MESSAGE_KEY}.{RAW_MESSAGE_DATA_KEY} は文字列かバイト値の配列である必要があります"
            ))
        })
}

fn tags(value: &Value) -> Result<Vec<(String, String)>, ProviderError> {
    let invalid = || {
        ProviderError::invalid_parameter(format!(
            "{TAGS_KEY} は {{Name, Value}} の配列である必要があります"
        ))
    };

    value
        .as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|tag| {
            let name = tag.get("Name").and_then(Value::as_str).ok_or_else(invalid)?;
            let value = tag.get("Value").and_then(Value::as_str).ok_or_else(invalid)?;
            Ok((name.to_owned(), value.to_owned()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::ses::INVALID_PARAMETER_VALUE;

    fn payload(value: Value) -> TransportOptions {
        match value {
            Value::Object(map) => map,
            other => panic!("オブジェクトではありません: {other}"),
        }
    }

    #[test]
    fn 最小のペイロードを解釈できる() {
        let payload = payload(json!({
            "Source": "a@example.com",
            "RawMessage": { "Data": "Subject: hi\r\n\r\nbody" },
        }));

        let request = RawSendRequest::from_payload(&payload).unwrap();

        assert_eq!(
            request,
            RawSendRequest {
                source: Some("a@example.com".to_string()),
                data: b"Subject: hi\r\n\r\nbody".to_vec(),
                ..RawSendRequest::default()
            }
        );
    }

    #[test]
    fn 追加オプションがsesv2のフィールドに対応付けられる() {
        let payload = payload(json!({
            "Source": "a@example.com",
            "RawMessage": { "Data": "body" },
            "Destinations": ["x@example.com", "y@example.com"],
            "ConfigurationSetName": "tracking",
            "Tags": [{ "Name": "campaign", "Value": "spring" }],
            "ReturnPathArn": "arn:aws:ses:us-east-1:123:identity/bounce.example.com",
        }));

        let request = RawSendRequest::from_payload(&payload).unwrap();

        assert_eq!(request.destinations, vec!["x@example.com", "y@example.com"]);
        assert_eq!(request.configuration_set_name.as_deref(), Some("tracking"));
        assert_eq!(
            request.tags,
            vec![("campaign".to_string(), "spring".to_string())]
        );
        assert_eq!(
            request.return_path_arn.as_deref(),
            Some("arn:aws:ses:us-east-1:123:identity/bounce.example.com")
        );
    }

    #[test]
    fn from_arnはsource_arnより優先される() {
        let payload = payload(json!({
            "RawMessage": { "Data": "body" },
            "SourceArn": "arn:source",
            "FromArn": "arn:from",
        }));

        let request = RawSendRequest::from_payload(&payload).unwrap();

        assert_eq!(request.from_arn.as_deref(), Some("arn:from"));
    }

    #[test]
    fn source_arnだけならそれを使う() {
        let payload = payload(json!({
            "RawMessage": { "Data": "body" },
            "SourceArn": "arn:source",
        }));

        let request = RawSendRequest::from_payload(&payload).unwrap();

        assert_eq!(request.from_arn.as_deref(), Some("arn:source"));
    }

    #[test]
    fn バイト値の配列の本文をそのまま渡す() {
        let payload = payload(json!({
            "RawMessage": { "Data": [65, 10, 164, 162] },
        }));

        let request = RawSendRequest::from_payload(&payload).unwrap();

        assert_eq!(request.data, vec![b'A', b'\n', 0xa4, 0xa2]);
    }

    #[test]
    fn 未知のキーは無視される() {
        let payload = payload(json!({
            "RawMessage": { "Data": "body" },
            "SomethingElse": 42,
        }));

        let request = RawSendRequest::from_payload(&payload).unwrap();

        assert_eq!(request.data, b"body".to_vec());
    }

    #[rstest]
    #[case::raw_messageがない(json!({ "Source": "a@example.com" }))]
    #[case::dataが文字列でない(json!({ "RawMessage": { "Data": 1 } }))]
    #[case::dataのバイト値が範囲外(json!({ "RawMessage": { "Data": [300] } }))]
    #[case::sourceが文字列でない(json!({ "Source": 1, "RawMessage": { "Data": "b" } }))]
    #[case::destinationsが配列でない(json!({ "RawMessage": { "Data": "b" }, "Destinations": "x@example.com" }))]
    #[case::tagsの要素が不正(json!({ "RawMessage": { "Data": "b" }, "Tags": [{ "Name": "n" }] }))]
    fn 不正なペイロードはinvalid_parameter_value(#[case] value: Value) {
        let err = RawSendRequest::from_payload(&payload(value)).unwrap_err();

        assert_eq!(err.code(), Some(INVALID_PARAMETER_VALUE));
    }
}
