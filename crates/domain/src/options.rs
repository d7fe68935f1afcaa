//! # トランスポートオプション
//!
//! プロバイダの Raw 送信 API に渡す追加フィールド。
//! キーは SES の `SendRawEmail` パラメータ名（`ConfigurationSetName`, `Tags` など）。

use serde_json::{Map, Value};

/// プロバイダ呼び出しオプション
///
/// 送信のたびに浅くマージされる（ネストしたオブジェクトは再帰マージしない）。
pub type TransportOptions = Map<String, Value>;

/// トランスポートが注入する送信元アドレスのキー
pub const SOURCE_KEY: &str = "Source";

/// トランスポートが注入する Raw メッセージのキー
pub const RAW_MESSAGE_KEY: &str = "RawMessage";

/// `RawMessage` オブジェクト内の本文キー
pub const RAW_MESSAGE_DATA_KEY: &str = "Data";

/// 予約キーの一覧
///
/// 呼び出し元がこれらを設定しても、送信時にトランスポートの値で上書きされる。
pub const RESERVED_KEYS: [&str; 2] = [SOURCE_KEY, RAW_MESSAGE_KEY];

/// キーが予約キーかどうか
pub fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

/// シリアライズ済みの本文を `RawMessage.Data` の値に変換する
///
/// UTF-8 として読める本文は文字列のまま入れる。
/// 8bit の非 UTF-8 本文（ISO-2022-JP など）はバイト値の配列にする。
pub fn raw_data_value(bytes: Vec<u8>) -> Value {
    match String::from_utf8(bytes) {
        Ok(text) => Value::String(text),
        Err(e) => Value::Array(e.into_bytes().into_iter().map(Value::from).collect()),
    }
}

/// `RawMessage.Data` の値をバイト列に戻す
///
/// 文字列かバイト値（0〜255）の配列以外は `None`。
pub fn raw_data_bytes(value: &Value) -> Option<Vec<u8>> {
    match value {
        Value::String(text) => Some(text.as_bytes().to_vec()),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_u64().and_then(|byte| u8::try_from(byte).ok()))
            .collect(),
        _ => None,
    }
}
