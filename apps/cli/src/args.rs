//! コマンドライン引数

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Debug, Parser)]
#[command(author, version, about = "Amazon SES の Raw 送信 API でメールを送る", long_about = None)]
pub struct Args {
    /// トランスポートオプション（`KEY=JSON`、JSON でなければ文字列として扱う）
    #[arg(long = "option", short = 'o', value_parser = parse_option)]
    pub options: Vec<(String, Value)>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// テキストメールを組み立てて送信する
    Send {
        /// 送信元（例: `Sender <sender@example.com>`）
        #[arg(long)]
        from:    String,
        /// 宛先（複数指定可）
        #[arg(long, required = true)]
        to:      Vec<String>,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        body:    String,
    },
    /// レンダリング済みの MIME ファイルを送信する
    SendRaw {
        /// エンベロープ送信元アドレス
        #[arg(long)]
        from: String,
        /// `.eml` ファイルのパス
        file: PathBuf,
    },
    /// トランスポートの識別文字列を表示する
    Describe,
}

/// `KEY=JSON` 形式のオプションを解釈する
fn parse_option(s: &str) -> Result<(String, Value), String> {
    let (key, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("KEY=VALUE 形式で指定してください: {s}"))?;
    if key.is_empty() {
        return Err(format!("キーが空です: {s}"));
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}
