//! # sesmail CLI
//!
//! Amazon SES の Raw 送信 API でメールを送信するコマンドラインツール。
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `AWS_REGION` | No | リージョン（デフォルト: `us-east-1`） |
//! | `SES_ENDPOINT_URL` | No | カスタムエンドポイント（LocalStack 等） |
//! | `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY` | No | 未設定なら SDK のデフォルト認証チェーン |
//! | `SES_CONFIGURATION_SET` | No | 設定セット名 |
//! | `LOG_FORMAT` | No | `json` または `pretty` |
//!
//! ## 使用例
//!
//! ```bash
//! sesmail-cli send --from a@example.com --to b@example.com --subject hi --body hello
//! sesmail-cli -o 'Tags=[{"Name":"k","Value":"v"}]' send-raw --from a@example.com mail.eml
//! sesmail-cli describe
//! ```

mod args;
mod config;

use std::sync::Arc;

use anyhow::Context as _;
use args::{Args, Command};
use clap::Parser as _;
use config::CliConfig;
use lettre::message::{Mailbox, header::ContentType};
use sesmail_domain::RawEmail;
use sesmail_infra::{
    ses,
    transport::{MailTransport, SesTransport},
};
use sesmail_shared::observability::{self, TracingConfig};
use tracing::Instrument as _;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    let span = observability::init_tracing(&TracingConfig::from_env("sesmail-cli"));

    let args = Args::parse();
    let config = CliConfig::from_env().context("設定の読み込みに失敗しました")?;

    run(args, config).instrument(span).await
}

async fn run(args: Args, config: CliConfig) -> anyhow::Result<()> {
    let client = ses::create_client(&config.ses).await;
    let transport =
        SesTransport::with_options(Arc::new(client), config.transport_options(args.options));

    match args.command {
        Command::Describe => {
            println!("{transport}");
        }
        Command::Send {
            from,
            to,
            subject,
            body,
        } => {
            let message = compose(&from, &to, &subject, body)?;
            transport.send(&message).await?;
        }
        Command::SendRaw { from, file } => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("{} を読み込めません", file.display()))?;
            let email = RawEmail::new(from, bytes);
            transport.send(&email).await?;
        }
    }

    Ok(())
}

/// テキストメールを組み立てる
fn compose(
    from: &str,
    to: &[String],
    subject: &str,
    body: String,
) -> anyhow::Result<lettre::Message> {
    let mut builder = lettre::Message::builder()
        .from(from.parse::<Mailbox>().context("送信元アドレスが不正です")?)
        .subject(subject);
    for recipient in to {
        let mailbox = recipient
            .parse::<Mailbox>()
            .with_context(|| format!("宛先アドレスが不正です: {recipient}"))?;
        builder = builder.to(mailbox);
    }

    builder
        .header(ContentType::TEXT_PLAIN)
        .body(body)
        .context("メッセージ構築失敗")
}
