use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use juliusvote::{BallotConfig, CliHandler};

/// 投票セッションの起動オプション
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 設定ファイル (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 管理者ID（設定ファイルより優先）
    #[arg(short, long)]
    admin: Option<String>,

    /// コマンドスクリプト（省略時は標準入力）
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// 最初の失敗で停止する
    #[arg(long)]
    strict: bool,
}

/// メイン関数
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => BallotConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => BallotConfig::default(),
    };
    if let Some(admin) = &args.admin {
        config
            .override_administrator(admin)
            .with_context(|| format!("Invalid --admin value {:?}", admin))?;
    }
    config.strict |= args.strict;

    // ログ初期化
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_str()),
    )
    .init();
    info!("=== Julius Vote セッションを開始します ===");

    let service = config.build_service()?;

    // イベントを監査ログとして出力する
    let mut events = service.subscribe();
    let audit_task = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => info!("[audit] {}", event),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("[audit] {} event(s) dropped", skipped);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let mut handler = CliHandler::new(service);
    let stdout = io::stdout();
    let failures = match &args.script {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open script {}", path.display()))?;
            handler.run_lines(BufReader::new(file), stdout.lock(), config.strict)?
        }
        None => handler.run_lines(io::stdin().lock(), stdout.lock(), config.strict)?,
    };

    info!(
        "Session finished in phase {} with {} rejected command(s)",
        handler.service().current_phase(),
        failures
    );

    // 送信側を閉じてから監査タスクを待つ
    drop(handler);
    audit_task.await?;

    if config.strict && failures > 0 {
        anyhow::bail!("{} command(s) rejected", failures);
    }
    Ok(())
}
