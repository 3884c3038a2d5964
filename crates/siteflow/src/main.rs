mod commands;
mod utils;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "siteflow")]
#[command(about = "サービス定義から nginx と systemd の設定を生成する", long_about = None)]
struct Cli {
    /// 設定ファイル（省略時は siteflow.yml を探索）
    #[arg(long, global = true, env = "SITEFLOW_CONFIG_PATH")]
    config: Option<PathBuf>,
    /// サービス定義ディレクトリ
    #[arg(long, global = true, env = "SITEFLOW_SERVICES_DIR")]
    services_dir: Option<PathBuf>,
    /// テンプレートディレクトリ
    #[arg(long, global = true, env = "SITEFLOW_TEMPLATES_DIR")]
    templates_dir: Option<PathBuf>,
    /// 出力ディレクトリ
    #[arg(long = "out", global = true, env = "SITEFLOW_OUT_DIR")]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// nginx / systemd 設定を生成
    Render {
        /// サービス名（省略時は全サービス、指定時は1件でも不正ならエラー）
        #[arg(short = 'n', long = "service")]
        services: Vec<String>,
    },
    /// サービス定義を検証（ファイルは書き出さない）
    Validate {
        /// サービス名（省略時は全サービス）
        #[arg(short = 'n', long = "service")]
        services: Vec<String>,
        /// 正規化後のサービス定義を JSON で出力
        #[arg(long)]
        json: bool,
    },
    /// 証明書発行に使うドメイン一覧を表示
    Domains {
        /// サービス名（省略時は全サービス）
        #[arg(short = 'n', long = "service")]
        services: Vec<String>,
        /// JSON 配列で出力
        #[arg(long)]
        json: bool,
    },
    /// 生成済みファイルを表示（未生成があればエラー）
    Artifacts {
        /// サービス名
        #[arg(short = 'n', long = "service", required = true)]
        services: Vec<String>,
    },
    /// テンプレートとディレクトリを初期化
    Init {
        /// 既存のテンプレートを上書き
        #[arg(short, long)]
        force: bool,
    },
    /// バージョン情報を表示
    Version,
}

fn main() {
    let cli = Cli::parse();

    // ログは stderr に出力（読み飛ばしの警告を見せるためデフォルトは warn）
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    // Versionコマンドは設定ファイル不要
    if matches!(cli.command, Commands::Version) {
        println!("siteflow {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let overrides = siteflow_config::PathOverrides {
        services_dir: cli.services_dir,
        templates_dir: cli.templates_dir,
        output_dir: cli.output_dir,
    };
    let config = siteflow_config::resolve_config(cli.config.as_deref(), &overrides)?;
    tracing::debug!(source = ?config.source, paths = ?config.paths, "Resolved configuration");

    match cli.command {
        Commands::Render { services } => commands::render::handle(&config, &services)?,
        Commands::Validate { services, json } => {
            commands::validate::handle(&config, &services, json)?
        }
        Commands::Domains { services, json } => {
            commands::domains::handle(&config, &services, json)?
        }
        Commands::Artifacts { services } => commands::artifacts::handle(&config, &services)?,
        Commands::Init { force } => commands::init::handle(&config, force)?,
        Commands::Version => unreachable!("Version is handled before config loading"),
    }

    Ok(())
}
