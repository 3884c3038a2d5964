use colored::Colorize;
use siteflow_config::ResolvedConfig;
use siteflow_core::SkippedDescriptor;

/// 読み込んだ設定ファイルとディレクトリを表示
pub fn print_loaded_config(config: &ResolvedConfig) {
    match &config.source {
        Some(path) => println!("📄 設定ファイル: {}", path.display().to_string().cyan()),
        None => println!("📄 設定ファイル: {}", "(なし、デフォルトを使用)".dimmed()),
    }
    println!(
        "  サービス定義: {}",
        config.paths.services_dir.display().to_string().cyan()
    );
}

/// 読み飛ばしたサービス定義を表示
pub fn print_skipped(skipped: &[SkippedDescriptor]) {
    if skipped.is_empty() {
        return;
    }
    println!();
    println!(
        "{}",
        format!("⚠ {}件のサービス定義を読み飛ばしました:", skipped.len()).yellow()
    );
    for skip in skipped {
        println!("  • {}", skip.path.display().to_string().yellow());
        for line in skip.reason.lines() {
            println!("      {}", line);
        }
    }
}
