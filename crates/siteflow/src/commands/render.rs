use crate::utils;
use colored::Colorize;
use siteflow_config::ResolvedConfig;
use siteflow_core::{RenderReport, Renderer};

pub fn handle(config: &ResolvedConfig, services: &[String]) -> anyhow::Result<()> {
    println!("{}", "nginx / systemd 設定を生成中...".blue());
    utils::print_loaded_config(config);

    let renderer = Renderer::new(config.paths.clone(), config.vhost.clone())?;
    let report = renderer.render_batch(services)?;

    print_report(&report);
    utils::print_skipped(&report.skipped);

    if report.rendered.is_empty() {
        println!();
        println!("{}", "生成されたサービスはありません".yellow());
        return Ok(());
    }

    print_next_steps();
    Ok(())
}

fn print_report(report: &RenderReport) {
    println!();
    for service in &report.rendered {
        println!(
            "{} {} ({})",
            "✓".green(),
            service.name.cyan().bold(),
            service.domain
        );
        println!("    {}", service.artifacts.nginx.display());
        println!("    {}", service.artifacts.systemd.display());
    }

    let domains = report.domains();
    if !domains.is_empty() {
        println!();
        println!("ドメイン: {}", domains.join(", ").cyan());
    }
}

fn print_next_steps() {
    println!();
    println!("{}", "次の手順（ホスト上で手動実行）:".bold());
    println!(
        "  1) nginx 設定を /etc/nginx/sites-enabled/ にコピーして再読み込み: {}",
        "nginx -t && systemctl reload nginx".cyan()
    );
    println!(
        "  2) systemd ユニットを /etc/systemd/system/ にコピーして再読み込み: {}",
        "systemctl daemon-reload".cyan()
    );
    println!(
        "  3) サービスを有効化: {}",
        "systemctl enable --now <service>".cyan()
    );
}
