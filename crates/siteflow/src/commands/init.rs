use colored::Colorize;
use siteflow_config::ResolvedConfig;
use siteflow_core::write_default_templates;

pub fn handle(config: &ResolvedConfig, force: bool) -> anyhow::Result<()> {
    let paths = &config.paths;

    std::fs::create_dir_all(&paths.services_dir)?;
    println!(
        "{} {}",
        "✓".green(),
        paths.services_dir.display().to_string().cyan()
    );

    let written = write_default_templates(&paths.templates_dir, force)?;
    for path in &written {
        println!("{} {}", "✓".green(), path.display().to_string().cyan());
    }
    if written.is_empty() {
        println!(
            "{}",
            "テンプレートは既に存在します（上書きするには --force）".yellow()
        );
    }

    println!();
    println!("{}", "次のコマンドで設定を生成できます:".bold());
    println!("  {} render", "siteflow".cyan());
    Ok(())
}
