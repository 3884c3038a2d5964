use siteflow_config::ResolvedConfig;
use siteflow_core::collect_domains;

/// ドメイン一覧を1行1件（または JSON 配列）で標準出力へ
pub fn handle(config: &ResolvedConfig, services: &[String], json: bool) -> anyhow::Result<()> {
    let domains = collect_domains(&config.paths.services_dir, services)?;

    if json {
        println!("{}", serde_json::to_string(&domains)?);
    } else {
        for domain in &domains {
            println!("{}", domain);
        }
    }
    Ok(())
}
