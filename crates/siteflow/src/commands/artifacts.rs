use siteflow_config::ResolvedConfig;
use siteflow_core::collect_artifacts;

/// 生成済みファイルを1行1件で標準出力へ
pub fn handle(config: &ResolvedConfig, services: &[String]) -> anyhow::Result<()> {
    for artifacts in collect_artifacts(&config.paths, services)? {
        println!("{}", artifacts.nginx.display());
        println!("{}", artifacts.systemd.display());
    }
    Ok(())
}
