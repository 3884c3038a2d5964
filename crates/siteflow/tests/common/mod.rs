use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const API_SERVICE: &str = r#"name: api
domain: api.example.com
upstream_port: 8080
working_dir: /srv/api
start_cmd: /usr/bin/api-server
"#;

pub const WEB_SERVICE: &str = r#"name: web
domain: web.example.com
upstream_port: "3000"
working_dir: /srv/web
start_cmd: docker compose -f /srv/web/compose.yml up -d
stop_cmd: docker compose -f /srv/web/compose.yml down
static_root: /srv/web/dist
"#;

pub struct TestProject {
    pub root: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        // 空の設定ファイルでグローバル設定の影響を避ける
        fs::write(root.path().join("siteflow.yml"), "").unwrap();
        Self { root }
    }

    pub fn write_config(&self, content: &str) {
        fs::write(self.root.path().join("siteflow.yml"), content).unwrap();
    }

    pub fn write_service(&self, name: &str, content: &str) {
        let dir = self.root.path().join("services");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("{}.yml", name)), content).unwrap();
    }

    #[allow(dead_code)]
    pub fn write_template(&self, file: &str, content: &str) {
        let dir = self.root.path().join("templates");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(file), content).unwrap();
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }

    #[allow(dead_code)]
    pub fn read_output(&self, relative: &str) -> String {
        fs::read_to_string(self.root.path().join("generated").join(relative)).unwrap()
    }

    #[allow(dead_code)]
    pub fn output_exists(&self, relative: &str) -> bool {
        self.root.path().join("generated").join(relative).exists()
    }

    /// プロジェクトをカレントディレクトリにした siteflow コマンド
    #[allow(deprecated)]
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("siteflow").unwrap();
        cmd.current_dir(self.path())
            .env_remove("SITEFLOW_CONFIG_PATH")
            .env_remove("SITEFLOW_SERVICES_DIR")
            .env_remove("SITEFLOW_TEMPLATES_DIR")
            .env_remove("SITEFLOW_OUT_DIR")
            .env_remove("RUST_LOG");
        cmd
    }
}
