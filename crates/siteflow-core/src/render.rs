//! バッチレンダリング
//!
//! ロード → 正規化 → ブロック生成 → 組み立て → テンプレート展開 をサービスごとに順に実行し、
//! `<out>/nginx/<name>.conf` と `<out>/systemd/<name>.service` を書き出します。

use crate::discovery::{dedupe_selection, resolve_descriptor_files};
use crate::error::{Result, SiteError};
use crate::loader::{LoadMode, SkippedDescriptor, load_descriptors, visit_descriptor_files};
use crate::model::ServiceDescriptor;
use crate::nginx::{VhostOptions, render_vhost};
use crate::systemd::UnitSettings;
use crate::template::{Replacements, TemplateSet, substitute, write_output};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// nginx 出力のサブディレクトリ
pub const NGINX_DIR: &str = "nginx";
/// systemd 出力のサブディレクトリ
pub const SYSTEMD_DIR: &str = "systemd";

/// 入出力ディレクトリ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitePaths {
    /// サービス定義ストア
    pub services_dir: PathBuf,
    /// テンプレートディレクトリ
    pub templates_dir: PathBuf,
    /// 生成物の出力先
    pub output_dir: PathBuf,
}

impl SitePaths {
    /// プロジェクトルート配下の標準構成（services/, templates/, generated/）
    pub fn from_root(root: &Path) -> Self {
        Self {
            services_dir: root.join("services"),
            templates_dir: root.join("templates"),
            output_dir: root.join("generated"),
        }
    }

    /// サービスの生成物パス
    pub fn artifacts_for(&self, name: &str) -> RenderedArtifacts {
        RenderedArtifacts {
            nginx: self.output_dir.join(NGINX_DIR).join(format!("{}.conf", name)),
            systemd: self
                .output_dir
                .join(SYSTEMD_DIR)
                .join(format!("{}.service", name)),
        }
    }
}

/// 1サービス分の生成物
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifacts {
    pub nginx: PathBuf,
    pub systemd: PathBuf,
}

/// レンダリング済みのサービス
#[derive(Debug, Clone)]
pub struct RenderedService {
    pub name: String,
    pub domain: String,
    pub artifacts: RenderedArtifacts,
}

/// バッチレンダリングの結果
#[derive(Debug, Clone, Default)]
pub struct RenderReport {
    pub rendered: Vec<RenderedService>,
    pub skipped: Vec<SkippedDescriptor>,
}

impl RenderReport {
    /// 証明書発行に渡すドメイン一覧（出現順、重複なし）
    pub fn domains(&self) -> Vec<String> {
        unique_domains(self.rendered.iter().map(|svc| svc.domain.as_str()))
    }
}

/// 生成されたテキスト
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedText {
    pub vhost: String,
    pub unit: String,
}

/// テンプレートと出力先を保持するレンダラー
#[derive(Debug, Clone)]
pub struct Renderer {
    paths: SitePaths,
    templates: TemplateSet,
    options: VhostOptions,
}

impl Renderer {
    /// テンプレートディレクトリからテンプレートを読み込んで作成
    pub fn new(paths: SitePaths, options: VhostOptions) -> Result<Self> {
        let templates = TemplateSet::load(&paths.templates_dir)?;
        Ok(Self::with_templates(paths, templates, options))
    }

    pub fn with_templates(paths: SitePaths, templates: TemplateSet, options: VhostOptions) -> Self {
        Self {
            paths,
            templates,
            options,
        }
    }

    /// 1サービス分のテキストを生成（書き込みなし）
    pub fn render_text(&self, service: &ServiceDescriptor) -> Result<RenderedText> {
        let server = render_vhost(service, &self.options);
        let vhost_replacements: Replacements = [
            ("HTTP_BLOCK".to_string(), server.http),
            ("HTTPS_BLOCK".to_string(), server.https),
        ]
        .into_iter()
        .collect();
        let unit_replacements = UnitSettings::from_descriptor(service).replacements();

        Ok(RenderedText {
            vhost: substitute(&self.templates.vhost, &vhost_replacements)?,
            unit: substitute(&self.templates.unit, &unit_replacements)?,
        })
    }

    /// 1サービス分を生成して書き出す
    #[instrument(skip(self, service), fields(service = %service.name))]
    pub fn render_service(&self, service: &ServiceDescriptor) -> Result<RenderedArtifacts> {
        let text = self.render_text(service)?;
        let artifacts = self.paths.artifacts_for(&service.name);
        write_output(&artifacts.nginx, &text.vhost)?;
        write_output(&artifacts.systemd, &text.unit)?;
        info!(
            nginx = %artifacts.nginx.display(),
            systemd = %artifacts.systemd.display(),
            "Rendered service"
        );
        Ok(artifacts)
    }

    /// ストアのサービス定義をまとめて生成
    ///
    /// `selection` が空なら全件（lenient）、指定があればその名前のみ（strict）。
    /// 各サービスは検証後すぐに書き出すため、strict で途中の定義が不正だった場合も
    /// それまでの生成物は残ります。
    /// strict で1件も生成できなかった場合は [`SiteError::NoServicesRendered`]。
    #[instrument(skip(self))]
    pub fn render_batch(&self, selection: &[String]) -> Result<RenderReport> {
        let files = resolve_descriptor_files(&self.paths.services_dir, selection)?;

        let mut rendered = Vec::with_capacity(files.len());
        let skipped = visit_descriptor_files(&files, LoadMode::for_selection(selection), |service| {
            let artifacts = self.render_service(&service)?;
            rendered.push(RenderedService {
                name: service.name,
                domain: service.domain,
                artifacts,
            });
            Ok(())
        })?;
        let report = RenderReport { rendered, skipped };

        if report.rendered.is_empty() {
            if !selection.is_empty() {
                return Err(SiteError::NoServicesRendered);
            }
            warn!(dir = %self.paths.services_dir.display(), "No services rendered");
        }

        info!(
            rendered = report.rendered.len(),
            skipped = report.skipped.len(),
            "Render complete"
        );
        Ok(report)
    }
}

/// 対象サービスのドメイン一覧（出現順、重複なし）
#[instrument]
pub fn collect_domains(services_dir: &Path, selection: &[String]) -> Result<Vec<String>> {
    let loaded = load_descriptors(services_dir, selection)?;
    Ok(unique_domains(
        loaded.services.iter().map(|svc| svc.domain.as_str()),
    ))
}

/// 指定サービスの生成物を集める
///
/// 生成されていないファイルがあれば全て列挙して [`SiteError::ArtifactMissing`] を返します。
pub fn collect_artifacts(paths: &SitePaths, selection: &[String]) -> Result<Vec<RenderedArtifacts>> {
    let artifacts: Vec<RenderedArtifacts> = dedupe_selection(selection)
        .iter()
        .map(|name| paths.artifacts_for(name))
        .collect();

    let missing: Vec<PathBuf> = artifacts
        .iter()
        .flat_map(|a| [&a.nginx, &a.systemd])
        .filter(|path| !path.is_file())
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(SiteError::ArtifactMissing { paths: missing });
    }

    Ok(artifacts)
}

fn unique_domains<'a>(domains: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    domains
        .filter(|domain| seen.insert(*domain))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const API: &str = r#"
name: api
domain: api.example.com
upstream_port: 8080
working_dir: /srv/api
start_cmd: /usr/bin/api-server
"#;

    const WEB: &str = r#"
name: web
domain: www.example.com
upstream_port: "3000"
working_dir: /srv/web
start_cmd: docker compose -f compose.yml up -d
static_root: /srv/web/dist
allow_plain_http: "yes"
locations:
  - path: /api/
    proxy_pass: http://127.0.0.1:8080
    strip_prefix: true
  - path: /downloads/
    proxy_pass: false
    extra: |
      alias /srv/downloads/;
      autoindex on;
"#;

    struct Fixture {
        _dir: tempfile::TempDir,
        paths: SitePaths,
    }

    fn fixture(files: &[(&str, &str)]) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let paths = SitePaths::from_root(dir.path());
        fs::create_dir_all(&paths.services_dir).unwrap();
        for (name, content) in files {
            fs::write(paths.services_dir.join(name), content).unwrap();
        }
        Fixture { _dir: dir, paths }
    }

    fn renderer(paths: &SitePaths) -> Renderer {
        Renderer::new(paths.clone(), VhostOptions::default()).unwrap()
    }

    #[test]
    fn test_render_batch_writes_artifacts() -> Result<()> {
        let fx = fixture(&[("api.yml", API), ("web.yml", WEB)]);
        let report = renderer(&fx.paths).render_batch(&[])?;

        assert_eq!(report.rendered.len(), 2);
        assert!(report.skipped.is_empty());
        assert_eq!(report.domains(), vec!["api.example.com", "www.example.com"]);

        let api = fs::read_to_string(fx.paths.output_dir.join("nginx/api.conf")).unwrap();
        assert!(api.contains("return 301 https://$host$request_uri;"));
        assert!(api.contains("listen 443 ssl;"));
        assert!(api.contains("proxy_pass http://127.0.0.1:8080;"));
        assert!(!api.contains("__HTTP_BLOCK__"));

        let unit = fs::read_to_string(fx.paths.output_dir.join("systemd/api.service")).unwrap();
        assert!(unit.contains("Type=simple"));
        assert!(unit.contains("Restart=always"));
        assert!(unit.contains("ExecStart=/usr/bin/api-server"));
        Ok(())
    }

    #[test]
    fn test_render_plain_static_service() -> Result<()> {
        let fx = fixture(&[("web.yml", WEB)]);
        renderer(&fx.paths).render_batch(&["web".to_string()])?;

        let conf = fs::read_to_string(fx.paths.output_dir.join("nginx/web.conf")).unwrap();
        assert!(!conf.contains("listen 443"));
        assert!(!conf.contains("return 301"));
        assert!(conf.contains("try_files $uri $uri/ @app;"));
        assert!(conf.contains("location @app {"));
        assert!(conf.contains("proxy_pass http://127.0.0.1:8080/;"));
        assert!(conf.contains("    location /downloads/ {\n        alias /srv/downloads/;\n        autoindex on;\n    }"));

        let unit = fs::read_to_string(fx.paths.output_dir.join("systemd/web.service")).unwrap();
        assert!(unit.contains("Type=oneshot"));
        assert!(unit.contains("RemainAfterExit=yes"));
        assert!(unit.contains("Restart=no"));
        Ok(())
    }

    #[test]
    fn test_render_is_byte_identical() -> Result<()> {
        let fx = fixture(&[("api.yml", API), ("web.yml", WEB)]);
        let renderer = renderer(&fx.paths);

        renderer.render_batch(&[])?;
        let first_conf = fs::read(fx.paths.output_dir.join("nginx/web.conf")).unwrap();
        let first_unit = fs::read(fx.paths.output_dir.join("systemd/web.service")).unwrap();
        renderer.render_batch(&[])?;

        assert_eq!(first_conf, fs::read(fx.paths.output_dir.join("nginx/web.conf")).unwrap());
        assert_eq!(first_unit, fs::read(fx.paths.output_dir.join("systemd/web.service")).unwrap());
        Ok(())
    }

    #[test]
    fn test_lenient_batch_skips_and_continues() -> Result<()> {
        let fx = fixture(&[("api.yml", API), ("bad.yml", "name: bad\n")]);
        let report = renderer(&fx.paths).render_batch(&[])?;

        assert_eq!(report.rendered.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert!(!fx.paths.output_dir.join("nginx/bad.conf").exists());
        Ok(())
    }

    #[test]
    fn test_lenient_batch_skips_non_utf8_descriptor() -> Result<()> {
        let fx = fixture(&[("api.yml", API)]);
        fs::write(fx.paths.services_dir.join("bin.yml"), b"name: \xff\xfe\n").unwrap();

        let report = renderer(&fx.paths).render_batch(&[])?;

        assert_eq!(report.rendered.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert!(fx.paths.output_dir.join("nginx/api.conf").is_file());
        Ok(())
    }

    #[test]
    fn test_path_like_name_never_leaves_output_dir() -> Result<()> {
        let escaping = API.replace("name: api", "name: ../../escaped");
        let fx = fixture(&[("api.yml", API), ("escape.yml", escaping.as_str())]);

        let report = renderer(&fx.paths).render_batch(&[])?;

        assert_eq!(report.rendered.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        let root = fx.paths.output_dir.parent().unwrap();
        assert!(!root.join("escaped.conf").exists());
        assert!(!fx.paths.output_dir.join("escaped.conf").exists());

        let err = renderer(&fx.paths)
            .render_batch(&["escape".to_string()])
            .unwrap_err();
        assert!(matches!(err, SiteError::InvalidServiceName { .. }));
        Ok(())
    }

    #[test]
    fn test_strict_abort_keeps_earlier_outputs() {
        let fx = fixture(&[("api.yml", API), ("bad.yml", "name: bad\n"), ("web.yml", WEB)]);

        let selection = vec!["api".to_string(), "bad".to_string(), "web".to_string()];
        let err = renderer(&fx.paths).render_batch(&selection).unwrap_err();

        assert!(matches!(err, SiteError::MissingFields { .. }));
        assert!(fx.paths.output_dir.join("nginx/api.conf").is_file());
        assert!(!fx.paths.output_dir.join("nginx/web.conf").exists());
    }

    #[test]
    fn test_empty_store_is_ok_without_selection() -> Result<()> {
        let fx = fixture(&[]);
        let report = renderer(&fx.paths).render_batch(&[])?;
        assert!(report.rendered.is_empty());
        Ok(())
    }

    #[test]
    fn test_strict_unknown_name_fails() {
        let fx = fixture(&[("api.yml", API)]);
        let err = renderer(&fx.paths)
            .render_batch(&["api".to_string(), "ghost".to_string()])
            .unwrap_err();

        assert!(matches!(err, SiteError::DescriptorNotFound { ref names, .. } if names == &["ghost"]));
        assert!(err.to_string().contains("ghost"));
        assert!(!fx.paths.output_dir.join("nginx/api.conf").exists());
    }

    #[test]
    fn test_strict_blank_selection_renders_nothing() {
        let fx = fixture(&[("api.yml", API)]);
        let err = renderer(&fx.paths)
            .render_batch(&["".to_string()])
            .unwrap_err();
        assert!(matches!(err, SiteError::NoServicesRendered));
    }

    #[test]
    fn test_custom_templates_are_used() -> Result<()> {
        let fx = fixture(&[("api.yml", API)]);
        fs::create_dir_all(&fx.paths.templates_dir).unwrap();
        fs::write(
            fx.paths.templates_dir.join("systemd.service.tmpl"),
            "[Service]\nUser=__USER__\nEnvironment=__ENV__\n",
        )
        .unwrap();

        renderer(&fx.paths).render_batch(&[])?;

        let unit = fs::read_to_string(fx.paths.output_dir.join("systemd/api.service")).unwrap();
        assert_eq!(unit, "[Service]\nUser=www-data\nEnvironment=__ENV__\n");
        Ok(())
    }

    #[test]
    fn test_collect_domains_dedupes() -> Result<()> {
        let api_v2 = API.replace("name: api", "name: api-v2");
        let fx = fixture(&[("api.yml", API), ("api-v2.yml", api_v2.as_str()), ("web.yml", WEB)]);

        let domains = collect_domains(&fx.paths.services_dir, &[])?;
        assert_eq!(domains, vec!["api.example.com", "www.example.com"]);

        let domains = collect_domains(&fx.paths.services_dir, &["web".to_string()])?;
        assert_eq!(domains, vec!["www.example.com"]);
        Ok(())
    }

    #[test]
    fn test_collect_artifacts() -> Result<()> {
        let fx = fixture(&[("api.yml", API), ("web.yml", WEB)]);
        renderer(&fx.paths).render_batch(&["api".to_string()])?;

        let artifacts = collect_artifacts(&fx.paths, &["api".to_string(), "api".to_string()])?;
        assert_eq!(artifacts.len(), 1);
        assert!(artifacts[0].nginx.ends_with("nginx/api.conf"));

        let err = collect_artifacts(&fx.paths, &["web".to_string()]).unwrap_err();
        match err {
            SiteError::ArtifactMissing { paths } => {
                assert_eq!(paths.len(), 2);
                assert!(paths[0].ends_with("nginx/web.conf"));
                assert!(paths[1].ends_with("systemd/web.service"));
            }
            other => panic!("Expected ArtifactMissing, got {other:?}"),
        }
        Ok(())
    }
}
