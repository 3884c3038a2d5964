//! SiteFlow の設定ファイル管理
//!
//! `siteflow.yml` を探索し、入出力ディレクトリとバーチャルホストの環境依存値を解決します。

pub mod error;

pub use error::*;

use serde::Deserialize;
use siteflow_core::{SitePaths, VhostOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

/// 設定ファイルパスを直接指定する環境変数
pub const CONFIG_PATH_ENV: &str = "SITEFLOW_CONFIG_PATH";

/// プロジェクト設定ディレクトリ
const PROJECT_CONFIG_DIR: &str = ".siteflow";

const CANDIDATES: [&str; 2] = ["siteflow.yml", ".siteflow.yml"];

/// 設定ファイルの内容
///
/// ```yaml
/// services_dir: services
/// templates_dir: templates
/// output_dir: generated
/// vhost:
///   cert_root: /etc/letsencrypt/live
///   client_max_body_size: 50m
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub services_dir: Option<PathBuf>,
    pub templates_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub vhost: VhostOptions,
}

/// 見つかった設定ファイル
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub path: PathBuf,
    /// `~/.config/siteflow/config.yml` かどうか
    pub global: bool,
}

impl ConfigFile {
    /// 相対パスの基準ディレクトリ
    ///
    /// グローバル設定ではカレントディレクトリ、`.siteflow/` 内ではその親を使います。
    pub fn base_dir(&self, current_dir: &Path) -> PathBuf {
        if self.global {
            return current_dir.to_path_buf();
        }
        let Some(parent) = self.path.parent() else {
            return current_dir.to_path_buf();
        };
        let parent = if parent.as_os_str().is_empty() {
            current_dir
        } else {
            parent
        };
        if parent.file_name().is_some_and(|n| n == PROJECT_CONFIG_DIR) {
            parent.parent().unwrap_or(parent).to_path_buf()
        } else {
            parent.to_path_buf()
        }
    }
}

/// コマンドライン / 環境変数によるディレクトリ指定
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathOverrides {
    pub services_dir: Option<PathBuf>,
    pub templates_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

/// 解決済みの設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub paths: SitePaths,
    pub vhost: VhostOptions,
    /// 読み込んだ設定ファイル（なければ None）
    pub source: Option<PathBuf>,
}

/// グローバル設定ファイルのパス
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("siteflow").join("config.yml"))
}

/// 設定ファイルを探す
///
/// 以下の優先順位で検索:
/// 1. 環境変数 SITEFLOW_CONFIG_PATH (直接パス指定)
/// 2. 指定ディレクトリ: siteflow.yml, .siteflow.yml
/// 3. ./.siteflow/ ディレクトリ内: siteflow.yml
/// 4. ~/.config/siteflow/config.yml (グローバル設定)
pub fn find_config_file_in(dir: &Path) -> Option<ConfigFile> {
    // 1. 環境変数で直接指定
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.is_file() {
            return Some(ConfigFile {
                path,
                global: false,
            });
        }
        debug!(path = %path.display(), "SITEFLOW_CONFIG_PATH does not point to a file");
    }

    // 2. 指定ディレクトリで検索
    for filename in CANDIDATES {
        let path = dir.join(filename);
        if path.is_file() {
            return Some(ConfigFile {
                path,
                global: false,
            });
        }
    }

    // 3. ./.siteflow/ ディレクトリで検索
    let path = dir.join(PROJECT_CONFIG_DIR).join(CANDIDATES[0]);
    if path.is_file() {
        return Some(ConfigFile {
            path,
            global: false,
        });
    }

    // 4. グローバル設定ファイル
    global_config_path()
        .filter(|path| path.is_file())
        .map(|path| ConfigFile { path, global: true })
}

/// 設定ファイルを読み込む
///
/// 空のファイルはすべてデフォルトとして扱います。
pub fn load_config(path: &Path) -> Result<SiteConfig> {
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(SiteConfig::default());
    }
    serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}

/// 設定を解決する
///
/// `explicit` が指定されていればそのファイルを必ず読み込み、なければ探索します。
/// ディレクトリの優先順位は 指定値 > 設定ファイル > デフォルト です。
#[tracing::instrument(skip(overrides))]
pub fn resolve_config(explicit: Option<&Path>, overrides: &PathOverrides) -> Result<ResolvedConfig> {
    let current_dir = std::env::current_dir()?;

    let config_file = match explicit {
        Some(path) if path.is_file() => Some(ConfigFile {
            path: path.to_path_buf(),
            global: false,
        }),
        Some(path) => return Err(ConfigError::ConfigNotFound(path.to_path_buf())),
        None => find_config_file_in(&current_dir),
    };

    let (config, base_dir) = match &config_file {
        Some(file) => {
            debug!(config = %file.path.display(), global = file.global, "Loading config file");
            (load_config(&file.path)?, file.base_dir(&current_dir))
        }
        None => {
            debug!("No config file found, using defaults");
            (SiteConfig::default(), current_dir.clone())
        }
    };

    Ok(ResolvedConfig {
        paths: resolve_paths(&config, &base_dir, overrides),
        vhost: config.vhost,
        source: config_file.map(|file| file.path),
    })
}

/// ディレクトリを決定
///
/// 設定ファイル内の相対パスは `base_dir` 基準、指定値はそのまま使います。
pub fn resolve_paths(config: &SiteConfig, base_dir: &Path, overrides: &PathOverrides) -> SitePaths {
    let defaults = SitePaths::from_root(base_dir);
    let pick = |over: &Option<PathBuf>, configured: &Option<PathBuf>, default: PathBuf| {
        over.clone()
            .or_else(|| configured.as_ref().map(|path| base_dir.join(path)))
            .unwrap_or(default)
    };

    SitePaths {
        services_dir: pick(
            &overrides.services_dir,
            &config.services_dir,
            defaults.services_dir,
        ),
        templates_dir: pick(
            &overrides.templates_dir,
            &config.templates_dir,
            defaults.templates_dir,
        ),
        output_dir: pick(
            &overrides.output_dir,
            &config.output_dir,
            defaults.output_dir,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    #[test]
    fn test_load_config() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let path = temp_dir.path().join("siteflow.yml");
        fs::write(
            &path,
            "services_dir: defs\nvhost:\n  client_max_body_size: 50m\n",
        )?;

        let config = load_config(&path)?;

        assert_eq!(config.services_dir, Some(PathBuf::from("defs")));
        assert_eq!(config.templates_dir, None);
        assert_eq!(config.vhost.client_max_body_size, "50m");
        assert_eq!(config.vhost.cert_root, "/etc/letsencrypt/live");
        Ok(())
    }

    #[test]
    fn test_load_empty_config() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let path = temp_dir.path().join("siteflow.yml");
        fs::write(&path, "\n")?;

        assert_eq!(load_config(&path)?, SiteConfig::default());
        Ok(())
    }

    #[test]
    fn test_load_invalid_config() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let path = temp_dir.path().join("siteflow.yml");
        fs::write(&path, "services_dir: [unclosed\n")?;

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
        Ok(())
    }

    #[test]
    fn test_resolve_paths_priority() {
        let base = Path::new("/srv/site");
        let config = SiteConfig {
            services_dir: Some(PathBuf::from("defs")),
            output_dir: Some(PathBuf::from("/var/out")),
            ..Default::default()
        };
        let overrides = PathOverrides {
            templates_dir: Some(PathBuf::from("my-templates")),
            ..Default::default()
        };

        let paths = resolve_paths(&config, base, &overrides);

        assert_eq!(paths.services_dir, PathBuf::from("/srv/site/defs"));
        assert_eq!(paths.templates_dir, PathBuf::from("my-templates"));
        assert_eq!(paths.output_dir, PathBuf::from("/var/out"));
    }

    #[test]
    fn test_resolve_paths_defaults() {
        let paths = resolve_paths(
            &SiteConfig::default(),
            Path::new("/srv/site"),
            &PathOverrides::default(),
        );
        assert_eq!(paths, SitePaths::from_root(Path::new("/srv/site")));
    }

    #[test]
    fn test_base_dir_of_project_config_dir() {
        let file = ConfigFile {
            path: PathBuf::from("/srv/site/.siteflow/siteflow.yml"),
            global: false,
        };
        assert_eq!(file.base_dir(Path::new("/tmp")), PathBuf::from("/srv/site"));
    }

    #[test]
    fn test_base_dir_of_global_config() {
        let file = ConfigFile {
            path: PathBuf::from("/home/me/.config/siteflow/config.yml"),
            global: true,
        };
        assert_eq!(file.base_dir(Path::new("/work")), PathBuf::from("/work"));
    }

    #[test]
    #[serial]
    fn test_find_config_file_in_dir() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        fs::write(temp_dir.path().join(".siteflow.yml"), "")?;

        temp_env::with_var_unset(CONFIG_PATH_ENV, || {
            let found = find_config_file_in(temp_dir.path());
            assert_eq!(
                found,
                Some(ConfigFile {
                    path: temp_dir.path().join(".siteflow.yml"),
                    global: false,
                })
            );
        });
        Ok(())
    }

    #[test]
    #[serial]
    fn test_find_config_file_priority() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        fs::write(temp_dir.path().join("siteflow.yml"), "")?;
        fs::write(temp_dir.path().join(".siteflow.yml"), "")?;

        temp_env::with_var_unset(CONFIG_PATH_ENV, || {
            let found = find_config_file_in(temp_dir.path()).map(|f| f.path);
            assert_eq!(found, Some(temp_dir.path().join("siteflow.yml")));
        });
        Ok(())
    }

    #[test]
    #[serial]
    fn test_find_config_file_in_project_dir() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let project_dir = temp_dir.path().join(".siteflow");
        fs::create_dir_all(&project_dir)?;
        fs::write(project_dir.join("siteflow.yml"), "")?;

        temp_env::with_var_unset(CONFIG_PATH_ENV, || {
            let found = find_config_file_in(temp_dir.path()).map(|f| f.path);
            assert_eq!(found, Some(project_dir.join("siteflow.yml")));
        });
        Ok(())
    }

    #[test]
    #[serial]
    fn test_find_config_file_env_var_wins() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        fs::write(temp_dir.path().join("siteflow.yml"), "")?;
        let custom = temp_dir.path().join("custom.yml");
        fs::write(&custom, "")?;

        temp_env::with_var(CONFIG_PATH_ENV, Some(custom.as_os_str()), || {
            let found = find_config_file_in(temp_dir.path()).map(|f| f.path);
            assert_eq!(found, Some(custom.clone()));
        });
        Ok(())
    }

    #[test]
    #[serial]
    fn test_resolve_config_missing_explicit_file() {
        let err = resolve_config(
            Some(Path::new("/nonexistent/siteflow.yml")),
            &PathOverrides::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ConfigNotFound(_)));
    }

    #[test]
    #[serial]
    fn test_resolve_config_explicit_file() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let path = temp_dir.path().join("siteflow.yml");
        fs::write(&path, "output_dir: out\nvhost:\n  acme_webroot: /srv/acme\n")?;

        let resolved = resolve_config(Some(&path), &PathOverrides::default())?;

        assert_eq!(resolved.source, Some(path.clone()));
        assert_eq!(resolved.paths.output_dir, temp_dir.path().join("out"));
        assert_eq!(resolved.paths.services_dir, temp_dir.path().join("services"));
        assert_eq!(resolved.vhost.acme_webroot, "/srv/acme");
        Ok(())
    }
}
