//! テンプレート展開機能
//!
//! `__NAME__` 形式のプレースホルダーをリテラルに置換します。
//! 置換は1パスのみで、置換後の文字列に含まれるトークンは再展開しません。
//! 置換表にないトークンはそのまま残します（任意セクションを持つテンプレートのため）。

use crate::error::{Result, SiteError};
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// プレースホルダー名 → 置換文字列
pub type Replacements = BTreeMap<String, String>;

/// nginx テンプレートのファイル名
pub const VHOST_TEMPLATE_FILE: &str = "nginx.conf.tmpl";
/// systemd テンプレートのファイル名
pub const UNIT_TEMPLATE_FILE: &str = "systemd.service.tmpl";

/// 組み込みの nginx テンプレート
pub const DEFAULT_VHOST_TEMPLATE: &str = r#"# Generated by siteflow. Local edits are overwritten on the next render.
__HTTP_BLOCK__
__HTTPS_BLOCK__"#;

/// 組み込みの systemd テンプレート
pub const DEFAULT_UNIT_TEMPLATE: &str = r#"# Generated by siteflow. Local edits are overwritten on the next render.
[Unit]
Description=__NAME__
After=network-online.target docker.service
Wants=network-online.target

[Service]
Type=__TYPE__
User=__USER__
WorkingDirectory=__WORKING_DIR__
ExecStart=__START_CMD__
ExecStop=__STOP_CMD__
RemainAfterExit=__REMAIN_AFTER_EXIT__
Restart=__RESTART__
RestartSec=5

[Install]
WantedBy=multi-user.target
"#;

/// トークン: 英大文字・数字を単一の `_` でつないだ名前を `__` で囲んだもの
const TOKEN_PATTERN: &str = r"__([A-Z0-9]+(?:_[A-Z0-9]+)*)__";

/// テンプレート文字列のトークンを置換
pub fn substitute(template: &str, replacements: &Replacements) -> Result<String> {
    let re = Regex::new(TOKEN_PATTERN).map_err(|e| SiteError::TemplateError {
        file: PathBuf::new(),
        message: format!("正規表現のコンパイルエラー: {}", e),
    })?;

    let rendered = re.replace_all(template, |caps: &Captures| match replacements.get(&caps[1]) {
        Some(value) => value.clone(),
        None => caps[0].to_string(),
    });
    Ok(rendered.into_owned())
}

/// nginx / systemd のテンプレート一式
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSet {
    pub vhost: String,
    pub unit: String,
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self {
            vhost: DEFAULT_VHOST_TEMPLATE.to_string(),
            unit: DEFAULT_UNIT_TEMPLATE.to_string(),
        }
    }
}

impl TemplateSet {
    /// テンプレートディレクトリから読み込む
    ///
    /// ファイルがなければ組み込みテンプレートを使います。
    #[tracing::instrument(skip(template_dir), fields(template_dir = %template_dir.display()))]
    pub fn load(template_dir: &Path) -> Result<Self> {
        Ok(Self {
            vhost: load_or_default(&template_dir.join(VHOST_TEMPLATE_FILE), DEFAULT_VHOST_TEMPLATE)?,
            unit: load_or_default(&template_dir.join(UNIT_TEMPLATE_FILE), DEFAULT_UNIT_TEMPLATE)?,
        })
    }
}

fn load_or_default(path: &Path, default: &str) -> Result<String> {
    if path.is_file() {
        debug!(template = %path.display(), "Using template file");
        read_file(path)
    } else {
        debug!(template = %path.display(), "Template not found, using built-in default");
        Ok(default.to_string())
    }
}

/// 組み込みテンプレートをテンプレートディレクトリに書き出す
///
/// 既存ファイルは `force` が true のときのみ上書きします。書き込んだファイルを返します。
#[tracing::instrument(skip(template_dir), fields(template_dir = %template_dir.display()))]
pub fn write_default_templates(template_dir: &Path, force: bool) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for (file, content) in [
        (VHOST_TEMPLATE_FILE, DEFAULT_VHOST_TEMPLATE),
        (UNIT_TEMPLATE_FILE, DEFAULT_UNIT_TEMPLATE),
    ] {
        let path = template_dir.join(file);
        if path.exists() && !force {
            debug!(template = %path.display(), "Keeping existing template");
            continue;
        }
        write_output(&path, content)?;
        written.push(path);
    }

    info!(written = written.len(), "Default templates written");
    Ok(written)
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| SiteError::TemplateError {
        file: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// ファイル全体を書き込む（親ディレクトリがなければ作成）
pub fn write_output(path: &Path, content: &str) -> Result<()> {
    let io_error = |e: std::io::Error| SiteError::IoError {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }
    std::fs::write(path, content).map_err(io_error)
}
