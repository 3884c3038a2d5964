//! サービス定義ファイルの発見
//!
//! サービス定義ストア（`services/` ディレクトリ）から `<name>.yml` を解決します。

use crate::error::{Result, SiteError};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// サービス定義ファイルの拡張子（優先順）
pub const DESCRIPTOR_EXTENSIONS: &[&str] = &["yml", "yaml"];

/// 処理対象のサービス定義ファイルを解決
///
/// - `selection` が空: ストア内の全ファイルをファイル名順に返す
/// - `selection` あり: 重複を除いた指定順で返す。存在しない名前があれば
///   全て列挙して [`SiteError::DescriptorNotFound`] を返す
#[tracing::instrument(skip(store_dir), fields(store_dir = %store_dir.display()))]
pub fn resolve_descriptor_files(store_dir: &Path, selection: &[String]) -> Result<Vec<PathBuf>> {
    if selection.is_empty() {
        return discover_descriptor_files(store_dir);
    }

    let mut missing = Vec::new();
    let mut files = Vec::new();
    for name in dedupe_selection(selection) {
        match find_descriptor_file(store_dir, &name) {
            Some(path) => {
                debug!(service = %name, file = %path.display(), "Resolved descriptor");
                files.push(path);
            }
            None => missing.push(name),
        }
    }

    if !missing.is_empty() {
        warn!(missing = ?missing, "Requested descriptors not found");
        return Err(SiteError::DescriptorNotFound {
            dir: store_dir.to_path_buf(),
            names: missing,
        });
    }

    Ok(files)
}

/// 名前指定を正規化（空の名前を除き、最初に現れた順で重複を除去）
pub fn dedupe_selection(selection: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    selection
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(name.to_string()))
        .map(str::to_string)
        .collect()
}

/// `<store>/<name>.yml`（なければ `.yaml`）を探す
pub fn find_descriptor_file(store_dir: &Path, name: &str) -> Option<PathBuf> {
    DESCRIPTOR_EXTENSIONS
        .iter()
        .map(|ext| store_dir.join(format!("{}.{}", name, ext)))
        .find(|path| path.is_file())
}

/// ストア直下のサービス定義ファイルを全て発見
///
/// ファイル名のアルファベット順にソートして返す。
/// 同じ名前の `.yml` と `.yaml` があれば `.yml` のみ
fn discover_descriptor_files(store_dir: &Path) -> Result<Vec<PathBuf>> {
    if !store_dir.is_dir() {
        warn!(dir = %store_dir.display(), "Service store directory does not exist");
        return Ok(Vec::new());
    }

    let escaped = glob::Pattern::escape(&store_dir.to_string_lossy());
    let mut files = Vec::new();
    let mut seen = HashSet::new();
    for ext in DESCRIPTOR_EXTENSIONS {
        let pattern = format!("{}/*.{}", escaped, ext);
        let entries = glob::glob(&pattern).map_err(|e| SiteError::DiscoveryError {
            path: store_dir.to_path_buf(),
            message: format!("パターンが不正です: {}", e),
        })?;

        for entry in entries {
            let path = entry.map_err(|e| SiteError::DiscoveryError {
                path: e.path().to_path_buf(),
                message: format!("ディレクトリエントリの読み込みに失敗: {}", e.error()),
            })?;
            if !path.is_file() {
                continue;
            }
            // 同名の .yml があれば .yaml は無視
            let name = service_name_of(&path).unwrap_or_default().to_string();
            if seen.insert(name) {
                files.push(path);
            } else {
                debug!(file = %path.display(), "Shadowed by a .yml descriptor");
            }
        }
    }

    // アルファベット順にソート
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    if files.is_empty() {
        warn!(dir = %store_dir.display(), "No service files found");
    } else {
        info!(service_count = files.len(), "Discovered service files");
    }

    Ok(files)
}

/// ファイル名からサービス名（拡張子なし）を取り出す
pub fn service_name_of(path: &Path) -> Option<&str> {
    path.file_stem().and_then(|s| s.to_str())
}
