//! サービス定義ローダー
//!
//! ファイル発見、YAMLパース、正規化、必須項目チェックを統合

use crate::discovery::{resolve_descriptor_files, service_name_of};
use crate::error::{Result, SiteError};
use crate::location::normalize_locations;
use crate::model::{
    DEFAULT_HEALTH_PATH, DEFAULT_STOP_CMD, DEFAULT_UPSTREAM_HOST, DEFAULT_USER, RawDescriptor,
    ServiceDescriptor, flag, scalar_text,
};
use serde_yaml::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// スキップ理由の扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// 警告を出して続行（全件処理時）
    Lenient,
    /// 実行全体を中断（名前指定時）
    Strict,
}

impl LoadMode {
    /// 名前指定の有無からモードを決める
    pub fn for_selection(selection: &[String]) -> Self {
        if selection.is_empty() {
            Self::Lenient
        } else {
            Self::Strict
        }
    }
}

/// lenient モードで読み飛ばしたサービス定義
#[derive(Debug, Clone)]
pub struct SkippedDescriptor {
    pub path: PathBuf,
    pub reason: String,
}

/// ロード結果
#[derive(Debug, Clone, Default)]
pub struct LoadedDescriptors {
    pub services: Vec<ServiceDescriptor>,
    pub skipped: Vec<SkippedDescriptor>,
}

/// ストアからサービス定義をロード
///
/// 名前指定がなければ lenient、あれば strict で処理します。
#[instrument(skip(store_dir), fields(store_dir = %store_dir.display()))]
pub fn load_descriptors(store_dir: &Path, selection: &[String]) -> Result<LoadedDescriptors> {
    let files = resolve_descriptor_files(store_dir, selection)?;
    load_descriptor_files(&files, LoadMode::for_selection(selection))
}

/// 解決済みのファイル群をロード
pub fn load_descriptor_files(files: &[PathBuf], mode: LoadMode) -> Result<LoadedDescriptors> {
    let mut services = Vec::with_capacity(files.len());
    let skipped = visit_descriptor_files(files, mode, |service| {
        services.push(service);
        Ok(())
    })?;

    info!(
        loaded = services.len(),
        skipped = skipped.len(),
        "Descriptors loaded"
    );
    Ok(LoadedDescriptors { services, skipped })
}

/// ファイル順にサービス定義を検証し、有効なものを1件ずつ `visit` に渡す
///
/// 後続のファイルで strict モードが中断しても、それまでの `visit` の結果は残ります。
/// サービス名の重複は後から現れたファイルをスキップ理由として扱います。
pub fn visit_descriptor_files<F>(
    files: &[PathBuf],
    mode: LoadMode,
    mut visit: F,
) -> Result<Vec<SkippedDescriptor>>
where
    F: FnMut(ServiceDescriptor) -> Result<()>,
{
    let mut skipped = Vec::new();
    let mut seen: HashMap<String, PathBuf> = HashMap::new();

    for path in files {
        let parsed = parse_descriptor(path).and_then(|service| {
            match seen.get(&service.name) {
                Some(first) => Err(SiteError::DuplicateServiceName {
                    path: path.clone(),
                    name: service.name.clone(),
                    first: first.clone(),
                }),
                None => Ok(service),
            }
        });

        match parsed {
            Ok(service) => {
                seen.insert(service.name.clone(), path.clone());
                visit(service)?;
            }
            Err(e) if mode == LoadMode::Lenient && e.is_descriptor_skip() => {
                warn!(file = %path.display(), error = %e, "Skipping descriptor");
                skipped.push(SkippedDescriptor {
                    path: path.clone(),
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }

    Ok(skipped)
}

/// 1つのサービス定義ファイルをパースして検証
///
/// 読み込めないファイル（権限、UTF-8 でない内容）、YAMLとして不正、またはトップレベルが
/// マッピングでない場合は [`SiteError::MalformedDescriptor`]、必須項目の欠落は
/// [`SiteError::MissingFields`]、パスとして使えない名前は
/// [`SiteError::InvalidServiceName`] を返します。
#[instrument]
pub fn parse_descriptor(path: &Path) -> Result<ServiceDescriptor> {
    let content = std::fs::read_to_string(path).map_err(|e| SiteError::MalformedDescriptor {
        path: path.to_path_buf(),
        message: format!("読み込めません: {}", e),
    })?;
    parse_descriptor_str(&content, path)
}

/// 文字列からサービス定義をパース（`path` はエラー表示用）
pub fn parse_descriptor_str(content: &str, path: &Path) -> Result<ServiceDescriptor> {
    let malformed = |message: String| SiteError::MalformedDescriptor {
        path: path.to_path_buf(),
        message,
    };

    let value: Value = if content.trim().is_empty() {
        Value::Null
    } else {
        serde_yaml::from_str(content).map_err(|e| malformed(e.to_string()))?
    };
    let value = match value {
        // 空ファイルは空のマッピングとして扱う
        Value::Null => Value::Mapping(Default::default()),
        Value::Mapping(map) => Value::Mapping(map),
        other => {
            return Err(malformed(format!(
                "マッピングが必要ですが {} でした",
                kind_of(&other)
            )));
        }
    };
    let raw: RawDescriptor = serde_yaml::from_value(value).map_err(|e| malformed(e.to_string()))?;

    normalize_descriptor(raw, path)
}

/// 生の定義を正規化し、必須項目を検証
fn normalize_descriptor(raw: RawDescriptor, path: &Path) -> Result<ServiceDescriptor> {
    let name = scalar_text(raw.name.as_ref());
    let domain = scalar_text(raw.domain.as_ref());
    let upstream_port = scalar_text(raw.upstream_port.as_ref());
    let start_cmd = scalar_text(raw.start_cmd.as_ref());
    let working_dir = scalar_text(raw.working_dir.as_ref());

    let required = [
        ("name", &name),
        ("domain", &domain),
        ("upstream_port", &upstream_port),
        ("start_cmd", &start_cmd),
        ("working_dir", &working_dir),
    ];
    let missing: Vec<&'static str> = required
        .iter()
        .filter(|(_, value)| value.is_none())
        .map(|(field, _)| *field)
        .collect();
    if !missing.is_empty() {
        return Err(SiteError::MissingFields {
            path: path.to_path_buf(),
            fields: missing,
        });
    }

    let name = name.unwrap_or_default();
    if !is_safe_service_name(&name) {
        return Err(SiteError::InvalidServiceName {
            path: path.to_path_buf(),
            name,
        });
    }

    let upstream_host = scalar_text(raw.upstream_host.as_ref())
        .unwrap_or_else(|| DEFAULT_UPSTREAM_HOST.to_string());
    let upstream_port = upstream_port.unwrap_or_default();
    let locations = normalize_locations(raw.locations.as_ref(), &upstream_host, &upstream_port);

    let service = ServiceDescriptor {
        name,
        domain: domain.unwrap_or_default(),
        upstream_host,
        upstream_port,
        working_dir: working_dir.unwrap_or_default(),
        user: scalar_text(raw.user.as_ref()).unwrap_or_else(|| DEFAULT_USER.to_string()),
        start_cmd: start_cmd.unwrap_or_default(),
        stop_cmd: scalar_text(raw.stop_cmd.as_ref())
            .unwrap_or_else(|| DEFAULT_STOP_CMD.to_string()),
        health_path: scalar_text(raw.health_path.as_ref())
            .unwrap_or_else(|| DEFAULT_HEALTH_PATH.to_string()),
        static_root: scalar_text(raw.static_root.as_ref()),
        migrate_cmd: scalar_text(raw.migrate_cmd.as_ref()),
        allow_plain_http: flag(raw.allow_plain_http.as_ref()),
        locations,
    };

    if service_name_of(path).is_some_and(|stem| stem != service.name) {
        debug!(
            file = %path.display(),
            service = %service.name,
            "Descriptor name differs from file name"
        );
    }

    Ok(service)
}

/// 出力ファイル名に使える名前か（区切り文字と `..` を含まない）
fn is_safe_service_name(name: &str) -> bool {
    !name.contains(['/', '\\']) && !name.contains("..")
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}
