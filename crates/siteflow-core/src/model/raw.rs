//! サービス定義ファイルの生の形
//!
//! YAMLでは数値・真偽値・文字列が混在して書かれるため、
//! 値は `serde_yaml::Value` のまま受け取り、ロード時に一度だけ正規化します。

use serde::Deserialize;
use serde_yaml::Value;

/// サービス定義ファイルのトップレベル
///
/// 未知のキー（デプロイスクリプト用の `repo_url` など）は無視されます。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawDescriptor {
    pub name: Option<Value>,
    pub domain: Option<Value>,
    pub upstream_host: Option<Value>,
    pub upstream_port: Option<Value>,
    pub working_dir: Option<Value>,
    pub user: Option<Value>,
    pub start_cmd: Option<Value>,
    pub stop_cmd: Option<Value>,
    pub health_path: Option<Value>,
    pub static_root: Option<Value>,
    pub migrate_cmd: Option<Value>,
    pub allow_plain_http: Option<Value>,
    pub locations: Option<Value>,
}

/// 空を表すクォート付きの番兵値
const EMPTY_SENTINELS: &[&str] = &["\"\"", "''"];

/// 真を表す文字列
const TRUTHY: &[&str] = &["true", "yes", "1", "on"];

/// スカラー値を正規化済みの文字列に変換
///
/// - 前後の空白を除去
/// - 空文字列と `""` / `''` は None
/// - シーケンスやマッピングなどスカラー以外は None
pub fn scalar_text(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };

    if text.is_empty() || EMPTY_SENTINELS.contains(&text.as_str()) {
        None
    } else {
        Some(text)
    }
}

/// 真偽値として解釈
///
/// YAMLの真偽値、0以外の数値、`true`/`yes`/`1`/`on`（大文字小文字を区別しない）を真とする。
pub fn flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => TRUTHY.contains(&s.trim().to_lowercase().as_str()),
        _ => false,
    }
}
