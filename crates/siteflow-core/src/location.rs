//! カスタムロケーションの正規化
//!
//! サービス定義の `locations` を [`LocationRule`] の列に変換します。
//! 不正なエントリはバッチ全体を失敗させず、警告を出して読み飛ばします。

use crate::model::{LocationRule, flag, scalar_text, upstream_url};
use serde_yaml::Value;
use tracing::warn;

/// proxy_pass を無効化する文字列
const DISABLED_MARKERS: &[&str] = &["false", "off"];

/// `locations` の生の値を正規化
///
/// `upstream_host` / `upstream_port` は proxy_pass 未指定時のデフォルト
/// `http://<host>:<port>` の組み立てに使います。
/// 出力順は入力順と同じです（後のロケーションが優先される設定もあるため）。
pub fn normalize_locations(
    raw: Option<&Value>,
    upstream_host: &str,
    upstream_port: &str,
) -> Vec<LocationRule> {
    let entries = match raw {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Sequence(entries)) => entries,
        Some(_) => {
            warn!("Ignoring locations because it is not a list");
            return Vec::new();
        }
    };

    let default_proxy = upstream_url(upstream_host, upstream_port);
    entries
        .iter()
        .enumerate()
        .filter_map(|(idx, entry)| normalize_entry(idx + 1, entry, &default_proxy))
        .collect()
}

/// 1エントリを正規化（`index` は1始まり）
fn normalize_entry(index: usize, entry: &Value, default_proxy: &str) -> Option<LocationRule> {
    let Value::Mapping(map) = entry else {
        warn!("Ignoring locations[{}] (expected mapping)", index);
        return None;
    };

    let Some(path) = scalar_text(map.get("path")) else {
        warn!("Ignoring locations[{}] (missing path)", index);
        return None;
    };

    let strip_prefix = flag(map.get("strip_prefix"));
    let mut proxy_pass = resolve_proxy_pass(map.get("proxy_pass"), default_proxy);
    if strip_prefix
        && let Some(target) = proxy_pass.as_mut()
        && !target.ends_with('/')
    {
        target.push('/');
    }

    Some(LocationRule {
        path,
        proxy_pass,
        strip_prefix,
        extra: extra_lines(map.get("extra")),
    })
}

/// proxy_pass の解決
///
/// - `false` / `"off"` → 無効（None）
/// - 空でない文字列 → そのまま
/// - それ以外 → デフォルトのアップストリーム
fn resolve_proxy_pass(value: Option<&Value>, default_proxy: &str) -> Option<String> {
    match value {
        Some(Value::Bool(false)) => None,
        Some(Value::String(s)) if DISABLED_MARKERS.contains(&s.trim().to_lowercase().as_str()) => {
            None
        }
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => Some(default_proxy.to_string()),
    }
}

/// extra を行に分割（全体の末尾と各行の右端の空白を除去）
fn extra_lines(value: Option<&Value>) -> Vec<String> {
    let text = match value {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(_) => {
            warn!("Ignoring non-scalar extra in locations entry");
            return Vec::new();
        }
    };

    text.trim_end()
        .lines()
        .map(|line| line.trim_end().to_string())
        .collect()
}
