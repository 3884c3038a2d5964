//! カスタムロケーション定義

use serde::Serialize;

/// 正規化済みのカスタムロケーション
///
/// YAML形式：
/// ```yaml
/// locations:
///   - path: /api/
///     proxy_pass: http://127.0.0.1:9000
///     strip_prefix: true
///   - path: /static/
///     proxy_pass: false
///     extra: |
///       alias /srv/static/;
///       expires 7d;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationRule {
    pub path: String,
    /// None の場合 proxy_pass ディレクティブを出力しない
    pub proxy_pass: Option<String>,
    pub strip_prefix: bool,
    /// 追加ディレクティブ（行ごとに右端の空白を除去済み）
    pub extra: Vec<String>,
}
