//! カスタムロケーションの出力

use super::blocks::proxy_directives;
use crate::model::LocationRule;

/// location 内のインデント
const INDENT: &str = "        ";

/// カスタムロケーション群を server ブロック用のテキストに変換
///
/// 空でなければ各ブロックを空行で区切り、末尾に空行を付けて返します。
pub fn render_custom_locations(rules: &[LocationRule]) -> String {
    if rules.is_empty() {
        return String::new();
    }

    let blocks: Vec<String> = rules.iter().map(render_location).collect();
    format!("{}\n\n", blocks.join("\n\n"))
}

fn render_location(rule: &LocationRule) -> String {
    let mut lines = vec![format!("    location {} {{", rule.path)];

    if let Some(target) = &rule.proxy_pass {
        lines.push(proxy_directives(target));
    }

    // 空行はインデントのみの行として残す
    lines.extend(rule.extra.iter().map(|line| format!("{}{}", INDENT, line)));

    lines.push("    }".to_string());
    lines.join("\n")
}
