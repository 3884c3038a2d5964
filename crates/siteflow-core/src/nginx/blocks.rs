//! メインルートとフォールバックルートの生成

use crate::model::{RouteStrategy, upstream_url};

/// 名前付きフォールバックロケーション
pub const FALLBACK_LOCATION: &str = "@app";

/// `RouteStrategy` から生成されるディレクティブ断片
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteBlocks {
    /// `root` / `index`（静的配信時のみ、server 直下のインデント）
    pub root_directive: String,
    /// `location / { ... }` の中身（末尾改行なし）
    pub main_route: String,
    /// `location @app { ... }`（静的配信時のみ、末尾改行あり）
    pub fallback_route: String,
}

impl RouteBlocks {
    /// 配信方式とアップストリームから断片を生成
    pub fn build(strategy: &RouteStrategy, host: &str, port: &str) -> Self {
        let upstream = upstream_url(host, port);
        match strategy {
            RouteStrategy::StaticWithFallback { root } => Self {
                root_directive: format!("    root {};\n    index index.html;", root),
                main_route: format!(
                    "        try_files $uri $uri/ {};\n        add_header Cache-Control \"no-cache, no-store\";",
                    FALLBACK_LOCATION
                ),
                fallback_route: format!(
                    "    location {} {{\n{}\n    }}\n",
                    FALLBACK_LOCATION,
                    proxy_directives(&upstream)
                ),
            },
            RouteStrategy::DirectProxy => Self {
                root_directive: String::new(),
                main_route: proxy_directives(&upstream),
                fallback_route: String::new(),
            },
        }
    }
}

/// `proxy_pass` と転送ヘッダー（location 内のインデント、末尾改行なし）
pub fn proxy_directives(target: &str) -> String {
    [
        format!("proxy_pass {};", target),
        "proxy_set_header Host $host;".to_string(),
        "proxy_set_header X-Real-IP $remote_addr;".to_string(),
        "proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;".to_string(),
        "proxy_set_header X-Forwarded-Proto $scheme;".to_string(),
    ]
    .iter()
    .map(|line| format!("        {}", line))
    .collect::<Vec<_>>()
    .join("\n")
}
