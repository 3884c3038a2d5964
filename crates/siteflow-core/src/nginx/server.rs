//! server ブロックの組み立て

use super::blocks::RouteBlocks;
use super::options::VhostOptions;
use crate::model::{ListenerPlan, ServiceDescriptor};

/// テンプレートの `__HTTP_BLOCK__` / `__HTTPS_BLOCK__` に入る server ブロック
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerBlocks {
    /// 80番（常に生成）
    pub http: String,
    /// 443番（`ListenerPlan::RedirectToTls` のときのみ。それ以外は空）
    pub https: String,
}

/// HTTPS 側に付与するセキュリティヘッダー
const SECURITY_HEADERS: &[(&str, &str)] = &[
    ("X-Frame-Options", "SAMEORIGIN"),
    ("X-XSS-Protection", "1; mode=block"),
    ("X-Content-Type-Options", "nosniff"),
    ("Referrer-Policy", "no-referrer-when-downgrade"),
    (
        "Strict-Transport-Security",
        "max-age=31536000; includeSubDomains; preload",
    ),
];

/// サービス定義とディレクティブ断片から server ブロックを組み立てる
pub fn compose_server_blocks(
    service: &ServiceDescriptor,
    blocks: &RouteBlocks,
    custom_locations: &str,
    options: &VhostOptions,
) -> ServerBlocks {
    match service.listener_plan() {
        ListenerPlan::PlainOnly => ServerBlocks {
            http: plain_app_server(service, blocks, custom_locations, options),
            https: String::new(),
        },
        ListenerPlan::RedirectToTls => ServerBlocks {
            http: plain_redirect_server(service, options),
            https: tls_app_server(service, blocks, custom_locations, options),
        },
    }
}

/// 80番: ACME チャレンジ + アプリ本体
fn plain_app_server(
    service: &ServiceDescriptor,
    blocks: &RouteBlocks,
    custom_locations: &str,
    options: &VhostOptions,
) -> String {
    let mut out = plain_header(service, options);
    if !blocks.root_directive.is_empty() {
        out.push_str(&blocks.root_directive);
        out.push_str("\n\n");
    }
    out.push_str("    # Main location\n");
    out.push_str(&app_body(service, blocks, custom_locations));
    out.push_str("}\n");
    out
}

/// 80番: ACME チャレンジ + HTTPS へのリダイレクト
fn plain_redirect_server(service: &ServiceDescriptor, options: &VhostOptions) -> String {
    let mut out = plain_header(service, options);
    out.push_str("    # Redirect HTTP to HTTPS\n");
    out.push_str("    return 301 https://$host$request_uri;\n");
    out.push_str("}\n");
    out
}

/// 443番: 証明書 + セキュリティヘッダー + アプリ本体
fn tls_app_server(
    service: &ServiceDescriptor,
    blocks: &RouteBlocks,
    custom_locations: &str,
    options: &VhostOptions,
) -> String {
    let domain = &service.domain;
    let mut out = String::new();
    out.push_str("server {\n");
    out.push_str("    listen 443 ssl;\n");
    out.push_str("    listen [::]:443 ssl;\n");
    out.push_str(&format!("    server_name {};\n\n", domain));
    out.push_str("    # Certbot paths; adjust if you store certs elsewhere.\n");
    out.push_str(&format!(
        "    ssl_certificate {};\n",
        options.certificate_path(domain)
    ));
    out.push_str(&format!(
        "    ssl_certificate_key {};\n",
        options.certificate_key_path(domain)
    ));
    out.push_str(&format!("    include {};\n\n", options.ssl_options_include));
    out.push_str(&format!(
        "    client_max_body_size {};\n",
        options.client_max_body_size
    ));
    for (name, value) in SECURITY_HEADERS {
        out.push_str(&format!("    add_header {} \"{}\" always;\n", name, value));
    }
    out.push('\n');
    out.push_str(&blocks.root_directive);
    out.push('\n');
    out.push_str("    # Main location: either proxies or falls back from static to proxy.\n");
    out.push_str(&app_body(service, blocks, custom_locations));
    out.push_str("}\n");
    out
}

/// `server {` から ACME チャレンジまで（80番共通）
fn plain_header(service: &ServiceDescriptor, options: &VhostOptions) -> String {
    format!(
        "server {{\n    listen 80;\n    server_name {};\n\n    # ACME challenge\n    location /.well-known/acme-challenge/ {{\n        root {};\n    }}\n\n",
        service.domain, options.acme_webroot
    )
}

/// メインルート、フォールバック、カスタムロケーション、ヘルスチェック
fn app_body(service: &ServiceDescriptor, blocks: &RouteBlocks, custom_locations: &str) -> String {
    format!(
        "    location / {{\n{}\n    }}\n\n{}{}{}",
        blocks.main_route,
        blocks.fallback_route,
        custom_locations,
        health_location(&service.health_path)
    )
}

/// 固定の "healthy" を返すヘルスチェック用ロケーション
///
/// アプリの状態は見ない。深いヘルスチェックは外部の呼び出し側の責務。
pub fn health_location(health_path: &str) -> String {
    format!(
        "    # Health endpoint\n    location {} {{\n        access_log off;\n        return 200 \"healthy\\n\";\n        add_header Content-Type text/plain;\n    }}\n",
        health_path
    )
}
