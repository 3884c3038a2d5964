//! サービス定義

use super::location::LocationRule;
use super::route::{ListenerPlan, RouteStrategy};
use serde::Serialize;

/// upstream_host 未指定時の接続先
pub const DEFAULT_UPSTREAM_HOST: &str = "127.0.0.1";
/// user 未指定時の実行ユーザー
pub const DEFAULT_USER: &str = "www-data";
/// stop_cmd 未指定時のコマンド（何もしない）
pub const DEFAULT_STOP_CMD: &str = "/bin/true";
/// health_path 未指定時のパス
pub const DEFAULT_HEALTH_PATH: &str = "/health";

/// 正規化済みのサービス定義
///
/// YAML形式：
/// ```yaml
/// name: api
/// domain: api.example.com
/// upstream_port: 8080
/// working_dir: /srv/api
/// start_cmd: /usr/bin/api-server
/// locations:
///   - path: /ws/
///     strip_prefix: true
/// ```
///
/// ロード時に一度だけ正規化され、以降は変更されません。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceDescriptor {
    pub name: String,
    pub domain: String,
    pub upstream_host: String,
    /// 数値でも文字列でも書けるため文字列で保持
    pub upstream_port: String,
    pub working_dir: String,
    pub user: String,
    pub start_cmd: String,
    pub stop_cmd: String,
    pub health_path: String,
    /// 静的ファイルのルート（指定時は静的ファイル優先 + プロキシフォールバック）
    pub static_root: Option<String>,
    /// マイグレーションコマンド（デプロイ側のコラボレーターが使用）
    pub migrate_cmd: Option<String>,
    /// true の場合 HTTPS を生成せず、80番でアプリを直接配信
    pub allow_plain_http: bool,
    pub locations: Vec<LocationRule>,
}

impl ServiceDescriptor {
    /// デフォルトのプロキシ先 `http://<host>:<port>`
    pub fn upstream_url(&self) -> String {
        upstream_url(&self.upstream_host, &self.upstream_port)
    }

    /// メインルートの配信方式
    pub fn route_strategy(&self) -> RouteStrategy {
        match &self.static_root {
            Some(root) => RouteStrategy::StaticWithFallback { root: root.clone() },
            None => RouteStrategy::DirectProxy,
        }
    }

    /// リスナー構成
    pub fn listener_plan(&self) -> ListenerPlan {
        if self.allow_plain_http {
            ListenerPlan::PlainOnly
        } else {
            ListenerPlan::RedirectToTls
        }
    }

    /// start_cmd から導出されるユニット種別
    pub fn unit_kind(&self) -> UnitKind {
        UnitKind::detect(&self.start_cmd)
    }
}

/// `http://<host>:<port>` を組み立てる
pub fn upstream_url(host: &str, port: &str) -> String {
    format!("http://{}:{}", host, port)
}

/// systemd ユニットの種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnitKind {
    /// docker compose 等で起動して即終了するコマンド
    Container,
    /// 常駐プロセス
    Process,
}

impl UnitKind {
    /// start_cmd がコンテナオーケストレーションのサブコマンドかを判定
    pub fn detect(start_cmd: &str) -> Self {
        let lower = start_cmd.to_lowercase();
        if lower.contains("docker compose") || lower.contains("docker-compose") {
            Self::Container
        } else {
            Self::Process
        }
    }

    /// `Type=` の値
    pub fn service_type(&self) -> &'static str {
        match self {
            Self::Container => "oneshot",
            Self::Process => "simple",
        }
    }

    /// `RemainAfterExit=` の値
    pub fn remain_after_exit(&self) -> &'static str {
        match self {
            Self::Container => "yes",
            Self::Process => "no",
        }
    }

    /// `Restart=` の値
    pub fn restart(&self) -> &'static str {
        match self {
            Self::Container => "no",
            Self::Process => "always",
        }
    }
}
