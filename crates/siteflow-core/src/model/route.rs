//! 配信方式とリスナー構成

use serde::Serialize;

/// メインルート `/` の配信方式
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum RouteStrategy {
    /// 静的ファイルを試し、なければ `@app` 経由でプロキシ
    StaticWithFallback { root: String },
    /// 常にアップストリームへプロキシ
    DirectProxy,
}

impl RouteStrategy {
    pub fn label(&self) -> &'static str {
        match self {
            Self::StaticWithFallback { .. } => "static+fallback",
            Self::DirectProxy => "proxy",
        }
    }
}

/// server ブロックの構成
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListenerPlan {
    /// 80番のみでアプリを配信（HTTPS なし）
    PlainOnly,
    /// 80番は ACME + リダイレクト、443番でアプリを配信
    RedirectToTls,
}

impl ListenerPlan {
    pub fn has_tls(&self) -> bool {
        matches!(self, Self::RedirectToTls)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::PlainOnly => "http",
            Self::RedirectToTls => "https",
        }
    }
}
