//! バーチャルホスト生成時の環境依存値

use serde::Deserialize;

/// 生成されるバーチャルホストの環境依存値
///
/// デフォルトは certbot + Debian 系 nginx の標準配置です。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct VhostOptions {
    /// ACME チャレンジの webroot
    pub acme_webroot: String,
    /// 証明書ディレクトリ（`<cert_root>/<domain>/fullchain.pem`）
    pub cert_root: String,
    /// certbot が配置する SSL オプションファイル
    pub ssl_options_include: String,
    pub client_max_body_size: String,
}

impl Default for VhostOptions {
    fn default() -> Self {
        Self {
            acme_webroot: "/var/www/certbot".to_string(),
            cert_root: "/etc/letsencrypt/live".to_string(),
            ssl_options_include: "/etc/letsencrypt/options-ssl-nginx.conf".to_string(),
            client_max_body_size: "20m".to_string(),
        }
    }
}

impl VhostOptions {
    /// ドメインの証明書パス
    pub fn certificate_path(&self, domain: &str) -> String {
        format!("{}/{}/fullchain.pem", self.cert_root.trim_end_matches('/'), domain)
    }

    /// ドメインの秘密鍵パス
    pub fn certificate_key_path(&self, domain: &str) -> String {
        format!("{}/{}/privkey.pem", self.cert_root.trim_end_matches('/'), domain)
    }
}
