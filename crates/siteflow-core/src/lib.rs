//! SiteFlow Core — サービス定義から nginx / systemd 設定を生成
//!
//! `services/<name>.yml` のサービス定義を読み込み、以下の2つを生成します。
//!
//! - nginx バーチャルホスト（`<out>/nginx/<name>.conf`）
//! - systemd ユニット（`<out>/systemd/<name>.service`）
//!
//! # 処理の流れ
//!
//! ローダー → ロケーション正規化 → ブロック生成 → server ブロック組み立て → テンプレート展開
//!
//! ネットワーク操作や特権操作は一切行いません。同じ入力からは常に同じバイト列を生成します。

pub mod discovery;
pub mod error;
pub mod loader;
pub mod location;
pub mod model;
pub mod nginx;
pub mod render;
pub mod systemd;
pub mod template;

pub use discovery::{dedupe_selection, resolve_descriptor_files};
pub use error::*;
pub use loader::{LoadMode, LoadedDescriptors, SkippedDescriptor, load_descriptors, parse_descriptor};
pub use model::*;
pub use nginx::{ServerBlocks, VhostOptions, render_vhost};
pub use render::*;
pub use template::{TemplateSet, write_default_templates};
