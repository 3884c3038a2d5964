//! モデル定義
//!
//! SiteFlowで使用されるデータモデルを定義します。
//! サービス定義ファイル（YAML）の生の形と、正規化後の不変な形を分けて持ちます。

mod descriptor;
mod location;
mod raw;
mod route;

// Re-exports
pub use descriptor::*;
pub use location::*;
pub use raw::*;
pub use route::*;
