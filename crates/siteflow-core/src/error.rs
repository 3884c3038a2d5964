use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SiteError {
    #[error("IO エラー: {path}\n理由: {message}")]
    IoError { path: PathBuf, message: String },

    #[error("サービス定義が見つかりません ({}): {}", .dir.display(), .names.join(", "))]
    DescriptorNotFound { dir: PathBuf, names: Vec<String> },

    #[error("サービス定義を解釈できません: {path}\n理由: {message}")]
    MalformedDescriptor { path: PathBuf, message: String },

    #[error("{} をスキップしました: 必須項目がありません ({})", .path.display(), .fields.join(", "))]
    MissingFields {
        path: PathBuf,
        fields: Vec<&'static str>,
    },

    #[error("{} をスキップしました: サービス名 `{}` はパスとして使えません（`/`、`\\`、`..` は不可）", .path.display(), .name)]
    InvalidServiceName { path: PathBuf, name: String },

    #[error("{} をスキップしました: サービス名 `{}` は {} で定義済みです", .path.display(), .name, .first.display())]
    DuplicateServiceName {
        path: PathBuf,
        name: String,
        first: PathBuf,
    },

    #[error("ファイル発見エラー: {path}\n理由: {message}")]
    DiscoveryError { path: PathBuf, message: String },

    #[error("テンプレートエラー: {file}\n理由: {message}")]
    TemplateError { file: PathBuf, message: String },

    #[error("生成済みファイルが見つかりません: {}", .paths.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", "))]
    ArtifactMissing { paths: Vec<PathBuf> },

    #[error("レンダリングされたサービスがありません")]
    NoServicesRendered,
}

impl SiteError {
    /// サービス定義単位のスキップ理由かどうか
    ///
    /// lenient モードではこれらのエラーは警告に格下げされる。
    pub fn is_descriptor_skip(&self) -> bool {
        matches!(
            self,
            SiteError::MalformedDescriptor { .. }
                | SiteError::MissingFields { .. }
                | SiteError::InvalidServiceName { .. }
                | SiteError::DuplicateServiceName { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SiteError>;
