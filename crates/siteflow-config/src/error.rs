use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "設定ファイルが見つかりません: {0}\n\
        --config または SITEFLOW_CONFIG_PATH で指定したパスを確認してください"
    )]
    ConfigNotFound(PathBuf),

    #[error("設定ファイルを解釈できません: {path}\n理由: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("IO エラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
