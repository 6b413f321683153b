//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("A scan is already in flight")]
    Busy,

    #[error("No scan in flight")]
    NotInFlight,
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
