use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("サーバーURLが不正です: {0}。`chem-scan config --set-server http://HOST:PORT` で設定してください")]
    InvalidServerUrl(String),

    #[error("通信エラー: {0}")]
    Http(#[from] reqwest::Error),

    /// `body` は読めた場合のみ（サーバーが理由をJSONで返すことがある）
    #[error("サーバーエラー: {status} ({url})")]
    HttpStatus {
        status: u16,
        url: String,
        body: Option<String>,
    },

    #[error("入力エラー: {0}")]
    Input(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] chem_scan_common::Error),
}

impl ScanError {
    /// 利用者に見せずログだけに残す種類のエラーか（通信・応答解析）
    pub fn is_silent(&self) -> bool {
        matches!(
            self,
            ScanError::Http(_)
                | ScanError::HttpStatus { .. }
                | ScanError::Common(chem_scan_common::Error::Json(_))
                | ScanError::Common(chem_scan_common::Error::Parse(_))
        )
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
