//! スキャンサーバーとの通信
//!
//! - `POST /scan`: バーコード送信
//! - `GET /api/scanned_data`: 取得済みスキャン一覧
//! - `GET /config`: バーコード正規表現を含む設定画面
//!
//! 本文はテキストのまま返す（`NaN` 補修とパースは共通ライブラリ側）。

use crate::config::Config;
use crate::error::{Result, ScanError};
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// サーバーへの送受信
#[allow(async_fn_in_trait)]
pub trait ScanBackend {
    async fn submit_scan(&self, barcode: &str) -> Result<String>;
    async fn fetch_scanned_data(&self) -> Result<String>;
    async fn fetch_config_page(&self) -> Result<String>;
}

#[derive(Serialize)]
struct ScanRequest<'a> {
    barcode: &'a str,
}

/// reqwestによる実装
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &Config) -> Result<Self> {
        Self::connect(config, &config.server_url())
    }

    /// 接続先URLを明示して生成（`--server` 指定時）
    pub fn connect(config: &Config, server_url: &str) -> Result<Self> {
        let base_url = server_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ScanError::InvalidServerUrl(base_url));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(seconds) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }
        match &config.session_cookie {
            Some(cookie) => {
                let value = HeaderValue::from_str(cookie.trim())
                    .map_err(|e| ScanError::Config(format!("session_cookie が不正です: {}", e)))?;
                let mut headers = HeaderMap::new();
                headers.insert(COOKIE, value);
                builder = builder.default_headers(headers);
            }
            None => {
                builder = builder.cookie_store(true);
            }
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn read_body(response: reqwest::Response) -> Result<String> {
        let status = response.status();
        let url = response.url().to_string();
        if !status.is_success() {
            let body = response.text().await.ok().filter(|b| !b.trim().is_empty());
            debug!("{} {} (本文 {})", status.as_u16(), url, body.as_ref().map_or(0, String::len));
            return Err(ScanError::HttpStatus {
                status: status.as_u16(),
                url,
                body,
            });
        }
        let body = response.text().await?;
        debug!("{} {} ({} bytes)", status.as_u16(), url, body.len());
        Ok(body)
    }

    async fn get_text(&self, path: &str) -> Result<String> {
        let response = self.client.get(self.endpoint(path)).send().await?;
        Self::read_body(response).await
    }
}

impl ScanBackend for HttpBackend {
    async fn submit_scan(&self, barcode: &str) -> Result<String> {
        let response = self
            .client
            .post(self.endpoint("/scan"))
            .json(&ScanRequest { barcode })
            .send()
            .await?;
        Self::read_body(response).await
    }

    async fn fetch_scanned_data(&self) -> Result<String> {
        self.get_text("/api/scanned_data").await
    }

    async fn fetch_config_page(&self) -> Result<String> {
        self.get_text("/config").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> Config {
        Config {
            server_url: url.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let backend = HttpBackend::new(&config("http://localhost:5000/")).unwrap();
        assert_eq!(backend.base_url(), "http://localhost:5000");
        assert_eq!(backend.endpoint("/scan"), "http://localhost:5000/scan");
        assert_eq!(
            backend.endpoint("api/scanned_data"),
            "http://localhost:5000/api/scanned_data"
        );
    }

    #[test]
    fn test_connect_overrides_config_url() {
        let backend =
            HttpBackend::connect(&config("http://localhost:5000"), " https://scan.example/ ").unwrap();
        assert_eq!(backend.base_url(), "https://scan.example");
    }

    #[test]
    fn test_rejects_url_without_scheme() {
        let result = HttpBackend::new(&config("localhost:5000"));
        assert!(matches!(result, Err(ScanError::InvalidServerUrl(_))));
    }

    #[test]
    fn test_rejects_invalid_cookie() {
        let mut config = config("http://localhost:5000");
        config.session_cookie = Some("session=abc\n".into());
        // 前後の空白は除去されるので改行だけでは不正にならない
        assert!(HttpBackend::new(&config).is_ok());

        config.session_cookie = Some("session=a\u{7f}b".into());
        assert!(matches!(HttpBackend::new(&config), Err(ScanError::Config(_))));
    }

    #[test]
    fn test_scan_request_body() {
        let body = serde_json::to_string(&ScanRequest { barcode: "A1234" }).unwrap();
        assert_eq!(body, r#"{"barcode":"A1234"}"#);
    }
}
