use crate::error::{Result, ScanError};
use chem_scan_common::SoundCue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// サーバーURLを上書きする環境変数
pub const SERVER_ENV: &str = "CHEM_SCAN_SERVER";

const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server_url: String,
    /// 応答待ちの上限（未設定なら待ち続ける）
    pub timeout_seconds: Option<u64>,
    pub validate_barcodes: bool,
    /// ブラウザで開始したキャンペーンのセッションCookie（`session=...`）
    pub session_cookie: Option<String>,
    /// 効果音の再生コマンド（例: `aplay`, `afplay`）
    pub sound_command: Option<String>,
    /// 効果音ID（`sound_found` など）→ 音声ファイル
    pub sounds: BTreeMap<String, PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.into(),
            timeout_seconds: None,
            validate_barcodes: true,
            session_cookie: None,
            sound_command: None,
            sounds: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ScanError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("chem-scan").join("config.json"))
    }

    /// 接続先URL（環境変数を優先）
    pub fn server_url(&self) -> String {
        match std::env::var(SERVER_ENV) {
            Ok(url) if !url.trim().is_empty() => url.trim().to_string(),
            _ => self.server_url.clone(),
        }
    }

    pub fn sound_file(&self, cue: SoundCue) -> Option<&Path> {
        self.sounds.get(cue.id()).map(PathBuf::as_path)
    }

    pub fn set_server_url(&mut self, url: String) -> Result<()> {
        let url = url.trim().trim_end_matches('/').to_string();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ScanError::InvalidServerUrl(url));
        }
        self.server_url = url;
        Ok(())
    }

    /// `CUE=PATH` 形式で効果音を登録（PATHが空なら解除）
    pub fn set_sound(&mut self, assignment: &str) -> Result<()> {
        let (cue, path) = assignment
            .split_once('=')
            .ok_or_else(|| ScanError::Input(format!("CUE=PATH 形式で指定してください: {}", assignment)))?;
        let cue: SoundCue = cue.parse().map_err(ScanError::Input)?;
        let path = path.trim();
        if path.is_empty() {
            self.sounds.remove(cue.id());
        } else {
            self.sounds.insert(cue.id().to_string(), PathBuf::from(path));
        }
        Ok(())
    }
}
