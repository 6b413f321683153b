//! スキャン結果の型定義
//!
//! CLIと将来のフロントエンドで共有される型:
//! - Category / SoundCue: サーバーが付与する分類と効果音
//! - CampaignStatistics: キャンペーン集計（サーバーが正）
//! - ScanRecord: 在庫データをマージした表示行
//! - ScanResponse: `POST /scan` の応答

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// 参照在庫データの既知列（表示列の順序）
pub const REFERENCE_FIELDS: [&str; 9] = [
    "Status - Container",
    "Time Sensitive - Container",
    "Location - Container",
    "Owner Name - Container",
    "Product Identifier - Product",
    "Current Quantity - Container",
    "Unit - Container",
    "NFPA 704 Health Hazard - Product",
    "NFPA 704 Flammability Hazard - Product",
];

/// 在庫行の識別キー
pub const INVENTORY_BARCODE_FIELD: &str = "Barcode ID - Container";

/// スキャン側が持つため在庫データからは除外するキー
pub const REDUNDANT_REFERENCE_KEYS: [&str; 3] = ["building", "room", "location"];

/// 在庫データ1行（値はすべて文字列化済み）
pub type InventoryRow = BTreeMap<String, String>;

/// サーバー応答のJSONオブジェクト
pub type JsonRow = Map<String, Value>;

/// スキャン分類
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Found,
    NotFound,
    Archived,
    Active,
    Duplicate,
    /// 未知の分類（効果音なし）
    Unknown(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Category::Found => "found",
            Category::NotFound => "not_found",
            Category::Archived => "archived",
            Category::Active => "active",
            Category::Duplicate => "duplicate",
            Category::Unknown(other) => other,
        }
    }

    /// 分類に対応する効果音
    pub fn sound_cue(&self) -> Option<SoundCue> {
        match self {
            Category::Found => Some(SoundCue::Found),
            Category::Active => Some(SoundCue::Active),
            Category::NotFound => Some(SoundCue::NotFound),
            Category::Archived => Some(SoundCue::Archived),
            Category::Duplicate => Some(SoundCue::Duplicate),
            Category::Unknown(_) => None,
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::Unknown(String::new())
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        match value.as_str() {
            "found" => Category::Found,
            "not_found" => Category::NotFound,
            "archived" => Category::Archived,
            "active" => Category::Active,
            "duplicate" => Category::Duplicate,
            _ => Category::Unknown(value),
        }
    }
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        Category::from(value.to_string())
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.as_str().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 効果音の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCue {
    Found,
    Active,
    NotFound,
    Archived,
    Duplicate,
}

impl SoundCue {
    pub const ALL: [SoundCue; 5] = [
        SoundCue::Found,
        SoundCue::Active,
        SoundCue::NotFound,
        SoundCue::Archived,
        SoundCue::Duplicate,
    ];

    /// 設定ファイル・画面上での識別子
    pub fn id(&self) -> &'static str {
        match self {
            SoundCue::Found => "sound_found",
            SoundCue::Active => "sound_active",
            SoundCue::NotFound => "sound_not_found",
            SoundCue::Archived => "sound_archived",
            SoundCue::Duplicate => "sound_duplicate",
        }
    }
}

impl std::str::FromStr for SoundCue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        let key = key.strip_prefix("sound_").unwrap_or(&key);
        match key {
            "found" => Ok(SoundCue::Found),
            "active" => Ok(SoundCue::Active),
            "not_found" => Ok(SoundCue::NotFound),
            "archived" => Ok(SoundCue::Archived),
            "duplicate" => Ok(SoundCue::Duplicate),
            _ => Err(format!(
                "Unknown sound: {}. Use found, active, not_found, archived, or duplicate",
                s
            )),
        }
    }
}

/// キャンペーン集計
///
/// サーバーの値をそのまま表示する。クライアント側で加算はしない。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignStatistics {
    #[serde(alias = "total", skip_serializing_if = "Option::is_none")]
    pub total_scanned: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_found: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub found: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived: Option<u64>,
}

/// 表示用のスキャン行
///
/// 一度作成したら変更しない。`fields` には既知の参照列が必ず含まれる。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanRecord {
    pub barcode: String,
    pub timestamp: String,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_building: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_room: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_location: Option<String>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
}

impl ScanRecord {
    /// 参照列の値（未設定は空文字）
    pub fn field(&self, key: &str) -> &str {
        self.fields.get(key).map(String::as_str).unwrap_or("")
    }
}

/// `POST /scan` の応答
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScanResponse {
    pub success: bool,
    pub message: Option<String>,
    pub duplicate: Option<bool>,
    pub barcode: Option<String>,
    pub timestamp: Option<String>,
    pub category: Option<Category>,
    pub scan_building: Option<String>,
    pub scan_room: Option<String>,
    pub scan_location: Option<String>,
    pub inventory_data: Option<Vec<JsonRow>>,
    #[serde(alias = "campaign_stats", alias = "campaign_statistics")]
    pub stats: Option<CampaignStatistics>,
}

impl ScanResponse {
    pub fn is_duplicate(&self) -> bool {
        self.duplicate.unwrap_or(false)
    }
}
