//! スキャン結果の解釈と行マージ
//!
//! `POST /scan` 応答を ScanOutcome に分類し、受理されたスキャンについて
//! スキャン情報と参照在庫データを1行にまとめる。

use crate::error::{Error, Result};
use crate::types::{
    CampaignStatistics, Category, InventoryRow, JsonRow, ScanRecord, ScanResponse,
    INVENTORY_BARCODE_FIELD, REDUNDANT_REFERENCE_KEYS, REFERENCE_FIELDS,
};
use serde_json::Value;

/// スキャン応答の分類
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// `success: false`（状態は変更しない）
    Rejected { message: String },
    /// サーバー側で重複と判定（行追加なし、集計も更新しない）
    Duplicate { message: String },
    /// 新規スキャン
    Accepted {
        row: ScanRecord,
        stats: Option<CampaignStatistics>,
        category: Category,
        inventory: Vec<InventoryRow>,
    },
}

/// 応答を分類する
pub fn interpret(response: &ScanResponse) -> Result<ScanOutcome> {
    if !response.success {
        let message = response
            .message
            .clone()
            .unwrap_or_else(|| "Scan failed.".to_string());
        return Ok(ScanOutcome::Rejected { message });
    }

    if response.is_duplicate() {
        let message = response.message.clone().unwrap_or_else(|| {
            format!("Duplicate scan: {}", response.barcode.as_deref().unwrap_or(""))
        });
        return Ok(ScanOutcome::Duplicate { message });
    }

    let inventory_rows = response.inventory_data.as_deref().unwrap_or(&[]);
    let row = reconcile(response, inventory_rows)?;
    let inventory = inventory_rows.iter().map(normalize_row).collect();

    Ok(ScanOutcome::Accepted {
        category: row.category.clone(),
        stats: response.stats.clone(),
        row,
        inventory,
    })
}

/// スキャン情報と参照在庫データをマージして1行を作る
///
/// - 既知の参照列はすべて空文字で初期化する（一致なしでも列が揃う）
/// - 在庫データは先頭1件のみ採用する
/// - `"nan"`（大小文字無視）の値は空文字にする
pub fn reconcile(response: &ScanResponse, inventory_rows: &[JsonRow]) -> Result<ScanRecord> {
    let barcode = response
        .barcode
        .as_deref()
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .ok_or_else(|| Error::Parse("accepted scan without barcode".into()))?;

    let mut record = ScanRecord {
        barcode: barcode.to_string(),
        timestamp: response.timestamp.clone().unwrap_or_default(),
        category: response.category.clone().unwrap_or_default(),
        scan_building: response.scan_building.clone(),
        scan_room: response.scan_room.clone(),
        scan_location: response.scan_location.clone(),
        fields: REFERENCE_FIELDS
            .iter()
            .map(|key| (key.to_string(), String::new()))
            .collect(),
    };

    if let Some(reference) = inventory_rows.first() {
        overlay(&mut record, reference);
    }

    Ok(record)
}

fn overlay(record: &mut ScanRecord, reference: &JsonRow) {
    for (key, value) in reference {
        if REDUNDANT_REFERENCE_KEYS.contains(&key.as_str()) {
            continue;
        }
        record.fields.insert(key.clone(), normalize_value(value));
    }
}

/// JSON値を表示用文字列に変換
///
/// `null` と `"nan"` は欠損扱いで空文字。
pub fn normalize_value(value: &Value) -> String {
    let text = match value {
        Value::Null => return String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if text.eq_ignore_ascii_case("nan") {
        String::new()
    } else {
        text
    }
}

/// 在庫データ1行を文字列化
pub fn normalize_row(row: &JsonRow) -> InventoryRow {
    row.iter()
        .map(|(key, value)| (key.clone(), normalize_value(value)))
        .collect()
}

/// `GET /api/scanned_data` の1行を ScanRecord に変換
///
/// 旧形式の `building` / `room` / `location` もスキャン情報として扱う。
/// バーコードがなければ `None`。
pub fn record_from_row(row: &JsonRow) -> Option<ScanRecord> {
    let barcode = row.get("barcode").map(normalize_value)?;
    let barcode = barcode.trim();
    if barcode.is_empty() {
        return None;
    }

    let text = |key: &str| row.get(key).map(normalize_value);
    let context = |scan_key: &str, legacy_key: &str| text(scan_key).or_else(|| text(legacy_key));

    let mut fields: InventoryRow = REFERENCE_FIELDS
        .iter()
        .map(|key| (key.to_string(), String::new()))
        .collect();
    for (key, value) in row {
        if is_scan_key(key) {
            continue;
        }
        fields.insert(key.clone(), normalize_value(value));
    }

    Some(ScanRecord {
        barcode: barcode.to_string(),
        timestamp: text("timestamp").unwrap_or_default(),
        category: Category::from(text("category").unwrap_or_default()),
        scan_building: context("scan_building", "building"),
        scan_room: context("scan_room", "room"),
        scan_location: context("scan_location", "location"),
        fields,
    })
}

fn is_scan_key(key: &str) -> bool {
    matches!(
        key,
        "barcode"
            | "timestamp"
            | "category"
            | "scan_building"
            | "scan_room"
            | "scan_location"
            | "building"
            | "room"
            | "location"
    )
}

/// 在庫一覧に未登録の行だけ追加する（`Barcode ID - Container` で判定）
///
/// 追加した件数を返す。
pub fn merge_inventory(existing: &mut Vec<InventoryRow>, incoming: &[InventoryRow]) -> usize {
    let mut added = 0;
    for row in incoming {
        let key = row.get(INVENTORY_BARCODE_FIELD);
        let exists = existing
            .iter()
            .any(|current| current.get(INVENTORY_BARCODE_FIELD) == key);
        if !exists {
            existing.push(row.clone());
            added += 1;
        }
    }
    added
}
