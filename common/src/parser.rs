//! サーバー応答パーサー
//!
//! スキャンサーバーは表計算由来の欠損値を `NaN` のまま出力するため、
//! 厳密なJSONとしては読めない。ここで補修してからパースする。

use crate::error::{Error, Result};
use crate::reconcile::record_from_row;
use crate::types::{CampaignStatistics, JsonRow, ScanRecord, ScanResponse};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::borrow::Cow;

/// 文字列リテラル外の単独 `NaN` トークンを `null` に置換
///
/// 文字列中の `"NaN"` はそのまま残す（行マージ時に別途空文字へ変換する）。
/// 置換は冪等。
///
/// # Examples
/// ```
/// use chem_scan_common::repair_nan_tokens;
///
/// let repaired = repair_nan_tokens(r#"{"qty": NaN, "unit": "NaN"}"#);
/// assert_eq!(repaired, r#"{"qty": null, "unit": "NaN"}"#);
/// ```
pub fn repair_nan_tokens(text: &str) -> Cow<'_, str> {
    if !text.contains("NaN") {
        return Cow::Borrowed(text);
    }

    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            i += 1;
            continue;
        }

        if b == b'"' {
            in_string = true;
        } else if b == b'N' && is_standalone_nan(bytes, i) {
            out.push_str(&text[copied..i]);
            out.push_str("null");
            i += 3;
            copied = i;
            continue;
        }
        i += 1;
    }

    out.push_str(&text[copied..]);
    Cow::Owned(out)
}

fn is_standalone_nan(bytes: &[u8], at: usize) -> bool {
    bytes[at..].starts_with(b"NaN")
        && (at == 0 || !is_word_byte(bytes[at - 1]))
        && bytes.get(at + 3).map_or(true, |b| !is_word_byte(*b))
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// `NaN` を補修してからパース
pub fn parse_lenient<T: DeserializeOwned>(text: &str) -> Result<T> {
    let repaired = repair_nan_tokens(text);
    Ok(serde_json::from_str(repaired.trim())?)
}

/// `POST /scan` の応答をパース
pub fn parse_scan_response(text: &str) -> Result<ScanResponse> {
    let value: Value = parse_lenient(text)?;
    if !value.is_object() {
        return Err(Error::Parse("scan response is not an object".into()));
    }
    Ok(serde_json::from_value(value)?)
}

/// `GET /api/scanned_data` の内容
#[derive(Debug, Clone, Default)]
pub struct ScannedData {
    pub rows: Vec<ScanRecord>,
    pub stats: Option<CampaignStatistics>,
}

/// `GET /api/scanned_data` の応答をパース
///
/// 版によって形式が異なる:
/// 1. 生の `[...]` 配列
/// 2. `{ data: [...], campaign_stats | campaign_statistics: {...} }`
///
/// バーコードのない行は読み飛ばす。
pub fn parse_scanned_data(text: &str) -> Result<ScannedData> {
    let value: Value = parse_lenient(text)?;

    let (rows, stats) = match value {
        Value::Array(rows) => (rows, None),
        Value::Object(mut object) => {
            let rows = match object.remove("data") {
                Some(Value::Array(rows)) => rows,
                Some(Value::Null) | None => Vec::new(),
                Some(_) => return Err(Error::Parse("`data` is not an array".into())),
            };
            let stats = ["campaign_statistics", "campaign_stats", "stats"]
                .iter()
                .find_map(|key| object.remove(*key))
                .filter(|v| !v.is_null())
                .map(serde_json::from_value::<CampaignStatistics>)
                .transpose()?;
            (rows, stats)
        }
        _ => return Err(Error::Parse("scanned data is neither array nor object".into())),
    };

    let rows = rows
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|row: &JsonRow| record_from_row(row))
        .collect();

    Ok(ScannedData { rows, stats })
}

/// 設定画面のHTML断片からバーコード正規表現を抽出
///
/// `id="barcode_regex"` を持つ要素の `value` 属性を返す。
/// 見つからない・空の場合は `None`（検証なし）。
pub fn extract_barcode_pattern(html: &str) -> Option<String> {
    lazy_static::lazy_static! {
        static ref TAG_RE: Regex = Regex::new(
            r#"(?is)<[a-z][^>]*\bid\s*=\s*(?:"barcode_regex"|'barcode_regex'|barcode_regex\b)[^>]*>"#
        ).unwrap();
        static ref VALUE_RE: Regex = Regex::new(
            r#"(?is)\bvalue\s*=\s*(?:"([^"]*)"|'([^']*)')"#
        ).unwrap();
    }

    let tag = TAG_RE.find(html)?.as_str();
    let caps = VALUE_RE.captures(tag)?;
    let raw = caps.get(1).or_else(|| caps.get(2))?.as_str();
    let pattern = unescape_html(raw.trim());

    if pattern.is_empty() {
        None
    } else {
        Some(pattern)
    }
}

/// テンプレートでエスケープされた属性値を戻す
fn unescape_html(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#34;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}
