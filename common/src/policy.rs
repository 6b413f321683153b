//! 送信前チェック（形式検証・重複抑止）
//!
//! サーバーも重複を判定するため、ここでの重複チェックは操作性のための
//! 早期リジェクトにすぎない。

use crate::error::{Error, Result};
use crate::types::ScanRecord;
use regex::Regex;

/// バーコード形式の正規表現
#[derive(Debug, Clone)]
pub struct BarcodePattern {
    regex: Regex,
}

impl BarcodePattern {
    pub fn compile(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| Error::Config(format!("invalid barcode pattern {:?}: {}", pattern, e)))?;
        Ok(Self { regex })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn is_match(&self, barcode: &str) -> bool {
        self.regex.is_match(barcode)
    }
}

/// ローカルでのリジェクト理由
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    InvalidFormat,
    AlreadyScanned,
}

impl Rejection {
    pub fn message(&self) -> &'static str {
        match self {
            Rejection::InvalidFormat => "Invalid barcode format",
            Rejection::AlreadyScanned => "Barcode already scanned",
        }
    }
}

/// 送信可否の判定結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmitDecision {
    /// 空入力（何もしない）
    Ignore,
    Reject(Rejection),
    /// 送信する（トリム済みバーコード）
    Admit(String),
}

/// 入力バーコードを送信してよいか判定
///
/// 1. トリム後に空なら無視
/// 2. 正規表現が設定されていて一致しなければ形式エラー
/// 3. 取得済みの行に同じバーコードがあれば重複（大文字小文字を区別）
pub fn admit(
    input: &str,
    records: &[ScanRecord],
    pattern: Option<&BarcodePattern>,
) -> AdmitDecision {
    let barcode = input.trim();
    if barcode.is_empty() {
        return AdmitDecision::Ignore;
    }

    if let Some(pattern) = pattern {
        if !pattern.is_match(barcode) {
            return AdmitDecision::Reject(Rejection::InvalidFormat);
        }
    }

    if records.iter().any(|r| r.barcode == barcode) {
        return AdmitDecision::Reject(Rejection::AlreadyScanned);
    }

    AdmitDecision::Admit(barcode.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(barcode: &str) -> ScanRecord {
        ScanRecord {
            barcode: barcode.to_string(),
            ..Default::default()
        }
    }

    fn five_digits() -> BarcodePattern {
        BarcodePattern::compile(r"^\d{5}$").unwrap()
    }

    #[test]
    fn test_admit_matching_pattern() {
        let pattern = five_digits();
        assert_eq!(
            admit("12345", &[], Some(&pattern)),
            AdmitDecision::Admit("12345".into())
        );
    }

    #[test]
    fn test_admit_rejects_invalid_format() {
        let pattern = five_digits();
        assert_eq!(
            admit("abc", &[], Some(&pattern)),
            AdmitDecision::Reject(Rejection::InvalidFormat)
        );
        assert_eq!(Rejection::InvalidFormat.message(), "Invalid barcode format");
    }

    #[test]
    fn test_admit_rejects_many_non_matching_inputs() {
        let pattern = five_digits();
        for input in ["1234", "123456", "1234a", "a1234", "12 345"] {
            assert_eq!(
                admit(input, &[], Some(&pattern)),
                AdmitDecision::Reject(Rejection::InvalidFormat),
                "input {:?}",
                input
            );
        }
    }

    #[test]
    fn test_admit_rejects_duplicate_regardless_of_pattern() {
        let records = vec![record("12345"), record("A1000")];
        assert_eq!(
            admit("12345", &records, Some(&five_digits())),
            AdmitDecision::Reject(Rejection::AlreadyScanned)
        );
        assert_eq!(
            admit("A1000", &records, None),
            AdmitDecision::Reject(Rejection::AlreadyScanned)
        );
    }

    #[test]
    fn test_admit_duplicate_is_case_sensitive() {
        let records = vec![record("A1000")];
        assert_eq!(
            admit("a1000", &records, None),
            AdmitDecision::Admit("a1000".into())
        );
    }

    #[test]
    fn test_admit_trims_input() {
        assert_eq!(admit("  B200\n", &[], None), AdmitDecision::Admit("B200".into()));
        assert_eq!(admit("   ", &[], None), AdmitDecision::Ignore);
        assert_eq!(admit("", &[], Some(&five_digits())), AdmitDecision::Ignore);
    }

    #[test]
    fn test_pattern_unanchored_search() {
        let pattern = BarcodePattern::compile(r"\d{4}").unwrap();
        assert!(pattern.is_match("AB1234CD"));
        assert_eq!(pattern.as_str(), r"\d{4}");
    }

    #[test]
    fn test_pattern_compile_error() {
        let result = BarcodePattern::compile("([unclosed");
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
