//! 端末表示
//!
//! 表・カウンタ・メッセージ欄を標準出力に描画する Presenter 実装。

use chem_scan_common::{
    sort_by_timestamp_desc, CampaignStatistics, InventoryRow, Presenter, ScanRecord,
    INVENTORY_BARCODE_FIELD,
};
use chrono::{DateTime, NaiveDateTime};
use std::io::Write;

const ROW_COLUMNS: [(&str, usize); 8] = [
    ("Barcode", 12),
    ("Timestamp", 19),
    ("Category", 10),
    ("Building", 10),
    ("Room", 8),
    ("Product", 24),
    ("Qty", 8),
    ("Unit", 6),
];

const INVENTORY_COLUMNS: [(&str, &str, usize); 5] = [
    ("Barcode", INVENTORY_BARCODE_FIELD, 12),
    ("Status", "Status - Container", 10),
    ("Owner", "Owner Name - Container", 16),
    ("Product", "Product Identifier - Product", 24),
    ("Location", "Location - Container", 16),
];

/// ISO形式のタイムスタンプを `YYYY-MM-DD HH:MM:SS` に整形
///
/// 解釈できない値はそのまま返す。
pub fn format_timestamp(value: &str) -> String {
    let trimmed = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return dt.format("%Y-%m-%d %H:%M:%S").to_string();
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, pattern) {
            return dt.format("%Y-%m-%d %H:%M:%S").to_string();
        }
    }
    value.to_string()
}

/// 集計を1行の文字列にする（サーバーが返した項目のみ）
pub fn format_stats(stats: &CampaignStatistics) -> String {
    let items = [
        ("Total", stats.total_scanned),
        ("Found", stats.found),
        ("Active", stats.active),
        ("Not found", stats.not_found),
        ("Archived", stats.archived),
    ];
    items
        .iter()
        .filter_map(|(label, value)| value.map(|v| format!("{}: {}", label, v)))
        .collect::<Vec<_>>()
        .join("  ")
}

fn cell(value: &str, width: usize) -> String {
    let count = value.chars().count();
    if count > width {
        let mut cut: String = value.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    } else {
        format!("{}{}", value, " ".repeat(width - count))
    }
}

fn format_row(row: &ScanRecord) -> String {
    let values = [
        row.barcode.clone(),
        format_timestamp(&row.timestamp),
        row.category.to_string(),
        row.scan_building.clone().unwrap_or_default(),
        row.scan_room.clone().unwrap_or_default(),
        row.field("Product Identifier - Product").to_string(),
        row.field("Current Quantity - Container").to_string(),
        row.field("Unit - Container").to_string(),
    ];
    values
        .iter()
        .zip(ROW_COLUMNS.iter())
        .map(|(value, (_, width))| cell(value, *width))
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end()
        .to_string()
}

fn row_header() -> String {
    ROW_COLUMNS
        .iter()
        .map(|(label, width)| cell(label, *width))
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end()
        .to_string()
}

/// 端末出力の Presenter
pub struct TerminalPresenter<W: Write> {
    out: W,
}

impl TerminalPresenter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        // 表示先が閉じていても処理は続ける
        let _ = writeln!(self.out, "{}", text);
    }
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn set_rows(&mut self, rows: &[ScanRecord]) {
        let sorted = sort_by_timestamp_desc(rows);

        self.line(&format!("スキャン済み: {}件", rows.len()));
        if sorted.is_empty() {
            return;
        }
        self.line(&row_header());
        for row in sorted {
            self.line(&format_row(row));
        }
    }

    fn append_row(&mut self, row: &ScanRecord) {
        self.line(&format_row(row));
    }

    fn set_stats(&mut self, stats: &CampaignStatistics) {
        self.line(&format!("[{}]", format_stats(stats)));
    }

    fn show_message(&mut self, message: &str) {
        self.line(&format!("» {}", message));
    }

    fn set_inventory(&mut self, rows: &[InventoryRow]) {
        let Some(latest) = rows.last() else {
            return;
        };
        let summary = INVENTORY_COLUMNS
            .iter()
            .map(|(label, key, width)| {
                let value = latest.get(*key).map(String::as_str).unwrap_or("");
                format!("{}={}", label, cell(value, *width).trim_end())
            })
            .collect::<Vec<_>>()
            .join(" ");
        self.line(&format!("  在庫 ({}件): {}", rows.len(), summary));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chem_scan_common::Category;

    fn output(presenter: TerminalPresenter<Vec<u8>>) -> String {
        String::from_utf8(presenter.into_inner()).unwrap()
    }

    #[test]
    fn test_format_timestamp_iso() {
        assert_eq!(format_timestamp("2025-03-01T09:15:07"), "2025-03-01 09:15:07");
        assert_eq!(format_timestamp("2025-03-01T09:15:07.123"), "2025-03-01 09:15:07");
        assert_eq!(
            format_timestamp("2025-03-01T09:15:07+09:00"),
            "2025-03-01 09:15:07"
        );
    }

    #[test]
    fn test_format_timestamp_passthrough() {
        assert_eq!(format_timestamp("2025-03-01 09:15:07"), "2025-03-01 09:15:07");
        assert_eq!(format_timestamp("yesterday"), "yesterday");
        assert_eq!(format_timestamp(""), "");
    }

    #[test]
    fn test_format_stats_only_present_counters() {
        let stats = CampaignStatistics {
            total_scanned: Some(5),
            not_found: Some(2),
            active: Some(3),
            ..Default::default()
        };
        assert_eq!(format_stats(&stats), "Total: 5  Active: 3  Not found: 2");
    }

    #[test]
    fn test_cell_truncates() {
        assert_eq!(cell("abcdef", 4), "abc…");
        assert_eq!(cell("ab", 4), "ab  ");
    }

    #[test]
    fn test_set_rows_sorted_desc() {
        let mut presenter = TerminalPresenter::new(Vec::new());
        let rows = vec![
            ScanRecord {
                barcode: "OLD1".into(),
                timestamp: "2025-03-01 09:00:00".into(),
                category: Category::Found,
                ..Default::default()
            },
            ScanRecord {
                barcode: "NEW1".into(),
                timestamp: "2025-03-01 10:00:00".into(),
                category: Category::NotFound,
                ..Default::default()
            },
        ];
        presenter.set_rows(&rows);

        let text = output(presenter);
        assert!(text.contains("スキャン済み: 2件"));
        let new_pos = text.find("NEW1").unwrap();
        let old_pos = text.find("OLD1").unwrap();
        assert!(new_pos < old_pos);
    }

    #[test]
    fn test_show_message_and_stats() {
        let mut presenter = TerminalPresenter::new(Vec::new());
        presenter.show_message("Invalid barcode format");
        presenter.set_stats(&CampaignStatistics {
            total_scanned: Some(1),
            ..Default::default()
        });

        let text = output(presenter);
        assert!(text.contains("» Invalid barcode format"));
        assert!(text.contains("[Total: 1]"));
    }
}
