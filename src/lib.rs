//! chem-scan: 薬品在庫棚卸しキャンペーン用バーコードスキャン端末
//!
//! 解析・照合・状態機械は `chem_scan_common`、
//! 通信・端末表示・効果音・設定はこのクレートが受け持つ。

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod interactive;
pub mod logging;
pub mod scanner;
pub mod sound;
pub mod terminal;

pub use chem_scan_common as common;
