//! Chem Scan Common Library
//!
//! スキャン端末の通信以外のロジック（型、応答の補修・パース、
//! 行マージ、送信前チェック、セッション状態）

pub mod types;
pub mod error;
pub mod parser;
pub mod reconcile;
pub mod policy;
pub mod session;
pub mod controller;

pub use types::{
    CampaignStatistics, Category, InventoryRow, JsonRow, ScanRecord, ScanResponse, SoundCue,
    INVENTORY_BARCODE_FIELD, REFERENCE_FIELDS,
};
pub use error::{Error, Result};
pub use parser::{
    extract_barcode_pattern, parse_scan_response, parse_scanned_data, repair_nan_tokens,
    ScannedData,
};
pub use reconcile::{interpret, reconcile, ScanOutcome};
pub use policy::{admit, AdmitDecision, BarcodePattern, Rejection};
pub use session::{sort_by_timestamp_desc, Presenter, ScanSessionState, SoundPlayer};
pub use controller::{ControllerState, ScanController};
