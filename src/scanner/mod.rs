//! スキャン処理（通信と状態機械の接続）
//!
//! 通信失敗・応答の解析失敗はログにのみ残し、画面には出さない。
//! ただしエラー応答でも本文が `success: false` なら、その理由を表示する。
//! 自動リトライはしない。

use crate::client::ScanBackend;
use crate::error::{Result, ScanError};
use chem_scan_common::{
    extract_barcode_pattern, parse_scan_response, BarcodePattern, Presenter, ScanController,
    ScanOutcome, SoundPlayer,
};
use std::path::Path;
use tracing::{error, info, warn};

/// 設定画面からバーコード正規表現を取得
///
/// 取得失敗・未設定・不正な正規表現はいずれも `None`（検証なし）。
pub async fn load_pattern<B: ScanBackend>(backend: &B) -> Option<BarcodePattern> {
    let html = match backend.fetch_config_page().await {
        Ok(html) => html,
        Err(e) => {
            warn!("設定画面を取得できません。形式チェックなしで続行: {}", e);
            return None;
        }
    };

    let raw = match extract_barcode_pattern(&html) {
        Some(raw) => raw,
        None => {
            info!("バーコード正規表現が未設定。形式チェックなし");
            return None;
        }
    };

    match BarcodePattern::compile(&raw) {
        Ok(pattern) => {
            info!("バーコード正規表現: {}", pattern.as_str());
            Some(pattern)
        }
        Err(e) => {
            warn!("{}。形式チェックなしで続行", e);
            None
        }
    }
}

/// スキャン一覧を再読み込み
pub async fn refresh<B: ScanBackend, P: Presenter>(
    controller: &mut ScanController,
    backend: &B,
    presenter: &mut P,
) -> Result<usize> {
    let body = backend.fetch_scanned_data().await?;
    let count = controller.reload(&body, presenter)?;
    info!("スキャン一覧を読み込みました: {}件", count);
    Ok(count)
}

/// コントローラを初期化（正規表現取得と初回読み込み）
pub async fn start_session<B: ScanBackend, P: Presenter>(
    backend: &B,
    presenter: &mut P,
    validate: bool,
) -> ScanController {
    let pattern = if validate {
        load_pattern(backend).await
    } else {
        None
    };
    let mut controller = ScanController::new(pattern);

    if let Err(e) = refresh(&mut controller, backend, presenter).await {
        error!("スキャン一覧の取得に失敗: {}", e);
    }
    controller
}

/// 1件スキャンする
///
/// 送信しなかった場合（空入力・ローカルでのリジェクト）や、
/// 通信・解析に失敗した場合は `Ok(None)`。
pub async fn scan_barcode<B: ScanBackend, P: Presenter, S: SoundPlayer>(
    controller: &mut ScanController,
    backend: &B,
    presenter: &mut P,
    sound: &mut S,
    input: &str,
) -> Result<Option<ScanOutcome>> {
    let Some(barcode) = controller.begin(input, presenter, sound)? else {
        return Ok(None);
    };

    let body = match backend.submit_scan(&barcode).await {
        Ok(body) => body,
        Err(ScanError::HttpStatus {
            status,
            body: Some(body),
            ..
        }) if is_server_rejection(&body) => {
            warn!("{}: HTTP {} で拒否", barcode, status);
            body
        }
        Err(e) => {
            controller.fail();
            error!("スキャン送信に失敗 ({}): {}", barcode, e);
            return Ok(None);
        }
    };

    match controller.complete(&body, presenter, sound) {
        Ok(outcome) => {
            log_outcome(&barcode, &outcome);
            Ok(Some(outcome))
        }
        Err(e) => {
            let e = ScanError::from(e);
            if e.is_silent() {
                error!("スキャン応答を解析できません ({}): {}", barcode, e);
                Ok(None)
            } else {
                Err(e)
            }
        }
    }
}

/// エラー応答の本文が `success: false` のスキャン応答か
///
/// サーバーは入力不備や内部エラーを 400/500 と理由付きのJSONで返す。
/// 読めない本文は従来どおり通信失敗として扱う。
fn is_server_rejection(body: &str) -> bool {
    parse_scan_response(body).is_ok_and(|response| !response.success)
}

fn log_outcome(barcode: &str, outcome: &ScanOutcome) {
    match outcome {
        ScanOutcome::Rejected { message } => warn!("{}: サーバーが拒否: {}", barcode, message),
        ScanOutcome::Duplicate { message } => info!("{}: 重複: {}", barcode, message),
        ScanOutcome::Accepted { row, category, .. } => {
            info!("{}: {} ({})", barcode, row.barcode, category)
        }
    }
}

/// セッションの行をJSONで保存
pub fn write_records(controller: &ScanController, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(controller.session().records())?;
    std::fs::write(path, json)?;
    info!("スキャン結果を保存: {}", path.display());
    Ok(())
}
