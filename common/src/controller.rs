//! スキャン処理の状態機械
//!
//! `Idle → Validating → Submitting → Reconciling → Idle`
//!
//! 送信中に次のスキャンを始めることはできない（`Error::Busy`）。
//! 応答の到着順と送信順が食い違って行が入れ替わるのを防ぐため。
//! 通信そのものは呼び出し側が行い、結果の本文を `complete` に渡す。

use crate::error::{Error, Result};
use crate::parser::{parse_scan_response, parse_scanned_data};
use crate::policy::{admit, AdmitDecision, BarcodePattern, Rejection};
use crate::reconcile::{interpret, ScanOutcome};
use crate::session::{Presenter, ScanSessionState, SoundPlayer};
use crate::types::SoundCue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Validating,
    Submitting,
    Reconciling,
}

/// スキャン送信コントローラ
#[derive(Debug)]
pub struct ScanController {
    state: ControllerState,
    pattern: Option<BarcodePattern>,
    session: ScanSessionState,
}

impl ScanController {
    pub fn new(pattern: Option<BarcodePattern>) -> Self {
        Self {
            state: ControllerState::Idle,
            pattern,
            session: ScanSessionState::new(),
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn session(&self) -> &ScanSessionState {
        &self.session
    }

    pub fn pattern(&self) -> Option<&BarcodePattern> {
        self.pattern.as_ref()
    }

    /// 入力を検証し、送信すべきバーコードを返す
    ///
    /// - 空入力: `Ok(None)`、何もしない
    /// - リジェクト: メッセージ表示・入力欄リセット後 `Ok(None)`
    /// - 受理: 入力欄リセット後 `Ok(Some(barcode))`、状態は `Submitting`
    pub fn begin<P: Presenter, S: SoundPlayer>(
        &mut self,
        input: &str,
        presenter: &mut P,
        sound: &mut S,
    ) -> Result<Option<String>> {
        if self.state != ControllerState::Idle {
            return Err(Error::Busy);
        }
        self.state = ControllerState::Validating;

        let decision = admit(input, self.session.records(), self.pattern.as_ref());
        match decision {
            AdmitDecision::Ignore => {
                self.state = ControllerState::Idle;
                Ok(None)
            }
            AdmitDecision::Reject(rejection) => {
                presenter.show_message(rejection.message());
                if rejection == Rejection::AlreadyScanned {
                    sound.play(SoundCue::Duplicate);
                }
                presenter.reset_input();
                self.state = ControllerState::Idle;
                Ok(None)
            }
            AdmitDecision::Admit(barcode) => {
                presenter.reset_input();
                self.state = ControllerState::Submitting;
                Ok(Some(barcode))
            }
        }
    }

    /// 送信結果の本文を反映する
    ///
    /// パース失敗時は状態を `Idle` に戻してエラーを返す（表示はしない）。
    pub fn complete<P: Presenter, S: SoundPlayer>(
        &mut self,
        body: &str,
        presenter: &mut P,
        sound: &mut S,
    ) -> Result<ScanOutcome> {
        if self.state != ControllerState::Submitting {
            return Err(Error::NotInFlight);
        }
        self.state = ControllerState::Reconciling;

        let result = parse_scan_response(body).and_then(|response| interpret(&response));
        self.state = ControllerState::Idle;
        let outcome = result?;

        match &outcome {
            ScanOutcome::Rejected { message } => {
                presenter.show_message(message);
            }
            ScanOutcome::Duplicate { message } => {
                presenter.show_message(message);
                sound.play(SoundCue::Duplicate);
            }
            ScanOutcome::Accepted { row, stats, category, inventory } => {
                self.session
                    .publish(stats.clone(), Some(row.clone()), presenter, sound);
                self.session.add_inventory(inventory, presenter);
                presenter.show_message(&format!("Scanned: {} ({})", row.barcode, category));
            }
        }

        Ok(outcome)
    }

    /// 通信失敗などで送信を打ち切る
    pub fn fail(&mut self) {
        if self.state == ControllerState::Submitting {
            self.state = ControllerState::Idle;
        }
    }

    /// `GET /api/scanned_data` の本文で全件を置き換える
    ///
    /// 読み込んだ行数を返す。
    pub fn reload<P: Presenter>(&mut self, body: &str, presenter: &mut P) -> Result<usize> {
        if self.state != ControllerState::Idle {
            return Err(Error::Busy);
        }
        let data = parse_scanned_data(body)?;
        let count = data.rows.len();
        self.session.load(data.rows, data.stats, presenter);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::{RecordingPresenter, RecordingSound};
    use crate::types::Category;

    fn controller(pattern: Option<&str>) -> ScanController {
        ScanController::new(pattern.map(|p| BarcodePattern::compile(p).unwrap()))
    }

    const ACCEPTED: &str = r#"{
        "success": true,
        "barcode": "12345",
        "timestamp": "2025-03-01 09:15:00",
        "category": "archived",
        "inventory_data": [{"Barcode ID - Container": "12345", "Unit - Container": "NaN", "Current Quantity - Container": NaN}],
        "campaign_statistics": {"total_scanned": 1, "active": 0, "not_found": 0, "archived": 1}
    }"#;

    #[test]
    fn test_admitted_scan_moves_to_submitting() {
        let mut controller = controller(Some(r"^\d{5}$"));
        let mut presenter = RecordingPresenter::default();
        let mut sound = RecordingSound::default();

        let barcode = controller.begin("12345", &mut presenter, &mut sound).unwrap();
        assert_eq!(barcode.as_deref(), Some("12345"));
        assert_eq!(controller.state(), ControllerState::Submitting);
        assert_eq!(presenter.resets, 1);
    }

    #[test]
    fn test_invalid_format_never_submits() {
        let mut controller = controller(Some(r"^\d{5}$"));
        let mut presenter = RecordingPresenter::default();
        let mut sound = RecordingSound::default();

        let barcode = controller.begin("abc", &mut presenter, &mut sound).unwrap();
        assert!(barcode.is_none());
        assert_eq!(controller.state(), ControllerState::Idle);
        assert_eq!(presenter.messages, vec!["Invalid barcode format".to_string()]);
        assert_eq!(presenter.resets, 1);
        assert!(sound.played.is_empty());
    }

    #[test]
    fn test_empty_input_is_noop() {
        let mut controller = controller(None);
        let mut presenter = RecordingPresenter::default();
        let mut sound = RecordingSound::default();

        assert!(controller.begin("   ", &mut presenter, &mut sound).unwrap().is_none());
        assert!(presenter.messages.is_empty());
        assert_eq!(presenter.resets, 0);
    }

    #[test]
    fn test_second_scan_while_in_flight_is_busy() {
        let mut controller = controller(None);
        let mut presenter = RecordingPresenter::default();
        let mut sound = RecordingSound::default();

        controller.begin("A1", &mut presenter, &mut sound).unwrap();
        let result = controller.begin("A2", &mut presenter, &mut sound);
        assert!(matches!(result, Err(Error::Busy)));
        assert!(matches!(controller.reload("[]", &mut presenter), Err(Error::Busy)));

        controller.fail();
        assert_eq!(controller.state(), ControllerState::Idle);
        assert!(controller.begin("A2", &mut presenter, &mut sound).unwrap().is_some());
    }

    #[test]
    fn test_complete_without_begin() {
        let mut controller = controller(None);
        let mut presenter = RecordingPresenter::default();
        let mut sound = RecordingSound::default();

        let result = controller.complete(ACCEPTED, &mut presenter, &mut sound);
        assert!(matches!(result, Err(Error::NotInFlight)));
    }

    #[test]
    fn test_accepted_scan_is_published_once() {
        let mut controller = controller(Some(r"^\d{5}$"));
        let mut presenter = RecordingPresenter::default();
        let mut sound = RecordingSound::default();

        controller.begin("12345", &mut presenter, &mut sound).unwrap();
        let outcome = controller.complete(ACCEPTED, &mut presenter, &mut sound).unwrap();

        assert!(matches!(outcome, ScanOutcome::Accepted { category: Category::Archived, .. }));
        assert_eq!(controller.state(), ControllerState::Idle);
        assert_eq!(controller.session().records().len(), 1);
        let row = &controller.session().records()[0];
        assert_eq!(row.field("Unit - Container"), "");
        assert_eq!(row.field("Current Quantity - Container"), "");
        assert_eq!(presenter.appended, 1);
        assert_eq!(presenter.stats.as_ref().unwrap().archived, Some(1));
        assert_eq!(presenter.inventory.len(), 1);
        assert_eq!(sound.played, vec![SoundCue::Archived]);
        assert_eq!(presenter.messages.last().unwrap(), "Scanned: 12345 (archived)");
    }

    #[test]
    fn test_local_duplicate_after_accept() {
        let mut controller = controller(None);
        let mut presenter = RecordingPresenter::default();
        let mut sound = RecordingSound::default();

        controller.begin("12345", &mut presenter, &mut sound).unwrap();
        controller.complete(ACCEPTED, &mut presenter, &mut sound).unwrap();

        let barcode = controller.begin(" 12345 ", &mut presenter, &mut sound).unwrap();
        assert!(barcode.is_none());
        assert_eq!(presenter.messages.last().unwrap(), "Barcode already scanned");
        assert_eq!(sound.played.last(), Some(&SoundCue::Duplicate));
    }

    #[test]
    fn test_server_duplicate_adds_nothing() {
        let mut controller = controller(None);
        let mut presenter = RecordingPresenter::default();
        let mut sound = RecordingSound::default();

        controller.begin("B1", &mut presenter, &mut sound).unwrap();
        let outcome = controller
            .complete(
                r#"{"success": true, "duplicate": true, "message": "dup"}"#,
                &mut presenter,
                &mut sound,
            )
            .unwrap();

        assert_eq!(outcome, ScanOutcome::Duplicate { message: "dup".into() });
        assert!(controller.session().records().is_empty());
        assert!(presenter.stats.is_none());
        assert_eq!(presenter.messages, vec!["dup".to_string()]);
        assert_eq!(sound.played, vec![SoundCue::Duplicate]);
    }

    #[test]
    fn test_server_rejection_changes_nothing() {
        let mut controller = controller(None);
        let mut presenter = RecordingPresenter::default();
        let mut sound = RecordingSound::default();

        controller.begin("B1", &mut presenter, &mut sound).unwrap();
        controller
            .complete(
                r#"{"success": false, "message": "Internal server error during scan."}"#,
                &mut presenter,
                &mut sound,
            )
            .unwrap();

        assert!(controller.session().records().is_empty());
        assert!(sound.played.is_empty());
        assert_eq!(
            presenter.messages,
            vec!["Internal server error during scan.".to_string()]
        );
    }

    #[test]
    fn test_unparsable_body_returns_to_idle_silently() {
        let mut controller = controller(None);
        let mut presenter = RecordingPresenter::default();
        let mut sound = RecordingSound::default();

        controller.begin("B1", &mut presenter, &mut sound).unwrap();
        let messages_before = presenter.messages.len();
        let result = controller.complete("<html>502</html>", &mut presenter, &mut sound);

        assert!(result.is_err());
        assert_eq!(controller.state(), ControllerState::Idle);
        assert_eq!(presenter.messages.len(), messages_before);
    }

    #[test]
    fn test_reload_then_duplicate_check_uses_loaded_rows() {
        let mut controller = controller(None);
        let mut presenter = RecordingPresenter::default();
        let mut sound = RecordingSound::default();

        let count = controller
            .reload(
                r#"{"data": [{"barcode": "C9", "timestamp": "t", "category": "found"}], "campaign_statistics": {"total_scanned": 1}}"#,
                &mut presenter,
            )
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(presenter.stats.as_ref().unwrap().total_scanned, Some(1));

        assert!(controller.begin("C9", &mut presenter, &mut sound).unwrap().is_none());
    }
}
