//! スキャンセッション状態と表示側インターフェース
//!
//! 行と集計はこの構造体だけが保持し、変更は `load` / `publish` 経由のみ。

use crate::reconcile::merge_inventory;
use crate::types::{CampaignStatistics, InventoryRow, ScanRecord, SoundCue};

/// 表示側（表・カウンタ・メッセージ欄）
pub trait Presenter {
    /// 行をすべて置き換える
    fn set_rows(&mut self, rows: &[ScanRecord]);

    /// 1行追加する
    fn append_row(&mut self, row: &ScanRecord);

    /// 集計を上書きする
    fn set_stats(&mut self, stats: &CampaignStatistics);

    /// メッセージ欄に表示する
    fn show_message(&mut self, message: &str);

    /// 在庫一覧を置き換える
    fn set_inventory(&mut self, _rows: &[InventoryRow]) {}

    /// 入力欄をクリアしてフォーカスを戻す
    fn reset_input(&mut self) {}
}

/// 効果音
pub trait SoundPlayer {
    fn play(&mut self, cue: SoundCue);
}

/// セッション状態
#[derive(Debug, Clone, Default)]
pub struct ScanSessionState {
    records: Vec<ScanRecord>,
    stats: Option<CampaignStatistics>,
    inventory: Vec<InventoryRow>,
}

impl ScanSessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 取得済みの行（挿入順）
    pub fn records(&self) -> &[ScanRecord] {
        &self.records
    }

    pub fn stats(&self) -> Option<&CampaignStatistics> {
        self.stats.as_ref()
    }

    pub fn inventory(&self) -> &[InventoryRow] {
        &self.inventory
    }

    /// サーバーからの全件再読み込み
    pub fn load<P: Presenter>(
        &mut self,
        rows: Vec<ScanRecord>,
        stats: Option<CampaignStatistics>,
        presenter: &mut P,
    ) {
        self.records = rows;
        presenter.set_rows(&self.records);
        if let Some(stats) = stats {
            presenter.set_stats(&stats);
            self.stats = Some(stats);
        }
    }

    /// 集計と（あれば）新しい行を反映する
    ///
    /// 集計は常に上書き、行は1回だけ追加、効果音は行の分類で1回鳴らす。
    /// 行なしの場合は集計だけを更新する。
    pub fn publish<P: Presenter, S: SoundPlayer>(
        &mut self,
        stats: Option<CampaignStatistics>,
        row: Option<ScanRecord>,
        presenter: &mut P,
        sound: &mut S,
    ) {
        if let Some(stats) = stats {
            presenter.set_stats(&stats);
            self.stats = Some(stats);
        }

        if let Some(row) = row {
            presenter.append_row(&row);
            let cue = row.category.sound_cue();
            self.records.push(row);
            if let Some(cue) = cue {
                sound.play(cue);
            }
        }
    }

    /// 在庫一覧に未登録の行を追加し、変化があれば表示を更新
    pub fn add_inventory<P: Presenter>(&mut self, rows: &[InventoryRow], presenter: &mut P) {
        if merge_inventory(&mut self.inventory, rows) > 0 {
            presenter.set_inventory(&self.inventory);
        }
    }
}

/// タイムスタンプ降順の表示用の並び（元の順序は変えない）
pub fn sort_by_timestamp_desc(rows: &[ScanRecord]) -> Vec<&ScanRecord> {
    let mut sorted: Vec<&ScanRecord> = rows.iter().collect();
    sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    sorted
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// 呼び出しを記録するだけの表示側
    #[derive(Debug, Default)]
    pub struct RecordingPresenter {
        pub rows: Vec<ScanRecord>,
        pub stats: Option<CampaignStatistics>,
        pub messages: Vec<String>,
        pub inventory: Vec<InventoryRow>,
        pub appended: usize,
        pub resets: usize,
    }

    impl Presenter for RecordingPresenter {
        fn set_rows(&mut self, rows: &[ScanRecord]) {
            self.rows = rows.to_vec();
        }

        fn append_row(&mut self, row: &ScanRecord) {
            self.rows.push(row.clone());
            self.appended += 1;
        }

        fn set_stats(&mut self, stats: &CampaignStatistics) {
            self.stats = Some(stats.clone());
        }

        fn show_message(&mut self, message: &str) {
            self.messages.push(message.to_string());
        }

        fn set_inventory(&mut self, rows: &[InventoryRow]) {
            self.inventory = rows.to_vec();
        }

        fn reset_input(&mut self) {
            self.resets += 1;
        }
    }

    #[derive(Debug, Default)]
    pub struct RecordingSound {
        pub played: Vec<SoundCue>,
    }

    impl SoundPlayer for RecordingSound {
        fn play(&mut self, cue: SoundCue) {
            self.played.push(cue);
        }
    }
}
