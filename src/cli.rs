use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chem-scan")]
#[command(about = "薬品在庫棚卸しキャンペーン用バーコードスキャン端末", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 接続先サーバー（設定ファイル・環境変数より優先）
    #[arg(long, global = true)]
    pub server: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 対話的にバーコードをスキャン
    Scan {
        /// バーコード形式チェックを行わない
        #[arg(long)]
        no_validate: bool,

        /// 効果音を鳴らさない
        #[arg(long)]
        mute: bool,

        /// 終了時にスキャン結果JSONを保存
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 指定したバーコードを順に送信
    Submit {
        /// バーコード
        #[arg(required = true)]
        barcodes: Vec<String>,

        /// バーコード形式チェックを行わない
        #[arg(long)]
        no_validate: bool,

        /// 効果音を鳴らさない
        #[arg(long)]
        mute: bool,

        /// 送信後にスキャン結果JSONを保存
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// スキャン済み一覧と集計を表示
    List {
        /// スキャン結果JSONを保存
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// サーバーのバーコード正規表現を表示
    Pattern,

    /// 設定を表示/編集
    Config {
        /// 接続先サーバーを設定
        #[arg(long)]
        set_server: Option<String>,

        /// セッションCookieを設定（空文字で解除）
        #[arg(long)]
        set_cookie: Option<String>,

        /// 効果音ファイルを設定（CUE=PATH、PATHが空なら解除）
        #[arg(long, value_name = "CUE=PATH")]
        set_sound: Vec<String>,

        /// 効果音の再生コマンドを設定（空文字で解除）
        #[arg(long)]
        set_sound_command: Option<String>,

        /// 応答待ちの上限秒数（0で無制限）
        #[arg(long)]
        set_timeout: Option<u64>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}
