//! 対話式スキャン
//!
//! バーコードリーダー（キーボード入力）からの1行を1スキャンとして送信する。
//! `:` で始まる入力は操作コマンド。

use crate::client::ScanBackend;
use crate::error::{Result, ScanError};
use crate::scanner;
use chem_scan_common::{Presenter, ScanController, SoundPlayer};
use dialoguer::Input;

/// 入力1行の解釈
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopCommand {
    /// バーコードとして送信
    Scan(String),
    /// サーバーから一覧を再読み込み
    Refresh,
    /// 取得済みの一覧を表示
    List,
    /// 最新の集計を表示
    Stats,
    /// 終了
    Quit,
    /// 不明なコマンド
    Unknown(String),
}

pub fn parse_command(input: &str) -> LoopCommand {
    let trimmed = input.trim();
    let Some(command) = trimmed.strip_prefix(':') else {
        return LoopCommand::Scan(trimmed.to_string());
    };

    match command.trim().to_lowercase().as_str() {
        "r" | "refresh" => LoopCommand::Refresh,
        "l" | "list" => LoopCommand::List,
        "s" | "stats" => LoopCommand::Stats,
        "q" | "quit" | "exit" => LoopCommand::Quit,
        other => LoopCommand::Unknown(other.to_string()),
    }
}

/// 対話ループ
pub async fn run_interactive<B: ScanBackend, P: Presenter, S: SoundPlayer>(
    controller: &mut ScanController,
    backend: &B,
    presenter: &mut P,
    sound: &mut S,
) -> Result<()> {
    println!("バーコードをスキャンしてください");
    println!("---");
    println!("操作: [:r]再読み込み [:l]一覧 [:s]集計 [:q]終了");
    println!("---\n");

    loop {
        let input = match prompt_line() {
            Ok(input) => input,
            // Ctrl-D / 端末切断
            Err(ScanError::Input(_)) => break,
            Err(e) => return Err(e),
        };

        match parse_command(&input) {
            LoopCommand::Scan(barcode) => {
                scanner::scan_barcode(controller, backend, presenter, sound, &barcode).await?;
            }
            LoopCommand::Refresh => {
                if let Err(e) = scanner::refresh(controller, backend, presenter).await {
                    tracing::error!("再読み込みに失敗: {}", e);
                }
            }
            LoopCommand::List => {
                presenter.set_rows(controller.session().records());
            }
            LoopCommand::Stats => match controller.session().stats() {
                Some(stats) => presenter.set_stats(stats),
                None => presenter.show_message("集計はまだありません"),
            },
            LoopCommand::Quit => break,
            LoopCommand::Unknown(command) => {
                presenter.show_message(&format!("不明なコマンド: :{}", command));
            }
        }
    }

    println!("\n終了します");
    Ok(())
}

fn prompt_line() -> Result<String> {
    Input::<String>::new()
        .with_prompt("Barcode")
        .allow_empty(true)
        .interact_text()
        .map_err(|e| ScanError::Input(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scan() {
        assert_eq!(parse_command(" A1234 \n"), LoopCommand::Scan("A1234".into()));
        assert_eq!(parse_command(""), LoopCommand::Scan(String::new()));
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command(":r"), LoopCommand::Refresh);
        assert_eq!(parse_command(":REFRESH"), LoopCommand::Refresh);
        assert_eq!(parse_command(":l"), LoopCommand::List);
        assert_eq!(parse_command(":stats"), LoopCommand::Stats);
        assert_eq!(parse_command(" :q "), LoopCommand::Quit);
        assert_eq!(parse_command(":zap"), LoopCommand::Unknown("zap".into()));
    }
}
