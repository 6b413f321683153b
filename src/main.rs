use anyhow::{Context, Result};
use chem_scan::{cli, client, config, interactive, logging, scanner, sound, terminal};
use chem_scan_common::SoundCue;
use clap::Parser;
use cli::{Cli, Commands};
use client::HttpBackend;
use config::Config;
use sound::CommandSoundPlayer;
use terminal::TerminalPresenter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = Config::load().context("設定ファイルを読み込めません")?;
    let server = cli.server.as_deref();

    match cli.command {
        Commands::Scan { no_validate, mute, ref output } => {
            println!("🧪 chem-scan - 棚卸しスキャン\n");

            let backend = connect(&config, server)?;
            let mut presenter = TerminalPresenter::stdout();
            let mut sound = CommandSoundPlayer::from_config(&config).muted(mute);
            let validate = config.validate_barcodes && !no_validate;

            let mut controller = scanner::start_session(&backend, &mut presenter, validate).await;
            interactive::run_interactive(&mut controller, &backend, &mut presenter, &mut sound)
                .await?;

            if let Some(path) = output {
                scanner::write_records(&controller, path)
                    .with_context(|| format!("保存に失敗: {}", path.display()))?;
                println!("✔ スキャン結果を保存: {}", path.display());
            }
        }

        Commands::Submit { ref barcodes, no_validate, mute, ref output } => {
            let backend = connect(&config, server)?;
            let mut presenter = TerminalPresenter::stdout();
            let mut sound = CommandSoundPlayer::from_config(&config).muted(mute);
            let validate = config.validate_barcodes && !no_validate;

            let mut controller = scanner::start_session(&backend, &mut presenter, validate).await;
            let mut accepted = 0;
            for barcode in barcodes {
                let outcome = scanner::scan_barcode(
                    &mut controller,
                    &backend,
                    &mut presenter,
                    &mut sound,
                    barcode,
                )
                .await?;
                if matches!(outcome, Some(chem_scan_common::ScanOutcome::Accepted { .. })) {
                    accepted += 1;
                }
            }
            println!("\n✔ {}/{}件を登録", accepted, barcodes.len());

            if let Some(path) = output {
                scanner::write_records(&controller, path)
                    .with_context(|| format!("保存に失敗: {}", path.display()))?;
                println!("✔ スキャン結果を保存: {}", path.display());
            }
        }

        Commands::List { ref output } => {
            let backend = connect(&config, server)?;
            let mut presenter = TerminalPresenter::stdout();
            let mut controller = chem_scan_common::ScanController::new(None);
            scanner::refresh(&mut controller, &backend, &mut presenter)
                .await
                .context("スキャン一覧を取得できません")?;

            if let Some(path) = output {
                scanner::write_records(&controller, path)
                    .with_context(|| format!("保存に失敗: {}", path.display()))?;
                println!("✔ スキャン結果を保存: {}", path.display());
            }
        }

        Commands::Pattern => {
            let backend = connect(&config, server)?;
            match scanner::load_pattern(&backend).await {
                Some(pattern) => println!("{}", pattern.as_str()),
                None => println!("バーコード正規表現は未設定です（形式チェックなし）"),
            }
        }

        Commands::Config {
            set_server,
            set_cookie,
            set_sound,
            set_sound_command,
            set_timeout,
            show,
        } => {
            let mut config = config;
            let mut changed = false;

            if let Some(url) = set_server {
                config.set_server_url(url)?;
                println!("✔ 接続先を設定しました: {}", config.server_url);
                changed = true;
            }

            if let Some(cookie) = set_cookie {
                let cookie = cookie.trim().to_string();
                if cookie.is_empty() {
                    config.session_cookie = None;
                    println!("✔ セッションCookieを解除しました");
                } else {
                    config.session_cookie = Some(cookie);
                    println!("✔ セッションCookieを設定しました");
                }
                changed = true;
            }

            for assignment in &set_sound {
                config.set_sound(assignment)?;
                println!("✔ 効果音を設定しました: {}", assignment);
                changed = true;
            }

            if let Some(command) = set_sound_command {
                let command = command.trim().to_string();
                config.sound_command = (!command.is_empty()).then_some(command);
                println!("✔ 再生コマンドを設定しました");
                changed = true;
            }

            if let Some(seconds) = set_timeout {
                config.timeout_seconds = (seconds > 0).then_some(seconds);
                println!("✔ タイムアウトを設定しました");
                changed = true;
            }

            if changed {
                config.save().context("設定ファイルを保存できません")?;
            }

            if show || !changed {
                print_config(&config);
            }
        }
    }

    Ok(())
}

fn connect(config: &Config, server: Option<&str>) -> Result<HttpBackend> {
    let backend = match server {
        Some(url) => HttpBackend::connect(config, url)?,
        None => HttpBackend::new(config)?,
    };
    tracing::debug!("接続先: {}", backend.base_url());
    Ok(backend)
}

fn print_config(config: &Config) {
    println!("設定:");
    println!("  接続先: {}", config.server_url());
    println!(
        "  タイムアウト: {}",
        config
            .timeout_seconds
            .map(|s| format!("{}秒", s))
            .unwrap_or_else(|| "なし".into())
    );
    println!(
        "  形式チェック: {}",
        if config.validate_barcodes { "有効" } else { "無効" }
    );
    println!(
        "  セッションCookie: {}",
        if config.session_cookie.is_some() { "設定済み" } else { "未設定" }
    );
    println!(
        "  再生コマンド: {}",
        config.sound_command.as_deref().unwrap_or("なし（端末ベル）")
    );
    for cue in SoundCue::ALL {
        if let Some(path) = config.sound_file(cue) {
            println!("  {}: {}", cue.id(), path.display());
        }
    }
}
