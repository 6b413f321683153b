//! 効果音
//!
//! 再生コマンドが設定されていれば音声ファイルを外部コマンドで鳴らし、
//! なければ端末ベルを鳴らす。

use crate::config::Config;
use chem_scan_common::{SoundCue, SoundPlayer};
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;
use tracing::{debug, warn};

/// 効果音の鳴らし方
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Playback {
    Command { program: String, file: PathBuf },
    Bell,
    Silent,
}

pub struct CommandSoundPlayer {
    command: Option<String>,
    files: HashMap<SoundCue, PathBuf>,
    muted: bool,
}

impl CommandSoundPlayer {
    pub fn from_config(config: &Config) -> Self {
        let files = SoundCue::ALL
            .iter()
            .filter_map(|cue| config.sound_file(*cue).map(|path| (*cue, path.to_path_buf())))
            .collect();
        Self {
            command: config
                .sound_command
                .as_ref()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            files,
            muted: false,
        }
    }

    pub fn muted(mut self, muted: bool) -> Self {
        self.muted = muted;
        self
    }

    pub fn resolve(&self, cue: SoundCue) -> Playback {
        if self.muted {
            return Playback::Silent;
        }
        match (&self.command, self.files.get(&cue)) {
            (Some(program), Some(file)) => Playback::Command {
                program: program.clone(),
                file: file.clone(),
            },
            (Some(_), None) => Playback::Silent,
            (None, _) => Playback::Bell,
        }
    }
}

impl SoundPlayer for CommandSoundPlayer {
    fn play(&mut self, cue: SoundCue) {
        match self.resolve(cue) {
            Playback::Command { program, file } => {
                debug!("{} → {} {}", cue.id(), program, file.display());
                let spawned = tokio::process::Command::new(&program)
                    .arg(&file)
                    .stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .kill_on_drop(false)
                    .spawn();
                if let Err(e) = spawned {
                    warn!("効果音の再生に失敗 ({}): {}", program, e);
                }
            }
            Playback::Bell => {
                let mut out = std::io::stdout();
                let _ = out.write_all(b"\x07");
                let _ = out.flush();
            }
            Playback::Silent => {
                debug!("{}: 再生なし", cue.id());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_without_command_rings_bell() {
        let player = CommandSoundPlayer::from_config(&Config::default());
        assert_eq!(player.resolve(SoundCue::Found), Playback::Bell);
    }

    #[test]
    fn test_resolve_with_command() {
        let mut config = Config {
            sound_command: Some("aplay".into()),
            ..Default::default()
        };
        config.set_sound("archived=/tmp/archived.wav").unwrap();
        let player = CommandSoundPlayer::from_config(&config);

        assert_eq!(
            player.resolve(SoundCue::Archived),
            Playback::Command {
                program: "aplay".into(),
                file: PathBuf::from("/tmp/archived.wav"),
            }
        );
        assert_eq!(player.resolve(SoundCue::Found), Playback::Silent);
    }

    #[test]
    fn test_muted_is_silent() {
        let player = CommandSoundPlayer::from_config(&Config::default()).muted(true);
        assert_eq!(player.resolve(SoundCue::Duplicate), Playback::Silent);
    }
}
