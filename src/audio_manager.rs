use std::io::Write;
use std::time::SystemTime;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Countdown,
    PhaseChange,
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio output unavailable: {0}")]
    Unavailable(String),
    #[error("audio output failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Anything that can make a cue audible.
pub trait AudioPlayer: Send {
    fn play(&mut self, cue: Cue) -> Result<(), AudioError>;
}

/// Rings the terminal bell, twice for a phase change.
#[derive(Debug, Default)]
pub struct TerminalBell;

impl AudioPlayer for TerminalBell {
    fn play(&mut self, cue: Cue) -> Result<(), AudioError> {
        let bells: &[u8] = match cue {
            Cue::Countdown => b"\x07",
            Cue::PhaseChange => b"\x07\x07",
        };
        let mut out = std::io::stderr().lock();
        out.write_all(bells)?;
        out.flush()?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct SilentPlayer;

impl AudioPlayer for SilentPlayer {
    fn play(&mut self, _cue: Cue) -> Result<(), AudioError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CuePlaybackReason {
    Played,
    SettingDisabled,
    PlaybackFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CuePlaybackRecord {
    pub workout_id: Option<String>,
    pub cue: Cue,
    pub played: bool,
    pub reason: CuePlaybackReason,
    pub timestamp: SystemTime,
}

/// Gates cues on the `audioCues` setting and keeps a log of every attempt.
pub struct AudioManager {
    player: Box<dyn AudioPlayer>,
    log: Vec<CuePlaybackRecord>,
    failure_notified: bool,
}

impl std::fmt::Debug for AudioManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioManager")
            .field("log", &self.log.len())
            .field("failure_notified", &self.failure_notified)
            .finish()
    }
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new(Box::new(SilentPlayer))
    }
}

impl AudioManager {
    pub fn new(player: Box<dyn AudioPlayer>) -> Self {
        Self {
            player,
            log: Vec::new(),
            failure_notified: false,
        }
    }

    pub fn play_cue(
        &mut self,
        workout_id: Option<&str>,
        cue: Cue,
        audio_cues: bool,
    ) -> CuePlaybackRecord {
        let reason = if !audio_cues {
            CuePlaybackReason::SettingDisabled
        } else {
            match self.player.play(cue) {
                Ok(()) => CuePlaybackReason::Played,
                Err(err) => {
                    log::error!("Error playing {cue:?} cue: {err}");
                    CuePlaybackReason::PlaybackFailed
                }
            }
        };

        let record = CuePlaybackRecord {
            workout_id: workout_id.map(str::to_string),
            cue,
            played: reason == CuePlaybackReason::Played,
            reason,
            timestamp: SystemTime::now(),
        };
        self.log.push(record.clone());
        record
    }

    pub fn logs(&self) -> &[CuePlaybackRecord] {
        &self.log
    }

    pub fn take_logs(&mut self) -> Vec<CuePlaybackRecord> {
        std::mem::take(&mut self.log)
    }

    /// True for the first failure after a success, so a caller can surface
    /// a broken audio device once instead of on every cue.
    pub fn should_notify_failure(&mut self, record: &CuePlaybackRecord) -> bool {
        match record.reason {
            CuePlaybackReason::Played => {
                self.failure_notified = false;
                false
            }
            CuePlaybackReason::PlaybackFailed => {
                if self.failure_notified {
                    false
                } else {
                    self.failure_notified = true;
                    true
                }
            }
            CuePlaybackReason::SettingDisabled => false,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingPlayer;
    use super::{AudioManager, Cue, CuePlaybackReason, CuePlaybackRecord};
    use std::time::SystemTime;

    fn record(reason: CuePlaybackReason) -> CuePlaybackRecord {
        CuePlaybackRecord {
            workout_id: Some("w".to_string()),
            cue: Cue::PhaseChange,
            played: reason == CuePlaybackReason::Played,
            reason,
            timestamp: SystemTime::now(),
        }
    }

    #[test]
    fn plays_when_enabled() {
        let player = RecordingPlayer::default();
        let mut manager = AudioManager::new(Box::new(player.clone()));

        let result = manager.play_cue(Some("w"), Cue::Countdown, true);

        assert!(result.played);
        assert_eq!(result.reason, CuePlaybackReason::Played);
        assert_eq!(player.cues(), vec![Cue::Countdown]);
    }

    #[test]
    fn setting_disabled_is_logged_without_playing() {
        let player = RecordingPlayer::default();
        let mut manager = AudioManager::new(Box::new(player.clone()));

        let result = manager.play_cue(Some("w"), Cue::PhaseChange, false);

        assert!(!result.played);
        assert_eq!(result.reason, CuePlaybackReason::SettingDisabled);
        assert!(player.cues().is_empty());
        assert_eq!(manager.logs().len(), 1);
    }

    #[test]
    fn playback_failure_is_recorded() {
        let player = RecordingPlayer {
            fail: true,
            ..RecordingPlayer::default()
        };
        let mut manager = AudioManager::new(Box::new(player));

        let result = manager.play_cue(None, Cue::PhaseChange, true);

        assert_eq!(result.reason, CuePlaybackReason::PlaybackFailed);
        assert_eq!(manager.take_logs().len(), 1);
        assert!(manager.logs().is_empty());
    }

    #[test]
    fn notify_failure_only_once_until_played() {
        let mut manager = AudioManager::default();
        let failed = record(CuePlaybackReason::PlaybackFailed);

        assert!(manager.should_notify_failure(&failed));
        assert!(!manager.should_notify_failure(&failed));
        assert!(!manager.should_notify_failure(&record(CuePlaybackReason::SettingDisabled)));
        assert!(!manager.should_notify_failure(&record(CuePlaybackReason::Played)));
        assert!(manager.should_notify_failure(&failed));
    }
}
