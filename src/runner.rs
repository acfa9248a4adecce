use crate::data_manager::KeyValueStore;
use crate::events::EventSink;
use crate::models::Settings;
use crate::timer_engine::Direction;
use crate::workout_session::{SessionError, WorkoutSession};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    Warmup,
    Cooldown,
    Sound,
    Reps,
}

impl SettingKey {
    fn apply(self, settings: &mut Settings, value: bool) {
        match self {
            SettingKey::Warmup => settings.enable_warmup = value,
            SettingKey::Cooldown => settings.enable_cooldown = value,
            SettingKey::Sound => settings.audio_cues = value,
            SettingKey::Reps => settings.track_reps = value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Pause,
    Resume,
    TogglePause,
    Advance(Direction),
    Reset,
    Exit,
    LogRep { index: usize, value: Option<u32> },
    UpdateSettings(Settings),
    SetSetting { key: SettingKey, value: bool },
    Finish,
}

/// Parse one line of interactive input. Rep indices are 1-based on input.
pub fn parse_command(line: &str) -> Option<SessionCommand> {
    let mut parts = line.split_whitespace();
    let head = parts.next()?.to_ascii_lowercase();
    let command = match head.as_str() {
        "p" | "pause" | "space" => SessionCommand::TogglePause,
        "n" | "next" => SessionCommand::Advance(Direction::Forward),
        "b" | "back" | "prev" => SessionCommand::Advance(Direction::Backward),
        "r" | "reset" => SessionCommand::Reset,
        "q" | "quit" | "exit" => SessionCommand::Exit,
        "f" | "finish" => SessionCommand::Finish,
        "rep" => {
            let index = parts.next()?.parse::<usize>().ok()?.checked_sub(1)?;
            let value = match parts.next()? {
                "-" => None,
                raw => Some(raw.parse::<u32>().ok()?),
            };
            SessionCommand::LogRep { index, value }
        }
        "warmup" | "cooldown" | "sound" | "reps" => {
            let key = match head.as_str() {
                "warmup" => SettingKey::Warmup,
                "cooldown" => SettingKey::Cooldown,
                "sound" => SettingKey::Sound,
                _ => SettingKey::Reps,
            };
            let value = match parts.next()? {
                "on" => true,
                "off" => false,
                _ => return None,
            };
            SessionCommand::SetSetting { key, value }
        }
        _ => return None,
    };
    if parts.next().is_some() {
        return None;
    }
    Some(command)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// Drive `session` until it is exited, finished, or every command sender is
/// gone. Ticks and commands are handled one at a time on this task.
pub async fn run_session<S, E>(
    mut session: WorkoutSession<S, E>,
    mut commands: UnboundedReceiver<SessionCommand>,
) -> WorkoutSession<S, E>
where
    S: KeyValueStore,
    E: EventSink,
{
    let mut ticker: Option<Interval> = None;

    loop {
        sync_ticker(&mut ticker, session.is_ticking());

        tokio::select! {
            _ = async {
                match ticker.as_mut() {
                    Some(interval) => {
                        interval.tick().await;
                    }
                    None => std::future::pending::<()>().await,
                }
            } => session.tick(),
            command = commands.recv() => {
                let Some(command) = command else {
                    log::info!("Command channel closed, stopping session runner");
                    break;
                };
                if apply_command(&mut session, command) == Flow::Stop {
                    break;
                }
            }
        }
    }

    session
}

fn sync_ticker(ticker: &mut Option<Interval>, ticking: bool) {
    match (ticking, ticker.is_some()) {
        (true, false) => {
            let mut interval = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            *ticker = Some(interval);
        }
        (false, true) => *ticker = None,
        _ => {}
    }
}

fn apply_command<S, E>(session: &mut WorkoutSession<S, E>, command: SessionCommand) -> Flow
where
    S: KeyValueStore,
    E: EventSink,
{
    log::debug!("Session command: {command:?}");
    let outcome = match command {
        SessionCommand::Pause => session.pause(),
        SessionCommand::Resume => session.resume(),
        SessionCommand::TogglePause => {
            if session.engine().is_running() {
                session.pause()
            } else {
                session.resume()
            }
        }
        SessionCommand::Advance(direction) => {
            session.advance(direction);
            Ok(())
        }
        SessionCommand::Reset => {
            session.reset();
            Ok(())
        }
        SessionCommand::Exit => {
            session.exit();
            return Flow::Stop;
        }
        SessionCommand::LogRep { index, value } => session.log_rep(index, value),
        SessionCommand::UpdateSettings(settings) => {
            session.apply_settings(settings);
            Ok(())
        }
        SessionCommand::SetSetting { key, value } => {
            let mut settings = *session.settings();
            key.apply(&mut settings, value);
            session.apply_settings(settings);
            Ok(())
        }
        SessionCommand::Finish => match session.finish() {
            Ok(_) => return Flow::Stop,
            Err(err @ SessionError::NotCompleted(_)) => Err(err),
            Err(err) => {
                log::error!("Failed to save reps: {err}");
                return Flow::Stop;
            }
        },
    };

    if let Err(err) = outcome {
        log::warn!("Ignoring command: {err}");
    }
    Flow::Continue
}
