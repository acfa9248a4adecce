use crate::audio_manager::{AudioManager, Cue};
use crate::data_manager::{DataError, KeyValueStore};
use crate::events::{EventSink, TimerEvent};
use crate::models::{Progress, Settings, SharedWorkout, WorkoutPhase};
use crate::progress_store::ProgressStore;
use crate::rep_buffer::{RepBuffer, RepError};
use crate::timer_engine::{AdvanceResult, Direction, TimerEngine, TimerError, TimerView};
use std::sync::Arc;
use thiserror::Error;

/// Whether a session rebuilt from a snapshot starts ticking right away.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResumePolicy {
    #[default]
    Running,
    Paused,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Timer(#[from] TimerError),
    #[error(transparent)]
    Rep(#[from] RepError),
    #[error(transparent)]
    Data(#[from] DataError),
    #[error("workout {0} is not complete yet")]
    NotCompleted(String),
}

/// One workout in progress: the timer plus everything that listens to it.
pub struct WorkoutSession<S: KeyValueStore, E: EventSink> {
    engine: TimerEngine,
    settings: Settings,
    store: ProgressStore<S>,
    reps: RepBuffer,
    audio: AudioManager,
    events: E,
    exited: bool,
}

impl<S: KeyValueStore, E: EventSink> WorkoutSession<S, E> {
    /// Start `workout`, picking up its in-progress snapshot when one exists.
    pub fn start(
        workout: SharedWorkout,
        settings: Settings,
        store: ProgressStore<S>,
        audio: AudioManager,
        events: E,
        policy: ResumePolicy,
    ) -> Result<Self, SessionError> {
        let len = workout.exercises.len();
        let saved = store
            .load()
            .remove(&workout.id)
            .filter(|item| item.is_in_progress())
            .and_then(|item| item.snap);

        let restored = match saved {
            Some(snap) if snap.phase != WorkoutPhase::Done => {
                match TimerEngine::restore(Arc::clone(&workout), &snap, &settings) {
                    Ok(engine) => {
                        let reps =
                            RepBuffer::restore(len, snap.session_reps.as_deref().unwrap_or(&[]));
                        Some((engine, reps))
                    }
                    Err(err) => {
                        log::warn!("Discarding saved session for {}: {err}", workout.id);
                        if let Err(err) = store.clear_in_progress(&workout.id) {
                            log::error!("Failed to clear session for {}: {err}", workout.id);
                        }
                        None
                    }
                }
            }
            _ => None,
        };

        let (mut engine, reps, resumed) = match restored {
            Some((engine, reps)) => (engine, reps, true),
            None => (
                TimerEngine::new(workout, &settings)?,
                RepBuffer::new(len),
                false,
            ),
        };

        if !resumed || policy == ResumePolicy::Running {
            engine.resume()?;
        }
        log::info!(
            "{} workout {} at {} ({})",
            if resumed { "Resumed" } else { "Started" },
            engine.workout().id,
            engine.phase(),
            if engine.is_running() { "running" } else { "paused" }
        );

        let mut session = Self {
            engine,
            settings,
            store,
            reps,
            audio,
            events,
            exited: false,
        };
        session.persist_snapshot();
        let view = session.engine.view();
        session.events.emit(TimerEvent::Tick { view });
        Ok(session)
    }

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn view(&self) -> TimerView {
        self.engine.view()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn reps(&self) -> &RepBuffer {
        &self.reps
    }

    pub fn store(&self) -> &ProgressStore<S> {
        &self.store
    }

    pub fn audio(&self) -> &AudioManager {
        &self.audio
    }

    pub fn events(&self) -> &E {
        &self.events
    }

    pub fn is_exited(&self) -> bool {
        self.exited
    }

    /// True while the wall clock should drive this session.
    pub fn is_ticking(&self) -> bool {
        self.engine.is_running() && !self.engine.is_completed() && !self.exited
    }

    pub fn tick(&mut self) {
        let result = self.engine.tick(&self.settings);
        self.handle(result);
    }

    pub fn pause(&mut self) -> Result<(), SessionError> {
        self.engine.pause()?;
        self.events.emit(TimerEvent::Paused);
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), SessionError> {
        self.engine.resume()?;
        self.events.emit(TimerEvent::Resumed);
        self.persist_snapshot();
        Ok(())
    }

    pub fn advance(&mut self, direction: Direction) {
        let result = self.engine.advance(direction, &self.settings);
        self.handle(result);
    }

    /// Swap in new settings and apply the warm-up/cool-down skip rule now.
    pub fn apply_settings(&mut self, settings: Settings) {
        self.settings = settings;
        let result = self.engine.apply_settings(&self.settings);
        self.handle(result);
    }

    /// Back to the first slot, paused. Logged reps survive a reset.
    pub fn reset(&mut self) {
        self.engine.reset(&self.settings);
        self.clear_in_progress();
        self.events.emit(TimerEvent::Reset);
        let view = self.engine.view();
        self.events.emit(TimerEvent::Tick { view });
    }

    /// Abandon the session. Completion history is left as it was.
    pub fn exit(&mut self) {
        if self.engine.pause().is_ok() {
            log::debug!("Stopped the clock for {}", self.engine.workout().id);
        }
        self.clear_in_progress();
        self.exited = true;
        log::info!("Left workout {} at {}", self.engine.workout().id, self.engine.phase());
        self.events.emit(TimerEvent::Exited);
    }

    pub fn log_rep(&mut self, index: usize, value: Option<u32>) -> Result<(), SessionError> {
        self.reps.log_rep(index, value)?;
        self.persist_snapshot();
        Ok(())
    }

    /// Persist the reps after the post-workout pass and clear the buffer.
    /// Only a completed workout can be finished.
    pub fn finish(&mut self) -> Result<Progress, SessionError> {
        let id = self.engine.workout().id.clone();
        if !self.engine.is_completed() {
            return Err(SessionError::NotCompleted(id));
        }
        let progress = self.store.save_reps(&id, self.reps.coerced())?;
        self.reps.reset();
        Ok(progress)
    }

    fn handle(&mut self, result: AdvanceResult) {
        match result {
            AdvanceResult::NoChange => return,
            AdvanceResult::Counted { countdown_cue, .. } => {
                if countdown_cue {
                    self.play(Cue::Countdown);
                }
                let view = self.engine.view();
                self.events.emit(TimerEvent::Tick { view });
            }
            AdvanceResult::Transitioned {
                from,
                to,
                rep_prompt,
            } => {
                let view = self.engine.view();
                if from != to {
                    self.play(Cue::PhaseChange);
                    self.events.emit(TimerEvent::PhaseChanged { from, to, view });
                } else {
                    self.events.emit(TimerEvent::Tick { view });
                }
                if let Some(exercise_index) = rep_prompt {
                    let exercise_name = self
                        .engine
                        .workout()
                        .exercises
                        .get(exercise_index)
                        .map(|exercise| exercise.name.clone())
                        .unwrap_or_default();
                    self.events.emit(TimerEvent::RepPrompt {
                        exercise_index,
                        exercise_name,
                        current: self.reps.get(exercise_index),
                    });
                }
            }
            AdvanceResult::Completed { from } => {
                self.play(Cue::PhaseChange);
                let view = self.engine.view();
                self.events.emit(TimerEvent::PhaseChanged {
                    from,
                    to: WorkoutPhase::Done,
                    view,
                });
                self.record_completion();
                return;
            }
        }
        self.persist_snapshot();
    }

    fn record_completion(&mut self) {
        let id = self.engine.workout().id.clone();
        if let Err(err) = self.store.mark_done(&id) {
            log::error!("Failed to mark {id} done: {err}");
        }
        if let Err(err) = self.store.save_reps(&id, self.reps.coerced()) {
            log::error!("Failed to save reps for {id}: {err}");
        }
        self.events.emit(TimerEvent::Completed { workout_id: id });
    }

    fn persist_snapshot(&mut self) {
        if !self.engine.is_running() || self.engine.phase() == WorkoutPhase::Done || self.exited {
            return;
        }
        let id = self.engine.workout().id.clone();
        let mut snap = self.engine.snapshot();
        snap.session_reps = Some(self.reps.entries().to_vec());
        if let Err(err) = self.store.mark_in_progress(&id, snap) {
            log::error!("Failed to save session snapshot: {err}");
        }
    }

    fn clear_in_progress(&mut self) {
        let id = self.engine.workout().id.clone();
        if let Err(err) = self.store.clear_in_progress(&id) {
            log::error!("Failed to clear session for {id}: {err}");
        }
    }

    fn play(&mut self, cue: Cue) {
        let id = self.engine.workout().id.clone();
        let record = self.audio.play_cue(Some(&id), cue, self.settings.audio_cues);
        if self.audio.should_notify_failure(&record) {
            log::warn!("Audio cues unavailable, continuing without sound");
        }
    }
}
