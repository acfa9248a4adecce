use crate::models::{Exercise, Settings, SharedWorkout, TimerSnapshot, WorkoutPhase};
use serde::Serialize;
use thiserror::Error;

pub const GET_READY_SECONDS: u32 = 5;
pub const PRE_WARMUP_SECONDS: u32 = 55;
pub const WARMUP_REST_SECONDS: u32 = 5;
pub const WARMUP_STATION_SECONDS: u32 = 30;
pub const GET_READY_WORK_SECONDS: u32 = 10;
pub const GET_READY_COOLDOWN_SECONDS: u32 = 10;
pub const COOLDOWN_STATION_SECONDS: u32 = 30;

pub const LAST_WARMUP_STAGE: u8 = 6;
pub const LAST_COOLDOWN_STAGE: u8 = 1;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimerError {
    #[error("Timer already running")]
    AlreadyRunning,
    #[error("Timer already paused")]
    AlreadyPaused,
    #[error("Invalid workout: {0}")]
    InvalidWorkout(String),
    #[error("Snapshot belongs to workout {found}, not {expected}")]
    SnapshotMismatch { expected: String, found: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceResult {
    NoChange,
    Counted {
        seconds: u32,
        countdown_cue: bool,
    },
    Transitioned {
        from: WorkoutPhase,
        to: WorkoutPhase,
        rep_prompt: Option<usize>,
    },
    Completed {
        from: WorkoutPhase,
    },
}

impl AdvanceResult {
    pub fn phase_changed(&self) -> bool {
        match self {
            AdvanceResult::Transitioned { from, to, .. } => from != to,
            AdvanceResult::Completed { .. } => true,
            _ => false,
        }
    }
}

/// One entry of the workout timeline. Ticking and manual navigation both
/// move between neighbouring slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    GetReady,
    Warmup(u8),
    WarmupRest,
    GetReadyWork,
    Work { round: u32, index: usize },
    Rest { round: u32, index: usize },
    GetReadyCooldown,
    Cooldown(u8),
    Done,
}

impl Slot {
    pub fn phase(self) -> WorkoutPhase {
        match self {
            Slot::GetReady => WorkoutPhase::GetReady,
            Slot::Warmup(_) => WorkoutPhase::Warmup,
            Slot::WarmupRest => WorkoutPhase::WarmupRest,
            Slot::GetReadyWork => WorkoutPhase::GetReadyWork,
            Slot::Work { .. } => WorkoutPhase::Work,
            Slot::Rest { .. } => WorkoutPhase::Rest,
            Slot::GetReadyCooldown => WorkoutPhase::GetReadyCooldown,
            Slot::Cooldown(_) => WorkoutPhase::Cooldown,
            Slot::Done => WorkoutPhase::Done,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerView {
    pub phase: WorkoutPhase,
    pub seconds: u32,
    pub round: u32,
    pub exercise_index: usize,
    pub warmup_stage: u8,
    pub cooldown_stage: u8,
    pub display_exercise: Exercise,
    pub header_label: String,
    pub phase_duration: u32,
    pub running: bool,
}

#[derive(Debug, Clone)]
pub struct TimerEngine {
    workout: SharedWorkout,
    phase: WorkoutPhase,
    seconds: u32,
    round: u32,
    exercise_index: usize,
    warmup_stage: u8,
    cooldown_stage: u8,
    running: bool,
    completed: bool,
}

impl TimerEngine {
    /// A fresh, paused session at the first slot for `settings`.
    pub fn new(workout: SharedWorkout, settings: &Settings) -> Result<Self, TimerError> {
        Self::validate_workout(&workout)?;
        let first = Self::first_slot(settings);
        Ok(Self {
            phase: first.phase(),
            seconds: Self::duration_for(&workout, first),
            workout,
            round: 1,
            exercise_index: 0,
            warmup_stage: 0,
            cooldown_stage: 0,
            running: false,
            completed: false,
        })
    }

    /// Rebuild a paused session from a snapshot. Counters are clamped into
    /// range; a snapshot that already reached `done` starts over.
    pub fn restore(
        workout: SharedWorkout,
        snapshot: &TimerSnapshot,
        settings: &Settings,
    ) -> Result<Self, TimerError> {
        if snapshot.workout_id != workout.id {
            return Err(TimerError::SnapshotMismatch {
                expected: workout.id.clone(),
                found: snapshot.workout_id.clone(),
            });
        }
        let mut engine = Self::new(workout, settings)?;
        if snapshot.phase == WorkoutPhase::Done {
            log::info!("Snapshot for {} already finished, starting fresh", snapshot.workout_id);
            return Ok(engine);
        }

        let last_index = engine.workout.exercises.len() - 1;
        engine.phase = snapshot.phase;
        engine.seconds = snapshot.seconds;
        engine.exercise_index = snapshot.exercise_index.min(last_index);
        engine.round = snapshot.round.clamp(1, engine.workout.rounds);
        engine.warmup_stage = snapshot.warmup_stage.unwrap_or(0).min(LAST_WARMUP_STAGE);
        engine.cooldown_stage = snapshot.cooldown_stage.unwrap_or(0).min(LAST_COOLDOWN_STAGE);
        Ok(engine)
    }

    pub fn workout(&self) -> &SharedWorkout {
        &self.workout
    }

    pub fn phase(&self) -> WorkoutPhase {
        self.phase
    }

    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn exercise_index(&self) -> usize {
        self.exercise_index
    }

    pub fn warmup_stage(&self) -> u8 {
        self.warmup_stage
    }

    pub fn cooldown_stage(&self) -> u8 {
        self.cooldown_stage
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_paused(&self) -> bool {
        !self.running
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn pause(&mut self) -> Result<(), TimerError> {
        if !self.running {
            return Err(TimerError::AlreadyPaused);
        }
        self.running = false;
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), TimerError> {
        if self.running {
            return Err(TimerError::AlreadyRunning);
        }
        self.running = true;
        Ok(())
    }

    /// Back to the first slot for `settings`, paused, with the completion
    /// latch cleared.
    pub fn reset(&mut self, settings: &Settings) {
        let first = Self::first_slot(settings);
        self.phase = first.phase();
        self.seconds = self.slot_duration(first);
        self.round = 1;
        self.exercise_index = 0;
        self.warmup_stage = 0;
        self.cooldown_stage = 0;
        self.running = false;
        self.completed = false;
    }

    /// One second of wall clock. Paused sessions and finished sessions do
    /// not move.
    pub fn tick(&mut self, settings: &Settings) -> AdvanceResult {
        if !self.running {
            return AdvanceResult::NoChange;
        }
        let skipped = self.apply_settings(settings);
        if skipped != AdvanceResult::NoChange {
            return skipped;
        }
        if self.phase == WorkoutPhase::Done {
            return AdvanceResult::NoChange;
        }

        if self.seconds > 1 {
            let countdown_cue = (2..=4).contains(&self.seconds);
            self.seconds -= 1;
            return AdvanceResult::Counted {
                seconds: self.seconds,
                countdown_cue,
            };
        }

        match self.next_slot(self.current_slot(), settings) {
            Some(next) => self.enter(next, settings, true),
            None => AdvanceResult::NoChange,
        }
    }

    /// Manual step to the neighbouring slot. Works whether or not the
    /// session is running.
    pub fn advance(&mut self, direction: Direction, settings: &Settings) -> AdvanceResult {
        let current = self.current_slot();
        let target = match direction {
            Direction::Forward => self.next_slot(current, settings),
            Direction::Backward => self.prev_slot(current, settings),
        };
        match target {
            Some(slot) => self.enter(slot, settings, false),
            None => AdvanceResult::NoChange,
        }
    }

    /// Leave warm-up or cool-down immediately when the running session is
    /// inside a section that `settings` now disables.
    pub fn apply_settings(&mut self, settings: &Settings) -> AdvanceResult {
        if !self.running {
            return AdvanceResult::NoChange;
        }
        if !settings.enable_warmup && self.phase.is_warmup() {
            log::debug!("Warm-up disabled mid-session, skipping to get ready");
            let result = self.enter(Slot::GetReadyWork, settings, false);
            self.warmup_stage = 0;
            return result;
        }
        if !settings.enable_cooldown && self.phase.is_cooldown() {
            log::debug!("Cool-down disabled mid-session, finishing");
            return self.enter(Slot::Done, settings, false);
        }
        AdvanceResult::NoChange
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            workout_id: self.workout.id.clone(),
            phase: self.phase,
            round: self.round,
            exercise_index: self.exercise_index,
            seconds: self.seconds,
            session_reps: None,
            warmup_stage: Some(self.warmup_stage),
            cooldown_stage: Some(self.cooldown_stage),
        }
    }

    pub fn phase_duration(&self) -> u32 {
        self.slot_duration(self.current_slot())
    }

    pub fn view(&self) -> TimerView {
        let (header_label, display_exercise) = self.header_and_exercise();
        TimerView {
            phase: self.phase,
            seconds: self.seconds,
            round: self.round,
            exercise_index: self.exercise_index,
            warmup_stage: self.warmup_stage,
            cooldown_stage: self.cooldown_stage,
            display_exercise: display_exercise.clone(),
            header_label,
            phase_duration: self.phase_duration(),
            running: self.running,
        }
    }

    pub fn current_slot(&self) -> Slot {
        match self.phase {
            WorkoutPhase::GetReady => Slot::GetReady,
            WorkoutPhase::Warmup => Slot::Warmup(self.warmup_stage),
            WorkoutPhase::WarmupRest => Slot::WarmupRest,
            WorkoutPhase::GetReadyWork => Slot::GetReadyWork,
            WorkoutPhase::Work => Slot::Work {
                round: self.round,
                index: self.exercise_index,
            },
            WorkoutPhase::Rest => Slot::Rest {
                round: self.round,
                index: self.exercise_index,
            },
            WorkoutPhase::GetReadyCooldown => Slot::GetReadyCooldown,
            WorkoutPhase::Cooldown => Slot::Cooldown(self.cooldown_stage),
            WorkoutPhase::Done => Slot::Done,
        }
    }

    pub fn next_slot(&self, slot: Slot, settings: &Settings) -> Option<Slot> {
        let cooldown_entry = if settings.enable_cooldown {
            Slot::GetReadyCooldown
        } else {
            Slot::Done
        };

        if !settings.enable_warmup && slot.phase().is_warmup() {
            return Some(Slot::GetReadyWork);
        }
        if !settings.enable_cooldown && slot.phase().is_cooldown() {
            return Some(Slot::Done);
        }

        let next = match slot {
            Slot::GetReady => Slot::Warmup(0),
            Slot::Warmup(0) => Slot::WarmupRest,
            Slot::WarmupRest => Slot::Warmup(1),
            Slot::Warmup(stage) if stage < LAST_WARMUP_STAGE => Slot::Warmup(stage + 1),
            Slot::Warmup(_) => Slot::GetReadyWork,
            Slot::GetReadyWork => Slot::Work { round: 1, index: 0 },
            Slot::Work { round, index } if self.is_final_interval(round, index) => cooldown_entry,
            Slot::Work { round, index } => Slot::Rest { round, index },
            Slot::Rest { round, index } if self.is_final_interval(round, index) => cooldown_entry,
            Slot::Rest { round, index } if index + 1 < self.workout.exercises.len() => Slot::Work {
                round,
                index: index + 1,
            },
            Slot::Rest { round, .. } => Slot::Work {
                round: round + 1,
                index: 0,
            },
            Slot::GetReadyCooldown => Slot::Cooldown(0),
            Slot::Cooldown(stage) if stage < LAST_COOLDOWN_STAGE => Slot::Cooldown(stage + 1),
            Slot::Cooldown(_) => Slot::Done,
            Slot::Done => return None,
        };
        Some(next)
    }

    pub fn prev_slot(&self, slot: Slot, settings: &Settings) -> Option<Slot> {
        let last_index = self.workout.exercises.len() - 1;
        let prev = match slot {
            Slot::GetReady | Slot::Warmup(0) | Slot::Done => return None,
            Slot::WarmupRest => Slot::Warmup(0),
            Slot::Warmup(1) => Slot::WarmupRest,
            Slot::Warmup(stage) => Slot::Warmup(stage - 1),
            Slot::GetReadyWork if settings.enable_warmup => Slot::Warmup(LAST_WARMUP_STAGE),
            Slot::GetReadyWork => return None,
            Slot::Work { round, index } if index > 0 => Slot::Rest {
                round,
                index: index - 1,
            },
            Slot::Work { round, .. } if round > 1 => Slot::Rest {
                round: round - 1,
                index: last_index,
            },
            Slot::Work { .. } => Slot::GetReadyWork,
            Slot::Rest { round, index } => Slot::Work { round, index },
            Slot::GetReadyCooldown => Slot::Work {
                round: self.workout.rounds,
                index: last_index,
            },
            Slot::Cooldown(0) => Slot::GetReadyCooldown,
            Slot::Cooldown(stage) => Slot::Cooldown(stage - 1),
        };
        Some(prev)
    }

    pub fn slot_duration(&self, slot: Slot) -> u32 {
        Self::duration_for(&self.workout, slot)
    }

    fn duration_for(workout: &SharedWorkout, slot: Slot) -> u32 {
        match slot {
            Slot::GetReady => GET_READY_SECONDS,
            Slot::Warmup(0) => PRE_WARMUP_SECONDS,
            Slot::Warmup(_) => WARMUP_STATION_SECONDS,
            Slot::WarmupRest => WARMUP_REST_SECONDS,
            Slot::GetReadyWork => GET_READY_WORK_SECONDS,
            Slot::Work { .. } => workout.work,
            Slot::Rest { .. } => workout.rest,
            Slot::GetReadyCooldown => GET_READY_COOLDOWN_SECONDS,
            Slot::Cooldown(_) => COOLDOWN_STATION_SECONDS,
            Slot::Done => 0,
        }
    }

    fn first_slot(settings: &Settings) -> Slot {
        if settings.enable_warmup {
            Slot::GetReady
        } else {
            Slot::GetReadyWork
        }
    }

    fn is_final_interval(&self, round: u32, index: usize) -> bool {
        round >= self.workout.rounds && index + 1 >= self.workout.exercises.len()
    }

    fn enter(&mut self, slot: Slot, settings: &Settings, autonomous: bool) -> AdvanceResult {
        let from_slot = self.current_slot();
        let from = self.phase;

        match slot {
            Slot::Warmup(stage) => self.warmup_stage = stage,
            Slot::Work { round, index } | Slot::Rest { round, index } => {
                self.round = round;
                self.exercise_index = index;
            }
            Slot::Cooldown(stage) => self.cooldown_stage = stage,
            _ => {}
        }
        self.phase = slot.phase();
        self.seconds = self.slot_duration(slot);

        if slot == Slot::Done && !self.completed {
            self.completed = true;
            log::info!("Workout {} complete", self.workout.id);
            return AdvanceResult::Completed { from };
        }

        let rep_prompt = match (from_slot, slot) {
            (Slot::Work { index, .. }, Slot::Rest { .. }) if autonomous && settings.track_reps => {
                Some(index)
            }
            _ => None,
        };
        AdvanceResult::Transitioned {
            from,
            to: self.phase,
            rep_prompt,
        }
    }

    fn header_and_exercise(&self) -> (String, &Exercise) {
        let workout = &self.workout;
        let exercise_at =
            |index: usize| workout.exercises.get(index).unwrap_or(&workout.cool_down);
        match self.phase {
            WorkoutPhase::GetReady => ("Pre Warm Up".to_string(), &workout.pre_warm_up),
            WorkoutPhase::Warmup | WorkoutPhase::WarmupRest if self.warmup_stage == 0 => {
                ("Pre Warm Up".to_string(), &workout.pre_warm_up)
            }
            WorkoutPhase::Warmup | WorkoutPhase::WarmupRest => {
                let station = usize::from(self.warmup_stage - 1) % 3;
                let exercise = workout
                    .warm_up_exercises
                    .get(station)
                    .unwrap_or(&workout.warm_up);
                (workout.warm_up.name.clone(), exercise)
            }
            WorkoutPhase::GetReadyWork => ("Get Ready".to_string(), exercise_at(0)),
            WorkoutPhase::Work => ("Work".to_string(), exercise_at(self.exercise_index)),
            WorkoutPhase::Rest => ("Rest".to_string(), exercise_at(self.exercise_index)),
            WorkoutPhase::GetReadyCooldown => ("Get Ready".to_string(), &workout.cool_down),
            WorkoutPhase::Cooldown => ("Cool Down".to_string(), &workout.cool_down),
            WorkoutPhase::Done => ("Done".to_string(), &workout.cool_down),
        }
    }

    fn validate_workout(workout: &SharedWorkout) -> Result<(), TimerError> {
        if workout.exercises.is_empty() {
            return Err(TimerError::InvalidWorkout(
                "workout must have at least one exercise".to_string(),
            ));
        }
        if workout.rounds == 0 {
            return Err(TimerError::InvalidWorkout(
                "rounds must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{AdvanceResult, Direction, Slot, TimerEngine, TimerError};
    use crate::catalog::build_workout;
    use crate::models::{RawWorkout, Settings, SharedWorkout, WorkoutPhase};
    use std::sync::Arc;

    fn sample_workout(rounds: u32, exercises: &[&str]) -> SharedWorkout {
        let raw = RawWorkout {
            cycle: "Cycle 1".to_string(),
            week: "Week 1".to_string(),
            day: "Monday".to_string(),
            pre_warm_up: "Standing March".to_string(),
            timing: "40/20".to_string(),
            warm_up: "Crawling Warm Up".to_string(),
            exercises: exercises.iter().map(|name| name.to_string()).collect(),
            cool_down: "Bloomers".to_string(),
            rounds: Some(rounds),
        };
        Arc::new(build_workout(&raw))
    }

    fn running_engine(workout: SharedWorkout, settings: &Settings) -> TimerEngine {
        let mut engine = TimerEngine::new(workout, settings).expect("create engine");
        engine.resume().expect("resume");
        engine
    }

    fn move_to(engine: &mut TimerEngine, phase: WorkoutPhase, settings: &Settings) {
        for _ in 0..100 {
            if engine.phase() == phase {
                return;
            }
            engine.advance(Direction::Forward, settings);
        }
        panic!("never reached {phase}");
    }

    #[test]
    fn initial_slot_depends_on_warmup_setting() {
        let workout = sample_workout(2, &["A", "B"]);
        let engine = TimerEngine::new(workout.clone(), &Settings::default()).expect("engine");
        assert_eq!((engine.phase(), engine.seconds()), (WorkoutPhase::GetReady, 5));
        assert!(engine.is_paused());

        let settings = Settings {
            enable_warmup: false,
            ..Settings::default()
        };
        let engine = TimerEngine::new(workout, &settings).expect("engine");
        assert_eq!((engine.phase(), engine.seconds()), (WorkoutPhase::GetReadyWork, 10));
    }

    #[test]
    fn rejects_invalid_workout() {
        let mut workout = (*sample_workout(1, &["A"])).clone();
        workout.exercises.clear();
        let err = TimerEngine::new(Arc::new(workout), &Settings::default()).expect_err("invalid");
        assert!(matches!(err, TimerError::InvalidWorkout(_)));
    }

    #[test]
    fn pause_and_resume_reject_repeats() {
        let mut engine =
            TimerEngine::new(sample_workout(1, &["A"]), &Settings::default()).expect("engine");
        assert_eq!(engine.pause(), Err(TimerError::AlreadyPaused));
        engine.resume().expect("resume");
        assert_eq!(engine.resume(), Err(TimerError::AlreadyRunning));
        engine.pause().expect("pause");
        assert_eq!(engine.tick(&Settings::default()), AdvanceResult::NoChange);
        assert_eq!(engine.seconds(), 5);
    }

    #[test]
    fn full_session_follows_timeline() {
        let settings = Settings::default();
        let mut engine = running_engine(sample_workout(2, &["A", "B"]), &settings);

        let mut ticks = 0;
        while engine.phase() != WorkoutPhase::Work {
            engine.tick(&settings);
            ticks += 1;
        }
        assert_eq!(ticks, 5 + 55 + 5 + 180 + 10);
        assert_eq!((engine.round(), engine.exercise_index()), (1, 0));
        assert_eq!(engine.seconds(), 40);

        let mut work_intervals = 1;
        let mut completions = 0;
        while engine.phase() != WorkoutPhase::GetReadyCooldown {
            let result = engine.tick(&settings);
            if matches!(result, AdvanceResult::Transitioned { to: WorkoutPhase::Work, .. }) {
                work_intervals += 1;
            }
        }
        assert_eq!(work_intervals, 4);

        for _ in 0..200 {
            if matches!(engine.tick(&settings), AdvanceResult::Completed { .. }) {
                completions += 1;
            }
        }
        assert_eq!(engine.phase(), WorkoutPhase::Done);
        assert_eq!(completions, 1);
        assert!(engine.is_completed());
    }

    #[test]
    fn countdown_cue_fires_on_last_seconds_only() {
        let settings = Settings::default();
        let mut engine = running_engine(sample_workout(1, &["A"]), &settings);

        let cues: Vec<bool> = (0..4)
            .map(|_| match engine.tick(&settings) {
                AdvanceResult::Counted { countdown_cue, .. } => countdown_cue,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(cues, vec![false, true, true, true]);

        let result = engine.tick(&settings);
        assert_eq!(
            result,
            AdvanceResult::Transitioned {
                from: WorkoutPhase::GetReady,
                to: WorkoutPhase::Warmup,
                rep_prompt: None
            }
        );
        assert!(result.phase_changed());
        assert_eq!(engine.seconds(), 55);
    }

    #[test]
    fn warmup_stage_steps_do_not_change_phase() {
        let settings = Settings::default();
        let mut engine = running_engine(sample_workout(1, &["A"]), &settings);
        engine.advance(Direction::Forward, &settings);
        engine.advance(Direction::Forward, &settings);
        engine.advance(Direction::Forward, &settings);
        assert_eq!(engine.current_slot(), Slot::Warmup(1));

        let result = engine.advance(Direction::Forward, &settings);
        assert_eq!(engine.current_slot(), Slot::Warmup(2));
        assert!(!result.phase_changed());
        assert_eq!(engine.seconds(), 30);
    }

    #[test]
    fn rep_prompt_raised_when_work_rolls_into_rest() {
        let settings = Settings::default();
        let no_warmup = Settings {
            enable_warmup: false,
            ..settings
        };
        let mut engine = running_engine(sample_workout(1, &["A", "B"]), &no_warmup);
        move_to(&mut engine, WorkoutPhase::Work, &no_warmup);
        for _ in 0..39 {
            engine.tick(&no_warmup);
        }
        let result = engine.tick(&no_warmup);
        assert_eq!(
            result,
            AdvanceResult::Transitioned {
                from: WorkoutPhase::Work,
                to: WorkoutPhase::Rest,
                rep_prompt: Some(0)
            }
        );

        let quiet = Settings {
            track_reps: false,
            ..no_warmup
        };
        let mut engine = running_engine(sample_workout(1, &["A", "B"]), &quiet);
        move_to(&mut engine, WorkoutPhase::Work, &quiet);
        for _ in 0..39 {
            engine.tick(&quiet);
        }
        assert!(matches!(
            engine.tick(&quiet),
            AdvanceResult::Transitioned { rep_prompt: None, .. }
        ));
    }

    #[test]
    fn manual_forward_to_rest_has_no_rep_prompt() {
        let settings = Settings {
            enable_warmup: false,
            ..Settings::default()
        };
        let mut engine = running_engine(sample_workout(1, &["A", "B"]), &settings);
        move_to(&mut engine, WorkoutPhase::Work, &settings);
        assert!(matches!(
            engine.advance(Direction::Forward, &settings),
            AdvanceResult::Transitioned { rep_prompt: None, to: WorkoutPhase::Rest, .. }
        ));
    }

    #[test]
    fn backward_from_first_work_goes_to_get_ready() {
        let settings = Settings::default();
        let mut engine = running_engine(sample_workout(2, &["A", "B"]), &settings);
        move_to(&mut engine, WorkoutPhase::Work, &settings);

        engine.advance(Direction::Backward, &settings);
        assert_eq!(engine.phase(), WorkoutPhase::GetReadyWork);
        assert_eq!(engine.seconds(), 10);

        engine.advance(Direction::Backward, &settings);
        assert_eq!(engine.current_slot(), Slot::Warmup(6));
    }

    #[test]
    fn backward_is_clamped_at_start() {
        let settings = Settings::default();
        let mut engine = running_engine(sample_workout(1, &["A"]), &settings);
        assert_eq!(
            engine.advance(Direction::Backward, &settings),
            AdvanceResult::NoChange
        );
        assert_eq!(engine.phase(), WorkoutPhase::GetReady);

        engine.advance(Direction::Forward, &settings);
        assert_eq!(
            engine.advance(Direction::Backward, &settings),
            AdvanceResult::NoChange
        );
        assert_eq!(engine.current_slot(), Slot::Warmup(0));

        let no_warmup = Settings {
            enable_warmup: false,
            ..settings
        };
        let mut engine = running_engine(sample_workout(1, &["A"]), &no_warmup);
        assert_eq!(
            engine.advance(Direction::Backward, &no_warmup),
            AdvanceResult::NoChange
        );
    }

    #[test]
    fn backward_walks_intervals_in_reverse() {
        let settings = Settings {
            enable_warmup: false,
            ..Settings::default()
        };
        let mut engine = running_engine(sample_workout(2, &["A", "B"]), &settings);
        move_to(&mut engine, WorkoutPhase::GetReadyCooldown, &settings);

        engine.advance(Direction::Backward, &settings);
        assert_eq!(engine.current_slot(), Slot::Work { round: 2, index: 1 });
        engine.advance(Direction::Backward, &settings);
        assert_eq!(engine.current_slot(), Slot::Rest { round: 2, index: 0 });
        assert_eq!(engine.seconds(), 20);
        engine.advance(Direction::Backward, &settings);
        engine.advance(Direction::Backward, &settings);
        assert_eq!(engine.current_slot(), Slot::Rest { round: 1, index: 1 });
    }

    #[test]
    fn forward_at_done_is_noop_and_completion_fires_once() {
        let settings = Settings::default();
        let mut engine = running_engine(sample_workout(1, &["A"]), &settings);
        let mut completions = 0;
        for _ in 0..30 {
            if matches!(
                engine.advance(Direction::Forward, &settings),
                AdvanceResult::Completed { .. }
            ) {
                completions += 1;
            }
        }
        assert_eq!(engine.phase(), WorkoutPhase::Done);
        assert_eq!(completions, 1);
        assert_eq!(
            engine.advance(Direction::Backward, &settings),
            AdvanceResult::NoChange
        );
        assert_eq!(engine.tick(&settings), AdvanceResult::NoChange);
    }

    #[test]
    fn last_work_goes_straight_to_done_without_cooldown() {
        let settings = Settings {
            enable_warmup: false,
            enable_cooldown: false,
            ..Settings::default()
        };
        let mut engine = running_engine(sample_workout(1, &["A"]), &settings);
        engine.advance(Direction::Forward, &settings);
        assert_eq!(engine.phase(), WorkoutPhase::Work);
        assert_eq!(
            engine.advance(Direction::Forward, &settings),
            AdvanceResult::Completed {
                from: WorkoutPhase::Work
            }
        );
    }

    #[test]
    fn disabling_cooldown_mid_cooldown_finishes_once() {
        let mut settings = Settings::default();
        let mut engine = running_engine(sample_workout(1, &["A"]), &settings);
        move_to(&mut engine, WorkoutPhase::Cooldown, &settings);

        settings.enable_cooldown = false;
        assert_eq!(
            engine.apply_settings(&settings),
            AdvanceResult::Completed {
                from: WorkoutPhase::Cooldown
            }
        );
        assert_eq!(engine.phase(), WorkoutPhase::Done);

        settings.enable_cooldown = true;
        assert_eq!(engine.apply_settings(&settings), AdvanceResult::NoChange);
        settings.enable_cooldown = false;
        assert_eq!(engine.apply_settings(&settings), AdvanceResult::NoChange);
        assert_eq!(engine.tick(&settings), AdvanceResult::NoChange);
    }

    #[test]
    fn disabling_warmup_mid_warmup_skips_ahead() {
        let mut settings = Settings::default();
        let mut engine = running_engine(sample_workout(1, &["A"]), &settings);
        engine.advance(Direction::Forward, &settings);
        engine.advance(Direction::Forward, &settings);
        engine.advance(Direction::Forward, &settings);
        assert_eq!(engine.warmup_stage(), 1);

        settings.enable_warmup = false;
        let result = engine.tick(&settings);
        assert!(result.phase_changed());
        assert_eq!(engine.phase(), WorkoutPhase::GetReadyWork);
        assert_eq!(engine.seconds(), 10);
        assert_eq!(engine.warmup_stage(), 0);
    }

    #[test]
    fn skip_rule_waits_while_paused() {
        let mut settings = Settings::default();
        let mut engine =
            TimerEngine::new(sample_workout(1, &["A"]), &settings).expect("engine");
        settings.enable_warmup = false;
        assert_eq!(engine.apply_settings(&settings), AdvanceResult::NoChange);
        assert_eq!(engine.phase(), WorkoutPhase::GetReady);

        engine.resume().expect("resume");
        engine.apply_settings(&settings);
        assert_eq!(engine.phase(), WorkoutPhase::GetReadyWork);
    }

    #[test]
    fn reset_returns_to_first_slot_paused() {
        let settings = Settings::default();
        let mut engine = running_engine(sample_workout(1, &["A"]), &settings);
        move_to(&mut engine, WorkoutPhase::Done, &settings);

        engine.reset(&settings);
        assert_eq!(engine.phase(), WorkoutPhase::GetReady);
        assert!(engine.is_paused());
        assert!(!engine.is_completed());
        assert_eq!((engine.round(), engine.exercise_index()), (1, 0));

        engine.resume().expect("resume");
        let mut completions = 0;
        for _ in 0..30 {
            if matches!(
                engine.advance(Direction::Forward, &settings),
                AdvanceResult::Completed { .. }
            ) {
                completions += 1;
            }
        }
        assert_eq!(completions, 1);
    }

    #[test]
    fn restore_clamps_snapshot() {
        let settings = Settings::default();
        let workout = sample_workout(2, &["A", "B"]);
        let mut snapshot = TimerEngine::new(workout.clone(), &settings)
            .expect("engine")
            .snapshot();
        snapshot.phase = WorkoutPhase::Rest;
        snapshot.seconds = 7;
        snapshot.round = 9;
        snapshot.exercise_index = 5;
        snapshot.warmup_stage = Some(40);

        let engine = TimerEngine::restore(workout, &snapshot, &settings).expect("restore");
        assert_eq!(engine.phase(), WorkoutPhase::Rest);
        assert_eq!(engine.seconds(), 7);
        assert_eq!(engine.round(), 2);
        assert_eq!(engine.exercise_index(), 1);
        assert_eq!(engine.warmup_stage(), 6);
        assert!(engine.is_paused());
    }

    #[test]
    fn restore_rest_after_final_interval_moves_to_cooldown() {
        let settings = Settings::default();
        let workout = sample_workout(1, &["A"]);
        let mut snapshot = TimerEngine::new(workout.clone(), &settings)
            .expect("engine")
            .snapshot();
        snapshot.phase = WorkoutPhase::Rest;
        snapshot.seconds = 1;

        let mut engine = TimerEngine::restore(workout, &snapshot, &settings).expect("restore");
        engine.resume().expect("resume");
        engine.tick(&settings);
        assert_eq!(engine.phase(), WorkoutPhase::GetReadyCooldown);
    }

    #[test]
    fn restore_done_snapshot_starts_fresh() {
        let settings = Settings::default();
        let workout = sample_workout(1, &["A"]);
        let mut snapshot = TimerEngine::new(workout.clone(), &settings)
            .expect("engine")
            .snapshot();
        snapshot.phase = WorkoutPhase::Done;
        snapshot.seconds = 0;

        let engine = TimerEngine::restore(workout, &snapshot, &settings).expect("restore");
        assert_eq!(engine.phase(), WorkoutPhase::GetReady);
        assert_eq!(engine.seconds(), 5);
    }

    #[test]
    fn restore_rejects_other_workout() {
        let settings = Settings::default();
        let workout = sample_workout(1, &["A"]);
        let mut snapshot = TimerEngine::new(workout.clone(), &settings)
            .expect("engine")
            .snapshot();
        snapshot.workout_id = "elsewhere".to_string();
        let err = TimerEngine::restore(workout, &snapshot, &settings).expect_err("mismatch");
        assert!(matches!(err, TimerError::SnapshotMismatch { .. }));
    }

    #[test]
    fn view_labels_follow_phase() {
        let settings = Settings::default();
        let mut engine = running_engine(sample_workout(1, &["Arm Haulers", "Y Cuff"]), &settings);

        let view = engine.view();
        assert_eq!(view.header_label, "Pre Warm Up");
        assert_eq!(view.display_exercise.name, "Standing March");
        assert_eq!(view.phase_duration, 5);

        engine.advance(Direction::Forward, &settings);
        engine.advance(Direction::Forward, &settings);
        engine.advance(Direction::Forward, &settings);
        let view = engine.view();
        assert_eq!(view.header_label, "Crawling Warm Up");
        assert_eq!(view.display_exercise.name, "Pointers");

        engine.advance(Direction::Forward, &settings);
        engine.advance(Direction::Forward, &settings);
        engine.advance(Direction::Forward, &settings);
        assert_eq!(engine.view().display_exercise.name, "Pointers");

        move_to(&mut engine, WorkoutPhase::GetReadyWork, &settings);
        let view = engine.view();
        assert_eq!(view.header_label, "Get Ready");
        assert_eq!(view.display_exercise.name, "Arm Haulers");

        move_to(&mut engine, WorkoutPhase::Rest, &settings);
        let view = engine.view();
        assert_eq!(view.header_label, "Rest");
        assert_eq!(view.display_exercise.name, "Arm Haulers");
        assert_eq!(view.phase_duration, 20);

        move_to(&mut engine, WorkoutPhase::Cooldown, &settings);
        let view = engine.view();
        assert_eq!(view.header_label, "Cool Down");
        assert_eq!(view.display_exercise.name, "Bloomers");

        move_to(&mut engine, WorkoutPhase::Done, &settings);
        assert_eq!(engine.view().header_label, "Done");
    }

    #[test]
    fn snapshot_captures_counters() {
        let settings = Settings {
            enable_warmup: false,
            ..Settings::default()
        };
        let mut engine = running_engine(sample_workout(2, &["A", "B"]), &settings);
        move_to(&mut engine, WorkoutPhase::Work, &settings);
        engine.advance(Direction::Forward, &settings);
        engine.advance(Direction::Forward, &settings);
        engine.tick(&settings);

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.phase, WorkoutPhase::Work);
        assert_eq!(snapshot.exercise_index, 1);
        assert_eq!(snapshot.round, 1);
        assert_eq!(snapshot.seconds, 39);
        assert!(snapshot.session_reps.is_none());
    }
}
