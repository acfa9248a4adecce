use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub name: String,
    pub image: String,
    pub description: Vec<String>,
}

/// One row of the workout catalog as authored, before timing is parsed and
/// exercise names are expanded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawWorkout {
    #[serde(default)]
    pub cycle: String,
    #[serde(default)]
    pub week: String,
    #[serde(default)]
    pub day: String,
    #[serde(default)]
    pub pre_warm_up: String,
    #[serde(default)]
    pub timing: String,
    #[serde(default)]
    pub warm_up: String,
    #[serde(default)]
    pub exercises: Vec<String>,
    #[serde(default)]
    pub cool_down: String,
    #[serde(default)]
    pub rounds: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    pub id: String,
    pub cycle: String,
    pub week: String,
    pub day: String,
    pub timing: String,
    pub work: u32,
    pub rest: u32,
    pub rounds: u32,
    pub pre_warm_up: Exercise,
    pub warm_up: Exercise,
    pub warm_up_exercises: Vec<Exercise>,
    pub exercises: Vec<Exercise>,
    pub cool_down: Exercise,
}

pub type SharedWorkout = Arc<Workout>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub audio_cues: bool,
    pub track_reps: bool,
    pub enable_warmup: bool,
    pub enable_cooldown: bool,
    pub enable_glass_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            audio_cues: true,
            track_reps: true,
            enable_warmup: true,
            enable_cooldown: true,
            enable_glass_motion: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutPhase {
    #[serde(rename = "getready")]
    GetReady,
    Warmup,
    WarmupRest,
    #[serde(rename = "getready_work")]
    GetReadyWork,
    Work,
    Rest,
    #[serde(rename = "getready_cooldown")]
    GetReadyCooldown,
    Cooldown,
    Done,
}

impl WorkoutPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkoutPhase::GetReady => "getready",
            WorkoutPhase::Warmup => "warmup",
            WorkoutPhase::WarmupRest => "warmup_rest",
            WorkoutPhase::GetReadyWork => "getready_work",
            WorkoutPhase::Work => "work",
            WorkoutPhase::Rest => "rest",
            WorkoutPhase::GetReadyCooldown => "getready_cooldown",
            WorkoutPhase::Cooldown => "cooldown",
            WorkoutPhase::Done => "done",
        }
    }

    pub fn is_warmup(self) -> bool {
        matches!(
            self,
            WorkoutPhase::GetReady | WorkoutPhase::Warmup | WorkoutPhase::WarmupRest
        )
    }

    pub fn is_cooldown(self) -> bool {
        matches!(self, WorkoutPhase::GetReadyCooldown | WorkoutPhase::Cooldown)
    }
}

impl std::fmt::Display for WorkoutPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to rebuild a running session after the process dies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub workout_id: String,
    pub phase: WorkoutPhase,
    pub round: u32,
    pub exercise_index: usize,
    pub seconds: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_reps: Option<Vec<Option<u32>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warmup_stage: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_stage: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_progress: Option<bool>,
    /// Milliseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snap: Option<TimerSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps: Option<Vec<u32>>,
}

impl ProgressItem {
    pub fn is_done(&self) -> bool {
        self.done.unwrap_or(false)
    }

    pub fn is_in_progress(&self) -> bool {
        self.in_progress.unwrap_or(false)
    }
}

pub type Progress = BTreeMap<String, ProgressItem>;

#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutItem<'a> {
    pub workout: &'a Workout,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeekGroup<'a> {
    pub name: String,
    pub items: Vec<WorkoutItem<'a>>,
    pub total: usize,
    pub done_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleGroup<'a> {
    pub name: String,
    pub weeks: Vec<WeekGroup<'a>>,
    pub total: usize,
    pub done_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseStat {
    pub name: String,
    pub last: u32,
    pub pr: u32,
    pub total: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStats {
    pub workouts_done: usize,
    pub exercises: Vec<ExerciseStat>,
}
