use crate::models::Workout;
use once_cell::sync::Lazy;
use regex::Regex;

pub const DEFAULT_WORK_SECONDS: u32 = 40;
pub const DEFAULT_REST_SECONDS: u32 = 20;
pub const DEFAULT_ROUNDS: u32 = 3;

static KEY_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Za-z]+)\s*=\s*(\d+)").expect("key-value pattern compiles"));

static SLASH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+)\s*[/-]\s*(\d+)(?:\s*[xX]\s*(\d+))?").expect("slash pattern compiles")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub work: u32,
    pub rest: u32,
    pub rounds: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            work: DEFAULT_WORK_SECONDS,
            rest: DEFAULT_REST_SECONDS,
            rounds: DEFAULT_ROUNDS,
        }
    }
}

/// Parse a timing descriptor such as `"40/20"`, `"45-15 x 4"` or
/// `"work=40, rest=20, rounds=3"`.
///
/// The key-value form is tried first; if it recognises at least one key the
/// slash form is not consulted. Unparseable input leaves the defaults in
/// place. `override_rounds` is applied last and always wins.
pub fn parse_timing(timing: &str, override_rounds: Option<u32>) -> Timing {
    let mut parsed = Timing::default();
    let text = timing.trim();

    if !text.is_empty() && !apply_key_values(text, &mut parsed) {
        if !apply_slash(text, &mut parsed) {
            log::debug!("Timing {timing:?} not recognised, using defaults");
        }
    }

    if let Some(rounds) = override_rounds {
        parsed.rounds = rounds;
    }
    parsed
}

fn apply_key_values(text: &str, timing: &mut Timing) -> bool {
    let mut matched = false;
    for caps in KEY_VALUE.captures_iter(text) {
        let Ok(value) = caps[2].parse::<u32>() else {
            continue;
        };
        match caps[1].to_ascii_lowercase().as_str() {
            "work" => timing.work = value,
            "rest" => timing.rest = value,
            "rounds" => timing.rounds = value,
            _ => continue,
        }
        matched = true;
    }
    matched
}

fn apply_slash(text: &str, timing: &mut Timing) -> bool {
    let Some(caps) = SLASH.captures(text) else {
        return false;
    };
    let (Ok(work), Ok(rest)) = (caps[1].parse::<u32>(), caps[2].parse::<u32>()) else {
        return false;
    };
    timing.work = work;
    timing.rest = rest;
    if let Some(rounds) = caps.get(3).and_then(|m| m.as_str().parse::<u32>().ok()) {
        timing.rounds = rounds;
    }
    true
}

/// Structural check used as the catalog filter. Failures are logged and
/// reported as `false`.
pub fn assert_workout(workout: &Workout) -> bool {
    if workout.id.is_empty() {
        log::warn!("Rejecting workout with empty id ({} {})", workout.cycle, workout.day);
        return false;
    }
    if workout.rounds == 0 {
        log::warn!("Rejecting workout {}: rounds must be positive", workout.id);
        return false;
    }
    if workout.exercises.is_empty() {
        log::warn!("Rejecting workout {}: no exercises", workout.id);
        return false;
    }
    true
}
