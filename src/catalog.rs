use crate::models::{Exercise, RawWorkout, SharedWorkout, Workout};
use crate::timing::{assert_workout, parse_timing};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

const BUILT_IN_CATALOG: &str = include_str!("../data/workouts.json");

pub const CRAWLING_WARM_UP: &str = "Crawling Warm Up";
pub const CRAWLING_WARMUP_NAMES: [&str; 3] = ["Pointers", "Hip Circles", "Twist and Reach"];
pub const SIDELYING_WARMUP_NAMES: [&str; 3] =
    ["Backstroke", "ITB Leg Lifts", "Side-Lying Leg Lifts"];

const DEFAULT_DESCRIPTION: [&str; 3] = [
    "Maintain a straight back and engaged core.",
    "Focus on controlled, deliberate movements.",
    "Breathe steadily throughout the exercise.",
];

static BLOCK_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("block comment pattern compiles"));
static LINE_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)(^|[^:])//.*$").expect("line comment pattern compiles"));
static BARE_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([,{]\s*)([A-Za-z_][A-Za-z0-9_]*)\s*:").expect("bare key pattern compiles")
});
static TRAILING_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",\s*([}\]])").expect("trailing comma pattern compiles"));
static SINGLE_QUOTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"'([^']*)'").expect("single quote pattern compiles"));
static SLUG_SPACES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern compiles"));
static SLUG_INVALID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w-]+").expect("slug pattern compiles"));

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] io::Error),
    #[error("catalog text is not a workout list")]
    Unparseable,
}

pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let dashed = SLUG_SPACES.replace_all(&lowered, "-");
    SLUG_INVALID.replace_all(&dashed, "").into_owned()
}

pub fn exercise(name: &str) -> Exercise {
    Exercise {
        name: name.to_string(),
        image: format!("https://picsum.photos/seed/{}/400/400", slugify(name)),
        description: DEFAULT_DESCRIPTION.iter().map(|line| line.to_string()).collect(),
    }
}

pub fn workout_id(cycle: &str, week: &str, day: &str, timing: &str) -> String {
    format!("{cycle}|{week}|{day}|{timing}").to_lowercase()
}

pub fn build_workout(raw: &RawWorkout) -> Workout {
    let timing = parse_timing(&raw.timing, raw.rounds);
    let stations = if raw.warm_up == CRAWLING_WARM_UP {
        CRAWLING_WARMUP_NAMES
    } else {
        SIDELYING_WARMUP_NAMES
    };

    Workout {
        id: workout_id(&raw.cycle, &raw.week, &raw.day, &raw.timing),
        cycle: raw.cycle.clone(),
        week: raw.week.clone(),
        day: raw.day.clone(),
        timing: raw.timing.clone(),
        work: timing.work,
        rest: timing.rest,
        rounds: timing.rounds,
        pre_warm_up: exercise(&raw.pre_warm_up),
        warm_up: exercise(&raw.warm_up),
        warm_up_exercises: stations.iter().map(|name| exercise(name)).collect(),
        exercises: raw.exercises.iter().map(|name| exercise(name)).collect(),
        cool_down: exercise(&raw.cool_down),
    }
}

/// Expand raw rows and drop any that fail validation.
pub fn build_catalog(raws: &[RawWorkout]) -> Vec<SharedWorkout> {
    raws.iter()
        .map(build_workout)
        .filter(assert_workout)
        .map(Arc::new)
        .collect()
}

pub fn built_in() -> Vec<SharedWorkout> {
    match serde_json::from_str::<Vec<RawWorkout>>(BUILT_IN_CATALOG) {
        Ok(raws) => build_catalog(&raws),
        Err(err) => {
            log::error!("Built-in catalog is malformed: {err}");
            Vec::new()
        }
    }
}

pub fn load_file(path: impl AsRef<Path>) -> Result<Vec<SharedWorkout>, CatalogError> {
    let text = std::fs::read_to_string(path.as_ref())?;
    let raws = parse_catalog_text(&text).ok_or(CatalogError::Unparseable)?;
    log::info!(
        "Loaded {} catalog rows from {}",
        raws.len(),
        path.as_ref().display()
    );
    Ok(build_catalog(&raws))
}

/// Parse catalog text that is either JSON or a JavaScript-style array literal
/// (comments, bare keys, single quotes and trailing commas are tolerated).
pub fn parse_catalog_text(text: &str) -> Option<Vec<RawWorkout>> {
    if text.trim().is_empty() {
        return None;
    }
    let without_blocks = BLOCK_COMMENT.replace_all(text, "");
    let stripped = LINE_COMMENT.replace_all(&without_blocks, "$1").into_owned();

    if let Ok(rows) = serde_json::from_str::<Vec<RawWorkout>>(&stripped) {
        return Some(rows);
    }

    let array = extract_array_text(&stripped);
    let keyed = BARE_KEY.replace_all(array, "$1\"$2\":");
    let json = TRAILING_COMMA.replace_all(&keyed, "$1").into_owned();

    if let Ok(rows) = serde_json::from_str::<Vec<RawWorkout>>(&json) {
        return Some(rows);
    }

    let double_quoted = SINGLE_QUOTED.replace_all(&json, "\"$1\"");
    match serde_json::from_str::<Vec<RawWorkout>>(&double_quoted) {
        Ok(rows) => Some(rows),
        Err(err) => {
            log::error!("Failed to parse workout catalog: {err}");
            None
        }
    }
}

fn extract_array_text(text: &str) -> &str {
    match (text.find('['), text.rfind(']')) {
        (Some(start), Some(end)) if end > start => &text[start..=end],
        _ => text.trim(),
    }
}
