use crate::models::{ExerciseStat, Progress, ProfileStats, SharedWorkout};
use std::collections::HashMap;

#[derive(Default)]
struct Tally {
    last: u32,
    last_ts: i64,
    pr: u32,
    total: u32,
}

/// Completed-workout count plus last/PR/total reps per exercise name.
///
/// Exercises are listed in first-seen catalog order. Only entries that are
/// done, carry reps and have a timestamp contribute rep figures.
pub fn calculate_profile_stats(workouts: &[SharedWorkout], progress: &Progress) -> ProfileStats {
    let workouts_done = progress.values().filter(|item| item.is_done()).count();

    let mut names: Vec<&str> = Vec::new();
    let mut tallies: HashMap<&str, Tally> = HashMap::new();
    for workout in workouts {
        for exercise in &workout.exercises {
            if !tallies.contains_key(exercise.name.as_str()) {
                names.push(&exercise.name);
                tallies.insert(&exercise.name, Tally::default());
            }
        }
    }

    for (uid, item) in progress {
        let (true, Some(reps), Some(ts)) = (item.is_done(), item.reps.as_ref(), item.ts) else {
            continue;
        };
        if ts == 0 {
            continue;
        }
        let Some(workout) = workouts.iter().find(|w| &w.id == uid) else {
            continue;
        };

        for (index, exercise) in workout.exercises.iter().enumerate() {
            let value = reps.get(index).copied().unwrap_or(0);
            let Some(tally) = tallies.get_mut(exercise.name.as_str()) else {
                continue;
            };
            tally.total = tally.total.saturating_add(value);
            tally.pr = tally.pr.max(value);
            if ts > tally.last_ts {
                tally.last = value;
                tally.last_ts = ts;
            }
        }
    }

    let exercises = names
        .into_iter()
        .map(|name| {
            let tally = tallies.remove(name).unwrap_or_default();
            ExerciseStat {
                name: name.to_string(),
                last: tally.last,
                pr: tally.pr,
                total: tally.total,
            }
        })
        .collect();

    ProfileStats {
        workouts_done,
        exercises,
    }
}
