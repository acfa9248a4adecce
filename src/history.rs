use crate::models::{CycleGroup, Progress, SharedWorkout, WeekGroup, WorkoutItem};

const DEFAULT_CYCLE: &str = "Cycle";
const DEFAULT_WEEK: &str = "Week";

fn is_done(progress: &Progress, id: &str) -> bool {
    progress.get(id).is_some_and(|item| item.is_done())
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

/// Group the catalog into cycles and weeks in first-seen order, counting
/// items whose progress entry is marked done.
pub fn group_workouts<'a>(workouts: &'a [SharedWorkout], progress: &Progress) -> Vec<CycleGroup<'a>> {
    let mut cycles: Vec<(&str, Vec<(&str, Vec<WorkoutItem<'a>>)>)> = Vec::new();

    for (index, workout) in workouts.iter().enumerate() {
        let cycle_name = or_default(&workout.cycle, DEFAULT_CYCLE);
        let week_name = or_default(&workout.week, DEFAULT_WEEK);

        let cycle_pos = match cycles.iter().position(|(name, _)| *name == cycle_name) {
            Some(pos) => pos,
            None => {
                cycles.push((cycle_name, Vec::new()));
                cycles.len() - 1
            }
        };
        let weeks = &mut cycles[cycle_pos].1;
        let week_pos = match weeks.iter().position(|(name, _)| *name == week_name) {
            Some(pos) => pos,
            None => {
                weeks.push((week_name, Vec::new()));
                weeks.len() - 1
            }
        };
        weeks[week_pos].1.push(WorkoutItem {
            workout: workout.as_ref(),
            index,
        });
    }

    cycles
        .into_iter()
        .map(|(cycle_name, weeks)| {
            let weeks: Vec<WeekGroup<'a>> = weeks
                .into_iter()
                .map(|(week_name, items)| {
                    let done_count = items
                        .iter()
                        .filter(|item| is_done(progress, &item.workout.id))
                        .count();
                    WeekGroup {
                        name: week_name.to_string(),
                        total: items.len(),
                        done_count,
                        items,
                    }
                })
                .collect();
            CycleGroup {
                name: cycle_name.to_string(),
                total: weeks.iter().map(|week| week.total).sum(),
                done_count: weeks.iter().map(|week| week.done_count).sum(),
                weeks,
            }
        })
        .collect()
}

/// Index of the first workout not marked done, or 0.
pub fn first_not_done(workouts: &[SharedWorkout], progress: &Progress) -> usize {
    workouts
        .iter()
        .position(|workout| !is_done(progress, &workout.id))
        .unwrap_or(0)
}

pub fn next_index(current: usize, len: usize) -> usize {
    if len == 0 {
        0
    } else {
        (current + 1) % len
    }
}
