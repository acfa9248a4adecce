use crate::data_manager::KeyValueStore;
use crate::history::first_not_done;
use crate::models::{SharedWorkout, TimerSnapshot};
use crate::progress_store::ProgressStore;

/// Where the app should land on startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupSelection {
    /// An interrupted session exists for the catalog workout at `index`.
    Resume { index: usize, snapshot: TimerSnapshot },
    /// No resumable session; preselect the first workout not yet done.
    Home { index: usize },
}

impl StartupSelection {
    pub fn index(&self) -> usize {
        match self {
            StartupSelection::Resume { index, .. } | StartupSelection::Home { index } => *index,
        }
    }
}

/// Pick the interrupted session to resume, discarding snapshots that point
/// at workouts missing from `workouts`.
pub fn resolve_start<S: KeyValueStore>(
    workouts: &[SharedWorkout],
    store: &ProgressStore<S>,
) -> StartupSelection {
    let mut progress = store.load();

    let pending = progress.iter().find_map(|(uid, item)| {
        let snap = item.snap.as_ref()?;
        item.is_in_progress().then(|| (uid.clone(), snap.clone()))
    });

    if let Some((uid, snapshot)) = pending {
        if let Some(index) = workouts.iter().position(|w| w.id == snapshot.workout_id) {
            log::info!("Resuming {} at {}", snapshot.workout_id, snapshot.phase);
            return StartupSelection::Resume { index, snapshot };
        }
        log::warn!(
            "Workout to resume (id: {}) not found, clearing state",
            snapshot.workout_id
        );
        match store.clear_in_progress(&uid) {
            Ok(updated) => progress = updated,
            Err(err) => log::error!("Failed to clear stale session {uid}: {err}"),
        }
    }

    StartupSelection::Home {
        index: first_not_done(workouts, &progress),
    }
}
