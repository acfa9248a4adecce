use crate::data_manager::{DataResult, KeyValueStore, PROGRESS_KEY, RESUME_KEY};
use crate::models::{Progress, ProgressItem, SharedWorkout, TimerSnapshot};
use serde::Serialize;
use serde_json::Value;

pub const CURRENT_VERSION: u32 = 1;

/// A step that rewrites raw data stored at `from` into the shape of `from + 1`.
type Migration = fn(Value) -> Value;

const MIGRATIONS: &[(u32, Migration)] = &[(0, clear_stale_sessions)];

#[derive(Serialize)]
struct Envelope<'a> {
    version: u32,
    data: &'a Progress,
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Versioned map of workout id to progress, persisted under one key.
///
/// Every operation reloads the whole map, changes it and writes it back.
#[derive(Debug, Clone)]
pub struct ProgressStore<S> {
    store: S,
    clock: fn() -> i64,
}

impl<S: KeyValueStore> ProgressStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            clock: now_millis,
        }
    }

    pub fn with_clock(store: S, clock: fn() -> i64) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Never fails: absent data is empty, corrupt data is wiped, old data is
    /// migrated and written back.
    pub fn load(&self) -> Progress {
        let raw = match self.store.get(PROGRESS_KEY) {
            Ok(Some(raw)) if !raw.trim().is_empty() => raw,
            Ok(_) => return Progress::new(),
            Err(err) => {
                log::error!("Failed to read progress: {err}");
                return Progress::new();
            }
        };

        let parsed: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => return self.wipe(&format!("unparseable progress: {err}")),
        };

        let (version, data) = split_envelope(parsed);
        if version > CURRENT_VERSION {
            return self.wipe(&format!(
                "progress version {version} is newer than supported {CURRENT_VERSION}"
            ));
        }

        if version == CURRENT_VERSION {
            return match serde_json::from_value(data) {
                Ok(progress) => progress,
                Err(err) => self.wipe(&format!("malformed progress data: {err}")),
            };
        }

        log::info!("Migrating progress data from v{version} to v{CURRENT_VERSION}");
        let migrated = MIGRATIONS
            .iter()
            .filter(|(from, _)| *from >= version)
            .fold(data, |value, (_, step)| step(value));

        match serde_json::from_value::<Progress>(migrated) {
            Ok(progress) => {
                if let Err(err) = self.save(&progress) {
                    log::error!("Failed to persist migrated progress: {err}");
                }
                progress
            }
            Err(err) => self.wipe(&format!("progress migration failed: {err}")),
        }
    }

    pub fn save(&self, progress: &Progress) -> DataResult<()> {
        let envelope = Envelope {
            version: CURRENT_VERSION,
            data: progress,
        };
        let raw = serde_json::to_string(&envelope)?;
        self.store.set(PROGRESS_KEY, &raw)
    }

    pub fn mark_done(&self, uid: &str) -> DataResult<Progress> {
        let ts = (self.clock)();
        self.update(|progress| {
            let item = progress.entry(uid.to_string()).or_default();
            item.done = Some(true);
            item.in_progress = Some(false);
            item.ts = Some(ts);
            item.snap = None;
        })
    }

    pub fn mark_in_progress(&self, uid: &str, snap: TimerSnapshot) -> DataResult<Progress> {
        let ts = (self.clock)();
        self.update(|progress| {
            let item = progress.entry(uid.to_string()).or_default();
            item.done = Some(false);
            item.in_progress = Some(true);
            item.snap = Some(snap);
            item.ts = Some(ts);
        })
    }

    pub fn clear_in_progress(&self, uid: &str) -> DataResult<Progress> {
        self.update(|progress| {
            if let Some(item) = progress.get_mut(uid) {
                item.in_progress = Some(false);
                item.snap = None;
            }
        })
    }

    /// Attaches reps to an existing entry; absent entries are left alone.
    pub fn save_reps(&self, uid: &str, reps: Vec<u32>) -> DataResult<Progress> {
        let ts = (self.clock)();
        self.update(|progress| {
            if let Some(item) = progress.get_mut(uid) {
                item.reps = Some(reps);
                item.ts = Some(ts);
            }
        })
    }

    pub fn toggle_done(&self, uid: &str) -> DataResult<Progress> {
        let ts = (self.clock)();
        self.update(|progress| {
            let item = progress.entry(uid.to_string()).or_default();
            let done = !item.is_done();
            item.done = Some(done);
            item.in_progress = Some(false);
            item.ts = Some(ts);
            if !done {
                item.reps = None;
            }
        })
    }

    pub fn mark_cycle_done(&self, workouts: &[SharedWorkout], cycle: &str) -> DataResult<Progress> {
        let ts = (self.clock)();
        self.update(|progress| {
            for workout in workouts.iter().filter(|w| w.cycle == cycle) {
                progress.insert(
                    workout.id.clone(),
                    ProgressItem {
                        done: Some(true),
                        in_progress: Some(false),
                        ts: Some(ts),
                        ..Default::default()
                    },
                );
            }
        })
    }

    pub fn reset_cycle(&self, workouts: &[SharedWorkout], cycle: &str) -> DataResult<Progress> {
        self.update(|progress| {
            for workout in workouts.iter().filter(|w| w.cycle == cycle) {
                progress.remove(&workout.id);
            }
        })
    }

    pub fn reset_all(&self) -> DataResult<Progress> {
        self.store.remove(PROGRESS_KEY)?;
        self.store.remove(RESUME_KEY)?;
        Ok(Progress::new())
    }

    fn update(&self, change: impl FnOnce(&mut Progress)) -> DataResult<Progress> {
        let mut progress = self.load();
        change(&mut progress);
        self.save(&progress)?;
        Ok(progress)
    }

    fn wipe(&self, reason: &str) -> Progress {
        log::error!("Resetting progress store: {reason}");
        if let Err(err) = self.store.remove(PROGRESS_KEY) {
            log::error!("Failed to clear progress: {err}");
        }
        Progress::new()
    }
}

/// Anything without a numeric `version` and a `data` field is a legacy
/// un-enveloped map, treated as version 0.
fn split_envelope(value: Value) -> (u32, Value) {
    if let Value::Object(mut map) = value {
        let version = map
            .get("version")
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok());
        if let (Some(version), true) = (version, map.contains_key("data")) {
            let data = map.remove("data").unwrap_or(Value::Null);
            return (version, data);
        }
        return (0, Value::Object(map));
    }
    (0, value)
}

/// v0 -> v1: snapshots changed shape, so any in-flight session is dropped.
fn clear_stale_sessions(value: Value) -> Value {
    let mut map = match value {
        Value::Object(map) => map,
        other => return other,
    };
    for (key, item) in map.iter_mut() {
        let Value::Object(fields) = item else {
            continue;
        };
        let in_progress = fields
            .get("inProgress")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let has_snap = fields.get("snap").is_some_and(|snap| !snap.is_null());
        if in_progress || has_snap {
            log::warn!("Migration: clearing stale in-progress state for {key}");
            fields.insert("inProgress".to_string(), Value::Bool(false));
            fields.remove("snap");
        }
    }
    Value::Object(map)
}
