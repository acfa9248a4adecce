use crate::data_manager::{
    read_json, write_json, DataResult, KeyValueStore, COLLAPSE_KEY, MUSIC_KEY, PROFILE_KEY,
    SETTINGS_KEY,
};
use crate::models::{Profile, Settings};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const PROFILE_VERSION: u32 = 1;

pub type CollapseState = BTreeMap<String, bool>;

#[derive(Debug, Serialize, Deserialize)]
struct ProfileEnvelope {
    version: u32,
    data: Profile,
}

/// Persisted user preferences that live outside the progress map.
#[derive(Debug, Clone)]
pub struct Preferences<S> {
    store: S,
}

impl<S: KeyValueStore> Preferences<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Missing or unreadable settings fall back to defaults; missing fields
    /// default to `true`.
    pub fn load_settings(&self) -> Settings {
        match read_json::<_, Settings>(&self.store, SETTINGS_KEY) {
            Ok(Some(settings)) => settings,
            Ok(None) => Settings::default(),
            Err(err) => {
                log::warn!("Ignoring unreadable settings: {err}");
                Settings::default()
            }
        }
    }

    pub fn save_settings(&self, settings: &Settings) -> DataResult<()> {
        write_json(&self.store, SETTINGS_KEY, settings)
    }

    /// Reads the versioned profile. A bare legacy profile is accepted and
    /// rewritten in the envelope format.
    pub fn load_profile(&self) -> Option<Profile> {
        let value = match read_json::<_, Value>(&self.store, PROFILE_KEY) {
            Ok(value) => value?,
            Err(err) => {
                log::warn!("Ignoring unreadable profile: {err}");
                return None;
            }
        };

        let is_current = value.get("version").and_then(Value::as_u64) == Some(u64::from(PROFILE_VERSION));
        if is_current {
            return match serde_json::from_value::<ProfileEnvelope>(value) {
                Ok(envelope) => Some(envelope.data),
                Err(err) => {
                    log::warn!("Ignoring malformed profile: {err}");
                    None
                }
            };
        }

        match serde_json::from_value::<Profile>(value) {
            Ok(profile) => {
                if let Err(err) = self.save_profile(&profile) {
                    log::error!("Failed to upgrade stored profile: {err}");
                }
                Some(profile)
            }
            Err(err) => {
                log::warn!("Ignoring malformed profile: {err}");
                None
            }
        }
    }

    pub fn save_profile(&self, profile: &Profile) -> DataResult<()> {
        let envelope = ProfileEnvelope {
            version: PROFILE_VERSION,
            data: profile.clone(),
        };
        write_json(&self.store, PROFILE_KEY, &envelope)
    }

    pub fn collapse_state(&self) -> CollapseState {
        read_json(&self.store, COLLAPSE_KEY)
            .ok()
            .flatten()
            .unwrap_or_default()
    }

    pub fn set_collapse_state(&self, state: &CollapseState) -> DataResult<()> {
        write_json(&self.store, COLLAPSE_KEY, state)
    }

    /// Flip one section's open flag and persist the whole map.
    pub fn toggle_collapse(&self, name: &str) -> DataResult<CollapseState> {
        let mut state = self.collapse_state();
        let open = state.get(name).copied().unwrap_or(false);
        state.insert(name.to_string(), !open);
        self.set_collapse_state(&state)?;
        Ok(state)
    }

    pub fn music_id(&self) -> Option<String> {
        match self.store.get(MUSIC_KEY) {
            Ok(value) => value.filter(|id| !id.is_empty()),
            Err(err) => {
                log::warn!("Failed to read music id: {err}");
                None
            }
        }
    }

    pub fn set_music_id(&self, id: &str) -> DataResult<()> {
        self.store.set(MUSIC_KEY, id)
    }

    pub fn clear_music_id(&self) -> DataResult<()> {
        self.store.remove(MUSIC_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::Preferences;
    use crate::data_manager::{DataManager, KeyValueStore, MemoryStore, PROFILE_KEY, SETTINGS_KEY};
    use crate::models::{Profile, Settings};
    use tempfile::TempDir;

    #[test]
    fn settings_default_when_missing_or_corrupt() {
        let prefs = Preferences::new(MemoryStore::new());
        assert_eq!(prefs.load_settings(), Settings::default());

        prefs.store.set(SETTINGS_KEY, "[1,2").expect("seed");
        assert_eq!(prefs.load_settings(), Settings::default());
    }

    #[test]
    fn settings_roundtrip_and_fill_missing_fields() {
        let prefs = Preferences::new(MemoryStore::new());
        let settings = Settings {
            audio_cues: false,
            enable_cooldown: false,
            ..Settings::default()
        };
        prefs.save_settings(&settings).expect("save");
        assert_eq!(prefs.load_settings(), settings);

        prefs
            .store
            .set(SETTINGS_KEY, r#"{"trackReps":false}"#)
            .expect("seed");
        let loaded = prefs.load_settings();
        assert!(!loaded.track_reps);
        assert!(loaded.audio_cues && loaded.enable_warmup);
    }

    #[test]
    fn legacy_profile_is_upgraded() {
        let prefs = Preferences::new(MemoryStore::new());
        prefs.store.set(PROFILE_KEY, r#"{"name":"Sam"}"#).expect("seed");

        let profile = prefs.load_profile().expect("profile");
        assert_eq!(profile.name, "Sam");

        let raw = prefs.store.get(PROFILE_KEY).expect("get").expect("stored");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(value["version"], 1);
        assert_eq!(value["data"]["name"], "Sam");
    }

    #[test]
    fn missing_or_corrupt_profile_is_none() {
        let prefs = Preferences::new(MemoryStore::new());
        assert!(prefs.load_profile().is_none());
        prefs.store.set(PROFILE_KEY, "nope").expect("seed");
        assert!(prefs.load_profile().is_none());
    }

    #[test]
    fn profile_roundtrip_on_disk() {
        let dir = TempDir::new().expect("temp dir");
        let prefs = Preferences::new(DataManager::new(dir.path()).expect("manager"));
        let profile = Profile {
            name: "Robin".to_string(),
        };
        prefs.save_profile(&profile).expect("save");
        assert_eq!(prefs.load_profile(), Some(profile));
    }

    #[test]
    fn collapse_state_toggles() {
        let prefs = Preferences::new(MemoryStore::new());
        assert!(prefs.collapse_state().is_empty());

        let state = prefs.toggle_collapse("Cycle 1").expect("toggle");
        assert_eq!(state.get("Cycle 1"), Some(&true));
        let state = prefs.toggle_collapse("Cycle 1").expect("toggle");
        assert_eq!(state.get("Cycle 1"), Some(&false));
        assert_eq!(prefs.collapse_state(), state);
    }

    #[test]
    fn music_id_is_stored_raw() {
        let prefs = Preferences::new(MemoryStore::new());
        assert_eq!(prefs.music_id(), None);
        prefs.set_music_id("dQw4w9WgXcQ").expect("set");
        assert_eq!(prefs.music_id().as_deref(), Some("dQw4w9WgXcQ"));
        prefs.clear_music_id().expect("clear");
        assert_eq!(prefs.music_id(), None);
    }
}
