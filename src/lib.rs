pub mod audio_manager;
pub mod catalog;
pub mod config;
pub mod data_manager;
pub mod events;
pub mod history;
pub mod models;
pub mod preferences;
pub mod progress_store;
pub mod rep_buffer;
pub mod runner;
pub mod session_recovery;
pub mod session_stats;
pub mod timer_engine;
pub mod timing;
pub mod workout_session;
