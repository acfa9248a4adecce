use crate::models::WorkoutPhase;
use crate::timer_engine::TimerView;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TimerEvent {
    Tick {
        view: TimerView,
    },
    #[serde(rename_all = "camelCase")]
    PhaseChanged {
        from: WorkoutPhase,
        to: WorkoutPhase,
        view: TimerView,
    },
    #[serde(rename_all = "camelCase")]
    RepPrompt {
        exercise_index: usize,
        exercise_name: String,
        current: Option<u32>,
    },
    #[serde(rename_all = "camelCase")]
    Completed {
        workout_id: String,
    },
    Paused,
    Resumed,
    Reset,
    Exited,
}

impl TimerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            TimerEvent::Tick { .. } => "timer-tick",
            TimerEvent::PhaseChanged { .. } => "phase-changed",
            TimerEvent::RepPrompt { .. } => "rep-prompt",
            TimerEvent::Completed { .. } => "workout-completed",
            TimerEvent::Paused => "timer-paused",
            TimerEvent::Resumed => "timer-resumed",
            TimerEvent::Reset => "timer-reset",
            TimerEvent::Exited => "timer-exited",
        }
    }
}

/// Where a session publishes what happened. Delivery is best effort.
pub trait EventSink: Send {
    fn emit(&mut self, event: TimerEvent);
}

impl EventSink for Vec<TimerEvent> {
    fn emit(&mut self, event: TimerEvent) {
        self.push(event);
    }
}

impl EventSink for UnboundedSender<TimerEvent> {
    fn emit(&mut self, event: TimerEvent) {
        let name = event.name();
        if let Err(err) = self.send(event) {
            log::warn!("Failed to emit {name}: {err}");
        }
    }
}
