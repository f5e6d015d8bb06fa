use crate::trigger::effect::{ChartWindow, TriggerEffect};
use serde::{Deserialize, Serialize};

/// Trigger state mutated while a capture runs.
///
/// Created fresh (unarmed, not waiting) when a capture starts and dropped when
/// it stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerRunState {
    /// Sample index the trigger fired at, `None` while unarmed.
    pub trigger_start_index: Option<u64>,
    /// Single-shot trigger armed and not yet completed.
    pub trigger_single_waiting: bool,
}

impl TriggerRunState {
    pub fn single_shot() -> Self {
        Self {
            trigger_single_waiting: true,
            ..Default::default()
        }
    }

    pub fn apply(&mut self, effect: &TriggerEffect) {
        match effect {
            TriggerEffect::ArmTrigger { start_index } => {
                self.trigger_start_index = Some(*start_index);
            }
            TriggerEffect::ClearSingleWaiting => self.trigger_single_waiting = false,
            TriggerEffect::CompleteTrigger { .. } => self.trigger_start_index = None,
            TriggerEffect::StopDevice | TriggerEffect::RenderWindow { .. } => {}
        }
    }

    pub fn applied<'a>(mut self, effects: impl IntoIterator<Item = &'a TriggerEffect>) -> Self {
        for effect in effects {
            self.apply(effect);
        }
        self
    }
}

/// What the chart currently shows.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChartState {
    /// Last rendered trigger window, `None` while following live data.
    pub window: Option<ChartWindow>,
}

impl ChartState {
    pub fn apply(&mut self, effect: &TriggerEffect) {
        if let TriggerEffect::RenderWindow { window, .. } = effect {
            self.window = Some(*window);
        }
    }

    pub fn follow_live(&mut self) {
        self.window = None;
    }

    /// The chart scrolls with incoming data: no window is pinned and data is
    /// still flowing in.
    pub fn is_live(&self, sampling_running: bool, trigger_active: bool) -> bool {
        self.window.is_none() && (sampling_running || trigger_active)
    }
}
