use crate::data::units::Timestamp;
use arrayvec::ArrayVec;
use serde::Serialize;

/// Time range the chart should show after a trigger completes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartWindow {
    pub window_begin: Timestamp,
    pub window_end: Timestamp,
    /// `window_end - window_begin`, in microseconds.
    pub window_duration: f64,
}

impl ChartWindow {
    pub fn new(window_begin: Timestamp, window_end: Timestamp) -> Self {
        Self {
            window_begin,
            window_end,
            window_duration: window_end - window_begin,
        }
    }
}

/// Slots of the circular sample buffer covered by a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BufferSpan {
    /// First slot, always within `[0, capacity)`.
    pub start: usize,
    pub len: usize,
}

impl BufferSpan {
    /// Maps a window starting at (possibly negative or unwrapped) sample
    /// index `from` onto a buffer of `capacity` slots.
    pub fn remap(from: i64, len: u64, capacity: usize) -> Self {
        Self {
            start: from.rem_euclid(capacity as i64) as usize,
            len: len as usize,
        }
    }

    /// The span runs past the buffer tail and continues at its head.
    pub fn wraps(&self, capacity: usize) -> bool {
        self.start + self.len > capacity
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriggerEffect {
    /// The trigger fired at `start_index`.
    ArmTrigger { start_index: u64 },
    ClearSingleWaiting,
    /// Halt acquisition on the device. Not a store update.
    StopDevice,
    RenderWindow { window: ChartWindow, span: BufferSpan },
    /// The window was handed off and the trigger rearms. `origin` is the
    /// unshifted trigger index for pre/post triggering devices and `None`
    /// for hardware triggered ones.
    CompleteTrigger { origin: Option<u64> },
}

/// Effects of a single sample, in the order they must be applied.
pub type TriggerEffects = ArrayVec<TriggerEffect, 4>;
