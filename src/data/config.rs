use super::units::{Current, SamplingPeriod};
use crate::{
    consts::{
        DEFAULT_TRIGGER_LENGTH, DEFAULT_TRIGGER_LEVEL, HW_TRIGGER_WINDOW_RANGE,
        PRE_POST_WINDOW_RANGE,
    },
    trigger::window::window_size,
};
use serde::{Deserialize, Serialize};
use snafu::{ensure, Snafu};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConfigError {
    #[snafu(display("trigger length must be positive, got {length} ms"))]
    NonPositiveTriggerLength { length: f64 },
    #[snafu(display("sampling period must be positive, got {period} µs"))]
    NonPositiveSamplingPeriod { period: f64 },
    #[snafu(display("trigger length {length} ms is outside {}..={} ms", range.min, range.max))]
    TriggerLengthOutOfRange { length: f64, range: WindowRange },
    #[snafu(display("window offset {offset} µs is outside ±{limit} µs"))]
    WindowOffsetOutOfRange { offset: f64, limit: f64 },
    #[snafu(display("sample buffer has no capacity"))]
    EmptyBuffer,
    #[snafu(display("trigger window of {window} samples does not fit a buffer of {capacity}"))]
    WindowExceedsBuffer { window: u64, capacity: usize },
    NoTriggerCapability,
}

/// Allowed trigger lengths, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowRange {
    pub min: f64,
    pub max: f64,
}

impl WindowRange {
    pub fn contains(&self, length: f64) -> bool {
        self.min <= length && length <= self.max
    }
}

/// Trigger settings as kept by the host store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TriggerConfig {
    /// Window duration, in milliseconds.
    pub trigger_length: f64,
    pub trigger_level: Current,
    /// Shift of the window relative to the trigger point, in microseconds.
    /// Zero centers the trigger for devices with pre/post triggering.
    pub trigger_window_offset: f64,
    pub trigger_window_range: WindowRange,
    /// The device owns the trigger level.
    pub external_trigger: bool,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            trigger_length: DEFAULT_TRIGGER_LENGTH,
            trigger_level: DEFAULT_TRIGGER_LEVEL,
            trigger_window_offset: 0.0,
            trigger_window_range: PRE_POST_WINDOW_RANGE,
            external_trigger: false,
        }
    }
}

impl TriggerConfig {
    /// Largest allowed offset magnitude: half the window, in microseconds.
    pub fn offset_limit(&self) -> f64 {
        self.trigger_length * 1000.0 / 2.0
    }

    pub fn window_size(&self, sampling_time: SamplingPeriod) -> u64 {
        window_size(self.trigger_length, sampling_time.0)
    }

    pub fn validate(&self, sampling_time: SamplingPeriod) -> Result<(), ConfigError> {
        let length = self.trigger_length;
        ensure!(
            length.is_finite() && length > 0.0,
            NonPositiveTriggerLengthSnafu { length }
        );
        ensure!(
            sampling_time.is_valid(),
            NonPositiveSamplingPeriodSnafu {
                period: sampling_time.0
            }
        );
        ensure!(
            self.trigger_window_range.contains(length),
            TriggerLengthOutOfRangeSnafu {
                length,
                range: self.trigger_window_range
            }
        );

        let offset = self.trigger_window_offset;
        let limit = self.offset_limit();
        ensure!(
            offset.abs() <= limit,
            WindowOffsetOutOfRangeSnafu { offset, limit }
        );

        Ok(())
    }

    /// Validates and additionally checks the window fits the sample buffer.
    pub fn validate_for_buffer(
        &self,
        sampling_time: SamplingPeriod,
        capacity: usize,
    ) -> Result<(), ConfigError> {
        ensure!(capacity > 0, EmptyBufferSnafu);
        self.validate(sampling_time)?;

        let window = self.window_size(sampling_time);
        ensure!(
            window <= capacity as u64,
            WindowExceedsBufferSnafu { window, capacity }
        );

        Ok(())
    }
}

/// Trigger related capability flags reported by a device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeviceCapabilities {
    pub hw_trigger: bool,
    pub pre_post_triggering: bool,
}

impl DeviceCapabilities {
    pub fn default_window_range(&self) -> WindowRange {
        if self.hw_trigger {
            HW_TRIGGER_WINDOW_RANGE
        } else {
            PRE_POST_WINDOW_RANGE
        }
    }
}
