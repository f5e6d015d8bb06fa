mod window_ranges;

pub use window_ranges::{HW_TRIGGER_WINDOW_RANGE, PRE_POST_WINDOW_RANGE};

use crate::data::units::{Current, Frequency};

pub const DEFAULT_SAMPLE_FREQUENCY: Frequency = Frequency(100_000.0);

/// Ten seconds of samples at the default sample frequency.
pub const DEFAULT_BUFFER_CAPACITY: usize = 10 * 100_000;

/// Trigger window length, in milliseconds.
pub const DEFAULT_TRIGGER_LENGTH: f64 = 10.0;
pub const DEFAULT_TRIGGER_LEVEL: Current = Current(1000.0);

/// Fixed sampling period of devices that trigger in hardware, in microseconds.
pub const HW_TRIGGER_SAMPLING_PERIOD: f64 = 13.0;
