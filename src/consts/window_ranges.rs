use super::HW_TRIGGER_SAMPLING_PERIOD;
use crate::data::config::WindowRange;

/// Hardware trigger windows hold between 450 and 4000 samples.
pub const HW_TRIGGER_WINDOW_RANGE: WindowRange = WindowRange {
    min: 450.0 * HW_TRIGGER_SAMPLING_PERIOD / 1000.0,
    max: 4000.0 * HW_TRIGGER_SAMPLING_PERIOD / 1000.0,
};

pub const PRE_POST_WINDOW_RANGE: WindowRange = WindowRange {
    min: 1.0,
    max: 100.0,
};
