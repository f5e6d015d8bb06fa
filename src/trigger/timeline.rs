use crate::data::units::{SamplingPeriod, Timestamp};

/// Maps sample indices onto the capture time axis.
///
/// Indices may be negative or run past the buffer capacity when a window is
/// shifted or wraps; implementations extend the axis in both directions.
pub trait Timeline {
    fn index_to_timestamp(&self, index: i64) -> Timestamp;
}

impl<F> Timeline for F
where
    F: Fn(i64) -> Timestamp,
{
    fn index_to_timestamp(&self, index: i64) -> Timestamp {
        self(index)
    }
}

/// Evenly spaced samples, index 0 at `origin`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTimeline {
    pub origin: Timestamp,
    pub period: SamplingPeriod,
}

impl LinearTimeline {
    pub fn new(period: SamplingPeriod) -> Self {
        Self {
            origin: Timestamp::default(),
            period,
        }
    }
}

impl Timeline for LinearTimeline {
    fn index_to_timestamp(&self, index: i64) -> Timestamp {
        Timestamp(self.origin.0 + index as f64 * self.period.0)
    }
}
