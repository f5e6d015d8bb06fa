/// Number of samples covered by a trigger window.
///
/// `trigger_length` is in milliseconds, `sampling_period` in microseconds per
/// sample. The result is rounded to the nearest sample, ties away from zero.
/// Degenerate (non-positive or NaN) inputs give 0; callers validate first.
pub fn window_size(trigger_length: f64, sampling_period: f64) -> u64 {
    if !(trigger_length > 0.0 && sampling_period > 0.0) {
        return 0;
    }

    (trigger_length * 1000.0 / sampling_period).round() as u64
}

/// How many samples a pre/post triggered window is moved back from the
/// trigger point: half a window plus the offset (µs) converted to samples.
pub(crate) fn window_shift(window_size: u64, offset: f64, sampling_period: f64) -> i64 {
    (window_size as f64 / 2.0 + offset / sampling_period).round() as i64
}
