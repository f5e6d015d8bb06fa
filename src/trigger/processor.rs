use super::{
    effect::{BufferSpan, ChartWindow, TriggerEffect, TriggerEffects},
    timeline::Timeline,
    window::{window_shift, window_size},
};
use crate::data::{
    config::{ConfigError, DeviceCapabilities, NoTriggerCapabilitySnafu, TriggerConfig},
    state::TriggerRunState,
    units::{Current, SamplingPeriod},
};
use snafu::{ensure, OptionExt, Snafu};

#[derive(Debug, Snafu)]
pub enum TriggerError {
    /// The trigger and completion indices do not fit the declared buffer
    /// capacity. Indicates a capacity mismatch in the caller.
    #[snafu(display(
        "trigger window from index {start_index} to {data_index} does not fit a buffer of {capacity} samples"
    ))]
    WindowOutOfBuffer {
        start_index: u64,
        data_index: u64,
        capacity: usize,
    },
}

/// Where the displayed window sits relative to the trigger point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerPlacement {
    /// The device triggers in hardware; the window runs from the trigger
    /// index to the completing index, unshifted.
    HardwareTriggered,
    /// The window is shifted back by half its size plus the configured offset.
    PrePostTriggering,
}

impl TryFrom<DeviceCapabilities> for TriggerPlacement {
    type Error = ConfigError;

    fn try_from(caps: DeviceCapabilities) -> Result<Self, Self::Error> {
        if caps.hw_trigger {
            Ok(TriggerPlacement::HardwareTriggered)
        } else {
            caps.pre_post_triggering
                .then_some(TriggerPlacement::PrePostTriggering)
                .context(NoTriggerCapabilitySnafu)
        }
    }
}

/// Buffer state at the sample being processed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingContext {
    /// Index of the sample just written. Either absolute or a buffer slot;
    /// a value below the trigger index is read as the buffer having wrapped.
    pub data_index: u64,
    pub sampling_time: SamplingPeriod,
    pub buffer_capacity: usize,
    /// The post-trigger part of the window has been captured.
    pub end_of_trigger: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerProcessor {
    placement: TriggerPlacement,
}

impl TriggerProcessor {
    pub fn new(placement: TriggerPlacement) -> Self {
        Self { placement }
    }

    /// Runs one sample through the trigger state machine.
    ///
    /// Returns the run state after applying the effects, and the effects
    /// themselves in application order:
    /// `[ClearSingleWaiting, StopDevice]` (single-shot only), `RenderWindow`,
    /// `CompleteTrigger`. Arming yields a lone `ArmTrigger`. The result only
    /// depends on the arguments.
    pub fn process_sample(
        &self,
        value: Current,
        config: &TriggerConfig,
        state: TriggerRunState,
        ctx: &SamplingContext,
        timeline: &impl Timeline,
    ) -> Result<(TriggerRunState, TriggerEffects), TriggerError> {
        let mut effects = TriggerEffects::new();

        let Some(start_index) = state.trigger_start_index else {
            if value >= config.trigger_level {
                effects.push(TriggerEffect::ArmTrigger {
                    start_index: ctx.data_index,
                });
            }
            return Ok((state.applied(&effects), effects));
        };

        if !ctx.end_of_trigger {
            return Ok((state, effects));
        }

        let span = window_span(start_index, ctx)?;
        let size = window_size(config.trigger_length, ctx.sampling_time.0);

        let from = start_index as i64;
        let to = from + span as i64;
        let (from, to, origin) = match self.placement {
            TriggerPlacement::HardwareTriggered => (from, to, None),
            TriggerPlacement::PrePostTriggering => {
                let shift = window_shift(
                    size,
                    config.trigger_window_offset,
                    ctx.sampling_time.0,
                );
                // a zero sampling period saturates the shift
                (
                    from.saturating_sub(shift),
                    to.saturating_sub(shift),
                    Some(start_index),
                )
            }
        };

        if state.trigger_single_waiting {
            effects.push(TriggerEffect::ClearSingleWaiting);
            effects.push(TriggerEffect::StopDevice);
        }

        effects.push(TriggerEffect::RenderWindow {
            window: ChartWindow::new(
                timeline.index_to_timestamp(from),
                timeline.index_to_timestamp(to),
            ),
            span: BufferSpan::remap(from, span, ctx.buffer_capacity),
        });
        effects.push(TriggerEffect::CompleteTrigger { origin });

        Ok((state.applied(&effects), effects))
    }
}

/// Samples between the trigger index and the completing index, unwrapping
/// the buffer once if the completing index is below the trigger index.
fn window_span(start_index: u64, ctx: &SamplingContext) -> Result<u64, TriggerError> {
    let capacity = ctx.buffer_capacity as u64;
    let out_of_buffer = WindowOutOfBufferSnafu {
        start_index,
        data_index: ctx.data_index,
        capacity: ctx.buffer_capacity,
    };

    ensure!(capacity > 0, out_of_buffer);

    let span = if ctx.data_index >= start_index {
        ctx.data_index - start_index
    } else {
        // a wrapped completion only makes sense for a trigger slot inside the buffer
        ensure!(start_index < capacity, out_of_buffer);
        ctx.data_index + capacity - start_index
    };

    ensure!(span <= capacity, out_of_buffer);

    Ok(span)
}
