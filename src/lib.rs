use buffer::SampleBuffer;
use consts::{DEFAULT_BUFFER_CAPACITY, DEFAULT_SAMPLE_FREQUENCY};
use data::{
    config::{DeviceCapabilities, TriggerConfig},
    units::{Current, Frequency},
};
use serde::{Deserialize, Serialize};
use session::TriggerMode;
use trigger::{ChartWindow, TriggerEffect};

pub mod buffer;
pub mod consts;
pub mod data;
pub mod device;
pub mod scaled_number;
pub mod session;
pub mod trigger;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CaptureCommand {
    Start(TriggerMode),
    Stop,
    SetTriggerLevel(Current),
    SetExternalTrigger(bool),
    /// Milliseconds.
    SetTriggerLength(f64),
    /// Microseconds.
    SetWindowOffset(f64),
}

impl From<TriggerMode> for CaptureCommand {
    fn from(mode: TriggerMode) -> Self {
        Self::Start(mode)
    }
}
impl From<Current> for CaptureCommand {
    fn from(level: Current) -> Self {
        Self::SetTriggerLevel(level)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CaptureMessage {
    #[serde(rename_all = "camelCase")]
    Armed { start_index: u64 },
    /// A completed trigger window and the samples it covers.
    Window {
        window: ChartWindow,
        samples: Vec<Current>,
    },
    SingleShotFinished,
}

impl CaptureMessage {
    pub fn from_effect(effect: &TriggerEffect, buffer: &SampleBuffer) -> Option<Self> {
        match *effect {
            TriggerEffect::ArmTrigger { start_index } => Some(Self::Armed { start_index }),
            TriggerEffect::RenderWindow { window, span } => Some(Self::Window {
                window,
                samples: buffer.span(span).collect(),
            }),
            TriggerEffect::StopDevice => Some(Self::SingleShotFinished),
            TriggerEffect::ClearSingleWaiting | TriggerEffect::CompleteTrigger { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InitialCaptureConfig {
    pub trigger: TriggerConfig,
    pub capabilities: DeviceCapabilities,
    pub sample_frequency: Frequency,
    pub buffer_capacity: usize,
}

impl InitialCaptureConfig {
    /// Parses a capture config file. Without an explicit
    /// `trigger.triggerWindowRange` the range of the device family is used.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let has_range = value.pointer("/trigger/triggerWindowRange").is_some();

        let mut config: Self = serde_json::from_value(value)?;
        if !has_range {
            config.trigger.trigger_window_range = config.capabilities.default_window_range();
        }
        Ok(config)
    }
}

impl Default for InitialCaptureConfig {
    fn default() -> Self {
        Self {
            trigger: TriggerConfig::default(),
            capabilities: DeviceCapabilities {
                hw_trigger: false,
                pre_post_triggering: true,
            },
            sample_frequency: DEFAULT_SAMPLE_FREQUENCY,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}
