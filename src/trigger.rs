//! Trigger handling during a live capture.
//!
//! Every incoming sample goes through [`TriggerProcessor::process_sample`],
//! which decides whether the trigger fires, whether the window around it is
//! complete, and what has to happen next. The decisions come back as
//! [`TriggerEffect`]s for the caller to apply, in order.

pub mod effect;
pub mod processor;
pub mod timeline;
pub mod window;

pub use effect::{BufferSpan, ChartWindow, TriggerEffect, TriggerEffects};
pub use processor::{SamplingContext, TriggerError, TriggerPlacement, TriggerProcessor};
pub use timeline::{LinearTimeline, Timeline};
pub use window::window_size;
