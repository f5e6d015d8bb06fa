use crate::{
    buffer::SampleBuffer,
    data::{
        config::{ConfigError, TriggerConfig},
        state::{ChartState, TriggerRunState},
        units::{Current, SamplingPeriod},
    },
    device::{DeviceError, TriggerDevice},
    trigger::{
        LinearTimeline, SamplingContext, TriggerEffect, TriggerEffects, TriggerError,
        TriggerPlacement, TriggerProcessor,
    },
    InitialCaptureConfig,
};
use log::{debug, error, info, warn};
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum TriggerMode {
    /// Rearm after every completed window.
    Continuous,
    /// Stop the device after the first completed window.
    Single,
}

/// A running capture: sample storage, trigger settings and the state the
/// processor threads through.
#[derive(Debug)]
pub struct CaptureSession<D> {
    device: D,
    processor: TriggerProcessor,
    config: TriggerConfig,
    sampling_time: SamplingPeriod,
    timeline: LinearTimeline,
    buffer: SampleBuffer,
    mode: Option<TriggerMode>,
    state: TriggerRunState,
    chart: ChartState,
    stop_pending: bool,
}

impl<D: TriggerDevice> CaptureSession<D> {
    pub fn new(device: D, initial: &InitialCaptureConfig) -> Result<Self, ConfigError> {
        let placement = TriggerPlacement::try_from(device.capabilities())?;
        let sampling_time = SamplingPeriod::from_frequency(initial.sample_frequency);

        initial
            .trigger
            .validate_for_buffer(sampling_time, initial.buffer_capacity)?;

        debug!(
            "capture session: {placement:?}, sampling every {sampling_time}, buffer of {} samples",
            initial.buffer_capacity
        );

        Ok(Self {
            device,
            processor: TriggerProcessor::new(placement),
            config: initial.trigger,
            sampling_time,
            timeline: LinearTimeline::new(sampling_time),
            buffer: SampleBuffer::new(initial.buffer_capacity),
            mode: None,
            state: TriggerRunState::default(),
            chart: ChartState::default(),
            stop_pending: false,
        })
    }

    pub fn start(&mut self, mode: TriggerMode) {
        info!("starting {mode} trigger at {}", self.config.trigger_level);

        self.mode = Some(mode);
        self.state = match mode {
            TriggerMode::Continuous => TriggerRunState::default(),
            TriggerMode::Single => TriggerRunState::single_shot(),
        };
        self.chart.follow_live();
    }

    pub fn stop(&mut self) {
        if let Some(mode) = self.mode.take() {
            info!("stopping {mode} trigger");
        }
        self.state = TriggerRunState::default();
    }

    /// Stores one sample and, while a trigger mode is active, runs it
    /// through the trigger processor. All returned effects are already
    /// applied to the run state and the chart, except the device stop, which
    /// waits for [`run_device_commands`](Self::run_device_commands).
    pub fn push_sample(&mut self, value: Current) -> Result<TriggerEffects, TriggerError> {
        let data_index = self.buffer.push(value);

        if self.mode.is_none() {
            return Ok(TriggerEffects::new());
        }

        let window_size = self.config.window_size(self.sampling_time);
        let end_of_trigger = self
            .state
            .trigger_start_index
            .is_some_and(|start| data_index.saturating_sub(start) >= window_size);

        let ctx = SamplingContext {
            data_index,
            sampling_time: self.sampling_time,
            buffer_capacity: self.buffer.capacity(),
            end_of_trigger,
        };

        let (state, effects) =
            self.processor
                .process_sample(value, &self.config, self.state, &ctx, &self.timeline)?;
        self.state = state;

        for effect in &effects {
            self.chart.apply(effect);
            self.log_effect(effect);

            if let TriggerEffect::StopDevice = effect {
                self.mode = None;
                self.stop_pending = true;
            }
        }

        Ok(effects)
    }

    /// Sends the device stop requested by a completed single-shot trigger.
    /// The stop is attempted once, whether or not it succeeds.
    pub fn run_device_commands(&mut self) -> Result<(), DeviceError> {
        if !std::mem::take(&mut self.stop_pending) {
            return Ok(());
        }

        self.device
            .trigger_stop()
            .inspect_err(|e| error!("failed to stop device trigger: {e}"))
    }

    fn log_effect(&self, effect: &TriggerEffect) {
        match effect {
            TriggerEffect::ArmTrigger { start_index } => {
                debug!("trigger armed at sample {start_index}");
            }
            TriggerEffect::StopDevice => info!("single trigger completed"),
            TriggerEffect::RenderWindow { window, span } => {
                if span.wraps(self.buffer.capacity()) {
                    warn!(
                        "trigger window at slot {} wraps around the sample buffer",
                        span.start
                    );
                }
                debug!(
                    "trigger window {} .. {}",
                    window.window_begin, window.window_end
                );
            }
            TriggerEffect::CompleteTrigger { origin } => {
                debug!("trigger completed, origin {origin:?}");
            }
            TriggerEffect::ClearSingleWaiting => {}
        }
    }

    pub fn set_trigger_level(&mut self, level: Current) {
        if self.config.external_trigger {
            warn!("ignoring trigger level {level}, the device uses an external trigger");
            return;
        }
        self.config.trigger_level = level;
    }

    pub fn set_external_trigger(&mut self, external: bool) {
        self.config.external_trigger = external;
    }

    /// Applies a new trigger length, in milliseconds, from the next sample on.
    pub fn set_trigger_length(&mut self, length: f64) -> Result<(), ConfigError> {
        self.update_config(TriggerConfig {
            trigger_length: length,
            ..self.config
        })
    }

    /// Applies a new window offset, in microseconds, from the next sample on.
    pub fn set_window_offset(&mut self, offset: f64) -> Result<(), ConfigError> {
        self.update_config(TriggerConfig {
            trigger_window_offset: offset,
            ..self.config
        })
    }

    fn update_config(&mut self, config: TriggerConfig) -> Result<(), ConfigError> {
        config
            .validate_for_buffer(self.sampling_time, self.buffer.capacity())
            .inspect_err(|e| warn!("rejected trigger settings: {e}"))?;
        self.config = config;
        Ok(())
    }

    pub fn mode(&self) -> Option<TriggerMode> {
        self.mode
    }

    pub fn trigger_active(&self) -> bool {
        self.mode.is_some()
    }

    pub fn config(&self) -> &TriggerConfig {
        &self.config
    }

    pub fn sampling_time(&self) -> SamplingPeriod {
        self.sampling_time
    }

    pub fn state(&self) -> TriggerRunState {
        self.state
    }

    pub fn chart(&self) -> &ChartState {
        &self.chart
    }

    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    pub fn device(&self) -> &D {
        &self.device
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data::{
            config::DeviceCapabilities,
            units::{Frequency, Timestamp},
        },
        device::DeviceError,
        trigger::ChartWindow,
    };

    #[derive(Debug, Default)]
    struct MockDevice {
        capabilities: DeviceCapabilities,
        stops: usize,
        fail_stop: bool,
    }

    impl TriggerDevice for MockDevice {
        fn capabilities(&self) -> DeviceCapabilities {
            self.capabilities
        }

        fn trigger_stop(&mut self) -> Result<(), DeviceError> {
            self.stops += 1;
            if self.fail_stop {
                Err(DeviceError::Disconnected)
            } else {
                Ok(())
            }
        }
    }

    fn pre_post() -> MockDevice {
        MockDevice {
            capabilities: DeviceCapabilities {
                pre_post_triggering: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// 1 ms windows of 100 samples at 100 kHz.
    fn initial() -> InitialCaptureConfig {
        InitialCaptureConfig {
            trigger: TriggerConfig {
                trigger_length: 1.0,
                trigger_level: Current(10.0),
                ..Default::default()
            },
            sample_frequency: Frequency(100_000.0),
            buffer_capacity: 1000,
            ..Default::default()
        }
    }

    fn session(device: MockDevice) -> CaptureSession<MockDevice> {
        CaptureSession::new(device, &initial()).unwrap()
    }

    fn feed(
        session: &mut CaptureSession<MockDevice>,
        samples: impl IntoIterator<Item = f64>,
    ) -> Vec<TriggerEffect> {
        let mut all = Vec::new();
        for value in samples {
            all.extend(session.push_sample(Current(value)).unwrap());
            session.run_device_commands().unwrap();
        }
        all
    }

    fn windows(effects: &[TriggerEffect]) -> Vec<ChartWindow> {
        effects
            .iter()
            .filter_map(|e| match e {
                TriggerEffect::RenderWindow { window, .. } => Some(*window),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn rejects_device_without_trigger_support() {
        assert!(matches!(
            CaptureSession::new(MockDevice::default(), &initial()),
            Err(ConfigError::NoTriggerCapability)
        ));
    }

    #[test]
    fn rejects_window_larger_than_buffer() {
        let initial = InitialCaptureConfig {
            buffer_capacity: 50,
            ..initial()
        };
        assert!(matches!(
            CaptureSession::new(pre_post(), &initial),
            Err(ConfigError::WindowExceedsBuffer { .. })
        ));
    }

    #[test]
    fn samples_are_stored_but_not_processed_while_stopped() {
        let mut session = session(pre_post());
        let effects = feed(&mut session, [50.0; 10]);

        assert!(effects.is_empty());
        assert_eq!(session.buffer().written(), 10);
        assert_eq!(session.state().trigger_start_index, None);
    }

    #[test]
    fn continuous_trigger_renders_centered_window_and_rearms() {
        let mut session = session(pre_post());
        session.start(TriggerMode::Continuous);

        let mut samples = vec![0.0; 150];
        samples[20] = 50.0;
        let effects = feed(&mut session, samples);

        assert_eq!(
            windows(&effects),
            [ChartWindow::new(Timestamp(-300.0), Timestamp(700.0))]
        );
        assert!(effects.contains(&TriggerEffect::CompleteTrigger { origin: Some(20) }));
        assert_eq!(session.state().trigger_start_index, None);
        assert_eq!(session.mode(), Some(TriggerMode::Continuous));
        assert_eq!(session.chart().window, windows(&effects).first().copied());
        assert_eq!(session.device().stops, 0);
    }

    #[test]
    fn single_trigger_stops_the_device_once() {
        let mut session = session(pre_post());
        session.start(TriggerMode::Single);
        assert!(session.state().trigger_single_waiting);

        let effects = feed(&mut session, [50.0; 300]);

        assert_eq!(windows(&effects).len(), 1);
        assert_eq!(session.device().stops, 1);
        assert_eq!(session.mode(), None);
        assert!(!session.state().trigger_single_waiting);
    }

    #[test]
    fn failed_device_stop_keeps_the_completed_window() {
        let mut session = session(MockDevice {
            fail_stop: true,
            ..pre_post()
        });
        session.start(TriggerMode::Single);

        let mut effects = Vec::new();
        while !effects.contains(&TriggerEffect::StopDevice) {
            effects.extend(session.push_sample(Current(50.0)).unwrap());
        }

        assert!(matches!(
            session.run_device_commands(),
            Err(DeviceError::Disconnected)
        ));
        assert_eq!(session.chart().window, windows(&effects).first().copied());
        assert!(session.chart().window.is_some());
        assert_eq!(session.state(), TriggerRunState::default());

        // the stop is attempted once only
        assert!(session.run_device_commands().is_ok());
        assert_eq!(session.device().stops, 1);
    }

    #[test]
    fn hardware_trigger_window_starts_at_trigger() {
        let mut session = session(MockDevice {
            capabilities: DeviceCapabilities {
                hw_trigger: true,
                pre_post_triggering: true,
            },
            ..Default::default()
        });
        session.start(TriggerMode::Continuous);

        let mut samples = vec![0.0; 120];
        samples[5] = 50.0;
        let effects = feed(&mut session, samples);

        assert_eq!(
            windows(&effects),
            [ChartWindow::new(Timestamp(50.0), Timestamp(1050.0))]
        );
        assert!(effects.contains(&TriggerEffect::CompleteTrigger { origin: None }));
    }

    #[test]
    fn external_trigger_keeps_the_level() {
        let mut session = session(pre_post());
        session.set_external_trigger(true);
        session.set_trigger_level(Current(99.0));
        assert_eq!(session.config().trigger_level, Current(10.0));

        session.set_external_trigger(false);
        session.set_trigger_level(Current(99.0));
        assert_eq!(session.config().trigger_level, Current(99.0));
    }

    #[test]
    fn invalid_updates_keep_previous_settings() {
        let mut session = session(pre_post());

        assert!(session.set_trigger_length(500.0).is_err());
        assert!(session.set_window_offset(600.0).is_err());
        assert_eq!(session.config().trigger_length, 1.0);
        assert_eq!(session.config().trigger_window_offset, 0.0);

        session.set_trigger_length(2.0).unwrap();
        session.set_window_offset(-400.0).unwrap();
        assert_eq!(session.config().window_size(session.sampling_time()), 200);
    }

    #[test]
    fn stop_disarms_and_start_follows_live_data() {
        let mut session = session(pre_post());
        session.start(TriggerMode::Continuous);
        feed(&mut session, [50.0; 2]);
        assert!(session.state().trigger_start_index.is_some());

        session.stop();
        assert_eq!(session.state(), TriggerRunState::default());
        assert!(!session.trigger_active());
        assert!(!session.chart().is_live(false, session.trigger_active()));

        session.start(TriggerMode::Continuous);
        assert!(session.chart().is_live(false, session.trigger_active()));
    }
}
