use crate::{
    data::{config::DeviceCapabilities, units::Current},
    session::CaptureSession,
    trigger::TriggerError,
    CaptureCommand, CaptureMessage,
};
use log::{debug, trace};
use snafu::{ResultExt, Snafu};
use tokio::sync::mpsc::{self, error::TryRecvError};

/// The parts of a measurement device the trigger pipeline talks to.
pub trait TriggerDevice {
    fn capabilities(&self) -> DeviceCapabilities;

    /// Halts trigger acquisition. Sent once per completed single-shot trigger.
    fn trigger_stop(&mut self) -> Result<(), DeviceError>;
}

#[derive(Debug, Snafu)]
pub enum DeviceError {
    #[snafu(display("device disconnected"))]
    Disconnected,
    #[snafu(display("device rejected {command}"))]
    Rejected { command: &'static str },
}

#[derive(Debug, Snafu)]
pub enum RunError {
    #[snafu(context(false))]
    Trigger { source: TriggerError },
    Device { source: DeviceError },
}

/// Feeds sample batches through `session` until the sample channel closes or
/// nobody listens for messages anymore, then hands the session back.
///
/// Commands queued before a batch are applied before that batch. Once the
/// command channel closes, remaining batches are still processed. Messages of
/// a sample are forwarded before a failed device stop ends the loop.
pub async fn run_capture_loop<D: TriggerDevice>(
    mut session: CaptureSession<D>,
    message_tx: mpsc::Sender<CaptureMessage>,
    mut commands_rx: mpsc::Receiver<CaptureCommand>,
    mut samples_rx: mpsc::Receiver<Vec<Current>>,
) -> Result<CaptureSession<D>, RunError> {
    let mut commands_open = true;

    'main: while let Some(batch) = samples_rx.recv().await {
        while commands_open {
            match commands_rx.try_recv() {
                Ok(cmd) => apply_command(&mut session, cmd),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    debug!("command channel closed");
                    commands_open = false;
                }
            }
        }

        trace!("processing {} samples", batch.len());

        for sample in batch {
            let effects = session.push_sample(sample)?;
            let messages: Vec<_> = effects
                .iter()
                .filter_map(|effect| CaptureMessage::from_effect(effect, session.buffer()))
                .collect();

            let stopped = session.run_device_commands().context(DeviceSnafu);

            let mut delivered = true;
            for message in messages {
                if message_tx.send(message).await.is_err() {
                    delivered = false;
                    break;
                }
            }

            stopped?;
            if !delivered {
                break 'main;
            }
        }
    }

    Ok(session)
}

fn apply_command<D: TriggerDevice>(session: &mut CaptureSession<D>, cmd: CaptureCommand) {
    debug!("applying {cmd:?}");

    // rejected settings are logged by the session and leave it unchanged
    match cmd {
        CaptureCommand::Start(mode) => session.start(mode),
        CaptureCommand::Stop => session.stop(),
        CaptureCommand::SetTriggerLevel(level) => session.set_trigger_level(level),
        CaptureCommand::SetExternalTrigger(external) => session.set_external_trigger(external),
        CaptureCommand::SetTriggerLength(length) => {
            let _ = session.set_trigger_length(length);
        }
        CaptureCommand::SetWindowOffset(offset) => {
            let _ = session.set_window_offset(offset);
        }
    }
}
