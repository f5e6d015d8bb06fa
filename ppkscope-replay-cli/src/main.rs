mod logger;

use clap::{Parser, ValueEnum};
use log::{info, warn};
use ppkscope::{
    data::{config::DeviceCapabilities, units::Current},
    device::{run_capture_loop, DeviceError, TriggerDevice},
    session::{CaptureSession, TriggerMode},
    CaptureCommand, CaptureMessage, InitialCaptureConfig,
};
use std::{
    error::Error,
    io::{BufRead, BufReader},
    path::PathBuf,
    thread::JoinHandle,
};
use tokio::sync::mpsc;

/// Replays recorded current samples (one µA value per stdin line) through
/// the trigger pipeline and prints every captured window as JSON.
#[derive(Parser)]
#[command(name = "ppkscope-replay-cli")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Capture configuration as JSON; missing fields use the defaults
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Stop after the first trigger window
    #[arg(long)]
    single: bool,

    /// Trigger level, e.g. `1500` (µA) or `1.5mA`
    #[arg(long, value_name = "CURRENT")]
    level: Option<Current>,

    /// Log level, overrides RUST_LOG
    #[arg(long, value_enum)]
    log_level: Option<LogLevelArg>,

    /// Samples handed to the capture loop at once
    #[arg(long, default_value_t = 1024)]
    batch: usize,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevelArg {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevelArg {
    fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevelArg::Off => log::LevelFilter::Off,
            LogLevelArg::Error => log::LevelFilter::Error,
            LogLevelArg::Warn => log::LevelFilter::Warn,
            LogLevelArg::Info => log::LevelFilter::Info,
            LogLevelArg::Debug => log::LevelFilter::Debug,
            LogLevelArg::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Stands in for the device the samples were recorded from.
struct ReplayDevice {
    capabilities: DeviceCapabilities,
    stopped: bool,
}

impl TriggerDevice for ReplayDevice {
    fn capabilities(&self) -> DeviceCapabilities {
        self.capabilities
    }

    fn trigger_stop(&mut self) -> Result<(), DeviceError> {
        if self.stopped {
            return Err(DeviceError::Rejected {
                command: "trigger stop",
            });
        }
        self.stopped = true;
        Ok(())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    logger::init(cli.log_level.map(LogLevelArg::to_level_filter));

    let initial: InitialCaptureConfig = match &cli.config {
        Some(path) => InitialCaptureConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => InitialCaptureConfig::default(),
    };

    let device = ReplayDevice {
        capabilities: initial.capabilities,
        stopped: false,
    };
    let session = CaptureSession::new(device, &initial)?;

    let (message_tx, mut message_rx) = mpsc::channel::<CaptureMessage>(64);
    let (commands_tx, commands_rx) = mpsc::channel::<CaptureCommand>(8);
    let (samples_tx, samples_rx) = mpsc::channel::<Vec<Current>>(16);

    if let Some(level) = cli.level {
        commands_tx.send(CaptureCommand::from(level)).await?;
    }
    let mode = if cli.single {
        TriggerMode::Single
    } else {
        TriggerMode::Continuous
    };
    commands_tx.send(CaptureCommand::from(mode)).await?;
    drop(commands_tx);

    let reader = spawn_reader(BufReader::new(std::io::stdin()), cli.batch, samples_tx);

    let printer = async {
        while let Some(message) = message_rx.recv().await {
            print_message(&message)?;
        }
        Ok::<_, serde_json::Error>(())
    };

    let (session, printed) = tokio::join!(
        run_capture_loop(session, message_tx, commands_rx, samples_rx),
        printer
    );
    // on early errors the reader may still block on stdin; it is left behind
    let session = session?;
    printed?;

    let samples = reader.join().map_err(|_| "stdin reader panicked")??;
    info!(
        "replayed {samples} samples, trigger level {}, trigger {}",
        session.config().trigger_level,
        if session.trigger_active() {
            "still running"
        } else {
            "stopped"
        }
    );

    Ok(())
}

/// Reads one sample per line on a plain thread, so a blocked read never
/// holds up runtime shutdown. Returns the number of samples read.
fn spawn_reader(
    input: impl BufRead + Send + 'static,
    batch_size: usize,
    samples_tx: mpsc::Sender<Vec<Current>>,
) -> JoinHandle<std::io::Result<u64>> {
    let batch_size = batch_size.max(1);

    std::thread::spawn(move || {
        let mut batch = Vec::with_capacity(batch_size);
        let mut count = 0;

        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match line.parse::<Current>() {
                Ok(sample) => {
                    batch.push(sample);
                    count += 1;
                }
                Err(e) => warn!("skipping {line:?}: {e}"),
            }

            if batch.len() == batch_size {
                let full = std::mem::replace(&mut batch, Vec::with_capacity(batch_size));
                if samples_tx.blocking_send(full).is_err() {
                    return Ok(count);
                }
            }
        }

        if !batch.is_empty() {
            let _ = samples_tx.blocking_send(batch);
        }
        Ok(count)
    })
}

fn print_message(message: &CaptureMessage) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string(message)?);

    if let CaptureMessage::Window { window, samples } = message {
        let (clock, subsecond) = window.window_begin.clock_label();
        let peak = samples
            .iter()
            .copied()
            .fold(Current(0.0), |peak, s| if s > peak { s } else { peak });
        info!(
            "window {} .. {} ({clock} {subsecond}), {} samples, peak {peak}",
            window.window_begin,
            window.window_end,
            samples.len()
        );
    }

    Ok(())
}
