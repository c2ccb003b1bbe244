//! tagplay: tap an NFC tag, and the speaker plays what the tag points at.
//!
//! Two loops share the process: a background tag sensing loop feeding the
//! action dispatcher, and a foreground command loop on stdin. Both drive
//! the same speaker handle behind one mutex.
//!
//! `tagplay write <uri>` is the provisioning mode: wait for a tag on the
//! reader and write the URI onto it, then exit.

mod config;
mod dispatch;
mod logging;
mod repl;

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use parking_lot::Mutex;
use speaker::Speaker;
use thiserror::Error;
use tracing::{error, info};

use crate::config::{AppConfig, ConfigError};
use crate::dispatch::Dispatcher;

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("could not reach the speaker: {0}")]
    Speaker(#[from] speaker::ApiError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

fn main() -> ExitCode {
    logging::init();
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        None => match run() {
            Ok(code) => code,
            Err(e) => {
                error!(error = %e, "startup failed");
                ExitCode::FAILURE
            }
        },
        Some("write") => write_command(args.next()),
        Some(other) => {
            error!(command = %other, "unknown subcommand; usage: tagplay [write <uri>]");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode, AppError> {
    let config = AppConfig::from_env()?;

    let speaker = speaker::connect(&config.connect_options())?;
    info!(authority = %speaker.authority(), "speaker connected");
    let device = Arc::new(Mutex::new(speaker));
    let dispatcher = Dispatcher::new(device, config.tap_volume);

    let mut sensor = spawn_reader(&dispatcher, &config);

    let stdin = io::stdin();
    let stdout = io::stdout();
    repl::run(&dispatcher, stdin.lock(), stdout.lock())?;

    // `exit` must be distinguishable from a dead sensing loop for any
    // supervisor watching this process.
    if let Some(handle) = sensor.as_mut() {
        handle.stop();
        if handle.is_fatal() {
            error!("tag sensing loop had already died from fault exhaustion");
            return Ok(ExitCode::FAILURE);
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(feature = "acr122")]
fn spawn_reader(dispatcher: &Dispatcher<Speaker>, config: &AppConfig) -> Option<reader::SensorHandle> {
    use reader::acr122::{Nfc1Transport, RusbBus};

    if !config.reader_enabled {
        info!("tag reader disabled by configuration");
        return None;
    }

    let tag_dispatcher = Dispatcher::new(dispatcher.device(), config.tap_volume);
    let sensor = reader::Sensor::new(
        RusbBus::default(),
        Nfc1Transport::new(),
        move |event: reader::TagEvent| {
            if let Some(uri) = event.payload_uri {
                tag_dispatcher.handle_tag(&uri);
            }
        },
        config.sensor_config(),
    );
    Some(reader::spawn(sensor))
}

#[cfg(not(feature = "acr122"))]
fn spawn_reader(_dispatcher: &Dispatcher<Speaker>, config: &AppConfig) -> Option<reader::SensorHandle> {
    if config.reader_enabled {
        tracing::warn!("built without tag reader support; keyboard control only");
    }
    None
}

#[cfg(feature = "acr122")]
fn write_command(uri: Option<String>) -> ExitCode {
    use reader::acr122::{Nfc1Transport, RusbBus};
    use reader::{TagWriter, WriterConfig};

    let Some(uri) = uri else {
        error!("usage: tagplay write <uri>");
        return ExitCode::FAILURE;
    };
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "bad configuration");
            return ExitCode::FAILURE;
        }
    };

    let writer = TagWriter::new(
        RusbBus::default(),
        Nfc1Transport::new(),
        WriterConfig { usb_id: config.reader_id, ..WriterConfig::default() },
    );
    info!(uri = %uri, "present a tag to write");
    match writer.write_uri(&uri) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "tag write failed");
            ExitCode::FAILURE
        }
    }
}

#[cfg(not(feature = "acr122"))]
fn write_command(_uri: Option<String>) -> ExitCode {
    error!("built without tag reader support; cannot write tags");
    ExitCode::FAILURE
}
