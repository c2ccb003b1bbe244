//! The tag sensing loop
//!
//! Runs on its own thread: reset the transport device, open a session, then
//! burst-poll for tags. A found tag with a usable URI becomes a [`TagEvent`]
//! handed *synchronously* to the handler — the loop cannot sense again until
//! the handler returns and the stabilization delay elapses, which is what
//! debounces a tag left sitting on the reader.
//!
//! Transport faults tear the session down and re-enter through the reset
//! controller. One reset+open cycle is one attempt against the fault
//! budget; a session that opens successfully refills the budget. Budget
//! exhaustion (or an absent device) ends the loop with an observable
//! [`SensorExit::Fatal`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime};

use tracing::{debug, error, info, warn};

use crate::error::{DeviceError, SensorError, TransportError};
use crate::event::TagEvent;
use crate::reset::{ResetController, UsbBus, UsbId, ACR122U};
use crate::transport::{PollSpec, TagTarget, TagTransport};

/// Receives debounced tag events, synchronously.
pub trait TagHandler: Send {
    fn on_tag(&mut self, event: TagEvent);
}

impl<F: FnMut(TagEvent) + Send> TagHandler for F {
    fn on_tag(&mut self, event: TagEvent) {
        self(event)
    }
}

#[derive(Debug, Clone)]
pub struct SensorConfig {
    pub usb_id: UsbId,
    pub poll: PollSpec,
    /// Reset+open attempts before the loop gives up
    pub fault_retries: u32,
    /// Fixed delay between attempts
    pub backoff: Duration,
    /// Stabilization delay after each detection
    pub debounce: Duration,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            usb_id: ACR122U,
            poll: PollSpec::default(),
            fault_retries: 3,
            backoff: Duration::from_secs(2),
            debounce: Duration::from_secs(2),
        }
    }
}

/// Why the sensing loop ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorExit {
    /// The stop signal was raised
    Stopped,
    /// Fault budget exhausted or device missing
    Fatal(SensorError),
}

enum SessionEnd {
    Stopped,
    DeviceMissing,
    Fault { message: String, had_opened: bool },
}

pub struct Sensor<B: UsbBus, T: TagTransport, H: TagHandler> {
    reset: ResetController<B>,
    transport: T,
    handler: H,
    config: SensorConfig,
    stop: Arc<AtomicBool>,
}

impl<B: UsbBus, T: TagTransport, H: TagHandler> Sensor<B, T, H> {
    pub fn new(bus: B, transport: T, handler: H, config: SensorConfig) -> Self {
        let id = config.usb_id;
        Self {
            reset: ResetController::new(bus, id),
            transport,
            handler,
            config,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The stop signal shared with [`SensorHandle`] (or a test).
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    fn should_stop(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Run until stopped or fatally faulted. Never panics on transport
    /// misbehavior; the exit value is the only way out.
    pub fn run(mut self) -> SensorExit {
        let budget = self.config.fault_retries.max(1);
        let mut attempt = 0u32;

        loop {
            if self.should_stop() {
                return SensorExit::Stopped;
            }
            attempt += 1;

            match self.session() {
                SessionEnd::Stopped => return SensorExit::Stopped,
                SessionEnd::DeviceMissing => {
                    error!("tag transport device not found; sensing loop aborting");
                    return SensorExit::Fatal(SensorError::DeviceNotFound);
                }
                SessionEnd::Fault { message, had_opened } => {
                    if had_opened {
                        // The reader worked this session; start a fresh budget.
                        attempt = 1;
                    }
                    if attempt >= budget {
                        error!(attempts = attempt, fault = %message,
                            "fault budget exhausted; sensing loop aborting");
                        return SensorExit::Fatal(SensorError::FaultBudget {
                            attempts: attempt,
                            last_fault: message,
                        });
                    }
                    warn!(attempt, budget, fault = %message, "transport fault; resetting reader");
                    if !self.pause(self.config.backoff) {
                        return SensorExit::Stopped;
                    }
                }
            }
        }
    }

    /// One reader session: reset, open, sense until stop or fault.
    fn session(&mut self) -> SessionEnd {
        match self.reset.reset() {
            Ok(()) => {}
            Err(DeviceError::NotFound) => return SessionEnd::DeviceMissing,
            Err(DeviceError::ClaimFailed(msg)) => {
                return SessionEnd::Fault { message: msg, had_opened: false }
            }
        }

        if let Err(e) = self.transport.open() {
            return SessionEnd::Fault { message: e.to_string(), had_opened: false };
        }
        info!("tag reader session open; waiting for tags");

        loop {
            if self.should_stop() {
                return SessionEnd::Stopped;
            }
            match self.transport.sense(&self.config.poll) {
                Ok(None) => continue,
                Ok(Some(target)) => {
                    self.handle_target(&target);
                    // Stabilization delay: give the user time to lift the
                    // tag before polling resumes.
                    if !self.pause(self.config.debounce) {
                        return SessionEnd::Stopped;
                    }
                }
                Err(TransportError::Io(msg)) => {
                    return SessionEnd::Fault { message: msg, had_opened: true }
                }
                Err(e) => {
                    warn!(error = %e, "ignoring non-I/O sense failure");
                }
            }
        }
    }

    fn handle_target(&mut self, target: &TagTarget) {
        match self.transport.read(target) {
            Ok(records) => {
                let uri = records.into_iter().find_map(|r| r.uri);
                match uri {
                    Some(uri) => {
                        info!(uri = %uri, uid = ?target.uid, "tag detected");
                        self.handler.on_tag(TagEvent {
                            uid: target.uid.clone(),
                            payload_uri: Some(uri),
                            detected_at: SystemTime::now(),
                        });
                    }
                    None => debug!(uid = ?target.uid, "tag carries no usable URI"),
                }
            }
            // One unreadable tag must not kill the loop; only I/O faults
            // escalate, via the next sense call.
            Err(e) => warn!(error = %e, "failed to read tag; treating as no payload"),
        }
    }

    /// Stop-aware sleep. Returns `false` when the stop signal fired.
    fn pause(&self, duration: Duration) -> bool {
        let slice = Duration::from_millis(50);
        let mut remaining = duration;
        while remaining > Duration::ZERO {
            if self.should_stop() {
                return false;
            }
            let step = remaining.min(slice);
            thread::sleep(step);
            remaining -= step;
        }
        !self.should_stop()
    }
}

/// Observer handle for a spawned sensing loop
///
/// The foreground loop never joins the sensor thread; it raises the stop
/// flag and polls the exit status.
pub struct SensorHandle {
    stop: Arc<AtomicBool>,
    exit_rx: mpsc::Receiver<SensorExit>,
    exit: Option<SensorExit>,
}

impl SensorHandle {
    /// Raise the stop signal. The loop notices between poll bursts.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// The exit status, if the loop has ended. Does not block.
    pub fn exit_status(&mut self) -> Option<&SensorExit> {
        if self.exit.is_none() {
            if let Ok(exit) = self.exit_rx.try_recv() {
                self.exit = Some(exit);
            }
        }
        self.exit.as_ref()
    }

    /// Whether the loop has died from fault exhaustion (vs. still running
    /// or cleanly stopped).
    pub fn is_fatal(&mut self) -> bool {
        matches!(self.exit_status(), Some(SensorExit::Fatal(_)))
    }
}

/// Spawn the sensing loop on its own thread.
pub fn spawn<B, T, H>(sensor: Sensor<B, T, H>) -> SensorHandle
where
    B: UsbBus + Send + 'static,
    T: TagTransport + Send + 'static,
    H: TagHandler + 'static,
{
    let stop = sensor.stop_flag();
    let (exit_tx, exit_rx) = mpsc::channel();
    thread::spawn(move || {
        let exit = sensor.run();
        info!(exit = ?exit, "sensing loop ended");
        let _ = exit_tx.send(exit);
    });

    SensorHandle { stop, exit_rx, exit: None }
}
