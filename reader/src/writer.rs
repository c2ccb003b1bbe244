//! One-shot tag writing
//!
//! The counterpart of the sensing loop for getting URIs onto tags in the
//! first place: reset the reader, wait for a tag to enter the field, write
//! a single URI record, done. No retry loop; a failed write is reported
//! and the operator re-runs the command.

use tracing::info;

use crate::error::WriteError;
use crate::reset::{ResetController, UsbBus, UsbId, ACR122U};
use crate::transport::{PollSpec, TagTransport};

#[derive(Debug, Clone)]
pub struct WriterConfig {
    pub usb_id: UsbId,
    pub poll: PollSpec,
    /// Poll bursts to wait for a tag before giving up
    pub wait_bursts: u32,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            usb_id: ACR122U,
            poll: PollSpec::default(),
            wait_bursts: 30,
        }
    }
}

pub struct TagWriter<B: UsbBus, T: TagTransport> {
    reset: ResetController<B>,
    transport: T,
    config: WriterConfig,
}

impl<B: UsbBus, T: TagTransport> TagWriter<B, T> {
    pub fn new(bus: B, transport: T, config: WriterConfig) -> Self {
        let id = config.usb_id;
        Self {
            reset: ResetController::new(bus, id),
            transport,
            config,
        }
    }

    /// Wait for a tag and replace its payload with `uri`.
    pub fn write_uri(mut self, uri: &str) -> Result<(), WriteError> {
        self.reset.reset()?;
        self.transport.open()?;
        info!("waiting for a tag to write");

        for _ in 0..self.config.wait_bursts {
            if let Some(target) = self.transport.sense(&self.config.poll)? {
                self.transport.write(&target, uri)?;
                info!(uri = %uri, uid = ?target.uid, "tag written");
                return Ok(());
            }
        }
        Err(WriteError::NoTag { bursts: self.config.wait_bursts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DeviceError, TransportError};
    use crate::reset::UsbPort;
    use crate::transport::{TagRecord, TagTarget};

    struct OkPort;

    impl UsbPort for OkPort {
        fn detach_kernel_driver(&mut self) -> Result<(), String> {
            Ok(())
        }

        fn claim(&mut self) -> Result<(), String> {
            Ok(())
        }
    }

    struct OkBus {
        attached: bool,
    }

    impl UsbBus for OkBus {
        type Port = OkPort;

        fn open(&mut self, _id: UsbId) -> Option<OkPort> {
            self.attached.then_some(OkPort)
        }
    }

    use std::sync::{Arc, Mutex};

    /// Reports a tag after a fixed number of empty bursts and records what
    /// gets written. The log is shared so tests can assert after the
    /// writer consumes the transport.
    #[derive(Default)]
    struct WriteSpy {
        empty_bursts: u32,
        senses: u32,
        written: Arc<Mutex<Vec<String>>>,
        write_fails: bool,
    }

    impl TagTransport for WriteSpy {
        fn open(&mut self) -> Result<(), TransportError> {
            Ok(())
        }

        fn sense(&mut self, _poll: &PollSpec) -> Result<Option<TagTarget>, TransportError> {
            self.senses += 1;
            if self.senses > self.empty_bursts {
                Ok(Some(TagTarget { uid: Some("04a1b2c3".to_string()) }))
            } else {
                Ok(None)
            }
        }

        fn read(&mut self, _target: &TagTarget) -> Result<Vec<TagRecord>, TransportError> {
            Ok(Vec::new())
        }

        fn write(&mut self, _target: &TagTarget, uri: &str) -> Result<(), TransportError> {
            if self.write_fails {
                return Err(TransportError::Io("write refused".to_string()));
            }
            self.written.lock().unwrap().push(uri.to_string());
            Ok(())
        }
    }

    fn config(wait_bursts: u32) -> WriterConfig {
        WriterConfig { wait_bursts, ..WriterConfig::default() }
    }

    #[test]
    fn writes_the_uri_once_a_tag_appears() {
        let written = Arc::new(Mutex::new(Vec::new()));
        let transport = WriteSpy {
            empty_bursts: 2,
            written: Arc::clone(&written),
            ..WriteSpy::default()
        };
        let writer = TagWriter::new(OkBus { attached: true }, transport, config(5));

        writer.write_uri("spotify:track:ABC").unwrap();

        assert_eq!(*written.lock().unwrap(), vec!["spotify:track:ABC".to_string()]);
    }

    #[test]
    fn gives_up_after_the_configured_wait() {
        let transport = WriteSpy { empty_bursts: u32::MAX, ..WriteSpy::default() };
        let writer = TagWriter::new(OkBus { attached: true }, transport, config(3));

        assert_eq!(
            writer.write_uri("spotify:track:ABC"),
            Err(WriteError::NoTag { bursts: 3 })
        );
    }

    #[test]
    fn missing_reader_is_a_device_error() {
        let writer = TagWriter::new(OkBus { attached: false }, WriteSpy::default(), config(3));

        assert_eq!(
            writer.write_uri("spotify:track:ABC"),
            Err(WriteError::Device(DeviceError::NotFound))
        );
    }

    #[test]
    fn write_failure_surfaces_as_transport_error() {
        let transport = WriteSpy { write_fails: true, ..WriteSpy::default() };
        let writer = TagWriter::new(OkBus { attached: true }, transport, config(3));

        assert!(matches!(
            writer.write_uri("spotify:track:ABC"),
            Err(WriteError::Transport(TransportError::Io(_)))
        ));
    }
}
