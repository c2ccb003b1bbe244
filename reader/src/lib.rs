//! NFC tag sensing for tagplay
//!
//! The heart of this crate is [`Sensor`], a synchronous sensing loop meant
//! for its own thread: it resets the USB reader, polls for tags, decodes
//! NDEF URI payloads, and hands debounced [`TagEvent`]s to a handler.
//! Transport faults are absorbed by resetting the reader up to a fault
//! budget; budget exhaustion surfaces as [`SensorExit::Fatal`].
//!
//! Hardware access goes through two trait seams, [`UsbBus`] for the reset
//! path and [`TagTransport`] for sensing, so the loop runs against scripted
//! mocks in tests. Enable the `acr122` feature for the real ACR122U
//! backends over `rusb` and `nfc1`.
//!
//! [`TagWriter`] is the companion one-shot operation for provisioning:
//! wait for a tag, write a URI record onto it.

mod error;
mod event;
pub mod ndef;
mod reset;
mod sensor;
mod transport;
mod writer;

#[cfg(feature = "acr122")]
pub mod acr122;

pub use error::{DeviceError, SensorError, TransportError, WriteError};
pub use event::TagEvent;
pub use reset::{ResetController, UsbBus, UsbId, UsbPort, ACR122U};
pub use sensor::{spawn, Sensor, SensorConfig, SensorExit, SensorHandle, TagHandler};
pub use transport::{PollSpec, TagRecord, TagTarget, TagTechnology, TagTransport};
pub use writer::{TagWriter, WriterConfig};
