//! ACR122U backends for the [`UsbBus`] and [`TagTransport`] seams
//!
//! Only compiled with the `acr122` feature. The USB side goes through
//! `rusb`; tag sensing goes through `nfc1` (libnfc). Neither is exercised
//! by unit tests, which script the trait seams instead.

use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::TransportError;
use crate::reset::{UsbBus, UsbId, UsbPort};
use crate::transport::{PollSpec, TagRecord, TagTarget, TagTransport};

/// [`UsbBus`] over the default `rusb` context
#[derive(Debug, Default)]
pub struct RusbBus;

pub struct RusbPort {
    handle: rusb::DeviceHandle<rusb::GlobalContext>,
}

impl UsbBus for RusbBus {
    type Port = RusbPort;

    fn open(&mut self, id: UsbId) -> Option<RusbPort> {
        rusb::open_device_with_vid_pid(id.vendor, id.product)
            .map(|handle| RusbPort { handle })
    }
}

impl UsbPort for RusbPort {
    fn detach_kernel_driver(&mut self) -> Result<(), String> {
        match self.handle.kernel_driver_active(0) {
            Ok(true) => self.handle.detach_kernel_driver(0).map_err(|e| e.to_string()),
            Ok(false) => Err("no kernel driver bound".to_string()),
            Err(e) => Err(e.to_string()),
        }
    }

    fn claim(&mut self) -> Result<(), String> {
        self.handle.set_active_configuration(1).map_err(|e| e.to_string())
    }
}

/// MIFARE Ultralight / NTAG READ command, returns 16 bytes
const CMD_READ: u8 = 0x30;
/// MIFARE Ultralight / NTAG WRITE command, writes one 4-byte page
const CMD_WRITE: u8 = 0xA2;
/// First page of user memory on NTAG21x tags
const FIRST_DATA_PAGE: u8 = 4;
/// Pages past the largest NTAG216 data area; reads stop here regardless
const LAST_DATA_PAGE: u8 = 0xE7;

/// [`TagTransport`] over libnfc
///
/// A libnfc device borrows its context, so no device survives across trait
/// calls. `sense` therefore reads and decodes the tag while it still holds
/// the device, and `read` hands back what that pass produced.
#[derive(Default)]
pub struct Nfc1Transport {
    context: Option<nfc1::Context<'static>>,
    pending: Vec<TagRecord>,
}

impl Nfc1Transport {
    pub fn new() -> Self {
        Self::default()
    }

    fn modulation() -> nfc1::Modulation {
        nfc1::Modulation {
            modulation_type: nfc1::ModulationType::Iso14443a,
            baud_rate: nfc1::BaudRate::Baud106,
        }
    }

    fn context(&mut self) -> Result<&mut nfc1::Context<'static>, TransportError> {
        self.context
            .as_mut()
            .ok_or_else(|| TransportError::Io("transport not open".to_string()))
    }

    /// Dump the tag's user memory through 16-byte READ responses until the
    /// tag stops answering or the data area ends.
    fn dump_memory(device: &mut nfc1::Device<'_>) -> Vec<u8> {
        let mut memory = Vec::new();
        let mut page = FIRST_DATA_PAGE;
        while page <= LAST_DATA_PAGE {
            match device.initiator_transceive_bytes(
                &[CMD_READ, page],
                16,
                nfc1::Timeout::Default,
            ) {
                Ok(chunk) => {
                    if chunk.is_empty() {
                        break;
                    }
                    memory.extend_from_slice(&chunk);
                    page = page.saturating_add(4);
                }
                Err(e) => {
                    debug!(page, error = %e, "tag stopped answering reads");
                    break;
                }
            }
        }
        memory
    }
}

impl TagTransport for Nfc1Transport {
    fn open(&mut self) -> Result<(), TransportError> {
        let context = nfc1::Context::new().map_err(|e| TransportError::Io(e.to_string()))?;
        self.context = Some(context);
        self.pending.clear();
        Ok(())
    }

    fn sense(&mut self, poll: &PollSpec) -> Result<Option<TagTarget>, TransportError> {
        let period = poll.period;
        let iterations = poll.iterations.max(1);
        let context = self.context()?;
        let mut device = context.open().map_err(|e| TransportError::Io(e.to_string()))?;
        device
            .initiator_init()
            .map_err(|e| TransportError::Io(e.to_string()))?;

        for iteration in 0..iterations {
            let found = device
                .initiator_list_passive_targets(&Self::modulation(), 1)
                .map_err(|e| TransportError::Io(e.to_string()))?;
            if !found.is_empty() {
                // Re-select the tag and pull its payload now; the device
                // does not outlive this call.
                device
                    .initiator_select_passive_target(&Self::modulation())
                    .map_err(|e| TransportError::Io(e.to_string()))?;
                let memory = Self::dump_memory(&mut device);
                self.pending = match crate::ndef::records(&memory) {
                    Ok(records) => records,
                    Err(e) => {
                        warn!(error = %e, "tag payload did not decode");
                        Vec::new()
                    }
                };
                return Ok(Some(TagTarget { uid: None }));
            }
            if iteration + 1 < iterations {
                thread::sleep(period.max(Duration::from_millis(1)));
            }
        }
        Ok(None)
    }

    fn read(&mut self, _target: &TagTarget) -> Result<Vec<TagRecord>, TransportError> {
        Ok(std::mem::take(&mut self.pending))
    }

    fn write(&mut self, _target: &TagTarget, uri: &str) -> Result<(), TransportError> {
        let tlv = crate::ndef::uri_tlv(uri)?;

        let context = self.context()?;
        let mut device = context.open().map_err(|e| TransportError::Io(e.to_string()))?;
        device
            .initiator_init()
            .map_err(|e| TransportError::Io(e.to_string()))?;
        device
            .initiator_select_passive_target(&Self::modulation())
            .map_err(|e| TransportError::Io(e.to_string()))?;

        let mut page = FIRST_DATA_PAGE;
        for chunk in tlv.chunks(4) {
            if page > LAST_DATA_PAGE {
                return Err(TransportError::Io("tag data area too small".to_string()));
            }
            let mut command = [CMD_WRITE, page, 0, 0, 0, 0];
            command[2..2 + chunk.len()].copy_from_slice(chunk);
            device
                .initiator_transceive_bytes(&command, 1, nfc1::Timeout::Default)
                .map_err(|e| TransportError::Io(format!("write of page {} failed: {}", page, e)))?;
            page += 1;
        }
        Ok(())
    }
}
