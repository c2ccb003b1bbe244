//! Device reset controller
//!
//! Before each reader session (and after every transport fault) the USB
//! device is reset at the OS level: detach whatever kernel driver holds it,
//! then claim it for exclusive use. The two steps are independently
//! fallible: a failed detach usually means the device is already free and
//! is never an error, while a failed claim is a transient fault the caller
//! retries.

use tracing::{debug, info};

use crate::error::DeviceError;

/// Vendor/product identifier pair of the transport device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsbId {
    pub vendor: u16,
    pub product: u16,
}

/// ACR122U reader
pub const ACR122U: UsbId = UsbId { vendor: 0x072f, product: 0x2200 };

/// Access to one USB device. Implemented by the `acr122` feature over
/// `rusb`; tests use mock buses.
pub trait UsbBus {
    type Port: UsbPort;

    /// Open the device with the given id, `None` when it is not attached.
    fn open(&mut self, id: UsbId) -> Option<Self::Port>;
}

pub trait UsbPort {
    /// Detach a kernel driver bound to the device, if any.
    fn detach_kernel_driver(&mut self) -> Result<(), String>;

    /// Claim the device for exclusive use.
    fn claim(&mut self) -> Result<(), String>;
}

/// Resets the tag transport device. Safe to call any number of times.
#[derive(Debug)]
pub struct ResetController<B: UsbBus> {
    bus: B,
    id: UsbId,
}

impl<B: UsbBus> ResetController<B> {
    pub fn new(bus: B, id: UsbId) -> Self {
        Self { bus, id }
    }

    pub fn reset(&mut self) -> Result<(), DeviceError> {
        let mut port = self.bus.open(self.id).ok_or(DeviceError::NotFound)?;

        // The device may already be free of any kernel driver.
        match port.detach_kernel_driver() {
            Ok(()) => debug!("kernel driver detached"),
            Err(e) => debug!(error = %e, "kernel driver not detached"),
        }

        port.claim().map_err(DeviceError::ClaimFailed)?;
        info!(vendor = format_args!("{:04x}", self.id.vendor),
            product = format_args!("{:04x}", self.id.product),
            "tag transport device claimed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockPort {
        detach_fails: bool,
        claim_fails: bool,
    }

    impl UsbPort for MockPort {
        fn detach_kernel_driver(&mut self) -> Result<(), String> {
            if self.detach_fails {
                Err("no kernel driver bound".to_string())
            } else {
                Ok(())
            }
        }

        fn claim(&mut self) -> Result<(), String> {
            if self.claim_fails {
                Err("resource busy".to_string())
            } else {
                Ok(())
            }
        }
    }

    struct MockBus {
        attached: bool,
        detach_fails: bool,
        claim_fails: bool,
        opens: u32,
    }

    impl UsbBus for &mut MockBus {
        type Port = MockPort;

        fn open(&mut self, _id: UsbId) -> Option<MockPort> {
            self.opens += 1;
            self.attached.then(|| MockPort {
                detach_fails: self.detach_fails,
                claim_fails: self.claim_fails,
            })
        }
    }

    #[test]
    fn reset_is_idempotent() {
        let mut bus = MockBus { attached: true, detach_fails: false, claim_fails: false, opens: 0 };
        let mut controller = ResetController::new(&mut bus, ACR122U);
        for _ in 0..5 {
            controller.reset().unwrap();
        }
    }

    #[test]
    fn detach_failure_is_not_an_error() {
        // Already-detached devices fail the detach step. That is fine.
        let mut bus = MockBus { attached: true, detach_fails: true, claim_fails: false, opens: 0 };
        let mut controller = ResetController::new(&mut bus, ACR122U);
        assert!(controller.reset().is_ok());
    }

    #[test]
    fn claim_failure_is_transient() {
        let mut bus = MockBus { attached: true, detach_fails: false, claim_fails: true, opens: 0 };
        let mut controller = ResetController::new(&mut bus, ACR122U);
        assert!(matches!(controller.reset(), Err(DeviceError::ClaimFailed(_))));
    }

    #[test]
    fn missing_device_is_fatal() {
        let mut bus = MockBus { attached: false, detach_fails: false, claim_fails: false, opens: 0 };
        let mut controller = ResetController::new(&mut bus, ACR122U);
        assert_eq!(controller.reset(), Err(DeviceError::NotFound));
    }
}
