//! Environment-driven configuration
//!
//! Everything tunable reads from `TAGPLAY_*` variables so the binary runs
//! with zero arguments on the appliance it is meant for.

use std::env;
use std::time::Duration;

use reader::{SensorConfig, UsbId, ACR122U};
use speaker::ConnectOptions;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {variable}: {value:?}")]
    InvalidValue { variable: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Static `host:port` used when discovery comes up empty
    pub speaker_fallback: Option<String>,
    pub discovery_attempts: u32,
    pub discovery_delay: Duration,
    /// Volume applied before every tag-triggered playback, when set
    pub tap_volume: Option<u8>,
    /// Whether to run the tag sensing loop at all
    pub reader_enabled: bool,
    /// USB id of the tag reader
    pub reader_id: UsbId,
    /// Reset+open attempts before the sensing loop gives up
    pub fault_retries: u32,
    /// Stabilization delay after each tag detection
    pub debounce: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            speaker_fallback: None,
            discovery_attempts: 3,
            discovery_delay: Duration::from_secs(2),
            tap_volume: None,
            reader_enabled: true,
            reader_id: ACR122U,
            fault_retries: 3,
            debounce: Duration::from_secs(2),
        }
    }
}

impl AppConfig {
    /// Read configuration from the environment. Unset variables keep their
    /// defaults; set-but-unparsable values are errors, not silent defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(authority) = non_empty("TAGPLAY_SPEAKER") {
            config.speaker_fallback = Some(authority);
        }
        if let Some(value) = non_empty("TAGPLAY_DISCOVERY_ATTEMPTS") {
            config.discovery_attempts = parse(&value, "TAGPLAY_DISCOVERY_ATTEMPTS")?;
        }
        if let Some(value) = non_empty("TAGPLAY_DISCOVERY_DELAY") {
            let seconds: u64 = parse(&value, "TAGPLAY_DISCOVERY_DELAY")?;
            config.discovery_delay = Duration::from_secs(seconds);
        }
        if let Some(value) = non_empty("TAGPLAY_TAP_VOLUME") {
            let volume: u8 = parse(&value, "TAGPLAY_TAP_VOLUME")?;
            if volume > 100 {
                return Err(ConfigError::InvalidValue {
                    variable: "TAGPLAY_TAP_VOLUME",
                    value,
                });
            }
            config.tap_volume = Some(volume);
        }
        if let Some(value) = non_empty("TAGPLAY_READER") {
            config.reader_enabled = match value.as_str() {
                "1" | "on" | "true" => true,
                "0" | "off" | "false" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        variable: "TAGPLAY_READER",
                        value,
                    })
                }
            };
        }
        if let Some(value) = non_empty("TAGPLAY_READER_ID") {
            config.reader_id = parse_usb_id(&value)?;
        }
        if let Some(value) = non_empty("TAGPLAY_FAULT_RETRIES") {
            config.fault_retries = parse(&value, "TAGPLAY_FAULT_RETRIES")?;
        }
        if let Some(value) = non_empty("TAGPLAY_DEBOUNCE_MS") {
            let millis: u64 = parse(&value, "TAGPLAY_DEBOUNCE_MS")?;
            config.debounce = Duration::from_millis(millis);
        }

        Ok(config)
    }

    pub fn sensor_config(&self) -> SensorConfig {
        SensorConfig {
            usb_id: self.reader_id,
            fault_retries: self.fault_retries,
            debounce: self.debounce,
            ..SensorConfig::default()
        }
    }

    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            attempts: self.discovery_attempts,
            retry_delay: self.discovery_delay,
            fallback: self.speaker_fallback.clone(),
            ..ConnectOptions::default()
        }
    }
}

fn non_empty(variable: &str) -> Option<String> {
    env::var(variable).ok().filter(|v| !v.trim().is_empty())
}

fn parse<T: std::str::FromStr>(value: &str, variable: &'static str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        variable,
        value: value.to_string(),
    })
}

/// `vendor:product` as two hex words, e.g. `072f:2200`.
fn parse_usb_id(value: &str) -> Result<UsbId, ConfigError> {
    let invalid = || ConfigError::InvalidValue {
        variable: "TAGPLAY_READER_ID",
        value: value.to_string(),
    };
    let (vendor, product) = value.trim().split_once(':').ok_or_else(invalid)?;
    Ok(UsbId {
        vendor: u16::from_str_radix(vendor, 16).map_err(|_| invalid())?,
        product: u16::from_str_radix(product, 16).map_err(|_| invalid())?,
    })
}
