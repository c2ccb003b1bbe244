//! Typed control of a Sonos playback device
//!
//! This crate provides the Shared Device Handle for tagplay: a single
//! logical connection ([`Speaker`]) exposing the playback primitives the
//! tag dispatcher and the command loop need, built from typed UPnP
//! operations over a minimal SOAP client.
//!
//! ```no_run
//! use speaker::{connect, ConnectOptions, PlaybackControl};
//!
//! let mut speaker = connect(&ConnectOptions::default())?;
//! speaker.set_volume(30)?;
//! speaker.play()?;
//! # Ok::<(), speaker::ApiError>(())
//! ```

mod control;
mod error;
mod operation;
pub mod operations;
mod service;
pub mod sharelink;
mod speaker;

pub use control::PlaybackControl;
pub use error::{ApiError, Result};
pub use operation::SpeakerOperation;
pub use operations::content_directory::QueueItem;
pub use service::{Service, ServiceInfo};
pub use sharelink::{ShareKind, ShareLink};
pub use speaker::{connect, ConnectOptions, ConnectionState, Speaker};
