//! The playback-control seam
//!
//! Everything the dispatcher and the command loop may do to the device goes
//! through this trait, so tests can substitute a recording fake for a real
//! speaker and the rest of the system never touches the SOAP layer.

use crate::error::Result;
use crate::operations::content_directory::QueueItem;
use crate::sharelink::ShareLink;

pub trait PlaybackControl {
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self) -> Result<()>;
    fn next(&mut self) -> Result<()>;
    fn stop(&mut self) -> Result<()>;

    /// Set the Master volume. `level` must be 0..=100; implementations
    /// reject anything else before any device call.
    fn set_volume(&mut self, level: u8) -> Result<()>;
    fn get_volume(&mut self) -> Result<u8>;

    fn clear_queue(&mut self) -> Result<()>;

    /// Enqueue a share link at a 1-based queue position; returns the
    /// position the entry actually landed at.
    fn enqueue_at(&mut self, link: &ShareLink, position: u32) -> Result<u32>;

    /// Start playback from a 0-based queue index.
    fn play_from_queue(&mut self, index: u32) -> Result<()>;

    fn list_queue(&mut self) -> Result<Vec<QueueItem>>;
}
