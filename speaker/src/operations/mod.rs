//! Typed UPnP operations, organized by service

pub mod av_transport;
pub mod content_directory;
pub mod rendering_control;

pub use av_transport::{
    AddUriToQueueOperation, NextOperation, PauseOperation, PlayOperation,
    RemoveAllTracksOperation, SeekOperation, StopOperation,
};
pub use content_directory::BrowseQueueOperation;
pub use rendering_control::{GetVolumeOperation, SetVolumeOperation};
