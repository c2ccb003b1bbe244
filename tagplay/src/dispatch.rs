//! The action dispatcher
//!
//! Maps tag payloads and keyboard commands to playback actions and runs
//! them against the shared device handle. Both input sources funnel into
//! [`Dispatcher::dispatch`], which holds the device lock for the whole
//! action so a tag tap and a keystroke can never interleave their SOAP
//! calls.

use std::sync::Arc;

use parking_lot::Mutex;
use speaker::{PlaybackControl, ShareLink};
use thiserror::Error;
use tracing::{info, warn};

/// Something the system can do to the playback device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackAction {
    /// Replace the queue with the linked content and play it from the top
    EnqueueAndPlay(ShareLink),
    Play,
    Pause,
    Next,
    Stop,
    SetVolume(u8),
}

#[derive(Debug, Error)]
pub enum ActionError {
    /// The device call failed; the underlying cause is attached
    #[error("device unavailable: {0}")]
    DeviceUnavailable(#[from] speaker::ApiError),

    /// The input did not map to an action at all
    #[error("rejected: {0}")]
    Rejected(String),
}

pub struct Dispatcher<S: PlaybackControl> {
    device: Arc<Mutex<S>>,
    /// Volume applied before every tag-triggered playback, when configured
    tap_volume: Option<u8>,
}

impl<S: PlaybackControl> Dispatcher<S> {
    pub fn new(device: Arc<Mutex<S>>, tap_volume: Option<u8>) -> Self {
        Self { device, tap_volume }
    }

    pub fn device(&self) -> Arc<Mutex<S>> {
        Arc::clone(&self.device)
    }

    /// Turn a tag payload URI into an action. Unrecognized payloads are
    /// rejected before the device is touched.
    pub fn action_for_tag(&self, payload_uri: &str) -> Result<PlaybackAction, ActionError> {
        ShareLink::parse(payload_uri)
            .map(PlaybackAction::EnqueueAndPlay)
            .ok_or_else(|| {
                ActionError::Rejected(format!(
                    "tag payload is not a known share link: {payload_uri}"
                ))
            })
    }

    /// Run one action against the device. The lock spans the whole action.
    pub fn dispatch(&self, action: PlaybackAction) -> Result<(), ActionError> {
        let mut device = self.device.lock();
        match action {
            PlaybackAction::EnqueueAndPlay(link) => {
                info!(kind = ?link.kind(), "replacing queue from tag");
                if let Some(volume) = self.tap_volume {
                    device.set_volume(volume)?;
                }
                device.stop()?;
                device.clear_queue()?;
                let position = device.enqueue_at(&link, 1)?;
                device.play_from_queue(position.saturating_sub(1))?;
            }
            PlaybackAction::Play => device.play()?,
            PlaybackAction::Pause => device.pause()?,
            PlaybackAction::Next => device.next()?,
            PlaybackAction::Stop => device.stop()?,
            PlaybackAction::SetVolume(level) => device.set_volume(level)?,
        }
        Ok(())
    }

    /// Handle one sensed tag: parse, dispatch, log. Device failures are
    /// logged and swallowed so the sensing loop keeps running.
    pub fn handle_tag(&self, payload_uri: &str) {
        match self.action_for_tag(payload_uri) {
            Ok(action) => {
                if let Err(e) = self.dispatch(action) {
                    warn!(error = %e, "tag action failed");
                }
            }
            Err(e) => warn!(error = %e, "ignoring tag"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speaker::{ApiError, QueueItem, Result as ApiResult};

    /// Records every call; scripted calls can fail.
    #[derive(Default)]
    struct RecordingControl {
        calls: Vec<String>,
        fail_on: Option<&'static str>,
    }

    impl RecordingControl {
        fn record(&mut self, call: impl Into<String>) -> ApiResult<()> {
            let call = call.into();
            let failing = self.fail_on.is_some_and(|f| call.starts_with(f));
            self.calls.push(call);
            if failing {
                Err(ApiError::Network("connection reset".to_string()))
            } else {
                Ok(())
            }
        }
    }

    impl PlaybackControl for RecordingControl {
        fn play(&mut self) -> ApiResult<()> {
            self.record("play")
        }
        fn pause(&mut self) -> ApiResult<()> {
            self.record("pause")
        }
        fn next(&mut self) -> ApiResult<()> {
            self.record("next")
        }
        fn stop(&mut self) -> ApiResult<()> {
            self.record("stop")
        }
        fn set_volume(&mut self, level: u8) -> ApiResult<()> {
            self.record(format!("set_volume({level})"))
        }
        fn get_volume(&mut self) -> ApiResult<u8> {
            self.record("get_volume")?;
            Ok(25)
        }
        fn clear_queue(&mut self) -> ApiResult<()> {
            self.record("clear_queue")
        }
        fn enqueue_at(&mut self, link: &ShareLink, position: u32) -> ApiResult<u32> {
            self.record(format!("enqueue_at({}, {position})", link.enqueue_uri()))?;
            Ok(position)
        }
        fn play_from_queue(&mut self, index: u32) -> ApiResult<()> {
            self.record(format!("play_from_queue({index})"))
        }
        fn list_queue(&mut self) -> ApiResult<Vec<QueueItem>> {
            self.record("list_queue")?;
            Ok(Vec::new())
        }
    }

    fn dispatcher(tap_volume: Option<u8>) -> (Dispatcher<RecordingControl>, Arc<Mutex<RecordingControl>>) {
        let device = Arc::new(Mutex::new(RecordingControl::default()));
        (Dispatcher::new(Arc::clone(&device), tap_volume), device)
    }

    fn track_link() -> ShareLink {
        ShareLink::parse("spotify:track:6b2oQwSGFkzsMtQruIWm2p").unwrap()
    }

    #[test]
    fn enqueue_and_play_replaces_the_queue_in_order() {
        let (dispatcher, device) = dispatcher(None);

        dispatcher
            .dispatch(PlaybackAction::EnqueueAndPlay(track_link()))
            .unwrap();

        let calls = &device.lock().calls;
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0], "stop");
        assert_eq!(calls[1], "clear_queue");
        assert!(calls[2].starts_with("enqueue_at("));
        assert!(calls[2].ends_with(", 1)"));
        assert_eq!(calls[3], "play_from_queue(0)");
    }

    #[test]
    fn tap_volume_is_applied_before_anything_else() {
        let (dispatcher, device) = dispatcher(Some(40));

        dispatcher
            .dispatch(PlaybackAction::EnqueueAndPlay(track_link()))
            .unwrap();

        assert_eq!(device.lock().calls[0], "set_volume(40)");
    }

    #[test]
    fn repeated_taps_are_idempotent_replacements() {
        // Tapping the same tag twice rebuilds the queue both times; the
        // second tap must not append to the first.
        let (dispatcher, device) = dispatcher(None);

        dispatcher
            .dispatch(PlaybackAction::EnqueueAndPlay(track_link()))
            .unwrap();
        dispatcher
            .dispatch(PlaybackAction::EnqueueAndPlay(track_link()))
            .unwrap();

        let calls = &device.lock().calls;
        assert_eq!(calls.iter().filter(|c| *c == "clear_queue").count(), 2);
        assert_eq!(
            calls.iter().filter(|c| c.starts_with("enqueue_at(")).count(),
            2
        );
    }

    #[test]
    fn device_failure_stops_the_sequence() {
        let device = Arc::new(Mutex::new(RecordingControl {
            fail_on: Some("clear_queue"),
            ..RecordingControl::default()
        }));
        let dispatcher = Dispatcher::new(Arc::clone(&device), None);

        let result = dispatcher.dispatch(PlaybackAction::EnqueueAndPlay(track_link()));

        assert!(matches!(result, Err(ActionError::DeviceUnavailable(_))));
        // Nothing past the failing call ran.
        assert_eq!(device.lock().calls.last().map(String::as_str), Some("clear_queue"));
    }

    #[test]
    fn unknown_tag_payloads_are_rejected_without_device_calls() {
        let (dispatcher, device) = dispatcher(None);

        let result = dispatcher.action_for_tag("https://example.com/not-music");

        assert!(matches!(result, Err(ActionError::Rejected(_))));
        assert!(device.lock().calls.is_empty());
    }

    #[test]
    fn simple_actions_forward_to_the_device() {
        let (dispatcher, device) = dispatcher(None);

        dispatcher.dispatch(PlaybackAction::Pause).unwrap();
        dispatcher.dispatch(PlaybackAction::Next).unwrap();
        dispatcher.dispatch(PlaybackAction::SetVolume(15)).unwrap();

        assert_eq!(device.lock().calls, vec!["pause", "next", "set_volume(15)"]);
    }
}
