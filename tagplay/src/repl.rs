//! The foreground command loop
//!
//! Reads one line at a time, blocking only this thread, and turns commands
//! into the same playback actions the tag dispatcher uses. Bad input prints
//! an error line and keeps the loop alive; only `exit` (or end of input)
//! ends it.

use std::io::{BufRead, Write};

use speaker::{PlaybackControl, ShareLink};
use thiserror::Error;
use tracing::debug;

use crate::dispatch::{ActionError, Dispatcher, PlaybackAction};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("{0} missing")]
    MissingArgument(&'static str),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unknown command: {0}")]
    Unknown(String),
}

/// One parsed line of input
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Action(PlaybackAction),
    ListQueue,
    Exit,
}

pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
    let mut tokens = line.split_whitespace();
    let Some(head) = tokens.next() else {
        return Ok(None);
    };
    let argument = tokens.next();

    let command = match head {
        "play" => Command::Action(PlaybackAction::Play),
        "pause" => Command::Action(PlaybackAction::Pause),
        "next" => Command::Action(PlaybackAction::Next),
        "stop" => Command::Action(PlaybackAction::Stop),
        "queue" => Command::ListQueue,
        "exit" => Command::Exit,
        "-v" => {
            let value = argument.ok_or(CommandError::MissingArgument("volume"))?;
            let level: u8 = value
                .parse()
                .map_err(|_| CommandError::InvalidArgument(format!("volume {value:?}")))?;
            if level > 100 {
                return Err(CommandError::InvalidArgument(format!(
                    "volume {level} out of range 0..=100"
                )));
            }
            Command::Action(PlaybackAction::SetVolume(level))
        }
        "-a" => {
            let uri = argument.ok_or(CommandError::MissingArgument("URL"))?;
            let link = ShareLink::parse(uri)
                .ok_or_else(|| CommandError::InvalidArgument(format!("not a share link: {uri}")))?;
            Command::Action(PlaybackAction::EnqueueAndPlay(link))
        }
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

/// Run the loop until `exit` or end of input. Every error is written to
/// `output` and the loop continues.
pub fn run<S, R, W>(dispatcher: &Dispatcher<S>, input: R, mut output: W) -> std::io::Result<()>
where
    S: PlaybackControl,
    R: BufRead,
    W: Write,
{
    writeln!(output, "commands: play | pause | next | stop | queue | -v <0-100> | -a <uri> | exit")?;
    for line in input.lines() {
        let line = line?;
        match parse(&line) {
            Ok(None) => continue,
            Ok(Some(Command::Exit)) => break,
            Ok(Some(Command::ListQueue)) => match dispatcher.device().lock().list_queue() {
                Ok(items) if items.is_empty() => writeln!(output, "queue is empty")?,
                Ok(items) => {
                    for (index, item) in items.iter().enumerate() {
                        writeln!(output, "{:>3}. {}", index + 1, item.title)?;
                    }
                }
                Err(e) => writeln!(output, "error: {e}")?,
            },
            Ok(Some(Command::Action(action))) => {
                debug!(action = ?action, "dispatching typed command");
                match dispatcher.dispatch(action) {
                    Ok(()) => {}
                    Err(ActionError::DeviceUnavailable(e)) => writeln!(output, "error: {e}")?,
                    Err(ActionError::Rejected(reason)) => writeln!(output, "error: {reason}")?,
                }
            }
            Err(e) => writeln!(output, "error: {e}")?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use speaker::{ApiError, QueueItem, Result as ApiResult};
    use std::sync::Arc;

    #[derive(Default)]
    struct CountingControl {
        calls: u32,
        queue: Vec<QueueItem>,
    }

    impl CountingControl {
        fn touch(&mut self) -> ApiResult<()> {
            self.calls += 1;
            Ok(())
        }
    }

    impl PlaybackControl for CountingControl {
        fn play(&mut self) -> ApiResult<()> {
            self.touch()
        }
        fn pause(&mut self) -> ApiResult<()> {
            self.touch()
        }
        fn next(&mut self) -> ApiResult<()> {
            self.touch()
        }
        fn stop(&mut self) -> ApiResult<()> {
            self.touch()
        }
        fn set_volume(&mut self, _level: u8) -> ApiResult<()> {
            self.touch()
        }
        fn get_volume(&mut self) -> ApiResult<u8> {
            self.touch()?;
            Ok(25)
        }
        fn clear_queue(&mut self) -> ApiResult<()> {
            self.touch()
        }
        fn enqueue_at(&mut self, _link: &ShareLink, position: u32) -> ApiResult<u32> {
            self.touch()?;
            Ok(position)
        }
        fn play_from_queue(&mut self, _index: u32) -> ApiResult<()> {
            self.touch()
        }
        fn list_queue(&mut self) -> ApiResult<Vec<QueueItem>> {
            self.touch()?;
            Ok(self.queue.clone())
        }
    }

    fn run_session(input: &str, device: Arc<Mutex<CountingControl>>) -> String {
        let dispatcher = Dispatcher::new(device, None);
        let mut output = Vec::new();
        run(&dispatcher, input.as_bytes(), &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn parse_recognizes_the_whole_surface() {
        assert_eq!(parse("play").unwrap(), Some(Command::Action(PlaybackAction::Play)));
        assert_eq!(parse("pause").unwrap(), Some(Command::Action(PlaybackAction::Pause)));
        assert_eq!(parse("next").unwrap(), Some(Command::Action(PlaybackAction::Next)));
        assert_eq!(parse("stop").unwrap(), Some(Command::Action(PlaybackAction::Stop)));
        assert_eq!(parse("queue").unwrap(), Some(Command::ListQueue));
        assert_eq!(parse("exit").unwrap(), Some(Command::Exit));
        assert_eq!(
            parse("-v 30").unwrap(),
            Some(Command::Action(PlaybackAction::SetVolume(30)))
        );
        assert_eq!(parse("   ").unwrap(), None);
    }

    #[test]
    fn unknown_commands_are_reported() {
        assert_eq!(parse("shuffle"), Err(CommandError::Unknown("shuffle".to_string())));
    }

    #[test]
    fn missing_url_reaches_no_device_call() {
        let device = Arc::new(Mutex::new(CountingControl::default()));
        let output = run_session("-a\nexit\n", Arc::clone(&device));

        assert!(output.contains("URL missing"));
        assert_eq!(device.lock().calls, 0);
    }

    #[test]
    fn non_numeric_volume_is_invalid_and_reaches_no_device_call() {
        let device = Arc::new(Mutex::new(CountingControl::default()));
        let output = run_session("-v abc\nexit\n", Arc::clone(&device));

        assert!(output.contains("invalid argument"));
        assert_eq!(device.lock().calls, 0);
    }

    #[test]
    fn out_of_range_volume_is_rejected_locally() {
        let device = Arc::new(Mutex::new(CountingControl::default()));
        let output = run_session("-v 150\nexit\n", Arc::clone(&device));

        assert!(output.contains("out of range"));
        assert_eq!(device.lock().calls, 0);
    }

    #[test]
    fn queue_listing_prints_titles_in_order() {
        let device = Arc::new(Mutex::new(CountingControl {
            queue: vec![
                QueueItem { title: "First Song".to_string() },
                QueueItem { title: "Second Song".to_string() },
            ],
            ..CountingControl::default()
        }));
        let output = run_session("queue\nexit\n", device);

        let first = output.find("1. First Song").unwrap();
        let second = output.find("2. Second Song").unwrap();
        assert!(first < second);
    }

    #[test]
    fn bad_lines_do_not_end_the_loop() {
        let device = Arc::new(Mutex::new(CountingControl::default()));
        let output = run_session("shuffle\nplay\nexit\n", Arc::clone(&device));

        assert!(output.contains("unknown command: shuffle"));
        assert_eq!(device.lock().calls, 1);
    }

    #[test]
    fn exit_stops_reading_input() {
        let device = Arc::new(Mutex::new(CountingControl::default()));
        run_session("exit\nplay\nplay\n", Arc::clone(&device));

        assert_eq!(device.lock().calls, 0);
    }
}
