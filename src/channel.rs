use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[allow(unused_imports)]
use log::{debug, warn};

/// Lifecycle of a diagnostic output channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// No stream yet: either `open` was never called, the path was absent,
    /// or the open failed.
    Unopened,
    Open,
    Closed,
}

/// A lazily-opened, append-only text sink.
///
/// The host application owns two of these: one for free-form debug output
/// and one for malformed input records. Every failure mode (absent path,
/// unusable path, disk error) is absorbed: the caller never sees an error,
/// and writes against a channel that is not open are silently dropped.
/// The most recent absorbed error is retained so tests (and curious hosts)
/// can still inspect what happened via [`Channel::last_error`].
///
/// Writes go straight to the file descriptor with no user-space buffering,
/// so the latest entries survive an abrupt termination, including the one
/// performed by the crash handler. There is no locking; concurrent writers
/// need external serialization.
#[derive(Debug, Default)]
pub struct Channel {
    stream: Option<File>,
    closed: bool,
    last_error: Option<std::io::Error>,
}

impl Channel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens (create/truncate) the sink at `path`. An absent path or a
    /// failed open leaves the channel Unopened; neither is surfaced to the
    /// caller. Opening over an already-open channel replaces the stream and
    /// releases the previous one.
    pub fn open(&mut self, path: Option<&Path>) {
        let Some(path) = path else {
            return;
        };
        match File::create(path) {
            Ok(file) => {
                debug!("diagnostic channel opened at {}", path.display());
                self.stream = Some(file);
                self.closed = false;
            }
            Err(e) => {
                debug!("failed to open diagnostic channel at {}: {e}", path.display());
                self.last_error = Some(e);
            }
        }
    }

    /// Appends a formatted message. No-op unless the channel is Open.
    /// Message content is caller-defined; no newline is added.
    pub fn write(&mut self, args: fmt::Arguments<'_>) {
        let Some(file) = self.stream.as_mut() else {
            return;
        };
        if let Err(e) = file.write_fmt(args) {
            debug!("diagnostic channel write dropped: {e}");
            self.last_error = Some(e);
        }
    }

    pub fn write_str(&mut self, msg: &str) {
        self.write(format_args!("{msg}"));
    }

    /// Releases the stream. Idempotent; safe on an Unopened channel.
    pub fn close(&mut self) {
        if self.stream.take().is_some() {
            self.closed = true;
        }
    }

    pub fn state(&self) -> ChannelState {
        match (&self.stream, self.closed) {
            (Some(_), _) => ChannelState::Open,
            (None, true) => ChannelState::Closed,
            (None, false) => ChannelState::Unopened,
        }
    }

    /// The most recent absorbed I/O error, if any. Diagnostic only; the
    /// write/open contract stays "no-op on failure".
    pub fn last_error(&self) -> Option<&std::io::Error> {
        self.last_error.as_ref()
    }
}

/// Formatted append in the style of `fprintf`: renders the format string
/// and arguments and hands them to [`Channel::write`].
#[macro_export]
macro_rules! channel_write {
    ($chan:expr, $($arg:tt)*) => {
        $chan.write(::std::format_args!($($arg)*))
    };
}
