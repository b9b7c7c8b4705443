/*
================================================================================
                        siftlog Crash Diagnostics Core
================================================================================

Crash diagnostics and debug logging for the siftlog access-log analyzer.
Two functional groups:

## 1. Diagnostic Channels

Lazily-opened, append-only text sinks owned by the host application: one for
free-form debug output and one for malformed input records encountered by the
parser. Channels absorb every failure silently (absent path, unusable path,
disk errors) so an optional diagnostic sink can never take the analyzer down;
writes are unbuffered so the latest entries survive an abrupt termination.

## 2. Crash Handler

A SIGSEGV handler registered once at startup. On a fatal memory fault it
tears down the host's terminal UI, dumps the parser's registered progress
counters and a bounded symbolic stack trace to stderr in a stable
`==PID==`-prefixed layout, points the user at the issue tracker, and exits
with a failure status. The progress structure is owned and mutated by the
parser; this crate holds only a non-owning pointer to it, registered through
[`set_progress`].

================================================================================
*/

mod build_info;
mod channel;
mod crash;
mod progress;

pub use build_info::BuildInfo;
pub use channel::{Channel, ChannelState};
pub use crash::{install_crash_handler, set_ui_teardown, TRACE_SIZE};
pub use progress::{set_progress, ProgressSnapshot};
