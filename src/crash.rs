use std::io::Write;
use std::sync::atomic::{AtomicPtr, Ordering};

use crate::build_info::BuildInfo;
use crate::progress::{self, ProgressSnapshot};

/// Maximum number of frames reported in the crash stack trace.
pub const TRACE_SIZE: usize = 16;

const ISSUE_TRACKER_URL: &str = "https://github.com/siftlog/siftlog/issues";

// Hook for tearing down the host's curses UI before the report is written,
// so the diagnostic text lands on a usable stderr.
static UI_TEARDOWN: AtomicPtr<()> = AtomicPtr::new(std::ptr::null_mut());

/// Registers the terminal-UI teardown hook invoked first thing by the crash
/// handler. The hook runs at an arbitrary interruption point, so it must be
/// safe to call from a signal handler.
pub fn set_ui_teardown(hook: fn()) {
    UI_TEARDOWN.store(hook as *mut (), Ordering::Release);
}

fn run_ui_teardown() {
    let ptr = UI_TEARDOWN.load(Ordering::Acquire);
    if !ptr.is_null() {
        let hook: fn() = unsafe { std::mem::transmute(ptr) };
        hook();
    }
}

/// Installs the SIGSEGV handler. Registered exactly once per process; later
/// calls are no-ops. Call early in startup, before any code path that could
/// fault.
#[cfg(unix)]
pub fn install_crash_handler() {
    use std::sync::Once;

    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| unsafe {
        libc::signal(libc::SIGSEGV, handle_fatal_signal as libc::sighandler_t);
    });
}

/// Signal handling is not implemented for non-Unix platforms.
#[cfg(not(unix))]
pub fn install_crash_handler() {}

#[cfg(unix)]
extern "C" fn handle_fatal_signal(sig: libc::c_int) {
    run_ui_teardown();

    let pid = unsafe { libc::getpid() };
    let stderr = std::io::stderr();
    let mut fp = stderr.lock();
    write_crash_report(&mut fp, pid, sig, progress::registered());
    let _ = fp.flush();

    std::process::exit(1);
}

/// Writes the full crash report: banner, the registered progress values if
/// any, a bounded symbolic stack trace, and the issue-tracker notice.
///
/// The `==PID==` line prefixes and field labels are parsed by external
/// crash-report tooling; keep the layout stable.
fn write_crash_report<W: Write>(fp: &mut W, pid: i32, sig: i32, snapshot: Option<&ProgressSnapshot>) {
    let _ = writeln!(fp, "\n=={pid}== siftlog {} crashed by Signal {sig}", BuildInfo::version());
    let _ = writeln!(fp, "=={pid}==");

    if let Some(snapshot) = snapshot {
        write_progress_dump(fp, pid, snapshot);
    }

    write_stack_trace(fp, pid);

    let _ = writeln!(fp, "=={pid}==");
    let _ = writeln!(fp, "=={pid}== Please report it by opening an issue on GitHub:");
    let _ = writeln!(fp, "=={pid}== {ISSUE_TRACKER_URL}\n");
}

/// Writes the five progress counters held at trigger time, one labeled line
/// each.
fn write_progress_dump<W: Write>(fp: &mut W, pid: i32, snapshot: &ProgressSnapshot) {
    let _ = writeln!(fp, "=={pid}== VALUES AT CRASH POINT");
    let _ = writeln!(fp, "=={pid}==");
    let _ = writeln!(fp, "=={pid}== Line number: {}", snapshot.processed);
    let _ = writeln!(fp, "=={pid}== Offset: {}", snapshot.offset);
    let _ = writeln!(fp, "=={pid}== Invalid data: {}", snapshot.invalid);
    let _ = writeln!(fp, "=={pid}== Piping: {}", u8::from(snapshot.piping));
    let _ = writeln!(fp, "=={pid}== Response size: {} bytes", snapshot.resp_size);
    let _ = writeln!(fp, "=={pid}==");
}

/// Walks at most [`TRACE_SIZE`] frames of the current call stack and writes
/// one line per frame, zero-indexed, symbolized where debug info resolves.
///
/// Uses the unsynchronized walk: the caller may be a signal handler that
/// interrupted arbitrary code, so taking the symbol-cache lock could
/// deadlock.
fn write_stack_trace<W: Write>(fp: &mut W, pid: i32) {
    let _ = writeln!(fp, "=={pid}== STACK TRACE:");
    let _ = writeln!(fp, "=={pid}==");

    let mut index = 0usize;
    unsafe {
        backtrace::trace_unsynchronized(|frame| {
            if index >= TRACE_SIZE {
                return false;
            }
            let ip = frame.ip();
            let mut resolved = false;
            backtrace::resolve_frame_unsynchronized(frame, |symbol| {
                if resolved {
                    return;
                }
                if let Some(name) = symbol.name() {
                    let _ = writeln!(fp, "=={pid}== {index} {name} [{ip:p}]");
                    resolved = true;
                }
            });
            if !resolved {
                let _ = writeln!(fp, "=={pid}== {index} <unresolved> [{ip:p}]");
            }
            index += 1;
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(pid: i32, sig: i32, snapshot: Option<&ProgressSnapshot>) -> String {
        let mut buf = Vec::new();
        write_crash_report(&mut buf, pid, sig, snapshot);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_report_contains_progress_values_at_trigger_time() {
        let snapshot = ProgressSnapshot {
            processed: 1500,
            offset: 1499,
            invalid: 7,
            piping: true,
            resp_size: 884_211,
        };
        let out = report(4242, 11, Some(&snapshot));

        assert!(out.contains("==4242== siftlog"));
        assert!(out.contains("crashed by Signal 11"));
        assert!(out.contains("==4242== VALUES AT CRASH POINT"));
        assert!(out.contains("==4242== Line number: 1500"));
        assert!(out.contains("==4242== Offset: 1499"));
        assert!(out.contains("==4242== Invalid data: 7"));
        assert!(out.contains("==4242== Piping: 1"));
        assert!(out.contains("==4242== Response size: 884211 bytes"));
        assert!(out.contains("==4242== Please report it by opening an issue on GitHub:"));
        assert!(out.contains(ISSUE_TRACKER_URL));
    }

    #[test]
    fn test_report_without_snapshot_omits_values_section() {
        let out = report(4242, 11, None);

        assert!(out.contains("crashed by Signal 11"));
        assert!(!out.contains("VALUES AT CRASH POINT"));
        assert!(!out.contains("Line number:"));
        assert!(out.contains("==4242== STACK TRACE:"));
        assert!(out.contains(ISSUE_TRACKER_URL));
    }

    #[test]
    fn test_stack_trace_is_bounded_and_zero_indexed() {
        let mut buf = Vec::new();
        write_stack_trace(&mut buf, 99);
        let out = String::from_utf8(buf).unwrap();

        // Frame lines carry the pid prefix plus a numeric index.
        let indices: Vec<usize> = out
            .lines()
            .filter_map(|line| line.strip_prefix("==99== "))
            .filter_map(|rest| rest.split_whitespace().next())
            .filter_map(|tok| tok.parse().ok())
            .collect();

        assert!(!indices.is_empty());
        assert!(indices.len() <= TRACE_SIZE);
        for (expected, actual) in indices.iter().enumerate() {
            assert_eq!(expected, *actual);
        }
    }

    #[test]
    #[cfg(unix)]
    fn test_install_is_idempotent() {
        install_crash_handler();
        install_crash_handler();
    }
}
