use std::sync::atomic::{AtomicPtr, Ordering};

/// Read-only view of the parser's in-progress counters.
///
/// Owned and mutated by the parsing engine; this crate only ever reads it,
/// and only from the crash handler.
#[derive(Debug, Default)]
pub struct ProgressSnapshot {
    /// Records processed so far.
    pub processed: u64,
    /// Byte offset into the current input.
    pub offset: u64,
    /// Malformed records encountered.
    pub invalid: u64,
    /// Whether input arrives over a pipe rather than a seekable file.
    pub piping: bool,
    /// Cumulative response size in bytes.
    pub resp_size: u64,
}

static PROGRESS: AtomicPtr<ProgressSnapshot> = AtomicPtr::new(std::ptr::null_mut());

/// Registers the parser's progress structure for crash reporting,
/// overwriting any previous registration. Non-owning: the registry never
/// copies or releases the referent.
///
/// # Safety
///
/// The referent must stay alive (and at the same address) for as long as a
/// crash report could be produced — in practice, until process exit. No
/// lifetime check is performed. The crash handler reads the fields without
/// synchronization while the owner may be mid-update, so a torn snapshot in
/// the report is possible; that risk is accepted rather than guarded.
pub unsafe fn set_progress(snapshot: *const ProgressSnapshot) {
    PROGRESS.store(snapshot as *mut ProgressSnapshot, Ordering::Release);
}

/// The currently registered snapshot, or `None` if never set.
pub(crate) fn registered() -> Option<&'static ProgressSnapshot> {
    let ptr = PROGRESS.load(Ordering::Acquire);
    if ptr.is_null() {
        None
    } else {
        // Lifetime is the caller's contract from `set_progress`.
        Some(unsafe { &*ptr })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_roundtrip() {
        let snapshot = Box::leak(Box::new(ProgressSnapshot {
            processed: 1500,
            offset: 1499,
            invalid: 7,
            piping: false,
            resp_size: 884_211,
        }));
        unsafe { set_progress(snapshot) };

        let seen = registered().expect("snapshot was registered");
        assert_eq!(seen.processed, 1500);
        assert_eq!(seen.offset, 1499);
        assert_eq!(seen.invalid, 7);
        assert!(!seen.piping);
        assert_eq!(seen.resp_size, 884_211);
    }
}
