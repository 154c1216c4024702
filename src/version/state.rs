use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Flags {
    upgrading: bool,
    must_restart: bool,
}

/// Upgrade coordination flags shared by everything that may trigger an upgrade.
///
/// Create one per process and hand out clones of an `Arc<UpgradeState>`. Reads
/// and writes are atomic with respect to each other, but the flags are
/// advisory: [`VersionControl`](super::VersionControl) never sets or checks
/// them. A caller that does
///
/// ```text
/// if !state.is_upgrading() { state.set_upgrading(true); ... }
/// ```
///
/// can race another caller doing the same. Use [`try_begin`](Self::try_begin)
/// when only one upgrade may be in flight.
#[derive(Debug, Default)]
pub struct UpgradeState {
    flags: Mutex<Flags>,
}

impl UpgradeState {
    /// Fresh state: not upgrading, no restart pending.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave two plain bools inconsistent
    fn lock(&self) -> MutexGuard<'_, Flags> {
        self.flags.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether an upgrade is marked as in progress.
    #[must_use]
    pub fn is_upgrading(&self) -> bool {
        self.lock().upgrading
    }

    /// Mark an upgrade as in progress or finished.
    pub fn set_upgrading(&self, value: bool) {
        self.lock().upgrading = value;
    }

    /// Set `upgrading` if it was clear, in one step. Returns whether this call set it.
    pub fn try_begin(&self) -> bool {
        let mut flags = self.lock();
        if flags.upgrading {
            false
        } else {
            flags.upgrading = true;
            true
        }
    }

    /// Whether the process should restart to load new code.
    #[must_use]
    pub fn must_restart(&self) -> bool {
        self.lock().must_restart
    }

    /// Mark or clear a pending restart.
    pub fn set_must_restart(&self, value: bool) {
        self.lock().must_restart = value;
    }
}
