//! Shared test utilities for `Island` unit tests.
//!
//! Only compiled during testing (`#[cfg(test)]`).

use crate::utils::paths::HOME_OVERRIDE_VAR;
use std::ffi::OsString;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tempfile::TempDir;

/// Serializes tests that modify `ISLAND_HOME`.
static ISLAND_HOME_LOCK: Mutex<()> = Mutex::new(());

/// Temporary directory removed when dropped
pub fn create_test_dir() -> TempDir {
    tempfile::tempdir().unwrap()
}

/// RAII guard that points `ISLAND_HOME` at a temporary directory for a test
/// scope and restores the previous value when dropped.
///
/// # Safety Considerations
///
/// `std::env::set_var` and `std::env::remove_var` are unsafe because another
/// thread may read the environment concurrently. Every test that touches
/// `ISLAND_HOME` goes through this guard, which holds `ISLAND_HOME_LOCK` for
/// its whole lifetime, so writers never overlap. Code under test only reads
/// the variable while the guard is held.
pub struct IslandHomeGuard {
    original: Option<OsString>,
    _lock: MutexGuard<'static, ()>,
}

#[expect(
    unsafe_code,
    reason = "Test-only environment mutation serialized by ISLAND_HOME_LOCK"
)]
impl IslandHomeGuard {
    /// Set `ISLAND_HOME` to `temp_dir` until the guard is dropped
    pub fn new(temp_dir: &TempDir) -> Self {
        // A panicking test must not wedge every later one
        let lock = ISLAND_HOME_LOCK
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let original = std::env::var_os(HOME_OVERRIDE_VAR);
        // SAFETY: writers are serialized by ISLAND_HOME_LOCK (see type docs).
        unsafe {
            std::env::set_var(HOME_OVERRIDE_VAR, temp_dir.path());
        }
        Self {
            original,
            _lock: lock,
        }
    }
}

#[expect(
    unsafe_code,
    reason = "Test-only environment mutation serialized by ISLAND_HOME_LOCK"
)]
impl Drop for IslandHomeGuard {
    fn drop(&mut self) {
        // SAFETY: the lock is still held; it is released after this body runs.
        match self.original.take() {
            Some(original) => unsafe { std::env::set_var(HOME_OVERRIDE_VAR, original) },
            None => unsafe { std::env::remove_var(HOME_OVERRIDE_VAR) },
        }
    }
}
