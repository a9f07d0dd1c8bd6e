// Vulkan entry-point loading
//
// Loading the runtime library is a process-wide, one-time operation. The
// state lives here, not inside `Instance`, so it can be checked on its own.

use ash::Entry;
use once_cell::sync::OnceCell;

use super::error::GfxError;

static ENTRY: OnceCell<Entry> = OnceCell::new();

/// Load the Vulkan runtime exactly once per process.
///
/// Idempotent: every call after the first returns the cached entry without
/// touching the dynamic loader again.
pub fn ensure_loaded() -> Result<&'static Entry, GfxError> {
    ENTRY.get_or_try_init(|| {
        log::debug!("loading Vulkan runtime library");
        unsafe { Entry::load() }.map_err(|e| GfxError::Loader(e.to_string()))
    })
}

/// Whether the runtime has already been loaded by this process.
pub fn is_loaded() -> bool {
    ENTRY.get().is_some()
}
