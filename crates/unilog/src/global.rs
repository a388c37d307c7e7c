//! Process-wide logger slot.
//!
//! Holds the most recently installed [`Logger`] for call sites that do not
//! carry one explicitly. Before the first configuration call it holds a
//! no-op logger.

use crate::logger::Logger;
use arc_swap::ArcSwap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock};

static GLOBAL_LOGGER: LazyLock<ArcSwap<Logger>> =
    LazyLock::new(|| ArcSwap::from_pointee(Logger::noop()));

static CONFIGURED: AtomicBool = AtomicBool::new(false);

/// The currently installed logger.
///
/// Never blocks. The returned handle stays usable after a later
/// reconfiguration and keeps writing to its own destinations.
pub fn get_active_logger() -> Arc<Logger> {
    GLOBAL_LOGGER.load_full()
}

/// Install `logger` as the process-wide logger and return the previous one
pub fn replace_global(logger: Logger) -> Arc<Logger> {
    let previous = GLOBAL_LOGGER.swap(Arc::new(logger));
    CONFIGURED.store(true, Ordering::Release);
    previous
}

/// Whether a logger has been installed since the process started
pub fn is_configured() -> bool {
    CONFIGURED.load(Ordering::Acquire)
}
