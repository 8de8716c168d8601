//! Utility modules
//!
//! Provides per-user path resolution and logging initialization.

pub mod logging;
pub mod paths;

pub use logging::init_logging;
