//! Local snapshot cache.
//!
//! - [`PathResolver`] normalizes user paths and finds the cache root.
//! - [`CacheDir`] creates and probes the per-snapshot directories under it.

pub mod dir;
pub mod paths;

pub use dir::{CacheDir, PAYLOAD_FILE};
pub use paths::{PathResolver, trailing_slash};
