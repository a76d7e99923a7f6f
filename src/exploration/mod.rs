//! Dynamic exploration of rendered pages.

pub mod pass;
pub mod safety;

pub use pass::{ExplorationPass, InteractiveSurface, SessionSurface};
pub use safety::{DEFAULT_BLACKLIST, DEFAULT_MAX_INTERACTIONS, SafetyPolicy};
