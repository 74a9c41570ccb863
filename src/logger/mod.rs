//! Tracing setup: a bootstrap filter at startup, replaced by the configured
//! one after settings load.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};
