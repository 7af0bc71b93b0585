//! mc-core: stable foundation for modcirc.
//!
//! Contains:
//! - numeric (Real + tolerances + float helpers)
//! - ids (compact IDs for quantities and elements)
//! - time (cycle-based time grid)
//! - timing (wall-clock instrumentation reported through tracing)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod time;
pub mod timing;

// Re-exports: nice ergonomics for downstream crates
pub use error::{McError, McResult};
pub use ids::*;
pub use numeric::*;
pub use time::TimeGrid;
