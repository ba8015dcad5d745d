//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! registry / configuration operations produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (bootstrap, load and save counters)
//! ```
//!
//! # Design Decisions
//! - The library only emits events; installing a subscriber or a metrics
//!   recorder is left to the embedding process
//! - Metrics are cheap no-ops when no recorder is installed

pub mod logging;
pub mod metrics;
