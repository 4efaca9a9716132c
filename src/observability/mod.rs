//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout log aggregation
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Structured fields (table ids, aliases, request id) on every event
//! - Per-request rejections are debug events, not errors
//! - Metrics are no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
