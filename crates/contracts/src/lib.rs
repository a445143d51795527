//! # Contracts
//!
//! Frozen interface contracts shared by every metric-relay crate: the
//! immutable `Metric` record, the `MetricSink` output trait, agent
//! configuration structures and the unified error type.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Metric timestamps are wall-clock UTC (`chrono::DateTime<Utc>`)
//! - Timestamps are carried through untouched; ordering inside buffers is
//!   arrival order, not timestamp order

mod config;
mod error;
mod metric;
mod sink;

pub use config::*;
pub use error::*;
pub use metric::*;
pub use sink::*;
