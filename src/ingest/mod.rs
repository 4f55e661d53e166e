//! New-recording ingestion.
//!
//! This module bridges filesystem notifications to the processing
//! pipeline:
//!
//! 1. **Filter**: extension predicate, applied on the event loop
//! 2. **Settle**: wait until a file has finished being written
//! 3. **Guard**: at most one pipeline run per path
//! 4. **Watcher**: event subscription and per-file dispatch
//!
//! # Architecture
//!
//! ```text
//! fs event → filter → [per-file task: settle → guard → pipeline]
//!                                  ↓
//!                           WatchEvent channel
//! ```

pub mod filter;
pub mod guard;
pub mod settle;
pub mod watcher;

// Re-export key types
pub use filter::FormatFilter;
pub use guard::{FlightGuard, FlightPermit};
pub use settle::{await_settled, SettleConfig, SettleOutcome};
pub use watcher::{WatchController, WatchError, WatchEvent, WatchHandle, WatcherConfig};
