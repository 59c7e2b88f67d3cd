//! logmon: incremental logfile pattern monitor.
//!
//! Two independent flows share one durable mailbox:
//!
//! ```text
//! run:   document ──► resolve ──► scan ──► dedup ──► mailbox (append)
//!                                   │
//!                                   └──► offset store (commit once per cycle)
//!
//! read:  mailbox (drain once) ──► delimited lines
//! ```
//!
//! Each flow is guarded so only one process per mode is active on a host.
//! Everything runs sequentially on the calling thread.

pub mod context;
pub mod cycle;
pub mod drain;
pub mod guard;

pub use context::{Overrides, RunContext};
pub use cycle::{CycleReport, Monitor};
pub use drain::run_read;
pub use guard::{claim, InstanceGuard, PidFileGuard};
