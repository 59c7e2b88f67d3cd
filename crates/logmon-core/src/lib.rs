//! logmon-core: data model and durable state for logmon.
//!
//! This crate holds everything both processes share: the validated monitor
//! documents, result codes, the offset store, the deduplicator and the event
//! mailbox, plus the one atomic file-swap primitive they rely on.
//!
//! # Architecture
//!
//! ```text
//! Resolver ──► Tailer/Matcher ──► Deduplicator ──► Mailbox (writer)
//!                  │                                    │
//!                  └──► Offset Store          Mailbox (reader) ──► lines
//! ```
//!
//! Both the offset store and the mailbox reader rewrite their files only
//! through [`atomic::replace_file`].

pub mod atomic;
pub mod codes;
pub mod config;
pub mod dedup;
pub mod document;
pub mod error;
pub mod mailbox;
pub mod offsets;
pub mod types;

pub use codes::{ResultCode, ResultCodeTable};
pub use error::MonitorError;
pub use types::{
    MatchRecord, MatchType, Mode, MonitorSpec, OffsetKey, PatternMatch, ReadMode, ResolvedTarget,
    Rotation, Watch,
};
