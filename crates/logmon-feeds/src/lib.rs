//! logmon-feeds: turning monitor specs into matched lines.
//!
//! [`resolver`] expands each spec's file pattern into concrete paths once
//! per cycle; [`tailer`] reads those files from their stored offset and
//! tests every new line against the spec's patterns.

pub mod resolver;
pub mod tailer;

pub use resolver::{resolve, resolve_all};
pub use tailer::{scan, Matcher, ScanOutcome};
