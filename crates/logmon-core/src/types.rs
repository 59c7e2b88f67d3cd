//! Core types for logmon-core.
//!
//! This module defines the data model shared by the scan pipeline and the
//! mailbox: the validated [`MonitorSpec`] and its [`PatternMatch`] rules,
//! the flattened [`Watch`] and [`ResolvedTarget`] views over them, the
//! offset table key and the raw [`MatchRecord`].

use std::path::{Path, PathBuf};

use regex::Regex;

/// Which process flavour is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Long-running scan loop that appends events.
    Run,
    /// Single drain pass over the mailbox.
    Read,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Run => write!(f, "run"),
            Mode::Read => write!(f, "read"),
        }
    }
}

/// How much of a logfile each cycle reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadMode {
    /// Only lines appended since the stored offset.
    Incremental,
    /// The whole file, every cycle. Never touches the offset store.
    Full,
}

impl ReadMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "incremental" => Some(ReadMode::Incremental),
            "full" => Some(ReadMode::Full),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReadMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadMode::Incremental => write!(f, "incremental"),
            ReadMode::Full => write!(f, "full"),
        }
    }
}

/// Rotation policy declared for a logfile. Validated and carried; the
/// matcher itself only observes that no more lines are available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rotation {
    Yes,
    No,
    Delete,
}

impl Rotation {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "y" => Some(Rotation::Yes),
            "n" => Some(Rotation::No),
            "delete" => Some(Rotation::Delete),
            _ => None,
        }
    }
}

/// The test applied to each new line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchType {
    Regexp,
    Substring,
    StartsWith,
    EndsWith,
    Exactly,
}

impl MatchType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "regexp" => Some(MatchType::Regexp),
            "substring" => Some(MatchType::Substring),
            "starts with" => Some(MatchType::StartsWith),
            "ends with" => Some(MatchType::EndsWith),
            "exactly" => Some(MatchType::Exactly),
            _ => None,
        }
    }
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchType::Regexp => write!(f, "regexp"),
            MatchType::Substring => write!(f, "substring"),
            MatchType::StartsWith => write!(f, "starts with"),
            MatchType::EndsWith => write!(f, "ends with"),
            MatchType::Exactly => write!(f, "exactly"),
        }
    }
}

/// One search rule within a [`MonitorSpec`].
#[derive(Debug, Clone)]
pub struct PatternMatch {
    pub match_type: MatchType,
    /// Pattern text exactly as configured.
    pub text: String,
    /// Compiled form of `text`, present only for [`MatchType::Regexp`].
    pub regex: Option<Regex>,
    pub severity: Option<String>,
    pub alarm_on_match: bool,
}

impl PatternMatch {
    /// Build a rule, compiling the regex when the type needs one.
    pub fn new(match_type: MatchType, text: impl Into<String>) -> Result<Self, regex::Error> {
        let text = text.into();
        let regex = match match_type {
            MatchType::Regexp => Some(Regex::new(&text)?),
            _ => None,
        };
        Ok(Self {
            match_type,
            text,
            regex,
            severity: None,
            alarm_on_match: false,
        })
    }
}

/// One configured watch, validated. Immutable for the duration of a cycle.
#[derive(Debug, Clone)]
pub struct MonitorSpec {
    pub logical_name: String,
    pub instance: String,
    /// The `logfilename` value as written in the document.
    pub file_pattern: String,
    /// Directory component of `file_pattern`; `.` when none was given.
    pub directory: PathBuf,
    /// Basename expression, anchored so it must match the whole name.
    pub basename: Regex,
    pub event_type: String,
    pub read_mode: ReadMode,
    pub rotation: Rotation,
    pub deduplicate: bool,
    pub responsible: String,
    pub field1: String,
    pub field2: String,
    pub alarm_on_error: bool,
    /// Severity attached to the error alarm, as configured.
    pub alarm_on_error_severity: Option<String>,
    pub patterns: Vec<PatternMatch>,
}

impl MonitorSpec {
    /// Split a `logfilename` value into its directory and an anchored
    /// basename expression.
    pub fn split_file_pattern(pattern: &str) -> Result<(PathBuf, Regex), regex::Error> {
        let path = Path::new(pattern);
        let directory = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let basename = Regex::new(&format!("^(?:{name})$"))?;
        Ok((directory, basename))
    }

    /// The flattened watch instances, one per pattern, in pattern order.
    pub fn watches(&self) -> impl Iterator<Item = Watch<'_>> {
        self.patterns.iter().map(move |pattern| Watch { spec: self, pattern })
    }
}

/// A spec paired with one of its patterns.
#[derive(Debug, Clone, Copy)]
pub struct Watch<'a> {
    pub spec: &'a MonitorSpec,
    pub pattern: &'a PatternMatch,
}

/// A watch bound to one concrete file found at resolution time.
#[derive(Debug, Clone)]
pub struct ResolvedTarget<'a> {
    pub watch: Watch<'a>,
    pub path: PathBuf,
}

impl ResolvedTarget<'_> {
    pub fn key(&self) -> OffsetKey {
        OffsetKey::new(&self.watch.spec.logical_name, &self.path)
    }
}

/// Offset table key: (logical name, file path).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OffsetKey {
    pub logical_name: String,
    pub path: PathBuf,
}

impl OffsetKey {
    pub fn new(logical_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            logical_name: logical_name.into(),
            path: path.into(),
        }
    }
}

/// One raw match (or, after deduplication, one group of identical matches).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub content: String,
    pub count: u64,
}

impl MatchRecord {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            count: 1,
        }
    }
}
