//! Line tailer and pattern matcher.
//!
//! A file is read once per (logical name, path) group: every watch that
//! shares the pair sees exactly the same new lines, and the group produces a
//! single new offset.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use logmon_core::{MatchRecord, MatchType, PatternMatch, ReadMode, Watch};
use tracing::trace;

/// Tests lines against one configured pattern.
#[derive(Debug, Clone, Copy)]
pub struct Matcher<'a> {
    pattern: &'a PatternMatch,
}

impl<'a> Matcher<'a> {
    pub fn new(pattern: &'a PatternMatch) -> Self {
        Self { pattern }
    }

    /// The matched content when `line` satisfies the pattern: the matched
    /// substring for `regexp`, the pattern text for every other type.
    pub fn test<'s>(&'s self, line: &'s str) -> Option<&'s str> {
        let text = self.pattern.text.as_str();
        match self.pattern.match_type {
            MatchType::Regexp => self
                .pattern
                .regex
                .as_ref()
                .and_then(|re| re.find(line))
                .map(|m| m.as_str()),
            MatchType::Substring => line.contains(text).then_some(text),
            MatchType::StartsWith => line.starts_with(text).then_some(text),
            MatchType::EndsWith => line.ends_with(text).then_some(text),
            MatchType::Exactly => (line == text).then_some(text),
        }
    }
}

/// Result of scanning one file for a group of watches.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScanOutcome {
    /// Complete lines consumed, counted from the start of the file. In
    /// incremental mode this is the offset to store.
    pub lines: u64,
    /// Raw matches per watch, in the order the watches were given.
    pub matches: Vec<Vec<MatchRecord>>,
}

impl ScanOutcome {
    pub fn total_matches(&self) -> usize {
        self.matches.iter().map(Vec::len).sum()
    }
}

/// Read `path` past `offset` lines (incremental) or from the start (full)
/// and test every remaining line against each watch.
///
/// A file with fewer than `offset` lines is treated as fully consumed. In
/// incremental mode a final line without a terminator is left for the next
/// scan; full mode evaluates it.
pub fn scan(
    path: &Path,
    mode: ReadMode,
    offset: u64,
    watches: &[Watch<'_>],
) -> io::Result<ScanOutcome> {
    let mut reader = BufReader::new(File::open(path)?);
    let matchers: Vec<Matcher<'_>> = watches.iter().map(|w| Matcher::new(w.pattern)).collect();
    let mut outcome = ScanOutcome {
        lines: 0,
        matches: vec![Vec::new(); watches.len()],
    };

    let skip = match mode {
        ReadMode::Incremental => offset,
        ReadMode::Full => 0,
    };

    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let terminated = buf.last() == Some(&b'\n');
        if !terminated && mode == ReadMode::Incremental {
            break;
        }
        if terminated {
            outcome.lines += 1;
        }
        if outcome.lines <= skip && terminated {
            continue;
        }

        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches('\n').trim_end_matches('\r');
        for (matcher, found) in matchers.iter().zip(outcome.matches.iter_mut()) {
            if let Some(content) = matcher.test(line) {
                found.push(MatchRecord::new(content));
            }
        }
    }

    trace!(
        path = %path.display(),
        %mode,
        offset,
        lines = outcome.lines,
        matches = outcome.total_matches(),
        "scanned file"
    );
    Ok(outcome)
}
