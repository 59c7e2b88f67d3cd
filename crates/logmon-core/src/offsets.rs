//! Offset store: per (logical name, file path) count of consumed lines.
//!
//! The table lives in a line-oriented side file, one entry per line:
//!
//! ```text
//! http-server-log  /var/log/http/access.log  1042
//! ```
//!
//! The first field is the logical name, the last is the count, and
//! everything between is the path, so paths containing spaces survive a
//! round trip. Logical names never contain whitespace (the document loader
//! rejects them).

use std::collections::{BTreeMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::atomic;
use crate::error::MonitorError;
use crate::types::OffsetKey;

/// Offsets queued during a cycle, committed once at its end.
pub type OffsetUpdates = BTreeMap<OffsetKey, u64>;

#[derive(Debug)]
pub struct OffsetStore {
    path: PathBuf,
    table: BTreeMap<OffsetKey, u64>,
}

impl OffsetStore {
    /// Open the table at `path`, creating it empty on first use.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, MonitorError> {
        let path = path.into();
        let table = match std::fs::read_to_string(&path) {
            Ok(text) => parse_table(&path, &text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                atomic::replace_file(&path, |_| Ok(())).map_err(|e| MonitorError::io(&path, e))?;
                debug!(path = %path.display(), "initialised empty offset table");
                BTreeMap::new()
            }
            Err(e) => return Err(MonitorError::io(&path, e)),
        };
        Ok(Self { path, table })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lines already consumed for the pair, 0 when never seen.
    pub fn get(&self, logical_name: &str, path: &Path) -> u64 {
        self.table
            .get(&OffsetKey::new(logical_name, path))
            .copied()
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&OffsetKey, u64)> {
        self.table.iter().map(|(key, count)| (key, *count))
    }

    /// Merge `updates` into the table and atomically replace the side file.
    ///
    /// Stored counts never decrease. With `live`, entries whose key is not in
    /// the set are dropped; without it, every existing entry is kept.
    pub fn commit(
        &mut self,
        updates: &OffsetUpdates,
        live: Option<&HashSet<OffsetKey>>,
    ) -> Result<(), MonitorError> {
        let mut table = self.table.clone();
        for (key, count) in updates {
            let slot = table.entry(key.clone()).or_insert(0);
            *slot = (*slot).max(*count);
        }
        if let Some(live) = live {
            table.retain(|key, _| live.contains(key));
        }

        atomic::replace_file(&self.path, |out| {
            for (key, count) in &table {
                writeln!(out, "{}  {}  {}", key.logical_name, key.path.display(), count)?;
            }
            Ok(())
        })
        .map_err(|e| MonitorError::io(&self.path, e))?;

        debug!(
            path = %self.path.display(),
            updated = updates.len(),
            entries = table.len(),
            "committed offsets"
        );
        self.table = table;
        Ok(())
    }
}

fn parse_table(path: &Path, text: &str) -> BTreeMap<OffsetKey, u64> {
    let mut table = BTreeMap::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_line(line) {
            Some((key, count)) => {
                table.insert(key, count);
            }
            None => warn!(
                path = %path.display(),
                line = number + 1,
                "skipping offset entry without name, path and count"
            ),
        }
    }
    table
}

fn parse_line(line: &str) -> Option<(OffsetKey, u64)> {
    let (name, rest) = line.split_once(char::is_whitespace)?;
    let (file, count) = rest.trim().rsplit_once(char::is_whitespace)?;
    let count = count.parse().ok()?;
    let file = file.trim();
    if file.is_empty() {
        return None;
    }
    Some((OffsetKey::new(name, file), count))
}
