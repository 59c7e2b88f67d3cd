//! Sandbox directories and small log corpora used across harnesses.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use logmon::{Overrides, RunContext};
use logmon_core::config::Settings;
use serde_json::Value;
use tempfile::TempDir;

/// An application log with repeated errors, one line per entry.
pub const CORPUS_APP: &[&str] = &[
    "2024-01-15 10:00:00 INFO  Starting application version 2.4.1",
    "2024-01-15 10:00:01 ERROR Failed to connect to database after 3 retries",
    "2024-01-15 10:00:02 WARN  Disk usage at 92% on /dev/sda1",
    "2024-01-15 10:00:03 ERROR Failed to connect to database after 3 retries",
    "2024-01-15 10:00:04 INFO  Graceful shutdown complete",
];

/// Generate `n` synthetic lines, every tenth one an error.
pub fn corpus_high_volume(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| {
            let level = if i % 10 == 0 { "ERROR" } else { "INFO " };
            format!("2024-01-15 10:00:00 {level} request {i} handled by worker-{}", i % 4)
        })
        .collect()
}

/// A private directory holding logs, documents, the mailbox and the offset
/// table for one test.
pub struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create sandbox"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn mailbox(&self) -> PathBuf {
        self.path("events.jsonl")
    }

    pub fn offsets(&self) -> PathBuf {
        self.path("offsets")
    }

    /// Regex-escaped full path of `name`, usable as a `logfilename`.
    pub fn log_pattern(&self, name: &str) -> String {
        format!("{}/{}", self.root().display(), name.replace('.', "\\."))
    }

    /// Create or overwrite a file with `lines`, each newline-terminated.
    pub fn write_lines(&self, name: &str, lines: &[&str]) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, join_lines(lines)).expect("write log");
        path
    }

    pub fn append_lines(&self, name: &str, lines: &[&str]) {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path(name))
            .expect("open log");
        file.write_all(join_lines(lines).as_bytes())
            .expect("append log");
    }

    pub fn write_document(&self, name: &str, text: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, text).expect("write document");
        path
    }

    /// A run context pointing at this sandbox's mailbox and offsets.
    pub fn context(&self) -> RunContext {
        self.context_with(Settings::defaults())
    }

    pub fn context_with(&self, settings: Settings) -> RunContext {
        RunContext::from_settings(
            settings,
            Overrides {
                mailbox: Some(self.mailbox()),
                offsets: Some(self.offsets()),
                cycles: Some(1),
                interval_secs: Some(0),
                ..Overrides::default()
            },
        )
        .expect("build run context")
    }

    /// Every mailbox record, parsed without draining.
    pub fn records(&self) -> Vec<Value> {
        match fs::read_to_string(self.mailbox()) {
            Ok(text) => text
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(|line| serde_json::from_str(line).expect("mailbox line is JSON"))
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

fn join_lines(lines: &[&str]) -> String {
    lines.iter().map(|line| format!("{line}\n")).collect()
}
