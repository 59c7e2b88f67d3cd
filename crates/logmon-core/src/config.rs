//! Settings for logmon.
//!
//! [`Settings::load`] layers, in order: the embedded defaults, an optional
//! settings file (an explicit path, or `~/.config/logmon/settings.toml`),
//! and `LOGMON__SECTION__KEY` environment variables. [`Settings::defaults`]
//! returns the embedded defaults without touching the filesystem or the
//! environment (useful in tests).

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::MonitorError;

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_SETTINGS: &str = r#"
[run]
interval_secs = 60
offset_file   = "logmon.offsets"
prune_offsets = false
cycles        = 0

[mailbox]
path      = "logmon-events.jsonl"
keep_read = true

[codes]
file = ""

[guard]
dir = ""
"#;

// ---------------------------------------------------------------------------
// Public settings types
// ---------------------------------------------------------------------------

/// Top-level settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub run: RunSettings,
    #[serde(default)]
    pub mailbox: MailboxSettings,
    #[serde(default)]
    pub codes: CodesSettings,
    #[serde(default)]
    pub guard: GuardSettings,
}

/// `[run]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RunSettings {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_offset_file")]
    pub offset_file: PathBuf,
    /// Drop offset entries whose (logical name, file) pair was not scanned
    /// incrementally in the current cycle.
    #[serde(default)]
    pub prune_offsets: bool,
    /// Stop after this many cycles; 0 runs until terminated.
    #[serde(default)]
    pub cycles: u64,
}

fn default_interval_secs() -> u64 { 60 }
fn default_offset_file() -> PathBuf { PathBuf::from("logmon.offsets") }

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            offset_file: default_offset_file(),
            prune_offsets: false,
            cycles: 0,
        }
    }
}

/// `[mailbox]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct MailboxSettings {
    #[serde(default = "default_mailbox_path")]
    pub path: PathBuf,
    /// Keep already-read records when the reader rewrites the store.
    #[serde(default = "default_keep_read")]
    pub keep_read: bool,
}

fn default_mailbox_path() -> PathBuf { PathBuf::from("logmon-events.jsonl") }
fn default_keep_read() -> bool { true }

impl Default for MailboxSettings {
    fn default() -> Self {
        Self {
            path: default_mailbox_path(),
            keep_read: default_keep_read(),
        }
    }
}

/// `[codes]` section. An empty `file` selects the built-in table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CodesSettings {
    #[serde(default)]
    pub file: String,
}

impl CodesSettings {
    pub fn file(&self) -> Option<&Path> {
        (!self.file.trim().is_empty()).then(|| Path::new(&self.file))
    }
}

/// `[guard]` section. An empty `dir` selects the system temp directory.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GuardSettings {
    #[serde(default)]
    pub dir: String,
}

impl GuardSettings {
    pub fn dir(&self) -> PathBuf {
        if self.dir.trim().is_empty() {
            std::env::temp_dir()
        } else {
            PathBuf::from(&self.dir)
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Settings {
    /// Load the layered settings. `explicit` replaces the default settings
    /// file location and must exist when given.
    pub fn load(explicit: Option<&Path>) -> Result<Self, MonitorError> {
        let file = match explicit {
            Some(path) => config::File::from(path).required(true),
            None => config::File::from(settings_path().as_path()).required(false),
        }
        .format(config::FileFormat::Toml);

        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_SETTINGS, config::FileFormat::Toml))
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("LOGMON")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
            .map_err(Into::into)
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        Self {
            run: RunSettings::default(),
            mailbox: MailboxSettings::default(),
            codes: CodesSettings::default(),
            guard: GuardSettings::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

fn settings_path() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
                .join(".config")
        })
        .join("logmon")
        .join("settings.toml")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
