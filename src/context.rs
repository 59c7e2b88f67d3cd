//! Per-invocation context: layered settings plus command-line overrides.

use std::path::PathBuf;
use std::time::Duration;

use logmon_core::config::Settings;
use logmon_core::mailbox::{MailboxReader, MailboxWriter, ReadRetention};
use logmon_core::{MonitorError, ResultCodeTable};

/// Values given on the command line. Each one, when present, wins over the
/// matching setting.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub mailbox: Option<PathBuf>,
    pub offsets: Option<PathBuf>,
    pub codes: Option<PathBuf>,
    pub cycles: Option<u64>,
    pub interval_secs: Option<u64>,
}

/// Everything a run or read pass needs besides its document.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub mailbox_path: PathBuf,
    pub offset_path: PathBuf,
    pub codes: ResultCodeTable,
    pub interval: Duration,
    /// 0 runs until terminated.
    pub cycles: u64,
    pub prune_offsets: bool,
    pub retention: ReadRetention,
    pub guard_dir: PathBuf,
}

impl RunContext {
    /// Merge `overrides` into `settings` and load the result-code table.
    pub fn from_settings(settings: Settings, overrides: Overrides) -> Result<Self, MonitorError> {
        let codes_file = overrides
            .codes
            .or_else(|| settings.codes.file().map(PathBuf::from));
        let codes = match codes_file {
            Some(path) => ResultCodeTable::load(&path)?,
            None => ResultCodeTable::builtin(),
        };

        Ok(Self {
            mailbox_path: overrides.mailbox.unwrap_or(settings.mailbox.path),
            offset_path: overrides.offsets.unwrap_or(settings.run.offset_file),
            codes,
            interval: Duration::from_secs(
                overrides.interval_secs.unwrap_or(settings.run.interval_secs),
            ),
            cycles: overrides.cycles.unwrap_or(settings.run.cycles),
            prune_offsets: settings.run.prune_offsets,
            retention: ReadRetention::from_keep_read(settings.mailbox.keep_read),
            guard_dir: settings.guard.dir(),
        })
    }

    pub fn writer(&self) -> MailboxWriter {
        MailboxWriter::new(&self.mailbox_path, self.codes.clone())
    }

    pub fn reader(&self) -> MailboxReader {
        MailboxReader::new(&self.mailbox_path, self.retention)
    }
}
