//! The monitoring cycle: document → targets → scans → events → offsets.

use std::collections::HashSet;
use std::path::PathBuf;

use logmon_core::dedup::deduplicate;
use logmon_core::document::load_monitor_specs;
use logmon_core::mailbox::{EventDraft, MailboxWriter};
use logmon_core::offsets::{OffsetStore, OffsetUpdates};
use logmon_core::{MonitorError, ReadMode, ResolvedTarget, ResultCode, Watch};
use logmon_feeds::{resolve_all, scan};
use tracing::{debug, info, warn};

use crate::context::RunContext;

/// Counters for one completed cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub specs: usize,
    pub targets: usize,
    /// (logical name, path) groups whose file was read.
    pub scanned: usize,
    /// Groups whose file could not be read.
    pub skipped: usize,
    pub events: usize,
}

/// Owns the run-mode state that outlives a single cycle.
#[derive(Debug)]
pub struct Monitor {
    ctx: RunContext,
    config_path: PathBuf,
    writer: MailboxWriter,
    offsets: OffsetStore,
}

impl Monitor {
    pub fn new(ctx: RunContext, config_path: impl Into<PathBuf>) -> Result<Self, MonitorError> {
        let offsets = OffsetStore::open(&ctx.offset_path)?;
        Ok(Self {
            writer: ctx.writer(),
            config_path: config_path.into(),
            ctx,
            offsets,
        })
    }

    pub fn offsets(&self) -> &OffsetStore {
        &self.offsets
    }

    /// Run one full cycle.
    ///
    /// A document that cannot be loaded is recorded in the mailbox and ends
    /// the run. Per-file read failures are logged and skipped; the next
    /// cycle resolves again. Offsets are committed once, after every event
    /// of the cycle has been appended.
    pub fn run_cycle(&mut self) -> Result<CycleReport, MonitorError> {
        let specs = match load_monitor_specs(&self.config_path) {
            Ok(specs) => specs,
            Err(err) => return Err(self.record_failure(err)),
        };
        let targets = resolve_all(&specs, &self.writer)?;

        let mut report = CycleReport {
            specs: specs.len(),
            targets: targets.len(),
            ..CycleReport::default()
        };
        let mut updates = OffsetUpdates::new();
        let mut live = HashSet::new();

        for group in targets.chunk_by(same_file) {
            let first = &group[0];
            let spec = first.watch.spec;
            let key = first.key();
            let offset = match spec.read_mode {
                ReadMode::Incremental => {
                    live.insert(key.clone());
                    self.offsets.get(&spec.logical_name, &first.path)
                }
                ReadMode::Full => 0,
            };

            let watches: Vec<Watch<'_>> = group.iter().map(|target| target.watch).collect();
            let outcome = match scan(&first.path, spec.read_mode, offset, &watches) {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(
                        logical_name = %spec.logical_name,
                        path = %first.path.display(),
                        error = %e,
                        "cannot read logfile, skipping until next cycle"
                    );
                    report.skipped += 1;
                    continue;
                }
            };
            report.scanned += 1;

            for (watch, records) in watches.iter().zip(outcome.matches) {
                for record in deduplicate(records, spec.deduplicate) {
                    self.writer.append(
                        EventDraft::for_watch(*watch, &first.path, ResultCode::Success)
                            .with_match(&record),
                    )?;
                    report.events += 1;
                }
            }

            if spec.read_mode == ReadMode::Incremental {
                let slot = updates.entry(key).or_insert(0);
                *slot = (*slot).max(outcome.lines);
            }
        }

        let live = self.ctx.prune_offsets.then_some(&live);
        self.offsets.commit(&updates, live)?;

        debug!(?report, "cycle finished");
        Ok(report)
    }

    /// Loop [`Monitor::run_cycle`], sleeping `interval` between cycles.
    /// Returns after `cycles` cycles when that is non-zero.
    pub fn run(&mut self) -> Result<(), MonitorError> {
        let mut completed = 0u64;
        loop {
            let report = self.run_cycle()?;
            completed += 1;
            info!(
                cycle = completed,
                targets = report.targets,
                events = report.events,
                "cycle complete"
            );
            if self.ctx.cycles != 0 && completed >= self.ctx.cycles {
                return Ok(());
            }
            std::thread::sleep(self.ctx.interval);
        }
    }

    /// Append an event for a run-level failure and return the error the
    /// run should stop with.
    fn record_failure(&self, err: MonitorError) -> MonitorError {
        let mut draft = EventDraft::new(err.code()).with_message(err.to_string());
        draft.file_name = self.config_path.display().to_string();
        match self.writer.append(draft) {
            Ok(_) => err,
            Err(terminated) => terminated,
        }
    }
}

fn same_file(a: &ResolvedTarget<'_>, b: &ResolvedTarget<'_>) -> bool {
    std::ptr::eq(a.watch.spec, b.watch.spec) && a.path == b.path
}
