//! Read mode: drain the mailbox once and print each record as one line.

use std::io::Write;
use std::path::Path;

use logmon_core::document::load_read_format;
use logmon_core::mailbox::render;
use logmon_core::MonitorError;
use tracing::info;

use crate::context::RunContext;

/// Drain every unread record into `out` using the format at `format_path`.
/// Returns the number of lines written.
///
/// The format document is validated before the mailbox is touched, so a bad
/// format never marks records read.
pub fn run_read(
    ctx: &RunContext,
    format_path: &Path,
    mut out: impl Write,
) -> Result<usize, MonitorError> {
    let format = load_read_format(format_path)?;
    let batch = ctx.reader().drain()?;

    let output = Path::new("<output>");
    for record in &batch {
        writeln!(out, "{}", render(record, &format)).map_err(|e| MonitorError::io(output, e))?;
    }
    out.flush().map_err(|e| MonitorError::io(output, e))?;

    info!(lines = batch.len(), mailbox = %ctx.mailbox_path.display(), "read pass complete");
    Ok(batch.len())
}
