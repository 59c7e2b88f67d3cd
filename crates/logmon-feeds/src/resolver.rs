//! Target resolution: file pattern → concrete regular files.

use std::fs;
use std::path::{Path, PathBuf};

use logmon_core::mailbox::{EventDraft, MailboxWriter};
use logmon_core::{MonitorError, MonitorSpec, ResolvedTarget, ResultCode};
use tracing::{debug, warn};

/// Regular files in the spec's directory whose basename fully matches the
/// spec's expression, sorted by path.
///
/// A directory that cannot be listed resolves to nothing; the caller reports
/// that the same way as an empty match.
pub fn resolve(spec: &MonitorSpec) -> Vec<PathBuf> {
    let entries = match fs::read_dir(&spec.directory) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(
                logical_name = %spec.logical_name,
                directory = %spec.directory.display(),
                error = %e,
                "cannot list logfile directory"
            );
            return Vec::new();
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()) || is_file_link(entry))
        .filter(|entry| spec.basename.is_match(&entry.file_name().to_string_lossy()))
        .map(|entry| entry.path())
        .collect();
    paths.sort();
    paths
}

fn is_file_link(entry: &fs::DirEntry) -> bool {
    entry.file_type().is_ok_and(|t| t.is_symlink())
        && fs::metadata(entry.path()).is_ok_and(|m| m.is_file())
}

/// Resolve every spec and flatten the result into targets, one per
/// (pattern, path), path-major within a spec.
///
/// For a spec that matched nothing, one `NoMatchingLogfile` event per
/// pattern is appended, naming the unexpanded file pattern. Resolution then
/// continues with the next spec.
pub fn resolve_all<'a>(
    specs: &'a [MonitorSpec],
    mailbox: &MailboxWriter,
) -> Result<Vec<ResolvedTarget<'a>>, MonitorError> {
    let mut targets = Vec::new();
    for spec in specs {
        let paths = resolve(spec);
        if paths.is_empty() {
            debug!(
                logical_name = %spec.logical_name,
                pattern = %spec.file_pattern,
                "no logfile matched"
            );
            for watch in spec.watches() {
                mailbox.append(EventDraft::for_watch(
                    watch,
                    Path::new(&spec.file_pattern),
                    ResultCode::NoMatchingLogfile,
                ))?;
            }
            continue;
        }

        for path in paths {
            for watch in spec.watches() {
                targets.push(ResolvedTarget {
                    watch,
                    path: path.clone(),
                });
            }
        }
    }
    Ok(targets)
}
