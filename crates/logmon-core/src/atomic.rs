//! Whole-file replacement through a temporary sibling and a rename.
//!
//! Both the offset table and the mailbox are rewritten only through
//! [`replace_file`]: the new contents are written to a temporary file in the
//! destination's directory, synced, and renamed over the destination. A
//! crash at any point leaves either the old or the new complete file.
//!
//! The replacement keeps the destination's permissions; the mailbox is
//! shared by processes that may run as different users.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;

/// Replace `path` with the bytes produced by `write`.
pub fn replace_file<F>(path: &Path, write: F) -> io::Result<()>
where
    F: FnOnce(&mut BufWriter<&File>) -> io::Result<()>,
{
    let dir = parent_dir(path);
    let temp = staged(dir, write)?;
    match fs::metadata(path) {
        Ok(existing) => temp.as_file().set_permissions(existing.permissions())?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    temp.persist(path).map_err(|e| e.error)?;
    sync_dir(dir)
}

/// Create `path` with the bytes produced by `write`, failing with
/// `AlreadyExists` when it is already there. Readers never see a partially
/// written file.
pub fn create_file<F>(path: &Path, write: F) -> io::Result<()>
where
    F: FnOnce(&mut BufWriter<&File>) -> io::Result<()>,
{
    let dir = parent_dir(path);
    let temp = staged(dir, write)?;
    temp.persist_noclobber(path).map_err(|e| e.error)?;
    sync_dir(dir)
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

fn staged<F>(dir: &Path, write: F) -> io::Result<NamedTempFile>
where
    F: FnOnce(&mut BufWriter<&File>) -> io::Result<()>,
{
    let temp = tempfile::Builder::new()
        .prefix(".logmon-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    {
        let mut out = BufWriter::new(temp.as_file());
        write(&mut out)?;
        out.flush()?;
    }
    temp.as_file().sync_all()?;
    Ok(temp)
}

// The rename is only durable once the directory entry is.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
