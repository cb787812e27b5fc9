use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::descriptor::DESCRIPTOR_FILE;
use crate::error::{SyncError, SyncFailure};

/// Counts accumulated over one sync run. A removed directory counts as a
/// single deletion regardless of how many files it held.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub copied: u64,
    pub deleted: u64,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.copied == 0 && self.deleted == 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Extensions (without the leading dot) exempt from both copying and
    /// deletion.
    pub ignore_exts: BTreeSet<String>,

    /// Count what would change without touching the destination.
    pub dry_run: bool,

    /// Raised by the caller to stop the walk between entries. A cancelled
    /// run returns the partial counts without error.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl SyncOptions {
    pub fn with_ignore<I, S>(exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SyncOptions {
            ignore_exts: exts.into_iter().map(Into::into).collect(),
            ..SyncOptions::default()
        }
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map_or(false, |flag| flag.load(Ordering::Relaxed))
    }
}

/// Mirror `src` into `dst`, then prune destination extras. Walks are
/// strictly sequential and depth-first; the first filesystem error aborts
/// the run, returning the counts accumulated so far alongside the error.
pub fn sync(src: &Path, dst: &Path, opts: &SyncOptions) -> Result<SyncReport, SyncFailure> {
    let mut report = SyncReport::default();
    match run(src, dst, opts, &mut report) {
        Ok(()) => Ok(report),
        Err(error) => Err(SyncFailure {
            partial: report,
            error,
        }),
    }
}

fn run(src: &Path, dst: &Path, opts: &SyncOptions, report: &mut SyncReport) -> Result<(), SyncError> {
    let meta = fs::metadata(src).map_err(SyncError::io("stat", src))?;
    if !meta.is_dir() {
        return Err(SyncError::NotADirectory(src.to_path_buf()));
    }
    mirror_dir(src, dst, opts, &mut report.copied)?;
    prune_dir(src, dst, opts, &mut report.deleted)?;
    Ok(())
}

/// Copy pass only: create missing directories, copy new or changed files.
pub fn mirror(src: &Path, dst: &Path, opts: &SyncOptions) -> Result<u64, SyncError> {
    let mut copied = 0;
    mirror_dir(src, dst, opts, &mut copied)?;
    Ok(copied)
}

/// Prune pass only: delete destination entries with no source counterpart.
pub fn prune(src: &Path, dst: &Path, opts: &SyncOptions) -> Result<u64, SyncError> {
    let mut deleted = 0;
    prune_dir(src, dst, opts, &mut deleted)?;
    Ok(deleted)
}

fn mirror_dir(src: &Path, dst: &Path, opts: &SyncOptions, copied: &mut u64) -> Result<(), SyncError> {
    if !opts.dry_run {
        fs::create_dir_all(dst).map_err(SyncError::io("create directory", dst))?;
    }

    for entry in sorted_entries(src)? {
        if opts.cancelled() {
            return Ok(());
        }
        let name = entry.file_name();
        if name == DESCRIPTOR_FILE {
            continue;
        }
        let src_path = entry.path();
        let dst_path = dst.join(&name);
        let file_type = entry
            .file_type()
            .map_err(SyncError::io("stat", &src_path))?;

        if file_type.is_dir() {
            // Name collision with a destination file: the source type wins.
            if !opts.dry_run && dst_path.exists() && !dst_path.is_dir() {
                fs::remove_file(&dst_path).map_err(SyncError::io("remove", &dst_path))?;
            }
            mirror_dir(&src_path, &dst_path, opts, copied)?;
        } else {
            if opts.ignore_exts.contains(extension_of(&name)) {
                continue;
            }
            if dst_path.is_dir() {
                // Collision the other way round: drop the directory and
                // let the file take its place.
                if opts.dry_run {
                    *copied += 1;
                    continue;
                }
                fs::remove_dir_all(&dst_path).map_err(SyncError::io("remove", &dst_path))?;
            } else if dst_path.is_file() {
                let src_data = fs::read(&src_path).map_err(SyncError::io("read", &src_path))?;
                let dst_data = fs::read(&dst_path).map_err(SyncError::io("read", &dst_path))?;
                if src_data == dst_data {
                    continue;
                }
            }
            if !opts.dry_run {
                fs::copy(&src_path, &dst_path).map_err(SyncError::io("copy", &src_path))?;
            }
            *copied += 1;
        }
    }
    Ok(())
}

fn prune_dir(src: &Path, dst: &Path, opts: &SyncOptions, deleted: &mut u64) -> Result<(), SyncError> {
    let mut entries = match fs::read_dir(dst) {
        Ok(iter) => iter
            .collect::<Result<Vec<_>, _>>()
            .map_err(SyncError::io("list", dst))?,
        // Nothing to prune yet.
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(SyncError::io("list", dst)(e)),
    };
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        if opts.cancelled() {
            return Ok(());
        }
        let name = entry.file_name();
        let src_path = src.join(&name);
        let dst_path = entry.path();
        let file_type = entry
            .file_type()
            .map_err(SyncError::io("stat", &dst_path))?;

        // Ignored extensions are outside the sync's jurisdiction in both
        // directions: never copied, never deleted.
        if !file_type.is_dir() && opts.ignore_exts.contains(extension_of(&name)) {
            continue;
        }

        let src_exists = src_path.exists();

        if file_type.is_dir() {
            if src_exists {
                prune_dir(&src_path, &dst_path, opts, deleted)?;
            } else {
                if !opts.dry_run {
                    fs::remove_dir_all(&dst_path)
                        .map_err(SyncError::io("remove", &dst_path))?;
                }
                *deleted += 1;
            }
        } else if !src_exists {
            if !opts.dry_run {
                fs::remove_file(&dst_path).map_err(SyncError::io("remove", &dst_path))?;
            }
            *deleted += 1;
        }
    }
    Ok(())
}

fn sorted_entries(dir: &Path) -> Result<Vec<fs::DirEntry>, SyncError> {
    let mut entries = fs::read_dir(dir)
        .map_err(SyncError::io("list", dir))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(SyncError::io("list", dir))?;
    entries.sort_by_key(|entry| entry.file_name());
    Ok(entries)
}

/// Text after the final `.` of the file name, empty when there is none.
fn extension_of(name: &OsStr) -> &str {
    Path::new(name)
        .extension()
        .and_then(OsStr::to_str)
        .unwrap_or("")
}
