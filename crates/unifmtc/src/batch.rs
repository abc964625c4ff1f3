//! Formatting many files at once on the shared worker pool.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use unifmt_rt::error::RtError;

use crate::format::format;
use crate::options::FormatOptions;
use crate::task_pool::{self, FormatFn, FormatJob};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub original: String,
    pub formatted: String,
}

impl FileOutcome {
    pub fn changed(&self) -> bool {
        self.original != self.formatted
    }

    /// Writes the formatted text back when it differs from the original.
    pub fn write_back(&self) -> Result<bool, RtError> {
        if !self.changed() {
            return Ok(false);
        }
        fs::write(&self.path, &self.formatted).map_err(|err| RtError::io(&self.path, err))?;
        Ok(true)
    }
}

pub fn format_file(path: &Path, opts: &FormatOptions) -> Result<FileOutcome, RtError> {
    let original = fs::read_to_string(path).map_err(|err| RtError::io(path, err))?;
    let formatted = format(&original, opts);
    Ok(FileOutcome {
        path: path.to_path_buf(),
        original,
        formatted,
    })
}

/// Formats every path, in parallel, returning results in input order.
pub fn format_files(paths: &[PathBuf], opts: &FormatOptions) -> Vec<Result<FileOutcome, RtError>> {
    format_files_with(paths, opts, format_file)
}

fn format_files_with(
    paths: &[PathBuf],
    opts: &FormatOptions,
    format_one: FormatFn,
) -> Vec<Result<FileOutcome, RtError>> {
    if paths.len() < 2 {
        return paths.iter().map(|path| format_one(path, opts)).collect();
    }
    log::debug!(
        "formatting {} files on {} workers",
        paths.len(),
        task_pool::worker_count()
    );
    let (tx, rx) = mpsc::channel();
    for (idx, path) in paths.iter().enumerate() {
        task_pool::submit(FormatJob {
            idx,
            path: path.clone(),
            opts: *opts,
            format: format_one,
            reply: tx.clone(),
        });
    }
    drop(tx);

    let mut slots: Vec<Option<Result<FileOutcome, RtError>>> = paths.iter().map(|_| None).collect();
    for (idx, result) in rx {
        slots[idx] = Some(result);
    }
    slots
        .into_iter()
        .zip(paths)
        .map(|(slot, path)| {
            slot.unwrap_or_else(|| {
                Err(RtError::io(
                    path,
                    io::Error::other("formatter worker stopped before finishing"),
                ))
            })
        })
        .collect()
}
