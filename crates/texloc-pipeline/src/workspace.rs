//! Per-paper working directories.
//!
//! Every colorized iteration is compiled in its own directory,
//! `<root>/<paper>/iteration-<n>`, next to `<root>/<paper>/baseline`. A
//! directory is emptied before it is reused so that a rerun never picks up
//! files from an earlier run.

use std::fs;
use std::path::{Path, PathBuf};
use texloc_core::Result;

/// Directory name for a paper id. Old-style arXiv ids contain a slash.
#[must_use]
pub fn paper_dir_name(paper_id: &str) -> String {
    paper_id.replace(['/', '\\'], "_")
}

#[must_use]
pub fn paper_dir(root: &Path, paper_id: &str) -> PathBuf {
    root.join(paper_dir_name(paper_id))
}

#[must_use]
pub fn iteration_dir(root: &Path, paper_id: &str, iteration: usize) -> PathBuf {
    paper_dir(root, paper_id).join(format!("iteration-{iteration}"))
}

#[must_use]
pub fn baseline_dir(root: &Path, paper_id: &str) -> PathBuf {
    paper_dir(root, paper_id).join("baseline")
}

/// Remove `dir` if it exists, then create it empty.
///
/// # Errors
///
/// Returns an error if the directory cannot be removed or created.
pub fn prepare_iteration_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        log::debug!("Cleaning {}", dir.display());
        fs::remove_dir_all(dir)?;
    }
    fs::create_dir_all(dir)?;
    Ok(())
}

/// Recursively copy the contents of `src` into `dst`.
///
/// # Errors
///
/// Returns an error if any file cannot be read or written.
pub fn copy_dir_all(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_all(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), target)?;
        }
    }
    Ok(())
}
