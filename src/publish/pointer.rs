//! Atomic replacement of published paths.
//!
//! Readers open the public path at arbitrary times, so it is never opened for writing. Every
//! update is staged under a temporary sibling name and moved over the destination with a single
//! `rename`, which replaces an existing entry atomically as long as both names live on the same
//! filesystem. Staging in the destination's own directory keeps that true.

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use anyhow::Context as _;

use crate::foundation::error::{TpdneError, TpdneResult};

/// Hidden sibling of `path` used as a staging name.
pub fn staging_path(path: &Path, tag: &str) -> TpdneResult<PathBuf> {
    let name = path
        .file_name()
        .ok_or_else(|| TpdneError::config(format!("'{}' has no file name", path.display())))?;
    let mut staged = OsString::from(".");
    staged.push(name);
    staged.push(".");
    staged.push(tag);
    Ok(path.with_file_name(staged))
}

/// Produce `dest` through `write`, which receives a staging path to fill completely.
///
/// `dest` is replaced only after `write` returns successfully; a reader holding the previous
/// file keeps reading the previous contents.
pub fn write_replacing(
    dest: &Path,
    write: impl FnOnce(&Path) -> TpdneResult<()>,
) -> TpdneResult<()> {
    let staged = staging_path(dest, "partial")?;
    write(&staged)?;
    std::fs::rename(&staged, dest).with_context(|| {
        format!(
            "rename '{}' over '{}'",
            staged.display(),
            dest.display()
        )
    })?;
    Ok(())
}

/// Point `link` at `target`, replacing whatever `link` resolved to before.
///
/// A reader that opens `link` at any instant sees either the old target or the new one.
/// Swapping to the current target again is a no-op from the reader's side.
pub fn swap_pointer(target: &Path, link: &Path) -> TpdneResult<()> {
    let staged = staging_path(link, "swap")?;
    remove_stale(&staged)?;
    stage_pointer(target, &staged)?;
    std::fs::rename(&staged, link).with_context(|| {
        format!(
            "swap '{}' -> '{}'",
            link.display(),
            target.display()
        )
    })?;
    Ok(())
}

/// The file a published pointer currently resolves to.
pub fn read_pointer(link: &Path) -> TpdneResult<PathBuf> {
    #[cfg(unix)]
    {
        Ok(std::fs::read_link(link).with_context(|| format!("read link '{}'", link.display()))?)
    }
    #[cfg(not(unix))]
    {
        Ok(link.to_path_buf())
    }
}

fn remove_stale(staged: &Path) -> TpdneResult<()> {
    match std::fs::symlink_metadata(staged) {
        Ok(_) => std::fs::remove_file(staged)
            .with_context(|| format!("remove stale '{}'", staged.display()))
            .map_err(Into::into),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(anyhow::Error::new(e)
            .context(format!("inspect '{}'", staged.display()))
            .into()),
    }
}

#[cfg(unix)]
fn stage_pointer(target: &Path, staged: &Path) -> TpdneResult<()> {
    std::os::unix::fs::symlink(target, staged).with_context(|| {
        format!(
            "symlink '{}' -> '{}'",
            staged.display(),
            target.display()
        )
    })?;
    Ok(())
}

// Symlinks need elevated rights on Windows; a staged copy keeps the rename-based swap.
#[cfg(not(unix))]
fn stage_pointer(target: &Path, staged: &Path) -> TpdneResult<()> {
    std::fs::copy(target, staged).with_context(|| {
        format!("copy '{}' to '{}'", target.display(), staged.display())
    })?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/publish/pointer.rs"]
mod tests;
