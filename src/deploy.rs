//! Config artifacts for the web server and the process supervisor.
//!
//! Rendering is plain placeholder substitution. Installing writes the artifact into scratch and
//! links it into a system directory through the same swap used for images; reloading nginx or
//! enabling the unit is left to the operator.

pub(crate) mod nginx;
pub(crate) mod systemd;
pub(crate) mod template;

use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::{
    foundation::error::{TpdneError, TpdneResult},
    publish::pointer::{swap_pointer, write_replacing},
};

/// Write `contents` to `dir/file_name`, replacing any previous artifact.
pub fn write_artifact(dir: &Path, file_name: &str, contents: &str) -> TpdneResult<PathBuf> {
    if !dir.is_dir() {
        return Err(TpdneError::config(format!(
            "artifact directory '{}' does not exist",
            dir.display()
        )));
    }
    let dir = std::fs::canonicalize(dir)
        .with_context(|| format!("resolve '{}'", dir.display()))?;
    let path = dir.join(file_name);
    write_replacing(&path, |staged| {
        std::fs::write(staged, contents)
            .with_context(|| format!("write '{}'", staged.display()))?;
        Ok(())
    })?;
    tracing::debug!(path = %path.display(), "wrote artifact");
    Ok(path)
}

/// Link `artifact` into `dir` under its own file name.
pub fn link_into(artifact: &Path, dir: &Path) -> TpdneResult<PathBuf> {
    if !dir.is_dir() {
        return Err(TpdneError::config(format!(
            "link directory '{}' does not exist",
            dir.display()
        )));
    }
    let name = artifact.file_name().ok_or_else(|| {
        TpdneError::config(format!("artifact '{}' has no file name", artifact.display()))
    })?;
    let target = std::fs::canonicalize(artifact)
        .with_context(|| format!("resolve '{}'", artifact.display()))?;
    let link = dir.join(name);
    swap_pointer(&target, &link)?;
    tracing::info!(link = %link.display(), target = %target.display(), "linked artifact");
    Ok(link)
}

#[cfg(test)]
#[path = "../tests/unit/deploy/deploy.rs"]
mod tests;
