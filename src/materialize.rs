//! Creates destination entries as relative symlinks or byte copies.

use std::fs::{self, File, FileTimes};
use std::io;
use std::path::{Component, Path, PathBuf};

use log::debug;

use crate::error::{ReorgError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaterializeMode {
    #[default]
    Symlink,
    Copy,
}

impl MaterializeMode {
    pub fn from_copy_flag(copy: bool) -> Self {
        if copy {
            MaterializeMode::Copy
        } else {
            MaterializeMode::Symlink
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MaterializeOutcome {
    /// An earlier entry existed at the destination and was removed.
    pub replaced: bool,
    /// Zero for symlinks.
    pub bytes_copied: u64,
}

/// Places `source` at `dest`, replacing whatever was there.
///
/// Parent directories are created. A pre-existing file, symlink (dangling
/// or not) or empty directory at `dest` is removed first; a non-empty
/// directory yields [`ReorgError::DestinationOccupied`]. Symlinks are
/// relative to the destination's directory. Copies keep permissions and
/// access/modification times.
pub fn materialize(
    source: &Path,
    dest: &Path,
    mode: MaterializeMode,
) -> Result<MaterializeOutcome> {
    let parent = dest.parent().unwrap_or_else(|| Path::new("."));
    if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent)?;
    }

    let replaced = clear_destination(dest)?;

    let bytes_copied = match mode {
        MaterializeMode::Symlink => {
            link_relative(source, dest)?;
            0
        }
        MaterializeMode::Copy => copy_with_metadata(source, dest)?,
    };

    debug!(
        "{} -> {}{}",
        source.display(),
        dest.display(),
        if replaced { " (replaced)" } else { "" }
    );
    Ok(MaterializeOutcome {
        replaced,
        bytes_copied,
    })
}

/// Returns whether something was removed.
fn clear_destination(dest: &Path) -> Result<bool> {
    let meta = match fs::symlink_metadata(dest) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e.into()),
    };

    if meta.is_dir() {
        if fs::read_dir(dest)?.next().is_some() {
            return Err(ReorgError::DestinationOccupied(dest.to_path_buf()));
        }
        fs::remove_dir(dest)?;
    } else {
        fs::remove_file(dest)?;
    }
    Ok(true)
}

fn copy_with_metadata(source: &Path, dest: &Path) -> Result<u64> {
    let bytes = fs::copy(source, dest)?;
    let meta = fs::metadata(source)?;
    let times = FileTimes::new()
        .set_accessed(meta.accessed()?)
        .set_modified(meta.modified()?);
    // Read-only handle: the copied permissions may forbid writing.
    File::open(dest)?.set_times(times)?;
    Ok(bytes)
}

#[cfg(unix)]
fn link_relative(source: &Path, dest: &Path) -> Result<()> {
    let target = relative_link_target(source, dest)?;
    std::os::unix::fs::symlink(target, dest)?;
    Ok(())
}

#[cfg(not(unix))]
fn link_relative(source: &Path, dest: &Path) -> Result<()> {
    log::warn!("symlinks unsupported here, copying {}", source.display());
    copy_with_metadata(source, dest).map(|_| ())
}

/// Path of `source` as seen from the directory containing `dest`.
pub fn relative_link_target(source: &Path, dest: &Path) -> Result<PathBuf> {
    let source = normalize(&std::path::absolute(source)?);
    let dest = normalize(&std::path::absolute(dest)?);
    let base = dest.parent().unwrap_or(dest.as_path());
    Ok(relative_to(&source, base))
}

/// Lexically resolves `.` and `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn relative_to(target: &Path, base: &Path) -> PathBuf {
    let target: Vec<Component> = target.components().collect();
    let base: Vec<Component> = base.components().collect();
    let common = target
        .iter()
        .zip(base.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..base.len() {
        rel.push("..");
    }
    for component in &target[common..] {
        rel.push(component.as_os_str());
    }
    rel
}
