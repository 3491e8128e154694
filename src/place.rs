use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

use crate::video::{Options, ParsedFile};

/// How a file ends up in the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    #[default]
    Symlink,
    Hardlink,
    Copy,
    Move,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Symlink => "symlink",
            Action::Hardlink => "hardlink",
            Action::Copy => "copy",
            Action::Move => "move",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Placed,
    DryRun,
    AlreadyExists,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub source: PathBuf,
    pub target: PathBuf,
    pub action: Action,
    pub outcome: Outcome,
}

#[cfg(unix)]
fn symlink(original: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(original, link)
}

#[cfg(windows)]
fn symlink(original: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(original, link)
}

/// `path` expressed relative to the directory `base`. Both must be absolute;
/// paths on different roots come back unchanged.
fn relative_to(path: &Path, base: &Path) -> PathBuf {
    let mut path_components = path.components().peekable();
    let mut base_components = base.components().peekable();
    let mut common = 0;
    while let (Some(a), Some(b)) = (path_components.peek(), base_components.peek()) {
        if a != b {
            break;
        }
        path_components.next();
        base_components.next();
        common += 1;
    }
    if common == 0 {
        return path.to_path_buf();
    }

    let mut relative = PathBuf::new();
    for _ in base_components {
        relative.push("..");
    }
    relative.extend(path_components);
    relative
}

fn commit(action: Action, source: &Path, target: &Path) -> Result<()> {
    match action {
        Action::Symlink => {
            let source = fs::canonicalize(source)
                .with_context(|| format!("Failed to resolve {:?}", source))?;
            let parent = target.parent().context("Failed to get parent")?;
            let parent = fs::canonicalize(parent)
                .with_context(|| format!("Failed to resolve {:?}", parent))?;
            let link = relative_to(&source, &parent);
            debug!(source = %source.display(), link = %link.display(), "using relative path for symlink");
            symlink(&link, target)?;
        }
        Action::Hardlink => {
            fs::hard_link(source, target)?;
        }
        Action::Copy => {
            fs::copy(source, target)?;
        }
        Action::Move => {
            fs::rename(source, target)?;
        }
    };
    Ok(())
}

/// Puts `file` under `root` at its rendered target name. An existing
/// destination is left alone, and with `dry_run` nothing is touched.
pub fn place(
    file: &ParsedFile,
    root: &Path,
    action: Action,
    options: &Options,
) -> Result<Placement> {
    let source = std::path::absolute(file.source_path())
        .with_context(|| format!("Failed to resolve {:?}", file.source_path()))?;
    let target = root.join(file.target_name(options));
    let mut placement = Placement {
        source,
        target,
        action,
        outcome: Outcome::DryRun,
    };

    if options.dry_run {
        info!(
            source = %placement.source.display(),
            target = %placement.target.display(),
            %action,
            "--dry-run enabled, not acting on file"
        );
        return Ok(placement);
    }

    let parent = placement.target.parent().context("Failed to get parent")?;
    if !parent.exists() {
        debug!(path = %parent.display(), "creating folder as it does not exist yet");
    }
    fs::create_dir_all(parent).with_context(|| format!("Failed to create {:?}", parent))?;

    info!(
        source = %placement.source.display(),
        target = %placement.target.display(),
        %action,
        "acting on file"
    );
    if fs::symlink_metadata(&placement.target).is_ok() {
        warn!(target = %placement.target.display(), "file already exists, doing nothing");
        placement.outcome = Outcome::AlreadyExists;
        return Ok(placement);
    }

    commit(action, &placement.source, &placement.target).with_context(|| {
        format!(
            "Failed to {} {:?} to {:?}",
            action, placement.source, placement.target
        )
    })?;
    placement.outcome = Outcome::Placed;
    Ok(placement)
}
