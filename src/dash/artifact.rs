//! The bundle on disk, and when to regenerate it.

use std::fmt::Display;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::dash::*;

/// When an existing bundle is reused instead of being regenerated.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub enum CachePolicy {
    /// Reuse any existing bundle, whatever input it was computed from.
    #[default]
    ReuseExisting,
    /// Always regenerate the bundle.
    ForceRefresh,
    /// Reuse the existing bundle only if it carries the digest of the current input.
    RefreshIfStale,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ArtifactStatus {
    Created,
    Reused,
    Refreshed,
}

impl Display for ArtifactStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactStatus::Created => write!(f, "created"),
            ArtifactStatus::Reused => write!(f, "reused"),
            ArtifactStatus::Refreshed => write!(f, "refreshed"),
        }
    }
}

/// Returns the bundle stored at `path`, computing and writing it with `build`
/// when the policy asks for it.
///
/// `build` is only called when the bundle is (re)generated. `digest` is the
/// digest of the current input, compared under [`CachePolicy::RefreshIfStale`].
/// [`CachePolicy::ForceRefresh`] never reads the existing file, so it also
/// replaces files that are not bundles. Under `RefreshIfStale` such a file is
/// stale, and under `ReuseExisting` it is an error.
///
/// A single process is expected to write the bundle. The first creation is a
/// create-if-absent and refreshes replace the file with a rename, but nothing
/// coordinates two concurrent refreshes.
pub fn export<F>(
    path: &Path,
    policy: CachePolicy,
    digest: &str,
    build: F,
) -> DashResult<(ExportBundle, ArtifactStatus)>
where
    F: FnOnce() -> DashResult<ExportBundle>,
{
    if policy == CachePolicy::ForceRefresh {
        return refresh(path, build);
    }
    let existing = match (policy, read_existing(path)) {
        (CachePolicy::RefreshIfStale, Err(DashError::UnreadableArtifact { source, .. })) => {
            warn!(
                "The bundle {} cannot be read ({}), regenerating it",
                path.display(),
                source
            );
            return refresh(path, build);
        }
        (_, res) => res?,
    };
    let bundle = match existing {
        Some(b) => b,
        None => return create(path, build),
    };
    if policy == CachePolicy::ReuseExisting {
        warn!(
            "Reusing the existing bundle {}: it is not regenerated even if the input changed (use --force-refresh or --refresh-if-stale)",
            path.display()
        );
        return Ok((bundle, ArtifactStatus::Reused));
    }
    if bundle.source_digest.as_deref() == Some(digest) {
        info!("The bundle {} is up to date", path.display());
        return Ok((bundle, ArtifactStatus::Reused));
    }
    info!(
        "The bundle {} was computed from another input ({:?}), regenerating it",
        path.display(),
        bundle.source_digest
    );
    refresh(path, build)
}

fn create<F>(path: &Path, build: F) -> DashResult<(ExportBundle, ArtifactStatus)>
where
    F: FnOnce() -> DashResult<ExportBundle>,
{
    let bundle = build()?;
    if create_new(path, &bundle)? {
        return Ok((bundle, ArtifactStatus::Created));
    }
    // Another writer created it in the meantime.
    match read_existing(path)? {
        Some(theirs) => Ok((theirs, ArtifactStatus::Reused)),
        None => whatever!("The bundle {} vanished while being created", path.display()),
    }
}

fn refresh<F>(path: &Path, build: F) -> DashResult<(ExportBundle, ArtifactStatus)>
where
    F: FnOnce() -> DashResult<ExportBundle>,
{
    let existed = path.exists();
    let bundle = build()?;
    replace(path, &bundle)?;
    let status = if existed {
        ArtifactStatus::Refreshed
    } else {
        ArtifactStatus::Created
    };
    Ok((bundle, status))
}

fn path_string(path: &Path) -> String {
    path.display().to_string()
}

/// The bundle at `path`, or `None` if there is no file.
pub fn read_existing(path: &Path) -> DashResult<Option<ExportBundle>> {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e).context(OpeningJsonSnafu {
                path: path_string(path),
            })
        }
    };
    let bundle: ExportBundle =
        serde_json::from_str(contents.as_str()).context(UnreadableArtifactSnafu {
            path: path_string(path),
        })?;
    debug!("read_existing: {} areas in {}", bundle.areas.len(), path.display());
    Ok(Some(bundle))
}

fn ensure_parent(path: &Path) -> DashResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context(WritingArtifactSnafu {
                path: path_string(path),
            })?;
        }
    }
    Ok(())
}

/// Writes the bundle only if no file exists yet. Returns `false` if one does.
fn create_new(path: &Path, bundle: &ExportBundle) -> DashResult<bool> {
    ensure_parent(path)?;
    let contents = bundle_to_pretty_json(bundle)?;
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => {
            return Err(e).context(WritingArtifactSnafu {
                path: path_string(path),
            })
        }
    };
    file.write_all(contents.as_bytes())
        .context(WritingArtifactSnafu {
            path: path_string(path),
        })?;
    info!("{} created.", path.display());
    Ok(true)
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(format!(".{}.tmp", std::process::id()));
    path.with_file_name(name)
}

/// Replaces the bundle: the new content is written next to it, then renamed over it.
fn replace(path: &Path, bundle: &ExportBundle) -> DashResult<()> {
    ensure_parent(path)?;
    let contents = bundle_to_pretty_json(bundle)?;
    let tmp = temp_sibling(path);
    fs::write(&tmp, contents).context(WritingArtifactSnafu {
        path: path_string(&tmp),
    })?;
    fs::rename(&tmp, path).context(WritingArtifactSnafu {
        path: path_string(path),
    })?;
    info!("{} regenerated.", path.display());
    Ok(())
}
