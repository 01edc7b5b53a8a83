use std::path::{Component, Path, PathBuf};

use crossbeam_channel::Sender;
use tracing::warn;

use crate::{fs::is_other_executable, Config, InvalidTagError, PathParts, Tag, TagCodec};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationKind {
    /// Keep only files with the tag.
    Intersection,
    /// Add files with the tag back into the selection.
    Inclusion,
    /// Remove files with the tag from the selection.
    Exclusion,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Operation {
    pub tag: Tag,
    pub kind: OperationKind,
}

impl Operation {
    /// Parse a selector:
    /// `+TAG` includes,
    /// `-TAG` excludes,
    /// and a bare `TAG` intersects.
    pub fn parse(token: &str, codec: &TagCodec) -> Result<Self, InvalidTagError> {
        let (kind, tag) = if let Some(tag) = token.strip_prefix(crate::ADD_PREFIX) {
            (OperationKind::Inclusion, tag)
        } else if let Some(tag) = token.strip_prefix(crate::REMOVE_PREFIX) {
            (OperationKind::Exclusion, tag)
        } else {
            (OperationKind::Intersection, token)
        };
        Ok(Self {
            tag: Tag::new(tag.to_owned(), codec)?,
            kind,
        })
    }
}

/// Whether a file is selected by `ops`.
///
/// A file is selected
/// if it has every intersection tag
/// and the last inclusion or exclusion it has a tag for,
/// in order,
/// is an inclusion.
/// A file with none of the inclusion or exclusion tags
/// is selected by intersections alone.
pub fn matches(parts: &PathParts, ops: &[Operation], config: &Config) -> bool {
    let mut intersected = true;
    let mut included = true;
    for op in ops {
        let has_tag = parts.has_tag(&op.tag, config);
        match op.kind {
            OperationKind::Intersection => intersected &= has_tag,
            OperationKind::Inclusion if has_tag => included = true,
            OperationKind::Exclusion if has_tag => included = false,
            _ => {}
        }
    }
    intersected && included
}

/// Coarse filter over `haystack`,
/// the path relative to the search root
/// (or just the filename without directory tagging).
///
/// Every intersection tag must appear as a substring.
/// This admits every file [`matches`] selects,
/// and more.
pub fn coarse_match(haystack: &str, ops: &[Operation], case_sensitive: bool) -> bool {
    let haystack = if case_sensitive {
        haystack.to_owned()
    } else {
        haystack.to_lowercase()
    };
    ops.iter()
        .filter(|op| op.kind == OperationKind::Intersection)
        .all(|op| {
            if case_sensitive {
                haystack.contains(op.tag.as_str())
            } else {
                haystack.contains(&op.tag.as_str().to_lowercase())
            }
        })
}

/// Find files under `dir` selected by `ops`,
/// sorted.
///
/// The search starts at the root when directory tagging is enabled.
/// Hidden paths and files executable by others are skipped.
pub fn select(dir: &Path, ops: &[Operation], config: &Config) -> Vec<PathBuf> {
    let start = match config.root().filter(|_| config.use_dirs()) {
        Some(root) => root.as_path().to_owned(),
        None => dir.to_owned(),
    };

    let mut selected = candidates(&start, ops, config)
        .into_iter()
        .filter(|path| match PathParts::new(path, config) {
            Ok(parts) => matches(&parts, ops, config),
            Err(e) => {
                warn!("skipping `{}`: {e}", path.display());
                false
            }
        })
        .collect::<Vec<_>>();
    selected.sort();
    selected
}

fn candidates(start: &Path, ops: &[Operation], config: &Config) -> Vec<PathBuf> {
    let (sender, receiver) = crossbeam_channel::unbounded();
    rayon::scope(|scope| walk(scope, start, start.to_owned(), ops, config, sender));
    receiver.into_iter().collect()
}

fn walk<'scope>(
    scope: &rayon::Scope<'scope>,
    start: &'scope Path,
    dir: PathBuf,
    ops: &'scope [Operation],
    config: &'scope Config,
    sender: Sender<PathBuf>,
) {
    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("failed to read `{}`: {e}", dir.display());
            return;
        }
    };
    for entry in entries {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                warn!("failed to read entry in `{}`: {e}", dir.display());
                continue;
            }
        };
        let Ok(relative) = path.strip_prefix(start) else {
            continue;
        };
        if is_hidden(relative) {
            continue;
        }
        let Ok(metadata) = std::fs::metadata(&path) else {
            continue;
        };
        if metadata.is_dir() {
            let sender = sender.clone();
            scope.spawn(move |scope| walk(scope, start, path, ops, config, sender));
        } else if metadata.is_file() && !is_other_executable(&metadata) {
            let haystack = if config.use_dirs() {
                relative.to_string_lossy()
            } else {
                path.file_name().unwrap_or_default().to_string_lossy()
            };
            if coarse_match(&haystack, ops, config.case_sensitive()) {
                // The receiver outlives the walk.
                let _ = sender.send(path);
            }
        }
    }
}

fn is_hidden(relative: &Path) -> bool {
    relative.components().any(|component| match component {
        Component::Normal(s) => s.to_string_lossy().starts_with('.'),
        _ => false,
    })
}
