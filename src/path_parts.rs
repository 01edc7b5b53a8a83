use std::path::{Component, Path, PathBuf};

use rustc_hash::FxHashSet;

use crate::{fs::normalize, resolve, Config, Tag, TagRef};

#[derive(Debug, thiserror::Error)]
pub enum PathPartsError {
    #[error("`{0}` is not valid Unicode")]
    NotUnicode(PathBuf),
    #[error("`{0}` does not name a file")]
    NoFileName(PathBuf),
    #[error("`{path}` is outside root `{root}`")]
    OutsideRoot { path: PathBuf, root: PathBuf },
    #[error("{0}")]
    Filesystem(#[from] std::io::Error),
}

/// A file path split for tag manipulation.
///
/// `dir` is relative to the root
/// when directory tagging is enabled,
/// and absolute otherwise.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathParts {
    dir: PathBuf,
    stem: String,
    /// Includes the leading `.`.
    ext: String,
}

impl PathParts {
    pub fn new<P>(path: P, config: &Config) -> Result<Self, PathPartsError>
    where
        P: AsRef<Path>,
    {
        let path = crate::fs::absolute(path)?;
        if path.to_str().is_none() {
            return Err(PathPartsError::NotUnicode(path));
        }

        let (Some(parent), Some(stem)) = (path.parent(), path.file_stem()) else {
            return Err(PathPartsError::NoFileName(path));
        };
        let stem = stem.to_str().unwrap_or_default().to_owned();
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();

        let dir = match config.root().filter(|_| config.use_dirs()) {
            Some(root) => parent
                .strip_prefix(normalize(root))
                .map_err(|_| PathPartsError::OutsideRoot {
                    path: path.clone(),
                    root: root.as_path().to_owned(),
                })?
                .to_owned(),
            None => parent.to_owned(),
        };

        Ok(Self { dir, stem, ext })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    pub fn ext(&self) -> &str {
        &self.ext
    }

    pub(crate) fn set_dir(&mut self, dir: PathBuf) {
        self.dir = dir;
    }

    pub(crate) fn set_stem(&mut self, stem: String) {
        self.stem = stem;
    }

    /// Tags in the stem,
    /// and in the directory when directory tagging is enabled.
    pub fn tags(&self, config: &Config) -> FxHashSet<Tag> {
        let codec = config.codec();
        let mut tags = codec.extract_tags(&self.stem);
        if config.use_dirs() {
            for segment in self.dir_segments() {
                tags.extend(codec.extract_tags(segment));
            }
        }
        tags
    }

    pub fn has_tag<T>(&self, tag: T, config: &Config) -> bool
    where
        T: AsRef<TagRef>,
    {
        let codec = config.codec();
        codec.has_tag(&self.stem, &tag)
            || (config.use_dirs()
                && self
                    .dir_segments()
                    .any(|segment| codec.has_tag(segment, &tag)))
    }

    /// Prepend `tag` to the stem
    /// unless the stem or directory already carries it.
    pub fn add_tag<T>(&mut self, tag: T, config: &Config)
    where
        T: AsRef<TagRef>,
    {
        if !self.has_tag(&tag, config) {
            self.stem = resolve::add_tag(tag.as_ref(), &self.stem, config);
        }
    }

    /// Remove `tag` from the stem,
    /// and from the directory when directory tagging is enabled.
    pub fn remove_tag<T>(&mut self, tag: T, config: &Config)
    where
        T: AsRef<TagRef>,
    {
        let tag = tag.as_ref();
        self.stem = resolve::remove_tag(tag, &self.stem, config);
        if config.use_dirs() {
            self.dir = self
                .dir_segments()
                .map(|segment| resolve::remove_tag(tag, segment, config))
                .filter(|segment| !segment.is_empty())
                .collect();
        }
    }

    fn dir_segments(&self) -> impl Iterator<Item = &str> {
        self.dir.components().filter_map(|component| match component {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
    }

    pub fn file_name(&self) -> String {
        format!("{}{}", self.stem, self.ext)
    }

    /// The full path these parts describe.
    pub fn to_path(&self, config: &Config) -> PathBuf {
        let dir = match config.root().filter(|_| config.use_dirs()) {
            Some(root) => root.join(&self.dir),
            None => self.dir.clone(),
        };
        normalize(dir.join(self.file_name()))
    }
}
