use std::path::{Path, PathBuf};

use crate::MARKER_FILE;

/// Root of a tagged directory tree,
/// the directory containing a marker file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Root {
    path: PathBuf,
    marker: PathBuf,
}

impl Root {
    pub fn new<P>(path: P) -> Option<Self>
    where
        P: Into<PathBuf>,
    {
        let path = path.into();
        let marker = path.join(MARKER_FILE);
        if marker.is_file() {
            Some(Self { path, marker })
        } else {
            None
        }
    }

    /// Search `start` and then each of its ancestors for a marker file.
    pub fn from_child<P>(start: P) -> Option<Self>
    where
        P: AsRef<Path>,
    {
        start.as_ref().ancestors().find_map(Self::new)
    }

    pub fn as_path(&self) -> &Path {
        &self.path
    }

    pub fn join<P>(&self, path: P) -> PathBuf
    where
        P: AsRef<Path>,
    {
        self.as_path().join(path)
    }

    pub fn marker(&self) -> &Path {
        &self.marker
    }
}

impl AsRef<Path> for Root {
    fn as_ref(&self) -> &Path {
        self.as_path()
    }
}
