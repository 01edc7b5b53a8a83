use std::{
    fs::rename,
    path::{Path, PathBuf},
};

use rustc_hash::FxHashSet;
use tracing::{debug, info};

use crate::{
    apply_tag_edits, fs::absolute, Config, ConfigOverrides, InvalidTagError, PathParts,
    PathPartsError, Tag,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveOp {
    pub from: PathBuf,
    pub to: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    #[error("`{0}` is not a file")]
    NotFile(PathBuf),
    #[error("{0}")]
    Parts(#[from] PathPartsError),
}

#[derive(Debug, thiserror::Error)]
pub enum RetagError {
    #[error(
        "cannot move `{}` to `{}`, destination already exists",
        .0.from.display(),
        .0.to.display()
    )]
    DestinationExists(MoveOp),
    #[error("{0}")]
    Open(#[from] OpenError),
    #[error("{0}")]
    Filesystem(#[from] std::io::Error),
}

/// A file on disk
/// with the settings that apply to it.
#[derive(Clone, Debug)]
pub struct TaggedFile {
    path: PathBuf,
    parts: PathParts,
    config: Config,
}

impl TaggedFile {
    pub fn open<P>(path: P, overrides: &ConfigOverrides) -> Result<Self, OpenError>
    where
        P: AsRef<Path>,
    {
        let path = absolute(path).map_err(PathPartsError::from)?;
        if !path.is_file() {
            return Err(OpenError::NotFile(path));
        }
        let config = Config::for_dir(path.parent().unwrap_or(&path), overrides);
        let parts = PathParts::new(&path, &config)?;
        Ok(Self {
            path,
            parts,
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tags(&self) -> FxHashSet<Tag> {
        self.parts.tags(&self.config)
    }

    /// Validate tag tokens against the delimiters for this file.
    pub fn parse_tags<S>(&self, tokens: &[S]) -> Result<Vec<Tag>, InvalidTagError>
    where
        S: AsRef<str>,
    {
        tokens
            .iter()
            .map(|token| Tag::new(token.as_ref().to_owned(), self.config.codec()))
            .collect()
    }

    /// Where this file belongs after the given edits.
    pub fn retag(&self, add: &[Tag], remove: &[Tag]) -> std::io::Result<MoveOp> {
        let mut parts = self.parts.clone();
        apply_tag_edits(&mut parts, add, remove, &self.config)?;
        Ok(MoveOp {
            from: self.path.clone(),
            to: parts.to_path(&self.config),
        })
    }
}

pub struct TaggerBuilder {
    overrides: ConfigOverrides,
    dry_run: bool,
}

impl Default for TaggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TaggerBuilder {
    pub fn new() -> Self {
        Self {
            overrides: ConfigOverrides::default(),
            dry_run: false,
        }
    }

    pub fn overrides(mut self, value: ConfigOverrides) -> Self {
        self.overrides = value;
        self
    }

    pub fn dry_run(mut self, value: bool) -> Self {
        self.dry_run = value;
        self
    }

    pub fn build(self) -> Tagger {
        Tagger {
            overrides: self.overrides,
            dry_run: self.dry_run,
        }
    }
}

/// Applies tag edits to files and renames them.
#[derive(Debug)]
pub struct Tagger {
    overrides: ConfigOverrides,
    dry_run: bool,
}

/// Outcome of retagging one file.
pub type Retagged = (PathBuf, Result<MoveOp, RetagError>);

impl Tagger {
    /// Add and remove tags on each of `files`.
    ///
    /// Every tag token is validated for every file first;
    /// an invalid token fails the whole batch
    /// before anything is renamed.
    /// After that,
    /// each file succeeds or fails on its own.
    pub fn retag<P, S>(
        &self,
        files: &[P],
        add: &[S],
        remove: &[S],
    ) -> Result<Vec<Retagged>, InvalidTagError>
    where
        P: AsRef<Path>,
        S: AsRef<str>,
    {
        let mut planned = Vec::with_capacity(files.len());
        for file in files {
            let file = file.as_ref();
            planned.push((
                file.to_owned(),
                match TaggedFile::open(file, &self.overrides) {
                    Ok(tagged) => {
                        let add = tagged.parse_tags(add)?;
                        let remove = tagged.parse_tags(remove)?;
                        Ok((tagged, add, remove))
                    }
                    Err(e) => Err(e),
                },
            ));
        }

        // Tokens are still checked when no file could be opened.
        if planned.iter().all(|(_, plan)| plan.is_err()) {
            let config = Config::without_root(&self.overrides);
            for token in add.iter().chain(remove) {
                Tag::new(token.as_ref().to_owned(), config.codec())?;
            }
        }

        Ok(planned
            .into_iter()
            .map(|(file, plan)| {
                let result = plan.map_err(RetagError::from).and_then(|(tagged, add, remove)| {
                    let op = tagged.retag(&add, &remove)?;
                    self.apply(&op)?;
                    Ok(op)
                });
                (file, result)
            })
            .collect())
    }

    fn apply(&self, op: &MoveOp) -> Result<(), RetagError> {
        if op.from == op.to {
            debug!("`{}` is already in place", op.from.display());
            return Ok(());
        }

        // This utility should only organize data,
        // never delete it.
        if op.to.try_exists()? {
            return Err(RetagError::DestinationExists(op.clone()));
        }

        info!("moving `{}` to `{}`", op.from.display(), op.to.display());
        if !self.dry_run {
            rename(&op.from, &op.to)?;
        }
        Ok(())
    }
}
