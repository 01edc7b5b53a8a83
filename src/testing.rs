use std::{
    fs::{create_dir_all, File},
    path::{Path, PathBuf},
};

use rustc_hash::FxHashSet;

use crate::{Config, ConfigOverrides, Settings, Tag, TagCodec, DEFAULT_TAG_DELIMS, MARKER_FILE};

pub fn codec() -> TagCodec {
    TagCodec::new(DEFAULT_TAG_DELIMS, true)
}

pub fn nocase_codec() -> TagCodec {
    TagCodec::new(DEFAULT_TAG_DELIMS, false)
}

pub fn tag(s: &str) -> Tag {
    Tag::new(s.to_owned(), &codec()).unwrap()
}

pub fn tags<'a>(xs: impl IntoIterator<Item = &'a str>) -> FxHashSet<Tag> {
    xs.into_iter().map(tag).collect()
}

/// Default settings modified by `f`.
pub fn config_with(f: impl FnOnce(&mut Settings)) -> Config {
    let mut settings = Settings::default();
    f(&mut settings);
    Config::new(None, settings)
}

/// `config` with directory tagging disabled.
pub fn no_dirs(config: &Config) -> Config {
    Config::new(
        config.root().cloned(),
        Settings {
            use_dirs: false,
            ..config.settings().clone()
        },
    )
}

pub fn with_temp_dir<F, R>(f: F) -> R
where
    F: FnOnce(&Path) -> R,
{
    let dir = tempfile::tempdir().unwrap();
    f(dir.path())
}

/// Run `f` in a tagged tree:
///
/// ```text
/// .tagdir
/// a/a_b_c
/// a/b/
/// a/c/
/// d/a/
/// f_g/a_b
/// ```
pub fn with_fixture<F, R>(f: F) -> R
where
    F: FnOnce(&Path, Config) -> R,
{
    with_temp_dir(|dir| {
        create_files_relative_to(
            dir,
            [MARKER_FILE, "a/a_b_c", "a/b/", "a/c/", "d/a/", "f_g/a_b"],
        );
        let config = Config::for_dir(dir, &ConfigOverrides::default());
        assert!(config.use_dirs());
        f(dir, config)
    })
}

/// Paths ending in `/` are created as directories.
pub fn create_files_relative_to<'a>(dir: &Path, paths: impl IntoIterator<Item = &'a str>) {
    for path in paths {
        if path.ends_with('/') {
            create_dir_all(dir.join(path)).unwrap();
        } else {
            let path = dir.join(path);
            create_dir_all(path.parent().unwrap()).unwrap();
            File::create(path).unwrap();
        }
    }
}

pub fn relative(root: &Path, path: PathBuf) -> String {
    path.strip_prefix(root)
        .unwrap()
        .to_str()
        .unwrap()
        .to_owned()
}

/// Files and empty directories under `root`,
/// relative to `root`,
/// sorted.
pub fn list_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut queue = read_paths(root);
    while let Some(file) = queue.pop() {
        if file.is_dir() && std::fs::read_dir(&file).unwrap().next().is_some() {
            queue.extend(read_paths(&file));
        } else {
            files.push(file.strip_prefix(root).unwrap().to_owned());
        }
    }
    files.sort();
    files
}

fn read_paths(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect()
}

pub fn no_tags() -> FxHashSet<Tag> {
    FxHashSet::default()
}
