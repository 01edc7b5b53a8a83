use std::path::{Path, PathBuf};

use itertools::Itertools;
use regex::Regex;
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::{fs::subdirs, Config, PathParts, Tag, TagCodec, TagRef};

/// Prepend `tag` to `stem`
/// unless `stem` already has it.
pub fn add_tag(tag: &TagRef, stem: &str, config: &Config) -> String {
    if config.codec().has_tag(stem, tag) {
        stem.to_owned()
    } else if stem.is_empty() {
        tag.to_string()
    } else {
        format!("{tag}{}{stem}", config.default_delim())
    }
}

/// Remove every occurrence of `tag` from `segment`.
///
/// Interior occurrences are removed first,
/// then leading and trailing ones.
/// Removing an edge can expose an interior occurrence at a new edge,
/// as in `a_a_b`.
pub fn remove_tag(tag: &TagRef, segment: &str, config: &Config) -> String {
    let codec = config.codec();
    let tag = codec.normalize(tag);
    let segment = remove_interior(&codec.interior_regex(&tag), segment, codec);
    codec.edge_regex(&tag).replace_all(&segment, "").into_owned()
}

/// Remove matches of `interior`
/// preceded by a delimiter in `segment`,
/// leaving the preceding delimiter in place.
fn remove_interior(interior: &Regex, segment: &str, codec: &TagCodec) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut kept_from = 0;
    let mut search_from = 0;
    while let Some(m) = interior.find_at(segment, search_from) {
        let follows_delim = segment[..m.start()]
            .chars()
            .next_back()
            .is_some_and(|c| codec.is_delim(c));
        if follows_delim {
            out.push_str(&segment[kept_from..m.start()]);
            kept_from = m.end();
            search_from = m.end();
        } else {
            // Matches are never empty.
            search_from = m.start()
                + segment[m.start()..]
                    .chars()
                    .next()
                    .map_or(1, char::len_utf8);
        }
    }
    out.push_str(&segment[kept_from..]);
    out
}

/// Find the directory under `start`
/// whose nested names encode the most of `wanted`.
///
/// Returns the directory
/// and the tags it could not encode.
/// Only directories whose tags are all wanted are descended into.
/// A candidate must leave strictly fewer tags than the best so far,
/// so ties go to whichever directory is listed first,
/// which depends on the filesystem.
///
/// Symlinked directory cycles are followed without limit.
pub fn find_best_path(
    start: &Path,
    wanted: &FxHashSet<Tag>,
    codec: &TagCodec,
) -> std::io::Result<(PathBuf, FxHashSet<Tag>)> {
    stacker::maybe_grow(32 * 1024, 1024 * 1024, || {
        let mut best_path = start.to_owned();
        let mut best_left = wanted.clone();

        for dir in subdirs(start)? {
            // Names that are not Unicode cannot hold tags.
            let Some(name) = dir.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            let dir_tags = codec.extract_tags(name);
            if dir_tags.iter().all(|tag| wanted.contains(tag)) {
                let next = wanted
                    .iter()
                    .filter(|tag| !dir_tags.contains(*tag))
                    .cloned()
                    .collect();
                let (path, left) = find_best_path(&dir, &next, codec)?;
                if left.len() < best_left.len() {
                    best_path = path;
                    best_left = left;
                }
            }
        }

        Ok((best_path, best_left))
    })
}

/// Move tags from the stem of `parts` into directories under the root,
/// wherever existing directories can encode them.
///
/// Does nothing unless directory tagging is enabled.
pub fn resolve_directories(parts: &mut PathParts, config: &Config) -> std::io::Result<()> {
    let Some(root) = config.root().filter(|_| config.use_dirs()) else {
        return Ok(());
    };

    let tags = parts.tags(config);
    let (path, left) = find_best_path(root.as_path(), &tags, config.codec())?;
    debug!(
        "best path for `{}` is `{}`, leaving `{}`",
        tags.iter().sorted().format(","),
        path.display(),
        left.iter().sorted().format(",")
    );

    // Tags must be removed while `parts` still has its old directory.
    for tag in tags.iter().filter(|tag| !left.contains(*tag)) {
        parts.remove_tag(tag, config);
    }
    parts.set_dir(
        path.strip_prefix(root.as_path())
            .expect("best path should be under root")
            .to_owned(),
    );
    // Tags in multi-tag directories may have been removed from the old directory.
    for tag in left.iter().sorted() {
        parts.add_tag(tag, config);
    }

    Ok(())
}

/// Remove tags,
/// then add tags in the order given,
/// then place the file in directories if enabled.
///
/// Each added tag is prepended,
/// so later tags end up closer to the front of the stem.
pub fn apply_tag_edits<A, R, T, U>(
    parts: &mut PathParts,
    add: A,
    remove: R,
    config: &Config,
) -> std::io::Result<()>
where
    A: IntoIterator<Item = T>,
    R: IntoIterator<Item = U>,
    T: AsRef<TagRef>,
    U: AsRef<TagRef>,
{
    for tag in remove {
        parts.remove_tag(tag, config);
    }
    for tag in add {
        parts.add_tag(tag, config);
    }

    resolve_directories(parts, config)?;

    if parts.stem().is_empty() {
        parts.set_stem(config.no_tags_filename().to_owned());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use proptest::prelude::*;
    use test_strategy::proptest;

    use crate::testing::*;

    use super::*;

    #[test]
    fn add_tag_prepends_tag() {
        let config = Config::default();
        assert_eq!(add_tag(&tag("z"), "a_b_c", &config), "z_a_b_c");
        assert_eq!(add_tag(&tag("z"), "", &config), "z");
    }

    #[test]
    fn add_tag_does_not_duplicate_tags() {
        let config = Config::default();
        assert_eq!(add_tag(&tag("a"), "a_b_c", &config), "a_b_c");
        assert_eq!(add_tag(&tag("b"), "a_b_c", &config), "a_b_c");
        assert_eq!(add_tag(&tag("a"), "ab_c", &config), "a_ab_c");
    }

    #[test]
    fn add_tag_accumulates_in_reverse_order() {
        let config = Config::default();
        let stem = ["x", "y", "z"]
            .into_iter()
            .fold("a_b_c".to_owned(), |stem, t| add_tag(&tag(t), &stem, &config));
        assert_eq!(stem, "z_y_x_a_b_c");
    }

    #[test]
    fn add_tag_uses_default_delimiter() {
        let config = config_with(|settings| settings.default_delim = '-');
        assert_eq!(add_tag(&tag("z"), "a", &config), "z-a");
    }

    #[proptest]
    fn add_tag_is_idempotent(
        #[strategy(TAG_REGEX)] t: String,
        #[strategy(SEGMENT_REGEX)] stem: String,
    ) {
        let config = Config::default();
        let t = tag(&t);
        let once = add_tag(&t, &stem, &config);
        prop_assert_eq!(add_tag(&t, &once, &config), once);
    }

    #[proptest]
    fn tags_added_to_an_empty_stem_are_extracted(
        #[strategy(proptest::collection::btree_set(TAG_REGEX, 0..6))] added: BTreeSet<String>,
    ) {
        let config = Config::default();
        let stem = added
            .iter()
            .fold(String::new(), |stem, t| add_tag(&tag(t), &stem, &config));
        prop_assert_eq!(
            config.codec().extract_tags(&stem),
            added.iter().map(|t| tag(t)).collect::<FxHashSet<_>>()
        );
    }

    #[test]
    fn remove_tag_removes_leading_interior_and_trailing_tags() {
        let config = Config::default();
        assert_eq!(remove_tag(&tag("a"), "a_b_c", &config), "b_c");
        assert_eq!(remove_tag(&tag("b"), "a_b_c", &config), "a_c");
        assert_eq!(remove_tag(&tag("c"), "a_b_c", &config), "a_b");
        assert_eq!(remove_tag(&tag("a"), "a", &config), "");
    }

    #[test]
    fn remove_tag_removes_adjacent_duplicates() {
        let config = Config::default();
        assert_eq!(remove_tag(&tag("a"), "a_a_b", &config), "b");
        assert_eq!(remove_tag(&tag("a"), "b_a_a", &config), "b");
        assert_eq!(remove_tag(&tag("a"), "b_a_a_c", &config), "b_c");
    }

    #[test]
    fn remove_tag_ignores_partial_tokens() {
        let config = Config::default();
        assert_eq!(remove_tag(&tag("a"), "ab_ba_cab", &config), "ab_ba_cab");
        assert_eq!(remove_tag(&tag("ab"), "ab_ba_cab", &config), "ba_cab");
    }

    #[test]
    fn remove_tag_keeps_other_delimiters() {
        let config = Config::default();
        assert_eq!(remove_tag(&tag("b"), "a-b.c", &config), "a-c");
        assert_eq!(remove_tag(&tag("a"), "a b", &config), "b");
    }

    #[test]
    fn remove_tag_matches_case_insensitively_without_recasing() {
        let config = config_with(|settings| settings.case_sensitive = false);
        assert_eq!(remove_tag(&tag("A"), "X_a_Y", &config), "X_Y");
        assert_eq!(remove_tag(&tag("b"), "Foo_B", &config), "Foo");

        let config = Config::default();
        assert_eq!(remove_tag(&tag("A"), "X_a_Y", &config), "X_a_Y");
    }

    #[test]
    fn find_best_path_finds_directories() {
        with_fixture(|root, config| {
            let codec = config.codec();
            assert_eq!(
                find_best_path(root, &tags(["a"]), codec).unwrap(),
                (root.join("a"), no_tags())
            );
            assert_eq!(
                find_best_path(root, &tags(["a", "b"]), codec).unwrap(),
                (root.join("a/b"), no_tags())
            );
            assert_eq!(
                find_best_path(root, &tags(["a", "d"]), codec).unwrap(),
                (root.join("d/a"), no_tags())
            );
        })
    }

    #[test]
    fn find_best_path_falls_back_to_start() {
        with_fixture(|root, config| {
            let codec = config.codec();
            assert_eq!(
                find_best_path(root, &tags(["e"]), codec).unwrap(),
                (root.to_owned(), tags(["e"]))
            );
            assert_eq!(
                find_best_path(root, &tags(["b"]), codec).unwrap(),
                (root.to_owned(), tags(["b"]))
            );
            assert_eq!(
                find_best_path(root, &tags(["b", "c"]), codec).unwrap(),
                (root.to_owned(), tags(["b", "c"]))
            );
        })
    }

    #[test]
    fn find_best_path_leaves_unmatched_tags() {
        with_fixture(|root, config| {
            let codec = config.codec();
            assert_eq!(
                find_best_path(root, &tags(["f", "g", "x"]), codec).unwrap(),
                (root.join("f_g"), tags(["x"]))
            );
            assert_eq!(
                find_best_path(root, &tags(["b", "d"]), codec).unwrap(),
                (root.join("d"), tags(["b"]))
            );
        })
    }

    #[test]
    fn find_best_path_skips_directories_with_unwanted_tags() {
        with_fixture(|root, config| {
            assert_eq!(
                find_best_path(root, &tags(["f", "a", "b"]), config.codec()).unwrap(),
                (root.join("a/b"), tags(["f"]))
            );
        })
    }

    #[test]
    fn find_best_path_breaks_ties_by_listing_order() {
        with_fixture(|root, config| {
            let found = find_best_path(root, &tags(["a", "b", "c"]), config.codec()).unwrap();
            assert!(
                found == (root.join("a/b"), tags(["c"])) || found == (root.join("a/c"), tags(["b"])),
                "{found:?}"
            );
        })
    }

    #[test]
    fn find_best_path_errors_on_missing_start() {
        with_fixture(|root, config| {
            assert!(find_best_path(&root.join("missing"), &tags(["a"]), config.codec()).is_err());
        })
    }

    #[test]
    fn find_best_path_does_not_change_the_tree() {
        with_fixture(|root, config| {
            let before = list_files(root);
            find_best_path(root, &tags(["a", "b", "c", "d", "f", "g"]), config.codec()).unwrap();
            assert_eq!(list_files(root), before);
        })
    }

    #[test]
    fn apply_tag_edits_adds_tags_to_name() {
        with_fixture(|root, config| {
            let config = no_dirs(&config);
            let edit = |add: &[&str], remove: &[&str]| {
                let mut parts = PathParts::new(root.join("a/a_b_c"), &config).unwrap();
                apply_tag_edits(
                    &mut parts,
                    add.iter().map(|t| tag(t)),
                    remove.iter().map(|t| tag(t)),
                    &config,
                )
                .unwrap();
                relative(root, parts.to_path(&config))
            };
            assert_eq!(edit(&["a"], &[]), "a/a_b_c");
            assert_eq!(edit(&["z"], &[]), "a/z_a_b_c");
            assert_eq!(edit(&["z", "a"], &[]), "a/z_a_b_c");
            assert_eq!(edit(&["x", "y", "z"], &[]), "a/z_y_x_a_b_c");
        })
    }

    #[test]
    fn apply_tag_edits_removes_tags_from_name() {
        with_fixture(|root, config| {
            let config = no_dirs(&config);
            let edit = |remove: &[&str]| {
                let mut parts = PathParts::new(root.join("a/a_b_c"), &config).unwrap();
                apply_tag_edits(&mut parts, Vec::<Tag>::new(), remove.iter().map(|t| tag(t)), &config)
                    .unwrap();
                relative(root, parts.to_path(&config))
            };
            assert_eq!(edit(&["a"]), "a/b_c");
            assert_eq!(edit(&["b"]), "a/a_c");
            assert_eq!(edit(&["c"]), "a/a_b");
            assert_eq!(edit(&["a", "b"]), "a/c");
            assert_eq!(edit(&["b", "c"]), "a/a");
            assert_eq!(edit(&["a", "b", "c"]), "a/unknown");
        })
    }

    #[test]
    fn apply_tag_edits_adds_tags_with_dirs() {
        with_fixture(|root, config| {
            let found = edit_with_dirs(root, &config, "a/a_b_c", &["a"], &[]);
            assert!(found == "a/b/c" || found == "a/c/b", "{found}");

            let found = edit_with_dirs(root, &config, "a/a_b_c", &["f"], &[]);
            assert!(found == "a/b/f_c" || found == "a/c/f_b", "{found}");
        })
    }

    #[test]
    fn apply_tag_edits_removes_tags_with_dirs() {
        with_fixture(|root, config| {
            let edit = |file, remove: &[&str]| edit_with_dirs(root, &config, file, &[], remove);
            assert_eq!(edit("a/a_b_c", &["a"]), "b_c");
            assert_eq!(edit("f_g/a_b", &["a"]), "f_g/b");
            assert_eq!(edit("f_g/a_b", &["f", "g"]), "a/b/unknown");
            assert_eq!(edit("a/a_b_c", &["c"]), "a/b/unknown");
        })
    }

    #[test]
    fn apply_tag_edits_splits_multi_tag_dirs() {
        with_fixture(|root, config| {
            let edit = |file, remove: &[&str]| edit_with_dirs(root, &config, file, &[], remove);
            assert_eq!(edit("f_g/a_b", &["f"]), "a/b/g");
            assert_eq!(edit("f_g/a_b", &["g"]), "a/b/f");
            assert_eq!(edit("f_g/a_b", &["f", "a"]), "g_b");
            assert_eq!(edit("f_g/a_b", &["f", "b"]), "a/g");
        })
    }

    #[test]
    fn apply_tag_edits_without_edits_still_resolves_dirs() {
        with_fixture(|root, config| {
            let found = edit_with_dirs(root, &config, "f_g/a_b", &[], &[]);
            assert!(found == "f_g/a_b" || found == "a/b/g_f", "{found}");
            assert_eq!(edit_with_dirs(root, &config, "d/a/x", &[], &[]), "d/a/x");
        })
    }

    fn edit_with_dirs(
        root: &Path,
        config: &Config,
        file: &str,
        add: &[&str],
        remove: &[&str],
    ) -> String {
        let mut parts = PathParts::new(root.join(file), config).unwrap();
        apply_tag_edits(
            &mut parts,
            add.iter().map(|t| tag(t)),
            remove.iter().map(|t| tag(t)),
            config,
        )
        .unwrap();
        relative(root, parts.to_path(config))
    }

    const TAG_REGEX: &str = "[a-zA-Z0-9]{1,8}";
    const SEGMENT_REGEX: &str = "[a-z0-9_.-]{0,24}";
}
