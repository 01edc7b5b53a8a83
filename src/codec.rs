use std::borrow::Cow;

use regex::{Regex, RegexBuilder};
use rustc_hash::FxHashSet;

use crate::{Tag, TagRef};

/// Converts between path segments and the tags they carry.
#[derive(Clone, Debug)]
pub struct TagCodec {
    delims: String,
    /// `delims` as a regex character class.
    class: String,
    case_sensitive: bool,
}

impl TagCodec {
    /// `delims` must be non-empty.
    pub fn new(delims: &str, case_sensitive: bool) -> Self {
        debug_assert!(!delims.is_empty());
        let mut seen = FxHashSet::default();
        let delims: String = delims.chars().filter(|c| seen.insert(*c)).collect();
        Self {
            class: format!("[{}]", regex::escape(&delims)),
            delims,
            case_sensitive,
        }
    }

    pub fn delims(&self) -> &str {
        &self.delims
    }

    pub fn is_delim(&self, c: char) -> bool {
        self.delims.contains(c)
    }

    pub fn is_valid_tag(&self, tag: &str) -> bool {
        !tag.is_empty() && !tag.chars().any(|c| self.is_delim(c))
    }

    /// Split `segment` into its tags,
    /// lowercased when matching is case-insensitive.
    pub fn extract_tags(&self, segment: &str) -> FxHashSet<Tag> {
        segment
            .split(|c| self.is_delim(c))
            .filter(|s| !s.is_empty())
            .map(|s| {
                Tag::new_unchecked(if self.case_sensitive {
                    s.to_owned()
                } else {
                    s.to_lowercase()
                })
            })
            .collect()
    }

    /// Whether `tag` is a complete token of `segment`.
    pub fn has_tag<T>(&self, segment: &str, tag: T) -> bool
    where
        T: AsRef<TagRef>,
    {
        let tag = self.normalize(tag.as_ref());
        segment
            .split(|c| self.is_delim(c))
            .any(|token| match self.case_sensitive {
                true => token == tag.as_str(),
                false => token.to_lowercase() == tag.as_str(),
            })
    }

    /// The form of `tag` used when searching for it.
    pub(crate) fn normalize<'a>(&self, tag: &'a TagRef) -> Cow<'a, TagRef> {
        if self.case_sensitive {
            Cow::Borrowed(tag)
        } else {
            Cow::Owned(Tag::new_unchecked(tag.as_str().to_lowercase()))
        }
    }

    /// Matches `tag` at the start, end, or between delimiters,
    /// consuming adjacent delimiters.
    /// Compiled per call,
    /// so keep it out of per-file loops.
    pub(crate) fn edge_regex(&self, tag: &TagRef) -> Regex {
        self.build(&format!(
            "(?:^|{class}){tag}(?:$|{class})",
            class = self.class,
            tag = regex::escape(tag.as_str())
        ))
    }

    /// Matches `tag` followed by a delimiter.
    /// Callers must check the match is preceded by a delimiter.
    pub(crate) fn interior_regex(&self, tag: &TagRef) -> Regex {
        self.build(&format!(
            "{tag}{class}",
            class = self.class,
            tag = regex::escape(tag.as_str())
        ))
    }

    fn build(&self, pattern: &str) -> Regex {
        RegexBuilder::new(pattern)
            .case_insensitive(!self.case_sensitive)
            .build()
            .expect("escaped tag patterns should compile")
    }
}
