mod codec;
mod config;
mod fs;
mod path_parts;
mod resolve;
mod root;
mod select;
mod tag;
mod tagger;

#[cfg(test)]
mod testing;

pub use crate::{
    codec::TagCodec,
    config::{Config, ConfigOverrides, Settings},
    path_parts::{PathParts, PathPartsError},
    resolve::{add_tag, apply_tag_edits, find_best_path, remove_tag, resolve_directories},
    root::Root,
    select::{coarse_match, matches, select, Operation, OperationKind},
    tag::{InvalidTagError, Tag, TagRef},
    tagger::{MoveOp, OpenError, RetagError, Retagged, TaggedFile, Tagger, TaggerBuilder},
};

/// Name of the file marking the root of a tagged directory tree.
pub const MARKER_FILE: &str = ".tagdir";
/// Table of the marker file holding settings.
pub const MARKER_SECTION: &str = "tagdir";

pub const DEFAULT_TAG_DELIMS: &str = " ,_&=.-+()[]{}/\\";
pub const DEFAULT_DELIM: char = '_';
pub const NO_TAGS_FILENAME: &str = "unknown";

pub const ADD_PREFIX: char = '+';
pub const REMOVE_PREFIX: char = '-';
