use std::path::Path;

use tracing::{debug, warn};

use crate::{
    Root, TagCodec, DEFAULT_DELIM, DEFAULT_TAG_DELIMS, MARKER_SECTION, NO_TAGS_FILENAME,
};

const USE_DIRS: &str = "use_dirs";
const TAG_DELIMS: &str = "tag_delims";
const DEFAULT_DELIM_KEY: &str = "default_delim";
const NO_TAGS_FILENAME_KEY: &str = "no_tags_filename";
const CASE_SENSITIVE: &str = "case_sensitive";

/// Raw tagging settings,
/// as read from a marker file
/// or given by a caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub use_dirs: bool,
    pub tag_delims: String,
    pub default_delim: char,
    pub no_tags_filename: String,
    pub case_sensitive: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            use_dirs: false,
            tag_delims: DEFAULT_TAG_DELIMS.to_owned(),
            default_delim: DEFAULT_DELIM,
            no_tags_filename: NO_TAGS_FILENAME.to_owned(),
            case_sensitive: true,
        }
    }
}

/// Settings given explicitly by a caller.
/// These take precedence over marker-file settings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub use_dirs: Option<bool>,
    pub tag_delims: Option<String>,
    pub default_delim: Option<char>,
    pub no_tags_filename: Option<String>,
    pub case_sensitive: Option<bool>,
}

impl ConfigOverrides {
    fn apply(&self, settings: &mut Settings) {
        if let Some(use_dirs) = self.use_dirs {
            settings.use_dirs = use_dirs;
        }
        if let Some(tag_delims) = &self.tag_delims {
            settings.tag_delims = tag_delims.clone();
        }
        if let Some(default_delim) = self.default_delim {
            settings.default_delim = default_delim;
        }
        if let Some(no_tags_filename) = &self.no_tags_filename {
            settings.no_tags_filename = no_tags_filename.clone();
        }
        if let Some(case_sensitive) = self.case_sensitive {
            settings.case_sensitive = case_sensitive;
        }
    }
}

/// Immutable snapshot of the settings for one operation.
#[derive(Clone, Debug)]
pub struct Config {
    root: Option<Root>,
    settings: Settings,
    codec: TagCodec,
}

impl Default for Config {
    fn default() -> Self {
        Self::new(None, Settings::default())
    }
}

impl Config {
    /// Directory tagging is only enabled when `root` is given.
    /// Unusable settings fall back to defaults,
    /// and `default_delim` is always a delimiter.
    pub fn new(root: Option<Root>, mut settings: Settings) -> Self {
        let defaults = Settings::default();
        if settings.tag_delims.is_empty() {
            warn!("`{TAG_DELIMS}` is empty, using default");
            settings.tag_delims = defaults.tag_delims;
        }
        if settings.no_tags_filename.is_empty() {
            warn!("`{NO_TAGS_FILENAME_KEY}` is empty, using default");
            settings.no_tags_filename = defaults.no_tags_filename;
        }
        if !settings.tag_delims.contains(settings.default_delim) {
            debug!(
                "adding `{}` to delimiters because it is the default delimiter",
                settings.default_delim
            );
            settings.tag_delims.push(settings.default_delim);
        }
        if settings.use_dirs && root.is_none() {
            debug!("directory tagging disabled, no root directory");
            settings.use_dirs = false;
        }

        Self {
            codec: TagCodec::new(&settings.tag_delims, settings.case_sensitive),
            root,
            settings,
        }
    }

    /// Resolve settings for files in `dir`.
    ///
    /// `dir` and its ancestors are searched for a marker file.
    /// If one is found,
    /// its directory becomes the root,
    /// directory tagging defaults to enabled,
    /// and its settings override defaults.
    /// `overrides` take precedence over both.
    pub fn for_dir<P>(dir: P, overrides: &ConfigOverrides) -> Self
    where
        P: AsRef<Path>,
    {
        let root = Root::from_child(dir);
        let mut settings = match &root {
            Some(root) => {
                debug!("found root `{}`", root.as_path().display());
                Settings::from_marker(root.marker())
            }
            None => Settings::default(),
        };
        overrides.apply(&mut settings);
        Self::new(root, settings)
    }

    /// Settings for files outside any tagged tree.
    pub fn without_root(overrides: &ConfigOverrides) -> Self {
        let mut settings = Settings::default();
        overrides.apply(&mut settings);
        Self::new(None, settings)
    }

    pub fn root(&self) -> Option<&Root> {
        self.root.as_ref()
    }

    pub fn use_dirs(&self) -> bool {
        self.settings.use_dirs
    }

    pub fn default_delim(&self) -> char {
        self.settings.default_delim
    }

    pub fn no_tags_filename(&self) -> &str {
        &self.settings.no_tags_filename
    }

    pub fn case_sensitive(&self) -> bool {
        self.settings.case_sensitive
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn codec(&self) -> &TagCodec {
        &self.codec
    }
}

impl Settings {
    /// Read settings from the marker file at `path`.
    ///
    /// Problems never fail:
    /// each unreadable key keeps its default.
    /// An empty marker file gives defaults
    /// with directory tagging enabled.
    pub fn from_marker(path: &Path) -> Self {
        let mut settings = Self {
            use_dirs: true,
            ..Self::default()
        };

        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("failed to read `{}`: {e}", path.display());
                return settings;
            }
        };

        for entry in section_entries(&contents, path) {
            match entry.key.as_str() {
                USE_DIRS => entry.read_bool(&mut settings.use_dirs),
                CASE_SENSITIVE => entry.read_bool(&mut settings.case_sensitive),
                TAG_DELIMS => match entry.value() {
                    s if !s.is_empty() => settings.tag_delims = s,
                    _ => entry.warn_invalid(),
                },
                DEFAULT_DELIM_KEY => {
                    let value = entry.value();
                    let mut chars = value.chars();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) => settings.default_delim = c,
                        _ => entry.warn_invalid(),
                    }
                }
                NO_TAGS_FILENAME_KEY => match entry.value() {
                    s if !s.is_empty() => settings.no_tags_filename = s,
                    _ => entry.warn_invalid(),
                },
                key => debug!("ignoring unknown setting `{key}`"),
            }
        }
        settings
    }
}

/// A `key = value` line of the marker section.
struct Entry<'a> {
    key: String,
    raw: &'a str,
    line: usize,
}

impl Entry<'_> {
    /// The value as text.
    ///
    /// Quoted values are unquoted and unescaped the TOML way.
    /// Anything else is taken verbatim.
    fn value(&self) -> String {
        match format!("value = {}", self.raw).parse::<toml::Table>() {
            Ok(mut table) => match table.remove("value") {
                Some(toml::Value::String(s)) => s,
                _ => self.raw.to_owned(),
            },
            Err(_) => self.raw.to_owned(),
        }
    }

    fn read_bool(&self, setting: &mut bool) {
        match self.value().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => *setting = true,
            "false" | "no" | "off" | "0" => *setting = false,
            _ => self.warn_invalid(),
        }
    }

    fn warn_invalid(&self) {
        warn!(
            "invalid value `{}` for `{}` on line {}, using default",
            self.raw, self.key, self.line
        );
    }
}

/// Entries of the marker section in `contents`,
/// in order.
///
/// Lines are read independently,
/// so a malformed line never hides the others.
fn section_entries<'a>(contents: &'a str, path: &Path) -> Vec<Entry<'a>> {
    let mut entries = Vec::new();
    let mut in_section = false;
    for (i, line) in contents.lines().enumerate() {
        let line_number = i + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(name) = line.strip_prefix('[') {
            match name.strip_suffix(']') {
                Some(name) => in_section = name.trim() == MARKER_SECTION,
                None => {
                    warn!(
                        "malformed section header on line {line_number} of `{}`",
                        path.display()
                    );
                    in_section = false;
                }
            }
            continue;
        }
        if !in_section {
            continue;
        }
        match line.find(|c: char| c == '=' || c == ':') {
            Some(i) if !line[..i].trim().is_empty() => entries.push(Entry {
                key: line[..i].trim().to_lowercase(),
                raw: line[i + 1..].trim(),
                line: line_number,
            }),
            _ => warn!(
                "ignoring malformed line {line_number} of `{}`",
                path.display()
            ),
        }
    }
    entries
}
