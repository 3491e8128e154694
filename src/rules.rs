use std::{collections::HashSet, sync::LazyLock};

use crate::matchers::{Matcher, standard_matchers};

static STANDARD: LazyLock<Rules> =
    LazyLock::new(|| Rules::new().expect("built-in matcher patterns are valid"));

/// Words kept lower case by title-casing unless they open the title.
pub const MINOR_WORDS: &[&str] = &[
    "a", "an", "and", "as", "at", "but", "by", "for", "in", "of", "on", "or", "the", "to", "via",
];

pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "mov", "avi", "webm", "wmv", "mpg", "mpeg", "m2ts",
];

pub const MUSIC_EXTENSIONS: &[&str] = &[
    "mp3", "flac", "3pg", "aac", "alac", "opus", "ogg", "wav", "wmv", "ape",
];

/// Series names shared by several shows; the year is appended to tell them apart.
pub const YEAR_SUFFIXED_SERIES: &[&str] = &["The Flash", "Doctor Who", "Magnum P.I.", "Charmed"];

/// Immutable lookup tables used while identifying a file.
#[derive(Debug)]
pub struct Rules {
    pub matchers: Vec<Matcher>,
    pub minor_words: HashSet<String>,
    pub video_extensions: HashSet<String>,
    pub music_extensions: HashSet<String>,
    pub year_suffixed_series: HashSet<String>,
}

fn owned(items: &[&str]) -> HashSet<String> {
    items.iter().map(|item| item.to_string()).collect()
}

fn normalize_extension(ext: &str) -> String {
    ext.trim_start_matches('.').to_lowercase()
}

impl Rules {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            matchers: standard_matchers()?,
            minor_words: owned(MINOR_WORDS),
            video_extensions: owned(VIDEO_EXTENSIONS),
            music_extensions: owned(MUSIC_EXTENSIONS),
            year_suffixed_series: owned(YEAR_SUFFIXED_SERIES),
        })
    }

    /// Shared instance built on first use.
    pub fn standard() -> &'static Rules {
        &STANDARD
    }

    /// Accepts extensions with or without the leading dot, in any case.
    pub fn is_video(&self, ext: &str) -> bool {
        self.video_extensions.contains(&normalize_extension(ext))
    }

    pub fn is_music(&self, ext: &str) -> bool {
        self.music_extensions.contains(&normalize_extension(ext))
    }

    pub fn is_minor_word(&self, word: &str) -> bool {
        self.minor_words.contains(word)
    }

    pub fn needs_year_suffix(&self, name: &str) -> bool {
        self.year_suffixed_series.contains(name)
    }
}
