use core::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::{clean::clean_title, episode::EpisodeInfo, rules::Rules};

pub const DEFAULT_MOVIE_FORMAT: &str = "{n} ({y})/{n} ({y}) {r}";
pub const DEFAULT_SERIES_FORMAT: &str = "{n}/Season {s}/{n} - S{s}E{e} {x}";
pub const DEFAULT_LANGUAGE: &str = "en-US";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Movie,
    Series,
    Music,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Movie => "Movie",
            ContentType::Series => "TV Show",
            ContentType::Music => "Music",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Caller supplied settings that steer identification and naming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub lookup: bool,
    pub force_movie: bool,
    pub force_series: bool,
    pub movie_format: String,
    pub series_format: String,
    pub language: String,
    pub dry_run: bool,
    /// Set when the file name being parsed stands in for another file.
    pub original_file: Option<PathBuf>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            lookup: false,
            force_movie: false,
            force_series: false,
            movie_format: DEFAULT_MOVIE_FORMAT.to_string(),
            series_format: DEFAULT_SERIES_FORMAT.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            dry_run: false,
            original_file: None,
        }
    }
}

/// Everything learned about one media file from its name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFile {
    pub file_path: PathBuf,
    pub file_name: String,
    /// Extension including the leading dot, as written on disk.
    pub extension: String,
    pub year: Option<String>,
    pub season: Option<String>,
    pub episode: Option<String>,
    pub episode_name: Option<String>,
    pub resolution: Option<String>,
    pub quality: Option<String>,
    pub audio: Option<String>,
    pub codec: Option<String>,
    pub release_group: Option<String>,
    pub anime_group: Option<String>,
    pub clean_name: String,
    pub external_id: Option<u64>,
    pub external_name: Option<String>,
    pub content_type: Option<ContentType>,
    pub original_file: Option<PathBuf>,
    pub(crate) year_as_season: bool,
}

enum Attempt {
    Finished(ParsedFile),
    Inconclusive(ParsedFile),
}

/// Splits a path into its base name without extension and the extension
/// with its dot.
fn split_file_name(path: &Path) -> (String, String) {
    let file_name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    (file_name, extension)
}

/// A file name built from the parent directory, e.g. `Show.S01E01/abc.mkv`
/// becomes `Show.S01E01.mkv`.
fn parent_substitute(path: &Path, extension: &str) -> Option<PathBuf> {
    let parent = path.parent()?.file_name()?.to_string_lossy();
    Some(PathBuf::from(format!("{}{}", parent, extension)))
}

impl ParsedFile {
    /// Identifies `path` using the built-in rules.
    pub fn parse(path: &Path, options: &Options) -> Self {
        Self::parse_with(path, options, Rules::standard())
    }

    /// Identifies `path`. When the name alone says nothing useful, the parent
    /// directory name is tried once in its place.
    pub fn parse_with(path: &Path, options: &Options, rules: &Rules) -> Self {
        debug!(?options, "parsing file name with options");
        let file = match Self::attempt(path, options.original_file.as_deref(), options, rules) {
            Attempt::Finished(file) => return file,
            Attempt::Inconclusive(file) => file,
        };

        if file.original_file.is_some() {
            return file;
        }
        let Some(substitute) = parent_substitute(path, &file.extension) else {
            return file;
        };

        warn!(
            file = %file.file_name,
            file_path = %path.display(),
            parent = %substitute.display(),
            "nothing sensible found, trying again with parent"
        );
        match Self::attempt(&substitute, Some(path), options, rules) {
            Attempt::Finished(file) | Attempt::Inconclusive(file) => file,
        }
    }

    fn attempt(
        path: &Path,
        original_file: Option<&Path>,
        options: &Options,
        rules: &Rules,
    ) -> Attempt {
        let (file_name, extension) = split_file_name(path);
        let mut file = ParsedFile {
            file_path: path.to_path_buf(),
            file_name,
            extension,
            original_file: original_file.map(Path::to_path_buf),
            ..Default::default()
        };
        debug!(file = %file.file_name, "checking file");

        if !rules.is_video(&file.extension) {
            if rules.is_music(&file.extension) {
                file.content_type = Some(ContentType::Music);
            }
            return Attempt::Finished(file);
        }

        let name = file.file_name.clone();
        for matcher in &rules.matchers {
            matcher.extract(&name, &mut file);
        }
        debug!(
            year = ?file.year,
            season = ?file.season,
            episode = ?file.episode,
            "pre-parsing done, initial result"
        );

        file.content_type = file.classify(options);
        file.clean_name = clean_title(
            &name,
            file.content_type,
            file.anime_group.is_some(),
            rules,
        );

        if file.content_type.is_some() {
            Attempt::Finished(file)
        } else {
            Attempt::Inconclusive(file)
        }
    }

    /// Decides between movie and series from the extracted tokens. The first
    /// rule that applies wins.
    fn classify(&mut self, options: &Options) -> Option<ContentType> {
        if options.force_movie {
            self.episode = None;
            self.season = None;
            self.year_as_season = false;
            debug!("identified file as a movie (forced)");
            return Some(ContentType::Movie);
        }
        if options.force_series {
            debug!("identified file as a series (forced)");
            return Some(ContentType::Series);
        }
        // A season always means episodic content; an episode alone does not.
        if self.season.is_some() {
            debug!("identified file as an episode (has season)");
            return Some(ContentType::Series);
        }
        if self.year.is_some() {
            if let Some(episode) = self.episode.take() {
                // Known heuristic limitation: a title with a bare two digit
                // number next to a year loses that number here.
                debug!(
                    false_positive_episode = %episode,
                    year = ?self.year,
                    "identified file as movie, cleared false positive episode"
                );
            } else {
                debug!("identified file as a movie (has year, no episode)");
            }
            return Some(ContentType::Movie);
        }
        None
    }

    /// Applies the per-title overrides that only make sense once the final
    /// name is known.
    pub(crate) fn finalize(&mut self, rules: &Rules) {
        if let Some(year) = &self.year {
            if rules.needs_year_suffix(&self.clean_name) {
                debug!(
                    year = %year,
                    name = %self.clean_name,
                    "series name is shared by several shows, adding the year"
                );
                self.clean_name = format!("{} ({})", self.clean_name, year);
            }
        }
        self.clean_name = self.clean_name.replace(':', "");
    }

    pub fn is_movie(&self) -> bool {
        self.content_type == Some(ContentType::Movie)
    }

    pub fn is_series(&self) -> bool {
        self.content_type == Some(ContentType::Series)
    }

    pub fn is_music(&self) -> bool {
        self.content_type == Some(ContentType::Music)
    }

    /// True while the season field holds a broadcast year instead of an ordinal.
    pub fn has_year_as_season(&self) -> bool {
        self.year_as_season
    }

    /// The file to act on: the original file when this record came from the
    /// parent directory fallback.
    pub fn source_path(&self) -> &Path {
        self.original_file.as_deref().unwrap_or(&self.file_path)
    }

    /// File name with extension, without directories.
    pub fn full_name(&self) -> String {
        format!("{}{}", self.file_name, self.extension)
    }

    pub fn season_number(&self) -> Option<u32> {
        self.season.as_deref()?.parse().ok()
    }

    pub fn episode_info(&self) -> Option<EpisodeInfo> {
        EpisodeInfo::parse(self.episode.as_deref()?).ok()
    }

    /// First episode number, for single lookups.
    pub fn episode_number(&self) -> Option<u32> {
        self.episode_info().map(|info| info.first())
    }
}

impl fmt::Display for ParsedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = |value: &Option<String>| value.clone().unwrap_or_default();
        write!(
            f,
            "Year: {}, Season: {}, Episode: {}, EpisodeName: {}, Name: {}, Movie: {}, Series: {}",
            field(&self.year),
            field(&self.season),
            field(&self.episode),
            field(&self.episode_name),
            self.clean_name,
            self.is_movie(),
            self.is_series()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(path: &str) -> ParsedFile {
        ParsedFile::parse(Path::new(path), &Options::default())
    }

    #[test]
    fn test_parse_series() {
        let cases = [
            ("The.Flash.2014.S06E07.720p.HDTV.x264-SVA.mkv", "06", "07", Some("2014"), "The Flash"),
            ("Downton Abbey 5x06 HDTV x264-FoV [eztv].mkv", "05", "06", None, "Downton Abbey"),
            ("Breaking.Bad.S01E05.mkv", "01", "05", None, "Breaking Bad"),
            ("Spidey.S01E22E23.mkv", "01", "22-23", None, "Spidey"),
            ("Series.S02E10-E11.mkv", "02", "10-11", None, "Series"),
            ("Game of Thrones (2011) S08E06 720p.mkv", "08", "06", Some("2011"), "Game of Thrones"),
        ];

        for (path, season, episode, year, name) in cases {
            let file = parse(path);
            assert!(file.is_series(), "{path} should be a series: {file}");
            assert_eq!(file.season.as_deref(), Some(season), "{path}");
            assert_eq!(file.episode.as_deref(), Some(episode), "{path}");
            assert_eq!(file.year.as_deref(), year, "{path}");
            assert_eq!(file.clean_name, name, "{path}");
        }
    }

    #[test]
    fn test_parse_movies() {
        let cases = [
            ("The Matrix Revolutions - 2003.mkv", "2003", "The Matrix Revolutions"),
            ("Avatar (2009) 1080p.mkv", "2009", "Avatar"),
            ("Inception.2010.1080p.BluRay.x264.mkv", "2010", "Inception"),
            ("Movie Title 2020.mkv", "2020", "Movie Title"),
        ];

        for (path, year, name) in cases {
            let file = parse(path);
            assert!(file.is_movie(), "{path} should be a movie: {file}");
            assert_eq!(file.year.as_deref(), Some(year), "{path}");
            assert_eq!(file.clean_name, name, "{path}");
            assert_eq!(file.season, None, "{path}");
            assert_eq!(file.episode, None, "{path}");
        }
    }

    #[test]
    fn test_year_with_episode_but_no_season_is_movie() {
        let file = parse("Movie.Title.2010.E05.mkv");
        assert!(file.is_movie(), "{file}");
        assert_eq!(file.year.as_deref(), Some("2010"));
        assert_eq!(file.episode, None);
        assert_eq!(file.season, None);
        assert_eq!(file.clean_name, "Movie Title");
    }

    #[test]
    fn test_parse_movie_release_tags() {
        let file = parse("Inception.2010.1080p.BluRay.x264.mkv");
        assert_eq!(file.resolution.as_deref(), Some("1080p"));
        assert_eq!(file.quality.as_deref(), Some("BluRay"));
        assert_eq!(file.codec.as_deref(), Some("x264"));
    }

    #[test]
    fn test_year_as_season_without_lookup() {
        let file = parse("Mythbusters.S2005E03.Brown.Note.mkv");
        assert!(file.is_series());
        assert!(file.has_year_as_season());
        assert_eq!(file.season.as_deref(), Some("2005"));
        assert_eq!(file.episode.as_deref(), Some("03"));
        assert_eq!(file.year, None);
        assert_eq!(file.clean_name, "Mythbusters");
    }

    #[test]
    fn test_anime_release() {
        let file = parse("[Group] Series - 01 [1080p].mkv");
        assert!(file.is_series());
        assert_eq!(file.season.as_deref(), Some("00"));
        assert_eq!(file.episode.as_deref(), Some("01"));
        assert_eq!(file.anime_group.as_deref(), Some("[Group]"));
        assert_eq!(file.clean_name, "Series");
    }

    #[test]
    fn test_force_movie_clears_episode_fields() {
        let options = Options {
            force_movie: true,
            ..Default::default()
        };
        let file = ParsedFile::parse(Path::new("This.Is.A.Series.S01E22.mkv"), &options);
        assert!(file.is_movie());
        assert!(!file.is_series());
        assert_eq!(file.season, None);
        assert_eq!(file.episode, None);
    }

    #[test]
    fn test_force_series() {
        let options = Options {
            force_series: true,
            ..Default::default()
        };
        let file = ParsedFile::parse(Path::new("Ambiguous.File.mkv"), &options);
        assert!(file.is_series());
        assert!(!file.is_movie());
        assert_eq!(file.clean_name, "Ambiguous File");
    }

    #[test]
    fn test_dry_run_does_not_affect_parsing() {
        let options = Options {
            dry_run: true,
            ..Default::default()
        };
        let file = ParsedFile::parse(Path::new("The.Flash.2014.S06E07.mkv"), &options);
        assert!(file.is_series());
    }

    #[test]
    fn test_parent_directory_fallback() {
        let path = "path/to/The.Flash.2014.S06E07.720p.HDTV.x264-SVA/jioasdjioasd9012.mkv";
        let file = parse(path);
        assert!(file.is_series());
        assert_eq!(file.clean_name, "The Flash");
        assert_eq!(file.season.as_deref(), Some("06"));
        assert_eq!(file.original_file.as_deref(), Some(Path::new(path)));
        assert_eq!(file.source_path(), Path::new(path));
        assert_eq!(file.extension, ".mkv");
    }

    #[test]
    fn test_fallback_happens_only_once() {
        let options = Options {
            original_file: Some(PathBuf::from("elsewhere/file.mkv")),
            ..Default::default()
        };
        let file = ParsedFile::parse(
            Path::new("Show.S01E01/jioasdjioasd9012.mkv"),
            &options,
        );
        assert_eq!(file.content_type, None);
        assert_eq!(file.file_name, "jioasdjioasd9012");
    }

    #[test]
    fn test_unclassified_without_parent() {
        let file = parse("The Godfather 1080p.mkv");
        assert_eq!(file.content_type, None);
        assert_eq!(file.original_file, None);
        assert_eq!(file.source_path(), Path::new("The Godfather 1080p.mkv"));
    }

    #[test]
    fn test_music_and_unknown_extensions() {
        let music = parse("Artist - Song.mp3");
        assert!(music.is_music());
        assert!(!music.is_movie() && !music.is_series());
        assert_eq!(music.clean_name, "");

        let other = parse("notes.S01E01.txt");
        assert_eq!(other.content_type, None);
        assert_eq!(other.season, None);
    }

    #[test]
    fn test_uppercase_extension_is_video() {
        let file = parse("Breaking.Bad.S01E05.MKV");
        assert!(file.is_series());
        assert_eq!(file.extension, ".MKV");
    }

    #[test]
    fn test_parse_is_deterministic() {
        let first = parse("The.Flash.2014.S06E07.720p.HDTV.x264-SVA.mkv");
        let second = parse("The.Flash.2014.S06E07.720p.HDTV.x264-SVA.mkv");
        assert_eq!(first, second);
    }

    #[test]
    fn test_numeric_accessors() {
        let file = parse("Spidey.S01E22E23.mkv");
        assert_eq!(file.season_number(), Some(1));
        assert_eq!(file.episode_number(), Some(22));
        assert_eq!(file.episode_info().map(|info| info.end), Some(23));
        assert_eq!(file.full_name(), "Spidey.S01E22E23.mkv");
    }

    #[test]
    fn test_finalize_adds_year_to_shared_names() {
        let mut file = parse("Doctor.Who.2005.S01E01.mkv");
        assert_eq!(file.clean_name, "Doctor Who");
        file.finalize(Rules::standard());
        assert_eq!(file.clean_name, "Doctor Who (2005)");
    }

    #[test]
    fn test_finalize_strips_colons() {
        let mut file = ParsedFile {
            clean_name: "Star Wars: A New Hope".to_string(),
            ..Default::default()
        };
        file.finalize(Rules::standard());
        assert_eq!(file.clean_name, "Star Wars A New Hope");
    }
}
