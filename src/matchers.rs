//! Ordered pattern matchers run against release names.
//!
//! Each [`Matcher`] pairs a regular expression with the field it fills and
//! with the way its hit is cut out of the title afterwards. The order of
//! [`standard_matchers`] is the precedence order: a field filled by an
//! earlier matcher is never overwritten by a later one.

use core::fmt;
use regex::{Captures, Regex};
use tracing::{debug, warn};

use crate::{episode::EpisodeInfo, video::ParsedFile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatcherKind {
    YearAsSeason,
    Year,
    Season,
    Episode,
    AnimeEpisode,
    AnimeGroup,
    Audio,
    Resolution,
    Quality,
    Codec,
    ReleaseGroup,
    Proper,
    Repack,
    Hardcoded,
    Extended,
    Internal,
}

impl MatcherKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatcherKind::YearAsSeason => "yearAsSeason",
            MatcherKind::Year => "year",
            MatcherKind::Season => "season",
            MatcherKind::Episode => "episode",
            MatcherKind::AnimeEpisode => "episodeAnime",
            MatcherKind::AnimeGroup => "groupAnime",
            MatcherKind::Audio => "audio",
            MatcherKind::Resolution => "resolution",
            MatcherKind::Quality => "quality",
            MatcherKind::Codec => "codec",
            MatcherKind::ReleaseGroup => "group",
            MatcherKind::Proper => "proper",
            MatcherKind::Repack => "repack",
            MatcherKind::Hardcoded => "hardcoded",
            MatcherKind::Extended => "extended",
            MatcherKind::Internal => "internal",
        }
    }

    /// Season and episode markers mean nothing inside a movie title, so they
    /// are left alone when a movie name is cleaned.
    pub fn is_episodic(&self) -> bool {
        matches!(
            self,
            MatcherKind::Season
                | MatcherKind::Episode
                | MatcherKind::AnimeEpisode
                | MatcherKind::AnimeGroup
        )
    }
}

impl fmt::Display for MatcherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What gets cut out of the title when a matcher hits during cleaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// Only the given capture group of the first hit.
    Group(usize),
    /// Every non-overlapping hit of the whole pattern.
    Every,
}

pub type Apply = fn(&mut ParsedFile, &Captures<'_>);

pub struct Matcher {
    pub kind: MatcherKind,
    pub regex: Regex,
    pub removal: Removal,
    apply: Apply,
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matcher")
            .field("kind", &self.kind)
            .field("regex", &self.regex.as_str())
            .field("removal", &self.removal)
            .finish()
    }
}

impl Matcher {
    pub fn new(
        kind: MatcherKind,
        pattern: &str,
        removal: Removal,
        apply: Apply,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            kind,
            regex: Regex::new(pattern)?,
            removal,
            apply,
        })
    }

    /// Runs the matcher against `name` and records what it found on `file`.
    pub fn extract(&self, name: &str, file: &mut ParsedFile) -> bool {
        let Some(caps) = self.regex.captures(name) else {
            return false;
        };
        debug!(matcher = %self.kind, token = &caps[0], "matcher hit");
        (self.apply)(file, &caps);
        true
    }

    /// Returns `text` with this matcher's hit replaced by a space, or `None`
    /// when nothing matched.
    pub fn strip(&self, text: &str) -> Option<String> {
        let caps = self.regex.captures(text)?;
        match self.removal {
            Removal::Group(index) => {
                let span = caps.get(index)?;
                let mut stripped = String::with_capacity(text.len());
                stripped.push_str(&text[..span.start()]);
                stripped.push(' ');
                stripped.push_str(&text[span.end()..]);
                Some(stripped)
            }
            Removal::Every => Some(self.regex.replace_all(text, " ").into_owned()),
        }
    }
}

fn padded(number: &str) -> String {
    format!("{:0>2}", number)
}

fn apply_year_as_season(file: &mut ParsedFile, caps: &Captures<'_>) {
    file.season = Some(caps[2].to_string());
    file.year_as_season = true;
}

fn apply_year(file: &mut ParsedFile, caps: &Captures<'_>) {
    if file.season.as_deref() == Some(&caps[2]) {
        warn!(
            year = &caps[2],
            "found a year that is the same as the season, ignoring it to avoid looking up the wrong year"
        );
        return;
    }
    file.year = Some(caps[2].to_string());
}

fn apply_season(file: &mut ParsedFile, caps: &Captures<'_>) {
    if file.season.is_some() {
        debug!("season already found earlier, skipping the normal season match");
        return;
    }
    file.season = Some(padded(&caps[2]));
}

fn apply_episode(file: &mut ParsedFile, caps: &Captures<'_>) {
    let raw = &caps[0];
    let episode = match EpisodeInfo::parse(&raw.to_uppercase()) {
        Ok(info) => info.padded(),
        Err(error) => {
            debug!(raw, %error, "could not parse episode string");
            padded(&caps[1])
        }
    };
    file.episode = Some(episode);
}

fn apply_anime_episode(file: &mut ParsedFile, caps: &Captures<'_>) {
    if file.episode.is_some() {
        return;
    }
    file.episode = Some(padded(&caps[1]));
    file.season = Some("00".to_string());
}

fn apply_anime_group(file: &mut ParsedFile, caps: &Captures<'_>) {
    file.anime_group = Some(caps[1].to_string());
}

fn apply_audio(file: &mut ParsedFile, caps: &Captures<'_>) {
    file.audio = Some(caps[0].to_string());
}

fn apply_resolution(file: &mut ParsedFile, caps: &Captures<'_>) {
    file.resolution = Some(caps[2].to_string());
}

fn apply_quality(file: &mut ParsedFile, caps: &Captures<'_>) {
    file.quality = Some(caps[1].to_string());
}

fn apply_codec(file: &mut ParsedFile, caps: &Captures<'_>) {
    file.codec = Some(caps[0].to_string());
}

fn apply_release_group(file: &mut ParsedFile, caps: &Captures<'_>) {
    let group = caps[2].trim();
    if !group.is_empty() {
        file.release_group = Some(group.to_string());
    }
}

// Tags that only need stripping from the title.
fn apply_nothing(_: &mut ParsedFile, _: &Captures<'_>) {}

/// The built-in matcher table, in precedence order.
pub fn standard_matchers() -> Result<Vec<Matcher>, regex::Error> {
    use MatcherKind::*;

    Ok(vec![
        Matcher::new(
            YearAsSeason,
            r"(?i)(s?([0-9]{4}))[EX]",
            Removal::Every,
            apply_year_as_season,
        )?,
        Matcher::new(
            Year,
            r"([\[\(]?((?:19[0-9]|20[012])[0-9])[\]\)]?)",
            Removal::Every,
            apply_year,
        )?,
        Matcher::new(
            Season,
            r"(?i)(s?([0-9]{1,2}))[EX]",
            Removal::Group(1),
            apply_season,
        )?,
        Matcher::new(
            Episode,
            r"(?i)[EX]([0-9]{2})(?:-?[EX]?([0-9]{2}))?",
            Removal::Group(0),
            apply_episode,
        )?,
        Matcher::new(
            AnimeEpisode,
            r"[-_ p.](\d{2})[-_ (v\[](\d{2})?",
            Removal::Every,
            apply_anime_episode,
        )?,
        Matcher::new(
            AnimeGroup,
            r"^(\[\w*\])\s(.*)\s-",
            Removal::Group(1),
            apply_anime_group,
        )?,
        Matcher::new(
            Audio,
            r"MP3|DD5\.?1|Dual[\- ]Audio|LiNE|DTS|AAC(?:\.?2\.0)?|AC3(?:\.5\.1)?",
            Removal::Every,
            apply_audio,
        )?,
        Matcher::new(
            Resolution,
            r"(?i)(([0-9]{3,4}p))",
            Removal::Every,
            apply_resolution,
        )?,
        Matcher::new(
            Quality,
            r"((?:PPV\.)?[HP]DTV|(?:HD)?CAM|B[DR]Rip|(?:HD-?)?TS|(?:PPV )?WEB-?DL(?: DVDRip)?|HDRip|DVDRip|DVDRIP|CamRip|W[EB]BRip|BluRay|DvDScr|hdtv|telesync)",
            Removal::Every,
            apply_quality,
        )?,
        Matcher::new(
            Codec,
            r"(?i)xvid|x264|x265|h265|h\.?264|h\.?265",
            Removal::Every,
            apply_codec,
        )?,
        Matcher::new(
            ReleaseGroup,
            r"(- ?([^-]+(?:-=\{[^-]+-?$)?))$",
            Removal::Every,
            apply_release_group,
        )?,
        Matcher::new(Proper, r"PROPER", Removal::Every, apply_nothing)?,
        Matcher::new(Repack, r"REPACK", Removal::Every, apply_nothing)?,
        Matcher::new(Hardcoded, r"HC", Removal::Every, apply_nothing)?,
        Matcher::new(
            Extended,
            r"(EXTENDED(:?.CUT)?)",
            Removal::Every,
            apply_nothing,
        )?,
        Matcher::new(Internal, r"(?i)INTERNAL", Removal::Every, apply_nothing)?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(kind: MatcherKind) -> Matcher {
        standard_matchers()
            .unwrap()
            .into_iter()
            .find(|m| m.kind == kind)
            .unwrap()
    }

    fn extract(kind: MatcherKind, name: &str) -> ParsedFile {
        let mut file = ParsedFile::default();
        matcher(kind).extract(name, &mut file);
        file
    }

    #[test]
    fn test_standard_order() {
        let kinds: Vec<_> = standard_matchers()
            .unwrap()
            .iter()
            .map(|m| m.kind.as_str())
            .collect();
        assert_eq!(
            kinds,
            vec![
                "yearAsSeason",
                "year",
                "season",
                "episode",
                "episodeAnime",
                "groupAnime",
                "audio",
                "resolution",
                "quality",
                "codec",
                "group",
                "proper",
                "repack",
                "hardcoded",
                "extended",
                "internal",
            ]
        );
    }

    #[test]
    fn test_year_as_season() {
        let file = extract(MatcherKind::YearAsSeason, "Mythbusters.S2005E03.Brown.Note");
        assert_eq!(file.season.as_deref(), Some("2005"));
        assert!(file.year_as_season);
    }

    #[test]
    fn test_year_in_brackets() {
        let file = extract(MatcherKind::Year, "Game of Thrones (2011) S08E06 720p");
        assert_eq!(file.year.as_deref(), Some("2011"));
    }

    #[test]
    fn test_year_equal_to_season_is_ignored() {
        let mut file = ParsedFile {
            season: Some("2005".to_string()),
            ..Default::default()
        };
        matcher(MatcherKind::Year).extract("Mythbusters.S2005E03", &mut file);
        assert_eq!(file.year, None);
    }

    #[test]
    fn test_season_is_padded() {
        let file = extract(MatcherKind::Season, "Downton Abbey 5x06 HDTV");
        assert_eq!(file.season.as_deref(), Some("05"));
    }

    #[test]
    fn test_season_does_not_overwrite() {
        let mut file = ParsedFile {
            season: Some("2005".to_string()),
            ..Default::default()
        };
        matcher(MatcherKind::Season).extract("Mythbusters.S2005E03", &mut file);
        assert_eq!(file.season.as_deref(), Some("2005"));
    }

    #[test]
    fn test_episode_single_and_range() {
        assert_eq!(
            extract(MatcherKind::Episode, "Breaking.Bad.S01E05").episode.as_deref(),
            Some("05")
        );
        assert_eq!(
            extract(MatcherKind::Episode, "Spidey.S01E22E23").episode.as_deref(),
            Some("22-23")
        );
        assert_eq!(
            extract(MatcherKind::Episode, "Series.S02E10-E11").episode.as_deref(),
            Some("10-11")
        );
        assert_eq!(
            extract(MatcherKind::Episode, "show_s01e05e06").episode.as_deref(),
            Some("05-06")
        );
    }

    #[test]
    fn test_episode_falls_back_to_first_number() {
        assert_eq!(
            extract(MatcherKind::Episode, "Downton Abbey 5x06 HDTV").episode.as_deref(),
            Some("06")
        );
    }

    #[test]
    fn test_anime_episode_forces_special_season() {
        let file = extract(MatcherKind::AnimeEpisode, "[Group] Series - 01 [1080p]");
        assert_eq!(file.episode.as_deref(), Some("01"));
        assert_eq!(file.season.as_deref(), Some("00"));
    }

    #[test]
    fn test_anime_episode_ignored_when_episode_known() {
        let mut file = ParsedFile {
            episode: Some("05".to_string()),
            season: Some("01".to_string()),
            ..Default::default()
        };
        matcher(MatcherKind::AnimeEpisode).extract("[Group] Series - 01 [1080p]", &mut file);
        assert_eq!(file.episode.as_deref(), Some("05"));
        assert_eq!(file.season.as_deref(), Some("01"));
    }

    #[test]
    fn test_anime_group() {
        let file = extract(MatcherKind::AnimeGroup, "[Group] Series - 01 [1080p]");
        assert_eq!(file.anime_group.as_deref(), Some("[Group]"));
    }

    #[test]
    fn test_release_tags() {
        let name = "The.Flash.2014.S06E07.720p.HDTV.x264-SVA";
        assert_eq!(
            extract(MatcherKind::Resolution, name).resolution.as_deref(),
            Some("720p")
        );
        assert_eq!(
            extract(MatcherKind::Quality, name).quality.as_deref(),
            Some("HDTV")
        );
        assert_eq!(extract(MatcherKind::Codec, name).codec.as_deref(), Some("x264"));
        assert_eq!(
            extract(MatcherKind::ReleaseGroup, name).release_group.as_deref(),
            Some("SVA")
        );
        assert_eq!(
            extract(MatcherKind::Audio, "Movie.2010.DTS.mkv").audio.as_deref(),
            Some("DTS")
        );
    }

    #[test]
    fn test_strip_group_only_removes_capture() {
        let season = matcher(MatcherKind::Season);
        assert_eq!(
            season.strip("Breaking Bad S01E05").as_deref(),
            Some("Breaking Bad  E05")
        );
    }

    #[test]
    fn test_strip_every_removes_all_hits() {
        let resolution = matcher(MatcherKind::Resolution);
        assert_eq!(
            resolution.strip("Show 720p 1080p").as_deref(),
            Some("Show    ")
        );
    }

    #[test]
    fn test_strip_without_match() {
        assert_eq!(matcher(MatcherKind::Proper).strip("Some Movie"), None);
    }
}
