use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::{rules::Rules, video::ContentType};

static SEPARATOR_DEBRIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}.*").expect("separator debris pattern is valid"));

fn visible_chars(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

/// Reduces a release name to a readable title.
///
/// Every matcher that applies to `content_type` is run again over the name
/// and its hit removed. A removal that leaves fewer than two visible
/// characters is taken as an over-match and undone. Unless the release is
/// anime, everything from the first run of two or more spaces is dropped and
/// the rest is title-cased.
pub fn clean_title(
    file_name: &str,
    content_type: Option<ContentType>,
    is_anime: bool,
    rules: &Rules,
) -> String {
    let mut name = file_name.replace(['.', '_'], " ");

    if matches!(
        content_type,
        Some(ContentType::Movie) | Some(ContentType::Series)
    ) {
        let is_movie = content_type == Some(ContentType::Movie);
        for matcher in &rules.matchers {
            if is_movie && matcher.kind.is_episodic() {
                continue;
            }
            let Some(stripped) = matcher.strip(&name) else {
                continue;
            };
            if visible_chars(&stripped) < 2 {
                debug!(
                    matcher = %matcher.kind,
                    new_name = %stripped,
                    old_name = %name,
                    "match left the name shorter than two characters, reverting"
                );
                continue;
            }
            name = stripped;
        }
    }

    let mut name = name.trim().to_string();

    // Anime titles are full of short stylised words.
    if !is_anime {
        debug!(clean_name = %name, "probably not anime, cleaning a bit more");
        if let Some(debris) = SEPARATOR_DEBRIS.find(&name) {
            name.truncate(debris.start());
        }
        name = title_case(&name, rules);
    }

    name.replace(':', "")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Capitalizes every word except minor words; the first word is always
/// capitalized.
pub fn title_case(text: &str, rules: &Rules) -> String {
    text.split_whitespace()
        .enumerate()
        .map(|(index, word)| {
            let lower = word.to_lowercase();
            if index > 0 && rules.is_minor_word(&lower) {
                lower
            } else {
                capitalize(&lower)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
