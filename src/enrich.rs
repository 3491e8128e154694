use std::path::Path;
use tracing::{debug, error, info, warn};

use crate::{
    catalog::{Catalog, LookupHints},
    episode::EpisodeInfo,
    rules::Rules,
    video::{ContentType, Options, ParsedFile},
};

/// Parses `path`, enriches the result from `catalog` when lookups are
/// enabled, and applies the final per-title overrides.
pub async fn identify<C: Catalog>(
    path: &Path,
    options: &Options,
    catalog: Option<&C>,
) -> ParsedFile {
    identify_with(path, options, Rules::standard(), catalog).await
}

pub async fn identify_with<C: Catalog>(
    path: &Path,
    options: &Options,
    rules: &Rules,
    catalog: Option<&C>,
) -> ParsedFile {
    let mut file = ParsedFile::parse_with(path, options, rules);
    if !(file.is_movie() || file.is_series()) {
        return file;
    }

    match catalog {
        Some(catalog) if options.lookup => enrich(&mut file, catalog, options).await,
        None if options.lookup && file.has_year_as_season() => warn!(
            "found an episode that has a year as season but no catalog is available, not translating it to a season number"
        ),
        _ if file.has_year_as_season() => warn!(
            "found an episode that has a year as season but lookup is disabled, not translating it to a season number"
        ),
        _ => {}
    }

    file.finalize(rules);
    info!(file = %file, "done parsing file name");
    file
}

/// Replaces locally extracted metadata with the catalog's canonical values.
/// Failures are logged and leave the local data in place.
pub async fn enrich<C: Catalog>(file: &mut ParsedFile, catalog: &C, options: &Options) {
    let hints = LookupHints {
        year: file.year.clone(),
        language: options.language.clone(),
    };
    debug!(
        year = ?file.year,
        title = %file.clean_name,
        dry_run = options.dry_run,
        "trying to locate data from catalog"
    );

    match file.content_type {
        Some(ContentType::Series) => enrich_series(file, catalog, &hints).await,
        Some(ContentType::Movie) => enrich_movie(file, catalog, &hints).await,
        _ => return,
    }

    debug!(
        external_id = ?file.external_id,
        external_name = ?file.external_name,
        "received catalog results"
    );
}

async fn enrich_movie<C: Catalog>(file: &mut ParsedFile, catalog: &C, hints: &LookupHints) {
    let results = match catalog.search_movie(&file.clean_name, hints).await {
        Ok(results) => results,
        Err(error) => {
            warn!(name = %file.clean_name, %error, "got an error from the catalog");
            return;
        }
    };
    let Some(movie) = results.into_iter().next() else {
        debug!("no results found in catalog");
        return;
    };

    file.external_id = Some(movie.id);
    file.external_name = Some(movie.title.clone());
    file.clean_name = movie.title;
}

async fn enrich_series<C: Catalog>(file: &mut ParsedFile, catalog: &C, hints: &LookupHints) {
    let results = match catalog.search_series(&file.clean_name, hints).await {
        Ok(results) => results,
        Err(error) => {
            warn!(name = %file.clean_name, %error, "got an error from the catalog");
            return;
        }
    };
    let Some(series) = results.into_iter().next() else {
        debug!("no results found in catalog");
        return;
    };

    file.external_id = Some(series.id);
    file.external_name = Some(series.name.clone());
    file.clean_name = series.name;
    if file.year.is_none() {
        file.year = series.first_air_year;
    }

    if file.year_as_season {
        translate_year_as_season(file, catalog, series.id, hints).await;
    }
    fetch_episode_names(file, catalog, series.id, hints).await;
}

/// Swaps a broadcast-year season for the catalog's ordinal season number.
async fn translate_year_as_season<C: Catalog>(
    file: &mut ParsedFile,
    catalog: &C,
    series_id: u64,
    hints: &LookupHints,
) {
    let Some(season) = file.season.clone() else {
        return;
    };
    let seasons = match catalog.season_list(series_id, hints).await {
        Ok(seasons) => seasons,
        Err(error) => {
            error!(
                series_id,
                %error,
                "could not fetch the season list even though the series was just found"
            );
            return;
        }
    };

    let wanted = format!("Season {}", season);
    match seasons.iter().find(|entry| entry.name == wanted) {
        Some(entry) => {
            debug!(season = %season, number = entry.number, "found a match for the season name, using season number");
            file.season = Some(format!("{:02}", entry.number));
            file.year_as_season = false;
        }
        None => warn!(season = %season, "could not translate season as year to a season number"),
    }
}

/// Looks up the title of every episode in the file's episode range and joins
/// them with ` & `.
async fn fetch_episode_names<C: Catalog>(
    file: &mut ParsedFile,
    catalog: &C,
    series_id: u64,
    hints: &LookupHints,
) {
    let Some(season) = file.season_number() else {
        warn!(season = ?file.season, "could not convert season to a number");
        return;
    };

    let episodes = match file.episode.as_deref().map(EpisodeInfo::parse) {
        Some(Ok(info)) => info,
        other => {
            warn!(
                episode = ?file.episode,
                error = ?other.and_then(Result::err),
                "could not parse episode string, falling back to the first episode"
            );
            EpisodeInfo::single(1)
        }
    };

    let mut titles = Vec::new();
    for episode in episodes.episodes() {
        debug!(series = %file.clean_name, season, episode, "fetching episode info from catalog");
        match catalog.episode_title(series_id, season, episode, hints).await {
            Ok(title) if !title.is_empty() => {
                debug!(season, episode, name = %title, "retrieved episode info from catalog");
                titles.push(title);
            }
            Ok(_) => {}
            Err(error) => {
                debug!(season, episode, %error, "could not fetch episode from catalog");
            }
        }
    }

    if !titles.is_empty() {
        file.episode_name = Some(titles.join(" & "));
    }
}
