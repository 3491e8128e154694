use reqwest::StatusCode;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::catalog::{
    Catalog, CatalogError, LookupHints, MovieMatch, SeasonEntry, SeriesMatch,
};

const BASE_URL: &str = "https://api.themoviedb.org/3";

#[derive(Debug, PartialEq, Deserialize, Serialize)]
pub struct SearchPage<T> {
    pub results: Vec<T>,
}

#[derive(Debug, PartialEq, Deserialize, Serialize)]
pub struct TvResult {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub first_air_date: Option<String>,
}

#[derive(Debug, PartialEq, Deserialize, Serialize)]
pub struct MovieResult {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub release_date: Option<String>,
}

#[derive(Debug, PartialEq, Deserialize, Serialize)]
pub struct SeasonSummary {
    pub season_number: u32,
    pub name: String,
}

#[derive(Debug, PartialEq, Deserialize, Serialize)]
pub struct Series {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub seasons: Vec<SeasonSummary>,
}

#[derive(Debug, PartialEq, Deserialize, Serialize)]
pub struct Episode {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub season_number: u32,
    #[serde(default)]
    pub episode_number: u32,
}

/// Leading `YYYY` of a TMDB date such as `2008-01-20`.
fn year_of(date: Option<&str>) -> Option<String> {
    let year = date?.split('-').next()?;
    (year.len() == 4 && year.chars().all(|c| c.is_ascii_digit())).then(|| year.to_string())
}

pub struct TmdbClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl TmdbClient {
    /// Builds a client from the `TMDB_API_TOKEN` environment variable.
    pub fn new() -> Result<Self, CatalogError> {
        Ok(Self::with_token(std::env::var("TMDB_API_TOKEN")?))
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: token.into(),
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, CatalogError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound);
        }
        Ok(response.error_for_status()?.json().await?)
    }

    pub async fn search_tv(
        &self,
        query: &str,
        hints: &LookupHints,
    ) -> Result<Vec<TvResult>, CatalogError> {
        let mut params = vec![("query", query), ("language", hints.language.as_str())];
        if let Some(year) = &hints.year {
            params.push(("first_air_date_year", year.as_str()));
        }
        let page: SearchPage<TvResult> = self.get("/search/tv", &params).await?;
        Ok(page.results)
    }

    pub async fn search_movies(
        &self,
        query: &str,
        hints: &LookupHints,
    ) -> Result<Vec<MovieResult>, CatalogError> {
        let mut params = vec![("query", query), ("language", hints.language.as_str())];
        if let Some(year) = &hints.year {
            params.push(("year", year.as_str()));
        }
        let page: SearchPage<MovieResult> = self.get("/search/movie", &params).await?;
        Ok(page.results)
    }

    pub async fn series(&self, id: u64, language: &str) -> Result<Series, CatalogError> {
        self.get(&format!("/tv/{}", id), &[("language", language)])
            .await
    }

    pub async fn episode(
        &self,
        id: u64,
        season: u32,
        episode: u32,
        language: &str,
    ) -> Result<Episode, CatalogError> {
        self.get(
            &format!("/tv/{}/season/{}/episode/{}", id, season, episode),
            &[("language", language)],
        )
        .await
    }
}

impl Catalog for TmdbClient {
    async fn search_series(
        &self,
        title: &str,
        hints: &LookupHints,
    ) -> Result<Vec<SeriesMatch>, CatalogError> {
        Ok(self
            .search_tv(title, hints)
            .await?
            .into_iter()
            .map(|tv| SeriesMatch {
                first_air_year: year_of(tv.first_air_date.as_deref()),
                id: tv.id,
                name: tv.name,
            })
            .collect())
    }

    async fn search_movie(
        &self,
        title: &str,
        hints: &LookupHints,
    ) -> Result<Vec<MovieMatch>, CatalogError> {
        Ok(self
            .search_movies(title, hints)
            .await?
            .into_iter()
            .map(|movie| MovieMatch {
                id: movie.id,
                title: movie.title,
            })
            .collect())
    }

    async fn episode_title(
        &self,
        series_id: u64,
        season: u32,
        episode: u32,
        hints: &LookupHints,
    ) -> Result<String, CatalogError> {
        Ok(self
            .episode(series_id, season, episode, &hints.language)
            .await?
            .name)
    }

    async fn season_list(
        &self,
        series_id: u64,
        hints: &LookupHints,
    ) -> Result<Vec<SeasonEntry>, CatalogError> {
        Ok(self
            .series(series_id, &hints.language)
            .await?
            .seasons
            .into_iter()
            .map(|season| SeasonEntry {
                number: season.season_number,
                name: season.name,
            })
            .collect())
    }
}
