//! The metadata catalog consulted during enrichment.
//!
//! [`Catalog`] is the capability the enrichment step depends on. The
//! production implementation is [`crate::tmdb::TmdbClient`]; tests plug in
//! an in-memory one.

use std::future::Future;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("not found in catalog")]
    NotFound,
    #[error("missing catalog credentials: {0}")]
    MissingToken(#[from] std::env::VarError),
}

/// Disambiguation hints sent along with every query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LookupHints {
    pub year: Option<String>,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesMatch {
    pub id: u64,
    pub name: String,
    pub first_air_year: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieMatch {
    pub id: u64,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonEntry {
    pub number: u32,
    pub name: String,
}

/// Search and detail lookups against a movie/series catalog. Search results
/// are ranked best first.
pub trait Catalog {
    fn search_series(
        &self,
        title: &str,
        hints: &LookupHints,
    ) -> impl Future<Output = Result<Vec<SeriesMatch>, CatalogError>> + Send;

    fn search_movie(
        &self,
        title: &str,
        hints: &LookupHints,
    ) -> impl Future<Output = Result<Vec<MovieMatch>, CatalogError>> + Send;

    fn episode_title(
        &self,
        series_id: u64,
        season: u32,
        episode: u32,
        hints: &LookupHints,
    ) -> impl Future<Output = Result<String, CatalogError>> + Send;

    fn season_list(
        &self,
        series_id: u64,
        hints: &LookupHints,
    ) -> impl Future<Output = Result<Vec<SeasonEntry>, CatalogError>> + Send;
}
