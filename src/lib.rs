pub mod app;
pub mod catalog;
pub mod clean;
pub mod enrich;
pub mod episode;
pub mod matchers;
pub mod place;
pub mod render;
pub mod rules;
pub mod tmdb;
pub mod video;
