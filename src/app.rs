use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, error, warn};
use walkdir::WalkDir;

use crate::{
    catalog::Catalog,
    enrich::identify_with,
    place::{Action, Outcome, Placement, place},
    rules::Rules,
    video::{ContentType, Options, ParsedFile},
};

const BYTES_PER_MB: u64 = 1000 * 1000;

/// `$HOME/media/<name>`, the default library location.
pub fn default_folder(name: &str) -> Result<PathBuf> {
    let home = dirs::home_dir().context("Failed to determine the user's home directory")?;
    Ok(home.join("media").join(name))
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub movie_folder: PathBuf,
    pub series_folder: PathBuf,
    pub action: Action,
    pub recursive: bool,
    /// Video files below this many megabytes are skipped.
    pub min_file_size_mb: u64,
    pub json: bool,
    /// Write JSON results here instead of stdout.
    pub json_file: Option<PathBuf>,
}

/// Machine readable summary of one placed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    #[serde(rename = "externalID")]
    pub external_id: u64,
    pub external_name: String,
    pub clean_name: String,
    pub year: String,
    pub season: String,
    pub episode: String,
    pub episode_name: String,
    pub source: String,
    pub target: String,
    pub action: Action,
    pub is_movie: bool,
    pub is_series: bool,
    pub resolution: String,
    pub quality: String,
}

impl ActionResult {
    pub fn new(file: &ParsedFile, placement: &Placement) -> Self {
        let field = |value: &Option<String>| value.clone().unwrap_or_default();
        Self {
            external_id: file.external_id.unwrap_or_default(),
            external_name: field(&file.external_name),
            clean_name: file.clean_name.clone(),
            year: field(&file.year),
            season: field(&file.season),
            episode: field(&file.episode),
            episode_name: field(&file.episode_name),
            source: placement.source.display().to_string(),
            target: placement.target.display().to_string(),
            action: placement.action,
            is_movie: file.is_movie(),
            is_series: file.is_series(),
            resolution: field(&file.resolution),
            quality: field(&file.quality),
        }
    }
}

pub struct App<'r, C> {
    settings: Settings,
    options: Options,
    catalog: Option<C>,
    rules: &'r Rules,
}

impl<'r, C: Catalog> App<'r, C> {
    pub fn new(settings: Settings, options: Options, catalog: Option<C>) -> Self {
        Self {
            settings,
            options,
            catalog,
            rules: Rules::standard(),
        }
    }

    /// Identifies files with `rules` instead of the built-in tables.
    pub fn with_rules(mut self, rules: &'r Rules) -> Self {
        self.rules = rules;
        self
    }

    /// Identifies and places every file under `path`. Failures on single
    /// files are logged and do not stop the run.
    pub async fn run(&self, path: &Path) -> Result<Vec<Placement>> {
        let metadata =
            fs::metadata(path).with_context(|| format!("Failed to read {:?}", path))?;

        let mut placements = Vec::new();
        if metadata.is_file() {
            if let Some(placement) = self.check_logged(path).await {
                placements.push(placement);
            }
            return Ok(placements);
        }

        let mut walker = WalkDir::new(path).sort_by_file_name();
        if !self.settings.recursive {
            walker = walker.max_depth(1);
        }
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(error = %err, "failed to read directory entry, skipping");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(placement) = self.check_logged(entry.path()).await {
                placements.push(placement);
            }
        }
        Ok(placements)
    }

    async fn check_logged(&self, path: &Path) -> Option<Placement> {
        match self.check_file(path).await {
            Ok(placement) => placement,
            Err(err) => {
                error!(file_path = %path.display(), error = format!("{:#}", err), "failed to act on file");
                None
            }
        }
    }

    /// Runs one file through identification and placement. Returns `None`
    /// when the file is skipped.
    pub async fn check_file(&self, path: &Path) -> Result<Option<Placement>> {
        debug!(file_path = %path.display(), "checking file");

        let metadata =
            fs::metadata(path).with_context(|| format!("Failed to stat {:?}", path))?;
        if !metadata.is_file() {
            return Ok(None);
        }

        let is_video = path
            .extension()
            .is_some_and(|ext| self.rules.is_video(&ext.to_string_lossy()));
        let min_size = self.settings.min_file_size_mb * BYTES_PER_MB;
        if is_video && metadata.len() < min_size {
            warn!(
                file_path = %path.display(),
                min_size,
                size = metadata.len(),
                "file is smaller than the given limit, not processing"
            );
            return Ok(None);
        }

        let file = identify_with(path, &self.options, self.rules, self.catalog.as_ref()).await;
        let root = match file.content_type {
            Some(ContentType::Movie) => &self.settings.movie_folder,
            Some(ContentType::Series) => &self.settings.series_folder,
            Some(ContentType::Music) => {
                debug!(file_path = %path.display(), "file is music, music is not supported yet");
                return Ok(None);
            }
            None => {
                debug!(file_path = %path.display(), "could not identify file, skipping");
                return Ok(None);
            }
        };

        let placement = place(&file, root, self.settings.action, &self.options)?;
        if placement.outcome != Outcome::AlreadyExists {
            self.report(&file, &placement)?;
        }
        Ok(Some(placement))
    }

    fn report(&self, file: &ParsedFile, placement: &Placement) -> Result<()> {
        if !self.settings.json {
            println!(
                "{} {} {}",
                placement.source.display(),
                "->".green(),
                placement.target.display().to_string().cyan()
            );
            return Ok(());
        }

        let json = serde_json::to_string_pretty(&ActionResult::new(file, placement))?;
        match &self.settings.json_file {
            Some(json_file) => {
                fs::write(json_file, json)
                    .with_context(|| format!("Failed to write JSON to {:?}", json_file))?;
                debug!(file = %json_file.display(), "JSON output written to file");
            }
            None => println!("JSON_RESULT:{}", json),
        }
        Ok(())
    }
}
