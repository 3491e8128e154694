use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use medianamer::{
    app::{App, Settings, default_folder},
    enrich::identify,
    place::Action,
    tmdb::TmdbClient,
    video::{DEFAULT_LANGUAGE, DEFAULT_MOVIE_FORMAT, DEFAULT_SERIES_FORMAT, Options},
};
use std::{fs::OpenOptions, path::PathBuf, sync::Arc};
use tabled::{Table, Tabled, settings::Style};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Args, Debug, Clone)]
struct ParseArgs {
    /// Don't look up metadata on TMDB
    #[arg(long)]
    no_lookup: bool,
    /// Treat every file as a movie
    #[arg(long, conflicts_with = "force_series")]
    force_movie: bool,
    /// Treat every file as a series episode
    #[arg(long)]
    force_series: bool,
    /// Template for movie targets
    #[arg(long, default_value = DEFAULT_MOVIE_FORMAT)]
    movie_format: String,
    /// Template for episode targets
    #[arg(long, default_value = DEFAULT_SERIES_FORMAT)]
    series_format: String,
    /// Language for TMDB lookups
    #[arg(long, default_value = DEFAULT_LANGUAGE)]
    language: String,
}

impl ParseArgs {
    fn options(&self, dry_run: bool) -> Options {
        Options {
            lookup: !self.no_lookup,
            force_movie: self.force_movie,
            force_series: self.force_series,
            movie_format: self.movie_format.clone(),
            series_format: self.series_format.clone(),
            language: self.language.clone(),
            dry_run,
            original_file: None,
        }
    }
}

#[derive(Args, Debug)]
struct OrganizeArgs {
    /// File or directory to process
    path: PathBuf,
    #[arg(long, value_enum, default_value_t = Action::Symlink)]
    action: Action,
    /// Library folder for movies [default: $HOME/media/Movies]
    #[arg(long)]
    movie_folder: Option<PathBuf>,
    /// Library folder for series [default: $HOME/media/TV Shows]
    #[arg(long)]
    series_folder: Option<PathBuf>,
    /// Only look at files directly inside the given directory
    #[arg(long)]
    no_recursive: bool,
    /// Show what would happen without touching any file
    #[arg(long)]
    dry_run: bool,
    /// Skip video files smaller than this many MB
    #[arg(long, default_value_t = 120)]
    min_file_size: u64,
    /// Print a JSON result for every placed file
    #[arg(long)]
    json: bool,
    /// Write the JSON result to this file instead of stdout
    #[arg(long, requires = "json")]
    json_file: Option<PathBuf>,
    #[command(flatten)]
    parse: ParseArgs,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Identify files and place them in the library
    Organize(OrganizeArgs),
    /// Show what would be identified for the given files
    Identify {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        #[command(flatten)]
        parse: ParseArgs,
    },
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Tabled)]
struct IdentifyRow {
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Year")]
    year: String,
    #[tabled(rename = "Season")]
    season: String,
    #[tabled(rename = "Episode")]
    episode: String,
    #[tabled(rename = "Target")]
    target: String,
}

fn init_logging(verbose: bool, log_file: Option<&PathBuf>) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("medianamer=debug")
        } else {
            EnvFilter::new("medianamer=info")
        }
    });

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {:?}", path))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Arc::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    Ok(())
}

fn catalog(options: &Options) -> Option<TmdbClient> {
    if !options.lookup {
        return None;
    }
    match TmdbClient::new() {
        Ok(client) => Some(client),
        Err(err) => {
            warn!(error = %err, "TMDB_API_TOKEN is not set, continuing without lookups");
            None
        }
    }
}

async fn organize(args: OrganizeArgs) -> Result<()> {
    let options = args.parse.options(args.dry_run);
    let movie_folder = match args.movie_folder {
        Some(folder) => folder,
        None => default_folder("Movies").context("Pass --movie-folder explicitly")?,
    };
    let series_folder = match args.series_folder {
        Some(folder) => folder,
        None => default_folder("TV Shows").context("Pass --series-folder explicitly")?,
    };
    let settings = Settings {
        movie_folder,
        series_folder,
        action: args.action,
        recursive: !args.no_recursive,
        min_file_size_mb: args.min_file_size,
        json: args.json,
        json_file: args.json_file,
    };
    let app = App::new(settings, options.clone(), catalog(&options));

    let placements = app.run(&args.path).await?;
    info!(count = placements.len(), "done processing files");
    Ok(())
}

async fn identify_files(paths: Vec<PathBuf>, parse: ParseArgs) -> Result<()> {
    let options = parse.options(true);
    let catalog = catalog(&options);

    let mut rows = Vec::new();
    for path in paths {
        let file = identify(&path, &options, catalog.as_ref()).await;
        let field = |value: &Option<String>| value.clone().unwrap_or_default();
        rows.push(IdentifyRow {
            file: file.full_name(),
            kind: file
                .content_type
                .map(|kind| kind.to_string())
                .unwrap_or_default(),
            name: file.clean_name.clone(),
            year: field(&file.year),
            season: field(&file.season),
            episode: field(&file.episode),
            target: if file.is_movie() || file.is_series() {
                file.target_name(&options)
            } else {
                String::new()
            },
        });
    }

    println!("{}", Table::new(rows).with(Style::rounded()));
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_file.as_ref())?;

    match cli.command {
        Commands::Organize(args) => organize(args).await,
        Commands::Identify { paths, parse } => identify_files(paths, parse).await,
    }
}
