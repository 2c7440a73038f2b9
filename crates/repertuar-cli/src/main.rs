use std::collections::HashMap;
use std::path::PathBuf;
use std::process;
use std::str::FromStr;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use repertuar::cinema::Cinema;
use repertuar::cinema_city::types::Repertoire;
use repertuar::ratings::{MovieRating, TmdbClient, distinct_titles};
use repertuar::settings::Settings;
use repertuar::types::{CinemaChain, Venue};
use repertuar::utils::parse_date_input;
use repertuar::venues::VenueStore;
use serde::Serialize;

#[derive(Parser)]
#[command(name = "repertuar")]
#[command(about = "Cinema repertoire scraper for Polish cinema chains", long_about = None)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        global = true,
        help = "Set the logging level"
    )]
    log_level: LogLevel,

    #[arg(
        long,
        value_name = "PATH",
        global = true,
        help = "Settings file (defaults to $REPERTUAR_CONFIG, then ./config.toml)"
    )]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Show what plays at a venue on a given day, with ratings when a TMDB token is configured
    Repertoire {
        #[arg(
            value_parser = parse_cinema,
            help = "Cinema chain (defaults to user_preferences.default_cinema)"
        )]
        cinema: Option<CinemaChain>,

        #[arg(help = "Venue name, matched loosely (defaults to user_preferences.default_venue)")]
        venue: Option<String>,

        #[arg(
            value_name = "DATE",
            value_parser = parse_date,
            help = "YYYY-MM-DD, today, tomorrow, dziś or jutro (defaults to user_preferences.default_day)"
        )]
        date: Option<NaiveDate>,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,

        #[arg(long, help = "Skip the ratings lookup")]
        no_ratings: bool,
    },
    /// Manage the local venue database
    Venues {
        #[command(subcommand)]
        command: VenuesCommand,
    },
}

#[derive(Subcommand)]
enum VenuesCommand {
    /// List stored venues of a chain
    List {
        #[arg(value_parser = parse_cinema, help = "Cinema chain")]
        cinema: Option<CinemaChain>,
    },
    /// Find stored venues whose name loosely matches a query
    Search {
        #[arg(help = "Part of the venue name, e.g. 'warszawa janki'")]
        query: String,

        #[arg(short = 'c', long, value_parser = parse_cinema, help = "Cinema chain")]
        cinema: Option<CinemaChain>,
    },
    /// Download the venue list of a chain and replace the stored one
    Update {
        #[arg(value_parser = parse_cinema, help = "Cinema chain")]
        cinema: Option<CinemaChain>,
    },
}

fn parse_cinema(s: &str) -> Result<CinemaChain, String> {
    CinemaChain::from_str(s).map_err(|e| e.to_string())
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    parse_date_input(s).map_err(|e| e.to_string())
}

fn serialize_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            log::error!("Error serializing to JSON: {}", e);
            process::exit(1);
        }
    }
}

#[derive(Serialize)]
struct RepertoireOutput<'a> {
    cinema: CinemaChain,
    venue: &'a Venue,
    date: NaiveDate,
    repertoire: Vec<RatedRepertoire<'a>>,
}

#[derive(Serialize)]
struct RatedRepertoire<'a> {
    #[serde(flatten)]
    entry: &'a Repertoire,
    #[serde(skip_serializing_if = "Option::is_none")]
    rating: Option<&'a MovieRating>,
}

fn rate<'a>(
    repertoire: &'a [Repertoire],
    ratings: &'a HashMap<String, MovieRating>,
) -> Vec<RatedRepertoire<'a>> {
    repertoire
        .iter()
        .map(|entry| RatedRepertoire {
            entry,
            rating: ratings.get(&entry.title),
        })
        .collect()
}

fn print_repertoire(output: &RepertoireOutput) {
    println!(
        "Repertoire of {} {} on {}",
        output.cinema,
        output.venue.name,
        output.date.format("%Y-%m-%d")
    );
    println!();

    if output.repertoire.is_empty() {
        println!("No films to display.");
        return;
    }

    for rated in &output.repertoire {
        println!("{}", rated.entry);
        if let Some(rating) = rated.rating {
            println!("   Rating: {}", rating.rating);
            println!("   {}", rating.summary);
        }
        println!();
    }
}

async fn fetch_ratings(settings: &Settings, titles: &[String]) -> HashMap<String, MovieRating> {
    let Some(token) = settings.tmdb_access_token() else {
        log::debug!("No TMDB access token configured, skipping ratings");
        return HashMap::new();
    };

    let client = match TmdbClient::new(token) {
        Ok(client) => client,
        Err(e) => {
            log::warn!("Error creating ratings client: {}", e);
            return HashMap::new();
        }
    };

    match client.verify_access_token().await {
        Ok(true) => client.fetch_ratings(titles).await,
        Ok(false) => {
            log::warn!("TMDB rejected the access token, skipping ratings");
            HashMap::new()
        }
        Err(e) => {
            log::warn!("Could not reach TMDB, skipping ratings: {}", e);
            HashMap::new()
        }
    }
}

fn open_store(settings: &Settings) -> VenueStore {
    VenueStore::open(&settings.user_preferences.db_file_path).unwrap_or_else(|e| {
        log::error!("Error opening venue database: {}", e);
        process::exit(1);
    })
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.clone().into())
        .init();

    let settings = Settings::load(cli.config.as_deref()).unwrap_or_else(|e| {
        log::error!("Error loading settings: {}", e);
        process::exit(1);
    });
    let default_cinema = settings.user_preferences.default_cinema;

    match cli.command {
        Commands::Repertoire {
            cinema,
            venue,
            date,
            format,
            no_ratings,
        } => {
            let chain = cinema.unwrap_or(default_cinema);
            let venue_query = venue.unwrap_or_else(|| settings.user_preferences.default_venue.clone());
            let date = date.unwrap_or_else(|| {
                parse_date_input(&settings.user_preferences.default_day).unwrap_or_else(|e| {
                    log::error!("Invalid default day: {}", e);
                    process::exit(1);
                })
            });

            let store = open_store(&settings);
            let venue = store.find_venue(chain, &venue_query).unwrap_or_else(|e| {
                log::error!("{}", e);
                process::exit(1);
            });

            let repertoire = Cinema::from_settings(chain, &settings)
                .fetch_repertoire(date, &venue)
                .await
                .unwrap_or_else(|e| {
                    log::error!("Error fetching repertoire: {}", e);
                    process::exit(1);
                });

            let ratings = if no_ratings || repertoire.is_empty() {
                HashMap::new()
            } else {
                fetch_ratings(&settings, &distinct_titles(&repertoire)).await
            };

            let output = RepertoireOutput {
                cinema: chain,
                venue: &venue,
                date,
                repertoire: rate(&repertoire, &ratings),
            };

            match format {
                OutputFormat::Json => serialize_json(&output),
                OutputFormat::Text => print_repertoire(&output),
            }
        }

        Commands::Venues { command } => match command {
            VenuesCommand::List { cinema } => {
                let chain = cinema.unwrap_or(default_cinema);
                let venues = open_store(&settings)
                    .list_venues(chain)
                    .unwrap_or_else(|e| {
                        log::error!("Error listing venues: {}", e);
                        process::exit(1);
                    });

                if venues.is_empty() {
                    println!("No {} venues stored. Run `repertuar venues update` first.", chain);
                } else {
                    for venue in &venues {
                        println!("{}", venue);
                    }
                }
            }

            VenuesCommand::Search { query, cinema } => {
                let chain = cinema.unwrap_or(default_cinema);
                let venues = open_store(&settings)
                    .search_venues(chain, &query)
                    .unwrap_or_else(|e| {
                        log::error!("Error searching venues: {}", e);
                        process::exit(1);
                    });

                if venues.is_empty() {
                    println!("No {} venue matches '{}'.", chain, query);
                } else {
                    for venue in &venues {
                        println!("{}", venue);
                    }
                }
            }

            VenuesCommand::Update { cinema } => {
                let chain = cinema.unwrap_or(default_cinema);
                let venues = Cinema::from_settings(chain, &settings)
                    .fetch_venues()
                    .await
                    .unwrap_or_else(|e| {
                        log::error!("Error fetching venues: {}", e);
                        process::exit(1);
                    });

                if venues.is_empty() {
                    log::error!("The {} venue list came back empty, keeping stored venues", chain);
                    process::exit(1);
                }

                let mut store = open_store(&settings);
                let count = store.replace_venues(chain, &venues).unwrap_or_else(|e| {
                    log::error!("Error storing venues: {}", e);
                    process::exit(1);
                });
                println!("Stored {} {} venues.", count, chain);
            }
        },
    }
}
