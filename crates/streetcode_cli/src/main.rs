//! `streetcode` command-line entry point.
//!
//! Runs one handler against a SQLite database file and prints the JSON
//! response envelope. Exit code is 0 on success and 2 on a handler failure.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use streetcode_core::db::open_db;
use streetcode_core::{
    default_log_level, init_logging, CoreRequestLogger, CreateFactCommand, CreateFactHandler,
    CreateFactRequest, DeleteFactCommand, DeleteFactHandler, EntityMapper, GetAllArtsQuery,
    GetArtByIdHandler, GetArtByIdQuery, GetArtsByStreetcodeIdQuery, GetFactByIdHandler,
    GetFactByIdQuery, GetFactsByStreetcodeIdHandler, GetFactsByStreetcodeIdQuery,
    GetImageByIdHandler, GetImageByIdQuery, ListArtsHandler, LoggingConfig, ReorderFactCommand,
    ReorderFactHandler, ReorderFactRequest, RequestHandler, ResponseEnvelope, SqliteArtRepository,
    SqliteFactRepository, SqliteImageRepository, SqliteStreetcodeRepository,
};

#[derive(Parser, Debug)]
#[command(name = "streetcode", version, about = "Query and maintain Streetcode content")]
struct Cli {
    /// SQLite database file (created and migrated on first use)
    #[arg(long, env = "STREETCODE_DB", default_value = "streetcode.sqlite3", global = true)]
    db: PathBuf,

    /// Log level: trace|debug|info|warn|error
    #[arg(long, env = "STREETCODE_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    /// Directory for rolling log files; logging stays off when unset
    #[arg(long, env = "STREETCODE_LOG_DIR", global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Facts of a streetcode
    #[command(subcommand)]
    Fact(FactCommand),
    /// Artworks
    #[command(subcommand)]
    Art(ArtCommand),
    /// Images
    #[command(subcommand)]
    Image(ImageCommand),
}

#[derive(Subcommand, Debug)]
enum FactCommand {
    /// List facts of a streetcode in number order
    List { streetcode_id: i64 },
    Get { id: i64 },
    /// Append a fact to a streetcode
    Add(AddFactArgs),
    /// Renumber all facts of a streetcode to follow the given id order
    Reorder {
        streetcode_id: i64,
        #[arg(required = true, num_args = 1..)]
        ids: Vec<i64>,
    },
    Delete { id: i64 },
}

#[derive(Args, Debug)]
struct AddFactArgs {
    streetcode_id: i64,
    #[arg(long)]
    title: String,
    #[arg(long)]
    content: String,
    #[arg(long)]
    image_id: Option<i64>,
}

#[derive(Subcommand, Debug)]
enum ArtCommand {
    Get {
        id: i64,
    },
    /// List all arts, or only those placed in one streetcode
    List {
        #[arg(long)]
        streetcode: Option<i64>,
    },
}

#[derive(Subcommand, Debug)]
enum ImageCommand {
    Get { id: i64 },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    setup_logging(&cli)?;

    let conn = open_db(&cli.db)
        .with_context(|| format!("failed to open database `{}`", cli.db.display()))?;
    let mapper = EntityMapper;
    let logger = CoreRequestLogger;

    let success = match cli.command {
        Commands::Fact(command) => {
            let facts = SqliteFactRepository::try_new(&conn)?;
            match command {
                FactCommand::List { streetcode_id } => print(
                    GetFactsByStreetcodeIdHandler::new(facts, mapper, logger)
                        .handle(&GetFactsByStreetcodeIdQuery { streetcode_id }),
                )?,
                FactCommand::Get { id } => print(
                    GetFactByIdHandler::new(facts, mapper, logger).handle(&GetFactByIdQuery { id }),
                )?,
                FactCommand::Add(args) => {
                    let streetcodes = SqliteStreetcodeRepository::try_new(&conn)?;
                    let command = CreateFactCommand {
                        request: CreateFactRequest {
                            streetcode_id: args.streetcode_id,
                            title: args.title,
                            fact_content: args.content,
                            image_id: args.image_id,
                        },
                    };
                    let handler = CreateFactHandler::new(facts, streetcodes, mapper, logger);
                    print(handler.handle(&command))?
                }
                FactCommand::Reorder { streetcode_id, ids } => {
                    let command = ReorderFactCommand {
                        request: ReorderFactRequest {
                            streetcode_id,
                            reordered_ids: Some(ids),
                        },
                    };
                    print(ReorderFactHandler::new(facts, logger).handle(&command))?
                }
                FactCommand::Delete { id } => print(
                    DeleteFactHandler::new(facts, mapper, logger).handle(&DeleteFactCommand { id }),
                )?,
            }
        }
        Commands::Art(command) => {
            let arts = SqliteArtRepository::try_new(&conn)?;
            match command {
                ArtCommand::Get { id } => print(
                    GetArtByIdHandler::new(arts, mapper, logger).handle(&GetArtByIdQuery { id }),
                )?,
                ArtCommand::List { streetcode: None } => {
                    print(ListArtsHandler::new(arts, mapper, logger).handle(&GetAllArtsQuery))?
                }
                ArtCommand::List {
                    streetcode: Some(streetcode_id),
                } => print(
                    ListArtsHandler::new(arts, mapper, logger)
                        .handle(&GetArtsByStreetcodeIdQuery { streetcode_id }),
                )?,
            }
        }
        Commands::Image(ImageCommand::Get { id }) => {
            let images = SqliteImageRepository::try_new(&conn)?;
            let handler = GetImageByIdHandler::new(images, mapper, logger);
            print(handler.handle(&GetImageByIdQuery { id }))?
        }
    };

    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}

/// Starts file logging when a log directory is configured.
fn setup_logging(cli: &Cli) -> Result<()> {
    let Some(log_dir) = &cli.log_dir else {
        return Ok(());
    };
    let level = cli.log_level.as_deref().unwrap_or(default_log_level());
    let config = LoggingConfig::new(level, absolute(log_dir)?)
        .with_context(|| format!("invalid logging configuration for `{}`", log_dir.display()))?;
    init_logging(&config).context("failed to start logging")?;
    Ok(())
}

/// Prints the envelope as JSON and reports whether the handler succeeded.
fn print<T: Serialize, E: std::fmt::Display>(result: Result<T, E>) -> Result<bool> {
    let envelope = ResponseEnvelope::from(result);
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(envelope.is_success)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("failed to resolve current directory")?;
    Ok(cwd.join(path))
}
