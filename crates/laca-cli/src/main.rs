//! LaCa CLI
//!
//! Command-line interface for LaCa - a personal reading journal.

use std::fs::File;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use laca_core::{Config, SqliteStore};

mod commands;
mod editor;
mod output;

use commands::book::NewBook;
use commands::session::NewSession;
use commands::SharedStore;
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "laca")]
#[command(about = "LaCa (Lembar Baca) - a personal reading journal")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use this config file instead of the default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage books
    Book {
        #[command(subcommand)]
        command: BookCommands,
    },
    /// Manage reading sessions
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },
    /// Export a book's reading sheet as PDF
    Export {
        /// Book ID (full ID or prefix)
        book_id: String,
        /// Output directory (defaults to export_dir)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Open the PDF once written
        #[arg(long)]
        open: bool,
    },
    /// Import books from legacy storage
    Migrate,
    /// Delete all books
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Show storage and library status
    Status,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum BookCommands {
    /// Add a new book
    #[command(alias = "create")]
    Add {
        /// Book title
        title: String,
        /// Book author
        #[arg(short, long, default_value = "")]
        author: String,
        /// Rating from 0 to 5
        #[arg(short, long)]
        rating: Option<f64>,
        /// Final review
        #[arg(long)]
        review: Option<String>,
        /// Cover image (.png or .jpg)
        #[arg(long, value_name = "FILE")]
        cover: Option<String>,
    },
    /// List all books
    #[command(alias = "ls")]
    List,
    /// Show book details (including sessions)
    Show {
        /// Book ID (full ID or prefix)
        id: String,
    },
    /// Edit a book interactively
    Edit {
        /// Book ID (full ID or prefix)
        id: String,
    },
    /// Set the final review (opens editor if no text is given)
    Review {
        /// Book ID (full ID or prefix)
        id: String,
        /// Review text
        text: Option<String>,
    },
    /// Rate a book from 0 to 5
    Rate {
        /// Book ID (full ID or prefix)
        id: String,
        /// Rating
        rating: f64,
    },
    /// Delete a book
    #[command(alias = "rm")]
    Delete {
        /// Book ID (full ID or prefix)
        id: String,
    },
}

#[derive(Subcommand)]
enum SessionCommands {
    /// Log a reading session
    #[command(alias = "create")]
    Add {
        /// Book ID (full ID or prefix)
        book_id: String,
        /// First page read
        #[arg(long)]
        from: u32,
        /// Last page read
        #[arg(long)]
        to: u32,
        /// Summary (opens editor if not provided)
        #[arg(short, long)]
        summary: Option<String>,
        /// Session date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },
    /// List sessions of a book
    #[command(alias = "ls")]
    List {
        /// Book ID (full ID or prefix)
        book_id: String,
    },
    /// Delete a session
    #[command(alias = "rm")]
    Delete {
        /// Book ID (full ID or prefix)
        book_id: String,
        /// Session ID (full ID or prefix)
        session_id: String,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, export_dir, save_delay_ms, ...)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    // Config commands don't need the store
    if let Some(Commands::Config { command }) = &cli.command {
        return handle_config_command(command.clone(), cli.config.as_ref(), &output);
    }

    let config = Config::load_with_cli_override(cli.config.as_ref())
        .context("Failed to load configuration")?;
    init_logging(&config);

    let sqlite = SqliteStore::open(&config).context("Failed to open the book database")?;
    let store: SharedStore = Arc::new(sqlite);

    if config.auto_migrate && !matches!(&cli.command, Some(Commands::Migrate)) {
        commands::migrate::auto_migrate(store.as_ref(), &config, &output).await;
    }

    let command = cli.command.unwrap_or(Commands::Book {
        command: BookCommands::List,
    });

    match command {
        Commands::Book { command } => handle_book_command(command, &store, &config, &output).await,
        Commands::Session { command } => {
            handle_session_command(command, &store, &config, &output).await
        }
        Commands::Export { book_id, out, open } => {
            commands::export::export(&store, &config, book_id, out, open, &output).await
        }
        Commands::Migrate => commands::migrate::migrate(store.as_ref(), &config, &output).await,
        Commands::Clear { yes } => commands::clear::clear(store.as_ref(), yes, &output).await,
        Commands::Status => commands::status::show(store.as_ref(), &config, &output).await,
        Commands::Config { command } => {
            handle_config_command(command, cli.config.as_ref(), &output)
        }
    }
}

async fn handle_book_command(
    command: BookCommands,
    store: &SharedStore,
    config: &Config,
    output: &Output,
) -> Result<()> {
    match command {
        BookCommands::Add {
            title,
            author,
            rating,
            review,
            cover,
        } => {
            let new = NewBook {
                title,
                author,
                rating,
                review,
                cover,
            };
            commands::book::add(store, config, new, output).await
        }
        BookCommands::List => commands::book::list(store, output).await,
        BookCommands::Show { id } => commands::book::show(store, id, output).await,
        BookCommands::Edit { id } => commands::book::edit(store, config, id, output).await,
        BookCommands::Review { id, text } => {
            commands::book::review(store, config, id, text, output).await
        }
        BookCommands::Rate { id, rating } => {
            commands::book::rate(store, config, id, rating, output).await
        }
        BookCommands::Delete { id } => commands::book::delete(store, id, output).await,
    }
}

async fn handle_session_command(
    command: SessionCommands,
    store: &SharedStore,
    config: &Config,
    output: &Output,
) -> Result<()> {
    match command {
        SessionCommands::Add {
            book_id,
            from,
            to,
            summary,
            date,
        } => {
            let new = NewSession {
                from,
                to,
                summary,
                date,
            };
            commands::session::add(store, config, book_id, new, output).await
        }
        SessionCommands::List { book_id } => commands::session::list(store, book_id, output).await,
        SessionCommands::Delete {
            book_id,
            session_id,
        } => commands::session::delete(store, config, book_id, session_id, output).await,
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Initialize logging
///
/// Only initializes if LACA_LOG environment variable is set.
/// Logs to config.log_file when set, otherwise to stderr.
fn init_logging(config: &Config) {
    let Ok(log_level) = std::env::var("LACA_LOG") else {
        return;
    };

    let env_filter = EnvFilter::new(format!("laca_core={},laca_cli={}", log_level, log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false);

    // Ignore the error if a subscriber is already installed
    match &config.log_file {
        Some(log_path) => {
            let log_file = match File::create(log_path) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
                    return;
                }
            };
            let _ = builder
                .with_ansi(false)
                .with_writer(Mutex::new(log_file))
                .try_init();
            info!("Logging initialized to {:?}", log_path);
        }
        None => {
            let _ = builder.with_writer(std::io::stderr).try_init();
        }
    }
}
