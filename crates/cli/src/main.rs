mod admin;
mod import;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Policy for records whose organization and team groups are all missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum MissingGroupArg {
    /// Stop the run before any account is created
    Abort,
    /// Report the record as failed and continue
    SkipRecord,
}

/// Bulk account provisioning from roster files.
#[derive(Parser)]
#[command(name = "rollcall", version, about = "Bulk account provisioning from roster files")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress progress lines and informational logging
    #[arg(long, global = true)]
    quiet: bool,

    /// Log every provisioning step
    #[arg(long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Path to a rollcall.toml configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create accounts for every record in a roster
    Import {
        #[command(subcommand)]
        source: ImportSource,
    },

    /// Inspect or prepare a JSON directory file
    Directory {
        #[command(subcommand)]
        command: DirectoryCommands,
    },
}

#[derive(Subcommand)]
enum ImportSource {
    /// A directory of <TLA>.yaml team files, one team leader each
    Teams {
        /// Directory holding the team files
        path: PathBuf,
        #[command(flatten)]
        opts: ImportArgs,
    },
    /// A CSV of schools: tla, organisation_name, first_name, last_name, email
    Schools {
        /// Path to the CSV file
        path: PathBuf,
        #[command(flatten)]
        opts: ImportArgs,
    },
    /// A CSV of mentors: first_name, last_name, email
    Mentors {
        /// Path to the CSV file
        path: PathBuf,
        #[command(flatten)]
        opts: ImportArgs,
    },
}

/// Options shared by every import source.
#[derive(clap::Args)]
pub(crate) struct ImportArgs {
    /// JSON directory file to provision into
    #[arg(long)]
    pub directory: PathBuf,
    /// Spool welcome messages to this JSON-lines file
    #[arg(long)]
    pub outbox: Option<PathBuf>,
    /// Do not send welcome messages
    #[arg(long)]
    pub no_emails: bool,
    /// Resolve and check every record without changing anything
    #[arg(long)]
    pub dry_run: bool,
    /// Override the source's policy for missing groups
    #[arg(long, value_enum)]
    pub on_missing_group: Option<MissingGroupArg>,
}

#[derive(Subcommand)]
enum DirectoryCommands {
    /// Create empty groups, creating the directory file if needed
    GroupAdd {
        /// JSON directory file
        #[arg(long)]
        directory: PathBuf,
        /// Group names
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Print the users and groups held in a directory file
    Show {
        /// JSON directory file
        #[arg(long)]
        directory: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    let config = match &cli.config {
        Some(path) => match rollcall_core::load_config(path) {
            Ok(config) => config,
            Err(e) => {
                report_error(&e.to_string(), cli.output, false);
                process::exit(1);
            }
        },
        None => rollcall_core::Config::default(),
    };

    let code = match cli.command {
        Commands::Import { source } => {
            let (kind, path, opts) = match source {
                ImportSource::Teams { path, opts } => (rollcall_core::SourceKind::Teams, path, opts),
                ImportSource::Schools { path, opts } => {
                    (rollcall_core::SourceKind::Schools, path, opts)
                }
                ImportSource::Mentors { path, opts } => {
                    (rollcall_core::SourceKind::Mentors, path, opts)
                }
            };
            import::cmd_import(kind, &path, &opts, &config, cli.output, cli.quiet)
        }
        Commands::Directory { command } => match command {
            DirectoryCommands::GroupAdd { directory, names } => {
                admin::cmd_group_add(&directory, &names, cli.output, cli.quiet)
            }
            DirectoryCommands::Show { directory } => {
                admin::cmd_show(&directory, cli.output, cli.quiet)
            }
        },
    };
    process::exit(code);
}

/// Logs go to stderr. `RUST_LOG` applies unless `--quiet` or `--verbose` is given.
fn init_logging(quiet: bool, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
