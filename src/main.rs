use std::path::PathBuf;

use clap::{Parser, Subcommand};
use db_assist::config::DbConfig;
use db_assist::gateway;
use db_assist::sync::{self, DEFAULT_EXPORT_LIMIT, Importer};
use db_assist::{AssistError, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_logging(&cli.log_level).and_then(|()| run(cli)) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn init_logging(level: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| AssistError::Logging(err.to_string()))
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Import(args) => execute_import(args),
        Command::Export(args) => execute_export(args),
    }
}

fn execute_import(args: ImportArgs) -> Result<()> {
    if let Some(missing) = args.files.iter().find(|path| !path.exists()) {
        return Err(AssistError::MissingInput(missing.clone()));
    }
    let mut gateway = gateway::connect(&args.database.resolve()?)?;
    let mut importer = Importer::new(gateway.as_mut());
    for file in &args.files {
        info!(file = %file.display(), "importing workbook");
        importer.import_file(file)?;
    }
    Ok(())
}

fn execute_export(args: ExportArgs) -> Result<()> {
    let mut gateway = gateway::connect(&args.database.resolve()?)?;
    let written = sync::export_tables(gateway.as_mut(), &args.output, args.limit, &args.tables)?;
    info!(files = written.len(), "export finished");
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Import spreadsheet rows into database tables and export tables to spreadsheets."
)]
struct Cli {
    /// Log filter used when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upsert the rows of each workbook into the table named by its first sheet.
    Import(ImportArgs),
    /// Write one workbook per table.
    Export(ExportArgs),
}

#[derive(clap::Args)]
struct DatabaseArgs {
    /// JSON file with the connection settings.
    #[arg(long, required_unless_present = "sqlite")]
    config: Option<PathBuf>,

    /// SQLite database file, instead of a configuration file.
    #[arg(long, conflicts_with = "config")]
    sqlite: Option<PathBuf>,
}

impl DatabaseArgs {
    fn resolve(&self) -> Result<DbConfig> {
        match (&self.config, &self.sqlite) {
            (_, Some(path)) => Ok(DbConfig::sqlite(path)),
            (Some(path), None) => {
                if !path.exists() {
                    return Err(AssistError::MissingInput(path.clone()));
                }
                DbConfig::load(path)
            }
            (None, None) => Err(AssistError::InvalidConfig(
                "either --config or --sqlite is required".into(),
            )),
        }
    }
}

#[derive(clap::Args)]
struct ImportArgs {
    #[command(flatten)]
    database: DatabaseArgs,

    /// Workbooks to import, processed in the given order.
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[derive(clap::Args)]
struct ExportArgs {
    #[command(flatten)]
    database: DatabaseArgs,

    /// Directory receiving one `<table>.xlsx` per table.
    #[arg(long)]
    output: PathBuf,

    /// Maximum number of rows exported per table.
    #[arg(long, default_value_t = DEFAULT_EXPORT_LIMIT)]
    limit: usize,

    /// Restrict the export to these tables.
    #[arg(long = "table")]
    tables: Vec<String>,
}
