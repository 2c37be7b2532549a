use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wxr_import::{
    config::default_database,
    ConsoleSink, ImportConfig, ImportError, Importer, JsonExportSource, LogLine, LogSink,
    ReplayImporter, RunOutcome, SkipOption, SqliteDirectory,
};

/// Exit status when a mapping file was generated for review
const EXIT_NEEDS_ACTION: u8 = 2;

#[derive(Parser)]
#[command(name = "wxr-import")]
#[command(about = "Import content exports, mapping export authors onto site users")]
#[command(version)]
struct Cli {
    /// Export files to import; directories contribute the files the export
    /// reader understands (.json)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// 'create', 'skip', or a mapping CSV (created for editing if it doesn't exist)
    #[arg(long)]
    authors: String,

    /// Data to skip: 'attachment', 'image_resize' (comma separated)
    #[arg(long, default_value = "")]
    skip: String,

    /// SQLite user store [default: $WXR_IMPORT_DB or wxr-import.db]
    #[arg(long)]
    database: Option<PathBuf>,

    /// Clear lookup caches every N processed posts (0 disables)
    #[arg(long, default_value_t = 500)]
    cache_clear_interval: u64,
}

impl Cli {
    fn into_config(self) -> (ImportConfig, Vec<PathBuf>) {
        let database = self.database.unwrap_or_else(default_database);

        let config = ImportConfig {
            authors: self.authors,
            skip: SkipOption::parse_list(&self.skip),
            database,
            cache_clear_interval: self.cache_clear_interval,
        };

        (config, self.files)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wxr_import=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let (config, files) = Cli::parse().into_config();

    match run(&config, &files) {
        Ok(RunOutcome::Completed(reports)) => {
            tracing::info!(files = reports.len(), "import complete");
            ExitCode::SUCCESS
        }
        Ok(RunOutcome::NeedsOperatorAction { file, mapping_file }) => {
            eprintln!(
                "Error: Please update author mapping file before continuing: {}",
                mapping_file.display()
            );
            tracing::info!(file = %file.display(), "stopped before importing");
            ExitCode::from(EXIT_NEEDS_ACTION)
        }
        Err(err) => {
            match err.downcast_ref::<ImportError>() {
                Some(import_err) => {
                    eprintln!("Error: {} ({})", import_err, import_err.code())
                }
                None => eprintln!("Error: {:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(config: &ImportConfig, files: &[PathBuf]) -> Result<RunOutcome> {
    let directory = SqliteDirectory::open(&config.database)
        .with_context(|| format!("Failed to open user store {}", config.database.display()))?;

    let mut importer = Importer::new(
        config,
        &directory,
        JsonExportSource,
        ReplayImporter::new(),
        ConsoleSink,
    );
    let outcome = importer.run(files)?;

    let created = directory.created_this_run()?;
    if !created.is_empty() {
        let mut console = ConsoleSink;
        console.emit(LogLine::log(format!("Created {} user(s):", created.len())));
        for event in &created {
            console.emit(LogLine::log(format!(
                "-- {} (user_id #{})",
                event.user_login, event.user_id
            )));
        }
    }

    Ok(outcome)
}
