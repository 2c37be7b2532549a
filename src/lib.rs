// WXR Import - Author reconciliation and import progress reporting
// Exposes all modules for use in the CLI and tests

pub mod levenshtein;
pub mod authors;
pub mod mapping;
pub mod directory;
pub mod db;             // SQLite user store + audit trail
pub mod suggestion;
pub mod reconciliation;
pub mod progress;
pub mod export;
pub mod importer;
pub mod discovery;
pub mod config;
pub mod import;
pub mod error;

// Re-export commonly used types
pub use authors::{DestinationUser, NewUser, SourceAuthor};
pub use mapping::MappingEntry;
pub use directory::{InMemoryDirectory, ObjectCache, UserDirectory};
pub use db::{SqliteDirectory, UserCreatedEvent};
pub use suggestion::suggest;
pub use reconciliation::{
    AuthorMapping, AuthorStrategy, ReconcileOutcome, ReconciliationEngine, ResolvedMapping,
};
pub use progress::{
    ConsoleSink, EntityKind, ImportEvent, ImportObserver, InsertError, LogLine, LogLevel,
    LogSink, MemorySink, Observers, ProgressCounters, ProgressReporter, TracingObserver,
};
pub use export::{ExportPost, ExportSource, JsonExportSource, ParsedExport};
pub use importer::{ContentImporter, ImportPlan, ImportSummary, ReplayImporter};
pub use config::{ImportConfig, SkipOption};
pub use import::{FileOutcome, FileReport, Importer, RunOutcome};
pub use error::{DirectoryError, ImportError, MappingProblem};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
