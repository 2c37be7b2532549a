// 🗄️ Import driver - one command, many export files
//
// Per file: parse → reconcile authors → validate mapping → import with a
// fresh progress reporter. Author problems stop everything before any content
// is touched; post-level failures are only reported.

use crate::config::ImportConfig;
use crate::directory::{ObjectCache, UserDirectory};
use crate::discovery;
use crate::error::{ImportError, Result};
use crate::export::ExportSource;
use crate::importer::{ContentImporter, ImportPlan, ImportSummary};
use crate::progress::{LogLine, LogSink, Observers, ProgressReporter, TracingObserver};
use crate::reconciliation::{ReconcileOutcome, ReconciliationEngine};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// How a whole import command ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every file was imported
    Completed(Vec<FileReport>),

    /// A mapping file was generated; nothing was imported from `file`
    NeedsOperatorAction { file: PathBuf, mapping_file: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub file: PathBuf,
    pub summary: ImportSummary,
    pub cache_clears: u64,
}

pub struct Importer<'a, D, E, C, S>
where
    D: UserDirectory + ObjectCache,
    E: ExportSource,
    C: ContentImporter,
    S: LogSink,
{
    config: &'a ImportConfig,
    directory: &'a D,
    source: E,
    content: C,
    sink: S,
    /// Export post ids imported so far, across files
    processed_posts: HashSet<u64>,
}

impl<'a, D, E, C, S> Importer<'a, D, E, C, S>
where
    D: UserDirectory + ObjectCache,
    E: ExportSource,
    C: ContentImporter,
    S: LogSink,
{
    pub fn new(config: &'a ImportConfig, directory: &'a D, source: E, content: C, sink: S) -> Self {
        Importer {
            config,
            directory,
            source,
            content,
            sink,
            processed_posts: HashSet::new(),
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn processed_posts(&self) -> &HashSet<u64> {
        &self.processed_posts
    }

    /// Discover inputs from CLI arguments and import them in order
    pub fn run(&mut self, args: &[PathBuf]) -> Result<RunOutcome> {
        self.sink.emit(LogLine::log("Starting the import process..."));

        let files = discovery::discover_inputs(args, self.source.extensions(), &mut self.sink)?;
        let mut reports = Vec::with_capacity(files.len());

        for file in files {
            match self.import_file(&file)? {
                FileOutcome::Imported(report) => {
                    // Export content ends with markup, keep the message on its own line
                    self.sink.emit(LogLine::log(""));
                    self.sink.emit(LogLine::success(format!(
                        "Finished importing from '{}' file.",
                        file.display()
                    )));
                    reports.push(report);
                }
                FileOutcome::NeedsOperatorAction(mapping_file) => {
                    return Ok(RunOutcome::NeedsOperatorAction { file, mapping_file });
                }
            }
        }

        Ok(RunOutcome::Completed(reports))
    }

    /// Import a single export file
    pub fn import_file(&mut self, file: &Path) -> Result<FileOutcome> {
        let export = self
            .source
            .parse(file)
            .map_err(|source| ImportError::ExportUnreadable {
                path: file.to_path_buf(),
                source,
            })?;

        let authors = export.unique_authors();
        let engine = ReconciliationEngine::new(self.directory);

        let mapping = match engine.reconcile_selector(&self.config.authors, &authors)? {
            ReconcileOutcome::Mapped(mapping) => mapping,
            ReconcileOutcome::NeedsOperatorAction(path) => {
                tracing::info!(file = %file.display(), mapping = %path.display(), "author mapping needs review");
                return Ok(FileOutcome::NeedsOperatorAction(path));
            }
        };

        let resolved = engine.validate(&mapping)?;

        let mut plan = ImportPlan::new(resolved);
        plan.fetch_attachments = self.config.fetch_attachments();
        plan.resize_images = self.config.resize_images();
        plan.processed_posts = self.processed_posts.clone();

        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file.display().to_string());

        let directory = self.directory;
        let mut reporter = ProgressReporter::new(&file_name, &mut self.sink)
            .with_cache_clear_interval(self.config.cache_clear_interval)
            .on_cache_clear(move || directory.clear());
        let mut tracer = TracingObserver;

        let summary = {
            let mut observers = Observers::new().with(&mut reporter).with(&mut tracer);
            self.content.import(&export, &plan, &mut observers)
        };
        let cache_clears = reporter.cache_clears();

        self.processed_posts
            .extend(summary.processed_posts.iter().copied());

        tracing::info!(
            file = %file.display(),
            inserted = summary.inserted_posts,
            failed = summary.failed_posts,
            skipped = summary.skipped_posts,
            "finished export file"
        );

        Ok(FileOutcome::Imported(FileReport {
            file: file.to_path_buf(),
            summary,
            cache_clears,
        }))
    }
}

/// How a single file ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Imported(FileReport),
    NeedsOperatorAction(PathBuf),
}

// ============================================================================
// TESTS
// ============================================================================
