// 📊 Progress Counter / Event Reporter
//
// The content importer emits typed events; observers turn them into
// whatever the operator needs. ProgressReporter is the verbose one: running
// "N of M" counters per entity, one line per lifecycle moment, and a
// throttled cache-clear hook for long imports.
//
// One reporter per import run (per source file). Counters are reset by
// batches, so sharing a reporter between concurrent runs would mix them up.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_CACHE_CLEAR_INTERVAL: u64 = 500;

// ============================================================================
// EVENTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Post,
    Comment,
    Term,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Post => "post",
            EntityKind::Comment => "comment",
            EntityKind::Term => "term",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure attached to an insert event; never fatal to the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertError {
    pub code: String,
    pub message: String,
}

impl InsertError {
    pub fn new(code: &str, message: &str) -> Self {
        InsertError {
            code: code.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportEvent {
    /// A new group of entities begins; supersedes the previous batch
    BatchStarted { kind: EntityKind, size: u64 },

    /// Item about to be written (before the destination insert)
    ItemProcessed {
        kind: EntityKind,
        id: u64,
        title: Option<String>,
        post_type: Option<String>,
    },

    /// Destination insert finished; `id` is the new id on success
    ItemInserted {
        kind: EntityKind,
        id: u64,
        error: Option<InsertError>,
    },

    TermCreated { name: String },

    TermsAssignedToPost { term_ids: Vec<u64>, taxonomy: String },

    MetaAdded { post_id: u64, key: String },
}

/// Anything that wants to hear about import lifecycle events
pub trait ImportObserver {
    fn on_event(&mut self, event: &ImportEvent);
}

/// Fan-out to several observers, in registration order
#[derive(Default)]
pub struct Observers<'a> {
    observers: Vec<&'a mut dyn ImportObserver>,
}

impl<'a> Observers<'a> {
    pub fn new() -> Self {
        Observers {
            observers: Vec::new(),
        }
    }

    pub fn with(mut self, observer: &'a mut dyn ImportObserver) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl ImportObserver for Observers<'_> {
    fn on_event(&mut self, event: &ImportEvent) {
        for observer in self.observers.iter_mut() {
            observer.on_event(event);
        }
    }
}

/// Mirrors every event into `tracing` at debug level; insert failures are
/// also logged as warnings with their full message
#[derive(Debug, Default)]
pub struct TracingObserver;

impl ImportObserver for TracingObserver {
    fn on_event(&mut self, event: &ImportEvent) {
        if let ImportEvent::ItemInserted {
            kind,
            id,
            error: Some(err),
        } = event
        {
            tracing::warn!(%kind, id, code = %err.code, message = %err.message, "insert failed");
            return;
        }

        tracing::debug!(?event, "import event");
    }
}

// ============================================================================
// LOG SINKS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Log,
    Warning,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    pub level: LogLevel,
    pub text: String,
}

impl LogLine {
    pub fn log(text: impl Into<String>) -> Self {
        LogLine {
            level: LogLevel::Log,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        LogLine {
            level: LogLevel::Warning,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        LogLine {
            level: LogLevel::Success,
            text: text.into(),
        }
    }
}

/// Where operator-facing lines go
pub trait LogSink {
    fn emit(&mut self, line: LogLine);
}

impl<S: LogSink + ?Sized> LogSink for &mut S {
    fn emit(&mut self, line: LogLine) {
        (**self).emit(line);
    }
}

/// Prints to the terminal: plain lines on stdout, warnings on stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl LogSink for ConsoleSink {
    fn emit(&mut self, line: LogLine) {
        match line.level {
            LogLevel::Log => println!("{}", line.text),
            LogLevel::Warning => eprintln!("Warning: {}", line.text),
            LogLevel::Success => println!("Success: {}", line.text),
        }
    }
}

/// Keeps every line in memory
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub lines: Vec<LogLine>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text of every line, blank ones included
    pub fn texts(&self) -> Vec<&str> {
        self.lines.iter().map(|l| l.text.as_str()).collect()
    }

    pub fn warnings(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter(|l| l.level == LogLevel::Warning)
            .map(|l| l.text.as_str())
            .collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.text.contains(needle))
    }
}

impl LogSink for MemorySink {
    fn emit(&mut self, line: LogLine) {
        self.lines.push(line);
    }
}

// ============================================================================
// COUNTERS
// ============================================================================

/// Where we are in the current run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressCounters {
    pub current_post: u64,
    pub total_posts: u64,
    pub current_comment: u64,
    pub total_comments: u64,
    pub current_file: String,
}

impl ProgressCounters {
    pub fn new(current_file: &str) -> Self {
        ProgressCounters {
            current_file: current_file.to_string(),
            ..Default::default()
        }
    }
}

/// Format a count with thousands separators: 1234567 → "1,234,567"
pub fn number_format(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }

    out
}

// ============================================================================
// PROGRESS REPORTER
// ============================================================================

pub struct ProgressReporter<'a, S: LogSink> {
    counters: ProgressCounters,
    sink: S,
    cache_clear_interval: u64,
    on_cache_clear: Option<Box<dyn FnMut() + 'a>>,
    cache_clears: u64,
}

impl<'a, S: LogSink> ProgressReporter<'a, S> {
    pub fn new(current_file: &str, sink: S) -> Self {
        ProgressReporter {
            counters: ProgressCounters::new(current_file),
            sink,
            cache_clear_interval: DEFAULT_CACHE_CLEAR_INTERVAL,
            on_cache_clear: None,
            cache_clears: 0,
        }
    }

    /// Clear caches every `interval` processed posts (0 disables)
    pub fn with_cache_clear_interval(mut self, interval: u64) -> Self {
        self.cache_clear_interval = interval;
        self
    }

    /// Hook run each time the cache-clear threshold is hit
    pub fn on_cache_clear(mut self, hook: impl FnMut() + 'a) -> Self {
        self.on_cache_clear = Some(Box::new(hook));
        self
    }

    pub fn counters(&self) -> &ProgressCounters {
        &self.counters
    }

    pub fn cache_clears(&self) -> u64 {
        self.cache_clears
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn log(&mut self, text: String) {
        self.sink.emit(LogLine::log(text));
    }

    fn batch_started(&mut self, kind: EntityKind, size: u64) {
        match kind {
            EntityKind::Post => {
                self.counters.current_post = 0;
                self.counters.total_posts = size;
            }
            EntityKind::Comment => {
                self.counters.current_comment = 0;
                self.counters.total_comments = size;
            }
            // Terms are reported one by one, without a running count
            EntityKind::Term => {}
        }
    }

    fn post_processed(&mut self, id: u64, title: Option<&str>, post_type: Option<&str>) {
        self.counters.current_post += 1;

        self.log(String::new());
        self.log(String::new());
        self.log(format!(
            "Processing post #{} (\"{}\") (post_type: {})",
            id,
            title.unwrap_or_default(),
            post_type.unwrap_or("post")
        ));
        self.log(format!(
            "-- {} of {} (in file {})",
            number_format(self.counters.current_post),
            number_format(self.counters.total_posts),
            self.counters.current_file
        ));
        self.log(format!("-- {}", chrono::Local::now().to_rfc2822()));
    }

    fn post_inserted(&mut self, id: u64, error: Option<&InsertError>) {
        match error {
            Some(err) => self
                .sink
                .emit(LogLine::warning(format!("-- Error importing post: {}", err.code))),
            None => self.log(format!("-- Imported post as post_id #{}", id)),
        }

        let current = self.counters.current_post;
        if self.cache_clear_interval > 0 && current > 0 && current % self.cache_clear_interval == 0
        {
            if let Some(hook) = self.on_cache_clear.as_mut() {
                hook();
            }
            self.cache_clears += 1;
            self.log("-- Cleared object cache.".to_string());
        }
    }

    fn comment_inserted(&mut self, id: u64, error: Option<&InsertError>) {
        // Comments have no separate processed stage: the insert is the item
        self.counters.current_comment += 1;

        match error {
            Some(err) => self.sink.emit(LogLine::warning(format!(
                "-- Error importing comment: {}",
                err.code
            ))),
            None => self.log(format!(
                "-- Added comment #{} ({} of {})",
                id,
                number_format(self.counters.current_comment),
                number_format(self.counters.total_comments)
            )),
        }
    }
}

impl<S: LogSink> ImportObserver for ProgressReporter<'_, S> {
    fn on_event(&mut self, event: &ImportEvent) {
        match event {
            ImportEvent::BatchStarted { kind, size } => self.batch_started(*kind, *size),

            ImportEvent::ItemProcessed {
                kind: EntityKind::Post,
                id,
                title,
                post_type,
            } => self.post_processed(*id, title.as_deref(), post_type.as_deref()),

            ImportEvent::ItemProcessed { .. } => {}

            ImportEvent::ItemInserted {
                kind: EntityKind::Post,
                id,
                error,
            } => self.post_inserted(*id, error.as_ref()),

            ImportEvent::ItemInserted {
                kind: EntityKind::Comment,
                id,
                error,
            } => self.comment_inserted(*id, error.as_ref()),

            ImportEvent::ItemInserted {
                kind: EntityKind::Term,
                ..
            } => {}

            ImportEvent::TermCreated { name } => {
                self.log(format!("-- Created term \"{}\"", name));
            }

            ImportEvent::TermsAssignedToPost { term_ids, taxonomy } => {
                let ids: Vec<String> = term_ids.iter().map(|id| id.to_string()).collect();
                self.log(format!(
                    "-- Added terms ({}) for taxonomy \"{}\"",
                    ids.join(","),
                    taxonomy
                ));
            }

            ImportEvent::MetaAdded { key, .. } => {
                self.log(format!("-- Added post_meta {}", key));
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
