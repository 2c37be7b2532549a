// ⚖️ Author Reconciliation Engine - map every export author to a site user
//
// Strategy precedence (first match wins):
//   1. existing mapping file   → read it, trust it
//   2. "*.csv" that is missing → write suggestions, operator edits, re-run
//   3. "create"                → match by email, then login, else create
//   4. "skip"                  → no remapping at all
//
// Whatever the strategy produced is then validated as a batch: every new
// login must exist before the content import touches the destination.

use crate::authors::{NewUser, SourceAuthor};
use crate::directory::UserDirectory;
use crate::error::{ImportError, MappingProblem, Result};
use crate::mapping::{self, MappingEntry};
use crate::suggestion;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ============================================================================
// AUTHOR STRATEGY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorStrategy {
    /// Mapping file that already exists on disk
    MappingFile(PathBuf),

    /// Mapping file to be generated for the operator to edit
    NewMappingFile(PathBuf),

    /// Create users that don't exist yet
    Create,

    /// Keep authorship as-is
    Skip,
}

impl AuthorStrategy {
    /// Classify the `--authors` selector
    ///
    /// An existing path wins over the keywords, so a file literally named
    /// `create` is read as a mapping file.
    pub fn resolve(selector: &str) -> Result<Self> {
        let path = Path::new(selector);

        if !selector.is_empty() && path.exists() {
            return Ok(AuthorStrategy::MappingFile(path.to_path_buf()));
        }

        if selector.to_lowercase().contains(".csv") {
            return Ok(AuthorStrategy::NewMappingFile(path.to_path_buf()));
        }

        match selector {
            "create" => Ok(AuthorStrategy::Create),
            "skip" => Ok(AuthorStrategy::Skip),
            other => Err(ImportError::InvalidArgument(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AuthorStrategy::MappingFile(_) => "mapping-file",
            AuthorStrategy::NewMappingFile(_) => "new-mapping-file",
            AuthorStrategy::Create => "create",
            AuthorStrategy::Skip => "skip",
        }
    }
}

// ============================================================================
// AUTHOR MAPPING
// ============================================================================

/// Ordered old → new login pairs produced by one reconciliation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorMapping {
    pub entries: Vec<MappingEntry>,
}

impl AuthorMapping {
    pub fn new(entries: Vec<MappingEntry>) -> Self {
        AuthorMapping { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Export-side logins, in mapping order
    pub fn author_in(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.old_login.clone()).collect()
    }

    /// Destination-side logins, parallel to `author_in`
    pub fn author_out(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.new_login.clone()).collect()
    }
}

// ============================================================================
// RECONCILE OUTCOME
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Mapping is ready (possibly empty, for `skip`)
    Mapped(AuthorMapping),

    /// A suggestion file was written; the operator must edit it and re-run
    NeedsOperatorAction(PathBuf),
}

impl ReconcileOutcome {
    pub fn mapping(&self) -> Option<&AuthorMapping> {
        match self {
            ReconcileOutcome::Mapped(mapping) => Some(mapping),
            ReconcileOutcome::NeedsOperatorAction(_) => None,
        }
    }
}

/// Mapping checked against the directory: ready to hand to the importer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedMapping {
    /// Export logins, in mapping order
    pub imported_authors: Vec<String>,

    /// Destination user ids, parallel to `imported_authors`
    pub user_map: Vec<i64>,
}

impl ResolvedMapping {
    /// Destination id for an export login, if it was remapped
    pub fn user_for(&self, old_login: &str) -> Option<i64> {
        self.imported_authors
            .iter()
            .position(|login| login == old_login)
            .map(|i| self.user_map[i])
    }
}

// ============================================================================
// RECONCILIATION ENGINE
// ============================================================================

pub struct ReconciliationEngine<'a, D: UserDirectory + ?Sized> {
    directory: &'a D,
}

impl<'a, D: UserDirectory + ?Sized> ReconciliationEngine<'a, D> {
    pub fn new(directory: &'a D) -> Self {
        ReconciliationEngine { directory }
    }

    /// Classify `selector` and reconcile `authors` with the resulting strategy
    pub fn reconcile_selector(
        &self,
        selector: &str,
        authors: &[SourceAuthor],
    ) -> Result<ReconcileOutcome> {
        let strategy = AuthorStrategy::resolve(selector)?;
        self.reconcile(&strategy, authors)
    }

    pub fn reconcile(
        &self,
        strategy: &AuthorStrategy,
        authors: &[SourceAuthor],
    ) -> Result<ReconcileOutcome> {
        tracing::debug!(strategy = strategy.name(), authors = authors.len(), "reconciling authors");

        match strategy {
            AuthorStrategy::MappingFile(path) => self.read_mapping_file(path),
            AuthorStrategy::NewMappingFile(path) => self.create_mapping_file(path, authors),
            AuthorStrategy::Create => self.create_authors(authors),
            AuthorStrategy::Skip => Ok(ReconcileOutcome::Mapped(AuthorMapping::default())),
        }
    }

    /// Check every new login against the directory in one pass
    ///
    /// All unresolved logins are reported together so the operator can fix
    /// the mapping in one go.
    pub fn validate(&self, mapping: &AuthorMapping) -> Result<ResolvedMapping> {
        let mut user_map = Vec::with_capacity(mapping.len());
        let mut invalid = Vec::new();

        for entry in &mapping.entries {
            match self.directory.find_by_login(&entry.new_login)? {
                Some(user) => user_map.push(user.id),
                None => invalid.push(entry.new_login.clone()),
            }
        }

        if !invalid.is_empty() {
            return Err(ImportError::InvalidAuthorMapping(
                MappingProblem::UnresolvedLogins(invalid),
            ));
        }

        Ok(ResolvedMapping {
            imported_authors: mapping.author_in(),
            user_map,
        })
    }

    /// Strategy 1: the file is authoritative, no matching happens
    fn read_mapping_file(&self, path: &Path) -> Result<ReconcileOutcome> {
        let entries = mapping::read(path).map_err(|err| match err {
            ImportError::InvalidFormat { path, detail } => {
                ImportError::InvalidAuthorMapping(MappingProblem::Malformed { path, detail })
            }
            other => other,
        })?;

        Ok(ReconcileOutcome::Mapped(AuthorMapping::new(entries)))
    }

    /// Strategy 2: write suggestions and stop
    fn create_mapping_file(
        &self,
        path: &Path,
        authors: &[SourceAuthor],
    ) -> Result<ReconcileOutcome> {
        let candidates = self.directory.list_all()?;

        let entries: Vec<MappingEntry> = authors
            .iter()
            .map(|author| {
                MappingEntry::new(&author.login, &suggestion::suggest(author, &candidates))
            })
            .collect();

        mapping::write(path, &entries)?;

        tracing::info!(path = %path.display(), authors = entries.len(), "wrote author mapping suggestions");

        Ok(ReconcileOutcome::NeedsOperatorAction(path.to_path_buf()))
    }

    /// Strategy 3: email match, then login match, else create
    fn create_authors(&self, authors: &[SourceAuthor]) -> Result<ReconcileOutcome> {
        let mut entries = Vec::with_capacity(authors.len());

        for author in authors {
            if let Some(email) = author.email() {
                if let Some(user) = self.directory.find_by_email(email)? {
                    entries.push(MappingEntry::new(&author.login, &user.login));
                    continue;
                }
            }

            if let Some(user) = self.directory.find_by_login(&author.login)? {
                entries.push(MappingEntry::new(&author.login, &user.login));
                continue;
            }

            let user = self
                .directory
                .create(NewUser::from_author(author))
                .map_err(|source| ImportError::UserCreationFailed {
                    login: author.login.clone(),
                    source,
                })?;

            entries.push(MappingEntry::new(&author.login, &user.login));
        }

        Ok(ReconcileOutcome::Mapped(AuthorMapping::new(entries)))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::InMemoryDirectory;
    use proptest::prelude::*;
    use std::fs;

    fn sample_directory() -> InMemoryDirectory {
        InMemoryDirectory::with_users(&[
            ("admin", "admin@example.com", "Site Admin"),
            ("john", "john@example.com", "John Doe"),
        ])
    }

    #[test]
    fn test_resolve_keywords() {
        assert_eq!(AuthorStrategy::resolve("create").unwrap(), AuthorStrategy::Create);
        assert_eq!(AuthorStrategy::resolve("skip").unwrap(), AuthorStrategy::Skip);
        assert!(matches!(
            AuthorStrategy::resolve("bogus"),
            Err(ImportError::InvalidArgument(_))
        ));
        assert!(matches!(
            AuthorStrategy::resolve(""),
            Err(ImportError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_resolve_csv_paths() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("authors.csv");
        fs::write(&existing, "old_user_login,new_user_login\n").unwrap();
        let missing = dir.path().join("NEW.CSV");

        assert_eq!(
            AuthorStrategy::resolve(existing.to_str().unwrap()).unwrap(),
            AuthorStrategy::MappingFile(existing.clone())
        );
        assert_eq!(
            AuthorStrategy::resolve(missing.to_str().unwrap()).unwrap(),
            AuthorStrategy::NewMappingFile(missing.clone())
        );
    }

    #[test]
    fn test_skip_gives_empty_mapping() {
        let directory = sample_directory();
        let engine = ReconciliationEngine::new(&directory);
        let authors = vec![SourceAuthor::new("jdoe"), SourceAuthor::new("editor")];

        let outcome = engine.reconcile(&AuthorStrategy::Skip, &authors).unwrap();

        assert_eq!(outcome, ReconcileOutcome::Mapped(AuthorMapping::default()));
    }

    #[test]
    fn test_create_prefers_email_match_without_creating() {
        let directory = sample_directory();
        let engine = ReconciliationEngine::new(&directory);
        let authors = vec![SourceAuthor::new("jdoe").with_email("john@example.com")];

        let outcome = engine.reconcile(&AuthorStrategy::Create, &authors).unwrap();

        assert_eq!(
            outcome.mapping().unwrap().entries,
            vec![MappingEntry::new("jdoe", "john")]
        );
        assert!(directory.created_logins().is_empty());
    }

    #[test]
    fn test_create_falls_back_to_login_then_creates() {
        let directory = sample_directory();
        let engine = ReconciliationEngine::new(&directory);
        let authors = vec![
            SourceAuthor::new("admin").with_email("someone-else@example.com"),
            SourceAuthor::new("newbie").with_email("newbie@example.com"),
        ];

        let outcome = engine.reconcile(&AuthorStrategy::Create, &authors).unwrap();
        let mapping = outcome.mapping().unwrap();

        assert_eq!(mapping.author_in(), vec!["admin", "newbie"]);
        assert_eq!(mapping.author_out(), vec!["admin", "newbie"]);
        assert_eq!(directory.created_logins(), vec!["newbie".to_string()]);
    }

    #[test]
    fn test_create_failure_aborts_run() {
        let directory = sample_directory();
        let engine = ReconciliationEngine::new(&directory);
        // Second author cannot be created: the directory rejects empty logins
        let authors = vec![SourceAuthor::new("newbie"), SourceAuthor::new("")];

        let err = engine.reconcile(&AuthorStrategy::Create, &authors).unwrap_err();

        assert!(matches!(err, ImportError::UserCreationFailed { .. }));
        assert_eq!(directory.created_logins(), vec!["newbie".to_string()]);
    }

    #[test]
    fn test_existing_mapping_file_is_authoritative() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("authors.csv");
        fs::write(&path, "old_user_login,new_user_login\njdoe,ghost\n").unwrap();

        let directory = sample_directory();
        let engine = ReconciliationEngine::new(&directory);

        let outcome = engine
            .reconcile(&AuthorStrategy::MappingFile(path), &[SourceAuthor::new("jdoe")])
            .unwrap();

        // "ghost" does not exist but reading never second-guesses the file
        assert_eq!(
            outcome.mapping().unwrap().entries,
            vec![MappingEntry::new("jdoe", "ghost")]
        );
    }

    #[test]
    fn test_malformed_mapping_file_is_invalid_author_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("authors.csv");
        fs::write(&path, "old,new\njdoe,john\n").unwrap();

        let directory = sample_directory();
        let engine = ReconciliationEngine::new(&directory);

        let err = engine
            .reconcile(&AuthorStrategy::MappingFile(path), &[])
            .unwrap_err();

        assert!(matches!(
            err,
            ImportError::InvalidAuthorMapping(MappingProblem::Malformed { .. })
        ));
    }

    #[test]
    fn test_new_mapping_file_writes_suggestions_and_needs_action() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("authors.csv");

        let directory = sample_directory();
        let engine = ReconciliationEngine::new(&directory);
        let authors = vec![
            SourceAuthor::new("jdoe").with_email("john@example.com"),
            SourceAuthor::new("stranger"),
        ];

        let outcome = engine
            .reconcile(&AuthorStrategy::NewMappingFile(path.clone()), &authors)
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::NeedsOperatorAction(path.clone()));
        assert_eq!(
            mapping::read(&path).unwrap(),
            vec![
                MappingEntry::new("jdoe", "john"),
                MappingEntry::new("stranger", ""),
            ]
        );
    }

    #[test]
    fn test_validate_reports_all_unresolved_logins_at_once() {
        let directory = sample_directory();
        let engine = ReconciliationEngine::new(&directory);
        let mapping = AuthorMapping::new(vec![
            MappingEntry::new("a", "ghost"),
            MappingEntry::new("b", "admin"),
            MappingEntry::new("c", "phantom"),
        ]);

        let err = engine.validate(&mapping).unwrap_err();

        match err {
            ImportError::InvalidAuthorMapping(MappingProblem::UnresolvedLogins(logins)) => {
                assert_eq!(logins, vec!["ghost".to_string(), "phantom".to_string()]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_validate_builds_parallel_user_map() {
        let directory = sample_directory();
        let engine = ReconciliationEngine::new(&directory);
        let mapping = AuthorMapping::new(vec![
            MappingEntry::new("jdoe", "john"),
            MappingEntry::new("boss", "admin"),
        ]);

        let resolved = engine.validate(&mapping).unwrap();

        assert_eq!(resolved.imported_authors, vec!["jdoe", "boss"]);
        assert_eq!(resolved.user_map, vec![2, 1]);
        assert_eq!(resolved.user_for("boss"), Some(1));
        assert_eq!(resolved.user_for("nobody"), None);
    }

    proptest! {
        #[test]
        fn prop_skip_maps_no_author_and_touches_no_user(
            authors in prop::collection::vec(
                ("\\PC{0,12}", prop::option::of("[a-z]{1,8}@example\\.com")),
                0..10,
            )
        ) {
            let directory = sample_directory();
            let authors: Vec<SourceAuthor> = authors
                .iter()
                .map(|(login, email)| match email {
                    Some(email) => SourceAuthor::new(login).with_email(email),
                    None => SourceAuthor::new(login),
                })
                .collect();

            let outcome = ReconciliationEngine::new(&directory)
                .reconcile(&AuthorStrategy::Skip, &authors)
                .unwrap();

            prop_assert_eq!(outcome, ReconcileOutcome::Mapped(AuthorMapping::default()));
            prop_assert_eq!(directory.count(), 2);
            prop_assert!(directory.created_logins().is_empty());
        }
    }
}
