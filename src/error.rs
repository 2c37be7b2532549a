// ⚠️ Error taxonomy for author reconciliation and import runs
//
// Reconciliation errors are fatal for the whole run and surface before any
// destination write. Per-item insert failures never become an ImportError:
// they travel through the event stream instead (see progress.rs).

use std::path::PathBuf;

// ============================================================================
// DIRECTORY ERRORS
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("Cannot create a user with an empty login name.")]
    EmptyLogin,

    #[error("Sorry, that username already exists: {0}")]
    LoginExists(String),

    #[error("Sorry, that email address is already used: {0}")]
    EmailExists(String),

    #[error("User store error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl DirectoryError {
    /// Short machine-readable code, mirrored in progress warnings
    pub fn code(&self) -> &'static str {
        match self {
            DirectoryError::EmptyLogin => "empty_user_login",
            DirectoryError::LoginExists(_) => "existing_user_login",
            DirectoryError::EmailExists(_) => "existing_user_email",
            DirectoryError::Storage(_) => "db_error",
        }
    }
}

// ============================================================================
// MAPPING PROBLEMS
// ============================================================================

/// Why a mapping could not be used
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MappingProblem {
    /// The mapping file exists but does not carry both columns
    #[error("Author mapping file isn't properly formatted ({}): {detail}", path.display())]
    Malformed { path: PathBuf, detail: String },

    /// These new logins do not resolve to any destination user
    #[error("These user_logins are invalid: {}", .0.join(","))]
    UnresolvedLogins(Vec<String>),
}

// ============================================================================
// IMPORT ERRORS
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// Mapping file is missing one of the two required columns
    #[error("Invalid mapping file format in {}: {detail}", path.display())]
    InvalidFormat { path: PathBuf, detail: String },

    #[error("{0}")]
    InvalidAuthorMapping(MappingProblem),

    #[error("'authors' argument is invalid: {0}")]
    InvalidArgument(String),

    #[error("Couldn't create user for author '{login}': {source}")]
    UserCreationFailed {
        login: String,
        #[source]
        source: DirectoryError,
    },

    #[error("Couldn't create author mapping file {}: {source}", path.display())]
    FileUnwritable {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Import failed due to missing or unreadable file/s.")]
    NoInputFiles,

    #[error("Couldn't parse export file {}: {source}", path.display())]
    ExportUnreadable {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

impl ImportError {
    /// Short machine-readable code for the failure
    pub fn code(&self) -> &'static str {
        match self {
            ImportError::InvalidFormat { .. } => "invalid-format",
            ImportError::InvalidAuthorMapping(_) => "invalid-author-mapping",
            ImportError::InvalidArgument(_) => "invalid-argument",
            ImportError::UserCreationFailed { .. } => "user-creation-failed",
            ImportError::FileUnwritable { .. } => "author-mapping-error",
            ImportError::NoInputFiles => "no-input-files",
            ImportError::ExportUnreadable { .. } => "export-unreadable",
            ImportError::Directory(_) => "directory-error",
        }
    }
}

pub type Result<T> = std::result::Result<T, ImportError>;
