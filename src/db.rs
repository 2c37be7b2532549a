// 🗄️ SQLite User Store - destination users plus the audit trail of accounts
// an import created
//
// Every account created through `UserDirectory::create` is recorded in the
// `events` table in the same transaction as the user row, tagged with the
// directory's run id so a command can report what it created.

use crate::authors::{DestinationUser, NewUser};
use crate::directory::{ObjectCache, UserDirectory};
use crate::error::DirectoryError;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

const USER_CREATED: &str = "user_created";
const IMPORT_ACTOR: &str = "author_import";

/// A destination account created during an import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserCreatedEvent {
    pub event_id: String,
    /// Directory session that created the account
    pub run_id: String,
    pub timestamp: DateTime<Utc>,
    pub user_id: i64,
    pub user_login: String,
    pub user_email: String,
}

/// JSON payload of a `user_created` row
#[derive(Serialize, Deserialize)]
struct CreatedUserData {
    user_login: String,
    #[serde(default)]
    user_email: String,
}

pub fn setup_database(conn: &Connection) -> rusqlite::Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Users Table
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_login TEXT UNIQUE NOT NULL,
            user_email TEXT NOT NULL DEFAULT '',
            display_name TEXT NOT NULL DEFAULT '',
            first_name TEXT NOT NULL DEFAULT '',
            last_name TEXT NOT NULL DEFAULT '',
            user_pass TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // ==========================================================================
    // Events Table (audit trail)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            run_id TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_users_email ON users(user_email COLLATE NOCASE)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_run ON events(run_id, event_type)",
        [],
    )?;

    Ok(())
}

fn record_user_created(
    conn: &Connection,
    run_id: &str,
    user: &DestinationUser,
) -> rusqlite::Result<()> {
    let data = serde_json::to_string(&CreatedUserData {
        user_login: user.login.clone(),
        user_email: user.email.clone(),
    })
    .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

    conn.execute(
        "INSERT INTO events (
            event_id, run_id, timestamp, event_type, entity_type, entity_id, data, actor
        ) VALUES (?1, ?2, ?3, ?4, 'user', ?5, ?6, ?7)",
        params![
            uuid::Uuid::new_v4().to_string(),
            run_id,
            Utc::now().to_rfc3339(),
            USER_CREATED,
            user.id.to_string(),
            data,
            IMPORT_ACTOR,
        ],
    )?;

    Ok(())
}

fn bad_column<E>(column: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err))
}

fn user_created_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserCreatedEvent> {
    let timestamp: String = row.get(2)?;
    let entity_id: String = row.get(3)?;
    let data: String = row.get(4)?;

    let data: CreatedUserData = serde_json::from_str(&data).map_err(|e| bad_column(4, e))?;

    Ok(UserCreatedEvent {
        event_id: row.get(0)?,
        run_id: row.get(1)?,
        timestamp: DateTime::parse_from_rfc3339(&timestamp)
            .map_err(|e| bad_column(2, e))?
            .with_timezone(&Utc),
        user_id: entity_id.parse().map_err(|e| bad_column(3, e))?,
        user_login: data.user_login,
        user_email: data.user_email,
    })
}

/// SHA-256 hex digest of a credential; plain passwords never hit the table
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// SQLITE DIRECTORY
// ============================================================================

const USER_COLUMNS: &str = "id, user_login, user_email, display_name";

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DestinationUser> {
    Ok(DestinationUser {
        id: row.get(0)?,
        login: row.get(1)?,
        email: row.get(2)?,
        display_name: row.get(3)?,
    })
}

/// User directory backed by the `users` table
///
/// Login lookups are cached; the progress reporter clears the cache
/// periodically during long imports.
pub struct SqliteDirectory {
    conn: Connection,
    login_cache: RefCell<HashMap<String, DestinationUser>>,
    run_id: String,
}

impl SqliteDirectory {
    /// Open (or create) the user store at `path`
    pub fn open(path: &Path) -> Result<Self, DirectoryError> {
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, DirectoryError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> Result<Self, DirectoryError> {
        setup_database(&conn)?;
        Ok(SqliteDirectory {
            conn,
            login_cache: RefCell::new(HashMap::new()),
            run_id: uuid::Uuid::new_v4().to_string(),
        })
    }

    /// Tag written on every audit row this handle creates
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Accounts created through this handle, oldest first
    pub fn created_this_run(&self) -> Result<Vec<UserCreatedEvent>, DirectoryError> {
        let mut stmt = self.conn.prepare(
            "SELECT event_id, run_id, timestamp, entity_id, data
             FROM events
             WHERE run_id = ?1 AND event_type = ?2
             ORDER BY id",
        )?;

        let events = stmt
            .query_map(params![self.run_id, USER_CREATED], user_created_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(events)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Number of cached login lookups
    pub fn cached_logins(&self) -> usize {
        self.login_cache.borrow().len()
    }

    pub fn count(&self) -> Result<i64, DirectoryError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count)
    }
}

impl UserDirectory for SqliteDirectory {
    fn find_by_login(&self, login: &str) -> Result<Option<DestinationUser>, DirectoryError> {
        if let Some(user) = self.login_cache.borrow().get(login) {
            return Ok(Some(user.clone()));
        }

        let user = self
            .conn
            .query_row(
                &format!("SELECT {} FROM users WHERE user_login = ?1", USER_COLUMNS),
                params![login],
                user_from_row,
            )
            .optional()?;

        if let Some(ref user) = user {
            self.login_cache
                .borrow_mut()
                .insert(user.login.clone(), user.clone());
        }

        Ok(user)
    }

    fn find_by_email(&self, email: &str) -> Result<Option<DestinationUser>, DirectoryError> {
        if email.is_empty() {
            return Ok(None);
        }

        let user = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM users WHERE user_email = ?1 COLLATE NOCASE ORDER BY id LIMIT 1",
                    USER_COLUMNS
                ),
                params![email],
                user_from_row,
            )
            .optional()?;

        Ok(user)
    }

    fn list_all(&self) -> Result<Vec<DestinationUser>, DirectoryError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS))?;

        let users = stmt
            .query_map([], user_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(users)
    }

    fn create(&self, new_user: NewUser) -> Result<DestinationUser, DirectoryError> {
        if new_user.login.trim().is_empty() {
            return Err(DirectoryError::EmptyLogin);
        }
        if self.find_by_login(&new_user.login)?.is_some() {
            return Err(DirectoryError::LoginExists(new_user.login));
        }
        if self.find_by_email(&new_user.email)?.is_some() {
            return Err(DirectoryError::EmailExists(new_user.email));
        }

        // User row and audit row land together or not at all
        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO users (
                user_login, user_email, display_name, first_name, last_name, user_pass
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                new_user.login,
                new_user.email,
                new_user.display_name,
                new_user.first_name,
                new_user.last_name,
                hash_password(&new_user.password),
            ],
        )?;

        let user = DestinationUser {
            id: tx.last_insert_rowid(),
            login: new_user.login,
            email: new_user.email,
            display_name: new_user.display_name,
        };

        record_user_created(&tx, &self.run_id, &user)?;
        tx.commit()?;

        tracing::info!(login = %user.login, id = user.id, "created destination user");

        Ok(user)
    }
}

impl ObjectCache for SqliteDirectory {
    fn clear(&self) {
        self.login_cache.borrow_mut().clear();
    }
}
