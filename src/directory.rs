// 📇 Destination User Directory
//
// The reconciliation engine only sees users through this trait, so it runs
// the same against the SQLite store (CLI) and the in-memory registry (tests,
// embedding in other tools).

use crate::authors::{DestinationUser, NewUser};
use crate::error::DirectoryError;
use std::sync::{Arc, RwLock};

// ============================================================================
// CAPABILITIES
// ============================================================================

/// Lookup (and, for the `create` strategy, creation) of destination users
pub trait UserDirectory {
    fn find_by_login(&self, login: &str) -> Result<Option<DestinationUser>, DirectoryError>;

    fn find_by_email(&self, email: &str) -> Result<Option<DestinationUser>, DirectoryError>;

    /// Full candidate pool, in store order (used by the suggester)
    fn list_all(&self) -> Result<Vec<DestinationUser>, DirectoryError>;

    fn create(&self, new_user: NewUser) -> Result<DestinationUser, DirectoryError>;
}

/// Something holding cached lookups that can be dropped to reclaim memory
pub trait ObjectCache {
    fn clear(&self);
}

// ============================================================================
// IN-MEMORY DIRECTORY
// ============================================================================

/// Directory kept entirely in memory
///
/// Cloning shares the same user list.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    users: Arc<RwLock<Vec<DestinationUser>>>,
    created: Arc<RwLock<Vec<String>>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory pre-populated with `(login, email, display_name)` rows
    pub fn with_users(users: &[(&str, &str, &str)]) -> Self {
        let directory = Self::new();
        for (login, email, display_name) in users {
            directory.insert(login, email, display_name);
        }
        directory
    }

    /// Add a user directly, bypassing creation bookkeeping
    pub fn insert(&self, login: &str, email: &str, display_name: &str) -> DestinationUser {
        let mut users = self.users.write().unwrap_or_else(|e| e.into_inner());
        let user = DestinationUser {
            id: users.len() as i64 + 1,
            login: login.to_string(),
            email: email.to_string(),
            display_name: display_name.to_string(),
        };
        users.push(user.clone());
        user
    }

    /// Logins created through `UserDirectory::create`, in order
    pub fn created_logins(&self) -> Vec<String> {
        self.created
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn count(&self) -> usize {
        self.users.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl UserDirectory for InMemoryDirectory {
    fn find_by_login(&self, login: &str) -> Result<Option<DestinationUser>, DirectoryError> {
        let users = self.users.read().unwrap_or_else(|e| e.into_inner());
        Ok(users.iter().find(|u| u.login == login).cloned())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<DestinationUser>, DirectoryError> {
        if email.is_empty() {
            return Ok(None);
        }
        let users = self.users.read().unwrap_or_else(|e| e.into_inner());
        Ok(users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    fn list_all(&self) -> Result<Vec<DestinationUser>, DirectoryError> {
        Ok(self.users.read().unwrap_or_else(|e| e.into_inner()).clone())
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

        let user = self.insert(&new_user.login, &new_user.email, &new_user.display_name);
        self.created
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(user.login.clone());

        Ok(user)
    }
}

/// Nothing is cached in front of the shared list
impl ObjectCache for InMemoryDirectory {
    fn clear(&self) {}
}
