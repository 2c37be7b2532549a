// 👤 Author identities on both sides of the import
//
// SourceAuthor = who wrote the content in the export (immutable once parsed)
// DestinationUser = who owns it in the target site (read-only to the engine)

use serde::{Deserialize, Serialize};

// ============================================================================
// SOURCE AUTHOR
// ============================================================================

/// Author record as delivered by the export parser
///
/// Only `author_login` is guaranteed; everything else should be in the
/// export but may be missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceAuthor {
    #[serde(rename = "author_login")]
    pub login: String,

    #[serde(rename = "author_email", default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(
        rename = "author_display_name",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub display_name: Option<String>,

    #[serde(
        rename = "author_first_name",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub first_name: Option<String>,

    #[serde(
        rename = "author_last_name",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_name: Option<String>,
}

impl SourceAuthor {
    pub fn new(login: &str) -> Self {
        SourceAuthor {
            login: login.to_string(),
            email: None,
            display_name: None,
            first_name: None,
            last_name: None,
        }
    }

    /// Builder pattern: add email
    pub fn with_email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }

    /// Builder pattern: add first and last name
    pub fn with_names(mut self, first_name: &str, last_name: &str) -> Self {
        self.first_name = Some(first_name.to_string());
        self.last_name = Some(last_name.to_string());
        self
    }

    /// Email if present and non-blank
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref().filter(|e| !e.trim().is_empty())
    }
}

// ============================================================================
// DESTINATION USER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationUser {
    /// Store identifier (what the content importer's user map needs)
    pub id: i64,
    pub login: String,
    pub email: String,
    pub display_name: String,
}

impl DestinationUser {
    /// Text before the `@` of the email (whole email if there is no `@`)
    pub fn email_local_part(&self) -> &str {
        self.email.split('@').next().unwrap_or_default()
    }
}

// ============================================================================
// NEW USER (creation request)
// ============================================================================

/// Fields handed to `UserDirectory::create`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub login: String,
    pub email: String,
    pub display_name: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl NewUser {
    /// Build a creation request from an export author, with a fresh random
    /// credential
    pub fn from_author(author: &SourceAuthor) -> Self {
        NewUser {
            login: author.login.clone(),
            email: author.email.clone().unwrap_or_default(),
            display_name: author
                .display_name
                .clone()
                .unwrap_or_else(|| author.login.clone()),
            first_name: author.first_name.clone().unwrap_or_default(),
            last_name: author.last_name.clone().unwrap_or_default(),
            password: generate_password(),
        }
    }
}

/// Random credential for users created during import
///
/// Nobody is expected to log in with it; operators reset passwords afterwards.
pub fn generate_password() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_author_from_export_record() {
        let json = serde_json::json!({
            "author_login": "jdoe",
            "author_email": "jdoe@example.com",
            "author_display_name": "John Doe",
        });

        let author: SourceAuthor = serde_json::from_value(json).unwrap();

        assert_eq!(author.login, "jdoe");
        assert_eq!(author.email(), Some("jdoe@example.com"));
        assert_eq!(author.display_name.as_deref(), Some("John Doe"));
        assert!(author.first_name.is_none());
    }

    #[test]
    fn test_blank_email_is_treated_as_missing() {
        let author = SourceAuthor::new("jdoe").with_email("  ");
        assert_eq!(author.email(), None);
    }

    #[test]
    fn test_email_local_part() {
        let user = DestinationUser {
            id: 1,
            login: "admin".to_string(),
            email: "site.admin@example.com".to_string(),
            display_name: "Admin".to_string(),
        };
        assert_eq!(user.email_local_part(), "site.admin");
    }

    #[test]
    fn test_new_user_from_author() {
        let author = SourceAuthor::new("jdoe")
            .with_email("jdoe@example.com")
            .with_names("John", "Doe");

        let new_user = NewUser::from_author(&author);

        assert_eq!(new_user.login, "jdoe");
        assert_eq!(new_user.display_name, "jdoe");
        assert_eq!(new_user.first_name, "John");
        assert_eq!(new_user.password.len(), 32);
        assert_ne!(new_user.password, NewUser::from_author(&author).password);
    }
}
