// 🗺️ Mapping File Codec
//
// Two-column CSV that tells the importer which destination user owns the
// content of each export author:
//
//   old_user_login,new_user_login
//   jdoe,john
//   editor,admin

use crate::error::{ImportError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const OLD_LOGIN_COLUMN: &str = "old_user_login";
pub const NEW_LOGIN_COLUMN: &str = "new_user_login";

// ============================================================================
// MAPPING ENTRY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    #[serde(rename = "old_user_login")]
    pub old_login: String,

    #[serde(rename = "new_user_login")]
    pub new_login: String,
}

impl MappingEntry {
    pub fn new(old_login: &str, new_login: &str) -> Self {
        MappingEntry {
            old_login: old_login.to_string(),
            new_login: new_login.to_string(),
        }
    }
}

// ============================================================================
// READ / WRITE
// ============================================================================

/// Read a mapping file
///
/// The header must name both columns and every record must carry both;
/// otherwise the whole file is rejected. Extra columns are ignored.
pub fn read(path: &Path) -> Result<Vec<MappingEntry>> {
    let invalid = |detail: String| ImportError::InvalidFormat {
        path: path.to_path_buf(),
        detail,
    };

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| invalid(e.to_string()))?;

    let headers = rdr.headers().map_err(|e| invalid(e.to_string()))?.clone();
    let column = |name: &str| headers.iter().position(|h| h.trim() == name);

    let (old_idx, new_idx) = match (column(OLD_LOGIN_COLUMN), column(NEW_LOGIN_COLUMN)) {
        (Some(old_idx), Some(new_idx)) => (old_idx, new_idx),
        _ => {
            return Err(invalid(format!(
                "header must name both '{}' and '{}'",
                OLD_LOGIN_COLUMN, NEW_LOGIN_COLUMN
            )))
        }
    };

    let mut entries = Vec::new();

    for (i, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| invalid(e.to_string()))?;

        // Record numbers are 1-based and skip the header
        let (old_login, new_login) = match (record.get(old_idx), record.get(new_idx)) {
            (Some(old_login), Some(new_login)) => (old_login, new_login),
            _ => return Err(invalid(format!("record {} is missing a column", i + 1))),
        };

        entries.push(MappingEntry::new(old_login, new_login));
    }

    tracing::debug!(path = %path.display(), entries = entries.len(), "read author mapping");

    Ok(entries)
}

/// Write a mapping file (header + one row per entry, in order)
///
/// Creates the file, or truncates it if it already exists.
pub fn write(path: &Path, entries: &[MappingEntry]) -> Result<()> {
    let unwritable = |source: csv::Error| ImportError::FileUnwritable {
        path: path.to_path_buf(),
        source,
    };

    let mut wtr = csv::Writer::from_path(path).map_err(unwritable)?;

    // Header is written explicitly so an empty author list still produces a
    // valid file
    wtr.write_record([OLD_LOGIN_COLUMN, NEW_LOGIN_COLUMN])
        .map_err(unwritable)?;

    for entry in entries {
        wtr.write_record([entry.old_login.as_str(), entry.new_login.as_str()])
            .map_err(unwritable)?;
    }

    wtr.flush()
        .map_err(|e| unwritable(csv::Error::from(e)))?;

    tracing::debug!(path = %path.display(), entries = entries.len(), "wrote author mapping");

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::fs;

    #[test]
    fn test_read_back_written_entries_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("authors.csv");

        let entries = vec![
            MappingEntry::new("zed", "admin"),
            MappingEntry::new("jdoe", "john"),
            MappingEntry::new("editor, chief", ""),
        ];

        write(&path, &entries).unwrap();
        let read_back = read(&path).unwrap();

        assert_eq!(read_back, entries);
    }

    #[test]
    fn test_written_file_starts_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("authors.csv");

        write(&path, &[MappingEntry::new("jdoe", "john")]).unwrap();
        let contents = fs::read_to_string(&path).unwrap();

        assert_eq!(contents, "old_user_login,new_user_login\njdoe,john\n");
    }

    #[test]
    fn test_empty_mapping_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("authors.csv");

        write(&path, &[]).unwrap();

        assert_eq!(read(&path).unwrap(), Vec::<MappingEntry>::new());
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "old_user_login,new_user_login\n"
        );
    }

    #[test]
    fn test_missing_column_in_header_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("authors.csv");
        fs::write(&path, "old_user_login,login\njdoe,john\n").unwrap();

        let err = read(&path).unwrap_err();
        assert!(matches!(err, ImportError::InvalidFormat { .. }));
    }

    #[test]
    fn test_row_missing_a_column_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("authors.csv");
        fs::write(&path, "old_user_login,new_user_login\njdoe,john\neditor\n").unwrap();

        let err = read(&path).unwrap_err();
        assert!(matches!(err, ImportError::InvalidFormat { .. }));
        assert!(err.to_string().contains("record 2"));
    }

    #[test]
    fn test_extra_columns_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("authors.csv");
        fs::write(
            &path,
            "note,new_user_login,old_user_login\nmoved,john,jdoe\n",
        )
        .unwrap();

        assert_eq!(read(&path).unwrap(), vec![MappingEntry::new("jdoe", "john")]);
    }

    #[test]
    fn test_write_to_missing_directory_is_unwritable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("authors.csv");

        let err = write(&path, &[]).unwrap_err();
        assert!(matches!(err, ImportError::FileUnwritable { .. }));
    }

    // ========================================================================
    // Properties
    // ========================================================================

    /// Logins including CSV-significant characters and the empty string
    fn login() -> impl Strategy<Value = String> {
        prop_oneof![
            Just(String::new()),
            "[a-z0-9_.@-]{1,12}",
            "[a-z ,\"'\r\n\t]{1,10}",
            "\\PC{0,8}",
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_written_entries_read_back_unchanged(
            pairs in prop::collection::vec((login(), login()), 0..8)
        ) {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("authors.csv");
            let entries: Vec<MappingEntry> = pairs
                .iter()
                .map(|(old_login, new_login)| MappingEntry::new(old_login, new_login))
                .collect();

            write(&path, &entries).unwrap();

            prop_assert_eq!(read(&path).unwrap(), entries);
        }

        #[test]
        fn prop_header_without_both_columns_is_invalid(
            required in prop_oneof![
                Just(None),
                Just(Some(OLD_LOGIN_COLUMN)),
                Just(Some(NEW_LOGIN_COLUMN)),
            ],
            extra in prop::collection::vec("[a-z_]{1,10}", 1..4),
            rows in prop::collection::vec("[a-z]{1,6}", 0..3),
        ) {
            let mut header = extra;
            if let Some(column) = required {
                header.push(column.to_string());
            }

            let mut contents = header.join(",");
            contents.push('\n');
            for value in &rows {
                contents.push_str(&vec![value.as_str(); header.len()].join(","));
                contents.push('\n');
            }

            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("authors.csv");
            fs::write(&path, contents).unwrap();

            let invalid = matches!(read(&path), Err(ImportError::InvalidFormat { .. }));
            prop_assert!(invalid);
        }
    }
}
