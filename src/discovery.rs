// 🔎 Input discovery - turn CLI arguments into export files
//
// Each argument is a file or a directory. Directories contribute the files
// whose extension the export source reads (non-recursive); problems with
// single arguments are warnings, only "nothing usable at all" is an error.

use crate::error::{ImportError, Result};
use crate::progress::{LogLine, LogSink};
use std::fs;
use std::path::{Path, PathBuf};

/// Expand `args` into export files
///
/// Explicit file arguments are kept whatever their extension; directories
/// only contribute files matching `extensions`.
pub fn discover_inputs<S: LogSink>(
    args: &[PathBuf],
    extensions: &[&str],
    sink: &mut S,
) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for arg in args {
        if arg.is_dir() {
            let found = export_files_in(arg, extensions);
            if found.is_empty() {
                sink.emit(LogLine::warning(format!(
                    "No files found in the import directory '{}'.",
                    arg.display()
                )));
            }
            files.extend(found);
            continue;
        }

        if !arg.exists() {
            sink.emit(LogLine::warning(format!(
                "File '{}' doesn't exist.",
                arg.display()
            )));
            continue;
        }

        if fs::File::open(arg).is_ok() {
            files.push(arg.clone());
            continue;
        }

        sink.emit(LogLine::warning(format!(
            "Cannot read file '{}'.",
            arg.display()
        )));
    }

    if files.is_empty() {
        return Err(ImportError::NoInputFiles);
    }

    tracing::debug!(files = files.len(), "discovered export files");

    Ok(files)
}

/// Export files directly inside `dir`, grouped by extension then sorted
fn export_files_in(dir: &Path, extensions: &[&str]) -> Vec<PathBuf> {
    let entries: Vec<PathBuf> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .collect(),
        Err(err) => {
            tracing::warn!(dir = %dir.display(), error = %err, "cannot list import directory");
            return Vec::new();
        }
    };

    let mut files = Vec::new();
    for extension in extensions {
        let mut matching: Vec<PathBuf> = entries
            .iter()
            .filter(|path| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .map_or(false, |e| e == *extension)
            })
            .cloned()
            .collect();
        matching.sort();
        files.extend(matching);
    }

    files
}
