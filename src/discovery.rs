use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;

use crate::error::ConvertError;

/// Recursively collect the files under `root` whose name matches `pattern`,
/// sorted lexicographically by full path so repeated runs process files in
/// the same order and summaries stay reproducible.
///
/// Fails only when `root` is missing, not a directory, or the pattern is
/// invalid. Unreadable subdirectories are skipped here; a file that slips
/// through in a bad state still fails per file at conversion time.
/// Directory symlinks are not followed; symlinks to regular files are
/// candidates like any other file.
pub fn discover_logs(root: &Path, pattern: &str) -> Result<Vec<PathBuf>, ConvertError> {
    if !root.is_dir() {
        return Err(ConvertError::DirectoryNotFound(root.to_path_buf()));
    }
    let matcher = Pattern::new(pattern).map_err(|source| ConvertError::BadPattern {
        pattern: pattern.to_string(),
        source,
    })?;

    let mut found = Vec::new();
    walk(root, &matcher, &mut found);
    found.sort();
    Ok(found)
}

fn walk(dir: &Path, matcher: &Pattern, found: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return,
    };
    for entry in entries.flatten() {
        let path = entry.path();
        // Recurse into real directories only. A symlinked directory is never
        // followed, so a link cycle under the root cannot loop the walk; a
        // symlink to a regular file still counts as a candidate.
        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(_) => continue,
        };
        if file_type.is_dir() {
            walk(&path, matcher, found);
        } else if path.is_file()
            && path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| matcher.matches(name))
        {
            found.push(path);
        }
    }
}
