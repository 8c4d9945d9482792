//! Source file discovery
//!
//! Expands the paths given on the command line into the files to check.

use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Suffix a file inside a directory must carry to be checked.
pub const SOURCE_SUFFIX: &str = ".py";

/// Iterate over every Python source file in `paths`.
///
/// Directories are walked recursively and only `.py` files inside them are
/// yielded. Anything else is yielded as-is: an explicitly named file is
/// trusted whatever its extension.
pub fn iter_source_code<P: AsRef<Path>>(paths: &[P]) -> impl Iterator<Item = PathBuf> + '_ {
    paths.iter().flat_map(|path| {
        let path = path.as_ref();
        let files: Box<dyn Iterator<Item = PathBuf>> = if path.is_dir() {
            Box::new(walk_dir(path))
        } else {
            Box::new(std::iter::once(path.to_path_buf()))
        };
        files
    })
}

fn walk_dir(root: &Path) -> impl Iterator<Item = PathBuf> {
    let root = root.to_path_buf();
    WalkDir::new(&root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(move |entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                None
            }
        })
        .filter(|entry| !entry.file_type().is_dir())
        .filter(|entry| {
            entry
                .file_name()
                .to_string_lossy()
                .ends_with(SOURCE_SUFFIX)
        })
        .map(|entry| entry.into_path())
}
