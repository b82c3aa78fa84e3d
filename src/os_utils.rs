//! Utilities pertaining to filesystem and other os-level settings
//!

use camino::{Utf8Path, Utf8PathBuf};
use simple_error::{SimpleResult, bail, try_with};

/// Create a novel directory path if it does not exist already
///
/// If the directory already exists no operations are performed
///
/// * `label` - used to describe the error directory in an error message
///
pub fn create_dir_all(dir: &Utf8Path, label: &str) -> SimpleResult<()> {
    if !dir.is_dir() {
        try_with!(std::fs::create_dir_all(dir), "Can't create new {label} directory at '{dir}'");
    }
    Ok(())
}

fn find_file_dir_impl(dir: &Utf8Path, filename: &str) -> SimpleResult<Option<Utf8PathBuf>> {
    if dir.join(filename).is_file() {
        return Ok(Some(dir.to_owned()));
    }

    let entries = try_with!(dir.read_dir_utf8(), "Unable to read directory '{dir}'");
    let mut subdirs = Vec::new();
    for entry in entries {
        let entry = try_with!(entry, "Unable to read directory entry in '{dir}'");
        let file_type = try_with!(
            entry.file_type(),
            "Unable to get file type of '{}'",
            entry.path()
        );
        if file_type.is_dir() {
            subdirs.push(entry.into_path());
        }
    }
    subdirs.sort();

    for subdir in subdirs {
        if let Some(x) = find_file_dir_impl(&subdir, filename)? {
            return Ok(Some(x));
        }
    }
    Ok(None)
}

/// Find the directory containing `filename` within the tree rooted at `root_dir`
///
/// The root directory is checked first, followed by each subdirectory in sorted name order, depth first.
/// Symlinked directories are not followed.
///
pub fn find_file_dir(root_dir: &Utf8Path, filename: &str) -> SimpleResult<Utf8PathBuf> {
    match find_file_dir_impl(root_dir, filename)? {
        Some(x) => Ok(x),
        None => bail!("Unable to find file '{filename}' in directory '{root_dir}'"),
    }
}
