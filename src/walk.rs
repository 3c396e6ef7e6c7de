//! Directory enumeration and the filesystem primitives the movers use.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use walkdir::WalkDir;

use crate::classify::DiscoveredFile;
use crate::{normalize_separators, os_str_to_string, path_to_string};

static RE_SEASON_FOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[sS](\d+)").expect("Failed to create regex pattern for season folder"));

static RE_SEASON_WORD_FOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[sS]eason[ ._-](\d+)").expect("Failed to create regex pattern for season word"));

/// A file found under a show tree, with the season inferred from its
/// immediate parent folder (`s00` when the folder carries no season marker).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonFile {
    pub directory: PathBuf,
    pub season: String,
    pub file_name: String,
}

/// Recursively list all files under the given root.
///
/// # Errors
/// Returns an error if the root cannot be read.
pub fn list_files(root: &Path) -> Result<Vec<DiscoveredFile>> {
    if !root.is_dir() {
        anyhow::bail!("Not a directory: {}", root.display());
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(root).into_iter().filter_map(std::result::Result::ok) {
        if entry.file_type().is_file() {
            let directory = entry.path().parent().unwrap_or(root).to_path_buf();
            files.push(DiscoveredFile::new(directory, os_str_to_string(entry.file_name())));
        }
    }
    Ok(files)
}

/// List the top-level show folder names under the given root.
///
/// # Errors
/// Returns an error if the root cannot be read.
pub fn list_show_folders(root: &Path) -> Result<Vec<String>> {
    let mut shows = Vec::new();
    for entry in fs::read_dir(root).with_context(|| format!("Failed to read directory: {}", root.display()))? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            shows.push(os_str_to_string(&entry.file_name()));
        }
    }
    shows.sort();
    Ok(shows)
}

/// Season code inferred from a folder name: `s05`, `Season 5` and the
/// separator variants all map to `s05`; anything else maps to `s00`.
#[must_use]
pub fn season_from_folder(folder_name: &str) -> String {
    RE_SEASON_FOLDER
        .captures(folder_name)
        .or_else(|| RE_SEASON_WORD_FOLDER.captures(folder_name))
        .and_then(|caps| caps.get(1))
        .map_or_else(|| "s00".to_string(), |num| format!("s{:0>2}", num.as_str()))
}

/// Recursively list all files under one show tree, tagging each with the
/// season inferred from its immediate parent folder.
///
/// # Errors
/// Returns an error if the show root cannot be read.
pub fn list_season_files(show_root: &Path) -> Result<Vec<SeasonFile>> {
    if !show_root.is_dir() {
        anyhow::bail!("Not a directory: {}", show_root.display());
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(show_root).into_iter().filter_map(std::result::Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(directory) = entry.path().parent() else {
            continue;
        };
        let folder_name = crate::path_to_filename_string(directory);
        files.push(SeasonFile {
            directory: directory.to_path_buf(),
            season: season_from_folder(&folder_name),
            file_name: os_str_to_string(entry.file_name()),
        });
    }
    Ok(files)
}

/// How a single file gets from one root to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOperation {
    /// Crossing a storage boundary: read and write the bytes.
    Copy,
    /// Purely local relocation, e.g. staging to target or in-place cleaning.
    Rename,
}

impl FileOperation {
    /// Execute this operation for one file. The destination parent directory
    /// must already exist.
    ///
    /// # Errors
    /// Returns an error if the underlying filesystem call fails.
    pub fn execute(self, source: &Path, destination: &Path) -> Result<()> {
        match self {
            Self::Copy => {
                fs::copy(source, destination)
                    .map(|_| ())
                    .with_context(|| format!("Failed to copy {} -> {}", source.display(), destination.display()))
            }
            Self::Rename => fs::rename(source, destination)
                .with_context(|| format!("Failed to rename {} -> {}", source.display(), destination.display())),
        }
    }

    /// Reverse an executed operation. A copy is undone by removing the
    /// destination; a rename is undone by moving the file back, since the
    /// destination is the only remaining copy.
    ///
    /// # Errors
    /// Returns an error if the underlying filesystem call fails.
    pub fn undo(self, source: &Path, destination: &Path) -> Result<()> {
        match self {
            Self::Copy => remove_file_if_exists(destination),
            Self::Rename => fs::rename(destination, source).with_context(|| {
                format!("Failed to restore {} -> {}", destination.display(), source.display())
            }),
        }
    }
}

/// Pick the operation for moving files rooted at `source_root` into
/// `target_root`: rename when the run operates on the target tree itself,
/// copy when crossing a storage boundary.
#[must_use]
pub fn choose_operation(source_root: &Path, target_root: &Path) -> FileOperation {
    if normalize_separators(&path_to_string(source_root)) == normalize_separators(&path_to_string(target_root)) {
        FileOperation::Rename
    } else {
        FileOperation::Copy
    }
}

/// Remove a file, treating "not found" as success.
///
/// # Errors
/// Returns an error for any failure other than the file being absent.
pub fn remove_file_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
    }
}

/// Delete and recreate a directory tree. Used to reset the staging root.
///
/// # Errors
/// Returns an error if the tree cannot be removed or recreated.
pub fn reset_directory(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path).with_context(|| format!("Failed to remove directory tree {}", path.display()))?;
    }
    fs::create_dir_all(path).with_context(|| format!("Failed to create directory {}", path.display()))
}

/// Create a directory and any missing parents; no-op if it already exists.
///
/// # Errors
/// Returns an error if creation fails.
pub fn ensure_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path).with_context(|| format!("Failed to create directory {}", path.display()))
}
