//! Build rename change sets from classified files.

use std::path::{Path, PathBuf};

use crate::classify::MediaFile;
use crate::cleaner::{episode_code, movie_name, season_from_name, special_file_name, tv_show_name};
use crate::extensions::{ExtensionClass, split_name_and_extension};
use crate::walk::SeasonFile;
use crate::{is_hidden_name, paths_are_equal};

/// A single pending rename. Inert until executed by the mover.
///
/// The destination is always rooted under the configured target path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEntry {
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl ChangeEntry {
    #[must_use]
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }

    /// Destination filename for log lines.
    #[must_use]
    pub fn new_name(&self) -> String {
        crate::path_to_filename_string(&self.destination)
    }

    /// Source filename for log lines.
    #[must_use]
    pub fn old_name(&self) -> String {
        crate::path_to_filename_string(&self.source)
    }
}

/// Movie change set plus the names that could not be resolved.
#[derive(Debug, Default)]
pub struct MovieChangeSet {
    pub changes: Vec<ChangeEntry>,
    /// Stems with no year token or a degenerate cleaned name. Skips, not errors.
    pub skipped: Vec<String>,
}

/// TV change set for one show.
///
/// Odd names always land in `s00` and are moved by a simpler path than the
/// staged episode changes, hence the separate list.
#[derive(Debug, Default)]
pub struct ShowChangeSet {
    pub show_name: String,
    pub changes: Vec<ChangeEntry>,
    pub odd_names: Vec<ChangeEntry>,
}

/// Build the movie change set: one entry per resolvable video, plus one for
/// its matching subtitle when a subtitle shares the exact stem.
///
/// The subtitle language tag is hardcoded to `eng`; there is no language
/// detection. At most one subtitle is matched per video, first match wins.
#[must_use]
pub fn movie_changes(videos: &[MediaFile], subtitles: &[MediaFile], target_root: &Path) -> MovieChangeSet {
    let mut result = MovieChangeSet::default();

    for video in videos {
        let Some(new_name) = movie_name(&video.stem) else {
            result.skipped.push(video.file_name.clone());
            continue;
        };
        if new_name == format!(".{}", video.extension) {
            result.skipped.push(video.file_name.clone());
            continue;
        }

        result.changes.push(ChangeEntry::new(
            video.source_path(),
            target_root.join(format!("{}.{}", new_name, video.extension)),
        ));

        if let Some(subtitle) = subtitles.iter().find(|sub| sub.stem == video.stem) {
            result.changes.push(ChangeEntry::new(
                subtitle.source_path(),
                target_root.join(format!("{}.eng.{}", new_name, subtitle.extension)),
            ));
        }
    }

    result
}

/// Build the change set for one show from its enumerated season files.
///
/// `raw_show_name` is the on-disk folder name; destinations use the cleaned
/// show name. A season marker in the filename overrides the folder-inferred
/// season. Files with no episode marker go to the odd-names list under
/// `s00`; renames that would be no-ops are dropped.
#[must_use]
pub fn show_changes(raw_show_name: &str, files: &[SeasonFile], target_root: &Path) -> ShowChangeSet {
    let show_name = tv_show_name(raw_show_name);
    let show_root = target_root.join(&show_name);

    let mut result = ShowChangeSet {
        show_name,
        ..ShowChangeSet::default()
    };

    for file in files {
        if is_hidden_name(&file.file_name) {
            continue;
        }
        // Guards against non-season directories accidentally being walked
        if !file.season.starts_with('s') || !file.season[1..].chars().all(|c| c.is_ascii_digit()) {
            continue;
        }

        // A season embedded in the filename wins over the folder (handles
        // misplaced files)
        let season = season_from_name(&file.file_name)
            .filter(|from_name| from_name != &file.season)
            .unwrap_or_else(|| file.season.clone());

        let Some((_, extension)) = split_name_and_extension(&file.file_name) else {
            continue;
        };
        if ExtensionClass::from_extension(&extension) == ExtensionClass::Unrecognized {
            continue;
        }

        let old_path = file.directory.join(&file.file_name);

        let Some(episode) = episode_code(&file.file_name, &season) else {
            result.odd_names.push(ChangeEntry::new(
                old_path,
                show_root.join("s00").join(special_file_name(&file.file_name)),
            ));
            continue;
        };

        let new_path = show_root
            .join(&episode.season)
            .join(format!("{}.{}", episode.code(), extension));

        if !paths_are_equal(&old_path, &new_path) {
            result.changes.push(ChangeEntry::new(old_path, new_path));
        }
    }

    result
}
