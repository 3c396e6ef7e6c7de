//! Partition discovered files into video and subtitle candidates.

use std::path::PathBuf;

use crate::extensions::{ExtensionClass, split_name_and_extension};
use crate::is_hidden_name;

/// Raw directory enumeration result. Owned transiently by a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    pub directory: PathBuf,
    pub file_name: String,
}

impl DiscoveredFile {
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            file_name: file_name.into(),
        }
    }
}

/// A file that survived classification, split into stem and extension.
///
/// The stem keeps its on-disk casing; the extension is lowercased for
/// classification and destination names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub directory: PathBuf,
    pub file_name: String,
    pub stem: String,
    pub extension: String,
}

impl MediaFile {
    /// Full source path of this file.
    #[must_use]
    pub fn source_path(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }
}

fn media_file(file: &DiscoveredFile, stem: &str, extension: &str) -> MediaFile {
    MediaFile {
        directory: file.directory.clone(),
        file_name: file.file_name.clone(),
        stem: stem.to_string(),
        extension: extension.to_string(),
    }
}

/// Split discovered files into video and subtitle candidates.
///
/// Files without a resolvable 2-4 character extension are excluded, not an
/// error. Subtitles are recorded before the video filters so a subtitle next
/// to a sample video is still found. Hidden files and anything containing
/// `sample` never become video candidates. With `preferred_only` set, only
/// the preferred container formats count as video.
#[must_use]
pub fn classify(files: &[DiscoveredFile], preferred_only: bool) -> (Vec<MediaFile>, Vec<MediaFile>) {
    let mut video_files = Vec::new();
    let mut subtitle_files = Vec::new();

    for file in files {
        let Some((stem, extension)) = split_name_and_extension(&file.file_name) else {
            continue;
        };

        let class = ExtensionClass::from_extension(&extension);

        if class.is_subtitle() {
            subtitle_files.push(media_file(file, stem, &extension));
        }

        let allowed = if preferred_only {
            class == ExtensionClass::PreferredVideo
        } else {
            class.is_video()
        };
        if !allowed {
            continue;
        }
        if is_hidden_name(&file.file_name) {
            continue;
        }
        if file.file_name.to_lowercase().contains("sample") {
            continue;
        }

        video_files.push(media_file(file, stem, &extension));
    }

    (video_files, subtitle_files)
}
