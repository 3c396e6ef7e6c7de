//! File extension tables for video and subtitle classification.

/// Container formats the media server plays natively.
pub static PREFERRED_VIDEO_EXTENSIONS: [&str; 2] = ["mkv", "mp4"];

/// Everything else that still counts as video.
pub static OTHER_VIDEO_EXTENSIONS: [&str; 34] = [
    "flv", "f4p", "ogv", "asf", "amv", "mpg", "f4b", "yuv", "nsv", "svi", "mov", "f4v", "qt", "3gp", "mxf", "mp2",
    "gif", "roq", "drc", "gifv", "mpe", "rm", "wmv", "webm", "mpeg", "ogg", "m2v", "mng", "m2ts", "mts", "avi", "rmvb",
    "vob", "m4v",
];

pub static SUBTITLE_EXTENSIONS: [&str; 3] = ["srt", "idx", "sub"];

/// Classification of a file extension, derived from the fixed tables above.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionClass {
    PreferredVideo,
    OtherVideo,
    Subtitle,
    Unrecognized,
}

impl ExtensionClass {
    /// Classify a lowercased extension against the fixed tables.
    #[must_use]
    pub fn from_extension(extension: &str) -> Self {
        if PREFERRED_VIDEO_EXTENSIONS.contains(&extension) {
            Self::PreferredVideo
        } else if OTHER_VIDEO_EXTENSIONS.contains(&extension) {
            Self::OtherVideo
        } else if SUBTITLE_EXTENSIONS.contains(&extension) {
            Self::Subtitle
        } else {
            Self::Unrecognized
        }
    }

    /// True for both preferred and other video containers.
    #[must_use]
    pub const fn is_video(self) -> bool {
        matches!(self, Self::PreferredVideo | Self::OtherVideo)
    }

    #[must_use]
    pub const fn is_subtitle(self) -> bool {
        matches!(self, Self::Subtitle)
    }
}

/// Split a filename into its stem and lowercased extension.
///
/// Requires a trailing `.ext` of 2-4 alphanumeric characters; names without
/// one return `None` and stay invisible to the pipeline. The stem keeps its
/// original casing.
#[must_use]
pub fn split_name_and_extension(file_name: &str) -> Option<(&str, String)> {
    let (stem, extension) = file_name.rsplit_once('.')?;
    if stem.is_empty()
        || !(2..=4).contains(&extension.len())
        || !extension.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some((stem, extension.to_ascii_lowercase()))
}
