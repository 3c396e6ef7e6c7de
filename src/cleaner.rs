//! Name normalization for movie titles, show folders and episode files.
//!
//! Turns loosely-structured release names into the canonical forms used on
//! the target filesystem: `Title_(Year)` for movies, `sNNeMM` codes for
//! episodes.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Release tags stripped from movie and show titles.
///
/// Removal is a verbatim substring match against the already-underscored
/// title, so tags written with different casing than stored here survive.
/// Known imprecision, kept as-is.
pub static COMMON_TOKENS: [&str; 11] = [
    "web", "bluray", "dvdrip", "2160p", "1080p", "720p", "4k", "hd", "x264", "x265", "5.1",
];

/// Last 4-digit year token wins: release names sometimes embed a year-like
/// number earlier, e.g. in a resolution tag.
static RE_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(19|20)\d{2}").expect("Failed to create regex pattern for year"));

static RE_SEASON_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[sS]\d+").expect("Failed to create regex pattern for season marker"));

/// Separators replaced with underscores. U+A789 is the visually-similar
/// but distinct colon-like character seen in some release names.
static RE_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.()_:\u{A789}, ]").expect("Failed to create regex pattern for separators"));

static RE_APOSTROPHES_AND_BRACKETS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\[\]']").expect("Failed to create regex pattern for brackets"));

static RE_SPECIAL_SYMBOLS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[ \-\[\]+=,./;:'`~!@#$%^&*]").expect("Failed to create regex pattern for special symbols")
});

static RE_UNDERSCORE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_+").expect("Failed to create regex pattern for underscore runs"));

/// Composite episode pattern: optional season marker, mandatory episode
/// marker, optional multi-episode extension, optional part marker.
static RE_EPISODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?P<season>[sS]?(?P<season_num>\d+))?[\-_ ]?[xeE](?P<episode_num>\d+)(?P<episode_num_ext>-?[xeE]?\d+)?(?:-(?P<part_num>(?:pt|part)\d))?",
    )
    .expect("Failed to create regex pattern for episode markers")
});

/// Strongly-typed result of a successful episode match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeDescriptor {
    /// Two-digit zero-padded season code, e.g. `s01`.
    pub season: String,
    /// Two-digit zero-padded primary episode number.
    pub episode_num: String,
    /// Empty, or a multi-episode continuation normalized to `-eNN`.
    pub episode_num_ext: String,
    /// Empty, or a multi-part marker normalized to `ptN`.
    pub part_num: String,
}

impl EpisodeDescriptor {
    /// Canonical episode code, e.g. `s01e02-e03pt1`.
    #[must_use]
    pub fn code(&self) -> String {
        format!(
            "{}e{}{}{}",
            self.season, self.episode_num, self.episode_num_ext, self.part_num
        )
    }
}

impl fmt::Display for EpisodeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Replace separators with underscores, strip apostrophes and brackets,
/// and drop release tokens. Shared by movie and show title cleaning.
fn normalize_title(raw_title: &str) -> String {
    let underscored = RE_SEPARATORS.replace_all(raw_title, "_");
    let mut title = RE_APOSTROPHES_AND_BRACKETS.replace_all(&underscored, "").into_owned();

    for token in COMMON_TOKENS {
        if title.contains(token) {
            title = title.replace(token, "");
        }
    }

    title
}

/// Collapse runs of 2+ underscores to one, repeatedly until stable.
fn collapse_underscores(name: &str) -> String {
    RE_UNDERSCORE_RUNS.replace_all(name, "_").into_owned()
}

/// Canonical movie name `Title_(Year)` from a raw release name.
///
/// The year is the *last* 4-digit 19xx/20xx token in the name; everything
/// before it is the working title. Returns `None` when no year token exists
/// or the result degenerates to underscore noise; callers treat that as
/// "skip", not an error.
#[must_use]
pub fn movie_name(raw_name: &str) -> Option<String> {
    let year = RE_YEAR.find_iter(raw_name).last()?;
    let title = normalize_title(&raw_name[..year.start()]);

    let clean_name = collapse_underscores(&format!("{}_({})", title, year.as_str()));

    if clean_name.trim().len() > 7 { Some(clean_name) } else { None }
}

/// Canonical show folder name from a raw folder name.
///
/// The title boundary is the first season marker; without one the whole
/// string is the title. Unlike [`movie_name`] this never fails, even for
/// degenerately short names. The TV pipeline depends on that asymmetry.
#[must_use]
pub fn tv_show_name(raw_folder_name: &str) -> String {
    let title = RE_SEASON_MARKER
        .find(raw_folder_name)
        .map_or(raw_folder_name, |m| &raw_folder_name[..m.start()]);

    collapse_underscores(&normalize_title(title))
}

/// Lowercased, zero-padded season code (`sNN`) from a season marker embedded
/// in an episode filename, if any.
#[must_use]
pub fn season_from_name(episode_file_name: &str) -> Option<String> {
    RE_SEASON_MARKER
        .find(episode_file_name)
        .map(|m| format!("s{:0>2}", &m.as_str()[1..]))
}

/// Normalize a multi-episode continuation marker to the canonical `-eNN`
/// form. Markers written with `x` or a bare digit continuation are
/// rewritten; `-eNN` passes through lowercased.
fn clean_num_ext(episode_num_ext: &str) -> String {
    let ext = episode_num_ext.to_lowercase();
    if ext.chars().nth(1) == Some('e') {
        ext
    } else {
        let digits: String = ext.chars().filter(char::is_ascii_digit).collect();
        format!("-e{digits}")
    }
}

/// Parse an episode filename into a typed descriptor.
///
/// `fallback_season` is the season inferred from the enclosing folder,
/// already normalized to `sNN`; it is used when the filename itself carries
/// no season marker. Returns `None` when the name has no episode marker at
/// all, in which case the caller routes the file to the specials folder.
#[must_use]
pub fn episode_code(raw_episode_file_name: &str, fallback_season: &str) -> Option<EpisodeDescriptor> {
    let caps = RE_EPISODE.captures(raw_episode_file_name)?;

    let season = caps
        .name("season_num")
        .map_or_else(|| fallback_season.to_string(), |m| format!("s{:0>2}", m.as_str()));

    let episode_num = format!("{:0>2}", caps.name("episode_num")?.as_str());

    let episode_num_ext = caps
        .name("episode_num_ext")
        .map_or_else(String::new, |m| clean_num_ext(m.as_str()));

    let part_num = caps
        .name("part_num")
        .map_or_else(String::new, |m| m.as_str().to_lowercase().replace("part", "pt"));

    Some(EpisodeDescriptor {
        season,
        episode_num,
        episode_num_ext,
        part_num,
    })
}

/// Normalized name for a file with no episode marker, bound for the
/// specials folder.
///
/// Symbols in the stem become underscores and the stem is lowercased; the
/// extension is preserved untouched.
#[must_use]
pub fn special_file_name(raw_file_name: &str) -> String {
    let (stem, extension) = raw_file_name
        .rsplit_once('.')
        .map_or((raw_file_name, None), |(stem, ext)| (stem, Some(ext)));

    let normalized = RE_SPECIAL_SYMBOLS.replace_all(stem, "_");
    let normalized = collapse_underscores(&normalized).to_lowercase();

    match extension {
        Some(ext) => format!("{normalized}.{ext}"),
        None => normalized,
    }
}
