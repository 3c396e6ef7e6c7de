pub mod changes;
pub mod classify;
pub mod cleaner;
pub mod config;
pub mod extensions;
pub mod logger;
pub mod mover;
pub mod pipeline;
pub mod walk;

use std::ffi::OsStr;
use std::path::Path;

use clap::Command;
use clap_complete::Shell;
use colored::Colorize;

/// Convert `OsStr` to String with invalid Unicode handling.
pub fn os_str_to_string(name: &OsStr) -> String {
    name.to_str().map_or_else(
        || name.to_string_lossy().replace('\u{FFFD}', ""),
        std::string::ToString::to_string,
    )
}

/// Convert given path to string with invalid Unicode handling.
pub fn path_to_string(path: &Path) -> String {
    path.to_str().map_or_else(
        || path.to_string_lossy().to_string().replace('\u{FFFD}', ""),
        std::string::ToString::to_string,
    )
}

/// Convert given path to filename string with invalid Unicode handling.
#[must_use]
pub fn path_to_filename_string(path: &Path) -> String {
    os_str_to_string(path.file_name().unwrap_or_default())
}

/// Check if a filename is hidden (starts with '.')
#[must_use]
pub fn is_hidden_name(name: &str) -> bool {
    name.starts_with('.')
}

/// Normalize path separators so network-share and Windows-style paths compare equal.
#[must_use]
pub fn normalize_separators(path: &str) -> String {
    let normalized = path.replace('\\', "/");
    normalized
        .strip_suffix('/')
        .map_or_else(|| normalized.clone(), ToString::to_string)
}

/// Check whether two paths point at the same location after separator normalization.
#[must_use]
pub fn paths_are_equal(old_path: &Path, new_path: &Path) -> bool {
    normalize_separators(&path_to_string(old_path)) == normalize_separators(&path_to_string(new_path))
}

#[inline]
pub fn print_error(message: &str) {
    eprintln!("{}", format!("Error: {message}").red());
}

#[macro_export]
macro_rules! print_error {
    ($($arg:tt)*) => {
        $crate::print_error(&format!($($arg)*))
    };
}

#[inline]
pub fn print_warning(message: &str) {
    eprintln!("{}", message.yellow());
}

#[macro_export]
macro_rules! print_warning {
    ($($arg:tt)*) => {
        $crate::print_warning(&format!($($arg)*))
    };
}

/// Generate a shell completion script for the given shell to stdout.
pub fn generate_shell_completion(shell: Shell, mut command: Command, command_name: &str) {
    clap_complete::generate(shell, &mut command, command_name, &mut std::io::stdout());
}
