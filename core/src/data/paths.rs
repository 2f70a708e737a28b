//! Profile path resolution.

use std::path::{is_separator, Path, PathBuf};

use crate::error::ProfileError;
use crate::types::config::SwitcherSettings;


/// Reject empty input and paths that name a directory.
pub fn validate_profile_path(input: &str) -> Result<(), ProfileError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ProfileError::EmptyPath);
    }
    if trimmed.ends_with(is_separator) {
        return Err(ProfileError::NotAFile);
    }
    Ok(())
}

/// Turn user input into a profile file path.
///
/// A missing extension gets `settings.profile_extension`. Absolute paths and
/// anything containing a separator are used as given; bare names land in
/// `settings.profile_dir`, which is created first when `create_dir` is set.
/// An empty `profile_dir` (no home directory) makes bare names an error.
pub fn resolve_profile_path(
    input: &str,
    settings: &SwitcherSettings,
    create_dir: bool,
) -> Result<PathBuf, ProfileError> {
    validate_profile_path(input)?;

    let mut cleaned = input.trim().to_string();
    if Path::new(&cleaned).extension().is_none() {
        cleaned.push('.');
        cleaned.push_str(&settings.profile_extension);
    }
    if is_explicit(&cleaned) {
        return Ok(PathBuf::from(cleaned));
    }

    if settings.profile_dir.as_os_str().is_empty() {
        return Err(ProfileError::NoProfileDir);
    }
    if create_dir {
        std::fs::create_dir_all(&settings.profile_dir).map_err(ProfileError::CreateDir)?;
    }
    Ok(settings.profile_dir.join(cleaned))
}

fn is_explicit(path: &str) -> bool {
    Path::new(path).is_absolute() || path.starts_with(r"\\") || path.contains(is_separator)
}
