//! Solver executable resolution and validation.
//!
//! The executable may be given as an explicit path, a path starting with `~`,
//! or a bare name. Bare names are looked up relative to the working directory
//! first, which is where the experiment scripts build the solver.

use std::env;
use std::path::{Path, PathBuf};

/// Errors that can occur during executable resolution or validation
#[derive(Debug, thiserror::Error)]
pub enum BinaryError {
    #[error("Solver executable not found: {path}")]
    NotFound { path: String },

    #[error("Solver executable is not executable: {path}")]
    NotExecutable { path: String },

    #[error("Cannot determine home directory")]
    NoHomeDir,

    #[error("Invalid path: {path}")]
    InvalidPath { path: String },
}

/// Get the user's home directory from the HOME environment variable
fn get_home_dir() -> Result<PathBuf, BinaryError> {
    env::var("HOME")
        .map(PathBuf::from)
        .map_err(|_| BinaryError::NoHomeDir)
}

/// Resolve the solver executable.
///
/// Resolution rules:
/// 1. `~/...` expands to the home directory
/// 2. A bare name that exists in the working directory resolves to `./name`
/// 3. Anything else is returned unchanged and left to `PATH` lookup
///
/// # Examples
///
/// ```ignore
/// resolve_executable("~/bin/vne_protection") -> /home/user/bin/vne_protection
/// resolve_executable("/opt/vne/vne_protection") -> /opt/vne/vne_protection
/// ```
pub fn resolve_executable(name_or_path: &str) -> Result<PathBuf, BinaryError> {
    if let Some(rest) = name_or_path.strip_prefix("~/") {
        return Ok(get_home_dir()?.join(rest));
    }

    let path = PathBuf::from(name_or_path);
    if !name_or_path.contains('/') {
        let local = Path::new(".").join(name_or_path);
        if local.is_file() {
            return Ok(local);
        }
    }
    Ok(path)
}

/// Validate that an executable exists and has an execute bit set.
///
/// Bare names that are not present locally are assumed to come from `PATH`
/// and are not checked.
pub fn validate_executable(path: &Path) -> Result<(), BinaryError> {
    if path.components().count() == 1 && !path.exists() {
        return Ok(());
    }

    if !path.exists() {
        return Err(BinaryError::NotFound {
            path: path.display().to_string(),
        });
    }

    let metadata = path.metadata().map_err(|_| BinaryError::InvalidPath {
        path: path.display().to_string(),
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        // Any execute bit
        if metadata.permissions().mode() & 0o111 == 0 {
            return Err(BinaryError::NotExecutable {
                path: path.display().to_string(),
            });
        }
    }

    if !metadata.is_file() {
        return Err(BinaryError::InvalidPath {
            path: path.display().to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_explicit_absolute() {
        let result = resolve_executable("/opt/vne/vne_protection").unwrap();
        assert_eq!(result, PathBuf::from("/opt/vne/vne_protection"));
    }

    #[test]
    fn test_resolve_tilde() {
        let result = resolve_executable("~/bin/vne_protection").unwrap();
        assert!(result.ends_with("bin/vne_protection"));
        assert!(!result.starts_with("~"));
    }

    #[test]
    fn test_resolve_bare_name_not_present_locally() {
        let result = resolve_executable("surely-not-a-local-solver").unwrap();
        assert_eq!(result, PathBuf::from("surely-not-a-local-solver"));
        // Left to PATH lookup at launch time
        assert!(validate_executable(&result).is_ok());
    }

    #[test]
    fn test_validate_missing_executable() {
        let result = validate_executable(Path::new("/nonexistent/vne_protection"));
        assert!(matches!(result, Err(BinaryError::NotFound { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_validate_requires_execute_bit() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("solver");
        std::fs::write(&path, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();
        assert!(matches!(
            validate_executable(&path),
            Err(BinaryError::NotExecutable { .. })
        ));

        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert!(validate_executable(&path).is_ok());
    }
}
