use crate::error::{OtcbotError, Result};
use std::path::{Component, Path, PathBuf};

const FORBIDDEN: &[&str] = &["/etc", "/sys", "/proc", "/dev", "/boot"];

/// Path checks for the checkout directory and the manifests inside it.
pub struct PathValidator;

impl PathValidator {
    /// Resolves the checkout directory to an absolute path.
    ///
    /// The directory does not have to exist yet (it is created by the clone),
    /// but if it does it must be a directory.
    pub fn validate_checkout_dir(path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(OtcbotError::Config(
                "Checkout directory is not set".to_string(),
            ));
        }

        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };

        let resolved = if absolute.exists() {
            let canonical = absolute.canonicalize().map_err(|e| {
                OtcbotError::Config(format!("Invalid path '{}': {e}", absolute.display()))
            })?;
            if !canonical.is_dir() {
                return Err(OtcbotError::Config(format!(
                    "Checkout path '{}' is not a directory",
                    canonical.display()
                )));
            }
            canonical
        } else {
            Self::normalize(&absolute)
        };

        for forbidden in FORBIDDEN {
            let forbidden_path = Path::new(forbidden);
            let canonical_forbidden = forbidden_path
                .canonicalize()
                .unwrap_or_else(|_| forbidden_path.to_path_buf());

            if resolved.starts_with(forbidden_path) || resolved.starts_with(&canonical_forbidden) {
                return Err(OtcbotError::Config(format!(
                    "Access to system directory '{}' is not allowed",
                    forbidden
                )));
            }
        }

        Ok(resolved)
    }

    /// Manifest paths are relative to the repository root and may not escape it.
    pub fn validate_manifest_path(path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(OtcbotError::Config("Manifest path is empty".to_string()));
        }

        for component in path.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => {
                    return Err(OtcbotError::Config(format!(
                        "Manifest path '{}' must stay inside the repository",
                        path.display()
                    )));
                }
            }
        }

        Ok(path.to_path_buf())
    }

    /// Ensures the file path resides inside the provided base directory.
    pub fn validate_file_path(
        file_path: impl AsRef<Path>,
        base_dir: impl AsRef<Path>,
    ) -> Result<PathBuf> {
        let file_path = file_path.as_ref();
        let base_dir = base_dir.as_ref();

        let canonical_file = file_path.canonicalize().map_err(|e| {
            OtcbotError::Config(format!("Invalid file path '{}': {e}", file_path.display()))
        })?;

        let canonical_base = base_dir.canonicalize().map_err(|e| {
            OtcbotError::Config(format!(
                "Invalid base directory '{}': {e}",
                base_dir.display()
            ))
        })?;

        if !canonical_file.starts_with(&canonical_base) {
            return Err(OtcbotError::Config(
                "File path is outside the allowed directory".to_string(),
            ));
        }

        Ok(canonical_file)
    }

    // Lexical cleanup for paths that cannot be canonicalized yet.
    fn normalize(path: &Path) -> PathBuf {
        let mut normalized = PathBuf::new();
        for component in path.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    normalized.pop();
                }
                other => normalized.push(other.as_os_str()),
            }
        }
        normalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn checkout_dir_accepts_existing_directory() {
        let dir = tempdir().unwrap();
        let resolved = PathValidator::validate_checkout_dir(dir.path()).unwrap();
        assert_eq!(resolved, dir.path().canonicalize().unwrap());
    }

    #[test]
    fn checkout_dir_accepts_missing_directory() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("not-yet").join("..").join("repo");
        let resolved = PathValidator::validate_checkout_dir(&target).unwrap();
        assert_eq!(resolved, dir.path().join("repo"));
    }

    #[test]
    fn checkout_dir_rejects_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("file.txt");
        fs::write(&file_path, "test").unwrap();
        let err = PathValidator::validate_checkout_dir(&file_path).unwrap_err();
        assert!(matches!(err, OtcbotError::Config(_)));
    }

    #[test]
    fn checkout_dir_rejects_empty_and_system_directories() {
        assert!(PathValidator::validate_checkout_dir("").is_err());
        assert!(PathValidator::validate_checkout_dir("/etc/otcbot").is_err());
    }

    #[test]
    fn manifest_path_must_be_relative_and_contained() {
        assert!(PathValidator::validate_manifest_path("doc/requirements.txt").is_ok());
        assert!(PathValidator::validate_manifest_path("/etc/passwd").is_err());
        assert!(PathValidator::validate_manifest_path("../requirements.txt").is_err());
        assert!(PathValidator::validate_manifest_path("").is_err());
    }

    #[test]
    fn validate_file_path_rejects_traversal() {
        let dir = tempdir().unwrap();
        let base = dir.path();
        let outside = Path::new("/tmp");
        let result = PathValidator::validate_file_path(outside, base);
        assert!(result.is_err());
    }
}
