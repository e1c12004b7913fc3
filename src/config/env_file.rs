//! .env file rewriting for API key rotation
//!
//! The rewrite is a plain read-modify-write: the first `GEMINI_API_KEY=`
//! line is replaced in place, or one is appended if none exists. Every
//! other line is preserved byte-for-byte, so comments and unrelated keys
//! survive rotation. There is no file locking; two concurrent rotations
//! can race and one write can be lost, which is accepted for a
//! single-operator admin endpoint.

use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

/// Exact prefix of the key assignment line in `.env`.
pub const ENV_KEY_PREFIX: &str = "GEMINI_API_KEY=";

/// Locate the `.env` file to rewrite.
///
/// Checks the primary path first, then a couple of conventional fallbacks
/// relative to the working directory. When nothing exists yet, the primary
/// path is returned so rotation creates the file there.
pub fn find_env_file(primary: &Path) -> PathBuf {
    if primary.exists() {
        return primary.to_path_buf();
    }

    for candidate in [PathBuf::from(".env"), PathBuf::from("backend/.env")] {
        if candidate.exists() {
            return candidate;
        }
    }

    primary.to_path_buf()
}

/// Replace or append the `GEMINI_API_KEY=` line in the given file content.
///
/// Pure function over the file text so the rewrite rules are testable
/// without touching the filesystem.
pub fn rewrite_api_key_line(content: &str, new_key: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut replaced = false;

    // split_inclusive keeps each line's own newline, so untouched lines
    // round-trip exactly.
    for line in content.split_inclusive('\n') {
        if !replaced && line.trim_start().starts_with(ENV_KEY_PREFIX) {
            lines.push(format!("{}{}\n", ENV_KEY_PREFIX, new_key));
            replaced = true;
        } else {
            lines.push(line.to_string());
        }
    }

    if !replaced {
        if let Some(last) = lines.last_mut() {
            if !last.ends_with('\n') {
                last.push('\n');
            }
        }
        lines.push(format!("{}{}\n", ENV_KEY_PREFIX, new_key));
    }

    lines.concat()
}

/// Rotate the API key inside the `.env` file at `path`.
///
/// A missing file is treated as empty, so rotation on a fresh deployment
/// creates the file with just the key line.
pub fn rotate_key_in_file(path: &Path, new_key: &str) -> Result<()> {
    let trimmed = new_key.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("API key cannot be empty".to_string()));
    }

    let content = if path.exists() {
        std::fs::read_to_string(path)?
    } else {
        String::new()
    };

    let rewritten = rewrite_api_key_line(&content, trimmed);
    std::fs::write(path, rewritten)?;

    tracing::info!(path = %path.display(), "Updated GEMINI_API_KEY in env file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_existing_key_line_in_place() {
        let content = "GEMINI_API_KEY=old\nOTHER=1\n";
        assert_eq!(
            rewrite_api_key_line(content, "new"),
            "GEMINI_API_KEY=new\nOTHER=1\n"
        );
    }

    #[test]
    fn preserves_order_and_unrelated_lines() {
        let content = "# comment\nDATABASE_URL=sqlite://x.db\nGEMINI_API_KEY=old\nPROJECT_NAME=PDFExtractPro\n";
        assert_eq!(
            rewrite_api_key_line(content, "rotated"),
            "# comment\nDATABASE_URL=sqlite://x.db\nGEMINI_API_KEY=rotated\nPROJECT_NAME=PDFExtractPro\n"
        );
    }

    #[test]
    fn appends_when_no_key_line_exists() {
        let content = "OTHER=1\n";
        assert_eq!(
            rewrite_api_key_line(content, "new"),
            "OTHER=1\nGEMINI_API_KEY=new\n"
        );
    }

    #[test]
    fn appends_newline_before_key_when_last_line_unterminated() {
        let content = "OTHER=1";
        assert_eq!(
            rewrite_api_key_line(content, "new"),
            "OTHER=1\nGEMINI_API_KEY=new\n"
        );
    }

    #[test]
    fn empty_file_gets_only_the_key_line() {
        assert_eq!(rewrite_api_key_line("", "new"), "GEMINI_API_KEY=new\n");
    }

    #[test]
    fn only_first_matching_line_is_replaced() {
        let content = "GEMINI_API_KEY=a\nGEMINI_API_KEY=b\n";
        assert_eq!(
            rewrite_api_key_line(content, "c"),
            "GEMINI_API_KEY=c\nGEMINI_API_KEY=b\n"
        );
    }

    #[test]
    fn rotate_rejects_whitespace_only_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        let err = rotate_key_in_file(&path, "   ").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn rotate_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        rotate_key_in_file(&path, "fresh").unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "GEMINI_API_KEY=fresh\n"
        );
    }

    #[test]
    fn rotate_trims_surrounding_whitespace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "GEMINI_API_KEY=old\n").unwrap();
        rotate_key_in_file(&path, "  padded  ").unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "GEMINI_API_KEY=padded\n"
        );
    }

    #[test]
    fn rotate_io_failure_is_storage_error_not_validation() {
        let dir = tempfile::tempdir().unwrap();
        // A directory at the .env path: exists() is true, reading fails
        let path = dir.path().join(".env");
        std::fs::create_dir(&path).unwrap();

        let err = rotate_key_in_file(&path, "valid-key").unwrap_err();
        assert!(matches!(err, AppError::StorageIo(_)));
    }

    #[test]
    fn find_env_file_falls_back_to_primary_when_nothing_exists() {
        let primary = PathBuf::from("/nonexistent/dir/.env");
        assert_eq!(find_env_file(&primary), primary);
    }
}
