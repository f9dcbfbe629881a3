//! Transcript file writer.
//!
//! Owns the output directories of one run and writes one text file per
//! conversation into them.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::domain::{AppError, Result};

/// Suffix appended to the output directory for raw, unresolved copies.
const UNRESOLVED_SUFFIX: &str = "-unresolved";

/// Replace anything but alphanumerics and `-_.` with `_`.
#[must_use]
pub fn safe_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Timestamped default directory name, e.g. `output-2024-05-01-13-45`.
#[must_use]
pub fn timestamped_dir(prefix: &str, now: DateTime<Local>) -> PathBuf {
    PathBuf::from(format!("{prefix}-{}", now.format("%Y-%m-%d-%H-%M")))
}

/// Writer for one export run.
#[derive(Debug, Clone)]
pub struct TranscriptWriter {
    out_dir: PathBuf,
    unresolved_dir: Option<PathBuf>,
}

impl TranscriptWriter {
    /// Create the output directory, and its `-unresolved` sibling if requested.
    ///
    /// # Errors
    /// Returns error if a directory cannot be created.
    pub fn create(out_dir: impl Into<PathBuf>, save_unresolved: bool) -> Result<Self> {
        let out_dir = out_dir.into();
        create_dir(&out_dir)?;

        let unresolved_dir = if save_unresolved {
            let mut name = out_dir.clone().into_os_string();
            name.push(UNRESOLVED_SUFFIX);
            let dir = PathBuf::from(name);
            create_dir(&dir)?;
            Some(dir)
        } else {
            None
        };

        Ok(Self {
            out_dir,
            unresolved_dir,
        })
    }

    /// Directory receiving resolved transcripts.
    #[must_use]
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Directory receiving unresolved copies, if enabled.
    #[must_use]
    pub fn unresolved_dir(&self) -> Option<&Path> {
        self.unresolved_dir.as_deref()
    }

    /// Write the resolved transcript for `base`.
    ///
    /// # Errors
    /// Returns error if the file cannot be written.
    pub fn write_resolved(&self, base: &str, content: &str) -> Result<PathBuf> {
        write_file(&self.out_dir, base, content)
    }

    /// Write the unresolved copy for `base`. Returns `None` when disabled.
    ///
    /// # Errors
    /// Returns error if the file cannot be written.
    pub fn write_unresolved(&self, base: &str, content: &str) -> Result<Option<PathBuf>> {
        self.unresolved_dir
            .as_deref()
            .map(|dir| write_file(dir, base, content))
            .transpose()
    }
}

fn create_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .map_err(|e| AppError::io(format!("Failed to create directory {}", dir.display()), e))
}

fn write_file(dir: &Path, base: &str, content: &str) -> Result<PathBuf> {
    let path = dir.join(format!("{base}.txt"));
    fs::write(&path, content)
        .map_err(|e| AppError::io(format!("Failed to write {}", path.display()), e))?;
    tracing::debug!(path = %path.display(), bytes = content.len(), "Wrote transcript");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    #[test]
    fn test_safe_name() {
        assert_eq!(safe_name("general"), "general");
        assert_eq!(safe_name("Jane Doe"), "Jane_Doe");
        assert_eq!(safe_name("a/b:c*d"), "a_b_c_d");
        assert_eq!(safe_name("release-1.2_rc"), "release-1.2_rc");
    }

    #[test]
    fn test_timestamped_dir() {
        let now = Local.with_ymd_and_hms(2024, 5, 1, 13, 45, 10).unwrap();
        assert_eq!(
            timestamped_dir("output", now),
            PathBuf::from("output-2024-05-01-13-45")
        );
    }

    #[test]
    fn test_writes_both_copies() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("export");

        let writer = TranscriptWriter::create(&out, true).unwrap();
        let resolved = writer.write_resolved("general", "hello @Ann\n").unwrap();
        let raw = writer.write_unresolved("general", "hello <@U1>\n").unwrap();

        assert_eq!(resolved, out.join("general.txt"));
        assert_eq!(fs::read_to_string(resolved).unwrap(), "hello @Ann\n");

        let raw = raw.unwrap();
        assert_eq!(raw, dir.path().join("export-unresolved").join("general.txt"));
        assert_eq!(fs::read_to_string(raw).unwrap(), "hello <@U1>\n");
    }

    #[test]
    fn test_unresolved_disabled() {
        let dir = tempdir().unwrap();
        let writer = TranscriptWriter::create(dir.path().join("export"), false).unwrap();

        assert!(writer.unresolved_dir().is_none());
        assert!(writer.write_unresolved("general", "x").unwrap().is_none());
        assert!(!dir.path().join("export-unresolved").exists());
    }
}
