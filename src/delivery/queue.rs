//! The local fallback queue.
//!
//! Queued entries are plain Logentry XML files that a separate process
//! forwards later. Several processes may write to the same directory, so
//! file names combine a timestamp, the pid, the host name and a random
//! suffix, and files are opened with create-new semantics.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use rand::Rng;

use crate::error::{ElogError, Result};

/// Upper bound on name regeneration after collisions.
pub const MAX_NAME_ATTEMPTS: usize = 1000;

/// Generate a queue file name: `YYYYMMDD_HHMMSS_<pid>_<host>_<n>.xml`.
pub fn queue_file_name() -> String {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let pid = std::process::id();
    let suffix: u32 = rand::thread_rng().gen_range(1..=999);
    format!("{stamp}_{pid}_{}_{suffix}.xml", host_part())
}

fn host_part() -> String {
    let host = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_default();
    sanitize_filename_part(&host, 64)
}

/// Keep alphanumerics, `-`, `.` and `_`; map everything else to `_`.
pub fn sanitize_filename_part(s: &str, max_len: usize) -> String {
    let sanitized: String = s
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '.' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(max_len)
        .collect();

    if sanitized.is_empty() {
        "unknown".to_string()
    } else {
        sanitized
    }
}

/// Write `contents` to a fresh file in `dir`, regenerating the name on
/// collision. Returns the path written.
pub fn write_queue_file(dir: &Path, contents: &[u8]) -> Result<PathBuf> {
    write_unique(dir, contents, queue_file_name)
}

/// Like [`write_queue_file`] with a caller-supplied name generator.
pub(crate) fn write_unique<F>(dir: &Path, contents: &[u8], mut next_name: F) -> Result<PathBuf>
where
    F: FnMut() -> String,
{
    for attempt in 1..=MAX_NAME_ATTEMPTS {
        let path = dir.join(next_name());
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                tracing::debug!(path = %path.display(), attempt, "Queue file name taken");
                continue;
            }
            Err(e) => return Err(ElogError::io(&path, e)),
        };
        if let Err(e) = file.write_all(contents).and_then(|()| file.sync_all()) {
            // Do not leave a truncated entry behind for the forwarder.
            let _ = std::fs::remove_file(&path);
            return Err(ElogError::io(&path, e));
        }
        return Ok(path);
    }

    Err(ElogError::io(
        dir,
        std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("no free queue file name after {MAX_NAME_ATTEMPTS} attempts"),
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename_part() {
        assert_eq!(sanitize_filename_part("ops host", 20), "ops_host");
        assert_eq!(sanitize_filename_part("db1.example.org", 64), "db1.example.org");
        assert_eq!(sanitize_filename_part("a/b\\c", 64), "a_b_c");
        assert_eq!(sanitize_filename_part("", 10), "unknown");
        assert_eq!(sanitize_filename_part("abcdef", 3), "abc");
    }

    #[test]
    fn test_queue_file_name_format() {
        let name = queue_file_name();
        let stem = name.strip_suffix(".xml").expect("xml suffix");
        let parts: Vec<&str> = stem.split('_').collect();
        assert!(parts.len() >= 5, "{name}");
        assert_eq!(parts[0].len(), 8);
        assert!(parts[0].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[1].len(), 6);
        assert_eq!(parts[2], std::process::id().to_string());
        let n: u32 = parts[parts.len() - 1].parse().unwrap();
        assert!((1..=999).contains(&n));
        assert!(!name.contains('/'));
    }

    #[test]
    fn test_collision_regenerates() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("taken.xml"), "old").unwrap();
        let mut names = vec!["free.xml", "taken.xml"];
        let path = write_unique(dir.path(), b"new", || names.pop().unwrap().to_string()).unwrap();
        assert_eq!(path, dir.path().join("free.xml"));
        assert_eq!(std::fs::read_to_string(dir.path().join("taken.xml")).unwrap(), "old");
        assert_eq!(std::fs::read_to_string(path).unwrap(), "new");
    }

    #[test]
    fn test_collision_loop_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("same.xml"), "old").unwrap();
        let mut calls = 0;
        let err = write_unique(dir.path(), b"new", || {
            calls += 1;
            "same.xml".to_string()
        })
        .unwrap_err();
        assert_eq!(calls, MAX_NAME_ATTEMPTS);
        match err {
            ElogError::Io { source, .. } => {
                assert_eq!(source.kind(), std::io::ErrorKind::AlreadyExists)
            }
            other => panic!("expected Io, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_dir_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_queue_file(&dir.path().join("nope"), b"x").unwrap_err();
        assert!(err.is_io());
    }
}
