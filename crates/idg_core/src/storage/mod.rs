use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::domain::Scenario;
use crate::error::AppError;

const MAX_STEM_ATTEMPTS: u32 = 1000;

const STEM_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year][month][day][hour][minute][second]");

/// Keep only alphanumeric characters of an organization name.
pub fn sanitize_org_name(name: &str) -> String {
    name.chars().filter(|c| c.is_alphanumeric()).collect()
}

pub fn is_event_file(filename: &str) -> bool {
    filename.ends_with("events.json") || filename.contains("events_")
}

fn validate_filename(filename: &str) -> Result<(), AppError> {
    let bad = filename.trim().is_empty()
        || filename.contains('/')
        || filename.contains('\\')
        || filename == "."
        || filename.contains("..");
    if bad {
        return Err(AppError::new(
            "STORE_INVALID_FILENAME",
            "File name must be a plain name inside the organization folder",
        )
        .with_details(format!("filename={filename}")));
    }
    Ok(())
}

fn io_error(message: &str, path: &Path, e: std::io::Error) -> AppError {
    AppError::new("STORE_IO_FAILED", message)
        .with_details(format!("path={}; err={}", path.display(), e))
}

/// Names of the two files written by one generation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SavedRun {
    pub organization: String,
    pub narrative_file: String,
    pub events_file: String,
    pub narrative_path: PathBuf,
    pub events_path: PathBuf,
}

/// Per-organization file storage under a single root directory.
#[derive(Debug, Clone)]
pub struct OrgStore {
    root: PathBuf,
}

impl OrgStore {
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    fn org_dir(&self, organization: &str) -> Result<(String, PathBuf), AppError> {
        let org = sanitize_org_name(organization);
        if org.is_empty() {
            return Err(AppError::new(
                "ORG_NAME_INVALID",
                "Organization name must contain at least one alphanumeric character",
            )
            .with_details(format!("organization={organization}")));
        }
        let dir = self.root.join(&org);
        Ok((org, dir))
    }

    /// Create the organization folder if needed and return its path.
    pub fn ensure_org(&self, organization: &str) -> Result<PathBuf, AppError> {
        let (_, dir) = self.org_dir(organization)?;
        fs::create_dir_all(&dir)
            .map_err(|e| io_error("Failed to create organization folder", &dir, e))?;
        Ok(dir)
    }

    pub fn list_organizations(&self) -> Result<Vec<String>, AppError> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.root)
            .map_err(|e| io_error("Failed to list storage root", &self.root, e))?;
        let mut out: Vec<String> = entries
            .flatten()
            .filter(|ent| ent.path().is_dir())
            .map(|ent| ent.file_name().to_string_lossy().to_string())
            .collect();
        out.sort();
        Ok(out)
    }

    pub fn list_files(&self, organization: &str) -> Result<Vec<String>, AppError> {
        let (_, dir) = self.org_dir(organization)?;
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let entries =
            fs::read_dir(&dir).map_err(|e| io_error("Failed to list organization folder", &dir, e))?;
        let mut out: Vec<String> = entries
            .flatten()
            .filter(|ent| ent.path().is_file())
            .map(|ent| ent.file_name().to_string_lossy().to_string())
            .collect();
        out.sort();
        Ok(out)
    }

    pub fn list_event_files(&self, organization: &str) -> Result<Vec<String>, AppError> {
        Ok(self
            .list_files(organization)?
            .into_iter()
            .filter(|f| is_event_file(f))
            .collect())
    }

    pub fn file_path(&self, organization: &str, filename: &str) -> Result<PathBuf, AppError> {
        validate_filename(filename)?;
        let (_, dir) = self.org_dir(organization)?;
        Ok(dir.join(filename))
    }

    pub fn read_file(&self, organization: &str, filename: &str) -> Result<String, AppError> {
        let path = self.file_path(organization, filename)?;
        if !path.is_file() {
            return Err(AppError::new("STORE_NOT_FOUND", "Stored file not found")
                .with_details(format!("path={}", path.display())));
        }
        fs::read_to_string(&path).map_err(|e| io_error("Failed to read stored file", &path, e))
    }

    /// Replace the content of an existing file (operator edits).
    pub fn overwrite_file(
        &self,
        organization: &str,
        filename: &str,
        content: &str,
    ) -> Result<(), AppError> {
        let path = self.file_path(organization, filename)?;
        if !path.is_file() {
            return Err(AppError::new("STORE_NOT_FOUND", "Stored file not found")
                .with_details(format!("path={}", path.display())));
        }
        let tmp = path.with_extension("tmp");
        if let Err(e) = fs::write(&tmp, content.as_bytes()) {
            discard(&tmp);
            return Err(io_error("Failed to write stored file", &tmp, e));
        }
        fs::rename(&tmp, &path).map_err(|e| {
            discard(&tmp);
            AppError::new("STORE_IO_FAILED", "Failed to finalize stored file write").with_details(
                format!("tmp={}; dest={}; err={}", tmp.display(), path.display(), e),
            )
        })?;
        Ok(())
    }

    /// Persist the narrative and event text of one run under a shared, never-reused stem.
    ///
    /// The stem is the UTC timestamp (`YYYYMMDDHHMMSS`); when either file already exists a
    /// `-N` suffix is appended until both names are free.
    pub fn save_run(
        &self,
        organization: &str,
        scenario: Scenario,
        narrative: &str,
        events: &str,
        now: OffsetDateTime,
    ) -> Result<SavedRun, AppError> {
        let dir = self.ensure_org(organization)?;
        let (org, _) = self.org_dir(organization)?;
        let stamp = timestamp_stem(now)?;

        for n in 1..=MAX_STEM_ATTEMPTS {
            let stem = if n == 1 {
                stamp.clone()
            } else {
                format!("{stamp}-{n}")
            };
            let narrative_file = format!("{scenario}_{stem}.txt");
            let events_file = format!("{scenario}_events_{stem}.json");
            let narrative_path = dir.join(&narrative_file);
            let events_path = dir.join(&events_file);

            if !create_new_file(&narrative_path, narrative)? {
                continue;
            }
            match create_new_file(&events_path, events) {
                Ok(true) => {}
                Ok(false) => {
                    fs::remove_file(&narrative_path).map_err(|e| {
                        io_error("Failed to release narrative file name", &narrative_path, e)
                    })?;
                    continue;
                }
                Err(e) => {
                    discard(&narrative_path);
                    return Err(e);
                }
            }

            return Ok(SavedRun {
                organization: org,
                narrative_file,
                events_file,
                narrative_path,
                events_path,
            });
        }

        Err(AppError::new(
            "STORE_IO_FAILED",
            "Could not find a free file name for this run",
        )
        .with_details(format!("dir={}; stamp={stamp}", dir.display())))
    }
}

pub fn timestamp_stem(now: OffsetDateTime) -> Result<String, AppError> {
    now.format(STEM_FORMAT).map_err(|e| {
        AppError::new("STORE_IO_FAILED", "Failed to format timestamp").with_details(e.to_string())
    })
}

/// Write `content` to a new file. Returns `Ok(false)` when the file already exists.
fn create_new_file(path: &Path, content: &str) -> Result<bool, AppError> {
    let mut f = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(io_error("Failed to create stored file", path, e)),
    };
    if let Err(e) = f.write_all(content.as_bytes()) {
        drop(f);
        discard(path);
        return Err(io_error("Failed to write stored file", path, e));
    }
    Ok(true)
}

/// Best-effort removal of a file this store created but could not finish.
fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove partial file");
        }
    }
}
