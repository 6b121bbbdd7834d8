//! Client-side file intake: size ceilings, extension allow-list, and
//! language tagging.
//!
//! Files are validated one at a time, in selection order, so rejections
//! are reported deterministically. The accumulated list is keyed by name
//! (re-adding a name replaces the earlier file) and never exceeds the
//! aggregate ceiling.

pub mod languages;

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::models::{SubmittedFile, UploadedFile};

/// Per-file and aggregate upload ceilings, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadLimits {
    pub max_file_bytes: u64,
    pub max_total_bytes: u64,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_file_bytes: crate::constants::DEFAULT_MAX_FILE_BYTES,
            max_total_bytes: crate::constants::DEFAULT_MAX_TOTAL_BYTES,
        }
    }
}

/// Why a file was not added.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntakeRejection {
    #[error("File {name} exceeds {}.", human_size(*limit))]
    TooLarge { name: String, size: u64, limit: u64 },

    #[error("File type for {name} is not supported.")]
    Unsupported { name: String },

    #[error("Adding {name} would exceed the total upload limit of {}.", human_size(*limit))]
    TotalExceeded { name: String, limit: u64 },

    #[error("Could not read {name}: {reason}")]
    Unreadable { name: String, reason: String },
}

/// Outcome of one intake batch.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IntakeReport {
    /// Names added, in order.
    pub accepted: Vec<String>,
    /// Rejections, in the order they happened.
    pub rejected: Vec<IntakeRejection>,
    /// The aggregate ceiling stopped the batch early.
    pub limit_reached: bool,
}

/// A file selected for upload, not yet read.
#[derive(Debug, Clone)]
pub struct PendingFile {
    name: String,
    size: u64,
    source: Source,
}

#[derive(Debug, Clone)]
enum Source {
    Path(PathBuf),
    Memory(String),
}

impl PendingFile {
    /// Stat a file on disk. The content is read only once it passes validation.
    pub async fn from_path(path: &Path) -> Result<Self, IntakeRejection> {
        let name = display_name(path);
        let meta = tokio::fs::metadata(path)
            .await
            .map_err(|e| IntakeRejection::Unreadable {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            name,
            size: meta.len(),
            source: Source::Path(path.to_path_buf()),
        })
    }

    /// A file whose content is already in memory.
    pub fn from_memory(name: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            name: name.into(),
            size: content.len() as u64,
            source: Source::Memory(content),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    async fn read(self) -> Result<String, IntakeRejection> {
        match self.source {
            Source::Memory(content) => Ok(content),
            Source::Path(path) => {
                let bytes = tokio::fs::read(&path)
                    .await
                    .map_err(|e| IntakeRejection::Unreadable {
                        name: self.name.clone(),
                        reason: e.to_string(),
                    })?;
                String::from_utf8(bytes).map_err(|_| IntakeRejection::Unreadable {
                    name: self.name,
                    reason: "not valid UTF-8 text".to_string(),
                })
            }
        }
    }
}

/// The accumulated upload list.
#[derive(Debug, Clone, Default)]
pub struct FileIntake {
    limits: UploadLimits,
    files: IndexMap<String, UploadedFile>,
}

impl FileIntake {
    pub fn new(limits: UploadLimits) -> Self {
        Self {
            limits,
            files: IndexMap::new(),
        }
    }

    pub fn limits(&self) -> UploadLimits {
        self.limits
    }

    /// Validate and read a batch, in order.
    ///
    /// Oversized and unsupported files are rejected and skipped. The first
    /// file that would push the total past the aggregate ceiling is rejected
    /// and ends the batch. The batch is consumed either way.
    pub async fn ingest(&mut self, batch: Vec<PendingFile>) -> IntakeReport {
        self.ingest_candidates(batch.into_iter().map(Ok).collect()).await
    }

    /// [`ingest`](Self::ingest) over candidates that may already have
    /// failed to stat. Each failure is reported at its own position.
    async fn ingest_candidates(
        &mut self,
        batch: Vec<Result<PendingFile, IntakeRejection>>,
    ) -> IntakeReport {
        let mut report = IntakeReport::default();

        for candidate in batch {
            let pending = match candidate {
                Ok(pending) => pending,
                Err(rejection) => {
                    report.rejected.push(rejection);
                    continue;
                }
            };
            let name = pending.name.clone();

            if pending.size > self.limits.max_file_bytes {
                report.rejected.push(IntakeRejection::TooLarge {
                    name,
                    size: pending.size,
                    limit: self.limits.max_file_bytes,
                });
                continue;
            }
            if !languages::is_supported(&name) {
                report.rejected.push(IntakeRejection::Unsupported { name });
                continue;
            }

            let base = self.total_bytes_excluding(&name);
            if base + pending.size > self.limits.max_total_bytes {
                report.rejected.push(IntakeRejection::TotalExceeded {
                    name,
                    limit: self.limits.max_total_bytes,
                });
                report.limit_reached = true;
                break;
            }

            let content = match pending.read().await {
                Ok(content) => content,
                Err(rejection) => {
                    report.rejected.push(rejection);
                    continue;
                }
            };
            // The file may have grown since it was stat'ed.
            let size = content.len() as u64;
            if size > self.limits.max_file_bytes {
                report.rejected.push(IntakeRejection::TooLarge {
                    name,
                    size,
                    limit: self.limits.max_file_bytes,
                });
                continue;
            }
            if base + size > self.limits.max_total_bytes {
                report.rejected.push(IntakeRejection::TotalExceeded {
                    name,
                    limit: self.limits.max_total_bytes,
                });
                report.limit_reached = true;
                break;
            }

            debug!(file = %name, bytes = size, "accepted upload");
            let language = languages::language_for(&name).to_string();
            self.files.insert(
                name.clone(),
                UploadedFile {
                    name: name.clone(),
                    content,
                    language,
                },
            );
            report.accepted.push(name);
        }

        report
    }

    /// Stat and ingest files from disk, expanding directories.
    ///
    /// Directories contribute the supported files beneath them (sorted,
    /// honoring `.gitignore`). Files that cannot be stat'ed are reported
    /// as unreadable, in selection order with the other rejections.
    pub async fn add_paths(&mut self, paths: &[PathBuf]) -> IntakeReport {
        let mut batch = Vec::new();
        for path in expand_paths(paths) {
            batch.push(PendingFile::from_path(&path).await);
        }
        self.ingest_candidates(batch).await
    }

    /// Remove a file by name.
    pub fn remove(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.shift_remove(name)
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    pub fn files(&self) -> impl Iterator<Item = &UploadedFile> {
        self.files.values()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Summed content size of all accepted files.
    pub fn total_bytes(&self) -> u64 {
        self.files.values().map(UploadedFile::size).sum()
    }

    /// The files in request form.
    pub fn submitted(&self) -> Vec<SubmittedFile> {
        self.files.values().map(SubmittedFile::from).collect()
    }

    fn total_bytes_excluding(&self, name: &str) -> u64 {
        self.files
            .values()
            .filter(|f| f.name != name)
            .map(UploadedFile::size)
            .sum()
    }
}

/// Enforce the upload ceilings on files received by the server.
///
/// Extensions are not checked here: files derived from pull requests
/// carry whatever paths the PR touches.
pub fn validate_submitted(
    files: &[SubmittedFile],
    limits: &UploadLimits,
) -> Result<(), IntakeRejection> {
    let mut total = 0u64;
    for file in files {
        let size = file.content.len() as u64;
        if size > limits.max_file_bytes {
            return Err(IntakeRejection::TooLarge {
                name: file.name.clone(),
                size,
                limit: limits.max_file_bytes,
            });
        }
        total += size;
        if total > limits.max_total_bytes {
            return Err(IntakeRejection::TotalExceeded {
                name: file.name.clone(),
                limit: limits.max_total_bytes,
            });
        }
    }
    Ok(())
}

/// Expand directories into the supported files they contain.
fn expand_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for path in paths {
        if !path.is_dir() {
            out.push(path.clone());
            continue;
        }
        let walker = ignore::WalkBuilder::new(path)
            .require_git(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();
        for entry in walker.flatten() {
            let is_file = entry.file_type().is_some_and(|t| t.is_file());
            if is_file && languages::is_supported(&entry.path().to_string_lossy()) {
                out.push(entry.into_path());
            }
        }
    }
    out
}

/// Name shown for a file on disk: the path as given, without a `./` prefix.
fn display_name(path: &Path) -> String {
    let shown = path.to_string_lossy();
    shown.strip_prefix("./").unwrap_or(&shown).to_string()
}

/// Format a byte count for messages (e.g. `50MB`, `512KB`).
pub fn human_size(bytes: u64) -> String {
    const MB: u64 = 1024 * 1024;
    const KB: u64 = 1024;
    if bytes >= MB && bytes % MB == 0 {
        format!("{}MB", bytes / MB)
    } else if bytes >= MB {
        format!("{:.1}MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{}KB", bytes / KB)
    } else {
        format!("{bytes}B")
    }
}
