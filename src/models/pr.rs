//! Pull request content types.

use serde::{Deserialize, Serialize};
use strum::Display;

use super::SubmittedFile;

/// Change status of one file in a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FileStatus {
    Added,
    Modified,
    Removed,
    Renamed,
}

impl FileStatus {
    /// Map a GitHub file status onto the four tracked values.
    ///
    /// `changed`, `copied`, and `unchanged` have no glyph of their own and
    /// count as modifications.
    pub fn from_github(status: &str) -> Self {
        match status {
            "added" => FileStatus::Added,
            "removed" => FileStatus::Removed,
            "renamed" => FileStatus::Renamed,
            _ => FileStatus::Modified,
        }
    }

    /// One glyph per status for the Markdown file list.
    pub fn glyph(self) -> &'static str {
        match self {
            FileStatus::Added => "🟢",
            FileStatus::Modified => "🟡",
            FileStatus::Removed => "🔴",
            FileStatus::Renamed => "🔵",
        }
    }
}

/// One changed file of a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrSummaryFile {
    pub name: String,
    pub status: FileStatus,
    pub additions: u64,
    pub deletions: u64,
    /// The literal patch text; GitHub omits it for binary or oversized files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
    /// Previous path for renamed files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_name: Option<String>,
}

/// Shown in place of a patch GitHub did not return.
pub const PATCH_PLACEHOLDER: &str = "Binary file or diff too large to display.";

/// Shown in place of an empty pull request description.
pub const DESCRIPTION_PLACEHOLDER: &str = "No description provided.";

impl PrSummaryFile {
    /// The patch text, or [`PATCH_PLACEHOLDER`] when absent.
    pub fn patch_or_placeholder(&self) -> &str {
        self.patch.as_deref().unwrap_or(PATCH_PLACEHOLDER)
    }
}

/// A fetched pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrContent {
    pub url: String,
    pub title: String,
    pub description: String,
    pub author: String,
    pub additions: u64,
    pub deletions: u64,
    pub changed_files: u64,
    pub files: Vec<PrSummaryFile>,
}

impl PrContent {
    /// One submitted file per changed file, carrying its formatted diff.
    pub fn derived_files(&self) -> Vec<SubmittedFile> {
        self.files
            .iter()
            .map(|f| SubmittedFile::new(f.name.clone(), crate::github::format::format_file_diff(f)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn github_statuses_map_onto_tracked_values() {
        assert_eq!(FileStatus::from_github("added"), FileStatus::Added);
        assert_eq!(FileStatus::from_github("removed"), FileStatus::Removed);
        assert_eq!(FileStatus::from_github("renamed"), FileStatus::Renamed);
        assert_eq!(FileStatus::from_github("modified"), FileStatus::Modified);
        assert_eq!(FileStatus::from_github("copied"), FileStatus::Modified);
        assert_eq!(FileStatus::from_github("changed"), FileStatus::Modified);
    }

    #[test]
    fn every_status_has_a_distinct_glyph() {
        let glyphs = [
            FileStatus::Added.glyph(),
            FileStatus::Modified.glyph(),
            FileStatus::Removed.glyph(),
            FileStatus::Renamed.glyph(),
        ];
        for (i, a) in glyphs.iter().enumerate() {
            for b in &glyphs[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn status_displays_lowercase() {
        assert_eq!(FileStatus::Renamed.to_string(), "renamed");
    }
}
