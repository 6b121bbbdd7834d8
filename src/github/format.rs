//! Plain-text renderings of pull request content.
//!
//! [`format_file_diff`] turns one changed file into a synthetic unified
//! diff block for the prompt. [`format_pr_summary`] renders the whole PR
//! as Markdown; it doubles as the opening user turn when the user sends a
//! PR without any message text.

use crate::models::{FileStatus, PrContent, PrSummaryFile};

/// Review focus appended to every PR summary.
const REVIEW_FOCUS: &[&str] = &[
    "Correctness and potential bugs introduced by the changes",
    "Security implications (input validation, secrets, injection)",
    "Performance regressions",
    "Readability, naming, and maintainability",
    "Missing or inadequate tests",
];

/// Render one changed file as a unified-diff block.
pub fn format_file_diff(file: &PrSummaryFile) -> String {
    let old_name = file.previous_name.as_deref().unwrap_or(&file.name);
    let old_header = match file.status {
        FileStatus::Added => "/dev/null".to_string(),
        _ => format!("a/{old_name}"),
    };
    let new_header = match file.status {
        FileStatus::Removed => "/dev/null".to_string(),
        _ => format!("b/{}", file.name),
    };

    let mut out = format!(
        "diff --git a/{old_name} b/{name}\n\
         --- {old_header}\n\
         +++ {new_header}\n\
         # status: {status} (+{add} -{del})\n",
        name = file.name,
        status = file.status,
        add = file.additions,
        del = file.deletions,
    );
    match &file.patch {
        Some(patch) => {
            out.push_str(patch);
            if !patch.ends_with('\n') {
                out.push('\n');
            }
        }
        None => {
            out.push_str(&format!("# {}\n", file.patch_or_placeholder()));
        }
    }
    out
}

/// Render a pull request as a Markdown summary.
pub fn format_pr_summary(pr: &PrContent) -> String {
    let mut out = format!(
        "## Pull Request: {title}\n\n\
         **Author:** @{author}\n\
         **URL:** {url}\n\
         **Changes:** {files} file{plural} changed, +{add} -{del}\n\n\
         ### Description\n\n{description}\n\n\
         ### Files Changed\n\n",
        title = pr.title,
        author = pr.author,
        url = pr.url,
        files = pr.changed_files,
        plural = if pr.changed_files == 1 { "" } else { "s" },
        add = pr.additions,
        del = pr.deletions,
        description = pr.description.trim(),
    );

    for file in &pr.files {
        out.push_str(&format!(
            "- {} `{}` ({}, +{} -{})\n",
            file.status.glyph(),
            file.name,
            file.status,
            file.additions,
            file.deletions,
        ));
    }

    out.push_str("\n### Review Focus\n\nPlease review this pull request, focusing on:\n");
    for item in REVIEW_FOCUS {
        out.push_str(&format!("- {item}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn file(name: &str, status: FileStatus, patch: Option<&str>) -> PrSummaryFile {
        PrSummaryFile {
            name: name.to_string(),
            status,
            additions: 2,
            deletions: 1,
            patch: patch.map(str::to_string),
            previous_name: None,
        }
    }

    fn sample_pr() -> PrContent {
        PrContent {
            url: "https://github.com/o/r/pull/9".to_string(),
            title: "Fix parser".to_string(),
            description: "Handles empty input.".to_string(),
            author: "octocat".to_string(),
            additions: 4,
            deletions: 2,
            changed_files: 2,
            files: vec![
                file("src/parser.rs", FileStatus::Modified, Some("@@ -1 +1,2 @@\n-a\n+b\n+c")),
                file("assets/logo.png", FileStatus::Added, None),
            ],
        }
    }

    #[test]
    fn modified_file_renders_unified_headers_and_patch() {
        let out = format_file_diff(&file("src/x.rs", FileStatus::Modified, Some("@@ -1 +1 @@\n-a\n+b")));
        assert_eq!(
            out,
            "diff --git a/src/x.rs b/src/x.rs\n\
             --- a/src/x.rs\n\
             +++ b/src/x.rs\n\
             # status: modified (+2 -1)\n\
             @@ -1 +1 @@\n-a\n+b\n"
        );
    }

    #[test]
    fn added_and_removed_files_use_dev_null() {
        let added = format_file_diff(&file("new.rs", FileStatus::Added, Some("+x\n")));
        assert!(added.contains("--- /dev/null\n+++ b/new.rs\n"));

        let removed = format_file_diff(&file("old.rs", FileStatus::Removed, Some("-x\n")));
        assert!(removed.contains("--- a/old.rs\n+++ /dev/null\n"));
    }

    #[test]
    fn renamed_file_uses_previous_name() {
        let mut renamed = file("b.rs", FileStatus::Renamed, None);
        renamed.previous_name = Some("a.rs".to_string());
        let out = format_file_diff(&renamed);
        assert!(out.starts_with("diff --git a/a.rs b/b.rs\n--- a/a.rs\n+++ b/b.rs\n"));
    }

    #[test]
    fn missing_patch_renders_placeholder_note() {
        let out = format_file_diff(&file("logo.png", FileStatus::Added, None));
        assert!(out.ends_with("# Binary file or diff too large to display.\n"));
    }

    #[test]
    fn summary_lists_files_with_glyphs_and_focus() {
        let out = format_pr_summary(&sample_pr());
        assert!(out.starts_with("## Pull Request: Fix parser\n"));
        assert!(out.contains("**Author:** @octocat"));
        assert!(out.contains("**URL:** https://github.com/o/r/pull/9"));
        assert!(out.contains("**Changes:** 2 files changed, +4 -2"));
        assert!(out.contains("Handles empty input."));
        assert!(out.contains("- 🟡 `src/parser.rs` (modified, +2 -1)"));
        assert!(out.contains("- 🟢 `assets/logo.png` (added, +2 -1)"));
        assert!(out.contains("### Review Focus"));
    }

    #[test]
    fn summary_singular_file_count() {
        let mut pr = sample_pr();
        pr.changed_files = 1;
        pr.files.truncate(1);
        assert!(format_pr_summary(&pr).contains("1 file changed"));
    }
}
