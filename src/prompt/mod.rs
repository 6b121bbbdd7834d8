//! Prompt composition for review requests.
//!
//! The system turn carries the reviewer persona, the review checklist,
//! the PR context paragraph and every submitted file. Conversation turns
//! follow unchanged; provider-specific role labels are applied by each
//! provider when it builds its request body.

use crate::models::{ChatMessage, Role, SubmittedFile};

/// Opening user turn when the user sent files without any text.
pub const OPENING_INSTRUCTION: &str = "Please review this code.";

const PERSONA: &str = "You are an expert AI code reviewer. Your primary goal is to provide \
a comprehensive, clear, and actionable review of the submitted code or pull request.";

const CHECKLIST: &[(&str, &str)] = &[
    (
        "Bugs and Logic Errors",
        "Identify any potential bugs, logical flaws, or edge cases not handled.",
    ),
    (
        "Performance",
        "Highlight inefficiencies and suggest optimizations.",
    ),
    (
        "Security Vulnerabilities",
        "Point out potential security risks (e.g., XSS, SQLi, insecure handling of secrets).",
    ),
    (
        "Best Practices",
        "Check adherence to language-specific best practices, design patterns, and coding standards.",
    ),
    (
        "Code Style & Readability",
        "Suggest improvements for clarity, maintainability, and consistency. Comment on naming \
         conventions, complexity, and documentation.",
    ),
    (
        "Actionable Suggestions",
        "Provide concrete examples or code snippets for your recommendations where appropriate.",
    ),
    (
        "Conciseness and Thoroughness",
        "Be concise in your explanations but thorough in your analysis. Prioritize critical issues.",
    ),
    ("Tone", "Maintain a constructive and helpful tone."),
];

/// Build the system prompt.
pub fn system_prompt(pr_url: Option<&str>, files: &[SubmittedFile]) -> String {
    let mut prompt = format!("{PERSONA}\n\nKey areas to focus on:\n");
    for (area, guidance) in CHECKLIST {
        prompt.push_str(&format!("- **{area}**: {guidance}\n"));
    }
    prompt.push('\n');

    if let Some(url) = pr_url.map(str::trim).filter(|u| !u.is_empty()) {
        prompt.push_str(&format!(
            "A GitHub Pull Request is submitted for review: {url}\n\
             Please analyze this Pull Request. If you cannot directly access the URL content, \
             state that clearly and perform your review based on any other provided code and \
             context. Focus on the conceptual changes if the diff is not available to you.\n\n"
        ));
    }

    if !files.is_empty() {
        prompt.push_str("The following code files are submitted for review:\n\n");
        for file in files {
            let fence = fence_for(&file.content);
            prompt.push_str(&format!(
                "--- File: {name} ---\n{fence}\n{content}\n{fence}\n\n",
                name = file.name,
                content = file.content,
            ));
        }
    }

    prompt
}

/// Compose the full message list: `[system, ...history]`.
///
/// When the history has no user turn with text, [`OPENING_INSTRUCTION`]
/// becomes the first user turn.
pub fn compose(
    history: &[ChatMessage],
    files: &[SubmittedFile],
    pr_url: Option<&str>,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(system_prompt(pr_url, files)));

    let has_user_turn = history
        .iter()
        .any(|m| m.role == Role::User && m.has_text());
    if !has_user_turn {
        messages.push(ChatMessage::user(OPENING_INSTRUCTION));
    }
    messages.extend(history.iter().cloned());
    messages
}

/// A backtick fence longer than any run inside `content`.
fn fence_for(content: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for c in content.chars() {
        if c == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    "`".repeat(longest.max(2) + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_are_fenced_under_named_headers() {
        let files = vec![SubmittedFile::new("a.py", "print(1)")];
        let messages = compose(&[], &files, None);

        assert_eq!(messages[0].role, Role::System);
        let system = &messages[0].content;
        assert!(system.contains("--- File: a.py ---\n```\nprint(1)\n```\n"));
    }

    #[test]
    fn checklist_covers_every_area() {
        let prompt = system_prompt(None, &[]);
        for area in [
            "Bugs and Logic Errors",
            "Performance",
            "Security Vulnerabilities",
            "Best Practices",
            "Code Style & Readability",
            "Actionable Suggestions",
            "Conciseness and Thoroughness",
            "Tone",
        ] {
            assert!(prompt.contains(area), "missing {area}");
        }
        assert!(!prompt.contains("--- File:"));
        assert!(!prompt.contains("Pull Request is submitted"));
    }

    #[test]
    fn pr_paragraph_names_url() {
        let prompt = system_prompt(Some("https://github.com/o/r/pull/1"), &[]);
        assert!(prompt.contains("submitted for review: https://github.com/o/r/pull/1"));
        assert!(prompt.contains("If you cannot directly access the URL content"));
    }

    #[test]
    fn blank_pr_url_adds_no_paragraph() {
        assert!(!system_prompt(Some("  "), &[]).contains("Pull Request is submitted"));
    }

    #[test]
    fn history_passes_through_in_order() {
        let history = vec![
            ChatMessage::user("look at this"),
            ChatMessage::assistant("looks fine"),
            ChatMessage::user("and now?"),
        ];
        let messages = compose(&history, &[], None);
        assert_eq!(messages.len(), 4);
        assert_eq!(&messages[1..], &history[..]);
    }

    #[test]
    fn opening_turn_used_without_user_text() {
        let files = vec![SubmittedFile::new("a.py", "x")];
        let messages = compose(&[], &files, None);
        assert_eq!(messages[1], ChatMessage::user(OPENING_INSTRUCTION));

        let messages = compose(&[ChatMessage::user("  ")], &[], Some("u"));
        assert_eq!(messages[1], ChatMessage::user(OPENING_INSTRUCTION));
        assert_eq!(messages[2], ChatMessage::user("  "));
    }

    #[test]
    fn fence_outgrows_embedded_backticks() {
        let files = vec![SubmittedFile::new("README.md", "```rust\nfn x() {}\n```")];
        let prompt = system_prompt(None, &files);
        assert!(prompt.contains("--- File: README.md ---\n````\n```rust"));
    }
}
