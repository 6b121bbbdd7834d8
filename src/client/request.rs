//! Assembly of one review turn into a wire request.
//!
//! A fetched pull request contributes its changed files as diff
//! attachments and, when the user typed nothing, its Markdown summary as
//! the user turn.

use crate::github::format::format_pr_summary;
use crate::models::{PrContent, SubmittedFile};
use crate::orchestrator::ReviewRequest;
use crate::session::ChatSession;

use super::ClientError;

/// Everything the user supplied for one turn.
#[derive(Debug, Default)]
pub struct ReviewDraft<'a> {
    pub text: &'a str,
    pub files: Vec<SubmittedFile>,
    pub pr: Option<&'a PrContent>,
    pub model: Option<String>,
    pub api_key: Option<String>,
}

/// Turn a draft into the next request and record the user turn.
///
/// Fails with [`ClientError::NothingToReview`] before touching the session
/// when there is no text, no file and no pull request. Returns `Ok(None)`
/// while a previous request is still outstanding.
pub fn build_request(
    session: &mut ChatSession,
    draft: ReviewDraft<'_>,
) -> Result<Option<ReviewRequest>, ClientError> {
    let mut text = draft.text.trim().to_string();
    let mut files = draft.files;
    if let Some(pr) = draft.pr {
        if text.is_empty() {
            text = format_pr_summary(pr);
        }
        files.extend(pr.derived_files());
    }
    if text.is_empty() && files.is_empty() && draft.pr.is_none() {
        return Err(ClientError::NothingToReview);
    }

    let Some(messages) = session.submit(&text) else {
        return Ok(None);
    };
    Ok(Some(ReviewRequest {
        messages,
        model: draft.model,
        files,
        github_pr_url: draft.pr.map(|pr| pr.url.clone()),
        api_key: draft.api_key,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChatMessage, FileStatus, PrSummaryFile};
    use crate::session::Phase;

    fn pr() -> PrContent {
        PrContent {
            url: "https://github.com/o/r/pull/3".to_string(),
            title: "Fix overflow".to_string(),
            description: "Clamp the deadline.".to_string(),
            author: "dev".to_string(),
            additions: 2,
            deletions: 1,
            changed_files: 1,
            files: vec![PrSummaryFile {
                name: "src/lib.rs".to_string(),
                status: FileStatus::Modified,
                additions: 2,
                deletions: 1,
                patch: Some("@@ -1 +1,2 @@\n-a\n+b\n+c".to_string()),
                previous_name: None,
            }],
        }
    }

    #[test]
    fn pr_summary_becomes_first_user_turn_without_text() {
        let pr = pr();
        let mut session = ChatSession::new();
        let request = build_request(
            &mut session,
            ReviewDraft {
                text: "  ",
                pr: Some(&pr),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();

        assert_eq!(request.messages, vec![ChatMessage::user(format_pr_summary(&pr))]);
        assert_eq!(request.github_pr_url.as_deref(), Some("https://github.com/o/r/pull/3"));
        assert_eq!(session.phase(), Phase::Submitting);
    }

    #[test]
    fn typed_text_wins_over_pr_summary() {
        let pr = pr();
        let mut session = ChatSession::new();
        let request = build_request(
            &mut session,
            ReviewDraft {
                text: " Is the clamp right? ",
                pr: Some(&pr),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();

        assert_eq!(request.messages, vec![ChatMessage::user("Is the clamp right?")]);
    }

    #[test]
    fn pr_diffs_follow_uploaded_files() {
        let pr = pr();
        let mut session = ChatSession::new();
        let request = build_request(
            &mut session,
            ReviewDraft {
                text: "",
                files: vec![SubmittedFile::new("notes.md", "context")],
                pr: Some(&pr),
                model: Some("m".to_string()),
                api_key: Some("k".to_string()),
            },
        )
        .unwrap()
        .unwrap();

        let names: Vec<_> = request.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["notes.md", "src/lib.rs"]);
        assert_eq!(request.files[1], pr.derived_files()[0]);
        assert!(request.files[1].content.contains("+c"));
        assert_eq!(request.model.as_deref(), Some("m"));
        assert_eq!(request.api_key.as_deref(), Some("k"));
    }

    #[test]
    fn blank_draft_is_rejected_before_submit() {
        let mut session = ChatSession::new();
        let err = build_request(
            &mut session,
            ReviewDraft {
                text: " \n ",
                ..Default::default()
            },
        )
        .unwrap_err();

        assert!(matches!(err, ClientError::NothingToReview));
        assert_eq!(session.phase(), Phase::Idle);
        assert!(session.messages().is_empty());
    }

    #[test]
    fn files_alone_send_without_user_turn() {
        let mut session = ChatSession::new();
        let request = build_request(
            &mut session,
            ReviewDraft {
                files: vec![SubmittedFile::new("a.py", "print(1)")],
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();

        assert!(request.messages.is_empty());
        assert!(request.github_pr_url.is_none());
    }

    #[test]
    fn busy_session_builds_nothing() {
        let mut session = ChatSession::new();
        session.submit("first");
        let built = build_request(
            &mut session,
            ReviewDraft {
                text: "second",
                ..Default::default()
            },
        )
        .unwrap();
        assert!(built.is_none());
        assert_eq!(session.messages().len(), 1);
    }
}
