//! CLI command definitions and terminal helpers.
//!
//! Uses clap derive macros for argument definitions.

pub mod args;

use colored::Colorize;

use revu::intake::IntakeReport;

/// A line typed during an interactive review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Set (or clear, when empty) the pull request URL.
    Pr(String),
    /// Add a file or directory.
    File(String),
    /// Remove an uploaded file by name.
    Drop(String),
    /// List uploaded files.
    Files,
    Help,
    Quit,
    /// A message for the reviewer.
    Say(String),
}

impl ChatCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return ChatCommand::Say(line.to_string());
        };
        let (cmd, arg) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        let arg = arg.trim().to_string();
        match cmd {
            "pr" => ChatCommand::Pr(arg),
            "file" => ChatCommand::File(arg),
            "drop" => ChatCommand::Drop(arg),
            "files" => ChatCommand::Files,
            "help" | "?" => ChatCommand::Help,
            "quit" | "exit" | "q" => ChatCommand::Quit,
            _ => ChatCommand::Say(line.to_string()),
        }
    }
}

pub const INTERACTIVE_HELP: &str = "\
  /pr <url>      set the pull request (empty clears it)
  /file <path>   add a file or directory
  /drop <name>   remove an uploaded file
  /files         list uploaded files
  /quit          leave";

/// Mask a secret for display, keeping a short prefix and suffix.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "•".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}

/// Print accepted files and every rejection, in order.
pub fn print_intake_report(report: &IntakeReport) {
    for name in &report.accepted {
        eprintln!("  {} {}", "+".green().bold(), name);
    }
    for rejection in &report.rejected {
        eprintln!("  {} {}", "✗".red().bold(), rejection);
    }
    if report.limit_reached {
        eprintln!(
            "  {}",
            "Upload limit reached; remaining files were skipped.".yellow()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_slash_commands() {
        assert_eq!(
            ChatCommand::parse("/pr https://github.com/o/r/pull/2"),
            ChatCommand::Pr("https://github.com/o/r/pull/2".to_string())
        );
        assert_eq!(ChatCommand::parse("/pr"), ChatCommand::Pr(String::new()));
        assert_eq!(ChatCommand::parse(" /drop a.py "), ChatCommand::Drop("a.py".to_string()));
        assert_eq!(ChatCommand::parse("/quit"), ChatCommand::Quit);
        assert_eq!(ChatCommand::parse("/files"), ChatCommand::Files);
    }

    #[test]
    fn plain_text_and_unknown_commands_are_messages() {
        assert_eq!(ChatCommand::parse("why?"), ChatCommand::Say("why?".to_string()));
        assert_eq!(
            ChatCommand::parse("/usr/bin is odd"),
            ChatCommand::Say("/usr/bin is odd".to_string())
        );
    }

    #[test]
    fn mask_secret_hides_middle() {
        assert_eq!(mask_secret("sk-abcdefghijkl"), "sk-a…ijkl");
        assert_eq!(mask_secret("short"), "•••••");
    }

    #[test]
    fn print_intake_report_does_not_panic() {
        print_intake_report(&IntakeReport {
            accepted: vec!["a.py".to_string()],
            rejected: vec![],
            limit_reached: true,
        });
    }
}
