//! Console output formatting for replies, history and configuration issues

use colored::Colorize;
use converse_domain::{ConfigIssue, ConversationHistory, Role, Severity};
use serde_json::json;

/// Formats conversation output for terminal display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format a one-shot reply
    pub fn format_reply(reply: &str) -> String {
        let mut output = reply.trim_end().to_string();
        output.push('\n');
        output
    }

    /// Format a one-shot reply as a JSON object
    pub fn format_json(model_id: &str, reply: &str) -> String {
        let value = json!({
            "model": model_id,
            "response": reply,
        });
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format the conversation so far, one block per message
    pub fn format_history(history: &ConversationHistory) -> String {
        if history.is_blank() {
            return format!("{}\n", "(history is empty)".dimmed());
        }

        let mut output = Self::section_header(&format!(
            "History ({}/{} messages)",
            history.len(),
            history.max_messages()
        ));

        if let Some(system) = history.system_message() {
            output.push_str(&format!("{}\n{}\n\n", Self::role_label(Role::System), system));
        }

        for message in history.messages() {
            output.push_str(&format!(
                "{}\n{}\n\n",
                Self::role_label(message.role()),
                Self::indent(message.content(), "  ")
            ));
        }

        output
    }

    /// Format configuration issues, errors first
    pub fn format_issues(issues: &[ConfigIssue]) -> String {
        let mut sorted: Vec<&ConfigIssue> = issues.iter().collect();
        sorted.sort_by_key(|issue| !issue.is_error());

        sorted
            .into_iter()
            .map(|issue| match issue.severity {
                Severity::Error => format!("{} {}\n", "error:".red().bold(), issue.message),
                Severity::Warning => format!("{} {}\n", "warning:".yellow().bold(), issue.message),
            })
            .collect()
    }

    pub fn format_error(error: &dyn std::fmt::Display) -> String {
        format!("{} {}", "Error:".red().bold(), error)
    }

    fn role_label(role: Role) -> String {
        let label = format!("[{}]", role);
        match role {
            Role::System => label.magenta().bold().to_string(),
            Role::User => label.cyan().bold().to_string(),
            Role::Assistant => label.green().bold().to_string(),
        }
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use converse_domain::ConfigIssueCode;

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_format_json() {
        let out = ConsoleFormatter::format_json("amazon.titan-text-express-v1", "Hi \"there\"");
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["model"], "amazon.titan-text-express-v1");
        assert_eq!(value["response"], "Hi \"there\"");
    }

    #[test]
    fn test_format_history_lists_roles_in_order() {
        plain();
        let mut history = ConversationHistory::new(10);
        history.add_message(Role::System, "Be terse.");
        history.add_message(Role::User, "Hi");
        history.add_message(Role::Assistant, "Hello\nthere");

        let out = ConsoleFormatter::format_history(&history);
        assert!(out.contains("History (2/10 messages)"));
        let system = out.find("[system]").unwrap();
        let user = out.find("[user]").unwrap();
        let assistant = out.find("[assistant]").unwrap();
        assert!(system < user && user < assistant);
        assert!(out.contains("  Hello\n  there"));
    }

    #[test]
    fn test_format_empty_history() {
        plain();
        let out = ConsoleFormatter::format_history(&ConversationHistory::default());
        assert!(out.contains("history is empty"));
    }

    #[test]
    fn test_format_issues_errors_first() {
        plain();
        let issues = vec![
            ConfigIssue::warning(
                ConfigIssueCode::Zero { field: "history.max_messages".to_string() },
                "history.max_messages is 0",
            ),
            ConfigIssue::error(
                ConfigIssueCode::EmptyValue { field: "model.id".to_string() },
                "model.id is empty",
            ),
        ];
        let out = ConsoleFormatter::format_issues(&issues);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines, vec!["error: model.id is empty", "warning: history.max_messages is 0"]);
    }

    #[test]
    fn test_reply_ends_with_single_newline() {
        assert_eq!(ConsoleFormatter::format_reply("done\n\n"), "done\n");
    }
}
