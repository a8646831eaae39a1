//! Role-tag markup parser.
//!
//! Prompts are flat text with inline `<<system>>`, `<<user>>` and
//! `<<assistant>>` tags. Each tag opens a segment that runs until the next
//! role tag or the end of the text.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static ROLE_TAG: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"<<(system|user|assistant)>>").unwrap());

static ANY_TAG: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"<<([A-Za-z_]+)>>").unwrap());

/// Conversation structure extracted from markup text.
///
/// # Example
///
/// ```
/// use converse_domain::ParsedPrompt;
///
/// let parsed = ParsedPrompt::parse("<<system>>Be terse.<<user>>Hi<<assistant>><<user>>Again");
/// assert_eq!(parsed.system, "Be terse.");
/// assert_eq!(parsed.user, vec!["Hi", "Again"]);
/// assert!(parsed.assistant.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedPrompt {
    pub system: String,
    pub user: Vec<String>,
    pub assistant: Vec<String>,
}

impl ParsedPrompt {
    /// Parse markup text.
    ///
    /// Text before the first tag is ignored. Only the first system segment
    /// is kept. Assistant segments that trim to nothing are dropped. Input
    /// without any role tag becomes a single user message.
    pub fn parse(text: &str) -> Self {
        let tags: Vec<_> = ROLE_TAG.captures_iter(text).collect();
        if tags.is_empty() {
            return Self {
                user: vec![text.trim().to_string()],
                ..Self::default()
            };
        }

        let mut parsed = Self::default();
        let mut seen_system = false;
        for (i, caps) in tags.iter().enumerate() {
            let (Some(whole), Some(role)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let end = tags
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map_or(text.len(), |m| m.start());
            let segment = text[whole.end()..end].trim().to_string();

            match role.as_str() {
                "system" if !seen_system => {
                    parsed.system = segment;
                    seen_system = true;
                }
                "system" => {}
                "user" => parsed.user.push(segment),
                _ if !segment.is_empty() => parsed.assistant.push(segment),
                _ => {}
            }
        }
        parsed
    }

    /// Parse caller input, rejecting any `<<word>>` tag that is not a role.
    pub fn parse_strict(text: &str) -> Result<Self, DomainError> {
        Self::check_tags(text)?;
        Ok(Self::parse(text))
    }

    /// Reject any `<<word>>` tag that is not a role.
    pub fn check_tags(text: &str) -> Result<(), DomainError> {
        for caps in ANY_TAG.captures_iter(text) {
            if let Some(word) = caps.get(1)
                && !matches!(word.as_str(), "system" | "user" | "assistant")
            {
                return Err(DomainError::UnknownTag(word.as_str().to_string()));
            }
        }
        Ok(())
    }

    /// True if the text contains at least one role tag.
    pub fn has_role_tag(text: &str) -> bool {
        ROLE_TAG.is_match(text)
    }

    /// True when the last turn already carries an assistant reply.
    pub fn ends_with_assistant(&self) -> bool {
        !self.assistant.is_empty() && self.assistant.len() == self.user.len()
    }

    /// Pair user and assistant segments by position, up to the longer list.
    pub fn turns(&self) -> impl Iterator<Item = (Option<&str>, Option<&str>)> {
        let len = self.user.len().max(self.assistant.len());
        (0..len).map(|i| {
            (
                self.user.get(i).map(String::as_str),
                self.assistant.get(i).map(String::as_str),
            )
        })
    }

    /// Render back to markup that [`ParsedPrompt::parse`] reads to the same
    /// user and assistant lists.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        if !self.system.is_empty() {
            out.push_str(&format!("<<system>>\n{}\n", self.system));
        }
        for (user, assistant) in self.turns() {
            if let Some(user) = user {
                out.push_str(&format!("<<user>>\n{user}\n"));
            }
            if let Some(assistant) = assistant {
                out.push_str(&format!("<<assistant>>\n{assistant}\n"));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "",
        "   plain text   ",
        "<<user>>hi",
        "<<system>>S<<user>>a<<assistant>>b<<user>>c",
        "preamble <<user>> a <<assistant>>   <<user>> b",
        "<<assistant>>orphan<<user>>late",
        "<<user>><<user>>\n\n<<assistant>>x",
        "<<system>>first<<system>>second<<user>>u",
        "<<user>>uses << and >> freely<<assistant>>ok $5",
    ];

    #[test]
    fn test_untagged_input_is_single_user_message() {
        for text in ["hello", "  padded\n", "", "a << b >> c", "$100"] {
            let parsed = ParsedPrompt::parse(text);
            assert_eq!(parsed.user, vec![text.trim().to_string()]);
            assert_eq!(parsed.system, "");
            assert!(parsed.assistant.is_empty());
        }
    }

    #[test]
    fn test_segments_run_to_next_tag() {
        let parsed = ParsedPrompt::parse("<<system>>S<<user>>a<<assistant>>b<<user>>c");
        assert_eq!(parsed.system, "S");
        assert_eq!(parsed.user, vec!["a", "c"]);
        assert_eq!(parsed.assistant, vec!["b"]);
    }

    #[test]
    fn test_trailing_segment_is_kept() {
        let parsed = ParsedPrompt::parse("<<user>>\nWhat next?\n");
        assert_eq!(parsed.user, vec!["What next?"]);
    }

    #[test]
    fn test_empty_assistant_dropped_empty_user_kept() {
        let parsed = ParsedPrompt::parse("<<user>><<assistant>>  <<user>>b");
        assert_eq!(parsed.user, vec!["", "b"]);
        assert!(parsed.assistant.is_empty());
    }

    #[test]
    fn test_absent_system_is_empty() {
        assert_eq!(ParsedPrompt::parse("<<user>>x").system, "");
    }

    #[test]
    fn test_first_system_wins() {
        let parsed = ParsedPrompt::parse("<<system>>first<<system>>second<<user>>u");
        assert_eq!(parsed.system, "first");
    }

    #[test]
    fn test_text_before_first_tag_is_ignored() {
        let parsed = ParsedPrompt::parse("ignored<<user>>kept");
        assert_eq!(parsed.user, vec!["kept"]);
    }

    #[test]
    fn test_reparse_is_idempotent_on_turns() {
        for text in SAMPLES {
            let once = ParsedPrompt::parse(text);
            let twice = ParsedPrompt::parse(&once.to_markup());
            assert_eq!(once.user, twice.user, "input: {text:?}");
            assert_eq!(once.assistant, twice.assistant, "input: {text:?}");
        }
    }

    #[test]
    fn test_strict_rejects_unknown_tag() {
        let result = ParsedPrompt::parse_strict("<<usr>>typo");
        assert_eq!(result, Err(DomainError::UnknownTag("usr".to_string())));
        assert!(ParsedPrompt::parse_strict("<<user>>fine << x >>").is_ok());
    }

    #[test]
    fn test_ends_with_assistant() {
        assert!(ParsedPrompt::parse("<<user>>a<<assistant>>b").ends_with_assistant());
        assert!(!ParsedPrompt::parse("<<user>>a<<assistant>>b<<user>>c").ends_with_assistant());
        assert!(!ParsedPrompt::parse("<<user>>a").ends_with_assistant());
        assert!(!ParsedPrompt::parse("<<system>>s").ends_with_assistant());
    }

    #[test]
    fn test_turns_cover_longer_list() {
        let parsed = ParsedPrompt::parse("<<assistant>>x<<assistant>>y<<user>>u");
        let turns: Vec<_> = parsed.turns().collect();
        assert_eq!(turns, vec![(Some("u"), Some("x")), (None, Some("y"))]);
    }

    #[test]
    fn test_has_role_tag() {
        assert!(ParsedPrompt::has_role_tag("x <<assistant>> y"));
        assert!(!ParsedPrompt::has_role_tag("<<SYS>> not a role"));
    }
}
