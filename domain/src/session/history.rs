//! Bounded conversation history.
//!
//! [`ConversationHistory`] keeps an ordered FIFO buffer of user/assistant
//! messages plus a single system-message slot. It is owned by exactly one
//! session and mutated only between turns.

use super::entities::{Message, Role};
use crate::vendor::family::VendorFamily;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default bound on retained non-system messages.
pub const DEFAULT_MAX_MESSAGES: usize = 100;

/// Ordered, bounded buffer of role-tagged messages (Entity)
///
/// # Example
///
/// ```
/// use converse_domain::{ConversationHistory, Role};
///
/// let mut history = ConversationHistory::new(2);
/// history.add_message(Role::System, "Be terse.");
/// history.add_message(Role::User, "one");
/// history.add_message(Role::Assistant, "two");
/// history.add_message(Role::User, "three");
///
/// assert_eq!(history.len(), 2);
/// assert_eq!(history.messages()[0].content(), "two");
/// assert_eq!(history.system_message(), Some("Be terse."));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationHistory {
    messages: VecDeque<Message>,
    system_message: Option<String>,
    max_messages: usize,
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MESSAGES)
    }
}

impl ConversationHistory {
    pub fn new(max_messages: usize) -> Self {
        Self {
            messages: VecDeque::new(),
            system_message: None,
            max_messages,
        }
    }

    /// Add a message.
    ///
    /// A system message replaces the current one. User and assistant
    /// messages are appended after evicting the oldest entries that would
    /// push the buffer past `max_messages`.
    pub fn add_message(&mut self, role: Role, content: impl Into<String>) {
        let content = content.into();
        if role == Role::System {
            self.system_message = Some(content);
            return;
        }
        if self.max_messages == 0 {
            return;
        }
        while self.messages.len() >= self.max_messages {
            self.messages.pop_front();
        }
        self.messages.push_back(Message::new(role, content));
    }

    /// Add an already constructed message.
    pub fn push(&mut self, message: Message) {
        self.add_message(message.role(), message.content());
    }

    /// Render the history in the encoding expected by `model_id`'s vendor.
    ///
    /// Returns an empty string when there is nothing to render.
    pub fn formatted_history(&self, model_id: &str) -> String {
        if self.is_blank() {
            return String::new();
        }
        VendorFamily::classify(model_id)
            .formatter()
            .render_history(self)
    }

    /// Render the history as `<<role>>` markup, independent of vendor.
    ///
    /// This is the form the markup parser reads back losslessly.
    pub fn to_markup(&self) -> String {
        if self.is_blank() {
            return String::new();
        }
        crate::vendor::encodings::markup_history(self)
    }

    /// The last `n` non-system messages, oldest first.
    pub fn last_messages(&self, n: usize) -> Vec<&Message> {
        let skip = self.messages.len().saturating_sub(n);
        self.messages.iter().skip(skip).collect()
    }

    pub fn messages(&self) -> &VecDeque<Message> {
        &self.messages
    }

    pub fn system_message(&self) -> Option<&str> {
        self.system_message.as_deref()
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    /// Number of retained non-system messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// True when there are no messages and no system message.
    pub fn is_blank(&self) -> bool {
        self.messages.is_empty() && self.system_message.is_none()
    }

    /// Reset to the empty state.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.system_message = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alternating(n: usize, max: usize) -> ConversationHistory {
        let mut history = ConversationHistory::new(max);
        for i in 0..n {
            let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
            history.add_message(role, format!("m{i}"));
        }
        history
    }

    #[test]
    fn test_push_follows_add_message_rules() {
        let mut history = ConversationHistory::new(2);
        history.push(Message::system("Be brief."));
        history.push(Message::user("a"));
        history.push(Message::assistant("b"));
        history.push(Message::user("c"));

        assert_eq!(history.system_message(), Some("Be brief."));
        let contents: Vec<&str> = history.messages().iter().map(|m| m.content()).collect();
        assert_eq!(contents, vec!["b", "c"]);
    }

    #[test]
    fn test_bound_is_never_exceeded() {
        for n in [0, 1, 5, 10, 11, 57] {
            let history = alternating(n, 10);
            assert!(history.len() <= 10);
            assert_eq!(history.len(), n.min(10));
        }
    }

    #[test]
    fn test_eviction_is_fifo() {
        let history = alternating(101, 100);
        assert_eq!(history.len(), 100);
        assert_eq!(history.messages()[0].content(), "m1");
        assert_eq!(history.messages()[99].content(), "m100");
    }

    #[test]
    fn test_system_message_is_replaced() {
        let mut history = ConversationHistory::default();
        history.add_message(Role::System, "a");
        history.add_message(Role::System, "b");
        assert_eq!(history.system_message(), Some("b"));
        assert!(history.is_empty());
    }

    #[test]
    fn test_system_message_does_not_count_toward_bound() {
        let mut history = alternating(3, 3);
        history.add_message(Role::System, "sys");
        assert_eq!(history.len(), 3);
        assert_eq!(history.messages()[0].content(), "m0");
    }

    #[test]
    fn test_zero_capacity_keeps_only_system() {
        let mut history = ConversationHistory::new(0);
        history.add_message(Role::User, "dropped");
        history.add_message(Role::System, "kept");
        assert!(history.is_empty());
        assert_eq!(history.system_message(), Some("kept"));
    }

    #[test]
    fn test_last_messages() {
        let history = alternating(5, 10);
        let last: Vec<&str> = history.last_messages(2).iter().map(|m| m.content()).collect();
        assert_eq!(last, vec!["m3", "m4"]);
        assert_eq!(history.last_messages(50).len(), 5);
        assert!(ConversationHistory::default().last_messages(1).is_empty());
    }

    #[test]
    fn test_clear() {
        let mut history = alternating(4, 10);
        history.add_message(Role::System, "sys");
        history.clear();
        assert!(history.is_blank());
        assert_eq!(history.formatted_history("meta.llama3-8b-instruct-v1:0"), "");
    }

    #[test]
    fn test_formatted_history_empty() {
        let history = ConversationHistory::default();
        assert_eq!(history.formatted_history("amazon.titan-text-express-v1"), "");
        assert_eq!(history.to_markup(), "");
    }

    #[test]
    fn test_formatted_history_system_only() {
        let mut history = ConversationHistory::default();
        history.add_message(Role::System, "Be terse.");
        assert_eq!(
            history.formatted_history("amazon.titan-text-express-v1"),
            "<<system>>\nBe terse.\n"
        );
    }

    #[test]
    fn test_formatted_history_llama3() {
        let mut history = ConversationHistory::default();
        history.add_message(Role::System, "Be terse.");
        history.add_message(Role::User, "Hi");
        history.add_message(Role::Assistant, "Hello");
        assert_eq!(
            history.formatted_history("meta.llama3-8b-instruct-v1:0"),
            "<|begin_of_text|><|start_header_id|>system<|end_header_id|>\nBe terse.<|eot_id|>\n\
             <|start_header_id|>user<|end_header_id|>\nHi<|eot_id|>\n\
             <|start_header_id|>assistant<|end_header_id|>\nHello<|eot_id|>\n"
        );
    }

    #[test]
    fn test_formatted_history_mistral() {
        let mut history = ConversationHistory::default();
        history.add_message(Role::System, "Be terse.");
        history.add_message(Role::User, "Hi");
        history.add_message(Role::Assistant, "Hello");
        history.add_message(Role::User, "Again");
        assert_eq!(
            history.formatted_history("mistral.mistral-7b-instruct-v0:2"),
            "<<SYS>>Be terse.<</SYS>><s>[INST]Hi[/INST]Hello</s><s>[INST]Again"
        );
    }

    #[test]
    fn test_markup_is_vendor_independent() {
        let mut history = ConversationHistory::default();
        history.add_message(Role::User, "Hi");
        history.add_message(Role::Assistant, "Hello");
        let expected = "<<user>>\nHi\n<<assistant>>\nHello\n";
        assert_eq!(history.to_markup(), expected);
        assert_eq!(history.formatted_history("anthropic.claude-v2"), expected);
    }
}
