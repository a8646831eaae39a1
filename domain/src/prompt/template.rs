//! `{{name}}` placeholder templates and few-shot example blocks

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"\{\{(\w+)\}\}").unwrap());

/// Variable bindings passed to [`PromptTemplate::render`].
pub type Variables = HashMap<String, String>;

/// A named prompt with `{{variable}}` placeholders.
///
/// # Example
///
/// ```
/// use converse_domain::{PromptTemplate, Variables};
///
/// let template = PromptTemplate::new("summarize", "Summarize: {{doc}}").unwrap();
/// let vars = Variables::from([("doc".to_string(), "cats are great".to_string())]);
/// assert_eq!(template.render(&vars).unwrap(), "Summarize: cats are great");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    name: String,
    content: String,
    description: String,
    tags: BTreeMap<String, String>,
}

impl PromptTemplate {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        let content = content.into();
        if name.trim().is_empty() {
            return Err(DomainError::EmptyTemplateField("name"));
        }
        if content.trim().is_empty() {
            return Err(DomainError::EmptyTemplateField("content"));
        }
        Ok(Self {
            name,
            content,
            description: "NA".to_string(),
            tags: BTreeMap::new(),
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    /// Placeholder names in order of first occurrence.
    pub fn variables(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        PLACEHOLDER
            .captures_iter(&self.content)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .filter(|name| seen.insert(name.clone()))
            .collect()
    }

    /// Substitute every placeholder.
    ///
    /// Fails before substituting anything if a placeholder has no binding.
    /// Substituted values are never scanned for further placeholders.
    pub fn render(&self, variables: &Variables) -> Result<String, DomainError> {
        let mut missing: Vec<String> = self
            .variables()
            .into_iter()
            .filter(|name| !variables.contains_key(name))
            .collect();
        if !missing.is_empty() {
            missing.sort();
            return Err(DomainError::MissingVariables(missing));
        }

        let rendered = PLACEHOLDER.replace_all(&self.content, |caps: &regex::Captures| {
            variables.get(&caps[1]).cloned().unwrap_or_default()
        });
        Ok(rendered.into_owned())
    }
}

/// Something that renders a static block of examples ahead of a prompt.
pub trait RenderExamples: Send + Sync {
    fn render(&self) -> Result<String, DomainError>;
}

/// A list of rendered templates used as few-shot examples.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FewShotTemplate {
    examples: Vec<(PromptTemplate, Variables)>,
}

impl FewShotTemplate {
    pub fn new(examples: Vec<(PromptTemplate, Variables)>) -> Self {
        Self { examples }
    }

    pub fn push(&mut self, template: PromptTemplate, variables: Variables) {
        self.examples.push((template, variables));
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }
}

impl RenderExamples for FewShotTemplate {
    fn render(&self) -> Result<String, DomainError> {
        let rendered = self
            .examples
            .iter()
            .map(|(template, vars)| template.render(vars))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rendered.join("\n"))
    }
}
