use serde::{Deserialize, Serialize};

/// Element category as written to the output records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementTag {
    Button,
    Input,
    Link,
    Textarea,
}

impl ElementTag {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Button => "button",
            Self::Input => "input",
            Self::Link => "link",
            Self::Textarea => "textarea",
        }
    }
}

impl std::fmt::Display for ElementTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One interactive element found on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// `id` attribute, empty when absent
    pub id: String,
    /// Human-facing name: text, placeholder, name, id, test id, or a fallback
    pub name: String,
    pub tag: ElementTag,
    /// Trimmed text content, at most 50 characters
    pub text: String,
    /// Explicit `role` attribute, otherwise the category
    pub role: String,
    #[serde(rename = "data-testid")]
    pub test_id: String,
    pub class: String,
    pub placeholder: String,
    /// Concrete `type` of an input element
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    /// `after_<trigger name>` for elements revealed by an exploration step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_context: Option<String>,
}

impl Element {
    /// Identity used for deduplication: tag, name, test id and role.
    #[must_use]
    pub fn owned_signature(&self) -> ElementSignature {
        ElementSignature {
            tag: self.tag,
            name: self.name.clone(),
            test_id: self.test_id.clone(),
            role: self.role.clone(),
        }
    }
}

/// Deduplication key of an [`Element`], usable in sets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementSignature {
    pub tag: ElementTag,
    pub name: String,
    pub test_id: String,
    pub role: String,
}

/// Extraction result for one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageElements {
    pub url: String,
    pub title: String,
    pub elements: Vec<Element>,
}
