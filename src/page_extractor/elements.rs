//! Interactive element extraction over a [`DomSnapshot`].

use log::debug;
use std::collections::HashSet;

use super::schema::{Element, ElementSignature, ElementTag};
use super::snapshot::{DomSnapshot, SnapshotNode};
use crate::utils::{ELEMENT_TEXT_LIMIT, IGNORE_ATTRIBUTE, UNNAMED_ELEMENT, safe_truncate_chars};

/// Input types that are not text-like and never count as an input element.
const NON_TEXT_INPUT_TYPES: &[&str] = &["hidden", "submit", "button"];

/// Input types whose implicit role is `button`.
const BUTTON_INPUT_TYPES: &[&str] = &["button", "submit", "reset", "image"];

/// Collects buttons, inputs, links and textareas from one snapshot.
pub struct ElementExtractor<'a> {
    snapshot: &'a DomSnapshot,
    excluded: &'a HashSet<usize>,
}

impl<'a> ElementExtractor<'a> {
    #[must_use]
    pub fn new(snapshot: &'a DomSnapshot, excluded: &'a HashSet<usize>) -> Self {
        Self { snapshot, excluded }
    }

    /// A node can be recorded when it is not excluded or ignored and is
    /// visible and enabled. Unknown indices are invalid.
    #[must_use]
    pub fn is_valid(&self, idx: usize) -> bool {
        if self.excluded.contains(&idx) {
            return false;
        }
        let Some(node) = self.snapshot.node(idx) else {
            return false;
        };
        if node.attr(IGNORE_ATTRIBUTE).is_some_and(|v| !v.is_empty()) {
            return false;
        }
        node.visible && node.enabled
    }

    /// Build the output record for node `idx` in category `tag`.
    ///
    /// Returns `None` only for an index outside the snapshot.
    #[must_use]
    pub fn record(&self, idx: usize, tag: ElementTag) -> Option<Element> {
        let node = self.snapshot.node(idx)?;
        let attr = |name: &str| node.attr(name).unwrap_or_default().to_string();

        let text = safe_truncate_chars(node.text.trim(), ELEMENT_TEXT_LIMIT).to_string();
        let id = attr("id");
        let test_id = attr("data-testid");
        let placeholder = attr("placeholder");
        let name_attr = attr("name");

        let name = [&text, &placeholder, &name_attr, &id, &test_id]
            .into_iter()
            .find(|candidate| !candidate.is_empty())
            .cloned()
            .unwrap_or_else(|| UNNAMED_ELEMENT.to_string());

        let role = node
            .attr("role")
            .filter(|r| !r.is_empty())
            .map_or_else(|| tag.as_str().to_string(), String::from);

        let input_type = (tag == ElementTag::Input).then(|| {
            node.attr("type")
                .filter(|t| !t.is_empty())
                .unwrap_or("text")
                .to_string()
        });

        Some(Element {
            id,
            name,
            tag,
            text,
            role,
            test_id,
            class: attr("class"),
            placeholder,
            input_type,
            dynamic_context: None,
        })
    }

    /// Every valid element in category order, deduplicated by signature.
    #[must_use]
    pub fn extract(&self) -> Vec<Element> {
        let categories = [
            (ElementTag::Button, is_button as fn(&SnapshotNode) -> bool),
            (ElementTag::Input, is_text_input),
            (ElementTag::Link, is_text_link),
            (ElementTag::Textarea, is_textarea),
        ];

        let mut elements = Vec::new();
        for (tag, matches) in categories {
            for (idx, node) in self.snapshot.nodes.iter().enumerate() {
                if matches(node) && self.is_valid(idx) {
                    elements.extend(self.record(idx, tag));
                }
            }
        }

        let found = elements.len();
        let unique = dedupe_elements(elements);
        debug!(
            target: "sitescout::elements",
            "Extracted {} elements ({} before deduplication)",
            unique.len(),
            found
        );
        unique
    }

    /// Valid button-role nodes with their records, in document order.
    #[must_use]
    pub fn button_candidates(&self) -> Vec<(usize, Element)> {
        self.snapshot
            .nodes
            .iter()
            .enumerate()
            .filter(|(idx, node)| is_button(node) && self.is_valid(*idx))
            .filter_map(|(idx, _)| self.record(idx, ElementTag::Button).map(|el| (idx, el)))
            .collect()
    }
}

/// Keep the first element of each `(tag, name, test id, role)` signature.
#[must_use]
pub fn dedupe_elements(elements: Vec<Element>) -> Vec<Element> {
    let mut seen: HashSet<ElementSignature> = HashSet::new();
    elements
        .into_iter()
        .filter(|el| seen.insert(el.owned_signature()))
        .collect()
}

fn input_type(node: &SnapshotNode) -> String {
    node.attr("type").unwrap_or_default().trim().to_ascii_lowercase()
}

/// Button by accessible role: an explicit `role` decides, otherwise
/// `<button>` and button-like `<input>` types.
fn is_button(node: &SnapshotNode) -> bool {
    if let Some(role) = node.attr("role").map(str::trim).filter(|r| !r.is_empty()) {
        return role.eq_ignore_ascii_case("button");
    }
    match node.tag.as_str() {
        "button" => true,
        "input" => BUTTON_INPUT_TYPES.contains(&input_type(node).as_str()),
        _ => false,
    }
}

fn is_text_input(node: &SnapshotNode) -> bool {
    node.tag == "input" && !NON_TEXT_INPUT_TYPES.contains(&input_type(node).as_str())
}

fn is_text_link(node: &SnapshotNode) -> bool {
    node.tag == "a" && node.has_attr("href") && !node.text.trim().is_empty()
}

fn is_textarea(node: &SnapshotNode) -> bool {
    node.tag == "textarea"
}
