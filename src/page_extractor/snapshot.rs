//! Flat DOM snapshots.
//!
//! A snapshot lists every element in document order with its parent index,
//! a fixed set of attributes, candidate text and visibility/enabled flags.
//! Rendered pages produce one with [`super::js_scripts::SNAPSHOT_SCRIPT`];
//! static documents produce an equivalent one with [`DomSnapshot::from_html`].
//! Node indices are the only element identity the extractors use.

use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::js_scripts::SNAPSHOT_ATTRIBUTES;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotNode {
    /// Lower-cased tag name.
    pub tag: String,
    #[serde(default)]
    pub parent: Option<usize>,
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    /// Raw text content; only filled for possible extraction candidates.
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub visible: bool,
    #[serde(default)]
    pub enabled: bool,
}

impl SnapshotNode {
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomSnapshot {
    pub nodes: Vec<SnapshotNode>,
    #[serde(skip)]
    children: Vec<Vec<usize>>,
}

impl DomSnapshot {
    /// Build from a node list, indexing children by parent.
    #[must_use]
    pub fn new(nodes: Vec<SnapshotNode>) -> Self {
        let mut children = vec![Vec::new(); nodes.len()];
        for (idx, node) in nodes.iter().enumerate() {
            // A parent always precedes its children in document order
            if let Some(parent) = node.parent.filter(|p| *p < idx) {
                children[parent].push(idx);
            }
        }
        Self { nodes, children }
    }

    /// Parse the JSON returned by the snapshot script.
    ///
    /// # Errors
    ///
    /// Fails when the value does not have the `{ nodes: [...] }` shape.
    pub fn from_json(value: serde_json::Value) -> anyhow::Result<Self> {
        #[derive(Deserialize)]
        struct Raw {
            nodes: Vec<SnapshotNode>,
        }
        let raw: Raw = serde_json::from_value(value)?;
        Ok(Self::new(raw.nodes))
    }

    /// Build a snapshot from markup alone.
    ///
    /// Without layout, an element counts as visible unless it or an ancestor
    /// carries `hidden`, is `<input type=hidden>`, is a non-rendered tag, is
    /// a closed `<dialog>`, or has an inline `display:none` /
    /// `visibility:hidden`. It is enabled unless it is disabled itself, sits
    /// in a disabled `<fieldset>`, or has an `aria-disabled="true"` ancestor.
    #[must_use]
    pub fn from_html(html: &str) -> Self {
        let document = Html::parse_document(html);
        let mut nodes: Vec<SnapshotNode> = Vec::new();
        let mut index_of = HashMap::new();
        let mut hidden_below: Vec<bool> = Vec::new();
        let mut disabled_below: Vec<bool> = Vec::new();

        for node in document.tree.root().descendants() {
            let Some(element) = ElementRef::wrap(node) else {
                continue;
            };
            let value = element.value();
            let tag = value.name().to_ascii_lowercase();
            let parent = node
                .ancestors()
                .find_map(|ancestor| index_of.get(&ancestor.id()).copied());

            let attrs: BTreeMap<String, String> = SNAPSHOT_ATTRIBUTES
                .iter()
                .filter_map(|name| value.attr(name).map(|v| ((*name).to_string(), v.to_string())))
                .collect();

            let inherited_hidden = parent.is_some_and(|p| hidden_below[p]);
            let inherited_disabled = parent.is_some_and(|p| disabled_below[p]);

            let self_hidden = hides_itself(&tag, &attrs);
            let self_disabled = disables_itself(&tag, &attrs);

            let wants_text = matches!(tag.as_str(), "a" | "button" | "input" | "textarea" | "summary")
                || attrs.contains_key("role");
            let text = if wants_text {
                element.text().collect::<String>()
            } else {
                String::new()
            };

            let aria_disabled = attrs
                .get("aria-disabled")
                .is_some_and(|v| v.eq_ignore_ascii_case("true"));

            let idx = nodes.len();
            index_of.insert(node.id(), idx);
            hidden_below.push(inherited_hidden || self_hidden);
            // A disabled fieldset disables its contents, not itself
            disabled_below.push(
                inherited_disabled || aria_disabled || (tag == "fieldset" && attrs.contains_key("disabled")),
            );
            nodes.push(SnapshotNode {
                tag,
                parent,
                attrs,
                text,
                visible: !(inherited_hidden || self_hidden),
                enabled: !(inherited_disabled || self_disabled || aria_disabled),
            });
        }

        Self::new(nodes)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn node(&self, idx: usize) -> Option<&SnapshotNode> {
        self.nodes.get(idx)
    }

    /// Descendants of `idx` in document order, excluding `idx` itself.
    #[must_use]
    pub fn descendants(&self, idx: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = self
            .children
            .get(idx)
            .map(|c| c.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(next) = stack.pop() {
            out.push(next);
            if let Some(kids) = self.children.get(next) {
                stack.extend(kids.iter().rev());
            }
        }
        out
    }

    /// Indices of nodes whose tag is `tag`.
    pub fn by_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = usize> + 'a {
        self.nodes
            .iter()
            .enumerate()
            .filter(move |(_, n)| n.tag == tag)
            .map(|(i, _)| i)
    }
}

const NON_RENDERED: &[&str] = &[
    "head", "script", "style", "template", "title", "meta", "link", "noscript", "base",
];

fn hides_itself(tag: &str, attrs: &BTreeMap<String, String>) -> bool {
    if NON_RENDERED.contains(&tag) || attrs.contains_key("hidden") {
        return true;
    }
    if tag == "input"
        && attrs
            .get("type")
            .is_some_and(|t| t.trim().eq_ignore_ascii_case("hidden"))
    {
        return true;
    }
    if tag == "dialog" && !attrs.contains_key("open") {
        return true;
    }
    attrs.get("style").is_some_and(|style| {
        let compact: String = style
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        compact.contains("display:none") || compact.contains("visibility:hidden")
    })
}

fn disables_itself(tag: &str, attrs: &BTreeMap<String, String>) -> bool {
    matches!(tag, "button" | "input" | "select" | "textarea" | "option" | "optgroup")
        && attrs.contains_key("disabled")
}
