//! Structural deduplication of repeated rows.
//!
//! Data tables and ARIA grids repeat the same row template many times. Only
//! the first row of each `<tbody>` and of each `role="grid"` container is
//! kept; every later row and everything inside it is excluded from element
//! extraction. The result is a set of snapshot indices, the document is
//! never touched.

use log::debug;
use std::collections::HashSet;

use super::snapshot::DomSnapshot;

#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralDeduplicator;

impl StructuralDeduplicator {
    /// Indices of every node that extraction must ignore.
    #[must_use]
    pub fn excluded(snapshot: &DomSnapshot) -> HashSet<usize> {
        let mut roots: Vec<usize> = Vec::new();

        for tbody in snapshot.by_tag("tbody") {
            roots.extend(
                snapshot
                    .descendants(tbody)
                    .into_iter()
                    .filter(|&i| snapshot.nodes[i].tag == "tr")
                    .skip(1),
            );
        }

        for (grid, _) in snapshot
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.attr("role") == Some("grid"))
        {
            roots.extend(
                snapshot
                    .descendants(grid)
                    .into_iter()
                    .filter(|&i| snapshot.nodes[i].attr("role") == Some("row"))
                    .skip(1),
            );
        }

        let mut excluded: HashSet<usize> = HashSet::new();
        for root in roots {
            if excluded.insert(root) {
                excluded.extend(snapshot.descendants(root));
            }
        }

        if !excluded.is_empty() {
            debug!(
                target: "sitescout::elements",
                "Excluded {} nodes inside repeated rows",
                excluded.len()
            );
        }
        excluded
    }
}
