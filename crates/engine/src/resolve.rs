use std::collections::{BTreeSet, VecDeque};

use fxhash::FxHashSet;
use linkgroup_data::{group::Traversal, TargetGraph, TargetLabel};
use tracing::{debug, trace};

use crate::{filter, group::GroupMapping, Error};

/// Finds the targets selected by a single mapping
///
/// Without filters the mapping's roots are returned as-is, without consulting the graph. With filters, the graph is
/// searched breadth first from the roots (or from every node if there are none) and every node passing the filters
/// is selected. A `tree` mapping does not search below a selected node, since assignment will claim that subtree
/// anyway.
///
/// Labels that are not part of the graph are skipped.
#[tracing::instrument(level = "debug", skip_all, fields(traversal = %mapping.traversal, roots = mapping.roots.len()))]
pub fn resolve(mapping: &GroupMapping, graph: &TargetGraph) -> Result<BTreeSet<TargetLabel>, Error> {
    if mapping.filters.is_empty() {
        if mapping.roots.is_empty() {
            return Err(Error::MissingRootOrFilter);
        }
        return Ok(mapping.roots.iter().cloned().collect());
    }

    let mut queue: VecDeque<&TargetLabel> = if mapping.roots.is_empty() {
        graph.targets().collect()
    } else {
        mapping.roots.iter().collect()
    };
    let mut visited: FxHashSet<&TargetLabel> = Default::default();
    let mut selected = BTreeSet::new();

    while let Some(target) = queue.pop_front() {
        if !visited.insert(target) {
            continue;
        }
        let Some(node) = graph.get(target) else {
            trace!(%target, "skipping target missing from graph");
            continue;
        };

        let is_match = filter::matches(&mapping.filters, target, node);
        if is_match {
            selected.insert(target.clone());
            if mapping.traversal == Traversal::Tree {
                continue;
            }
        }
        queue.extend(node.dependencies());
    }

    debug!(visited = visited.len(), selected = selected.len(), "resolved mapping");
    Ok(selected)
}
