use std::collections::{btree_map, BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::TargetLabel;

/// A single node of the target graph, as supplied by whatever computed the graph
#[derive(Clone, PartialEq, Eq, Default, Debug, Serialize, Deserialize)]
pub struct GraphNode {
    #[serde(default)]
    pub labels: BTreeSet<String>,
    #[serde(default)]
    pub deps: Vec<TargetLabel>,
    /// Dependencies that are also visible to transitive consumers
    #[serde(default)]
    pub exported_deps: Vec<TargetLabel>,
}

impl GraphNode {
    /// Direct dependencies followed by exported dependencies, in declaration order
    #[inline]
    pub fn dependencies(&self) -> impl Iterator<Item = &TargetLabel> + '_ {
        self.deps.iter().chain(self.exported_deps.iter())
    }
}

/// A fully materialized, read-only target graph
///
/// Iteration is always in [`TargetLabel`] order so that anything derived from a full scan of the graph is
/// reproducible.
#[derive(Clone, PartialEq, Eq, Default, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetGraph {
    nodes: BTreeMap<TargetLabel, GraphNode>,
}

impl TargetGraph {
    #[inline]
    pub fn new() -> Self {
        Default::default()
    }

    /// Adds or replaces a node, returning the previous node for that label if there was one
    pub fn insert(&mut self, label: TargetLabel, node: GraphNode) -> Option<GraphNode> {
        self.nodes.insert(label, node)
    }

    #[inline]
    pub fn get(&self, label: &TargetLabel) -> Option<&GraphNode> {
        self.nodes.get(label)
    }

    #[inline]
    pub fn contains(&self, label: &TargetLabel) -> bool {
        self.nodes.contains_key(label)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn targets(&self) -> btree_map::Keys<TargetLabel, GraphNode> {
        self.nodes.keys()
    }

    #[inline]
    pub fn iter(&self) -> btree_map::Iter<TargetLabel, GraphNode> {
        self.nodes.iter()
    }
}

impl FromIterator<(TargetLabel, GraphNode)> for TargetGraph {
    fn from_iter<T: IntoIterator<Item = (TargetLabel, GraphNode)>>(iter: T) -> Self {
        TargetGraph {
            nodes: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a TargetGraph {
    type Item = (&'a TargetLabel, &'a GraphNode);
    type IntoIter = btree_map::Iter<'a, TargetLabel, GraphNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_deserialize() {
        let graph: TargetGraph = serde_json::from_str(
            r#"{
                "//app:main": { "labels": ["binary"], "deps": ["//lib:a"], "exported_deps": ["//lib:b"] },
                "//lib:a": {},
                "//lib:b": { "labels": ["generated", "library"] }
            }"#,
        )
        .unwrap();

        assert_eq!(graph.len(), 3);
        let main = graph.get(&TargetLabel::new("//app:main").unwrap()).unwrap();
        assert!(main.labels.contains("binary"));
        assert_eq!(
            main.dependencies().map(|x| x.to_string()).collect::<Vec<_>>(),
            vec!["//lib:a", "//lib:b"]
        );
        let lib_a = graph.get(&TargetLabel::new("//lib:a").unwrap()).unwrap();
        assert_eq!(lib_a, &GraphNode::default());
    }

    #[test]
    fn graph_deserialize_rejects_bad_labels() {
        let result = serde_json::from_str::<TargetGraph>(r#"{ "lib:a": {} }"#);
        assert!(result.is_err());
    }

    #[test]
    fn graph_iterates_in_label_order() {
        let graph: TargetGraph = ["//z:z", "//a:b", "//a:a"]
            .into_iter()
            .map(|x| (TargetLabel::new(x).unwrap(), GraphNode::default()))
            .collect();
        let order: Vec<String> = graph.targets().map(|x| x.to_string()).collect();
        assert_eq!(order, vec!["//a:a", "//a:b", "//z:z"]);
    }
}
