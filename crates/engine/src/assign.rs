use std::collections::{btree_map, BTreeMap, VecDeque};

use fxhash::FxHashSet;
use indexmap::IndexMap;
use linkgroup_data::{group::Traversal, TargetGraph, TargetLabel};
use serde::Serialize;
use tracing::{debug, error, trace};

use crate::{
    group::{Group, GroupMapping},
    naming::{hash_name, subfolder_name},
    resolve::resolve,
    Error,
};

/// All groups known to a run, keyed by name
///
/// Iteration follows insertion order: explicit groups in declaration order, then implicit groups in the order
/// assignment created them.
#[derive(Clone, Default, Debug)]
pub struct GroupRegistry {
    groups: IndexMap<String, Group>,
}

/// Which group each target belongs to
///
/// Entries are only ever added. Iteration is in target order.
#[derive(Clone, PartialEq, Eq, Default, Debug, Serialize)]
#[serde(transparent)]
pub struct AssignmentMap {
    assignments: BTreeMap<TargetLabel, String>,
}

/// Result of [`assign`]
#[derive(Clone, Debug)]
pub struct Resolution {
    pub groups: GroupRegistry,
    pub assignments: AssignmentMap,
}

/// Assigns targets of `graph` to `groups`
///
/// Groups are processed in order, and mappings within a group in order. The first group (and within it, the first
/// mapping) to reach a target claims it, and it is never reassigned.
#[tracing::instrument(level = "debug", skip_all, fields(groups = groups.len(), nodes = graph.len()))]
pub fn assign(groups: &[Group], graph: &TargetGraph) -> Result<Resolution, Error> {
    let registry = GroupRegistry::from_groups(groups.iter().cloned());
    let declared: Vec<Group> = registry.iter().cloned().collect();

    let mut assigner = Assigner {
        graph,
        registry,
        assignments: AssignmentMap::default(),
        node_traversed: Default::default(),
    };

    for group in &declared {
        debug!(group = %group.name, mappings = group.mappings.len(), "assigning group");
        for (index, mapping) in group.mappings.iter().enumerate() {
            let selected = match resolve(mapping, graph) {
                Ok(selected) => selected,
                Err(err) => {
                    error!(group = %group.name, mapping = index, "failed to resolve group mapping: {}", err);
                    return Err(err);
                }
            };
            for target in &selected {
                if !graph.contains(target) {
                    trace!(%target, "skipping target missing from graph");
                    continue;
                }
                assigner.apply(group, mapping, target);
            }
        }
    }

    debug!(
        assigned = assigner.assignments.len(),
        groups = assigner.registry.len(),
        "finished assignment"
    );
    Ok(Resolution {
        groups: assigner.registry,
        assignments: assigner.assignments,
    })
}

struct Assigner<'g> {
    graph: &'g TargetGraph,
    registry: GroupRegistry,
    assignments: AssignmentMap,
    /// Targets claimed by a `node` or `subfolders` match. A tree walk reaching one of these must keep descending,
    /// since nothing below it has been claimed on its behalf.
    node_traversed: FxHashSet<TargetLabel>,
}

impl<'g> Assigner<'g> {
    fn apply(&mut self, group: &Group, mapping: &GroupMapping, target: &TargetLabel) {
        match mapping.traversal {
            Traversal::Node | Traversal::Subfolders => {
                self.assign_target(group, mapping.traversal, target);
            }
            Traversal::Tree => self.assign_tree(group, target),
        }
    }

    fn assign_tree(&mut self, group: &Group, root: &TargetLabel) {
        let graph = self.graph;
        let mut visited: FxHashSet<&TargetLabel> = Default::default();
        let mut queue: VecDeque<&TargetLabel> = VecDeque::new();
        queue.push_back(root);

        while let Some(target) = queue.pop_front() {
            if !visited.insert(target) {
                continue;
            }
            let Some(node) = graph.get(target) else {
                continue;
            };
            let newly_assigned = self.assign_target(group, Traversal::Tree, target);
            if !newly_assigned && !self.node_traversed.contains(target) {
                // Claimed by an earlier tree walk, which already covered everything below it
                continue;
            }
            queue.extend(node.dependencies());
        }
    }

    /// Returns `false` if the target already belonged to a group
    fn assign_target(&mut self, group: &Group, traversal: Traversal, target: &TargetLabel) -> bool {
        if self.assignments.contains(target) {
            return false;
        }

        let group_name = match traversal {
            Traversal::Subfolders => self.implicit_group_for(group, target.package()),
            Traversal::Tree | Traversal::Node => group.name.clone(),
        };
        trace!(%target, group = %group_name, %traversal, "assigned target");
        self.assignments.assignments.insert(target.clone(), group_name);
        if traversal.is_node_only() {
            self.node_traversed.insert(target.clone());
        }
        true
    }

    /// Finds or creates the implicit group holding `package` for a `subfolders` mapping of `group`
    fn implicit_group_for(&mut self, group: &Group, package: &str) -> String {
        let mut candidate = subfolder_name(&group.name, package);
        loop {
            match self.registry.get(&candidate) {
                None => {
                    debug!(group = %group.name, implicit_group = %candidate, "creating implicit group");
                    self.registry
                        .insert(Group::implicit(candidate.clone(), group.attrs.clone()));
                    return candidate;
                }
                Some(existing) if existing.is_implicit() => return candidate,
                Some(_) => {
                    let rehashed = hash_name(&group.name, &candidate);
                    debug!(
                        group = %group.name,
                        collides_with = %candidate,
                        rehashed = %rehashed,
                        "generated group name collides with an explicit group"
                    );
                    candidate = rehashed;
                }
            }
        }
    }
}

impl GroupRegistry {
    #[inline]
    pub fn new() -> Self {
        Default::default()
    }

    /// Registers groups in order. A later group with an already registered name replaces the earlier definition but
    /// keeps its position.
    pub fn from_groups<I: IntoIterator<Item = Group>>(groups: I) -> Self {
        let mut registry = GroupRegistry::new();
        for group in groups {
            registry.insert(group);
        }
        registry
    }

    pub fn insert(&mut self, group: Group) -> Option<Group> {
        self.groups.insert(group.name.clone(), group)
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&Group> {
        self.groups.get(name)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> indexmap::map::Values<String, Group> {
        self.groups.values()
    }
}

impl AssignmentMap {
    #[inline]
    pub fn get(&self, target: &TargetLabel) -> Option<&str> {
        self.assignments.get(target).map(|x| x.as_str())
    }

    #[inline]
    pub fn contains(&self, target: &TargetLabel) -> bool {
        self.assignments.contains_key(target)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> btree_map::Iter<TargetLabel, String> {
        self.assignments.iter()
    }

    /// Members of one group, in target order
    pub fn members(&self, group: &str) -> Vec<&TargetLabel> {
        self.assignments
            .iter()
            .filter(|(_, assigned)| assigned.as_str() == group)
            .map(|(target, _)| target)
            .collect()
    }

    /// Members of every group that has at least one member
    pub fn by_group(&self) -> BTreeMap<&str, Vec<&TargetLabel>> {
        let mut groups: BTreeMap<&str, Vec<&TargetLabel>> = BTreeMap::new();
        for (target, group) in &self.assignments {
            groups.entry(group.as_str()).or_default().push(target);
        }
        groups
    }
}

impl<'a> IntoIterator for &'a AssignmentMap {
    type Item = (&'a TargetLabel, &'a String);
    type IntoIter = btree_map::Iter<'a, TargetLabel, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.assignments.iter()
    }
}
