use std::collections::BTreeSet;

use linkgroup_data::{
    group::{GroupAttrs, GroupDefinitionKind, GroupSpec, Linkage, MappingSpec, Traversal},
    TargetLabel,
};
use serde::Serialize;

use crate::{filter::Filter, Error};

/// A named set of targets that will be linked together
#[derive(Clone, Debug, Serialize)]
pub struct Group {
    pub name: String,
    pub definition_type: GroupDefinitionKind,
    pub attrs: GroupAttrs,
    pub mappings: Vec<GroupMapping>,
}

/// One rule describing how to find members of a [`Group`]
#[derive(Clone, Debug, Serialize)]
pub struct GroupMapping {
    pub roots: Vec<TargetLabel>,
    pub traversal: Traversal,
    pub filters: Vec<Filter>,
    pub preferred_linkage: Option<Linkage>,
}

impl Group {
    pub fn from_spec(spec: &GroupSpec) -> Result<Group, Error> {
        let mappings = spec
            .mappings
            .iter()
            .map(GroupMapping::from_spec)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Group {
            name: spec.name.clone(),
            definition_type: GroupDefinitionKind::Explicit,
            attrs: GroupAttrs::from_map(&spec.attrs)?,
            mappings,
        })
    }

    /// A group synthesized during assignment. It inherits the attributes of the group that created it.
    pub fn implicit(name: String, attrs: GroupAttrs) -> Group {
        Group {
            name,
            definition_type: GroupDefinitionKind::Implicit,
            attrs,
            mappings: Vec::new(),
        }
    }

    #[inline]
    pub fn is_implicit(&self) -> bool {
        self.definition_type == GroupDefinitionKind::Implicit
    }
}

impl GroupMapping {
    pub fn from_spec(spec: &MappingSpec) -> Result<GroupMapping, Error> {
        Ok(GroupMapping {
            roots: spec.roots.clone(),
            traversal: spec.traversal.parse()?,
            filters: spec
                .filters
                .iter()
                .map(|x| Filter::parse(x))
                .collect::<Result<Vec<_>, _>>()?,
            preferred_linkage: spec.preferred_linkage.as_deref().map(str::parse).transpose()?,
        })
    }
}

/// Converts raw group definitions into typed groups, preserving declaration order
pub fn parse_groups(specs: &[GroupSpec]) -> Result<Vec<Group>, Error> {
    specs.iter().map(Group::from_spec).collect()
}

/// Every root referenced by any mapping of any group, deduplicated and sorted
pub fn collect_roots<'a, I>(groups: I) -> Vec<TargetLabel>
where
    I: IntoIterator<Item = &'a Group>,
{
    let roots: BTreeSet<&TargetLabel> = groups
        .into_iter()
        .flat_map(|group| group.mappings.iter())
        .flat_map(|mapping| mapping.roots.iter())
        .collect();
    roots.into_iter().cloned().collect()
}
