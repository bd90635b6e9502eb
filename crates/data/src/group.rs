//! Values that make up a link group definition, and the raw form in which definitions are handed to us

use std::{fmt, str::FromStr};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::TargetLabel;

/// How far a match propagates through the dependencies of the matched target
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Traversal {
    /// The matched target and everything it (transitively) depends on
    Tree,
    /// Only the matched target
    Node,
    /// Only the matched target, placed in a group derived from its package
    Subfolders,
}

impl Traversal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Traversal::Tree => "tree",
            Traversal::Node => "node",
            Traversal::Subfolders => "subfolders",
        }
    }

    /// Whether a match assigns only the matched node (as opposed to its whole subtree)
    #[inline]
    pub fn is_node_only(&self) -> bool {
        !matches!(self, Traversal::Tree)
    }
}

impl FromStr for Traversal {
    type Err = UnrecognizedTraversalKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tree" => Ok(Traversal::Tree),
            "node" => Ok(Traversal::Node),
            "subfolders" => Ok(Traversal::Subfolders),
            other => Err(UnrecognizedTraversalKind(other.to_owned())),
        }
    }
}

impl fmt::Display for Traversal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Preferred linkage hint carried by a mapping. Never interpreted here.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Linkage {
    Any,
    Static,
    Shared,
}

impl FromStr for Linkage {
    type Err = UnknownLinkage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "any" => Ok(Linkage::Any),
            "static" => Ok(Linkage::Static),
            "shared" => Ok(Linkage::Shared),
            other => Err(UnknownLinkage(other.to_owned())),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupDefinitionKind {
    /// Declared by the user
    Explicit,
    /// Created during assignment by a `subfolders` mapping
    Implicit,
}

/// Flags that only matter to whoever links the group
#[derive(Clone, PartialEq, Eq, Default, Debug, Serialize)]
pub struct GroupAttrs {
    pub enable_distributed_thinlto: bool,
    pub enable_if_node_count_exceeds: Option<u64>,
    pub exported_linker_flags: Vec<String>,
    pub discard_group: bool,
    pub linker_flags: Vec<String>,
    pub requires_root_node_exists: bool,
}

impl GroupAttrs {
    /// Builds attributes from their raw key/value form, rejecting unknown keys and mistyped values
    pub fn from_map(map: &IndexMap<String, serde_json::Value>) -> Result<GroupAttrs, AttrError> {
        let mut attrs = GroupAttrs::default();
        for (key, value) in map {
            match key.as_str() {
                "enable_distributed_thinlto" => attrs.enable_distributed_thinlto = expect_bool(key, value)?,
                "enable_if_node_count_exceeds" => {
                    attrs.enable_if_node_count_exceeds = match value {
                        serde_json::Value::Null => None,
                        value => Some(value.as_u64().ok_or_else(|| AttrError::InvalidAttributeValue {
                            key: key.clone(),
                            expected: "a non-negative integer or null",
                        })?),
                    }
                }
                "exported_linker_flags" => attrs.exported_linker_flags = expect_strings(key, value)?,
                "discard_group" => attrs.discard_group = expect_bool(key, value)?,
                "linker_flags" => attrs.linker_flags = expect_strings(key, value)?,
                "requires_root_node_exists" => attrs.requires_root_node_exists = expect_bool(key, value)?,
                _ => return Err(AttrError::UnknownAttribute { key: key.clone() }),
            }
        }
        Ok(attrs)
    }
}

fn expect_bool(key: &str, value: &serde_json::Value) -> Result<bool, AttrError> {
    value.as_bool().ok_or_else(|| AttrError::InvalidAttributeValue {
        key: key.to_owned(),
        expected: "a boolean",
    })
}

fn expect_strings(key: &str, value: &serde_json::Value) -> Result<Vec<String>, AttrError> {
    let invalid = || AttrError::InvalidAttributeValue {
        key: key.to_owned(),
        expected: "a list of strings",
    };
    value
        .as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|x| x.as_str().map(ToOwned::to_owned).ok_or_else(invalid))
        .collect()
}

/// A group definition as handed over by the component that parses user-facing group syntax
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct GroupSpec {
    pub name: String,
    #[serde(default)]
    pub mappings: Vec<MappingSpec>,
    #[serde(default)]
    pub attrs: IndexMap<String, serde_json::Value>,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct MappingSpec {
    #[serde(default)]
    pub roots: Vec<TargetLabel>,
    #[serde(default = "default_traversal")]
    pub traversal: String,
    /// Prefixed filter strings, e.g. `label:foo.*` or `pattern://foo/...`
    #[serde(default)]
    pub filters: Vec<String>,
    #[serde(default)]
    pub preferred_linkage: Option<String>,
}

fn default_traversal() -> String {
    Traversal::Tree.as_str().to_owned()
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognized traversal kind {0:?}, expected one of \"tree\", \"node\" or \"subfolders\"")]
pub struct UnrecognizedTraversalKind(pub String);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown linkage {0:?}, expected one of \"any\", \"static\" or \"shared\"")]
pub struct UnknownLinkage(pub String);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttrError {
    #[error("unknown group attribute {key:?}")]
    UnknownAttribute { key: String },
    #[error("group attribute {key:?} must be {expected}")]
    InvalidAttributeValue { key: String, expected: &'static str },
}
