pub mod logging;

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use linkgroup_data::{group::GroupSpec, TargetGraph};
use linkgroup_engine::{parse_groups, Group};

#[derive(Parser, Debug)]
pub struct GroupsOpts {
    /// JSON file holding the ordered list of group definitions
    #[clap(long)]
    pub groups: PathBuf,
}

#[derive(Parser, Debug)]
pub struct InputOpts {
    /// JSON file holding the target graph, as an object from target label to node
    #[clap(long)]
    pub graph: PathBuf,

    #[clap(flatten)]
    pub groups: GroupsOpts,
}

impl GroupsOpts {
    #[tracing::instrument(level = "debug", err, skip(self), fields(path = %self.groups.display()))]
    pub fn load_groups(&self) -> Result<Vec<Group>> {
        let data = fs::read(&self.groups)
            .with_context(|| format!("failed to read groups file {:?}", self.groups))?;
        let specs: Vec<GroupSpec> = serde_json::from_slice(&data)
            .with_context(|| format!("failed to parse groups file {:?}", self.groups))?;
        let groups = parse_groups(&specs).with_context(|| format!("invalid group definition in {:?}", self.groups))?;
        Ok(groups)
    }
}

impl InputOpts {
    #[tracing::instrument(level = "debug", err, skip(self), fields(path = %self.graph.display()))]
    pub fn load_graph(&self) -> Result<TargetGraph> {
        let data = fs::read(&self.graph).with_context(|| format!("failed to read graph file {:?}", self.graph))?;
        let graph: TargetGraph = serde_json::from_slice(&data)
            .with_context(|| format!("failed to parse graph file {:?}", self.graph))?;
        tracing::debug!(nodes = graph.len(), "loaded target graph");
        Ok(graph)
    }

    #[inline]
    pub fn load_groups(&self) -> Result<Vec<Group>> {
        self.groups.load_groups()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use linkgroup_data::TargetLabel;
    use tempfile::NamedTempFile;

    use super::*;

    fn file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn load_inputs() {
        let graph = file(r#"{ "//a:a": { "deps": ["//b:b"], "labels": ["x"] }, "//b:b": {} }"#);
        let groups = file(r#"[{ "name": "g", "mappings": [{ "roots": ["//a:a"] }] }]"#);
        let opts = InputOpts {
            graph: graph.path().to_owned(),
            groups: GroupsOpts {
                groups: groups.path().to_owned(),
            },
        };

        let graph = opts.load_graph().unwrap();
        assert_eq!(graph.len(), 2);
        let a = graph.get(&TargetLabel::new("//a:a").unwrap()).unwrap();
        assert_eq!(a.deps, vec![TargetLabel::new("//b:b").unwrap()]);

        let groups = opts.load_groups().unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "g");
    }

    #[test]
    fn load_errors_name_the_file() {
        let groups = file(r#"[{ "name": "g", "mappings": [{ "traversal": "sideways", "roots": ["//a:a"] }] }]"#);
        let opts = GroupsOpts {
            groups: groups.path().to_owned(),
        };
        let err = opts.load_groups().unwrap_err();
        assert!(format!("{}", err).contains("invalid group definition"));
        assert!(format!("{:#}", err).contains("sideways"));

        let graph = file(r#"{ "not a label": {} }"#);
        let opts = InputOpts {
            graph: graph.path().to_owned(),
            groups: GroupsOpts {
                groups: groups.path().to_owned(),
            },
        };
        assert!(opts.load_graph().is_err());
    }
}
