use std::io;

use serde::{Serialize, Serializer};

use crate::assign::{AssignmentMap, GroupRegistry, Resolution};

/// A serializable record of everything a run decided
///
/// Groups are listed in registry order and assignments in target order, so identical inputs always render identical
/// bytes.
#[derive(Serialize, Debug)]
pub struct Report<'a> {
    #[serde(serialize_with = "serialize_groups")]
    pub groups: &'a GroupRegistry,
    pub assignments: &'a AssignmentMap,
}

impl Resolution {
    pub fn report(&self) -> Report {
        Report {
            groups: &self.groups,
            assignments: &self.assignments,
        }
    }
}

impl<'a> Report<'a> {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn write_json<W: io::Write>(&self, writer: W) -> serde_json::Result<()> {
        serde_json::to_writer_pretty(writer, self)
    }
}

fn serialize_groups<S>(groups: &&GroupRegistry, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_seq(groups.iter())
}

#[cfg(test)]
mod tests {
    use linkgroup_data::group::GroupSpec;
    use linkgroup_test_util::GraphBuilder;
    use serde_json::json;

    use crate::{assign, parse_groups};

    fn run() -> String {
        let graph = GraphBuilder::new()
            .node("//app:main", &[], &["//lib/a:a", "//lib/b:b"], &[])
            .node("//lib/a:a", &["lib"], &[], &[])
            .node("//lib/b:b", &["lib"], &[], &[])
            .build();
        let specs: Vec<GroupSpec> = serde_json::from_value(json!([
            {
                "name": "libs",
                "mappings": [{ "traversal": "subfolders", "filters": ["label:lib", "pattern://lib/..."], "preferred_linkage": "shared" }],
            },
            { "name": "app", "mappings": [{ "roots": ["//app:main"] }], "attrs": { "discard_group": true } },
        ]))
        .unwrap();
        let resolution = assign(&parse_groups(&specs).unwrap(), &graph).unwrap();
        resolution.report().to_json().unwrap()
    }

    #[test]
    fn report_is_byte_identical_across_runs() {
        assert_eq!(run(), run());
    }

    #[test]
    fn report_shape() {
        let report: serde_json::Value = serde_json::from_str(&run()).unwrap();

        let names: Vec<&str> = report["groups"]
            .as_array()
            .unwrap()
            .iter()
            .map(|x| x["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["libs", "app", "libs_lib_a", "libs_lib_b"]);

        let libs = &report["groups"][0];
        assert_eq!(libs["definition_type"], "explicit");
        assert_eq!(libs["mappings"][0]["traversal"], "subfolders");
        assert_eq!(libs["mappings"][0]["preferred_linkage"], "shared");
        assert_eq!(libs["mappings"][0]["roots"], json!([]));
        assert_eq!(
            libs["mappings"][0]["filters"],
            json!([
                { "regex": "lib" },
                { "cell": "", "kind": "recursive", "name": null, "path": "lib" },
            ])
        );

        let implicit = &report["groups"][2];
        assert_eq!(implicit["definition_type"], "implicit");
        assert_eq!(implicit["mappings"], json!([]));
        assert_eq!(report["groups"][1]["attrs"]["discard_group"], true);

        assert_eq!(
            report["assignments"],
            json!({
                "//app:main": "app",
                "//lib/a:a": "libs_lib_a",
                "//lib/b:b": "libs_lib_b",
            })
        );
    }
}
