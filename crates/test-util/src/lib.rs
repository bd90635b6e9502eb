use std::{env, sync::Once};

use linkgroup_data::{GraphNode, TargetGraph, TargetLabel};
use tracing_subscriber::fmt::format::FmtSpan;

static INIT: Once = Once::new();

pub fn prep() {
    INIT.call_once(|| {
        let filter = env::var("LINKGROUP_LOG").unwrap_or_else(|_| "debug".to_owned());

        let filter = tracing_subscriber::EnvFilter::try_new(filter)
            // Error out on invalid LINKGROUP_LOG value instead of ignoring to make it easier to diagnose logging
            // mistakes (they're just tests so suicide is an option)
            .unwrap();

        tracing_subscriber::fmt::fmt()
            .with_span_events(FmtSpan::FULL)
            .with_file(true)
            .with_line_number(true)
            .with_target(false)
            .with_env_filter(filter)
            .with_test_writer()
            .init();
    });
}

/// Builds a [`TargetGraph`] from string labels
///
/// Panics on malformed labels.
#[derive(Default)]
pub struct GraphBuilder {
    graph: TargetGraph,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn node(mut self, label: &str, labels: &[&str], deps: &[&str], exported_deps: &[&str]) -> Self {
        let node = GraphNode {
            labels: labels.iter().map(|x| x.to_string()).collect(),
            deps: deps.iter().map(|x| parse(x)).collect(),
            exported_deps: exported_deps.iter().map(|x| parse(x)).collect(),
        };
        self.graph.insert(parse(label), node);
        self
    }

    /// A node with no labels and no dependencies
    pub fn leaf(self, label: &str) -> Self {
        self.node(label, &[], &[], &[])
    }

    pub fn build(self) -> TargetGraph {
        self.graph
    }
}

fn parse(label: &str) -> TargetLabel {
    match TargetLabel::new(label) {
        Ok(label) => label,
        Err(err) => panic!("invalid target label {:?} in test graph: {}", label, err),
    }
}
