pub mod graph;
pub mod group;
pub mod pattern;
pub mod target;

pub use crate::{
    graph::{GraphNode, TargetGraph},
    pattern::TargetPattern,
    target::TargetLabel,
};
