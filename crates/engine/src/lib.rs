//! Assignment of build graph targets to link groups
//!
//! Groups are declared as an ordered list of mappings. Each mapping selects targets (from explicit roots, filters, or
//! both) and a traversal kind decides how far the selection propagates. [`assign`] walks the groups in declaration
//! order and hands every target to the first group that reaches it.

mod assign;
mod diagnostics;
mod error;
pub mod filter;
mod group;
pub mod naming;
mod resolve;

pub use crate::{
    assign::{assign, AssignmentMap, GroupRegistry, Resolution},
    diagnostics::Report,
    error::Error,
    filter::Filter,
    group::{collect_roots, parse_groups, Group, GroupMapping},
    naming::{hash_name, subfolder_name, MAX_GROUP_NAME_LEN},
    resolve::resolve,
};
