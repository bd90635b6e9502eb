use linkgroup_data::{
    group::{AttrError, UnknownLinkage, UnrecognizedTraversalKind},
    target::ParseError,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Attribute(#[from] AttrError),
    #[error(transparent)]
    UnrecognizedTraversalKind(#[from] UnrecognizedTraversalKind),
    #[error(transparent)]
    UnknownLinkage(#[from] UnknownLinkage),
    #[error("invalid filter {filter:?}: filters must start with one of \"label:\", \"tag:\", \"target_regex:\" or \"pattern:\"")]
    InvalidFilterSyntax { filter: String },
    #[error("invalid regex {regex:?} in filter")]
    InvalidRegex {
        regex: String,
        #[source]
        source: regex::Error,
    },
    #[error("invalid target pattern {pattern:?} in filter")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: ParseError,
    },
    #[error("group mapping must specify at least one root or filter")]
    MissingRootOrFilter,
}
