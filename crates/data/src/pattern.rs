use std::{
    fmt::{self, Display},
    str::FromStr,
};

use serde::{ser::SerializeStruct, Serialize};

use crate::target::{check_path, split_cell, ParseError, TargetLabel};

const RECURSIVE_SUFFIX: &str = "...";

/// A structural pattern over [`TargetLabel`]s
///
/// Three forms are recognized:
///
/// * `cell//path:name` matches exactly one target. `cell//path` is shorthand for `cell//path:<last segment>`.
/// * `cell//path:` matches every target declared directly in the package.
/// * `cell//path/...` (or `cell//...`) matches every target in the package or any package below it.
///
/// A pattern written without a cell matches targets in any cell.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct TargetPattern {
    cell: String,
    path: String,
    kind: PatternKind,
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum PatternKind {
    Target(String),
    Package,
    Recursive,
}

impl TargetPattern {
    pub fn new<S: AsRef<str> + ?Sized>(s: &S) -> Result<TargetPattern, ParseError> {
        let s = s.as_ref();
        if s.is_empty() {
            return Err(ParseError::Empty);
        }

        let (cell, rest) = split_cell(s)?;

        let (path, kind) = if rest == RECURSIVE_SUFFIX {
            ("", PatternKind::Recursive)
        } else if let Some(path) = rest.strip_suffix("/...") {
            (path, PatternKind::Recursive)
        } else if let Some((path, name)) = rest.split_once(':') {
            if name.is_empty() {
                (path, PatternKind::Package)
            } else {
                check_path(name)?;
                (path, PatternKind::Target(name.to_owned()))
            }
        } else {
            let name = rest.rsplit('/').next().unwrap_or_default();
            if name.is_empty() {
                return Err(ParseError::MissingName);
            }
            (rest, PatternKind::Target(name.to_owned()))
        };
        check_path(path)?;

        Ok(TargetPattern {
            cell: cell.to_owned(),
            path: path.to_owned(),
            kind,
        })
    }

    #[inline]
    pub fn cell(&self) -> &str {
        &self.cell
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[inline]
    pub fn kind(&self) -> &PatternKind {
        &self.kind
    }

    pub fn matches(&self, target: &TargetLabel) -> bool {
        if !self.cell.is_empty() && self.cell != target.cell() {
            return false;
        }
        match &self.kind {
            PatternKind::Target(name) => target.package() == self.path && target.name() == name,
            PatternKind::Package => target.package() == self.path,
            PatternKind::Recursive => {
                if self.path.is_empty() {
                    return true;
                }
                match target.package().strip_prefix(self.path.as_str()) {
                    Some(rest) => rest.is_empty() || rest.starts_with('/'),
                    None => false,
                }
            }
        }
    }
}

impl PatternKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::Target(_) => "target",
            PatternKind::Package => "package",
            PatternKind::Recursive => "recursive",
        }
    }
}

impl FromStr for TargetPattern {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetPattern::new(s)
    }
}

impl Display for TargetPattern {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            PatternKind::Target(name) => write!(f, "{}//{}:{}", self.cell, self.path, name),
            PatternKind::Package => write!(f, "{}//{}:", self.cell, self.path),
            PatternKind::Recursive if self.path.is_empty() => write!(f, "{}//...", self.cell),
            PatternKind::Recursive => write!(f, "{}//{}/...", self.cell, self.path),
        }
    }
}

/// Serialized as `{cell, kind, name, path}` for diagnostic output
impl Serialize for TargetPattern {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let name = match &self.kind {
            PatternKind::Target(name) => Some(name.as_str()),
            _ => None,
        };
        let mut state = serializer.serialize_struct("TargetPattern", 4)?;
        state.serialize_field("cell", &self.cell)?;
        state.serialize_field("kind", self.kind.as_str())?;
        state.serialize_field("name", &name)?;
        state.serialize_field("path", &self.path)?;
        state.end()
    }
}
