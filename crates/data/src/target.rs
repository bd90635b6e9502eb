use std::{
    fmt::{self, Debug, Display},
    str::FromStr,
};

use serde::{de::Error as DeError, Deserialize, Serialize};
use thiserror::Error;

/// The label of a single node in the target graph
///
/// Labels take the form `cell//package/path:name`. The cell may be omitted (`//package/path:name`), in which case the
/// label belongs to the root cell. The package path may be empty (`cell//:name`).
///
/// Path segments and names consist of a sequence of Unicode characters, except the following:
///     * Segments that consist of entirely dots (`.`, `..`, `...`, etc.)
///     * Any segment containing:
///         - `:`, `/`, `\`
///         - Unprintable ASCII characters
///
/// Labels are ordered by cell, then package, then name.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetLabel {
    cell: String,
    package: String,
    name: String,
}

impl TargetLabel {
    pub fn new<S: AsRef<str> + ?Sized>(s: &S) -> Result<TargetLabel, ParseError> {
        let s = s.as_ref();
        if s.is_empty() {
            return Err(ParseError::Empty);
        }

        let (cell, rest) = split_cell(s)?;
        let (package, name) = rest.split_once(':').ok_or(ParseError::MissingName)?;
        check_path(package)?;
        if name.is_empty() {
            return Err(ParseError::MissingName);
        }
        check_path(name)?;

        Ok(TargetLabel {
            cell: cell.to_owned(),
            package: package.to_owned(),
            name: name.to_owned(),
        })
    }

    #[inline]
    pub fn cell(&self) -> &str {
        &self.cell
    }

    /// The path of the package containing this target, relative to the cell root
    #[inline]
    pub fn package(&self) -> &str {
        &self.package
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Splits `cell//rest` into the cell name and everything after the double slash
pub(crate) fn split_cell(s: &str) -> Result<(&str, &str), ParseError> {
    let (cell, rest) = s.split_once("//").ok_or(ParseError::MissingRoot)?;
    for c in cell.chars() {
        match c {
            '/' => return Err(ParseError::InvalidSlashStart),
            ':' => return Err(ParseError::UnexpectedColon),
            c if valid_filename_char(c) => {}
            c => return Err(ParseError::InvalidCharacter(c)),
        }
    }
    if rest.starts_with('/') {
        return Err(ParseError::InvalidSlashStart);
    }
    Ok((cell, rest))
}

/// Validates a slash separated relative path. The empty path is allowed.
pub(crate) fn check_path(path: &str) -> Result<(), ParseError> {
    if path.is_empty() {
        return Ok(());
    }
    for segment in path.split('/') {
        if segment.is_empty() {
            return Err(ParseError::EmptySegment);
        }
        if segment.chars().all(|c| c == '.') {
            return Err(ParseError::SegmentAllPeriods);
        }
        for c in segment.chars() {
            match c {
                ':' => return Err(ParseError::UnexpectedColon),
                c if valid_filename_char(c) => {}
                c => return Err(ParseError::InvalidCharacter(c)),
            }
        }
    }
    Ok(())
}

#[inline]
pub(crate) fn valid_filename_char(c: char) -> bool {
    match c {
        'A'..='Z' => true,
        'a'..='z' => true,
        '0'..='9' => true,
        '!' | '#'..='.' => true,
        ';' | '=' | '?' | '@' => true,
        '[' | ']' | '^' | '_' => true,
        '{' | '}' | '~' => true,
        c if c as u32 >= 128 => true,
        _ => false,
    }
}

impl FromStr for TargetLabel {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetLabel::new(s)
    }
}

impl Display for TargetLabel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}//{}:{}", self.cell, self.package, self.name)
    }
}

impl Debug for TargetLabel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "TargetLabel({:?})", self.to_string())
    }
}

impl Serialize for TargetLabel {
    #[inline]
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TargetLabel {
    #[inline]
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_str(TargetLabelDeVisitor)
    }
}

struct TargetLabelDeVisitor;

impl<'de> serde::de::Visitor<'de> for TargetLabelDeVisitor {
    type Value = TargetLabel;

    #[inline]
    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "a target label of the form `cell//package:name`")
    }

    #[inline]
    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: DeError,
    {
        TargetLabel::new(v).map_err(|err| E::custom(format!("invalid target label {:?}: {}", v, err)))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("target labels may not be empty")]
    Empty,
    #[error("target labels must contain '//' separating the cell from the package path")]
    MissingRoot,
    #[error("target labels must end with ':' followed by a target name")]
    MissingName,
    #[error("the character {0:?} is not allowed in target labels")]
    InvalidCharacter(char),
    #[error("a colon is not valid in this part of a target label")]
    UnexpectedColon,
    #[error("only the '//' separating the cell from the package path may start with a slash")]
    InvalidSlashStart,
    #[error("target label paths may not contain empty segments")]
    EmptySegment,
    #[error("path segments with all periods are not allowed")]
    SegmentAllPeriods,
}
