use std::fmt;

use linkgroup_data::{GraphNode, TargetLabel, TargetPattern};
use regex::Regex;
use serde::{ser::SerializeMap, Serialize};

use crate::Error;

const LABEL_PREFIX: &str = "label:";
const TAG_PREFIX: &str = "tag:";
const TARGET_REGEX_PREFIX: &str = "target_regex:";
const PATTERN_PREFIX: &str = "pattern:";

/// A predicate used to discover group members when a mapping is not given explicit roots
#[derive(Clone, Debug)]
pub enum Filter {
    /// Matches if any label of the node matches
    Label(AnchoredRegex),
    /// Matches against the string form of the target label
    TargetRegex(AnchoredRegex),
    Pattern(TargetPattern),
}

/// A regex that must match the entire input
#[derive(Clone)]
pub struct AnchoredRegex {
    source: String,
    regex: Regex,
}

impl Filter {
    /// Parses a prefixed filter string (`label:`, `tag:`, `target_regex:` or `pattern:`)
    pub fn parse(s: &str) -> Result<Filter, Error> {
        if let Some(regex) = s.strip_prefix(LABEL_PREFIX).or_else(|| s.strip_prefix(TAG_PREFIX)) {
            Ok(Filter::Label(AnchoredRegex::new(regex)?))
        } else if let Some(regex) = s.strip_prefix(TARGET_REGEX_PREFIX) {
            Ok(Filter::TargetRegex(AnchoredRegex::new(regex)?))
        } else if let Some(pattern) = s.strip_prefix(PATTERN_PREFIX) {
            let pattern = TargetPattern::new(pattern).map_err(|source| Error::InvalidPattern {
                pattern: pattern.to_owned(),
                source,
            })?;
            Ok(Filter::Pattern(pattern))
        } else {
            Err(Error::InvalidFilterSyntax { filter: s.to_owned() })
        }
    }
}

/// Evaluates a filter list against a single node
///
/// Filters are combined with AND, except that the first `TargetRegex` filter reached decides the result on its own:
/// any filters after it are never consulted. Filters before it are deliberately *not* bypassed: a failing filter ahead
/// of the `TargetRegex` still rejects the node, exactly as the early return always has. `[Label(A), TargetRegex(B)]`
/// therefore equals `TargetRegex(B)` only for nodes satisfying `A`. This mirrors long-standing behavior that existing
/// group definitions may depend on, but the skipping of later filters is most likely an accident of the early return
/// rather than intended semantics.
pub fn matches(filters: &[Filter], target: &TargetLabel, node: &GraphNode) -> bool {
    for filter in filters {
        match filter {
            Filter::Label(regex) => {
                if !node.labels.iter().any(|label| regex.is_match(label)) {
                    return false;
                }
            }
            Filter::TargetRegex(regex) => return regex.is_match(&target.to_string()),
            Filter::Pattern(pattern) => {
                if !pattern.matches(target) {
                    return false;
                }
            }
        }
    }
    true
}

impl AnchoredRegex {
    pub fn new(source: &str) -> Result<AnchoredRegex, Error> {
        let regex = Regex::new(&format!("^(?:{})$", source)).map_err(|source_err| Error::InvalidRegex {
            regex: source.to_owned(),
            source: source_err,
        })?;
        Ok(AnchoredRegex {
            source: source.to_owned(),
            regex,
        })
    }

    /// The regex as written, without anchors
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    #[inline]
    pub fn is_match(&self, haystack: &str) -> bool {
        self.regex.is_match(haystack)
    }
}

impl fmt::Debug for AnchoredRegex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnchoredRegex({:?})", self.source)
    }
}

/// Label filters serialize as `{"regex": ...}`, target regex filters as `{"target_regex": ...}` and pattern filters
/// as the pattern's `{cell, kind, name, path}` form.
impl Serialize for Filter {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Filter::Label(regex) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("regex", regex.as_str())?;
                map.end()
            }
            Filter::TargetRegex(regex) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("target_regex", regex.as_str())?;
                map.end()
            }
            Filter::Pattern(pattern) => pattern.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(labels: &[&str]) -> GraphNode {
        GraphNode {
            labels: labels.iter().map(|x| x.to_string()).collect(),
            ..Default::default()
        }
    }

    fn filters(specs: &[&str]) -> Vec<Filter> {
        specs.iter().map(|x| Filter::parse(x).unwrap()).collect()
    }

    fn label(s: &str) -> TargetLabel {
        TargetLabel::new(s).unwrap()
    }

    #[test]
    fn parse_prefixes() {
        assert!(matches!(Filter::parse("label:foo").unwrap(), Filter::Label(_)));
        assert!(matches!(Filter::parse("tag:foo").unwrap(), Filter::Label(_)));
        assert!(matches!(Filter::parse("target_regex:.*").unwrap(), Filter::TargetRegex(_)));
        assert!(matches!(Filter::parse("pattern://foo/...").unwrap(), Filter::Pattern(_)));
    }

    #[test]
    fn parse_rejects_unprefixed() {
        let err = Filter::parse("foo.*").unwrap_err();
        assert!(matches!(err, Error::InvalidFilterSyntax { filter } if filter == "foo.*"));

        let err = Filter::parse("labels:foo").unwrap_err();
        assert!(matches!(err, Error::InvalidFilterSyntax { .. }));
    }

    #[test]
    fn parse_rejects_bad_payloads() {
        assert!(matches!(Filter::parse("label:(").unwrap_err(), Error::InvalidRegex { .. }));
        assert!(matches!(
            Filter::parse("pattern:foo").unwrap_err(),
            Error::InvalidPattern { .. }
        ));
    }

    #[test]
    fn label_regex_is_anchored() {
        let target = label("//a:a");
        assert!(matches(&filters(&["label:lib"]), &target, &node(&["lib"])));
        assert!(!matches(&filters(&["label:lib"]), &target, &node(&["libfoo"])));
        assert!(!matches(&filters(&["label:lib"]), &target, &node(&["mylib"])));
        assert!(matches(&filters(&["label:lib.*"]), &target, &node(&["libfoo"])));
        // Alternation must not escape the anchors
        assert!(!matches(&filters(&["label:a|b"]), &target, &node(&["xa"])));
    }

    #[test]
    fn label_filters_or_across_labels_and_across_filters() {
        let target = label("//a:a");
        let node = node(&["fast", "linux"]);
        assert!(matches(&filters(&["label:linux"]), &target, &node));
        assert!(matches(&filters(&["label:fast", "tag:linux"]), &target, &node));
        assert!(!matches(&filters(&["label:fast", "label:windows"]), &target, &node));
    }

    #[test]
    fn pattern_filter() {
        let filters = filters(&["pattern://third-party/..."]);
        assert!(matches(&filters, &label("//third-party/zlib:zlib"), &node(&[])));
        assert!(!matches(&filters, &label("//app:main"), &node(&[])));
    }

    #[test]
    fn target_regex_matches_full_label_string() {
        let filters = filters(&["target_regex://foo/.*"]);
        assert!(matches(&filters, &label("//foo/bar:baz"), &node(&[])));
        assert!(!matches(&filters, &label("cell//foo/bar:baz"), &node(&[])));
    }

    #[test]
    fn empty_filter_list_matches() {
        assert!(matches(&[], &label("//a:a"), &node(&[])));
    }

    #[test]
    fn target_regex_short_circuits_later_filters() {
        let target = label("//foo:bar");
        let node = node(&["unrelated"]);

        // The label filter after the target regex is never consulted
        let regex_then_label = filters(&["target_regex://foo:.*", "label:required"]);
        assert!(matches(&regex_then_label, &target, &node));
        assert_eq!(
            matches(&regex_then_label, &target, &node),
            matches(&filters(&["target_regex://foo:.*"]), &target, &node)
        );

        let regex_then_pattern = filters(&["target_regex:.*", "pattern://elsewhere/..."]);
        assert!(matches(&regex_then_pattern, &target, &node));
    }

    #[test]
    fn target_regex_verdict_after_passing_label() {
        let target = label("//foo:bar");
        let node = node(&["required"]);

        for regex in ["target_regex://foo:.*", "target_regex://nope:.*"] {
            assert_eq!(
                matches(&filters(&["label:required", regex]), &target, &node),
                matches(&filters(&[regex]), &target, &node)
            );
        }

        // A failing filter before the target regex still rejects the node
        assert!(!matches(
            &filters(&["label:missing", "target_regex://foo:.*"]),
            &target,
            &node
        ));
    }

    #[test]
    fn filter_serialize() {
        let json = serde_json::to_string(&filters(&["label:foo.*", "target_regex://a:.*", "pattern:cell//x:"])).unwrap();
        assert_eq!(
            json,
            r#"[{"regex":"foo.*"},{"target_regex":"//a:.*"},{"cell":"cell","kind":"package","name":null,"path":"x"}]"#
        );
    }
}
