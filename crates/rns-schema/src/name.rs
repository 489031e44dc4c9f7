//! Domain name grammar.
//!
//! A root domain is `label.xrd`; a subdomain is `label.root.xrd`. Names are
//! lowercased and trimmed before validation (see [`normalize_name`]).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

/// The only extension the registry accepts.
pub const EXTENSION: &str = "xrd";

/// Upper bound on the complete root name, extension included.
pub const MAX_ROOT_NAME_LEN: usize = 65;

pub const MIN_ROOT_LABEL_LEN: usize = 2;

static LABEL_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^[a-z0-9](?:[a-z0-9-]*[a-z0-9])?$").expect("valid label regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("domain name must not be empty")]
    Empty,
    #[error("'{0}' must end with the .xrd extension")]
    MissingExtension(String),
    #[error("'{0}' must not contain underscores")]
    ContainsUnderscore(String),
    #[error("'{name}' is too long: at most {max} characters including the extension")]
    TooLong { name: String, max: usize },
    #[error("'{name}' is too short: the label needs at least {min} characters")]
    LabelTooShort { name: String, min: usize },
    #[error("'{name}' has an empty label")]
    EmptyLabel { name: String },
    #[error("label '{label}' in '{name}' may only contain a-z, 0-9 and inner hyphens")]
    InvalidCharacters { name: String, label: String },
    #[error("'{name}' has {segments} segments, expected {expected}")]
    WrongSegmentCount {
        name: String,
        segments: usize,
        expected: &'static str,
    },
}

/// Whether a name addresses a root domain or a subdomain of one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameKind {
    Root,
    Sub,
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameKind::Root => f.write_str("root"),
            NameKind::Sub => f.write_str("sub"),
        }
    }
}

/// A normalized, grammar-checked domain name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DomainName {
    name: String,
    kind: NameKind,
}

impl DomainName {
    /// Parse a root domain or a single-level subdomain.
    pub fn parse(input: &str) -> Result<Self, NameError> {
        let name = normalize_name(input);
        let kind = validate_entity_name(&name)?;
        Ok(Self { name, kind })
    }

    /// Parse a name that must be a root domain.
    pub fn parse_root(input: &str) -> Result<Self, NameError> {
        let name = normalize_name(input);
        validate_root_name(&name)?;
        Ok(Self {
            name,
            kind: NameKind::Root,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> NameKind {
        self.kind
    }

    pub fn is_root(&self) -> bool {
        self.kind == NameKind::Root
    }

    /// The root domain this name belongs to (itself for a root).
    pub fn root_name(&self) -> &str {
        root_of(&self.name)
    }

    /// The leftmost label: the subdomain label for a sub, the root label for a root.
    pub fn leaf_label(&self) -> &str {
        self.name.split('.').next().unwrap_or(&self.name)
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Trim surrounding whitespace and lowercase.
pub fn normalize_name(input: &str) -> String {
    input.trim().to_lowercase()
}

pub fn segment_count(name: &str) -> usize {
    name.split('.').count()
}

/// Drop a trailing `.xrd`, if present.
pub fn strip_extension(name: &str) -> &str {
    name.strip_suffix(EXTENSION)
        .and_then(|rest| rest.strip_suffix('.'))
        .unwrap_or(name)
}

/// Last two segments of a name (`label.xrd`).
pub fn root_of(name: &str) -> &str {
    match name.rmatch_indices('.').nth(1) {
        Some((idx, _)) => &name[idx + 1..],
        None => name,
    }
}

pub fn validate_root_name(name: &str) -> Result<(), NameError> {
    check_common(name)?;
    let segments: Vec<&str> = name.split('.').collect();
    if segments.len() != 2 {
        return Err(NameError::WrongSegmentCount {
            name: name.to_owned(),
            segments: segments.len(),
            expected: "2",
        });
    }
    if name.len() > MAX_ROOT_NAME_LEN {
        return Err(NameError::TooLong {
            name: name.to_owned(),
            max: MAX_ROOT_NAME_LEN,
        });
    }
    let label = segments[0];
    if label.len() < MIN_ROOT_LABEL_LEN {
        return Err(NameError::LabelTooShort {
            name: name.to_owned(),
            min: MIN_ROOT_LABEL_LEN,
        });
    }
    check_label(name, label)
}

pub fn validate_subdomain_name(name: &str) -> Result<(), NameError> {
    check_common(name)?;
    let segments: Vec<&str> = name.split('.').collect();
    if segments.len() < 3 {
        return Err(NameError::WrongSegmentCount {
            name: name.to_owned(),
            segments: segments.len(),
            expected: "at least 3",
        });
    }
    for label in &segments[..segments.len() - 1] {
        check_label(name, label)?;
    }
    Ok(())
}

/// Classify by segment count, then apply the matching grammar.
pub fn validate_entity_name(name: &str) -> Result<NameKind, NameError> {
    match segment_count(name) {
        2 => validate_root_name(name).map(|()| NameKind::Root),
        3 => validate_subdomain_name(name).map(|()| NameKind::Sub),
        n => Err(NameError::WrongSegmentCount {
            name: name.to_owned(),
            segments: n,
            expected: "2 or 3",
        }),
    }
}

fn check_common(name: &str) -> Result<(), NameError> {
    if name.is_empty() {
        return Err(NameError::Empty);
    }
    if name.contains('_') {
        return Err(NameError::ContainsUnderscore(name.to_owned()));
    }
    if name.rsplit('.').next() != Some(EXTENSION) || !name.contains('.') {
        return Err(NameError::MissingExtension(name.to_owned()));
    }
    Ok(())
}

fn check_label(name: &str, label: &str) -> Result<(), NameError> {
    if label.is_empty() {
        return Err(NameError::EmptyLabel {
            name: name.to_owned(),
        });
    }
    if !LABEL_RE.is_match(label) {
        return Err(NameError::InvalidCharacters {
            name: name.to_owned(),
            label: label.to_owned(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_two_letter_root() {
        assert!(validate_root_name("ab.xrd").is_ok());
        let parsed = DomainName::parse("ab.xrd").unwrap();
        assert!(parsed.is_root());
        assert_eq!(parsed.root_name(), "ab.xrd");
    }

    #[test]
    fn rejects_underscore() {
        assert_eq!(
            validate_root_name("a_b.xrd"),
            Err(NameError::ContainsUnderscore("a_b.xrd".to_owned()))
        );
    }

    #[test]
    fn accepts_subdomain_of_short_root() {
        assert!(validate_subdomain_name("x.y.xrd").is_ok());
        let parsed = DomainName::parse("x.y.xrd").unwrap();
        assert_eq!(parsed.kind(), NameKind::Sub);
        assert_eq!(parsed.root_name(), "y.xrd");
        assert_eq!(parsed.leaf_label(), "x");
    }

    #[test]
    fn rejects_overlong_root() {
        let name = "toolongtoolongtoolongtoolongtoolongtoolongtoolongtoolongtoolong1.xrd";
        assert!(matches!(
            validate_root_name(name),
            Err(NameError::TooLong { .. })
        ));
    }

    #[test]
    fn boundary_lengths() {
        let max_label = "a".repeat(MAX_ROOT_NAME_LEN - EXTENSION.len() - 1);
        assert!(validate_root_name(&format!("{max_label}.xrd")).is_ok());
        let over = "a".repeat(MAX_ROOT_NAME_LEN - EXTENSION.len());
        assert!(validate_root_name(&format!("{over}.xrd")).is_err());
        assert!(matches!(
            validate_root_name("a.xrd"),
            Err(NameError::LabelTooShort { .. })
        ));
    }

    #[test]
    fn rejects_wrong_extension_and_shapes() {
        assert!(matches!(
            validate_root_name("ab.com"),
            Err(NameError::MissingExtension(_))
        ));
        assert!(matches!(
            validate_root_name("xrd"),
            Err(NameError::MissingExtension(_))
        ));
        assert!(matches!(
            validate_root_name("a.b.xrd"),
            Err(NameError::WrongSegmentCount { .. })
        ));
        assert!(matches!(
            validate_subdomain_name(".y.xrd"),
            Err(NameError::EmptyLabel { .. })
        ));
        assert!(matches!(
            validate_root_name("-ab.xrd"),
            Err(NameError::InvalidCharacters { .. })
        ));
    }

    #[test]
    fn entity_classification_by_segments() {
        assert_eq!(validate_entity_name("ab.xrd"), Ok(NameKind::Root));
        assert_eq!(validate_entity_name("x.ab.xrd"), Ok(NameKind::Sub));
        assert!(validate_entity_name("w.x.ab.xrd").is_err());
        assert!(validate_subdomain_name("w.x.ab.xrd").is_ok());
    }

    #[test]
    fn parse_normalizes_case_and_whitespace() {
        let parsed = DomainName::parse_root("  AbC.XRD ").unwrap();
        assert_eq!(parsed.as_str(), "abc.xrd");
    }

    #[test]
    fn strip_extension_and_root_of() {
        assert_eq!(strip_extension("radix.xrd"), "radix");
        assert_eq!(strip_extension("radix"), "radix");
        assert_eq!(root_of("a.b.xrd"), "b.xrd");
        assert_eq!(root_of("b.xrd"), "b.xrd");
    }
}
