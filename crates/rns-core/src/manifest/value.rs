use rns_schema::NonFungibleId;
use rust_decimal::Decimal;
use std::fmt::{self, Write as _};

/// An argument value in the textual manifest grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestValue {
    String(String),
    Decimal(Decimal),
    Address(String),
    Bucket(String),
    Proof(String),
    NonFungibleLocalId(NonFungibleId),
    /// `Array<ElementKind>(..)`
    Array(&'static str, Vec<ManifestValue>),
    /// `Enum<Nu8>(..)`
    Enum(u8, Vec<ManifestValue>),
    Tuple(Vec<ManifestValue>),
    Expression(&'static str),
}

impl ManifestValue {
    pub fn string(s: &str) -> Self {
        Self::String(s.to_owned())
    }

    pub fn address(a: &str) -> Self {
        Self::Address(a.to_owned())
    }

    pub fn id_array(ids: &[NonFungibleId]) -> Self {
        Self::Array(
            "NonFungibleLocalId",
            ids.iter().cloned().map(Self::NonFungibleLocalId).collect(),
        )
    }

    /// `Option::None`.
    pub fn none() -> Self {
        Self::Enum(0, Vec::new())
    }

    /// `Option::Some(inner)`.
    pub fn some(inner: ManifestValue) -> Self {
        Self::Enum(1, vec![inner])
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_char('"')?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('"')
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[ManifestValue]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for ManifestValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write_escaped(f, s),
            Self::Decimal(d) => write!(f, "Decimal(\"{}\")", d.normalize()),
            Self::Address(a) => write!(f, "Address(\"{a}\")"),
            Self::Bucket(b) => write!(f, "Bucket(\"{b}\")"),
            Self::Proof(p) => write!(f, "Proof(\"{p}\")"),
            Self::NonFungibleLocalId(id) => write!(f, "NonFungibleLocalId(\"{id}\")"),
            Self::Array(kind, items) => {
                write!(f, "Array<{kind}>(")?;
                write_list(f, items)?;
                f.write_char(')')
            }
            Self::Enum(variant, items) => {
                write!(f, "Enum<{variant}u8>(")?;
                write_list(f, items)?;
                f.write_char(')')
            }
            Self::Tuple(items) => {
                f.write_str("Tuple(")?;
                write_list(f, items)?;
                f.write_char(')')
            }
            Self::Expression(e) => write!(f, "Expression(\"{e}\")"),
        }
    }
}
