use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a record within one subregistry scope (root or a subdomain).
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub context: String,
    pub directive: String,
}

impl RecordKey {
    pub fn new(context: impl Into<String>, directive: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            directive: directive.into(),
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.context, self.directive)
    }
}

/// A name-attached record: `(context, directive)` plus its value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDocket {
    pub context: String,
    pub directive: String,
    pub value: String,
}

impl RecordDocket {
    pub fn new(
        context: impl Into<String>,
        directive: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            context: context.into(),
            directive: directive.into(),
            value: value.into(),
        }
    }

    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.context.clone(), self.directive.clone())
    }
}
