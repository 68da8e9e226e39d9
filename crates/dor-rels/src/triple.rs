use serde::{Deserialize, Serialize};

use dor_types::pid::RESOURCE_URI_PREFIX;

/// Namespace-qualified predicate of a relationship.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    /// Namespace URI, including its trailing `#` or `/`.
    pub namespace: String,
    /// Prefix the predicate was (or will be) serialized under, when known.
    pub alias: Option<String>,
    /// Local name within the namespace.
    pub name: String,
}

impl Predicate {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            alias: None,
            name: name.into(),
        }
    }

    /// The full predicate URI (`namespace` + `name`).
    pub fn uri(&self) -> String {
        format!("{}{}", self.namespace, self.name)
    }
}

/// Object half of a relationship triple.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TripleObject {
    /// A resource reference by URI.
    Resource(String),
    /// A literal value with an optional datatype URI.
    Literal {
        value: String,
        datatype: Option<String>,
    },
}

impl TripleObject {
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
            datatype: None,
        }
    }

    pub fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
            datatype: Some(datatype.into()),
        }
    }

    pub fn resource(uri: impl Into<String>) -> Self {
        Self::Resource(uri.into())
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal { .. })
    }

    /// The raw value: the literal text or the full resource URI.
    pub fn value(&self) -> &str {
        match self {
            Self::Resource(uri) => uri,
            Self::Literal { value, .. } => value,
        }
    }

    /// The value with the reserved resource prefix stripped, so resource
    /// references to objects read as bare pids.
    pub fn bare_value(&self) -> &str {
        let value = self.value();
        value.strip_prefix(RESOURCE_URI_PREFIX).unwrap_or(value)
    }
}

/// One relationship triple.
///
/// `subject` is `None` for "the owning object"; the document fills in its
/// own subject URI at serialization time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triple {
    pub subject: Option<String>,
    pub predicate: Predicate,
    pub object: TripleObject,
}

impl Triple {
    pub fn new(predicate: Predicate, object: TripleObject) -> Self {
        Self {
            subject: None,
            predicate,
            object,
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicate_uri_joins() {
        let p = Predicate::new("http://example.org/rel#", "isMemberOf");
        assert_eq!(p.uri(), "http://example.org/rel#isMemberOf");
    }

    #[test]
    fn bare_value_strips_reserved_prefix() {
        let o = TripleObject::resource("info:fedora/islandora:root");
        assert_eq!(o.bare_value(), "islandora:root");
        assert_eq!(o.value(), "info:fedora/islandora:root");
    }

    #[test]
    fn bare_value_leaves_other_uris() {
        let o = TripleObject::resource("http://example.org/thing");
        assert_eq!(o.bare_value(), "http://example.org/thing");
    }

    #[test]
    fn literal_flags() {
        assert!(TripleObject::literal("x").is_literal());
        assert!(!TripleObject::resource("u").is_literal());
    }
}
