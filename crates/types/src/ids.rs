//! Newtype wrapper for template identifiers
//!
//! Keeps template ids from being mixed up with other string-typed values
//! (field names, file paths) at compile time.

use std::fmt;
use std::sync::Arc;

/// An identifier for a stored template
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct TemplateId(Arc<str>);

impl TemplateId {
    /// Creates a new TemplateId from a string
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// Returns the string representation of this template id
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TemplateId {
    fn from(s: String) -> Self {
        Self(s.into())
    }
}

impl From<&str> for TemplateId {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

impl AsRef<str> for TemplateId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_id_creation() {
        let id1 = TemplateId::new("invoice-v2");
        let id2 = TemplateId::from("invoice-v2");
        let id3 = TemplateId::from(String::from("invoice-v2"));

        assert_eq!(id1, id2);
        assert_eq!(id2, id3);
        assert_eq!(id1.as_str(), "invoice-v2");
    }

    #[test]
    fn test_hash_map_usage() {
        use std::collections::HashMap;

        let mut metas = HashMap::new();
        metas.insert(TemplateId::new("a"), 1);
        metas.insert(TemplateId::new("b"), 2);

        assert_eq!(metas.get(&TemplateId::new("a")), Some(&1));
    }
}
