//! Minimal entry, DN and RDN containers.
//!
//! These are the data shapes the schema subsystem consumes: a distinguished
//! name split into RDN components, and a set of case-insensitively addressed
//! multi-valued attributes (mirroring the shape of an LDAP search entry).
//! Wire encoding and byte-level value handling live outside this crate.

use std::fmt;

/// A distinguished name.
///
/// Components are separated by unescaped commas; the empty string is the
/// root DN.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dn {
    value: String,
}

impl Dn {
    /// The root DN (empty string).
    #[must_use]
    pub fn root() -> Self {
        Dn {
            value: String::new(),
        }
    }

    /// Create a DN from its string form.
    pub fn new(value: impl Into<String>) -> Self {
        Dn {
            value: value.into().trim().to_string(),
        }
    }

    /// True for the root DN.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.value.is_empty()
    }

    /// The DN string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Split into RDN component strings on unescaped commas.
    fn components(&self) -> Vec<&str> {
        if self.value.is_empty() {
            return Vec::new();
        }
        let mut parts = Vec::new();
        let mut start = 0;
        let bytes = self.value.as_bytes();
        let mut escaped = false;
        for (i, &b) in bytes.iter().enumerate() {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b',' {
                parts.push(self.value[start..i].trim());
                start = i + 1;
            }
        }
        parts.push(self.value[start..].trim());
        parts
    }

    /// The parent DN, or `None` for the root DN.
    #[must_use]
    pub fn parent(&self) -> Option<Dn> {
        if self.is_root() {
            return None;
        }
        let components = self.components();
        if components.len() <= 1 {
            return Some(Dn::root());
        }
        Some(Dn::new(components[1..].join(",")))
    }

    /// The leading RDN, or `None` for the root DN.
    #[must_use]
    pub fn rdn(&self) -> Option<Rdn> {
        if self.is_root() {
            return None;
        }
        self.components().first().map(|c| Rdn::parse(c))
    }
}

impl Default for Dn {
    fn default() -> Self {
        Dn::root()
    }
}

impl fmt::Display for Dn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl From<&str> for Dn {
    fn from(value: &str) -> Self {
        Dn::new(value)
    }
}

/// A relative distinguished name: one or more attribute-value assertions
/// joined by `+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rdn {
    avas: Vec<Ava>,
}

impl Rdn {
    fn parse(component: &str) -> Rdn {
        let mut avas = Vec::new();
        let mut start = 0;
        let bytes = component.as_bytes();
        let mut escaped = false;
        let mut push = |part: &str| {
            let part = part.trim();
            if let Some(eq) = part.find('=') {
                avas.push(Ava {
                    attribute: part[..eq].trim().to_string(),
                    value: part[eq + 1..].trim().to_string(),
                });
            }
        };
        for (i, &b) in bytes.iter().enumerate() {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'+' {
                push(&component[start..i]);
                start = i + 1;
            }
        }
        push(&component[start..]);
        Rdn { avas }
    }

    /// The attribute-value assertions of this RDN.
    #[must_use]
    pub fn avas(&self) -> &[Ava] {
        &self.avas
    }

    /// The value asserted for the named attribute, if present.
    #[must_use]
    pub fn attribute_value(&self, attribute: &str) -> Option<&str> {
        self.avas
            .iter()
            .find(|ava| ava.attribute.eq_ignore_ascii_case(attribute))
            .map(|ava| ava.value.as_str())
    }
}

/// A single attribute-value assertion within an RDN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ava {
    attribute: String,
    value: String,
}

impl Ava {
    /// The attribute description (name or OID).
    #[must_use]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// The asserted value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// A named, multi-valued entry attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    name: String,
    values: Vec<String>,
}

impl Attribute {
    /// Create an attribute with the given values.
    pub fn new(
        name: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Attribute {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// The attribute description (name or OID).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The attribute values, in insertion order.
    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if the attribute holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A directory entry: a DN plus its attributes.
#[derive(Debug, Clone, Default)]
pub struct Entry {
    name: Dn,
    attributes: Vec<Attribute>,
}

impl Entry {
    /// Create an empty entry with the given name.
    pub fn new(name: impl Into<Dn>) -> Self {
        Entry {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    /// The entry's distinguished name.
    #[must_use]
    pub fn name(&self) -> &Dn {
        &self.name
    }

    /// All attributes, in insertion order.
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Find an attribute by name (case-insensitive).
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
    }

    /// Add values to the named attribute, creating it if absent.
    pub fn add_attribute(
        &mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> &mut Self {
        let name = name.into();
        let new_values = values.into_iter().map(Into::into);
        match self
            .attributes
            .iter_mut()
            .find(|a| a.name.eq_ignore_ascii_case(&name))
        {
            Some(attribute) => attribute.values.extend(new_values),
            None => self.attributes.push(Attribute {
                name,
                values: new_values.collect(),
            }),
        }
        self
    }

    /// Builder-style form of [`add_attribute`](Self::add_attribute).
    #[must_use]
    pub fn with_attribute(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.add_attribute(name, values);
        self
    }
}

impl From<Dn> for Entry {
    fn from(name: Dn) -> Self {
        Entry::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dn_parent_and_rdn() {
        let dn = Dn::new("cn=John Doe,ou=people,dc=example,dc=com");
        assert!(!dn.is_root());
        assert_eq!(
            dn.parent().unwrap().as_str(),
            "ou=people,dc=example,dc=com"
        );

        let rdn = dn.rdn().unwrap();
        assert_eq!(rdn.attribute_value("cn"), Some("John Doe"));
        assert_eq!(rdn.attribute_value("CN"), Some("John Doe"));
        assert_eq!(rdn.attribute_value("sn"), None);
    }

    #[test]
    fn test_root_dn() {
        let root = Dn::root();
        assert!(root.is_root());
        assert!(root.parent().is_none());
        assert!(root.rdn().is_none());

        let single = Dn::new("dc=com");
        assert!(single.parent().unwrap().is_root());
    }

    #[test]
    fn test_multi_valued_rdn() {
        let dn = Dn::new("cn=doe+uid=jdoe,dc=example,dc=com");
        let rdn = dn.rdn().unwrap();
        assert_eq!(rdn.avas().len(), 2);
        assert_eq!(rdn.attribute_value("uid"), Some("jdoe"));
    }

    #[test]
    fn test_escaped_comma_stays_in_component() {
        let dn = Dn::new(r"cn=Doe\, John,dc=example,dc=com");
        assert_eq!(dn.parent().unwrap().as_str(), "dc=example,dc=com");
        let rdn = dn.rdn().unwrap();
        assert_eq!(rdn.attribute_value("cn"), Some(r"Doe\, John"));
    }

    #[test]
    fn test_entry_attributes_case_insensitive() {
        let mut entry = Entry::new(Dn::new("dc=example,dc=com"));
        entry.add_attribute("objectClass", ["top", "domain"]);
        entry.add_attribute("OBJECTCLASS", ["extensibleObject"]);

        let attribute = entry.attribute("objectclass").unwrap();
        assert_eq!(attribute.values(), ["top", "domain", "extensibleObject"]);
        assert_eq!(entry.attributes().len(), 1);
    }
}
