//! Request and response types consumed by the [`Connection`] trait.
//!
//! These are thin data carriers; wire encoding belongs to the transport
//! implementation behind the trait.
//!
//! [`Connection`]: crate::connection::Connection

use ldapkit_schema::entry::Dn;

/// LDAP search scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchScope {
    /// The base entry only.
    #[default]
    Base,
    /// Immediate children of the base entry.
    SingleLevel,
    /// The base entry and everything below it.
    Subtree,
}

/// A search request.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub base: Dn,
    pub scope: SearchScope,
    pub filter: String,
    pub attributes: Vec<String>,
}

impl SearchRequest {
    /// Create a search request with the given base, scope and filter.
    pub fn new(base: impl Into<Dn>, scope: SearchScope, filter: impl Into<String>) -> Self {
        SearchRequest {
            base: base.into(),
            scope,
            filter: filter.into(),
            attributes: Vec::new(),
        }
    }

    /// Restrict the attributes returned.
    #[must_use]
    pub fn with_attributes(
        mut self,
        attributes: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }
}

/// An add request: the new entry's DN and attributes.
#[derive(Debug, Clone)]
pub struct AddRequest {
    pub dn: Dn,
    pub attributes: Vec<(String, Vec<String>)>,
}

impl AddRequest {
    pub fn new(dn: impl Into<Dn>) -> Self {
        AddRequest {
            dn: dn.into(),
            attributes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_attribute(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.attributes
            .push((name.into(), values.into_iter().map(Into::into).collect()));
        self
    }
}

/// A delete request.
#[derive(Debug, Clone)]
pub struct DeleteRequest {
    pub dn: Dn,
}

impl DeleteRequest {
    pub fn new(dn: impl Into<Dn>) -> Self {
        DeleteRequest { dn: dn.into() }
    }
}

/// The kind of change a [`Modification`] applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModificationKind {
    Add,
    Delete,
    Replace,
}

/// One attribute change within a modify request.
#[derive(Debug, Clone)]
pub struct Modification {
    pub kind: ModificationKind,
    pub attribute: String,
    pub values: Vec<String>,
}

/// A modify request.
#[derive(Debug, Clone)]
pub struct ModifyRequest {
    pub dn: Dn,
    pub modifications: Vec<Modification>,
}

impl ModifyRequest {
    pub fn new(dn: impl Into<Dn>) -> Self {
        ModifyRequest {
            dn: dn.into(),
            modifications: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_modification(
        mut self,
        kind: ModificationKind,
        attribute: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.modifications.push(Modification {
            kind,
            attribute: attribute.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }
}

/// A modify DN (rename) request.
#[derive(Debug, Clone)]
pub struct ModifyDnRequest {
    pub dn: Dn,
    pub new_rdn: String,
    pub delete_old_rdn: bool,
    pub new_superior: Option<Dn>,
}

impl ModifyDnRequest {
    pub fn new(dn: impl Into<Dn>, new_rdn: impl Into<String>) -> Self {
        ModifyDnRequest {
            dn: dn.into(),
            new_rdn: new_rdn.into(),
            delete_old_rdn: true,
            new_superior: None,
        }
    }
}

/// A compare request.
#[derive(Debug, Clone)]
pub struct CompareRequest {
    pub dn: Dn,
    pub attribute: String,
    pub value: String,
}

/// An extended operation request.
#[derive(Debug, Clone)]
pub struct ExtendedRequest {
    pub oid: String,
    pub value: Option<Vec<u8>>,
}

/// An extended operation response.
#[derive(Debug, Clone, Default)]
pub struct ExtendedResponse {
    pub oid: Option<String>,
    pub value: Option<Vec<u8>>,
}
