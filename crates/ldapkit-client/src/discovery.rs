//! Schema discovery: reading the schema a server publishes through its
//! subschema subentries.

use tracing::debug;

use ldapkit_schema::entry::Dn;
use ldapkit_schema::{oids, Schema, SchemaBuilder};

use crate::connection::Connection;
use crate::error::{ClientError, ClientResult};
use crate::requests::{SearchRequest, SearchScope};

const SUBSCHEMA_ATTRIBUTES: [&str; 8] = [
    oids::ATTR_LDAP_SYNTAXES,
    oids::ATTR_ATTRIBUTE_TYPES,
    oids::ATTR_DIT_CONTENT_RULES,
    oids::ATTR_DIT_STRUCTURE_RULES,
    oids::ATTR_MATCHING_RULE_USE,
    oids::ATTR_MATCHING_RULES,
    oids::ATTR_NAME_FORMS,
    oids::ATTR_OBJECT_CLASSES,
];

/// Read the schema contained in the named subschema subentry.
///
/// Parse problems with individual definitions are reported through the
/// returned schema's warnings; only a missing subentry fails the call.
pub async fn read_schema(connection: &mut dyn Connection, name: &Dn) -> ClientResult<Schema> {
    let request = SearchRequest::new(name.clone(), SearchScope::Base, "(objectClass=subschema)")
        .with_attributes(SUBSCHEMA_ATTRIBUTES);
    let mut entries = connection.search(request).await?;
    let Some(entry) = entries.pop() else {
        return Err(ClientError::entry_not_found(name.to_string()));
    };
    let schema = SchemaBuilder::from_entry(&entry).to_schema();
    debug!(
        subentry = %name,
        attribute_types = schema.attribute_types().len(),
        object_classes = schema.object_classes().len(),
        warnings = schema.warnings().len(),
        "read schema from subschema subentry"
    );
    Ok(schema)
}

/// Read the schema governing the named entry.
///
/// The entry's `subschemaSubentry` operational attribute names the
/// subentry to read; the schema itself is then fetched with
/// [`read_schema`].
pub async fn read_schema_for_entry(
    connection: &mut dyn Connection,
    name: &Dn,
) -> ClientResult<Schema> {
    let subentry_attribute = [oids::ATTR_SUBSCHEMA_SUBENTRY.to_string()];
    let entry = connection.read_entry(name, &subentry_attribute).await?;
    let subentry_dn = entry
        .attribute(oids::ATTR_SUBSCHEMA_SUBENTRY)
        .and_then(|attribute| attribute.values().first().cloned())
        .ok_or_else(|| {
            ClientError::operation_failed(format!(
                "entry {name} has no subschemaSubentry attribute"
            ))
        })?;
    read_schema(connection, &Dn::new(subentry_dn)).await
}
