//! Schema discovery round trips over a mock connection.

mod common;

use ldapkit_client::connection::ConnectionFactory;
use ldapkit_client::discovery::{read_schema, read_schema_for_entry};
use ldapkit_client::error::ClientError;
use ldapkit_schema::entry::{Dn, Entry};
use ldapkit_schema::Schema;

use common::MockConnectionFactory;

fn subschema_entry() -> Entry {
    let mut entry =
        Entry::new(Dn::new("cn=schema")).with_attribute("objectClass", ["top", "subschema"]);
    Schema::core_schema().to_entry(&mut entry);
    entry
}

fn directory() -> Vec<Entry> {
    vec![
        subschema_entry(),
        Entry::new(Dn::new("uid=jdoe,ou=people,dc=example,dc=com"))
            .with_attribute("objectClass", ["top", "person"])
            .with_attribute("subschemaSubentry", ["cn=schema"]),
    ]
}

#[tokio::test]
async fn read_schema_parses_the_subschema_subentry() {
    let factory = MockConnectionFactory::with_directory(directory());
    let mut connection = factory.get_connection().await.unwrap();

    let schema = read_schema(connection.as_mut(), &Dn::new("cn=schema"))
        .await
        .unwrap();
    assert!(schema.warnings().is_empty(), "{:?}", schema.warnings());
    assert!(schema.has_attribute_type("cn"));
    assert!(schema.has_object_class("person"));
    assert_eq!(
        schema.attribute_types().len(),
        Schema::core_schema().attribute_types().len()
    );
}

#[tokio::test]
async fn read_schema_fails_when_the_subentry_is_missing() {
    let factory = MockConnectionFactory::with_directory(directory());
    let mut connection = factory.get_connection().await.unwrap();

    let result = read_schema(connection.as_mut(), &Dn::new("cn=no-such-schema")).await;
    assert!(matches!(result, Err(ClientError::EntryNotFound { .. })));
}

#[tokio::test]
async fn read_schema_for_entry_follows_the_subentry_pointer() {
    let factory = MockConnectionFactory::with_directory(directory());
    let mut connection = factory.get_connection().await.unwrap();

    let schema = read_schema_for_entry(
        connection.as_mut(),
        &Dn::new("uid=jdoe,ou=people,dc=example,dc=com"),
    )
    .await
    .unwrap();
    assert!(schema.has_object_class("inetOrgPerson"));
}
