//! Database schema definitions.

/// Internal table recording the schema version of each database file.
pub const META_TABLE: &str = "qbank_meta";

/// SQL statement to create the metadata table.
pub const CREATE_META: &str = r#"
CREATE TABLE IF NOT EXISTS qbank_meta (
    name VARCHAR PRIMARY KEY,
    version BIGINT NOT NULL
);
"#;

/// SQL statement to create a record store named `store`.
///
/// `store` must already have passed [`is_valid_store_name`].
pub fn create_store(store: &str) -> String {
    format!(
        r#"CREATE TABLE IF NOT EXISTS "{store}" (
    id VARCHAR PRIMARY KEY,
    value VARCHAR NOT NULL
);"#
    )
}

/// Store names become table identifiers, so only plain identifiers are allowed.
pub fn is_valid_store_name(store: &str) -> bool {
    let mut chars = store.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    !store.eq_ignore_ascii_case(META_TABLE)
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
