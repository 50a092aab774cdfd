// SQL generation for persisted price tables.
// Table layout: a TEXT "timestamp" primary key (RFC 3339) followed by one
// REAL column per series column, in series order. NULL marks a missing value.

use crate::error::{PipelineError, Result};

pub const DEFAULT_TABLE: &str = "stock_data";
pub const INDEX_COLUMN: &str = "timestamp";

/// Table names are interpolated into SQL, so only plain identifiers pass
pub fn validate_table_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);

    if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(PipelineError::Persist(format!(
            "invalid table name: '{}'",
            name
        )));
    }
    Ok(())
}

/// Double-quote an identifier so names like `Upper Band` survive
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn drop_table_sql(table: &str) -> String {
    format!("DROP TABLE IF EXISTS {}", quote_identifier(table))
}

pub fn create_table_sql(table: &str, columns: &[&str]) -> String {
    let mut definitions = vec![format!("{} TEXT PRIMARY KEY", quote_identifier(INDEX_COLUMN))];
    definitions.extend(
        columns
            .iter()
            .map(|name| format!("{} REAL", quote_identifier(name))),
    );

    format!(
        "CREATE TABLE {} ({})",
        quote_identifier(table),
        definitions.join(", ")
    )
}

pub fn insert_sql(table: &str, columns: &[&str]) -> String {
    let names: Vec<String> = std::iter::once(INDEX_COLUMN)
        .chain(columns.iter().copied())
        .map(quote_identifier)
        .collect();
    let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{}", i)).collect();

    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_identifier(table),
        names.join(", "),
        placeholders.join(", ")
    )
}

pub fn select_all_sql(table: &str) -> String {
    format!(
        "SELECT * FROM {} ORDER BY {}",
        quote_identifier(table),
        quote_identifier(INDEX_COLUMN)
    )
}
