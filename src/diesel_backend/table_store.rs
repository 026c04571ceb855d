//! Relational table adapter.
//!
//! Builds a dynamic `INSERT INTO <table> (<columns>) VALUES (...)` from a
//! resolved record and executes it over a pooled connection. All values are
//! bound as text (nulls as SQL NULL); richer column typing is left to the
//! database's own coercion rules. Identifiers never come from submission
//! data, but they are still validated before being interpolated.

use diesel::prelude::*;
use diesel::query_builder::{BoxedSqlQuery, SqlQuery};
use diesel::sql_types::{BigInt, Nullable, Text};

use crate::mapping::ResolvedRecord;
use crate::storage::{StorageError, StorageId, TableStore};
use crate::submission::FieldValue;

use super::database::{Database, DbConnection};

#[cfg(feature = "postgres")]
type Backend = diesel::pg::Pg;
#[cfg(feature = "mysql")]
type Backend = diesel::mysql::Mysql;

/// Table store backed by a Diesel connection pool.
pub struct DieselTableStore {
    db: Database,
}

impl DieselTableStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl TableStore for DieselTableStore {
    fn insert(&self, table_name: &str, row: &ResolvedRecord) -> Result<StorageId, StorageError> {
        validate_identifier(table_name)?;
        for column in row.keys() {
            validate_identifier(column)?;
        }
        if row.is_empty() {
            return Err(StorageError::Backend(
                "cannot insert an empty row".to_string(),
            ));
        }

        let mut conn = self
            .db
            .get_connection()
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        insert_row(&mut conn, table_name, row)
    }
}

#[derive(QueryableByName)]
struct InsertedRow {
    #[diesel(sql_type = BigInt)]
    id: i64,
}

#[cfg(feature = "postgres")]
fn insert_row(
    conn: &mut DbConnection,
    table_name: &str,
    row: &ResolvedRecord,
) -> Result<StorageId, StorageError> {
    let columns: Vec<&str> = row.keys().map(|k| k.as_str()).collect();
    let sql = format!("{} RETURNING id", insert_sql(table_name, &columns));

    let query = bind_values(diesel::sql_query(sql).into_boxed::<Backend>(), row);
    let inserted: InsertedRow = query
        .get_result(conn)
        .map_err(|e| StorageError::Backend(e.to_string()))?;

    Ok(StorageId::Int(inserted.id))
}

#[cfg(feature = "mysql")]
fn insert_row(
    conn: &mut DbConnection,
    table_name: &str,
    row: &ResolvedRecord,
) -> Result<StorageId, StorageError> {
    let columns: Vec<&str> = row.keys().map(|k| k.as_str()).collect();
    let sql = insert_sql(table_name, &columns);

    let query = bind_values(diesel::sql_query(sql).into_boxed::<Backend>(), row);
    query
        .execute(conn)
        .map_err(|e| StorageError::Backend(e.to_string()))?;

    // MySQL has no RETURNING; read the generated id back on the same
    // connection.
    let inserted: InsertedRow =
        diesel::sql_query("SELECT CAST(LAST_INSERT_ID() AS SIGNED) AS id")
            .get_result(conn)
            .map_err(|e| StorageError::Backend(e.to_string()))?;

    Ok(StorageId::Int(inserted.id))
}

fn insert_sql(table_name: &str, columns: &[&str]) -> String {
    #[cfg(feature = "postgres")]
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("${}", i)).collect();
    #[cfg(feature = "mysql")]
    let placeholders: Vec<String> = columns.iter().map(|_| "?".to_string()).collect();

    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table_name,
        columns.join(", "),
        placeholders.join(", ")
    )
}

fn bind_values(
    query: BoxedSqlQuery<'static, Backend, SqlQuery>,
    row: &ResolvedRecord,
) -> BoxedSqlQuery<'static, Backend, SqlQuery> {
    let mut query = query;
    for (_, value) in row.iter() {
        query = match sql_text(value) {
            Some(text) => query.bind::<Text, _>(text),
            None => query.bind::<Nullable<Text>, _>(None::<String>),
        };
    }
    query
}

/// Text rendering of a value for a bind parameter. `None` means SQL NULL.
/// Lists go in as their JSON rendering; the column decides whether that is
/// acceptable.
fn sql_text(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Null => None,
        FieldValue::List(_) => Some(serde_json::to_string(value).unwrap_or_default()),
        other => Some(other.to_string()),
    }
}

fn validate_identifier(name: &str) -> Result<(), StorageError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidIdentifier(name.to_string()))
    }
}
