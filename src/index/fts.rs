use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result, bail};
use regex::Regex;
use rusqlite::{Connection, OptionalExtension, params};

use super::{CollectionConfig, Hit, IndexDoc, SearchIndex, SearchOptions};

/// SQLite FTS5 implementation of [`SearchIndex`], one virtual table per
/// collection, kept in a database separate from the document store.
pub struct FtsIndex {
    connection: Connection,
}

impl FtsIndex {
    pub fn open(path: &Path) -> Result<Self> {
        let connection = Connection::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        Self::from_connection(connection)
    }

    pub fn open_in_memory() -> Result<Self> {
        let connection =
            Connection::open_in_memory().context("failed to open in-memory index")?;
        Self::from_connection(connection)
    }

    fn from_connection(connection: Connection) -> Result<Self> {
        connection.execute_batch(
            "CREATE TABLE IF NOT EXISTS collections (
               name TEXT PRIMARY KEY,
               config TEXT NOT NULL
             );",
        )?;
        Ok(Self { connection })
    }

    fn stored_config(&self, collection: &str) -> Result<Option<CollectionConfig>> {
        let raw: Option<String> = self
            .connection
            .query_row(
                "SELECT config FROM collections WHERE name = ?1",
                params![collection],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            Some(raw) => {
                let config = serde_json::from_str(&raw)
                    .with_context(|| format!("corrupt config for collection '{collection}'"))?;
                Ok(Some(config))
            }
            None => Ok(None),
        }
    }

    fn config_for(&self, collection: &str) -> Result<CollectionConfig> {
        self.stored_config(collection)?
            .with_context(|| format!("collection '{collection}' is not configured"))
    }
}

impl SearchIndex for FtsIndex {
    fn configure(&self, collection: &str, config: &CollectionConfig) -> Result<()> {
        validate_identifier(collection)?;
        if config.searchable_fields.is_empty() {
            bail!("collection '{collection}' declares no searchable fields");
        }
        for field in &config.searchable_fields {
            validate_identifier(field)?;
        }

        // Re-declaring an unchanged collection keeps its documents; a changed
        // field set rebuilds the table and the caller re-adds documents.
        if self.stored_config(collection)?.as_ref() == Some(config) {
            return Ok(());
        }

        let columns = config
            .searchable_fields
            .iter()
            .map(String::as_str)
            .collect::<Vec<&str>>()
            .join(", ");
        self.connection
            .execute_batch(&format!(
                "DROP TABLE IF EXISTS fts_{collection};
                 CREATE VIRTUAL TABLE fts_{collection}
                 USING fts5(id UNINDEXED, law_id UNINDEXED, {columns});"
            ))
            .with_context(|| format!("failed to create FTS5 table for '{collection}'"))?;

        let raw = serde_json::to_string(config)?;
        self.connection.execute(
            "INSERT INTO collections(name, config) VALUES(?1, ?2)
             ON CONFLICT(name) DO UPDATE SET config=excluded.config",
            params![collection, raw],
        )?;
        Ok(())
    }

    fn add_documents(&self, collection: &str, docs: &[IndexDoc]) -> Result<()> {
        validate_identifier(collection)?;
        let config = self.config_for(collection)?;
        let fields = &config.searchable_fields;

        let column_list = fields.join(", ");
        let placeholders = (3..=fields.len() + 2)
            .map(|n| format!("?{n}"))
            .collect::<Vec<String>>()
            .join(", ");
        let insert_sql = format!(
            "INSERT INTO fts_{collection} (id, law_id, {column_list}) VALUES (?1, ?2, {placeholders})"
        );
        let delete_sql = format!("DELETE FROM fts_{collection} WHERE id = ?1");

        let tx = self.connection.unchecked_transaction()?;
        for doc in docs {
            tx.execute(&delete_sql, params![doc.id])?;

            let mut values: Vec<&dyn rusqlite::ToSql> = vec![&doc.id, &doc.law_id];
            for field in fields {
                match doc.fields.get(field) {
                    Some(value) => values.push(value),
                    None => values.push(&""),
                }
            }
            tx.execute(&insert_sql, values.as_slice())
                .with_context(|| format!("failed to upsert doc '{}' into '{collection}'", doc.id))?;
        }
        tx.commit()
            .with_context(|| format!("failed to commit upsert into '{collection}'"))
    }

    fn search(&self, collection: &str, query: &str, options: &SearchOptions) -> Result<Vec<Hit>> {
        validate_identifier(collection)?;
        let config = self.config_for(collection)?;
        let fields = &config.searchable_fields;

        let match_query = to_match_query(query);
        if match_query.is_empty() {
            return Ok(Vec::new());
        }

        let mut select_columns = vec!["id".to_string(), "law_id".to_string()];
        select_columns.extend(fields.iter().cloned());
        for (offset, _) in fields.iter().enumerate() {
            // id and law_id occupy FTS5 column positions 0 and 1.
            select_columns.push(format!("highlight(fts_{collection}, {}, ?1, ?2)", offset + 2));
        }

        let sql = format!(
            "SELECT {} FROM fts_{collection} WHERE fts_{collection} MATCH ?3 ORDER BY rank",
            select_columns.join(", ")
        );

        let mut statement = self.connection.prepare(&sql)?;
        let rows = statement
            .query_map(
                params![
                    options.highlight_pre_tag,
                    options.highlight_post_tag,
                    match_query
                ],
                |row| {
                    let mut fields_out = BTreeMap::new();
                    let mut formatted = BTreeMap::new();
                    for (position, field) in fields.iter().enumerate() {
                        fields_out
                            .insert(field.clone(), row.get::<_, String>(2 + position)?);
                        formatted.insert(
                            field.clone(),
                            row.get::<_, String>(2 + fields.len() + position)?,
                        );
                    }
                    Ok(Hit {
                        id: row.get(0)?,
                        law_id: row.get(1)?,
                        fields: fields_out,
                        formatted,
                    })
                },
            )?
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("search against '{collection}' failed"))?;

        Ok(rows)
    }
}

/// Quote each whitespace token so FTS5 treats punctuation-laden queries
/// (section numbers, citations) as plain terms.
fn to_match_query(query_text: &str) -> String {
    query_text
        .split_whitespace()
        .filter(|token| !token.trim().is_empty())
        .map(|token| format!("\"{}\"", token.replace('"', "")))
        .collect::<Vec<String>>()
        .join(" ")
}

fn validate_identifier(name: &str) -> Result<()> {
    static IDENT: OnceLock<Regex> = OnceLock::new();
    let ident = IDENT.get_or_init(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("static regex"));
    if !ident.is_match(name) {
        bail!("invalid collection or field identifier: '{name}'");
    }
    Ok(())
}
