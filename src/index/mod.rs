use std::collections::BTreeMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

mod fts;

pub use fts::FtsIndex;

pub const SECTIONS: &str = "sections";
pub const SCHEDULES: &str = "schedules";
pub const APPENDICES: &str = "appendices";

/// Field declaration for one search collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionConfig {
    pub searchable_fields: Vec<String>,
    pub displayed_fields: Vec<String>,
    pub filterable_fields: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub highlight_pre_tag: String,
    pub highlight_post_tag: String,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            highlight_pre_tag: "<b>".to_string(),
            highlight_post_tag: "</b>".to_string(),
        }
    }
}

/// One document pushed into a collection. `law_id` is the parent-document
/// reference hits carry back for hydration.
#[derive(Debug, Clone)]
pub struct IndexDoc {
    pub id: String,
    pub law_id: i64,
    pub fields: BTreeMap<String, String>,
}

/// One ranked search hit. `formatted` holds per-field copies with matches
/// wrapped in the requested tag pair.
#[derive(Debug, Clone, Serialize)]
pub struct Hit {
    pub id: String,
    pub law_id: i64,
    pub fields: BTreeMap<String, String>,
    pub formatted: BTreeMap<String, String>,
}

/// Narrow contract over the external search service: declare a collection's
/// fields, bulk-upsert documents, and run a highlighted free-text query.
/// Ranking and tokenization stay behind this boundary.
pub trait SearchIndex {
    fn configure(&self, collection: &str, config: &CollectionConfig) -> Result<()>;

    fn add_documents(&self, collection: &str, docs: &[IndexDoc]) -> Result<()>;

    fn search(&self, collection: &str, query: &str, options: &SearchOptions) -> Result<Vec<Hit>>;
}
