use std::collections::BTreeMap;

use anyhow::Result;
use tracing::info;

use crate::cli::{self, ReindexArgs};
use crate::index::{APPENDICES, CollectionConfig, FtsIndex, IndexDoc, SCHEDULES, SECTIONS, SearchIndex};
use crate::store::LawStore;
use crate::util::ensure_directory;

pub fn run(args: ReindexArgs) -> Result<()> {
    ensure_directory(&args.data_root)?;
    let store = LawStore::open(&cli::db_path(&args.data_root, &args.db_path))?;
    let index = FtsIndex::open(&cli::index_path(&args.data_root, &args.index_path))?;

    let indexed = rebuild(&index, &store)?;
    info!(docs = indexed, "search index rebuilt");
    Ok(())
}

/// Rebuild all three collections from the current document store: declare
/// each collection's fields, then bulk-upsert one document per section,
/// schedule, and appendix. Returns the number of documents indexed.
pub(crate) fn rebuild(index: &dyn SearchIndex, store: &LawStore) -> Result<usize> {
    let mut indexed = 0;

    index.configure(SECTIONS, &section_collection_config())?;
    let mut docs = Vec::new();
    for row in store.section_index_rows()? {
        let mut fields = BTreeMap::new();
        fields.insert("law_title".to_string(), row.law_title);
        fields.insert("part_heading".to_string(), row.part_heading);
        fields.insert("chapter_heading".to_string(), row.chapter_heading);
        fields.insert("section_number".to_string(), row.number);
        fields.insert("section_title".to_string(), row.title);
        fields.insert("content".to_string(), row.content);
        docs.push(IndexDoc {
            id: format!("section-{}", row.section_id),
            law_id: row.law_id,
            fields,
        });
    }
    indexed += docs.len();
    index.add_documents(SECTIONS, &docs)?;

    for (collection, table, id_column, prefix) in [
        (SCHEDULES, "schedules", "schedule_id", "schedule"),
        (APPENDICES, "appendices", "appendix_id", "appendix"),
    ] {
        index.configure(collection, &attachment_collection_config())?;
        let mut docs = Vec::new();
        for row in store.attachment_index_rows(table, id_column)? {
            let mut fields = BTreeMap::new();
            fields.insert("law_title".to_string(), row.law_title);
            fields.insert("number".to_string(), row.number);
            fields.insert("title".to_string(), row.title);
            fields.insert("content".to_string(), row.content);
            docs.push(IndexDoc {
                id: format!("{prefix}-{}", row.id),
                law_id: row.law_id,
                fields,
            });
        }
        indexed += docs.len();
        index.add_documents(collection, &docs)?;
    }

    Ok(indexed)
}

fn section_collection_config() -> CollectionConfig {
    CollectionConfig {
        searchable_fields: vec![
            "law_title".to_string(),
            "part_heading".to_string(),
            "chapter_heading".to_string(),
            "section_number".to_string(),
            "section_title".to_string(),
            "content".to_string(),
        ],
        displayed_fields: vec!["*".to_string()],
        filterable_fields: vec!["law_id".to_string()],
    }
}

fn attachment_collection_config() -> CollectionConfig {
    CollectionConfig {
        searchable_fields: vec![
            "law_title".to_string(),
            "number".to_string(),
            "title".to_string(),
            "content".to_string(),
        ],
        displayed_fields: vec!["*".to_string()],
        filterable_fields: vec!["law_id".to_string()],
    }
}
