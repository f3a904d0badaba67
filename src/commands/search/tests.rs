use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use super::*;
use crate::index::{CollectionConfig, Hit, IndexDoc};
use crate::model::NewLaw;

/// In-memory stand-in for the external search service: case-insensitive
/// substring matching, matches wrapped in the option tag pair, and a call
/// counter to assert the empty-query short-circuit.
#[derive(Default)]
struct MemoryIndex {
    collections: HashMap<String, Vec<IndexDoc>>,
    search_calls: RefCell<usize>,
}

impl MemoryIndex {
    fn with_doc(mut self, collection: &str, id: &str, law_id: i64, content: &str) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert("content".to_string(), content.to_string());
        self.collections
            .entry(collection.to_string())
            .or_default()
            .push(IndexDoc {
                id: id.to_string(),
                law_id,
                fields,
            });
        self
    }
}

impl SearchIndex for MemoryIndex {
    fn configure(&self, _collection: &str, _config: &CollectionConfig) -> anyhow::Result<()> {
        Ok(())
    }

    fn add_documents(&self, _collection: &str, _docs: &[IndexDoc]) -> anyhow::Result<()> {
        Ok(())
    }

    fn search(
        &self,
        collection: &str,
        query: &str,
        options: &SearchOptions,
    ) -> anyhow::Result<Vec<Hit>> {
        *self.search_calls.borrow_mut() += 1;
        let needle = query.to_lowercase();
        let docs = self.collections.get(collection).cloned().unwrap_or_default();

        let mut hits = Vec::new();
        for doc in docs {
            let matched = doc
                .fields
                .values()
                .any(|value| value.to_lowercase().contains(&needle));
            if !matched {
                continue;
            }
            let formatted = doc
                .fields
                .iter()
                .map(|(field, value)| {
                    let wrapped = value.replace(
                        query,
                        &format!(
                            "{}{query}{}",
                            options.highlight_pre_tag, options.highlight_post_tag
                        ),
                    );
                    (field.clone(), wrapped)
                })
                .collect();
            hits.push(Hit {
                id: doc.id,
                law_id: doc.law_id,
                fields: doc.fields,
                formatted,
            });
        }
        Ok(hits)
    }
}

fn store_with_law(title: &str, slug: &str) -> (LawStore, i64) {
    let store = LawStore::open_in_memory().unwrap();
    let law_id = store
        .create_law(&NewLaw {
            title: title.to_string(),
            slug: slug.to_string(),
            enactment_date: None,
            source_file: None,
            source_sha256: None,
            extracted_text: None,
        })
        .unwrap();
    (store, law_id)
}

#[test]
fn empty_query_returns_empty_list_without_index_calls() {
    let (store, law_id) = store_with_law("Test Law", "test-law");
    let index = MemoryIndex::default().with_doc(SECTIONS, "section-1", law_id, "cited text");

    let results = aggregate(&index, &store, "").unwrap();
    assert!(results.is_empty());
    assert_eq!(*index.search_calls.borrow(), 0);
}

#[test]
fn section_hit_is_tagged_and_hydrated() {
    let (store, law_id) = store_with_law("Test Law 2024", "test-law-2024");
    let index = MemoryIndex::default().with_doc(
        SECTIONS,
        "section-1",
        law_id,
        "This Act may be cited as the Test Act.",
    );

    let results = aggregate(&index, &store, "cited").unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].result_type, "Section");
    assert_eq!(results[0].law_title, "Test Law 2024");
    assert_eq!(results[0].law_slug, "test-law-2024");
    assert!(results[0].highlight["content"].contains("<b>cited</b>"));
}

#[test]
fn hits_keep_fixed_collection_order() {
    let (store, law_id) = store_with_law("Test Law", "test-law");
    let index = MemoryIndex::default()
        .with_doc(APPENDICES, "appendix-1", law_id, "shared term")
        .with_doc(SCHEDULES, "schedule-1", law_id, "shared term")
        .with_doc(SECTIONS, "section-1", law_id, "shared term")
        .with_doc(SECTIONS, "section-2", law_id, "shared term");

    let results = aggregate(&index, &store, "shared").unwrap();

    let kinds: Vec<&str> = results.iter().map(|result| result.result_type).collect();
    assert_eq!(kinds, vec!["Section", "Section", "Schedule", "Appendix"]);
    assert_eq!(*index.search_calls.borrow(), 3);
}

#[test]
fn stale_law_reference_gets_sentinel_not_failure() {
    let (store, law_id) = store_with_law("Test Law", "test-law");
    let index = MemoryIndex::default()
        .with_doc(SECTIONS, "section-1", law_id, "both laws mention tax")
        .with_doc(SCHEDULES, "schedule-9", 9999, "both laws mention tax");

    let results = aggregate(&index, &store, "tax").unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].law_title, "Test Law");
    assert_eq!(results[1].law_title, "Error: Law not found");
    assert_eq!(results[1].law_slug, "");
}
