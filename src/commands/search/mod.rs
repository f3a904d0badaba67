use std::collections::{BTreeMap, HashSet};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::{self, SearchArgs};
use crate::index::{APPENDICES, FtsIndex, SCHEDULES, SECTIONS, SearchIndex, SearchOptions};
use crate::store::LawStore;
use crate::util::{condense_whitespace, ensure_directory};

#[cfg(test)]
mod tests;

/// Sentinel title attached to hits whose law id no longer resolves.
const LAW_NOT_FOUND: &str = "Error: Law not found";

/// One hydrated search result: an index hit tagged with its collection kind
/// and enriched with the owning law's title and slug.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub result_type: &'static str,
    pub id: String,
    pub law_id: i64,
    pub law_title: String,
    pub law_slug: String,
    pub fields: BTreeMap<String, String>,
    pub highlight: BTreeMap<String, String>,
}

pub fn run(args: SearchArgs) -> Result<()> {
    ensure_directory(&args.data_root)?;
    let store = LawStore::open(&cli::db_path(&args.data_root, &args.db_path))?;
    let index = FtsIndex::open(&cli::index_path(&args.data_root, &args.index_path))?;

    let results = aggregate(&index, &store, &args.query)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("no results for '{}'", args.query);
        return Ok(());
    }

    for result in &results {
        println!(
            "[{}] {} ({})",
            result.result_type, result.law_title, result.law_slug
        );
        let snippet = result
            .highlight
            .get("content")
            .or_else(|| result.fields.get("content"))
            .map(|content| condense_whitespace(content))
            .unwrap_or_default();
        println!("    {snippet}");
    }
    Ok(())
}

/// Fan a query out to the three collections in fixed order, tag the hits,
/// and hydrate each with its law's title and slug via one batch lookup.
/// Empty queries short-circuit without touching the index. A hit whose law
/// is gone gets the sentinel title instead of failing the request; an
/// erroring collection query propagates.
pub(crate) fn aggregate(
    index: &dyn SearchIndex,
    store: &LawStore,
    query: &str,
) -> Result<Vec<SearchResult>> {
    if query.is_empty() {
        return Ok(Vec::new());
    }

    let options = SearchOptions::default();
    let mut results = Vec::new();

    for (collection, result_type) in [
        (SECTIONS, "Section"),
        (SCHEDULES, "Schedule"),
        (APPENDICES, "Appendix"),
    ] {
        let hits = index
            .search(collection, query, &options)
            .with_context(|| format!("search against '{collection}' failed"))?;
        for hit in hits {
            results.push(SearchResult {
                result_type,
                id: hit.id,
                law_id: hit.law_id,
                law_title: String::new(),
                law_slug: String::new(),
                fields: hit.fields,
                highlight: hit.formatted,
            });
        }
    }

    let law_ids: HashSet<i64> = results.iter().map(|result| result.law_id).collect();
    let law_ids: Vec<i64> = law_ids.into_iter().collect();
    let laws = store.law_summaries_by_ids(&law_ids)?;

    for result in &mut results {
        match laws.get(&result.law_id) {
            Some(law) => {
                result.law_title = law.title.clone();
                result.law_slug = law.slug.clone();
            }
            None => {
                result.law_title = LAW_NOT_FOUND.to_string();
                result.law_slug = String::new();
            }
        }
    }

    info!(query = %query, results = results.len(), "search complete");
    Ok(results)
}
