use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::ai::{CLEANING_INSTRUCTION, GeminiCleaner, TextCleaner};
use crate::cli::{self, CleanArgs};
use crate::store::LawStore;
use crate::util::ensure_directory;

pub fn run(args: CleanArgs) -> Result<()> {
    let Some(api_key) = args.api_key.clone() else {
        bail!("no AI API key configured; pass --api-key or set GEMINI_API_KEY");
    };
    let cleaner = GeminiCleaner::new(api_key, args.model.clone());

    ensure_directory(&args.data_root)?;
    let store = LawStore::open(&cli::db_path(&args.data_root, &args.db_path))?;
    clean_law(&store, &cleaner, &args.slug)
}

/// Run the AI cleaning step for one law: send its extracted text with the
/// tagging instruction and store the result as its prepared text. A law with
/// no extracted text is skipped with a warning, no AI call made.
pub(crate) fn clean_law(store: &LawStore, cleaner: &dyn TextCleaner, slug: &str) -> Result<()> {
    let law = store
        .law_by_slug(slug)?
        .with_context(|| format!("no law with slug '{slug}'"))?;

    let extracted = law.extracted_text.as_deref().unwrap_or("");
    if extracted.trim().is_empty() {
        warn!(slug = %law.slug, "law has no extracted text; skipping AI cleaning");
        return Ok(());
    }

    let cleaned = cleaner
        .clean(CLEANING_INSTRUCTION, extracted)
        .with_context(|| format!("AI cleaning failed for law '{slug}'"))?;
    store.update_prepared_text(law.law_id, &cleaned)?;

    info!(slug = %law.slug, chars = cleaned.len(), "prepared text updated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::model::NewLaw;

    struct FakeCleaner {
        calls: RefCell<usize>,
        reply: String,
    }

    impl TextCleaner for FakeCleaner {
        fn clean(&self, _system_instruction: &str, _raw_text: &str) -> Result<String> {
            *self.calls.borrow_mut() += 1;
            Ok(self.reply.clone())
        }
    }

    fn store_with_law(extracted_text: Option<&str>) -> LawStore {
        let store = LawStore::open_in_memory().unwrap();
        store
            .create_law(&NewLaw {
                title: "Test Law".to_string(),
                slug: "test-law".to_string(),
                enactment_date: None,
                source_file: None,
                source_sha256: None,
                extracted_text: extracted_text.map(ToOwned::to_owned),
            })
            .unwrap();
        store
    }

    #[test]
    fn cleaning_stores_the_tagged_reply() {
        let store = store_with_law(Some("Raw extracted text from PDF"));
        let cleaner = FakeCleaner {
            calls: RefCell::new(0),
            reply: "@SECTION S.1\n@TITLE Citation\nCleaned text.".to_string(),
        };

        clean_law(&store, &cleaner, "test-law").unwrap();

        assert_eq!(*cleaner.calls.borrow(), 1);
        let law = store.law_by_slug("test-law").unwrap().unwrap();
        assert_eq!(
            law.prepared_text.as_deref(),
            Some("@SECTION S.1\n@TITLE Citation\nCleaned text.")
        );
    }

    #[test]
    fn law_without_extracted_text_is_skipped_without_ai_call() {
        let store = store_with_law(None);
        let cleaner = FakeCleaner {
            calls: RefCell::new(0),
            reply: String::new(),
        };

        clean_law(&store, &cleaner, "test-law").unwrap();

        assert_eq!(*cleaner.calls.borrow(), 0);
        let law = store.law_by_slug("test-law").unwrap().unwrap();
        assert!(law.prepared_text.is_none());
    }

    #[test]
    fn unknown_slug_is_an_error() {
        let store = store_with_law(Some("text"));
        let cleaner = FakeCleaner {
            calls: RefCell::new(0),
            reply: String::new(),
        };
        assert!(clean_law(&store, &cleaner, "missing").is_err());
    }
}
