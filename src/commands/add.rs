use std::fs;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::{self, AddArgs};
use crate::model::NewLaw;
use crate::pdf;
use crate::store::LawStore;
use crate::util::{ensure_directory, sha256_file, slugify};

pub fn run(args: AddArgs) -> Result<()> {
    ensure_directory(&args.data_root)?;
    let store = LawStore::open(&cli::db_path(&args.data_root, &args.db_path))?;

    let slug = args.slug.clone().unwrap_or_else(|| slugify(&args.title));

    let mut source_file = None;
    let mut source_sha256 = None;
    let mut extracted_text = None;
    if let Some(pdf_path) = &args.pdf {
        let bytes = fs::read(pdf_path)
            .with_context(|| format!("failed to read {}", pdf_path.display()))?;
        let text = pdf::extract_text(&bytes);
        if text.starts_with("Error extracting text:") {
            warn!(pdf = %pdf_path.display(), "text extraction failed; error kept in extracted text");
        }
        source_file = Some(pdf_path.display().to_string());
        source_sha256 = Some(sha256_file(pdf_path)?);
        extracted_text = Some(text);
    }

    let law_id = store.create_law(&NewLaw {
        title: args.title.clone(),
        slug: slug.clone(),
        enactment_date: args.enactment_date,
        source_file,
        source_sha256,
        extracted_text,
    })?;

    info!(law_id, slug = %slug, "law registered");
    Ok(())
}
