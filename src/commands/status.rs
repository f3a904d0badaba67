use anyhow::Result;

use crate::cli::{self, StatusArgs};
use crate::store::LawStore;
use crate::util::ensure_directory;

pub fn run(args: StatusArgs) -> Result<()> {
    ensure_directory(&args.data_root)?;
    let db_path = cli::db_path(&args.data_root, &args.db_path);
    let index_path = cli::index_path(&args.data_root, &args.index_path);

    let store = LawStore::open(&db_path)?;
    let counts = store.counts()?;

    println!("store: {}", db_path.display());
    println!("  laws:       {}", counts.laws);
    println!("  parts:      {}", counts.parts);
    println!("  chapters:   {}", counts.chapters);
    println!("  sections:   {}", counts.sections);
    println!("  schedules:  {}", counts.schedules);
    println!("  appendices: {}", counts.appendices);

    if index_path.exists() {
        println!("index: {}", index_path.display());
    } else {
        println!("index: {} (not built; run reindex)", index_path.display());
    }

    Ok(())
}
