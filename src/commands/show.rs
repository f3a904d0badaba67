use anyhow::{Context, Result};

use crate::cli::{self, ShowArgs};
use crate::store::LawStore;
use crate::util::ensure_directory;

pub fn run(args: ShowArgs) -> Result<()> {
    ensure_directory(&args.data_root)?;
    let store = LawStore::open(&cli::db_path(&args.data_root, &args.db_path))?;

    let law = store
        .law_by_slug(&args.slug)?
        .with_context(|| format!("no law with slug '{}'", args.slug))?;
    let detail = store.law_detail(law)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&detail)?);
        return Ok(());
    }

    println!("{}", detail.law.title);
    if let Some(date) = detail.law.enactment_date {
        println!("Enacted: {date}");
    }

    for part in &detail.parts {
        println!("\n{}", part.heading);
        for chapter in &part.chapters {
            println!("  {}", chapter.heading);
            for section in &chapter.sections {
                if section.title.is_empty() {
                    println!("    {}", section.number);
                } else {
                    println!("    {} - {}", section.number, section.title);
                }
                for line in section.content.lines() {
                    println!("      {line}");
                }
            }
        }
    }

    for (label, attachments) in [("Schedules", &detail.schedules), ("Appendices", &detail.appendices)] {
        if attachments.is_empty() {
            continue;
        }
        println!("\n{label}:");
        for attachment in attachments {
            if attachment.title.is_empty() {
                println!("  {}", attachment.number);
            } else {
                println!("  {} - {}", attachment.number, attachment.title);
            }
            for line in attachment.content.lines() {
                println!("    {line}");
            }
        }
    }

    Ok(())
}
