use anyhow::{Context, Result, bail};
use tracing::info;

use crate::cli::{self, ImportArgs};
use crate::model::{ImportCounts, Law, ParsedRecord};
use crate::store::LawStore;
use crate::util::ensure_directory;

#[cfg(test)]
mod tests;

pub fn run(args: ImportArgs) -> Result<()> {
    ensure_directory(&args.data_root)?;
    let db_path = cli::db_path(&args.data_root, &args.db_path);
    let mut store = LawStore::open(&db_path)?;

    let law = store
        .law_by_slug(&args.slug)?
        .with_context(|| format!("no law with slug '{}'", args.slug))?;

    let counts = import_prepared_text(&mut store, &law)?;
    info!(
        slug = %law.slug,
        parts = counts.parts,
        chapters = counts.chapters,
        sections = counts.sections,
        schedules = counts.schedules,
        appendices = counts.appendices,
        "import complete"
    );
    Ok(())
}

/// Parse a law's AI-prepared tagged text and replace its descendant graph
/// with the result. Rejects empty text before touching the store; any
/// persistence failure rolls the whole replacement back.
pub(crate) fn import_prepared_text(store: &mut LawStore, law: &Law) -> Result<ImportCounts> {
    let text = law.prepared_text.as_deref().unwrap_or("");
    if text.trim().is_empty() {
        bail!(
            "law '{}' has no AI-prepared text to import; run the clean step first",
            law.slug
        );
    }

    let records = parse_tagged_text(text);
    store
        .replace_descendants(law.law_id, &records)
        .with_context(|| format!("import failed for law '{}'", law.slug))
}

/// One recognized directive line, trimmed of its tag and surrounding
/// whitespace.
#[derive(Debug, PartialEq, Eq)]
enum Directive<'a> {
    Part(&'a str),
    Chapter(&'a str),
    Section(&'a str),
    Title(&'a str),
    Schedule(&'a str),
    Appendix(&'a str),
}

fn classify(line: &str) -> Option<Directive<'_>> {
    let trimmed = line.trim();
    if let Some(rest) = tag_rest(trimmed, "@PART") {
        return Some(Directive::Part(rest));
    }
    if let Some(rest) = tag_rest(trimmed, "@CHAPTER") {
        return Some(Directive::Chapter(rest));
    }
    if let Some(rest) = tag_rest(trimmed, "@SECTION") {
        return Some(Directive::Section(rest));
    }
    if let Some(rest) = tag_rest(trimmed, "@TITLE") {
        return Some(Directive::Title(rest));
    }
    if let Some(rest) = tag_rest(trimmed, "@SCHEDULE") {
        return Some(Directive::Schedule(rest));
    }
    if let Some(rest) = tag_rest(trimmed, "@APPENDIX") {
        return Some(Directive::Appendix(rest));
    }
    None
}

/// Exact-prefix tag match: the tag must be followed by whitespace or end of
/// line, so `@PARTICULARS` is body text, not a directive.
fn tag_rest<'a>(line: &'a str, tag: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(tag)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

/// The record currently being built. A section freezes the part and chapter
/// labels in force when its @SECTION directive was seen.
#[derive(Debug)]
enum OpenRecord {
    Section {
        part_heading: String,
        chapter_heading: String,
        number: String,
        title: String,
    },
    Schedule {
        number: String,
        title: String,
    },
    Appendix {
        number: String,
        title: String,
    },
}

impl OpenRecord {
    fn set_title(&mut self, value: &str) {
        match self {
            Self::Section { title, .. }
            | Self::Schedule { title, .. }
            | Self::Appendix { title, .. } => *title = value.to_string(),
        }
    }

    fn into_record(self, content: String) -> ParsedRecord {
        match self {
            Self::Section {
                part_heading,
                chapter_heading,
                number,
                title,
            } => ParsedRecord::Section {
                part_heading,
                chapter_heading,
                number,
                title,
                content,
            },
            Self::Schedule { number, title } => ParsedRecord::Schedule {
                number,
                title,
                content,
            },
            Self::Appendix { number, title } => ParsedRecord::Appendix {
                number,
                title,
                content,
            },
        }
    }
}

#[derive(Debug, Default)]
struct TaggedTextParser {
    current_part: String,
    current_chapter: String,
    open: Option<OpenRecord>,
    buffer: Vec<String>,
    records: Vec<ParsedRecord>,
}

impl TaggedTextParser {
    /// The only transition that emits a record: joins the buffered content
    /// lines, trims the ends, and closes the open record if there is one.
    fn flush(&mut self) {
        let content = self.buffer.join("\n").trim().to_string();
        self.buffer.clear();
        if let Some(open) = self.open.take() {
            self.records.push(open.into_record(content));
        }
    }

    fn feed(&mut self, line: &str) {
        match classify(line) {
            Some(Directive::Part(label)) => {
                self.flush();
                self.current_part = label.to_string();
                self.current_chapter.clear();
            }
            Some(Directive::Chapter(label)) => {
                self.flush();
                self.current_chapter = label.to_string();
            }
            Some(Directive::Section(number)) => {
                self.flush();
                self.open = Some(OpenRecord::Section {
                    part_heading: self.current_part.clone(),
                    chapter_heading: self.current_chapter.clone(),
                    number: number.to_string(),
                    title: String::new(),
                });
            }
            Some(Directive::Schedule(number)) => {
                self.flush();
                self.open = Some(OpenRecord::Schedule {
                    number: number.to_string(),
                    title: String::new(),
                });
            }
            Some(Directive::Appendix(number)) => {
                self.flush();
                self.open = Some(OpenRecord::Appendix {
                    number: number.to_string(),
                    title: String::new(),
                });
            }
            Some(Directive::Title(value)) => {
                // Mutates the open record only; inert when nothing is open.
                if let Some(open) = &mut self.open {
                    open.set_title(value);
                }
            }
            None => {
                // Prose before the first record-opening directive is dropped.
                if self.open.is_some() {
                    self.buffer.push(line.to_string());
                }
            }
        }
    }
}

/// Single forward pass over the tagged text, producing one record per
/// @SECTION/@SCHEDULE/@APPENDIX directive.
pub(crate) fn parse_tagged_text(text: &str) -> Vec<ParsedRecord> {
    let mut parser = TaggedTextParser::default();
    for line in text.lines() {
        parser.feed(line);
    }
    parser.flush();
    parser.records
}
