use chrono::NaiveDate;
use serde::Serialize;

/// Heading used when a section arrives with no enclosing @PART or @CHAPTER.
pub const DEFAULT_HEADING: &str = "Main";

#[derive(Debug, Clone, Serialize)]
pub struct Law {
    pub law_id: i64,
    pub title: String,
    pub slug: String,
    pub enactment_date: Option<NaiveDate>,
    pub source_file: Option<String>,
    pub source_sha256: Option<String>,
    pub extracted_text: Option<String>,
    pub prepared_text: Option<String>,
}

/// The subset of law fields search hits are hydrated with.
#[derive(Debug, Clone, Serialize)]
pub struct LawSummary {
    pub law_id: i64,
    pub title: String,
    pub slug: String,
}

#[derive(Debug, Clone)]
pub struct NewLaw {
    pub title: String,
    pub slug: String,
    pub enactment_date: Option<NaiveDate>,
    pub source_file: Option<String>,
    pub source_sha256: Option<String>,
    pub extracted_text: Option<String>,
}

/// One record produced by the tagged-text parser. A section carries the part
/// and chapter labels that were current when its @SECTION directive was seen;
/// empty labels materialize as [`DEFAULT_HEADING`] at persist time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedRecord {
    Section {
        part_heading: String,
        chapter_heading: String,
        number: String,
        title: String,
        content: String,
    },
    Schedule {
        number: String,
        title: String,
        content: String,
    },
    Appendix {
        number: String,
        title: String,
        content: String,
    },
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ImportCounts {
    pub parts: usize,
    pub chapters: usize,
    pub sections: usize,
    pub schedules: usize,
    pub appendices: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LawDetail {
    pub law: Law,
    pub parts: Vec<PartDetail>,
    pub schedules: Vec<AttachmentDetail>,
    pub appendices: Vec<AttachmentDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PartDetail {
    pub part_id: i64,
    pub heading: String,
    pub chapters: Vec<ChapterDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChapterDetail {
    pub chapter_id: i64,
    pub heading: String,
    pub sections: Vec<SectionDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionDetail {
    pub section_id: i64,
    pub number: String,
    pub title: String,
    pub content: String,
}

/// A schedule or appendix attached directly to a law.
#[derive(Debug, Clone, Serialize)]
pub struct AttachmentDetail {
    pub id: i64,
    pub number: String,
    pub title: String,
    pub content: String,
}

/// Flattened section row with its full ancestry, as fed to the search index.
#[derive(Debug, Clone)]
pub struct SectionIndexRow {
    pub section_id: i64,
    pub law_id: i64,
    pub law_title: String,
    pub part_heading: String,
    pub chapter_heading: String,
    pub number: String,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct AttachmentIndexRow {
    pub id: i64,
    pub law_id: i64,
    pub law_title: String,
    pub number: String,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StoreCounts {
    pub laws: i64,
    pub parts: i64,
    pub chapters: i64,
    pub sections: i64,
    pub schedules: i64,
    pub appendices: i64,
}
