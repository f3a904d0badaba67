use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};

use crate::model::{
    AttachmentDetail, AttachmentIndexRow, ChapterDetail, DEFAULT_HEADING, ImportCounts, Law,
    LawDetail, LawSummary, NewLaw, ParsedRecord, PartDetail, SectionDetail, SectionIndexRow,
    StoreCounts,
};
use crate::util::now_utc_string;


const DB_SCHEMA_VERSION: &str = "1.0.0";

/// Relational store for laws and their descendant graphs.
pub struct LawStore {
    connection: Connection,
}

impl LawStore {
    pub fn open(path: &Path) -> Result<Self> {
        let connection = Connection::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        Self::from_connection(connection)
    }

    pub fn open_in_memory() -> Result<Self> {
        let connection =
            Connection::open_in_memory().context("failed to open in-memory store")?;
        Self::from_connection(connection)
    }

    fn from_connection(connection: Connection) -> Result<Self> {
        configure_connection(&connection)?;
        ensure_schema(&connection)?;
        Ok(Self { connection })
    }

    pub fn create_law(&self, new: &NewLaw) -> Result<i64> {
        let now = now_utc_string();
        self.connection
            .execute(
                "INSERT INTO laws
                   (title, slug, enactment_date, source_file, source_sha256,
                    extracted_text, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                params![
                    new.title,
                    new.slug,
                    new.enactment_date,
                    new.source_file,
                    new.source_sha256,
                    new.extracted_text,
                    now,
                ],
            )
            .with_context(|| format!("failed to insert law '{}'", new.title))?;
        Ok(self.connection.last_insert_rowid())
    }

    pub fn law_by_slug(&self, slug: &str) -> Result<Option<Law>> {
        self.connection
            .query_row(
                "SELECT law_id, title, slug, enactment_date, source_file, source_sha256,
                        extracted_text, prepared_text
                 FROM laws WHERE slug = ?1",
                params![slug],
                |row| {
                    Ok(Law {
                        law_id: row.get(0)?,
                        title: row.get(1)?,
                        slug: row.get(2)?,
                        enactment_date: row.get(3)?,
                        source_file: row.get(4)?,
                        source_sha256: row.get(5)?,
                        extracted_text: row.get(6)?,
                        prepared_text: row.get(7)?,
                    })
                },
            )
            .optional()
            .with_context(|| format!("failed to look up law by slug '{slug}'"))
    }

    /// Batch lookup used to hydrate search hits: one query for all distinct
    /// law ids carried by a result page.
    pub fn law_summaries_by_ids(&self, ids: &[i64]) -> Result<HashMap<i64, LawSummary>> {
        let mut out = HashMap::with_capacity(ids.len());
        if ids.is_empty() {
            return Ok(out);
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql =
            format!("SELECT law_id, title, slug FROM laws WHERE law_id IN ({placeholders})");
        let mut statement = self.connection.prepare(&sql)?;
        let rows = statement.query_map(rusqlite::params_from_iter(ids.iter()), |row| {
            Ok(LawSummary {
                law_id: row.get(0)?,
                title: row.get(1)?,
                slug: row.get(2)?,
            })
        })?;

        for row in rows {
            let summary = row.context("failed to read law summary row")?;
            out.insert(summary.law_id, summary);
        }
        Ok(out)
    }

    pub fn update_prepared_text(&self, law_id: i64, prepared_text: &str) -> Result<()> {
        let now = now_utc_string();
        let changed = self
            .connection
            .execute(
                "UPDATE laws SET prepared_text = ?1, updated_at = ?2 WHERE law_id = ?3",
                params![prepared_text, now, law_id],
            )
            .context("failed to update prepared text")?;
        anyhow::ensure!(changed == 1, "no law with id {law_id}");
        Ok(())
    }

    /// Destructive-replace import: deletes the law's entire descendant graph
    /// and rebuilds it from the parsed records inside one transaction. The
    /// law row itself is untouched. Any failure rolls everything back,
    /// including the delete.
    pub fn replace_descendants(
        &mut self,
        law_id: i64,
        records: &[ParsedRecord],
    ) -> Result<ImportCounts> {
        let tx = self
            .connection
            .transaction()
            .context("failed to begin import transaction")?;

        tx.execute("DELETE FROM parts WHERE law_id = ?1", params![law_id])?;
        tx.execute("DELETE FROM schedules WHERE law_id = ?1", params![law_id])?;
        tx.execute("DELETE FROM appendices WHERE law_id = ?1", params![law_id])?;

        let mut counts = ImportCounts::default();
        let mut part_ids: HashMap<String, i64> = HashMap::new();
        let mut chapter_ids: HashMap<(i64, String), i64> = HashMap::new();
        let mut section_order = 0_i64;
        let mut schedule_order = 0_i64;
        let mut appendix_order = 0_i64;

        for record in records {
            match record {
                ParsedRecord::Section {
                    part_heading,
                    chapter_heading,
                    number,
                    title,
                    content,
                } => {
                    let part_heading = or_default_heading(part_heading);
                    let chapter_heading = or_default_heading(chapter_heading);

                    let part_id = match part_ids.get(part_heading) {
                        Some(id) => *id,
                        None => {
                            let id = insert_part(&tx, law_id, part_heading, part_ids.len() as i64)?;
                            part_ids.insert(part_heading.to_string(), id);
                            counts.parts += 1;
                            id
                        }
                    };

                    let chapter_key = (part_id, chapter_heading.to_string());
                    let chapter_id = match chapter_ids.get(&chapter_key) {
                        Some(id) => *id,
                        None => {
                            let order = chapter_ids
                                .keys()
                                .filter(|(owner, _)| *owner == part_id)
                                .count() as i64;
                            let id = insert_chapter(&tx, part_id, chapter_heading, order)?;
                            chapter_ids.insert(chapter_key, id);
                            counts.chapters += 1;
                            id
                        }
                    };

                    tx.execute(
                        "INSERT INTO sections (chapter_id, number, title, content, order_index)
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                        params![chapter_id, number, title, content, section_order],
                    )
                    .with_context(|| format!("failed to insert section '{number}'"))?;
                    section_order += 1;
                    counts.sections += 1;
                }
                ParsedRecord::Schedule {
                    number,
                    title,
                    content,
                } => {
                    tx.execute(
                        "INSERT INTO schedules (law_id, number, title, content, order_index)
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                        params![law_id, number, title, content, schedule_order],
                    )
                    .with_context(|| format!("failed to insert schedule '{number}'"))?;
                    schedule_order += 1;
                    counts.schedules += 1;
                }
                ParsedRecord::Appendix {
                    number,
                    title,
                    content,
                } => {
                    tx.execute(
                        "INSERT INTO appendices (law_id, number, title, content, order_index)
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                        params![law_id, number, title, content, appendix_order],
                    )
                    .with_context(|| format!("failed to insert appendix '{number}'"))?;
                    appendix_order += 1;
                    counts.appendices += 1;
                }
            }
        }

        tx.commit().context("failed to commit import transaction")?;
        Ok(counts)
    }

    /// Full ordered tree for the detail view: parts, their chapters, their
    /// sections, plus document-level schedules and appendices.
    pub fn law_detail(&self, law: Law) -> Result<LawDetail> {
        let law_id = law.law_id;
        let mut parts = Vec::new();

        let mut part_statement = self.connection.prepare(
            "SELECT part_id, heading FROM parts WHERE law_id = ?1 ORDER BY order_index, part_id",
        )?;
        let part_rows = part_statement
            .query_map(params![law_id], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("failed to read parts")?;

        for (part_id, heading) in part_rows {
            let mut chapters = Vec::new();

            let mut chapter_statement = self.connection.prepare(
                "SELECT chapter_id, heading FROM chapters
                 WHERE part_id = ?1 ORDER BY order_index, chapter_id",
            )?;
            let chapter_rows = chapter_statement
                .query_map(params![part_id], |row| {
                    Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
                })?
                .collect::<Result<Vec<_>, _>>()
                .context("failed to read chapters")?;

            for (chapter_id, chapter_heading) in chapter_rows {
                let mut section_statement = self.connection.prepare(
                    "SELECT section_id, number, title, content FROM sections
                     WHERE chapter_id = ?1 ORDER BY order_index, section_id",
                )?;
                let sections = section_statement
                    .query_map(params![chapter_id], |row| {
                        Ok(SectionDetail {
                            section_id: row.get(0)?,
                            number: row.get(1)?,
                            title: row.get(2)?,
                            content: row.get(3)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()
                    .context("failed to read sections")?;

                chapters.push(ChapterDetail {
                    chapter_id,
                    heading: chapter_heading,
                    sections,
                });
            }

            parts.push(PartDetail {
                part_id,
                heading,
                chapters,
            });
        }

        let schedules = self.attachments(law_id, "schedules", "schedule_id")?;
        let appendices = self.attachments(law_id, "appendices", "appendix_id")?;

        Ok(LawDetail {
            law,
            parts,
            schedules,
            appendices,
        })
    }

    fn attachments(&self, law_id: i64, table: &str, id_column: &str) -> Result<Vec<AttachmentDetail>> {
        let sql = format!(
            "SELECT {id_column}, number, title, content FROM {table}
             WHERE law_id = ?1 ORDER BY order_index, {id_column}"
        );
        let mut statement = self.connection.prepare(&sql)?;
        let rows = statement
            .query_map(params![law_id], |row| {
                Ok(AttachmentDetail {
                    id: row.get(0)?,
                    number: row.get(1)?,
                    title: row.get(2)?,
                    content: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("failed to read {table}"))?;
        Ok(rows)
    }

    /// Every section with its full ancestry flattened, for index rebuilds.
    pub fn section_index_rows(&self) -> Result<Vec<SectionIndexRow>> {
        let mut statement = self.connection.prepare(
            "SELECT s.section_id, l.law_id, l.title, p.heading, c.heading,
                    s.number, s.title, s.content
             FROM sections s
             JOIN chapters c ON c.chapter_id = s.chapter_id
             JOIN parts p ON p.part_id = c.part_id
             JOIN laws l ON l.law_id = p.law_id
             ORDER BY l.law_id, s.order_index, s.section_id",
        )?;
        let rows = statement
            .query_map([], |row| {
                Ok(SectionIndexRow {
                    section_id: row.get(0)?,
                    law_id: row.get(1)?,
                    law_title: row.get(2)?,
                    part_heading: row.get(3)?,
                    chapter_heading: row.get(4)?,
                    number: row.get(5)?,
                    title: row.get(6)?,
                    content: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("failed to read section index rows")?;
        Ok(rows)
    }

    pub fn attachment_index_rows(&self, table: &str, id_column: &str) -> Result<Vec<AttachmentIndexRow>> {
        let sql = format!(
            "SELECT a.{id_column}, l.law_id, l.title, a.number, a.title, a.content
             FROM {table} a
             JOIN laws l ON l.law_id = a.law_id
             ORDER BY l.law_id, a.order_index, a.{id_column}"
        );
        let mut statement = self.connection.prepare(&sql)?;
        let rows = statement
            .query_map([], |row| {
                Ok(AttachmentIndexRow {
                    id: row.get(0)?,
                    law_id: row.get(1)?,
                    law_title: row.get(2)?,
                    number: row.get(3)?,
                    title: row.get(4)?,
                    content: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("failed to read {table} index rows"))?;
        Ok(rows)
    }

    pub fn counts(&self) -> Result<StoreCounts> {
        Ok(StoreCounts {
            laws: self.count_rows("laws")?,
            parts: self.count_rows("parts")?,
            chapters: self.count_rows("chapters")?,
            sections: self.count_rows("sections")?,
            schedules: self.count_rows("schedules")?,
            appendices: self.count_rows("appendices")?,
        })
    }

    fn count_rows(&self, table: &str) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {table}");
        self.connection
            .query_row(&sql, [], |row| row.get(0))
            .with_context(|| format!("failed to count rows in {table}"))
    }
}

fn or_default_heading(heading: &str) -> &str {
    if heading.trim().is_empty() {
        DEFAULT_HEADING
    } else {
        heading
    }
}

fn insert_part(
    tx: &rusqlite::Transaction<'_>,
    law_id: i64,
    heading: &str,
    order_index: i64,
) -> Result<i64> {
    tx.execute(
        "INSERT INTO parts (law_id, heading, order_index) VALUES (?1, ?2, ?3)",
        params![law_id, heading, order_index],
    )
    .with_context(|| format!("failed to insert part '{heading}'"))?;
    Ok(tx.last_insert_rowid())
}

fn insert_chapter(
    tx: &rusqlite::Transaction<'_>,
    part_id: i64,
    heading: &str,
    order_index: i64,
) -> Result<i64> {
    tx.execute(
        "INSERT INTO chapters (part_id, heading, order_index) VALUES (?1, ?2, ?3)",
        params![part_id, heading, order_index],
    )
    .with_context(|| format!("failed to insert chapter '{heading}'"))?;
    Ok(tx.last_insert_rowid())
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    // Cascading deletes on the law -> part -> chapter -> section chain rely
    // on this being set per connection.
    connection
        .pragma_update(None, "foreign_keys", "ON")
        .context("failed to set foreign_keys=ON")?;
    Ok(())
}

fn ensure_schema(connection: &Connection) -> Result<()> {
    connection.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS laws (
          law_id INTEGER PRIMARY KEY,
          title TEXT NOT NULL UNIQUE,
          slug TEXT NOT NULL UNIQUE,
          enactment_date TEXT,
          source_file TEXT,
          source_sha256 TEXT,
          extracted_text TEXT,
          prepared_text TEXT,
          created_at TEXT NOT NULL,
          updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS parts (
          part_id INTEGER PRIMARY KEY,
          law_id INTEGER NOT NULL REFERENCES laws(law_id) ON DELETE CASCADE,
          heading TEXT NOT NULL,
          order_index INTEGER NOT NULL DEFAULT 0,
          UNIQUE(law_id, heading)
        );

        CREATE TABLE IF NOT EXISTS chapters (
          chapter_id INTEGER PRIMARY KEY,
          part_id INTEGER NOT NULL REFERENCES parts(part_id) ON DELETE CASCADE,
          heading TEXT NOT NULL,
          order_index INTEGER NOT NULL DEFAULT 0,
          UNIQUE(part_id, heading)
        );

        CREATE TABLE IF NOT EXISTS sections (
          section_id INTEGER PRIMARY KEY,
          chapter_id INTEGER NOT NULL REFERENCES chapters(chapter_id) ON DELETE CASCADE,
          number TEXT NOT NULL,
          title TEXT NOT NULL DEFAULT '',
          content TEXT NOT NULL DEFAULT '',
          order_index INTEGER NOT NULL DEFAULT 0,
          UNIQUE(chapter_id, number)
        );

        CREATE TABLE IF NOT EXISTS schedules (
          schedule_id INTEGER PRIMARY KEY,
          law_id INTEGER NOT NULL REFERENCES laws(law_id) ON DELETE CASCADE,
          number TEXT NOT NULL,
          title TEXT NOT NULL DEFAULT '',
          content TEXT NOT NULL DEFAULT '',
          order_index INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS appendices (
          appendix_id INTEGER PRIMARY KEY,
          law_id INTEGER NOT NULL REFERENCES laws(law_id) ON DELETE CASCADE,
          number TEXT NOT NULL,
          title TEXT NOT NULL DEFAULT '',
          content TEXT NOT NULL DEFAULT '',
          order_index INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_parts_law ON parts(law_id, order_index);
        CREATE INDEX IF NOT EXISTS idx_chapters_part ON chapters(part_id, order_index);
        CREATE INDEX IF NOT EXISTS idx_sections_chapter ON sections(chapter_id, order_index);
        CREATE INDEX IF NOT EXISTS idx_schedules_law ON schedules(law_id, order_index);
        CREATE INDEX IF NOT EXISTS idx_appendices_law ON appendices(law_id, order_index);
        ",
    )?;

    let now = now_utc_string();
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [DB_SCHEMA_VERSION],
    )?;
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_updated_at', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [now],
    )?;

    Ok(())
}
