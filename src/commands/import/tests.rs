use super::*;
use crate::model::NewLaw;

fn law_with_text(store: &LawStore, text: &str) -> Law {
    store
        .create_law(&NewLaw {
            title: "Test Law".to_string(),
            slug: "test-law".to_string(),
            enactment_date: None,
            source_file: None,
            source_sha256: None,
            extracted_text: None,
        })
        .unwrap();
    let law = store.law_by_slug("test-law").unwrap().unwrap();
    store.update_prepared_text(law.law_id, text).unwrap();
    store.law_by_slug("test-law").unwrap().unwrap()
}

#[test]
fn parses_simple_section_with_full_ancestry() {
    let records = parse_tagged_text(
        "@PART PART I - PRELIMINARY\n\
         @CHAPTER CHAPTER 1\n\
         @SECTION S.1\n\
         @TITLE Citation\n\
         This Act may be cited as the Test Act, 2024.",
    );

    assert_eq!(
        records,
        vec![ParsedRecord::Section {
            part_heading: "PART I - PRELIMINARY".to_string(),
            chapter_heading: "CHAPTER 1".to_string(),
            number: "S.1".to_string(),
            title: "Citation".to_string(),
            content: "This Act may be cited as the Test Act, 2024.".to_string(),
        }]
    );
}

#[test]
fn record_count_matches_directive_count() {
    let records = parse_tagged_text(
        "@PART PART I\n\
         @CHAPTER CHAPTER 1\n\
         @SECTION S.1\n\
         Section content.\n\
         @SECTION S.2\n\
         More content.\n\
         @SCHEDULE First Schedule\n\
         Schedule content.\n\
         @APPENDIX Appendix A\n\
         Appendix content.",
    );
    assert_eq!(records.len(), 4);
}

#[test]
fn new_part_resets_current_chapter() {
    let records = parse_tagged_text(
        "@PART PART I\n\
         @CHAPTER CHAPTER 1\n\
         @SECTION S.1\n\
         a\n\
         @PART PART II\n\
         @SECTION S.2\n\
         b",
    );

    match &records[1] {
        ParsedRecord::Section {
            part_heading,
            chapter_heading,
            ..
        } => {
            assert_eq!(part_heading, "PART II");
            // Chapter label was reset when PART II opened.
            assert_eq!(chapter_heading, "");
        }
        other => panic!("expected section, got {other:?}"),
    }
}

#[test]
fn content_lines_join_with_newlines_and_trim_ends() {
    let records = parse_tagged_text(
        "@SECTION S.1\n\n(1) In this Act:\n    (a) indented clause;\n\n(2) Second subsection.\n\n",
    );

    match &records[0] {
        ParsedRecord::Section { content, .. } => {
            assert_eq!(
                content,
                "(1) In this Act:\n    (a) indented clause;\n\n(2) Second subsection."
            );
        }
        other => panic!("expected section, got {other:?}"),
    }
}

#[test]
fn title_before_any_record_is_inert() {
    let records = parse_tagged_text(
        "@TITLE Stray title\n\
         Stray prose before any record.\n\
         @SECTION S.1\n\
         Body.",
    );

    assert_eq!(records.len(), 1);
    match &records[0] {
        ParsedRecord::Section { title, content, .. } => {
            assert_eq!(title, "");
            assert_eq!(content, "Body.");
        }
        other => panic!("expected section, got {other:?}"),
    }
}

#[test]
fn section_without_title_gets_empty_title() {
    let records = parse_tagged_text("@SECTION S.1\nSection content without title.");
    match &records[0] {
        ParsedRecord::Section { title, .. } => assert_eq!(title, ""),
        other => panic!("expected section, got {other:?}"),
    }
}

#[test]
fn schedule_and_appendix_capture_number_title_content() {
    let records = parse_tagged_text(
        "@SCHEDULE First Schedule\n\
         @TITLE List of Authorities\n\
         1. Authority A\n\
         2. Authority B\n\
         @APPENDIX Appendix A\n\
         @TITLE Application Forms\n\
         Form 1: Initial Application",
    );

    assert_eq!(
        records[0],
        ParsedRecord::Schedule {
            number: "First Schedule".to_string(),
            title: "List of Authorities".to_string(),
            content: "1. Authority A\n2. Authority B".to_string(),
        }
    );
    assert_eq!(
        records[1],
        ParsedRecord::Appendix {
            number: "Appendix A".to_string(),
            title: "Application Forms".to_string(),
            content: "Form 1: Initial Application".to_string(),
        }
    );
}

#[test]
fn tag_prefix_requires_word_boundary() {
    // "@PARTICULARS" is body text, not a @PART directive.
    let records = parse_tagged_text("@SECTION S.1\n@PARTICULARS of the claim follow.");
    match &records[0] {
        ParsedRecord::Section { content, .. } => {
            assert_eq!(content, "@PARTICULARS of the claim follow.");
        }
        other => panic!("expected section, got {other:?}"),
    }
    assert_eq!(records.len(), 1);
}

#[test]
fn directive_lines_are_recognized_with_surrounding_whitespace() {
    let records = parse_tagged_text("  @SECTION S.1  \n  @TITLE Citation  \nBody.");
    match &records[0] {
        ParsedRecord::Section { number, title, .. } => {
            assert_eq!(number, "S.1");
            assert_eq!(title, "Citation");
        }
        other => panic!("expected section, got {other:?}"),
    }
}

#[test]
fn import_persists_parsed_graph_end_to_end() {
    let mut store = LawStore::open_in_memory().unwrap();
    let law = law_with_text(
        &store,
        "@PART PART I\n@CHAPTER CH 1\n@SECTION S.1\n@TITLE Citation\nBody text.",
    );

    let counts = import_prepared_text(&mut store, &law).unwrap();
    assert_eq!(counts.parts, 1);
    assert_eq!(counts.chapters, 1);
    assert_eq!(counts.sections, 1);

    let detail = store.law_detail(law).unwrap();
    assert_eq!(detail.parts[0].heading, "PART I");
    assert_eq!(detail.parts[0].chapters[0].heading, "CH 1");
    let section = &detail.parts[0].chapters[0].sections[0];
    assert_eq!(section.number, "S.1");
    assert_eq!(section.title, "Citation");
    assert_eq!(section.content, "Body text.");
}

#[test]
fn import_defaults_missing_headings_to_main() {
    let mut store = LawStore::open_in_memory().unwrap();
    let law = law_with_text(&store, "@SECTION S.1\nSection content.");

    import_prepared_text(&mut store, &law).unwrap();

    let detail = store.law_detail(law).unwrap();
    assert_eq!(detail.parts[0].heading, "Main");
    assert_eq!(detail.parts[0].chapters[0].heading, "Main");
}

#[test]
fn import_rejects_empty_prepared_text_without_side_effects() {
    let mut store = LawStore::open_in_memory().unwrap();
    let law = law_with_text(&store, "@SECTION S.1\nOld body.");
    import_prepared_text(&mut store, &law).unwrap();

    let mut blank = law.clone();
    blank.prepared_text = Some("   \n  ".to_string());
    let err = import_prepared_text(&mut store, &blank).unwrap_err();
    assert!(err.to_string().contains("AI-prepared text"));

    // Prior graph untouched.
    let counts = store.counts().unwrap();
    assert_eq!(counts.sections, 1);
}

#[test]
fn reimport_replaces_previous_graph() {
    let mut store = LawStore::open_in_memory().unwrap();
    let law = law_with_text(
        &store,
        "@PART OLD PART\n@SECTION 1\nOld content.\n@SCHEDULE Old\nOld schedule.",
    );
    import_prepared_text(&mut store, &law).unwrap();

    store
        .update_prepared_text(law.law_id, "@PART NEW PART\n@SECTION S.1\nNew content.")
        .unwrap();
    let law = store.law_by_slug("test-law").unwrap().unwrap();
    import_prepared_text(&mut store, &law).unwrap();

    let counts = store.counts().unwrap();
    assert_eq!(counts.parts, 1);
    assert_eq!(counts.sections, 1);
    assert_eq!(counts.schedules, 0);

    let detail = store.law_detail(law).unwrap();
    assert_eq!(detail.parts[0].heading, "NEW PART");
}
