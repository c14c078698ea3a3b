use serde_json::json;

use resume_spec::{
    AnswerSet, ExportMode, ListFragment, ListMode, SectionBody, SectionKind, Settings, Theme,
    export_html, render, render_list_fragment, render_text,
};

fn fixture(name: &str) -> &'static str {
    match name {
        "complete_answers" => include_str!("../tests/fixtures/complete_answers.json"),
        _ => panic!("unknown fixture {}", name),
    }
}

fn complete_answers() -> AnswerSet {
    serde_json::from_str(fixture("complete_answers")).expect("deserialize")
}

#[test]
fn render_emits_sections_in_document_order() {
    let document = render(&complete_answers(), &Settings::default());

    assert_eq!(
        document.kinds(),
        vec![
            SectionKind::Heading,
            SectionKind::Summary,
            SectionKind::Education,
            SectionKind::Experience,
            SectionKind::Achievements,
            SectionKind::Skills,
            SectionKind::Hobbies,
            SectionKind::Languages,
            SectionKind::PersonalInfo,
        ]
    );
}

#[test]
fn render_omits_sections_without_data() {
    let answers: AnswerSet = serde_json::from_value(json!({
        "name": "Grace Hopper",
        "education": [],
        "projects": [],
        "skills": " , ",
        "gender": ""
    }))
    .expect("answers");

    let document = render(&answers, &Settings::default());

    assert_eq!(document.kinds(), vec![SectionKind::Heading]);
}

#[test]
fn header_collects_contacts_links_and_photo() {
    let document = render(&complete_answers(), &Settings::default());
    let section = document.section(SectionKind::Heading).expect("header");
    let SectionBody::Header(header) = &section.body else {
        panic!("expected header body");
    };

    assert_eq!(header.name, "Ada Lovelace");
    assert_eq!(header.contacts.len(), 3);
    assert_eq!(header.links.len(), 1);
    assert_eq!(header.links[0].label, "LinkedIn");
    assert!(header.photo.is_some());
}

#[test]
fn photo_requires_an_image_data_uri() {
    let answers: AnswerSet = serde_json::from_value(json!({
        "name": "Ada",
        "profilePic": "javascript:alert(1)"
    }))
    .expect("answers");

    let document = render(&answers, &Settings::default());
    let SectionBody::Header(header) = &document.sections[0].body else {
        panic!("expected header body");
    };
    assert!(header.photo.is_none());
}

#[test]
fn experience_entries_carry_dates_and_description() {
    let document = render(&complete_answers(), &Settings::default());
    let section = document.section(SectionKind::Experience).expect("experience");
    let SectionBody::Entries { entries } = &section.body else {
        panic!("expected entries");
    };

    assert_eq!(entries[0].title, "Translator");
    assert_eq!(entries[0].organization.as_deref(), Some("Scientific Memoirs"));
    assert_eq!(entries[0].dates.as_deref(), Some("1842 – 1843"));
    assert_eq!(
        entries[0].description.as_deref(),
        Some("Annotated the Analytical Engine paper.")
    );
}

#[test]
fn education_entries_list_score_and_courses() {
    let mut value: serde_json::Value =
        serde_json::from_str(fixture("complete_answers")).expect("fixture");
    value["education"][0]["score"] = json!("9.1");
    let answers: AnswerSet = serde_json::from_value(value).expect("answers");

    let document = render(&answers, &Settings::default());
    let section = document.section(SectionKind::Education).expect("education");
    let SectionBody::Entries { entries } = &section.body else {
        panic!("expected entries");
    };

    assert_eq!(
        entries[0].details,
        vec![
            "CGPA/Percentage: 9.1".to_string(),
            "Relevant Courses: Calculus, Logic".to_string(),
        ]
    );
    assert!(render_text(&document).contains("Relevant Courses: Calculus, Logic"));
}

#[test]
fn list_mode_toggle_replaces_only_that_fragment() {
    let answers = complete_answers();
    let original = render(&answers, &Settings::default());
    let mut document = original.clone();

    assert!(document.apply_list_mode(&answers, "skills", ListMode::Inline));

    for (before, after) in original.sections.iter().zip(&document.sections) {
        if before.kind == SectionKind::Skills {
            assert_eq!(
                after.body,
                SectionBody::List {
                    field: "skills".into(),
                    fragment: ListFragment::Inline {
                        text: "Mathematics, Poetry, Analysis".into(),
                    },
                }
            );
        } else {
            assert_eq!(before, after);
        }
    }

    let once = document.clone();
    assert!(document.apply_list_mode(&answers, "skills", ListMode::Inline));
    assert_eq!(document, once);
}

#[test]
fn list_mode_on_missing_field_changes_nothing() {
    let answers: AnswerSet = serde_json::from_value(json!({ "name": "Ada" })).expect("answers");
    let mut document = render(&answers, &Settings::default());
    let before = document.clone();

    assert!(!document.apply_list_mode(&answers, "hobbies", ListMode::Inline));
    assert_eq!(document, before);
    assert_eq!(
        render_list_fragment(&answers, "hobbies", ListMode::Bulleted),
        None
    );
}

#[test]
fn settings_list_modes_drive_initial_render() {
    let mut settings = Settings::default();
    settings.toggle_list_mode("languages");

    let document = render(&complete_answers(), &settings);
    let section = document.section(SectionKind::Languages).expect("languages");

    assert_eq!(
        section.body,
        SectionBody::List {
            field: "languages".into(),
            fragment: ListFragment::Inline {
                text: "English, French".into(),
            },
        }
    );
}

#[test]
fn render_text_lists_headings_and_bullets() {
    let text = render_text(&render(&complete_answers(), &Settings::default()));

    assert!(text.starts_with("ADA LOVELACE"));
    assert!(text.contains("WORK EXPERIENCE"));
    assert!(text.contains("- First published algorithm"));
    assert!(text.contains("Nationality: British"));
}

#[test]
fn export_escapes_answer_markup() {
    let answers: AnswerSet = serde_json::from_value(json!({
        "name": "<script>alert('x')</script>",
        "summary": "Fish & chips"
    }))
    .expect("answers");

    let html = export_html(
        &render(&answers, &Settings::default()),
        &Settings::default(),
        ExportMode::View,
    )
    .expect("export");

    assert!(!html.contains("<script>alert"));
    assert!(html.contains("&lt;script&gt;"));
    assert!(html.contains("Fish &amp; chips"));
    assert!(!html.contains("window.print()"));
}

#[test]
fn export_applies_settings() {
    let mut settings = Settings::default();
    settings.toggle_theme();
    settings.set_font_family("Open Sans, sans-serif");
    settings.set_line_height(2.0);
    settings.toggle_image_align();
    assert_eq!(settings.theme, Theme::Dark);

    let html = export_html(
        &render(&complete_answers(), &settings),
        &settings,
        ExportMode::Print,
    )
    .expect("export");

    assert!(html.contains(r#"<body class="dark">"#));
    assert!(html.contains("font-family: Open Sans, sans-serif;"));
    assert!(html.contains("line-height: 2;"));
    assert!(html.contains("fonts.googleapis.com/css2?family=Open+Sans"));
    assert!(html.contains(r#"class="photo right""#));
    assert!(html.contains("window.print()"));
}
