use serde::Serialize;

use crate::{
    answers::{AnswerSet, Record},
    image::is_image_data_uri,
    settings::{ImageAlign, ListMode, Settings},
};

/// Logical sections in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Heading,
    Summary,
    Education,
    Experience,
    Projects,
    Certifications,
    Achievements,
    Skills,
    Hobbies,
    Languages,
    PersonalInfo,
}

impl SectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::Heading => "heading",
            SectionKind::Summary => "summary",
            SectionKind::Education => "education",
            SectionKind::Experience => "experience",
            SectionKind::Projects => "projects",
            SectionKind::Certifications => "certifications",
            SectionKind::Achievements => "achievements",
            SectionKind::Skills => "skills",
            SectionKind::Hobbies => "hobbies",
            SectionKind::Languages => "languages",
            SectionKind::PersonalInfo => "personal_info",
        }
    }
}

/// Structured view of the answers, ready to be serialized by a host.
///
/// Strings are carried verbatim; serializers that emit markup escape them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub kind: SectionKind,
    pub heading: String,
    pub body: SectionBody,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SectionBody {
    Header(Header),
    Paragraph { text: String },
    Entries { entries: Vec<EntryBlock> },
    Bullets { items: Vec<String> },
    List { field: String, fragment: ListFragment },
    Facts { facts: Vec<Fact> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Header {
    pub name: String,
    pub title: Option<String>,
    pub contacts: Vec<String>,
    pub links: Vec<Fact>,
    pub photo: Option<Photo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Photo {
    pub src: String,
    pub align: ImageAlign,
}

/// One record of a multi-entry section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryBlock {
    pub title: String,
    pub organization: Option<String>,
    pub dates: Option<String>,
    pub description: Option<String>,
    pub details: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fact {
    pub label: String,
    pub value: String,
}

/// Rendered comma-separated field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ListFragment {
    Bulleted { items: Vec<String> },
    Inline { text: String },
}

/// Fixed mapping from a block's step ids to the entry layout.
struct RecordLayout {
    field: &'static str,
    kind: SectionKind,
    heading: &'static str,
    title: &'static str,
    organization: &'static str,
    start: &'static str,
    end: &'static str,
    description: &'static str,
    details: &'static [(&'static str, &'static str)],
}

const RECORD_LAYOUTS: &[RecordLayout] = &[
    RecordLayout {
        field: "education",
        kind: SectionKind::Education,
        heading: "Education",
        title: "degree",
        organization: "college",
        start: "start",
        end: "end",
        description: "description",
        details: &[("score", "CGPA/Percentage"), ("courses", "Relevant Courses")],
    },
    RecordLayout {
        field: "experience",
        kind: SectionKind::Experience,
        heading: "Work Experience",
        title: "role",
        organization: "company",
        start: "start",
        end: "end",
        description: "description",
        details: &[],
    },
    RecordLayout {
        field: "projects",
        kind: SectionKind::Projects,
        heading: "Projects",
        title: "title",
        organization: "tech",
        start: "start",
        end: "end",
        description: "description",
        details: &[("link", "Link")],
    },
    RecordLayout {
        field: "certificates",
        kind: SectionKind::Certifications,
        heading: "Certifications",
        title: "name",
        organization: "issuer",
        start: "date",
        end: "end",
        description: "description",
        details: &[],
    },
];

const LIST_FIELDS: &[(&str, SectionKind, &str)] = &[
    ("skills", SectionKind::Skills, "Skills"),
    ("hobbies", SectionKind::Hobbies, "Hobbies"),
    ("languages", SectionKind::Languages, "Languages"),
];

/// Whether `field` is rendered from a comma-separated answer.
pub fn is_list_field(field: &str) -> bool {
    LIST_FIELDS.iter().any(|(name, ..)| *name == field)
}

const PERSONAL_FIELDS: &[(&str, &str)] = &[
    ("gender", "Gender"),
    ("dob", "Date of Birth"),
    ("nationality", "Nationality"),
];

/// Builds the document from a (possibly partial) answer set.
///
/// A section appears only when its backing answers are present and non-empty.
pub fn render(answers: &AnswerSet, settings: &Settings) -> Document {
    let mut sections = Vec::new();

    if let Some(header) = render_header(answers, settings.image_align) {
        sections.push(Section {
            kind: SectionKind::Heading,
            heading: header.name.clone(),
            body: SectionBody::Header(header),
        });
    }

    if let Some(summary) = answers.non_empty_text("summary") {
        sections.push(Section {
            kind: SectionKind::Summary,
            heading: "Summary".into(),
            body: SectionBody::Paragraph {
                text: summary.to_string(),
            },
        });
    }

    for layout in RECORD_LAYOUTS {
        let entries = answers
            .records(layout.field)
            .filter_map(|record| render_entry(layout, record))
            .collect::<Vec<_>>();
        if !entries.is_empty() {
            sections.push(Section {
                kind: layout.kind,
                heading: layout.heading.into(),
                body: SectionBody::Entries { entries },
            });
        }
    }

    let achievements = achievement_items(answers);
    if !achievements.is_empty() {
        sections.push(Section {
            kind: SectionKind::Achievements,
            heading: "Achievements".into(),
            body: SectionBody::Bullets {
                items: achievements,
            },
        });
    }

    for (field, kind, heading) in LIST_FIELDS {
        if let Some(fragment) = render_list_fragment(answers, field, settings.list_mode(field)) {
            sections.push(Section {
                kind: *kind,
                heading: (*heading).into(),
                body: SectionBody::List {
                    field: (*field).into(),
                    fragment,
                },
            });
        }
    }

    let facts = PERSONAL_FIELDS
        .iter()
        .filter_map(|(field, label)| {
            answers.non_empty_text(field).map(|value| Fact {
                label: (*label).into(),
                value: value.to_string(),
            })
        })
        .collect::<Vec<_>>();
    if !facts.is_empty() {
        sections.push(Section {
            kind: SectionKind::PersonalInfo,
            heading: "Additional Info".into(),
            body: SectionBody::Facts { facts },
        });
    }

    Document { sections }
}

/// Renders a single comma-separated field in the requested mode.
pub fn render_list_fragment(answers: &AnswerSet, field: &str, mode: ListMode) -> Option<ListFragment> {
    let items = answers
        .non_empty_text(field)
        .map(split_items)
        .unwrap_or_default();
    if items.is_empty() {
        return None;
    }
    Some(match mode {
        ListMode::Bulleted => ListFragment::Bulleted { items },
        ListMode::Inline => ListFragment::Inline {
            text: items.join(", "),
        },
    })
}

impl Document {
    pub fn section(&self, kind: SectionKind) -> Option<&Section> {
        self.sections.iter().find(|section| section.kind == kind)
    }

    pub fn kinds(&self) -> Vec<SectionKind> {
        self.sections.iter().map(|section| section.kind).collect()
    }

    /// Regenerates only the fragment of `field`, leaving every other section
    /// untouched. Returns false when the field has no section.
    pub fn apply_list_mode(&mut self, answers: &AnswerSet, field: &str, mode: ListMode) -> bool {
        let Some(fragment) = render_list_fragment(answers, field, mode) else {
            return false;
        };
        for section in &mut self.sections {
            if let SectionBody::List {
                field: section_field,
                fragment: current,
            } = &mut section.body
                && section_field.as_str() == field
            {
                *current = fragment;
                return true;
            }
        }
        false
    }
}

fn render_header(answers: &AnswerSet, align: ImageAlign) -> Option<Header> {
    let name = answers.non_empty_text("name")?;
    let contacts = ["address", "phone", "email"]
        .iter()
        .filter_map(|field| answers.non_empty_text(field))
        .map(str::to_string)
        .collect();
    let links = [("linkedin", "LinkedIn"), ("github", "GitHub")]
        .iter()
        .filter_map(|(field, label)| {
            answers.non_empty_text(field).map(|value| Fact {
                label: (*label).into(),
                value: value.to_string(),
            })
        })
        .collect();
    let photo = answers
        .non_empty_text("profilePic")
        .filter(|src| is_image_data_uri(src))
        .map(|src| Photo {
            src: src.to_string(),
            align,
        });

    Some(Header {
        name: name.to_string(),
        title: answers.non_empty_text("title").map(str::to_string),
        contacts,
        links,
        photo,
    })
}

fn render_entry(layout: &RecordLayout, record: &Record) -> Option<EntryBlock> {
    let title = record.non_empty(layout.title)?;
    let dates = match (record.non_empty(layout.start), record.non_empty(layout.end)) {
        (Some(start), Some(end)) => Some(format!("{start} – {end}")),
        (Some(single), None) | (None, Some(single)) => Some(single.to_string()),
        (None, None) => None,
    };
    let details = layout
        .details
        .iter()
        .filter_map(|(step, label)| {
            record
                .non_empty(step)
                .map(|value| format!("{label}: {value}"))
        })
        .collect();

    Some(EntryBlock {
        title: title.to_string(),
        organization: record.non_empty(layout.organization).map(str::to_string),
        dates,
        description: record.non_empty(layout.description).map(str::to_string),
        details,
    })
}

fn achievement_items(answers: &AnswerSet) -> Vec<String> {
    let lines = answers
        .lines("achievements")
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect::<Vec<_>>();
    if !lines.is_empty() {
        return lines;
    }
    // Older snapshots stored achievements as one free-text answer.
    answers
        .non_empty_text("achievements")
        .map(|text| {
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn split_items(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Plain-text rendering for terminals.
pub fn render_text(document: &Document) -> String {
    let mut lines = Vec::new();
    for section in &document.sections {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        match &section.body {
            SectionBody::Header(header) => {
                lines.push(header.name.to_uppercase());
                if let Some(title) = &header.title {
                    lines.push(title.clone());
                }
                if !header.contacts.is_empty() {
                    lines.push(header.contacts.join(" | "));
                }
                if !header.links.is_empty() {
                    lines.push(
                        header
                            .links
                            .iter()
                            .map(|link| format!("{}: {}", link.label, link.value))
                            .collect::<Vec<_>>()
                            .join(" | "),
                    );
                }
                if let Some(photo) = &header.photo {
                    lines.push(format!("[photo, {} aligned]", photo.align.as_str()));
                }
            }
            SectionBody::Paragraph { text } => {
                lines.push(section.heading.to_uppercase());
                lines.push(text.clone());
            }
            SectionBody::Entries { entries } => {
                lines.push(section.heading.to_uppercase());
                for entry in entries {
                    let mut line = entry.title.clone();
                    if let Some(organization) = &entry.organization {
                        line.push_str(&format!(", {organization}"));
                    }
                    if let Some(dates) = &entry.dates {
                        line.push_str(&format!(" ({dates})"));
                    }
                    lines.push(format!("- {line}"));
                    if let Some(description) = &entry.description {
                        lines.push(format!("  {description}"));
                    }
                    for detail in &entry.details {
                        lines.push(format!("  {detail}"));
                    }
                }
            }
            SectionBody::Bullets { items } => {
                lines.push(section.heading.to_uppercase());
                lines.extend(items.iter().map(|item| format!("- {item}")));
            }
            SectionBody::List { fragment, .. } => {
                lines.push(section.heading.to_uppercase());
                match fragment {
                    ListFragment::Bulleted { items } => {
                        lines.extend(items.iter().map(|item| format!("- {item}")));
                    }
                    ListFragment::Inline { text } => lines.push(text.clone()),
                }
            }
            SectionBody::Facts { facts } => {
                lines.push(section.heading.to_uppercase());
                lines.extend(
                    facts
                        .iter()
                        .map(|fact| format!("{}: {}", fact.label, fact.value)),
                );
            }
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answers::Entry;

    #[test]
    fn date_ranges_collapse_missing_ends() {
        let layout = &RECORD_LAYOUTS[0];
        let record: Record = [("degree", "BSc"), ("start", "2023")].into_iter().collect();
        let entry = render_entry(layout, &record).expect("entry");
        assert_eq!(entry.dates.as_deref(), Some("2023"));

        let record: Record = [("degree", "BSc"), ("start", "2023"), ("end", "2026")]
            .into_iter()
            .collect();
        let entry = render_entry(layout, &record).expect("entry");
        assert_eq!(entry.dates.as_deref(), Some("2023 – 2026"));
    }

    #[test]
    fn records_without_title_are_dropped() {
        let mut answers = AnswerSet::new();
        answers.push_entry(
            "projects",
            Entry::Record([("title", " "), ("tech", "Rust")].into_iter().collect()),
        );
        let document = render(&answers, &Settings::default());
        assert!(document.section(SectionKind::Projects).is_none());
    }

    #[test]
    fn split_items_ignores_blanks() {
        assert_eq!(split_items(" rust, ,sql ,"), vec!["rust", "sql"]);
    }

    #[test]
    fn legacy_text_achievements_become_bullets() {
        let mut answers = AnswerSet::new();
        answers.set_text("achievements", "Dean's list\nHackathon winner\n");
        assert_eq!(
            achievement_items(&answers),
            vec!["Dean's list", "Hackathon winner"]
        );
    }
}
