//! Standalone HTML export of a rendered document.
//!
//! The page is self-contained: inline CSS, the photo embedded as a `data:`
//! URI, and at most one webfont stylesheet link. Print mode adds an inline
//! script that opens the print dialog once the page has loaded.

use std::{fmt, fs, path::Path, str::FromStr};

use handlebars::Handlebars;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    answers::AnswerSet,
    render::{Document, EntryBlock, Fact, Header, ListFragment, SectionBody},
    settings::Settings,
};

const TEMPLATE_NAME: &str = "resume";
const TEMPLATE: &str = include_str!("../templates/resume.html.hbs");

/// Fonts served from Google Fonts when selected.
const WEBFONTS: &[&str] = &[
    "Roboto",
    "Open Sans",
    "Lato",
    "Merriweather",
    "Playfair Display",
    "Source Sans 3",
];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("export template is invalid: {0}")]
    Template(#[from] Box<handlebars::TemplateError>),
    #[error("failed to render export: {0}")]
    Render(#[from] handlebars::RenderError),
    #[error("cannot open {path} for the exported document: {reason}. {guidance}")]
    SurfaceUnavailable {
        path: String,
        reason: String,
        guidance: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportMode {
    #[default]
    View,
    Print,
}

impl fmt::Display for ExportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportMode::View => write!(f, "view"),
            ExportMode::Print => write!(f, "print"),
        }
    }
}

impl FromStr for ExportMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "view" => Ok(ExportMode::View),
            "print" => Ok(ExportMode::Print),
            _ => Err(format!("unknown export mode '{}'", value)),
        }
    }
}

#[derive(Serialize)]
struct PageView<'a> {
    title: String,
    theme: &'static str,
    font_family: String,
    font_href: Option<String>,
    line_height: String,
    print: bool,
    sections: Vec<SectionView<'a>>,
}

#[derive(Serialize, Default)]
struct SectionView<'a> {
    kind: &'static str,
    heading: &'a str,
    header: Option<&'a Header>,
    paragraph: Option<&'a str>,
    entries: &'a [EntryBlock],
    bullets: &'a [String],
    inline: Option<&'a str>,
    facts: &'a [Fact],
}

/// Handlebars registry holding the export template.
pub struct Exporter {
    registry: Handlebars<'static>,
}

impl Exporter {
    pub fn new() -> Result<Self, ExportError> {
        let mut registry = Handlebars::new();
        registry
            .register_template_string(TEMPLATE_NAME, TEMPLATE)
            .map_err(Box::new)?;
        Ok(Self { registry })
    }

    pub fn render(
        &self,
        document: &Document,
        settings: &Settings,
        mode: ExportMode,
    ) -> Result<String, ExportError> {
        let font_family = sanitize_font_family(&settings.font_family);
        let view = PageView {
            title: page_title(document),
            theme: settings.theme.as_str(),
            font_href: webfont_href(&font_family),
            font_family,
            line_height: settings.line_height.to_string(),
            print: mode == ExportMode::Print,
            sections: document
                .sections
                .iter()
                .map(|section| {
                    let mut view = SectionView {
                        kind: section.kind.as_str(),
                        heading: &section.heading,
                        ..SectionView::default()
                    };
                    match &section.body {
                        SectionBody::Header(header) => view.header = Some(header),
                        SectionBody::Paragraph { text } => view.paragraph = Some(text.as_str()),
                        SectionBody::Entries { entries } => view.entries = entries.as_slice(),
                        SectionBody::Bullets { items } => view.bullets = items.as_slice(),
                        SectionBody::List { fragment, .. } => match fragment {
                            ListFragment::Bulleted { items } => view.bullets = items.as_slice(),
                            ListFragment::Inline { text } => view.inline = Some(text.as_str()),
                        },
                        SectionBody::Facts { facts } => view.facts = facts.as_slice(),
                    }
                    view
                })
                .collect(),
        };
        let html = self.registry.render(TEMPLATE_NAME, &view)?;
        debug!(%mode, bytes = html.len(), "rendered export");
        Ok(html)
    }
}

/// Renders `document` into a standalone HTML page.
pub fn export_html(
    document: &Document,
    settings: &Settings,
    mode: ExportMode,
) -> Result<String, ExportError> {
    Exporter::new()?.render(document, settings, mode)
}

/// Writes an exported page, reporting an unusable target with guidance.
pub fn write_export(html: &str, path: &Path) -> Result<(), ExportError> {
    fs::write(path, html).map_err(|err| ExportError::SurfaceUnavailable {
        path: path.display().to_string(),
        reason: err.to_string(),
        guidance: "Choose a writable location with --out, or check that the folder exists."
            .into(),
    })?;
    info!(path = %path.display(), "exported document");
    Ok(())
}

/// `<name>_Resume.html`, with characters unsafe for file names replaced.
pub fn default_file_name(answers: &AnswerSet) -> String {
    let name = answers
        .non_empty_text("name")
        .map(|name| {
            name.chars()
                .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
                .collect::<String>()
        })
        .unwrap_or_else(|| "My".to_string());
    format!("{name}_Resume.html")
}

fn page_title(document: &Document) -> String {
    document
        .sections
        .iter()
        .find_map(|section| match &section.body {
            SectionBody::Header(header) => Some(format!("{} - Resume", header.name)),
            _ => None,
        })
        .unwrap_or_else(|| "Resume".to_string())
}

/// Keeps only characters that are safe inside a CSS `font-family` value.
fn sanitize_font_family(family: &str) -> String {
    let cleaned = family
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(*c, ' ' | ',' | '-'))
        .collect::<String>();
    let cleaned = cleaned
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    if cleaned.is_empty() {
        crate::settings::DEFAULT_FONT_FAMILY.to_string()
    } else {
        cleaned
    }
}

fn webfont_href(font_family: &str) -> Option<String> {
    let primary = font_family.split(',').next()?.trim();
    WEBFONTS
        .iter()
        .find(|font| font.eq_ignore_ascii_case(primary))
        .map(|font| {
            format!(
                "https://fonts.googleapis.com/css2?family={}&display=swap",
                font.replace(' ', "+")
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_font_family() {
        assert_eq!(
            sanitize_font_family("\"Open Sans\", sans-serif; } body { color: red"),
            "Open Sans, sans-serif  body  color red"
        );
        assert_eq!(sanitize_font_family("<>"), crate::settings::DEFAULT_FONT_FAMILY);
    }

    #[test]
    fn webfont_only_for_known_fonts() {
        assert_eq!(
            webfont_href("Open Sans, sans-serif").as_deref(),
            Some("https://fonts.googleapis.com/css2?family=Open+Sans&display=swap")
        );
        assert_eq!(webfont_href("Georgia, serif"), None);
    }

    #[test]
    fn file_name_uses_answer_name() {
        let mut answers = AnswerSet::new();
        assert_eq!(default_file_name(&answers), "My_Resume.html");
        answers.set_text("name", "Ada Lovelace/../x");
        assert_eq!(default_file_name(&answers), "Ada_Lovelace____x_Resume.html");
    }

    #[test]
    fn export_mode_parses() {
        assert_eq!("Print".parse::<ExportMode>(), Ok(ExportMode::Print));
        assert!("pdf".parse::<ExportMode>().is_err());
    }
}
