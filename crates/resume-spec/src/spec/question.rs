use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Input kinds supported by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    /// Single line of text.
    #[default]
    Text,
    /// Uploaded picture stored as a `data:` URI.
    Image,
    /// Repeatable structured record collected step by step.
    Block,
    /// Repeatable free-text line (achievements).
    Lines,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::Text => "text",
            QuestionKind::Image => "image",
            QuestionKind::Block => "block",
            QuestionKind::Lines => "lines",
        }
    }

    /// Whether answers of this kind are stored as lists.
    pub fn is_list(&self) -> bool {
        matches!(self, QuestionKind::Block | QuestionKind::Lines)
    }
}

/// Makes a question visible only when an earlier answer has a given value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Dependency {
    /// Identifier of the question whose answer is inspected.
    pub question: String,
    /// Expected answer, compared case-insensitively.
    pub value: String,
}

impl Dependency {
    pub fn new(question: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            value: value.into(),
        }
    }

    /// Returns true when `answer` satisfies the dependency.
    pub fn is_met_by(&self, answer: Option<&str>) -> bool {
        answer
            .map(|answer| answer.to_lowercase() == self.value.to_lowercase())
            .unwrap_or(false)
    }
}

/// One field of a multi-entry block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StepSpec {
    pub id: String,
    pub label: String,
    #[serde(default = "default_required")]
    pub required: bool,
}

impl StepSpec {
    pub fn new(id: impl Into<String>, label: impl Into<String>, required: bool) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            required,
        }
    }
}

/// Single question descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct QuestionSpec {
    pub id: String,
    pub text: String,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(rename = "type", default)]
    pub kind: QuestionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<Dependency>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<StepSpec>,
    /// Regular expression that non-empty text answers must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl QuestionSpec {
    pub fn text(id: impl Into<String>, text: impl Into<String>, required: bool) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            required,
            kind: QuestionKind::Text,
            depends_on: None,
            steps: Vec::new(),
            pattern: None,
        }
    }

    pub fn image(id: impl Into<String>, text: impl Into<String>, required: bool) -> Self {
        Self {
            kind: QuestionKind::Image,
            ..Self::text(id, text, required)
        }
    }

    pub fn block(
        id: impl Into<String>,
        text: impl Into<String>,
        required: bool,
        steps: Vec<StepSpec>,
    ) -> Self {
        Self {
            kind: QuestionKind::Block,
            steps,
            ..Self::text(id, text, required)
        }
    }

    pub fn lines(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: QuestionKind::Lines,
            ..Self::text(id, text, false)
        }
    }

    pub fn depends_on(mut self, question: impl Into<String>, value: impl Into<String>) -> Self {
        self.depends_on = Some(Dependency::new(question, value));
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }
}

fn default_required() -> bool {
    true
}
