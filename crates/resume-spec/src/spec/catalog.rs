use std::collections::BTreeSet;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::spec::question::{QuestionKind, QuestionSpec};

const BUILTIN_CATALOG: &str = include_str!("../../catalog/resume.json");

/// Problems detected while loading a catalog definition.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("catalog '{0}' has no questions")]
    Empty(String),
    #[error("question id '{0}' is used more than once")]
    DuplicateId(String),
    #[error("block question '{0}' must define at least one step")]
    MissingSteps(String),
    #[error("question '{0}' defines steps but is not a block")]
    UnexpectedSteps(String),
    #[error("block '{block}' repeats step id '{step}'")]
    DuplicateStep { block: String, step: String },
    #[error("question '{question}' depends on '{target}', which is not asked before it")]
    UnknownDependency { question: String, target: String },
    #[error("question '{question}' has an invalid pattern: {source}")]
    InvalidPattern {
        question: String,
        #[source]
        source: regex::Error,
    },
}

/// Ordered question catalog; order defines the default traversal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Catalog {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub questions: Vec<QuestionSpec>,
}

impl Catalog {
    /// The resume interview shipped with the crate.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_json::from_str(json)?;
        catalog.check()?;
        Ok(catalog)
    }

    /// Builds a catalog from questions after checking it is well formed.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        questions: Vec<QuestionSpec>,
    ) -> Result<Self, CatalogError> {
        let catalog = Self {
            id: id.into(),
            title: title.into(),
            description: None,
            questions,
        };
        catalog.check()?;
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&QuestionSpec> {
        self.questions.get(index)
    }

    pub fn question(&self, id: &str) -> Option<&QuestionSpec> {
        self.questions.iter().find(|question| question.id == id)
    }

    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.questions.iter().position(|question| question.id == id)
    }

    fn check(&self) -> Result<(), CatalogError> {
        if self.questions.is_empty() {
            return Err(CatalogError::Empty(self.id.clone()));
        }

        let mut seen = BTreeSet::new();
        for question in &self.questions {
            if let Some(dependency) = &question.depends_on
                && !seen.contains(dependency.question.as_str())
            {
                return Err(CatalogError::UnknownDependency {
                    question: question.id.clone(),
                    target: dependency.question.clone(),
                });
            }
            if !seen.insert(question.id.as_str()) {
                return Err(CatalogError::DuplicateId(question.id.clone()));
            }

            match question.kind {
                QuestionKind::Block if question.steps.is_empty() => {
                    return Err(CatalogError::MissingSteps(question.id.clone()));
                }
                QuestionKind::Block => {
                    let mut steps = BTreeSet::new();
                    for step in &question.steps {
                        if !steps.insert(step.id.as_str()) {
                            return Err(CatalogError::DuplicateStep {
                                block: question.id.clone(),
                                step: step.id.clone(),
                            });
                        }
                    }
                }
                _ if !question.steps.is_empty() => {
                    return Err(CatalogError::UnexpectedSteps(question.id.clone()));
                }
                _ => {}
            }

            if let Some(pattern) = &question.pattern {
                Regex::new(pattern).map_err(|source| CatalogError::InvalidPattern {
                    question: question.id.clone(),
                    source,
                })?;
            }
        }

        Ok(())
    }
}
