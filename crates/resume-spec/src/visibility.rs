use crate::{answers::AnswerSet, spec::catalog::Catalog, spec::question::QuestionSpec};

pub type VisibilityMap = std::collections::BTreeMap<String, bool>;

/// A question is visible when it has no dependency or its dependency's
/// recorded answer matches case-insensitively.
pub fn is_visible(question: &QuestionSpec, answers: &AnswerSet) -> bool {
    match &question.depends_on {
        Some(dependency) => dependency.is_met_by(answers.text(&dependency.question)),
        None => true,
    }
}

pub fn resolve_visibility(catalog: &Catalog, answers: &AnswerSet) -> VisibilityMap {
    catalog
        .questions
        .iter()
        .map(|question| (question.id.clone(), is_visible(question, answers)))
        .collect()
}

/// Copy of `answers` without the answers of hidden questions. Answers the
/// catalog does not know about are kept.
pub fn visible_answers(catalog: &Catalog, answers: &AnswerSet) -> AnswerSet {
    let mut visible = answers.clone();
    for question in &catalog.questions {
        if !is_visible(question, answers) {
            visible.remove(&question.id);
        }
    }
    visible
}
