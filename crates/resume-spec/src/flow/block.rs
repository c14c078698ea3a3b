//! Sub-flow controller for repeatable questions.
//!
//! A block question collects whole records one step at a time and asks
//! whether to add another after each completed record. A lines question
//! collects free-text lines until an empty submission. Completed records and
//! lines are appended to the answer list immediately; the record being typed
//! lives only in [`BlockState::Collecting`].

use std::mem;

use crate::{
    answers::{AnswerSet, Entry, Record},
    flow::FlowError,
    spec::question::{QuestionKind, QuestionSpec},
};

/// Cursor of the active repeatable question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockState {
    /// Asking for step `step` of the record in `working`.
    Collecting { step: usize, working: Record },
    /// A record was just stored; waiting for yes/no.
    AddAnother,
    /// Waiting for the next free-text line.
    Lines { draft: String },
}

/// What the engine should do after a sub-flow transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlockOutcome {
    /// Still inside the block. `committed` is set when the stored list changed.
    Continue { committed: bool },
    /// The block is done; move past it.
    Finished,
    /// Backed out of the block; retreat the outer flow.
    Exited,
}

impl BlockState {
    /// Initial cursor when the flow arrives at `question`.
    ///
    /// Blocks that already hold records (saved answers, or returning to the
    /// block from a later question) start at the add-another prompt.
    pub fn arrive(question: &QuestionSpec, answers: &AnswerSet) -> Self {
        match question.kind {
            QuestionKind::Lines => BlockState::Lines {
                draft: String::new(),
            },
            _ if answers.list(&question.id).is_empty() => BlockState::fresh(),
            _ => BlockState::AddAnother,
        }
    }

    fn fresh() -> Self {
        BlockState::Collecting {
            step: 0,
            working: Record::new(),
        }
    }

    pub(crate) fn submit(
        &mut self,
        question: &QuestionSpec,
        answers: &mut AnswerSet,
        value: &str,
    ) -> Result<BlockOutcome, FlowError> {
        let value = value.trim();
        match self {
            BlockState::Collecting { step, working } => {
                let Some(spec) = question.steps.get(*step) else {
                    *self = BlockState::fresh();
                    return Ok(BlockOutcome::Continue { committed: false });
                };

                if value.is_empty() {
                    let untouched = *step == 0 && working.is_empty();
                    if untouched && !question.required && answers.list(&question.id).is_empty() {
                        answers.ensure_list(&question.id);
                        return Ok(BlockOutcome::Finished);
                    }
                    if spec.required {
                        return Err(FlowError::Required {
                            field: format!("{}.{}", question.id, spec.id),
                        });
                    }
                }

                working.insert(spec.id.clone(), value);
                if *step + 1 < question.steps.len() {
                    *step += 1;
                    return Ok(BlockOutcome::Continue { committed: false });
                }

                let record = mem::take(working);
                answers.push_entry(&question.id, Entry::Record(record));
                *self = BlockState::AddAnother;
                Ok(BlockOutcome::Continue { committed: true })
            }
            BlockState::AddAnother => match value.to_lowercase().as_str() {
                "yes" | "y" => {
                    *self = BlockState::fresh();
                    Ok(BlockOutcome::Continue { committed: false })
                }
                "no" | "n" => {
                    answers.ensure_list(&question.id);
                    Ok(BlockOutcome::Finished)
                }
                _ => Err(FlowError::ExpectedYesNo {
                    input: value.to_string(),
                }),
            },
            BlockState::Lines { draft } => {
                if value.is_empty() {
                    if question.required && answers.list(&question.id).is_empty() {
                        return Err(FlowError::Required {
                            field: question.id.clone(),
                        });
                    }
                    answers.ensure_list(&question.id);
                    return Ok(BlockOutcome::Finished);
                }
                answers.push_entry(&question.id, Entry::Line(value.to_string()));
                draft.clear();
                Ok(BlockOutcome::Continue { committed: true })
            }
        }
    }

    /// `pending` is the uncommitted text in the input, used by lines questions.
    pub(crate) fn back(
        &mut self,
        question: &QuestionSpec,
        answers: &mut AnswerSet,
        pending: &str,
    ) -> BlockOutcome {
        match self {
            BlockState::Collecting { step, .. } if *step > 0 => {
                *step -= 1;
                BlockOutcome::Continue { committed: false }
            }
            BlockState::Collecting { .. } => match pop_record(answers, &question.id) {
                Some(record) => {
                    *self = BlockState::Collecting {
                        step: question.steps.len().saturating_sub(1),
                        working: record,
                    };
                    BlockOutcome::Continue { committed: true }
                }
                None => BlockOutcome::Exited,
            },
            // Leaves the block instead of reopening the last record.
            BlockState::AddAnother => BlockOutcome::Exited,
            BlockState::Lines { draft } => {
                if !pending.trim().is_empty() {
                    draft.clear();
                    return BlockOutcome::Continue { committed: false };
                }
                match pop_line(answers, &question.id) {
                    Some(line) => {
                        *draft = line;
                        BlockOutcome::Continue { committed: true }
                    }
                    None => BlockOutcome::Exited,
                }
            }
        }
    }

    /// Value to pre-fill in the input for the current state.
    pub fn prefill(&self, question: &QuestionSpec) -> Option<String> {
        match self {
            BlockState::Collecting { step, working } => question
                .steps
                .get(*step)
                .and_then(|spec| working.get(&spec.id))
                .filter(|value| !value.is_empty())
                .map(str::to_string),
            BlockState::AddAnother => None,
            BlockState::Lines { draft } if draft.is_empty() => None,
            BlockState::Lines { draft } => Some(draft.clone()),
        }
    }
}

fn pop_record(answers: &mut AnswerSet, id: &str) -> Option<Record> {
    if !matches!(answers.list(id).last(), Some(Entry::Record(_))) {
        return None;
    }
    match answers.pop_entry(id) {
        Some(Entry::Record(record)) => Some(record),
        _ => None,
    }
}

fn pop_line(answers: &mut AnswerSet, id: &str) -> Option<String> {
    if !matches!(answers.list(id).last(), Some(Entry::Line(_))) {
        return None;
    }
    match answers.pop_entry(id) {
        Some(Entry::Line(line)) => Some(line),
        _ => None,
    }
}
