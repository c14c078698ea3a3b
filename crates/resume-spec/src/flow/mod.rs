//! Question-flow state machine.
//!
//! [`FlowEngine`] owns one interview session: the catalog, the answers, the
//! current position and the cursor of an active repeatable question. Every
//! user action goes through [`FlowEngine::dispatch`], which validates the
//! input, mutates the answers, persists a snapshot and returns the next
//! [`Prompt`].

pub mod block;

use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    answers::AnswerSet,
    image::{ImageError, ImageUpload, encode_data_uri},
    render::{Document, render},
    settings::Settings,
    spec::{
        catalog::Catalog,
        question::{QuestionKind, QuestionSpec},
    },
    store::{self, ANSWERS_KEY, KeyValueStore, SETTINGS_KEY, StoreError, StoreFormat},
    visibility::{is_visible, visible_answers},
};

pub use block::BlockState;
use block::BlockOutcome;

/// Validation failures. None of them change the session.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("'{field}' is required")]
    Required { field: String },
    #[error("'{field}' does not look right; please check the format")]
    PatternMismatch { field: String },
    #[error("please answer yes or no (got '{input}')")]
    ExpectedYesNo { input: String },
    #[error("please upload a valid image for '{field}'")]
    ImageRequired { field: String },
    #[error("'{field}' expects an image upload")]
    ExpectedImage { field: String },
    #[error("'{field}' does not accept an image")]
    UnexpectedImage { field: String },
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error("all questions are answered")]
    Complete,
}

/// User input for a submit action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Text(String),
    Image(ImageUpload),
}

impl Input {
    pub fn text(value: impl Into<String>) -> Self {
        Input::Text(value.into())
    }
}

/// Actions understood by [`FlowEngine::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Submit(Input),
    /// Navigate back. `pending` is uncommitted text still in the input.
    Back { pending: String },
}

/// What the host should show next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    Question {
        id: String,
        text: String,
        kind: QuestionKind,
        required: bool,
        prefill: Option<String>,
    },
    Step {
        block: String,
        title: String,
        step_id: String,
        label: String,
        required: bool,
        prefill: Option<String>,
        /// 1-based number of the record being entered.
        entry: usize,
        step: usize,
        steps: usize,
    },
    AddAnother {
        block: String,
        title: String,
        count: usize,
    },
    Line {
        block: String,
        text: String,
        prefill: Option<String>,
        count: usize,
    },
    Complete,
}

impl Prompt {
    pub fn is_complete(&self) -> bool {
        matches!(self, Prompt::Complete)
    }

    /// Text the input should start with.
    pub fn prefill(&self) -> Option<&str> {
        match self {
            Prompt::Question { prefill, .. }
            | Prompt::Step { prefill, .. }
            | Prompt::Line { prefill, .. } => prefill.as_deref(),
            Prompt::AddAnother { .. } | Prompt::Complete => None,
        }
    }
}

/// Result of a successful action.
#[derive(Debug)]
pub struct Transition {
    pub prompt: Prompt,
    /// Set when the snapshot could not be written; the session stays usable.
    pub persist_error: Option<StoreError>,
}

/// Position counters for progress indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub position: usize,
    pub total: usize,
}

impl Progress {
    pub fn percent(&self) -> usize {
        if self.total == 0 {
            100
        } else {
            self.position.min(self.total) * 100 / self.total
        }
    }
}

/// One interview session bound to a persistent store.
#[derive(Debug)]
pub struct FlowEngine<S: KeyValueStore> {
    catalog: Catalog,
    answers: AnswerSet,
    settings: Settings,
    position: usize,
    block: Option<BlockState>,
    store: S,
    format: StoreFormat,
}

impl<S: KeyValueStore> FlowEngine<S> {
    /// Starts an empty session at the first question.
    pub fn new(catalog: Catalog, store: S) -> Self {
        Self {
            catalog,
            answers: AnswerSet::new(),
            settings: Settings::default(),
            position: 0,
            block: None,
            store,
            format: StoreFormat::Json,
        }
    }

    /// Restores answers and settings from `store`.
    ///
    /// A session with saved answers starts at the completed position so the
    /// document is shown straight away; call [`FlowEngine::restart`] to walk
    /// the questions again.
    pub fn load(catalog: Catalog, store: S, format: StoreFormat) -> Self {
        let answers: AnswerSet = store::load_or_default(&store, format, ANSWERS_KEY);
        let settings: Settings = store::load_or_default(&store, format, SETTINGS_KEY);
        let position = if answers.is_empty() { 0 } else { catalog.len() };
        debug!(answers = answers.len(), position, "session loaded");
        Self {
            catalog,
            answers,
            settings,
            position,
            block: None,
            store,
            format,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Renders the answers of visible questions. Answers kept behind an
    /// unmet dependency stay saved but are left out of the document.
    pub fn document(&self) -> Document {
        render(&visible_answers(&self.catalog, &self.answers), &self.settings)
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn block_state(&self) -> Option<&BlockState> {
        self.block.as_ref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_complete(&self) -> bool {
        self.position >= self.catalog.len()
    }

    pub fn progress(&self) -> Progress {
        Progress {
            position: self.position.min(self.catalog.len()),
            total: self.catalog.len(),
        }
    }

    /// Moves back to the first question, keeping the answers.
    pub fn restart(&mut self) {
        self.position = 0;
        self.block = None;
    }

    /// Discards every answer and restarts at the first question.
    pub fn clear(&mut self) -> Option<StoreError> {
        self.answers.clear();
        self.restart();
        debug!("session cleared");
        self.store.remove(ANSWERS_KEY).err().inspect(|err| {
            warn!(error = %err, "failed to clear saved answers");
        })
    }

    /// Applies `update` to the settings and persists them.
    pub fn update_settings<T>(&mut self, update: impl FnOnce(&mut Settings) -> T) -> (T, Option<StoreError>) {
        let result = update(&mut self.settings);
        let persisted = store::save(&mut self.store, self.format, SETTINGS_KEY, &self.settings);
        (result, persisted.err().inspect(|err| {
            warn!(error = %err, "failed to save settings");
        }))
    }

    /// Resolves the prompt at the current position.
    ///
    /// Questions whose dependency is unmet are skipped forward and never
    /// shown. Arriving at a repeatable question opens its sub-flow.
    pub fn current(&mut self) -> Prompt {
        loop {
            let Some(question) = self.catalog.get(self.position) else {
                self.block = None;
                return Prompt::Complete;
            };

            if !is_visible(question, &self.answers) {
                debug!(question = %question.id, "dependency unmet; skipping");
                self.position += 1;
                self.block = None;
                continue;
            }

            if question.kind.is_list() {
                let state = self
                    .block
                    .get_or_insert_with(|| BlockState::arrive(question, &self.answers));
                return block_prompt(question, state, &self.answers);
            }

            return Prompt::Question {
                id: question.id.clone(),
                text: question.text.clone(),
                kind: question.kind,
                required: question.required,
                prefill: self.answers.text(&question.id).map(str::to_string),
            };
        }
    }

    /// Single entry point for user actions.
    pub fn dispatch(&mut self, action: Action) -> Result<Transition, FlowError> {
        self.current();
        let persist_error = match action {
            Action::Submit(input) => self.submit(input)?,
            Action::Back { pending } => self.back(&pending),
        };
        Ok(Transition {
            prompt: self.current(),
            persist_error,
        })
    }

    pub fn submit_text(&mut self, value: impl Into<String>) -> Result<Transition, FlowError> {
        self.dispatch(Action::Submit(Input::Text(value.into())))
    }

    pub fn submit_image(&mut self, upload: ImageUpload) -> Result<Transition, FlowError> {
        self.dispatch(Action::Submit(Input::Image(upload)))
    }

    pub fn go_back(&mut self, pending: impl Into<String>) -> Transition {
        self.current();
        let persist_error = self.back(&pending.into());
        Transition {
            prompt: self.current(),
            persist_error,
        }
    }

    fn submit(&mut self, input: Input) -> Result<Option<StoreError>, FlowError> {
        let Some(question) = self.catalog.get(self.position) else {
            return Err(FlowError::Complete);
        };

        match question.kind {
            QuestionKind::Text => {
                let value = match input {
                    Input::Text(text) => text.trim().to_string(),
                    Input::Image(_) => {
                        return Err(FlowError::UnexpectedImage {
                            field: question.id.clone(),
                        });
                    }
                };
                check_text(question, &value)?;
                self.answers.set_text(question.id.clone(), value);
            }
            QuestionKind::Image => match input {
                Input::Image(upload) => {
                    let encoded = encode_data_uri(&upload)?;
                    self.answers.set_text(question.id.clone(), encoded);
                }
                Input::Text(text) if text.trim().is_empty() => {
                    if question.required && !self.answers.has_value(&question.id) {
                        return Err(FlowError::ImageRequired {
                            field: question.id.clone(),
                        });
                    }
                    self.advance();
                    return Ok(None);
                }
                Input::Text(_) => {
                    return Err(FlowError::ExpectedImage {
                        field: question.id.clone(),
                    });
                }
            },
            QuestionKind::Block | QuestionKind::Lines => {
                let Input::Text(text) = input else {
                    return Err(FlowError::UnexpectedImage {
                        field: question.id.clone(),
                    });
                };
                let state = self
                    .block
                    .get_or_insert_with(|| BlockState::arrive(question, &self.answers));
                match state.submit(question, &mut self.answers, &text)? {
                    BlockOutcome::Continue { committed: false } => return Ok(None),
                    BlockOutcome::Continue { committed: true } => return Ok(self.persist()),
                    BlockOutcome::Finished => {}
                    BlockOutcome::Exited => {
                        self.retreat();
                        return Ok(None);
                    }
                }
            }
        }

        let persist_error = self.persist();
        self.advance();
        Ok(persist_error)
    }

    fn back(&mut self, pending: &str) -> Option<StoreError> {
        let Some(question) = self.catalog.get(self.position) else {
            self.retreat();
            return None;
        };

        if !question.kind.is_list() {
            self.retreat();
            return None;
        }

        let state = self
            .block
            .get_or_insert_with(|| BlockState::arrive(question, &self.answers));
        match state.back(question, &mut self.answers, pending) {
            BlockOutcome::Continue { committed: false } => None,
            BlockOutcome::Continue { committed: true } => self.persist(),
            BlockOutcome::Finished => {
                self.advance();
                None
            }
            BlockOutcome::Exited => {
                self.retreat();
                None
            }
        }
    }

    fn advance(&mut self) {
        self.position = (self.position + 1).min(self.catalog.len());
        self.block = None;
        debug!(position = self.position, "advanced");
    }

    /// Steps back over questions whose dependency is unmet. Position 0 is a
    /// hard floor whatever its own dependency state.
    fn retreat(&mut self) {
        self.block = None;
        self.position = self.position.min(self.catalog.len());
        while self.position > 0 {
            self.position -= 1;
            match self.catalog.get(self.position) {
                Some(question) if !is_visible(question, &self.answers) => continue,
                _ => break,
            }
        }
        debug!(position = self.position, "retreated");
    }

    fn persist(&mut self) -> Option<StoreError> {
        store::save(&mut self.store, self.format, ANSWERS_KEY, &self.answers)
            .err()
            .inspect(|err| warn!(error = %err, "failed to save answers; keeping them in memory"))
    }
}

fn check_text(question: &QuestionSpec, value: &str) -> Result<(), FlowError> {
    if value.is_empty() {
        if question.required {
            return Err(FlowError::Required {
                field: question.id.clone(),
            });
        }
        return Ok(());
    }

    if let Some(pattern) = &question.pattern
        && let Ok(regex) = Regex::new(pattern)
        && !regex.is_match(value)
    {
        return Err(FlowError::PatternMismatch {
            field: question.id.clone(),
        });
    }
    Ok(())
}

fn block_prompt(question: &QuestionSpec, state: &BlockState, answers: &AnswerSet) -> Prompt {
    let count = answers.list(&question.id).len();
    match state {
        BlockState::Collecting { step, .. } => {
            let (step_id, label, required) = question
                .steps
                .get(*step)
                .map(|spec| (spec.id.clone(), spec.label.clone(), spec.required))
                .unwrap_or_default();
            Prompt::Step {
                block: question.id.clone(),
                title: question.text.clone(),
                step_id,
                label,
                required,
                prefill: state.prefill(question),
                entry: count + 1,
                step: *step,
                steps: question.steps.len(),
            }
        }
        BlockState::AddAnother => Prompt::AddAnother {
            block: question.id.clone(),
            title: question.text.clone(),
            count,
        },
        BlockState::Lines { .. } => Prompt::Line {
            block: question.id.clone(),
            text: question.text.clone(),
            prefill: state.prefill(question),
            count,
        },
    }
}
