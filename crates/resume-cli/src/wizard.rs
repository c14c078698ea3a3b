use std::io::{self, BufRead, Write};
use std::path::Path;

use resume_spec::{
    Action, AnswerSet, FlowEngine, FlowError, Input, KeyValueStore, Progress, Prompt,
    QuestionKind, StoreError, read_upload, render_text,
};
use tracing::debug;

use crate::CliResult;

pub const BACK_COMMAND: &str = ":back";
pub const CLEAR_COMMAND: &str = ":clear";
pub const EXIT_COMMAND: &str = "exit";

/// Controls which bits of state the wizard prints.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Verbosity {
    /// Clean output: question prompts only.
    Clean,
    /// Verbose output: completion percentage and the saved answers as JSON.
    Verbose,
}

impl Verbosity {
    pub fn from_count(count: u8) -> Self {
        if count > 0 {
            Verbosity::Verbose
        } else {
            Verbosity::Clean
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

/// Prints prompts and outcomes for whatever the engine yields.
pub struct WizardPresenter<W: Write> {
    verbosity: Verbosity,
    header_printed: bool,
    out: W,
}

impl<W: Write> WizardPresenter<W> {
    pub fn new(verbosity: Verbosity, out: W) -> Self {
        Self {
            verbosity,
            header_printed: false,
            out,
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn show_header(&mut self, title: &str, help: Option<&str>) -> io::Result<()> {
        if self.header_printed {
            return Ok(());
        }
        writeln!(self.out, "{}", title)?;
        if let Some(help) = help {
            writeln!(self.out, "{}", help)?;
        }
        writeln!(
            self.out,
            "Commands: {} (previous answer), {} (start over), {} (quit)",
            BACK_COMMAND, CLEAR_COMMAND, EXIT_COMMAND
        )?;
        self.header_printed = true;
        Ok(())
    }

    pub fn show_prompt(&mut self, prompt: &Prompt, progress: Progress) -> io::Result<()> {
        let mut line = format!("{}/{} ", progress.position + 1, progress.total);
        match prompt {
            Prompt::Question {
                text,
                kind,
                required,
                ..
            } => {
                line.push_str(text);
                if *required {
                    line.push_str(" *");
                }
                if *kind == QuestionKind::Image {
                    line.push_str(" (path to an image file)");
                }
            }
            Prompt::Step {
                title,
                label,
                required,
                entry,
                step,
                steps,
                ..
            } => {
                line.push_str(&format!(
                    "{} #{} [{}/{}] {}",
                    title,
                    entry,
                    step + 1,
                    steps,
                    label
                ));
                if *required {
                    line.push_str(" *");
                }
            }
            Prompt::AddAnother { title, count, .. } => {
                line.push_str(&format!(
                    "{}: {} saved. Add another? (yes/no)",
                    title, count
                ));
            }
            Prompt::Line { text, count, .. } => {
                line.push_str(&format!("{} #{}", text, count + 1));
            }
            Prompt::Complete => line.push_str("Complete"),
        }
        if self.verbosity.is_verbose() {
            line.push_str(&format!(" ({}% complete)", progress.percent()));
        }
        writeln!(self.out, "{}", line)?;

        if let Some(prefill) = prompt.prefill().filter(|value| !value.is_empty()) {
            if matches!(prompt, Prompt::Question { kind: QuestionKind::Image, .. }) {
                writeln!(self.out, "Current: image saved (press Enter to keep it)")?;
            } else {
                writeln!(self.out, "Current: {} (press Enter to keep it)", prefill)?;
            }
        }
        write!(self.out, "> ")?;
        self.out.flush()
    }

    pub fn show_error(&self, error: &FlowError) {
        eprintln!("Invalid answer: {}", error);
    }

    pub fn show_persist_warning(&self, error: &StoreError) {
        eprintln!(
            "Warning: progress could not be saved ({}). Answers are kept for this session.",
            error
        );
    }

    pub fn show_completion(&mut self, answers: &AnswerSet, document: &str) -> io::Result<()> {
        writeln!(self.out, "Done ✅")?;
        writeln!(self.out)?;
        write!(self.out, "{}", document)?;
        writeln!(self.out)?;
        writeln!(
            self.out,
            "Run `resume-wizard export` to save a standalone HTML copy."
        )?;
        if self.verbosity.is_verbose() {
            match answers.to_json_pretty() {
                Ok(pretty) => writeln!(self.out, "{}", pretty)?,
                Err(err) => eprintln!("Failed to serialize answers to JSON: {}", err),
            }
        }
        Ok(())
    }
}

/// Drives `engine` from line-based input until every question is answered.
pub fn run_wizard<S, R, W>(
    engine: &mut FlowEngine<S>,
    mut input: R,
    presenter: &mut WizardPresenter<W>,
) -> CliResult<()>
where
    S: KeyValueStore,
    R: BufRead,
    W: Write,
{
    let catalog = engine.catalog();
    presenter.show_header(&catalog.title, catalog.description.as_deref())?;

    loop {
        let prompt = engine.current();
        if prompt.is_complete() {
            let document = engine.document();
            presenter.show_completion(engine.answers(), &render_text(&document))?;
            return Ok(());
        }
        presenter.show_prompt(&prompt, engine.progress())?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err("input closed before the wizard finished".into());
        }
        let raw = line.trim();

        if raw.eq_ignore_ascii_case(EXIT_COMMAND) {
            return Err("wizard aborted by user".into());
        }
        let outcome = match raw {
            BACK_COMMAND => Ok(engine.go_back(prompt.prefill().unwrap_or_default())),
            CLEAR_COMMAND => {
                if let Some(err) = engine.clear() {
                    presenter.show_persist_warning(&err);
                }
                continue;
            }
            _ => parse_input(&prompt, raw).and_then(|input| engine.dispatch(Action::Submit(input))),
        };

        match outcome {
            Ok(transition) => {
                debug!(position = engine.position(), "wizard step accepted");
                if let Some(err) = &transition.persist_error {
                    presenter.show_persist_warning(err);
                }
            }
            Err(err) => presenter.show_error(&err),
        }
    }
}

/// Turns a typed line into engine input. An empty line keeps the shown
/// value; image questions read the named file.
fn parse_input(prompt: &Prompt, raw: &str) -> Result<Input, FlowError> {
    if let Prompt::Question {
        kind: QuestionKind::Image,
        ..
    } = prompt
    {
        if raw.is_empty() {
            return Ok(Input::text(""));
        }
        return Ok(Input::Image(read_upload(Path::new(raw))?));
    }

    if raw.is_empty() {
        return Ok(Input::text(prompt.prefill().unwrap_or_default()));
    }
    Ok(Input::text(raw))
}
