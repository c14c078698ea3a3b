mod logging;
mod wizard;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use logging::{LogConfig, init_logging};
use resume_spec::{
    AnswerSet, Catalog, DirStore, ExportMode, FlowEngine, Settings, StoreFormat, ValidationResult,
    default_file_name, export_html, is_list_field, render_text, validate, write_export,
};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use wizard::{Verbosity, WizardPresenter, run_wizard};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

const STORE_ENV: &str = "RESUME_WIZARD_STORE";
const DEFAULT_STORE_DIR: &str = ".resume-wizard";

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Guided resume builder for the terminal",
    long_about = "Asks for resume details one question at a time, saves progress after every answer, and renders the result as text, JSON or a standalone HTML page"
)]
struct Cli {
    /// Directory holding saved answers and settings (defaults to RESUME_WIZARD_STORE or ./.resume-wizard).
    #[arg(long, global = true, value_name = "DIR")]
    store: Option<PathBuf>,
    /// Encoding used for saved answers and settings.
    #[arg(long, global = true, value_enum, default_value_t = StoreEncoding::Json)]
    store_format: StoreEncoding,
    /// Custom catalog JSON replacing the built-in resume questions.
    #[arg(long, global = true, value_name = "FILE")]
    catalog: Option<PathBuf>,
    /// Increase diagnostic output (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum StoreEncoding {
    Json,
    Cbor,
}

impl From<StoreEncoding> for StoreFormat {
    fn from(value: StoreEncoding) -> Self {
        match value {
            StoreEncoding::Json => StoreFormat::Json,
            StoreEncoding::Cbor => StoreFormat::Cbor,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum RenderFormat {
    Text,
    Json,
    Html,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ExportKind {
    /// Page for viewing or saving.
    View,
    /// Page that opens the print dialog when loaded.
    Print,
}

impl From<ExportKind> for ExportMode {
    fn from(value: ExportKind) -> Self {
        match value {
            ExportKind::View => ExportMode::View,
            ExportKind::Print => ExportMode::Print,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum SchemaTarget {
    Answers,
    Catalog,
    Settings,
}

#[derive(Subcommand)]
enum Command {
    /// Answer the resume questions interactively.
    Wizard {
        /// Walk the questions again from the start, keeping saved answers as prefills.
        #[arg(long)]
        restart: bool,
    },
    /// Print the resume built from the saved answers.
    Render {
        #[arg(long, value_enum, default_value_t = RenderFormat::Text)]
        format: RenderFormat,
    },
    /// Write the resume as a standalone HTML file.
    Export {
        #[arg(long, value_enum, default_value_t = ExportKind::View)]
        mode: ExportKind,
        /// Target file (defaults to <name>_Resume.html in the current directory).
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Show or change presentation settings.
    Settings {
        #[command(subcommand)]
        action: SettingsCommand,
    },
    /// Discard every saved answer. Settings are kept.
    Clear,
    /// Print the JSON schema of the saved data.
    Schema {
        #[arg(value_enum, default_value_t = SchemaTarget::Answers)]
        target: SchemaTarget,
    },
}

#[derive(Subcommand)]
enum SettingsCommand {
    /// Print the current settings.
    Show,
    /// Switch between the light and dark theme.
    Theme,
    /// Set the font family used by the document.
    Font { family: String },
    /// Set the line height (clamped to 1.0 - 3.0).
    LineHeight { value: f32 },
    /// Toggle a list field (skills, hobbies, languages) between bulleted and inline.
    ListMode { field: String },
    /// Move the profile photo to the other side of the header.
    ImageAlign,
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(&LogConfig::from_verbosity(cli.verbose));

    if let Command::Schema { target } = cli.command {
        return run_schema(target);
    }

    let catalog = load_catalog(cli.catalog.as_deref())?;
    let root = resolve_store_root(cli.store)?;
    debug!(store = %root.display(), "opening session");
    let mut engine = FlowEngine::load(catalog, DirStore::new(root), cli.store_format.into());

    match cli.command {
        Command::Wizard { restart } => run_wizard_command(&mut engine, restart, cli.verbose),
        Command::Render { format } => run_render(&engine, format),
        Command::Export { mode, out } => run_export(&engine, mode.into(), out),
        Command::Settings { action } => run_settings(&mut engine, action),
        Command::Clear => run_clear(&mut engine),
        Command::Schema { target } => run_schema(target),
    }
}

fn load_catalog(path: Option<&Path>) -> CliResult<Catalog> {
    let catalog = match path {
        Some(path) => Catalog::from_json(&fs::read_to_string(path)?)?,
        None => Catalog::builtin()?,
    };
    Ok(catalog)
}

fn resolve_store_root(store: Option<PathBuf>) -> CliResult<PathBuf> {
    let candidate = match store {
        Some(path) => path,
        None => env::var_os(STORE_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_DIR)),
    };
    if candidate.as_os_str().is_empty() {
        return Err("store directory cannot be empty".into());
    }
    Ok(candidate)
}

fn run_wizard_command(
    engine: &mut FlowEngine<DirStore>,
    restart: bool,
    verbose: u8,
) -> CliResult<()> {
    if restart {
        engine.restart();
    } else if engine.is_complete() && !engine.answers().is_empty() {
        println!("Saved answers found. Run `resume-wizard wizard --restart` to edit them.");
    }

    let stdin = io::stdin();
    let mut presenter = WizardPresenter::new(Verbosity::from_count(verbose), io::stdout());
    run_wizard(engine, stdin.lock(), &mut presenter)
}

fn run_render(engine: &FlowEngine<DirStore>, format: RenderFormat) -> CliResult<()> {
    let answers = saved_answers(engine)?;
    describe_validation(&validate(engine.catalog(), answers));

    let document = engine.document();
    match format {
        RenderFormat::Text => println!("{}", render_text(&document)),
        RenderFormat::Json => println!("{}", serde_json::to_string_pretty(&document)?),
        RenderFormat::Html => print!(
            "{}",
            export_html(&document, engine.settings(), ExportMode::View)?
        ),
    }
    Ok(())
}

fn run_export(
    engine: &FlowEngine<DirStore>,
    mode: ExportMode,
    out: Option<PathBuf>,
) -> CliResult<()> {
    let answers = saved_answers(engine)?;
    let document = engine.document();
    let html = export_html(&document, engine.settings(), mode)?;
    let target = out.unwrap_or_else(|| PathBuf::from(default_file_name(answers)));
    write_export(&html, &target)?;
    println!("Exported resume to {}", target.display());
    Ok(())
}

fn run_settings(engine: &mut FlowEngine<DirStore>, action: SettingsCommand) -> CliResult<()> {
    let (message, persist_error) = match action {
        SettingsCommand::Show => {
            print_settings(engine.settings())?;
            return Ok(());
        }
        SettingsCommand::Theme => engine.update_settings(|settings| {
            format!("Theme set to {}", settings.toggle_theme().as_str())
        }),
        SettingsCommand::Font { family } => engine.update_settings(|settings| {
            settings.set_font_family(&family);
            format!("Font set to {}", settings.font_family)
        }),
        SettingsCommand::LineHeight { value } => engine.update_settings(|settings| {
            format!("Line height set to {}", settings.set_line_height(value))
        }),
        SettingsCommand::ListMode { field } => {
            if !is_list_field(&field) {
                return Err(format!(
                    "'{}' is not a list field; choose skills, hobbies or languages",
                    field
                )
                .into());
            }
            engine.update_settings(|settings| {
                format!(
                    "{} shown {}",
                    field,
                    settings.toggle_list_mode(&field).as_str()
                )
            })
        }
        SettingsCommand::ImageAlign => engine.update_settings(|settings| {
            format!("Photo aligned {}", settings.toggle_image_align().as_str())
        }),
    };

    if let Some(err) = persist_error {
        return Err(err.into());
    }
    info!("settings updated");
    println!("{}", message);
    Ok(())
}

fn print_settings(settings: &Settings) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(settings)?);
    Ok(())
}

fn run_clear(engine: &mut FlowEngine<DirStore>) -> CliResult<()> {
    if let Some(err) = engine.clear() {
        return Err(err.into());
    }
    println!("Saved answers cleared.");
    Ok(())
}

fn run_schema(target: SchemaTarget) -> CliResult<()> {
    let schema = match target {
        SchemaTarget::Answers => schemars::schema_for!(AnswerSet),
        SchemaTarget::Catalog => schemars::schema_for!(Catalog),
        SchemaTarget::Settings => schemars::schema_for!(Settings),
    };
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn saved_answers<S: resume_spec::KeyValueStore>(
    engine: &FlowEngine<S>,
) -> CliResult<&AnswerSet> {
    let answers = engine.answers();
    if answers.is_empty() {
        return Err("no saved answers; run `resume-wizard wizard` first".into());
    }
    Ok(answers)
}

fn describe_validation(result: &ValidationResult) {
    if result.valid {
        return;
    }
    for error in &result.errors {
        eprintln!("  {} - {}", error.path, error.message);
    }
    if !result.missing_required.is_empty() {
        eprintln!(
            "Missing required answers: {}",
            result.missing_required.join(", ")
        );
    }
    if !result.unknown_fields.is_empty() {
        eprintln!(
            "Unknown answer fields: {}",
            result.unknown_fields.join(", ")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_cmd::Command;
    use assert_fs::prelude::*;
    use resume_spec::{MemoryStore, QuestionSpec, StepSpec};
    use serde_json::Value;
    use std::io::Cursor;
    use tempfile::TempDir;

    const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    fn gated_catalog() -> Catalog {
        Catalog::new(
            "mini",
            "Mini resume",
            vec![
                QuestionSpec::text("name", "Name?", true),
                QuestionSpec::text("email", "Email?", true)
                    .with_pattern(r"^[^@\s]+@[^@\s]+\.[^@\s]+$"),
                QuestionSpec::text("hasExperience", "Any experience?", true),
                QuestionSpec::block(
                    "experience",
                    "Experience",
                    true,
                    vec![
                        StepSpec::new("role", "Role", true),
                        StepSpec::new("company", "Company", true),
                    ],
                )
                .depends_on("hasExperience", "yes"),
                QuestionSpec::text("skills", "Skills?", false),
            ],
        )
        .expect("valid catalog")
    }

    fn run_script(engine: &mut FlowEngine<MemoryStore>, script: &str) -> (CliResult<()>, String) {
        let mut presenter = WizardPresenter::new(Verbosity::Clean, Vec::new());
        let result = run_wizard(engine, Cursor::new(script.to_string()), &mut presenter);
        let output = String::from_utf8(presenter.into_inner()).expect("utf8 output");
        (result, output)
    }

    #[test]
    fn wizard_skips_gated_block() {
        let mut engine = FlowEngine::new(gated_catalog(), MemoryStore::new());
        let (result, output) = run_script(&mut engine, "Ada\nada@example.com\nNo\nRust, Go\n");

        assert!(result.is_ok());
        assert!(output.contains("Done ✅"));
        assert!(!output.contains("Role"));
        assert_eq!(engine.answers().text("skills"), Some("Rust, Go"));
        assert!(engine.answers().get("experience").is_none());
    }

    #[test]
    fn wizard_collects_block_records() {
        let mut engine = FlowEngine::new(gated_catalog(), MemoryStore::new());
        let script = "Ada\nada@example.com\nyes\nEngineer\nAcme\ny\nAnalyst\nInitech\nno\n\n";
        let (result, output) = run_script(&mut engine, script);

        assert!(result.is_ok());
        assert!(output.contains("Experience #2 [1/2] Role"));
        let companies: Vec<_> = engine
            .answers()
            .records("experience")
            .filter_map(|record| record.get("company"))
            .collect();
        assert_eq!(companies, vec!["Acme", "Initech"]);
        assert_eq!(engine.answers().text("skills"), Some(""));
    }

    #[test]
    fn wizard_back_keeps_previous_answer_as_prefill() {
        let mut engine = FlowEngine::new(gated_catalog(), MemoryStore::new());
        let (result, output) = run_script(&mut engine, "Ada\n:back\n\nada@example.com\nno\n\n");

        assert!(result.is_ok());
        assert!(output.contains("Current: Ada"));
        assert_eq!(engine.answers().text("name"), Some("Ada"));
    }

    #[test]
    fn wizard_reprompts_after_invalid_answer() {
        let mut engine = FlowEngine::new(gated_catalog(), MemoryStore::new());
        let (result, _) = run_script(&mut engine, "Ada\nnot-an-email\nada@example.com\nno\n\n");

        assert!(result.is_ok());
        assert_eq!(engine.answers().text("email"), Some("ada@example.com"));
    }

    #[test]
    fn wizard_clear_command_starts_over() {
        let mut engine = FlowEngine::new(gated_catalog(), MemoryStore::new());
        let (result, _) = run_script(&mut engine, "Ada\n:clear\nGrace\nexit\n");

        assert!(result.is_err());
        assert_eq!(engine.answers().text("name"), Some("Grace"));
        assert_eq!(engine.answers().len(), 1);
    }

    #[test]
    fn wizard_reports_closed_input() {
        let mut engine = FlowEngine::new(gated_catalog(), MemoryStore::new());
        let (result, _) = run_script(&mut engine, "Ada\n");

        let err = result.expect_err("input ran out");
        assert!(err.to_string().contains("input closed"));
        assert_eq!(engine.answers().text("name"), Some("Ada"));
    }

    #[test]
    fn wizard_persists_each_answer() {
        let mut engine = FlowEngine::new(gated_catalog(), MemoryStore::new());
        let _ = run_script(&mut engine, "Ada\nexit\n");

        let reloaded = FlowEngine::load(gated_catalog(), engine.store().clone(), StoreFormat::Json);
        assert_eq!(reloaded.answers().text("name"), Some("Ada"));
    }

    #[test]
    fn store_root_prefers_explicit_path() {
        let root = resolve_store_root(Some(PathBuf::from("custom"))).expect("root");
        assert_eq!(root, PathBuf::from("custom"));
        assert!(resolve_store_root(Some(PathBuf::new())).is_err());
    }

    fn builtin_walk(photo: &Path) -> String {
        let photo = photo.display().to_string();
        let answers = [
            "Ada Lovelace",
            "Analyst",
            "12 St James's Square, London",
            "+44 20 7946 0000",
            "ada@example.com",
            "linkedin.com/in/ada",
            "",
            photo.as_str(),
            "Writes programs for engines that do not exist yet.",
            "Mathematics",
            "University of London",
            "1832",
            "1835",
            "",
            "",
            "no",
            "no",
            "",
            "",
            "First published algorithm",
            "",
            "Mathematics, Poetry",
            "Horse riding",
            "English, French",
            "Female",
            "10/12/1815",
            "British",
        ];
        format!("{}\n", answers.join("\n"))
    }

    fn prepared_store() -> Result<assert_fs::TempDir, Box<dyn std::error::Error>> {
        let workspace = assert_fs::TempDir::new()?;
        let photo = workspace.child("me.png");
        photo.write_binary(PNG_BYTES)?;

        let mut cmd = Command::cargo_bin("resume-wizard")?;
        cmd.arg("--store")
            .arg(workspace.path().join("store"))
            .arg("wizard")
            .write_stdin(builtin_walk(photo.path()))
            .assert()
            .success();
        Ok(workspace)
    }

    #[test]
    fn wizard_command_saves_answers_and_renders_json() -> Result<(), Box<dyn std::error::Error>> {
        let workspace = prepared_store()?;
        let store = workspace.path().join("store");
        assert!(store.join("proresAnswers").exists());

        let output = Command::cargo_bin("resume-wizard")?
            .arg("--store")
            .arg(&store)
            .args(["render", "--format", "json"])
            .output()?;
        assert!(output.status.success());
        let document: Value = serde_json::from_slice(&output.stdout)?;
        let kinds: Vec<_> = document["sections"]
            .as_array()
            .expect("sections")
            .iter()
            .filter_map(|section| section["kind"].as_str())
            .collect();
        assert!(kinds.contains(&"education"));
        assert!(kinds.contains(&"achievements"));
        assert!(!kinds.contains(&"experience"));
        assert!(!kinds.contains(&"projects"));
        Ok(())
    }

    #[test]
    fn completed_session_shows_document_without_questions()
    -> Result<(), Box<dyn std::error::Error>> {
        let workspace = prepared_store()?;

        let output = Command::cargo_bin("resume-wizard")?
            .env(STORE_ENV, workspace.path().join("store"))
            .arg("wizard")
            .write_stdin("")
            .output()?;
        assert!(output.status.success());
        let stdout = String::from_utf8(output.stdout)?;
        assert!(stdout.contains("Saved answers found"));
        assert!(stdout.contains("ADA LOVELACE"));
        Ok(())
    }

    #[test]
    fn export_writes_standalone_html() -> Result<(), Box<dyn std::error::Error>> {
        let workspace = prepared_store()?;
        let target = workspace.child("resume.html");

        Command::cargo_bin("resume-wizard")?
            .arg("--store")
            .arg(workspace.path().join("store"))
            .args(["export", "--mode", "print", "--out"])
            .arg(target.path())
            .assert()
            .success();

        let html = fs::read_to_string(target.path())?;
        assert!(html.contains("Ada Lovelace"));
        assert!(html.contains("data:image/png;base64,"));
        assert!(html.contains("window.print()"));
        Ok(())
    }

    #[test]
    fn export_to_missing_directory_explains_how_to_fix() -> Result<(), Box<dyn std::error::Error>> {
        let workspace = prepared_store()?;
        let target = workspace.path().join("missing").join("resume.html");

        let output = Command::cargo_bin("resume-wizard")?
            .arg("--store")
            .arg(workspace.path().join("store"))
            .arg("export")
            .arg("--out")
            .arg(&target)
            .output()?;
        assert!(!output.status.success());
        let stderr = String::from_utf8(output.stderr)?;
        assert!(stderr.contains("--out"));
        Ok(())
    }

    #[test]
    fn settings_toggle_list_mode_persists() -> Result<(), Box<dyn std::error::Error>> {
        let store = TempDir::new()?;

        Command::cargo_bin("resume-wizard")?
            .arg("--store")
            .arg(store.path())
            .args(["settings", "list-mode", "skills"])
            .assert()
            .success();

        let output = Command::cargo_bin("resume-wizard")?
            .arg("--store")
            .arg(store.path())
            .args(["settings", "show"])
            .output()?;
        let settings: Value = serde_json::from_slice(&output.stdout)?;
        assert_eq!(settings["list_modes"]["skills"], "inline");

        Command::cargo_bin("resume-wizard")?
            .arg("--store")
            .arg(store.path())
            .args(["settings", "list-mode", "address"])
            .assert()
            .failure();
        Ok(())
    }

    #[test]
    fn clear_removes_saved_answers() -> Result<(), Box<dyn std::error::Error>> {
        let workspace = prepared_store()?;
        let store = workspace.path().join("store");

        Command::cargo_bin("resume-wizard")?
            .arg("--store")
            .arg(&store)
            .arg("clear")
            .assert()
            .success();
        assert!(!store.join("proresAnswers").exists());

        Command::cargo_bin("resume-wizard")?
            .arg("--store")
            .arg(&store)
            .arg("render")
            .assert()
            .failure();
        Ok(())
    }

    #[test]
    fn schema_prints_answer_schema() -> Result<(), Box<dyn std::error::Error>> {
        let output = Command::cargo_bin("resume-wizard")?.arg("schema").output()?;
        assert!(output.status.success());
        let schema: Value = serde_json::from_slice(&output.stdout)?;
        assert_eq!(schema["title"], "AnswerSet");
        Ok(())
    }
}
