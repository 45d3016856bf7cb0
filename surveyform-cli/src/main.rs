//! `surveyform`: load a household record, apply field edits through the form
//! engine, and print the reconciled result.

use std::fmt::Write as FmtWrite;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser};
use color_eyre::eyre::{Report, Result, WrapErr, eyre};
use tracing_subscriber::EnvFilter;

use surveyform::{
    DocumentFormat, GeneralInfoValidator, OutputDestination, StepIntent, WizardState,
    io::{
        HouseholdDocument, OutputOptions, Rendering, emit_text, parse_household_str,
        serialize_document,
    },
    presentation::render_household,
};

#[derive(Debug, Parser)]
#[command(
    name = "surveyform",
    version,
    about = "Apply edits to household survey records and check them offline"
)]
struct Cli {
    /// Household record: file path, inline payload, or "-" for stdin
    #[arg(short = 'r', long = "record", value_name = "SPEC")]
    record: Option<String>,

    /// Id used when the record has none
    #[arg(long = "id", value_name = "ID", default_value = "draft")]
    id: String,

    /// Field assignment as step.field=value (empty value clears). Repeatable.
    #[arg(long = "set", value_name = "ASSIGNMENT", action = ArgAction::Append)]
    assignments: Vec<String>,

    /// Check the general step and fail on the first blocking issue
    #[arg(long = "validate")]
    validate: bool,

    /// Print a label/value summary instead of the document
    #[arg(long = "summary")]
    summary: bool,

    /// Column width for --summary
    #[arg(long = "width", value_name = "COLUMNS", default_value_t = 80)]
    width: usize,

    /// Output destinations ("-" writes to stdout). Defaults to stdout.
    #[arg(short = 'o', long = "output", value_name = "DEST", num_args = 1.., action = ArgAction::Append)]
    outputs: Vec<String>,

    /// Emit compact JSON/TOML rather than pretty formatting
    #[arg(long = "no-pretty")]
    no_pretty: bool,

    /// Overwrite output files even if they already exist
    #[arg(short = 'f', long = "force", short_alias = 'y', alias = "yes")]
    force: bool,
}

#[derive(Debug)]
enum InputSource {
    File(PathBuf),
    Stdin,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();
    let cli = Cli::parse();

    let mut diagnostics = DiagnosticCollector::default();

    let input_format = cli
        .record
        .as_deref()
        .filter(|spec| *spec != "-")
        .and_then(|spec| DocumentFormat::from_path(Path::new(spec)))
        .unwrap_or_default();

    let document = match cli.record.as_deref() {
        Some(spec) => match load_document(spec, input_format) {
            Ok(document) => Some(document),
            Err(err) => {
                diagnostics.push_input("record", format!("{err:#}"));
                None
            }
        },
        None => Some(HouseholdDocument::default()),
    };

    let mut intents = Vec::with_capacity(cli.assignments.len());
    for raw in &cli.assignments {
        match StepIntent::parse_assignment(raw) {
            Ok(intent) => intents.push(intent),
            Err(err) => diagnostics.push_input("set", err.to_string()),
        }
    }

    let options = build_output_options(&cli, input_format, &mut diagnostics);
    ensure_output_paths_available(&options.destinations, cli.force, &mut diagnostics);

    diagnostics.into_result()?;
    let document = document.ok_or_else(|| eyre!("no household record loaded"))?;

    let household = document.into_household(cli.id.clone());
    let (mut state, _preloads) = WizardState::from_payload(household.payload);
    for intent in intents {
        let dispatched = state
            .dispatch(intent)
            .wrap_err("failed to apply assignment")?;
        for change in &dispatched.changes {
            tracing::info!(step = %change.step(), fields = ?change.changed_names(), "applied");
        }
    }

    if cli.validate {
        let validator = GeneralInfoValidator::new().map_err(|err| eyre!("{err:#}"))?;
        let issues = validator.validate(state.general());
        if let Some(first) = issues.first() {
            for issue in &issues {
                eprintln!(
                    "{}",
                    serde_json::json!({ "field": issue.field, "message": issue.message })
                );
            }
            return Err(eyre!("validation failed: {}", first.message));
        }
    }

    let rendered = match options.rendering {
        Rendering::Summary { width } => render_household(&state.payload(), width),
        Rendering::Document(format) => {
            let output = HouseholdDocument {
                id: Some(household.id),
                status: household.status,
                payload: state.payload(),
            };
            serialize_document(&output, format, options.pretty).map_err(|err| eyre!("{err:#}"))?
        }
    };
    emit_text(&rendered, &options.destinations).map_err(|err| eyre!("{err:#}"))?;

    Ok(())
}

fn load_document(spec: &str, format: DocumentFormat) -> Result<HouseholdDocument> {
    if spec == "-" {
        let contents = read_from_source(&InputSource::Stdin)?;
        return parse_contents(&contents, format, "record");
    }

    let path = PathBuf::from(spec);
    match read_from_source(&InputSource::File(path.clone())) {
        Ok(contents) => parse_contents(&contents, format, "record"),
        Err(err) => {
            if is_not_found(&err) {
                return parse_contents(spec, format, "inline record");
            }
            Err(err.wrap_err(format!("failed to load record from {}", path.display())))
        }
    }
}

fn read_from_source(source: &InputSource) -> Result<String> {
    match source {
        InputSource::Stdin => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .wrap_err("failed to read from stdin")?;
            Ok(buffer)
        }
        InputSource::File(path) => fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read file {}", path.display())),
    }
}

fn is_not_found(err: &Report) -> bool {
    err.downcast_ref::<io::Error>()
        .is_some_and(|io_err| io_err.kind() == io::ErrorKind::NotFound)
}

fn parse_contents(contents: &str, format: DocumentFormat, label: &str) -> Result<HouseholdDocument> {
    parse_household_str(contents, format).map_err(|err| eyre!("failed to parse {label}: {err:#}"))
}

#[derive(Default)]
struct DiagnosticCollector {
    messages: Vec<String>,
}

impl DiagnosticCollector {
    fn push_input(&mut self, label: &str, message: impl Into<String>) {
        self.messages
            .push(format!("input ({label}): {}", message.into()));
    }

    fn push_output(&mut self, message: impl Into<String>) {
        self.messages.push(format!("output: {}", message.into()));
    }

    fn into_result(self) -> Result<()> {
        if self.messages.is_empty() {
            return Ok(());
        }
        let mut body = String::from("encountered input/output issues:\n");
        for (idx, msg) in self.messages.iter().enumerate() {
            let _ = writeln!(body, "  {}. {}", idx + 1, msg);
        }
        Err(eyre!(body))
    }
}

fn build_output_options(
    cli: &Cli,
    input_format: DocumentFormat,
    diagnostics: &mut DiagnosticCollector,
) -> OutputOptions {
    let mut destinations = Vec::new();
    for raw in &cli.outputs {
        if raw.trim().is_empty() {
            diagnostics.push_output("output destination cannot be empty");
            continue;
        }
        destinations.push(OutputDestination::parse(raw));
    }
    if destinations.is_empty() {
        destinations.push(OutputDestination::Stdout);
    }

    let options = if cli.summary {
        OutputOptions::summary(cli.width)
    } else {
        let format = infer_format_from_files(&destinations, diagnostics).unwrap_or(input_format);
        OutputOptions::new(format)
    };
    options
        .with_pretty(!cli.no_pretty)
        .with_destinations(destinations)
}

fn infer_format_from_files(
    destinations: &[OutputDestination],
    diagnostics: &mut DiagnosticCollector,
) -> Option<DocumentFormat> {
    let mut detected: Option<DocumentFormat> = None;
    for destination in destinations {
        let OutputDestination::File(path) = destination else {
            continue;
        };
        match DocumentFormat::from_path(path) {
            Some(format) => match detected {
                Some(existing) if existing != format => diagnostics.push_output(format!(
                    "output file {} uses {format} but other destinations use {existing}; align extensions",
                    path.display()
                )),
                Some(_) => {}
                None => detected = Some(format),
            },
            None => diagnostics.push_output(format!(
                "cannot infer format from output file {}; use one of {}",
                path.display(),
                format_list()
            )),
        }
    }
    detected
}

fn format_list() -> String {
    let items: Vec<String> = DocumentFormat::available_formats()
        .into_iter()
        .map(|fmt| format!(".{fmt}"))
        .collect();
    items.join("/")
}

fn ensure_output_paths_available(
    destinations: &[OutputDestination],
    force: bool,
    diagnostics: &mut DiagnosticCollector,
) {
    if force {
        return;
    }
    for destination in destinations {
        if let OutputDestination::File(path) = destination
            && path.exists()
        {
            diagnostics.push_output(format!(
                "file {} already exists (pass --force to overwrite)",
                path.display()
            ));
        }
    }
}
