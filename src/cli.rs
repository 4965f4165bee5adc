//! Command-line interface for visionboard.

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::analysis::AnalysisResult;
use crate::config::{self, Config, Transport};
use crate::model::{self, ModelClient, OpenAiImageClient, TransportError};
use crate::payload::{self, EncodedPayload, FileRecord};
use crate::prompt::{self, PromptOptions};
use crate::render;
use crate::response::{self, ParseError};
use crate::scan;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Turn a folder of notes and images into a future-self vision board.
///
/// Samples local files, sends short snippets to a Gemini model, and renders
/// the recurring themes, future identities, affirmations and action
/// prompts it finds.
#[derive(Parser)]
#[command(name = "visionboard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a vision board from a folder
    #[command(visible_alias = "scan")]
    Board(BoardArgs),
    /// Create a visionboard config file from a template
    Init(InitArgs),
}

/// Arguments for the board command.
#[derive(Parser)]
pub struct BoardArgs {
    /// Folder to sample
    pub root: PathBuf,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Maximum number of files to sample
    #[arg(long)]
    pub max_files: Option<usize>,

    /// Model name, e.g. gemini-1.5-pro
    #[arg(short, long)]
    pub model: Option<String>,

    /// Model transport: api or cli
    #[arg(short, long)]
    pub transport: Option<Transport>,

    /// HTML report path
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Do not print the ASCII board
    #[arg(long)]
    pub no_ascii: bool,

    /// Also write a collage PNG to this path
    #[arg(long)]
    pub collage: Option<PathBuf>,

    /// Upper bound on the serialized payload, in chars
    #[arg(long)]
    pub max_chars: Option<usize>,

    /// Print the bounded payload JSON and exit without calling the model
    #[arg(long)]
    pub dump_payload: bool,
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "visionboard.yaml")]
    pub output: PathBuf,

    /// Template to use
    #[arg(short, long, default_value = DEFAULT_TEMPLATE)]
    pub template: String,

    /// List available templates
    #[arg(short, long)]
    pub list: bool,
}

/// Template written by `init` when none is named.
pub const DEFAULT_TEMPLATE: &str = "api";

/// A config template bundled into the binary.
struct Template {
    name: &'static str,
    description: &'static str,
    /// Printed after the file is written
    setup_hint: &'static str,
    content: &'static str,
}

static TEMPLATES: &[Template] = &[
    Template {
        name: "api",
        description: "Gemini over HTTPS; needs GEMINI_API_KEY or GOOGLE_API_KEY",
        setup_hint: "export GEMINI_API_KEY (or put it in .env)",
        content: include_str!("templates/api.yaml"),
    },
    Template {
        name: "cli",
        description: "Local Gemini CLI subprocess; uses the CLI's own login",
        setup_hint: "install the gemini CLI and sign in once, or set GEMINI_BIN",
        content: include_str!("templates/cli.yaml"),
    },
];

impl Template {
    fn find(name: &str) -> Result<&'static Template, InitError> {
        TEMPLATES
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| InitError::UnknownTemplate(name.to_string()))
    }
}

/// Reasons `init` refuses to write a config.
#[derive(Error, Debug)]
pub enum InitError {
    #[error("unknown template {0:?}")]
    UnknownTemplate(String),
    #[error("{} already exists", .0.display())]
    AlreadyExists(PathBuf),
    #[error("writing {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Failures that end a run with [`EXIT_FAILED`].
#[derive(Error, Debug)]
pub enum BoardError {
    #[error("model call failed: {0}")]
    Transport(#[from] TransportError),
    #[error("{0}")]
    Parse(#[from] ParseError),
}

/// Files sampled from a folder and the payload built from them.
#[derive(Debug)]
pub struct Sample {
    pub files: Vec<PathBuf>,
    pub payload: EncodedPayload,
}

/// Walk `root`, extract snippets and encode them under the configured bound.
///
/// When no snippet survives extraction, the payload falls back to file
/// names and is flagged sparse.
pub fn sample(root: &Path, config: &Config) -> anyhow::Result<Sample> {
    let files = scan::list_files(root, &config.scan)
        .with_context(|| format!("Failed to scan {}", root.display()))?;
    info!(files = files.len(), root = %root.display(), "sampled files");

    let snippets = scan::build_context_snippets(
        &files,
        config.scan.per_file_chars,
        config.scan.max_read_bytes,
    );

    let payload = if snippets.is_empty() {
        if !files.is_empty() {
            warn!("no readable snippets; falling back to file names");
        }
        payload::encode_fallback(&files, &config.payload)
    } else {
        let records: Vec<FileRecord> = snippets.into_iter().map(FileRecord::from).collect();
        payload::encode(&records, &config.payload)
    };

    debug!(
        chars = payload.char_len(),
        per_file = payload.per_file,
        sparse = payload.sparse,
        "encoded payload"
    );
    if !payload.fits(config.payload.max_chars) {
        warn!(
            chars = payload.char_len(),
            max_chars = config.payload.max_chars,
            "payload still exceeds the bound at the minimum snippet length"
        );
    }

    Ok(Sample { files, payload })
}

/// Prompt the model with the payload and parse its reply.
pub fn analyze(
    payload: &EncodedPayload,
    options: &PromptOptions,
    client: &dyn ModelClient,
) -> Result<AnalysisResult, BoardError> {
    let prompt = prompt::themes_prompt(payload, options);
    debug!(prompt_chars = prompt.chars().count(), model = client.name(), "sending prompt");

    let raw = client.generate(&prompt)?;
    debug!(
        preview = payload::truncate_chars(&raw, 200),
        "raw model response"
    );

    Ok(response::parse_response(&raw)?)
}

/// Apply command-line overrides on top of the loaded config.
pub fn apply_overrides(config: &mut Config, args: &BoardArgs) {
    if let Some(n) = args.max_files {
        config.scan.max_files = n;
    }
    if let Some(ref name) = args.model {
        config.model.name = name.clone();
    }
    if let Some(transport) = args.transport {
        config.model.transport = transport;
    }
    if let Some(ref out) = args.out {
        config.output.html = out.clone();
    }
    if args.no_ascii {
        config.output.ascii = false;
    }
    if let Some(ref collage) = args.collage {
        config.output.collage = Some(collage.clone());
    }
    if let Some(n) = args.max_chars {
        config.payload.max_chars = n;
    }
}

/// Run the board command.
pub fn run_board(args: &BoardArgs) -> anyhow::Result<i32> {
    let (mut config, config_path) = match Config::load(args.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };
    apply_overrides(&mut config, args);

    if let Err(e) = config::validate(&config) {
        eprintln!("Error: {}", e);
        return Ok(EXIT_ERROR);
    }

    let root = match args.root.canonicalize() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: cannot access path {:?}: {}", args.root, e);
            return Ok(EXIT_ERROR);
        }
    };

    match &config_path {
        Some(p) => info!(config = %p.display(), "loaded config"),
        None => info!("using built-in config defaults"),
    }

    let sample = sample(&root, &config)?;

    if args.dump_payload {
        println!("{}", sample.payload.json);
        return Ok(EXIT_SUCCESS);
    }

    if sample.files.is_empty() {
        eprintln!("{} no text or image files found under {}", "Warning:".yellow(), root.display());
        return Ok(EXIT_SUCCESS);
    }

    eprintln!(
        "{} {} files, {} chars (snippets cut to {})",
        "[scan]".cyan().bold(),
        sample.files.len(),
        sample.payload.char_len(),
        sample.payload.per_file
    );

    let client = match model::from_config(&config.model) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_FAILED);
        }
    };

    let options = PromptOptions {
        include_scenes: config.output.collage.is_some(),
    };

    let spinner = spinner(format!("asking {}", client.name()));
    let outcome = analyze(&sample.payload, &options, &*client);
    spinner.finish_and_clear();

    let analysis = match outcome {
        Ok(a) => a,
        Err(e) => {
            eprintln!("{} {}", "[model]".red().bold(), e);
            return Ok(EXIT_FAILED);
        }
    };
    eprintln!("{} response parsed", "[model]".cyan().bold());

    if analysis.is_empty() {
        warn!("model response had none of the expected sections");
    }

    if config.output.ascii {
        println!();
        render::write_ascii_board(&analysis);
    }

    let html = render::write_html(&analysis, &config.output.html)?;
    eprintln!("{} wrote {}", "[done]".green().bold(), html.display());

    if let Some(ref path) = config.output.collage {
        let written = write_collage(&analysis, &config, path)?;
        eprintln!("{} wrote {}", "[done]".green().bold(), written.display());
    }

    Ok(EXIT_SUCCESS)
}

/// Generate scene images when possible and save the collage; any image
/// failure falls back to the text board.
fn write_collage(analysis: &AnalysisResult, config: &Config, path: &Path) -> anyhow::Result<PathBuf> {
    let scenes = analysis.vision_board_scenes();
    let images = if scenes.is_empty() {
        info!("no vision_board_scenes in response; using text board");
        Vec::new()
    } else {
        match OpenAiImageClient::from_env(config.output.image_model.clone()) {
            Ok(client) => {
                let spinner = spinner(format!("generating {} scene images", scenes.len().min(config.output.max_scenes)));
                let result = client.generate_scenes(&scenes, config.output.max_scenes);
                spinner.finish_and_clear();
                result.unwrap_or_else(|e| {
                    warn!(error = %e, "scene generation failed");
                    Vec::new()
                })
            }
            Err(e) => {
                warn!(error = %e, "image generation unavailable; using text board");
                Vec::new()
            }
        }
    };

    let board = render::compose_board(&images, analysis);
    render::write_collage(&board, path)
}

fn spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    if args.list {
        print!("{}", template_list());
        return Ok(EXIT_SUCCESS);
    }

    let written = Template::find(&args.template).and_then(|t| write_template(t, &args.output).map(|_| t));
    match written {
        Ok(template) => {
            println!(
                "{} {} from template '{}'",
                "Created".green().bold(),
                args.output.display(),
                template.name
            );
            println!("  next: {}", template.setup_hint);
            println!("  then: visionboard board <folder> --config {}", args.output.display());
            Ok(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            match e {
                InitError::UnknownTemplate(_) => eprint!("{}", template_list()),
                InitError::AlreadyExists(_) => eprintln!("pass --output to write somewhere else"),
                InitError::Write { .. } => {}
            }
            Ok(EXIT_ERROR)
        }
    }
}

/// Write a template to `output`, creating parent directories. Never
/// overwrites an existing file.
fn write_template(template: &Template, output: &Path) -> Result<(), InitError> {
    let write_err = |source| InitError::Write {
        path: output.to_path_buf(),
        source,
    };

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(output)
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::AlreadyExists => InitError::AlreadyExists(output.to_path_buf()),
            _ => write_err(e),
        })?;
    file.write_all(template.content.as_bytes()).map_err(write_err)?;
    debug!(path = %output.display(), template = template.name, "wrote config template");
    Ok(())
}

/// Template names and descriptions, one per line.
fn template_list() -> String {
    let mut out = String::from("templates:\n");
    for template in TEMPLATES {
        let marker = if template.name == DEFAULT_TEMPLATE { " (default)" } else { "" };
        out.push_str(&format!(
            "  {:<14} {}\n",
            format!("{}{}", template.name, marker),
            template.description
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::fs;
    use tempfile::TempDir;

    struct Canned {
        reply: Result<String, ()>,
        seen: RefCell<Option<String>>,
    }

    impl Canned {
        fn ok(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                seen: RefCell::new(None),
            }
        }
    }

    impl ModelClient for Canned {
        fn name(&self) -> &str {
            "canned"
        }

        fn generate(&self, prompt: &str) -> Result<String, TransportError> {
            *self.seen.borrow_mut() = Some(prompt.to_string());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(()) => Err(TransportError::BinaryNotFound),
            }
        }
    }

    fn board_args(root: &Path) -> BoardArgs {
        BoardArgs {
            root: root.to_path_buf(),
            config: None,
            max_files: None,
            model: None,
            transport: None,
            out: None,
            no_ascii: false,
            collage: None,
            max_chars: None,
            dump_payload: false,
        }
    }

    #[test]
    fn test_templates_parse_and_validate() {
        for template in TEMPLATES {
            let config: Config = serde_yaml::from_str(template.content)
                .unwrap_or_else(|e| panic!("template {} does not parse: {}", template.name, e));
            config::validate(&config).unwrap();
        }
    }

    #[test]
    fn test_cli_template_selects_cli_transport() {
        let cli = TEMPLATES.iter().find(|t| t.name == "cli").unwrap();
        let config: Config = serde_yaml::from_str(cli.content).unwrap();
        assert_eq!(config.model.transport, Transport::Cli);
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = Config::default();
        let mut args = board_args(Path::new("."));
        args.max_files = Some(5);
        args.model = Some("gemini-1.5-pro".to_string());
        args.transport = Some(Transport::Cli);
        args.no_ascii = true;
        args.max_chars = Some(900);
        args.collage = Some(PathBuf::from("board.png"));

        apply_overrides(&mut config, &args);
        assert_eq!(config.scan.max_files, 5);
        assert_eq!(config.model.name, "gemini-1.5-pro");
        assert_eq!(config.model.transport, Transport::Cli);
        assert!(!config.output.ascii);
        assert_eq!(config.payload.max_chars, 900);
        assert_eq!(config.output.collage, Some(PathBuf::from("board.png")));
        assert_eq!(config.output.html, PathBuf::from("vision-board.html"));
    }

    #[test]
    fn test_sample_and_analyze() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("garden.md"), "Planted tomatoes and basil.").unwrap();
        fs::write(dir.path().join("budget.csv"), "month,saved\njan,200").unwrap();

        let sample = sample(dir.path(), &Config::default()).unwrap();
        assert_eq!(sample.files.len(), 2);
        assert!(!sample.payload.sparse);
        assert!(sample.payload.json.contains("Planted tomatoes"));

        let client = Canned::ok("Sure!\n```json\n{\"themes\": [{\"name\": \"Gardening\", \"evidence\": [\"garden.md\"]}]}\n```");
        let analysis = analyze(&sample.payload, &PromptOptions::default(), &client).unwrap();
        assert_eq!(analysis.themes()[0].name, "Gardening");

        let prompt = client.seen.borrow().clone().unwrap();
        assert!(prompt.contains("Here are 2 sampled files/snippets as JSON:"));
    }

    #[test]
    fn test_analyze_reports_parse_failure() {
        let payload = payload::encode(&[], &Default::default());
        let client = Canned::ok("I could not find anything.");
        match analyze(&payload, &PromptOptions::default(), &client) {
            Err(BoardError::Parse(ParseError::NoJsonFound { excerpt })) => {
                assert_eq!(excerpt, "I could not find anything.");
            }
            other => panic!("expected parse error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_analyze_reports_transport_failure() {
        let payload = payload::encode(&[], &Default::default());
        let client = Canned {
            reply: Err(()),
            seen: RefCell::new(None),
        };
        let err = analyze(&payload, &PromptOptions::default(), &client).unwrap_err();
        assert!(matches!(err, BoardError::Transport(TransportError::BinaryNotFound)));
        assert!(err.to_string().starts_with("model call failed"));
    }

    #[test]
    fn test_run_board_dump_payload_skips_model() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        let conf = TempDir::new().unwrap();
        let config_path = conf.path().join("visionboard.yaml");
        fs::write(&config_path, "scan:\n  max_files: 5\n").unwrap();

        let mut args = board_args(dir.path());
        args.config = Some(config_path.clone());
        args.dump_payload = true;
        assert_eq!(run_board(&args).unwrap(), EXIT_SUCCESS);

        // the explicit file is the one loaded
        fs::write(&config_path, "scan:\n  max_files: 0\n").unwrap();
        assert_eq!(run_board(&args).unwrap(), EXIT_ERROR);
    }

    #[test]
    fn test_run_board_missing_root() {
        let dir = TempDir::new().unwrap();
        let args = board_args(&dir.path().join("nope"));
        assert_eq!(run_board(&args).unwrap(), EXIT_ERROR);
    }

    #[test]
    fn test_run_init_writes_template_once() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("conf/visionboard.yaml");
        let args = InitArgs {
            output: output.clone(),
            template: "cli".to_string(),
            list: false,
        };
        assert_eq!(run_init(&args).unwrap(), EXIT_SUCCESS);
        let (config, _) = Config::load(Some(&output)).unwrap();
        assert_eq!(config.model.transport, Transport::Cli);
        assert_eq!(run_init(&args).unwrap(), EXIT_ERROR);
    }

    #[test]
    fn test_write_template_never_overwrites() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("visionboard.yaml");
        fs::write(&output, "# mine\n").unwrap();

        let err = write_template(Template::find("api").unwrap(), &output).unwrap_err();
        assert!(matches!(err, InitError::AlreadyExists(ref p) if p == &output));
        assert_eq!(fs::read_to_string(&output).unwrap(), "# mine\n");
    }

    #[test]
    fn test_template_lookup() {
        assert_eq!(Template::find(" CLI ").unwrap().name, "cli");
        assert_eq!(Template::find(DEFAULT_TEMPLATE).unwrap().name, "api");
        let err = Template::find("fancy").err().unwrap();
        assert_eq!(err.to_string(), "unknown template \"fancy\"");
    }

    #[test]
    fn test_template_list_marks_default() {
        let list = template_list();
        assert!(list.contains("api (default)"));
        assert!(list.contains("cli "));
        assert_eq!(list.lines().count(), TEMPLATES.len() + 1);
    }

    #[test]
    fn test_run_init_unknown_template() {
        let dir = TempDir::new().unwrap();
        let args = InitArgs {
            output: dir.path().join("x.yaml"),
            template: "fancy".to_string(),
            list: false,
        };
        assert_eq!(run_init(&args).unwrap(), EXIT_ERROR);
        assert!(!args.output.exists());
    }
}
