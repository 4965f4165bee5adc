//! Integration tests for the sample -> prompt -> parse -> render pipeline.
//!
//! The model is replaced by a stub returning canned responses from
//! testdata/responses, so these run offline.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use visionboard::cli::{self, BoardError};
use visionboard::config::Config;
use visionboard::model::{ModelClient, TransportError};
use visionboard::prompt::PromptOptions;
use visionboard::render;
use visionboard::ParseError;

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn notes_path() -> PathBuf {
    testdata_path().join("notes")
}

fn canned(name: &str) -> String {
    fs::read_to_string(testdata_path().join("responses").join(name)).expect("should read fixture")
}

/// Returns a fixed reply and remembers the last prompt.
struct StubModel {
    reply: String,
    last_prompt: RefCell<String>,
}

impl StubModel {
    fn new(reply: String) -> Self {
        Self {
            reply,
            last_prompt: RefCell::new(String::new()),
        }
    }
}

impl ModelClient for StubModel {
    fn name(&self) -> &str {
        "stub"
    }

    fn generate(&self, prompt: &str) -> Result<String, TransportError> {
        *self.last_prompt.borrow_mut() = prompt.to_string();
        Ok(self.reply.clone())
    }
}

fn names(files: &[PathBuf], root: &Path) -> Vec<String> {
    files
        .iter()
        .map(|f| f.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
        .collect()
}

#[test]
fn test_sample_fixture_folder() {
    let root = notes_path();
    let sample = cli::sample(&root, &Config::default()).expect("sampling should succeed");

    assert_eq!(
        names(&sample.files, &root),
        vec![
            "blank.txt",
            "budget.csv",
            "garden-journal.md",
            "projects/habit_tracker.py",
            "trail-run.png",
            "training-log.txt",
        ]
    );

    // blank.txt holds only whitespace and is dropped
    let record_names: Vec<&str> = sample.payload.records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(record_names.len(), 5);
    assert!(!record_names.contains(&"blank.txt"));

    let image = sample
        .payload
        .records
        .iter()
        .find(|r| r.name == "trail-run.png")
        .expect("image record");
    assert_eq!(image.snippet, "image:trail-run • 3x2");

    assert!(!sample.payload.sparse);
    assert!(sample.payload.fits(8000));
    assert_eq!(sample.payload.per_file, 120);
}

#[test]
fn test_excluded_paths_are_not_sampled() {
    let root = notes_path();
    let mut config = Config::default();
    config.scan.excluded_paths = vec!["**/projects/**".to_string(), "**/*.png".to_string()];

    let sample = cli::sample(&root, &config).unwrap();
    let sampled = names(&sample.files, &root);
    assert_eq!(sampled.len(), 4);
    assert!(sampled.iter().all(|n| !n.starts_with("projects/") && !n.ends_with(".png")));
}

#[test]
fn test_tight_bound_shrinks_snippets() {
    let mut config = Config::default();
    config.payload.max_chars = 700;

    let sample = cli::sample(&notes_path(), &config).unwrap();
    let payload = &sample.payload;
    assert!(payload.per_file < 120);
    assert!(payload.fits(700) || payload.per_file == config.payload.min_per_file);
    for record in &payload.records {
        assert!(record.snippet.chars().count() <= payload.per_file);
    }
}

#[test]
fn test_whitespace_only_folder_falls_back_to_names() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("morning-pages.txt"), "  \n ").unwrap();
    fs::write(dir.path().join("ideas.md"), "\t\t").unwrap();

    let sample = cli::sample(dir.path(), &Config::default()).unwrap();
    assert!(sample.payload.sparse);
    let snippets: Vec<&str> = sample.payload.records.iter().map(|r| r.snippet.as_str()).collect();
    assert_eq!(snippets, vec!["ideas", "morning-pages"]);

    let stub = StubModel::new(canned("strict.json"));
    cli::analyze(&sample.payload, &PromptOptions::default(), &stub).unwrap();
    assert!(stub.last_prompt.borrow().contains("only its file name"));
}

#[test]
fn test_end_to_end_with_fenced_response() {
    let sample = cli::sample(&notes_path(), &Config::default()).unwrap();
    let stub = StubModel::new(canned("fenced.txt"));

    let analysis = cli::analyze(&sample.payload, &PromptOptions::default(), &stub)
        .expect("fenced JSON should be recovered");

    let prompt = stub.last_prompt.borrow().clone();
    assert!(prompt.ends_with(&format!("{}\n", sample.payload.json)));
    assert!(prompt.contains("Here are 5 sampled files/snippets as JSON:"));

    let themes = analysis.themes();
    assert_eq!(themes.len(), 2);
    assert_eq!(themes[1].evidence, vec!["training-log.txt", "trail-run.png"]);

    let board = render::render_ascii_board(&analysis);
    assert!(board.contains("• Home Gardening"));
    assert!(board.contains("» Half-Marathon Finisher"));
    assert!(board.contains("→ Book a recovery run."));

    let out = TempDir::new().unwrap();
    let html_path = render::write_html(&analysis, &out.path().join("vision-board.html")).unwrap();
    let html = fs::read_to_string(html_path).unwrap();
    assert!(html.contains("<h3>Endurance Running</h3>"));
    assert!(html.contains("Small steps compound."));

    // no scene images: text board
    let collage = render::compose_board(&[], &analysis);
    let png = render::write_collage(&collage, &out.path().join("board.png")).unwrap();
    assert_eq!(image::image_dimensions(png).unwrap(), (1200, 1400));
}

#[test]
fn test_unparseable_response_carries_excerpt() {
    let sample = cli::sample(&notes_path(), &Config::default()).unwrap();
    let reply = canned("no_json.txt");
    let stub = StubModel::new(reply.clone());

    match cli::analyze(&sample.payload, &PromptOptions::default(), &stub) {
        Err(BoardError::Parse(ParseError::NoJsonFound { excerpt })) => assert_eq!(excerpt, reply),
        other => panic!("expected NoJsonFound, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_empty_response_is_reported() {
    let sample = cli::sample(&notes_path(), &Config::default()).unwrap();
    let stub = StubModel::new("  \n".to_string());
    let err = cli::analyze(&sample.payload, &PromptOptions::default(), &stub).unwrap_err();
    assert!(matches!(err, BoardError::Parse(ParseError::EmptyResponse)));
}

#[test]
fn test_scene_prompt_requested_for_collage() {
    let sample = cli::sample(&notes_path(), &Config::default()).unwrap();
    let stub = StubModel::new(canned("strict.json"));
    let options = PromptOptions { include_scenes: true };
    cli::analyze(&sample.payload, &options, &stub).unwrap();
    assert!(stub.last_prompt.borrow().contains("vision_board_scenes"));
}
