//! Self-contained HTML report.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, TimeZone};
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use crate::analysis::{AnalysisResult, FutureIdentity, Theme};

const PILL_CHARS: usize = 64;

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

const STYLE: &str = r#"  body { font-family: Inter, ui-sans-serif, system-ui, -apple-system, Segoe UI, Roboto, Arial, sans-serif; background:#0b0b10; color:#f6f6f6; margin:0; }
  .wrap { max-width: 1100px; margin: 32px auto; padding: 0 20px; }
  h1 { font-size: 32px; margin: 0 0 16px; }
  .muted { color:#aaa; font-size: 14px; margin-bottom: 28px; }
  .grid { display:grid; grid-template-columns: repeat(auto-fit,minmax(280px,1fr)); gap:16px; }
  .card { background:#14141d; border-radius:16px; padding:16px; box-shadow: 0 2px 24px rgba(0,0,0,.3); }
  .pill { display:inline-block; background:#222236; color:#9cc4ff; border:1px solid #334; border-radius:999px; padding:4px 10px; font-size:12px; margin:0 6px 6px 0; }
  .section { margin-top: 28px; }
  .affirm { font-weight:600; margin:8px 0; }
  .small { font-size: 12px; color:#9a9a9a; }
"#;

/// Render the full page. `generated_at` is shown in the subtitle.
pub fn render_html<Tz>(analysis: &AnalysisResult, generated_at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let themes: String = analysis.themes().iter().take(8).map(theme_card).collect();
    let identities: String = analysis
        .future_identities()
        .iter()
        .take(4)
        .map(identity_card)
        .collect();
    let affirmations: String = analysis
        .affirmations()
        .iter()
        .take(8)
        .map(|a| format!(r#"<div class="card affirm">{}</div>"#, escape_html(a)))
        .collect();
    let actions: String = analysis
        .action_prompts()
        .iter()
        .take(4)
        .map(|a| format!(r#"<div class="card">→ {}</div>"#, escape_html(a)))
        .collect();

    let mut html = String::new();
    html.push_str("<!doctype html>\n<html>\n<head>\n<meta charset=\"utf-8\" />\n");
    html.push_str("<title>Vision Board</title>\n<style>\n");
    html.push_str(STYLE);
    html.push_str("</style>\n</head>\n<body>\n  <div class=\"wrap\">\n");
    html.push_str("    <h1>Future Self Vision Board</h1>\n");
    html.push_str(&format!(
        "    <div class=\"muted\">Generated locally • {}</div>\n",
        generated_at.format("%Y-%m-%d %H:%M")
    ));
    html.push_str(&section("Themes", &themes));
    html.push_str(&section("Future Identities", &identities));
    html.push_str(&section("Affirmations", &affirmations));
    html.push_str(&section("Today’s Action Prompts", &actions));
    html.push_str(
        "    <p class=\"small section\">Tip: re-run weekly to watch your board evolve as your local work changes.</p>\n",
    );
    html.push_str("  </div>\n</body>\n</html>\n");
    html
}

/// Render with the current local time and write to `path`.
pub fn write_html(analysis: &AnalysisResult, path: &Path) -> Result<PathBuf> {
    let html = render_html(analysis, &Local::now());
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, html).with_context(|| format!("Failed to write HTML report: {}", path.display()))?;
    Ok(path.to_path_buf())
}

fn section(title: &str, cards: &str) -> String {
    format!(
        "\n    <div class=\"section\">\n      <h2>{}</h2>\n      <div class=\"grid\">\n        {}\n      </div>\n    </div>\n",
        title, cards
    )
}

fn theme_card(theme: &Theme) -> String {
    let pills: String = theme
        .evidence
        .iter()
        .take(3)
        .map(|e| format!(r#"<span class="pill">{}</span>"#, escape_html(&shorten(e, PILL_CHARS))))
        .collect();
    format!(
        r#"<div class="card"><h3>{}</h3><div>{}</div></div>"#,
        escape_html(&theme.name),
        pills
    )
}

fn identity_card(identity: &FutureIdentity) -> String {
    format!(
        r#"<div class="card"><h3>{}</h3><p>{}</p></div>"#,
        escape_html(&identity.title),
        escape_html(&identity.why)
    )
}

/// Collapse whitespace runs and cap at `n` chars, ending in "…" when cut.
pub fn shorten(s: &str, n: usize) -> String {
    let collapsed = WHITESPACE.replace_all(s.trim(), " ");
    if collapsed.chars().count() <= n {
        return collapsed.into_owned();
    }
    let mut out: String = collapsed.chars().take(n.saturating_sub(1)).collect();
    out.push('…');
    out
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
