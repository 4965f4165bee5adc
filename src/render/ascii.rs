//! Terminal board.

use colored::*;

use crate::analysis::AnalysisResult;

const WIDTH: usize = 72;

const TITLE: &str = " FUTURE SELF VISION BOARD ";
const SECTIONS: [&str; 4] = [
    " THEMES ",
    " FUTURE IDENTITIES ",
    " AFFIRMATIONS ",
    " TODAY'S ACTION PROMPTS ",
];

/// Render the board as plain text, one section per recognized key.
pub fn render_ascii_board(analysis: &AnalysisResult) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push("=".repeat(WIDTH));
    lines.push(center(TITLE, WIDTH));
    lines.push("=".repeat(WIDTH));
    lines.push(String::new());

    section(&mut lines, SECTIONS[0]);
    for t in analysis.themes().iter().take(6) {
        lines.push(format!("• {}", t.name));
        let evidence: Vec<&str> = t.evidence.iter().take(3).map(String::as_str).collect();
        if !evidence.is_empty() {
            lines.push(format!("   evidence: {}", evidence.join(", ")));
        }
    }
    lines.push(String::new());

    section(&mut lines, SECTIONS[1]);
    for fi in analysis.future_identities().iter().take(3) {
        lines.push(format!("» {}", fi.title));
        lines.push(format!("   {}", fi.why));
    }
    lines.push(String::new());

    section(&mut lines, SECTIONS[2]);
    for a in analysis.affirmations().iter().take(6) {
        lines.push(format!("✓ {}", a));
    }
    lines.push(String::new());

    section(&mut lines, SECTIONS[3]);
    for ap in analysis.action_prompts().iter().take(3) {
        lines.push(format!("→ {}", ap));
    }
    lines.push(String::new());

    lines.join("\n")
}

/// Print the board with colored rules and headings.
pub fn write_ascii_board(analysis: &AnalysisResult) {
    for line in render_ascii_board(analysis).lines() {
        if line.starts_with("===") || line.starts_with("---") {
            println!("{}", line.dimmed());
        } else if line.trim() == TITLE.trim() {
            println!("{}", line.bold());
        } else if SECTIONS.contains(&line) {
            println!("{}", line.cyan().bold());
        } else {
            println!("{}", line);
        }
    }
}

fn section(lines: &mut Vec<String>, title: &str) {
    lines.push(title.to_string());
    lines.push("-".repeat(WIDTH));
}

/// Center `text` in `width` columns, extra padding on the right.
fn center(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }
    let total = width - len;
    let left = total / 2;
    let right = total - left;
    format!("{}{}{}", " ".repeat(left), text, " ".repeat(right))
}
