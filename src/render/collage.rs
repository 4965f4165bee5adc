//! Collage PNG.
//!
//! Two layouts share one 1200x1400 canvas: a 2x2 grid of generated scene
//! images, or a text board built from the analysis alone. Text is set in
//! the bundled DejaVu Sans.

use ab_glyph::{FontRef, PxScale};
use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use lazy_static::lazy_static;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::shorten;
use crate::analysis::AnalysisResult;
use crate::model::SceneImage;

pub const BOARD_WIDTH: u32 = 1200;
pub const BOARD_HEIGHT: u32 = 1400;
pub const TILE_WIDTH: u32 = 580;
pub const TILE_HEIGHT: u32 = 450;
pub const TILE_POSITIONS: [(u32, u32); 4] = [(10, 10), (610, 10), (10, 480), (610, 480)];

pub const BOARD_TITLE: &str = "MY VISION BOARD";

const SCENE_BACKGROUND: Rgb<u8> = Rgb([0x1a, 0x1a, 0x1a]);
const TEXT_BACKGROUND: Rgb<u8> = Rgb([0x0b, 0x0b, 0x10]);
const ACCENT: Rgb<u8> = Rgb([0x9c, 0xc4, 0xff]);
const CARD: Rgb<u8> = Rgb([0x14, 0x14, 0x1d]);
const INK: Rgb<u8> = Rgb([0xff, 0xff, 0xff]);
const MUTED: Rgb<u8> = Rgb([0xcc, 0xcc, 0xcc]);

const MARGIN: u32 = 50;
/// Characters per wrapped "why" line.
const WRAP_CHARS: usize = 80;

static REGULAR_TTF: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");
static BOLD_TTF: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");

lazy_static! {
    static ref REGULAR: Option<FontRef<'static>> = load_font("DejaVuSans", REGULAR_TTF);
    static ref BOLD: Option<FontRef<'static>> = load_font("DejaVuSans-Bold", BOLD_TTF);
}

fn load_font(name: &str, data: &'static [u8]) -> Option<FontRef<'static>> {
    match FontRef::try_from_slice(data) {
        Ok(font) => Some(font),
        Err(e) => {
            warn!(font = name, error = %e, "bundled font unreadable, boards will have no text");
            None
        }
    }
}

#[derive(Clone, Copy)]
enum Weight {
    Regular,
    Bold,
}

impl Weight {
    fn font(self) -> Option<&'static FontRef<'static>> {
        match self {
            Weight::Regular => REGULAR.as_ref(),
            Weight::Bold => BOLD.as_ref(),
        }
    }
}

/// Scene board when any images exist, otherwise the text board.
pub fn compose_board(scenes: &[SceneImage], analysis: &AnalysisResult) -> RgbImage {
    if scenes.is_empty() {
        compose_swatch_board(analysis)
    } else {
        compose_scene_board(scenes)
    }
}

/// Up to four scene images in a 2x2 grid. Each tile gets a caption band in
/// its theme colour with the theme name on it; the title runs along the
/// bottom.
pub fn compose_scene_board(scenes: &[SceneImage]) -> RgbImage {
    let mut board = RgbImage::from_pixel(BOARD_WIDTH, BOARD_HEIGHT, SCENE_BACKGROUND);

    for (scene, &(x, y)) in scenes.iter().zip(TILE_POSITIONS.iter()) {
        let tile = scene
            .image
            .resize_exact(TILE_WIDTH, TILE_HEIGHT, FilterType::Lanczos3)
            .to_rgb8();
        imageops::overlay(&mut board, &tile, x as i64, y as i64);

        let color = theme_color(&scene.theme);
        blend_rect(&mut board, x + 5, y + TILE_HEIGHT - 45, 310, 40, color, 0.6);
        draw_label(
            &mut board,
            &shorten(&scene.theme, 22),
            x + 15,
            y + TILE_HEIGHT - 40,
            24.0,
            INK,
            Weight::Bold,
        );
        debug!(theme = %scene.theme, x, y, "placed scene tile");
    }

    draw_centered(&mut board, BOARD_TITLE, BOARD_HEIGHT - 60, 36.0, INK);
    fill_rect(&mut board, BOARD_WIDTH / 2 - 150, BOARD_HEIGHT - 14, 300, 4, ACCENT);
    board
}

/// Text board: title, theme cards with evidence markers, identities with
/// their wrapped reasons, and affirmations. Sections with nothing to show
/// are left out; rows that would run past the bottom margin are dropped.
pub fn compose_swatch_board(analysis: &AnalysisResult) -> RgbImage {
    let mut board = RgbImage::from_pixel(BOARD_WIDTH, BOARD_HEIGHT, TEXT_BACKGROUND);
    let inner = BOARD_WIDTH - 2 * MARGIN;
    let bottom = BOARD_HEIGHT - MARGIN;

    draw_centered(&mut board, BOARD_TITLE, 40, 48.0, INK);
    fill_rect(&mut board, MARGIN, 110, inner, 4, ACCENT);
    let mut y = 134;

    let themes = analysis.themes();
    if !themes.is_empty() {
        y = section_header(&mut board, "THEMES", y);
        for theme in themes.iter().take(6) {
            if y + 64 > bottom {
                break;
            }
            let color = theme_color(&theme.name);
            fill_rect(&mut board, MARGIN, y, inner, 64, CARD);
            fill_rect(&mut board, MARGIN, y, 16, 64, color);
            draw_label(&mut board, &shorten(&theme.name, 60), MARGIN + 32, y + 8, 24.0, INK, Weight::Regular);
            for i in 0..theme.evidence.len().min(8) as u32 {
                fill_rect(&mut board, MARGIN + 32 + i * 22, y + 42, 14, 14, color);
            }
            y += 76;
        }
        y += 10;
    }

    let identities = analysis.future_identities();
    if !identities.is_empty() && y + 70 <= bottom {
        y = section_header(&mut board, "FUTURE IDENTITIES", y);
        for identity in identities.iter().take(3) {
            if y + 30 > bottom {
                break;
            }
            fill_rect(&mut board, MARGIN + 20, y + 7, 12, 12, theme_color(&identity.title));
            let title = format!("» {}", shorten(&identity.title, 70));
            draw_label(&mut board, &title, MARGIN + 44, y, 22.0, INK, Weight::Regular);
            y += 30;
            for line in wrap(&identity.why, WRAP_CHARS).iter().take(3) {
                if y + 24 > bottom {
                    break;
                }
                draw_label(&mut board, line, MARGIN + 64, y, 18.0, MUTED, Weight::Regular);
                y += 24;
            }
            y += 14;
        }
    }

    let affirmations = analysis.affirmations();
    if !affirmations.is_empty() && y + 70 <= bottom {
        y = section_header(&mut board, "AFFIRMATIONS", y);
        for affirmation in affirmations.iter().take(6) {
            if y + 30 > bottom {
                break;
            }
            let line = format!("✓ {}", shorten(affirmation, 90));
            draw_label(&mut board, &line, MARGIN + 20, y, 20.0, INK, Weight::Regular);
            y += 30;
        }
    }

    board
}

/// Deterministic colour for a name: FNV-1a of the lowercased name picks a hue.
pub fn theme_color(name: &str) -> Rgb<u8> {
    let mut hash: u32 = 0x811c_9dc5;
    for byte in name.trim().to_lowercase().bytes() {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hsv_to_rgb((hash % 360) as f32, 0.55, 0.85)
}

/// Save the board; the format follows the file extension.
pub fn write_collage(board: &RgbImage, path: &Path) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    board
        .save(path)
        .with_context(|| format!("Failed to write collage: {}", path.display()))?;
    Ok(path.to_path_buf())
}

/// Header in the accent colour; returns the y of the first row below it.
fn section_header(img: &mut RgbImage, title: &str, y: u32) -> u32 {
    draw_label(img, title, MARGIN, y, 24.0, ACCENT, Weight::Bold);
    y + 40
}

fn draw_label(img: &mut RgbImage, text: &str, x: u32, y: u32, size: f32, color: Rgb<u8>, weight: Weight) {
    if let Some(font) = weight.font() {
        draw_text_mut(img, color, x as i32, y as i32, PxScale::from(size), font, text);
    }
}

/// Bold text centred horizontally on the board.
fn draw_centered(img: &mut RgbImage, text: &str, y: u32, size: f32, color: Rgb<u8>) {
    let Some(font) = Weight::Bold.font() else {
        return;
    };
    let (width, _) = text_size(PxScale::from(size), font, text);
    let x = img.width().saturating_sub(width) / 2;
    draw_text_mut(img, color, x as i32, y as i32, PxScale::from(size), font, text);
}

/// Greedy word wrap to at most `width` chars per line. A single word
/// longer than `width` gets a line of its own.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if !line.is_empty() && line.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

fn fill_rect(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
    blend_rect(img, x, y, w, h, color, 1.0);
}

/// Mix `color` over a clipped rectangle with the given opacity.
fn blend_rect(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>, alpha: f32) {
    let x_end = x.saturating_add(w).min(img.width());
    let y_end = y.saturating_add(h).min(img.height());
    for py in y..y_end {
        for px in x..x_end {
            let pixel = img.get_pixel_mut(px, py);
            for c in 0..3 {
                let mixed = pixel[c] as f32 * (1.0 - alpha) + color[c] as f32 * alpha;
                pixel[c] = mixed.round() as u8;
            }
        }
    }
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Rgb<u8> {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;
    let (r, g, b) = match h as u32 {
        0..=59 => (c, x, 0.0),
        60..=119 => (x, c, 0.0),
        120..=179 => (0.0, c, x),
        180..=239 => (0.0, x, c),
        240..=299 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let to_u8 = |v: f32| ((v + m) * 255.0).round() as u8;
    Rgb([to_u8(r), to_u8(g), to_u8(b)])
}
