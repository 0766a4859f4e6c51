//! Text layout on fixed-size pages

use super::font::text_width;

pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;
pub const MARGIN: f32 = 50.0;

/// A line of text and its baseline position on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub x: f32,
    pub y: f32,
}

/// Greedy word wrap. Whitespace runs (including newlines) collapse to one
/// space; a single word wider than the line is kept whole on its own line.
pub fn wrap_words(text: &str, font_size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }

        let candidate = format!("{} {}", current, word);
        if text_width(&candidate, font_size) > max_width {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        } else {
            current = candidate;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Lay wrapped lines out top-down. Line `i` on a page sits at
/// `PAGE_HEIGHT - MARGIN - i * line_height` and is only placed while that is
/// above the bottom margin. Returns the pages and the number of lines that
/// did not fit; with `paginate` set every line fits.
pub fn layout_pages(
    lines: Vec<String>,
    font_size: f32,
    line_spacing: f32,
    paginate: bool,
) -> (Vec<Vec<PlacedLine>>, usize) {
    let line_height = font_size * line_spacing;
    let mut pages: Vec<Vec<PlacedLine>> = vec![Vec::new()];
    let mut dropped = 0;
    let mut row = 0usize;

    for text in lines {
        let mut y = PAGE_HEIGHT - MARGIN - row as f32 * line_height;
        if y <= MARGIN {
            if !paginate {
                dropped += 1;
                continue;
            }
            pages.push(Vec::new());
            row = 0;
            y = PAGE_HEIGHT - MARGIN;
        }

        if let Some(page) = pages.last_mut() {
            page.push(PlacedLine { text, x: MARGIN, y });
        }
        row += 1;
    }

    (pages, dropped)
}

/// Uniform scale placing a `width` x `height` box centered inside the page
/// margins. Returns (x, y, drawn_width, drawn_height).
pub fn fit_centered(width: f32, height: f32) -> (f32, f32, f32, f32) {
    let scale = ((PAGE_WIDTH - 2.0 * MARGIN) / width).min((PAGE_HEIGHT - 2.0 * MARGIN) / height);
    let drawn_width = width * scale;
    let drawn_height = height * scale;
    (
        (PAGE_WIDTH - drawn_width) / 2.0,
        (PAGE_HEIGHT - drawn_height) / 2.0,
        drawn_width,
        drawn_height,
    )
}
