//! Theme loading: btop-style `theme[key]="value"` files and hex → ratatui Color.

use crate::Palette;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Number of distinct tile colours; patterns beyond this reuse colours but keep their glyph.
pub const TILE_COLOURS: usize = 8;

/// One glyph per pattern id (1-based, so pattern `p` uses `GLYPHS[p - 1]`).
pub const GLYPHS: [char; 16] = [
    '♠', '♥', '♦', '♣', '★', '●', '▲', '■', '◆', '♪', '☀', '☂', '✿', '☯', '⚑', '✚',
];

/// Tile palette and UI colours.
#[derive(Debug, Clone)]
pub struct Theme {
    pub tiles: [Color; TILE_COLOURS],
    /// Board background.
    pub bg: Color,
    /// Borders.
    pub div_line: Color,
    /// Text (timer, counters).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Secondary text and empty cells.
    pub inactive_fg: Color,
    /// Selection outline and warnings.
    pub alert: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

/// One Dark: (theme key, fallback hex) for each tile colour.
const TILE_KEYS: [(&str, &str); TILE_COLOURS] = [
    ("cpu_end", "#E06C75"),
    ("mem_box", "#98C379"),
    ("title", "#E5C07B"),
    ("cpu_box", "#61AFEF"),
    ("net_box", "#C678DD"),
    ("hi_fg", "#56B6C2"),
    ("temp_mid", "#D19A66"),
    ("proc_box", "#BE5046"),
];

const HIGH_CONTRAST: [Color; TILE_COLOURS] = [
    Color::Rgb(0xFF, 0x00, 0x00),
    Color::Rgb(0x00, 0xFF, 0x00),
    Color::Rgb(0xFF, 0xFF, 0x00),
    Color::Rgb(0x00, 0x88, 0xFF),
    Color::Rgb(0xFF, 0x00, 0xFF),
    Color::Rgb(0x00, 0xFF, 0xFF),
    Color::Rgb(0xFF, 0x88, 0x00),
    Color::Rgb(0xFF, 0xFF, 0xFF),
];

/// Paul Tol's "vibrant" set plus two neutrals.
const COLORBLIND: [Color; TILE_COLOURS] = [
    Color::Rgb(0x00, 0x77, 0xBB),
    Color::Rgb(0xEE, 0x77, 0x33),
    Color::Rgb(0x00, 0x99, 0x88),
    Color::Rgb(0xCC, 0x33, 0x11),
    Color::Rgb(0xEE, 0x33, 0x77),
    Color::Rgb(0x33, 0xBB, 0xEE),
    Color::Rgb(0xBB, 0xBB, 0xBB),
    Color::Rgb(0xFF, 0xFF, 0xFF),
];

impl Default for Theme {
    fn default() -> Self {
        Self::from_map(&HashMap::new())
    }
}

impl Theme {
    /// Load a btop-style theme file, then apply `palette`.
    /// No path or a missing file gives One Dark.
    pub fn load(path: Option<&Path>, palette: Palette) -> Result<Self, ThemeError> {
        let mut theme = match path {
            Some(p) if p.exists() => Self::from_map(&parse_theme_file(&std::fs::read_to_string(p)?)),
            _ => Self::default(),
        };
        theme.apply_palette(palette);
        Ok(theme)
    }

    pub fn apply_palette(&mut self, palette: Palette) {
        match palette {
            Palette::Normal => {}
            Palette::HighContrast => {
                self.tiles = HIGH_CONTRAST;
                self.bg = Color::Black;
                self.main_fg = Color::White;
            }
            Palette::Colorblind => self.tiles = COLORBLIND,
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let pick = |key: &str, fallback: &str| {
            map.get(key)
                .and_then(|v| parse_hex(v).ok())
                .or_else(|| parse_hex(fallback).ok())
                .unwrap_or(Color::Reset)
        };
        Self {
            tiles: TILE_KEYS.map(|(key, hex)| pick(key, hex)),
            bg: pick("meter_bg", "#31353F"),
            div_line: pick("div_line", "#3F444F"),
            main_fg: pick("main_fg", "#ABB2BF"),
            title: pick("title", "#E5C07B"),
            inactive_fg: pick("inactive_fg", "#5C6370"),
            alert: pick("cpu_end", "#E06C75"),
        }
    }

    /// Colour for pattern id `pattern` (1-based).
    #[inline]
    pub fn tile_color(&self, pattern: u8) -> Color {
        self.tiles[(pattern.saturating_sub(1) as usize) % TILE_COLOURS]
    }
}

/// Glyph for pattern id `pattern` (1-based); blank for empty.
pub fn glyph(pattern: u8) -> char {
    match pattern {
        0 => ' ',
        p => GLYPHS[(p as usize - 1) % GLYPHS.len()],
    }
}

/// Parse btop-style theme file into key -> value map. Blank values and comments are skipped.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    s.lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| {
            let rest = line.strip_prefix("theme[")?;
            let (key, rest) = rest.split_once(']')?;
            let (_, value) = rest.split_once('=')?;
            let value = value.trim().trim_matches(|c: char| c == '"' || c == '\'');
            (!value.is_empty()).then(|| (key.trim().to_string(), value.to_string()))
        })
        .collect()
}

/// Parse hex colour "#RRGGBB" or "#RGB".
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let hex = s.trim().trim_start_matches('#');
    let bad = || ThemeError::InvalidHex(hex.to_string());
    if !hex.is_ascii() {
        return Err(bad());
    }
    let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| bad());
    match hex.len() {
        6 => Ok(Color::Rgb(
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        )),
        3 => Ok(Color::Rgb(
            channel(&hex[0..1])? * 17,
            channel(&hex[1..2])? * 17,
            channel(&hex[2..3])? * 17,
        )),
        _ => Err(bad()),
    }
}

/// Scale an RGB colour by `factor` (dims stacked layers and tile lower halves).
pub fn shade(color: Color, factor: f32) -> Color {
    let (r, g, b) = match color {
        Color::Rgb(r, g, b) => (r, g, b),
        Color::Red => (255, 0, 0),
        Color::Green => (0, 255, 0),
        Color::Yellow => (255, 255, 0),
        Color::Blue => (0, 0, 255),
        Color::Magenta => (255, 0, 255),
        Color::Cyan => (0, 255, 255),
        Color::White => (255, 255, 255),
        Color::Black => (0, 0, 0),
        _ => (128, 128, 128),
    };
    let scale = |c: u8| (c as f32 * factor).clamp(0.0, 255.0) as u8;
    Color::Rgb(scale(r), scale(g), scale(b))
}
