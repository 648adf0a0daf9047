//! Tilestacktui: layered tile-matching puzzle in the terminal.

mod app;
mod board;
mod combo;
mod highscores;
mod input;
mod matching;
mod session;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use board::BoardConfig;
use clap::{Parser, ValueEnum};
use std::time::Duration;

/// Options derived from CLI that shape a session (board dimensions, countdown).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameConfig {
    pub board: BoardConfig,
    pub time_limit: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            board: BoardConfig::default(),
            time_limit: Duration::from_secs(180),
        }
    }
}

impl GameConfig {
    pub fn from_args(args: &Args) -> Self {
        Self {
            board: BoardConfig {
                grid_size: args.grid_size,
                layers: args.layers,
                pattern_count: args.patterns,
            },
            time_limit: Duration::from_secs(args.time_limit),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = GameConfig::from_args(&args);
    config
        .board
        .validate()
        .context("invalid board configuration")?;
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_default();
    let mut app = App::new(args, config, theme)?;
    app.run()?;
    Ok(())
}

/// Layered tile-matching puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "tilestacktui",
    version,
    about = "Layered tile-matching puzzle in the terminal. Click two visible tiles with the same pattern to remove them before time runs out.",
    long_about = "Tilestacktui deals a square board of tiles stacked several layers deep.\n\n\
        Click a tile, then another tile showing the same pattern, to remove both and reveal \
        what lies beneath. Clear the whole board before the countdown ends. Matches made \
        within 1.5 seconds of each other build a combo; your best combo is saved.\n\n\
        CONTROLS:\n  Mouse click  Select / match   Esc or P   Pause\n  Q / Ctrl-C   Quit\n\n\
        In menus use Up/Down and Enter, or click an option."
)]
pub struct Args {
    /// Board edge length in tiles.
    #[arg(long, default_value = "8", value_name = "N")]
    pub grid_size: usize,

    /// Layers stacked on every cell.
    #[arg(long, default_value = "3", value_name = "N")]
    pub layers: usize,

    /// Distinct tile patterns. grid-size² × layers must be divisible by this.
    #[arg(long, default_value = "8", value_name = "N")]
    pub patterns: u8,

    /// Countdown in seconds.
    #[arg(long, default_value = "180", value_name = "SECS")]
    pub time_limit: u64,

    /// Seed for the tile shuffle (random if not set).
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Skip main menu and start game immediately.
    #[arg(long)]
    pub no_menu: bool,

    /// Disable the flash when tiles are removed.
    #[arg(long)]
    pub no_animation: bool,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Where the all-time highest combo is stored. Defaults to the config dir.
    #[arg(long, value_name = "FILE")]
    pub score_file: Option<std::path::PathBuf>,

    /// Keep the highest combo in memory only.
    #[arg(long, conflicts_with = "score_file")]
    pub no_save: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}
