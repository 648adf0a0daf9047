//! App: terminal init, main loop, screen switching and event handling.

use crate::board::Board;
use crate::highscores::{FileStore, MemoryStore, Store, default_path};
use crate::input::{Action, event_to_action};
use crate::session::{ClickOutcome, Outcome, Session};
use crate::theme::Theme;
use crate::ui::{self, Flash, View};
use crate::{Args, GameConfig};
use anyhow::{Context, Result};
use crossterm::event;
use rand::SeedableRng;
use rand::rngs::StdRng;
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use std::time::{Duration, Instant};

/// Frame budget for drawing and event polling (~60 FPS).
const FRAME: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Menu,
    Playing,
    GameOver(Outcome),
}

pub struct App {
    args: Args,
    config: GameConfig,
    theme: Theme,
    rng: StdRng,
    session: Session<Store>,
    screen: Screen,
    /// Highlighted option on the menu / game-over screen.
    menu_selected: usize,
    /// Last known pointer position; notices are drawn next to it.
    pointer: Option<(u16, u16)>,
    /// Terminal area of the last frame, for mapping clicks.
    area: Rect,
    flash: Flash,
    /// The board dealt in `new` has not been played yet.
    first_deal: bool,
}

impl App {
    pub fn new(args: Args, config: GameConfig, theme: Theme) -> Result<Self> {
        let mut rng = match args.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let store = if args.no_save {
            Store::Memory(MemoryStore::default())
        } else {
            Store::File(FileStore::new(
                args.score_file.clone().unwrap_or_else(default_path),
            ))
        };
        let session = Session::new(&config, &mut rng, store, Instant::now())
            .context("could not deal the board")?;
        let screen = if args.no_menu {
            Screen::Playing
        } else {
            Screen::Menu
        };
        Ok(Self {
            args,
            config,
            theme,
            rng,
            session,
            screen,
            menu_selected: 0,
            pointer: None,
            area: Rect::default(),
            flash: Flash::default(),
            first_deal: true,
        })
    }

    /// Switch to play: the first game uses the board dealt at startup, later ones deal anew.
    fn start_game(&mut self) -> Result<()> {
        let now = Instant::now();
        if std::mem::take(&mut self.first_deal) {
            self.session.start_clock(now);
        } else {
            let board = Board::create(self.config.board, &mut self.rng)?;
            self.session.restart(board, now);
        }
        self.flash.clear();
        self.screen = Screen::Playing;
        Ok(())
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{DisableMouseCapture, EnableMouseCapture},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;
        // A fresh session clock: time spent before the first frame does not count.
        if self.screen == Screen::Playing {
            self.start_game()?;
        }

        let result = self.run_loop(&mut terminal);

        // Restore
        let _ = execute!(std::io::stdout(), DisableMouseCapture);
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();
            let snapshot = if self.screen == Screen::Playing {
                self.session.tick(now)
            } else {
                self.session.snapshot(now)
            };
            if let (Screen::Playing, Some(outcome)) = (self.screen, snapshot.outcome) {
                self.finish(outcome);
            }

            terminal.draw(|f| {
                self.area = f.area();
                let view = View {
                    screen: self.screen,
                    snapshot: &snapshot,
                    theme: &self.theme,
                    menu_selected: self.menu_selected,
                    pointer: self.pointer,
                    no_animation: self.args.no_animation,
                };
                ui::draw(f, &view, &mut self.flash, now);
            })?;
            if self.flash.is_done() {
                self.flash.clear();
            }

            let timeout = FRAME.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    let action = event_to_action(event::read()?);
                    if !self.handle(action, Instant::now())? {
                        return Ok(());
                    }
                }
            }
        }
    }

    fn finish(&mut self, outcome: Outcome) {
        self.screen = Screen::GameOver(outcome);
        self.menu_selected = 0;
        self.flash.clear();
    }

    /// Apply one action. Returns `false` when the app should exit.
    fn handle(&mut self, action: Action, now: Instant) -> Result<bool> {
        if let Action::Pointer(x, y) | Action::Click(x, y) = action {
            self.pointer = Some((x, y));
        }
        match self.screen {
            Screen::Menu | Screen::GameOver(_) => match action {
                Action::Quit => return Ok(false),
                Action::Up | Action::Down => self.menu_selected = 1 - self.menu_selected.min(1),
                Action::Confirm => return self.choose(self.menu_selected),
                Action::Restart if self.screen != Screen::Menu => return self.choose(0),
                Action::Click(x, y) => {
                    if let Some(option) = ui::menu_option_at(self.area, x, y) {
                        return self.choose(option);
                    }
                }
                _ => {}
            },
            Screen::Playing => match action {
                Action::Quit => return Ok(false),
                Action::Pause => self.session.toggle_pause(now),
                Action::Click(x, y) => {
                    let layout = ui::game_layout(self.area, self.session.board().size());
                    if let Some(pos) = ui::cell_at(layout.board, x, y) {
                        if let ClickOutcome::Matched { first, second, .. } =
                            self.session.click(pos, now)
                        {
                            self.flash.start(&[first, second]);
                        }
                    }
                    if let Some(outcome) = self.session.outcome() {
                        self.finish(outcome);
                    }
                }
                _ => {}
            },
        }
        Ok(true)
    }

    /// Option 0 starts (or restarts) a game, option 1 exits.
    fn choose(&mut self, option: usize) -> Result<bool> {
        if option == 0 {
            self.start_game()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
