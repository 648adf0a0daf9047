//! Layout and drawing: menus, board, sidebar, notices, pause overlay, removal flash.

use crate::app::Screen;
use crate::board::Pos;
use crate::combo::Notice;
use crate::session::{OutcomeKind, Snapshot, TileView};
use crate::theme::{Theme, glyph, shade};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Gauge, Paragraph, Widget, Wrap};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Tile footprint in terminal cells.
pub const TILE_W: u16 = 4;
pub const TILE_H: u16 = 2;
/// Spacing between tiles (also the left/top inset of the first tile).
pub const GAP_X: u16 = 1;
pub const GAP_Y: u16 = 0;

const SIDEBAR_WIDTH: u16 = 30;
/// Sidebar needs this many rows even when the board is smaller.
const SIDEBAR_HEIGHT: u16 = 16;

/// Removal flash (TachyonFX fade from white back to the tile colours).
const REMOVE_FLASH_MS: u32 = 250;

/// Rows (inside the popup border) where the two menu options are drawn.
const OPTION_ROWS: [u16; 2] = [5, 7];
const MENU_W: u16 = 40;
const MENU_H: u16 = 11;

/// Everything a frame needs besides the terminal itself.
pub struct View<'a> {
    pub screen: Screen,
    pub snapshot: &'a Snapshot,
    pub theme: &'a Theme,
    pub menu_selected: usize,
    pub pointer: Option<(u16, u16)>,
    pub no_animation: bool,
}

/// Cells flashing after a successful match.
#[derive(Default)]
pub struct Flash {
    cells: Vec<Pos>,
    effect: Option<Effect>,
    last_process: Option<Instant>,
}

impl Flash {
    pub fn start(&mut self, cells: &[Pos]) {
        self.cells = cells.to_vec();
        self.effect = None;
        self.last_process = None;
    }

    pub fn is_done(&self) -> bool {
        self.effect.as_ref().is_some_and(Effect::done)
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.effect = None;
        self.last_process = None;
    }
}

/// Board (inner, without border) and sidebar rects for a grid of `size` tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameLayout {
    pub board_outer: Rect,
    pub board: Rect,
    pub sidebar: Rect,
}

/// Board interior size in terminal cells.
fn board_inner_size(size: usize) -> (u16, u16) {
    let n = u16::try_from(size).unwrap_or(u16::MAX);
    (
        n.saturating_mul(TILE_W + GAP_X).saturating_add(GAP_X),
        n.saturating_mul(TILE_H + GAP_Y).saturating_add(GAP_Y),
    )
}

/// Center board + sidebar in `area`.
pub fn game_layout(area: Rect, size: usize) -> GameLayout {
    let (bw, bh) = board_inner_size(size);
    let (pw, ph) = (bw.saturating_add(2), bh.saturating_add(2));
    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(pw.saturating_add(SIDEBAR_WIDTH)),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(ph.max(SIDEBAR_HEIGHT)),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(pw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert[1]);
    let board_outer = Rect {
        height: ph.min(inner[0].height),
        ..inner[0]
    };
    GameLayout {
        board_outer,
        board: Rect {
            x: board_outer.x + 1,
            y: board_outer.y + 1,
            width: bw.min(board_outer.width.saturating_sub(2)),
            height: bh.min(board_outer.height.saturating_sub(2)),
        },
        sidebar: inner[1],
    }
}

/// Map a terminal position to a grid cell: `col = dx / (TILE_W + GAP_X)`, `row = dy / (TILE_H + GAP_Y)`.
/// Points left of or above the board give `None`; everything else is bounds-checked by the session.
pub fn cell_at(board: Rect, x: u16, y: u16) -> Option<Pos> {
    let dx = x.checked_sub(board.x)?;
    let dy = y.checked_sub(board.y)?;
    Some(Pos::new(
        (dy / (TILE_H + GAP_Y)) as usize,
        (dx / (TILE_W + GAP_X)) as usize,
    ))
}

/// Top-left terminal cell of the tile at `pos`.
pub fn tile_origin(board: Rect, pos: Pos) -> (u16, u16) {
    let step = |base: u16, gap: u16, index: usize, pitch: u16| {
        u16::try_from(index)
            .unwrap_or(u16::MAX)
            .saturating_mul(pitch)
            .saturating_add(base)
            .saturating_add(gap)
    };
    (
        step(board.x, GAP_X, pos.col, TILE_W + GAP_X),
        step(board.y, GAP_Y, pos.row, TILE_H + GAP_Y),
    )
}

fn menu_popup(area: Rect) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(MENU_W) / 2,
        y: area.y + area.height.saturating_sub(MENU_H) / 2,
        width: MENU_W.min(area.width),
        height: MENU_H.min(area.height),
    }
}

/// Which menu option (0 or 1) sits at terminal position (x, y), if any.
pub fn menu_option_at(area: Rect, x: u16, y: u16) -> Option<usize> {
    let popup = menu_popup(area);
    if x <= popup.x || x + 1 >= popup.x + popup.width {
        return None;
    }
    OPTION_ROWS.iter().position(|&row| y == popup.y + 1 + row)
}

/// Remaining whole seconds, rounded up so the display hits 0 exactly at timeout.
fn seconds_left(remaining: Duration) -> u64 {
    remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0)
}

pub fn draw(frame: &mut Frame, view: &View, flash: &mut Flash, now: Instant) {
    let area = frame.area();
    Block::default()
        .style(Style::default().bg(view.theme.bg))
        .render(area, frame.buffer_mut());
    match view.screen {
        Screen::Menu => draw_menu(
            frame,
            view,
            Line::from(Span::styled(" TILE STACK ", bold(view.theme.title))),
            format!("All-Time Highest Combo: {}", view.snapshot.highest_combo),
            ["START", "EXIT"],
        ),
        Screen::Playing => {
            let layout = game_layout(area, view.snapshot.size);
            draw_board(frame, view, layout.board_outer, layout.board);
            draw_sidebar(frame, view, layout.sidebar);
            if !flash.cells.is_empty() && !view.no_animation {
                apply_flash(frame, layout.board, flash, now);
            }
            draw_notices(frame, view, area);
            if view.snapshot.paused {
                draw_pause_overlay(frame, view.theme, area);
            }
        }
        Screen::GameOver(outcome) => {
            let title = match outcome.kind {
                OutcomeKind::Won => Span::styled(
                    " SUCCESS! ",
                    Style::default().fg(Color::Black).bg(Color::Green),
                ),
                OutcomeKind::Lost => Span::styled(
                    " GAME OVER ",
                    Style::default().fg(Color::White).bg(Color::Red),
                ),
            };
            draw_menu(
                frame,
                view,
                Line::from(title),
                format!("Max Combo This Game: {}", outcome.max_combo),
                ["RESTART", "QUIT"],
            );
        }
    }
}

fn bold(color: Color) -> Style {
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

fn draw_menu(frame: &mut Frame, view: &View, title: Line, subtitle: String, options: [&str; 2]) {
    let theme = view.theme;
    let popup = menu_popup(frame.area());
    let option = |i: usize| {
        let style = if view.menu_selected == i {
            Style::default()
                .fg(theme.bg)
                .bg(theme.title)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.main_fg)
        };
        Line::from(Span::styled(format!(" {} ", options[i]), style))
    };
    let mut lines = vec![Line::from(""); MENU_H as usize - 2];
    lines[1] = title;
    lines[3] = Line::from(Span::styled(subtitle, Style::default().fg(theme.main_fg)));
    for (i, &row) in OPTION_ROWS.iter().enumerate() {
        lines[row as usize] = option(i);
    }
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
                .title_bottom(Span::styled(
                    " ↕ / Enter or click ",
                    Style::default().fg(theme.inactive_fg),
                )),
        )
        .style(Style::default().bg(theme.bg))
        .render(popup, frame.buffer_mut());
}

fn draw_board(frame: &mut Frame, view: &View, outer: Rect, board: Rect) {
    let theme = view.theme;
    let snap = view.snapshot;
    let remaining_tiles: usize = snap.tiles.iter().map(|t| t.depth as usize).sum();
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(
            format!(" Tilestacktui  | Tiles: {} ", remaining_tiles),
            theme.title,
        ))
        .render(outer, frame.buffer_mut());

    for row in 0..snap.size {
        for col in 0..snap.size {
            let pos = Pos::new(row, col);
            if snap.selection == Some(pos) {
                continue;
            }
            draw_tile(frame, theme, snap.layers, board, pos, snap.tile(pos), 0, false);
        }
    }
    // Selected tile last so its wobble draws over the gap.
    if let Some(pos) = snap.selection {
        let dx = if snap.shake > 1.0 {
            1
        } else if snap.shake < -1.0 {
            -1
        } else {
            0
        };
        draw_tile(frame, theme, snap.layers, board, pos, snap.tile(pos), dx, true);
    }
}

fn draw_tile(
    frame: &mut Frame,
    theme: &Theme,
    layers: usize,
    board: Rect,
    pos: Pos,
    tile: TileView,
    dx: i32,
    selected: bool,
) {
    let (x0, y0) = tile_origin(board, pos);
    let x0 = (x0 as i32 + dx).clamp(board.x as i32, (board.x + board.width) as i32) as u16;
    let buf = frame.buffer_mut();
    let inside = |x: u16, y: u16| {
        x >= board.x && x < board.x + board.width && y >= board.y && y < board.y + board.height
    };

    if tile.pattern == 0 {
        let (cx, cy) = (x0 + TILE_W / 2, y0 + TILE_H / 2);
        if inside(cx, cy) {
            buf[(cx, cy)]
                .set_char('·')
                .set_style(Style::default().fg(theme.inactive_fg).bg(theme.bg));
        }
        return;
    }

    // Deeper stacks are drawn brighter; the lower row is darker to separate rows.
    let base = theme.tile_color(tile.pattern);
    let lift = 0.55 + 0.45 * (tile.depth as f32 / layers.max(1) as f32);
    let top_bg = if selected { theme.alert } else { shade(base, lift) };
    let bottom_bg = shade(top_bg, 0.75);
    let pips: Vec<char> = if tile.depth as u16 <= TILE_W {
        std::iter::repeat_n('•', tile.depth as usize).collect()
    } else {
        tile.depth.to_string().chars().collect()
    };

    for ty in 0..TILE_H {
        for tx in 0..TILE_W {
            let (x, y) = (x0 + tx, y0 + ty);
            if !inside(x, y) {
                continue;
            }
            let (ch, style) = if ty == 0 {
                let ch = if tx == TILE_W / 2 - 1 { glyph(tile.pattern) } else { ' ' };
                (ch, Style::default().fg(Color::Black).bg(top_bg).add_modifier(Modifier::BOLD))
            } else {
                let ch = pips.get(tx as usize).copied().unwrap_or(' ');
                (ch, Style::default().fg(Color::Black).bg(bottom_bg))
            };
            buf[(x, y)].set_char(ch).set_style(style);
        }
    }
}

fn draw_sidebar(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let snap = view.snapshot;
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // time
            Constraint::Length(1), // time gauge
            Constraint::Length(1),
            Constraint::Length(3), // combo counters
            Constraint::Length(1),
            Constraint::Length(3), // controls
            Constraint::Fill(1),   // store warning
        ])
        .split(inner);

    let secs = seconds_left(snap.remaining);
    Paragraph::new(Line::from(vec![
        Span::styled("Time Left: ", title_style),
        Span::styled(format!("{}s", secs), fg_style),
    ]))
    .render(chunks[0], frame.buffer_mut());

    let ratio = if snap.time_limit.is_zero() {
        0.0
    } else {
        (snap.remaining.as_secs_f64() / snap.time_limit.as_secs_f64()).clamp(0.0, 1.0)
    };
    let bar_color = if ratio > 0.5 {
        Color::Green
    } else if ratio > 0.2 {
        Color::Yellow
    } else {
        Color::Red
    };
    Gauge::default()
        .ratio(ratio)
        .label("")
        .gauge_style(Style::default().fg(bar_color).bg(theme.bg))
        .render(chunks[1], frame.buffer_mut());

    let counters = vec![
        Line::from(vec![
            Span::styled("Combo: ", title_style),
            Span::styled(format!("x{}", snap.combo_count), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Max Combo This Game: ", title_style),
            Span::styled(snap.max_combo_count.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("All-Time Highest: ", title_style),
            Span::styled(snap.highest_combo.to_string(), fg_style),
        ]),
    ];
    Paragraph::new(counters).render(chunks[3], frame.buffer_mut());

    let help = Style::default().fg(theme.inactive_fg);
    Paragraph::new(vec![
        Line::from(Span::styled("Click two matching tiles", help)),
        Line::from(Span::styled("Esc/P  Pause", help)),
        Line::from(Span::styled("Q      Quit", help)),
    ])
    .render(chunks[5], frame.buffer_mut());

    if let Some(warning) = &snap.store_warning {
        Paragraph::new(Line::from(Span::styled(
            format!("! {}", warning),
            Style::default().fg(theme.alert),
        )))
        .wrap(Wrap { trim: true })
        .render(chunks[6], frame.buffer_mut());
    }
}

/// Transient notices float next to the pointer: combo above, no-match below.
fn draw_notices(frame: &mut Frame, view: &View, area: Rect) {
    let (px, py) = view
        .pointer
        .unwrap_or((area.x + area.width / 2, area.y + area.height / 2));
    let mut put = |notice: Option<Notice>, dy: i32, style: Style| {
        let Some(notice) = notice else { return };
        let text = notice.text();
        let max_x = (area.x + area.width).saturating_sub(text.chars().count() as u16);
        let x = (px + 2).min(max_x);
        let y = (py as i32 + dy).clamp(area.y as i32, (area.y + area.height).saturating_sub(1) as i32);
        frame.buffer_mut().set_string(x, y as u16, text, style);
    };
    put(
        view.snapshot.combo_notice,
        -2,
        Style::default()
            .fg(Color::Rgb(255, 165, 0))
            .bg(view.theme.bg)
            .add_modifier(Modifier::BOLD),
    );
    put(
        view.snapshot.miss_notice,
        1,
        Style::default().fg(Color::Red).bg(view.theme.bg).add_modifier(Modifier::BOLD),
    );
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup_w = 28u16;
    let popup_h = 5u16;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h.min(area.height),
    };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(Span::styled(
            " Esc: Resume    Q: Quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
        )
        .style(Style::default().bg(theme.bg))
        .render(popup, frame.buffer_mut());
}

/// Terminal cells covered by the given tiles.
fn flash_positions(board: Rect, cells: &[Pos]) -> HashSet<(u16, u16)> {
    let mut set = HashSet::new();
    for &pos in cells {
        let (x0, y0) = tile_origin(board, pos);
        for x in x0..x0 + TILE_W {
            for y in y0..y0 + TILE_H {
                set.insert((x, y));
            }
        }
    }
    set
}

/// Create or advance the removal flash over the matched tiles.
fn apply_flash(frame: &mut Frame, board: Rect, flash: &mut Flash, now: Instant) {
    let delta = flash
        .last_process
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    flash.last_process = Some(now);

    if flash.effect.is_none() {
        let cells = flash_positions(board, &flash.cells);
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            cells.contains(&(pos.x, pos.y))
        }));
        let effect = fx::fade_from(
            Color::White,
            Color::White,
            (REMOVE_FLASH_MS, Interpolation::QuadOut),
        )
        .with_filter(filter)
        .with_area(board);
        flash.effect = Some(effect);
    }

    if let Some(effect) = flash.effect.as_mut() {
        frame.render_effect(effect, board, TfxDuration::from_millis(delta_ms));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, BoardConfig};
    use crate::highscores::MemoryStore;
    use crate::session::{Outcome, Session};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn board_rect() -> Rect {
        Rect::new(10, 5, 41, 16)
    }

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buf = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buf.area.height {
            for x in 0..buf.area.width {
                out.push_str(buf[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    fn tiny_session() -> Session<MemoryStore> {
        let config = BoardConfig {
            grid_size: 2,
            layers: 2,
            pattern_count: 2,
        };
        let board = Board::from_stacks(
            config,
            &[vec![vec![1, 2], vec![2, 1]], vec![vec![0, 1], vec![0, 0]]],
        );
        Session::with_board(board, Duration::from_secs(180), MemoryStore::with_value(4), Instant::now())
    }

    fn render(screen: Screen, snapshot: &Snapshot, pointer: Option<(u16, u16)>) -> String {
        let theme = Theme::default();
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        let mut flash = Flash::default();
        let view = View {
            screen,
            snapshot,
            theme: &theme,
            menu_selected: 0,
            pointer,
            no_animation: true,
        };
        terminal
            .draw(|f| draw(f, &view, &mut flash, Instant::now()))
            .unwrap();
        buffer_text(&terminal)
    }

    #[test]
    fn test_cell_at_matches_tile_origin() {
        let board = board_rect();
        for row in 0..8 {
            for col in 0..8 {
                let pos = Pos::new(row, col);
                let (x, y) = tile_origin(board, pos);
                assert_eq!(cell_at(board, x, y), Some(pos));
                assert_eq!(cell_at(board, x + TILE_W - 1, y + TILE_H - 1), Some(pos));
            }
        }
    }

    #[test]
    fn test_cell_at_left_or_above_board_is_none() {
        let board = board_rect();
        assert_eq!(cell_at(board, 9, 6), None);
        assert_eq!(cell_at(board, 12, 4), None);
        // Right of the board still maps; the session rejects it.
        assert_eq!(cell_at(board, 10 + 41, 5), Some(Pos::new(0, 8)));
    }

    #[test]
    fn test_oversized_grid_layout_saturates() {
        let area = Rect::new(0, 0, 200, 60);
        let layout = game_layout(area, 14_000);
        assert!(layout.board.right() <= area.right());
        assert!(layout.board.bottom() <= area.bottom());
        assert_eq!(tile_origin(layout.board, Pos::new(40_000, 14_000)), (u16::MAX, u16::MAX));
    }

    #[test]
    fn test_menu_option_hit_rows() {
        let area = Rect::new(0, 0, 100, 30);
        let popup = menu_popup(area);
        let x = popup.x + popup.width / 2;
        assert_eq!(menu_option_at(area, x, popup.y + 1 + OPTION_ROWS[0]), Some(0));
        assert_eq!(menu_option_at(area, x, popup.y + 1 + OPTION_ROWS[1]), Some(1));
        assert_eq!(menu_option_at(area, x, popup.y + 2), None);
        assert_eq!(menu_option_at(area, popup.x, popup.y + 1 + OPTION_ROWS[0]), None);
    }

    #[test]
    fn test_seconds_left_rounds_up() {
        assert_eq!(seconds_left(Duration::from_millis(179_001)), 180);
        assert_eq!(seconds_left(Duration::from_secs(180)), 180);
        assert_eq!(seconds_left(Duration::ZERO), 0);
    }

    #[test]
    fn test_playing_frame_shows_visible_glyphs_and_counters() {
        let session = tiny_session();
        let text = render(Screen::Playing, &session.snapshot(Instant::now()), None);
        // (0,0) shows pattern 1, (1,0) shows pattern 1 from layer 1.
        assert_eq!(text.matches(glyph(1)).count(), 2);
        assert_eq!(text.matches(glyph(2)).count(), 1);
        assert!(text.contains("Time Left: 180s"));
        assert!(text.contains("All-Time Highest: 4"));
    }

    #[test]
    fn test_notices_and_pause_render() {
        let mut session = tiny_session();
        let t = Instant::now();
        session.click(Pos::new(0, 0), t);
        session.click(Pos::new(0, 1), t);
        session.toggle_pause(t);
        let text = render(Screen::Playing, &session.snapshot(t), Some((20, 10)));
        assert!(text.contains("NOT MATCH!!!"));
        assert!(text.contains("Paused"));
    }

    #[test]
    fn test_game_over_screen() {
        let session = tiny_session();
        let outcome = Outcome {
            kind: OutcomeKind::Won,
            max_combo: 3,
        };
        let text = render(Screen::GameOver(outcome), &session.snapshot(Instant::now()), None);
        assert!(text.contains("SUCCESS!"));
        assert!(text.contains("Max Combo This Game: 3"));
        assert!(text.contains("RESTART"));
    }
}
