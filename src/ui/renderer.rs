/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// The renderer is also the engine's drawing `Surface`: world units map
/// onto the playfield rows below the HUD, one cell per
/// `cell_width x cell_height` units.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::draw::{Surface, Tint};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: [u8; 4],
    ch_len: u8,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells, so the
    /// inter-row gap colour matches the cells on VTE-based terminals.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell {
        ch: [b' ', 0, 0, 0],
        ch_len: 1,
        fg: Color::White,
        bg: Cell::BASE_BG,
    };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell {
        ch: [b'?', 0, 0, 0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
    };

    /// Normalize bg: Color::Reset → BASE_BG so that every cell gets an
    /// explicit background color (never terminal-default).
    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn from_char(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        let len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.ch_len = len;
        cell.fg = fg;
        cell.bg = Self::norm_bg(bg);
        cell
    }

    fn as_str(&self) -> &str {
        std::str::from_utf8(&self.ch[..self.ch_len as usize]).unwrap_or(" ")
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y) with given colors. Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width { break; }
            self.set(cx, y, Cell::from_char(ch, fg, bg));
            cx += 1;
        }
    }

    /// Horizontally centred `put_str`.
    fn put_centered(&mut self, y: usize, s: &str, fg: Color) {
        let len = s.chars().count();
        let x = self.width.saturating_sub(len) / 2;
        self.put_str(x, y, s, fg, Color::Reset);
    }

    #[cfg(test)]
    fn row_text(&self, y: usize) -> String {
        (0..self.width).map(|x| self.get(x, y).as_str().to_string()).collect()
    }
}

// ── Palette ──

fn tint_color(t: Tint) -> Color {
    let (r, g, b) = match t {
        Tint::RobotBlue     => (59, 130, 246),
        Tint::White         => (255, 255, 255),
        Tint::AntennaRed    => (239, 68, 68),
        Tint::BulletOrange  => (249, 115, 22),
        Tint::BulletGlow    => (253, 186, 116),
        Tint::CloudGray     => (241, 245, 249),
        Tint::CoinYellow    => (250, 204, 21),
        Tint::CoinHighlight => (254, 243, 199),
        Tint::CoinEdge      => (217, 119, 6),
        Tint::BoltRed       => (239, 68, 68),
        Tint::BoltGlow      => (254, 240, 138),
        Tint::RockGray      => (113, 113, 122),
        Tint::CraterGray    => (82, 82, 91),
    };
    Color::Rgb { r, g, b }
}

const TITLE_FG: Color = Color::Rgb { r: 59, g: 130, b: 246 };
const ACCENT: Color = Color::Rgb { r: 250, g: 204, b: 21 };
const GOOD: Color = Color::Rgb { r: 80, g: 255, b: 80 };
const BAD: Color = Color::Rgb { r: 255, g: 60, b: 60 };
const DIM: Color = Color::DarkGrey;

// ── Renderer ──

/// Vertical layout: HUD line, separator, playfield, footer.
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
const FOOTER_ROWS: usize = 1;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    cell_w: f32,
    cell_h: f32,
}

impl Renderer {
    pub fn new(cell_w: f32, cell_h: f32) -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            cell_w,
            cell_h,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.set_term_size(tw as usize, th as usize);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Pick up a terminal resize. Returns true when the size changed.
    pub fn sync_size(&mut self) -> io::Result<bool> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize == self.term_w && th as usize == self.term_h {
            return Ok(false);
        }
        self.set_term_size(tw as usize, th as usize);
        queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        Ok(true)
    }

    fn set_term_size(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        // Force full repaint: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);
    }

    /// Playfield size in cells (columns, rows).
    pub fn playfield(&self) -> (usize, usize) {
        let rows = self.term_h.saturating_sub(MAP_ROW + FOOTER_ROWS);
        (self.term_w, rows)
    }

    /// Playfield size in world units.
    pub fn viewport(&self) -> (f32, f32) {
        let (cols, rows) = self.playfield();
        (cols as f32 * self.cell_w, rows as f32 * self.cell_h)
    }

    /// Write the composed frame to the terminal.
    pub fn present(&mut self) -> io::Result<()> {
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors; ResetColor would fall back to the
        // terminal's own default and leave line artifacts.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }

                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.as_str()))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    /// HUD and footer around the playfield the engine just drew.
    pub fn compose_hud(&mut self, score: u32, level: u32, max_level: u32, best: u32) {
        let w = self.front.width;
        for x in 0..w {
            self.front.set(x, HUD_ROW, Cell::BLANK);
            self.front.set(x, HUD_ROW + 1, Cell::from_char('─', DIM, Color::Reset));
        }
        self.front.put_str(1, HUD_ROW, "ROBOFIRE", TITLE_FG, Color::Reset);
        let stats = format!("LEVEL {level}/{max_level}   SCORE {score}   BEST {best}");
        let sx = w.saturating_sub(stats.chars().count() + 1);
        self.front.put_str(sx, HUD_ROW, &stats, ACCENT, Color::Reset);

        let footer = self.term_h.saturating_sub(1);
        if footer > MAP_ROW {
            self.front.put_str(
                1,
                footer,
                "←↑↓→/WASD Move   SPACE Fire   ESC Title   Q Quit",
                DIM,
                Color::Reset,
            );
        }
    }

    pub fn compose_title(&mut self, best: u32, max_level: u32) {
        self.front.clear();
        let art = [
            r" ___     _         ___ _         ",
            r"| _ \___| |__  ___| __(_)_ _ ___ ",
            r"|   / _ \ '_ \/ _ \ _|| | '_/ -_)",
            r"|_|_\___/_.__/\___/_| |_|_| \___|",
        ];
        for (i, line) in art.iter().enumerate() {
            self.front.put_centered(2 + i, line, TITLE_FG);
        }
        self.front.put_centered(7, "☁  C L O U D   C L A S H  ☁", Color::White);

        let how = [
            "Shoot the clouds to make them drop coins.".to_string(),
            "Collect coins to score and level up.".to_string(),
            "Dodge the bolts and asteroids!".to_string(),
            format!("Clear level {max_level} to win."),
        ];
        for (i, line) in how.iter().enumerate() {
            self.front.put_centered(10 + i, line, Color::Rgb { r: 180, g: 180, b: 190 });
        }

        self.front.put_centered(15, "▸ ENTER  Start", GOOD);
        self.front.put_centered(16, "▸ Q      Quit ", DIM);
        if best > 0 {
            self.front.put_centered(18, &format!("Best score: {best}"), ACCENT);
        }
        self.front.put_centered(
            20,
            "←↑↓→ / WASD move    SPACE fire",
            Color::White,
        );
    }

    pub fn compose_game_over(&mut self, score: u32, level: u32, best: u32, new_best: bool) {
        self.front.clear();
        let box_art = [
            "╔══════════════════════════════╗",
            "║      ✕  G A M E  O V E R  ✕  ║",
            "╚══════════════════════════════╝",
        ];
        for (i, l) in box_art.iter().enumerate() {
            self.front.put_centered(4 + i, l, BAD);
        }
        self.compose_results(9, score, Some(level), best, new_best);
        self.front.put_centered(14, "▸ ENTER: Play Again", GOOD);
        self.front.put_centered(15, "▸ ESC:   Back to Title", DIM);
    }

    pub fn compose_victory(&mut self, score: u32, best: u32, new_best: bool) {
        self.front.clear();
        let box_art = [
            "╔══════════════════════════════╗",
            "║   ★  V I C T O R Y !  ★      ║",
            "╚══════════════════════════════╝",
        ];
        for (i, l) in box_art.iter().enumerate() {
            self.front.put_centered(4 + i, l, ACCENT);
        }
        self.front.put_centered(8, "The skies are clear. Every level beaten!", GOOD);
        self.compose_results(10, score, None, best, new_best);
        self.front.put_centered(15, "▸ ENTER: Play Again", GOOD);
        self.front.put_centered(16, "▸ ESC:   Back to Title", DIM);
    }

    fn compose_results(&mut self, row: usize, score: u32, level: Option<u32>, best: u32, new_best: bool) {
        self.front.put_centered(row, &format!("◈ Final Score: {score}"), Color::White);
        let mut next = row + 1;
        if let Some(level) = level {
            self.front.put_centered(next, &format!("◈ Reached Level: {level}"), Color::White);
            next += 1;
        }
        let best_line = if new_best {
            format!("★ New best score: {best} ★")
        } else {
            format!("◈ Best Score: {best}")
        };
        self.front.put_centered(next, &best_line, ACCENT);
    }
}

impl Surface for Renderer {
    fn clear(&mut self) {
        self.front.clear();
    }

    fn cell_size(&self) -> (f32, f32) {
        (self.cell_w, self.cell_h)
    }

    fn plot(&mut self, x: f32, y: f32, glyph: char, tint: Tint) {
        if x < 0.0 || y < 0.0 || !x.is_finite() || !y.is_finite() {
            return;
        }
        let col = (x / self.cell_w) as usize;
        let row = (y / self.cell_h) as usize;
        let (cols, rows) = self.playfield();
        if col < cols && row < rows {
            self.front.set(col, MAP_ROW + row, Cell::from_char(glyph, tint_color(tint), Color::Reset));
        }
    }
}
