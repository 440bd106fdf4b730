/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into the `front` buffer
///   2. Compare each cell with the `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. Batch everything with `queue!`, flush once
///   5. Swap front/back
///
/// The 1280×720 playfield is scaled onto whatever terminal area is left
/// after the HUD and footer rows. Every rect covers at least one cell so
/// small things (strawberries, bees) never vanish on tiny terminals.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::rect::{Rect, PLAYFIELD_H, PLAYFIELD_W};
use crate::sim::level::LEVEL_COUNT;
use crate::sim::world::{Phase, WorldState};

// ── Palette ──

const fn hex(rgb: u32) -> Color {
    Color::Rgb { r: (rgb >> 16) as u8, g: (rgb >> 8) as u8, b: rgb as u8 }
}

const SKY: Color = hex(0x87CEEB);
const PLATFORM: Color = hex(0x8B4513);
const STRAWBERRY: Color = hex(0xFF6B6B);
const BEE: Color = hex(0xFFD700);
const FLAG: Color = hex(0x32CD32);
const DOOR: Color = hex(0x8B4513);
const PLAYER: Color = hex(0xFF69B4);
const HUD_BG: Color = hex(0x2D2D5A);
const SCREEN_BG: Color = hex(0x1E1E32);
const CONFETTI: [Color; 4] = [hex(0xFF6B6B), hex(0x4ECDC4), hex(0xFFD700), hex(0xFF69B4)];

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: SCREEN_BG };

    /// Never produced by composing; forces a full repaint when stored in `back`.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg }
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
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
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

    /// Recolor the background of a cell, keeping its glyph.
    fn tint(&mut self, x: usize, y: usize, bg: Color) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x].bg = bg;
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn put_centered(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        let len = s.chars().count();
        let x = self.width.saturating_sub(len) / 2;
        self.put_str(x, y, s, fg, bg);
    }
}

// ── Viewport: playfield → terminal cells ──

/// Terminal-cell region the playfield is drawn into.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Viewport {
    pub col: usize,
    pub row: usize,
    pub cols: usize,
    pub rows: usize,
}

impl Viewport {
    /// Cell span `[c0, c1) × [r0, r1)` covering `r`, clipped to the
    /// viewport. Anything on screen gets at least one cell.
    pub fn cells(&self, r: &Rect) -> Option<(usize, usize, usize, usize)> {
        if self.cols == 0 || self.rows == 0 {
            return None;
        }
        let sx = self.cols as f32 / PLAYFIELD_W;
        let sy = self.rows as f32 / PLAYFIELD_H;

        let c0 = (r.x * sx).floor().max(0.0);
        let r0 = (r.y * sy).floor().max(0.0);
        let c1 = (r.right() * sx).ceil().min(self.cols as f32);
        let r1 = (r.bottom() * sy).ceil().min(self.rows as f32);
        if c0 >= self.cols as f32 || r0 >= self.rows as f32 || c1 <= 0.0 || r1 <= 0.0 {
            return None;
        }

        let (c0, r0) = (c0 as usize, r0 as usize);
        let c1 = (c1 as usize).max(c0 + 1);
        let r1 = (r1 as usize).max(r0 + 1);
        Some((self.col + c0, self.row + r0, self.col + c1, self.row + r1))
    }

    /// Single cell containing the point, if on screen.
    pub fn point(&self, x: f32, y: f32) -> Option<(usize, usize)> {
        if x < 0.0 || y < 0.0 || x >= PLAYFIELD_W || y >= PLAYFIELD_H || self.cols == 0 || self.rows == 0 {
            return None;
        }
        let c = (x / PLAYFIELD_W * self.cols as f32) as usize;
        let r = (y / PLAYFIELD_H * self.rows as f32) as usize;
        Some((self.col + c.min(self.cols - 1), self.row + r.min(self.rows - 1)))
    }
}

// ── Confetti ──

const CONFETTI_PIECES: usize = 50;
/// Animation ticks a celebration lasts.
const CONFETTI_TICKS: u32 = 180;

#[derive(Clone, Copy, Debug)]
struct Confetti {
    x: f32,     // 0..1 across the screen
    delay: u32, // ticks before it starts falling
    speed: f32, // screen heights per tick
    color: usize,
}

impl Confetti {
    fn burst(rng: &mut impl Rng) -> Vec<Confetti> {
        (0..CONFETTI_PIECES)
            .map(|_| Confetti {
                x: rng.random_range(0.0..1.0),
                delay: rng.random_range(0..120),
                speed: rng.random_range(0.008..0.02),
                color: rng.random_range(0..CONFETTI.len()),
            })
            .collect()
    }

    /// Fractional (x, y) position `age` ticks after the burst.
    fn position(&self, age: u32) -> Option<(f32, f32)> {
        if age < self.delay || age >= CONFETTI_TICKS {
            return None;
        }
        let y = (age - self.delay) as f32 * self.speed;
        (y < 1.0).then_some((self.x, y))
    }
}

// ── Renderer ──

const HUD_ROW: usize = 0;
const FIELD_ROW: usize = 1;
/// HUD + message + help.
const RESERVED_ROWS: usize = 3;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    enhanced_keys: bool,
    confetti: Vec<Confetti>,
    confetti_start: u32,
    rng: StdRng,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
            enhanced_keys: false,
            confetti: vec![],
            confetti_start: 0,
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(SCREEN_BG),
            Clear(ClearType::All)
        )?;

        // Key release events make held-key movement exact; optional.
        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            let flags = KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                | KeyboardEnhancementFlags::REPORT_EVENT_TYPES;
            self.enhanced_keys = execute!(self.writer, PushKeyboardEnhancementFlags(flags)).is_ok();
        }
        log::info!("keyboard release events: {}", self.enhanced_keys);

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    /// True when the terminal reports key releases.
    pub fn key_release_supported(&self) -> bool {
        self.enhanced_keys
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.enhanced_keys {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, world: &WorldState) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(SCREEN_BG), Clear(ClearType::All))?;
        }

        if self.last_phase != Some(world.phase) {
            self.on_phase_change(world);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(SCREEN_BG), Clear(ClearType::All))?;
            self.last_phase = Some(world.phase);
        }

        self.front.clear();

        match world.phase {
            Phase::Menu => self.compose_menu(world),
            Phase::Playing => self.compose_game(world),
            Phase::Paused => {
                self.compose_game(world);
                self.compose_pause_overlay(world);
            }
            Phase::LevelComplete => {
                self.compose_game(world);
                self.compose_level_complete(world);
            }
            Phase::GameOver => self.compose_game_over(world),
            Phase::AllClear => self.compose_all_clear(world),
        }

        if !self.confetti.is_empty() {
            self.compose_confetti(world.anim_tick);
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    fn on_phase_change(&mut self, world: &WorldState) {
        if matches!(world.phase, Phase::LevelComplete | Phase::AllClear) {
            self.confetti = Confetti::burst(&mut self.rng);
            self.confetti_start = world.anim_tick;
        } else {
            self.confetti.clear();
        }
    }

    fn viewport(&self) -> Viewport {
        Viewport {
            col: 0,
            row: FIELD_ROW,
            cols: self.term_w,
            rows: self.term_h.saturating_sub(RESERVED_ROWS).max(1),
        }
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = SCREEN_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Compose: gameplay ──

    fn fill_rect(&mut self, vp: &Viewport, r: &Rect, glyph: char, fg: Color, bg: Color) {
        let Some((c0, r0, c1, r1)) = vp.cells(r) else { return };
        for y in r0..r1 {
            for x in c0..c1 {
                self.front.set(x, y, Cell::new(' ', fg, bg));
            }
        }
        self.front.set((c0 + c1 - 1) / 2, (r0 + r1 - 1) / 2, Cell::new(glyph, fg, bg));
    }

    fn compose_hud(&mut self, w: &WorldState) {
        self.front.fill_row(HUD_ROW, HUD_BG);
        let sound = if w.muted { "muted" } else { "sound on" };
        let hud = format!(
            " Level {}/{}  {}   Score: {:<5}  Lives: {}  Time: {:>2}  Berries left: {}   [{}]",
            w.current_level,
            LEVEL_COUNT,
            w.level_name(),
            w.score,
            w.lives,
            w.time_display(),
            w.level.remaining(),
            sound,
        );
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);
    }

    fn compose_game(&mut self, w: &WorldState) {
        let vp = self.viewport();

        self.compose_hud(w);

        for y in vp.row..vp.row + vp.rows {
            for x in vp.col..vp.col + vp.cols {
                self.front.set(x, y, Cell::new(' ', Color::White, SKY));
            }
        }

        for p in w.level.platforms() {
            self.fill_rect(&vp, p, ' ', Color::White, PLATFORM);
        }
        if let Some(door) = w.level.def.door {
            let fg = if w.level.all_collected() { BEE } else { Color::Black };
            self.fill_rect(&vp, &door, '▯', fg, DOOR);
        }
        if let Some(goal) = w.level.goal {
            self.fill_rect(&vp, &goal, '⚑', Color::White, FLAG);
        }
        let berries: Vec<Rect> = w.visible_collectibles().map(|c| c.rect).collect();
        for r in &berries {
            self.fill_rect(&vp, r, '♥', Color::White, STRAWBERRY);
        }
        for e in &w.level.enemies {
            self.fill_rect(&vp, &e.rect(), '●', Color::Black, BEE);
        }
        for p in &w.particles {
            if let Some((x, y)) = vp.point(p.x, p.y) {
                let glyph = if p.life > 0.5 { '*' } else { '·' };
                let bg = self.front.get(x, y).bg;
                self.front.set(x, y, Cell::new(glyph, STRAWBERRY, bg));
            }
        }
        self.fill_rect(&vp, &w.player.rect(), '☺', Color::White, PLAYER);

        let msg_row = vp.row + vp.rows;
        if !w.message.is_empty() {
            self.front.fill_row(msg_row, hex(0xC8B432));
            self.front.put_str(0, msg_row, &format!(" ◈ {} ", w.message), Color::Black, hex(0xC8B432));
        }
        let help = " ←→/AD: Move  ↑/W/Space: Jump  Esc/P: Pause  M: Mute  Q: Menu";
        self.front.put_str(0, msg_row + 1, help, Color::DarkGrey, Color::Reset);
    }

    // ── Compose: overlays and screens ──

    /// Dark box centered on screen; returns its top row.
    fn compose_box(&mut self, width: usize, height: usize, bg: Color) -> (usize, usize) {
        let bw = width.min(self.front.width);
        let bh = height.min(self.front.height);
        let bx = self.front.width.saturating_sub(bw) / 2;
        let by = self.front.height.saturating_sub(bh) / 2;
        for y in by..by + bh {
            for x in bx..bx + bw {
                self.front.set(x, y, Cell::new(' ', Color::White, bg));
            }
        }
        (bx, by)
    }

    fn compose_pause_overlay(&mut self, w: &WorldState) {
        let bg = hex(0x282828);
        let (_, y) = self.compose_box(36, 8, bg);
        let blink = (w.anim_tick / 20) % 2 == 0;
        let label = if blink { "▶  PAUSED  ◀" } else { "   PAUSED   " };
        self.front.put_centered(y + 1, label, hex(0xFFDC32), bg);
        self.front.put_centered(y + 3, "Esc/P/Enter  Resume", hex(0x64C8FF), bg);
        self.front.put_centered(y + 4, "M  Sound on/off", hex(0xB4B4B4), bg);
        self.front.put_centered(y + 5, "Q  Back to menu", hex(0xB4B4B4), bg);
    }

    fn compose_level_complete(&mut self, w: &WorldState) {
        let bg = hex(0x1E3C1E);
        let (_, y) = self.compose_box(40, 9, bg);
        self.front.put_centered(y + 1, &format!("★ Level {} complete! ★", w.current_level), FLAG, bg);
        self.front.put_centered(y + 3, &format!("Score: {}", w.score), Color::White, bg);
        if let Some(best) = w.best_times.get(w.current_level) {
            self.front.put_centered(y + 4, &format!("Best time: {best:.1}s"), BEE, bg);
        }
        let next = if w.current_level < LEVEL_COUNT { "Enter  Next level" } else { "Enter  Finish" };
        self.front.put_centered(y + 6, next, hex(0x50FF50), bg);
        self.front.put_centered(y + 7, "Q  Menu", Color::DarkGrey, bg);
    }

    fn compose_menu(&mut self, w: &WorldState) {
        let h = self.front.height;
        let top = h.saturating_sub(14) / 2;
        self.front.put_centered(top, "♥  STRAWBERRY QUEST  ♥", STRAWBERRY, SCREEN_BG);
        self.front.put_centered(top + 2, "Hop across the platforms, pick every strawberry,", Color::White, SCREEN_BG);
        self.front.put_centered(top + 3, "watch out for the bees and reach the flag!", Color::White, SCREEN_BG);

        self.front.put_centered(top + 5, "Enter / Space   Start", hex(0x50FF50), SCREEN_BG);
        self.front.put_centered(top + 6, "←→ Move   ↑ Jump   Esc Pause   M Mute", hex(0x64C8FF), SCREEN_BG);
        self.front.put_centered(top + 7, "Q   Quit", Color::DarkGrey, SCREEN_BG);

        let mut row = top + 9;
        for level in 1..=LEVEL_COUNT {
            if let Some(best) = w.best_times.get(level) {
                self.front.put_centered(row, &format!("Level {level} best time: {best:.1}s"), BEE, SCREEN_BG);
                row += 1;
            }
        }
        if w.muted {
            self.front.put_centered(row + 1, "(sound is off)", Color::DarkGrey, SCREEN_BG);
        }
        if !w.message.is_empty() {
            self.front.put_centered(h.saturating_sub(2), &w.message, Color::Black, hex(0xC8B432));
        }
    }

    fn compose_game_over(&mut self, w: &WorldState) {
        let top = self.front.height.saturating_sub(9) / 2;
        let red = hex(0xFF3C3C);
        let reason = match w.time_left {
            Some(t) if t <= 0.0 && w.lives > 0 => "Out of time!",
            _ => "Out of lives!",
        };
        self.front.put_centered(top, "✕  GAME OVER  ✕", red, SCREEN_BG);
        self.front.put_centered(top + 1, reason, Color::White, SCREEN_BG);
        self.front.put_centered(top + 3, &format!("Score: {}   Level: {}", w.score, w.current_level), Color::White, SCREEN_BG);
        self.front.put_centered(top + 5, "R  Try this level again", hex(0x50FF50), SCREEN_BG);
        self.front.put_centered(top + 6, "Enter  Start over", hex(0x64C8FF), SCREEN_BG);
        self.front.put_centered(top + 7, "Q  Menu", Color::DarkGrey, SCREEN_BG);
    }

    fn compose_all_clear(&mut self, w: &WorldState) {
        let top = self.front.height.saturating_sub(8) / 2;
        self.front.put_centered(top, "★  YOU DID IT!  ALL LEVELS CLEAR!  ★", BEE, SCREEN_BG);
        self.front.put_centered(top + 2, &format!("Final score: {}", w.score), Color::White, SCREEN_BG);
        self.front.put_centered(top + 4, "Enter  Play again", hex(0x50FF50), SCREEN_BG);
        self.front.put_centered(top + 5, "Q  Menu", Color::DarkGrey, SCREEN_BG);
    }

    fn compose_confetti(&mut self, anim_tick: u32) {
        let age = anim_tick.wrapping_sub(self.confetti_start);
        let (w, h) = (self.front.width, self.front.height);
        if w == 0 || h == 0 {
            return;
        }
        for i in 0..self.confetti.len() {
            let piece = self.confetti[i];
            if let Some((fx, fy)) = piece.position(age) {
                let x = ((fx * w as f32) as usize).min(w - 1);
                let y = ((fy * h as f32) as usize).min(h - 1);
                self.front.tint(x, y, CONFETTI[piece.color]);
            }
        }
    }
}
