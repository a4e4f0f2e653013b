use bubbleflask::{Field, Flask, Phase};
use crossterm::{
    cursor, execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Write};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
        }
    }
}

pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }
    fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }
    pub(crate) fn clear(&mut self, bg: Color) {
        for c in &mut self.cells {
            *c = Cell {
                bg,
                ..Cell::default()
            };
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Pixel {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) on: bool,
}

impl Pixel {
    const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, on: true }
    }
}

/// Braille sub-pixel canvas: 2×4 dots per terminal cell.
pub(crate) struct PixelCanvas {
    pub(crate) w: u32,
    pub(crate) h: u32,
    px: Vec<Pixel>,
}

impl PixelCanvas {
    pub(crate) fn new(w: u32, h: u32) -> Self {
        Self {
            w,
            h,
            px: vec![Pixel::default(); (w as usize) * (h as usize)],
        }
    }
    fn idx(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub(crate) fn clear(&mut self) {
        self.px.fill(Pixel::default());
    }
    pub(crate) fn plot(&mut self, x: i32, y: i32, p: Pixel) {
        if x < 0 || y < 0 || x as u32 >= self.w || y as u32 >= self.h {
            return;
        }
        let i = self.idx(x as u32, y as u32);
        self.px[i] = p;
    }
    fn disc(&mut self, cx: f32, cy: f32, r: f32, p: Pixel) {
        let r = r.max(0.8);
        let rr = r * r;
        let (x0, x1) = ((cx - r).floor() as i32, (cx + r).ceil() as i32);
        let (y0, y1) = ((cy - r).floor() as i32, (cy + r).ceil() as i32);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                if dx * dx + dy * dy <= rr {
                    self.plot(x, y, p);
                }
            }
        }
    }
    fn hline(&mut self, x0: i32, x1: i32, y: i32, p: Pixel) {
        for x in x0..=x1 {
            self.plot(x, y, p);
        }
    }
    fn vline(&mut self, x: i32, y0: i32, y1: i32, p: Pixel) {
        for y in y0..=y1 {
            self.plot(x, y, p);
        }
    }
}

pub(crate) struct Terminal {
    out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    prev: CellBuffer,
    pub(crate) cur: CellBuffer,
    pub(crate) canvas: PixelCanvas,
}

impl Terminal {
    pub(crate) fn begin() -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            terminal::Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        let (cols, rows) = terminal::size()?;
        Ok(Self {
            out,
            cols,
            rows,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
            canvas: PixelCanvas::new(cols as u32 * 2, rows as u32 * 4),
        })
    }

    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        queue!(
            self.out,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub(crate) fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        self.canvas = PixelCanvas::new(c as u32 * 2, r as u32 * 4);
        queue!(self.out, Clear(ClearType::All))?;
        Ok(true)
    }

    /// Writes only the cells that changed since the last frame.
    pub(crate) fn present(&mut self) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;
        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if c == self.prev.cells[i] {
                    continue;
                }
                queue!(self.out, cursor::MoveTo(x, y))?;
                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }
                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        Ok(())
    }
}

fn braille_bit(dx: u32, dy: u32) -> u8 {
    // (0,0)=1 (0,1)=2 (0,2)=4 (0,3)=64
    // (1,0)=8 (1,1)=16 (1,2)=32 (1,3)=128
    match (dx, dy) {
        (0, 0) => 0x01,
        (0, 1) => 0x02,
        (0, 2) => 0x04,
        (0, 3) => 0x40,
        (1, 0) => 0x08,
        (1, 1) => 0x10,
        (1, 2) => 0x20,
        (1, 3) => 0x80,
        _ => 0x00,
    }
}

/// Folds the dot canvas into braille glyphs, averaging the lit dots' colors.
pub(crate) fn canvas_to_cells(canvas: &PixelCanvas, out: &mut CellBuffer, color: bool, bg: Color) {
    for cy in 0..out.h as u32 {
        for cx in 0..out.w as u32 {
            let mut mask: u8 = 0;
            let (mut sr, mut sg, mut sb, mut n) = (0u32, 0u32, 0u32, 0u32);
            for dy in 0..4 {
                for dx in 0..2 {
                    let (x, y) = (cx * 2 + dx, cy * 4 + dy);
                    if x >= canvas.w || y >= canvas.h {
                        continue;
                    }
                    let p = canvas.px[canvas.idx(x, y)];
                    if p.on {
                        mask |= braille_bit(dx, dy);
                        sr += p.r as u32;
                        sg += p.g as u32;
                        sb += p.b as u32;
                        n += 1;
                    }
                }
            }
            if mask == 0 {
                continue;
            }
            let fg = if color {
                Color::Rgb {
                    r: (sr / n) as u8,
                    g: (sg / n) as u8,
                    b: (sb / n) as u8,
                }
            } else {
                Color::White
            };
            let ch = char::from_u32(0x2800 + mask as u32).unwrap_or(' ');
            out.set(cx as u16, cy as u16, Cell { ch, fg, bg });
        }
    }
}

/// Where the flask's container coordinates land on the dot canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Viewport {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) scale: f32,
}

impl Viewport {
    /// Largest uniform scale that fits `width × height` into the dot area,
    /// centered, leaving `margin` dots around it.
    pub(crate) fn fit(dots_w: u32, dots_h: u32, width: f32, height: f32, margin: f32) -> Self {
        let avail_w = (dots_w as f32 - 2.0 * margin).max(1.0);
        let avail_h = (dots_h as f32 - 2.0 * margin).max(1.0);
        let scale = (avail_w / width.max(1.0)).min(avail_h / height.max(1.0));
        Self {
            x: (dots_w as f32 - width * scale) * 0.5,
            y: (dots_h as f32 - height * scale) * 0.5,
            scale,
        }
    }

    pub(crate) fn map(&self, x: f32, y: f32) -> (f32, f32) {
        (self.x + x * self.scale, self.y + y * self.scale)
    }
}

const GLASS: Pixel = Pixel::rgb(150, 180, 210);
const FLAME_HOT: Pixel = Pixel::rgb(255, 140, 40);
const FLAME_CORE: Pixel = Pixel::rgb(90, 140, 255);
const SHARD: Pixel = Pixel::rgb(200, 220, 240);

const BUBBLE_COLD: [Pixel; 4] = [
    Pixel::rgb(120, 200, 255),
    Pixel::rgb(140, 230, 210),
    Pixel::rgb(170, 170, 255),
    Pixel::rgb(110, 220, 160),
];
const BUBBLE_HOT: Pixel = Pixel::rgb(255, 120, 80);

/// Per-bubble visual, indexed by body position in the field.
pub(crate) struct BubbleSprites {
    tints: Vec<Pixel>,
}

impl BubbleSprites {
    pub(crate) fn for_field(field: &Field) -> Self {
        let tints = (0..field.len())
            .map(|i| BUBBLE_COLD[i % BUBBLE_COLD.len()])
            .collect();
        Self { tints }
    }

    fn tint(&self, i: usize, heat: f32) -> Pixel {
        let base = self.tints.get(i).copied().unwrap_or(BUBBLE_COLD[0]);
        lerp_pixel(base, BUBBLE_HOT, heat)
    }
}

fn lerp_pixel(a: Pixel, b: Pixel, t: f32) -> Pixel {
    let t = t.clamp(0.0, 1.0);
    let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    Pixel::rgb(mix(a.r, b.r), mix(a.g, b.g), mix(a.b, b.b))
}

pub(crate) fn draw_flask(
    canvas: &mut PixelCanvas,
    vp: Viewport,
    field: &Field,
    sprites: &BubbleSprites,
    flask: &Flask,
    frame: u64,
) {
    let bounds = field.params().bounds;
    let (x0, y0) = vp.map(0.0, 0.0);
    let (x1, y1) = vp.map(bounds.width, bounds.height);
    let (x0, y0, x1, y1) = (
        x0.floor() as i32 - 1,
        y0.floor() as i32 - 1,
        x1.ceil() as i32,
        y1.ceil() as i32,
    );

    if let Phase::Exploded = flask.phase() {
        draw_shards(canvas, (x0, y0, x1, y1), frame);
        return;
    }

    // open-necked vessel: walls and floor, gap in the lid
    canvas.vline(x0, y0, y1, GLASS);
    canvas.vline(x1, y0, y1, GLASS);
    canvas.hline(x0, x1, y1, GLASS);
    let neck = (x1 - x0) / 3;
    canvas.hline(x0, x0 + neck, y0, GLASS);
    canvas.hline(x1 - neck, x1, y0, GLASS);

    if flask.is_heating() {
        let flicker = (frame % 3) as i32;
        let mid = (x0 + x1) / 2;
        for k in 0..6 {
            let half = 6 - k + flicker;
            canvas.hline(mid - half, mid + half, y1 + 2 + k, FLAME_HOT);
        }
        canvas.hline(mid - 2, mid + 2, y1 + 3, FLAME_CORE);
    }

    let heat = flask.progress();
    for (i, b) in field.bodies().iter().enumerate() {
        let (cx, cy) = b.center();
        let (px, py) = vp.map(cx, cy);
        canvas.disc(px, py, b.radius * vp.scale, sprites.tint(i, heat));
    }
}

fn draw_shards(canvas: &mut PixelCanvas, frame_box: (i32, i32, i32, i32), frame: u64) {
    let (x0, y0, x1, y1) = frame_box;
    let (cx, cy) = ((x0 + x1) / 2, (y0 + y1) / 2);
    let spread = 1.0 + (frame % 240) as f32 * 0.05;
    for k in 0..24 {
        let a = k as f32 * 0.2618;
        let d = (8 + (k * 7) % 13) as f32 * spread;
        let (sx, sy) = (cx as f32 + a.cos() * d * 2.0, cy as f32 + a.sin() * d);
        canvas.plot(sx as i32, sy as i32, SHARD);
        canvas.plot(sx as i32 + 1, sy as i32, SHARD);
    }
}

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x.saturating_add(i as u16);
        if xx >= buf.w || y >= buf.h {
            break;
        }
        buf.set(xx, y, Cell { ch, fg, bg });
    }
}

pub(crate) fn bar(value01: f32, width: usize) -> String {
    let fill = (value01.clamp(0.0, 1.0) * width as f32 + 0.5) as usize;
    let mut s = String::with_capacity(width + 2);
    s.push('[');
    for i in 0..width {
        s.push(if i < fill { '█' } else { ' ' });
    }
    s.push(']');
    s
}

pub(crate) fn hud(buf: &mut CellBuffer, field: &Field, flask: &Flask) {
    let (fg, bg) = (Color::White, Color::Black);
    let state = match flask.phase() {
        Phase::Idle => "cold".to_string(),
        Phase::Heating { remaining } => format!("HEATING {:>4.1}s", remaining.as_secs_f32()),
        Phase::Exploded => "EXPLODED".to_string(),
    };
    let title = format!(
        "Bubble Flask | {state} | pressure {} | energy {:>7.2}",
        bar(flask.progress(), 16),
        field.kinetic_energy()
    );
    draw_text(buf, 1, 0, &title, fg, bg);

    let help = "space burner | r reset | c color | tab hud | q quit";
    draw_text(buf, 1, buf.h.saturating_sub(1), help, Color::Grey, bg);
}

pub(crate) fn draw_center_box(buf: &mut CellBuffer, title: &str, body: &str) {
    let (fg, bg) = (Color::White, Color::Black);
    let bw = 44u16.min(buf.w.saturating_sub(4));
    let bh = 7u16.min(buf.h.saturating_sub(2));
    if bw < 4 || bh < 3 {
        return;
    }
    let x0 = (buf.w - bw) / 2;
    let y0 = (buf.h - bh) / 2;
    let put = |buf: &mut CellBuffer, x, y, ch| buf.set(x, y, Cell { ch, fg, bg });

    for y in y0..y0 + bh {
        for x in x0..x0 + bw {
            put(buf, x, y, ' ');
        }
    }
    for x in x0..x0 + bw {
        put(buf, x, y0, '─');
        put(buf, x, y0 + bh - 1, '─');
    }
    for y in y0..y0 + bh {
        put(buf, x0, y, '│');
        put(buf, x0 + bw - 1, y, '│');
    }
    put(buf, x0, y0, '┌');
    put(buf, x0 + bw - 1, y0, '┐');
    put(buf, x0, y0 + bh - 1, '└');
    put(buf, x0 + bw - 1, y0 + bh - 1, '┘');

    draw_text(buf, x0 + 2, y0 + 1, title, Color::Yellow, bg);
    for (k, line) in body.lines().enumerate() {
        let y = y0 + 3 + k as u16;
        if y >= y0 + bh - 1 {
            break;
        }
        draw_text(buf, x0 + 2, y, line, fg, bg);
    }
}
