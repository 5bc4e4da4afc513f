//! Software-rendered visualizer using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                        ◆ star                        │
//! │                     ·  ·●·  ·                        │
//! │                  ·  ●·  ·  ·●  ·      ← particles    │
//! │               ·  ·  ·  ·●·  ·  ·  ·     + ornaments  │
//! │                                                      │
//! │  status bar                                          │
//! │  key legend                                          │
//! └──────────────────────────────────────────────────────┘
//! ```

use std::sync::mpsc::Sender;
use std::time::Duration;

use glam::Vec3;
use minifb::{Key, KeyRepeat, MouseMode, Window, WindowOptions};
use tree_scene::{OrnamentArena, OrnamentId, ParticleField, SceneSnapshot};

use crate::hit_test::{Projector, ScreenPoint};
use crate::source::{SimInput, SimKey};

// ════════════════════════════════════════════════════════════════════════════
// Palette / layout constants
// ════════════════════════════════════════════════════════════════════════════

const BG_COLOR:      u32 = 0xFF05080F;
const TEXT_BG:       u32 = 0xFF0F1A2E;
const STATUS_H:      usize = 36;
const FOLIAGE:       u32 = 0xFF1FAF5A;
const FOLIAGE_CHAOS: u32 = 0xFF7FE0FF;
const STAR_COLOR:    u32 = 0xFFFFD700;
const RING_COLOR:    u32 = 0xFFFFFFFF;
const CURSOR_OPEN:   u32 = 0xFF88AAFF;
const CURSOR_PINCH:  u32 = 0xFFFF5050;

/// Ornament world radius used for drawing and picking.
pub const ORNAMENT_RADIUS: f32 = 0.14;
/// How much a fully popped ornament grows.
const POP_GROWTH: f32 = 2.5;

/// Manual speed for the arrow keys, matching the gesture range.
pub const MANUAL_ROTATION: f32 = 0.04;

// ════════════════════════════════════════════════════════════════════════════
// WindowInput
// ════════════════════════════════════════════════════════════════════════════

/// Manual controls read from the window each frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WindowInput {
    pub quit:             bool,
    pub toggle_formation: bool,
    /// `Some` while an arrow key is held.
    pub manual_rotation:  Option<f32>,
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window: Window,
    buf:    Vec<u32>,
    width:  usize,
    height: usize,
    /// Present when the simulated hand is the landmark source.
    sim_tx: Option<Sender<SimInput>>,
    pointer: Option<(f32, f32)>,
    pinch_held: bool,
}

impl Visualizer {
    pub fn new(
        width:  usize,
        height: usize,
        fps:    u32,
        sim_tx: Option<Sender<SimInput>>,
    ) -> Result<Self, String> {
        let mut window = Window::new(
            "Gesture Tree — open palm: scatter · fist: gather · pinch: pick",
            width, height,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        ).map_err(|e| e.to_string())?;

        window.limit_update_rate(Some(Duration::from_micros(1_000_000 / fps.max(1) as u64)));

        Ok(Visualizer {
            window,
            buf: vec![BG_COLOR; width * height],
            width,
            height,
            sim_tx,
            pointer: None,
            pinch_held: false,
        })
    }

    /// Returns false when the window should close.
    pub fn is_open(&self) -> bool { self.window.is_open() }

    pub fn size(&self) -> (usize, usize) { (self.width, self.height) }

    /// Read manual controls and, in simulation mode, forward the hand pose.
    pub fn poll_input(&mut self) -> WindowInput {
        let mut input = WindowInput::default();
        if !self.window.is_open()
            || self.window.is_key_pressed(Key::Q, KeyRepeat::No)
            || self.window.is_key_pressed(Key::Escape, KeyRepeat::No)
        {
            input.quit = true;
            return input;
        }

        input.toggle_formation = self.window.is_key_pressed(Key::Space, KeyRepeat::No);

        let left  = self.window.is_key_down(Key::Left);
        let right = self.window.is_key_down(Key::Right);
        input.manual_rotation = match (left, right) {
            (true, false) => Some(MANUAL_ROTATION),
            (false, true) => Some(-MANUAL_ROTATION),
            _             => None,
        };

        if let Some(tx) = &self.sim_tx {
            for (key, sim) in [
                (Key::O, SimKey::OpenPalm),
                (Key::F, SimKey::ClosedFist),
                (Key::P, SimKey::Pinch),
                (Key::H, SimKey::HideHand),
            ] {
                if self.window.is_key_pressed(key, KeyRepeat::No) {
                    let _ = tx.send(SimInput::KeyDown(sim));
                }
                if self.window.is_key_released(key) {
                    let _ = tx.send(SimInput::KeyUp(sim));
                }
            }
            self.pinch_held = self.window.is_key_down(Key::P);

            // One pointer sample per window frame plays the role of a camera frame.
            self.pointer = self
                .window
                .get_mouse_pos(MouseMode::Clamp)
                .map(|(x, y)| (x / self.width as f32, y / self.height as f32));
            if let Some((x, y)) = self.pointer {
                let _ = tx.send(SimInput::Pointer { x, y });
            }
        }

        input
    }

    /// Render one frame.
    pub fn render(
        &mut self,
        snapshot:  &SceneSnapshot,
        arena:     &OrnamentArena,
        field:     &ParticleField,
        projector: &Projector,
        ornaments: &[Option<ScreenPoint>],
        star:      Option<ScreenPoint>,
        status:    &str,
    ) {
        self.buf.fill(BG_COLOR);

        // ── Foliage ───────────────────────────────────────────────────────
        let foliage = blend(FOLIAGE_CHAOS, FOLIAGE, field.progress());
        for p in field.positions() {
            if let Some(sp) = projector.project(p) {
                let shade = (1.6 - sp.depth / 30.0).clamp(0.35, 1.0);
                let c = blend(BG_COLOR, foliage, shade);
                self.set_pixel(sp.x as isize, sp.y as isize, c);
                self.set_pixel(sp.x as isize + 1, sp.y as isize, c);
            }
        }

        // ── Star (only meaningful once assembled) ─────────────────────────
        if let Some(s) = star.filter(|_| field.progress() > 0.95) {
            let r = (0.25 * s.scale).max(3.0) as usize;
            self.draw_diamond(s.x as usize, s.y as usize, r, STAR_COLOR);
        }

        // ── Ornaments, far to near ────────────────────────────────────────
        let mut order: Vec<usize> = (0..ornaments.len()).filter(|&i| ornaments[i].is_some()).collect();
        order.sort_by(|&a, &b| {
            let da = ornaments[a].map_or(0.0, |p| p.depth);
            let db = ornaments[b].map_or(0.0, |p| p.depth);
            db.total_cmp(&da)
        });
        // The popped ornament is drawn last so it sits in front.
        if let Some(sel) = snapshot.selected_ornament {
            if let Some(pos) = order.iter().position(|&i| i == sel) {
                let i = order.remove(pos);
                order.push(i);
            }
        }
        for i in order {
            let (Some(sp), Some(o)) = (ornaments[i], arena.get(OrnamentId(i))) else { continue };
            let r = (ORNAMENT_RADIUS * sp.scale * (1.0 + o.pop * POP_GROWTH)).max(2.0);
            self.fill_circle(sp.x, sp.y, r, o.color);
            if snapshot.selected_ornament == Some(i) {
                self.draw_ring(sp.x, sp.y, r + 3.0, RING_COLOR);
            }
        }

        // ── Simulated hand cursor ─────────────────────────────────────────
        if let Some((x, y)) = self.pointer.filter(|_| self.sim_tx.is_some()) {
            let color = if self.pinch_held { CURSOR_PINCH } else { CURSOR_OPEN };
            self.draw_ring(x * self.width as f32, y * self.height as f32, 8.0, color);
        }

        // ── Status bar ────────────────────────────────────────────────────
        let status_y = self.height - STATUS_H;
        self.fill_rect(0, status_y, self.width, STATUS_H, TEXT_BG);
        let head = format!(
            "{}  rot {:+.3}  sel {}",
            snapshot.formation.name(),
            snapshot.rotation_speed,
            snapshot.selected_ornament.map_or("-".to_string(), |i| i.to_string()),
        );
        self.draw_label(&head, 10, status_y + 6, 0xFFFFD700);
        self.draw_label(status, 10 + (head.len() + 3) * 4, status_y + 6, 0xFFEEEEEE);

        // ── Key legend ────────────────────────────────────────────────────
        let legend = if self.sim_tx.is_some() {
            "MOUSE=hand  O=open palm  F=fist  P=pinch  H=hide  SPACE=toggle  ARROWS=rotate  Q=quit"
        } else {
            "SPACE=toggle formation  ARROWS=rotate  Q=quit"
        };
        self.draw_label(legend, 10, self.height - 12, 0xFF888888);

        self.window.update_with_buffer(&self.buf, self.width, self.height).ok();
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(self.height) {
            for col in x..(x + w).min(self.width) {
                self.buf[row * self.width + col] = color;
            }
        }
    }

    fn set_pixel(&mut self, x: isize, y: isize, color: u32) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            self.buf[y as usize * self.width + x as usize] = color;
        }
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, r: f32, color: u32) {
        let ri = r.ceil() as isize;
        let (cxi, cyi) = (cx as isize, cy as isize);
        for dy in -ri..=ri {
            for dx in -ri..=ri {
                if ((dx * dx + dy * dy) as f32) <= r * r {
                    // Cheap highlight toward the upper left.
                    let lit = (dx + dy) as f32 / (2.0 * r.max(1.0));
                    let c = blend(color, 0xFFFFFFFF, (-lit * 0.5).clamp(0.0, 0.45));
                    self.set_pixel(cxi + dx, cyi + dy, c);
                }
            }
        }
    }

    fn draw_ring(&mut self, cx: f32, cy: f32, r: f32, color: u32) {
        let steps = (r * 6.0).max(16.0) as usize;
        for k in 0..steps {
            let a = k as f32 / steps as f32 * std::f32::consts::TAU;
            self.set_pixel((cx + r * a.cos()) as isize, (cy + r * a.sin()) as isize, color);
        }
    }

    fn draw_diamond(&mut self, cx: usize, cy: usize, r: usize, color: u32) {
        for dy in 0..=r as isize {
            let span = r as isize - dy;
            for dx in -span..=span {
                self.set_pixel(cx as isize + dx, cy as isize + dy, color);
                self.set_pixel(cx as isize + dx, cy as isize - dy, color);
            }
        }
    }

    /// Minimal bitmap font — 3×5 characters for status rendering.
    /// Each character is encoded as 5 rows × 3 bits.
    fn draw_label(&mut self, text: &str, x: usize, y: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.set_pixel((cx + col) as isize, (y + row) as isize, color);
                    }
                }
            }
            cx += 4; // 3 wide + 1 gap
            if cx + 4 > self.width { break; }
        }
    }
}

/// World-space position of the tree-top star.
pub fn star_position(tree_height: f32) -> Vec3 {
    Vec3::new(0.0, tree_height + 0.25, 0.0)
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' | '—' | '–' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '_' => [0b000, 0b000, 0b000, 0b000, 0b111],
        '…' => [0b000, 0b000, 0b000, 0b000, 0b101],
        '(' => [0b001, 0b010, 0b010, 0b010, 0b001],
        ')' => [0b100, 0b010, 0b010, 0b010, 0b100],
        '[' => [0b110, 0b100, 0b100, 0b100, 0b110],
        ']' => [0b011, 0b001, 0b001, 0b001, 0b011],
        '<' => [0b001, 0b010, 0b100, 0b010, 0b001],
        '>' => [0b100, 0b010, 0b001, 0b010, 0b100],
        '"' => [0b101, 0b101, 0b000, 0b000, 0b000],
        '?' => [0b111, 0b001, 0b010, 0b000, 0b010],
        '!' => [0b010, 0b010, 0b010, 0b000, 0b010],
        '%' => [0b101, 0b001, 0b010, 0b100, 0b101],
        '*' | '×' => [0b000, 0b101, 0b010, 0b101, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        '`' | '\'' => [0b010, 0b010, 0b000, 0b000, 0b000],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

/// Alpha-blend two ARGB colors. `t` = 0.0 → all `a`, `t` = 1.0 → all `b`.
fn blend(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    let lerp = |ca: u32, cb: u32| (ca as f32 * (1.0 - t) + cb as f32 * t) as u32;
    let ar = (a >> 16) & 0xFF; let br = (b >> 16) & 0xFF;
    let ag = (a >>  8) & 0xFF; let bg = (b >>  8) & 0xFF;
    let ab =  a        & 0xFF; let bb =  b        & 0xFF;
    0xFF000000 | (lerp(ar, br) << 16) | (lerp(ag, bg) << 8) | lerp(ab, bb)
}
