use anyhow::Result;
use rand::Rng;
use rand::rngs::StdRng;
use tracing::debug;

use crate::filter::Filter;
use crate::raster::RasterBuffer;

/// Photos per strip. The layout, the session and the compositor all agree
/// on this; a different count reaching the compositor is a bug upstream.
pub const PHOTO_COUNT: usize = 4;

pub const DEFAULT_PHOTO_WIDTH: u32 = 300;
pub const DEFAULT_PHOTO_HEIGHT: u32 = 225;
const BORDER: u32 = 15;
const GAP: u32 = 5;
const FRAME_THICKNESS: u32 = 2;

const BACKGROUND: [u8; 3] = [250, 248, 245];
const EDGE_STROKE: [u8; 3] = [228, 222, 214];
const PHOTO_FRAME: [u8; 3] = [17, 17, 17];
const POLAROID_WHITE: [u8; 3] = [255, 255, 255];
const DATE_COLOR: [u8; 3] = [155, 133, 121];

/// Extra borders of the Polaroid frame variant: even sides and top, the
/// classic oversized bottom that carries the date stamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PolaroidFrame {
    pub top: u32,
    pub side: u32,
    pub bottom: u32,
}

const POLAROID_FRAME: PolaroidFrame = PolaroidFrame {
    top: 20,
    side: 20,
    bottom: 60,
};

/// Strip geometry, derived once from the filter choice and never mutated
/// during a render.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StripLayout {
    pub photo_width: u32,
    pub photo_height: u32,
    pub border: u32,
    pub gap: u32,
    pub polaroid: Option<PolaroidFrame>,
}

impl StripLayout {
    pub fn for_filter(filter: Filter, photo_width: u32, photo_height: u32) -> Self {
        Self {
            photo_width,
            photo_height,
            border: BORDER,
            gap: GAP,
            polaroid: (filter == Filter::Polaroid).then_some(POLAROID_FRAME),
        }
    }

    /// Outer dimensions of one framed photo.
    pub fn frame_size(&self) -> (u32, u32) {
        match self.polaroid {
            Some(p) => (
                self.photo_width + 2 * p.side,
                self.photo_height + p.top + p.bottom,
            ),
            None => (self.photo_width, self.photo_height),
        }
    }

    pub fn canvas_size(&self, count: usize) -> (u32, u32) {
        let (fw, fh) = self.frame_size();
        let count = count as u32;
        (
            fw + 2 * self.border,
            count * fh + (count - 1) * self.gap + 2 * self.border,
        )
    }

    /// Top-left corner of frame `index`.
    pub fn frame_origin(&self, index: usize) -> (u32, u32) {
        let (_, fh) = self.frame_size();
        (self.border, self.border + index as u32 * (fh + self.gap))
    }
}

/// Arrange the already-filtered photos into the final strip.
///
/// `date` is only rendered by the Polaroid variant. The RNG drives the
/// per-photo Polaroid rotation; pass a seeded one for reproducible bytes.
pub fn compose_strip(
    photos: Vec<RasterBuffer>,
    filter: Filter,
    rng: &mut StdRng,
    date: &str,
) -> Result<RasterBuffer> {
    anyhow::ensure!(
        photos.len() == PHOTO_COUNT,
        "invalid photo count: expected {PHOTO_COUNT}, got {}",
        photos.len()
    );
    let first = &photos[0];
    let layout = StripLayout::for_filter(filter, first.width, first.height);
    for (i, photo) in photos.iter().enumerate() {
        anyhow::ensure!(
            photo.width == layout.photo_width && photo.height == layout.photo_height,
            "photo {i} is {}x{}, expected {}x{}",
            photo.width,
            photo.height,
            layout.photo_width,
            layout.photo_height
        );
    }

    let (canvas_w, canvas_h) = layout.canvas_size(photos.len());
    debug!(filter = filter.name(), canvas_w, canvas_h, "composing strip");

    let mut canvas = RasterBuffer::solid(canvas_w, canvas_h, BACKGROUND);
    stroke_rect(&mut canvas, 0, 0, canvas_w, canvas_h, 1, EDGE_STROKE);

    for (index, photo) in photos.into_iter().enumerate() {
        let (x, y) = layout.frame_origin(index);
        match layout.polaroid {
            Some(frame) => {
                let card = render_polaroid_card(photo, &layout, frame, date);
                let angle_deg = rng.gen_range(-2.0..=2.0);
                blit_rotated(&mut canvas, &card, x, y, angle_deg);
            }
            None => {
                // Frame ring sits outside the photo rect so the photo
                // interior is preserved byte-for-byte.
                stroke_rect(
                    &mut canvas,
                    x.saturating_sub(FRAME_THICKNESS),
                    y.saturating_sub(FRAME_THICKNESS),
                    layout.photo_width + 2 * FRAME_THICKNESS,
                    layout.photo_height + 2 * FRAME_THICKNESS,
                    FRAME_THICKNESS,
                    PHOTO_FRAME,
                );
                blit(&mut canvas, &photo, x, y);
            }
        }
    }

    Ok(canvas)
}

/// One white Polaroid card: frame, photo, date stamp in the bottom border.
fn render_polaroid_card(
    photo: RasterBuffer,
    layout: &StripLayout,
    frame: PolaroidFrame,
    date: &str,
) -> RasterBuffer {
    let (fw, fh) = layout.frame_size();
    let mut card = RasterBuffer::solid(fw, fh, POLAROID_WHITE);
    blit(&mut card, &photo, frame.side, frame.top);

    let scale = 2;
    let text_w = text_width(date, scale);
    let text_x = (fw.saturating_sub(text_w)) / 2;
    let text_y = frame.top + layout.photo_height + (frame.bottom - GLYPH_HEIGHT * scale) / 2;
    draw_text(&mut card, text_x, text_y, date, DATE_COLOR, scale);
    card
}

fn blit(dst: &mut RasterBuffer, src: &RasterBuffer, x: u32, y: u32) {
    for sy in 0..src.height.min(dst.height.saturating_sub(y)) {
        for sx in 0..src.width.min(dst.width.saturating_sub(x)) {
            dst.put_pixel(x + sx, y + sy, src.pixel(sx, sy));
        }
    }
}

/// Paste `src` rotated by `angle_deg` around its center, center placed
/// where the unrotated frame's center would sit. Dest pixels that map
/// outside the source keep the background.
fn blit_rotated(dst: &mut RasterBuffer, src: &RasterBuffer, x: u32, y: u32, angle_deg: f64) {
    if angle_deg.abs() < 1e-3 {
        blit(dst, src, x, y);
        return;
    }

    let (sin, cos) = angle_deg.to_radians().sin_cos();
    let cx = x as f64 + src.width as f64 / 2.0;
    let cy = y as f64 + src.height as f64 / 2.0;
    let hw = src.width as f64 / 2.0;
    let hh = src.height as f64 / 2.0;

    // Axis-aligned bounds of the rotated card, clamped to the canvas.
    let ext_x = hw * cos.abs() + hh * sin.abs();
    let ext_y = hw * sin.abs() + hh * cos.abs();
    let x0 = (cx - ext_x).floor().max(0.0) as u32;
    let y0 = (cy - ext_y).floor().max(0.0) as u32;
    let x1 = ((cx + ext_x).ceil() as u32).min(dst.width);
    let y1 = ((cy + ext_y).ceil() as u32).min(dst.height);

    for dy in y0..y1 {
        for dx in x0..x1 {
            // Inverse rotation back into card space.
            let rx = dx as f64 - cx;
            let ry = dy as f64 - cy;
            let sx = rx * cos + ry * sin + hw;
            let sy = -rx * sin + ry * cos + hh;
            if sx < 0.0 || sy < 0.0 {
                continue;
            }
            let (sx, sy) = (sx as u32, sy as u32);
            if sx < src.width && sy < src.height {
                dst.put_pixel(dx, dy, src.pixel(sx, sy));
            }
        }
    }
}

fn fill_rect(buf: &mut RasterBuffer, x: u32, y: u32, w: u32, h: u32, rgb: [u8; 3]) {
    for py in y..(y + h).min(buf.height) {
        for px in x..(x + w).min(buf.width) {
            buf.put_pixel(px, py, rgb);
        }
    }
}

fn stroke_rect(buf: &mut RasterBuffer, x: u32, y: u32, w: u32, h: u32, thickness: u32, rgb: [u8; 3]) {
    fill_rect(buf, x, y, w, thickness, rgb);
    fill_rect(buf, x, y + h.saturating_sub(thickness), w, thickness, rgb);
    fill_rect(buf, x, y, thickness, h, rgb);
    fill_rect(buf, x + w.saturating_sub(thickness), y, thickness, h, rgb);
}

// ── Date stamp glyphs ────────────────────────────────────────────────────
//
// A tiny 5x7 bitmap set covering the `DD MM 'YY` date format: digits,
// space, apostrophe. Each row is the low 5 bits, MSB leftmost.

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;

fn glyph(c: char) -> Option<[u8; 7]> {
    Some(match c {
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        '\'' => [0b00100, 0b00100, 0b01000, 0b00000, 0b00000, 0b00000, 0b00000],
        ' ' => [0; 7],
        _ => return None,
    })
}

fn text_width(text: &str, scale: u32) -> u32 {
    let chars = text.chars().count() as u32;
    if chars == 0 {
        return 0;
    }
    chars * (GLYPH_WIDTH + 1) * scale - scale
}

fn draw_text(buf: &mut RasterBuffer, x: u32, y: u32, text: &str, rgb: [u8; 3], scale: u32) {
    let mut cursor = x;
    for c in text.chars() {
        // Unknown characters render as blanks rather than failing a render.
        if let Some(rows) = glyph(c) {
            for (row, bits) in rows.iter().enumerate() {
                for col in 0..GLYPH_WIDTH {
                    if bits & (1 << (GLYPH_WIDTH - 1 - col)) != 0 {
                        fill_rect(
                            buf,
                            cursor + col * scale,
                            y + row as u32 * scale,
                            scale,
                            scale,
                            rgb,
                        );
                    }
                }
            }
        }
        cursor += (GLYPH_WIDTH + 1) * scale;
    }
}
