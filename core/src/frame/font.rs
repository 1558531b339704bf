//! Built-in 5x7 bitmap font for frame overlays
//!
//! Covers the characters the tick overlay needs. Unknown characters render
//! as blanks but still advance the pen.

/// Glyph width in font pixels
pub const GLYPH_WIDTH: usize = 5;
/// Glyph height in font pixels
pub const GLYPH_HEIGHT: usize = 7;
/// Horizontal advance per character, including one column of spacing
pub const GLYPH_ADVANCE: usize = GLYPH_WIDTH + 1;

/// Row bitmaps, top row first. Bit 4 is the leftmost column.
fn glyph(c: char) -> [u8; GLYPH_HEIGHT] {
    match c {
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        't' => [0x08, 0x08, 0x1C, 0x08, 0x08, 0x09, 0x06],
        'i' => [0x04, 0x00, 0x0C, 0x04, 0x04, 0x04, 0x0E],
        'c' => [0x00, 0x00, 0x0E, 0x10, 0x10, 0x11, 0x0E],
        'k' => [0x10, 0x10, 0x12, 0x14, 0x18, 0x14, 0x12],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        _ => [0; GLYPH_HEIGHT],
    }
}

/// Target for text rendering: a packed 3-byte-per-pixel, top-down frame.
pub struct Canvas<'a> {
    pub pixels: &'a mut [u8],
    pub width: usize,
    pub height: usize,
}

impl Canvas<'_> {
    fn put(&mut self, x: i64, y: i64, color: [u8; 3]) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let offset = (y as usize * self.width + x as usize) * 3;
        self.pixels[offset..offset + 3].copy_from_slice(&color);
    }

    /// Draw `text` with its top-left corner at (`x`, `y`).
    ///
    /// Each font pixel becomes a `scale`x`scale` block. Pixels outside the
    /// canvas are clipped.
    pub fn draw_text(&mut self, x: i64, y: i64, text: &str, scale: usize, color: [u8; 3]) {
        let scale = scale.max(1);
        let mut pen_x = x;
        for c in text.chars() {
            let rows = glyph(c);
            for (row, bits) in rows.iter().enumerate() {
                for col in 0..GLYPH_WIDTH {
                    if bits & (0x10 >> col) == 0 {
                        continue;
                    }
                    let px = pen_x + (col * scale) as i64;
                    let py = y + (row * scale) as i64;
                    for sy in 0..scale as i64 {
                        for sx in 0..scale as i64 {
                            self.put(px + sx, py + sy, color);
                        }
                    }
                }
            }
            pen_x += (GLYPH_ADVANCE * scale) as i64;
        }
    }
}
