/// Bitmap-font text drawn as textured quads
use crate::color::Color;
use crate::geometry::Vertex;
use crate::sink::PolygonSink;
use crate::texture::TextureRef;

/// Glyphs per row and per column of the font texture
pub const GLYPH_GRID: u32 = 16;

/// Screen depth of text; in front of any projected geometry
pub const TEXT_DEPTH: f32 = 10000.0;

const CORNER_COLORS: [Color; 4] = [
    Color::from_argb(0xFFFF0000),
    Color::from_argb(0xFF00FF00),
    Color::from_argb(0xFF0000FF),
    Color::from_argb(0xFFFFFF00),
];

/// Draw `text` one byte per glyph, starting with the top-left corner at
/// (`x`, `y`) and advancing `size` pixels per glyph. Returns the number of
/// triangles submitted.
pub fn draw_text(
    sink: &mut dyn PolygonSink,
    font: TextureRef<'_>,
    size: f32,
    x: f32,
    y: f32,
    text: &str,
) -> usize {
    let step = 1.0 / GLYPH_GRID as f32;
    let [red, green, blue, yellow] = CORNER_COLORS;

    let mut x = x;
    for byte in text.bytes() {
        let u = (byte as u32 % GLYPH_GRID) as f32 * step;
        let v = (byte as u32 / GLYPH_GRID) as f32 * step;

        let top_left = Vertex::new(x, y, TEXT_DEPTH, u, v).with_color(red);
        let bottom_right =
            Vertex::new(x + size, y + size, TEXT_DEPTH, u + step, v + step).with_color(green);
        let bottom_left = Vertex::new(x, y + size, TEXT_DEPTH, u, v + step).with_color(blue);
        let top_right = Vertex::new(x + size, y, TEXT_DEPTH, u + step, v).with_color(yellow);

        sink.draw_textured_triangle([top_left, bottom_right, bottom_left], font);
        sink.draw_textured_triangle([top_left, top_right, bottom_right], font);

        x += size;
    }

    text.len() * 2
}
