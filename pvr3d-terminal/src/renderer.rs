/// ASCII rasterizer acting as the polygon sink for terminal output
use crossterm::{
    cursor,
    style::{self, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use pvr3d_core::{Color, PolygonSink, TextureRef, Vertex, Viewport};
use std::io::Write;

/// Character luminosity ramp for shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// One terminal cell of the frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub character: char,
    pub color: Color,
}

impl Cell {
    const EMPTY: Cell = Cell {
        character: ' ',
        color: Color::BLACK,
    };
}

/// Rasterizes screen-space triangles into a grid of terminal cells.
///
/// Incoming positions are in the virtual screen's pixels (e.g. 320x240) and
/// are scaled onto however many cells the terminal has. Larger `z` is nearer.
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    screen_width: f32,
    screen_height: f32,
    depth_buffer: Vec<f32>,
    cells: Vec<Cell>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize, viewport: Viewport) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            screen_width: viewport.width,
            screen_height: viewport.height,
            depth_buffer: vec![f32::NEG_INFINITY; size],
            cells: vec![Cell::EMPTY; size],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.depth_buffer = vec![f32::NEG_INFINITY; width * height];
        self.cells = vec![Cell::EMPTY; width * height];
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::NEG_INFINITY);
        self.cells.fill(Cell::EMPTY);
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<Cell> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.cells[y * self.width + x])
    }

    /// Number of cells covered by geometry this frame
    pub fn coverage(&self) -> usize {
        self.depth_buffer.iter().filter(|d| d.is_finite()).count()
    }

    fn to_cell(&self, vertex: &Vertex) -> (f32, f32, f32) {
        (
            vertex.position.x * self.width as f32 / self.screen_width,
            vertex.position.y * self.height as f32 / self.screen_height,
            vertex.position.z,
        )
    }

    fn rasterize(&mut self, vertices: &[Vertex; 3], texture: Option<TextureRef<'_>>) {
        let [v0, v1, v2] = vertices.map(|v| self.to_cell(&v));

        // Bounding box
        let min_x = v0.0.min(v1.0).min(v2.0).floor() as i32;
        let max_x = v0.0.max(v1.0).max(v2.0).ceil() as i32;
        let min_y = v0.1.min(v1.1).min(v2.1).floor() as i32;
        let max_y = v0.1.max(v1.1).max(v2.1).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                let Some((w0, w1, w2)) =
                    barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), (px, py))
                else {
                    continue;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let idx = y as usize * self.width + x as usize;
                let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                if depth <= self.depth_buffer[idx] {
                    continue;
                }

                let weights = [w0, w1, w2];
                let mut color = blend(vertices, weights);
                if let Some(texture) = texture {
                    let u: f32 = weights.iter().zip(vertices).map(|(w, v)| w * v.u).sum();
                    let v: f32 = weights.iter().zip(vertices).map(|(w, v)| w * v.v).sum();
                    let texel = texture.sample(u, v);
                    if texel.a == 0 {
                        continue;
                    }
                    color = texel.modulate(color);
                }

                self.depth_buffer[idx] = depth;
                self.cells[idx] = Cell {
                    character: shade(color),
                    color,
                };
            }
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let mut current = None;
        for y in 0..self.height {
            writer.queue(cursor::MoveTo(0, y as u16))?;
            for x in 0..self.width {
                let cell = self.cells[y * self.width + x];
                if current != Some(cell.color) {
                    let Color { r, g, b, .. } = cell.color;
                    writer.queue(SetForegroundColor(style::Color::Rgb { r, g, b }))?;
                    current = Some(cell.color);
                }
                writer.queue(Print(cell.character))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

impl PolygonSink for AsciiRenderer {
    fn begin_frame(&mut self) {
        self.clear();
    }

    fn draw_triangle(&mut self, vertices: [Vertex; 3]) {
        self.rasterize(&vertices, None);
    }

    fn draw_textured_triangle(&mut self, vertices: [Vertex; 3], texture: TextureRef<'_>) {
        self.rasterize(&vertices, Some(texture));
    }
}

/// Interpolate vertex colors
fn blend(vertices: &[Vertex; 3], weights: [f32; 3]) -> Color {
    let channel = |get: fn(&Color) -> u8| {
        let value: f32 = vertices
            .iter()
            .zip(weights)
            .map(|(v, w)| w * get(&v.color) as f32)
            .sum();
        value.round().clamp(0.0, 255.0) as u8
    };
    Color::new(channel(|c| c.r), channel(|c| c.g), channel(|c| c.b), 255)
}

/// Map brightness to a ramp character; anything drawn is at least a dot
fn shade(color: Color) -> char {
    let last = LUMINOSITY_RAMP.len() - 1;
    let index = (color.luminance() * last as f32).round() as usize;
    LUMINOSITY_RAMP[index.clamp(1, last)]
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}
