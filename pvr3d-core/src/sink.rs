/// Polygon submission boundary
use crate::geometry::Vertex;
use crate::pixel::PixelFormat;
use crate::texture::TextureRef;

/// Per-triangle cost on the hardware display list: one polygon header plus
/// three vertices, 32 bytes each.
pub const POLY_HEADER_BYTES: usize = 32;
pub const VERTEX_BYTES: usize = 32;
pub const TRIANGLE_BYTES: usize = POLY_HEADER_BYTES + 3 * VERTEX_BYTES;

/// Receives screen-space triangles. Positions are in pixels with `z`
/// growing towards the viewer.
pub trait PolygonSink {
    fn begin_frame(&mut self) {}

    fn draw_triangle(&mut self, vertices: [Vertex; 3]);

    fn draw_textured_triangle(&mut self, vertices: [Vertex; 3], texture: TextureRef<'_>);

    fn end_frame(&mut self) {}
}

/// A submitted primitive, as recorded by [`DisplayList`]
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Triangle([Vertex; 3]),
    TexturedTriangle {
        vertices: [Vertex; 3],
        width: usize,
        height: usize,
        format: PixelFormat,
    },
}

impl Primitive {
    pub fn vertices(&self) -> &[Vertex; 3] {
        match self {
            Primitive::Triangle(vertices) => vertices,
            Primitive::TexturedTriangle { vertices, .. } => vertices,
        }
    }

    pub fn is_textured(&self) -> bool {
        matches!(self, Primitive::TexturedTriangle { .. })
    }
}

/// Sink that records everything submitted during the current frame
#[derive(Debug, Default)]
pub struct DisplayList {
    pub primitives: Vec<Primitive>,
    pub frames: usize,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PolygonSink for DisplayList {
    fn begin_frame(&mut self) {
        self.primitives.clear();
    }

    fn draw_triangle(&mut self, vertices: [Vertex; 3]) {
        self.primitives.push(Primitive::Triangle(vertices));
    }

    fn draw_textured_triangle(&mut self, vertices: [Vertex; 3], texture: TextureRef<'_>) {
        self.primitives.push(Primitive::TexturedTriangle {
            vertices,
            width: texture.width,
            height: texture.height,
            format: texture.format,
        });
    }

    fn end_frame(&mut self) {
        self.frames += 1;
    }
}
