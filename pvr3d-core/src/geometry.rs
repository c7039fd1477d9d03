/// Geometry primitives for mesh rendering
use crate::color::Color;
use crate::math::{self, MathError, Vec3};

/// A vertex as submitted to the polygon renderer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub u: f32,
    pub v: f32,
    pub color: Color,
}

impl Vertex {
    pub fn new(x: f32, y: f32, z: f32, u: f32, v: f32) -> Self {
        Self {
            position: Vec3::new(x, y, z),
            u,
            v,
            color: Color::WHITE,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

/// A triangle face defined by three vertices
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face {
    pub vertices: [Vertex; 3],
}

impl Face {
    pub fn new(a: Vertex, b: Vertex, c: Vertex) -> Self {
        Self {
            vertices: [a, b, c],
        }
    }

    /// Face normal from the triangle's winding
    pub fn normal(&self) -> Result<Vec3, MathError> {
        let [a, b, c] = &self.vertices;
        math::unit_normal_from_plane(a.position, b.position, c.position)
    }
}

/// A triangle mesh
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub faces: Vec<Face>,
}

impl Mesh {
    pub fn new() -> Self {
        Self { faces: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            faces: Vec::with_capacity(capacity),
        }
    }

    pub fn add_face(&mut self, face: Face) {
        self.faces.push(face);
    }

    /// Bytes held by the face array
    pub fn byte_size(&self) -> usize {
        self.faces.len() * std::mem::size_of::<Face>()
    }

    /// Textured cube centred on the origin, two faces per side, wound
    /// counter-clockwise when seen from outside.
    pub fn cube(size: f32) -> Self {
        let h = size / 2.0;
        let mut mesh = Self::with_capacity(12);

        // (corner positions for one side, listed counter-clockwise from outside)
        let sides: [[[f32; 3]; 4]; 6] = [
            // Front
            [[-h, -h, h], [h, -h, h], [h, h, h], [-h, h, h]],
            // Back
            [[h, -h, -h], [-h, -h, -h], [-h, h, -h], [h, h, -h]],
            // Top
            [[-h, h, h], [h, h, h], [h, h, -h], [-h, h, -h]],
            // Bottom
            [[-h, -h, -h], [h, -h, -h], [h, -h, h], [-h, -h, h]],
            // Right
            [[h, -h, h], [h, -h, -h], [h, h, -h], [h, h, h]],
            // Left
            [[-h, -h, -h], [-h, -h, h], [-h, h, h], [-h, h, -h]],
        ];
        let uvs = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

        for corners in &sides {
            let v: Vec<Vertex> = corners
                .iter()
                .zip(uvs.iter())
                .map(|(p, uv)| Vertex::new(p[0], p[1], p[2], uv[0], uv[1]))
                .collect();
            mesh.add_face(Face::new(v[0], v[1], v[2]));
            mesh.add_face(Face::new(v[0], v[2], v[3]));
        }

        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_has_twelve_outward_faces() {
        let cube = Mesh::cube(2.0);
        assert_eq!(cube.faces.len(), 12);

        for face in &cube.faces {
            let normal = face.normal().unwrap();
            let centroid = face
                .vertices
                .iter()
                .fold(Vec3::zeros(), |acc, v| acc + v.position)
                / 3.0;
            assert!(normal.dot(&centroid) > 0.0, "face points inward: {:?}", face);
        }
    }

    #[test]
    fn test_degenerate_face_normal() {
        let v = Vertex::new(1.0, 1.0, 1.0, 0.0, 0.0);
        assert!(Face::new(v, v, v).normal().is_err());
    }

    #[test]
    fn test_byte_size_tracks_faces() {
        let cube = Mesh::cube(1.0);
        assert_eq!(cube.byte_size(), 12 * std::mem::size_of::<Face>());
    }
}
