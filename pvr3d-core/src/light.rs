/// Ambient and point lighting
use crate::color::Color;
use crate::math::{self, MathError, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
    Ambient,
    Point,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    /// Only meaningful for point lights
    pub position: Vec3,
    pub color: Color,
    pub intensity: f32,
}

impl Light {
    pub fn ambient(color: Color, intensity: f32) -> Self {
        Self {
            kind: LightKind::Ambient,
            position: Vec3::zeros(),
            color,
            intensity,
        }
    }

    pub fn point(position: Vec3, color: Color, intensity: f32) -> Self {
        Self {
            kind: LightKind::Point,
            position,
            color,
            intensity,
        }
    }
}

/// The current ambient light and the current point light
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    ambient: Light,
    point: Light,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            ambient: Light::ambient(Color::WHITE, 1.0),
            point: Light::point(Vec3::zeros(), Color::WHITE, 0.0),
        }
    }
}

impl Lighting {
    pub fn new(ambient: Light, point: Light) -> Self {
        Self { ambient, point }
    }

    pub fn set_ambient(&mut self, light: Light) {
        self.ambient = light;
    }

    pub fn set_point(&mut self, light: Light) {
        self.point = light;
    }

    pub fn ambient(&self) -> &Light {
        &self.ambient
    }

    pub fn point(&self) -> &Light {
        &self.point
    }

    /// Color of a vertex lit by the ambient and point light. `normal` must be
    /// non-zero. A vertex sitting exactly on the point light gets no point
    /// contribution.
    pub fn compute_vertex_color(&self, position: Vec3, normal: Vec3) -> Result<Color, MathError> {
        let normal = math::normalize(normal)?;

        let ambient = self.ambient.color.to_unit_rgb().map(|c| self.ambient.intensity * c);

        let directness = match math::normalize(math::sub(self.point.position, position)) {
            Ok(to_light) => math::dot(to_light, normal).max(0.0),
            Err(_) => 0.0,
        };
        let point = self
            .point
            .color
            .to_unit_rgb()
            .map(|c| directness * self.point.intensity * c);

        let channel = |i: usize| ((ambient[i] + point[i]).clamp(0.0, 1.0) * 255.0) as u8;
        Ok(Color::rgb(channel(0), channel(1), channel(2)))
    }
}
