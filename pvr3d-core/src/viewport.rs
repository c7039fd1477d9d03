/// Mapping from normalized device coordinates to screen pixels
use crate::math::Vec3;

/// Screen dimensions together with the video line count
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub resolution: f32,
}

impl Viewport {
    pub fn new(width: u32, height: u32, resolution: u32) -> Self {
        Self {
            width: width as f32,
            height: height as f32,
            resolution: resolution as f32,
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    /// NDC (x, y, z in [-1, 1]) to pixels. Y points down the screen and the
    /// returned depth is 1 at the near plane and 0 at the far plane.
    pub fn to_screen(&self, ndc: Vec3) -> Vec3 {
        Vec3::new(
            (ndc.x + 1.0) * 0.5 * self.width,
            (1.0 - ndc.y) * 0.5 * self.height,
            (1.0 - ndc.z) * 0.5,
        )
    }

    /// The fixed model-space-to-screen formula from before the matrix stack
    /// existed.
    #[deprecated(note = "transform through the combined matrix and use `to_screen`")]
    pub fn fixed_map(&self, p: Vec3) -> Vec3 {
        let scale = self.resolution / 2.5;
        Vec3::new(
            scale * p.x + self.width / 2.0,
            scale * p.y + self.height / 2.0,
            p.z + 2.0,
        )
    }
}
