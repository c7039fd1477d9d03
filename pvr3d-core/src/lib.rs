/// PVR3D Core Library - immediate-mode 3D rendering state
///
/// This library provides vector/matrix math, the model-view/projection
/// matrix stacks, texture and model managers with generational handles,
/// OBJ mesh parsing, per-vertex lighting and the polygon submission
/// boundary that a display back end implements.

pub mod color;
pub mod config;
pub mod error;
pub mod geometry;
pub mod input;
pub mod light;
pub mod math;
pub mod model;
pub mod obj;
pub mod pixel;
pub mod renderer;
pub mod sink;
pub mod slot;
pub mod text;
pub mod texture;
pub mod transform;
pub mod viewport;

// Re-export commonly used types
pub use color::Color;
pub use config::{Config, ConfigError};
pub use error::{ResourceError, ResourceKind};
pub use geometry::{Face, Mesh, Vertex};
pub use input::{Buttons, ControllerState, InputSource};
pub use light::{Light, LightKind, Lighting};
pub use math::{Mat4, MathError, Vec3};
pub use model::{Model, ModelHandle, ModelManager, RenderContext};
pub use pixel::PixelFormat;
pub use renderer::{Renderer, VramInfo};
pub use sink::{DisplayList, PolygonSink, Primitive};
pub use slot::{Handle, SlotTable};
pub use texture::{Texture, TextureHandle, TextureManager, TextureRef};
pub use transform::{MatrixMode, StackError, TransformStack};
pub use viewport::Viewport;
