/// Renderer context owning every piece of graphics state
use log::{error, info};

use crate::config::{Config, ConfigError};
use crate::error::{ResourceError, ResourceKind};
use crate::light::Lighting;
use crate::model::{ModelHandle, ModelManager, RenderContext};
use crate::sink::{PolygonSink, TRIANGLE_BYTES};
use crate::text;
use crate::texture::{TextureHandle, TextureManager};
use crate::transform::TransformStack;
use crate::viewport::Viewport;

/// Resource and per-frame submission statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VramInfo {
    pub texture_count: usize,
    pub texture_memory: usize,
    pub model_count: usize,
    pub model_memory: usize,
    /// Vertices submitted since the last `begin_frame`
    pub vertex_count: usize,
    /// Display-list bytes those vertices occupy
    pub vertex_memory: usize,
}

pub struct Renderer {
    config: Config,
    viewport: Viewport,
    pub transform: TransformStack,
    pub textures: TextureManager,
    pub models: ModelManager,
    pub lighting: Lighting,
    lighting_enabled: bool,
    triangles: usize,
}

impl Renderer {
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    fn with_config(config: Config) -> Self {
        Self {
            viewport: config.viewport(),
            transform: TransformStack::new(config.matrix_stack_size),
            textures: TextureManager::new(config.max_textures),
            models: ModelManager::new(config.max_models),
            lighting: Lighting::default(),
            lighting_enabled: false,
            triangles: 0,
            config,
        }
    }

    /// Reset every manager, both matrix stacks and the lighting state.
    pub fn initialize(&mut self) {
        self.textures.initialize();
        self.models.initialize();
        self.transform = TransformStack::new(self.config.matrix_stack_size);
        self.lighting = Lighting::default();
        self.lighting_enabled = false;
        self.triangles = 0;

        info!(
            "Initialized video at {}x{}.",
            self.config.screen_width(),
            self.config.screen_height()
        );
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn lighting_enabled(&self) -> bool {
        self.lighting_enabled
    }

    pub fn set_lighting_enabled(&mut self, enabled: bool) {
        self.lighting_enabled = enabled;
    }

    pub fn begin_frame(&mut self, sink: &mut dyn PolygonSink) {
        self.triangles = 0;
        sink.begin_frame();
    }

    pub fn end_frame(&mut self, sink: &mut dyn PolygonSink) {
        sink.end_frame();
    }

    /// Draw a model through the current combined transform.
    pub fn draw_model(
        &mut self,
        handle: ModelHandle,
        sink: &mut dyn PolygonSink,
    ) -> Result<usize, ResourceError> {
        let ctx = RenderContext {
            transform: &self.transform,
            textures: &self.textures,
            viewport: self.viewport,
            lighting: self.lighting_enabled.then_some(&self.lighting),
        };
        let submitted = self.models.render(handle, &ctx, sink)?;
        self.triangles += submitted;
        Ok(submitted)
    }

    /// Draw a string in screen space with a 16x16-glyph font texture.
    pub fn draw_text(
        &mut self,
        font: TextureHandle,
        size: f32,
        x: f32,
        y: f32,
        text: &str,
        sink: &mut dyn PolygonSink,
    ) -> Result<usize, ResourceError> {
        let Some(texture) = self.textures.get(font) else {
            let e = ResourceError::invalid_handle(ResourceKind::Texture, font);
            error!("Received {} for text.", e);
            return Err(e);
        };
        let submitted = text::draw_text(sink, texture.view(), size, x, y, text);
        self.triangles += submitted;
        Ok(submitted)
    }

    pub fn vram_info(&self) -> VramInfo {
        VramInfo {
            texture_count: self.textures.count(),
            texture_memory: self.textures.memory(),
            model_count: self.models.count(),
            model_memory: self.models.memory(),
            vertex_count: self.triangles * 3,
            vertex_memory: self.triangles * TRIANGLE_BYTES,
        }
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::with_config(Config::default())
    }
}
