/// Texture manager: fixed-capacity table of 16-bit textures loaded from raw files
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use log::{debug, error, info};

use crate::color::Color;
use crate::error::{ResourceError, ResourceKind};
use crate::pixel::{self, PixelFormat, BYTES_PER_TEXEL};
use crate::slot::{Handle, SlotTable};

pub type TextureHandle = Handle<Texture>;

/// A loaded texture. Texel memory is owned by the texture manager.
#[derive(Debug)]
pub struct Texture {
    asset: PathBuf,
    texels: Vec<u8>,
    width: usize,
    height: usize,
    format: PixelFormat,
}

impl Texture {
    pub fn asset(&self) -> &Path {
        &self.asset
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn size(&self) -> usize {
        self.texels.len()
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn view(&self) -> TextureRef<'_> {
        TextureRef {
            width: self.width,
            height: self.height,
            format: self.format,
            texels: &self.texels,
        }
    }
}

/// Borrowed texture as handed to the polygon sink
#[derive(Debug, Clone, Copy)]
pub struct TextureRef<'a> {
    pub width: usize,
    pub height: usize,
    pub format: PixelFormat,
    pub texels: &'a [u8],
}

impl TextureRef<'_> {
    pub fn texel(&self, x: usize, y: usize) -> Color {
        let offset = (y * self.width + x) * BYTES_PER_TEXEL;
        match self.texels.get(offset..offset + BYTES_PER_TEXEL) {
            Some(bytes) => pixel::decode(u16::from_le_bytes([bytes[0], bytes[1]]), self.format),
            None => Color::BLACK,
        }
    }

    /// Nearest-neighbour lookup with wrapping texture coordinates
    pub fn sample(&self, u: f32, v: f32) -> Color {
        if self.width == 0 || self.height == 0 {
            return Color::BLACK;
        }
        let x = (u.rem_euclid(1.0) * self.width as f32) as usize;
        let y = (v.rem_euclid(1.0) * self.height as f32) as usize;
        self.texel(x.min(self.width - 1), y.min(self.height - 1))
    }
}

pub struct TextureManager {
    slots: SlotTable<Texture>,
    memory: usize,
}

impl TextureManager {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: SlotTable::new(capacity),
            memory: 0,
        }
    }

    /// Drop every texture and reset the counters.
    pub fn initialize(&mut self) {
        self.slots.clear();
        self.memory = 0;

        info!("Initialized texture manager.");
        debug!("Texture limit: {}", self.slots.capacity());
    }

    /// Load an RGB565 texture
    pub fn load(
        &mut self,
        asset: impl AsRef<Path>,
        width: usize,
        height: usize,
    ) -> Result<TextureHandle, ResourceError> {
        self.load_with_format(asset, width, height, PixelFormat::Rgb565)
    }

    pub fn load_with_format(
        &mut self,
        asset: impl AsRef<Path>,
        width: usize,
        height: usize,
        format: PixelFormat,
    ) -> Result<TextureHandle, ResourceError> {
        let asset = asset.as_ref();
        let result = self.try_load(asset, width, height, format);
        if let Err(e) = &result {
            error!("{}", e);
        }
        result
    }

    fn try_load(
        &mut self,
        asset: &Path,
        width: usize,
        height: usize,
        format: PixelFormat,
    ) -> Result<TextureHandle, ResourceError> {
        if self.slots.is_full() {
            return Err(ResourceError::CapacityExhausted {
                kind: ResourceKind::Texture,
                limit: self.slots.capacity(),
            });
        }

        let size = width
            .checked_mul(height)
            .and_then(|texels| texels.checked_mul(BYTES_PER_TEXEL))
            .filter(|&size| size > 0)
            .ok_or(ResourceError::InvalidDimensions { width, height })?;

        let file = File::open(asset).map_err(|source| ResourceError::Open {
            path: asset.to_path_buf(),
            source,
        })?;

        let actual = file
            .metadata()
            .map_err(|source| ResourceError::Read {
                path: asset.to_path_buf(),
                source,
            })?
            .len();
        if actual != size as u64 {
            return Err(ResourceError::SizeMismatch {
                path: asset.to_path_buf(),
                expected: size as u64,
                actual,
            });
        }

        let mut texels = Vec::new();
        texels
            .try_reserve_exact(size)
            .map_err(|_| ResourceError::Allocation {
                what: "texture",
                bytes: size,
            })?;

        file.take(size as u64)
            .read_to_end(&mut texels)
            .map_err(|source| ResourceError::Read {
                path: asset.to_path_buf(),
                source,
            })?;
        if texels.len() != size {
            return Err(ResourceError::SizeMismatch {
                path: asset.to_path_buf(),
                expected: size as u64,
                actual: texels.len() as u64,
            });
        }

        let texture = Texture {
            asset: asset.to_path_buf(),
            texels,
            width,
            height,
            format,
        };
        let handle = self.slots.insert(texture).map_err(|_| ResourceError::CapacityExhausted {
            kind: ResourceKind::Texture,
            limit: self.slots.capacity(),
        })?;
        self.memory += size;

        info!("Loaded texture (tid = {})", handle);
        debug!("Asset: {}", asset.display());
        debug!("Size:  {}x{} {}", width, height, format);
        info!("Active textures: {}", self.slots.len());
        debug!("Texture memory used: {:.1} KiB", self.memory as f32 / 1024.0);

        Ok(handle)
    }

    pub fn free(&mut self, handle: TextureHandle) -> Result<(), ResourceError> {
        let Some(texture) = self.slots.remove(handle) else {
            let e = ResourceError::invalid_handle(ResourceKind::Texture, handle);
            error!("Received {} for freeing.", e);
            return Err(e);
        };

        self.memory -= texture.size();

        info!("Freed texture (tid = {})", handle);
        info!("Active textures: {}", self.slots.len());
        debug!("Texture memory used: {:.1} KiB", self.memory as f32 / 1024.0);

        Ok(())
    }

    pub fn get(&self, handle: TextureHandle) -> Option<&Texture> {
        self.slots.get(handle)
    }

    pub fn count(&self) -> usize {
        self.slots.len()
    }

    /// Bytes of texel memory held by live textures
    pub fn memory(&self) -> usize {
        self.memory
    }

    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }
}
