/// Model manager: fixed-capacity table of triangle meshes
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};

use crate::error::{ResourceError, ResourceKind};
use crate::geometry::{Face, Mesh, Vertex};
use crate::light::Lighting;
use crate::math::{self, Vec3};
use crate::obj::{self, ObjError};
use crate::sink::PolygonSink;
use crate::slot::{Handle, SlotTable};
use crate::texture::{TextureHandle, TextureManager, TextureRef};
use crate::transform::{MatrixMode, TransformStack};
use crate::viewport::Viewport;

pub type ModelHandle = Handle<Model>;

#[derive(Debug)]
pub struct Model {
    mesh: Mesh,
    texture: Option<TextureHandle>,
    asset: Option<PathBuf>,
}

impl Model {
    pub fn faces(&self) -> &[Face] {
        &self.mesh.faces
    }

    /// `None` when the model is untextured
    pub fn texture(&self) -> Option<TextureHandle> {
        self.texture
    }

    pub fn is_textured(&self) -> bool {
        self.texture.is_some()
    }

    pub fn asset(&self) -> Option<&Path> {
        self.asset.as_deref()
    }

    pub fn byte_size(&self) -> usize {
        self.mesh.byte_size()
    }
}

/// Everything a model needs from the rest of the renderer to draw itself
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub transform: &'a TransformStack,
    pub textures: &'a TextureManager,
    pub viewport: Viewport,
    pub lighting: Option<&'a Lighting>,
}

pub struct ModelManager {
    slots: SlotTable<Model>,
    memory: usize,
}

impl ModelManager {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: SlotTable::new(capacity),
            memory: 0,
        }
    }

    pub fn initialize(&mut self) {
        self.slots.clear();
        self.memory = 0;

        info!("Initialized model manager.");
        debug!("Model limit: {}", self.slots.capacity());
    }

    fn check_capacity(&self) -> Result<(), ResourceError> {
        if self.slots.is_full() {
            return Err(ResourceError::CapacityExhausted {
                kind: ResourceKind::Model,
                limit: self.slots.capacity(),
            });
        }
        Ok(())
    }

    /// Load an OBJ mesh. `texture` is only kept when `textured` is set.
    pub fn load_obj(
        &mut self,
        asset: impl AsRef<Path>,
        texture: Option<TextureHandle>,
        textured: bool,
    ) -> Result<ModelHandle, ResourceError> {
        let asset = asset.as_ref();
        let result = self.check_capacity().and_then(|_| read_mesh(asset));
        let mesh = match result {
            Ok(mesh) => mesh,
            Err(e) => {
                error!("{}", e);
                return Err(e);
            }
        };

        debug!("Asset: {}", asset.display());
        self.store(mesh, texture.filter(|_| textured), Some(asset.to_path_buf()))
    }

    /// Store a mesh built in memory.
    pub fn insert(
        &mut self,
        mesh: Mesh,
        texture: Option<TextureHandle>,
        textured: bool,
    ) -> Result<ModelHandle, ResourceError> {
        self.store(mesh, texture.filter(|_| textured), None)
    }

    fn store(
        &mut self,
        mesh: Mesh,
        texture: Option<TextureHandle>,
        asset: Option<PathBuf>,
    ) -> Result<ModelHandle, ResourceError> {
        if let Err(e) = self.check_capacity() {
            error!("{}", e);
            return Err(e);
        }

        let face_count = mesh.faces.len();
        let model = Model {
            mesh,
            texture,
            asset,
        };
        let size = model.byte_size();
        let handle = self.slots.insert(model).map_err(|_| ResourceError::CapacityExhausted {
            kind: ResourceKind::Model,
            limit: self.slots.capacity(),
        })?;
        self.memory += size;

        info!("Loaded model (mid = {})", handle);
        debug!("Faces: {}", face_count);
        info!("Active models: {}", self.slots.len());
        debug!("Model memory used: {:.1} KiB", self.memory as f32 / 1024.0);

        Ok(handle)
    }

    pub fn free(&mut self, handle: ModelHandle) -> Result<(), ResourceError> {
        let Some(model) = self.slots.remove(handle) else {
            let e = ResourceError::invalid_handle(ResourceKind::Model, handle);
            error!("Received {} for freeing.", e);
            return Err(e);
        };

        self.memory -= model.byte_size();

        info!("Freed model (mid = {})", handle);
        info!("Active models: {}", self.slots.len());
        debug!("Model memory used: {:.1} KiB", self.memory as f32 / 1024.0);

        Ok(())
    }

    pub fn get(&self, handle: ModelHandle) -> Option<&Model> {
        self.slots.get(handle)
    }

    pub fn count(&self) -> usize {
        self.slots.len()
    }

    pub fn memory(&self) -> usize {
        self.memory
    }

    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    fn lookup(&self, handle: ModelHandle) -> Result<&Model, ResourceError> {
        self.slots.get(handle).ok_or_else(|| {
            let e = ResourceError::invalid_handle(ResourceKind::Model, handle);
            error!("Received {} for rendering.", e);
            e
        })
    }

    /// Draw a model through the combined transform. Returns the number of
    /// triangles submitted; faces with a vertex on or behind the eye plane
    /// (clip-space w <= 0) are skipped.
    pub fn render(
        &self,
        handle: ModelHandle,
        ctx: &RenderContext<'_>,
        sink: &mut dyn PolygonSink,
    ) -> Result<usize, ResourceError> {
        let model = self.lookup(handle)?;
        let texture = resolve_texture(model, ctx.textures);
        let model_view = ctx.transform.matrix(MatrixMode::ModelView);

        let mut submitted = 0;
        'faces: for face in model.faces() {
            let mut vertices = face.vertices;

            if let Some(lighting) = ctx.lighting {
                apply_lighting(&mut vertices, face, &model_view, lighting);
            }

            for vertex in &mut vertices {
                match ctx.transform.project_point(vertex.position) {
                    Ok(ndc) => vertex.position = ctx.viewport.to_screen(ndc),
                    Err(e) => {
                        warn!("Skipping face of model {}: {}", handle, e);
                        continue 'faces;
                    }
                }
            }

            match texture {
                Some(texture) => sink.draw_textured_triangle(vertices, texture),
                None => sink.draw_triangle(vertices),
            }
            submitted += 1;
        }

        Ok(submitted)
    }

    /// Draw a model with the fixed model-space-to-screen formula, ignoring
    /// the matrix stack. Untextured faces are submitted untouched.
    #[deprecated(note = "use `render`, which goes through the combined transform")]
    #[allow(deprecated)]
    pub fn render_fixed(
        &self,
        handle: ModelHandle,
        textures: &TextureManager,
        viewport: Viewport,
        sink: &mut dyn PolygonSink,
    ) -> Result<usize, ResourceError> {
        let model = self.lookup(handle)?;

        match resolve_texture(model, textures) {
            Some(texture) => {
                for face in model.faces() {
                    let mut vertices = face.vertices;
                    for vertex in &mut vertices {
                        vertex.position = viewport.fixed_map(vertex.position);
                    }
                    sink.draw_textured_triangle(vertices, texture);
                }
            }
            None => {
                for face in model.faces() {
                    sink.draw_triangle(face.vertices);
                }
            }
        }

        Ok(model.faces().len())
    }
}

fn read_mesh(asset: &Path) -> Result<Mesh, ResourceError> {
    let mut file = File::open(asset).map_err(|source| ResourceError::Open {
        path: asset.to_path_buf(),
        source,
    })?;

    let mut source = String::new();
    file.read_to_string(&mut source)
        .map_err(|source| ResourceError::Read {
            path: asset.to_path_buf(),
            source,
        })?;

    obj::parse_obj(&source).map_err(|e| match e {
        ObjError::Allocation { what, bytes } => ResourceError::Allocation { what, bytes },
        source => ResourceError::Parse {
            path: asset.to_path_buf(),
            source,
        },
    })
}

fn resolve_texture<'a>(model: &Model, textures: &'a TextureManager) -> Option<TextureRef<'a>> {
    let handle = model.texture?;
    match textures.get(handle) {
        Some(texture) => Some(texture.view()),
        None => {
            debug!("Texture {} is gone; drawing untextured", handle);
            None
        }
    }
}

/// Replace vertex colors with eye-space lighting. Degenerate faces keep
/// their colors.
fn apply_lighting(
    vertices: &mut [Vertex; 3],
    face: &Face,
    model_view: &math::Mat4,
    lighting: &Lighting,
) {
    let Ok(normal) = face.normal() else {
        return;
    };
    let normal = math::transform_direction(model_view, normal);

    for vertex in vertices.iter_mut() {
        let eye: Vec3 = match math::transform_point(model_view, vertex.position) {
            Ok(p) => p,
            Err(_) => continue,
        };
        if let Ok(color) = lighting.compute_vertex_color(eye, normal) {
            vertex.color = color;
        }
    }
}

#[cfg(test)]
#[allow(deprecated)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::light::Light;
    use crate::sink::{DisplayList, Primitive};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const TRIANGLE: &str = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 0 1\nf 1/1/1 2/2/1 3/3/1\n";

    fn asset(source: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(source.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn texture_asset(width: usize, height: usize) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&vec![0xFF; width * height * 2]).unwrap();
        file.flush().unwrap();
        file
    }

    fn cube_obj() -> String {
        let mut source = String::from("# cube\n");
        for &x in &[-1.0, 1.0] {
            for &y in &[-1.0, 1.0] {
                for &z in &[-1.0, 1.0] {
                    source.push_str(&format!("v {} {} {}\n", x, y, z));
                }
            }
        }
        for i in 0..8 {
            source.push_str(&format!("vt {} {}\n", i as f32 / 8.0, 1.0 - i as f32 / 8.0));
        }
        let quads = [
            [1, 2, 4, 3],
            [5, 7, 8, 6],
            [1, 5, 6, 2],
            [3, 4, 8, 7],
            [1, 3, 7, 5],
            [2, 6, 8, 4],
        ];
        for q in &quads {
            source.push_str(&format!("f {0}/{0}/1 {1}/{1}/1 {2}/{2}/1\n", q[0], q[1], q[2]));
            source.push_str(&format!("f {0}/{0}/1 {1}/{1}/1 {2}/{2}/1\n", q[0], q[2], q[3]));
        }
        source
    }

    fn context<'a>(transform: &'a TransformStack, textures: &'a TextureManager) -> RenderContext<'a> {
        RenderContext {
            transform,
            textures,
            viewport: Viewport::new(320, 240, 240),
            lighting: None,
        }
    }

    #[test]
    fn test_load_cube() {
        let file = asset(&cube_obj());
        let mut models = ModelManager::new(4);
        let mid = models.load_obj(file.path(), None, false).unwrap();

        let model = models.get(mid).unwrap();
        assert_eq!(model.faces().len(), 12);
        assert!(!model.is_textured());
        assert_eq!(model.asset(), Some(file.path()));
        for face in model.faces() {
            for vertex in &face.vertices {
                let p = vertex.position;
                assert!([p.x, p.y, p.z].iter().all(|c| c.abs() == 1.0));
            }
        }
        assert_eq!(models.count(), 1);
        assert_eq!(models.memory(), 12 * std::mem::size_of::<Face>());
    }

    #[test]
    fn test_texture_dropped_when_untextured() {
        let tex = texture_asset(2, 2);
        let mut textures = TextureManager::new(1);
        let tid = textures.load(tex.path(), 2, 2).unwrap();

        let file = asset(TRIANGLE);
        let mut models = ModelManager::new(4);
        let plain = models.load_obj(file.path(), Some(tid), false).unwrap();
        let textured = models.load_obj(file.path(), Some(tid), true).unwrap();

        assert_eq!(models.get(plain).unwrap().texture(), None);
        assert_eq!(models.get(textured).unwrap().texture(), Some(tid));
    }

    #[test]
    fn test_parse_error_leaves_no_state() {
        let file = asset("v 0 0 0\nvt 0 0\nf 1/1/1 1/1/1 4/1/1\n");
        let mut models = ModelManager::new(4);
        let result = models.load_obj(file.path(), None, false);
        assert!(matches!(
            result,
            Err(ResourceError::Parse {
                source: ObjError::IndexOutOfRange { .. },
                ..
            })
        ));
        assert_eq!(models.count(), 0);
        assert_eq!(models.memory(), 0);
    }

    #[test]
    fn test_missing_file() {
        let mut models = ModelManager::new(4);
        assert!(matches!(
            models.load_obj("/no/such/model.obj", None, false),
            Err(ResourceError::Open { .. })
        ));
    }

    #[test]
    fn test_capacity_and_free() {
        let mut models = ModelManager::new(2);
        let a = models.insert(Mesh::cube(1.0), None, false).unwrap();
        let b = models.insert(Mesh::cube(1.0), None, false).unwrap();
        assert!(matches!(
            models.insert(Mesh::cube(1.0), None, false),
            Err(ResourceError::CapacityExhausted { limit: 2, .. })
        ));

        let per_model = Mesh::cube(1.0).byte_size();
        models.free(a).unwrap();
        assert_eq!(models.count(), 1);
        assert_eq!(models.memory(), per_model);

        assert!(models.free(a).is_err());
        assert_eq!(models.count(), 1);
        assert_eq!(models.memory(), per_model);

        let c = models.insert(Mesh::cube(1.0), None, false).unwrap();
        assert_eq!(c.index(), a.index());
        assert!(models.get(a).is_none());
        assert!(models.get(b).is_some());
    }

    #[test]
    fn test_free_out_of_range_handle() {
        let mut large = ModelManager::new(8);
        let foreign = (0..5)
            .map(|_| large.insert(Mesh::cube(1.0), None, false).unwrap())
            .last()
            .unwrap();
        assert_eq!(foreign.index(), 4);

        let mut small = ModelManager::new(2);
        small.insert(Mesh::cube(1.0), None, false).unwrap();
        let memory = small.memory();

        assert!(matches!(
            small.free(foreign),
            Err(ResourceError::InvalidHandle { .. })
        ));
        assert_eq!(small.count(), 1);
        assert_eq!(small.memory(), memory);
    }

    #[test]
    fn test_render_through_combined_transform() {
        let file = asset(TRIANGLE);
        let mut models = ModelManager::new(1);
        let mid = models.load_obj(file.path(), None, false).unwrap();

        let mut transform = TransformStack::new(4);
        transform.scale(0.5, 0.5, 0.5);
        transform.recompute_combined();
        let textures = TextureManager::new(1);

        let mut list = DisplayList::new();
        let submitted = models
            .render(mid, &context(&transform, &textures), &mut list)
            .unwrap();

        assert_eq!(submitted, 1);
        let [a, b, c] = list.primitives[0].vertices();
        assert_eq!(a.position, Vec3::new(160.0, 120.0, 0.5));
        assert_eq!(b.position, Vec3::new(240.0, 120.0, 0.5));
        assert_eq!(c.position, Vec3::new(160.0, 60.0, 0.5));
        assert!(!list.primitives[0].is_textured());
    }

    #[test]
    fn test_render_uses_stale_combined_transform() {
        let file = asset(TRIANGLE);
        let mut models = ModelManager::new(1);
        let mid = models.load_obj(file.path(), None, false).unwrap();

        let mut transform = TransformStack::new(4);
        transform.translate(0.5, 0.0, 0.0);
        let textures = TextureManager::new(1);

        let mut list = DisplayList::new();
        models
            .render(mid, &context(&transform, &textures), &mut list)
            .unwrap();
        assert_eq!(list.primitives[0].vertices()[0].position.x, 160.0);
    }

    #[test]
    fn test_render_textured_model() {
        let tex = texture_asset(4, 2);
        let mut textures = TextureManager::new(1);
        let tid = textures.load(tex.path(), 4, 2).unwrap();

        let mut models = ModelManager::new(1);
        let mid = models.insert(Mesh::cube(1.0), Some(tid), true).unwrap();
        let mut transform = TransformStack::new(4);
        transform.recompute_combined();

        let mut list = DisplayList::new();
        let submitted = models
            .render(mid, &context(&transform, &textures), &mut list)
            .unwrap();
        assert_eq!(submitted, 12);
        assert!(list.primitives.iter().all(|p| matches!(
            p,
            Primitive::TexturedTriangle { width: 4, height: 2, .. }
        )));
    }

    fn perspective_at(z: f32) -> TransformStack {
        let mut transform = TransformStack::new(4);
        transform.select(MatrixMode::Projection);
        transform.perspective(1.0, 1.0, 0.1, 10.0);
        transform.select(MatrixMode::ModelView);
        transform.translate(0.0, 0.0, z);
        transform.recompute_combined();
        transform
    }

    #[test]
    fn test_render_skips_degenerate_w() {
        let mut models = ModelManager::new(1);
        let mid = models.insert(Mesh::cube(2.0), None, false).unwrap();
        let transform = perspective_at(-1.0);
        let textures = TextureManager::new(1);

        // The front side now sits on the eye plane (w = 0); only the two back
        // faces have no vertex there.
        let mut list = DisplayList::new();
        let submitted = models
            .render(mid, &context(&transform, &textures), &mut list)
            .unwrap();
        assert_eq!(submitted, 2);
        assert_eq!(list.primitives.len(), 2);
    }

    #[test]
    fn test_render_skips_faces_behind_eye() {
        let mut models = ModelManager::new(1);
        let mid = models.insert(Mesh::cube(2.0), None, false).unwrap();
        let transform = perspective_at(-0.5);
        let textures = TextureManager::new(1);

        // Front corners sit at z = 0.5, behind the eye; every face except the
        // two on the back side touches one of them.
        let mut list = DisplayList::new();
        let submitted = models
            .render(mid, &context(&transform, &textures), &mut list)
            .unwrap();
        assert_eq!(submitted, 2);
        for primitive in &list.primitives {
            for v in primitive.vertices() {
                assert!((0.0..=1.0).contains(&v.position.z), "depth {}", v.position.z);
            }
        }
    }

    #[test]
    fn test_render_invalid_handle() {
        let mut models = ModelManager::new(1);
        let mid = models.insert(Mesh::cube(1.0), None, false).unwrap();
        models.free(mid).unwrap();

        let transform = TransformStack::new(4);
        let textures = TextureManager::new(1);
        let mut list = DisplayList::new();
        assert!(matches!(
            models.render(mid, &context(&transform, &textures), &mut list),
            Err(ResourceError::InvalidHandle { .. })
        ));
        assert!(list.primitives.is_empty());
    }

    #[test]
    fn test_render_with_lighting() {
        let mut models = ModelManager::new(1);
        let mid = models.insert(Mesh::cube(2.0), None, false).unwrap();
        let mut transform = TransformStack::new(4);
        transform.recompute_combined();
        let textures = TextureManager::new(1);

        let lighting = Lighting::new(
            Light::ambient(Color::WHITE, 0.2),
            Light::point(Vec3::new(0.0, 0.0, 100.0), Color::WHITE, 0.0),
        );
        let ctx = RenderContext {
            lighting: Some(&lighting),
            ..context(&transform, &textures)
        };

        let mut list = DisplayList::new();
        models.render(mid, &ctx, &mut list).unwrap();
        for primitive in &list.primitives {
            for vertex in primitive.vertices() {
                assert_eq!(vertex.color, Color::rgb(51, 51, 51));
            }
        }
    }

    #[test]
    fn test_render_fixed_formula() {
        let tex = texture_asset(2, 2);
        let mut textures = TextureManager::new(1);
        let tid = textures.load(tex.path(), 2, 2).unwrap();

        let file = asset(TRIANGLE);
        let mut models = ModelManager::new(2);
        let textured = models.load_obj(file.path(), Some(tid), true).unwrap();
        let plain = models.load_obj(file.path(), None, false).unwrap();
        let viewport = Viewport::new(320, 240, 240);

        let mut list = DisplayList::new();
        models.render_fixed(textured, &textures, viewport, &mut list).unwrap();
        models.render_fixed(plain, &textures, viewport, &mut list).unwrap();

        let mapped = list.primitives[0].vertices();
        assert_eq!(mapped[1].position, Vec3::new(96.0 + 160.0, 120.0, 2.0));
        assert!(list.primitives[0].is_textured());

        let raw = list.primitives[1].vertices();
        assert_eq!(raw[1].position, Vec3::new(1.0, 0.0, 0.0));
        assert!(!list.primitives[1].is_textured());
    }
}
