/// Model-view and projection matrix stacks
use log::error;
use thiserror::Error;

use crate::math::{self, Mat4, MathError, Vec3};

/// Which matrix stack subsequent operations target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatrixMode {
    #[default]
    ModelView,
    Projection,
}

impl std::fmt::Display for MatrixMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatrixMode::ModelView => f.write_str("modelview"),
            MatrixMode::Projection => f.write_str("projection"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StackError {
    #[error("cannot push to full {mode} matrix stack (capacity {capacity})")]
    Overflow { mode: MatrixMode, capacity: usize },
    #[error("cannot pop from empty {mode} matrix stack")]
    Underflow { mode: MatrixMode },
}

#[derive(Debug, Clone)]
struct MatrixStack {
    current: Mat4,
    saved: Vec<Mat4>,
}

impl MatrixStack {
    fn new(capacity: usize) -> Self {
        Self {
            current: Mat4::identity(),
            saved: Vec::with_capacity(capacity),
        }
    }
}

/// Dual matrix stack with an explicitly recomputed combined transform.
///
/// `combined()` only changes on [`TransformStack::recompute_combined`]; any
/// mutation made after the last recompute does not affect submitted geometry.
#[derive(Debug, Clone)]
pub struct TransformStack {
    model_view: MatrixStack,
    projection: MatrixStack,
    active: MatrixMode,
    capacity: usize,
    combined: Mat4,
}

impl TransformStack {
    pub fn new(capacity: usize) -> Self {
        Self {
            model_view: MatrixStack::new(capacity),
            projection: MatrixStack::new(capacity),
            active: MatrixMode::ModelView,
            capacity,
            combined: Mat4::identity(),
        }
    }

    pub fn select(&mut self, mode: MatrixMode) {
        self.active = mode;
    }

    pub fn active(&self) -> MatrixMode {
        self.active
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn stack(&self, mode: MatrixMode) -> &MatrixStack {
        match mode {
            MatrixMode::ModelView => &self.model_view,
            MatrixMode::Projection => &self.projection,
        }
    }

    fn active_stack(&mut self) -> &mut MatrixStack {
        match self.active {
            MatrixMode::ModelView => &mut self.model_view,
            MatrixMode::Projection => &mut self.projection,
        }
    }

    /// Current matrix of the given stack
    pub fn matrix(&self, mode: MatrixMode) -> Mat4 {
        self.stack(mode).current
    }

    pub fn depth(&self, mode: MatrixMode) -> usize {
        self.stack(mode).saved.len()
    }

    /// Projection x model-view as of the last recompute
    pub fn combined(&self) -> Mat4 {
        self.combined
    }

    pub fn recompute_combined(&mut self) {
        self.combined = math::mat_mul(&self.projection.current, &self.model_view.current);
    }

    /// Apply the combined transform to a point, with perspective divide.
    pub fn transform_point(&self, v: Vec3) -> Result<Vec3, MathError> {
        math::transform_point(&self.combined, v)
    }

    /// Apply the combined transform, rejecting points behind the eye.
    pub fn project_point(&self, v: Vec3) -> Result<Vec3, MathError> {
        math::project_point(&self.combined, v)
    }

    pub fn push(&mut self) -> Result<(), StackError> {
        let (mode, capacity) = (self.active, self.capacity);
        let stack = self.active_stack();
        if stack.saved.len() >= capacity {
            let e = StackError::Overflow { mode, capacity };
            error!("{}", e);
            return Err(e);
        }
        let current = stack.current;
        stack.saved.push(current);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<(), StackError> {
        let mode = self.active;
        let stack = self.active_stack();
        let Some(top) = stack.saved.pop() else {
            let e = StackError::Underflow { mode };
            error!("{}", e);
            return Err(e);
        };
        stack.current = top;
        Ok(())
    }

    fn multiply(&mut self, m: &Mat4) {
        let stack = self.active_stack();
        stack.current = math::mat_mul(&stack.current, m);
    }

    pub fn load_identity(&mut self) {
        self.active_stack().current = math::identity();
    }

    pub fn scale(&mut self, x: f32, y: f32, z: f32) {
        self.multiply(&math::scaling(x, y, z));
    }

    /// Adds directly to the translation column instead of multiplying, so
    /// the offset is not affected by any rotation or scale already applied.
    pub fn translate(&mut self, x: f32, y: f32, z: f32) {
        let current = &mut self.active_stack().current;
        current[12] += x;
        current[13] += y;
        current[14] += z;
    }

    pub fn rotate(&mut self, angle: f32, x: f32, y: f32, z: f32) -> Result<(), MathError> {
        let r = math::rotation(angle, x, y, z)?;
        self.multiply(&r);
        Ok(())
    }

    pub fn ortho(&mut self, left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) {
        self.multiply(&math::ortho(left, right, bottom, top, near, far));
    }

    pub fn frustum(&mut self, left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) {
        self.multiply(&math::frustum(left, right, bottom, top, near, far));
    }

    pub fn perspective(&mut self, fovy: f32, aspect: f32, near: f32, far: f32) {
        self.multiply(&math::perspective(fovy, aspect, near, far));
    }
}

impl Default for TransformStack {
    fn default() -> Self {
        Self::new(32)
    }
}
