/// Vector and 4x4 matrix math for the transform pipeline
///
/// Matrices are column-major: element `[col * 4 + row]` of `as_slice()`.
use nalgebra::{Matrix4, Vector3, Vector4};
use thiserror::Error;

pub type Vec3 = Vector3<f32>;
pub type Mat4 = Matrix4<f32>;

pub const PI: f32 = std::f32::consts::PI;
pub const PI_DIV_180: f32 = PI / 180.0;

/// Precondition violations that would otherwise divide by zero
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum MathError {
    #[error("cannot normalize a zero-length vector")]
    ZeroLength,
    #[error("homogeneous w resolved to zero during perspective divide")]
    DegenerateW,
    #[error("point lies behind the eye (w = {0})")]
    BehindEye(f32),
}

pub fn deg_to_rad(degrees: f32) -> f32 {
    degrees * PI_DIV_180
}

pub fn rad_to_deg(radians: f32) -> f32 {
    radians / PI_DIV_180
}

pub fn add(a: Vec3, b: Vec3) -> Vec3 {
    a + b
}

pub fn sub(a: Vec3, b: Vec3) -> Vec3 {
    a - b
}

pub fn scale(v: Vec3, factor: f32) -> Vec3 {
    v * factor
}

pub fn dot(a: Vec3, b: Vec3) -> f32 {
    a.dot(&b)
}

/// Right-handed cross product. Parallel inputs yield the zero vector.
pub fn cross(a: Vec3, b: Vec3) -> Vec3 {
    a.cross(&b)
}

pub fn length(v: Vec3) -> f32 {
    dot(v, v).sqrt()
}

pub fn distance(a: Vec3, b: Vec3) -> f32 {
    length(sub(a, b))
}

pub fn normalize(v: Vec3) -> Result<Vec3, MathError> {
    let len = length(v);
    if len == 0.0 {
        return Err(MathError::ZeroLength);
    }
    Ok(v / len)
}

/// Unit normal of the plane through `a`, `b`, `c` (counter-clockwise winding)
pub fn unit_normal_from_plane(a: Vec3, b: Vec3, c: Vec3) -> Result<Vec3, MathError> {
    normalize(cross(sub(b, a), sub(c, a)))
}

/// `a * b`: applied to a column vector, `b` acts first.
pub fn mat_mul(a: &Mat4, b: &Mat4) -> Mat4 {
    a * b
}

pub fn identity() -> Mat4 {
    Mat4::identity()
}

pub fn scaling(x: f32, y: f32, z: f32) -> Mat4 {
    Mat4::new_nonuniform_scaling(&Vec3::new(x, y, z))
}

pub fn translation(x: f32, y: f32, z: f32) -> Mat4 {
    Mat4::new_translation(&Vec3::new(x, y, z))
}

/// Rodrigues rotation of `angle` radians about the normalized axis `(x, y, z)`
pub fn rotation(angle: f32, x: f32, y: f32, z: f32) -> Result<Mat4, MathError> {
    let axis = normalize(Vec3::new(x, y, z))?;
    let (x, y, z) = (axis.x, axis.y, axis.z);

    let c = angle.cos();
    let s = angle.sin();
    let t = 1.0 - c;

    #[rustfmt::skip]
    let r = Mat4::new(
        t * x * x + c,     t * x * y - s * z, t * x * z + s * y, 0.0,
        t * x * y + s * z, t * y * y + c,     t * y * z - s * x, 0.0,
        t * x * z - s * y, t * y * z + s * x, t * z * z + c,     0.0,
        0.0,               0.0,               0.0,               1.0,
    );
    Ok(r)
}

/// OpenGL-style orthographic projection
pub fn ortho(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    let mut e = [0.0f32; 16];
    e[0] = 2.0 / (right - left);
    e[5] = 2.0 / (top - bottom);
    e[10] = -2.0 / (far - near);
    e[12] = -(right + left) / (right - left);
    e[13] = -(top + bottom) / (top - bottom);
    e[14] = -(far + near) / (far - near);
    e[15] = 1.0;
    Mat4::from_column_slice(&e)
}

/// OpenGL-style perspective frustum
pub fn frustum(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    let mut e = [0.0f32; 16];
    e[0] = (2.0 * near) / (right - left);
    e[5] = (2.0 * near) / (top - bottom);
    e[8] = (right + left) / (right - left);
    e[9] = (top + bottom) / (top - bottom);
    e[10] = -(far + near) / (far - near);
    e[11] = -1.0;
    e[14] = -(2.0 * far * near) / (far - near);
    Mat4::from_column_slice(&e)
}

/// Frustum from a vertical field of view (radians) and aspect ratio
pub fn perspective(fovy: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    let y = near * (fovy / 2.0).tan();
    let x = y * aspect;
    frustum(-x, x, -y, y, near, far)
}

/// Apply `m` to the point `v` (w = 1) and perform the perspective divide.
pub fn transform_point(m: &Mat4, v: Vec3) -> Result<Vec3, MathError> {
    let h = m * Vector4::new(v.x, v.y, v.z, 1.0);
    if h.w == 0.0 {
        return Err(MathError::DegenerateW);
    }
    Ok(Vec3::new(h.x / h.w, h.y / h.w, h.z / h.w))
}

/// Like [`transform_point`], but also rejects points with negative clip-space
/// w, which would come out of the divide mirrored through the eye.
pub fn project_point(m: &Mat4, v: Vec3) -> Result<Vec3, MathError> {
    let h = m * Vector4::new(v.x, v.y, v.z, 1.0);
    if h.w == 0.0 {
        return Err(MathError::DegenerateW);
    }
    if h.w < 0.0 {
        return Err(MathError::BehindEye(h.w));
    }
    Ok(Vec3::new(h.x / h.w, h.y / h.w, h.z / h.w))
}

/// Apply only the upper 3x3 of `m` to a direction.
pub fn transform_direction(m: &Mat4, v: Vec3) -> Vec3 {
    m.fixed_view::<3, 3>(0, 0) * v
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn approx_mat(a: &Mat4, b: &Mat4) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < EPS)
    }

    fn approx_vec(a: Vec3, b: Vec3) -> bool {
        (a - b).norm() < EPS
    }

    fn sample_matrix() -> Mat4 {
        Mat4::from_column_slice(&[
            1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0,
        ])
    }

    #[test]
    fn test_identity_layout() {
        let m = identity();
        let e = m.as_slice();
        for (i, value) in e.iter().enumerate() {
            let expected = if i % 5 == 0 { 1.0 } else { 0.0 };
            assert_eq!(*value, expected, "element {}", i);
        }
    }

    #[test]
    fn test_identity_is_neutral() {
        let m = sample_matrix();
        assert!(approx_mat(&mat_mul(&m, &identity()), &m));
        assert!(approx_mat(&mat_mul(&identity(), &m), &m));
    }

    #[test]
    fn test_mat_mul_applies_right_operand_first() {
        let t = translation(1.0, 0.0, 0.0);
        let s = scaling(2.0, 2.0, 2.0);
        let p = transform_point(&mat_mul(&t, &s), Vec3::new(1.0, 1.0, 1.0)).unwrap();
        assert!(approx_vec(p, Vec3::new(3.0, 2.0, 2.0)));
    }

    #[test]
    fn test_translation_layout() {
        let e = translation(4.0, 5.0, 6.0);
        assert_eq!(&e.as_slice()[12..15], &[4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_normalize_has_unit_length() {
        for v in [
            Vec3::new(3.0, 4.0, 0.0),
            Vec3::new(-1.0, 0.5, 12.0),
            Vec3::new(1e-3, 0.0, 0.0),
        ] {
            let n = normalize(v).unwrap();
            assert!((length(n) - 1.0).abs() < EPS);
        }
    }

    #[test]
    fn test_normalize_zero_is_error() {
        assert_eq!(normalize(Vec3::zeros()), Err(MathError::ZeroLength));
    }

    #[test]
    fn test_cross_product() {
        let x = Vec3::new(1.0, 0.0, 0.0);
        let y = Vec3::new(0.0, 1.0, 0.0);
        assert!(approx_vec(cross(x, y), Vec3::new(0.0, 0.0, 1.0)));
        assert!(approx_vec(cross(y, x), Vec3::new(0.0, 0.0, -1.0)));
        assert!(approx_vec(cross(x, x * 3.0), Vec3::zeros()));
    }

    #[test]
    fn test_rotation_about_z() {
        let r = rotation(PI / 2.0, 0.0, 0.0, 5.0).unwrap();
        let p = transform_point(&r, Vec3::new(1.0, 0.0, 0.0)).unwrap();
        assert!(approx_vec(p, Vec3::new(0.0, 1.0, 0.0)));
    }

    #[test]
    fn test_rotation_zero_axis_is_error() {
        assert!(rotation(1.0, 0.0, 0.0, 0.0).is_err());
    }

    #[test]
    fn test_ortho_maps_box_to_ndc() {
        let o = ortho(0.0, 320.0, 0.0, 240.0, -1.0, 1.0);
        let p = transform_point(&o, Vec3::new(320.0, 240.0, 0.0)).unwrap();
        assert!(approx_vec(p, Vec3::new(1.0, 1.0, 0.0)));
    }

    #[test]
    fn test_perspective_near_and_far_planes() {
        let p = perspective(deg_to_rad(90.0), 1.0, 1.0, 10.0);
        let near = transform_point(&p, Vec3::new(0.0, 0.0, -1.0)).unwrap();
        let far = transform_point(&p, Vec3::new(0.0, 0.0, -10.0)).unwrap();
        assert!((near.z + 1.0).abs() < EPS);
        assert!((far.z - 1.0).abs() < EPS);

        let edge = transform_point(&p, Vec3::new(1.0, 0.0, -1.0)).unwrap();
        assert!((edge.x - 1.0).abs() < EPS);
    }

    #[test]
    fn test_project_point_rejects_behind_eye() {
        let p = perspective(1.0, 1.0, 0.1, 10.0);
        assert!(project_point(&p, Vec3::new(0.0, 0.0, -2.0)).is_ok());
        assert_eq!(
            project_point(&p, Vec3::new(0.0, 0.0, 0.0)),
            Err(MathError::DegenerateW)
        );
        assert!(matches!(
            project_point(&p, Vec3::new(0.0, 0.0, 1.5)),
            Err(MathError::BehindEye(w)) if w < 0.0
        ));
        // plain transform_point still divides
        assert!(transform_point(&p, Vec3::new(0.0, 0.0, 1.5)).is_ok());
    }

    #[test]
    fn test_transform_point_degenerate_w() {
        let p = perspective(1.0, 1.0, 1.0, 10.0);
        assert_eq!(
            transform_point(&p, Vec3::new(1.0, 1.0, 0.0)),
            Err(MathError::DegenerateW)
        );
    }

    #[test]
    fn test_unit_normal_from_plane() {
        let n = unit_normal_from_plane(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
        )
        .unwrap();
        assert!(approx_vec(n, Vec3::new(0.0, 0.0, 1.0)));
    }
}
