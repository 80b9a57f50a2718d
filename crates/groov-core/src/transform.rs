//! Matrix helpers shared by the renderer: render-matrix conversion, the
//! zoom-driven frustum, normal matrices and the fixed camera.
//!
//! All functions are pure.

use glam::{EulerRot, Mat3, Mat4, Vec3};

use crate::constants::{eye_vec3, BEAT_ROTATION_Z, FAR_PLANE, MIN_PROJECTION_SCALE};
use crate::error::DegenerateTransform;

/// Flat 16-float matrix as uploaded to the GPU.
///
/// Linear index `i * 4 + j` holds column `i`, row `j`.
pub type RenderMatrix4 = [f32; 16];

/// Flat 9-float normal matrix; index `i * 3 + j` holds column `i`, row `j`.
pub type RenderMatrix3 = [f32; 9];

/// Pixel size of the drawable area.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height; 1.0 for a collapsed viewport.
    pub fn aspect(&self) -> f32 {
        if self.width == 0 || self.height == 0 {
            return 1.0;
        }
        self.width as f32 / self.height as f32
    }
}

pub fn to_render_matrix4(m: &Mat4) -> RenderMatrix4 {
    let mut out = [0.0f32; 16];
    for i in 0..4 {
        let col = m.col(i);
        for j in 0..4 {
            out[i * 4 + j] = col[j];
        }
    }
    out
}

pub fn from_render_matrix4(a: &RenderMatrix4) -> Mat4 {
    let mut cols = [[0.0f32; 4]; 4];
    for (i, col) in cols.iter_mut().enumerate() {
        for (j, v) in col.iter_mut().enumerate() {
            *v = a[i * 4 + j];
        }
    }
    Mat4::from_cols_array_2d(&cols)
}

/// Symmetric perspective frustum derived from the zoom slider.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frustum {
    pub half_width: f32,
    pub half_height: f32,
    pub near: f32,
    pub far: f32,
}

impl Frustum {
    pub fn width(&self) -> f32 {
        2.0 * self.half_width
    }

    pub fn height(&self) -> f32 {
        2.0 * self.half_height
    }

    pub fn aspect(&self) -> f32 {
        self.half_width / self.half_height
    }

    /// Right-handed projection with clip depth in \[0, 1\] (wgpu convention).
    pub fn to_matrix(&self) -> Mat4 {
        let (n, f) = (self.near, self.far);
        let r = self.half_width;
        let t = self.half_height;
        let depth = f / (n - f);
        Mat4::from_cols_array(&[
            n / r,
            0.0,
            0.0,
            0.0,
            0.0,
            n / t,
            0.0,
            0.0,
            0.0,
            0.0,
            depth,
            -1.0,
            0.0,
            0.0,
            n * depth,
            0.0,
        ])
    }
}

/// Frustum for a zoom `scale` and a viewport `aspect` (width over height).
///
/// Half-width is `1 / (scale + 0.1)`; the half-height follows the viewport so
/// the frustum has the same aspect. `scale` is clamped to a small positive
/// minimum so a collapsed slider never divides by zero.
pub fn compute_projection(scale: f32, aspect: f32, near: f32) -> Frustum {
    let scale = if scale.is_finite() {
        scale.max(MIN_PROJECTION_SCALE)
    } else {
        MIN_PROJECTION_SCALE
    };
    let aspect = if aspect.is_finite() && aspect > 0.0 {
        aspect
    } else {
        1.0
    };
    let half_width = 1.0 / (scale + 0.1);
    Frustum {
        half_width,
        half_height: half_width / aspect,
        near,
        far: FAR_PLANE,
    }
}

/// `transpose(inverse(upper-left 3x3 of model))`.
pub fn compute_normal_matrix(model: &Mat4) -> Result<Mat3, DegenerateTransform> {
    let upper = Mat3::from_mat4(*model);
    let det = upper.determinant();
    if !det.is_finite() || det.abs() < 1e-8 {
        return Err(DegenerateTransform);
    }
    Ok(upper.inverse().transpose())
}

/// Like [`compute_normal_matrix`] but falls back to identity instead of
/// letting NaNs reach the lighting.
pub fn normal_matrix_or_identity(model: &Mat4) -> Mat3 {
    match compute_normal_matrix(model) {
        Ok(m) => m,
        Err(e) => {
            log::debug!("{e}; using identity normal matrix");
            Mat3::IDENTITY
        }
    }
}

pub fn normal_matrix_to_array(m: &Mat3) -> RenderMatrix3 {
    let mut out = [0.0f32; 9];
    for i in 0..3 {
        let col = m.col(i);
        for j in 0..3 {
            out[i * 3 + j] = col[j];
        }
    }
    out
}

/// Fixed camera looking at the origin from [`EYE_POSITION`](crate::constants::EYE_POSITION).
pub fn view_matrix() -> Mat4 {
    Mat4::look_at_rh(eye_vec3(), Vec3::ZERO, Vec3::Y)
}

/// Per-frame spin: equal pitch and yaw plus a constant roll.
pub fn beat_rotation(rotation: f32) -> Mat4 {
    Mat4::from_euler(EulerRot::XYZ, rotation, rotation, BEAT_ROTATION_Z)
}

/// `beat-rotation × drag-rotation × uniform scale`.
pub fn central_model_matrix(rotation: f32, drag: &Mat4, scale: f32) -> Mat4 {
    beat_rotation(rotation) * *drag * Mat4::from_scale(Vec3::splat(scale))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frustum_matrix_maps_near_and_far_to_depth_range() {
        let fr = compute_projection(2.0, 1.5, 4.0);
        let m = fr.to_matrix();
        let near = m * glam::Vec4::new(0.0, 0.0, -4.0, 1.0);
        let far = m * glam::Vec4::new(0.0, 0.0, -FAR_PLANE, 1.0);
        assert!((near.z / near.w).abs() < 1e-5);
        assert!((far.z / far.w - 1.0).abs() < 1e-5);
    }

    #[test]
    fn frustum_edge_lands_on_clip_edge() {
        let fr = compute_projection(1.0, 2.0, 4.0);
        let m = fr.to_matrix();
        // A point on the near plane at the frustum's right edge maps to x = 1.
        let p = m * glam::Vec4::new(fr.half_width, fr.half_height, -fr.near, 1.0);
        assert!((p.x / p.w - 1.0).abs() < 1e-5);
        assert!((p.y / p.w - 1.0).abs() < 1e-5);
    }
}
