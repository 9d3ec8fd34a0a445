use glam::{Mat4, Vec2};

/// Per-frame uniforms of the point sprite shader.
/// Matches the `PointUniforms` struct in `point.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable, Debug, PartialEq)]
pub struct PointUniforms {
    pub model: [[f32; 4]; 4],
    pub view_proj: [[f32; 4]; 4],
    pub viewport: [f32; 2],
    pub point_size: f32,
    pub _padding: f32,
}

impl PointUniforms {
    pub fn new(model: Mat4, view_proj: Mat4, viewport: Vec2, point_size: f32) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            view_proj: view_proj.to_cols_array_2d(),
            viewport: viewport.to_array(),
            point_size,
            _padding: 0.0,
        }
    }
}

impl Default for PointUniforms {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY, Vec2::ONE, 1.0)
    }
}
