//! Shader source code embedded at compile time.

/// Point sprite shader. `vs_main` expands each instance into a screen-aligned
/// quad of `point_size` pixels, `fs_main` writes the per-point colour.
pub const POINT_SPRITE: &str = include_str!("../shaders/point.wgsl");
