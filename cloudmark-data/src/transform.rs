//! Rigid pose of a point cloud and the translate/rotate/reset state around it.

use glam::{Mat4, Vec3};

/// Coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Translation plus Euler rotation in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    pub translation: Vec3,
    /// Degrees about X, Y and Z, each in [0, 360).
    pub rotation: Vec3,
}

impl Pose {
    /// Create a pose; rotation components are normalised.
    pub fn new(translation: Vec3, rotation: Vec3) -> Self {
        Self {
            translation,
            rotation: normalize_rotation(rotation),
        }
    }

    /// World matrix of the pose: translate, then rotate about `pivot`
    /// composing X, Y and Z rotations in that order.
    pub fn model_matrix(&self, pivot: Vec3) -> Mat4 {
        Mat4::from_translation(self.translation)
            * Mat4::from_translation(pivot)
            * Mat4::from_rotation_x(self.rotation.x.to_radians())
            * Mat4::from_rotation_y(self.rotation.y.to_radians())
            * Mat4::from_rotation_z(self.rotation.z.to_radians())
            * Mat4::from_translation(-pivot)
    }
}

/// Floor-mod 360 that never returns 360 through rounding of tiny negatives.
pub fn normalize_degrees(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

fn normalize_rotation(rotation: Vec3) -> Vec3 {
    Vec3::new(
        normalize_degrees(rotation.x),
        normalize_degrees(rotation.y),
        normalize_degrees(rotation.z),
    )
}

/// Live pose of a cloud together with the pose it was loaded with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformState {
    initial: Pose,
    current: Pose,
}

impl TransformState {
    pub fn new(initial: Pose) -> Self {
        let initial = Pose::new(initial.translation, initial.rotation);
        Self {
            initial,
            current: initial,
        }
    }

    pub fn pose(&self) -> Pose {
        self.current
    }

    pub fn initial_pose(&self) -> Pose {
        self.initial
    }

    pub fn translation(&self) -> Vec3 {
        self.current.translation
    }

    pub fn rotation(&self) -> Vec3 {
        self.current.rotation
    }

    pub fn set_translation(&mut self, translation: Vec3) {
        self.current.translation = translation;
    }

    pub fn set_translation_axis(&mut self, axis: Axis, value: f32) {
        self.current.translation[axis.index()] = value;
    }

    pub fn set_rotation(&mut self, degrees: Vec3) {
        self.current.rotation = normalize_rotation(degrees);
    }

    pub fn set_rotation_axis(&mut self, axis: Axis, degrees: f32) {
        self.current.rotation[axis.index()] = normalize_degrees(degrees);
    }

    /// Restore translation and rotation recorded at load time.
    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}
