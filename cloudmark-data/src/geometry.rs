//! Derived geometry of a point set: centroid, extents and initial placement.

use crate::error::{DataError, Result};
use glam::{DVec3, Vec3};

/// Share of the far plane the initial zoom may use.
const FAR_PLANE_MARGIN: f32 = 0.9;

/// Arithmetic mean of the points, accumulated in f64.
pub fn centroid(points: &[Vec3]) -> Result<Vec3> {
    if points.is_empty() {
        return Err(DataError::EmptyCloud);
    }

    let sum = points
        .iter()
        .fold(DVec3::ZERO, |acc, p| acc + p.as_dvec3());
    Ok((sum / points.len() as f64).as_vec3())
}

/// Per-axis minimum and maximum.
pub fn extents(points: &[Vec3]) -> Result<(Vec3, Vec3)> {
    let (first, rest) = points.split_first().ok_or(DataError::EmptyCloud)?;

    let (mins, maxs) = rest
        .iter()
        .fold((*first, *first), |(min, max), p| (min.min(*p), max.max(*p)));
    Ok((mins, maxs))
}

/// Center of the axis-aligned bounding box; the pivot the cloud rotates about.
pub fn bounding_box_center(mins: Vec3, maxs: Vec3) -> Vec3 {
    mins + (maxs - mins) / 2.0
}

/// Translation that backs the cloud away from the camera far enough to fit its
/// diagonal, capped at 90% of the far plane.
pub fn initial_translation(center: Vec3, mins: Vec3, maxs: Vec3, far_plane: f32) -> Vec3 {
    let diagonal = (maxs - mins).length();
    let zoom = diagonal.min(far_plane * FAR_PLANE_MARGIN);
    -(center + Vec3::new(0.0, 0.0, zoom))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tetra() -> Vec<Vec3> {
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
            Vec3::new(0.0, 0.0, 2.0),
        ]
    }

    #[test]
    fn test_centroid_is_mean() {
        assert_eq!(centroid(&tetra()).unwrap(), Vec3::splat(0.5));
    }

    #[test]
    fn test_centroid_empty() {
        assert!(matches!(centroid(&[]), Err(DataError::EmptyCloud)));
    }

    #[test]
    fn test_extents_ordering() {
        let (mins, maxs) = extents(&tetra()).unwrap();
        assert_eq!(mins, Vec3::ZERO);
        assert_eq!(maxs, Vec3::splat(2.0));
        assert!(mins.cmple(maxs).all());
    }

    #[test]
    fn test_extents_single_point() {
        let p = Vec3::new(-1.5, 3.0, 7.25);
        let (mins, maxs) = extents(&[p]).unwrap();
        assert_eq!(mins, p);
        assert_eq!(maxs, p);
    }

    #[test]
    fn test_extents_negative_coordinates() {
        let points = [Vec3::new(-3.0, 1.0, 0.0), Vec3::new(2.0, -4.0, 5.0)];
        let (mins, maxs) = extents(&points).unwrap();
        assert_eq!(mins, Vec3::new(-3.0, -4.0, 0.0));
        assert_eq!(maxs, Vec3::new(2.0, 1.0, 5.0));
    }

    #[test]
    fn test_extents_empty() {
        assert!(matches!(extents(&[]), Err(DataError::EmptyCloud)));
    }

    #[test]
    fn test_bounding_box_center() {
        let center = bounding_box_center(Vec3::new(-2.0, 0.0, 1.0), Vec3::new(2.0, 4.0, 3.0));
        assert_eq!(center, Vec3::new(0.0, 2.0, 2.0));
    }

    #[test]
    fn test_initial_translation_uses_diagonal() {
        let translation =
            initial_translation(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO, Vec3::new(3.0, 4.0, 0.0), 100.0);
        assert_eq!(translation, Vec3::new(-1.0, -2.0, -8.0));
    }

    #[test]
    fn test_initial_translation_clamped_by_far_plane() {
        // diagonal = 1000
        let maxs = Vec3::new(600.0, 800.0, 0.0);
        let translation = initial_translation(Vec3::ZERO, Vec3::ZERO, maxs, 10.0);
        assert!((translation.z + 9.0).abs() < 1e-5);
        assert!(translation.z.abs() <= 10.0 * 0.9 + 1e-5);
        assert_eq!(translation.x, 0.0);
        assert_eq!(translation.y, 0.0);
    }
}
