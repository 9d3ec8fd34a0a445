//! Point colours: label blending, palette generation and colourless fallbacks.

use crate::error::{DataError, Result};
use crate::types::LabelIndex;
use glam::Vec3;

/// Stops of the height ramp, from lowest to highest point.
const HEIGHT_RAMP: [Vec3; 6] = [
    Vec3::new(0.05, 0.03, 0.18),
    Vec3::new(0.30, 0.07, 0.36),
    Vec3::new(0.63, 0.10, 0.37),
    Vec3::new(0.90, 0.28, 0.24),
    Vec3::new(0.96, 0.58, 0.40),
    Vec3::new(0.98, 0.90, 0.80),
];

const PALETTE_SATURATION: f32 = 0.75;
const PALETTE_VALUE: f32 = 0.95;

/// Blend each point's class colour into its base colour.
///
/// `blended[i] = mix_ratio * label_color_map[labels[i]] + (1 - mix_ratio) * base_colors[i]`.
/// Without labels the base colours are returned unchanged.
pub fn blend_label_colors(
    labels: Option<&[LabelIndex]>,
    label_color_map: &[Vec3],
    base_colors: &[Vec3],
    mix_ratio: f32,
) -> Result<Vec<Vec3>> {
    if !mix_ratio.is_finite() {
        return Err(DataError::InvalidMixRatio(mix_ratio));
    }
    let Some(labels) = labels else {
        return Ok(base_colors.to_vec());
    };

    if labels.len() != base_colors.len() {
        return Err(DataError::ShapeMismatch {
            what: "labels",
            expected: base_colors.len(),
            actual: labels.len(),
        });
    }

    labels
        .iter()
        .zip(base_colors)
        .enumerate()
        .map(|(point, (&label, &base))| {
            let label_color = label_color_map
                .get(label as usize)
                .copied()
                .ok_or(DataError::UnknownLabelIndex { point, label })?;

            // Endpoints are exact so ratio 0 / 1 reproduce their source bit for bit.
            Ok(if mix_ratio <= 0.0 {
                base
            } else if mix_ratio >= 1.0 {
                label_color
            } else {
                label_color * mix_ratio + base * (1.0 - mix_ratio)
            })
        })
        .collect()
}

/// `n` visually distinct colours at evenly spaced hues.
pub fn distinct_colors(n: usize) -> Vec<Vec3> {
    (0..n)
        .map(|i| hsv_to_rgb(i as f32 / n as f32, PALETTE_SATURATION, PALETTE_VALUE))
        .collect()
}

/// Colour every point by its height (third coordinate) on a continuous ramp
/// spanning `min_height..=max_height`.
pub fn colorize_with_height(points: &[Vec3], min_height: f32, max_height: f32) -> Vec<Vec3> {
    let range = max_height - min_height;
    points
        .iter()
        .map(|p| {
            let t = if range > f32::EPSILON {
                ((p.z - min_height) / range).clamp(0.0, 1.0)
            } else {
                0.0
            };
            sample_ramp(&HEIGHT_RAMP, t)
        })
        .collect()
}

/// The same colour for every point.
pub fn flat_colors(count: usize, color: Vec3) -> Vec<Vec3> {
    vec![color; count]
}

fn sample_ramp(stops: &[Vec3], t: f32) -> Vec3 {
    let scaled = t * (stops.len() - 1) as f32;
    let lower = (scaled.floor() as usize).min(stops.len() - 2);
    let frac = scaled - lower as f32;
    stops[lower].lerp(stops[lower + 1], frac)
}

/// Hue, saturation and value in [0, 1].
fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Vec3 {
    let sector = (h.rem_euclid(1.0) * 6.0).min(5.999_999);
    let i = sector.floor();
    let f = sector - i;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match i as u8 {
        0 => Vec3::new(v, t, p),
        1 => Vec3::new(q, v, p),
        2 => Vec3::new(p, v, t),
        3 => Vec3::new(p, q, v),
        4 => Vec3::new(t, p, v),
        _ => Vec3::new(v, p, q),
    }
}
