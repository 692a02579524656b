// src/utils/fixed_point.rs

/// Largest magnitude written as int16, so that -1.0 never lands on the
/// no-data value at the default scale factor.
const FIXED_POINT_LIMIT: f32 = 0.9999;

pub fn to_fixed_point(pixels: &[Option<f32>], scale_factor: i32, nodata_value: i16) -> Vec<i16> {
    pixels
        .iter()
        .map(|value| match value {
            None => nodata_value,
            Some(value) => {
                // Clamp to avoid overflow and scale
                let clamped = value.clamp(-FIXED_POINT_LIMIT, FIXED_POINT_LIMIT);
                (clamped * scale_factor as f32).round() as i16
            }
        })
        .collect()
}
