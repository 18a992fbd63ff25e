use super::detection::DetectionFrame;

/// Tolerance, as a fraction of the interval, when matching a bucket key
/// Absorbs float noise from `n * interval` (0.1 * 3 != 0.3)
const ALIGN_EPSILON: f64 = 1e-6;

/// Bucket key for `current_time_s`: nearest multiple of the interval, ties round up
/// `None` for a non-positive or non-finite interval or time
pub fn bucket_key(current_time_s: f64, interval_s: f64) -> Option<f64> {
    if !(interval_s > 0.0) || !interval_s.is_finite() || !current_time_s.is_finite() {
        return None;
    }
    Some((current_time_s / interval_s + 0.5).floor() * interval_s)
}

/// Detection frame sampled at the bucket containing `current_time_s`
///
/// Nearest-bucket lookup, not nearest-neighbour search: if no frame sits
/// on the key nothing is returned and nothing should be drawn.
///
/// "On the key" allows `interval * 1e-6` of slack instead of bit-exact
/// equality, so a frame stored as `0.3` matches a key computed as `3 * 0.1`.
pub fn select(current_time_s: f64, interval_s: f64, frames: &[DetectionFrame]) -> Option<&DetectionFrame> {
    let key = bucket_key(current_time_s, interval_s)?;
    let tolerance = interval_s * ALIGN_EPSILON;

    frames
        .iter()
        .find(|frame| (frame.time_s - key).abs() <= tolerance)
}
