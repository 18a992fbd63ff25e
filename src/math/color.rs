use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::core::Rgba;

pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [f32; 3] {
    let c = v * s;
    let h_prime = (h * 6.0) % 6.0;
    let x = c * (1.0 - ((h_prime % 2.0) - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match h_prime as i32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    [r + m, g + m, b + m]
}

/// Stable, saturated colour per detection label
/// Same label maps to the same hue across clips and runs of one build;
/// `DefaultHasher` may change between Rust releases, so hues can too
pub fn label_color(label: &str) -> Rgba {
    let mut hasher = DefaultHasher::new();
    label.to_ascii_lowercase().hash(&mut hasher);
    let hue = (hasher.finish() % 360) as f32 / 360.0;

    Rgba::from_unit(hsv_to_rgb(hue, 0.85, 1.0), 255)
}
