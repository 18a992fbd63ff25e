mod color;
pub mod letterbox;

pub use color::{hsv_to_rgb, label_color};
pub use letterbox::{fit, DrawGeometry};
