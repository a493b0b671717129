//! ImageMagick command lines for turning master drawables into colored,
//! per-density android resources.
//!
//! Nothing here touches pixels. Every operation is expressed as a `convert`
//! invocation which the caller decides how to run.
mod asset;
mod color;
mod command;

pub use asset::{is_nine_patch, Asset};
pub use color::Color;
pub use command::{scaled_density, Magick, MagickCommand, BASE_DENSITY_DPI};
