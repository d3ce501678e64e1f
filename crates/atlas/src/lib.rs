//! Dash and pattern atlases consumed by the line renderer.
//!
//! The dash atlas is shared by every line layer of a render session; image atlases
//! belong to individual tiles and are filled in asynchronously by the tile worker.

mod dash;
mod image;
mod key;
mod layout;

pub use dash::{DashAtlas, DashAtlasError, LineAtlas};
pub use image::ImageAtlas;
pub use key::DashKey;
pub use layout::{DashPosition, ImagePosition, LineAtlasConfig};
