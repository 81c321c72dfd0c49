//! Print file assembly: manifest rendering and zip bundling.

pub mod bundle;
pub mod manifest;

pub use bundle::{bundle_file_stem, photo_file_name, PrintBundle, PrintFileFactory};
pub use manifest::{render_manifest, ManifestRecord};
