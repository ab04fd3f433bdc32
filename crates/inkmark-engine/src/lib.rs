pub mod editing;
pub mod error;
pub mod position;
pub mod render;
pub mod surface;

// Re-export key types for easier usage
pub use editing::{Cmd, Document, InlineMarker, Patch};
pub use error::EngineError;
pub use position::{Point, checkbox_index_at, offset_of, point_at};
pub use render::{Node, StyleTag, VisualTree, flatten, render, to_markup};
pub use surface::{Surface, SurfaceOptions, SurfaceState};
