//! # Dualzoom Core
//!
//! Geometry shared by the overlay renderer and the viewers: points and
//! polygons in normalized image coordinates, bounding boxes, overlay paint
//! styles, and an R-tree index over registered overlay regions.

pub mod geometry;
pub mod style;
pub mod spatial;

pub use geometry::{BoundingBox, GeometryError, NormalizedPoint, Polygon};
pub use style::{ColorError, Rgba, Style};
pub use spatial::{OverlayId, OverlayIndex, SpatialEntry};
