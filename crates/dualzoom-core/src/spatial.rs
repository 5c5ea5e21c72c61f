use rstar::{RTree, RTreeObject, AABB};
use uuid::Uuid;

use crate::geometry::{BoundingBox, NormalizedPoint};

/// Unique overlay identifier.
pub type OverlayId = Uuid;

/// An entry in the overlay R-tree, referencing an overlay by its id.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialEntry {
    pub overlay_id: OverlayId,
    /// Region the overlay occupies in normalized image coordinates.
    pub bbox: BoundingBox,
}

impl RTreeObject for SpatialEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        envelope_of(&self.bbox)
    }
}

fn envelope_of(bbox: &BoundingBox) -> AABB<[f64; 2]> {
    AABB::from_corners([bbox.min_x, bbox.min_y], [bbox.max_x(), bbox.max_y()])
}

/// Spatial index over registered overlays, for hit-testing and viewport culling.
#[derive(Debug)]
pub struct OverlayIndex {
    tree: RTree<SpatialEntry>,
}

impl OverlayIndex {
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    /// Build the index from a batch of entries.
    pub fn build(entries: Vec<SpatialEntry>) -> Self {
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    pub fn insert(&mut self, overlay_id: OverlayId, bbox: BoundingBox) {
        self.tree.insert(SpatialEntry { overlay_id, bbox });
    }

    /// All overlays whose region contains the given point.
    pub fn query_point(&self, point: &NormalizedPoint) -> Vec<&SpatialEntry> {
        let probe = AABB::from_point([point.x, point.y]);
        self.tree.locate_in_envelope_intersecting(&probe).collect()
    }

    /// All overlays intersecting the given region (typically the visible bounds).
    pub fn query_region(&self, region: &BoundingBox) -> Vec<&SpatialEntry> {
        self.tree
            .locate_in_envelope_intersecting(&envelope_of(region))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl Default for OverlayIndex {
    fn default() -> Self {
        Self::new()
    }
}
