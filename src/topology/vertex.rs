use crate::math::Point3;

use super::ConstrainingRef;

slotmap::new_key_type! {
    /// Unique identifier for a vertex in a grid.
    pub struct VertexId;
}

/// A hanging vertex lying on a constraining edge or face.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstrainedVertex {
    /// Local coordinates on the constraining element. An edge uses only the
    /// first entry.
    pub local_coords: [f64; 2],
    /// The owning element, once resolved.
    pub constraining: Option<ConstrainingRef>,
}

/// Concrete vertex kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum VertexKind {
    #[default]
    Regular,
    Constrained(ConstrainedVertex),
}

/// Data associated with a grid vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexData {
    /// Vertex position. Components beyond the configured position
    /// dimension are zero.
    pub position: Point3,
    pub kind: VertexKind,
}

impl VertexData {
    /// Creates a regular vertex at the given point.
    #[must_use]
    pub fn new(position: Point3) -> Self {
        Self {
            position,
            kind: VertexKind::Regular,
        }
    }

    /// Creates a constrained vertex that is not yet linked to its owner.
    #[must_use]
    pub fn constrained(position: Point3, local_coords: [f64; 2]) -> Self {
        Self {
            position,
            kind: VertexKind::Constrained(ConstrainedVertex {
                local_coords,
                constraining: None,
            }),
        }
    }

    #[must_use]
    pub fn is_constrained(&self) -> bool {
        matches!(self.kind, VertexKind::Constrained(_))
    }

    /// The element constraining this vertex, if any.
    #[must_use]
    pub fn constraining(&self) -> Option<ConstrainingRef> {
        match &self.kind {
            VertexKind::Constrained(c) => c.constraining,
            VertexKind::Regular => None,
        }
    }
}
