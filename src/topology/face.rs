use super::vertex::VertexId;
use super::{ConstrainedSet, ConstrainingRef};

slotmap::new_key_type! {
    /// Unique identifier for a face in a grid.
    pub struct FaceId;
}

/// Corner vertices of a face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceShape {
    Triangle([VertexId; 3]),
    Quadrilateral([VertexId; 4]),
}

impl FaceShape {
    #[must_use]
    pub fn vertices(&self) -> &[VertexId] {
        match self {
            FaceShape::Triangle(v) => v,
            FaceShape::Quadrilateral(v) => v,
        }
    }
}

/// Concrete face kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FaceKind {
    #[default]
    Regular,
    /// A face carrying hanging vertices, edges and faces.
    Constraining(ConstrainedSet),
    /// A face lying on a constraining face.
    Constrained(Option<ConstrainingRef>),
}

/// Data associated with a grid face.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceData {
    pub shape: FaceShape,
    pub kind: FaceKind,
}

impl FaceData {
    #[must_use]
    pub fn new(shape: FaceShape, kind: FaceKind) -> Self {
        Self { shape, kind }
    }

    #[must_use]
    pub fn vertices(&self) -> &[VertexId] {
        self.shape.vertices()
    }

    /// The constrained set, if this is a constraining face.
    #[must_use]
    pub fn constrained_set(&self) -> Option<&ConstrainedSet> {
        match &self.kind {
            FaceKind::Constraining(set) => Some(set),
            _ => None,
        }
    }

    /// The owning element, if this is a resolved constrained face.
    #[must_use]
    pub fn constraining(&self) -> Option<ConstrainingRef> {
        match self.kind {
            FaceKind::Constrained(owner) => owner,
            _ => None,
        }
    }
}
