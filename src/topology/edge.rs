use super::vertex::VertexId;
use super::{ConstrainedSet, ConstrainingRef};

slotmap::new_key_type! {
    /// Unique identifier for an edge in a grid.
    pub struct EdgeId;
}

/// Concrete edge kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum EdgeKind {
    #[default]
    Regular,
    /// An edge carrying hanging vertices and edges.
    Constraining(ConstrainedSet),
    /// An edge lying on a constraining edge or face.
    Constrained(Option<ConstrainingRef>),
}

/// Data associated with a grid edge.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeData {
    /// The two corner vertices.
    pub vertices: [VertexId; 2],
    pub kind: EdgeKind,
}

impl EdgeData {
    #[must_use]
    pub fn new(vertices: [VertexId; 2], kind: EdgeKind) -> Self {
        Self { vertices, kind }
    }

    /// The constrained set, if this is a constraining edge.
    #[must_use]
    pub fn constrained_set(&self) -> Option<&ConstrainedSet> {
        match &self.kind {
            EdgeKind::Constraining(set) => Some(set),
            _ => None,
        }
    }

    /// The owning element, if this is a resolved constrained edge.
    #[must_use]
    pub fn constraining(&self) -> Option<ConstrainingRef> {
        match self.kind {
            EdgeKind::Constrained(owner) => owner,
            _ => None,
        }
    }
}
