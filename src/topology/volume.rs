use super::vertex::VertexId;

slotmap::new_key_type! {
    /// Unique identifier for a volume in a grid.
    pub struct VolumeId;
}

/// Corner vertices of a volume element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeShape {
    Tetrahedron([VertexId; 4]),
    Hexahedron([VertexId; 8]),
    Prism([VertexId; 6]),
    Pyramid([VertexId; 5]),
    Octahedron([VertexId; 6]),
}

impl VolumeShape {
    #[must_use]
    pub fn vertices(&self) -> &[VertexId] {
        match self {
            VolumeShape::Tetrahedron(v) => v,
            VolumeShape::Hexahedron(v) => v,
            VolumeShape::Prism(v) | VolumeShape::Octahedron(v) => v,
            VolumeShape::Pyramid(v) => v,
        }
    }
}

/// Data associated with a grid volume.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeData {
    pub shape: VolumeShape,
}

impl VolumeData {
    #[must_use]
    pub fn new(shape: VolumeShape) -> Self {
        Self { shape }
    }

    #[must_use]
    pub fn vertices(&self) -> &[VertexId] {
        self.shape.vertices()
    }
}
