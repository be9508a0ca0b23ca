use slotmap::SecondaryMap;

use crate::attachment::ElementKind;
use crate::topology::{EdgeId, ElementId, FaceId, VertexId, VolumeId};

/// State-tagged selection of grid elements, independent of subsets.
#[derive(Debug, Clone, Default)]
pub struct Selector {
    vertices: SecondaryMap<VertexId, i32>,
    edges: SecondaryMap<EdgeId, i32>,
    faces: SecondaryMap<FaceId, i32>,
    volumes: SecondaryMap<VolumeId, i32>,
}

impl Selector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects `element` with the given state, overwriting an earlier state.
    pub fn select(&mut self, element: ElementId, state: i32) {
        match element {
            ElementId::Vertex(id) => self.vertices.insert(id, state),
            ElementId::Edge(id) => self.edges.insert(id, state),
            ElementId::Face(id) => self.faces.insert(id, state),
            ElementId::Volume(id) => self.volumes.insert(id, state),
        };
    }

    /// Selection state of `element`, `None` if not selected.
    #[must_use]
    pub fn state(&self, element: ElementId) -> Option<i32> {
        match element {
            ElementId::Vertex(id) => self.vertices.get(id),
            ElementId::Edge(id) => self.edges.get(id),
            ElementId::Face(id) => self.faces.get(id),
            ElementId::Volume(id) => self.volumes.get(id),
        }
        .copied()
    }

    #[must_use]
    pub fn is_selected(&self, element: ElementId) -> bool {
        self.state(element).is_some()
    }

    #[must_use]
    pub fn num_selected(&self, kind: ElementKind) -> usize {
        match kind {
            ElementKind::Vertex => self.vertices.len(),
            ElementKind::Edge => self.edges.len(),
            ElementKind::Face => self.faces.len(),
            ElementKind::Volume => self.volumes.len(),
        }
    }
}
