pub mod edge;
pub mod face;
pub mod vertex;
pub mod volume;

pub use edge::{EdgeData, EdgeId, EdgeKind};
pub use face::{FaceData, FaceId, FaceKind, FaceShape};
pub use vertex::{ConstrainedVertex, VertexData, VertexId, VertexKind};
pub use volume::{VolumeData, VolumeId, VolumeShape};

use std::collections::BTreeMap;

use crate::attachment::{AttachmentColumn, ElementKind};
use crate::error::StructureError;
use slotmap::SlotMap;

/// Reference from a constrained element to the element that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstrainingRef {
    Edge(EdgeId),
    Face(FaceId),
}

/// Id of an element of any kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementId {
    Vertex(VertexId),
    Edge(EdgeId),
    Face(FaceId),
    Volume(VolumeId),
}

impl ElementId {
    #[must_use]
    pub fn kind(self) -> ElementKind {
        match self {
            ElementId::Vertex(_) => ElementKind::Vertex,
            ElementId::Edge(_) => ElementKind::Edge,
            ElementId::Face(_) => ElementKind::Face,
            ElementId::Volume(_) => ElementKind::Volume,
        }
    }
}

/// Elements hanging on a constraining edge or face.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstrainedSet {
    pub vertices: Vec<VertexId>,
    pub edges: Vec<EdgeId>,
    pub faces: Vec<FaceId>,
}

impl ConstrainedSet {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.edges.is_empty() && self.faces.is_empty()
    }
}

/// Arena that owns all elements of one grid.
///
/// Elements reference each other via typed ids. Besides the slot maps, the
/// grid keeps every kind's ids in creation order; positions in these lists
/// are the indices used by the file format and by attachment columns.
#[derive(Debug, Default)]
pub struct Grid {
    vertices: SlotMap<VertexId, VertexData>,
    edges: SlotMap<EdgeId, EdgeData>,
    faces: SlotMap<FaceId, FaceData>,
    volumes: SlotMap<VolumeId, VolumeData>,
    vertex_order: Vec<VertexId>,
    edge_order: Vec<EdgeId>,
    face_order: Vec<FaceId>,
    volume_order: Vec<VolumeId>,
    attachments: BTreeMap<(ElementKind, String), AttachmentColumn>,
}

impl Grid {
    /// Creates a new, empty grid.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of elements of the given kind.
    #[must_use]
    pub fn num_elements(&self, kind: ElementKind) -> usize {
        match kind {
            ElementKind::Vertex => self.vertex_order.len(),
            ElementKind::Edge => self.edge_order.len(),
            ElementKind::Face => self.face_order.len(),
            ElementKind::Volume => self.volume_order.len(),
        }
    }

    /// The element of `kind` created at position `index`.
    #[must_use]
    pub fn element_at(&self, kind: ElementKind, index: usize) -> Option<ElementId> {
        match kind {
            ElementKind::Vertex => self.vertex_at(index).map(ElementId::Vertex),
            ElementKind::Edge => self.edge_at(index).map(ElementId::Edge),
            ElementKind::Face => self.face_at(index).map(ElementId::Face),
            ElementKind::Volume => self.volume_at(index).map(ElementId::Volume),
        }
    }

    // --- Vertex operations ---

    /// Inserts a vertex and returns its ID.
    pub fn add_vertex(&mut self, data: VertexData) -> VertexId {
        let id = self.vertices.insert(data);
        self.vertex_order.push(id);
        self.grow_attachments(ElementKind::Vertex);
        id
    }

    /// Returns a reference to the vertex data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the grid.
    pub fn vertex(&self, id: VertexId) -> Result<&VertexData, StructureError> {
        self.vertices
            .get(id)
            .ok_or(StructureError::EntityNotFound("vertex"))
    }

    /// Returns a mutable reference to the vertex data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the grid.
    pub fn vertex_mut(&mut self, id: VertexId) -> Result<&mut VertexData, StructureError> {
        self.vertices
            .get_mut(id)
            .ok_or(StructureError::EntityNotFound("vertex"))
    }

    /// The vertex created at position `index`.
    #[must_use]
    pub fn vertex_at(&self, index: usize) -> Option<VertexId> {
        self.vertex_order.get(index).copied()
    }

    /// Vertex ids in creation order.
    #[must_use]
    pub fn vertex_ids(&self) -> &[VertexId] {
        &self.vertex_order
    }

    /// Vertices in creation order.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &VertexData)> + '_ {
        self.vertex_order.iter().map(|&id| (id, &self.vertices[id]))
    }

    #[must_use]
    pub fn num_vertices(&self) -> usize {
        self.vertex_order.len()
    }

    // --- Edge operations ---

    /// Inserts an edge and returns its ID.
    pub fn add_edge(&mut self, data: EdgeData) -> EdgeId {
        let id = self.edges.insert(data);
        self.edge_order.push(id);
        self.grow_attachments(ElementKind::Edge);
        id
    }

    /// Returns a reference to the edge data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the grid.
    pub fn edge(&self, id: EdgeId) -> Result<&EdgeData, StructureError> {
        self.edges
            .get(id)
            .ok_or(StructureError::EntityNotFound("edge"))
    }

    /// Returns a mutable reference to the edge data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the grid.
    pub fn edge_mut(&mut self, id: EdgeId) -> Result<&mut EdgeData, StructureError> {
        self.edges
            .get_mut(id)
            .ok_or(StructureError::EntityNotFound("edge"))
    }

    #[must_use]
    pub fn edge_at(&self, index: usize) -> Option<EdgeId> {
        self.edge_order.get(index).copied()
    }

    #[must_use]
    pub fn edge_ids(&self) -> &[EdgeId] {
        &self.edge_order
    }

    /// Edges in creation order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &EdgeData)> + '_ {
        self.edge_order.iter().map(|&id| (id, &self.edges[id]))
    }

    #[must_use]
    pub fn num_edges(&self) -> usize {
        self.edge_order.len()
    }

    // --- Face operations ---

    /// Inserts a face and returns its ID.
    pub fn add_face(&mut self, data: FaceData) -> FaceId {
        let id = self.faces.insert(data);
        self.face_order.push(id);
        self.grow_attachments(ElementKind::Face);
        id
    }

    /// Returns a reference to the face data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the grid.
    pub fn face(&self, id: FaceId) -> Result<&FaceData, StructureError> {
        self.faces
            .get(id)
            .ok_or(StructureError::EntityNotFound("face"))
    }

    /// Returns a mutable reference to the face data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the grid.
    pub fn face_mut(&mut self, id: FaceId) -> Result<&mut FaceData, StructureError> {
        self.faces
            .get_mut(id)
            .ok_or(StructureError::EntityNotFound("face"))
    }

    #[must_use]
    pub fn face_at(&self, index: usize) -> Option<FaceId> {
        self.face_order.get(index).copied()
    }

    #[must_use]
    pub fn face_ids(&self) -> &[FaceId] {
        &self.face_order
    }

    /// Faces in creation order.
    pub fn faces(&self) -> impl Iterator<Item = (FaceId, &FaceData)> + '_ {
        self.face_order.iter().map(|&id| (id, &self.faces[id]))
    }

    #[must_use]
    pub fn num_faces(&self) -> usize {
        self.face_order.len()
    }

    // --- Volume operations ---

    /// Inserts a volume and returns its ID.
    pub fn add_volume(&mut self, data: VolumeData) -> VolumeId {
        let id = self.volumes.insert(data);
        self.volume_order.push(id);
        self.grow_attachments(ElementKind::Volume);
        id
    }

    /// Returns a reference to the volume data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the grid.
    pub fn volume(&self, id: VolumeId) -> Result<&VolumeData, StructureError> {
        self.volumes
            .get(id)
            .ok_or(StructureError::EntityNotFound("volume"))
    }

    #[must_use]
    pub fn volume_at(&self, index: usize) -> Option<VolumeId> {
        self.volume_order.get(index).copied()
    }

    #[must_use]
    pub fn volume_ids(&self) -> &[VolumeId] {
        &self.volume_order
    }

    /// Volumes in creation order.
    pub fn volumes(&self) -> impl Iterator<Item = (VolumeId, &VolumeData)> + '_ {
        self.volume_order.iter().map(|&id| (id, &self.volumes[id]))
    }

    #[must_use]
    pub fn num_volumes(&self) -> usize {
        self.volume_order.len()
    }

    // --- Attachments ---

    /// Stores `column` under `name`, replacing an earlier column of that name.
    ///
    /// The column is resized to the current number of elements of `kind`
    /// and grows with every element added afterwards.
    pub fn attach(&mut self, kind: ElementKind, name: impl Into<String>, mut column: AttachmentColumn) {
        column.resize(self.num_elements(kind));
        self.attachments.insert((kind, name.into()), column);
    }

    /// The attachment column called `name` on elements of `kind`.
    #[must_use]
    pub fn attachment(&self, kind: ElementKind, name: &str) -> Option<&AttachmentColumn> {
        self.attachments.get(&(kind, name.to_owned()))
    }

    /// All attachments as `(kind, name, column)`, ordered by kind and name.
    pub fn attachments(&self) -> impl Iterator<Item = (ElementKind, &str, &AttachmentColumn)> + '_ {
        self.attachments
            .iter()
            .map(|((kind, name), column)| (*kind, name.as_str(), column))
    }

    fn grow_attachments(&mut self, kind: ElementKind) {
        let len = self.num_elements(kind);
        for ((k, _), column) in &mut self.attachments {
            if *k == kind {
                column.resize(len);
            }
        }
    }
}
