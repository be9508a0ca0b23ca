use slotmap::SecondaryMap;

use crate::topology::{EdgeId, ElementId, FaceId, VertexId, VolumeId};

/// Bit flags stored with a subset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubsetState(pub u32);

impl SubsetState {
    /// The subset is hidden in viewers.
    pub const HIDDEN: u32 = 1;
    /// The subset was described by the file rather than created implicitly.
    pub const INITIALIZED: u32 = 1 << 1;

    #[must_use]
    pub fn contains(self, flag: u32) -> bool {
        self.0 & flag == flag
    }

    pub fn insert(&mut self, flag: u32) {
        self.0 |= flag;
    }

    #[must_use]
    pub fn is_visible(self) -> bool {
        !self.contains(Self::HIDDEN)
    }
}

/// Name, color and state of a subset.
#[derive(Debug, Clone, PartialEq)]
pub struct SubsetInfo {
    pub name: String,
    /// RGBA, each channel in `[0, 1]`.
    pub color: [f32; 4],
    pub state: SubsetState,
}

impl Default for SubsetInfo {
    fn default() -> Self {
        Self {
            name: String::new(),
            color: [0.0, 0.0, 0.0, 1.0],
            state: SubsetState::default(),
        }
    }
}

/// Partition of a grid's elements into numbered subsets.
///
/// Subset indices are dense and start at 0; touching a higher index extends
/// the subset list with default entries.
#[derive(Debug, Clone, Default)]
pub struct SubsetHandler {
    infos: Vec<SubsetInfo>,
    vertices: SecondaryMap<VertexId, usize>,
    edges: SecondaryMap<EdgeId, usize>,
    faces: SecondaryMap<FaceId, usize>,
    volumes: SecondaryMap<VolumeId, usize>,
}

impl SubsetHandler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn num_subsets(&self) -> usize {
        self.infos.len()
    }

    #[must_use]
    pub fn subset_info(&self, index: usize) -> Option<&SubsetInfo> {
        self.infos.get(index)
    }

    /// Mutable access to subset `index`, creating it and every lower index
    /// if needed.
    pub fn subset_info_mut(&mut self, index: usize) -> &mut SubsetInfo {
        self.ensure_subset(index);
        &mut self.infos[index]
    }

    #[must_use]
    pub fn subset_infos(&self) -> &[SubsetInfo] {
        &self.infos
    }

    /// Moves `element` into `subset`.
    pub fn assign(&mut self, element: ElementId, subset: usize) {
        self.ensure_subset(subset);
        match element {
            ElementId::Vertex(id) => self.vertices.insert(id, subset),
            ElementId::Edge(id) => self.edges.insert(id, subset),
            ElementId::Face(id) => self.faces.insert(id, subset),
            ElementId::Volume(id) => self.volumes.insert(id, subset),
        };
    }

    /// Subset of `element`, or `None` if it is unassigned.
    #[must_use]
    pub fn subset_of(&self, element: ElementId) -> Option<usize> {
        match element {
            ElementId::Vertex(id) => self.vertices.get(id),
            ElementId::Edge(id) => self.edges.get(id),
            ElementId::Face(id) => self.faces.get(id),
            ElementId::Volume(id) => self.volumes.get(id),
        }
        .copied()
    }

    fn ensure_subset(&mut self, index: usize) {
        if index >= self.infos.len() {
            self.infos.resize_with(index + 1, SubsetInfo::default);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::topology::{Grid, VertexData};

    #[test]
    fn assigning_extends_subsets_densely() {
        let mut grid = Grid::new();
        let v = grid.add_vertex(VertexData::new(Point3::origin()));
        let mut sh = SubsetHandler::new();
        sh.assign(ElementId::Vertex(v), 2);

        assert_eq!(sh.num_subsets(), 3);
        assert_eq!(sh.subset_of(ElementId::Vertex(v)), Some(2));
        assert_eq!(sh.subset_info(0).unwrap(), &SubsetInfo::default());
    }

    #[test]
    fn unassigned_elements_have_no_subset() {
        let mut grid = Grid::new();
        let v = grid.add_vertex(VertexData::new(Point3::origin()));
        assert_eq!(SubsetHandler::new().subset_of(ElementId::Vertex(v)), None);
    }

    #[test]
    fn hidden_flag_controls_visibility() {
        let mut state = SubsetState::default();
        assert!(state.is_visible());
        state.insert(SubsetState::HIDDEN);
        assert!(!state.is_visible());
    }
}
