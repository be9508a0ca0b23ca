//! Loading grids and their containers from UGX documents.
//!
//! A [`GridReader`] parses a document once and registers every top-level
//! `grid` node. Grids are built on request by [`GridReader::load_grid`];
//! subset handlers, selectors and projection handlers are read on request
//! against an already loaded grid.

mod attachments;
mod builders;
mod constraints;
mod containers;
pub mod tokens;

pub use builders::{RawConstraint, TAG_EDGE, TAG_FACE, TAG_NONE};
pub use constraints::{ConstraintIssue, IssueReason};

use std::path::Path;

use tracing::info;

use crate::attachment::AttachmentRegistry;
use crate::document::{Document, Node};
use crate::error::{ContainerError, DocumentError, Result, StructureError};
use crate::projection::{ProjectionHandler, ProjectorFactory};
use crate::selection::Selector;
use crate::subset::SubsetHandler;
use crate::topology::Grid;

/// Reader configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderOptions {
    position_dim: usize,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self { position_dim: 3 }
    }
}

impl ReaderOptions {
    /// Creates options that keep `position_dim` coordinates per vertex.
    ///
    /// # Errors
    ///
    /// Returns [`StructureError::InvalidPositionDim`] unless `position_dim`
    /// is 1, 2 or 3.
    pub fn new(position_dim: usize) -> std::result::Result<Self, StructureError> {
        if (1..=3).contains(&position_dim) {
            Ok(Self { position_dim })
        } else {
            Err(StructureError::InvalidPositionDim(position_dim))
        }
    }

    /// Number of coordinates kept per vertex. Higher components are zero.
    #[must_use]
    pub fn position_dim(&self) -> usize {
        self.position_dim
    }
}

/// One grid of a document.
#[derive(Debug)]
pub struct GridEntry {
    node: usize,
    subset_handlers: Vec<usize>,
    selectors: Vec<usize>,
    projection_handlers: Vec<usize>,
    grid: Option<Grid>,
    constraint_issues: Vec<ConstraintIssue>,
}

impl GridEntry {
    fn new(node: &Node, index: usize) -> Self {
        let positions = |name: &str| -> Vec<usize> {
            node.children()
                .iter()
                .enumerate()
                .filter(|(_, c)| c.name() == name)
                .map(|(i, _)| i)
                .collect()
        };
        Self {
            node: index,
            subset_handlers: positions("subset_handler"),
            selectors: positions("selector"),
            projection_handlers: positions("projection_handler"),
            grid: None,
            constraint_issues: Vec::new(),
        }
    }

    /// The loaded grid, if [`GridReader::load_grid`] has succeeded for it.
    #[must_use]
    pub fn grid(&self) -> Option<&Grid> {
        self.grid.as_ref()
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.grid.is_some()
    }

    /// Unresolved constraint references of the last successful load.
    #[must_use]
    pub fn constraint_issues(&self) -> &[ConstraintIssue] {
        &self.constraint_issues
    }

    #[must_use]
    pub fn num_subset_handlers(&self) -> usize {
        self.subset_handlers.len()
    }

    #[must_use]
    pub fn num_selectors(&self) -> usize {
        self.selectors.len()
    }

    #[must_use]
    pub fn num_projection_handlers(&self) -> usize {
        self.projection_handlers.len()
    }
}

/// Registry of the grids of one parsed document.
#[derive(Debug)]
pub struct GridReader {
    document: Document,
    entries: Vec<GridEntry>,
    options: ReaderOptions,
}

impl GridReader {
    /// Reads and parses the file at `path` with default options.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Io`] if the file cannot be read and
    /// [`DocumentError::Markup`] if it is not well-formed.
    pub fn parse_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::parse_file_with_options(path, ReaderOptions::default())
    }

    /// Like [`GridReader::parse_file`] with explicit options.
    ///
    /// # Errors
    ///
    /// See [`GridReader::parse_file`].
    pub fn parse_file_with_options(path: impl AsRef<Path>, options: ReaderOptions) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_str_with_options(&String::from_utf8_lossy(&bytes), options)
    }

    /// Parses a document held in memory with default options.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Markup`] if `text` is not well-formed.
    pub fn parse_str(text: &str) -> Result<Self> {
        Self::parse_str_with_options(text, ReaderOptions::default())
    }

    /// Like [`GridReader::parse_str`] with explicit options.
    ///
    /// # Errors
    ///
    /// See [`GridReader::parse_str`].
    pub fn parse_str_with_options(text: &str, options: ReaderOptions) -> Result<Self> {
        let document = Document::parse(text)?;
        Ok(Self::from_document(document, options))
    }

    /// Registers the `grid` nodes of an already parsed document.
    #[must_use]
    pub fn from_document(document: Document, options: ReaderOptions) -> Self {
        let entries = document
            .top_level()
            .iter()
            .enumerate()
            .filter(|(_, node)| node.name() == "grid")
            .map(|(i, node)| GridEntry::new(node, i))
            .collect();
        Self {
            document,
            entries,
            options,
        }
    }

    #[must_use]
    pub fn options(&self) -> ReaderOptions {
        self.options
    }

    #[must_use]
    pub fn num_grids(&self) -> usize {
        self.entries.len()
    }

    /// The entry of grid `index`.
    ///
    /// # Errors
    ///
    /// Returns [`StructureError::BadGridIndex`] for an unknown index.
    pub fn entry(&self, index: usize) -> Result<&GridEntry> {
        self.entries.get(index).ok_or_else(|| {
            StructureError::BadGridIndex {
                index,
                num_grids: self.entries.len(),
            }
            .into()
        })
    }

    /// The loaded grid `index`, `None` if it is unknown or not loaded.
    #[must_use]
    pub fn grid(&self, index: usize) -> Option<&Grid> {
        self.entries.get(index).and_then(GridEntry::grid)
    }

    /// Value of the grid's `name` attribute, empty if absent.
    ///
    /// # Errors
    ///
    /// Returns [`StructureError::BadGridIndex`] for an unknown index.
    pub fn grid_name(&self, index: usize) -> Result<&str> {
        Ok(node_name(self.grid_node(index)?))
    }

    /// # Errors
    ///
    /// Returns [`StructureError::BadGridIndex`] for an unknown grid.
    pub fn num_subset_handlers(&self, grid: usize) -> Result<usize> {
        Ok(self.entry(grid)?.num_subset_handlers())
    }

    /// # Errors
    ///
    /// Fails for an unknown grid or subset handler index.
    pub fn subset_handler_name(&self, grid: usize, sh: usize) -> Result<&str> {
        Ok(node_name(self.container_node(grid, sh, Container::SubsetHandler)?))
    }

    /// # Errors
    ///
    /// Returns [`StructureError::BadGridIndex`] for an unknown grid.
    pub fn num_selectors(&self, grid: usize) -> Result<usize> {
        Ok(self.entry(grid)?.num_selectors())
    }

    /// # Errors
    ///
    /// Fails for an unknown grid or selector index.
    pub fn selector_name(&self, grid: usize, sel: usize) -> Result<&str> {
        Ok(node_name(self.container_node(grid, sel, Container::Selector)?))
    }

    /// # Errors
    ///
    /// Returns [`StructureError::BadGridIndex`] for an unknown grid.
    pub fn num_projection_handlers(&self, grid: usize) -> Result<usize> {
        Ok(self.entry(grid)?.num_projection_handlers())
    }

    /// # Errors
    ///
    /// Fails for an unknown grid or projection handler index.
    pub fn projection_handler_name(&self, grid: usize, ph: usize) -> Result<&str> {
        Ok(node_name(self.container_node(grid, ph, Container::ProjectionHandler)?))
    }

    /// Index of the subset handler a projection handler refers to.
    ///
    /// # Errors
    ///
    /// Fails for an unknown grid or projection handler index.
    pub fn projection_handler_subset_handler_index(&self, grid: usize, ph: usize) -> Result<usize> {
        let node = self.container_node(grid, ph, Container::ProjectionHandler)?;
        Ok(containers::subset_handler_index(node))
    }

    /// Unresolved constraint references of grid `index`' last load.
    ///
    /// # Errors
    ///
    /// Returns [`StructureError::BadGridIndex`] for an unknown index.
    pub fn constraint_issues(&self, index: usize) -> Result<&[ConstraintIssue]> {
        Ok(self.entry(index)?.constraint_issues())
    }

    /// Builds grid `index` and returns it.
    ///
    /// The grid is built from scratch into a new arena and stored only when
    /// every node was read. Declarations made in `registry` are likewise
    /// kept only on success. Loading an already loaded grid rebuilds it.
    ///
    /// # Errors
    ///
    /// Returns [`StructureError`] for unknown grid indices and malformed
    /// geometry, and [`AttachmentError`](crate::error::AttachmentError) for
    /// attachment conflicts. The entry is left unchanged in either case.
    pub fn load_grid(&mut self, index: usize, registry: &mut AttachmentRegistry) -> Result<&Grid> {
        let node = self.grid_node(index)?;
        let mut scratch = registry.clone();
        let (grid, issues) = builders::populate(node, &self.options, &mut scratch)?;

        info!(
            grid = index,
            name = node_name(node),
            vertices = grid.num_vertices(),
            edges = grid.num_edges(),
            faces = grid.num_faces(),
            volumes = grid.num_volumes(),
            unresolved_constraints = issues.len(),
            "grid loaded"
        );

        *registry = scratch;
        let entry = &mut self.entries[index];
        entry.constraint_issues = issues;
        let grid: &Grid = entry.grid.insert(grid);
        Ok(grid)
    }

    /// Reads subset handler `sh` of the loaded grid `grid`.
    ///
    /// # Errors
    ///
    /// Fails if the grid is unknown or not loaded, if `sh` is out of range,
    /// or if a subset lists an element index the grid does not have.
    pub fn subset_handler(&self, grid: usize, sh: usize) -> Result<SubsetHandler> {
        let node = self.container_node(grid, sh, Container::SubsetHandler)?;
        let loaded = self.loaded(grid)?;
        Ok(containers::read_subset_handler(loaded, node)?)
    }

    /// Reads selector `sel` of the loaded grid `grid`.
    ///
    /// # Errors
    ///
    /// Fails if the grid is unknown or not loaded, if `sel` is out of range,
    /// or if an entry names an element index the grid does not have.
    pub fn selector(&self, grid: usize, sel: usize) -> Result<Selector> {
        let node = self.container_node(grid, sel, Container::Selector)?;
        let loaded = self.loaded(grid)?;
        Ok(containers::read_selector(loaded, node)?)
    }

    /// Reads projection handler `ph` of the loaded grid `grid`, decoding
    /// projectors with `factory`.
    ///
    /// # Errors
    ///
    /// Fails if the grid is unknown or not loaded or if `ph` is out of
    /// range. Undecodable projectors are skipped, not reported.
    pub fn projection_handler(
        &self,
        grid: usize,
        ph: usize,
        factory: &ProjectorFactory,
    ) -> Result<ProjectionHandler> {
        let node = self.container_node(grid, ph, Container::ProjectionHandler)?;
        self.loaded(grid)?;
        Ok(containers::read_projection_handler(node, factory))
    }

    /// Consumes the reader, returning each grid if it was loaded.
    #[must_use]
    pub fn into_grids(self) -> Vec<Option<Grid>> {
        self.entries.into_iter().map(|e| e.grid).collect()
    }

    fn grid_node(&self, index: usize) -> Result<&Node> {
        let entry = self.entry(index)?;
        Ok(&self.document.top_level()[entry.node])
    }

    fn loaded(&self, index: usize) -> Result<&Grid> {
        self.entry(index)?
            .grid()
            .ok_or_else(|| StructureError::GridNotLoaded(index).into())
    }

    fn container_node(&self, grid: usize, index: usize, container: Container) -> Result<&Node> {
        let entry = self.entry(grid)?;
        let positions = match container {
            Container::SubsetHandler => &entry.subset_handlers,
            Container::Selector => &entry.selectors,
            Container::ProjectionHandler => &entry.projection_handlers,
        };
        let position = positions.get(index).ok_or(ContainerError::BadIndex {
            container: container.name(),
            index,
            available: positions.len(),
        })?;
        Ok(&self.document.top_level()[entry.node].children()[*position])
    }
}

#[derive(Debug, Clone, Copy)]
enum Container {
    SubsetHandler,
    Selector,
    ProjectionHandler,
}

impl Container {
    fn name(self) -> &'static str {
        match self {
            Container::SubsetHandler => "subset handler",
            Container::Selector => "selector",
            Container::ProjectionHandler => "projection handler",
        }
    }
}

fn node_name(node: &Node) -> &str {
    node.attribute("name").unwrap_or("")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::attachment::{AttachmentValue, ElementKind};
    use crate::error::{AttachmentError, UgxError};
    use crate::topology::ElementId;
    use std::io::Write;

    const TWO_GRIDS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<grid name="square">
    <vertices coords="2">0 0 1 0 1 1 0 1</vertices>
    <edges>0 1 1 2 2 3 3 0</edges>
    <quadrilaterals>0 1 2 3</quadrilaterals>
    <vertex_attachment name="temperature" type="double" global="1">1 2 3 4</vertex_attachment>
    <subset_handler name="defSH">
        <subset name="inner" color="0 0 1 1" state="0"><faces>0</faces></subset>
        <subset name="boundary"><edges>0 1 2 3</edges></subset>
    </subset_handler>
    <selector name="picked"><vertices>2 1</vertices></selector>
    <projection_handler name="projSH" subset_handler="0">
        <default type="RefinementProjector"></default>
    </projection_handler>
</grid>
<grid name="clash">
    <vertices coords="1">0 1</vertices>
    <vertex_attachment name="temperature" type="int" global="1">5 6</vertex_attachment>
</grid>"#;

    #[test]
    fn registers_every_top_level_grid() {
        let reader = GridReader::parse_str(TWO_GRIDS).unwrap();
        assert_eq!(reader.num_grids(), 2);
        assert_eq!(reader.grid_name(0).unwrap(), "square");
        assert_eq!(reader.grid_name(1).unwrap(), "clash");
        assert_eq!(reader.num_subset_handlers(0).unwrap(), 1);
        assert_eq!(reader.subset_handler_name(0, 0).unwrap(), "defSH");
        assert_eq!(reader.selector_name(0, 0).unwrap(), "picked");
        assert_eq!(reader.projection_handler_name(0, 0).unwrap(), "projSH");
        assert_eq!(reader.projection_handler_subset_handler_index(0, 0).unwrap(), 0);
        assert_eq!(reader.num_selectors(1).unwrap(), 0);
        assert!(matches!(
            reader.grid_name(2),
            Err(UgxError::Structure(StructureError::BadGridIndex { index: 2, num_grids: 2 }))
        ));
    }

    #[test]
    fn attachment_conflict_leaves_first_grid_intact() {
        let mut reader = GridReader::parse_str(TWO_GRIDS).unwrap();
        let mut registry = AttachmentRegistry::new();
        reader.load_grid(0, &mut registry).unwrap();

        let err = reader.load_grid(1, &mut registry).unwrap_err();
        assert!(matches!(
            err,
            UgxError::Attachment(AttachmentError::TypeMismatch { .. })
        ));
        assert!(reader.grid(1).is_none());

        let first = reader.grid(0).unwrap();
        let column = first.attachment(ElementKind::Vertex, "temperature").unwrap();
        assert_eq!(column.type_name, "double");
        assert_eq!(column.get(3), Some(&AttachmentValue::Double(4.0)));
        assert_eq!(registry.declaration("temperature").unwrap().type_name, "double");
    }

    #[test]
    fn independent_registries_do_not_conflict() {
        let mut reader = GridReader::parse_str(TWO_GRIDS).unwrap();
        reader.load_grid(0, &mut AttachmentRegistry::new()).unwrap();
        let second = reader.load_grid(1, &mut AttachmentRegistry::new()).unwrap();
        let column = second.attachment(ElementKind::Vertex, "temperature").unwrap();
        assert_eq!(column.values, vec![AttachmentValue::Int(5), AttachmentValue::Int(6)]);
    }

    #[test]
    fn into_grids_hands_out_loaded_grids_only() {
        let mut reader = GridReader::parse_str(TWO_GRIDS).unwrap();
        reader.load_grid(1, &mut AttachmentRegistry::new()).unwrap();
        let grids = reader.into_grids();
        assert_eq!(grids.len(), 2);
        assert!(grids[0].is_none());
        assert_eq!(grids[1].as_ref().unwrap().num_vertices(), 2);
    }

    #[test]
    fn failed_load_keeps_registry_untouched() {
        let text = r#"<grid name="g">
            <vertices coords="1">0 1</vertices>
            <vertex_attachment name="fresh" type="double" global="1">1 2</vertex_attachment>
            <edges>0 5</edges>
        </grid>"#;
        let mut reader = GridReader::parse_str(text).unwrap();
        let mut registry = AttachmentRegistry::new();
        let err = reader.load_grid(0, &mut registry).unwrap_err();
        assert!(matches!(
            err,
            UgxError::Structure(StructureError::InvalidVertexIndex { index: 5, .. })
        ));
        assert!(!registry.is_declared("fresh"));
        assert!(!reader.entry(0).unwrap().is_loaded());
    }

    #[test]
    fn containers_are_read_against_the_loaded_grid() {
        let mut reader = GridReader::parse_str(TWO_GRIDS).unwrap();
        assert!(matches!(
            reader.subset_handler(0, 0),
            Err(UgxError::Structure(StructureError::GridNotLoaded(0)))
        ));

        reader.load_grid(0, &mut AttachmentRegistry::new()).unwrap();
        let sh = reader.subset_handler(0, 0).unwrap();
        let sel = reader.selector(0, 0).unwrap();
        let ph = reader.projection_handler(0, 0, &ProjectorFactory::new()).unwrap();
        let grid = reader.grid(0).unwrap();

        assert_eq!(sh.num_subsets(), 2);
        assert_eq!(sh.subset_of(ElementId::Face(grid.face_at(0).unwrap())), Some(0));
        assert_eq!(sh.subset_of(ElementId::Edge(grid.edge_at(3).unwrap())), Some(1));
        assert_eq!(sel.state(ElementId::Vertex(grid.vertex_at(2).unwrap())), Some(1));
        assert_eq!(
            ph.default_projector().unwrap().type_name(),
            "RefinementProjector"
        );
        assert!(matches!(
            reader.selector(0, 1),
            Err(UgxError::Container(ContainerError::BadIndex { available: 1, .. }))
        ));
    }

    #[test]
    fn position_dim_is_validated() {
        assert!(ReaderOptions::new(0).is_err());
        assert!(ReaderOptions::new(4).is_err());
        assert_eq!(ReaderOptions::new(2).unwrap().position_dim(), 2);
    }

    #[test]
    fn reads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TWO_GRIDS.as_bytes()).unwrap();
        let mut reader = GridReader::parse_file(file.path()).unwrap();
        let grid = reader.load_grid(0, &mut AttachmentRegistry::new()).unwrap();
        assert_eq!(grid.num_faces(), 1);
        assert_eq!(grid.num_edges(), 4);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = GridReader::parse_file(dir.path().join("absent.ugx")).unwrap_err();
        assert!(matches!(err, UgxError::Document(DocumentError::Io { .. })));
    }

    #[test]
    fn unresolved_constraints_do_not_fail_the_load() {
        let text = r#"<grid name="hanging">
            <vertices coords="2">0 0 2 0</vertices>
            <constrained_vertices coords="2">1 0 1 3 0.5</constrained_vertices>
            <constraining_edges>0 1</constraining_edges>
        </grid>"#;
        let mut reader = GridReader::parse_str(text).unwrap();
        let grid = reader.load_grid(0, &mut AttachmentRegistry::new()).unwrap();
        assert_eq!(grid.num_vertices(), 3);
        let issues = reader.constraint_issues(0).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].reason, IssueReason::IndexOutOfRange { available: 1 });
    }
}
