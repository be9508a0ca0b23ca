//! Lightweight inspection of UGX files.
//!
//! [`FileInfo`] reads names, element presence and the spatial extent of each
//! grid straight from the document, without building any elements. It works
//! on files whose full load would fail.

use std::path::Path;

use crate::document::{Document, Node};
use crate::error::{DocumentError, InfoError, Result};
use crate::math::{significant_dimension, Aabb, Point3, Vector3};
use crate::reader::tokens::TokenStream;

const VERTEX_NODES: &[&str] = &["vertices", "constrained_vertices"];
const EDGE_NODES: &[&str] = &["edges", "constraining_edges", "constrained_edges"];
const FACE_NODES: &[&str] = &[
    "triangles",
    "constraining_triangles",
    "constrained_triangles",
    "quadrilaterals",
    "constraining_quadrilaterals",
    "constrained_quadrilaterals",
];
const VOLUME_NODES: &[&str] = &[
    "tetrahedrons",
    "hexahedrons",
    "prisms",
    "pyramids",
    "octahedrons",
];

/// Names of a subset handler and its subsets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubsetHandlerInfo {
    pub name: String,
    pub subsets: Vec<String>,
}

/// Summary of one grid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridInfo {
    pub name: String,
    pub subset_handlers: Vec<SubsetHandlerInfo>,
    /// Box around the positions in `vertices` nodes, `None` without any.
    pub bounding_box: Option<Aabb>,
    pub has_vertices: bool,
    pub has_edges: bool,
    pub has_faces: bool,
    pub has_volumes: bool,
}

impl GridInfo {
    fn from_node(node: &Node) -> Self {
        let has_any = |names: &[&str]| names.iter().any(|n| node.has_child(n));
        let bounding_box = node
            .children_named("vertices")
            .filter_map(vertex_node_bounds)
            .reduce(|a, b| a.union(&b));
        Self {
            name: name_of(node),
            subset_handlers: node
                .children_named("subset_handler")
                .map(|sh| SubsetHandlerInfo {
                    name: name_of(sh),
                    subsets: sh.children_named("subset").map(name_of).collect(),
                })
                .collect(),
            bounding_box,
            has_vertices: has_any(VERTEX_NODES),
            has_edges: has_any(EDGE_NODES),
            has_faces: has_any(FACE_NODES),
            has_volumes: has_any(VOLUME_NODES),
        }
    }

    /// Extent of the bounding box, zero without vertices.
    #[must_use]
    pub fn extent(&self) -> Vector3 {
        self.bounding_box.map_or_else(Vector3::zeros, |b| b.extent())
    }

    /// 3 with volumes, 2 with faces, 1 with edges, else 0.
    #[must_use]
    pub fn topological_dimension(&self) -> usize {
        if self.has_volumes {
            3
        } else if self.has_faces {
            2
        } else if self.has_edges {
            1
        } else {
            0
        }
    }

    /// Number of axes the grid actually spans.
    #[must_use]
    pub fn physical_dimension(&self) -> usize {
        significant_dimension(&self.extent())
    }
}

/// Summary of every grid in a file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileInfo {
    grids: Vec<GridInfo>,
}

impl FileInfo {
    /// Inspects the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] if the file cannot be read or parsed.
    pub fn parse_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_str(&String::from_utf8_lossy(&bytes))
    }

    /// Inspects a document held in memory.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Markup`] if `text` is not well-formed.
    pub fn parse_str(text: &str) -> Result<Self> {
        let document = Document::parse(text)?;
        Ok(Self {
            grids: document
                .top_level()
                .iter()
                .filter(|n| n.name() == "grid")
                .map(GridInfo::from_node)
                .collect(),
        })
    }

    #[must_use]
    pub fn num_grids(&self) -> usize {
        self.grids.len()
    }

    /// # Errors
    ///
    /// Returns [`InfoError::IndexOutOfRange`] for an unknown grid.
    pub fn grid_info(&self, grid: usize) -> std::result::Result<&GridInfo, InfoError> {
        checked(&self.grids, grid, "grid")
    }

    /// # Errors
    ///
    /// Returns [`InfoError::IndexOutOfRange`] for an unknown grid.
    pub fn grid_name(&self, grid: usize) -> std::result::Result<&str, InfoError> {
        Ok(&self.grid_info(grid)?.name)
    }

    /// # Errors
    ///
    /// Returns [`InfoError::IndexOutOfRange`] for an unknown grid.
    pub fn num_subset_handlers(&self, grid: usize) -> std::result::Result<usize, InfoError> {
        Ok(self.grid_info(grid)?.subset_handlers.len())
    }

    /// # Errors
    ///
    /// Returns [`InfoError::IndexOutOfRange`] for an unknown grid or subset
    /// handler.
    pub fn subset_handler_name(&self, grid: usize, sh: usize) -> std::result::Result<&str, InfoError> {
        Ok(&self.subset_handler(grid, sh)?.name)
    }

    /// # Errors
    ///
    /// Returns [`InfoError::IndexOutOfRange`] for an unknown grid or subset
    /// handler.
    pub fn num_subsets(&self, grid: usize, sh: usize) -> std::result::Result<usize, InfoError> {
        Ok(self.subset_handler(grid, sh)?.subsets.len())
    }

    /// # Errors
    ///
    /// Returns [`InfoError::IndexOutOfRange`] for an unknown grid, subset
    /// handler or subset.
    pub fn subset_name(
        &self,
        grid: usize,
        sh: usize,
        subset: usize,
    ) -> std::result::Result<&str, InfoError> {
        let handler = self.subset_handler(grid, sh)?;
        checked(&handler.subsets, subset, "subset").map(String::as_str)
    }

    /// # Errors
    ///
    /// Returns [`InfoError::IndexOutOfRange`] for an unknown grid.
    pub fn has_vertices(&self, grid: usize) -> std::result::Result<bool, InfoError> {
        Ok(self.grid_info(grid)?.has_vertices)
    }

    /// # Errors
    ///
    /// Returns [`InfoError::IndexOutOfRange`] for an unknown grid.
    pub fn has_edges(&self, grid: usize) -> std::result::Result<bool, InfoError> {
        Ok(self.grid_info(grid)?.has_edges)
    }

    /// # Errors
    ///
    /// Returns [`InfoError::IndexOutOfRange`] for an unknown grid.
    pub fn has_faces(&self, grid: usize) -> std::result::Result<bool, InfoError> {
        Ok(self.grid_info(grid)?.has_faces)
    }

    /// # Errors
    ///
    /// Returns [`InfoError::IndexOutOfRange`] for an unknown grid.
    pub fn has_volumes(&self, grid: usize) -> std::result::Result<bool, InfoError> {
        Ok(self.grid_info(grid)?.has_volumes)
    }

    /// # Errors
    ///
    /// Returns [`InfoError::IndexOutOfRange`] for an unknown grid.
    pub fn bounding_box(&self, grid: usize) -> std::result::Result<Option<Aabb>, InfoError> {
        Ok(self.grid_info(grid)?.bounding_box)
    }

    /// # Errors
    ///
    /// Returns [`InfoError::IndexOutOfRange`] for an unknown grid.
    pub fn topological_dimension(&self, grid: usize) -> std::result::Result<usize, InfoError> {
        Ok(self.grid_info(grid)?.topological_dimension())
    }

    /// # Errors
    ///
    /// Returns [`InfoError::IndexOutOfRange`] for an unknown grid.
    pub fn physical_dimension(&self, grid: usize) -> std::result::Result<usize, InfoError> {
        Ok(self.grid_info(grid)?.physical_dimension())
    }

    fn subset_handler(&self, grid: usize, sh: usize) -> std::result::Result<&SubsetHandlerInfo, InfoError> {
        checked(&self.grid_info(grid)?.subset_handlers, sh, "subset handler")
    }
}

fn checked<'a, T>(items: &'a [T], index: usize, what: &'static str) -> std::result::Result<&'a T, InfoError> {
    items.get(index).ok_or(InfoError::IndexOutOfRange {
        what,
        index,
        available: items.len(),
    })
}

fn name_of(node: &Node) -> String {
    node.attribute("name").unwrap_or_default().to_owned()
}

/// Bounds of the complete positions in one `vertices` node. Nodes with a
/// missing or unsupported `coords` attribute, or without any position,
/// yield `None`.
fn vertex_node_bounds(node: &Node) -> Option<Aabb> {
    let coords = node
        .attribute("coords")
        .and_then(|c| c.trim().parse::<usize>().ok())
        .filter(|c| (1..=3).contains(c))?;

    let mut tokens = TokenStream::new(node.text());
    let mut bounds: Option<Aabb> = None;
    'positions: loop {
        let mut p = Point3::origin();
        for i in 0..coords {
            match tokens.next_f64() {
                Some(v) => p[i] = v,
                None => break 'positions,
            }
        }
        match bounds.as_mut() {
            Some(b) => b.include(&p),
            None => bounds = Some(Aabb::from_point(p)),
        }
    }
    bounds
}
