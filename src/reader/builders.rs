//! Element builders: turn node bodies into grid elements.
//!
//! Each builder reads fixed-size groups of vertex indices. A bad vertex index
//! aborts the whole grid; an incomplete or malformed trailing group ends the
//! node with a warning. Constrained kinds also record the raw reference to
//! their constraining element, which is linked later by
//! [`resolve_constraints`](super::constraints::resolve_constraints).

use tracing::{debug, warn};

use crate::attachment::{AttachmentRegistry, ElementKind};
use crate::document::Node;
use crate::error::{Result, StructureError};
use crate::math::Point3;
use crate::topology::{
    ConstrainedSet, EdgeData, EdgeId, EdgeKind, FaceData, FaceId, FaceKind, FaceShape, Grid,
    VertexData, VertexId, VolumeData, VolumeShape,
};

use super::attachments::read_attachment;
use super::constraints::{resolve_constraints, ConstraintIssue};
use super::tokens::TokenStream;
use super::ReaderOptions;

/// Tag marking a constrained element without a constraining element.
pub const TAG_NONE: i64 = -1;
/// Tag of a constraining edge.
pub const TAG_EDGE: i64 = 1;
/// Tag of a constraining face.
pub const TAG_FACE: i64 = 2;

/// Constraining reference as written in the file, before resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawConstraint {
    pub tag: i64,
    pub index: i64,
}

impl RawConstraint {
    pub const NONE: RawConstraint = RawConstraint {
        tag: TAG_NONE,
        index: -1,
    };
}

/// Raw constraining references, one per constrained element, in creation
/// order.
#[derive(Debug, Default)]
pub(crate) struct PendingConstraints {
    pub vertices: Vec<(VertexId, RawConstraint)>,
    pub edges: Vec<(EdgeId, RawConstraint)>,
    pub triangles: Vec<(FaceId, RawConstraint)>,
    pub quadrilaterals: Vec<(FaceId, RawConstraint)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Variant {
    Regular,
    Constraining,
    Constrained,
}

struct GridBuilder<'a> {
    grid: Grid,
    pending: PendingConstraints,
    options: &'a ReaderOptions,
}

/// Builds the grid described by `grid_node`.
///
/// Child nodes are handled in document order, so attachment values go to
/// the elements created before them and later elements get defaults.
/// Constraints are resolved once all nodes have been read.
pub(crate) fn populate(
    grid_node: &Node,
    options: &ReaderOptions,
    registry: &mut AttachmentRegistry,
) -> Result<(Grid, Vec<ConstraintIssue>)> {
    let mut builder = GridBuilder {
        grid: Grid::new(),
        pending: PendingConstraints::default(),
        options,
    };

    for child in grid_node.children() {
        match child.name() {
            "vertices" => builder.build_vertices(child, false)?,
            "constrained_vertices" => builder.build_vertices(child, true)?,
            "edges" => builder.build_edges(child, Variant::Regular)?,
            "constraining_edges" => builder.build_edges(child, Variant::Constraining)?,
            "constrained_edges" => builder.build_edges(child, Variant::Constrained)?,
            "triangles" => builder.build_faces(child, Variant::Regular, FaceShape::Triangle)?,
            "constraining_triangles" => {
                builder.build_faces(child, Variant::Constraining, FaceShape::Triangle)?;
            }
            "constrained_triangles" => {
                builder.build_faces(child, Variant::Constrained, FaceShape::Triangle)?;
            }
            "quadrilaterals" => {
                builder.build_faces(child, Variant::Regular, FaceShape::Quadrilateral)?;
            }
            "constraining_quadrilaterals" => {
                builder.build_faces(child, Variant::Constraining, FaceShape::Quadrilateral)?;
            }
            "constrained_quadrilaterals" => {
                builder.build_faces(child, Variant::Constrained, FaceShape::Quadrilateral)?;
            }
            "tetrahedrons" => builder.build_volumes(child, VolumeShape::Tetrahedron)?,
            "hexahedrons" => builder.build_volumes(child, VolumeShape::Hexahedron)?,
            "prisms" => builder.build_volumes(child, VolumeShape::Prism)?,
            "pyramids" => builder.build_volumes(child, VolumeShape::Pyramid)?,
            "octahedrons" => builder.build_volumes(child, VolumeShape::Octahedron)?,
            name => match ElementKind::from_attachment_node(name) {
                Some(kind) => read_attachment(&mut builder.grid, child, kind, registry)?,
                None => debug!(node = name, "not an element node, skipped"),
            },
        }
    }

    let GridBuilder {
        mut grid, pending, ..
    } = builder;
    let issues = resolve_constraints(&mut grid, pending);
    Ok((grid, issues))
}

impl GridBuilder<'_> {
    fn build_vertices(&mut self, node: &Node, constrained: bool) -> Result<()> {
        let src_coords = node
            .attribute("coords")
            .and_then(|c| c.trim().parse::<usize>().ok())
            .filter(|&c| c > 0)
            .ok_or_else(|| StructureError::InvalidCoordinateCount {
                node: node.name().to_owned(),
            })?;
        let dest_coords = self.options.position_dim();

        let mut tokens = TokenStream::new(node.text());
        while !tokens.at_end() {
            let Some(position) = read_position(&mut tokens, src_coords, dest_coords) else {
                warn_truncated(node);
                break;
            };
            if constrained {
                let Some((constraint, local_coords)) = read_vertex_constraint(&mut tokens) else {
                    warn_truncated(node);
                    break;
                };
                let id = self
                    .grid
                    .add_vertex(VertexData::constrained(position, local_coords));
                self.pending.vertices.push((id, constraint));
            } else {
                self.grid.add_vertex(VertexData::new(position));
            }
        }
        Ok(())
    }

    fn build_edges(&mut self, node: &Node, variant: Variant) -> Result<()> {
        let mut tokens = TokenStream::new(node.text());
        while !tokens.at_end() {
            let Some((group, constraint)) = read_group::<2>(&mut tokens, variant) else {
                warn_truncated(node);
                break;
            };
            let corners = resolve_corners(&self.grid, node, group)?;
            let kind = match variant {
                Variant::Regular => EdgeKind::Regular,
                Variant::Constraining => EdgeKind::Constraining(ConstrainedSet::default()),
                Variant::Constrained => EdgeKind::Constrained(None),
            };
            let id = self.grid.add_edge(EdgeData::new(corners, kind));
            if let Some(constraint) = constraint {
                self.pending.edges.push((id, constraint));
            }
        }
        Ok(())
    }

    fn build_faces<const N: usize>(
        &mut self,
        node: &Node,
        variant: Variant,
        shape: fn([VertexId; N]) -> FaceShape,
    ) -> Result<()> {
        let mut tokens = TokenStream::new(node.text());
        while !tokens.at_end() {
            let Some((group, constraint)) = read_group::<N>(&mut tokens, variant) else {
                warn_truncated(node);
                break;
            };
            let face_shape = shape(resolve_corners(&self.grid, node, group)?);
            let kind = match variant {
                Variant::Regular => FaceKind::Regular,
                Variant::Constraining => FaceKind::Constraining(ConstrainedSet::default()),
                Variant::Constrained => FaceKind::Constrained(None),
            };
            let id = self.grid.add_face(FaceData::new(face_shape, kind));
            if let Some(constraint) = constraint {
                match face_shape {
                    FaceShape::Triangle(_) => self.pending.triangles.push((id, constraint)),
                    FaceShape::Quadrilateral(_) => {
                        self.pending.quadrilaterals.push((id, constraint));
                    }
                }
            }
        }
        Ok(())
    }

    fn build_volumes<const N: usize>(
        &mut self,
        node: &Node,
        shape: fn([VertexId; N]) -> VolumeShape,
    ) -> Result<()> {
        let mut tokens = TokenStream::new(node.text());
        while !tokens.at_end() {
            let Some((group, _)) = read_group::<N>(&mut tokens, Variant::Regular) else {
                warn_truncated(node);
                break;
            };
            let corners = resolve_corners(&self.grid, node, group)?;
            self.grid.add_volume(VolumeData::new(shape(corners)));
        }
        Ok(())
    }
}

/// Reads `src` coordinates, keeping the first `dest` of them. Components the
/// file does not provide stay zero.
fn read_position(tokens: &mut TokenStream<'_>, src: usize, dest: usize) -> Option<Point3> {
    let mut position = Point3::origin();
    for i in 0..src {
        let value = tokens.next_f64()?;
        if i < dest {
            position[i] = value;
        }
    }
    Some(position)
}

fn read_constraint(tokens: &mut TokenStream<'_>) -> Option<RawConstraint> {
    let tag = tokens.next_i64()?;
    if tag == TAG_NONE {
        return Some(RawConstraint::NONE);
    }
    let index = tokens.next_i64()?;
    Some(RawConstraint { tag, index })
}

/// Reads the constraint of a hanging vertex followed by its local
/// coordinates: one on an edge, two on a face.
fn read_vertex_constraint(tokens: &mut TokenStream<'_>) -> Option<(RawConstraint, [f64; 2])> {
    let constraint = read_constraint(tokens)?;
    let mut local = [0.0; 2];
    let num_local = match constraint.tag {
        TAG_EDGE => 1,
        TAG_FACE => 2,
        _ => 0,
    };
    for slot in local.iter_mut().take(num_local) {
        *slot = tokens.next_f64()?;
    }
    Some((constraint, local))
}

fn read_group<const N: usize>(
    tokens: &mut TokenStream<'_>,
    variant: Variant,
) -> Option<([i64; N], Option<RawConstraint>)> {
    let group = tokens.next_group::<N>()?;
    let constraint = match variant {
        Variant::Constrained => Some(read_constraint(tokens)?),
        Variant::Regular | Variant::Constraining => None,
    };
    Some((group, constraint))
}

fn resolve_corners<const N: usize>(
    grid: &Grid,
    node: &Node,
    group: [i64; N],
) -> std::result::Result<[VertexId; N], StructureError> {
    let mut corners = [VertexId::default(); N];
    for (corner, index) in corners.iter_mut().zip(group) {
        *corner = usize::try_from(index)
            .ok()
            .and_then(|i| grid.vertex_at(i))
            .ok_or_else(|| StructureError::InvalidVertexIndex {
                node: node.name().to_owned(),
                index,
                num_vertices: grid.num_vertices(),
            })?;
    }
    Ok(corners)
}

fn warn_truncated(node: &Node) {
    warn!(node = node.name(), "incomplete or malformed trailing data ignored");
}
