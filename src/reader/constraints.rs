//! Links constrained elements to their constraining edges and faces.

use std::fmt;

use tracing::{debug, warn};

use crate::topology::{
    ConstrainedSet, ConstrainingRef, EdgeKind, ElementId, FaceKind, Grid, VertexKind,
};

use super::builders::{PendingConstraints, RawConstraint, TAG_EDGE, TAG_FACE, TAG_NONE};

/// Why a constrained element could not be linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueReason {
    /// The constraining index is outside the edge or face list.
    IndexOutOfRange { available: usize },
    /// The referenced edge or face is not a constraining element.
    NotConstraining,
    /// The tag names a kind that cannot constrain this element.
    UnsupportedTag,
}

/// A constraint reference that was left unresolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstraintIssue {
    pub element: ElementId,
    pub constraint: RawConstraint,
    pub reason: IssueReason,
}

impl fmt::Display for ConstraintIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let RawConstraint { tag, index } = self.constraint;
        let kind = self.element.kind();
        match self.reason {
            IssueReason::IndexOutOfRange { available } => write!(
                f,
                "constrained element of {kind} refers to index {index} (tag {tag}), only {available} exist"
            ),
            IssueReason::NotConstraining => write!(
                f,
                "constrained element of {kind} refers to index {index} (tag {tag}), which is not constraining"
            ),
            IssueReason::UnsupportedTag => {
                write!(f, "constrained element of {kind} has unsupported tag {tag}")
            }
        }
    }
}

/// Resolves every pending reference against the finished grid.
///
/// Successful references are linked in both directions. Failed ones leave
/// the element orphaned and are returned as issues; none of them aborts.
pub(crate) fn resolve_constraints(
    grid: &mut Grid,
    pending: PendingConstraints,
) -> Vec<ConstraintIssue> {
    let PendingConstraints {
        vertices,
        edges,
        triangles,
        quadrilaterals,
    } = pending;

    let elements = vertices
        .into_iter()
        .map(|(id, c)| (ElementId::Vertex(id), c))
        .chain(edges.into_iter().map(|(id, c)| (ElementId::Edge(id), c)))
        .chain(
            triangles
                .into_iter()
                .chain(quadrilaterals)
                .map(|(id, c)| (ElementId::Face(id), c)),
        );

    let mut issues = Vec::new();
    let mut linked = 0usize;
    for (element, constraint) in elements {
        match link(grid, element, constraint) {
            Ok(true) => linked += 1,
            Ok(false) => {}
            Err(reason) => {
                let issue = ConstraintIssue {
                    element,
                    constraint,
                    reason,
                };
                warn!("{issue}");
                issues.push(issue);
            }
        }
    }
    debug!(linked, unresolved = issues.len(), "constraints resolved");
    issues
}

/// Returns `Ok(false)` for elements that carry no reference.
fn link(grid: &mut Grid, element: ElementId, constraint: RawConstraint) -> Result<bool, IssueReason> {
    let owner = match constraint.tag {
        TAG_NONE => return Ok(false),
        TAG_EDGE if !matches!(element, ElementId::Face(_)) => {
            let available = grid.num_edges();
            let id = lookup(constraint.index, |i| grid.edge_at(i))
                .ok_or(IssueReason::IndexOutOfRange { available })?;
            let edge = grid
                .edge_mut(id)
                .map_err(|_| IssueReason::IndexOutOfRange { available })?;
            match &mut edge.kind {
                EdgeKind::Constraining(set) => add_to_set(set, element),
                _ => return Err(IssueReason::NotConstraining),
            }
            ConstrainingRef::Edge(id)
        }
        TAG_FACE => {
            let available = grid.num_faces();
            let id = lookup(constraint.index, |i| grid.face_at(i))
                .ok_or(IssueReason::IndexOutOfRange { available })?;
            let face = grid
                .face_mut(id)
                .map_err(|_| IssueReason::IndexOutOfRange { available })?;
            match &mut face.kind {
                FaceKind::Constraining(set) => add_to_set(set, element),
                _ => return Err(IssueReason::NotConstraining),
            }
            ConstrainingRef::Face(id)
        }
        _ => return Err(IssueReason::UnsupportedTag),
    };
    set_owner(grid, element, owner);
    Ok(true)
}

fn lookup<Id>(index: i64, at: impl FnOnce(usize) -> Option<Id>) -> Option<Id> {
    usize::try_from(index).ok().and_then(at)
}

fn add_to_set(set: &mut ConstrainedSet, element: ElementId) {
    match element {
        ElementId::Vertex(id) => set.vertices.push(id),
        ElementId::Edge(id) => set.edges.push(id),
        ElementId::Face(id) => set.faces.push(id),
        ElementId::Volume(_) => {}
    }
}

fn set_owner(grid: &mut Grid, element: ElementId, owner: ConstrainingRef) {
    match element {
        ElementId::Vertex(id) => {
            if let Ok(vertex) = grid.vertex_mut(id) {
                if let VertexKind::Constrained(c) = &mut vertex.kind {
                    c.constraining = Some(owner);
                }
            }
        }
        ElementId::Edge(id) => {
            if let Ok(edge) = grid.edge_mut(id) {
                edge.kind = EdgeKind::Constrained(Some(owner));
            }
        }
        ElementId::Face(id) => {
            if let Ok(face) = grid.face_mut(id) {
                face.kind = FaceKind::Constrained(Some(owner));
            }
        }
        ElementId::Volume(_) => {}
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::attachment::AttachmentRegistry;
    use crate::document::Document;
    use crate::reader::builders::populate;
    use crate::reader::ReaderOptions;

    fn load(xml: &str) -> (Grid, Vec<ConstraintIssue>) {
        let doc = Document::parse(xml).unwrap();
        populate(
            &doc.top_level()[0],
            &ReaderOptions::default(),
            &mut AttachmentRegistry::new(),
        )
        .unwrap()
    }

    #[test]
    fn hanging_node_is_linked_both_ways() {
        let (grid, issues) = load(
            r#"<grid>
                <vertices coords="2">0 0 2 0</vertices>
                <constrained_vertices coords="2">1 0 1 0 0.5</constrained_vertices>
                <constraining_edges>0 1</constraining_edges>
                <constrained_edges>0 2 1 0  2 1 1 0</constrained_edges>
            </grid>"#,
        );
        assert!(issues.is_empty());

        let owner_id = grid.edge_at(0).unwrap();
        let owner = grid.edge(owner_id).unwrap();
        let set = owner.constrained_set().unwrap();
        assert_eq!(set.vertices, vec![grid.vertex_at(2).unwrap()]);
        assert_eq!(set.edges, vec![grid.edge_at(1).unwrap(), grid.edge_at(2).unwrap()]);

        let hanging = grid.vertex(grid.vertex_at(2).unwrap()).unwrap();
        assert_eq!(hanging.constraining(), Some(ConstrainingRef::Edge(owner_id)));
        for &child in &set.edges {
            assert_eq!(
                grid.edge(child).unwrap().constraining(),
                Some(ConstrainingRef::Edge(owner_id))
            );
        }
    }

    #[test]
    fn constraining_face_owns_triangles_and_quads() {
        let (grid, issues) = load(
            r#"<grid>
                <vertices coords="2">0 0 1 0 1 1 0 1</vertices>
                <constraining_quadrilaterals>0 1 2 3</constraining_quadrilaterals>
                <constrained_triangles>0 1 2 2 0</constrained_triangles>
                <constrained_quadrilaterals>0 1 2 3 2 0</constrained_quadrilaterals>
            </grid>"#,
        );
        assert!(issues.is_empty());
        let owner = grid.face(grid.face_at(0).unwrap()).unwrap();
        assert_eq!(owner.constrained_set().unwrap().faces.len(), 2);
    }

    #[test]
    fn out_of_range_index_is_reported_not_fatal() {
        let (grid, issues) = load(
            r#"<grid>
                <vertices coords="1">0 1</vertices>
                <constrained_edges>0 1 1 7</constrained_edges>
            </grid>"#,
        );
        assert_eq!(grid.num_edges(), 1);
        assert_eq!(issues.len(), 1);
        assert_eq!(
            issues[0].reason,
            IssueReason::IndexOutOfRange { available: 1 }
        );
        assert_eq!(grid.edge(grid.edge_at(0).unwrap()).unwrap().constraining(), None);
    }

    #[test]
    fn regular_target_is_not_constraining() {
        let (_, issues) = load(
            r#"<grid>
                <vertices coords="1">0 1</vertices>
                <edges>0 1</edges>
                <constrained_vertices coords="1">0.5 1 0 0.5</constrained_vertices>
            </grid>"#,
        );
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].reason, IssueReason::NotConstraining);
    }

    #[test]
    fn faces_cannot_hang_on_edges() {
        let (_, issues) = load(
            r#"<grid>
                <vertices coords="2">0 0 1 0 0 1</vertices>
                <constraining_edges>0 1</constraining_edges>
                <constrained_triangles>0 1 2 1 0</constrained_triangles>
            </grid>"#,
        );
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].reason, IssueReason::UnsupportedTag);
        assert!(matches!(issues[0].element, ElementId::Face(_)));
    }

    #[test]
    fn vertex_tag_is_unsupported() {
        let (_, issues) = load(
            r#"<grid>
                <vertices coords="1">0 1</vertices>
                <constrained_edges>0 1 0 0</constrained_edges>
            </grid>"#,
        );
        assert_eq!(issues[0].reason, IssueReason::UnsupportedTag);
        assert!(issues[0].to_string().contains("unsupported tag 0"));
    }
}
