//! Serializes grids and their containers back into the UGX format.
//!
//! Elements are written grouped by node kind, so their file indices follow
//! write order rather than creation order. Every reference (corner vertices,
//! constraining elements, subset and selector bodies, attachment values) is
//! renumbered accordingly.

use std::fmt::{self, Write as _};
use std::path::Path;

use slotmap::{Key, SecondaryMap};
use tracing::warn;

use crate::attachment::{AttachmentColumn, ElementKind};
use crate::error::{DocumentError, Result};
use crate::reader::{TAG_EDGE, TAG_FACE, TAG_NONE};
use crate::selection::Selector;
use crate::subset::{SubsetHandler, SubsetState};
use crate::topology::{
    ConstrainingRef, EdgeData, EdgeId, EdgeKind, ElementId, FaceData, FaceId, FaceKind, FaceShape,
    Grid, VertexData, VertexId, VertexKind, VolumeData, VolumeId, VolumeShape,
};

const VERTEX_NODES: [&str; 2] = ["vertices", "constrained_vertices"];
const EDGE_NODES: [&str; 3] = ["edges", "constraining_edges", "constrained_edges"];
const FACE_NODES: [&str; 6] = [
    "triangles",
    "constraining_triangles",
    "constrained_triangles",
    "quadrilaterals",
    "constraining_quadrilaterals",
    "constrained_quadrilaterals",
];
const VOLUME_NODES: [&str; 5] = ["tetrahedrons", "hexahedrons", "prisms", "pyramids", "octahedrons"];

/// One grid to be written, with the containers that go along with it.
#[derive(Debug)]
pub struct GridSection<'a> {
    grid: &'a Grid,
    name: String,
    coords: usize,
    subset_handlers: Vec<(String, &'a SubsetHandler)>,
    selectors: Vec<(String, &'a Selector)>,
}

impl<'a> GridSection<'a> {
    /// Number of coordinates written per vertex, clamped to 1..=3.
    pub fn coords(&mut self, coords: usize) -> &mut Self {
        self.coords = coords.clamp(1, 3);
        self
    }

    pub fn add_subset_handler(&mut self, name: impl Into<String>, sh: &'a SubsetHandler) -> &mut Self {
        self.subset_handlers.push((name.into(), sh));
        self
    }

    pub fn add_selector(&mut self, name: impl Into<String>, selector: &'a Selector) -> &mut Self {
        self.selectors.push((name.into(), selector));
        self
    }
}

/// Builds a UGX document from one or more grids.
///
/// The document is produced through [`fmt::Display`]:
///
/// ```ignore
/// let mut writer = GridWriter::new();
/// writer.add_grid(&grid, "mesh").add_subset_handler("defSH", &sh);
/// let text = writer.to_string();
/// ```
#[derive(Debug, Default)]
pub struct GridWriter<'a> {
    sections: Vec<GridSection<'a>>,
}

impl<'a> GridWriter<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a grid and returns its section for adding containers.
    pub fn add_grid(&mut self, grid: &'a Grid, name: impl Into<String>) -> &mut GridSection<'a> {
        let index = self.sections.len();
        self.sections.push(GridSection {
            grid,
            name: name.into(),
            coords: 3,
            subset_handlers: Vec::new(),
            selectors: Vec::new(),
        });
        &mut self.sections[index]
    }

    /// Writes the document to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Io`] if the file cannot be written.
    pub fn write_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_string()).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }
}

impl fmt::Display for GridWriter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, r#"<?xml version="1.0" encoding="utf-8"?>"#)?;
        for section in &self.sections {
            write_section(f, section)?;
        }
        Ok(())
    }
}

/// Write order of one element kind, split by node.
struct Sections<'g, Id: Key, T, const N: usize> {
    lists: [Vec<(Id, &'g T)>; N],
    index: SecondaryMap<Id, usize>,
}

impl<'g, Id: Key, T, const N: usize> Sections<'g, Id, T, N> {
    fn new(items: impl Iterator<Item = (Id, &'g T, usize)>) -> Self {
        let mut lists: [Vec<(Id, &'g T)>; N] = std::array::from_fn(|_| Vec::new());
        for (id, data, section) in items {
            lists[section].push((id, data));
        }
        let index = lists
            .iter()
            .flatten()
            .enumerate()
            .map(|(i, &(id, _))| (id, i))
            .collect();
        Self { lists, index }
    }

    fn ordered(&self, wrap: fn(Id) -> ElementId) -> Vec<ElementId> {
        self.lists.iter().flatten().map(|&(id, _)| wrap(id)).collect()
    }
}

/// Elements of one grid in write order.
///
/// Elements whose corners are not vertices of the grid are left out, so
/// every index handed out here refers to something that is written.
struct Numbering<'g> {
    vertices: Sections<'g, VertexId, VertexData, 2>,
    edges: Sections<'g, EdgeId, EdgeData, 3>,
    faces: Sections<'g, FaceId, FaceData, 6>,
    volumes: Sections<'g, VolumeId, VolumeData, 5>,
}

impl<'g> Numbering<'g> {
    fn new(grid: &'g Grid) -> Self {
        Self {
            vertices: Sections::new(grid.vertices().map(|(id, v)| {
                (id, v, usize::from(matches!(v.kind, VertexKind::Constrained(_))))
            })),
            edges: Sections::new(
                grid.edges()
                    .filter(|(_, e)| corners_known(grid, ElementKind::Edge, &e.vertices))
                    .map(|(id, e)| (id, e, edge_section(&e.kind))),
            ),
            faces: Sections::new(
                grid.faces()
                    .filter(|(_, f)| corners_known(grid, ElementKind::Face, f.vertices()))
                    .map(|(id, f)| {
                        let offset = match f.shape {
                            FaceShape::Triangle(_) => 0,
                            FaceShape::Quadrilateral(_) => 3,
                        };
                        (id, f, offset + face_section(&f.kind))
                    }),
            ),
            volumes: Sections::new(
                grid.volumes()
                    .filter(|(_, v)| corners_known(grid, ElementKind::Volume, v.vertices()))
                    .map(|(id, v)| {
                        let section = match v.shape {
                            VolumeShape::Tetrahedron(_) => 0,
                            VolumeShape::Hexahedron(_) => 1,
                            VolumeShape::Prism(_) => 2,
                            VolumeShape::Pyramid(_) => 3,
                            VolumeShape::Octahedron(_) => 4,
                        };
                        (id, v, section)
                    }),
            ),
        }
    }

    fn file_index(&self, element: ElementId) -> Option<usize> {
        match element {
            ElementId::Vertex(id) => self.vertices.index.get(id),
            ElementId::Edge(id) => self.edges.index.get(id),
            ElementId::Face(id) => self.faces.index.get(id),
            ElementId::Volume(id) => self.volumes.index.get(id),
        }
        .copied()
    }

    /// Elements of `kind` in write order.
    fn ordered(&self, kind: ElementKind) -> Vec<ElementId> {
        match kind {
            ElementKind::Vertex => self.vertices.ordered(ElementId::Vertex),
            ElementKind::Edge => self.edges.ordered(ElementId::Edge),
            ElementKind::Face => self.faces.ordered(ElementId::Face),
            ElementKind::Volume => self.volumes.ordered(ElementId::Volume),
        }
    }

    fn write_vertices(&self, out: &mut String, ids: &[VertexId]) -> fmt::Result {
        for &v in ids {
            if let Some(i) = self.vertices.index.get(v) {
                write!(out, "{i} ")?;
            }
        }
        Ok(())
    }

    /// Writes the tag and index of `owner` and returns the number of local
    /// coordinates a hanging vertex carries with it. An owner that is not
    /// written becomes `-1`.
    fn write_constraint(
        &self,
        out: &mut String,
        owner: Option<ConstrainingRef>,
    ) -> std::result::Result<usize, fmt::Error> {
        let resolved = match owner {
            Some(ConstrainingRef::Edge(e)) => self.edges.index.get(e).map(|&i| (TAG_EDGE, i, 1)),
            Some(ConstrainingRef::Face(f)) => self.faces.index.get(f).map(|&i| (TAG_FACE, i, 2)),
            None => None,
        };
        match resolved {
            Some((tag, index, num_local)) => {
                write!(out, "{tag} {index} ")?;
                Ok(num_local)
            }
            None => {
                if owner.is_some() {
                    warn!("constraining element is not written, reference dropped");
                }
                write!(out, "{TAG_NONE} ")?;
                Ok(0)
            }
        }
    }
}

/// `true` if every corner is a vertex of `grid`.
fn corners_known(grid: &Grid, kind: ElementKind, corners: &[VertexId]) -> bool {
    let known = corners.iter().all(|&v| grid.vertex(v).is_ok());
    if !known {
        warn!(%kind, "element refers to a vertex outside its grid, not written");
    }
    known
}

fn edge_section(kind: &EdgeKind) -> usize {
    match kind {
        EdgeKind::Regular => 0,
        EdgeKind::Constraining(_) => 1,
        EdgeKind::Constrained(_) => 2,
    }
}

fn face_section(kind: &FaceKind) -> usize {
    match kind {
        FaceKind::Regular => 0,
        FaceKind::Constraining(_) => 1,
        FaceKind::Constrained(_) => 2,
    }
}

fn write_section(f: &mut fmt::Formatter<'_>, section: &GridSection<'_>) -> fmt::Result {
    let grid = section.grid;
    let numbering = Numbering::new(grid);

    writeln!(f, r#"<grid name="{}">"#, escape(&section.name))?;

    for (node, items) in VERTEX_NODES.iter().zip(&numbering.vertices.lists) {
        if items.is_empty() {
            continue;
        }
        let mut body = String::new();
        for &(_, vertex) in items {
            for i in 0..section.coords {
                write!(body, "{} ", vertex.position[i])?;
            }
            if let VertexKind::Constrained(c) = &vertex.kind {
                let num_local = numbering.write_constraint(&mut body, c.constraining)?;
                for l in &c.local_coords[..num_local] {
                    write!(body, "{l} ")?;
                }
            }
        }
        write_node(f, node, &format!(r#" coords="{}""#, section.coords), &body)?;
    }

    for (node, items) in EDGE_NODES.iter().zip(&numbering.edges.lists) {
        if items.is_empty() {
            continue;
        }
        let mut body = String::new();
        for &(_, edge) in items {
            numbering.write_vertices(&mut body, &edge.vertices)?;
            if let EdgeKind::Constrained(owner) = edge.kind {
                numbering.write_constraint(&mut body, owner)?;
            }
        }
        write_node(f, node, "", &body)?;
    }

    for (node, items) in FACE_NODES.iter().zip(&numbering.faces.lists) {
        if items.is_empty() {
            continue;
        }
        let mut body = String::new();
        for &(_, face) in items {
            numbering.write_vertices(&mut body, face.vertices())?;
            if let FaceKind::Constrained(owner) = face.kind {
                numbering.write_constraint(&mut body, owner)?;
            }
        }
        write_node(f, node, "", &body)?;
    }

    for (node, items) in VOLUME_NODES.iter().zip(&numbering.volumes.lists) {
        if items.is_empty() {
            continue;
        }
        let mut body = String::new();
        for &(_, volume) in items {
            numbering.write_vertices(&mut body, volume.vertices())?;
        }
        write_node(f, node, "", &body)?;
    }

    for (kind, name, column) in grid.attachments() {
        write_attachment(f, grid, &numbering, kind, name, column)?;
    }

    for (name, sh) in &section.subset_handlers {
        write_subset_handler(f, &numbering, name, sh)?;
    }
    for (name, selector) in &section.selectors {
        write_selector(f, &numbering, name, selector)?;
    }

    writeln!(f, "</grid>")
}

/// Writes one value per written element of `kind`, using the column default
/// for slots the column does not hold.
fn write_attachment(
    f: &mut fmt::Formatter<'_>,
    grid: &Grid,
    numbering: &Numbering<'_>,
    kind: ElementKind,
    name: &str,
    column: &AttachmentColumn,
) -> fmt::Result {
    let creation_index: std::collections::HashMap<_, _> = (0..grid.num_elements(kind))
        .filter_map(|i| grid.element_at(kind, i).map(|e| (e, i)))
        .collect();

    let mut body = String::new();
    for element in numbering.ordered(kind) {
        let value = creation_index
            .get(&element)
            .map_or(&column.default, |&i| column.get_or_default(i));
        write!(body, "{value} ")?;
    }
    let attrs = format!(
        r#" name="{}" type="{}" passOn="{}" global="1""#,
        escape(name),
        escape(&column.type_name),
        u8::from(column.pass_on)
    );
    write_node(f, kind.attachment_node(), &attrs, &body)
}

fn write_subset_handler(
    f: &mut fmt::Formatter<'_>,
    numbering: &Numbering<'_>,
    name: &str,
    sh: &SubsetHandler,
) -> fmt::Result {
    writeln!(f, r#"<subset_handler name="{}">"#, escape(name))?;
    for (index, info) in sh.subset_infos().iter().enumerate() {
        let [r, g, b, a] = info.color;
        writeln!(
            f,
            r#"<subset name="{}" color="{r} {g} {b} {a}" state="{}">"#,
            escape(&info.name),
            info.state.0 & !SubsetState::INITIALIZED
        )?;
        for kind in ElementKind::ALL {
            let mut body = String::new();
            for element in numbering.ordered(kind) {
                if sh.subset_of(element) == Some(index) {
                    if let Some(i) = numbering.file_index(element) {
                        write!(body, "{i} ")?;
                    }
                }
            }
            if !body.is_empty() {
                write_node(f, kind.plural(), "", &body)?;
            }
        }
        writeln!(f, "</subset>")?;
    }
    writeln!(f, "</subset_handler>")
}

fn write_selector(
    f: &mut fmt::Formatter<'_>,
    numbering: &Numbering<'_>,
    name: &str,
    selector: &Selector,
) -> fmt::Result {
    writeln!(f, r#"<selector name="{}">"#, escape(name))?;
    for kind in ElementKind::ALL {
        let mut body = String::new();
        for element in numbering.ordered(kind) {
            if let (Some(state), Some(i)) = (selector.state(element), numbering.file_index(element)) {
                write!(body, "{i} {state} ")?;
            }
        }
        if !body.is_empty() {
            write_node(f, kind.plural(), "", &body)?;
        }
    }
    writeln!(f, "</selector>")
}

fn write_node(f: &mut fmt::Formatter<'_>, name: &str, attrs: &str, body: &str) -> fmt::Result {
    writeln!(f, "<{name}{attrs}>{}</{name}>", body.trim_end())
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::attachment::{AttachmentRegistry, AttachmentValue};
    use crate::math::Point3;
    use crate::reader::GridReader;

    const HANGING: &str = r#"<grid name="hanging &amp; friends">
<vertices coords="2">0 0 2 0 2 2 0 2</vertices>
<constrained_vertices coords="2">1 0 1 0 0.5</constrained_vertices>
<edges>1 2 2 3 3 0</edges>
<constraining_edges>0 1</constraining_edges>
<constrained_edges>0 4 1 3 4 1 1 3</constrained_edges>
<triangles>0 4 3</triangles>
<quadrilaterals>4 1 2 3</quadrilaterals>
<vertex_attachment name="height" type="double" global="1">0.25 1 2 3 4</vertex_attachment>
<face_attachment name="marker" type="int" global="1" passOn="1">7 8</face_attachment>
<subset_handler name="defSH">
<subset name="left" color="1 0 0 1" state="0"><faces>0</faces></subset>
<subset name="right" color="0 1 0 1" state="1"><faces>1</faces><vertices>4</vertices></subset>
</subset_handler>
<selector name="sel"><edges>3 2</edges><vertices>0 1</vertices></selector>
</grid>"#;

    fn load(text: &str) -> GridReader {
        let mut reader = GridReader::parse_str(text).unwrap();
        reader.load_grid(0, &mut AttachmentRegistry::new()).unwrap();
        reader
    }

    fn write_loaded(reader: &GridReader, grid: &Grid, coords: usize) -> String {
        let sh = reader.subset_handler(0, 0).unwrap();
        let sel = reader.selector(0, 0).unwrap();
        let mut writer = GridWriter::new();
        writer
            .add_grid(grid, reader.grid_name(0).unwrap())
            .coords(coords)
            .add_subset_handler("defSH", &sh)
            .add_selector("sel", &sel);
        writer.to_string()
    }

    #[test]
    fn round_trip_preserves_grid() {
        let reader = load(HANGING);
        let grid = reader.grid(0).unwrap();
        let text = write_loaded(&reader, grid, 2);

        let again = load(&text);
        assert!(again.constraint_issues(0).unwrap().is_empty());
        let reloaded = again.grid(0).unwrap();

        assert_eq!(again.grid_name(0).unwrap(), "hanging & friends");
        for kind in ElementKind::ALL {
            assert_eq!(reloaded.num_elements(kind), grid.num_elements(kind), "{kind}");
        }
        let positions = |g: &Grid| g.vertices().map(|(_, v)| v.position).collect::<Vec<_>>();
        assert_eq!(positions(reloaded), positions(grid));
        assert_eq!(
            reloaded.vertex(reloaded.vertex_at(4).unwrap()).unwrap().position,
            Point3::new(1.0, 0.0, 0.0)
        );

        // written text is stable under a second round trip
        assert_eq!(write_loaded(&again, reloaded, 2), text);

        let sh = again.subset_handler(0, 0).unwrap();
        assert_eq!(sh.subset_info(1).unwrap().name, "right");
        assert!(!sh.subset_info(1).unwrap().state.is_visible());
        assert_eq!(
            sh.subset_of(ElementId::Vertex(reloaded.vertex_at(4).unwrap())),
            Some(1)
        );
        let marker = reloaded.attachment(ElementKind::Face, "marker").unwrap();
        assert!(marker.pass_on);
        assert_eq!(marker.values, vec![AttachmentValue::Int(7), AttachmentValue::Int(8)]);
    }

    #[test]
    fn constraints_survive_renumbering() {
        let text = r#"<grid name="g">
<vertices coords="1">0 2</vertices>
<constrained_vertices coords="1">1 1 1 0.5</constrained_vertices>
<constrained_edges>0 2 1 1</constrained_edges>
<constraining_edges>0 1</constraining_edges>
</grid>"#;
        let mut reader = GridReader::parse_str(text).unwrap();
        let grid = reader.load_grid(0, &mut AttachmentRegistry::new()).unwrap();
        // constraining edges are written first: the owner moves from index
        // 1 to 0 and the constrained edge from 0 to 1
        let mut writer = GridWriter::new();
        writer.add_grid(grid, "g").coords(1);
        let written = writer.to_string();
        assert!(written.contains("<constraining_edges>0 1</constraining_edges>"));
        assert!(written.contains("<constrained_edges>0 2 1 0</constrained_edges>"));
        assert!(written.contains(r#"<constrained_vertices coords="1">1 1 0 0.5</constrained_vertices>"#));

        let mut again = GridReader::parse_str(&written).unwrap();
        let reloaded = again.load_grid(0, &mut AttachmentRegistry::new()).unwrap();
        let owner = reloaded.edge(reloaded.edge_at(0).unwrap()).unwrap();
        let set = owner.constrained_set().unwrap();
        assert_eq!(set.edges, vec![reloaded.edge_at(1).unwrap()]);
        assert_eq!(set.vertices, vec![reloaded.vertex_at(2).unwrap()]);
    }

    #[test]
    fn attachment_values_follow_write_order() {
        let text = r#"<grid>
<vertices coords="1">0 1 2</vertices>
<constrained_edges>0 1 -1</constrained_edges>
<edges>1 2</edges>
<edge_attachment name="id" type="int" global="1">10 20</edge_attachment>
</grid>"#;
        let mut reader = GridReader::parse_str(text).unwrap();
        let grid = reader.load_grid(0, &mut AttachmentRegistry::new()).unwrap();
        let mut writer = GridWriter::new();
        writer.add_grid(grid, "");
        let written = writer.to_string();
        assert!(written.contains(r#"<edge_attachment name="id" type="int" passOn="0" global="1">20 10</edge_attachment>"#));
    }

    #[test]
    fn early_attachment_stays_on_its_element() {
        let text = r#"<grid name="g">
<constrained_vertices coords="1">5 -1</constrained_vertices>
<vertex_attachment name="w" type="int" global="1">42</vertex_attachment>
<vertices coords="1">0 1</vertices>
</grid>"#;
        let reader = load(text);
        let grid = reader.grid(0).unwrap();
        let mut writer = GridWriter::new();
        writer.add_grid(grid, "g").coords(1);
        let written = writer.to_string();
        assert!(written.contains(r#"<vertex_attachment name="w" type="int" passOn="0" global="1">0 0 42</vertex_attachment>"#));

        let again = load(&written);
        let reloaded = again.grid(0).unwrap();
        let column = reloaded.attachment(ElementKind::Vertex, "w").unwrap();
        assert_eq!(column.len(), 3);
        for (i, (_, v)) in reloaded.vertices().enumerate() {
            let expected = if v.is_constrained() { 42 } else { 0 };
            assert_eq!(column.get(i), Some(&AttachmentValue::Int(expected)), "vertex {i}");
        }
    }

    #[test]
    fn references_outside_the_grid_are_not_written() {
        let mut other = Grid::new();
        let far: Vec<_> = (0..3)
            .map(|i| other.add_vertex(VertexData::new(Point3::new(f64::from(i), 0.0, 0.0))))
            .collect();
        other.add_edge(EdgeData::new([far[0], far[1]], EdgeKind::Regular));
        other.add_edge(EdgeData::new([far[1], far[2]], EdgeKind::Regular));
        let foreign_edge = other.add_edge(EdgeData::new(
            [far[0], far[2]],
            EdgeKind::Constraining(crate::topology::ConstrainedSet::default()),
        ));

        let mut grid = Grid::new();
        let a = grid.add_vertex(VertexData::new(Point3::origin()));
        let b = grid.add_vertex(VertexData::new(Point3::new(1.0, 0.0, 0.0)));
        grid.add_edge(EdgeData::new(
            [a, b],
            EdgeKind::Constrained(Some(ConstrainingRef::Edge(foreign_edge))),
        ));
        grid.add_edge(EdgeData::new([a, far[2]], EdgeKind::Regular));

        let mut writer = GridWriter::new();
        writer.add_grid(&grid, "g").coords(1);
        let written = writer.to_string();
        assert!(written.contains("<constrained_edges>0 1 -1</constrained_edges>"));
        assert!(!written.contains("<edges>"));

        let mut reader = GridReader::parse_str(&written).unwrap();
        let reloaded = reader.load_grid(0, &mut AttachmentRegistry::new()).unwrap();
        assert_eq!(reloaded.num_edges(), 1);
    }

    #[test]
    fn writes_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.ugx");
        let mut grid = Grid::new();
        grid.add_vertex(VertexData::new(Point3::new(0.5, 0.0, 0.0)));
        let mut writer = GridWriter::new();
        writer.add_grid(&grid, "single");
        writer.write_file(&path).unwrap();

        let mut reader = GridReader::parse_file(&path).unwrap();
        let loaded = reader.load_grid(0, &mut AttachmentRegistry::new()).unwrap();
        assert_eq!(loaded.num_vertices(), 1);
    }
}
