//! Owned tree of markup nodes.
//!
//! UGX files may hold several top-level `grid` elements, which strict XML
//! does not allow. The text is therefore wrapped into a synthetic root before
//! it is handed to `roxmltree`, and the resulting tree is copied into owned
//! [`Node`]s so that grid entries can outlive the parser's borrow of the text.

use crate::error::DocumentError;

const SYNTHETIC_ROOT: &str = "ugx_document";

/// A markup element with its attributes, text and child elements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Node>,
}

impl Node {
    /// Creates a node without attributes, text or children.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Element name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value of the first attribute called `name`.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Concatenated text directly below this element.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// All child elements in document order.
    #[must_use]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Child elements called `name`, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// First child element called `name`.
    #[must_use]
    pub fn first_child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Returns `true` if a child element called `name` exists.
    #[must_use]
    pub fn has_child(&self, name: &str) -> bool {
        self.first_child(name).is_some()
    }

    fn from_element(element: roxmltree::Node<'_, '_>) -> Self {
        let mut node = Node::new(element.tag_name().name());
        node.attributes = element
            .attributes()
            .map(|a| (a.name().to_owned(), a.value().to_owned()))
            .collect();
        for child in element.children() {
            if child.is_element() {
                node.children.push(Node::from_element(child));
            } else if child.is_text() {
                if let Some(text) = child.text() {
                    node.text.push_str(text);
                }
            }
        }
        node
    }
}

/// A parsed document. Its top-level elements are usually `grid` nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    root: Node,
}

impl Document {
    /// Parses markup text into an owned tree.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Markup`] if the text is not well-formed.
    pub fn parse(text: &str) -> Result<Self, DocumentError> {
        let body = strip_prolog(text);
        let wrapped = format!("<{SYNTHETIC_ROOT}>{body}</{SYNTHETIC_ROOT}>");
        let parsed = roxmltree::Document::parse(&wrapped)?;
        Ok(Self {
            root: Node::from_element(parsed.root_element()),
        })
    }

    /// Top-level elements in document order.
    #[must_use]
    pub fn top_level(&self) -> &[Node] {
        self.root.children()
    }
}

/// Drops a leading byte-order mark and `<?xml ...?>` declaration, which may
/// not appear inside the synthetic root.
fn strip_prolog(text: &str) -> &str {
    let text = text.trim_start_matches('\u{feff}').trim_start();
    if text.starts_with("<?xml") {
        if let Some(end) = text.find("?>") {
            return &text[end + 2..];
        }
    }
    text
}
