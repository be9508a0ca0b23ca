use tracing::{debug, warn};

use crate::attachment::{read_column, AttachmentRegistry, ElementKind};
use crate::document::Node;
use crate::error::AttachmentError;
use crate::topology::Grid;

use super::tokens::TokenStream;

/// Reads an integer flag attribute. Absent or unparsable counts as unset.
fn flag(node: &Node, name: &str) -> bool {
    node.attribute(name)
        .and_then(|v| v.trim().parse::<i64>().ok())
        .is_some_and(|v| v != 0)
}

/// Reads one `*_attachment` node into a column on `grid`.
///
/// Values are assigned to the elements of `kind` that exist when the node is
/// reached. Elements created later get the type's default.
pub(crate) fn read_attachment(
    grid: &mut Grid,
    node: &Node,
    kind: ElementKind,
    registry: &mut AttachmentRegistry,
) -> Result<(), AttachmentError> {
    let name = node
        .attribute("name")
        .ok_or(AttachmentError::MissingAttribute("name"))?;
    let type_name = node
        .attribute("type")
        .ok_or(AttachmentError::MissingAttribute("type"))?;
    let pass_on = flag(node, "passOn");

    if flag(node, "global") && !registry.is_declared(name) {
        if !registry.type_is_registered(type_name) {
            debug!(name, type_name, "global attachment of unregistered type skipped");
            return Ok(());
        }
        registry.declare(name, type_name, pass_on)?;
    }

    let ty = registry.resolve(name, type_name)?;
    let count = grid.num_elements(kind);
    let mut tokens = TokenStream::new(node.text());
    let (column, read) = read_column(ty, &mut tokens, count, pass_on);

    if read < count {
        warn!(
            name,
            %kind,
            expected = count,
            read,
            "attachment body too short, padded with defaults"
        );
    } else {
        let surplus = tokens.drain_count();
        if surplus > 0 {
            warn!(name, %kind, surplus, "attachment body has surplus values");
        }
    }

    grid.attach(kind, name, column);
    Ok(())
}
