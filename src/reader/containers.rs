//! Readers for the subset handlers, selectors and projection handlers that
//! sit next to a grid's geometry.

use tracing::warn;

use crate::attachment::ElementKind;
use crate::document::Node;
use crate::error::ContainerError;
use crate::projection::{ProjectionHandler, ProjectorFactory};
use crate::selection::Selector;
use crate::subset::{SubsetHandler, SubsetState};
use crate::topology::{ElementId, Grid};

use super::tokens::TokenStream;

pub(crate) fn read_subset_handler(grid: &Grid, node: &Node) -> Result<SubsetHandler, ContainerError> {
    let mut handler = SubsetHandler::new();

    for (subset, subset_node) in node.children_named("subset").enumerate() {
        let info = handler.subset_info_mut(subset);
        if let Some(name) = subset_node.attribute("name") {
            name.clone_into(&mut info.name);
        }
        if let Some(color) = subset_node.attribute("color") {
            let mut tokens = TokenStream::new(color);
            for channel in &mut info.color {
                match tokens.next_value::<f32>() {
                    Some(c) => *channel = c,
                    None => break,
                }
            }
        }
        if let Some(state) = subset_node
            .attribute("state")
            .and_then(|s| s.trim().parse::<u32>().ok())
        {
            info.state = SubsetState(state);
        }
        info.state.insert(SubsetState::INITIALIZED);

        for kind in ElementKind::ALL {
            for body in subset_node.children_named(kind.plural()) {
                let mut tokens = TokenStream::new(body.text());
                while !tokens.at_end() {
                    let Some(index) = tokens.next_i64() else {
                        warn!(node = body.name(), "malformed subset index, rest of list ignored");
                        break;
                    };
                    let element = element_at(grid, body, kind, index)?;
                    handler.assign(element, subset);
                }
            }
        }
    }
    Ok(handler)
}

pub(crate) fn read_selector(grid: &Grid, node: &Node) -> Result<Selector, ContainerError> {
    let mut selector = Selector::new();
    for kind in ElementKind::ALL {
        for body in node.children_named(kind.plural()) {
            let mut tokens = TokenStream::new(body.text());
            while !tokens.at_end() {
                let (Some(index), Some(state)) = (tokens.next_i64(), tokens.next_value::<i32>())
                else {
                    warn!(node = body.name(), "incomplete selection entry, rest of list ignored");
                    break;
                };
                let element = element_at(grid, body, kind, index)?;
                selector.select(element, state);
            }
        }
    }
    Ok(selector)
}

/// Reads the projectors of a projection handler. Projectors that cannot be
/// decoded are skipped with a warning.
pub(crate) fn read_projection_handler(node: &Node, factory: &ProjectorFactory) -> ProjectionHandler {
    let mut handler = ProjectionHandler::new(subset_handler_index(node));

    if let Some(default) = node.first_child("default") {
        match default.attribute("type") {
            Some(type_name) => match factory.create(type_name, default.text()) {
                Ok(projector) => handler.set_default_projector(projector),
                Err(err) => warn!(%err, "default projector skipped"),
            },
            None => warn!("default projector without type skipped"),
        }
    }

    for projector in node.children_named("projector") {
        let Some(type_name) = projector.attribute("type") else {
            warn!("projector without type skipped");
            continue;
        };
        let Some(subset) = projector
            .attribute("subset")
            .and_then(|s| s.trim().parse::<usize>().ok())
        else {
            warn!(type_name, "projector without valid subset skipped");
            continue;
        };
        match factory.create(type_name, projector.text()) {
            Ok(p) => handler.set_projector(subset, p),
            Err(err) => warn!(subset, %err, "projector skipped"),
        }
    }
    handler
}

/// The `subset_handler` attribute of a projection handler node, 0 if absent.
pub(crate) fn subset_handler_index(node: &Node) -> usize {
    node.attribute("subset_handler")
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0)
}

fn element_at(grid: &Grid, body: &Node, kind: ElementKind, index: i64) -> Result<ElementId, ContainerError> {
    usize::try_from(index)
        .ok()
        .and_then(|i| grid.element_at(kind, i))
        .ok_or_else(|| ContainerError::BadElementIndex {
            node: body.name().to_owned(),
            index,
            available: grid.num_elements(kind),
        })
}
