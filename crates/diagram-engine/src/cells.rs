//! Persisted cell schema
//!
//! A diagram is stored as one JSON array of heterogeneous cell
//! records, each tagged by `shape`. This is the only format with
//! compatibility requirements: fields this build does not recognize
//! inside a cell's `data` payload must survive a load/save round-trip
//! verbatim, so newer consoles can add config fields without older
//! ones destroying them.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geometry::{Point, Size};
use crate::model::Diagram;
use crate::types::{Connection, ConnectionStyle, Stage, TaskConfig, TaskNode};

/// One persisted diagram element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "camelCase")]
pub enum Cell {
    #[serde(rename_all = "camelCase")]
    Stage {
        id: String,
        name: String,
        position: Point,
        size: Size,
    },
    #[serde(rename_all = "camelCase")]
    Task {
        id: String,
        name: String,
        position: Point,
        size: Size,
        data: TaskConfig,
    },
    #[serde(rename_all = "camelCase")]
    Connection {
        id: String,
        source: String,
        target: String,
        data: ConnectionData,
    },
}

/// Payload of a connection cell
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionData {
    #[serde(default)]
    pub style: ConnectionStyle,
    /// Unrecognized additive fields, preserved verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Serialize a diagram to its ordered cell list
///
/// Stages come first in creation order (the containment tie-break
/// depends on it), then task nodes, then connections.
pub fn to_cells(diagram: &Diagram) -> Vec<Cell> {
    let mut cells = Vec::with_capacity(
        diagram.stages.len() + diagram.nodes.len() + diagram.connections.len(),
    );
    for stage in &diagram.stages {
        cells.push(Cell::Stage {
            id: stage.id.clone(),
            name: stage.name.clone(),
            position: stage.position,
            size: stage.size,
        });
    }
    for node in &diagram.nodes {
        cells.push(Cell::Task {
            id: node.id.clone(),
            name: node.name.clone(),
            position: node.position,
            size: node.size,
            data: node.config.clone(),
        });
    }
    for connection in &diagram.connections {
        cells.push(Cell::Connection {
            id: connection.id.clone(),
            source: connection.source.clone(),
            target: connection.target.clone(),
            data: ConnectionData {
                style: connection.style,
                extra: serde_json::Map::new(),
            },
        });
    }
    cells
}

/// Rebuild a diagram from a persisted cell list
///
/// A connection whose endpoint no longer resolves to a task node is
/// dropped with a warning instead of failing the whole load; such a
/// record can only come from a corrupted blob, since dangling
/// connections are rejected before they are ever persisted.
pub fn from_cells(cells: Vec<Cell>) -> Diagram {
    let mut diagram = Diagram::new();
    let mut pending_connections = Vec::new();
    for cell in cells {
        match cell {
            Cell::Stage { id, name, position, size } => {
                diagram.stages.push(Stage::with_id(id, name, position, size));
            }
            Cell::Task { id, name, position, size, data } => {
                diagram
                    .nodes
                    .push(TaskNode::with_id(id, name, position, size).with_config(data));
            }
            Cell::Connection { id, source, target, data } => {
                pending_connections.push(
                    Connection::with_id(id, source, target).with_style(data.style),
                );
            }
        }
    }
    for connection in pending_connections {
        let resolves = |end: &str| diagram.nodes.iter().any(|n| n.id == end);
        if resolves(&connection.source) && resolves(&connection.target) {
            diagram.connections.push(connection);
        } else {
            log::warn!(
                "dropping connection '{}' with dangling endpoint ({} -> {})",
                connection.id,
                connection.source,
                connection.target
            );
        }
    }
    diagram.refresh_containment();
    diagram
}

/// Encode a diagram to the persisted `content` string
pub fn encode_content(diagram: &Diagram) -> Result<String> {
    Ok(serde_json::to_string(&to_cells(diagram))?)
}

/// Decode the persisted `content` string into a diagram
///
/// An empty string is a freshly issued workflow with no cells yet.
pub fn decode_content(content: &str) -> Result<Diagram> {
    if content.trim().is_empty() {
        return Ok(Diagram::new());
    }
    let cells: Vec<Cell> = serde_json::from_str(content)?;
    Ok(from_cells(cells))
}
