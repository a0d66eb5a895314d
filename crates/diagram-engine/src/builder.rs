//! Fluent builder for constructing diagrams programmatically
//!
//! Builds the element lists directly without going through the model's
//! mutation checks, which makes it easy to construct both valid
//! fixtures and deliberately broken ones for validation tests.

use crate::geometry::{Point, Size};
use crate::model::Diagram;
use crate::types::{Connection, ConnectionStyle, Stage, TaskConfig, TaskNode};

/// Fluent builder for [`Diagram`]
///
/// # Example
///
/// ```ignore
/// let diagram = DiagramBuilder::new()
///     .stage("s1", "Collect", (0.0, 0.0), (400.0, 300.0))
///     .node("t1", "Pull orders", (40.0, 40.0), (160.0, 80.0))
///     .node("t2", "Cleanse", (40.0, 160.0), (160.0, 80.0))
///     .connect("t1", "t2")
///     .build();
/// ```
#[derive(Default)]
pub struct DiagramBuilder {
    stages: Vec<Stage>,
    nodes: Vec<TaskNode>,
    connections: Vec<Connection>,
    connection_counter: usize,
}

impl DiagramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stage
    pub fn stage(
        mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        position: (f64, f64),
        size: (f64, f64),
    ) -> Self {
        self.stages.push(Stage::with_id(
            id,
            name,
            Point::new(position.0, position.1),
            Size::new(size.0, size.1),
        ));
        self
    }

    /// Add a task node
    pub fn node(
        mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        position: (f64, f64),
        size: (f64, f64),
    ) -> Self {
        self.nodes.push(TaskNode::with_id(
            id,
            name,
            Point::new(position.0, position.1),
            Size::new(size.0, size.1),
        ));
        self
    }

    /// Set the configuration of the most recently added node
    ///
    /// Must be called immediately after `node`.
    pub fn with_config(mut self, config: TaskConfig) -> Self {
        if let Some(node) = self.nodes.last_mut() {
            node.config = config;
        }
        self
    }

    /// Connect two nodes (auto-generates the connection id)
    pub fn connect(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.connection_counter += 1;
        self.connections.push(Connection::with_id(
            format!("conn-{}", self.connection_counter),
            source,
            target,
        ));
        self
    }

    /// Connect two nodes with an explicit id and style
    pub fn connect_styled(
        mut self,
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        style: ConnectionStyle,
    ) -> Self {
        self.connections
            .push(Connection::with_id(id, source, target).with_style(style));
        self
    }

    /// Build the diagram with containment computed
    pub fn build(self) -> Diagram {
        let mut diagram = Diagram {
            stages: self.stages,
            nodes: self.nodes,
            connections: self.connections,
            ..Diagram::default()
        };
        diagram.refresh_containment();
        diagram
    }
}
