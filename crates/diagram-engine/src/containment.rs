//! Stage ownership derived from geometry
//!
//! A task node belongs to a stage only when its bounding box is fully
//! inside the stage's bounding box. Partial overlap is visually
//! ambiguous and never counts. When overlapping stages both enclose a
//! node, the earliest-created stage wins; stages are kept in creation
//! order, so that is the first match in the slice.

use std::collections::HashMap;

use crate::geometry::Rect;
use crate::types::{NodeId, Stage, StageId, TaskNode};

/// Compute the owning stage of every contained task node
///
/// Nodes enclosed by no stage are absent from the result.
pub fn compute_containment(stages: &[Stage], nodes: &[TaskNode]) -> HashMap<NodeId, StageId> {
    let mut owners = HashMap::new();
    for node in nodes {
        let node_rect = node.rect();
        if let Some(stage) = stages.iter().find(|s| s.rect().contains_rect(&node_rect)) {
            owners.insert(node.id.clone(), stage.id.clone());
        }
    }
    owners
}

/// Smallest rect enclosing the given stage rect and all of its
/// contained nodes' rects
///
/// Used when a stage is resized below its content: the stage grows
/// back to enclose its nodes instead of evicting them.
pub fn enclosing_rect<'a>(
    requested: Rect,
    contained: impl Iterator<Item = &'a TaskNode>,
) -> Rect {
    contained.fold(requested, |acc, node| acc.union(&node.rect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, Size};

    fn stage(id: &str, x: f64, y: f64, w: f64, h: f64) -> Stage {
        Stage::with_id(id, id, Point::new(x, y), Size::new(w, h))
    }

    fn node(id: &str, x: f64, y: f64, w: f64, h: f64) -> TaskNode {
        TaskNode::with_id(id, id, Point::new(x, y), Size::new(w, h))
    }

    #[test]
    fn test_fully_inside_is_contained() {
        let stages = vec![stage("s1", 0.0, 0.0, 400.0, 300.0)];
        let nodes = vec![node("t1", 50.0, 50.0, 120.0, 60.0)];
        let owners = compute_containment(&stages, &nodes);
        assert_eq!(owners.get("t1"), Some(&"s1".to_string()));
    }

    #[test]
    fn test_partial_overlap_is_not_contained() {
        let stages = vec![stage("s1", 0.0, 0.0, 400.0, 300.0)];
        // Sticks out past the right edge of the stage
        let nodes = vec![node("t1", 350.0, 50.0, 120.0, 60.0)];
        let owners = compute_containment(&stages, &nodes);
        assert!(owners.is_empty());
    }

    #[test]
    fn test_outside_is_not_contained() {
        let stages = vec![stage("s1", 0.0, 0.0, 400.0, 300.0)];
        let nodes = vec![node("t1", 600.0, 600.0, 120.0, 60.0)];
        let owners = compute_containment(&stages, &nodes);
        assert!(owners.is_empty());
    }

    #[test]
    fn test_nested_stages_first_created_wins() {
        // s2 is nested inside s1; both fully enclose the node
        let stages = vec![
            stage("s1", 0.0, 0.0, 800.0, 600.0),
            stage("s2", 10.0, 10.0, 400.0, 300.0),
        ];
        let nodes = vec![node("t1", 50.0, 50.0, 120.0, 60.0)];
        let owners = compute_containment(&stages, &nodes);
        assert_eq!(owners.get("t1"), Some(&"s1".to_string()));
    }

    #[test]
    fn test_no_stages_means_no_containment() {
        let nodes = vec![node("t1", 0.0, 0.0, 120.0, 60.0)];
        let owners = compute_containment(&[], &nodes);
        assert!(owners.is_empty());
    }

    #[test]
    fn test_enclosing_rect_grows_to_content() {
        let requested = Rect::new(Point::new(0.0, 0.0), Size::new(100.0, 100.0));
        let nodes = vec![node("t1", 50.0, 50.0, 200.0, 100.0)];
        let grown = enclosing_rect(requested, nodes.iter());
        assert!(grown.contains_rect(&nodes[0].rect()));
        assert_eq!(grown.size.width, 250.0);
        assert_eq!(grown.size.height, 150.0);
    }
}
