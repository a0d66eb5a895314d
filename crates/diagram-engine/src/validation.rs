//! Publish-readiness validation
//!
//! A stateless pass over a diagram snapshot. Rules are checked in a
//! fixed precedence order and the first failing rule wins: later rules
//! are not evaluated in that pass, so the user is shown exactly one
//! problem at a time, always the most fundamental one.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::containment::compute_containment;
use crate::model::Diagram;
use crate::types::{ElementId, ValidationState};

/// The publish-readiness rules, in precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Rule {
    /// The diagram has at least one task node
    EmptyDiagram,
    /// Every task node has a name and a start mode
    MissingConfig,
    /// Every task node participates in at least one connection
    NoConnection,
    /// When stages exist, every task node is contained by one
    NoContainingStage,
    /// No two task nodes share a name
    DuplicateNodeName,
    /// No two stages share a name
    DuplicateStageName,
    /// Every stage contains at least one task node
    EmptyStage,
}

impl Rule {
    /// The per-element tag the caller applies to offenders
    ///
    /// `EmptyDiagram` and `EmptyStage` describe the diagram shape, not
    /// a fixable property of a node, so they carry no element tag.
    pub fn element_tag(&self) -> Option<ValidationState> {
        match self {
            Rule::EmptyDiagram | Rule::EmptyStage => None,
            Rule::MissingConfig => Some(ValidationState::MissingConfig),
            Rule::NoConnection => Some(ValidationState::NoConnection),
            Rule::NoContainingStage => Some(ValidationState::NoContainingStage),
            Rule::DuplicateNodeName | Rule::DuplicateStageName => {
                Some(ValidationState::DuplicateName)
            }
        }
    }

    /// One user-facing message per failed publish attempt
    pub fn message(&self) -> &'static str {
        match self {
            Rule::EmptyDiagram => "Add at least one task before publishing",
            Rule::MissingConfig => "Some tasks are missing a name or start mode",
            Rule::NoConnection => "Some tasks are not connected to the pipeline",
            Rule::NoContainingStage => "Some tasks are not placed inside a stage",
            Rule::DuplicateNodeName => "Task names must be unique",
            Rule::DuplicateStageName => "Stage names must be unique",
            Rule::EmptyStage => "Every stage must contain at least one task",
        }
    }
}

/// Outcome of a validation pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ValidationReport {
    /// All rules hold; the diagram may be published
    Ready,
    /// The first failing rule and the exact offending elements
    #[serde(rename_all = "camelCase")]
    Blocked {
        rule: Rule,
        offenders: Vec<ElementId>,
    },
}

impl ValidationReport {
    pub fn is_ready(&self) -> bool {
        matches!(self, ValidationReport::Ready)
    }

    /// Flag the offending elements on the diagram for UI highlighting
    pub fn apply(&self, diagram: &mut Diagram) {
        if let ValidationReport::Blocked { rule, offenders } = self {
            if let Some(tag) = rule.element_tag() {
                let tags: Vec<(ElementId, ValidationState)> =
                    offenders.iter().map(|id| (id.clone(), tag)).collect();
                diagram.set_validation_states(&tags);
            }
        }
    }
}

/// Validate a diagram snapshot against the publish rules
pub fn validate(diagram: &Diagram) -> ValidationReport {
    if diagram.nodes.is_empty() {
        return ValidationReport::Blocked {
            rule: Rule::EmptyDiagram,
            offenders: Vec::new(),
        };
    }

    let incomplete: Vec<ElementId> = diagram
        .nodes
        .iter()
        .filter(|n| n.name.trim().is_empty() || !n.config.is_complete())
        .map(|n| n.id.clone())
        .collect();
    if !incomplete.is_empty() {
        return ValidationReport::Blocked {
            rule: Rule::MissingConfig,
            offenders: incomplete,
        };
    }

    let unconnected: Vec<ElementId> = diagram
        .nodes
        .iter()
        .filter(|n| diagram.connections_of(&n.id).next().is_none())
        .map(|n| n.id.clone())
        .collect();
    if !unconnected.is_empty() {
        return ValidationReport::Blocked {
            rule: Rule::NoConnection,
            offenders: unconnected,
        };
    }

    // Containment rules only apply once stages are in play
    if !diagram.stages.is_empty() {
        let owners = compute_containment(&diagram.stages, &diagram.nodes);
        let unplaced: Vec<ElementId> = diagram
            .nodes
            .iter()
            .filter(|n| !owners.contains_key(&n.id))
            .map(|n| n.id.clone())
            .collect();
        if !unplaced.is_empty() {
            return ValidationReport::Blocked {
                rule: Rule::NoContainingStage,
                offenders: unplaced,
            };
        }
    }

    let duplicate_nodes = duplicates(diagram.nodes.iter().map(|n| (n.name.as_str(), &n.id)));
    if !duplicate_nodes.is_empty() {
        return ValidationReport::Blocked {
            rule: Rule::DuplicateNodeName,
            offenders: duplicate_nodes,
        };
    }

    let duplicate_stages = duplicates(diagram.stages.iter().map(|s| (s.name.as_str(), &s.id)));
    if !duplicate_stages.is_empty() {
        return ValidationReport::Blocked {
            rule: Rule::DuplicateStageName,
            offenders: duplicate_stages,
        };
    }

    if !diagram.stages.is_empty() {
        let owners = compute_containment(&diagram.stages, &diagram.nodes);
        let empty_stages: Vec<ElementId> = diagram
            .stages
            .iter()
            .filter(|s| !owners.values().any(|owner| owner == &s.id))
            .map(|s| s.id.clone())
            .collect();
        if !empty_stages.is_empty() {
            return ValidationReport::Blocked {
                rule: Rule::EmptyStage,
                offenders: empty_stages,
            };
        }
    }

    ValidationReport::Ready
}

/// Ids of elements whose name occurs more than once
fn duplicates<'a>(names: impl Iterator<Item = (&'a str, &'a ElementId)>) -> Vec<ElementId> {
    let mut by_name: HashMap<&str, Vec<&ElementId>> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for (name, id) in names {
        let entry = by_name.entry(name).or_default();
        if entry.is_empty() {
            order.push(name);
        }
        entry.push(id);
    }
    order
        .into_iter()
        .filter(|name| by_name[name].len() > 1)
        .flat_map(|name| by_name[name].iter().map(|id| (*id).clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::DiagramBuilder;
    use crate::types::{StartMode, TaskConfig};

    fn configured() -> TaskConfig {
        TaskConfig {
            start_mode: Some(StartMode::Scheduled),
            ..TaskConfig::default()
        }
    }

    /// A fully valid two-node pipeline inside one stage
    fn ready_diagram() -> Diagram {
        DiagramBuilder::new()
            .stage("s1", "Collect", (0.0, 0.0), (600.0, 400.0))
            .node("a", "Pull orders", (40.0, 40.0), (160.0, 80.0))
            .with_config(configured())
            .node("b", "Cleanse", (40.0, 200.0), (160.0, 80.0))
            .with_config(configured())
            .connect("a", "b")
            .build()
    }

    #[test]
    fn test_ready_diagram_passes() {
        assert_eq!(validate(&ready_diagram()), ValidationReport::Ready);
    }

    #[test]
    fn test_empty_diagram_fails_first() {
        let diagram = DiagramBuilder::new()
            .stage("s1", "Collect", (0.0, 0.0), (600.0, 400.0))
            .build();
        assert_eq!(
            validate(&diagram),
            ValidationReport::Blocked {
                rule: Rule::EmptyDiagram,
                offenders: vec![],
            }
        );
    }

    #[test]
    fn test_missing_config_flags_offending_nodes() {
        let diagram = DiagramBuilder::new()
            .node("a", "Pull orders", (0.0, 0.0), (160.0, 80.0))
            .with_config(configured())
            .node("b", "Cleanse", (0.0, 200.0), (160.0, 80.0))
            .connect("a", "b")
            .build();
        assert_eq!(
            validate(&diagram),
            ValidationReport::Blocked {
                rule: Rule::MissingConfig,
                offenders: vec!["b".to_string()],
            }
        );
    }

    #[test]
    fn test_blank_name_is_missing_config() {
        let diagram = DiagramBuilder::new()
            .node("a", "  ", (0.0, 0.0), (160.0, 80.0))
            .with_config(configured())
            .build();
        let report = validate(&diagram);
        assert_eq!(
            report,
            ValidationReport::Blocked {
                rule: Rule::MissingConfig,
                offenders: vec!["a".to_string()],
            }
        );
    }

    #[test]
    fn test_unconnected_nodes_fire_before_stage_rules() {
        // Two configured but unconnected nodes, no stage: rule 3 fires,
        // rule 4 is never reached
        let diagram = DiagramBuilder::new()
            .node("a", "Pull orders", (0.0, 0.0), (160.0, 80.0))
            .with_config(configured())
            .node("b", "Cleanse", (0.0, 200.0), (160.0, 80.0))
            .with_config(configured())
            .build();
        assert_eq!(
            validate(&diagram),
            ValidationReport::Blocked {
                rule: Rule::NoConnection,
                offenders: vec!["a".to_string(), "b".to_string()],
            }
        );
    }

    #[test]
    fn test_no_containing_stage_only_when_stages_exist() {
        let diagram = DiagramBuilder::new()
            .stage("s1", "Collect", (0.0, 0.0), (300.0, 300.0))
            .node("a", "Pull orders", (40.0, 40.0), (160.0, 80.0))
            .with_config(configured())
            .node("b", "Cleanse", (900.0, 900.0), (160.0, 80.0))
            .with_config(configured())
            .connect("a", "b")
            .build();
        assert_eq!(
            validate(&diagram),
            ValidationReport::Blocked {
                rule: Rule::NoContainingStage,
                offenders: vec!["b".to_string()],
            }
        );
    }

    #[test]
    fn test_duplicate_node_names_flag_all_holders() {
        let diagram = DiagramBuilder::new()
            .node("a", "Task", (0.0, 0.0), (160.0, 80.0))
            .with_config(configured())
            .node("b", "Task", (0.0, 200.0), (160.0, 80.0))
            .with_config(configured())
            .connect("a", "b")
            .build();
        assert_eq!(
            validate(&diagram),
            ValidationReport::Blocked {
                rule: Rule::DuplicateNodeName,
                offenders: vec!["a".to_string(), "b".to_string()],
            }
        );
    }

    #[test]
    fn test_duplicate_stage_names() {
        // Two stages named "Collect", each holding a connected node
        let diagram = DiagramBuilder::new()
            .stage("s1", "Collect", (0.0, 0.0), (600.0, 400.0))
            .stage("s2", "Collect", (700.0, 0.0), (600.0, 400.0))
            .node("a", "Pull orders", (40.0, 40.0), (160.0, 80.0))
            .with_config(configured())
            .node("b", "Cleanse", (740.0, 40.0), (160.0, 80.0))
            .with_config(configured())
            .connect("a", "b")
            .build();
        assert_eq!(
            validate(&diagram),
            ValidationReport::Blocked {
                rule: Rule::DuplicateStageName,
                offenders: vec!["s1".to_string(), "s2".to_string()],
            }
        );
    }

    #[test]
    fn test_empty_stage_fails_last() {
        // All node-level rules pass; only the empty second stage blocks
        let diagram = DiagramBuilder::new()
            .stage("s1", "Collect", (0.0, 0.0), (600.0, 400.0))
            .stage("s2", "Deliver", (700.0, 0.0), (600.0, 400.0))
            .node("a", "Pull orders", (40.0, 40.0), (160.0, 80.0))
            .with_config(configured())
            .node("b", "Cleanse", (40.0, 200.0), (160.0, 80.0))
            .with_config(configured())
            .connect("a", "b")
            .build();
        assert_eq!(
            validate(&diagram),
            ValidationReport::Blocked {
                rule: Rule::EmptyStage,
                offenders: vec!["s2".to_string()],
            }
        );
    }

    #[test]
    fn test_apply_tags_offenders() {
        let mut diagram = DiagramBuilder::new()
            .node("a", "Task", (0.0, 0.0), (160.0, 80.0))
            .with_config(configured())
            .node("b", "Task", (0.0, 200.0), (160.0, 80.0))
            .with_config(configured())
            .connect("a", "b")
            .build();
        let report = validate(&diagram);
        report.apply(&mut diagram);
        assert_eq!(
            diagram.find_node("a").unwrap().validation_state,
            ValidationState::DuplicateName
        );
        assert_eq!(
            diagram.find_node("b").unwrap().validation_state,
            ValidationState::DuplicateName
        );
    }

    #[test]
    fn test_apply_without_element_tag_is_a_noop() {
        let mut diagram = DiagramBuilder::new()
            .stage("s1", "Collect", (0.0, 0.0), (600.0, 400.0))
            .build();
        let report = validate(&diagram);
        assert!(matches!(
            report,
            ValidationReport::Blocked { rule: Rule::EmptyDiagram, .. }
        ));
        report.apply(&mut diagram);
        assert_eq!(
            diagram.find_stage("s1").unwrap().validation_state,
            ValidationState::Normal
        );
    }
}
