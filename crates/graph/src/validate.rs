use std::collections::HashSet;

use log::warn;
use serde::Serialize;

use crate::model::{Graph, NodeId, WeightIssue};

/// A link endpoint with no matching node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DanglingRef {
    pub link: usize,
    pub id: NodeId,
    pub end: LinkEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkEnd {
    Source,
    Target,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvalidLink {
    pub link: usize,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue: Option<WeightIssue>,
}

/// Inflow and outflow of a hub node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HubBalance {
    pub hub: NodeId,
    pub inflow: f64,
    pub outflow: f64,
    pub delta: f64,
}

impl HubBalance {
    pub fn is_balanced(&self, tolerance: f64) -> bool {
        self.delta.abs() <= tolerance
    }
}

/// Structural validation of an assembled graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphReport {
    pub nodes: usize,
    pub links: usize,
    pub duplicate_ids: Vec<NodeId>,
    pub dangling: Vec<DanglingRef>,
    pub invalid_links: Vec<InvalidLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hub: Option<HubBalance>,
}

impl GraphReport {
    /// No duplicate ids, no dangling references, no invalid links.
    pub fn is_valid(&self) -> bool {
        self.duplicate_ids.is_empty() && self.dangling.is_empty() && self.invalid_links.is_empty()
    }

    /// True when there is no hub or the hub balances within `tolerance`.
    pub fn is_conserved(&self, tolerance: f64) -> bool {
        self.hub.as_ref().map_or(true, |h| h.is_balanced(tolerance))
    }
}

/// Check uniqueness, referential integrity and weight validity; balance `hub` if given.
pub fn validate(graph: &Graph, hub: Option<&NodeId>) -> GraphReport {
    let mut ids: HashSet<&NodeId> = HashSet::new();
    let mut duplicate_ids = Vec::new();
    for node in &graph.nodes {
        if !ids.insert(&node.id) && !duplicate_ids.contains(&node.id) {
            warn!("duplicate node id {}", node.id);
            duplicate_ids.push(node.id.clone());
        }
    }

    let mut dangling = Vec::new();
    let mut invalid_links = Vec::new();
    for (i, link) in graph.links.iter().enumerate() {
        for (end, id) in [(LinkEnd::Source, &link.source), (LinkEnd::Target, &link.target)] {
            if !ids.contains(id) {
                warn!("link {i} references missing node {id}");
                dangling.push(DanglingRef {
                    link: i,
                    id: id.clone(),
                    end,
                });
            }
        }
        if !link.is_valid() {
            invalid_links.push(InvalidLink {
                link: i,
                source: link.source.clone(),
                target: link.target.clone(),
                issue: link.issue.clone(),
            });
        }
    }

    GraphReport {
        nodes: graph.nodes.len(),
        links: graph.links.len(),
        duplicate_ids,
        dangling,
        invalid_links,
        hub: hub.map(|h| hub_balance(graph, h)),
    }
}

/// Sum of valid link weights into and out of `hub`.
pub fn hub_balance(graph: &Graph, hub: &NodeId) -> HubBalance {
    let inflow: f64 = graph
        .links_to(hub)
        .filter(|l| l.is_valid())
        .filter_map(|l| l.weight)
        .sum();
    let outflow: f64 = graph
        .links_from(hub)
        .filter(|l| l.is_valid())
        .filter_map(|l| l.weight)
        .sum();
    HubBalance {
        hub: hub.clone(),
        inflow,
        outflow,
        delta: inflow - outflow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Link, Node};

    fn node(id: NodeId, label: &str) -> Node {
        Node {
            id,
            label: label.into(),
            layer: "test".into(),
        }
    }

    #[test]
    fn clean_graph_is_valid() {
        let graph = Graph {
            nodes: vec![node("A".into(), "A"), node(1.into(), "B")],
            links: vec![Link::weighted("A".into(), 1.into(), 5.0)],
        };
        let report = validate(&graph, None);
        assert!(report.is_valid());
        assert!(report.is_conserved(0.0));
        assert_eq!(report.nodes, 2);
        assert_eq!(report.links, 1);
    }

    #[test]
    fn reports_duplicates_once() {
        let graph = Graph {
            nodes: vec![
                node("Tuition".into(), "Tuition"),
                node("Tuition".into(), "Tuition"),
                node("Tuition".into(), "Tuition"),
            ],
            links: vec![],
        };
        let report = validate(&graph, None);
        assert_eq!(report.duplicate_ids, vec![NodeId::label("Tuition")]);
        assert!(!report.is_valid());
    }

    #[test]
    fn reports_dangling_ends() {
        let graph = Graph {
            nodes: vec![node("JMU".into(), "JMU")],
            links: vec![Link::weighted("JMU".into(), 7.into(), 1.0)],
        };
        let report = validate(&graph, None);
        assert_eq!(
            report.dangling,
            vec![DanglingRef {
                link: 0,
                id: NodeId::Index(7),
                end: LinkEnd::Target,
            }]
        );
    }

    #[test]
    fn invalid_links_are_excluded_from_balance() {
        let graph = Graph {
            nodes: vec![node("a".into(), "a"), node("hub".into(), "hub"), node("b".into(), "b")],
            links: vec![
                Link::weighted("a".into(), "hub".into(), 10.0),
                Link::invalid(
                    "a".into(),
                    "hub".into(),
                    WeightIssue::Absent { fields: vec!["Total".into()] },
                ),
                Link::weighted("hub".into(), "b".into(), 9.5),
            ],
        };
        let report = validate(&graph, Some(&NodeId::label("hub")));
        assert_eq!(report.invalid_links.len(), 1);
        let hub = report.hub.as_ref().unwrap();
        assert_eq!(hub.inflow, 10.0);
        assert_eq!(hub.outflow, 9.5);
        assert!(!report.is_conserved(0.1));
        assert!(report.is_conserved(0.5));
    }
}
