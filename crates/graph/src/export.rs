//! Handoff to the layout side.

use serde::Serialize;

use crate::model::{Graph, NodeId};

/// A layout engine consumes a finished graph by shared reference and returns
/// its own geometry. It cannot mutate the graph it was given.
pub trait LayoutEngine {
    type Layout;
    type Error;

    fn layout(&self, graph: &Graph) -> Result<Self::Layout, Self::Error>;
}

/// Node shape expected by a d3-sankey layout configured with `nodeId(d => d.name)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SankeyNode {
    pub name: NodeId,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SankeyLink {
    pub source: NodeId,
    pub target: NodeId,
    pub value: Option<f64>,
}

/// The `{nodes: [{name, title}], links: [{source, target, value}]}` document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SankeyDocument {
    pub nodes: Vec<SankeyNode>,
    pub links: Vec<SankeyLink>,
}

impl SankeyDocument {
    pub fn from_graph(graph: &Graph) -> Self {
        Self {
            nodes: graph
                .nodes
                .iter()
                .map(|n| SankeyNode {
                    name: n.id.clone(),
                    title: n.label.clone(),
                })
                .collect(),
            links: graph
                .links
                .iter()
                .map(|l| SankeyLink {
                    source: l.source.clone(),
                    target: l.target.clone(),
                    value: l.weight,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Link, Node};
    use serde_json::json;

    #[test]
    fn d3_shape_uses_name_title_value() {
        let graph = Graph {
            nodes: vec![
                Node {
                    id: NodeId::label("JMU"),
                    label: "JMU".into(),
                    layer: "institution".into(),
                },
                Node {
                    id: NodeId::Index(1),
                    label: "Salaries".into(),
                    layer: "expense-category".into(),
                },
            ],
            links: vec![Link::weighted(NodeId::label("JMU"), NodeId::Index(1), 42.0)],
        };
        let doc = serde_json::to_value(SankeyDocument::from_graph(&graph)).unwrap();
        assert_eq!(
            doc,
            json!({
                "nodes": [{"name": "JMU", "title": "JMU"}, {"name": 1, "title": "Salaries"}],
                "links": [{"source": "JMU", "target": 1, "value": 42.0}]
            })
        );
    }

    struct CountingLayout;

    impl LayoutEngine for CountingLayout {
        type Layout = (usize, usize);
        type Error = String;

        fn layout(&self, graph: &Graph) -> Result<Self::Layout, Self::Error> {
            if graph.nodes.is_empty() {
                return Err("empty graph".into());
            }
            Ok((graph.nodes.len(), graph.links.len()))
        }
    }

    #[test]
    fn layout_borrows_graph() {
        let graph = Graph {
            nodes: vec![Node {
                id: NodeId::label("Comprehensive Fee"),
                label: "Comprehensive Fee".into(),
                layer: "fee".into(),
            }],
            links: vec![],
        };
        let before = graph.clone();
        assert_eq!(CountingLayout.layout(&graph), Ok((1, 0)));
        assert_eq!(graph, before);
        assert!(CountingLayout.layout(&Graph::default()).is_err());
    }
}
