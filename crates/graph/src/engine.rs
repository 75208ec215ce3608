use log::{debug, info};
use serde::Serialize;

use crate::extract::{extract_links, extract_nodes};
use crate::model::{Graph, Record, RecordStore};
use crate::registry::CategoryRegistry;
use crate::view::{ViewKind, ViewLabels, ViewSpec};

/// Per-layer and per-link-set counts of one assembly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssemblyTrace {
    pub view: ViewKind,
    pub store_key: String,
    /// False when the store had no entry for the view's key.
    pub store_key_present: bool,
    pub records: usize,
    pub layers: Vec<LayerTrace>,
    pub link_sets: Vec<LinkSetTrace>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerTrace {
    pub layer: String,
    pub nodes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkSetTrace {
    pub link_set: String,
    pub links: usize,
    pub invalid: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assembly {
    pub graph: Graph,
    pub trace: AssemblyTrace,
}

/// Assemble the graph of one view from the store.
///
/// Pure: every call starts from a fresh registry and returns a new graph. A
/// store without the view's key assembles as an empty record subset.
pub fn assemble(view: &ViewSpec, store: &RecordStore) -> Assembly {
    let subset = store.get(view.store_key);
    let records: &[Record] = subset.unwrap_or(&[]);

    let mut registry = CategoryRegistry::new();
    let mut graph = Graph::default();
    let mut layers = Vec::with_capacity(view.layers.len());
    let mut link_sets = Vec::with_capacity(view.links.len());

    for layer in &view.layers {
        let nodes = extract_nodes(records, layer, &mut registry);
        debug!("{}: layer '{}' -> {} node(s)", view.kind, layer.name, nodes.len());
        layers.push(LayerTrace {
            layer: layer.name.to_string(),
            nodes: nodes.len(),
        });
        graph.nodes.extend(nodes);
    }

    for spec in &view.links {
        let links = extract_links(records, spec, &mut registry);
        let invalid = links.iter().filter(|l| !l.is_valid()).count();
        debug!(
            "{}: link set '{}' -> {} link(s), {} invalid",
            view.kind,
            spec.name,
            links.len(),
            invalid
        );
        link_sets.push(LinkSetTrace {
            link_set: spec.name.to_string(),
            links: links.len(),
            invalid,
        });
        graph.links.extend(links);
    }

    info!(
        "assembled view '{}' from {} record(s) under '{}': {} node(s), {} link(s)",
        view.kind,
        records.len(),
        view.store_key,
        graph.nodes.len(),
        graph.links.len()
    );

    Assembly {
        graph,
        trace: AssemblyTrace {
            view: view.kind,
            store_key: view.store_key.to_string(),
            store_key_present: subset.is_some(),
            records: records.len(),
            layers,
            link_sets,
        },
    }
}

/// Assemble `kind` with the default labels, returning only the graph.
pub fn assemble_graph(kind: ViewKind, store: &RecordStore) -> Graph {
    assemble(&ViewSpec::new(kind, &ViewLabels::default()), store).graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeId;
    use serde_json::json;

    fn store(key: &str, records: serde_json::Value) -> RecordStore {
        let mut store = RecordStore::new();
        let rows = records
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_object().unwrap().clone())
            .collect();
        store.insert(key, rows);
        store
    }

    #[test]
    fn trace_counts_match_graph() {
        let store = store(
            "student-costs",
            json!([
                {"semester": "Fall", "in-state": 500, "name": "Tuition"},
                {"semester": "Fall", "name": "Housing", "amount": 300},
                {"semester": "Spring", "name": "Books"},
            ]),
        );
        let view = ViewSpec::new(ViewKind::StudentCosts, &ViewLabels::default());
        let assembly = assemble(&view, &store);

        let nodes: usize = assembly.trace.layers.iter().map(|l| l.nodes).sum();
        let links: usize = assembly.trace.link_sets.iter().map(|l| l.links).sum();
        assert_eq!(nodes, assembly.graph.nodes.len());
        assert_eq!(links, assembly.graph.links.len());
        assert_eq!(assembly.trace.records, 3);
        assert!(assembly.trace.store_key_present);
        // Books has no weight field on either link set.
        let invalid: usize = assembly.trace.link_sets.iter().map(|l| l.invalid).sum();
        assert_eq!(invalid, 2);
    }

    #[test]
    fn missing_store_key_is_empty_view() {
        let assembly = assemble(
            &ViewSpec::new(ViewKind::Revenues, &ViewLabels::default()),
            &RecordStore::new(),
        );
        assert!(!assembly.trace.store_key_present);
        assert_eq!(assembly.graph.nodes.len(), 1);
        assert_eq!(assembly.graph.nodes[0].id, NodeId::label("JMU"));
        assert!(assembly.graph.links.is_empty());
    }

    #[test]
    fn node_order_follows_layer_order() {
        let store = store(
            "jmu-revenues",
            json!([
                {"category": "expense", "type": "Salaries", "name": "Faculty", "2023": 10},
                {"category": "income", "type": "Tuition", "name": "Tuition and Fees", "2023": 10},
            ]),
        );
        let graph = assemble_graph(ViewKind::Revenues, &store);
        let layers: Vec<&str> = graph.nodes.iter().map(|n| n.layer.as_str()).collect();
        assert_eq!(
            layers,
            vec!["revenue-item", "revenue-type", "institution", "expense-category", "expense-item"]
        );
    }
}
