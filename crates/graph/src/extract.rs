use std::collections::HashSet;

use crate::accessor::{self, Weight};
use crate::model::{Link, Node, NodeId, Record, WeightIssue};
use crate::registry::CategoryRegistry;
use crate::view::{Endpoint, FanDirection, IdPolicy, LayerSource, LayerSpec, LinkShape, LinkSpec};

/// Emit the nodes of one layer, deduplicated by the layer key in first-occurrence order.
///
/// Records missing the key are left out of the layer.
pub fn extract_nodes(records: &[Record], layer: &LayerSpec, registry: &mut CategoryRegistry) -> Vec<Node> {
    let node = |label: &str, registry: &mut CategoryRegistry| Node {
        id: resolve_id(&layer.ids, label, registry),
        label: label.to_string(),
        layer: layer.name.to_string(),
    };

    match &layer.source {
        LayerSource::Anchor { label } => vec![node(label, registry)],
        LayerSource::Fixed { labels } => labels.iter().map(|l| node(l, registry)).collect(),
        LayerSource::Records { filter, key } => {
            let mut seen = HashSet::new();
            let mut nodes = Vec::new();
            for record in records.iter().filter(|r| filter.matches(r)) {
                let Some(label) = accessor::text(record, key) else {
                    continue;
                };
                if seen.insert(label.clone()) {
                    nodes.push(node(&label, registry));
                }
            }
            nodes
        }
    }
}

/// Emit the links of one link set.
///
/// With `dedup` set, only the first record per dedup value contributes; later
/// records with the same value are dropped, not summed.
pub fn extract_links(records: &[Record], spec: &LinkSpec, registry: &mut CategoryRegistry) -> Vec<Link> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut links = Vec::new();

    for record in records.iter().filter(|r| spec.filter.matches(r)) {
        let dedup_key = match &spec.dedup {
            Some(field) => match accessor::text(record, field) {
                Some(key) if seen.contains(&key) => continue,
                Some(key) => Some(key),
                None => continue,
            },
            None => None,
        };

        let emitted = match &spec.shape {
            LinkShape::Direct { source, target, weight } => {
                let Some(source) = resolve_endpoint(source, record, registry) else {
                    continue;
                };
                let Some(target) = resolve_endpoint(target, record, registry) else {
                    continue;
                };
                links.push(weighted_link(source, target, record, weight));
                true
            }
            LinkShape::FanOut {
                record: end,
                programs,
                program_ids,
                direction,
            } => {
                let Some(record_id) = resolve_endpoint(end, record, registry) else {
                    continue;
                };
                for program in programs {
                    let program_id = resolve_id(program_ids, &program.label, registry);
                    let (source, target) = match direction {
                        FanDirection::ProgramToRecord => (program_id, record_id.clone()),
                        FanDirection::RecordToProgram => (record_id.clone(), program_id),
                    };
                    match accessor::weight(record, &program.fields) {
                        Weight::Value { value, .. } if value > 0.0 => {
                            links.push(Link::weighted(source, target, value));
                        }
                        Weight::Value { .. } | Weight::Absent => {}
                        Weight::NonNumeric { field, value } => {
                            links.push(Link::invalid(
                                source,
                                target,
                                WeightIssue::NonNumeric { field, value },
                            ));
                        }
                    }
                }
                true
            }
        };

        if let (true, Some(key)) = (emitted, dedup_key) {
            seen.insert(key);
        }
    }

    links
}

fn resolve_id(ids: &IdPolicy, label: &str, registry: &mut CategoryRegistry) -> NodeId {
    match ids {
        IdPolicy::Label => NodeId::label(label),
        IdPolicy::Sequential { sequence, base } => NodeId::Index(registry.allocate(sequence, *base, label)),
    }
}

fn resolve_endpoint(end: &Endpoint, record: &Record, registry: &mut CategoryRegistry) -> Option<NodeId> {
    match end {
        Endpoint::Node(id) => Some(id.clone()),
        Endpoint::Field { key, ids } => {
            let label = accessor::text(record, key)?;
            Some(resolve_id(ids, &label, registry))
        }
    }
}

fn weighted_link(source: NodeId, target: NodeId, record: &Record, aliases: &[String]) -> Link {
    match accessor::weight(record, aliases) {
        Weight::Value { value, .. } if value >= 0.0 => Link::weighted(source, target, value),
        Weight::Value { field, value } => Link::invalid(source, target, WeightIssue::Negative { field, value }),
        Weight::Absent => Link::invalid(
            source,
            target,
            WeightIssue::Absent {
                fields: aliases.to_vec(),
            },
        ),
        Weight::NonNumeric { field, value } => {
            Link::invalid(source, target, WeightIssue::NonNumeric { field, value })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{sport_programs, Membership, ViewKind, ViewLabels, ViewSpec};
    use serde_json::{json, Value};

    fn recs(v: Value) -> Vec<Record> {
        v.as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_object().unwrap().clone())
            .collect()
    }

    fn ids(nodes: &[Node]) -> Vec<NodeId> {
        nodes.iter().map(|n| n.id.clone()).collect()
    }

    #[test]
    fn records_layer_dedups_in_first_seen_order() {
        let view = ViewSpec::new(ViewKind::StudentCosts, &ViewLabels::default());
        let records = recs(json!([
            {"semester": "Spring", "name": "Tuition"},
            {"semester": "Fall", "name": "Tuition"},
            {"name": "Parking"},
            {"semester": "Spring", "name": "Books"},
        ]));
        let mut reg = CategoryRegistry::new();
        let semesters = extract_nodes(&records, &view.layers[1], &mut reg);
        assert_eq!(ids(&semesters), vec![NodeId::label("Spring"), NodeId::label("Fall")]);
        let items = extract_nodes(&records, &view.layers[2], &mut reg);
        assert_eq!(ids(&items), vec![NodeId::label("Tuition"), NodeId::label("Books")]);
        assert!(items.iter().all(|n| n.layer == "itemized"));
    }

    #[test]
    fn anchor_ignores_records() {
        let view = ViewSpec::new(ViewKind::ComprehensiveFee, &ViewLabels::default());
        let mut reg = CategoryRegistry::new();
        let nodes = extract_nodes(&[], &view.layers[0], &mut reg);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].id, NodeId::label("Comprehensive Fee"));
    }

    #[test]
    fn sequential_layer_feeds_registry() {
        let view = ViewSpec::new(ViewKind::Revenues, &ViewLabels::default());
        let records = recs(json!([
            {"category": "expense", "type": "Salaries", "name": "Faculty", "2023": 10},
            {"category": "expense", "type": "Utilities", "name": "Power", "2023": 4},
            {"category": "expense", "type": "Salaries", "name": "Staff", "2023": 6},
        ]));
        let mut reg = CategoryRegistry::new();
        let categories = extract_nodes(&records, &view.layers[3], &mut reg);
        assert_eq!(ids(&categories), vec![NodeId::Index(1), NodeId::Index(2)]);
        assert_eq!(categories[1].label, "Utilities");

        let links = extract_links(&records, &view.links[3], &mut reg);
        let sources: Vec<_> = links.iter().map(|l| l.source.clone()).collect();
        assert_eq!(sources, vec![NodeId::Index(1), NodeId::Index(2), NodeId::Index(1)]);
        assert_eq!(reg.allocated("expense-category"), 2);
    }

    #[test]
    fn direct_dedup_keeps_first_weight() {
        let view = ViewSpec::new(ViewKind::StudentCosts, &ViewLabels::default());
        let records = recs(json!([
            {"semester": "Fall", "name": "Tuition", "in-state": 500},
            {"semester": "Fall", "name": "Housing", "amount": 300},
        ]));
        let mut reg = CategoryRegistry::new();
        let links = extract_links(&records, &view.links[0], &mut reg);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].weight, Some(500.0));
    }

    #[test]
    fn absent_weight_is_flagged_not_zeroed() {
        let view = ViewSpec::new(ViewKind::ComprehensiveFee, &ViewLabels::default());
        let records = recs(json!([{"subtype": "Athletics"}]));
        let mut reg = CategoryRegistry::new();
        let links = extract_links(&records, &view.links[0], &mut reg);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].weight, None);
        assert_eq!(
            links[0].issue,
            Some(WeightIssue::Absent { fields: vec!["amount".into()] })
        );
    }

    #[test]
    fn negative_weight_is_flagged() {
        let view = ViewSpec::new(ViewKind::ComprehensiveFee, &ViewLabels::default());
        let records = recs(json!([{"subtype": "Refund", "amount": -20}]));
        let mut reg = CategoryRegistry::new();
        let links = extract_links(&records, &view.links[0], &mut reg);
        assert!(matches!(links[0].issue, Some(WeightIssue::Negative { value, .. }) if value == -20.0));
    }

    #[test]
    fn fan_out_skips_non_positive_programs() {
        let view = ViewSpec::new(ViewKind::Athletics, &ViewLabels::default());
        let records = recs(json!([
            {"type": "Operating Expenses", "name": "Travel",
             "Football": 0, "Men's Basketball": 1200, "Women's Basketball": -5},
        ]));
        let mut reg = CategoryRegistry::new();
        extract_nodes(&records, &view.layers[3], &mut reg);
        extract_nodes(&records, &view.layers[4], &mut reg);
        let links = extract_links(&records, &view.links[3], &mut reg);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].source, NodeId::Index(1));
        assert_eq!(links[0].target, NodeId::Index(101));
        assert_eq!(links[0].weight, Some(1200.0));
    }

    #[test]
    fn fan_out_reads_program_aliases() {
        let spec = LinkSpec {
            name: "program-revenue",
            filter: Membership::HasField("name".into()),
            dedup: None,
            shape: LinkShape::FanOut {
                record: Endpoint::Field { key: "name".into(), ids: IdPolicy::Label },
                programs: sport_programs(),
                program_ids: IdPolicy::Label,
                direction: FanDirection::ProgramToRecord,
            },
        };
        let records = recs(json!([{"name": "Tickets", "Other Sports": 75, "Football": "n/a"}]));
        let mut reg = CategoryRegistry::new();
        let links = extract_links(&records, &spec, &mut reg);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].source, NodeId::label("Football"));
        assert!(!links[0].is_valid());
        assert_eq!(links[1].source, NodeId::label("Other sports"));
        assert_eq!(links[1].target, NodeId::label("Tickets"));
        assert_eq!(links[1].weight, Some(75.0));
    }

    #[test]
    fn missing_endpoint_excludes_record_without_consuming_key() {
        let view = ViewSpec::new(ViewKind::Revenues, &ViewLabels::default());
        let records = recs(json!([
            {"category": "income", "name": "Pell", "2023": 5},
            {"category": "income", "name": "Pell", "type": "Grants", "2023": 7},
        ]));
        let mut reg = CategoryRegistry::new();
        let links = extract_links(&records, &view.links[0], &mut reg);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].target, NodeId::label("Grants"));
        assert_eq!(links[0].weight, Some(7.0));
    }
}
