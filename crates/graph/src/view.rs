//! The four fixed views, expressed as static layer and link tables.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::accessor;
use crate::error::FlowError;
use crate::model::{NodeId, Record};

// ---------------------------------------------------------------------------
// View selection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewKind {
    StudentCosts,
    ComprehensiveFee,
    Revenues,
    Athletics,
}

impl ViewKind {
    pub const ALL: [ViewKind; 4] = [
        Self::StudentCosts,
        Self::ComprehensiveFee,
        Self::Revenues,
        Self::Athletics,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Self::StudentCosts => "student-costs",
            Self::ComprehensiveFee => "comprehensive-fee",
            Self::Revenues => "revenues",
            Self::Athletics => "athletics",
        }
    }

    /// Top-level key of the record store this view reads.
    pub fn store_key(&self) -> &'static str {
        match self {
            Self::StudentCosts | Self::ComprehensiveFee => "student-costs",
            Self::Revenues => "jmu-revenues",
            Self::Athletics => "jmu-athletics",
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for ViewKind {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.id() == s)
            .ok_or_else(|| FlowError::UnknownView(s.to_string()))
    }
}

/// Display labels and column names the views are parameterized by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewLabels {
    /// Institution name used for the anchor and hub nodes.
    pub institution: String,
    /// Fiscal-year column carrying revenue and expense amounts.
    pub revenue_year: String,
}

impl Default for ViewLabels {
    fn default() -> Self {
        Self {
            institution: "JMU".into(),
            revenue_year: "2023".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Layer + link tables
// ---------------------------------------------------------------------------

/// Which records belong to a layer or link set.
#[derive(Debug, Clone, PartialEq)]
pub enum Membership {
    HasField(String),
    FieldEquals { field: String, value: String },
}

impl Membership {
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::HasField(field) => accessor::has_field(record, field),
            Self::FieldEquals { field, value } => accessor::field_equals(record, field, value),
        }
    }
}

/// How a layer turns a grouping key into a node id.
#[derive(Debug, Clone, PartialEq)]
pub enum IdPolicy {
    /// id = label. Only for labels that cannot collide with another layer.
    Label,
    /// id = next integer of a registry sequence, starting at `base`.
    Sequential { sequence: &'static str, base: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayerSource {
    /// Exactly one synthetic node.
    Anchor { label: String },
    /// A fixed label list, independent of the records.
    Fixed { labels: Vec<String> },
    /// One node per distinct `key` among records matching `filter`.
    Records { filter: Membership, key: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    pub name: &'static str,
    pub source: LayerSource,
    pub ids: IdPolicy,
}

/// One end of a direct link.
#[derive(Debug, Clone, PartialEq)]
pub enum Endpoint {
    /// A fixed node id (anchors and hubs).
    Node(NodeId),
    /// The record's `key` field, resolved through `ids`.
    Field { key: String, ids: IdPolicy },
}

/// A program a fan-out record can contribute to, read through field aliases.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub label: String,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanDirection {
    ProgramToRecord,
    RecordToProgram,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LinkShape {
    /// One edge per record, weighted by the first present `weight` alias.
    Direct {
        source: Endpoint,
        target: Endpoint,
        weight: Vec<String>,
    },
    /// One edge per program whose field is strictly positive.
    FanOut {
        record: Endpoint,
        programs: Vec<Program>,
        program_ids: IdPolicy,
        direction: FanDirection,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkSpec {
    pub name: &'static str,
    pub filter: Membership,
    /// Records repeating an earlier value of this field are skipped.
    pub dedup: Option<String>,
    pub shape: LinkShape,
}

/// Static configuration of one view.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSpec {
    pub kind: ViewKind,
    pub store_key: &'static str,
    pub layers: Vec<LayerSpec>,
    pub links: Vec<LinkSpec>,
    /// Anchor whose inflow must equal its outflow.
    pub hub: Option<NodeId>,
}

impl ViewSpec {
    pub fn new(kind: ViewKind, labels: &ViewLabels) -> Self {
        match kind {
            ViewKind::StudentCosts => student_costs(labels),
            ViewKind::ComprehensiveFee => comprehensive_fee(),
            ViewKind::Revenues => revenues(labels),
            ViewKind::Athletics => athletics(labels),
        }
    }

    pub fn layer_names(&self) -> Vec<&'static str> {
        self.layers.iter().map(|l| l.name).collect()
    }
}

// ---------------------------------------------------------------------------
// Table helpers
// ---------------------------------------------------------------------------

fn has(field: &str) -> Membership {
    Membership::HasField(field.into())
}

fn equals(field: &str, value: &str) -> Membership {
    Membership::FieldEquals {
        field: field.into(),
        value: value.into(),
    }
}

fn records(name: &'static str, filter: Membership, key: &str, ids: IdPolicy) -> LayerSpec {
    LayerSpec {
        name,
        source: LayerSource::Records {
            filter,
            key: key.into(),
        },
        ids,
    }
}

fn anchor(name: &'static str, label: &str) -> LayerSpec {
    LayerSpec {
        name,
        source: LayerSource::Anchor { label: label.into() },
        ids: IdPolicy::Label,
    }
}

fn by_field(key: &str, ids: IdPolicy) -> Endpoint {
    Endpoint::Field { key: key.into(), ids }
}

fn fields(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn direct(
    name: &'static str,
    filter: Membership,
    dedup: &str,
    source: Endpoint,
    target: Endpoint,
    weight: Vec<String>,
) -> LinkSpec {
    LinkSpec {
        name,
        filter,
        dedup: Some(dedup.into()),
        shape: LinkShape::Direct { source, target, weight },
    }
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

fn student_costs(labels: &ViewLabels) -> ViewSpec {
    let student = format!("{} Student", labels.institution);
    let cost = fields(&["in-state", "amount"]);
    ViewSpec {
        kind: ViewKind::StudentCosts,
        store_key: ViewKind::StudentCosts.store_key(),
        layers: vec![
            anchor("student", &student),
            records("semester", has("semester"), "semester", IdPolicy::Label),
            records("itemized", has("semester"), "name", IdPolicy::Label),
        ],
        links: vec![
            direct(
                "student-semester",
                has("semester"),
                "semester",
                Endpoint::Node(NodeId::label(student)),
                by_field("semester", IdPolicy::Label),
                cost.clone(),
            ),
            direct(
                "semester-itemized",
                has("semester"),
                "name",
                by_field("semester", IdPolicy::Label),
                by_field("name", IdPolicy::Label),
                cost,
            ),
        ],
        hub: None,
    }
}

fn comprehensive_fee() -> ViewSpec {
    let fee = "Comprehensive Fee";
    ViewSpec {
        kind: ViewKind::ComprehensiveFee,
        store_key: ViewKind::ComprehensiveFee.store_key(),
        layers: vec![
            anchor("fee", fee),
            records("component", has("subtype"), "subtype", IdPolicy::Label),
        ],
        links: vec![direct(
            "fee-component",
            has("subtype"),
            "subtype",
            Endpoint::Node(NodeId::label(fee)),
            by_field("subtype", IdPolicy::Label),
            fields(&["amount"]),
        )],
        hub: None,
    }
}

const EXPENSE_CATEGORY: IdPolicy = IdPolicy::Sequential {
    sequence: "expense-category",
    base: 1,
};

fn revenues(labels: &ViewLabels) -> ViewSpec {
    let hub = NodeId::label(labels.institution.clone());
    let year = vec![labels.revenue_year.clone()];
    let income = || equals("category", "income");
    let expense = || equals("category", "expense");
    ViewSpec {
        kind: ViewKind::Revenues,
        store_key: ViewKind::Revenues.store_key(),
        layers: vec![
            records("revenue-item", income(), "name", IdPolicy::Label),
            records("revenue-type", income(), "type", IdPolicy::Label),
            anchor("institution", &labels.institution),
            records("expense-category", expense(), "type", EXPENSE_CATEGORY),
            records("expense-item", expense(), "name", IdPolicy::Label),
        ],
        links: vec![
            direct(
                "item-type",
                income(),
                "name",
                by_field("name", IdPolicy::Label),
                by_field("type", IdPolicy::Label),
                year.clone(),
            ),
            direct(
                "type-institution",
                income(),
                "type",
                by_field("type", IdPolicy::Label),
                Endpoint::Node(hub.clone()),
                year.clone(),
            ),
            direct(
                "institution-category",
                expense(),
                "type",
                Endpoint::Node(hub.clone()),
                by_field("type", EXPENSE_CATEGORY),
                year.clone(),
            ),
            direct(
                "category-item",
                expense(),
                "name",
                by_field("type", EXPENSE_CATEGORY),
                by_field("name", IdPolicy::Label),
                year,
            ),
        ],
        hub: Some(hub),
    }
}

const OPERATING_EXPENSE: IdPolicy = IdPolicy::Sequential {
    sequence: "operating-expense",
    base: 1,
};

const EXPENSE_PROGRAM: IdPolicy = IdPolicy::Sequential {
    sequence: "expense-program",
    base: 100,
};

/// Athletic programs in layer order, with the column spellings seen in source data.
pub fn sport_programs() -> Vec<Program> {
    let program = |label: &str, aliases: &[&str]| Program {
        label: label.into(),
        fields: fields(aliases),
    };
    vec![
        program("Football", &["Football"]),
        program("Men's Basketball", &["Men's Basketball"]),
        program("Women's Basketball", &["Women's Basketball"]),
        program("Other sports", &["Other sports", "Other Sports"]),
        program("Non-Program Specific", &["Non-Program Specific"]),
    ]
}

fn athletics(labels: &ViewLabels) -> ViewSpec {
    let hub_label = format!("{} Athletics", labels.institution);
    let hub = NodeId::label(hub_label.clone());
    let programs = sport_programs();
    let program_labels: Vec<String> = programs.iter().map(|p| p.label.clone()).collect();
    let revenue = || equals("type", "Operating Revenues");
    let expense = || equals("type", "Operating Expenses");
    let total = fields(&["Total"]);
    ViewSpec {
        kind: ViewKind::Athletics,
        store_key: ViewKind::Athletics.store_key(),
        layers: vec![
            LayerSpec {
                name: "program",
                source: LayerSource::Fixed {
                    labels: program_labels.clone(),
                },
                ids: IdPolicy::Label,
            },
            records("operating-revenue", revenue(), "name", IdPolicy::Label),
            anchor("athletics", &hub_label),
            records("operating-expense", expense(), "name", OPERATING_EXPENSE),
            LayerSpec {
                name: "expense-program",
                source: LayerSource::Fixed {
                    labels: program_labels,
                },
                ids: EXPENSE_PROGRAM,
            },
        ],
        links: vec![
            LinkSpec {
                name: "program-revenue",
                filter: revenue(),
                dedup: Some("name".into()),
                shape: LinkShape::FanOut {
                    record: by_field("name", IdPolicy::Label),
                    programs: programs.clone(),
                    program_ids: IdPolicy::Label,
                    direction: FanDirection::ProgramToRecord,
                },
            },
            direct(
                "revenue-athletics",
                revenue(),
                "name",
                by_field("name", IdPolicy::Label),
                Endpoint::Node(hub.clone()),
                total.clone(),
            ),
            direct(
                "athletics-expense",
                expense(),
                "name",
                Endpoint::Node(hub.clone()),
                by_field("name", OPERATING_EXPENSE),
                total,
            ),
            LinkSpec {
                name: "expense-program",
                filter: expense(),
                dedup: Some("name".into()),
                shape: LinkShape::FanOut {
                    record: by_field("name", OPERATING_EXPENSE),
                    programs,
                    program_ids: EXPENSE_PROGRAM,
                    direction: FanDirection::RecordToProgram,
                },
            },
        ],
        hub: Some(hub),
    }
}
