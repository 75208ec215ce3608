//! `fundflow-graph` — record-to-flow-graph assembly for Sankey views.
//!
//! Pure engine crate: receives a pre-loaded record store, returns one
//! `{nodes, links}` graph per view. No layout, rendering or CLI dependencies.

pub mod accessor;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod extract;
pub mod load;
pub mod model;
pub mod registry;
pub mod validate;
pub mod view;

pub use config::{FlowConfig, OutputFormat};
pub use engine::{assemble, assemble_graph, Assembly, AssemblyTrace};
pub use error::FlowError;
pub use export::{LayoutEngine, SankeyDocument};
pub use load::load_csv_records;
pub use model::{Graph, Link, Node, NodeId, Record, RecordStore, WeightIssue};
pub use registry::CategoryRegistry;
pub use validate::{validate, GraphReport, HubBalance};
pub use view::{ViewKind, ViewLabels, ViewSpec};
