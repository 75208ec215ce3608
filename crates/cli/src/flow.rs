//! `fflow views | build | check | run | validate` — view assembly and validation.

use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Serialize;

use fundflow_graph::{
    assemble, validate, Assembly, AssemblyTrace, FlowConfig, Graph, GraphReport, NodeId, OutputFormat,
    RecordStore, SankeyDocument, ViewKind, ViewLabels, ViewSpec,
};

use crate::exit_codes::{EXIT_FLOW_IMBALANCE, EXIT_FLOW_INVALID_GRAPH};
use crate::util::{column_widths, table_row};
use crate::CliError;

// ---------------------------------------------------------------------------
// Output shapes
// ---------------------------------------------------------------------------

/// A graph in the shape selected by `--format` / `[output] format`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum GraphOutput {
    Graph(Graph),
    D3(SankeyDocument),
}

impl GraphOutput {
    pub fn render(graph: Graph, format: OutputFormat) -> Self {
        match format {
            OutputFormat::Graph => Self::Graph(graph),
            OutputFormat::D3 => Self::D3(SankeyDocument::from_graph(&graph)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ViewResult {
    pub view: ViewKind,
    pub graph: GraphOutput,
    pub report: GraphReport,
    pub trace: AssemblyTrace,
}

#[derive(Debug, Serialize)]
pub struct RunMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
    pub data_file: String,
    /// BLAKE3 of the JSON record store as read from disk.
    pub data_blake3: String,
    pub format: OutputFormat,
}

#[derive(Debug, Serialize)]
pub struct RunResult {
    pub meta: RunMeta,
    pub views: Vec<ViewResult>,
}

#[derive(Debug, Serialize)]
struct ViewInfo {
    view: ViewKind,
    store_key: &'static str,
    layers: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hub: Option<NodeId>,
}

#[derive(Debug, Serialize)]
struct CheckOutput {
    view: ViewKind,
    tolerance: f64,
    valid: bool,
    conserved: bool,
    report: GraphReport,
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

pub fn cmd_views(json_output: bool) -> Result<(), CliError> {
    let infos: Vec<ViewInfo> = ViewKind::ALL
        .into_iter()
        .map(|kind| {
            let spec = ViewSpec::new(kind, &ViewLabels::default());
            ViewInfo {
                view: kind,
                store_key: spec.store_key,
                layers: spec.layer_names(),
                hub: spec.hub,
            }
        })
        .collect();

    if json_output {
        println!("{}", to_json(&infos)?);
        return Ok(());
    }

    let mut rows = vec![vec![
        "VIEW".to_string(),
        "STORE KEY".to_string(),
        "HUB".to_string(),
        "LAYERS".to_string(),
    ]];
    for info in &infos {
        rows.push(vec![
            info.view.to_string(),
            info.store_key.to_string(),
            info.hub.as_ref().map_or_else(|| "-".to_string(), |h| h.to_string()),
            info.layers.join(" > "),
        ]);
    }
    let widths = column_widths(&rows, 32);
    for row in &rows {
        println!("{}", table_row(row, &widths));
    }
    Ok(())
}

pub fn cmd_build(
    data: PathBuf,
    view: &str,
    format: OutputFormat,
    json_output: bool,
    output_file: Option<PathBuf>,
    labels: ViewLabels,
    allow_invalid: bool,
) -> Result<(), CliError> {
    let kind: ViewKind = view.parse().map_err(CliError::flow)?;
    let store = load_store(&data)?;

    let spec = ViewSpec::new(kind, &labels);
    let Assembly { graph, trace } = assemble(&spec, &store);
    let report = validate(&graph, spec.hub.as_ref());

    let json_str = to_json(&GraphOutput::render(graph, format))?;
    emit(&json_str, json_output, output_file.as_deref())?;

    print_summary(&report, &trace);

    if !report.is_valid() && !allow_invalid {
        return Err(CliError::new(
            EXIT_FLOW_INVALID_GRAPH,
            format!("view '{kind}' failed structural validation"),
        )
        .with_hint("pass --allow-invalid to accept the graph anyway, or run `fflow check` for details"));
    }
    Ok(())
}

pub fn cmd_check(
    data: PathBuf,
    view: &str,
    tolerance: f64,
    json_output: bool,
    labels: ViewLabels,
) -> Result<(), CliError> {
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(CliError::args(format!(
            "--tolerance must be a non-negative number, got {tolerance}"
        )));
    }
    let kind: ViewKind = view.parse().map_err(CliError::flow)?;
    let store = load_store(&data)?;

    let spec = ViewSpec::new(kind, &labels);
    let Assembly { graph, trace } = assemble(&spec, &store);
    let report = validate(&graph, spec.hub.as_ref());

    let valid = report.is_valid();
    let conserved = report.is_conserved(tolerance);

    if json_output {
        let out = CheckOutput {
            view: kind,
            tolerance,
            valid,
            conserved,
            report,
        };
        println!("{}", to_json(&out)?);
    } else {
        print_summary(&report, &trace);
        print_issues(&report);
    }

    if !valid {
        return Err(CliError::new(
            EXIT_FLOW_INVALID_GRAPH,
            format!("view '{kind}' failed structural validation"),
        ));
    }
    if !conserved {
        return Err(CliError::new(
            EXIT_FLOW_IMBALANCE,
            format!("view '{kind}' hub is not conserved within {tolerance}"),
        ));
    }
    Ok(())
}

pub fn cmd_run(config_path: PathBuf, json_output: bool, output_file: Option<PathBuf>) -> Result<(), CliError> {
    let config_str = std::fs::read_to_string(&config_path)
        .map_err(|e| CliError::io(format!("cannot read config: {e}")))?;
    let config = FlowConfig::from_toml(&config_str).map_err(CliError::flow)?;

    // Resolve file paths relative to config file's directory
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    let data_path = base_dir.join(&config.data);
    let data_bytes = std::fs::read(&data_path)
        .map_err(|e| CliError::io(format!("cannot read {}: {e}", data_path.display())))?;
    let data_blake3 = blake3::hash(&data_bytes).to_hex().to_string();

    let store = config.load_store(base_dir).map_err(CliError::flow)?;
    info!("loaded {} store key(s) for '{}'", store.len(), config.name);

    let format = config.output.format;
    let views: Vec<ViewResult> = config
        .view_specs()
        .into_iter()
        .map(|spec| {
            let Assembly { graph, trace } = assemble(&spec, &store);
            let report = validate(&graph, spec.hub.as_ref());
            ViewResult {
                view: spec.kind,
                graph: GraphOutput::render(graph, format),
                report,
                trace,
            }
        })
        .collect();

    let result = RunResult {
        meta: RunMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            data_file: config.data.clone(),
            data_blake3,
            format,
        },
        views,
    };

    let json_str = to_json(&result)?;
    let output_file = output_file.or_else(|| config.output.json.as_ref().map(|p| base_dir.join(p)));
    emit(&json_str, json_output, output_file.as_deref())?;

    // Human summary to stderr
    let tolerance = config.validation.conservation_tolerance;
    for view in &result.views {
        print_summary(&view.report, &view.trace);
    }

    let invalid: Vec<&str> = result
        .views
        .iter()
        .filter(|v| !v.report.is_valid())
        .map(|v| v.view.id())
        .collect();
    let unbalanced: Vec<&str> = result
        .views
        .iter()
        .filter(|v| !v.report.is_conserved(tolerance))
        .map(|v| v.view.id())
        .collect();

    eprintln!(
        "run '{}': {} view(s), {} invalid, {} unbalanced",
        config.name,
        result.views.len(),
        invalid.len(),
        unbalanced.len(),
    );

    if config.validation.fail_on_invalid && !invalid.is_empty() {
        return Err(CliError::new(
            EXIT_FLOW_INVALID_GRAPH,
            format!("invalid graph(s): {}", invalid.join(", ")),
        )
        .with_hint("run `fflow check <data> --view <id>` for details, or set fail_on_invalid = false"));
    }
    if config.validation.fail_on_imbalance && !unbalanced.is_empty() {
        return Err(CliError::new(
            EXIT_FLOW_IMBALANCE,
            format!("hub not conserved within {tolerance}: {}", unbalanced.join(", ")),
        ));
    }
    Ok(())
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config_str = std::fs::read_to_string(&config_path)
        .map_err(|e| CliError::io(format!("cannot read config: {e}")))?;

    let config = FlowConfig::from_toml(&config_str).map_err(CliError::flow)?;
    let views: Vec<&str> = config.views.iter().map(|v| v.id()).collect();
    eprintln!(
        "valid: '{}' with {} view(s) ({}), {} CSV source(s)",
        config.name,
        views.len(),
        views.join(", "),
        config.sources.len(),
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn load_store(path: &Path) -> Result<RecordStore, CliError> {
    let store = RecordStore::from_json_path(path).map_err(CliError::flow)?;
    info!("loaded {} store key(s) from {}", store.len(), path.display());
    Ok(store)
}

fn to_json<T: Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value).map_err(|e| CliError::internal(format!("JSON serialization error: {e}")))
}

fn emit(json_str: &str, json_output: bool, output_file: Option<&Path>) -> Result<(), CliError> {
    if let Some(path) = output_file {
        std::fs::write(path, json_str).map_err(|e| CliError::io(format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }
    if json_output {
        println!("{json_str}");
    }
    Ok(())
}

fn print_summary(report: &GraphReport, trace: &AssemblyTrace) {
    if !trace.store_key_present {
        warn!("store has no '{}' key; view '{}' has anchors only", trace.store_key, trace.view);
    }
    eprintln!(
        "{}: {} node(s), {} link(s) from {} record(s) under '{}'",
        trace.view, report.nodes, report.links, trace.records, trace.store_key,
    );
    if !report.is_valid() {
        eprintln!(
            "  {} duplicate id(s), {} dangling reference(s), {} invalid link(s)",
            report.duplicate_ids.len(),
            report.dangling.len(),
            report.invalid_links.len(),
        );
    }
    if let Some(hub) = &report.hub {
        eprintln!(
            "  hub '{}': inflow {}, outflow {}, delta {}",
            hub.hub, hub.inflow, hub.outflow, hub.delta,
        );
    }
}

fn print_issues(report: &GraphReport) {
    for id in &report.duplicate_ids {
        eprintln!("  duplicate id: {id}");
    }
    for d in &report.dangling {
        let end = match d.end {
            fundflow_graph::validate::LinkEnd::Source => "source",
            fundflow_graph::validate::LinkEnd::Target => "target",
        };
        eprintln!("  link {}: {end} {} has no node", d.link, d.id);
    }
    for l in &report.invalid_links {
        match &l.issue {
            Some(issue) => eprintln!("  link {} ({} -> {}): {issue}", l.link, l.source, l.target),
            None => eprintln!("  link {} ({} -> {}): weight out of range", l.link, l.source, l.target),
        }
    }
}
