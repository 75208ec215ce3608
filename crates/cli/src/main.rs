// fundflow CLI - assemble Sankey flow graphs from financial record stores

mod exit_codes;
mod flow;
mod util;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};

use exit_codes::{flow_exit_code, EXIT_ERROR, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};
use fundflow_graph::{FlowError, OutputFormat, ViewLabels};

#[derive(Parser)]
#[command(name = "fflow")]
#[command(about = "Assemble Sankey flow graphs from financial records (headless)")]
#[command(long_version = long_version())]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// Raise log verbosity on stderr (-v info, -vv debug). RUST_LOG also applies.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available views with their store key, layers and hub
    #[command(after_help = "\
Examples:
  fflow views
  fflow views --json")]
    Views {
        /// Output JSON to stdout instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Assemble one view from a JSON record store
    #[command(after_help = "\
Examples:
  fflow build jmu.json --view revenues --json
  fflow build jmu.json --view athletics --format d3 --output athletics.json
  fflow build jmu.json --view revenues --year 2022 --json
  fflow build partial.json --view student-costs --allow-invalid --json")]
    Build {
        /// JSON document mapping store keys to record arrays
        data: PathBuf,

        /// View id (student-costs, comprehensive-fee, revenues, athletics)
        #[arg(long)]
        view: String,

        /// Output shape
        #[arg(long, value_enum, default_value = "graph")]
        format: FormatArg,

        /// Output JSON to stdout
        #[arg(long)]
        json: bool,

        /// Write JSON output to file
        #[arg(long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        labels: LabelArgs,

        /// Exit 0 even when the graph fails structural validation
        #[arg(long)]
        allow_invalid: bool,
    },

    /// Validate one view's graph: ids, references, weights, hub balance
    #[command(after_help = "\
Examples:
  fflow check jmu.json --view revenues
  fflow check jmu.json --view athletics --tolerance 0.5 --json")]
    Check {
        /// JSON document mapping store keys to record arrays
        data: PathBuf,

        /// View id (student-costs, comprehensive-fee, revenues, athletics)
        #[arg(long)]
        view: String,

        /// Allowed |inflow - outflow| at the hub
        #[arg(long, default_value_t = 0.01)]
        tolerance: f64,

        /// Output the report as JSON to stdout
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        labels: LabelArgs,
    },

    /// Assemble every view listed in a TOML config
    #[command(after_help = "\
Examples:
  fflow run flows.toml
  fflow run flows.toml --json
  fflow run flows.toml --output graphs.json")]
    Run {
        /// Path to the flow config (.toml)
        config: PathBuf,

        /// Output JSON to stdout instead of human summary
        #[arg(long)]
        json: bool,

        /// Write JSON output to file (overrides [output] json)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Validate a flow config without running
    #[command(after_help = "\
Examples:
  fflow validate flows.toml")]
    Validate {
        /// Path to the flow config (.toml)
        config: PathBuf,
    },
}

/// Anchor and column labels shared by `build` and `check`.
#[derive(Args)]
struct LabelArgs {
    /// Institution name used for anchor and hub nodes
    #[arg(long)]
    institution: Option<String>,

    /// Fiscal-year column read as the revenues weight
    #[arg(long)]
    year: Option<String>,
}

impl LabelArgs {
    fn into_labels(self) -> ViewLabels {
        let defaults = ViewLabels::default();
        ViewLabels {
            institution: self.institution.unwrap_or(defaults.institution),
            revenue_year: self.year.unwrap_or(defaults.revenue_year),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    /// {nodes: [{id, label, layer}], links: [{source, target, weight}]}
    Graph,
    /// {nodes: [{name, title}], links: [{source, target, value}]} for d3-sankey
    D3,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Graph => OutputFormat::Graph,
            FormatArg::D3 => OutputFormat::D3,
        }
    }
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        "\nengine:  fundflow-graph ",
        env!("CARGO_PKG_VERSION"),
        "\nviews:   student-costs, comprehensive-fee, revenues, athletics",
    )
}

fn init_logging(verbose: u8) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    match verbose {
        0 => {}
        1 => {
            builder.filter_level(log::LevelFilter::Info);
        }
        _ => {
            builder.filter_level(log::LevelFilter::Debug);
        }
    }
    builder.format_timestamp(None).target(env_logger::Target::Stderr).init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        None => {
            // No subcommand = show help
            eprintln!("Usage: fflow <command> [options]");
            eprintln!("       fflow --help for more information");
            Ok(())
        }
        Some(Commands::Views { json }) => flow::cmd_views(json),
        Some(Commands::Build {
            data,
            view,
            format,
            json,
            output,
            labels,
            allow_invalid,
        }) => flow::cmd_build(
            data,
            &view,
            format.into(),
            json,
            output,
            labels.into_labels(),
            allow_invalid,
        ),
        Some(Commands::Check {
            data,
            view,
            tolerance,
            json,
            labels,
        }) => flow::cmd_check(data, &view, tolerance, json, labels.into_labels()),
        Some(Commands::Run { config, json, output }) => flow::cmd_run(config, json, output),
        Some(Commands::Validate { config }) => flow::cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_IO, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    /// Create error from an engine error with the matching exit code.
    pub fn flow(err: FlowError) -> Self {
        let hint = match &err {
            FlowError::UnknownView(_) => Some("run `fflow views` to list view ids".to_string()),
            FlowError::NotAnObject { .. } | FlowError::StoreParse(_) => {
                Some("expected {\"<store key>\": [{...}, ...], ...}".to_string())
            }
            _ => None,
        };
        Self { code: flow_exit_code(&err), message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
