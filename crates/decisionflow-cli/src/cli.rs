//! Command-line interface for the decisionflow editor core
//!
//! Every subcommand reads a JSON graph snapshot (file or stdin), applies one
//! operation and writes the resulting snapshot (file or stdout).

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing::{debug, info};

use decisionflow::config::EditorConfig;
use decisionflow::core::logging::{init_logging, LOG_FORMAT_ENV, LOG_LEVEL_ENV};
use decisionflow::graph::check_connection;
use decisionflow::{
    connect, edit_node_field, reconnect, seed_graph, Connection, Editor, FieldEdit, Graph,
    GraphSnapshot, LayoutDirection, LayoutEngine, NodeKind, Outcome,
};

/// Decisionflow - edit decision workflow graphs from the terminal
#[derive(Parser)]
#[command(name = "decisionflow")]
#[command(about = "Validate, connect, edit and lay out decision workflow graphs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Editor config file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Set log level (trace|debug|info|warn|error)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Set log format (compact|pretty|json)
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,
}

/// Log level options
#[derive(Copy, Clone, Debug, clap::ValueEnum, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Log format options
#[derive(Copy, Clone, Debug, clap::ValueEnum, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Compact => "compact",
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write the starter workflow
    Seed {
        /// Output file for the snapshot (use - for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Recompute node positions
    Layout {
        /// Input snapshot (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file for the snapshot (use - for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Rank direction; defaults to the configured direction
        #[arg(short, long, value_enum)]
        direction: Option<DirectionChoice>,
    },

    /// Check whether a connection would be accepted
    Validate {
        /// Input snapshot (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[command(flatten)]
        connection: ConnectionArgs,
    },

    /// Add an edge
    Connect {
        /// Input snapshot (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file for the snapshot (use - for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        connection: ConnectionArgs,

        /// Evict edges already holding the source slot or the target
        #[arg(long)]
        replace: bool,
    },

    /// Add a node with default data at a jittered position
    Add {
        /// Input snapshot (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file for the snapshot (use - for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(value_enum)]
        kind: KindChoice,

        /// Outcome for decision nodes
        #[arg(long, value_enum)]
        outcome: Option<OutcomeChoice>,

        /// Seed for the spawn position jitter
        #[arg(long)]
        rng_seed: Option<u64>,
    },

    /// Change one field of a node
    Edit {
        /// Input snapshot (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file for the snapshot (use - for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Node to edit
        #[arg(long)]
        node: String,

        /// parameter, operator, value or outcome
        #[arg(long)]
        field: String,

        /// New value; empty clears the field
        #[arg(long, default_value = "")]
        value: String,
    },

    /// Verify that a snapshot satisfies every graph invariant
    Check {
        /// Input snapshot (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Endpoints of a proposed edge
#[derive(clap::Args, Debug, Clone, PartialEq, Eq)]
pub struct ConnectionArgs {
    /// Source node id
    #[arg(long)]
    pub source: String,

    /// Target node id
    #[arg(long)]
    pub target: String,

    /// Source handle (yes|no), required when the source is a control node
    #[arg(long)]
    pub handle: Option<String>,
}

impl From<ConnectionArgs> for Connection {
    fn from(args: ConnectionArgs) -> Self {
        Connection {
            source: Some(args.source),
            target: Some(args.target),
            source_handle: args.handle,
            target_handle: None,
        }
    }
}

/// Layout directions accepted on the command line
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum DirectionChoice {
    #[value(alias = "tb", alias = "td")]
    TopToBottom,
    #[value(alias = "lr")]
    LeftToRight,
}

impl From<DirectionChoice> for LayoutDirection {
    fn from(value: DirectionChoice) -> Self {
        match value {
            DirectionChoice::TopToBottom => LayoutDirection::TopToBottom,
            DirectionChoice::LeftToRight => LayoutDirection::LeftToRight,
        }
    }
}

/// Node kinds that can be added
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum KindChoice {
    Start,
    Control,
    Decision,
}

impl From<KindChoice> for NodeKind {
    fn from(value: KindChoice) -> Self {
        match value {
            KindChoice::Start => NodeKind::Start,
            KindChoice::Control => NodeKind::Control,
            KindChoice::Decision => NodeKind::Decision,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum OutcomeChoice {
    Yes,
    No,
}

impl From<OutcomeChoice> for Outcome {
    fn from(value: OutcomeChoice) -> Self {
        match value {
            OutcomeChoice::Yes => Outcome::Yes,
            OutcomeChoice::No => Outcome::No,
        }
    }
}

/// Result of the check command
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct CheckReport {
    pub valid: bool,
    pub node_count: usize,
    pub edge_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Main CLI application
pub struct DecisionflowApp {
    config: EditorConfig,
}

impl DecisionflowApp {
    /// Create a new application instance with default settings
    pub fn new() -> Self {
        Self::with_config(EditorConfig::default())
    }

    pub fn with_config(config: EditorConfig) -> Self {
        Self { config }
    }

    /// Config file (if any), then environment overrides
    fn load_config(path: Option<&PathBuf>) -> Result<EditorConfig> {
        let config = match path {
            Some(path) => EditorConfig::from_file(path)
                .with_context(|| format!("Failed to load config '{}'", path.display()))?,
            None => EditorConfig::default(),
        };
        Ok(config.with_env_overrides()?)
    }

    /// Run the application with the given CLI arguments
    pub fn run(&mut self, cli: Cli) -> Result<()> {
        // Explicit flags win over the environment
        let log_level_str = cli
            .log_level
            .map(|l| l.as_str().to_string())
            .or_else(|| std::env::var(LOG_LEVEL_ENV).ok())
            .or_else(|| std::env::var("RUST_LOG").ok());
        let log_format_str = cli
            .log_format
            .map(|f| f.as_str().to_string())
            .or_else(|| std::env::var(LOG_FORMAT_ENV).ok());

        if let Err(e) = init_logging(log_level_str.as_deref(), log_format_str.as_deref()) {
            eprintln!("Warning: Failed to initialize logging: {}", e);
        }

        if cli.verbose {
            eprintln!("Decisionflow v{}", env!("CARGO_PKG_VERSION"));
        }

        if cli.config.is_some() {
            self.config = Self::load_config(cli.config.as_ref())?;
        } else {
            self.config = self.config.clone().with_env_overrides()?;
        }
        debug!(
            direction = %self.config.default_direction,
            config_file = ?cli.config,
            "Editor config resolved"
        );

        match cli.command {
            Commands::Seed { output } => self.seed_command(output),
            Commands::Layout {
                input,
                output,
                direction,
            } => self.layout_command(input, output, direction.map(Into::into), cli.verbose),
            Commands::Validate { input, connection } => {
                self.validate_command(input, connection.into())
            }
            Commands::Connect {
                input,
                output,
                connection,
                replace,
            } => self.connect_command(input, output, connection.into(), replace),
            Commands::Add {
                input,
                output,
                kind,
                outcome,
                rng_seed,
            } => self.add_command(input, output, kind.into(), outcome.map(Into::into), rng_seed),
            Commands::Edit {
                input,
                output,
                node,
                field,
                value,
            } => self.edit_command(input, output, &node, &field, &value),
            Commands::Check { input, json } => self.check_command(input, json),
        }
    }

    fn seed_command(&self, output: Option<PathBuf>) -> Result<()> {
        self.write_graph(output, &seed_graph())
    }

    fn layout_command(
        &self,
        input: Option<PathBuf>,
        output: Option<PathBuf>,
        direction: Option<LayoutDirection>,
        verbose: bool,
    ) -> Result<()> {
        let graph = self.read_graph(input)?;
        let direction = direction.unwrap_or(self.config.default_direction);
        if verbose {
            eprintln!("Laying out {} nodes {}", graph.node_count(), direction);
        }

        let engine = LayoutEngine::with_config(self.config.layout.clone());
        let graph = engine.apply(&graph, direction)?;
        self.write_graph(output, &graph)
    }

    fn validate_command(&self, input: Option<PathBuf>, candidate: Connection) -> Result<()> {
        let graph = self.read_graph(input)?;
        match check_connection(&graph, &candidate) {
            Ok(accepted) => {
                println!("✓ Valid connection ({:?})", accepted.kind);
                Ok(())
            }
            Err(reason) => {
                println!("✗ Invalid connection: {}", reason);
                Err(anyhow!("Connection rejected: {}", reason))
            }
        }
    }

    fn connect_command(
        &self,
        input: Option<PathBuf>,
        output: Option<PathBuf>,
        candidate: Connection,
        replace: bool,
    ) -> Result<()> {
        let graph = self.read_graph(input)?;
        let graph = if replace {
            reconnect(&graph, &candidate)?
        } else {
            connect(&graph, &candidate)?
        };
        self.write_graph(output, &graph)
    }

    fn add_command(
        &self,
        input: Option<PathBuf>,
        output: Option<PathBuf>,
        kind: NodeKind,
        outcome: Option<Outcome>,
        rng_seed: Option<u64>,
    ) -> Result<()> {
        let graph = self.read_graph(input)?;
        let mut editor = Editor::with_graph(graph, self.config.clone());
        if let Some(seed) = rng_seed {
            editor = editor.with_rng_seed(seed);
        }

        let id = match kind {
            NodeKind::Decision => editor.add_decision(outcome)?,
            other => editor.add(other)?,
        };
        info!(node_id = %id, kind = %kind, "Node added");
        self.write_graph(output, editor.graph())
    }

    fn edit_command(
        &self,
        input: Option<PathBuf>,
        output: Option<PathBuf>,
        node: &str,
        field: &str,
        value: &str,
    ) -> Result<()> {
        let graph = self.read_graph(input)?;
        let edit = FieldEdit::parse(field, value)?;
        let graph = edit_node_field(&graph, node, edit);
        self.write_graph(output, &graph)
    }

    fn check_command(&self, input: Option<PathBuf>, json: bool) -> Result<()> {
        let content = self.read_input(input)?;
        let snapshot = GraphSnapshot::from_json(&content).context("Input is not a graph snapshot")?;
        let report = Self::check_snapshot(snapshot);

        if json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else if report.valid {
            println!(
                "✓ Valid workflow ({} nodes, {} edges)",
                report.node_count, report.edge_count
            );
        } else if let Some(error) = &report.error {
            println!("✗ Invalid workflow: {}", error);
        }

        match report.error {
            None => Ok(()),
            Some(error) => Err(anyhow!(error)),
        }
    }

    fn check_snapshot(snapshot: GraphSnapshot) -> CheckReport {
        let node_count = snapshot.nodes.len();
        let edge_count = snapshot.edges.len();
        let error = Graph::from_snapshot(snapshot).err().map(|e| e.to_string());
        CheckReport {
            valid: error.is_none(),
            node_count,
            edge_count,
            error,
        }
    }

    /// Read and restore a snapshot, checking graph invariants
    pub fn read_graph(&self, input: Option<PathBuf>) -> Result<Graph> {
        let content = self.read_input(input)?;
        let snapshot = GraphSnapshot::from_json(&content).context("Input is not a graph snapshot")?;
        Ok(Graph::from_snapshot(snapshot)?)
    }

    pub fn write_graph(&self, output: Option<PathBuf>, graph: &Graph) -> Result<()> {
        let json = graph.snapshot().to_json()?;
        self.write_output(output, &json)
    }

    /// Read input from file or stdin
    pub fn read_input(&self, input: Option<PathBuf>) -> Result<String> {
        match input {
            Some(path) if path.to_string_lossy() != "-" => fs::read_to_string(&path)
                .map_err(|e| anyhow!("Failed to read input file '{}': {}", path.display(), e)),
            _ => {
                let mut content = String::new();
                io::stdin().read_to_string(&mut content)?;
                Ok(content)
            }
        }
    }

    /// Write output to file or stdout
    pub fn write_output(&self, output: Option<PathBuf>, content: &str) -> Result<()> {
        match output {
            Some(path) if path.to_string_lossy() != "-" => {
                fs::write(&path, content).map_err(|e| {
                    anyhow!("Failed to write output file '{}': {}", path.display(), e)
                })?;
            }
            _ => {
                let stdout_content = if content.is_empty() || content.ends_with('\n') {
                    content.to_string()
                } else {
                    format!("{}\n", content)
                };
                print!("{}", stdout_content);
                io::stdout().flush()?;
            }
        }
        Ok(())
    }
}

impl Default for DecisionflowApp {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;
    use tempfile::tempdir;

    fn write_seed(dir: &std::path::Path) -> PathBuf {
        let path = dir.join("seed.json");
        DecisionflowApp::new()
            .write_graph(Some(path.clone()), &seed_graph())
            .unwrap();
        path
    }

    fn read(path: &std::path::Path) -> Graph {
        DecisionflowApp::new().read_graph(Some(path.to_path_buf())).unwrap()
    }

    #[test]
    fn test_cli_parsing_connect_command() {
        let args = vec![
            "decisionflow",
            "connect",
            "--input",
            "in.json",
            "--source",
            "2",
            "--target",
            "5",
            "--handle",
            "yes",
            "--replace",
        ];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Connect {
                input,
                output,
                connection,
                replace,
            } => {
                assert_eq!(input.unwrap().to_string_lossy(), "in.json");
                assert!(output.is_none());
                assert_eq!(connection.source, "2");
                assert_eq!(connection.handle.as_deref(), Some("yes"));
                assert!(replace);
            }
            _ => panic!("Expected Connect command"),
        }
    }

    #[test]
    fn test_cli_parsing_direction_aliases() {
        let cli = Cli::try_parse_from(["decisionflow", "layout", "--direction", "lr"]).unwrap();
        match cli.command {
            Commands::Layout { direction, .. } => {
                assert_eq!(direction, Some(DirectionChoice::LeftToRight));
            }
            _ => panic!("Expected Layout command"),
        }

        let cli = Cli::try_parse_from(["decisionflow", "layout", "-d", "top-to-bottom"]).unwrap();
        match cli.command {
            Commands::Layout { direction, .. } => {
                assert_eq!(direction, Some(DirectionChoice::TopToBottom));
            }
            _ => panic!("Expected Layout command"),
        }
    }

    #[test]
    fn test_cli_parsing_edit_defaults_to_clearing() {
        let cli = Cli::try_parse_from(["decisionflow", "edit", "--node", "2", "--field", "value"]).unwrap();
        match cli.command {
            Commands::Edit { node, field, value, .. } => {
                assert_eq!(node, "2");
                assert_eq!(field, "value");
                assert_eq!(value, "");
            }
            _ => panic!("Expected Edit command"),
        }
    }

    #[test]
    fn test_cli_parsing_log_flags() {
        let cli = Cli::try_parse_from(["decisionflow", "--log-level", "debug", "check"]).unwrap();
        assert_eq!(cli.log_level, Some(LogLevel::Debug));
        assert!(cli.log_format.is_none());
        assert!(Cli::try_parse_from(["decisionflow", "--log-level", "loud", "check"]).is_err());
    }

    #[test]
    fn test_read_input_missing_file() {
        let app = DecisionflowApp::new();
        let err = app.read_input(Some(PathBuf::from("/nonexistent/in.json"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read input file"));
    }

    #[test]
    fn test_write_output_to_file() {
        let app = DecisionflowApp::new();
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("output.json");

        app.write_output(Some(file_path.clone()), "{}").unwrap();
        assert_eq!(fs::read_to_string(&file_path).unwrap(), "{}");
    }

    #[test]
    fn test_layout_command_writes_positions() {
        let dir = tempdir().unwrap();
        let input = write_seed(dir.path());
        let output = dir.path().join("laid_out.json");

        let app = DecisionflowApp::new();
        app.layout_command(Some(input), Some(output.clone()), Some(LayoutDirection::TopToBottom), false)
            .unwrap();

        let graph = read(&output);
        let y = |id: &str| graph.get_node(id).unwrap().position.y;
        assert!(y("1") < y("2"));
        assert!(y("2") < y("3"));
    }

    #[test]
    fn test_connect_command_replace() {
        let dir = tempdir().unwrap();
        let input = write_seed(dir.path());
        let added = dir.path().join("added.json");
        let output = dir.path().join("connected.json");

        let app = DecisionflowApp::new();
        app.add_command(Some(input), Some(added.clone()), NodeKind::Control, None, Some(5))
            .unwrap();
        let candidate = Connection::new("2", "node_1").with_handle("no");

        assert!(app
            .connect_command(Some(added.clone()), Some(output.clone()), candidate.clone(), false)
            .is_err());
        app.connect_command(Some(added), Some(output.clone()), candidate, true)
            .unwrap();

        let graph = read(&output);
        assert!(graph.get_edge("e2-4-no").is_none());
        assert_eq!(graph.get_edge("e2-node_1-no").unwrap().label.as_deref(), Some("false"));
    }

    #[test]
    fn test_hyphenated_ids_connect_then_check() {
        use decisionflow::{ControlData, Node, Position};

        let dir = tempdir().unwrap();
        let input = dir.path().join("hyphens.json");
        let first = dir.path().join("first.json");
        let second = dir.path().join("second.json");
        let graph = Graph::from_parts(
            vec![
                Node::start("1", Position::default()),
                Node::control("2-3", ControlData::default(), Position::default()),
                Node::start("1-2", Position::default()),
                Node::control("3", ControlData::default(), Position::default()),
            ],
            vec![],
        )
        .unwrap();

        let app = DecisionflowApp::new();
        app.write_graph(Some(input.clone()), &graph).unwrap();
        app.connect_command(Some(input), Some(first.clone()), Connection::new("1", "2-3"), false)
            .unwrap();
        app.connect_command(Some(first), Some(second.clone()), Connection::new("1-2", "3"), false)
            .unwrap();

        app.check_command(Some(second.clone()), false).unwrap();
        assert_eq!(read(&second).edge_count(), 2);
    }

    #[test]
    fn test_edit_command_updates_label() {
        let dir = tempdir().unwrap();
        let input = write_seed(dir.path());
        let output = dir.path().join("edited.json");

        let app = DecisionflowApp::new();
        app.edit_command(Some(input.clone()), Some(output.clone()), "2", "operator", ">=")
            .unwrap();
        assert_eq!(read(&output).get_node("2").unwrap().display_label(), "age >= 18");

        assert!(app
            .edit_command(Some(input), Some(output), "2", "operator", "approx")
            .is_err());
    }

    #[test]
    fn test_validate_command() {
        let dir = tempdir().unwrap();
        let input = write_seed(dir.path());
        let app = DecisionflowApp::new();

        assert!(app
            .validate_command(Some(input.clone()), Connection::new("3", "4"))
            .is_err());
        assert!(app
            .validate_command(Some(input), Connection::new("2", "2").with_handle("yes"))
            .is_err());
    }

    #[test]
    fn test_check_snapshot_report() {
        let report = DecisionflowApp::check_snapshot(seed_graph().snapshot());
        assert_eq!(
            report,
            CheckReport {
                valid: true,
                node_count: 4,
                edge_count: 3,
                error: None,
            }
        );

        let mut broken = seed_graph().snapshot();
        broken.edges[0].target = "missing".to_string();
        let report = DecisionflowApp::check_snapshot(broken);
        assert!(!report.valid);
        assert!(report.error.unwrap().contains("missing node"));
    }

    #[test]
    fn test_config_file_is_loaded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"layout": {"rank_sep": 5.0}}"#).unwrap();

        let config = DecisionflowApp::load_config(Some(&path)).unwrap();
        assert_eq!(config.layout.rank_sep, 5.0);

        fs::write(&path, r#"{"layout": {"rank_sep": -5.0}}"#).unwrap();
        assert!(DecisionflowApp::load_config(Some(&path)).is_err());
    }
}
