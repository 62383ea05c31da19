//! Editor session
//!
//! [`Editor`] owns the current snapshot and applies user intents one at a
//! time, in the order they arrive. Each intent runs against the latest
//! snapshot and, if it succeeds, replaces it. A failed intent leaves the
//! snapshot exactly as it was.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, info_span, warn};

use crate::config::{EditorConfig, SpawnConfig};
use crate::core::{
    Connection, DecisionData, FlowError, LayoutDirection, Node, NodeData, NodeKind, Outcome, Position,
};
use crate::graph::{
    connect, edit_node_field, reconnect, seed_graph, validate_connection, FieldEdit, Graph,
    GraphSnapshot,
};
use crate::layout::LayoutEngine;

/// Source of fresh node ids
pub trait IdGenerator {
    fn next_id(&mut self) -> String;
}

/// Ids of the form `<prefix><n>` with `n` counting up
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }

    /// Start past every `node_<n>` id already present in `graph`
    pub fn after(graph: &Graph) -> Self {
        let ids = Self::default();
        let next = graph
            .nodes()
            .iter()
            .filter_map(|n| n.id.strip_prefix(ids.prefix.as_str()))
            .filter_map(|suffix| suffix.parse::<u64>().ok())
            .max()
            .map_or(1, |n| n + 1);
        Self { next, ..ids }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new("node_")
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> String {
        let id = format!("{}{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}

/// Default spawn point: `origin + U[0, spread)` on each axis
pub fn spawn_position(rng: &mut impl Rng, spawn: &SpawnConfig) -> Position {
    let mut axis = || spawn.origin + rng.gen::<f64>() * spawn.spread;
    let x = axis();
    let y = axis();
    Position::new(x, y)
}

/// Add a node with a fresh id
///
/// `position` of `None` spawns the node at the default jittered point.
/// Fails with `DuplicateNodeId` if the generator hands out an id in use.
pub fn add_node(
    graph: &Graph,
    ids: &mut impl IdGenerator,
    rng: &mut impl Rng,
    data: NodeData,
    position: Option<Position>,
) -> Result<(Graph, String), FlowError> {
    let id = ids.next_id();
    let position = position.unwrap_or_else(|| spawn_position(rng, &SpawnConfig::default()));
    let next = graph.with_node(Node::new(id.clone(), data, position))?;
    Ok((next, id))
}

/// Receiver for the save action
pub trait SnapshotSink {
    fn save(&mut self, snapshot: &GraphSnapshot) -> anyhow::Result<()>;
}

/// Sink that records the snapshot in the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl SnapshotSink for LogSink {
    fn save(&mut self, snapshot: &GraphSnapshot) -> anyhow::Result<()> {
        info!(
            node_count = snapshot.nodes.len(),
            edge_count = snapshot.edges.len(),
            "Saving workflow"
        );
        debug!(nodes = ?snapshot.nodes, edges = ?snapshot.edges, "Saved snapshot");
        Ok(())
    }
}

/// Single owner of the current graph snapshot
#[derive(Debug)]
pub struct Editor<G: IdGenerator = SequentialIds> {
    graph: Graph,
    ids: G,
    rng: StdRng,
    engine: LayoutEngine,
    config: EditorConfig,
}

impl Editor<SequentialIds> {
    /// Empty editor
    pub fn new(config: EditorConfig) -> Self {
        Self::with_graph(Graph::new(), config)
    }

    /// Editor over an existing graph, numbering new nodes after it
    pub fn with_graph(graph: Graph, config: EditorConfig) -> Self {
        Self {
            ids: SequentialIds::after(&graph),
            graph,
            rng: StdRng::from_entropy(),
            engine: LayoutEngine::with_config(config.layout.clone()),
            config,
        }
    }

    /// Editor opened on the starter workflow
    pub fn seeded(config: EditorConfig) -> Self {
        Self::with_graph(seed_graph(), config)
    }
}

impl<G: IdGenerator> Editor<G> {
    /// Swap the id source
    pub fn with_ids<H: IdGenerator>(self, ids: H) -> Editor<H> {
        Editor {
            graph: self.graph,
            ids,
            rng: self.rng,
            engine: self.engine,
            config: self.config,
        }
    }

    /// Make spawn jitter reproducible
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Complete, invariant-satisfying copy of the current state
    pub fn snapshot(&self) -> GraphSnapshot {
        self.graph.snapshot()
    }

    /// Add a node of `kind` with default data at a jittered position
    pub fn add(&mut self, kind: NodeKind) -> Result<String, FlowError> {
        self.add_node(NodeData::empty(kind), None)
    }

    pub fn add_control(&mut self) -> Result<String, FlowError> {
        self.add(NodeKind::Control)
    }

    pub fn add_decision(&mut self, outcome: Option<Outcome>) -> Result<String, FlowError> {
        self.add_node(NodeData::Decision(DecisionData { outcome }), None)
    }

    pub fn add_node(&mut self, data: NodeData, position: Option<Position>) -> Result<String, FlowError> {
        let position = position.unwrap_or_else(|| spawn_position(&mut self.rng, &self.config.spawn));
        let (next, id) = add_node(&self.graph, &mut self.ids, &mut self.rng, data, Some(position))?;
        info!(node_id = %id, x = position.x, y = position.y, "Node added");
        self.graph = next;
        Ok(id)
    }

    /// Shell hover check, does not change the snapshot
    pub fn validate(&self, candidate: &Connection) -> bool {
        validate_connection(&self.graph, candidate)
    }

    pub fn connect(&mut self, candidate: &Connection) -> Result<(), FlowError> {
        self.graph = connect(&self.graph, candidate)?;
        Ok(())
    }

    /// Connect, replacing whatever occupies the slots
    pub fn reconnect(&mut self, candidate: &Connection) -> Result<(), FlowError> {
        self.graph = reconnect(&self.graph, candidate)?;
        Ok(())
    }

    pub fn edit(&mut self, node_id: &str, edit: FieldEdit) {
        self.graph = edit_node_field(&self.graph, node_id, edit);
    }

    /// Parse the panel's raw field/value pair and apply it
    pub fn edit_raw(&mut self, node_id: &str, field: &str, value: &str) -> Result<(), FlowError> {
        let edit = FieldEdit::parse(field, value)?;
        self.edit(node_id, edit);
        Ok(())
    }

    /// Re-layout; `None` uses the configured default direction
    pub fn apply_layout(&mut self, direction: Option<LayoutDirection>) -> Result<(), FlowError> {
        let direction = direction.unwrap_or(self.config.default_direction);
        let span = info_span!("apply_layout", %direction);
        let _enter = span.enter();

        match self.engine.apply(&self.graph, direction) {
            Ok(next) => {
                self.graph = next;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "Layout failed, keeping previous positions");
                Err(err)
            }
        }
    }

    pub fn remove_node(&mut self, node_id: &str) {
        self.graph = self.graph.without_node(node_id);
    }

    pub fn remove_edge(&mut self, edge_id: &str) {
        self.graph = self.graph.without_edge(edge_id);
    }

    /// Hand the current snapshot to `sink`
    pub fn save(&self, sink: &mut dyn SnapshotSink) -> anyhow::Result<()> {
        sink.save(&self.snapshot())
    }
}
