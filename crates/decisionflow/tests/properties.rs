//! Property tests for the connection grammar, layout and edit sync

use std::collections::HashSet;

use decisionflow::graph::classify;
use decisionflow::prelude::*;
use decisionflow::CONTROL_PLACEHOLDER;
use proptest::prelude::*;

fn kind_strategy() -> impl Strategy<Value = NodeKind> {
    prop_oneof![
        Just(NodeKind::Start),
        Just(NodeKind::Control),
        Just(NodeKind::Decision),
    ]
}

/// (source index, target index, handle: 0 none, 1 yes, 2 no)
fn attempt_strategy() -> impl Strategy<Value = Vec<(usize, usize, u8)>> {
    prop::collection::vec((0usize..12, 0usize..12, 0u8..3), 0..40)
}

fn candidate(nodes: usize, (s, t, h): (usize, usize, u8)) -> Connection {
    let conn = Connection::new((s % nodes).to_string(), (t % nodes).to_string());
    match h {
        1 => conn.with_handle("yes"),
        2 => conn.with_handle("no"),
        _ => conn,
    }
}

fn nodes_graph(kinds: &[NodeKind]) -> Graph {
    kinds.iter().enumerate().fold(Graph::new(), |graph, (i, &kind)| {
        graph
            .with_node(Node::new(i.to_string(), NodeData::empty(kind), Position::default()))
            .unwrap()
    })
}

/// Apply every attempt through `connect`, keeping only accepted ones
fn build(kinds: &[NodeKind], attempts: &[(usize, usize, u8)], forward_only: bool) -> Graph {
    attempts.iter().fold(nodes_graph(kinds), |graph, &(s, t, h)| {
        let (s, t) = (s % kinds.len(), t % kinds.len());
        if forward_only && s >= t {
            return graph;
        }
        connect(&graph, &candidate(kinds.len(), (s, t, h))).unwrap_or(graph)
    })
}

proptest! {
    #[test]
    fn accepted_edges_follow_grammar(
        kinds in prop::collection::vec(kind_strategy(), 1..12),
        attempts in attempt_strategy(),
    ) {
        let graph = build(&kinds, &attempts, false);
        prop_assert!(graph.check_invariants().is_ok());
        for edge in graph.edges() {
            let source = graph.get_node(&edge.source).unwrap().kind();
            let target = graph.get_node(&edge.target).unwrap().kind();
            prop_assert!(classify(source, target).is_some());
        }
    }

    #[test]
    fn validator_agrees_with_connect(
        kinds in prop::collection::vec(kind_strategy(), 1..12),
        attempts in attempt_strategy(),
        probe in (0usize..12, 0usize..12, 0u8..3),
    ) {
        let graph = build(&kinds, &attempts, false);
        let probe = candidate(kinds.len(), probe);
        prop_assert_eq!(validate_connection(&graph, &probe), connect(&graph, &probe).is_ok());
    }

    #[test]
    fn self_loops_never_validate(
        kinds in prop::collection::vec(kind_strategy(), 1..12),
        attempts in attempt_strategy(),
        node in 0usize..12,
        handle in 0u8..3,
    ) {
        let graph = build(&kinds, &attempts, false);
        let probe = candidate(kinds.len(), (node, node, handle));
        prop_assert!(!validate_connection(&graph, &probe));
    }

    #[test]
    fn slots_hold_at_most_one_edge(
        kinds in prop::collection::vec(kind_strategy(), 1..12),
        attempts in attempt_strategy(),
    ) {
        let graph = build(&kinds, &attempts, false);
        let mut slots = HashSet::new();
        let mut targets = HashSet::new();
        for edge in graph.edges() {
            prop_assert!(slots.insert((edge.source.clone(), edge.source_handle.clone())));
            prop_assert!(targets.insert(edge.target.clone()));
        }
    }

    #[test]
    fn ranks_increase_along_edges(
        kinds in prop::collection::vec(kind_strategy(), 1..12),
        attempts in attempt_strategy(),
        vertical in any::<bool>(),
    ) {
        let graph = build(&kinds, &attempts, true);
        let direction = if vertical { LayoutDirection::TopToBottom } else { LayoutDirection::LeftToRight };
        let result = layout(graph.nodes(), graph.edges(), direction).unwrap();

        for edge in graph.edges() {
            prop_assert!(result.rank(&edge.target).unwrap() > result.rank(&edge.source).unwrap());
        }
        for node in &result.nodes {
            prop_assert!(node.position.is_finite());
            if graph.incoming(&node.id).next().is_none() {
                prop_assert_eq!(result.rank(&node.id), Some(0));
            }
        }
    }

    #[test]
    fn layout_is_idempotent(
        kinds in prop::collection::vec(kind_strategy(), 1..12),
        attempts in attempt_strategy(),
        vertical in any::<bool>(),
    ) {
        let graph = build(&kinds, &attempts, true);
        let direction = if vertical { LayoutDirection::TopToBottom } else { LayoutDirection::LeftToRight };
        let engine = LayoutEngine::new();
        let once = engine.apply(&graph, direction).unwrap();
        let twice = engine.apply(&once, direction).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn nodes_never_overlap(
        kinds in prop::collection::vec(kind_strategy(), 1..12),
        attempts in attempt_strategy(),
    ) {
        let graph = build(&kinds, &attempts, true);
        let engine = LayoutEngine::new();
        let placed = engine.apply(&graph, LayoutDirection::TopToBottom).unwrap();
        let boxes: Vec<_> = placed.nodes().iter().map(|n| (n.position, engine.measure(n))).collect();

        for (i, (a, sa)) in boxes.iter().enumerate() {
            for (b, sb) in &boxes[i + 1..] {
                let apart = a.x + sa.width <= b.x
                    || b.x + sb.width <= a.x
                    || a.y + sa.height <= b.y
                    || b.y + sb.height <= a.y;
                prop_assert!(apart);
            }
        }
    }

    #[test]
    fn complete_condition_derives_label(
        parameter in prop_oneof![
            Just(Parameter::Age),
            Just(Parameter::Income),
            Just(Parameter::NetWorth),
            Just(Parameter::Dependants),
        ],
        operator in prop_oneof![
            Just(Operator::Eq),
            Just(Operator::Ne),
            Just(Operator::Gt),
            Just(Operator::Lt),
            Just(Operator::Ge),
            Just(Operator::Le),
        ],
        value in "[0-9]{1,7}",
    ) {
        let graph = nodes_graph(&[NodeKind::Control]);
        let graph = edit_node_field(&graph, "0", FieldEdit::Parameter(Some(parameter)));
        prop_assert_eq!(graph.get_node("0").unwrap().display_label(), CONTROL_PLACEHOLDER);

        let graph = edit_node_field(&graph, "0", FieldEdit::Operator(Some(operator)));
        let graph = edit_node_field(&graph, "0", FieldEdit::Value(Some(value.clone())));
        prop_assert_eq!(
            graph.get_node("0").unwrap().display_label(),
            format!("{} {} {}", parameter, operator, value)
        );
    }
}
