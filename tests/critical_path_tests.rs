use trace_critpath::{
    AnalysisConfig, CriticalEdge, DependencyGraph, OperationEvent, TaskMetadata, analyze,
    build_graph,
};

fn create(task: &str, path: &str) -> OperationEvent {
    OperationEvent::new(task, "create", path).with_attr("t", 0)
}

fn open(task: &str, path: &str) -> OperationEvent {
    OperationEvent::new(task, "open", path)
        .with_attr("t", 0)
        .with_attr("size", 1)
}

fn close_read(task: &str, path: &str, reads: u64, read_ns: u64) -> OperationEvent {
    OperationEvent::new(task, "close", path)
        .with_attr("t", 0)
        .with_attr("size", 1)
        .with_attr("r_num", reads)
        .with_attr("w_num", 0)
        .with_attr("r_time", read_ns)
        .with_attr("w_time", 0)
}

fn graph(durations: &[(&str, f64)], events: &[OperationEvent]) -> DependencyGraph {
    let metadata: Vec<TaskMetadata> = durations
        .iter()
        .map(|(id, d)| TaskMetadata::new(*id, *d))
        .collect();
    build_graph(AnalysisConfig::default(), &metadata, events)
}

fn produces(task: &str, file: &str) -> CriticalEdge {
    CriticalEdge::Produces {
        task: task.into(),
        file: file.into(),
    }
}

fn consumes(file: &str, task: &str) -> CriticalEdge {
    CriticalEdge::Consumes {
        file: file.into(),
        task: task.into(),
    }
}

#[test]
fn compile_then_link_is_the_critical_path() {
    let g = graph(
        &[("A", 3.0), ("B", 4.0), ("C", 1.0)],
        &[
            create("A", "x.o"),
            open("B", "x.o"),
            close_read("B", "x.o", 5, 1_000_000_000),
            create("B", "out"),
        ],
    );
    let analysis = analyze(&g).unwrap();
    let path = &analysis.critical_path;

    assert_eq!(analysis.eft("A"), Some(3.0));
    assert_eq!(analysis.eft("B"), Some(7.0));
    assert_eq!(path.tasks, vec!["A", "B"]);
    assert_eq!(
        path.edges.iter().cloned().collect::<Vec<_>>(),
        vec![produces("A", "x.o"), consumes("x.o", "B")]
    );
    assert_eq!(path.makespan, 7.0);
    assert_eq!(path.describe(), "A -> x.o -> B");
    assert!(g.is_reread("B", "x.o"));
}

#[test]
fn single_task_without_files() {
    let g = graph(&[("D", 5.0)], &[]);
    let analysis = analyze(&g).unwrap();
    assert_eq!(analysis.eft("D"), Some(5.0));
    assert_eq!(analysis.critical_path.tasks, vec!["D"]);
    assert!(analysis.critical_path.edges.is_empty());
    assert_eq!(g.task_count(), 1);
    assert_eq!(g.file_count(), 0);
}

#[test]
fn equal_parents_resolve_to_smallest_task_id() {
    let orders: [&[OperationEvent]; 2] = [
        &[create("F", "f"), create("G", "g"), open("E", "f"), open("E", "g")],
        &[create("G", "g"), open("E", "g"), create("F", "f"), open("E", "f")],
    ];
    for events in orders {
        for _ in 0..5 {
            let g = graph(&[("G", 2.0), ("E", 1.0), ("F", 2.0)], events);
            let analysis = analyze(&g).unwrap();
            assert_eq!(analysis.eft("E"), Some(3.0));
            assert_eq!(analysis.critical_path.tasks, vec!["F", "E"]);
            assert!(analysis.critical_path.is_critical(&produces("F", "f")));
            assert!(!analysis.critical_path.is_critical(&produces("G", "g")));
        }
    }
}

#[test]
fn equal_sinks_resolve_to_smallest_task_id() {
    let g = graph(&[("X", 4.0), ("W", 4.0)], &[]);
    let analysis = analyze(&g).unwrap();
    assert_eq!(analysis.critical_path.tasks, vec!["W"]);
}

#[test]
fn heavier_parent_is_followed() {
    let g = graph(
        &[("P1", 5.0), ("P2", 1.0), ("Q", 1.0), ("R", 2.0)],
        &[
            create("P1", "a"),
            create("P2", "b"),
            open("Q", "a"),
            open("Q", "b"),
            create("Q", "c"),
            open("R", "c"),
        ],
    );
    let analysis = analyze(&g).unwrap();
    assert_eq!(analysis.critical_path.tasks, vec!["P1", "Q", "R"]);
    assert_eq!(analysis.critical_path.describe(), "P1 -> a -> Q -> c -> R");
    assert!(!analysis.critical_path.contains_task("P2"));
}

#[test]
fn every_mediating_file_is_marked() {
    let g = graph(
        &[("A", 1.0), ("B", 1.0)],
        &[create("A", "f1"), create("A", "f2"), open("B", "f1"), open("B", "f2")],
    );
    let path = analyze(&g).unwrap().critical_path;
    assert_eq!(path.edges.len(), 4);
    assert_eq!(path.files_between("A", "B"), vec!["f1", "f2"]);
}

#[test]
fn makespan_matches_largest_eft() {
    let g = graph(
        &[("a", 2.5), ("b", 1.0), ("c", 6.0), ("d", 0.5)],
        &[
            create("a", "1"),
            open("b", "1"),
            create("b", "2"),
            open("d", "2"),
            create("c", "3"),
        ],
    );
    let analysis = analyze(&g).unwrap();
    let max_eft = analysis.eft.values().copied().fold(f64::MIN, f64::max);
    assert_eq!(analysis.makespan(), max_eft);
    assert_eq!(analysis.critical_path.tasks, vec!["c"]);
}

#[test]
fn eft_serializes_in_task_id_order() {
    let g = graph(
        &[("zeta", 1.0), ("alpha", 2.0), ("mid", 3.0)],
        &[create("zeta", "z"), open("alpha", "z")],
    );
    let analysis = analyze(&g).unwrap();
    let ids: Vec<&str> = analysis.eft.keys().map(String::as_str).collect();
    assert_eq!(ids, vec!["alpha", "mid", "zeta"]);

    let json = serde_json::to_string(&analysis).unwrap();
    assert!(json.starts_with(r#"{"eft":{"alpha":3.0,"mid":3.0,"zeta":1.0}"#), "{json}");
}

#[test]
fn empty_graph_yields_empty_path() {
    let g = graph(&[], &[]);
    let analysis = analyze(&g).unwrap();
    assert!(analysis.eft.is_empty());
    assert!(analysis.critical_path.is_empty());
    assert_eq!(analysis.makespan(), 0.0);
}

#[test]
fn cyclic_graph_is_an_error_not_a_path() {
    let g = graph(
        &[("A", 1.0), ("B", 1.0)],
        &[create("A", "x"), open("B", "x"), create("B", "y"), open("A", "y")],
    );
    assert!(analyze(&g).is_err());
}
