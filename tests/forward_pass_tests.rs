use trace_critpath::calculations::forward_pass::ForwardPass;
use trace_critpath::{
    AnalysisConfig, AnalysisError, DependencyGraph, OperationEvent, TaskMetadata, build_graph,
};

fn create(task: &str, path: &str) -> OperationEvent {
    OperationEvent::new(task, "create", path).with_attr("t", 0)
}

fn open(task: &str, path: &str) -> OperationEvent {
    OperationEvent::new(task, "open", path)
        .with_attr("t", 0)
        .with_attr("size", 1)
}

fn graph(durations: &[(&str, f64)], events: &[OperationEvent]) -> DependencyGraph {
    let metadata: Vec<TaskMetadata> = durations
        .iter()
        .map(|(id, d)| TaskMetadata::new(*id, *d))
        .collect();
    build_graph(AnalysisConfig::default(), &metadata, events)
}

#[test]
fn eft_adds_slowest_parent() {
    let g = graph(
        &[("A", 3.0), ("B", 4.0), ("C", 1.0)],
        &[create("A", "x.o"), open("B", "x.o"), create("B", "out")],
    );
    let eft = ForwardPass::new(&g).execute().unwrap();
    assert_eq!(eft.len(), 3);
    assert_eq!(eft["A"], 3.0);
    assert_eq!(eft["B"], 7.0);
    assert_eq!(eft["C"], 1.0);
}

#[test]
fn eft_across_diamond() {
    // 1(2) -> {2(3), 3(1)} -> 4(2)
    let g = graph(
        &[("1", 2.0), ("2", 3.0), ("3", 1.0), ("4", 2.0)],
        &[
            create("1", "a"),
            open("2", "a"),
            open("3", "a"),
            create("2", "b"),
            create("3", "c"),
            open("4", "b"),
            open("4", "c"),
        ],
    );
    let eft = ForwardPass::new(&g).execute().unwrap();
    assert_eq!(eft["1"], 2.0);
    assert_eq!(eft["2"], 5.0);
    assert_eq!(eft["3"], 3.0);
    assert_eq!(eft["4"], 7.0);

    for task in g.tasks() {
        assert!(eft[&task.id] >= task.duration);
        if g.parents(&task.id).is_empty() {
            assert_eq!(eft[&task.id], task.duration);
        }
    }
}

#[test]
fn eft_visits_parents_registered_later() {
    // the consumer appears first in the stream
    let g = graph(
        &[("late", 2.0), ("early", 5.0)],
        &[open("late", "f"), create("early", "f")],
    );
    let eft = ForwardPass::new(&g).execute().unwrap();
    assert_eq!(eft["early"], 5.0);
    assert_eq!(eft["late"], 7.0);
}

#[test]
fn isolated_task_finishes_after_its_duration() {
    let g = graph(&[("D", 5.0)], &[]);
    let eft = ForwardPass::new(&g).execute().unwrap();
    assert_eq!(eft["D"], 5.0);
}

#[test]
fn cycle_is_reported_with_its_tasks() {
    let g = graph(
        &[("A", 1.0), ("B", 1.0)],
        &[create("A", "x"), open("B", "x"), create("B", "y"), open("A", "y")],
    );
    let err = ForwardPass::new(&g).execute().unwrap_err();
    assert_eq!(
        err,
        AnalysisError::Cycle {
            tasks: vec!["A".to_string(), "B".to_string()],
        }
    );
    assert_eq!(err.to_string(), "dependency cycle through tasks A -> B");
}

#[test]
fn cycle_below_an_acyclic_root_is_still_found() {
    let g = graph(
        &[("Z", 1.0), ("A", 1.0), ("B", 1.0)],
        &[
            open("Z", "x"),
            create("A", "x"),
            open("B", "x"),
            create("B", "y"),
            open("A", "y"),
        ],
    );
    let Err(AnalysisError::Cycle { tasks }) = ForwardPass::new(&g).execute() else {
        panic!("expected a cycle");
    };
    assert_eq!(tasks.len(), 2);
    assert!(tasks.contains(&"A".to_string()));
    assert!(tasks.contains(&"B".to_string()));
}

#[test]
fn deep_chain_does_not_overflow() {
    let n = 20_000;
    let mut events = Vec::with_capacity(2 * n);
    let mut durations = Vec::with_capacity(n);
    let ids: Vec<String> = (0..n).map(|i| format!("t{i:05}")).collect();
    for i in 0..n {
        if i > 0 {
            events.push(open(&ids[i], &format!("f{}", i - 1)));
        }
        events.push(create(&ids[i], &format!("f{i}")));
    }
    // register the sink first so the traversal starts at the bottom of the chain
    for id in ids.iter().rev() {
        durations.push((id.as_str(), 1.0));
    }
    let g = graph(&durations, &events);
    let eft = ForwardPass::new(&g).execute().unwrap();
    assert_eq!(eft[&ids[n - 1]], n as f64);
}

#[test]
fn empty_graph_has_no_eft() {
    let g = graph(&[], &[]);
    assert!(ForwardPass::new(&g).execute().unwrap().is_empty());
}
