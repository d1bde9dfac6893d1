//! Task graph behavior through the headless boundary: ordering, cycle
//! detection, memoization and fail-fast propagation.

use std::sync::{Arc, Mutex};
use tagforge::build::run_task;
use tagforge::{BuildContext, Descriptor, FnTask, GraphError, ProjectSettings, Task, TaskGraph};

type Log = Arc<Mutex<Vec<&'static str>>>;

fn recording(name: &'static str, log: &Log) -> Task {
    let log = Arc::clone(log);
    Task::new(
        name,
        "",
        FnTask(move |_: &mut BuildContext| {
            log.lock().unwrap().push(name);
            Ok(())
        }),
    )
}

fn failing(name: &'static str) -> Task {
    Task::new(name, "", FnTask(|_: &mut BuildContext| anyhow::bail!("exit status 2")))
}

fn descriptor(tasks: Vec<Task>) -> Descriptor {
    let mut descriptor = Descriptor::new(ProjectSettings::new("p", "1"));
    for task in tasks {
        descriptor = descriptor.task(task);
    }
    descriptor
}

#[test]
fn shared_target_runs_once_after_all_prerequisites() {
    for flip in [false, true] {
        let log: Log = Arc::default();
        let (a, b) = (
            recording("a", &log).before(["c"]),
            recording("b", &log).before(["c"]),
        );
        let tasks = if flip {
            vec![b, a, recording("c", &log)]
        } else {
            vec![a, b, recording("c", &log)]
        };

        run_task(&descriptor(tasks), "c").unwrap();

        let order = log.lock().unwrap().clone();
        assert_eq!(order.len(), 3, "each task runs exactly once");
        assert_eq!(order.last(), Some(&"c"), "c runs after both a and b");
    }
}

#[test]
fn cycle_is_detected_before_any_task_body_runs() {
    let log: Log = Arc::default();
    let tasks = vec![
        recording("x", &log).before(["y"]),
        recording("y", &log).before(["x"]),
    ];

    let err = run_task(&descriptor(tasks), "x").unwrap_err();
    assert!(err.to_string().contains("invalid task graph"));
    assert!(
        format!("{err:#}").contains("x -> y -> x"),
        "cycle path must be reported, got: {err:#}"
    );
    assert!(log.lock().unwrap().is_empty(), "no task body may execute");
}

#[test]
fn cycle_path_names_every_member() {
    let tasks = vec![
        Task::new("x", "", FnTask(|_: &mut BuildContext| Ok(()))).before(["y"]),
        Task::new("y", "", FnTask(|_: &mut BuildContext| Ok(()))).before(["x"]),
    ];
    match TaskGraph::new(&tasks) {
        Err(GraphError::Cycle { path }) => assert_eq!(path, vec!["x", "y", "x"]),
        other => panic!("expected cycle error, got {:?}", other.err()),
    }
}

#[test]
fn failing_prerequisite_aborts_chain_and_is_named() {
    let log: Log = Arc::default();
    let tasks = vec![failing("b").before(["c"]), recording("c", &log)];

    let err = run_task(&descriptor(tasks), "c").unwrap_err();
    let rendered = format!("{err:#}");
    assert!(rendered.contains("task 'b' failed"), "got: {rendered}");
    assert!(log.lock().unwrap().is_empty(), "c must never execute");
}

#[test]
fn composite_task_runs_members_in_listed_order() {
    let log: Log = Arc::default();
    let tasks = vec![
        recording("annotate", &log).before(["build"]),
        recording("test", &log),
        recording("build", &log),
        Task::sequence("setup", "bootstrap", ["annotate", "test", "build"]),
    ];

    run_task(&descriptor(tasks), "setup").unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["annotate", "test", "build"]);
}

#[test]
fn unknown_reference_is_rejected_before_execution() {
    let log: Log = Arc::default();
    let tasks = vec![recording("build", &log).before(["missing"])];

    let err = run_task(&descriptor(tasks), "build").unwrap_err();
    assert!(format!("{err:#}").contains("unknown task 'missing'"));
    assert!(log.lock().unwrap().is_empty());
}
