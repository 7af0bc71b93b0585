use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use mc_components::{RcElement, add_element};
use mc_core::TimeGrid;
use mc_graph::Network;
use mc_results::{ResultsError, RunStore, compute_run_id, export_csv};
use mc_sim::{Solver, SolverOptions};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    dir.push(format!("{}_{}", prefix, nanos));
    dir
}

fn solved_decay(name: &str, n_cycles: usize) -> Solver {
    let grid = TimeGrid::new(n_cycles, 1.0, 0.1).unwrap();
    let mut net = Network::new(name, grid).unwrap();
    add_element(&mut net, &RcElement::new("c", 1.0, 1.0, 0.0).with_volume(1.0)).unwrap();
    let mut solver = Solver::new(net);
    solver.setup(SolverOptions::default()).unwrap();
    solver.solve().unwrap();
    solver
}

#[test]
fn save_and_reload_preserves_columns_and_rows() {
    let dir = unique_temp_dir("mc_results_roundtrip");
    let store = RunStore::new(dir.clone()).expect("failed to create run store");
    let solver = solved_decay("decay", 3);
    let net = solver.network();
    let run_id = compute_run_id(
        net.name(),
        net.all_quantity_names(),
        net.grid(),
        solver.options(),
        "0.1.0",
    );

    let manifest = store
        .save_solver(&run_id, &solver, "0.1.0")
        .expect("failed to save run");
    assert!(store.has_run(&run_id));
    assert_eq!(manifest.expected_rows(), 31);

    let (loaded, table) = store.load_table(&run_id).expect("failed to load run");
    assert_eq!(loaded, manifest);
    assert_eq!(table.names(), net.data_table().names());
    assert_eq!(
        table.n_rows(),
        solver.last_converged_cycle() * net.grid().steps_per_cycle() + 1
    );
    assert_eq!(&table, net.data_table());

    let csv = export_csv(&loaded, &store.load_timeseries(&run_id).unwrap());
    let header = csv.lines().next().unwrap();
    assert_eq!(header, format!("time,{}", net.all_quantity_names().join(",")));
    assert_eq!(csv.lines().count(), 32);

    fs::remove_dir_all(dir).ok();
}

#[test]
fn list_filters_by_network_and_delete_removes() {
    let dir = unique_temp_dir("mc_results_list");
    let store = RunStore::new(dir.clone()).unwrap();

    for (name, cycles) in [("a", 1), ("a", 2), ("b", 1)] {
        let solver = solved_decay(name, cycles);
        let run_id = format!("{name}-{cycles}");
        store.save_solver(&run_id, &solver, "v1").unwrap();
    }

    assert_eq!(store.list_runs(Some("a")).unwrap().len(), 2);
    assert_eq!(store.list_runs(Some("b")).unwrap().len(), 1);
    assert_eq!(store.list_runs(None).unwrap().len(), 3);

    store.delete_run("a-1").unwrap();
    assert!(!store.has_run("a-1"));
    assert!(matches!(
        store.load_manifest("a-1"),
        Err(ResultsError::RunNotFound { .. })
    ));
    assert_eq!(store.list_runs(Some("a")).unwrap().len(), 1);

    fs::remove_dir_all(dir).ok();
}

#[test]
fn unsolved_solver_cannot_be_saved() {
    let dir = unique_temp_dir("mc_results_unsolved");
    let store = RunStore::new(dir.clone()).unwrap();
    let net = Network::new("empty", TimeGrid::default()).unwrap();
    let solver = Solver::new(net);
    assert!(matches!(
        store.save_solver("x", &solver, "v1"),
        Err(ResultsError::NotSolved)
    ));
    fs::remove_dir_all(dir).ok();
}
