use std::collections::BTreeSet;

use proptest::prelude::*;
use wdx_core::report::{CucumberFile, ExecutionFile, ExecutionSuite, ExecutionTest, TestState};
use wdx_core::tree::{
    reconcile_children, DesiredChild, HostEvent, ReportReconciler, RunLedger, ROOT_ID,
};
use wdx_core::{ExecutionReport, RecordingHost, RunState, TestTree};

const CONFIG_ID: &str = "/work/app";

/// A tree holding one configuration node, already announced to `host`.
fn tree_with_config(host: &mut RecordingHost) -> TestTree {
    let mut tree = TestTree::new();
    let config = DesiredChild {
        uri: Some("/work/app/wdio.conf.js".into()),
        ..DesiredChild::new(CONFIG_ID, "app")
    };
    reconcile_children(tree.root_mut(), &[config], host);
    host.clear();
    tree
}

fn reconcile(tree: &mut TestTree, report: &ExecutionReport, host: &mut RecordingHost) -> RunLedger {
    let mut ledger = RunLedger::new();
    let config = tree.get_mut(CONFIG_ID).expect("config node");
    for id in config.subtree_ids() {
        ledger.enqueue(&id, host);
        ledger.start(&id, host);
    }
    ReportReconciler::new(&mut ledger).reconcile(config, report, host);
    ledger
}

fn tree_ids(tree: &TestTree) -> BTreeSet<String> {
    tree.root()
        .subtree_ids()
        .into_iter()
        .filter(|id| id != ROOT_ID)
        .collect()
}

fn state_of(code: u8) -> TestState {
    match code % 3 {
        0 => TestState::Passed,
        1 => TestState::Failed,
        _ => TestState::Skipped,
    }
}

/// A mocha report: one file per entry, each a list of suites with test
/// state codes.
fn mocha_report(files: &[Vec<(String, Vec<u8>)>]) -> ExecutionReport {
    ExecutionReport::Mocha(
        files
            .iter()
            .enumerate()
            .map(|(i, suites)| ExecutionFile {
                name: format!("results-{i}-0.json"),
                specs: vec![format!("file:///work/app/test/spec{i}.e2e.js")],
                suites: suites
                    .iter()
                    .map(|(name, tests)| ExecutionSuite {
                        name: name.clone(),
                        duration: 12.0,
                        start: String::new(),
                        end: String::new(),
                        session_id: "s".to_string(),
                        tests: tests
                            .iter()
                            .enumerate()
                            .map(|(j, code)| ExecutionTest {
                                name: format!("{name} case {j}"),
                                start: String::new(),
                                end: String::new(),
                                duration: 3.0,
                                state: state_of(*code),
                                error_type: None,
                                error: (state_of(*code) == TestState::Failed)
                                    .then(|| "boom".to_string()),
                                standard_error: None,
                                range: None,
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect(),
    )
}

fn files_strategy() -> impl Strategy<Value = Vec<Vec<(String, Vec<u8>)>>> {
    prop::collection::vec(
        prop::collection::vec(
            ("[a-c]{1,2}", prop::collection::vec(any::<u8>(), 0..4)),
            0..3,
        ),
        0..3,
    )
}

const FEATURES: &str = r#"[
  {
    "keyword": "Feature",
    "line": 1,
    "name": "Checkout",
    "uri": "/work/app/features/checkout.feature",
    "id": "checkout",
    "elements": [
      {
        "keyword": "Scenario",
        "type": "scenario",
        "name": "pay by card",
        "id": "checkout;pay-by-card",
        "line": 3,
        "steps": [
          { "keyword": "Before", "hidden": true, "result": { "status": "passed", "duration": 10 } },
          { "keyword": "Given ", "name": "a full cart", "line": 4,
            "result": { "status": "passed", "duration": 1000000 } },
          { "keyword": "When ", "name": "I pay", "line": 5,
            "result": { "status": "undefined" } },
          { "keyword": "After", "hidden": true, "result": { "status": "passed", "duration": 10 } }
        ]
      }
    ]
  }
]"#;

#[test]
fn test_cucumber_report_builds_visible_steps_only() {
    let mut host = RecordingHost::new();
    let mut tree = tree_with_config(&mut host);
    let report = ExecutionReport::Cucumber(vec![
        CucumberFile::from_json("checkout.json", FEATURES).unwrap(),
    ]);

    let ledger = reconcile(&mut tree, &report, &mut host);

    let scenario = "/work/app_checkout.json_0_checkout;pay-by-card_0";
    let steps: Vec<(String, String)> = tree
        .get(scenario)
        .unwrap()
        .children
        .iter()
        .map(|s| (s.id.clone(), s.label.clone()))
        .collect();
    assert_eq!(
        steps,
        vec![
            (format!("{scenario}_0"), "Given a full cart".to_string()),
            (format!("{scenario}_1"), "When I pay".to_string()),
        ]
    );

    assert_eq!(ledger.state(&format!("{scenario}_0")), RunState::Passed);
    assert_eq!(ledger.state(&format!("{scenario}_1")), RunState::Failed);
    assert!(host.events.contains(&HostEvent::Failed {
        id: format!("{scenario}_1"),
        message: "Step undefined".to_string(),
    }));
    assert_eq!(ledger.counts().passed, 1);
    assert_eq!(ledger.counts().failed, 1);
}

#[test]
fn test_created_nodes_are_started_before_their_outcome() {
    let mut host = RecordingHost::new();
    let mut tree = tree_with_config(&mut host);
    let report = mocha_report(&[vec![("login".to_string(), vec![0])]]);

    reconcile(&mut tree, &report, &mut host);

    let test_id = "/work/app_results-0-0.json_0_0";
    let events: Vec<&HostEvent> = host
        .events
        .iter()
        .filter(|e| match e {
            HostEvent::Enqueued(id) | HostEvent::Started(id) | HostEvent::Passed(id) => {
                id == test_id
            }
            _ => false,
        })
        .collect();
    assert_eq!(
        events,
        vec![
            &HostEvent::Enqueued(test_id.to_string()),
            &HostEvent::Started(test_id.to_string()),
            &HostEvent::Passed(test_id.to_string()),
        ]
    );
}

#[test]
fn test_relabelled_suite_is_announced_again() {
    let mut host = RecordingHost::new();
    let mut tree = tree_with_config(&mut host);
    reconcile(&mut tree, &mocha_report(&[vec![("login".to_string(), vec![0])]]), &mut host);
    host.clear();

    let ledger = reconcile(&mut tree, &mocha_report(&[vec![("auth".to_string(), vec![0])]]), &mut host);

    let suite_id = "/work/app_results-0-0.json_0";
    let test_id = "/work/app_results-0-0.json_0_0";
    assert_eq!(tree.get(suite_id).unwrap().label, "auth");
    for id in [suite_id, test_id] {
        let position = |wanted: &HostEvent| host.events.iter().rposition(|e| e == wanted);
        let created = host
            .events
            .iter()
            .rposition(|e| matches!(e, HostEvent::Created { id: created, .. } if created == id))
            .expect("node recreated");
        let enqueued = position(&HostEvent::Enqueued(id.to_string())).expect("enqueued again");
        let started = position(&HostEvent::Started(id.to_string())).expect("started again");
        assert!(created < enqueued && enqueued < started, "{id} announced out of order");
    }
    assert!(host.events.contains(&HostEvent::Passed(test_id.to_string())));
    assert_eq!(ledger.state(test_id), RunState::Passed);
    assert_eq!(ledger.counts().passed, 1);
}

#[test]
fn test_leaves_inherit_the_file_uri() {
    let mut host = RecordingHost::new();
    let mut tree = tree_with_config(&mut host);
    let report = mocha_report(&[vec![("login".to_string(), vec![0])]]);

    reconcile(&mut tree, &report, &mut host);

    let test = tree.get("/work/app_results-0-0.json_0_0").unwrap();
    assert_eq!(
        test.uri.as_deref(),
        Some(std::path::Path::new("/work/app/test/spec0.e2e.js"))
    );
}

proptest! {
    /// Reconciling the same report twice touches nothing the second time.
    #[test]
    fn reconcile_is_idempotent(files in files_strategy()) {
        let mut host = RecordingHost::new();
        let mut tree = tree_with_config(&mut host);
        let report = mocha_report(&files);

        reconcile(&mut tree, &report, &mut host);
        host.clear();
        reconcile(&mut tree, &report, &mut host);

        prop_assert_eq!(host.mutation_count(), 0);
    }

    /// After any sequence of reports, the host shows exactly the tree.
    #[test]
    fn host_mirrors_tree(before in files_strategy(), after in files_strategy()) {
        let mut host = RecordingHost::new();
        let mut tree = tree_with_config(&mut host);

        reconcile(&mut tree, &mocha_report(&before), &mut host);
        reconcile(&mut tree, &mocha_report(&after), &mut host);

        let live: BTreeSet<String> = host.live_ids().into_iter().collect();
        prop_assert_eq!(live, tree_ids(&tree));
        prop_assert_eq!(
            tree.get(CONFIG_ID).unwrap().children.len(),
            after.len()
        );
    }
}
