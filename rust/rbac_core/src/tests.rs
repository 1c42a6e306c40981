//! End-to-end tests for the reconciliation engine against the in-memory store.

use crate::memory::{InMemoryStore, MutationCall};
use crate::*;

// ============================================================================
// Helper builders
// ============================================================================

const NS: &str = "proj";

fn binding(name: &str, subjects: Vec<Subject>) -> RoleBinding {
    RoleBinding::new(NS, name, RoleRef::role("edit"), subjects)
}

fn run(store: &InMemoryStore, request: &RemovalRequest, mode: DispatchMode) -> (Outcome, Vec<String>) {
    let mut lines: Vec<ReportLine> = Vec::new();
    let outcome = reconcile(NS, request, mode, store, store, &mut lines).unwrap();
    (outcome, lines.iter().map(ToString::to_string).collect())
}

fn call_names(store: &InMemoryStore) -> Vec<String> {
    store.calls().iter().map(|c| c.name().to_string()).collect()
}

// ============================================================================
// Actions
// ============================================================================

#[test]
fn update_and_delete_are_dispatched() {
    let store = InMemoryStore::with_bindings([
        binding(
            "editors",
            vec![Subject::user("alice"), Subject::user("bob"), Subject::group("devs")],
        ),
        binding("solo", vec![Subject::user("alice")]),
    ]);

    let (outcome, _) = run(&store, &RemovalRequest::users(["alice"]), DispatchMode::Live);
    let report = outcome.report().unwrap();

    assert_eq!(report.bindings_updated, 1);
    assert_eq!(report.bindings_deleted, 1);

    let editors = store.get(NS, "editors").unwrap();
    assert_eq!(editors.subjects, vec![Subject::user("bob"), Subject::group("devs")]);
    assert!(store.get(NS, "solo").is_none());

    let calls = store.calls();
    assert!(matches!(&calls[0], MutationCall::Delete { name, .. } if name == "solo"));
    assert!(matches!(&calls[1], MutationCall::Update(b) if b.name() == "editors"));
}

#[test]
fn duplicate_subjects_are_all_removed() {
    let store = InMemoryStore::with_bindings([binding(
        "dup",
        vec![Subject::user("alice"), Subject::group("devs"), Subject::user("alice")],
    )]);

    run(&store, &RemovalRequest::users(["alice"]), DispatchMode::Live);

    let dup = store.get(NS, "dup").unwrap();
    assert_eq!(dup.subjects, vec![Subject::group("devs")]);
}

#[test]
fn untouched_bindings_are_not_dispatched_or_reported() {
    let store = InMemoryStore::with_bindings([
        binding("other", vec![Subject::user("bob")]),
        binding("empty", vec![]),
    ]);

    let (_, lines) = run(&store, &RemovalRequest::users(["bob"]), DispatchMode::Live);

    assert_eq!(call_names(&store), vec!["other"]);
    assert_eq!(lines, vec!["Removing proj/edit from users [bob] in project proj."]);
    assert!(store.get(NS, "empty").is_some());
}

#[test]
fn service_accounts_survive_user_removal() {
    let store = InMemoryStore::with_bindings([binding(
        "mixed",
        vec![Subject::user("ci"), Subject::service_account(NS, "ci")],
    )]);

    let (outcome, _) = run(&store, &RemovalRequest::users(["ci"]), DispatchMode::Live);

    assert_eq!(
        store.get(NS, "mixed").unwrap().subjects,
        vec![Subject::service_account(NS, "ci")]
    );
    assert!(outcome.report().unwrap().service_accounts_removed.is_empty());
}

// ============================================================================
// Reporting
// ============================================================================

#[test]
fn not_found_user_yields_single_line_and_no_calls() {
    let store = InMemoryStore::with_bindings([binding("view", vec![Subject::user("bob")])]);

    let (outcome, lines) = run(&store, &RemovalRequest::users(["alice"]), DispatchMode::Live);

    assert!(store.calls().is_empty());
    assert_eq!(lines, vec!["Users [alice] were not bound to roles in project proj."]);
    let report = outcome.report().unwrap();
    assert!(report.not_found.users.contains("alice"));
    assert!(!report.has_changes());
}

#[test]
fn lines_follow_dispatch_order_then_not_found() {
    let store = InMemoryStore::with_bindings([
        binding("a", vec![Subject::user("alice"), Subject::group("devs")]),
        binding("b", vec![Subject::group("devs"), Subject::user("bob")]),
    ]);

    let request = RemovalRequest::new(["alice", "zoe"], ["devs", "ghosts"]);
    let (_, lines) = run(&store, &request, DispatchMode::Live);

    assert_eq!(
        lines,
        vec![
            "Removing proj/edit from groups [devs] in project proj.",
            "Removing proj/edit from users [alice] in project proj.",
            "Removing proj/edit from groups [devs] in project proj.",
            "Users [zoe] were not bound to roles in project proj.",
            "Groups [ghosts] were not bound to roles in project proj.",
        ]
    );
}

#[test]
fn empty_request_is_a_no_op() {
    let store = InMemoryStore::with_bindings([binding("view", vec![Subject::user("bob")])]);

    let (outcome, lines) = run(&store, &RemovalRequest::default(), DispatchMode::Live);

    assert!(lines.is_empty());
    assert!(store.calls().is_empty());
    assert_eq!(outcome.report().unwrap(), &Report::default());
}

// ============================================================================
// Ordering and idempotence
// ============================================================================

#[test]
fn dispatch_order_is_reverse_name() {
    let store = InMemoryStore::with_bindings([
        binding("a", vec![Subject::user("alice"), Subject::user("x")]),
        binding("c", vec![Subject::user("alice"), Subject::user("y")]),
        binding("b", vec![Subject::user("alice"), Subject::user("z")]),
    ]);

    run(&store, &RemovalRequest::users(["alice"]), DispatchMode::Live);

    assert_eq!(call_names(&store), vec!["c", "b", "a"]);
}

#[test]
fn second_run_changes_nothing() {
    let store = InMemoryStore::with_bindings([
        binding("one", vec![Subject::user("alice"), Subject::user("bob")]),
        binding("two", vec![Subject::group("devs")]),
    ]);
    let request = RemovalRequest::new(["alice"], ["devs"]);

    let (first, first_lines) = run(&store, &request, DispatchMode::Live);
    assert!(first.report().unwrap().has_changes());
    assert_eq!(first_lines.len(), 2);
    let calls_after_first = store.calls().len();

    let (second, second_lines) = run(&store, &request, DispatchMode::Live);
    let report = second.report().unwrap();
    assert!(!report.has_changes());
    assert!(report.users_removed.is_empty());
    assert!(report.groups_removed.is_empty());
    assert_eq!(store.calls().len(), calls_after_first);
    // only the informational not-found lines remain
    assert_eq!(
        second_lines,
        vec![
            "Users [alice] were not bound to roles in project proj.",
            "Groups [devs] were not bound to roles in project proj.",
        ]
    );
}

// ============================================================================
// Modes
// ============================================================================

#[test]
fn dry_run_reports_like_live_without_calls() {
    let bindings = [
        binding("one", vec![Subject::user("alice"), Subject::user("bob")]),
        binding("two", vec![Subject::user("alice")]),
    ];
    let request = RemovalRequest::users(["alice", "nobody"]);

    let dry_store = InMemoryStore::with_bindings(bindings.clone());
    let (dry, dry_lines) = run(&dry_store, &request, DispatchMode::DryRun);

    let live_store = InMemoryStore::with_bindings(bindings);
    let (live, live_lines) = run(&live_store, &request, DispatchMode::Live);

    assert!(dry_store.calls().is_empty());
    assert_eq!(dry_store.len(), 2);
    assert_eq!(live_store.calls().len(), 2);
    assert_eq!(dry, live);
    assert_eq!(dry_lines, live_lines);
}

#[test]
fn accumulate_only_collects_mutated_bindings() {
    let store = InMemoryStore::with_bindings([
        binding("keep", vec![Subject::user("bob")]),
        binding("solo", vec![Subject::user("alice")]),
        binding("pair", vec![Subject::user("alice"), Subject::user("bob")]),
    ]);

    let (outcome, lines) = run(&store, &RemovalRequest::users(["alice", "ghost"]), DispatchMode::AccumulateOnly);

    assert!(lines.is_empty());
    assert!(store.calls().is_empty());

    let list = outcome.accumulated().unwrap();
    assert_eq!(list.kind, "List");
    let names: Vec<&str> = list.items.iter().map(RoleBinding::name).collect();
    assert_eq!(names, vec!["solo", "pair"]);
    assert!(list.items[0].subjects.is_empty());
    assert_eq!(list.items[1].subjects, vec![Subject::user("bob")]);
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn listing_failure_aborts_before_mutation() {
    let store = InMemoryStore::with_bindings([binding("solo", vec![Subject::user("alice")])]);
    store.fail_listing("connection refused");

    let mut lines: Vec<ReportLine> = Vec::new();
    let err = reconcile(
        NS,
        &RemovalRequest::users(["alice"]),
        DispatchMode::Live,
        &store,
        &store,
        &mut lines,
    )
    .unwrap_err();

    assert!(err.is_backend());
    assert!(err.to_string().contains("connection refused"));
    assert!(store.calls().is_empty());
    assert!(lines.is_empty());
}

#[test]
fn mutation_failure_stops_loop_and_keeps_earlier_changes() {
    let store = InMemoryStore::with_bindings([
        binding("a", vec![Subject::user("alice"), Subject::user("x")]),
        binding("b", vec![Subject::user("alice"), Subject::user("y")]),
        binding("c", vec![Subject::user("alice"), Subject::user("z")]),
    ]);
    store.fail_mutation_of("b");

    let mut lines: Vec<ReportLine> = Vec::new();
    let err = reconcile(
        NS,
        &RemovalRequest::users(["alice"]),
        DispatchMode::Live,
        &store,
        &store,
        &mut lines,
    )
    .unwrap_err();

    assert_eq!(err.binding_name(), Some("b"));
    assert!(matches!(err, ReconcileError::Mutation { action: Action::Update, .. }));
    // c went through, a was never attempted
    assert_eq!(call_names(&store), vec!["c"]);
    assert_eq!(store.get(NS, "a").unwrap().subjects.len(), 2);
    assert_eq!(lines.len(), 1);
}

#[test]
fn bindings_without_namespace_inherit_the_requested_one() {
    let mut bare = binding("bare", vec![Subject::user("alice")]);
    bare.metadata.namespace = None;

    struct Fixed(Vec<RoleBinding>);
    impl Lister for Fixed {
        fn list(&self, _namespace: &str) -> std::result::Result<Vec<RoleBinding>, CollaboratorError> {
            Ok(self.0.clone())
        }
    }

    let lister = Fixed(vec![bare]);
    let store = InMemoryStore::with_bindings([binding("bare", vec![Subject::user("alice")])]);

    let mut lines = NullReport;
    reconcile(NS, &RemovalRequest::users(["alice"]), DispatchMode::Live, &lister, &store, &mut lines).unwrap();

    assert!(matches!(
        &store.calls()[0],
        MutationCall::Delete { namespace, name } if namespace == NS && name == "bare"
    ));
}
