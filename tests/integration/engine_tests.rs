//! Engine integration tests
//!
//! These tests drive the fixpoint engine with a scripted analyzer and a fixed
//! edge list, so the seeding, cascading and cleanup rules can be checked
//! without depending on any module syntax.

use deadexport::analysis::Position;
use deadexport::engine::NoopObserver;
use deadexport::store::StoreSnapshot;
use deadexport::{
    AnalysisRequest, AnalysisResult, Analyzer, AnalyzerError, EditObserver, EdgeExtractor, Engine,
    EngineError, EngineOptions, ImportEdge, ModuleStore, RemovedExport, RunOutcome,
};
use std::sync::Mutex;

/// Analyzer whose verdict is spelled out in the module text:
/// `@fail` errors, `@delete` deletes, `@strip` removes one export named
/// `stripped`, anything else is left alone. `@tidy` is dropped by the
/// secondary cleanup.
#[derive(Default)]
struct ScriptedAnalyzer {
    calls: Mutex<Vec<(String, bool)>>,
}

impl ScriptedAnalyzer {
    fn calls(&self) -> Vec<(String, bool)> {
        self.calls.lock().unwrap().clone()
    }

    fn count(&self, path: &str) -> usize {
        self.calls().iter().filter(|(p, _)| p == path).count()
    }
}

impl Analyzer for ScriptedAnalyzer {
    fn analyze(&self, request: &AnalysisRequest<'_>) -> Result<AnalysisResult, AnalyzerError> {
        self.calls
            .lock()
            .unwrap()
            .push((request.path.to_string(), request.allow_delete));

        let text = request
            .store
            .get(request.path)
            .ok_or_else(|| AnalyzerError::MissingModule(request.path.to_string()))?;

        if text.contains("@fail") {
            return Err(AnalyzerError::Other("scripted failure".to_string()));
        }
        if text.contains("@delete") && request.allow_delete {
            return Ok(AnalysisResult::Delete);
        }
        if text.contains("@strip") {
            return Ok(AnalysisResult::Edit {
                content: text.replacen("@strip", "", 1),
                removed: vec![RemovedExport::new(
                    "stripped",
                    Position { line: 1, column: 1 },
                )],
            });
        }
        Ok(AnalysisResult::unchanged(text))
    }

    fn remove_whole_reexport(&self, text: &str, specifier: &str) -> Option<String> {
        let statement = format!("export * from '{}';\n", specifier);
        text.contains(&statement)
            .then(|| text.replacen(&statement, "", 1))
    }

    fn cleanup(&self, _path: &str, text: &str) -> Option<String> {
        text.contains("@tidy").then(|| text.replace("@tidy", ""))
    }
}

/// Edge extractor returning a fixed edge list
struct FixedEdges(Vec<ImportEdge>);

impl EdgeExtractor for FixedEdges {
    fn extract(&self, _store: &StoreSnapshot, _entrypoints: &[String]) -> Vec<ImportEdge> {
        self.0.clone()
    }
}

/// Observer that records every event as a string
#[derive(Default)]
struct EventLog(Vec<String>);

impl EditObserver for EventLog {
    fn start(&mut self, path: &str, _previous: &str) {
        self.0.push(format!("start {}", path));
    }

    fn delete(&mut self, path: &str) {
        self.0.push(format!("delete {}", path));
    }

    fn remove_export(&mut self, path: &str, export: &RemovedExport) {
        self.0.push(format!("remove {} {}", path, export.symbol));
    }

    fn end(&mut self, path: &str) {
        self.0.push(format!("end {}", path));
    }
}

fn store(files: &[(&str, &str)]) -> ModuleStore {
    files.iter().copied().collect()
}

fn options(entrypoints: &[&str]) -> EngineOptions {
    EngineOptions {
        entrypoints: entrypoints.iter().map(|e| e.to_string()).collect(),
        concurrency: 1,
        ..EngineOptions::default()
    }
}

fn run_engine(
    analyzer: &ScriptedAnalyzer,
    files: &[(&str, &str)],
    edges: Vec<ImportEdge>,
    options: EngineOptions,
) -> Result<RunOutcome, EngineError> {
    let extractor = FixedEdges(edges);
    Engine::new(analyzer, &extractor, options).run(store(files), &mut NoopObserver)
}

// ============================================================================
// Configuration Errors
// ============================================================================

#[test]
fn test_no_entrypoints_is_an_error() {
    let analyzer = ScriptedAnalyzer::default();
    let result = run_engine(&analyzer, &[("a.ts", "")], Vec::new(), options(&[]));

    assert!(matches!(result, Err(EngineError::NoEntrypoints)));
    assert!(analyzer.calls().is_empty());
}

#[test]
fn test_missing_entrypoint_is_an_error() {
    let analyzer = ScriptedAnalyzer::default();
    let result = run_engine(&analyzer, &[("a.ts", "")], Vec::new(), options(&["main.ts"]));

    match result {
        Err(EngineError::MissingEntrypoint(path)) => assert_eq!(path, "main.ts"),
        other => panic!("expected a missing entrypoint error, got {:?}", other.map(|o| o.summary)),
    }
}

#[test]
fn test_analyzer_error_aborts_the_run() {
    let analyzer = ScriptedAnalyzer::default();
    let result = run_engine(
        &analyzer,
        &[("main.ts", ""), ("a.ts", "@fail")],
        vec![ImportEdge::new("main.ts", "a.ts")],
        options(&["main.ts"]),
    );

    match result {
        Err(EngineError::Analyzer { path, .. }) => assert_eq!(path, "a.ts"),
        other => panic!("expected an analyzer error, got {:?}", other.map(|o| o.summary)),
    }
}

// ============================================================================
// Seeding
// ============================================================================

#[test]
fn test_unreachable_module_deleted_without_analysis() {
    let analyzer = ScriptedAnalyzer::default();
    let outcome = run_engine(
        &analyzer,
        &[("main.ts", ""), ("a.ts", ""), ("orphan.ts", "")],
        vec![ImportEdge::new("main.ts", "a.ts")],
        options(&["main.ts"]),
    )
    .unwrap();

    assert!(!outcome.store.exists("orphan.ts"));
    assert!(!outcome.graph.contains("orphan.ts"));
    assert!(outcome.summary.deleted.contains("orphan.ts"));
    assert_eq!(analyzer.calls(), vec![("a.ts".to_string(), true)]);
}

#[test]
fn test_unreachable_module_analyzed_when_deletion_disabled() {
    let analyzer = ScriptedAnalyzer::default();
    let outcome = run_engine(
        &analyzer,
        &[("main.ts", ""), ("a.ts", ""), ("orphan.ts", "@delete @strip")],
        vec![ImportEdge::new("main.ts", "a.ts")],
        EngineOptions {
            delete_unused_modules: false,
            ..options(&["main.ts"])
        },
    )
    .unwrap();

    // Orphans are analyzed first and never offered deletion
    assert_eq!(
        analyzer.calls(),
        vec![("orphan.ts".to_string(), false), ("a.ts".to_string(), false)]
    );
    assert_eq!(outcome.store.get("orphan.ts"), Some("@delete "));
    assert!(outcome.summary.deleted.is_empty());
}

#[test]
fn test_skip_marker_keeps_every_unreachable_module() {
    let analyzer = ScriptedAnalyzer::default();
    let outcome = run_engine(
        &analyzer,
        &[
            ("main.ts", ""),
            ("x1.ts", ""),
            ("x2.ts", "// deadexport-skip"),
            ("x3.ts", ""),
        ],
        Vec::new(),
        options(&["main.ts"]),
    )
    .unwrap();

    // The marker in x2 also protects x1, which sorts before it
    assert!(outcome.store.exists("x1.ts"));
    assert!(outcome.store.exists("x2.ts"));
    assert!(outcome.store.exists("x3.ts"));
    assert!(outcome.summary.deleted.is_empty());
    assert_eq!(
        analyzer.calls(),
        vec![
            ("x1.ts".to_string(), false),
            ("x2.ts".to_string(), false),
            ("x3.ts".to_string(), false),
        ]
    );
}

#[test]
fn test_custom_skip_marker() {
    let custom = EngineOptions {
        skip_marker: "@keep".to_string(),
        ..options(&["main.ts"])
    };
    let analyzer = ScriptedAnalyzer::default();

    let outcome = run_engine(
        &analyzer,
        &[("main.ts", ""), ("x1.ts", "// deadexport-skip")],
        Vec::new(),
        custom.clone(),
    )
    .unwrap();
    assert!(!outcome.store.exists("x1.ts"));

    let outcome = run_engine(
        &analyzer,
        &[("main.ts", ""), ("x1.ts", "// deadexport-skip"), ("x2.ts", "@keep")],
        Vec::new(),
        custom,
    )
    .unwrap();
    assert!(outcome.store.exists("x1.ts"));
    assert!(outcome.store.exists("x2.ts"));
}

#[test]
fn test_reachable_modules_run_nearest_first() {
    let analyzer = ScriptedAnalyzer::default();
    run_engine(
        &analyzer,
        &[("main.ts", ""), ("a.ts", ""), ("b.ts", ""), ("c.ts", "")],
        vec![
            ImportEdge::new("main.ts", "c.ts"),
            ImportEdge::new("c.ts", "b.ts"),
            ImportEdge::new("b.ts", "a.ts"),
        ],
        options(&["main.ts"]),
    )
    .unwrap();

    let order: Vec<String> = analyzer.calls().into_iter().map(|(p, _)| p).collect();
    assert_eq!(order, vec!["c.ts", "b.ts", "a.ts"]);
}

// ============================================================================
// Applying Results
// ============================================================================

#[test]
fn test_delete_verdict_removes_module_and_vertex() {
    let analyzer = ScriptedAnalyzer::default();
    let outcome = run_engine(
        &analyzer,
        &[("main.ts", ""), ("a.ts", "@delete"), ("b.ts", "")],
        vec![ImportEdge::new("main.ts", "a.ts"), ImportEdge::new("a.ts", "b.ts")],
        options(&["main.ts"]),
    )
    .unwrap();

    assert!(!outcome.store.exists("a.ts"));
    assert!(outcome.graph.vertex("a.ts").is_none());
    assert!(outcome.graph.importers("b.ts").is_empty());
    assert!(outcome.graph.importees("main.ts").is_empty());
    assert!(outcome.store.exists("b.ts"));
}

#[test]
fn test_edit_cascades_to_importees() {
    let analyzer = ScriptedAnalyzer::default();
    let outcome = run_engine(
        &analyzer,
        &[("main.ts", ""), ("a.ts", ""), ("z.ts", "@strip")],
        vec![
            ImportEdge::new("main.ts", "a.ts"),
            ImportEdge::new("main.ts", "z.ts"),
            ImportEdge::new("z.ts", "a.ts"),
        ],
        options(&["main.ts"]),
    )
    .unwrap();

    assert_eq!(outcome.store.get("z.ts"), Some(""));
    assert_eq!(outcome.summary.removed_exports, 1);
    assert!(outcome.summary.edited.contains("z.ts"));
    assert_eq!(analyzer.count("a.ts"), 2);
    assert_eq!(analyzer.count("z.ts"), 1);
}

#[test]
fn test_no_cascade_when_disabled() {
    let analyzer = ScriptedAnalyzer::default();
    let outcome = run_engine(
        &analyzer,
        &[("main.ts", ""), ("a.ts", ""), ("z.ts", "@strip")],
        vec![
            ImportEdge::new("main.ts", "a.ts"),
            ImportEdge::new("main.ts", "z.ts"),
            ImportEdge::new("z.ts", "a.ts"),
        ],
        EngineOptions {
            cascade: false,
            ..options(&["main.ts"])
        },
    )
    .unwrap();

    assert_eq!(outcome.store.get("z.ts"), Some(""));
    assert_eq!(analyzer.count("a.ts"), 1);
    assert_eq!(outcome.summary.scheduler.executed, 2);
}

#[test]
fn test_unchanged_result_is_a_noop() {
    let analyzer = ScriptedAnalyzer::default();
    let mut log = EventLog::default();
    let extractor = FixedEdges(vec![ImportEdge::new("main.ts", "a.ts")]);
    let outcome = Engine::new(&analyzer, &extractor, options(&["main.ts"]))
        .run(store(&[("main.ts", ""), ("a.ts", "plain")]), &mut log)
        .unwrap();

    assert!(outcome.summary.is_unchanged());
    assert!(log.0.is_empty());
    assert_eq!(outcome.store.version("a.ts"), Some(0));
}

#[test]
fn test_entrypoints_are_never_analyzed_or_deleted() {
    let analyzer = ScriptedAnalyzer::default();
    let outcome = run_engine(
        &analyzer,
        &[("main.ts", "@delete"), ("z.ts", "@strip")],
        vec![
            ImportEdge::new("main.ts", "z.ts"),
            ImportEdge::new("z.ts", "main.ts"),
        ],
        options(&["main.ts"]),
    )
    .unwrap();

    assert_eq!(outcome.store.get("main.ts"), Some("@delete"));
    assert_eq!(analyzer.count("main.ts"), 0);
}

#[test]
fn test_observer_sees_lifecycle_in_order() {
    let analyzer = ScriptedAnalyzer::default();
    let mut log = EventLog::default();
    let extractor = FixedEdges(vec![
        ImportEdge::new("main.ts", "a.ts"),
        ImportEdge::new("main.ts", "b.ts"),
    ]);
    Engine::new(&analyzer, &extractor, options(&["main.ts"]))
        .run(
            store(&[("main.ts", ""), ("a.ts", "@delete"), ("b.ts", "@strip")]),
            &mut log,
        )
        .unwrap();

    assert_eq!(
        log.0,
        vec![
            "start a.ts",
            "delete a.ts",
            "end a.ts",
            "start b.ts",
            "remove b.ts stripped",
            "end b.ts",
        ]
    );
}

// ============================================================================
// Deferred Cleanup
// ============================================================================

#[test]
fn test_whole_reexport_removed_after_target_deleted() {
    let analyzer = ScriptedAnalyzer::default();
    let outcome = run_engine(
        &analyzer,
        &[
            ("main.ts", ""),
            ("d.ts", "export * from './c';\nconst d = 1;\n"),
            ("c.ts", "@delete"),
        ],
        vec![
            ImportEdge::new("main.ts", "d.ts"),
            ImportEdge::whole_reexport("d.ts", "c.ts", "./c"),
        ],
        options(&["main.ts"]),
    )
    .unwrap();

    assert!(!outcome.store.exists("c.ts"));
    assert_eq!(outcome.store.get("d.ts"), Some("const d = 1;\n"));
    assert_eq!(outcome.summary.reexports_cleaned, 1);
    assert!(outcome.summary.edited.contains("d.ts"));
}

#[test]
fn test_whole_reexport_cleanup_skips_deleted_importer() {
    let analyzer = ScriptedAnalyzer::default();
    let outcome = run_engine(
        &analyzer,
        &[
            ("main.ts", ""),
            ("d.ts", "export * from './c';\n@delete"),
            ("c.ts", "@delete"),
        ],
        vec![
            ImportEdge::new("main.ts", "d.ts"),
            ImportEdge::whole_reexport("d.ts", "c.ts", "./c"),
        ],
        options(&["main.ts"]),
    )
    .unwrap();

    assert!(!outcome.store.exists("c.ts"));
    assert!(!outcome.store.exists("d.ts"));
    assert_eq!(outcome.summary.reexports_cleaned, 0);
}

#[test]
fn test_secondary_cleanup_only_touches_edited_modules() {
    let analyzer = ScriptedAnalyzer::default();
    let files = [
        ("main.ts", ""),
        ("a.ts", "@strip@tidy"),
        ("b.ts", "@tidy"),
    ];
    let edges = vec![
        ImportEdge::new("main.ts", "a.ts"),
        ImportEdge::new("main.ts", "b.ts"),
    ];

    let outcome = run_engine(
        &analyzer,
        &files,
        edges.clone(),
        EngineOptions {
            secondary_cleanup: true,
            ..options(&["main.ts"])
        },
    )
    .unwrap();
    assert_eq!(outcome.store.get("a.ts"), Some(""));
    assert_eq!(outcome.store.get("b.ts"), Some("@tidy"));
    assert!(outcome.summary.cleaned_up.contains("a.ts"));

    let outcome = run_engine(&analyzer, &files, edges, options(&["main.ts"])).unwrap();
    assert_eq!(outcome.store.get("a.ts"), Some("@tidy"));
    assert!(outcome.summary.cleaned_up.is_empty());
}

#[test]
fn test_cleanup_rechecks_importees_of_cleaned_modules() {
    let files = [("main.ts", ""), ("a.ts", "@strip@tidy"), ("b.ts", "")];
    let edges = vec![
        ImportEdge::new("main.ts", "a.ts"),
        ImportEdge::new("a.ts", "b.ts"),
    ];

    // Cascade is off, so only the cleanup round can bring `b` back
    let analyzer = ScriptedAnalyzer::default();
    let outcome = run_engine(
        &analyzer,
        &files,
        edges.clone(),
        EngineOptions {
            cascade: false,
            secondary_cleanup: true,
            ..options(&["main.ts"])
        },
    )
    .unwrap();
    assert!(outcome.summary.cleaned_up.contains("a.ts"));
    assert_eq!(analyzer.count("a.ts"), 1);
    assert_eq!(analyzer.count("b.ts"), 2);

    let analyzer = ScriptedAnalyzer::default();
    run_engine(
        &analyzer,
        &files,
        edges,
        EngineOptions {
            cascade: false,
            ..options(&["main.ts"])
        },
    )
    .unwrap();
    assert_eq!(analyzer.count("b.ts"), 1);
}

// ============================================================================
// Concurrency
// ============================================================================

/// A layered graph: main imports every `l1_*`, each `l1_*` imports every `l2_*`
fn layered_project() -> (Vec<(String, String)>, Vec<ImportEdge>) {
    let mut files = vec![("main.ts".to_string(), String::new())];
    let mut edges = Vec::new();

    for i in 0..6 {
        let l1 = format!("l1_{}.ts", i);
        let text = match i % 3 {
            0 => "@strip",
            1 => "@delete",
            _ => "",
        };
        files.push((l1.clone(), text.to_string()));
        edges.push(ImportEdge::new("main.ts", l1.as_str()));

        for j in 0..4 {
            edges.push(ImportEdge::new(l1.as_str(), format!("l2_{}.ts", j)));
        }
    }
    for j in 0..4 {
        let text = if j % 2 == 0 { "@strip" } else { "" };
        files.push((format!("l2_{}.ts", j), text.to_string()));
    }
    for k in 0..3 {
        files.push((format!("orphan_{}.ts", k), "@strip".to_string()));
    }

    (files, edges)
}

#[test]
fn test_concurrency_does_not_change_the_result() {
    let (files, edges) = layered_project();
    let files: Vec<(&str, &str)> = files
        .iter()
        .map(|(p, t)| (p.as_str(), t.as_str()))
        .collect();

    let sequential = run_engine(
        &ScriptedAnalyzer::default(),
        &files,
        edges.clone(),
        options(&["main.ts"]),
    )
    .unwrap();

    for concurrency in [2, 4, 8] {
        let analyzer = ScriptedAnalyzer::default();
        let pooled = run_engine(
            &analyzer,
            &files,
            edges.clone(),
            EngineOptions {
                concurrency,
                ..options(&["main.ts"])
            },
        )
        .unwrap();

        assert!(pooled.store.same_contents(&sequential.store));
        assert_eq!(pooled.summary.deleted, sequential.summary.deleted);
        assert_eq!(pooled.summary.edited, sequential.summary.edited);
        assert_eq!(pooled.summary.removed_exports, sequential.summary.removed_exports);
    }

    assert_eq!(sequential.summary.deleted.len(), 2 + 3);
    assert!(sequential.store.exists("l2_0.ts"));
}
