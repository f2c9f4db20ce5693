//! End-to-end scenarios with the ES module backend
//!
//! Each test builds a small TypeScript project in memory, runs the engine to
//! its fixpoint and checks the resulting module texts.

use deadexport::engine::NoopObserver;
use deadexport::{
    AnalysisRequest, AnalysisResult, Analyzer, AnalyzerError, Engine, EngineOptions, EsAnalyzer,
    EsEdgeExtractor, ModuleStore, RunOutcome,
};
use std::sync::Mutex;

/// Wraps [`EsAnalyzer`] and records which modules were analyzed
#[derive(Default)]
struct CountingAnalyzer {
    inner: EsAnalyzer,
    calls: Mutex<Vec<String>>,
}

impl CountingAnalyzer {
    fn count(&self, path: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|p| *p == path).count()
    }
}

impl Analyzer for CountingAnalyzer {
    fn analyze(&self, request: &AnalysisRequest<'_>) -> Result<AnalysisResult, AnalyzerError> {
        self.calls.lock().unwrap().push(request.path.to_string());
        self.inner.analyze(request)
    }

    fn remove_whole_reexport(&self, text: &str, specifier: &str) -> Option<String> {
        self.inner.remove_whole_reexport(text, specifier)
    }

    fn cleanup(&self, path: &str, text: &str) -> Option<String> {
        self.inner.cleanup(path, text)
    }
}

fn options() -> EngineOptions {
    EngineOptions {
        entrypoints: vec!["main.ts".to_string()],
        concurrency: 1,
        ..EngineOptions::default()
    }
}

fn run_with<A: Analyzer>(analyzer: &A, files: &[(&str, &str)], options: EngineOptions) -> RunOutcome {
    let store: ModuleStore = files.iter().copied().collect();
    Engine::new(analyzer, &EsEdgeExtractor, options)
        .run(store, &mut NoopObserver)
        .unwrap()
}

fn run(files: &[(&str, &str)]) -> RunOutcome {
    run_with(&EsAnalyzer::default(), files, options())
}

const MAIN_USES_FOO: &str = "import { foo } from './b';\n\nconsole.log(foo());\n";

const B_FOO_AND_BAR: &str = "\
export function foo() {
  return 1;
}

/** Never imported */
export function bar() {
  return 2;
}
";

// ============================================================================
// Export Removal
// ============================================================================

#[test]
fn test_unused_export_removed_used_export_kept() {
    let outcome = run(&[("main.ts", MAIN_USES_FOO), ("b.ts", B_FOO_AND_BAR)]);

    let b = outcome.store.get("b.ts").unwrap();
    assert!(!b.contains("bar"));
    assert!(!b.contains("Never imported"));
    assert!(b.contains("export function foo()"));
    assert_eq!(outcome.store.get("main.ts"), Some(MAIN_USES_FOO));
    assert_eq!(outcome.summary.removed_exports, 1);
}

#[test]
fn test_removal_propagates_through_reexport() {
    // Once `a` stops re-exporting `util`, nothing reaches `b` any more
    let outcome = run(&[
        ("main.ts", "import { run } from './a';\nrun();\n"),
        (
            "a.ts",
            "export { util } from './b';\n\nexport function run() {\n  return 1;\n}\n",
        ),
        ("b.ts", "export function util() {\n  return 2;\n}\n"),
    ]);

    let a = outcome.store.get("a.ts").unwrap();
    assert!(!a.contains("util"));
    assert!(a.contains("export function run()"));
    assert!(!outcome.store.exists("b.ts"));
    assert!(outcome.summary.deleted.contains("b.ts"));
}

#[test]
fn test_partially_used_reexport_list() {
    let outcome = run(&[
        ("main.ts", "import { a } from './barrel';\n"),
        ("barrel.ts", "export { a, b } from './impl';\n"),
        ("impl.ts", "export const a = 1;\nexport const b = 2;\n"),
    ]);

    assert_eq!(
        outcome.store.get("barrel.ts"),
        Some("export { a } from './impl';\n")
    );
    assert_eq!(outcome.store.get("impl.ts"), Some("export const a = 1;\n"));
}

// ============================================================================
// Module Deletion
// ============================================================================

#[test]
fn test_unreachable_module_deleted() {
    let outcome = run(&[
        ("main.ts", MAIN_USES_FOO),
        ("b.ts", B_FOO_AND_BAR),
        ("c.ts", "export const c = 1;\n"),
    ]);

    assert!(!outcome.store.exists("c.ts"));
    assert!(outcome.summary.deleted.contains("c.ts"));
}

#[test]
fn test_unreachable_module_kept_when_deletion_disabled() {
    let outcome = run_with(
        &EsAnalyzer::default(),
        &[("main.ts", MAIN_USES_FOO), ("b.ts", B_FOO_AND_BAR), ("c.ts", "export const c = 1;\n")],
        EngineOptions {
            delete_unused_modules: false,
            ..options()
        },
    );

    assert_eq!(outcome.store.get("c.ts"), Some(""));
}

#[test]
fn test_default_import_of_unrecognized_exports_keeps_module() {
    let legacy = "module.exports = 42;\n";
    let outcome = run(&[
        ("main.ts", "import legacy from './legacy';\nconsole.log(legacy);\n"),
        ("legacy.js", legacy),
    ]);

    assert_eq!(outcome.store.get("legacy.js"), Some(legacy));
    assert!(outcome.summary.deleted.is_empty());
}

#[test]
fn test_exports_sharing_a_line() {
    let outcome = run(&[
        ("main.ts", "import { b } from './m';\nconsole.log(b);\n"),
        ("m.ts", "export const a = 1; export const b = 2;\n"),
    ]);

    assert_eq!(outcome.store.get("m.ts"), Some("export const b = 2;\n"));
    assert!(outcome.summary.deleted.is_empty());
}

#[test]
fn test_side_effect_import_keeps_module() {
    let outcome = run(&[
        ("main.ts", "import './polyfill';\n"),
        ("polyfill.ts", "export const installed = true;\n"),
    ]);

    assert_eq!(outcome.store.get("polyfill.ts"), Some(""));
    assert!(outcome.store.exists("polyfill.ts"));
}

#[test]
fn test_whole_reexport_removed_after_target_deleted() {
    let outcome = run(&[
        ("main.ts", "import { x } from './d';\n"),
        ("d.ts", "export * from './c';\nexport const x = 1;\n"),
        ("c.ts", "export const y = 2;\n"),
    ]);

    assert!(!outcome.store.exists("c.ts"));
    assert_eq!(outcome.store.get("d.ts"), Some("export const x = 1;\n"));
    assert_eq!(outcome.summary.reexports_cleaned, 1);
}

// ============================================================================
// Cascade Control
// ============================================================================

#[test]
fn test_importer_not_reanalyzed_without_cascade() {
    let analyzer = CountingAnalyzer::default();
    let outcome = run_with(
        &analyzer,
        &[
            ("main.ts", "import { start } from './a';\nstart();\n"),
            (
                "a.ts",
                "import { foo } from './b';\n\nexport function start() {\n  return foo();\n}\n",
            ),
            ("b.ts", B_FOO_AND_BAR),
        ],
        EngineOptions {
            cascade: false,
            ..options()
        },
    );

    assert!(!outcome.store.get("b.ts").unwrap().contains("bar"));
    assert_eq!(analyzer.count("a.ts"), 1);
    assert_eq!(analyzer.count("b.ts"), 1);
    assert_eq!(outcome.summary.scheduler.coalesced, 0);
    assert_eq!(outcome.summary.scheduler.deferred, 0);
}

#[test]
fn test_cleanup_prunes_dead_imports() {
    let analyzer = EsAnalyzer::default();
    let outcome = run_with(
        &analyzer,
        &[
            ("main.ts", "import { run } from './a';\nrun();\n"),
            (
                "a.ts",
                "import { util } from './b';\n\nexport function run() {\n  return 1;\n}\n\nexport function helper() {\n  return util();\n}\n",
            ),
            ("b.ts", "export function util() {\n  return 2;\n}\n"),
        ],
        EngineOptions {
            secondary_cleanup: true,
            ..options()
        },
    );

    let a = outcome.store.get("a.ts").unwrap();
    assert!(!a.contains("import"));
    assert!(outcome.summary.cleaned_up.contains("a.ts"));
    // With its last import gone, `b` is unused
    assert!(!outcome.store.exists("b.ts"));
}

#[test]
fn test_cleanup_result_is_stable() {
    let cleanup = EngineOptions {
        secondary_cleanup: true,
        ..options()
    };
    let first = run_with(
        &EsAnalyzer::default(),
        &[
            ("main.ts", "import { used } from './m';\nused();\n"),
            (
                "m.ts",
                "import { helper } from './h';\n\nexport function used() {\n  return 1;\n}\n\nexport function unused() {\n  return helper();\n}\n",
            ),
            (
                "h.ts",
                "export function helper() {\n  return 2;\n}\n\nexport function other() {\n  return 3;\n}\n",
            ),
        ],
        cleanup.clone(),
    );
    assert!(first.summary.cleaned_up.contains("m.ts"));
    assert!(first.summary.deleted.contains("h.ts"));

    let second = Engine::new(&EsAnalyzer::default(), &EsEdgeExtractor, cleanup)
        .run(first.store.clone(), &mut NoopObserver)
        .unwrap();
    assert!(second.summary.is_unchanged(), "{:?}", second.summary);
    assert!(second.store.same_contents(&first.store));
}

// ============================================================================
// Wildcard Usage
// ============================================================================

#[test]
fn test_namespace_import_leaves_module_untouched() {
    let util = "export const a = 1;\nexport const b = 2;\n";
    let outcome = run(&[
        ("main.ts", "import * as util from './util';\nconsole.log(util.a);\n"),
        ("util.ts", util),
    ]);

    assert_eq!(outcome.store.get("util.ts"), Some(util));
    assert!(outcome.summary.is_unchanged());
}

#[test]
fn test_dynamic_import_leaves_module_untouched() {
    let lazy = "export default function page() {}\nexport const meta = {};\n";
    let outcome = run(&[
        ("main.ts", "const page = import('./lazy');\n"),
        ("lazy.ts", lazy),
    ]);

    assert_eq!(outcome.store.get("lazy.ts"), Some(lazy));
}

// ============================================================================
// Skip Marker
// ============================================================================

#[test]
fn test_skip_marked_export_survives() {
    let outcome = run(&[
        ("main.ts", MAIN_USES_FOO),
        (
            "b.ts",
            "export function foo() {\n  return 1;\n}\n\n// deadexport-skip\nexport function bar() {\n  return 2;\n}\n",
        ),
    ]);

    assert!(outcome.store.get("b.ts").unwrap().contains("export function bar()"));
    assert_eq!(outcome.summary.removed_exports, 0);
}

#[test]
fn test_skip_marked_module_is_never_deleted() {
    let outcome = run(&[
        ("main.ts", "import './a';\n"),
        ("a.ts", "export {};\n"),
        ("plugin.ts", "// deadexport-skip\nexport function register() {}\n"),
    ]);

    assert!(outcome.store.exists("plugin.ts"));
    assert!(outcome
        .store
        .get("plugin.ts")
        .unwrap()
        .contains("register"));
}
